use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const MAX_PREFERRED_ACTIVITIES: usize = 3;
pub const MAX_PACKAGE_DAYS: i64 = 30;
/// Largest trip budget accepted, in rupees.
pub const MAX_BUDGET: u64 = 1_000_000_000;

/// `percent` of `amount`, saturating instead of overflowing.
pub fn percent_of(amount: u64, percent: u64) -> u64 {
    amount.saturating_mul(percent) / 100
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TravelPurpose {
    Solo,
    Couple,
    Family,
}

impl TravelPurpose {
    pub fn describe(&self) -> &'static str {
        match self {
            TravelPurpose::Solo => "a solo traveler looking for independent exploration",
            TravelPurpose::Couple => "a couple looking for romantic and shared experiences",
            TravelPurpose::Family => "a family that needs kid-friendly, flexible plans",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TripPace {
    Relaxed,
    Moderate,
    #[serde(alias = "adventure")]
    Packed,
}

impl TripPace {
    pub fn describe(&self) -> &'static str {
        match self {
            TripPace::Relaxed => "a relaxed pace with 1-2 activities per day and plenty of downtime",
            TripPace::Moderate => "a moderate pace with 2-3 activities per day",
            TripPace::Packed => "a packed schedule that fits in as much as possible",
        }
    }
}

pub fn describe_accommodation(style: &str) -> String {
    match style.trim().to_lowercase().as_str() {
        "budget" | "hostel" => "budget-friendly hostels or guesthouses".to_string(),
        "midrange" | "mid-range" | "comfort" => "comfortable mid-range hotels".to_string(),
        "luxury" => "luxury hotels and resorts".to_string(),
        "unique" | "boutique" => "unique boutique stays and local homestays".to_string(),
        _ => style.trim().to_string(),
    }
}

pub fn describe_dining(preference: &str) -> String {
    match preference.trim().to_lowercase().as_str() {
        "street" | "street food" | "street_food" => "local street food and markets".to_string(),
        "casual" => "casual local restaurants".to_string(),
        "fine" | "fine dining" | "fine_dining" => "fine dining experiences".to_string(),
        "mixed" => "a mix of street food, casual spots and the occasional fine dining".to_string(),
        _ => preference.trim().to_string(),
    }
}

/// Preferences captured by the multi-step profile form. One per user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TravelerProfile {
    pub user_id: String,
    pub start_city: String,
    #[serde(default)]
    pub destination_city: Option<String>,
    pub trip_start_date: NaiveDate,
    pub trip_end_date: NaiveDate,
    pub travel_purpose: TravelPurpose,
    pub budget_min: u64,
    pub budget_max: u64,
    pub accommodation_style: String,
    pub dining_preference: String,
    pub travel_pace: TripPace,
    #[serde(default)]
    pub preferred_activities: Vec<String>,
    #[serde(default)]
    pub special_interests: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub accessibility_requirements: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TravelerProfile {
    pub fn budget_mid(&self) -> u64 {
        self.budget_min / 2 + self.budget_max / 2 + (self.budget_min % 2 + self.budget_max % 2) / 2
    }

    pub fn trip_duration_days(&self) -> i64 {
        (self.trip_end_date - self.trip_start_date).num_days()
    }

    pub fn trip_month(&self) -> String {
        self.trip_start_date.format("%B").to_string()
    }

    pub fn trip_year(&self) -> i32 {
        self.trip_start_date.year()
    }

    pub fn ensure_completed(&self) -> Result<(), ApiError> {
        if !self.profile_completed {
            return Err(ApiError::validation(
                "Please complete your travel profile first",
            ));
        }
        if self.special_interests.is_empty() {
            return Err(ApiError::validation(
                "Select at least one special interest",
            ));
        }
        Ok(())
    }

    /// Checks the invariants enforced at entry.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.start_city.trim().is_empty() {
            return Err(ApiError::validation("Start city is required"));
        }
        if self.budget_max == 0 {
            return Err(ApiError::validation("Maximum budget must be greater than zero"));
        }
        if self.budget_max > MAX_BUDGET {
            return Err(ApiError::validation(format!(
                "Maximum budget cannot exceed {}",
                MAX_BUDGET
            )));
        }
        if self.budget_min > self.budget_max {
            return Err(ApiError::validation(
                "Minimum budget cannot exceed maximum budget",
            ));
        }
        if self.trip_end_date < self.trip_start_date {
            return Err(ApiError::validation("Trip end date must not precede the start date"));
        }
        if self.preferred_activities.len() > MAX_PREFERRED_ACTIVITIES {
            return Err(ApiError::validation(format!(
                "Select at most {} preferred activities",
                MAX_PREFERRED_ACTIVITIES
            )));
        }
        if self.profile_completed {
            if self.preferred_activities.is_empty() {
                return Err(ApiError::validation("Select at least one activity"));
            }
            if self.special_interests.is_empty() {
                return Err(ApiError::validation("Select at least one special interest"));
            }
        }
        Ok(())
    }
}

/// Body of `PUT /api/profile`. `budget_min` is derived when omitted.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProfileInput {
    pub start_city: String,
    #[serde(default)]
    pub destination_city: Option<String>,
    pub trip_start_date: NaiveDate,
    pub trip_end_date: NaiveDate,
    pub travel_purpose: TravelPurpose,
    #[serde(default)]
    pub budget_min: Option<u64>,
    pub budget_max: u64,
    pub accommodation_style: String,
    pub dining_preference: String,
    pub travel_pace: TripPace,
    #[serde(default)]
    pub preferred_activities: Vec<String>,
    #[serde(default)]
    pub special_interests: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub accessibility_requirements: Option<String>,
    #[serde(default)]
    pub profile_completed: bool,
}

impl ProfileInput {
    pub fn into_profile(self, user_id: &str, now: DateTime<Utc>) -> Result<TravelerProfile, ApiError> {
        let profile = TravelerProfile {
            user_id: user_id.to_string(),
            start_city: self.start_city.trim().to_string(),
            destination_city: self
                .destination_city
                .map(|city| city.trim().to_string())
                .filter(|city| !city.is_empty()),
            trip_start_date: self.trip_start_date,
            trip_end_date: self.trip_end_date,
            travel_purpose: self.travel_purpose,
            budget_min: self.budget_min.unwrap_or(self.budget_max / 2),
            budget_max: self.budget_max,
            accommodation_style: self.accommodation_style,
            dining_preference: self.dining_preference,
            travel_pace: self.travel_pace,
            preferred_activities: self.preferred_activities,
            special_interests: self.special_interests,
            dietary_restrictions: non_blank(self.dietary_restrictions),
            accessibility_requirements: non_blank(self.accessibility_requirements),
            profile_completed: self.profile_completed,
            updated_at: Some(now),
        };
        profile.validate()?;
        Ok(profile)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
pub(crate) fn sample_profile() -> TravelerProfile {
    TravelerProfile {
        user_id: "user_1".to_string(),
        start_city: "Mumbai".to_string(),
        destination_city: Some("Goa".to_string()),
        trip_start_date: NaiveDate::from_ymd_opt(2026, 11, 7).unwrap(),
        trip_end_date: NaiveDate::from_ymd_opt(2026, 11, 8).unwrap(),
        travel_purpose: TravelPurpose::Couple,
        budget_min: 5_000,
        budget_max: 20_000,
        accommodation_style: "midrange".to_string(),
        dining_preference: "street food".to_string(),
        travel_pace: TripPace::Moderate,
        preferred_activities: vec!["Beaches".to_string(), "Nightlife".to_string()],
        special_interests: vec!["Photography".to_string(), "Seafood".to_string()],
        dietary_restrictions: Some("No pork".to_string()),
        accessibility_requirements: None,
        profile_completed: true,
        updated_at: None,
    }
}
