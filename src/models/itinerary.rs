use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Cost tier produced by the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Budget,
    Balanced,
    Luxe,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Budget, Tier::Balanced, Tier::Luxe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Budget => "Budget",
            Tier::Balanced => "Balanced",
            Tier::Luxe => "Luxe",
        }
    }

    /// Share of the profile's mid budget targeted by this tier, in percent.
    pub fn budget_share_percent(&self) -> u64 {
        match self {
            Tier::Budget => 40,
            Tier::Balanced => 70,
            Tier::Luxe => 120,
        }
    }

    /// Price band used when no profile budget is known. `None` means open ended.
    pub fn default_band(&self) -> (u64, Option<u64>) {
        match self {
            Tier::Budget => (6_000, Some(10_000)),
            Tier::Balanced => (15_000, Some(25_000)),
            Tier::Luxe => (40_000, None),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// LLMs occasionally emit costs as floats; round them up, reject negatives.
pub(crate) fn deserialize_cost<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() && f >= 0.0 {
                    Ok(f.ceil() as u64)
                } else {
                    Err(serde::de::Error::custom(format!(
                        "cost must be a non-negative number, got {}",
                        f
                    )))
                }
            } else {
                Err(serde::de::Error::custom("cost is not representable"))
            }
        }
        other => Err(serde::de::Error::custom(format!(
            "cost must be a number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub time_of_day: String,
    #[serde(default)]
    pub time: String,
    pub name: String,
    pub venue: String,
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(deserialize_with = "deserialize_cost")]
    pub cost: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl Activity {
    /// Stable identity used to look up cached images for this activity.
    pub fn hash(&self, destination: &str) -> String {
        let normalized = [
            self.name.as_str(),
            self.venue.as_str(),
            self.location.as_str(),
            destination,
        ]
        .iter()
        .map(|part| part.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("|");

        hex::encode(Sha256::digest(normalized.as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub day: u32,
    #[serde(default)]
    pub date: String,
    pub activities: Vec<Activity>,
}

/// Who an itinerary belongs to. A record is owned by exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Owner {
    User(String),
    Guest(String),
}

/// Itinerary fields supplied by the creator; ids and ownership are assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItinerary {
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub tier: String,
    #[serde(rename = "days_json")]
    pub days: Vec<Day>,
    pub total_cost: u64,
    pub duration_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<String>,
}

impl NewItinerary {
    /// Checks a client-supplied itinerary before it is stored.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.destination.trim().is_empty() {
            return Err(ApiError::validation("Destination is required"));
        }
        if self.days.is_empty() {
            return Err(ApiError::validation("Itinerary must contain at least one day"));
        }
        if self.duration_days as usize != self.days.len() {
            return Err(ApiError::validation(format!(
                "duration_days is {} but {} days were supplied",
                self.duration_days,
                self.days.len()
            )));
        }
        check_day_sequence(&self.days).map_err(ApiError::validation)
    }

    pub fn into_itinerary(self, id: String, owner: Owner, created_at: DateTime<Utc>) -> Itinerary {
        Itinerary {
            id,
            owner,
            destination: self.destination,
            image_url: self.image_url,
            tier: self.tier,
            days: self.days,
            total_cost: self.total_cost,
            duration_days: self.duration_days,
            migrated_from: self.migrated_from,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub id: String,
    pub owner: Owner,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub tier: String,
    #[serde(rename = "days_json")]
    pub days: Vec<Day>,
    pub total_cost: u64,
    pub duration_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Itinerary {
    pub fn to_new(&self) -> NewItinerary {
        NewItinerary {
            destination: self.destination.clone(),
            image_url: self.image_url.clone(),
            tier: self.tier.clone(),
            days: self.days.clone(),
            total_cost: self.total_cost,
            duration_days: self.duration_days,
            migrated_from: self.migrated_from.clone(),
        }
    }

    pub fn activity_cost_sum(&self) -> u64 {
        activity_cost_sum(&self.days)
    }

    pub fn is_owned_by_user(&self, user_id: &str) -> bool {
        matches!(&self.owner, Owner::User(id) if id == user_id)
    }
}

pub fn activity_cost_sum(days: &[Day]) -> u64 {
    days.iter()
        .flat_map(|day| day.activities.iter())
        .map(|activity| activity.cost)
        .sum()
}

/// One tier as returned by the completion capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDraft {
    pub name: Tier,
    #[serde(deserialize_with = "deserialize_cost")]
    pub total_cost: u64,
    pub days: Vec<Day>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiersEnvelope {
    pub tiers: Vec<TierDraft>,
}

/// Checks day numbering is 1-based and contiguous.
pub fn check_day_sequence(days: &[Day]) -> Result<(), String> {
    for (index, day) in days.iter().enumerate() {
        let expected = index as u32 + 1;
        if day.day != expected {
            return Err(format!(
                "day numbers must be contiguous from 1, found {} at position {}",
                day.day, expected
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str) -> Activity {
        Activity {
            time_of_day: "Morning".to_string(),
            time: "9:00 AM".to_string(),
            name: name.to_string(),
            venue: "Senso-ji".to_string(),
            location: "Asakusa".to_string(),
            description: String::new(),
            duration: "2 hours".to_string(),
            cost: 500,
            images: None,
        }
    }

    #[test]
    fn test_activity_hash_is_stable_and_normalized() {
        let a = activity("Temple Walk");
        let mut b = activity("  temple walk ");
        b.cost = 900;

        assert_eq!(a.hash("Tokyo"), b.hash("tokyo"));
        assert_ne!(a.hash("Tokyo"), a.hash("Kyoto"));
        assert_eq!(a.hash("Tokyo").len(), 64);
    }

    #[test]
    fn test_cost_accepts_floats_and_rejects_negatives() {
        let json = serde_json::json!({
            "timeOfDay": "Evening",
            "time": "7:00 PM",
            "name": "Dinner",
            "venue": "Ichiran",
            "location": "Shibuya",
            "cost": 1499.2
        });
        let parsed: Activity = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.cost, 1500);
        assert_eq!(parsed.duration, "");

        let negative = serde_json::json!({
            "timeOfDay": "Evening",
            "name": "Dinner",
            "venue": "Ichiran",
            "location": "Shibuya",
            "cost": -5
        });
        assert!(serde_json::from_value::<Activity>(negative).is_err());
    }

    #[test]
    fn test_day_sequence_check() {
        let days = vec![
            Day { day: 1, date: "Saturday".into(), activities: vec![] },
            Day { day: 2, date: "Sunday".into(), activities: vec![] },
        ];
        assert!(check_day_sequence(&days).is_ok());

        let gap = vec![
            Day { day: 1, date: String::new(), activities: vec![] },
            Day { day: 3, date: String::new(), activities: vec![] },
        ];
        assert!(check_day_sequence(&gap).is_err());
    }

    #[test]
    fn test_new_itinerary_validation() {
        let mut itinerary = NewItinerary {
            destination: "Tokyo".to_string(),
            image_url: None,
            tier: "Balanced".to_string(),
            days: vec![
                Day { day: 1, date: "Saturday".into(), activities: vec![activity("Senso-ji")] },
                Day { day: 2, date: "Sunday".into(), activities: vec![] },
            ],
            total_cost: 40_000,
            duration_days: 2,
            migrated_from: None,
        };
        assert!(itinerary.validate().is_ok());

        itinerary.duration_days = 3;
        assert!(matches!(itinerary.validate(), Err(ApiError::Validation(_))));

        itinerary.duration_days = 2;
        itinerary.days[1].day = 4;
        assert!(matches!(itinerary.validate(), Err(ApiError::Validation(_))));

        itinerary.days.clear();
        itinerary.duration_days = 0;
        assert!(itinerary.validate().is_err());
    }

    #[test]
    fn test_owner_serialization() {
        let owner = Owner::Guest("guest_1".to_string());
        let json = serde_json::to_value(&owner).unwrap();
        assert_eq!(json, serde_json::json!({"type": "guest", "id": "guest_1"}));
    }
}
