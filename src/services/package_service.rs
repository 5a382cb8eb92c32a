//! Profile-driven multi-day packages in three budget variations.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::ApiError;
use crate::models::package::{
    AccommodationPlan, CostBreakdown, GeneratedPackage, GenerationSource, Meals, PackageActivity,
    PackageDay, PackageTier, PackageVariation, TransportationPlan,
};
use crate::models::profile::{describe_dining, percent_of, TravelerProfile, MAX_PACKAGE_DAYS};
use crate::services::fallback::{always_recoverable, with_fallback, Outcome};
use crate::services::llm_service::{parse_structured, CompletionProvider, CompletionRequest, LlmError};
use crate::services::prompt_service::{package_system_prompt, package_user_prompt};

const PACKAGE_TEMPERATURE: f32 = 0.8;
const GENERIC_INTERESTS: [&str; 3] = ["Sightseeing", "Local Culture", "Food & Dining"];

/// Per-day budget split in percent; miscellaneous takes the remainder.
const ACCOMMODATION_SHARE: u64 = 35;
const DINING_SHARE: u64 = 25;
const TRANSPORT_SHARE: u64 = 15;
const ACTIVITIES_SHARE: u64 = 20;
/// Slack allowed between a package's breakdown and its total: 1% of the
/// total, but never less than one unit per category per day.
const COST_TOLERANCE_PERCENT: u64 = 1;
const COST_CATEGORIES: u64 = 5;

/// Validated trip length in days for package generation.
pub fn package_trip_days(profile: &TravelerProfile) -> Result<i64, ApiError> {
    profile.ensure_completed()?;
    if profile.start_city.trim().is_empty() {
        return Err(ApiError::validation("Start city is required for packages"));
    }
    if profile
        .destination_city
        .as_deref()
        .map_or(true, |city| city.trim().is_empty())
    {
        return Err(ApiError::validation("Destination city is required for packages"));
    }

    let days = (profile.trip_end_date - profile.trip_start_date).num_days();
    if days < 1 || days > MAX_PACKAGE_DAYS {
        return Err(ApiError::validation(format!(
            "Trip must last between 1 and {} days, got {}",
            MAX_PACKAGE_DAYS, days
        )));
    }
    Ok(days)
}

/// Average of the scaled budget range for `tier`, over the whole trip.
pub fn adjusted_average_budget(profile: &TravelerProfile, tier: PackageTier) -> u64 {
    let percent = tier.multiplier_percent();
    let scaled_min = percent_of(profile.budget_min, percent);
    let scaled_max = percent_of(profile.budget_max, percent);
    scaled_min.saturating_add(scaled_max) / 2
}

pub fn split_daily_budget(per_day: u64) -> CostBreakdown {
    let accommodation = percent_of(per_day, ACCOMMODATION_SHARE);
    let dining = percent_of(per_day, DINING_SHARE);
    let transportation = percent_of(per_day, TRANSPORT_SHARE);
    let activities = percent_of(per_day, ACTIVITIES_SHARE);
    CostBreakdown {
        accommodation,
        dining,
        transportation,
        activities,
        miscellaneous: per_day - accommodation - dining - transportation - activities,
    }
}

fn day_title(day: i64, days: i64, destination: &str) -> String {
    if day == 1 {
        "Arrival & Exploration".to_string()
    } else if day == days {
        "Final Day & Departure".to_string()
    } else {
        format!("Discover {} - Day {}", destination, day)
    }
}

fn package_interests(profile: &TravelerProfile) -> Vec<String> {
    let mut interests: Vec<String> = profile.special_interests.iter().take(3).cloned().collect();
    for generic in GENERIC_INTERESTS {
        if interests.len() == 3 {
            break;
        }
        if !interests.iter().any(|i| i.eq_ignore_ascii_case(generic)) {
            interests.push(generic.to_string());
        }
    }
    interests
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deterministic package used when the LLM is unavailable or returns junk.
pub fn mock_package(profile: &TravelerProfile, tier: PackageTier, days: i64) -> GeneratedPackage {
    let destination = profile.destination_city.as_deref().unwrap_or("your destination");
    let days_u = days.max(1) as u64;
    let per_day = adjusted_average_budget(profile, tier) / days_u;
    let daily = split_daily_budget(per_day);
    let interests = package_interests(profile);
    let dining = describe_dining(&profile.dining_preference);

    let slot_cost = daily.activities / 3;
    let slots = [
        ("9:00 AM", "Morning", slot_cost),
        ("2:00 PM", "Afternoon", slot_cost),
        ("7:00 PM", "Evening", daily.activities - slot_cost * 2),
    ];

    let itinerary = (1..=days.max(1))
        .map(|day| PackageDay {
            day: day as u32,
            title: day_title(day, days, destination),
            activities: slots
                .iter()
                .zip(interests.iter())
                .map(|((time, part, cost), interest)| PackageActivity {
                    time: time.to_string(),
                    activity: format!("{} {}", part, interest),
                    description: format!("{} experience in {}", interest, destination),
                    cost: *cost,
                })
                .collect(),
            meals: Meals {
                breakfast: "Breakfast at your accommodation".to_string(),
                lunch: format!("Lunch featuring {}", dining),
                dinner: format!("Dinner at a {} spot in {}", profile.dining_preference, destination),
            },
            accommodation: tier.accommodation_type().to_string(),
        })
        .collect();

    GeneratedPackage {
        package_name: format!("{} {} Escape", destination, capitalize(tier.as_str())),
        tagline: format!("{} days of {} in {}", days, interests.join(", "), destination),
        tier: tier.as_str().to_string(),
        total_cost: per_day.saturating_mul(days_u),
        cost_breakdown: CostBreakdown {
            accommodation: daily.accommodation.saturating_mul(days_u),
            dining: daily.dining.saturating_mul(days_u),
            transportation: daily.transportation.saturating_mul(days_u),
            activities: daily.activities.saturating_mul(days_u),
            miscellaneous: daily.miscellaneous.saturating_mul(days_u),
        },
        highlights: interests
            .iter()
            .map(|interest| format!("{} in {}", interest, destination))
            .collect(),
        accommodation: AccommodationPlan {
            kind: tier.accommodation_type().to_string(),
            recommendations: vec![format!("{} in central {}", tier.accommodation_type(), destination)],
        },
        transportation: TransportationPlan {
            mode: tier.transport_mode().to_string(),
            details: format!("{} from {} to {}", tier.transport_mode(), profile.start_city, destination),
        },
        itinerary,
    }
}

/// Rejects packages whose category costs do not add up to `total_cost`.
pub fn check_cost_breakdown(package: &GeneratedPackage, days: i64) -> Result<(), LlmError> {
    let summed = package.cost_breakdown.total();
    let tolerance = percent_of(package.total_cost, COST_TOLERANCE_PERCENT)
        .max(COST_CATEGORIES.saturating_mul(days.max(1) as u64));
    if summed.abs_diff(package.total_cost) > tolerance {
        return Err(LlmError::Malformed(format!(
            "cost breakdown sums to {} but total cost is {}",
            summed, package.total_cost
        )));
    }
    Ok(())
}

pub struct PackageGenerator {
    llm: Arc<dyn CompletionProvider>,
}

impl PackageGenerator {
    pub fn new(llm: Arc<dyn CompletionProvider>) -> Self {
        Self { llm }
    }

    async fn request_package(
        &self,
        profile: &TravelerProfile,
        tier: PackageTier,
        days: i64,
    ) -> Result<GeneratedPackage, LlmError> {
        let request = CompletionRequest::json(
            package_system_prompt(profile, tier, days),
            package_user_prompt(profile, tier),
            PACKAGE_TEMPERATURE,
        );
        let raw = self.llm.complete(request).await?;
        let package: GeneratedPackage = parse_structured(&raw, "package")?;
        if package.itinerary.len() as i64 != days {
            return Err(LlmError::Malformed(format!(
                "package has {} days, expected {}",
                package.itinerary.len(),
                days
            )));
        }
        check_cost_breakdown(&package, days)?;
        Ok(package)
    }

    async fn generate_tier(&self, profile: &TravelerProfile, tier: PackageTier, days: i64) -> PackageVariation {
        let label = format!("Package generation ({})", tier.as_str());
        let result = with_fallback(
            &label,
            self.request_package(profile, tier, days),
            || mock_package(profile, tier, days),
            always_recoverable,
        )
        .await;

        // Every error is recoverable here, so the fallback branch always yields a package.
        let (package, outcome) = match result {
            Ok(value) => value,
            Err(_) => (mock_package(profile, tier, days), Outcome::Fallback),
        };
        PackageVariation {
            tier,
            source: match outcome {
                Outcome::Primary => GenerationSource::Llm,
                Outcome::Fallback => GenerationSource::Mock,
            },
            package,
        }
    }

    /// All three variations, generated concurrently. One tier failing never affects the others.
    pub async fn generate_variations(&self, profile: &TravelerProfile) -> Result<Vec<PackageVariation>, ApiError> {
        let days = package_trip_days(profile)?;
        let variations = join_all(
            PackageTier::ALL
                .iter()
                .map(|tier| self.generate_tier(profile, *tier, days)),
        )
        .await;

        log::info!(
            "Generated {} package variations for {:?}",
            variations.len(),
            profile.destination_city
        );
        Ok(variations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::sample_profile;
    use crate::services::llm_service::stub::StubCompletion;
    use chrono::NaiveDate;

    #[test]
    fn test_budget_multiplier_scenario() {
        let profile = sample_profile();
        assert_eq!(adjusted_average_budget(&profile, PackageTier::Budget), 8_750);

        let package = mock_package(&profile, PackageTier::Budget, 1);
        assert_eq!(package.total_cost, 8_750);
        assert_eq!(package.cost_breakdown.total(), 8_750);
        assert_eq!(package.cost_breakdown.accommodation, 3_062);
        assert_eq!(package.cost_breakdown.miscellaneous, 439);
    }

    #[test]
    fn test_breakdown_matches_total_for_longer_trips() {
        let profile = sample_profile();
        for tier in PackageTier::ALL {
            let package = mock_package(&profile, tier, 7);
            assert_eq!(package.cost_breakdown.total(), package.total_cost);
            assert_eq!(package.itinerary.len(), 7);
        }
    }

    #[test]
    fn test_day_titles() {
        let package = mock_package(&sample_profile(), PackageTier::Balanced, 3);
        let titles: Vec<&str> = package.itinerary.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Arrival & Exploration", "Discover Goa - Day 2", "Final Day & Departure"]
        );
    }

    #[test]
    fn test_interests_fall_back_to_generic() {
        let package = mock_package(&sample_profile(), PackageTier::Luxe, 2);
        let activities: Vec<&str> = package.itinerary[0]
            .activities
            .iter()
            .map(|a| a.activity.as_str())
            .collect();
        assert_eq!(
            activities,
            vec!["Morning Photography", "Afternoon Seafood", "Evening Sightseeing"]
        );
    }

    #[test]
    fn test_duration_outside_range_is_rejected() {
        let mut profile = sample_profile();
        profile.trip_end_date = profile.trip_start_date;
        assert!(matches!(package_trip_days(&profile), Err(ApiError::Validation(_))));

        profile.trip_end_date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert!(matches!(package_trip_days(&profile), Err(ApiError::Validation(_))));

        let mut profile = sample_profile();
        profile.destination_city = None;
        assert!(package_trip_days(&profile).is_err());
    }

    #[actix_rt::test]
    async fn test_one_failing_tier_only_degrades_that_tier() {
        let profile = sample_profile();
        let llm_package = mock_package(&profile, PackageTier::Balanced, 1);
        let reply = serde_json::to_string(&llm_package).unwrap();

        let stub = StubCompletion::new(move |request| {
            if request.system.contains("luxe variation") {
                Err(LlmError::Request("connection reset".to_string()))
            } else {
                Ok(reply.clone())
            }
        });
        let generator = PackageGenerator::new(Arc::new(stub));

        let variations = generator.generate_variations(&profile).await.unwrap();
        let sources: Vec<GenerationSource> = variations.iter().map(|v| v.source).collect();
        assert_eq!(
            sources,
            vec![GenerationSource::Llm, GenerationSource::Llm, GenerationSource::Mock]
        );
        assert_eq!(variations[2].package.tier, "luxe");
    }

    #[test]
    fn test_breakdown_tolerates_rounding_only() {
        let mut package = mock_package(&sample_profile(), PackageTier::Balanced, 1);
        assert!(check_cost_breakdown(&package, 1).is_ok());

        package.total_cost += 100;
        assert!(check_cost_breakdown(&package, 1).is_ok());

        package.total_cost *= 3;
        assert!(matches!(check_cost_breakdown(&package, 1), Err(LlmError::Malformed(_))));

        package.cost_breakdown.dining = u64::MAX;
        assert!(check_cost_breakdown(&package, 1).is_err());
    }

    #[actix_rt::test]
    async fn test_inconsistent_llm_costs_fall_back_for_that_tier() {
        let profile = sample_profile();
        let good = serde_json::to_string(&mock_package(&profile, PackageTier::Balanced, 1)).unwrap();
        let mut inflated = mock_package(&profile, PackageTier::Budget, 1);
        inflated.total_cost = 250_000;
        let inflated = serde_json::to_string(&inflated).unwrap();

        let stub = StubCompletion::new(move |request| {
            if request.system.contains("budget variation") {
                Ok(inflated.clone())
            } else {
                Ok(good.clone())
            }
        });
        let generator = PackageGenerator::new(Arc::new(stub));

        let variations = generator.generate_variations(&profile).await.unwrap();
        let sources: Vec<GenerationSource> = variations.iter().map(|v| v.source).collect();
        assert_eq!(
            sources,
            vec![GenerationSource::Mock, GenerationSource::Llm, GenerationSource::Llm]
        );
        assert_eq!(variations[0].package.total_cost, 8_750);
    }

    #[actix_rt::test]
    async fn test_unconfigured_llm_mocks_every_tier() {
        let generator = PackageGenerator::new(Arc::new(StubCompletion::replying(Err(LlmError::NotConfigured))));
        let variations = generator.generate_variations(&sample_profile()).await.unwrap();
        assert_eq!(variations.len(), 3);
        assert!(variations.iter().all(|v| v.source == GenerationSource::Mock));
    }
}
