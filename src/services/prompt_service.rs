//! Prompt construction for the generation pipelines.
//!
//! Wording is free to change; what matters is which facts reach the model.

use crate::models::destination::RECOMMENDATION_COUNT;
use crate::models::itinerary::Tier;
use crate::models::package::PackageTier;
use crate::models::profile::{describe_accommodation, describe_dining, percent_of, TravelerProfile};

pub const ITINERARY_SYSTEM_PROMPT: &str = "You are an expert travel planner. You always answer with a single valid JSON object and nothing else.";
pub const RECOMMENDATION_SYSTEM_PROMPT: &str = "You are a travel recommendation engine. You always answer with valid JSON only.";

/// Price band for one tier, in the itinerary's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub min: u64,
    pub max: Option<u64>,
}

impl PriceBand {
    fn describe(&self) -> String {
        match self.max {
            Some(max) => format!("{}-{}", self.min, max),
            None => format!("{}+", self.min),
        }
    }
}

/// Band for `tier`: a share of the profile's mid budget when known, otherwise fixed.
pub fn price_band(tier: Tier, profile: Option<&TravelerProfile>) -> PriceBand {
    match profile {
        Some(profile) if profile.budget_max > 0 => {
            let target = percent_of(profile.budget_mid(), tier.budget_share_percent());
            PriceBand {
                min: percent_of(target, 80),
                max: Some(percent_of(target, 120)),
            }
        }
        _ => {
            let (min, max) = tier.default_band();
            PriceBand { min, max }
        }
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none specified".to_string()
    } else {
        items.join(", ")
    }
}

fn profile_section(profile: &TravelerProfile) -> String {
    let mut lines = vec![
        format!("Travelling as: {}", profile.travel_purpose.describe()),
        format!("Trip dates: {} to {}", profile.trip_start_date, profile.trip_end_date),
        format!("Starting from: {}", profile.start_city),
        format!("Budget range: {} - {}", profile.budget_min, profile.budget_max),
        format!("Pace: {}", profile.travel_pace.describe()),
        format!("Accommodation: {}", describe_accommodation(&profile.accommodation_style)),
        format!("Dining: {}", describe_dining(&profile.dining_preference)),
        format!("Special interests: {}", list_or_none(&profile.special_interests)),
        format!("Preferred activities: {}", list_or_none(&profile.preferred_activities)),
    ];
    if let Some(dietary) = &profile.dietary_restrictions {
        lines.push(format!("Dietary restrictions: {}", dietary));
    }
    if let Some(accessibility) = &profile.accessibility_requirements {
        lines.push(format!("Accessibility requirements: {}", accessibility));
    }
    lines.join("\n")
}

/// What the generation prompt is personalised from.
#[derive(Debug, Clone, Copy)]
pub enum PromptSource<'a> {
    Profile(&'a TravelerProfile),
    Brief(&'a str),
    DestinationOnly,
}

impl<'a> PromptSource<'a> {
    pub fn select(profile: Option<&'a TravelerProfile>, brief: Option<&'a str>) -> Self {
        if let Some(profile) = profile.filter(|profile| profile.profile_completed) {
            return PromptSource::Profile(profile);
        }
        match brief.map(str::trim).filter(|brief| !brief.is_empty()) {
            Some(brief) => PromptSource::Brief(brief),
            None => PromptSource::DestinationOnly,
        }
    }

    fn profile(&self) -> Option<&'a TravelerProfile> {
        match self {
            PromptSource::Profile(profile) => Some(profile),
            _ => None,
        }
    }
}

pub fn build_itinerary_prompt(destination: &str, source: PromptSource<'_>) -> String {
    let traveler = match source {
        PromptSource::Profile(profile) => {
            format!("Traveler profile:\n{}", profile_section(profile))
        }
        PromptSource::Brief(brief) => format!("Trip brief from the traveler:\n{}", brief),
        PromptSource::DestinationOnly => {
            "No preferences were given; plan a well-rounded first visit.".to_string()
        }
    };

    let bands = Tier::ALL
        .iter()
        .map(|tier| {
            format!(
                "- {}: total cost {}",
                tier,
                price_band(*tier, source.profile()).describe()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Create three 2-day itineraries for {destination}.

{traveler}

Produce exactly three tiers named "Budget", "Balanced" and "Luxe" with these price bands:
{bands}

Rules:
- Each tier has exactly 2 days, numbered 1 and 2.
- Each day has Morning, Afternoon and Evening activities.
- Use real, specific venue names. Never use placeholders such as "a local restaurant" or "popular attraction".
- Costs are realistic integers in the local currency and match the tier.

Respond with JSON in exactly this shape:
{{"tiers":[{{"name":"Budget","totalCost":0,"days":[{{"day":1,"date":"Saturday","activities":[{{"timeOfDay":"Morning","time":"9:00 AM","name":"","venue":"","location":"","description":"","duration":"2 hours","cost":0}}]}}]}}]}}"#
    )
}

pub fn package_system_prompt(profile: &TravelerProfile, tier: PackageTier, days: i64) -> String {
    let destination = profile.destination_city.as_deref().unwrap_or("the destination");
    let scaled_min = percent_of(profile.budget_min, tier.multiplier_percent());
    let scaled_max = percent_of(profile.budget_max, tier.multiplier_percent());

    format!(
        r#"You are a travel package designer creating the {tier} variation of a {days}-day trip from {start} to {destination}.

{profile}

Budget for this variation: {scaled_min} - {scaled_max} for the whole trip.
Accommodation and pricing guidance: {guidance}.

Respond with a JSON object of exactly this shape:
{{"packageName":"","tagline":"","tier":"{tier}","totalCost":0,"costBreakdown":{{"accommodation":0,"dining":0,"transportation":0,"activities":0,"miscellaneous":0}},"highlights":[""],"accommodation":{{"type":"","recommendations":[""]}},"transportation":{{"mode":"","details":""}},"itinerary":[{{"day":1,"title":"","activities":[{{"time":"9:00 AM","activity":"","description":"","cost":0}}],"meals":{{"breakfast":"","lunch":"","dinner":""}},"accommodation":""}}]}}
The itinerary array must contain exactly {days} days."#,
        tier = tier.as_str(),
        days = days,
        start = profile.start_city,
        destination = destination,
        profile = profile_section(profile),
        scaled_min = scaled_min,
        scaled_max = scaled_max,
        guidance = tier.accommodation_guidance(),
    )
}

pub fn package_user_prompt(profile: &TravelerProfile, tier: PackageTier) -> String {
    format!(
        "Create the {} package for {}.",
        tier.as_str(),
        profile.destination_city.as_deref().unwrap_or("my trip")
    )
}

pub fn recommendation_prompt(profile: &TravelerProfile, seed: u32) -> String {
    format!(
        r#"Recommend exactly {count} different travel destinations for this traveler.

{profile}
Trip length: {days} days in {month} {year}.
Variation seed: {seed} (use it to vary your picks between requests).

Each destination must suit the month and the interests above. estimatedBudget covers transport, stay, food and activities for the whole trip. bestFor must use items from the traveler's preferred activities. matchScore is 0-100.

Respond with a JSON array only:
[{{"name":"","country":"","state":"","description":"","estimatedBudget":0,"bestFor":[""],"distanceFromStart":"","matchScore":0}}]"#,
        count = RECOMMENDATION_COUNT,
        profile = profile_section(profile),
        days = profile.trip_duration_days(),
        month = profile.trip_month(),
        year = profile.trip_year(),
        seed = seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::sample_profile;

    #[test]
    fn test_price_band_scales_with_profile() {
        let profile = sample_profile();
        // mid = (5000 + 20000) / 2 = 12500
        let budget = price_band(Tier::Budget, Some(&profile));
        assert_eq!(budget, PriceBand { min: 4_000, max: Some(6_000) });

        let luxe = price_band(Tier::Luxe, Some(&profile));
        assert_eq!(luxe, PriceBand { min: 12_000, max: Some(18_000) });
    }

    #[test]
    fn test_price_band_defaults_without_profile() {
        assert_eq!(price_band(Tier::Budget, None), PriceBand { min: 6_000, max: Some(10_000) });
        assert_eq!(price_band(Tier::Luxe, None), PriceBand { min: 40_000, max: None });
    }

    #[test]
    fn test_prompt_source_selection() {
        let mut profile = sample_profile();
        assert!(matches!(
            PromptSource::select(Some(&profile), Some("beach week")),
            PromptSource::Profile(_)
        ));

        profile.profile_completed = false;
        assert!(matches!(
            PromptSource::select(Some(&profile), Some("beach week")),
            PromptSource::Brief("beach week")
        ));
        assert!(matches!(
            PromptSource::select(None, Some("   ")),
            PromptSource::DestinationOnly
        ));
    }

    #[test]
    fn test_profile_prompt_lists_preferences_verbatim() {
        let profile = sample_profile();
        let prompt = build_itinerary_prompt("Goa", PromptSource::Profile(&profile));
        assert!(prompt.contains("Photography, Seafood"));
        assert!(prompt.contains("Beaches, Nightlife"));
        assert!(prompt.contains("No pork"));
        assert!(prompt.contains("Luxe: total cost 12000-18000"));
        assert!(prompt.contains("\"tiers\""));
    }

    #[test]
    fn test_default_bands_in_brief_prompt() {
        let prompt = build_itinerary_prompt("Lisbon", PromptSource::Brief("food and fado"));
        assert!(prompt.contains("food and fado"));
        assert!(prompt.contains("Budget: total cost 6000-10000"));
        assert!(prompt.contains("Luxe: total cost 40000+"));
    }

    #[test]
    fn test_package_prompt_scales_budget() {
        let profile = sample_profile();
        let prompt = package_system_prompt(&profile, PackageTier::Luxe, 1);
        assert!(prompt.contains("7500 - 30000"));
        assert!(prompt.contains("5 star hotels"));
    }

    #[test]
    fn test_recommendation_prompt_embeds_seed_and_month() {
        let profile = sample_profile();
        let prompt = recommendation_prompt(&profile, 4242);
        assert!(prompt.contains("4242"));
        assert!(prompt.contains("November 2026"));
        assert!(prompt.contains("exactly 6"));
    }
}
