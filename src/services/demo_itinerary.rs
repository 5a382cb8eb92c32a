//! Hand-authored itineraries served when the LLM is unavailable.
//!
//! The output depends only on the destination name.

use crate::models::itinerary::{Activity, Day, Tier, TierDraft};

struct Slot {
    time_of_day: &'static str,
    time: &'static str,
    name: &'static str,
    venue: &'static str,
    area: &'static str,
    description: &'static str,
    duration: &'static str,
    cost: u64,
}

const DAY_DATES: [&str; 2] = ["Saturday", "Sunday"];

const BUDGET: [[Slot; 3]; 2] = [
    [
        Slot { time_of_day: "Morning", time: "9:00 AM", name: "Old Town Walking Tour", venue: "{d} Old Town", area: "Historic Centre", description: "Free guided walk through the historic lanes and main square.", duration: "2 hours", cost: 0 },
        Slot { time_of_day: "Afternoon", time: "1:00 PM", name: "Street Food Lunch", venue: "{d} Central Market", area: "Market District", description: "Graze through local snacks at the busiest market stalls.", duration: "1 hour 30 min", cost: 600 },
        Slot { time_of_day: "Evening", time: "6:30 PM", name: "Sunset at the Viewpoint", venue: "{d} Hilltop Viewpoint", area: "Hill District", description: "Catch the sunset over the city from the public viewpoint.", duration: "2 hours", cost: 200 },
    ],
    [
        Slot { time_of_day: "Morning", time: "8:30 AM", name: "City Museum Visit", venue: "{d} City Museum", area: "Museum Quarter", description: "Get the story of the city on a reduced-price morning ticket.", duration: "2 hours", cost: 500 },
        Slot { time_of_day: "Afternoon", time: "12:30 PM", name: "Park Picnic", venue: "{d} Botanical Garden", area: "Garden District", description: "Picnic lunch from a local bakery among the gardens.", duration: "2 hours", cost: 400 },
        Slot { time_of_day: "Evening", time: "7:00 PM", name: "Night Bazaar Stroll", venue: "{d} Night Bazaar", area: "Riverside", description: "Browse crafts and try a bowl of the local noodle soup.", duration: "2 hours", cost: 700 },
    ],
];

const BALANCED: [[Slot; 3]; 2] = [
    [
        Slot { time_of_day: "Morning", time: "9:00 AM", name: "Guided Heritage Tour", venue: "{d} Heritage Palace", area: "Historic Centre", description: "Small-group tour of the palace with skip-the-line entry.", duration: "2 hours 30 min", cost: 2500 },
        Slot { time_of_day: "Afternoon", time: "1:00 PM", name: "Cooking Class", venue: "{d} Culinary Studio", area: "Market District", description: "Shop the market with a chef, then cook a regional lunch.", duration: "3 hours", cost: 3500 },
        Slot { time_of_day: "Evening", time: "7:30 PM", name: "Dinner at a Local Favourite", venue: "{d} Riverside Kitchen", area: "Riverside", description: "Seasonal tasting plates at a well-reviewed bistro.", duration: "2 hours", cost: 3000 },
    ],
    [
        Slot { time_of_day: "Morning", time: "9:30 AM", name: "Bike Tour", venue: "{d} Cycle Hub", area: "Waterfront", description: "Guided e-bike ride along the waterfront and parks.", duration: "3 hours", cost: 2000 },
        Slot { time_of_day: "Afternoon", time: "2:00 PM", name: "Art Gallery Afternoon", venue: "{d} Modern Art Gallery", area: "Museum Quarter", description: "Contemporary collection plus the rooftop cafe.", duration: "2 hours", cost: 1500 },
        Slot { time_of_day: "Evening", time: "8:00 PM", name: "Live Music Night", venue: "{d} Jazz Cellar", area: "Old Town", description: "Cover charge includes one drink and two live sets.", duration: "2 hours 30 min", cost: 2500 },
    ],
];

const LUXE: [[Slot; 3]; 2] = [
    [
        Slot { time_of_day: "Morning", time: "9:00 AM", name: "Private Guided Tour", venue: "{d} Royal Quarter", area: "Historic Centre", description: "Private guide and chauffeur for the landmark circuit.", duration: "3 hours", cost: 9000 },
        Slot { time_of_day: "Afternoon", time: "1:30 PM", name: "Spa Retreat", venue: "{d} Grand Spa", area: "Waterfront", description: "Signature massage and thermal suite access.", duration: "2 hours 30 min", cost: 8000 },
        Slot { time_of_day: "Evening", time: "8:00 PM", name: "Chef's Tasting Menu", venue: "{d} Skyline Restaurant", area: "Financial District", description: "Eight-course tasting menu with wine pairing.", duration: "3 hours", cost: 12000 },
    ],
    [
        Slot { time_of_day: "Morning", time: "10:00 AM", name: "Private Yacht Cruise", venue: "{d} Marina", area: "Harbour", description: "Half-day charter with brunch served on deck.", duration: "3 hours", cost: 15000 },
        Slot { time_of_day: "Afternoon", time: "2:30 PM", name: "Personal Shopping", venue: "{d} Luxury Arcade", area: "Shopping District", description: "Stylist-led visit to local designer boutiques.", duration: "2 hours", cost: 5000 },
        Slot { time_of_day: "Evening", time: "7:30 PM", name: "Rooftop Cocktails", venue: "{d} Sky Bar", area: "Financial District", description: "Reserved terrace table for cocktails over the skyline.", duration: "2 hours", cost: 4000 },
    ],
];

// Lodging and transfers included in each tier total on top of activity costs.
fn overhead(tier: Tier) -> u64 {
    match tier {
        Tier::Budget => 5_000,
        Tier::Balanced => 8_000,
        Tier::Luxe => 20_000,
    }
}

fn slots(tier: Tier) -> &'static [[Slot; 3]; 2] {
    match tier {
        Tier::Budget => &BUDGET,
        Tier::Balanced => &BALANCED,
        Tier::Luxe => &LUXE,
    }
}

fn build_days(tier: Tier, destination: &str) -> Vec<Day> {
    slots(tier)
        .iter()
        .enumerate()
        .map(|(index, day_slots)| Day {
            day: index as u32 + 1,
            date: DAY_DATES[index].to_string(),
            activities: day_slots
                .iter()
                .map(|slot| Activity {
                    time_of_day: slot.time_of_day.to_string(),
                    time: slot.time.to_string(),
                    name: slot.name.to_string(),
                    venue: slot.venue.replace("{d}", destination),
                    location: format!("{}, {}", slot.area, destination),
                    description: slot.description.to_string(),
                    duration: slot.duration.to_string(),
                    cost: slot.cost,
                    images: None,
                })
                .collect(),
        })
        .collect()
}

/// Three fixed tiers for `destination`.
pub fn demo_tiers(destination: &str) -> Vec<TierDraft> {
    let destination = destination.trim();
    Tier::ALL
        .iter()
        .map(|tier| {
            let days = build_days(*tier, destination);
            let activity_total: u64 = days
                .iter()
                .flat_map(|day| day.activities.iter())
                .map(|activity| activity.cost)
                .sum();
            TierDraft {
                name: *tier,
                total_cost: activity_total + overhead(*tier),
                days,
            }
        })
        .collect()
}
