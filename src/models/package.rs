use serde::{Deserialize, Serialize};

use crate::models::itinerary::deserialize_cost;

/// Variation tiers for multi-day packages, each scaling the profile budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageTier {
    Budget,
    Balanced,
    Luxe,
}

impl PackageTier {
    pub const ALL: [PackageTier; 3] = [PackageTier::Budget, PackageTier::Balanced, PackageTier::Luxe];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageTier::Budget => "budget",
            PackageTier::Balanced => "balanced",
            PackageTier::Luxe => "luxe",
        }
    }

    /// Budget multiplier in percent (0.7x, 1.0x, 1.5x).
    pub fn multiplier_percent(&self) -> u64 {
        match self {
            PackageTier::Budget => 70,
            PackageTier::Balanced => 100,
            PackageTier::Luxe => 150,
        }
    }

    pub fn accommodation_guidance(&self) -> &'static str {
        match self {
            PackageTier::Budget => {
                "hostels, guesthouses or budget hotels; favour public transport and street food"
            }
            PackageTier::Balanced => {
                "comfortable 3-4 star hotels; mix of taxis and public transport, well-rated local restaurants"
            }
            PackageTier::Luxe => {
                "5 star hotels or luxury resorts; private transfers, fine dining and exclusive experiences"
            }
        }
    }

    pub fn accommodation_type(&self) -> &'static str {
        match self {
            PackageTier::Budget => "Budget Hotel / Hostel",
            PackageTier::Balanced => "3-4 Star Hotel",
            PackageTier::Luxe => "5 Star Luxury Resort",
        }
    }

    pub fn transport_mode(&self) -> &'static str {
        match self {
            PackageTier::Budget => "Train / Bus",
            PackageTier::Balanced => "Flight + Taxi",
            PackageTier::Luxe => "Flight + Private Car",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub accommodation: u64,
    pub dining: u64,
    pub transportation: u64,
    pub activities: u64,
    pub miscellaneous: u64,
}

impl CostBreakdown {
    pub fn total(&self) -> u64 {
        [self.dining, self.transportation, self.activities, self.miscellaneous]
            .iter()
            .fold(self.accommodation, |total, part| total.saturating_add(*part))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccommodationPlan {
    #[serde(rename = "type")]
    pub kind: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportationPlan {
    pub mode: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageActivity {
    pub time: String,
    pub activity: String,
    pub description: String,
    #[serde(deserialize_with = "deserialize_cost")]
    pub cost: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meals {
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDay {
    pub day: u32,
    pub title: String,
    pub activities: Vec<PackageActivity>,
    pub meals: Meals,
    pub accommodation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPackage {
    pub package_name: String,
    pub tagline: String,
    pub tier: String,
    #[serde(deserialize_with = "deserialize_cost")]
    pub total_cost: u64,
    pub cost_breakdown: CostBreakdown,
    pub highlights: Vec<String>,
    pub accommodation: AccommodationPlan,
    pub transportation: TransportationPlan,
    pub itinerary: Vec<PackageDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationSource {
    Llm,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageVariation {
    pub tier: PackageTier,
    pub source: GenerationSource,
    pub package: GeneratedPackage,
}
