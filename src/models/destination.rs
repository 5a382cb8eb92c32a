use serde::{Deserialize, Serialize};

use crate::models::itinerary::deserialize_cost;

pub const RECOMMENDATION_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub state: Option<String>,
    pub description: String,
    #[serde(deserialize_with = "deserialize_cost")]
    pub estimated_budget: u64,
    pub best_for: Vec<String>,
    pub distance_from_start: String,
    pub match_score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationPhoto {
    pub image_url: String,
    #[serde(default)]
    pub photographer: Option<String>,
    #[serde(default)]
    pub photographer_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedDestination {
    #[serde(flatten)]
    pub destination: Destination,
    #[serde(flatten)]
    pub photo: DestinationPhoto,
}
