use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use rand::Rng;

use crate::error::ApiError;
use crate::models::destination::{Destination, RecommendedDestination, RECOMMENDATION_COUNT};
use crate::models::profile::TravelerProfile;
use crate::services::image_service::{representative_photo, ImageSearch};
use crate::services::llm_service::{parse_structured, CompletionProvider, CompletionRequest, LlmError};
use crate::services::prompt_service::{recommendation_prompt, RECOMMENDATION_SYSTEM_PROMPT};

const RECOMMENDATION_TEMPERATURE: f32 = 0.9;

/// First balanced `[...]` in `raw`, ignoring brackets inside JSON strings.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    balanced_array_at(raw, raw.find('[')?)
}

// `start` must index a '['.
fn balanced_array_at(raw: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in raw[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

// Bracketed prose like "[top]" can precede the real list, so every opening
// bracket is tried in order.
fn first_destination_array(raw: &str) -> Option<Vec<Destination>> {
    raw.match_indices('[')
        .filter_map(|(start, _)| balanced_array_at(raw, start))
        .filter_map(|candidate| serde_json::from_str::<Vec<Destination>>(candidate).ok())
        .find(|list| !list.is_empty())
}

/// Parses the model's answer into exactly six distinct destinations.
///
/// Duplicates (same name and country, ignoring case) are dropped and extras
/// beyond six ignored; fewer than six distinct entries is a malformed reply.
pub fn parse_destinations(raw: &str) -> Result<Vec<Destination>, LlmError> {
    let parsed = match first_destination_array(raw) {
        Some(parsed) => parsed,
        None => parse_structured::<Vec<Destination>>(raw, "destinations")?,
    };

    let mut seen = HashSet::new();
    let mut destinations = Vec::with_capacity(RECOMMENDATION_COUNT);
    for destination in parsed {
        if destination.match_score > 100 {
            return Err(LlmError::Malformed(format!(
                "match score {} for {} is outside 0-100",
                destination.match_score, destination.name
            )));
        }
        let key = (
            destination.name.trim().to_lowercase(),
            destination.country.trim().to_lowercase(),
        );
        if seen.insert(key) {
            destinations.push(destination);
        }
        if destinations.len() == RECOMMENDATION_COUNT {
            break;
        }
    }

    if destinations.len() < RECOMMENDATION_COUNT {
        return Err(LlmError::Malformed(format!(
            "expected {} distinct destinations, got {}",
            RECOMMENDATION_COUNT,
            destinations.len()
        )));
    }
    Ok(destinations)
}

pub struct RecommendationService {
    llm: Arc<dyn CompletionProvider>,
    images: Arc<dyn ImageSearch>,
}

impl RecommendationService {
    pub fn new(llm: Arc<dyn CompletionProvider>, images: Arc<dyn ImageSearch>) -> Self {
        Self { llm, images }
    }

    pub async fn recommend(&self, profile: &TravelerProfile) -> Result<Vec<RecommendedDestination>, ApiError> {
        profile.ensure_completed()?;

        let seed: u32 = rand::thread_rng().gen_range(1..=1_000_000);
        let request = CompletionRequest {
            system: RECOMMENDATION_SYSTEM_PROMPT.to_string(),
            prompt: recommendation_prompt(profile, seed),
            temperature: RECOMMENDATION_TEMPERATURE,
            json_response: false,
        };
        let raw = self.llm.complete(request).await?;
        let destinations = parse_destinations(&raw)?;

        let photos = join_all(destinations.iter().map(|destination| {
            let query = format!("{} {} travel", destination.name, destination.country);
            async move { representative_photo(self.images.as_ref(), &query).await }
        }))
        .await;

        Ok(destinations
            .into_iter()
            .zip(photos)
            .map(|(destination, photo)| RecommendedDestination { destination, photo })
            .collect())
    }
}
