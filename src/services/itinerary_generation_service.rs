//! Three-tier itinerary generation.
//!
//! The LLM call is bounded by the configured timeout. A timeout or a missing
//! credential switches to the demo tiers; every other failure is surfaced.
//! Persistence happens afterwards through an [`ItinerarySink`], so guests and
//! users differ only in where the tiers land.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::db::ItineraryRepository;
use crate::error::ApiError;
use crate::models::itinerary::{
    check_day_sequence, Itinerary, NewItinerary, Tier, TierDraft, TiersEnvelope,
};
use crate::models::package::GenerationSource;
use crate::models::profile::TravelerProfile;
use crate::services::demo_itinerary::demo_tiers;
use crate::services::fallback::{with_fallback, Outcome, Recovery};
use crate::services::llm_service::{parse_structured, CompletionProvider, CompletionRequest, LlmError};
use crate::services::prompt_service::{build_itinerary_prompt, PromptSource, ITINERARY_SYSTEM_PROMPT};

pub const DAYS_PER_TIER: usize = 2;
const GENERATION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub destination: String,
    #[serde(default)]
    pub trip_brief: Option<String>,
    #[serde(default)]
    pub destination_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedItineraries {
    pub destination: String,
    pub source: GenerationSource,
    pub tiers: Vec<Itinerary>,
}

/// Where freshly generated tiers are stored.
#[async_trait]
pub trait ItinerarySink: Send {
    async fn save(&mut self, itinerary: NewItinerary) -> Result<Itinerary, ApiError>;
}

/// Saves tiers for an authenticated user. Failures are fatal for the request.
pub struct UserItinerarySink {
    repository: Arc<dyn ItineraryRepository>,
    user_id: String,
}

impl UserItinerarySink {
    pub fn new(repository: Arc<dyn ItineraryRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
        }
    }
}

#[async_trait]
impl ItinerarySink for UserItinerarySink {
    async fn save(&mut self, itinerary: NewItinerary) -> Result<Itinerary, ApiError> {
        self.repository
            .insert(&self.user_id, itinerary)
            .await
            .map_err(|e| ApiError::Persistence(format!("Failed to save itinerary: {}", e)))
    }
}

fn classify(err: &LlmError) -> Recovery {
    match err {
        LlmError::Timeout | LlmError::NotConfigured => Recovery::Recoverable,
        _ => Recovery::Fatal,
    }
}

/// Rejects anything that is not exactly Budget, Balanced and Luxe with two contiguous days each.
/// Returns the tiers in canonical order.
pub fn validate_tiers(mut tiers: Vec<TierDraft>) -> Result<Vec<TierDraft>, LlmError> {
    if tiers.len() != Tier::ALL.len() {
        return Err(LlmError::Malformed(format!(
            "expected {} tiers, got {}",
            Tier::ALL.len(),
            tiers.len()
        )));
    }

    let names: HashSet<Tier> = tiers.iter().map(|tier| tier.name).collect();
    if names.len() != Tier::ALL.len() {
        return Err(LlmError::Malformed("tier names must be distinct".to_string()));
    }

    for tier in &tiers {
        if tier.days.len() != DAYS_PER_TIER {
            return Err(LlmError::Malformed(format!(
                "{} tier has {} days, expected {}",
                tier.name,
                tier.days.len(),
                DAYS_PER_TIER
            )));
        }
        check_day_sequence(&tier.days)
            .map_err(|e| LlmError::Malformed(format!("{} tier: {}", tier.name, e)))?;
        if let Some(day) = tier.days.iter().find(|day| day.activities.is_empty()) {
            return Err(LlmError::Malformed(format!(
                "{} tier day {} has no activities",
                tier.name, day.day
            )));
        }
    }

    tiers.sort_by_key(|tier| Tier::ALL.iter().position(|t| *t == tier.name));
    Ok(tiers)
}

pub fn parse_tiers(raw: &str) -> Result<Vec<TierDraft>, LlmError> {
    let envelope: TiersEnvelope = parse_structured(raw, "tiers")?;
    validate_tiers(envelope.tiers)
}

pub struct ItineraryGenerator {
    llm: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl ItineraryGenerator {
    pub fn new(llm: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    async fn request_tiers(&self, prompt: String) -> Result<Vec<TierDraft>, LlmError> {
        let request = CompletionRequest::json(ITINERARY_SYSTEM_PROMPT, prompt, GENERATION_TEMPERATURE);
        let call = self.llm.complete(request);
        let raw = match timeout(self.timeout, call).await {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::Timeout),
        };
        parse_tiers(&raw)
    }

    /// Produces the three validated tiers without persisting anything.
    pub async fn generate_tiers(
        &self,
        destination: &str,
        source: PromptSource<'_>,
    ) -> Result<(Vec<TierDraft>, GenerationSource), ApiError> {
        let prompt = build_itinerary_prompt(destination, source);
        let (tiers, outcome) = with_fallback(
            "Itinerary generation",
            self.request_tiers(prompt),
            || demo_tiers(destination),
            classify,
        )
        .await?;

        let source = match outcome {
            Outcome::Primary => GenerationSource::Llm,
            Outcome::Fallback => GenerationSource::Mock,
        };
        Ok((tiers, source))
    }

    /// Runs a fresh generation and stores one itinerary per tier through `sink`.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        profile: Option<&TravelerProfile>,
        sink: &mut dyn ItinerarySink,
    ) -> Result<GeneratedItineraries, ApiError> {
        let destination = request.destination.trim();
        if destination.is_empty() {
            return Err(ApiError::validation("Destination is required"));
        }

        let source = PromptSource::select(profile, request.trip_brief.as_deref());
        let (drafts, generation_source) = self.generate_tiers(destination, source).await?;

        log::info!(
            "Generated {} tiers for {} ({:?}) at {}",
            drafts.len(),
            destination,
            generation_source,
            Utc::now()
        );

        let mut tiers = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let itinerary = NewItinerary {
                destination: destination.to_string(),
                image_url: request.destination_image_url.clone(),
                tier: draft.name.as_str().to_string(),
                duration_days: draft.days.len() as u32,
                days: draft.days,
                total_cost: draft.total_cost,
                migrated_from: None,
            };
            tiers.push(sink.save(itinerary).await?);
        }

        Ok(GeneratedItineraries {
            destination: destination.to_string(),
            source: generation_source,
            tiers,
        })
    }
}
