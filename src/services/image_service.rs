use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::db::ActivityImageRepository;
use crate::models::destination::DestinationPhoto;
use crate::models::itinerary::{Activity, Itinerary};
use crate::services::activity_category::categorize;
use crate::services::fallback::{always_recoverable, with_fallback};

pub const FALLBACK_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1488646953014-85cb44e25828?w=1200&q=80";
pub const IMAGES_PER_ACTIVITY: usize = 3;
const UNSPLASH_SEARCH_URL: &str = "https://api.unsplash.com/search/photos";

#[derive(Debug, Clone, PartialEq)]
pub enum ImageError {
    NotConfigured,
    Request(String),
    Status(u16),
    NoResults(String),
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageError::NotConfigured => write!(f, "Image search is not configured"),
            ImageError::Request(err) => write!(f, "Image search request failed: {}", err),
            ImageError::Status(status) => write!(f, "Image search returned status {}", status),
            ImageError::NoResults(query) => write!(f, "No images found for '{}'", query),
        }
    }
}

impl std::error::Error for ImageError {}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<DestinationPhoto>, ImageError>;
}

#[derive(Debug, Deserialize)]
struct UnsplashSearchResponse {
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
    user: UnsplashUser,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashUser {
    name: String,
    links: UnsplashUserLinks,
}

#[derive(Debug, Deserialize)]
struct UnsplashUserLinks {
    html: String,
}

pub struct UnsplashClient {
    http_client: reqwest::Client,
    access_key: Option<String>,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            access_key,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        if config.unsplash_access_key.is_none() {
            log::warn!("UNSPLASH_ACCESS_KEY not set, placeholder images will be used");
        }
        Self::new(config.unsplash_access_key.clone())
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<DestinationPhoto>, ImageError> {
        let access_key = self.access_key.as_ref().ok_or(ImageError::NotConfigured)?;
        let per_page = count.to_string();

        let response = self
            .http_client
            .get(UNSPLASH_SEARCH_URL)
            .header("Authorization", format!("Client-ID {}", access_key))
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImageError::Status(response.status().as_u16()));
        }

        let body: UnsplashSearchResponse = response
            .json()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        if body.results.is_empty() {
            return Err(ImageError::NoResults(query.to_string()));
        }

        Ok(body
            .results
            .into_iter()
            .take(count)
            .map(|photo| DestinationPhoto {
                image_url: photo.urls.regular,
                photographer: Some(photo.user.name),
                photographer_url: Some(photo.user.links.html),
            })
            .collect())
    }
}

pub fn fallback_photo() -> DestinationPhoto {
    DestinationPhoto {
        image_url: FALLBACK_IMAGE_URL.to_string(),
        photographer: None,
        photographer_url: None,
    }
}

/// One photo for `query`, or the fallback photo on any failure.
pub async fn representative_photo(search: &dyn ImageSearch, query: &str) -> DestinationPhoto {
    let primary = async {
        search
            .search(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ImageError::NoResults(query.to_string()))
    };
    match with_fallback("Image search", primary, fallback_photo, always_recoverable).await {
        Ok((photo, _)) => photo,
        Err(_) => fallback_photo(),
    }
}

pub fn activity_query(activity: &Activity, destination: &str) -> String {
    let subject = if activity.venue.trim().is_empty() {
        activity.name.trim()
    } else {
        activity.venue.trim()
    };
    format!(
        "{} {} {}",
        subject,
        destination.trim(),
        categorize(&activity.name, &activity.venue, &activity.description)
    )
}

/// Lazily attaches photos to activities, cached by activity hash.
pub struct ActivityImageService {
    search: Arc<dyn ImageSearch>,
    cache: Arc<dyn ActivityImageRepository>,
}

impl ActivityImageService {
    pub fn new(search: Arc<dyn ImageSearch>, cache: Arc<dyn ActivityImageRepository>) -> Self {
        Self { search, cache }
    }

    /// Image URLs for one activity. Empty when nothing could be found.
    pub async fn images_for(&self, activity: &Activity, destination: &str) -> Vec<String> {
        let hash = activity.hash(destination);
        match self.cache.find_maybe(&hash).await {
            Ok(Some(urls)) => return urls,
            Ok(None) => {}
            Err(e) => log::warn!("Activity image cache lookup failed: {}", e),
        }

        let query = activity_query(activity, destination);
        let urls: Vec<String> = match self.search.search(&query, IMAGES_PER_ACTIVITY).await {
            Ok(photos) => photos.into_iter().map(|photo| photo.image_url).collect(),
            Err(e) => {
                log::warn!("No images for activity '{}': {}", activity.name, e);
                return Vec::new();
            }
        };

        if let Err(e) = self.cache.store(&hash, &urls).await {
            log::warn!("Failed to cache activity images: {}", e);
        }
        urls
    }

    /// Fills `images` on every activity that has none yet. Returns how many were filled.
    pub async fn populate(&self, itinerary: &mut Itinerary) -> usize {
        let destination = itinerary.destination.clone();
        let pending: Vec<(usize, usize)> = itinerary
            .days
            .iter()
            .enumerate()
            .flat_map(|(d, day)| {
                day.activities
                    .iter()
                    .enumerate()
                    .filter(|(_, activity)| activity.images.is_none())
                    .map(move |(a, _)| (d, a))
            })
            .collect();

        let fetched = join_all(pending.iter().map(|(d, a)| {
            self.images_for(&itinerary.days[*d].activities[*a], &destination)
        }))
        .await;

        let mut filled = 0;
        for ((d, a), urls) in pending.into_iter().zip(fetched) {
            if !urls.is_empty() {
                itinerary.days[d].activities[a].images = Some(urls);
                filled += 1;
            }
        }
        filled
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubImageSearch;
    use super::*;
    use crate::db::memory::MemoryActivityImageRepository;
    use crate::services::demo_itinerary::demo_tiers;
    use chrono::Utc;

    #[actix_rt::test]
    async fn test_representative_photo_falls_back() {
        let search = StubImageSearch::new(Some("Atlantis"));
        let photo = representative_photo(&search, "Atlantis Greece").await;
        assert_eq!(photo.image_url, FALLBACK_IMAGE_URL);

        let photo = representative_photo(&search, "Lisbon Portugal").await;
        assert_ne!(photo.image_url, FALLBACK_IMAGE_URL);
    }

    #[actix_rt::test]
    async fn test_images_are_cached_by_activity_hash() {
        let search = Arc::new(StubImageSearch::new(None));
        let service = ActivityImageService::new(search.clone(), Arc::new(MemoryActivityImageRepository::default()));
        let activity = &demo_tiers("Jaipur")[0].days[0].activities[0];

        let first = service.images_for(activity, "Jaipur").await;
        let second = service.images_for(activity, "Jaipur").await;

        assert_eq!(first.len(), IMAGES_PER_ACTIVITY);
        assert_eq!(first, second);
        assert_eq!(search.calls(), 1);
    }

    #[actix_rt::test]
    async fn test_populate_skips_failed_activities() {
        let search = Arc::new(StubImageSearch::new(Some("Night Bazaar")));
        let service = ActivityImageService::new(search, Arc::new(MemoryActivityImageRepository::default()));
        let draft = demo_tiers("Jaipur").remove(0);
        let mut itinerary = crate::models::itinerary::NewItinerary {
            destination: "Jaipur".to_string(),
            image_url: None,
            tier: draft.name.as_str().to_string(),
            duration_days: 2,
            days: draft.days,
            total_cost: draft.total_cost,
            migrated_from: None,
        }
        .into_itinerary("it_1".to_string(), crate::models::itinerary::Owner::User("u".into()), Utc::now());

        let filled = service.populate(&mut itinerary).await;
        assert_eq!(filled, 5);
        assert!(itinerary.days[0].activities[0].images.is_some());
        assert!(itinerary.days[1].activities[2].images.is_none());
    }

    #[test]
    fn test_activity_query_includes_category() {
        let activity = &demo_tiers("Jaipur")[0].days[0].activities[1];
        assert_eq!(activity_query(activity, "Jaipur"), "Jaipur Central Market Jaipur food");
    }
}
