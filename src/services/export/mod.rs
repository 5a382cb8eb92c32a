//! Calendar and document exports of a stored itinerary.

pub mod calendar;
pub mod document;
pub mod pdf;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    #[error("no valid events")]
    NoValidEvents,

    #[error("Calendar rendering failed: {0}")]
    Calendar(String),

    #[error("Document rendering failed: {0}")]
    Render(String),

    #[error("Image unavailable: {0}")]
    Image(String),
}

/// A finished export ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn slug(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for c in value.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// `{destination}-{tier}-itinerary.{ext}`, lowercased and hyphenated.
pub fn export_filename(destination: &str, tier: &str, extension: &str) -> String {
    let destination = match slug(destination) {
        s if s.is_empty() => "trip".to_string(),
        s => s,
    };
    format!("{}-{}-itinerary.{}", destination, slug(tier), extension)
}
