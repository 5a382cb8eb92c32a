//! Paginated document export.
//!
//! Layout is computed in PDF points with the origin at the bottom-left of an
//! A4 page, then handed to [`super::pdf::render`].

use async_trait::async_trait;
use futures::future::join_all;

use super::{export_filename, pdf, ExportError, ExportFile};
use crate::models::itinerary::{Activity, Itinerary};

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 48.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const BLOCK_PADDING: f32 = 10.0;
const BLOCK_GAP: f32 = 12.0;
const LINE_HEIGHT: f32 = 14.0;
const TITLE_LINE_HEIGHT: f32 = 18.0;
const DAY_HEADER_HEIGHT: f32 = 30.0;
const IMAGE_HEIGHT: f32 = 140.0;
const MAX_DESCRIPTION_LINES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text { x: f32, y: f32, size: f32, font: Font, text: String },
    Rect { x: f32, y: f32, width: f32, height: f32 },
    Image { x: f32, y: f32, width: f32, height: f32, image: usize },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

/// A baseline JPEG ready to embed as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub components: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub pages: Vec<Page>,
    pub images: Vec<EmbeddedImage>,
}

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ExportError>;
}

pub struct HttpImageFetcher {
    http_client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ExportError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ExportError::Image(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExportError::Image(format!("status {}", response.status())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::Image(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Width, height and component count from the first SOF segment of a JPEG.
pub fn jpeg_info(bytes: &[u8]) -> Option<(u32, u32, u8)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        if marker == 0xFF {
            i += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD9).contains(&marker) {
            i += 2;
            continue;
        }
        let length = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let segment = bytes.get(i + 4..i + 10)?;
            let height = u16::from_be_bytes([segment[1], segment[2]]) as u32;
            let width = u16::from_be_bytes([segment[3], segment[4]]) as u32;
            if width == 0 || height == 0 {
                return None;
            }
            return Some((width, height, segment[5]));
        }
        i += 2 + length;
    }
    None
}

async fn load_image(fetcher: &dyn ImageFetcher, url: &str) -> Result<EmbeddedImage, ExportError> {
    let data = fetcher.fetch(url).await?;
    let (width, height, components) =
        jpeg_info(&data).ok_or_else(|| ExportError::Image(format!("{} is not a JPEG", url)))?;
    Ok(EmbeddedImage {
        data,
        width,
        height,
        components,
    })
}

fn wrap_text(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * 0.5)) as usize).max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageCursor {
    pages: Vec<Page>,
    current: Page,
    y: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Page::default(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn remaining(&self) -> f32 {
        self.y - MARGIN
    }

    fn ensure(&mut self, height: f32) {
        if height > self.remaining() && !self.current.ops.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn line(&mut self, x: f32, advance: f32, size: f32, font: Font, text: impl Into<String>) {
        self.y -= advance;
        self.current.ops.push(DrawOp::Text {
            x,
            y: self.y,
            size,
            font,
            text: text.into(),
        });
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }
        self.pages
    }
}

struct ActivityBlock<'a> {
    activity: &'a Activity,
    description: Vec<String>,
    image: Option<(usize, f32, f32)>,
}

impl ActivityBlock<'_> {
    fn height(&self) -> f32 {
        let image = self.image.map_or(0.0, |(_, _, h)| h + 8.0);
        BLOCK_PADDING * 2.0
            + TITLE_LINE_HEIGHT
            + LINE_HEIGHT * (3 + self.description.len()) as f32
            + image
    }
}

fn activity_block<'a>(activity: &'a Activity, image: Option<(usize, &EmbeddedImage)>) -> ActivityBlock<'a> {
    let inner_width = CONTENT_WIDTH - 2.0 * BLOCK_PADDING;
    let mut description = wrap_text(&activity.description, 10.0, inner_width);
    description.truncate(MAX_DESCRIPTION_LINES);

    let image = image.map(|(index, embedded)| {
        let aspect = embedded.width as f32 / embedded.height as f32;
        let width = (IMAGE_HEIGHT * aspect).min(inner_width);
        (index, width, width / aspect)
    });

    ActivityBlock {
        activity,
        description,
        image,
    }
}

fn draw_block(cursor: &mut PageCursor, block: &ActivityBlock<'_>) {
    let height = block.height();
    cursor.ensure(height + BLOCK_GAP);

    let top = cursor.y;
    let x = MARGIN + BLOCK_PADDING;
    let activity = block.activity;
    cursor.current.ops.push(DrawOp::Rect {
        x: MARGIN,
        y: top - height,
        width: CONTENT_WIDTH,
        height,
    });

    cursor.y -= BLOCK_PADDING;
    cursor.line(x, TITLE_LINE_HEIGHT - 4.0, 13.0, Font::Bold, activity.name.clone());
    cursor.y -= 4.0;

    let when = match (activity.time_of_day.trim(), activity.time.trim()) {
        ("", time) => time.to_string(),
        (part, "") => part.to_string(),
        (part, time) => format!("{} \u{b7} {}", part, time),
    };
    cursor.line(x, LINE_HEIGHT, 10.0, Font::Regular, when);
    cursor.line(
        x,
        LINE_HEIGHT,
        10.0,
        Font::Regular,
        format!("{}, {}", activity.venue.trim(), activity.location.trim()),
    );
    for line in &block.description {
        cursor.line(x, LINE_HEIGHT, 10.0, Font::Regular, line.clone());
    }
    let duration = if activity.duration.trim().is_empty() {
        "-"
    } else {
        activity.duration.trim()
    };
    cursor.line(
        x,
        LINE_HEIGHT,
        10.0,
        Font::Bold,
        format!("Cost: {}    Duration: {}", activity.cost, duration),
    );

    if let Some((image, width, image_height)) = block.image {
        cursor.y -= 8.0 + image_height;
        cursor.current.ops.push(DrawOp::Image {
            x,
            y: cursor.y,
            width,
            height: image_height,
            image,
        });
    }

    cursor.y = top - height - BLOCK_GAP;
}

/// Cover followed by one section per day. `images` holds the optional photo of each activity, in order.
pub fn layout_document(itinerary: &Itinerary, images: Vec<Option<EmbeddedImage>>) -> DocumentLayout {
    let mut cursor = PageCursor::new();
    let mut embedded = Vec::new();
    let mut images = images.into_iter();

    cursor.line(MARGIN, 26.0, 26.0, Font::Bold, itinerary.destination.clone());
    cursor.line(MARGIN, 22.0, 14.0, Font::Regular, format!("{} itinerary", itinerary.tier));
    cursor.line(
        MARGIN,
        LINE_HEIGHT + 4.0,
        12.0,
        Font::Regular,
        format!("{} days", itinerary.duration_days),
    );
    cursor.line(
        MARGIN,
        LINE_HEIGHT + 4.0,
        12.0,
        Font::Regular,
        format!("Total cost: {}", itinerary.total_cost),
    );
    cursor.y -= 24.0;

    for day in &itinerary.days {
        let blocks: Vec<ActivityBlock<'_>> = day
            .activities
            .iter()
            .map(|activity| {
                let image = images.next().flatten().map(|image| {
                    embedded.push(image);
                    embedded.len() - 1
                });
                activity_block(activity, image.map(|index| (index, &embedded[index])))
            })
            .collect();

        let first_block = blocks.first().map_or(0.0, |block| block.height() + BLOCK_GAP);
        cursor.ensure(DAY_HEADER_HEIGHT + first_block);
        let header = if day.date.trim().is_empty() {
            format!("Day {}", day.day)
        } else {
            format!("Day {} - {}", day.day, day.date.trim())
        };
        cursor.line(MARGIN, 20.0, 16.0, Font::Bold, header);
        cursor.y -= DAY_HEADER_HEIGHT - 20.0;

        for block in &blocks {
            draw_block(&mut cursor, block);
        }
    }

    DocumentLayout {
        pages: cursor.finish(),
        images: embedded,
    }
}

/// Renders `itinerary` as a PDF. Activity photos are best-effort.
pub async fn to_document(itinerary: &Itinerary, fetcher: &dyn ImageFetcher) -> Result<ExportFile, ExportError> {
    let loads = itinerary
        .days
        .iter()
        .flat_map(|day| day.activities.iter())
        .map(|activity| async move {
            let url = activity.images.as_ref().and_then(|urls| urls.first())?;
            match load_image(fetcher, url).await {
                Ok(image) => Some(image),
                Err(e) => {
                    log::warn!("Omitting image for '{}' from document: {}", activity.name, e);
                    None
                }
            }
        });
    let images = join_all(loads).await;

    let layout = layout_document(itinerary, images);
    let bytes = pdf::render(&layout)?;
    Ok(ExportFile {
        filename: export_filename(&itinerary.destination, &itinerary.tier, "pdf"),
        content_type: "application/pdf",
        bytes,
    })
}


#[cfg(test)]
mod tests {
    use super::stub::{tiny_jpeg, StubImageFetcher};
    use super::*;
    use crate::models::itinerary::{Day, NewItinerary, Owner};
    use crate::services::demo_itinerary::demo_tiers;
    use chrono::Utc;

    fn itinerary(days: Vec<Day>) -> Itinerary {
        NewItinerary {
            destination: "Goa".to_string(),
            image_url: None,
            tier: "Balanced".to_string(),
            duration_days: days.len() as u32,
            days,
            total_cost: 23_000,
            migrated_from: None,
        }
        .into_itinerary("it_9".to_string(), Owner::User("u1".to_string()), Utc::now())
    }

    fn all_ops(layout: &DocumentLayout) -> impl Iterator<Item = &DrawOp> {
        layout.pages.iter().flat_map(|page| page.ops.iter())
    }

    #[test]
    fn test_jpeg_dimensions() {
        assert_eq!(jpeg_info(&tiny_jpeg()), Some((3, 2, 3)));
        assert_eq!(jpeg_info(b"\x89PNG\r\n"), None);
    }

    #[test]
    fn test_cover_and_day_sections() {
        let trip = itinerary(demo_tiers("Goa").remove(1).days);
        let layout = layout_document(&trip, vec![None; 6]);

        let texts: Vec<&str> = all_ops(&layout)
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], "Goa");
        assert!(texts.contains(&"Balanced itinerary"));
        assert!(texts.contains(&"Total cost: 23000"));
        assert!(texts.contains(&"Day 1 - Saturday"));
        assert!(texts.contains(&"Day 2 - Sunday"));

        let blocks = all_ops(&layout).filter(|op| matches!(op, DrawOp::Rect { .. })).count();
        assert_eq!(blocks, 6);
    }

    #[test]
    fn test_long_days_paginate_within_margins() {
        let mut day = demo_tiers("Goa").remove(0).days.remove(0);
        let template = day.activities[0].clone();
        day.activities = (0..25).map(|_| template.clone()).collect();
        let trip = itinerary(vec![day]);

        let layout = layout_document(&trip, vec![None; 25]);

        assert!(layout.pages.len() > 2);
        for op in all_ops(&layout) {
            if let DrawOp::Rect { y, height, .. } = op {
                assert!(*y >= MARGIN - 0.01);
                assert!(*y + *height <= PAGE_HEIGHT - MARGIN + 0.01);
            }
        }
    }

    #[actix_rt::test]
    async fn test_broken_image_is_omitted_not_fatal() {
        let mut days = demo_tiers("Goa").remove(0).days;
        days[0].activities[0].images = Some(vec!["https://img.test/ok.jpg".to_string()]);
        days[0].activities[1].images = Some(vec!["https://img.test/broken.jpg".to_string()]);
        let trip = itinerary(days);

        let file = to_document(&trip, &StubImageFetcher).await.unwrap();

        assert_eq!(file.filename, "goa-balanced-itinerary.pdf");
        assert!(file.bytes.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&file.bytes);
        assert!(text.contains("/Im0"));
        assert!(!text.contains("/Im1"));
    }
}
