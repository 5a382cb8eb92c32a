//! Minimal PDF 1.4 writer for laid-out itinerary documents.
//!
//! Supports the two standard Helvetica faces, stroked rectangles and JPEG
//! images passed through with `DCTDecode`.

use super::document::{DocumentLayout, DrawOp, EmbeddedImage, Font, PAGE_HEIGHT, PAGE_WIDTH};
use super::ExportError;

struct PdfObjects {
    bodies: Vec<Vec<u8>>,
}

impl PdfObjects {
    /// Reserves an object number so it can be referenced before it is written.
    fn reserve(&mut self) -> usize {
        self.bodies.push(Vec::new());
        self.bodies.len()
    }

    fn set(&mut self, id: usize, body: Vec<u8>) {
        self.bodies[id - 1] = body;
    }

    fn add(&mut self, body: Vec<u8>) -> usize {
        self.bodies.push(body);
        self.bodies.len()
    }
}

fn stream(dictionary: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< {} /Length {} >>\nstream\n", dictionary, data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Latin-1 bytes with PDF string escapes; characters outside Latin-1 become '?'.
fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let byte = u32::from(c);
        let byte = if byte <= 0xFF { byte as u8 } else { b'?' };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\n' | b'\r' => out.push(b' '),
            _ => out.push(byte),
        }
    }
    out
}

fn font_name(font: Font) -> &'static str {
    match font {
        Font::Regular => "F1",
        Font::Bold => "F2",
    }
}

fn content_stream(ops: &[DrawOp]) -> Vec<u8> {
    let mut content = Vec::new();
    for op in ops {
        match op {
            DrawOp::Text { x, y, size, font, text } => {
                content.extend_from_slice(
                    format!("BT /{} {:.1} Tf {:.2} {:.2} Td (", font_name(*font), size, x, y).as_bytes(),
                );
                content.extend_from_slice(&encode_text(text));
                content.extend_from_slice(b") Tj ET\n");
            }
            DrawOp::Rect { x, y, width, height } => {
                content.extend_from_slice(
                    format!("0.75 G 0.8 w {:.2} {:.2} {:.2} {:.2} re S\n", x, y, width, height).as_bytes(),
                );
            }
            DrawOp::Image { x, y, width, height, image } => {
                content.extend_from_slice(
                    format!(
                        "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im{} Do Q\n",
                        width, height, x, y, image
                    )
                    .as_bytes(),
                );
            }
        }
    }
    content
}

fn color_space(image: &EmbeddedImage) -> &'static str {
    match image.components {
        1 => "/DeviceGray",
        4 => "/DeviceCMYK",
        _ => "/DeviceRGB",
    }
}

pub fn render(layout: &DocumentLayout) -> Result<Vec<u8>, ExportError> {
    if layout.pages.is_empty() {
        return Err(ExportError::Render("document has no pages".to_string()));
    }

    let mut objects = PdfObjects { bodies: Vec::new() };
    let catalog = objects.reserve();
    let pages = objects.reserve();
    let regular = objects.add(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_vec());
    let bold = objects.add(b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>".to_vec());

    let image_ids: Vec<usize> = layout
        .images
        .iter()
        .map(|image| {
            objects.add(stream(
                &format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width,
                    image.height,
                    color_space(image)
                ),
                &image.data,
            ))
        })
        .collect();

    let xobjects = image_ids
        .iter()
        .enumerate()
        .map(|(index, id)| format!("/Im{} {} 0 R", index, id))
        .collect::<Vec<_>>()
        .join(" ");
    let resources = format!(
        "<< /Font << /F1 {} 0 R /F2 {} 0 R >> /XObject << {} >> >>",
        regular, bold, xobjects
    );

    let mut kids = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = objects.add(stream("", &content_stream(&page.ops)));
        let page_id = objects.add(
            format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.0} {:.0}] /Resources {} /Contents {} 0 R >>",
                pages, PAGE_WIDTH, PAGE_HEIGHT, resources, content
            )
            .into_bytes(),
        );
        kids.push(format!("{} 0 R", page_id));
    }

    objects.set(catalog, format!("<< /Type /Catalog /Pages {} 0 R >>", pages).into_bytes());
    objects.set(
        pages,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), kids.len()).into_bytes(),
    );

    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.bodies.len());
    for (index, body) in objects.bodies.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.bodies.len() + 1,
            catalog,
            xref_offset
        )
        .as_bytes(),
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::export::document::Page;

    #[test]
    fn test_text_escaping() {
        assert_eq!(encode_text("Café (day 1)"), b"Caf\xE9 \\(day 1\\)".to_vec());
        assert_eq!(encode_text("東京"), b"??".to_vec());
    }

    #[test]
    fn test_render_writes_valid_skeleton() {
        let layout = DocumentLayout {
            pages: vec![
                Page {
                    ops: vec![DrawOp::Text {
                        x: 48.0,
                        y: 780.0,
                        size: 12.0,
                        font: Font::Bold,
                        text: "Goa".to_string(),
                    }],
                },
                Page { ops: Vec::new() },
            ],
            images: Vec::new(),
        };

        let bytes = render(&layout).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.4"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("(Goa) Tj"));
        assert!(text.trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_empty_layout_is_an_error() {
        let layout = DocumentLayout { pages: Vec::new(), images: Vec::new() };
        assert!(matches!(render(&layout), Err(ExportError::Render(_))));
    }
}
