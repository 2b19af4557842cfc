//! Document-to-text extraction and the truncation policy applied to its output.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::ExtractionError;

/// Character cap applied to extracted material.
pub const EXTRACT_CHAR_CAP: usize = 30_000;
/// Marker appended when extracted material is cut at `EXTRACT_CHAR_CAP`.
pub const EXTRACT_TRUNCATION_MARKER: &str = "\n\n[Content truncated for processing...]";

/// Cut `text` to at most `max_chars` characters, appending `marker` when cut.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            debug!(
                from = text.chars().count(),
                to = max_chars,
                "truncating text"
            );
            let mut out = String::with_capacity(cut + marker.len());
            out.push_str(&text[..cut]);
            out.push_str(marker);
            out
        }
        None => text.to_owned(),
    }
}

/// Turns an uploaded document into raw text.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract the text of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError` for unreadable or unsupported input.
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError>;
}

/// Reads plain-text and markdown files.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

const TEXT_EXTENSIONS: [&str; 4] = ["txt", "text", "md", "markdown"];

#[async_trait]
impl Extractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            if !TEXT_EXTENSIONS.contains(&ext.as_str()) {
                return Err(ExtractionError::UnsupportedFormat(ext));
            }
        }

        let bytes = tokio::fs::read(path).await?;
        let text = String::from_utf8(bytes).map_err(|_| ExtractionError::InvalidEncoding)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ExtractionError::NoText);
        }

        info!(path = %path.display(), chars = text.chars().count(), "extracted text");
        Ok(text.to_owned())
    }
}

/// Reads the text layer of PDF documents.
///
/// Words on a page are joined by single spaces and pages are separated by a
/// blank line. Scanned PDFs without a text layer fail with `NoText`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[async_trait]
impl Extractor for PdfExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let bytes = tokio::fs::read(path).await?;
        let text = tokio::task::spawn_blocking(move || pdf_text(&bytes))
            .await
            .map_err(|e| ExtractionError::Io(std::io::Error::other(e)))??;
        if text.is_empty() {
            return Err(ExtractionError::NoText);
        }

        info!(path = %path.display(), chars = text.chars().count(), "extracted PDF text");
        Ok(text)
    }
}

/// Text of every page of an in-memory PDF, in page order.
///
/// # Errors
///
/// Returns `ExtractionError::Pdf` when the document cannot be parsed.
pub fn pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let pages = doc.get_pages();
    debug!(pages = pages.len(), "parsing PDF");

    let mut text = String::new();
    for &page in pages.keys() {
        let raw = doc.extract_text(&[page])?;
        let words: Vec<&str> = raw.split_whitespace().collect();
        text.push_str(&words.join(" "));
        text.push_str("\n\n");
    }
    Ok(text.trim().to_owned())
}

/// Extractor used for uploads: PDFs by their text layer, anything else as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

#[async_trait]
impl Extractor for DocumentExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractionError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            PdfExtractor.extract(path).await
        } else {
            PlainTextExtractor.extract(path).await
        }
    }
}

/// Title suggested for an uploaded file: its name without the extension.
#[must_use]
pub fn default_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_text("hello", 10, "[cut]"), "hello");
        assert_eq!(truncate_text("hello", 5, "[cut]"), "hello");
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let out = truncate_text("ééééé", 3, "[cut]");
        assert_eq!(out, "ééé[cut]");
    }

    #[test]
    fn title_defaults_to_file_stem() {
        assert_eq!(default_title(Path::new("/tmp/Cell Biology.pdf")), "Cell Biology");
    }

    #[tokio::test]
    async fn reads_text_files() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "  Mitochondria make ATP.  ").unwrap();

        let text = PlainTextExtractor.extract(file.path()).await.unwrap();
        assert_eq!(text, "Mitochondria make ATP.");
    }

    #[tokio::test]
    async fn rejects_pdf_and_blank_files() {
        let pdf = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = PlainTextExtractor.extract(pdf.path()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ext) if ext == "pdf"));

        let blank = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        let err = PlainTextExtractor.extract(blank.path()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    fn sample_pdf(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{Document, Object, Stream, dictionary};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = i64::try_from(kids.len()).unwrap();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn pdf_pages_are_joined_with_blank_lines() {
        let bytes = sample_pdf(&["Mitochondria  make ATP", "Ribosomes build proteins"]);
        let text = pdf_text(&bytes).unwrap();
        assert_eq!(text, "Mitochondria make ATP\n\nRibosomes build proteins");
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let err = pdf_text(b"%PDF-1.7 definitely not a document").unwrap_err();
        assert!(matches!(err, ExtractionError::Pdf(_)));
    }

    #[tokio::test]
    async fn uploads_route_by_extension() {
        let mut pdf = tempfile::Builder::new().suffix(".PDF").tempfile().unwrap();
        pdf.write_all(&sample_pdf(&["Cells divide"])).unwrap();
        let text = DocumentExtractor.extract(pdf.path()).await.unwrap();
        assert_eq!(text, "Cells divide");

        let mut notes = tempfile::Builder::new().suffix(".md").tempfile().unwrap();
        writeln!(notes, "# Cells").unwrap();
        let text = DocumentExtractor.extract(notes.path()).await.unwrap();
        assert_eq!(text, "# Cells");

        let doc = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        let err = DocumentExtractor.extract(doc.path()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ext) if ext == "docx"));
    }

    #[tokio::test]
    async fn blank_pdf_has_no_text() {
        let mut pdf = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        pdf.write_all(&sample_pdf(&[" "])).unwrap();
        let err = PdfExtractor.extract(pdf.path()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::NoText));
    }

    #[tokio::test]
    async fn rejects_binary_content() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let err = PlainTextExtractor.extract(file.path()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidEncoding));
    }
}
