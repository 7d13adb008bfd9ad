//! Embedded text layer extraction (tier 2).

use async_trait::async_trait;
use tracing::debug;

use crate::drive::RemoteFile;
use crate::error::ExtractError;
use crate::extract::{ExtractionMethod, ExtractionTier};
use crate::parser::ParsedFields;

pub struct TextLayerTier {
    /// Minimum extracted length before the layer is trusted. Scanned
    /// images often misreport a text layer holding a few stray glyphs.
    min_chars: usize,
}

impl TextLayerTier {
    pub fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }
}

#[async_trait]
impl ExtractionTier for TextLayerTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::TextLayer
    }

    async fn attempt(
        &self,
        file: &RemoteFile,
        bytes: &[u8],
    ) -> Result<Option<String>, ExtractError> {
        let doc = match lopdf::Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                // Not a parseable PDF; normal for scanned image uploads.
                debug!("No parseable PDF structure in '{}': {}", file.name, e);
                return Ok(None);
            }
        };

        let mut text = String::new();
        for (page_num, _) in doc.get_pages() {
            if let Ok(page_text) = doc.extract_text(&[page_num]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn sufficient(&self, text: &str, _fields: &ParsedFields) -> bool {
        text.trim().chars().count() > self.min_chars
    }
}
