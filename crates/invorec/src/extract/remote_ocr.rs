//! Remote OCR fallback (tier 4): ask the store for a temporary copy with
//! built-in document recognition, export its text, delete the copy. Last
//! resort; runs only when no earlier tier produced an amount or a date.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::drive::{DriveClient, RemoteFile};
use crate::error::ExtractError;
use crate::extract::{ExtractedInvoice, ExtractionMethod, ExtractionTier};
use crate::parser::ParsedFields;

pub struct RemoteOcrTier {
    drive: Arc<dyn DriveClient>,
}

impl RemoteOcrTier {
    pub fn new(drive: Arc<dyn DriveClient>) -> Self {
        Self { drive }
    }
}

#[async_trait]
impl ExtractionTier for RemoteOcrTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::RemoteOcr
    }

    fn applies(&self, current: &ExtractedInvoice) -> bool {
        current.amount.is_none() && current.date.is_none()
    }

    async fn attempt(
        &self,
        file: &RemoteFile,
        _bytes: &[u8],
    ) -> Result<Option<String>, ExtractError> {
        let temp_id = self.drive.copy_as_recognized_document(&file.id).await?;

        let exported = self.drive.export_plain_text(&temp_id).await;

        // The temporary copy is removed on every exit path, including a
        // failed export; a delete failure is logged, never propagated
        // over the export result.
        if let Err(e) = self.drive.delete_file(&temp_id).await {
            warn!("Failed to delete temporary copy '{}': {}", temp_id, e);
        }

        let text = exported?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn sufficient(&self, text: &str, _fields: &ParsedFields) -> bool {
        !text.trim().is_empty()
    }
}
