//! Tiered extraction of structured invoice metadata from one remote file.
//!
//! The pipeline never fails: each tier is attempted in priority order and
//! the first tier whose output satisfies its own sufficiency predicate
//! wins; filename heuristics always run first and seed defaults that
//! later tiers can override field by field.

pub mod filename;
pub mod local_ocr;
pub mod remote_ocr;
pub mod text_layer;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::drive::{DriveClient, RemoteFile};
use crate::error::ExtractError;
use crate::parser::{self, ParsedFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    Filename,
    TextLayer,
    LocalOcr,
    RemoteOcr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Filename => "filename",
            ExtractionMethod::TextLayer => "text-layer",
            ExtractionMethod::LocalOcr => "local-ocr",
            ExtractionMethod::RemoteOcr => "remote-ocr",
        }
    }
}

impl std::str::FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filename" => Ok(ExtractionMethod::Filename),
            "text-layer" => Ok(ExtractionMethod::TextLayer),
            "local-ocr" => Ok(ExtractionMethod::LocalOcr),
            "remote-ocr" => Ok(ExtractionMethod::RemoteOcr),
            other => Err(format!("unknown extraction method '{}'", other)),
        }
    }
}

/// Structured metadata recovered from one file. Every field except the
/// method is optional: extraction degrades, it does not fail.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedInvoice {
    pub vendor: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub tax_amount: Option<f64>,
    pub tax_rate: Option<f64>,
    pub raw_text: Option<String>,
    pub extraction_method: ExtractionMethod,
}

impl ExtractedInvoice {
    fn merge_fields(&mut self, fields: ParsedFields, method: ExtractionMethod) {
        if fields.vendor.is_some() {
            self.vendor = fields.vendor;
        }
        if fields.amount.is_some() {
            self.amount = fields.amount;
        }
        if fields.date.is_some() {
            self.date = fields.date;
        }
        if fields.invoice_number.is_some() {
            self.invoice_number = fields.invoice_number;
        }
        if fields.tax_amount.is_some() {
            self.tax_amount = fields.tax_amount;
        }
        if fields.tax_rate.is_some() {
            self.tax_rate = fields.tax_rate;
        }
        self.extraction_method = method;
    }
}

/// One extraction technique. Tiers produce raw text; the pipeline owns
/// parsing and merging.
#[async_trait]
pub trait ExtractionTier: Send + Sync {
    fn method(&self) -> ExtractionMethod;

    /// Whether this tier should run at all, given what earlier tiers
    /// already produced.
    fn applies(&self, current: &ExtractedInvoice) -> bool {
        let _ = current;
        true
    }

    /// `Ok(None)` means the tier had nothing to offer for this file
    /// (no text layer, capability absent); that is not an error.
    async fn attempt(
        &self,
        file: &RemoteFile,
        bytes: &[u8],
    ) -> Result<Option<String>, ExtractError>;

    /// Whether the produced text is good enough to stop the fallback.
    fn sufficient(&self, text: &str, fields: &ParsedFields) -> bool;
}

pub struct ExtractionPipeline {
    tiers: Vec<Box<dyn ExtractionTier>>,
    raw_text_limit: usize,
}

impl ExtractionPipeline {
    pub fn new(tiers: Vec<Box<dyn ExtractionTier>>, raw_text_limit: usize) -> Self {
        Self {
            tiers,
            raw_text_limit,
        }
    }

    /// Production constructor. The local OCR tier is included only when
    /// the rasterizer and recognizer binaries are actually present.
    pub fn from_config(config: &ExtractionConfig, drive: Arc<dyn DriveClient>) -> Self {
        let mut tiers: Vec<Box<dyn ExtractionTier>> = vec![Box::new(
            text_layer::TextLayerTier::new(config.min_text_layer_chars),
        )];

        if config.enable_local_ocr {
            match local_ocr::LocalOcrTier::detect(
                &config.ocr_languages,
                config.ocr_dpi,
                config.min_ocr_chars,
            ) {
                Some(tier) => tiers.push(Box::new(tier)),
                None => debug!("Local OCR tools not found, tier disabled"),
            }
        }

        if config.enable_remote_ocr {
            tiers.push(Box::new(remote_ocr::RemoteOcrTier::new(drive)));
        }

        Self::new(tiers, 4096)
    }

    pub fn with_raw_text_limit(mut self, limit: usize) -> Self {
        self.raw_text_limit = limit;
        self
    }

    /// Runs the fallback chain for one file. Always returns a result;
    /// tier failures are logged and absorbed.
    pub async fn extract(&self, file: &RemoteFile, bytes: &[u8]) -> ExtractedInvoice {
        let mut result = filename::extract(&file.name);

        for tier in &self.tiers {
            if !tier.applies(&result) {
                continue;
            }

            let text = match tier.attempt(file, bytes).await {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        "Extraction tier '{}' failed for '{}': {}",
                        tier.method().as_str(),
                        file.name,
                        e
                    );
                    continue;
                }
            };

            let fields = parser::parse(&text);
            if tier.sufficient(&text, &fields) {
                debug!(
                    "Tier '{}' accepted for '{}' ({} chars)",
                    tier.method().as_str(),
                    file.name,
                    text.chars().count()
                );
                result.merge_fields(fields, tier.method());
                result.raw_text = Some(truncate_chars(&text, self.raw_text_limit));
                break;
            }
        }

        result
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
