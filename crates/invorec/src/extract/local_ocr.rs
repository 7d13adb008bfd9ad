//! Local OCR (tier 3): rasterize pages with poppler's pdftoppm, then
//! recognize each page with the tesseract CLI. The capability is probed
//! at pipeline construction; a machine without the tools simply runs
//! without this tier.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tracing::debug;

use crate::drive::RemoteFile;
use crate::error::ExtractError;
use crate::extract::{ExtractionMethod, ExtractionTier};
use crate::parser::ParsedFields;

const RASTERIZER_BIN: &str = "pdftoppm";
const RECOGNIZER_BIN: &str = "tesseract";

pub struct LocalOcrTier {
    languages: String,
    dpi: u32,
    min_chars: usize,
}

impl LocalOcrTier {
    /// Probes for the rasterizer and recognizer binaries. `None` when
    /// either is missing; absence is a normal condition, not an error.
    pub fn detect(languages: &[String], dpi: u32, min_chars: usize) -> Option<Self> {
        if !binary_available(RASTERIZER_BIN) || !binary_available(RECOGNIZER_BIN) {
            return None;
        }
        Some(Self::new(languages, dpi, min_chars))
    }

    pub fn new(languages: &[String], dpi: u32, min_chars: usize) -> Self {
        let languages = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };
        Self {
            languages,
            dpi,
            min_chars,
        }
    }
}

fn binary_available(name: &str) -> bool {
    std::process::Command::new(name)
        .arg("-v")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .is_ok()
}

#[async_trait]
impl ExtractionTier for LocalOcrTier {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::LocalOcr
    }

    async fn attempt(
        &self,
        file: &RemoteFile,
        bytes: &[u8],
    ) -> Result<Option<String>, ExtractError> {
        // All artifacts live in one TempDir scoped to this attempt; it is
        // removed on every exit path, including the error returns below.
        let workdir =
            tempfile::tempdir().map_err(|e| ExtractError::TempWorkspace { source: e })?;
        let pdf_path = workdir.path().join("input.pdf");
        tokio::fs::write(&pdf_path, bytes)
            .await
            .map_err(|e| ExtractError::TempWorkspace { source: e })?;

        let prefix = workdir.path().join("page");
        let output = tokio::process::Command::new(RASTERIZER_BIN)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&pdf_path)
            .arg(&prefix)
            .output()
            .await
            .map_err(|e| ExtractError::Rasterize(e.to_string()))?;

        if !output.status.success() {
            return Err(ExtractError::Rasterize(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let pages = rendered_pages(&workdir)?;
        if pages.is_empty() {
            debug!("No pages rendered for '{}'", file.name);
            return Ok(None);
        }

        let mut text = String::new();
        for page in pages {
            let output = tokio::process::Command::new(RECOGNIZER_BIN)
                .arg(&page)
                .arg("stdout")
                .arg("-l")
                .arg(&self.languages)
                .output()
                .await
                .map_err(|e| ExtractError::Ocr(e.to_string()))?;

            if output.status.success() {
                text.push_str(&String::from_utf8_lossy(&output.stdout));
                text.push('\n');
            } else {
                debug!(
                    "Recognition failed for one page of '{}': {}",
                    file.name,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    /// OCR output is only trusted when long enough and the parser
    /// recovered at least one monetary or calendar anchor from it.
    fn sufficient(&self, text: &str, fields: &ParsedFields) -> bool {
        text.trim().chars().count() > self.min_chars && fields.has_anchor()
    }
}

fn rendered_pages(workdir: &tempfile::TempDir) -> Result<Vec<PathBuf>, ExtractError> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(workdir.path())
        .map_err(|e| ExtractError::TempWorkspace { source: e })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    pages.sort();
    Ok(pages)
}
