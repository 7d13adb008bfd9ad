//! Shared fakes and builders for integration tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use lopdf::{dictionary, Document, Object, Stream};
use regex::Regex;

use invorec::{
    DriveClient, DriveError, FileFilter, FilePage, FolderRef, RemoteFile, ScanError, Scope,
    TransactionCandidate, TransactionStore,
};

/// In-memory remote store: a flat root folder of files with fixed blobs,
/// optional per-file download failures, and scripted recognition text
/// for the remote OCR round-trip.
#[derive(Default)]
pub struct FakeDrive {
    pub files: Vec<RemoteFile>,
    pub blobs: HashMap<String, Vec<u8>>,
    pub recognized: HashMap<String, String>,
    pub fail_downloads: HashSet<String>,
    pub copies: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeDrive {
    pub fn add_file(&mut self, id: &str, name: &str, bytes: Vec<u8>) {
        let order = self.files.len() as i64;
        self.files.push(RemoteFile {
            id: id.to_string(),
            name: name.to_string(),
            modified_time: Utc.timestamp_opt(1_700_000_000 + order, 0).unwrap(),
        });
        self.blobs.insert(id.to_string(), bytes);
    }

    pub fn copy_count(&self) -> usize {
        self.copies.lock().unwrap().len()
    }
}

#[async_trait]
impl DriveClient for FakeDrive {
    async fn list_folders(&self, _parent_ids: &[String]) -> Result<Vec<FolderRef>, DriveError> {
        Ok(vec![])
    }

    async fn list_files(
        &self,
        _folder_ids: &[String],
        _filter: &FileFilter,
        _page_token: Option<&str>,
    ) -> Result<FilePage, DriveError> {
        Ok(FilePage {
            files: self.files.clone(),
            next_page_token: None,
        })
    }

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        if self.fail_downloads.contains(file_id) {
            return Err(DriveError::Download {
                file_id: file_id.to_string(),
                reason: "simulated outage".to_string(),
            });
        }
        self.blobs
            .get(file_id)
            .cloned()
            .ok_or_else(|| DriveError::Download {
                file_id: file_id.to_string(),
                reason: "unknown file".to_string(),
            })
    }

    async fn copy_as_recognized_document(&self, file_id: &str) -> Result<String, DriveError> {
        self.copies.lock().unwrap().push(file_id.to_string());
        Ok(format!("tmp-{}", file_id))
    }

    async fn export_plain_text(&self, temp_id: &str) -> Result<String, DriveError> {
        let original = temp_id.strip_prefix("tmp-").unwrap_or(temp_id);
        self.recognized
            .get(original)
            .cloned()
            .ok_or_else(|| DriveError::Export {
                temp_id: temp_id.to_string(),
                reason: "recognition produced nothing".to_string(),
            })
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), DriveError> {
        self.deleted.lock().unwrap().push(file_id.to_string());
        Ok(())
    }
}

/// Transaction store over a fixed candidate list, honoring the window
/// and exclusion semantics of the query contract.
#[derive(Default)]
pub struct FakeTransactions {
    pub candidates: Vec<TransactionCandidate>,
    pub linked: HashSet<String>,
}

impl TransactionStore for FakeTransactions {
    fn query_candidates(
        &self,
        _scope: &Scope,
        from: NaiveDate,
        to: NaiveDate,
        exclude_linked: bool,
        exclude_labels: &[String],
    ) -> Result<Vec<TransactionCandidate>, ScanError> {
        let patterns: Vec<Regex> = exclude_labels
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();

        Ok(self
            .candidates
            .iter()
            .filter(|c| c.date >= from && c.date <= to)
            .filter(|c| !(exclude_linked && self.linked.contains(&c.id)))
            .filter(|c| !patterns.iter().any(|re| re.is_match(&c.label)))
            .cloned()
            .collect())
    }
}

/// Builds a single-page PDF whose content stream shows `line`.
pub fn pdf_with_text(line: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();
    let content_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        }),
    );

    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        }),
    );

    let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", line);
    let content_stream = Stream::new(dictionary! {}, content.into_bytes());
    doc.objects
        .insert(content_id, Object::Stream(content_stream));

    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        }),
    );

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
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

/// A text layer comfortably above the 200-character trust threshold.
pub fn rich_invoice_text_layer() -> Vec<u8> {
    let line = "Amount due: 42.00 on 05/03/2026 for subscription services rendered \
                during the previous billing period, reference INV-77001, payable by \
                bank transfer within thirty days of the issue date as agreed. \
                Thank you for your continued business with us.";
    pdf_with_text(line)
}
