//! Remote-file-store collaborator interface. Implementations own
//! authentication and token refresh entirely; this crate only consumes
//! the listing, download and recognition capabilities.

pub mod lister;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DriveError;

/// Read-only view of one document in the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub modified_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FolderRef {
    pub id: String,
    pub name: String,
}

/// Filter forwarded to the store's file-listing query.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub mime_types: Vec<String>,
}

/// One page of a file listing, with an opaque continuation token.
#[derive(Debug, Default)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    pub next_page_token: Option<String>,
}

#[async_trait]
pub trait DriveClient: Send + Sync {
    /// Lists the immediate subfolders of all given parents in one query.
    async fn list_folders(&self, parent_ids: &[String]) -> Result<Vec<FolderRef>, DriveError>;

    /// Lists files matching the filter within any of the given folders.
    async fn list_files(
        &self,
        folder_ids: &[String],
        filter: &FileFilter,
        page_token: Option<&str>,
    ) -> Result<FilePage, DriveError>;

    async fn download(&self, file_id: &str) -> Result<Vec<u8>, DriveError>;

    /// Creates a temporary store-side copy with built-in document
    /// recognition applied. The caller must delete the copy.
    async fn copy_as_recognized_document(&self, file_id: &str) -> Result<String, DriveError>;

    async fn export_plain_text(&self, temp_id: &str) -> Result<String, DriveError>;

    async fn delete_file(&self, file_id: &str) -> Result<(), DriveError>;
}
