use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InvorecError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote store error: {0}")]
    Drive(#[from] DriveError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid exclusion pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors surfaced by remote-file-store collaborators. Implementors of
/// [`crate::drive::DriveClient`] construct these directly.
#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Folder listing failed: {0}")]
    ListFolders(String),

    #[error("File listing failed: {0}")]
    ListFiles(String),

    #[error("Download failed for file '{file_id}': {reason}")]
    Download { file_id: String, reason: String },

    #[error("Document recognition copy failed for file '{file_id}': {reason}")]
    Recognize { file_id: String, reason: String },

    #[error("Plain-text export failed for '{temp_id}': {reason}")]
    Export { temp_id: String, reason: String },

    #[error("Delete failed for '{file_id}': {reason}")]
    Delete { file_id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Page rasterization failed: {0}")]
    Rasterize(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Temporary workspace error: {source}")]
    TempWorkspace {
        #[source]
        source: std::io::Error,
    },

    #[error("Remote recognition failed: {0}")]
    Remote(#[from] DriveError),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No root folder configured for this scope")]
    NoRootFolder,

    #[error("File listing unavailable: {0}")]
    ListingUnavailable(#[source] DriveError),

    #[error("Download failed for '{file}': {source}")]
    Download {
        file: String,
        #[source]
        source: DriveError,
    },

    #[error("Transaction query failed: {0}")]
    TransactionQuery(String),

    #[error("Cache error: {0}")]
    Cache(#[from] crate::db::DatabaseError),
}

pub type Result<T> = std::result::Result<T, InvorecError>;
