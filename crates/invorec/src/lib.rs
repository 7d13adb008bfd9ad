pub mod cache;
pub mod config;
pub mod db;
pub mod drive;
pub mod error;
pub mod extract;
pub mod logging;
pub mod matching;
pub mod parser;
pub mod scan;
pub mod scope;

pub use cache::{CacheStore, CachedInvoiceRecord, MemoryCacheStore, SqliteCacheStore};
pub use config::{load_config, load_config_from_str, Config, ScoringConfig};
pub use db::Database;
pub use drive::lister::FileLister;
pub use drive::{DriveClient, FileFilter, FilePage, FolderRef, RemoteFile};
pub use error::{
    ConfigError, DriveError, ExtractError, InvorecError, Result, ScanError,
};
pub use extract::{ExtractedInvoice, ExtractionMethod, ExtractionPipeline, ExtractionTier};
pub use matching::{MatchDecision, MatchingEngine, TransactionCandidate, TransactionStore};
pub use scan::{JobRegistry, ScanHandle, ScanJob, ScanOptions, ScanOrchestrator, ScanStatus};
pub use scope::Scope;
