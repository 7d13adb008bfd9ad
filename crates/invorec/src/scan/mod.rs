pub mod job;
pub mod orchestrator;
pub mod registry;

pub use job::{ScanJob, ScanStatus};
pub use orchestrator::{ScanHandle, ScanOptions, ScanOrchestrator};
pub use registry::JobRegistry;
