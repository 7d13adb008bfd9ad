use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Done,
    Error,
}

impl ScanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanStatus::Done | ScanStatus::Error)
    }
}

/// In-memory state of one scan invocation. Mutated only by the owning
/// scan task, through the registry.
#[derive(Debug, Clone, Serialize)]
pub struct ScanJob {
    pub id: String,
    pub status: ScanStatus,
    /// Number of files enumerated for this scan; 0 until listing done.
    pub total: usize,
    /// Files handled so far, including cached skips and failures.
    pub processed: usize,
    /// Newly cached rows this run.
    pub scanned: usize,
    /// Accepted matches this run.
    pub matched: usize,
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanJob {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: ScanStatus::Running,
            total: 0,
            processed: 0,
            scanned: 0,
            matched: 0,
            errors: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Transitions to a terminal status. Status is monotonic: once
    /// terminal, further transitions are ignored.
    pub fn finish(&mut self, status: ScanStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Default for ScanJob {
    fn default() -> Self {
        Self::new()
    }
}
