use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub matching: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Root folder on the remote store that scans traverse. A per-call
    /// override takes precedence; with neither set a scan fails as a
    /// setup error.
    #[serde(default)]
    pub root_folder_id: Option<String>,
    /// MIME types the remote store is asked to filter on.
    #[serde(default = "default_mime_types")]
    pub file_mime_types: Vec<String>,
    #[serde(default = "default_max_folder_depth")]
    pub max_folder_depth: usize,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Finished jobs older than this are removed by the sweep.
    #[serde(default = "default_job_retention_secs")]
    pub job_retention_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Stored raw-text prefix bound, in characters.
    #[serde(default = "default_raw_text_limit")]
    pub raw_text_limit: usize,
}

fn default_mime_types() -> Vec<String> {
    vec!["application/pdf".to_string()]
}

fn default_max_folder_depth() -> usize {
    5
}

fn default_max_files() -> usize {
    1000
}

fn default_job_retention_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    600
}

fn default_raw_text_limit() -> usize {
    4096
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root_folder_id: None,
            file_mime_types: default_mime_types(),
            max_folder_depth: default_max_folder_depth(),
            max_files: default_max_files(),
            job_retention_secs: default_job_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            raw_text_limit: default_raw_text_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Minimum embedded-text length before a text layer is trusted.
    /// Shorter extractions are typically scanned images misreported as
    /// carrying a text layer.
    #[serde(default = "default_min_text_layer_chars")]
    pub min_text_layer_chars: usize,
    /// Minimum local OCR output length before parsing is attempted.
    #[serde(default = "default_min_ocr_chars")]
    pub min_ocr_chars: usize,
    #[serde(default = "default_true")]
    pub enable_local_ocr: bool,
    #[serde(default = "default_true")]
    pub enable_remote_ocr: bool,
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: Vec<String>,
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,
}

fn default_min_text_layer_chars() -> usize {
    200
}

fn default_min_ocr_chars() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_ocr_languages() -> Vec<String> {
    vec!["eng".to_string(), "fra".to_string()]
}

fn default_ocr_dpi() -> u32 {
    300
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_text_layer_chars: default_min_text_layer_chars(),
            min_ocr_chars: default_min_ocr_chars(),
            enable_local_ocr: true,
            enable_remote_ocr: true,
            ocr_languages: default_ocr_languages(),
            ocr_dpi: default_ocr_dpi(),
        }
    }
}

/// Scoring tier tables for transaction matching. The default values were
/// tuned empirically against real statements; they are configuration
/// rather than constants so deployments can retune without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Candidate window half-width around the invoice date, in days.
    #[serde(default = "default_date_window_days")]
    pub date_window_days: i64,
    /// A match is accepted only when its score strictly exceeds this.
    /// No single signal reaches it alone, so at least two of the three
    /// signals must be strong.
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: u32,
    /// Transaction labels matching any of these patterns are excluded
    /// from candidate windows (statement-level aggregate lines that
    /// never need a supporting document).
    #[serde(default)]
    pub exclude_labels: Vec<String>,

    #[serde(default = "default_amount_exact")]
    pub amount_exact: u32,
    #[serde(default = "default_amount_close")]
    pub amount_close: u32,
    #[serde(default = "default_amount_near")]
    pub amount_near: u32,
    #[serde(default = "default_amount_relative")]
    pub amount_relative: u32,

    #[serde(default = "default_date_same_day")]
    pub date_same_day: u32,
    #[serde(default = "default_date_three_days")]
    pub date_three_days: u32,
    #[serde(default = "default_date_week")]
    pub date_week: u32,
    #[serde(default = "default_date_fortnight")]
    pub date_fortnight: u32,
    #[serde(default = "default_date_in_window")]
    pub date_in_window: u32,

    #[serde(default = "default_vendor_contains")]
    pub vendor_contains: u32,
    #[serde(default = "default_vendor_token")]
    pub vendor_token: u32,
}

fn default_date_window_days() -> i64 {
    30
}

fn default_accept_threshold() -> u32 {
    60
}

fn default_amount_exact() -> u32 {
    50
}

fn default_amount_close() -> u32 {
    40
}

fn default_amount_near() -> u32 {
    25
}

fn default_amount_relative() -> u32 {
    20
}

fn default_date_same_day() -> u32 {
    35
}

fn default_date_three_days() -> u32 {
    25
}

fn default_date_week() -> u32 {
    15
}

fn default_date_fortnight() -> u32 {
    8
}

fn default_date_in_window() -> u32 {
    3
}

fn default_vendor_contains() -> u32 {
    30
}

fn default_vendor_token() -> u32 {
    20
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            date_window_days: default_date_window_days(),
            accept_threshold: default_accept_threshold(),
            exclude_labels: vec![],
            amount_exact: default_amount_exact(),
            amount_close: default_amount_close(),
            amount_near: default_amount_near(),
            amount_relative: default_amount_relative(),
            date_same_day: default_date_same_day(),
            date_three_days: default_date_three_days(),
            date_week: default_date_week(),
            date_fortnight: default_date_fortnight(),
            date_in_window: default_date_in_window(),
            vendor_contains: default_vendor_contains(),
            vendor_token: default_vendor_token(),
        }
    }
}
