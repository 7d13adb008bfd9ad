//! Scan lifecycle: one spawned task per invocation, decoupled from the
//! caller. The triggering call returns a handle immediately; callers
//! poll job status until it reaches a terminal state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn, Instrument};

use crate::cache::{CacheStore, CachedInvoiceRecord};
use crate::config::Config;
use crate::drive::{DriveClient, FileFilter, RemoteFile};
use crate::drive::lister::FileLister;
use crate::error::ScanError;
use crate::extract::ExtractionPipeline;
use crate::matching::{MatchDecision, MatchingEngine, TransactionStore};
use crate::scan::job::{ScanJob, ScanStatus};
use crate::scan::registry::JobRegistry;
use crate::scope::Scope;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Purge the scope's cache rows before enumerating, so every file is
    /// re-extracted and re-scored.
    pub force_rescan: bool,
    /// Scan this folder instead of the configured root.
    pub folder_override: Option<String>,
}

/// Returned by `start_scan`. The task handle is the scan's completion
/// signal; dropping it detaches the scan, which keeps running.
pub struct ScanHandle {
    pub job_id: String,
    pub task: JoinHandle<()>,
}

enum FileOutcome {
    AlreadyCached,
    Cached { matched: bool },
}

#[derive(Clone)]
pub struct ScanOrchestrator {
    drive: Arc<dyn DriveClient>,
    cache: Arc<dyn CacheStore>,
    transactions: Arc<dyn TransactionStore>,
    registry: Arc<JobRegistry>,
    lister: FileLister,
    pipeline: Arc<ExtractionPipeline>,
    engine: MatchingEngine,
    config: Arc<Config>,
}

impl ScanOrchestrator {
    pub fn new(
        drive: Arc<dyn DriveClient>,
        cache: Arc<dyn CacheStore>,
        transactions: Arc<dyn TransactionStore>,
        config: Config,
    ) -> Self {
        let config = Arc::new(config);
        let lister = FileLister::new(
            drive.clone(),
            config.scan.max_folder_depth,
            config.scan.max_files,
        );
        let pipeline = Arc::new(
            ExtractionPipeline::from_config(&config.extraction, drive.clone())
                .with_raw_text_limit(config.scan.raw_text_limit),
        );
        let engine = MatchingEngine::new(config.matching.clone());

        Self {
            drive,
            cache,
            transactions,
            registry: Arc::new(JobRegistry::new()),
            lister,
            pipeline,
            engine,
            config,
        }
    }

    /// Replaces the extraction pipeline; used by embedders and tests
    /// that assemble tiers explicitly.
    pub fn with_pipeline(mut self, pipeline: ExtractionPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Spawns the periodic registry sweep.
    pub fn start_sweeper(&self) -> JoinHandle<()> {
        self.registry.spawn_sweeper(
            Duration::from_secs(self.config.scan.sweep_interval_secs),
            Duration::from_secs(self.config.scan.job_retention_secs),
        )
    }

    /// Starts a scan and returns immediately with its handle.
    pub fn start_scan(&self, scope: Scope, options: ScanOptions) -> ScanHandle {
        let job = ScanJob::new();
        let job_id = job.id.clone();
        self.registry.insert(job);

        let span = tracing::info_span!("scan", job_id = %job_id, scope = %scope.key());
        let ctx = self.clone();
        let task = tokio::spawn(
            ctx.run_scan(job_id.clone(), scope, options)
                .instrument(span),
        );

        ScanHandle { job_id, task }
    }

    /// Read-only snapshot for pollers.
    pub fn job_status(&self, job_id: &str) -> Option<ScanJob> {
        self.registry.snapshot(job_id)
    }

    async fn run_scan(self, job_id: String, scope: Scope, options: ScanOptions) {
        info!("Scan started for {}", scope);

        match self.execute(&job_id, &scope, &options).await {
            Ok(()) => {
                self.registry
                    .update(&job_id, |job| job.finish(ScanStatus::Done));
                if let Some(job) = self.registry.snapshot(&job_id) {
                    info!(
                        "Scan finished: {}/{} processed, {} cached, {} matched, {} errors",
                        job.processed,
                        job.total,
                        job.scanned,
                        job.matched,
                        job.errors.len()
                    );
                }
            }
            Err(e) => {
                // Setup failure: nothing was processed, the job itself
                // is in error.
                warn!("Scan failed during setup: {}", e);
                self.registry.update(&job_id, |job| {
                    job.errors.push(e.to_string());
                    job.finish(ScanStatus::Error);
                });
            }
        }
    }

    async fn execute(
        &self,
        job_id: &str,
        scope: &Scope,
        options: &ScanOptions,
    ) -> Result<(), ScanError> {
        let root_folder = options
            .folder_override
            .clone()
            .or_else(|| self.config.scan.root_folder_id.clone())
            .ok_or(ScanError::NoRootFolder)?;

        if options.force_rescan {
            let purged = self.cache.delete_by_scope(scope)?;
            info!("Force re-scan purged {} cache rows for {}", purged, scope);
        }

        let filter = FileFilter {
            mime_types: self.config.scan.file_mime_types.clone(),
        };
        let files = self
            .lister
            .list_candidate_files(&root_folder, &filter)
            .await
            .map_err(ScanError::ListingUnavailable)?;

        self.registry.update(job_id, |job| job.total = files.len());

        for file in &files {
            match self.process_file(scope, file).await {
                Ok(FileOutcome::AlreadyCached) => {
                    debug!("Skipping already cached '{}'", file.name);
                }
                Ok(FileOutcome::Cached { matched }) => {
                    self.registry.update(job_id, |job| {
                        job.scanned += 1;
                        if matched {
                            job.matched += 1;
                        }
                    });
                }
                Err(e) => {
                    // Per-file failures are data, not job failures; the
                    // loop keeps its forward progress.
                    warn!("Failed to process '{}': {}", file.name, e);
                    self.registry.update(job_id, |job| {
                        job.errors.push(format!("{}: {}", file.name, e));
                    });
                }
            }
            self.registry.update(job_id, |job| job.processed += 1);
        }

        Ok(())
    }

    async fn process_file(
        &self,
        scope: &Scope,
        file: &RemoteFile,
    ) -> Result<FileOutcome, ScanError> {
        if self.cache.exists(scope, &file.id)? {
            return Ok(FileOutcome::AlreadyCached);
        }

        let bytes = self
            .drive
            .download(&file.id)
            .await
            .map_err(|e| ScanError::Download {
                file: file.name.clone(),
                source: e,
            })?;

        let invoice = self.pipeline.extract(file, &bytes).await;

        let decision = match invoice.date {
            Some(date) => {
                let window = chrono::Duration::days(self.engine.config().date_window_days);
                let candidates = self.transactions.query_candidates(
                    scope,
                    date - window,
                    date + window,
                    true,
                    &self.engine.config().exclude_labels,
                )?;
                self.engine.decide(&invoice, &candidates)
            }
            // Without a best-guess date there is no candidate window.
            None => MatchDecision::unmatched(),
        };

        let matched = decision.transaction_id.is_some();
        let record =
            CachedInvoiceRecord::from_extraction(scope, file, &invoice, &decision, Utc::now());
        self.cache.insert(&record)?;

        Ok(FileOutcome::Cached { matched })
    }
}
