//! Owned job store. All scan-state mutation flows through here; the
//! periodic sweep removes only terminal entries past retention, so it
//! can never race an active scan task.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::scan::job::ScanJob;

#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, ScanJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: ScanJob) {
        let mut jobs = self.write_jobs();
        jobs.insert(job.id.clone(), job);
    }

    /// Applies a mutation to one job under the lock.
    pub fn update<F>(&self, job_id: &str, mutate: F)
    where
        F: FnOnce(&mut ScanJob),
    {
        let mut jobs = self.write_jobs();
        if let Some(job) = jobs.get_mut(job_id) {
            mutate(job);
        }
    }

    pub fn snapshot(&self, job_id: &str) -> Option<ScanJob> {
        self.read_jobs().get(job_id).cloned()
    }

    pub fn snapshot_all(&self) -> Vec<ScanJob> {
        self.read_jobs().values().cloned().collect()
    }

    /// Removes finished jobs whose `finished_at` is older than the
    /// retention window; returns the number removed. Running jobs are
    /// never touched.
    pub fn sweep(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::hours(1));

        let mut jobs = self.write_jobs();
        let before = jobs.len();
        jobs.retain(|_, job| match (job.is_finished(), job.finished_at) {
            (true, Some(finished_at)) => finished_at > cutoff,
            _ => true,
        });
        before - jobs.len()
    }

    /// Spawns the periodic sweep task.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        retention: Duration,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let removed = registry.sweep(retention);
                if removed > 0 {
                    log::debug!("Swept {} finished scan jobs", removed);
                }
            }
        })
    }

    fn read_jobs(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ScanJob>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_jobs(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ScanJob>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
