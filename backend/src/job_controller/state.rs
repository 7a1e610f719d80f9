//! In-memory state of certificate generation jobs.
//!
//! `JobsState` is shared with every handler as `web::Data`. Handlers insert
//! and replace whole job records; the blocking pipeline only reports status
//! changes through the `tx` channel, which `start_job_updater` drains into
//! the shared map.

use crate::error::ServiceError;
use crate::services::certificates::pipeline::JobRecord;
use common::jobs::JobStatus;
use log::debug;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

const UPDATE_CHANNEL_CAPACITY: usize = 100;
const DEFAULT_RETAINED_JOBS: usize = 500;

#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest record.
    pub jobs: Arc<RwLock<HashMap<String, JobRecord>>>,
    /// Progress reports from running pipelines.
    pub tx: mpsc::Sender<JobUpdate>,
    /// Finished jobs kept for status and retry; older ones are evicted.
    retained: usize,
}

impl JobsState {
    #[cfg(test)]
    pub fn new() -> (Self, mpsc::Receiver<JobUpdate>) {
        Self::with_retention(DEFAULT_RETAINED_JOBS)
    }

    /// The receiver must be handed to [`start_job_updater`].
    pub fn with_retention(retained: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
            retained,
        };
        (state, rx)
    }

    /// Store `record`, then drop the oldest finished jobs beyond the
    /// retention limit. Running jobs are never evicted.
    pub async fn insert(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(record.job.job_id.clone(), record);
        evict_finished(&mut jobs, self.retained);
    }

    pub async fn get(&self, job_id: &str) -> Option<JobRecord> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Take a finished job of `organization` for another run. The check and
    /// the switch to `InProgress(0)` happen under one write lock, so at most
    /// one caller wins while the job runs.
    pub async fn claim(&self, job_id: &str, organization: &str) -> Result<JobRecord, ServiceError> {
        let mut jobs = self.jobs.write().await;
        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| ServiceError::not_found("job"))?;
        if record.organization_id != organization {
            return Err(ServiceError::Forbidden);
        }
        if !record.job.status.is_finished() {
            return Err(ServiceError::Validation("job is still running".into()));
        }
        record.job.status = JobStatus::InProgress(0);
        Ok(record.clone())
    }
}

fn evict_finished(jobs: &mut HashMap<String, JobRecord>, retained: usize) {
    let mut finished: Vec<(String, String)> = jobs
        .values()
        .filter(|r| r.job.status.is_finished())
        .map(|r| (r.job.created_at.clone(), r.job.job_id.clone()))
        .collect();
    if finished.len() <= retained {
        return;
    }
    finished.sort();
    let excess = finished.len() - retained;
    for (_, job_id) in finished.into_iter().take(excess) {
        debug!("evicting finished job {job_id}");
        jobs.remove(&job_id);
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

impl JobUpdate {
    pub fn new(job_id: impl Into<String>, status: JobStatus) -> Self {
        Self {
            job_id: job_id.into(),
            status,
        }
    }
}

/// Applies status updates until every sender is dropped.
///
/// A finished job keeps its final status: progress reports still queued when
/// the handler stored the final record are discarded.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        if let Some(record) = jobs.get_mut(&update.job_id) {
            if !record.job.status.is_finished() {
                record.job.status = update.status;
            }
        }
    }
}
