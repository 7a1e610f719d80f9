//! Runs a job record through the pipeline on the blocking pool and keeps
//! `JobsState` in step with it.

use crate::error::ServiceError;
use crate::job_controller::state::JobsState;
use crate::services::certificates::pipeline::{JobRecord, Pipeline};
use common::jobs::JobStatus;
use common::requests::GenerateResponse;

#[derive(Debug, Clone, Copy)]
pub enum Run {
    All,
    RetryFailed,
    RetryTask(usize),
}

/// Retried records must come from [`JobsState::claim`].
pub async fn execute(
    pipeline: &Pipeline,
    jobs: &JobsState,
    mut record: JobRecord,
    run: Run,
) -> Result<GenerateResponse, ServiceError> {
    jobs.insert(record.clone()).await;

    let job_id = record.job.job_id.clone();
    let pipeline = pipeline.clone();
    let tx = jobs.tx.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let outcome = match run {
            Run::All => pipeline.run(&mut record, &tx).map_err(ServiceError::from),
            Run::RetryFailed => pipeline.retry_failed(&mut record, &tx).map_err(ServiceError::from),
            Run::RetryTask(index) => pipeline.retry_task(&mut record, index, &tx),
        };
        (record, outcome)
    })
    .await;

    let (record, outcome) = match joined {
        Ok(done) => done,
        Err(e) => {
            if let Some(mut stored) = jobs.get(&job_id).await {
                stored.job.status = JobStatus::Failed(e.to_string());
                jobs.insert(stored).await;
            }
            return Err(e.into());
        }
    };

    // The pipeline leaves a finished status on every path.
    let response = record.response();
    jobs.insert(record).await;
    outcome.map(|()| response)
}
