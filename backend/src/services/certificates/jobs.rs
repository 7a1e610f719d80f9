//! Job status and retries under `/api/certificates/jobs`.
//!
//! Jobs are visible only to the organization that started them. A retry
//! claims the job first, so a job runs at most once at a time.

use crate::error::ServiceError;
use crate::job_controller::state::JobsState;
use crate::services::auth::AuthUser;
use crate::services::certificates::execute::{execute, Run};
use crate::services::certificates::pipeline::{JobRecord, Pipeline};
use actix_web::{web, HttpResponse};

async fn owned_job(jobs: &JobsState, user: &AuthUser, job_id: &str) -> Result<JobRecord, ServiceError> {
    let record = jobs
        .get(job_id)
        .await
        .ok_or_else(|| ServiceError::not_found("job"))?;
    if record.organization_id != user.organization {
        return Err(ServiceError::Forbidden);
    }
    Ok(record)
}

async fn retry(
    jobs: &JobsState,
    pipeline: &Pipeline,
    user: &AuthUser,
    job_id: &str,
    run: Run,
) -> Result<HttpResponse, ServiceError> {
    // The task list of a job never changes, so the index can be checked
    // before the job is claimed.
    if let Run::RetryTask(index) = run {
        let record = owned_job(jobs, user, job_id).await?;
        if index >= record.job.tasks.len() {
            return Err(ServiceError::not_found("task"));
        }
    }
    let record = jobs.claim(job_id, &user.organization).await?;
    let response = execute(pipeline, jobs, record, run).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// `GET /jobs/{job_id}`: the job with its per-task states.
pub async fn status(
    user: AuthUser,
    jobs: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let record = owned_job(&jobs, &user, &job_id).await?;
    Ok(HttpResponse::Ok().json(record.job))
}

/// `POST /jobs/{job_id}/retry`: re-run every incomplete task.
pub async fn retry_failed(
    user: AuthUser,
    jobs: web::Data<JobsState>,
    pipeline: web::Data<Pipeline>,
    job_id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    retry(&jobs, &pipeline, &user, &job_id, Run::RetryFailed).await
}

/// `POST /jobs/{job_id}/tasks/{index}/retry`. A complete task is left as is
/// and only the archive is rebuilt.
pub async fn retry_task(
    user: AuthUser,
    jobs: web::Data<JobsState>,
    pipeline: web::Data<Pipeline>,
    path: web::Path<(String, usize)>,
) -> Result<HttpResponse, ServiceError> {
    let (job_id, index) = path.into_inner();
    retry(&jobs, &pipeline, &user, &job_id, Run::RetryTask(index)).await
}
