//! # Certificate Generation Service
//!
//! Backs `POST /api/certificates/generate`.
//!
//! ## Workflow
//!
//! 1.  **Template snapshot**: the template record and its current markup are
//!     loaded, and the markup is frozen with its md5 digest. Later edits to
//!     the template do not reach this job.
//! 2.  **Planning**: one task per participant, each with its certificate id
//!     allocated upfront. The job is registered in `JobsState` as `Pending`.
//! 3.  **Execution**: the pipeline runs on the blocking pool and reports
//!     progress to the job updater. The handler waits for it.
//! 4.  **Response**: the rendered certificate ids, the archive URL and a
//!     Russian summary line, all in a `GenerateResponse`.

use crate::error::ServiceError;
use crate::job_controller::state::JobsState;
use crate::services::auth::AuthUser;
use crate::services::certificates::execute::{execute, Run};
use crate::services::certificates::pipeline::{Pipeline, TemplateSnapshot};
use crate::services::templates::load_markup;
use crate::storage::Storage;
use crate::store::TemplateRepository;
use actix_web::{web, HttpResponse};
use common::requests::GenerateRequest;

/// Snapshots the template, plans the job and runs it to completion.
pub async fn process(
    user: AuthUser,
    templates: web::Data<dyn TemplateRepository>,
    storage: web::Data<Storage>,
    pipeline: web::Data<Pipeline>,
    jobs: web::Data<JobsState>,
    payload: web::Json<GenerateRequest>,
) -> Result<HttpResponse, ServiceError> {
    let request = payload.into_inner();
    let (template, markup) = load_markup(templates.get_ref(), &storage, &request.template_id)?;
    let snapshot = TemplateSnapshot::new(markup, template.template_type);
    let record = Pipeline::plan(request, snapshot, &user.organization);
    let response = execute(&pipeline, &jobs, record, Run::All).await?;
    Ok(HttpResponse::Ok().json(response))
}
