//! # Certificate Generation Pipeline
//!
//! Turns a `GenerateRequest` into rendered PDFs, a zip archive and optional
//! emails. A request is first planned into a `JobRecord`: one task per
//! participant, each with its certificate id allocated upfront, plus a
//! snapshot of the template taken at that moment.
//!
//! `Pipeline::run` then works through the tasks in order on a blocking
//! thread. For each task it:
//!
//! 1. composes and renders the certificate from the snapshot,
//! 2. writes the PDF atomically to `certificates/{certificate_id}.pdf`,
//! 3. records the certificate in the repository,
//! 4. sends the email, when requested.
//!
//! A failing task is marked `Failed` and the job moves on. Once every task
//! has been attempted the archive is rebuilt from all rendered tasks.
//! Progress is reported to the job controller over its update channel.
//!
//! Retries re-run only the incomplete steps of a task: a rendered PDF is
//! not rendered again, and a sent email is never sent twice.

use crate::error::ServiceError;
use crate::job_controller::state::JobUpdate;
use crate::services::certificates::archive::{build_archive, ArchiveEntry, ArchiveError};
use crate::services::certificates::mail::{Mailer, OutgoingMail};
use crate::services::certificates::placeholders::Substitution;
use crate::services::certificates::render::{CertificateLayout, CertificateRenderer};
use crate::storage::{write_atomic, Storage};
use crate::store::CertificateRepository;
use chrono::Utc;
use common::jobs::JobStatus;
use common::model::certificate::CertificateRecord;
use common::model::generation::{EmailState, GenerationJob, GenerationTask, TaskState};
use common::model::template::TemplateType;
use common::requests::{GenerateRequest, GenerateResponse};
use log::{error, info, warn};
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Template content frozen at planning time.
#[derive(Debug, Clone)]
pub struct TemplateSnapshot {
    pub content: String,
    pub template_type: TemplateType,
    /// Hex md5 of `content`.
    pub digest: String,
}

impl TemplateSnapshot {
    pub fn new(content: String, template_type: TemplateType) -> Self {
        let digest = format!("{:x}", md5::compute(content.as_bytes()));
        Self {
            content,
            template_type,
            digest,
        }
    }
}

/// A job together with everything needed to run or retry it.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job: GenerationJob,
    /// Organization of the user who started the job.
    pub organization_id: String,
    pub snapshot: Arc<TemplateSnapshot>,
    pub request: GenerateRequest,
}

impl JobRecord {
    pub fn response(&self) -> GenerateResponse {
        let rendered = self.job.rendered().count();
        GenerateResponse {
            job_id: self.job.job_id.clone(),
            certificate_ids: self
                .job
                .rendered()
                .map(|t| t.certificate_id.clone())
                .collect(),
            zip_url: self
                .job
                .archive
                .as_ref()
                .map(|name| format!("/api/certificates/download/{name}"))
                .unwrap_or_default(),
            message: summary_message(
                rendered,
                self.request.send_email.unwrap_or(false).then_some(self.job.emails_sent),
                self.job.failed_count(),
            ),
        }
    }
}

/// `emails_sent` is `None` when the request did not ask for email; a request
/// that did always reports its count, zero included.
pub fn summary_message(rendered: usize, emails_sent: Option<u32>, failed: usize) -> String {
    let mut message = format!("Сгенерировано {rendered} сертификатов");
    if let Some(emails_sent) = emails_sent {
        message.push_str(&format!(" и отправлено {emails_sent} писем по email"));
    }
    if failed > 0 {
        message.push_str(&format!(" (ошибок: {failed})"));
    }
    message
}

#[derive(Clone)]
pub struct Pipeline {
    pub storage: Storage,
    pub renderer: Arc<dyn CertificateRenderer>,
    pub mailer: Arc<dyn Mailer>,
    pub certificates: Arc<dyn CertificateRepository>,
}

impl Pipeline {
    /// Plan `request` into a pending job. Nothing is rendered yet.
    pub fn plan(
        request: GenerateRequest,
        snapshot: TemplateSnapshot,
        organization_id: &str,
    ) -> JobRecord {
        let email = if request.email_requested() {
            EmailState::Pending
        } else {
            EmailState::NotRequested
        };
        let tasks = request
            .participants
            .iter()
            .enumerate()
            .map(|(index, participant)| GenerationTask {
                index,
                participant: participant.clone(),
                certificate_id: Uuid::new_v4().to_string(),
                state: TaskState::Pending,
                email: email.clone(),
            })
            .collect();

        JobRecord {
            job: GenerationJob {
                job_id: Uuid::new_v4().to_string(),
                template_id: request.template_id.clone(),
                status: JobStatus::Pending,
                tasks,
                archive: None,
                emails_sent: 0,
                created_at: Utc::now().to_rfc3339(),
            },
            organization_id: organization_id.to_string(),
            snapshot: Arc::new(snapshot),
            request,
        }
    }

    /// Run every task of a freshly planned job.
    pub fn run(
        &self,
        record: &mut JobRecord,
        tx: &mpsc::Sender<JobUpdate>,
    ) -> Result<(), ArchiveError> {
        let indices: Vec<usize> = (0..record.job.tasks.len()).collect();
        info!(
            "job {}: generating {} certificates from template {}",
            record.job.job_id,
            indices.len(),
            record.job.template_id
        );
        self.run_tasks(record, &indices, tx)
    }

    /// Re-run one task. A complete task is left untouched; the archive is
    /// rebuilt either way.
    pub fn retry_task(
        &self,
        record: &mut JobRecord,
        index: usize,
        tx: &mpsc::Sender<JobUpdate>,
    ) -> Result<(), ServiceError> {
        let task = record
            .job
            .tasks
            .get(index)
            .ok_or_else(|| ServiceError::not_found("task"))?;
        let single = [index];
        let indices: &[usize] = if task.is_complete() { &[] } else { &single };
        info!("job {}: retrying task {}", record.job.job_id, index);
        self.run_tasks(record, indices, tx)?;
        Ok(())
    }

    /// Re-run every incomplete task of the job.
    pub fn retry_failed(
        &self,
        record: &mut JobRecord,
        tx: &mpsc::Sender<JobUpdate>,
    ) -> Result<(), ArchiveError> {
        let indices: Vec<usize> = record
            .job
            .tasks
            .iter()
            .filter(|t| !t.is_complete())
            .map(|t| t.index)
            .collect();
        info!(
            "job {}: retrying {} incomplete tasks",
            record.job.job_id,
            indices.len()
        );
        self.run_tasks(record, &indices, tx)
    }

    /// Run `indices` in order, then package. An empty list only repackages.
    fn run_tasks(
        &self,
        record: &mut JobRecord,
        indices: &[usize],
        tx: &mpsc::Sender<JobUpdate>,
    ) -> Result<(), ArchiveError> {
        let job_id = record.job.job_id.clone();
        let report = |status: JobStatus| {
            let _ = tx.blocking_send(JobUpdate::new(job_id.as_str(), status));
        };

        record.job.status = JobStatus::InProgress(0);
        report(JobStatus::InProgress(0));

        let total = indices.len();
        for (done, &index) in indices.iter().enumerate() {
            self.run_task(record, index);
            report(JobStatus::InProgress(((done + 1) * 100 / total) as u32));
        }

        match self.package(record) {
            Ok(()) => {
                let summary = record.response().message;
                info!("job {job_id}: {summary}");
                record.job.status = JobStatus::Completed(summary);
                Ok(())
            }
            Err(e) => {
                error!("job {job_id}: packaging failed: {e}");
                record.job.status = JobStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn run_task(&self, record: &mut JobRecord, index: usize) {
        let JobRecord {
            job,
            snapshot,
            request,
            ..
        } = record;
        let Some(task) = job.tasks.get_mut(index) else {
            return;
        };

        if task.state != TaskState::Rendered {
            match self.render_task(&job.job_id, &job.template_id, snapshot, request, task) {
                Ok(()) => task.state = TaskState::Rendered,
                Err(e) => {
                    warn!(
                        "job {}: certificate for {} failed: {}",
                        job.job_id, task.participant.fio, e
                    );
                    task.state = TaskState::Failed(e.to_string());
                    return;
                }
            }
        }

        if matches!(task.email, EmailState::Pending | EmailState::Failed(_)) {
            task.email = self.send_email(request, task);
            if task.email == EmailState::Sent {
                job.emails_sent += 1;
            }
        }
    }

    fn render_task(
        &self,
        job_id: &str,
        template_id: &str,
        snapshot: &TemplateSnapshot,
        request: &GenerateRequest,
        task: &GenerationTask,
    ) -> Result<(), ServiceError> {
        let layout = CertificateLayout::compose(
            &task.participant,
            &snapshot.content,
            snapshot.template_type,
            &request.event_name,
            request.issue_date.as_deref(),
        );
        let pdf = self.renderer.render(&layout)?;
        write_atomic(&self.storage.certificate_path(&task.certificate_id), &pdf)?;
        self.certificates.upsert_certificate(&CertificateRecord {
            id: task.certificate_id.clone(),
            job_id: job_id.to_string(),
            template_id: template_id.to_string(),
            template_digest: snapshot.digest.clone(),
            fio: task.participant.fio.clone(),
            email: task.participant.email.clone(),
            created_at: Utc::now().to_rfc3339(),
        })?;
        Ok(())
    }

    fn send_email(&self, request: &GenerateRequest, task: &GenerationTask) -> EmailState {
        let substitution = Substitution::new(
            &task.participant,
            &request.event_name,
            request.issue_date.as_deref(),
        );
        let attachment = match fs::read(self.storage.certificate_path(&task.certificate_id)) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("cannot attach certificate {}: {}", task.certificate_id, e);
                return EmailState::Failed(e.to_string());
            }
        };
        let mail = OutgoingMail {
            id: task.certificate_id.clone(),
            to: task.participant.email.clone(),
            subject: substitution.apply(request.email_subject.as_deref().unwrap_or_default()),
            body: substitution.apply(request.email_body.as_deref().unwrap_or_default()),
            attachment_name: format!("{}_certificate.pdf", task.participant.fio),
            attachment,
        };
        match self.mailer.send(&mail) {
            Ok(()) => EmailState::Sent,
            Err(e) => {
                warn!("email to {} failed: {}", mail.to, e);
                EmailState::Failed(e.to_string())
            }
        }
    }

    fn package(&self, record: &mut JobRecord) -> Result<(), ArchiveError> {
        let name = Storage::archive_name(&record.job.job_id);
        let entries: Vec<ArchiveEntry> = record
            .job
            .rendered()
            .map(|t| ArchiveEntry {
                participant_name: t.participant.fio.clone(),
                pdf_path: self.storage.certificate_path(&t.certificate_id),
            })
            .collect();
        build_archive(&self.storage.certificates_dir().join(&name), &entries)?;
        record.job.archive = Some(name);
        Ok(())
    }
}
