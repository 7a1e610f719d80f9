use crate::jobs::JobStatus;
use crate::model::participant::Participant;
use serde::{Deserialize, Serialize};

/// Represents the state of rendering a single participant's certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// The certificate has not been rendered yet.
    Pending,
    /// The PDF was rendered and persisted under the task's certificate id.
    Rendered,
    /// Rendering or persisting failed. Contains the error message.
    Failed(String),
}

/// Represents the email notification step of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailState {
    /// The request did not ask for email, or lacked a subject or body.
    NotRequested,
    /// Email is requested but has not been dispatched yet.
    Pending,
    /// The mailer accepted the message.
    Sent,
    /// The mailer rejected the message. Contains the error message.
    Failed(String),
}

/// Represents the processing of one participant within a generation job.
///
/// The `certificate_id` is allocated when the job is planned and never
/// changes, so retrying a task overwrites the same certificate instead of
/// issuing a second one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationTask {
    /// The 0-based position of the participant in the request.
    pub index: usize,
    pub participant: Participant,
    pub certificate_id: String,
    pub state: TaskState,
    pub email: EmailState,
}

impl GenerationTask {
    /// A task is complete once its certificate exists and its email step
    /// needs no further attempt.
    pub fn is_complete(&self) -> bool {
        self.state == TaskState::Rendered
            && !matches!(self.email, EmailState::Failed(_) | EmailState::Pending)
    }
}

/// Represents a complete certificate generation job: one template snapshot
/// applied to every participant of a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Unique identifier for this job (UUID).
    pub job_id: String,
    /// The ID of the template the job was planned from.
    pub template_id: String,
    /// Current state of the job as a whole.
    pub status: JobStatus,
    /// One task per participant, in request order.
    pub tasks: Vec<GenerationTask>,
    /// File name of the packaged archive, once built.
    pub archive: Option<String>,
    pub emails_sent: u32,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl GenerationJob {
    pub fn rendered(&self) -> impl Iterator<Item = &GenerationTask> {
        self.tasks.iter().filter(|t| t.state == TaskState::Rendered)
    }

    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.state, TaskState::Failed(_)))
            .count()
    }
}
