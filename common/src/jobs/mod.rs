use serde::{Deserialize, Serialize};

/// Lifecycle of a background job. `InProgress` carries a percentage,
/// `Completed` a summary and `Failed` the error message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    InProgress(u32),
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
