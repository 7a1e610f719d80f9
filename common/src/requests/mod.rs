use crate::model::participant::Participant;
use serde::{Deserialize, Serialize};

/// Request payload for `POST /api/certificates/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub template_id: String,
    pub participants: Vec<Participant>,
    pub event_name: String,
    #[serde(default)]
    pub issue_date: Option<String>,
    #[serde(default)]
    pub send_email: Option<bool>,
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub email_body: Option<String>,
}

impl GenerateRequest {
    /// Email goes out only when asked for and both subject and body are present.
    pub fn email_requested(&self) -> bool {
        self.send_email.unwrap_or(false)
            && self.email_subject.as_deref().is_some_and(|s| !s.is_empty())
            && self.email_body.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Response of every endpoint that runs (or re-runs) a generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: String,
    pub certificate_ids: Vec<String>,
    pub zip_url: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub organization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
