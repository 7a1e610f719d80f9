use serde::{Deserialize, Serialize};

/// A certificate issued by a generation job.
///
/// `template_digest` is the md5 of the template content the certificate was
/// rendered from, so an issued certificate stays traceable to its snapshot
/// even after the template is edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: String,
    pub job_id: String,
    pub template_id: String,
    pub template_digest: String,
    pub fio: String,
    pub email: String,
    pub created_at: String,
}
