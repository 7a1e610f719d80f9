//! Repositories for events, templates and issued certificates.
//!
//! Handlers depend on the traits below, injected as `web::Data<dyn Trait>`;
//! `SqliteStore` is the only backend and implements all three.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use common::model::certificate::CertificateRecord;
use common::model::event::Event;
use common::model::template::Template;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    /// The record exists but belongs to another organization.
    #[error("record belongs to another organization")]
    Forbidden,
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Events, always scoped by the caller's organization.
///
/// Reads of an event owned by another organization fail with
/// [`StoreError::Forbidden`], never [`StoreError::NotFound`].
pub trait EventRepository: Send + Sync {
    fn list_events(&self, organization_id: &str) -> StoreResult<Vec<Event>>;

    fn get_event(&self, organization_id: &str, id: &str) -> StoreResult<Event>;

    /// Insert or replace. The event's own `organization_id` must match.
    fn put_event(&self, organization_id: &str, event: &Event) -> StoreResult<()>;

    /// Read-modify-write inside one transaction.
    fn update_event(
        &self,
        organization_id: &str,
        id: &str,
        apply: &mut dyn FnMut(&mut Event),
    ) -> StoreResult<Event>;

    fn delete_event(&self, organization_id: &str, id: &str) -> StoreResult<()>;
}

/// Template metadata. The markup itself lives on disk, see [`crate::storage`].
pub trait TemplateRepository: Send + Sync {
    fn list_templates(&self) -> StoreResult<Vec<Template>>;

    fn get_template(&self, id: &str) -> StoreResult<Template>;

    fn find_template_by_name(&self, name: &str) -> StoreResult<Option<Template>>;

    fn insert_template(&self, template: &Template) -> StoreResult<()>;

    fn delete_template(&self, id: &str) -> StoreResult<()>;
}

pub trait CertificateRepository: Send + Sync {
    /// Insert or replace; retried tasks write the same id again.
    fn upsert_certificate(&self, record: &CertificateRecord) -> StoreResult<()>;

    fn get_certificate(&self, id: &str) -> StoreResult<CertificateRecord>;

    fn list_job_certificates(&self, job_id: &str) -> StoreResult<Vec<CertificateRecord>>;
}
