//! [`SqliteStore`], the SQLite implementation of every repository trait.

use super::schema::SCHEMA;
use super::{
    CertificateRepository, EventRepository, StoreError, StoreResult, TemplateRepository,
};
use common::model::certificate::CertificateRecord;
use common::model::event::{Event, EventRole};
use common::model::template::{Template, TemplateType};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// A store backed by a single SQLite connection.
///
/// Cloning is cheap; clones share the connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// Event row before its JSON `roles` column is decoded.
struct RawEvent {
    id: String,
    organization_id: String,
    name: String,
    description: Option<String>,
    created_at: String,
    roles: String,
}

impl RawEvent {
    const COLUMNS: &'static str = "id, organization_id, name, description, created_at, roles";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            organization_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            roles: row.get(5)?,
        })
    }

    fn decode(self) -> StoreResult<Event> {
        let roles: Vec<EventRole> = serde_json::from_str(&self.roles)?;
        Ok(Event {
            id: self.id,
            organization_id: self.organization_id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            roles,
        })
    }
}

impl SqliteStore {
    /// Open (or create) a store at `path` and run schema initialisation.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory store, used by tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn fetch_event(conn: &Connection, id: &str) -> StoreResult<Option<Event>> {
    let sql = format!("SELECT {} FROM events WHERE id = ?1", RawEvent::COLUMNS);
    conn.query_row(&sql, params![id], RawEvent::from_row)
        .optional()?
        .map(RawEvent::decode)
        .transpose()
}

/// Resolve an event for `organization_id`, distinguishing missing from foreign.
fn owned_event(conn: &Connection, organization_id: &str, id: &str) -> StoreResult<Event> {
    let event = fetch_event(conn, id)?.ok_or(StoreError::NotFound)?;
    if event.organization_id != organization_id {
        return Err(StoreError::Forbidden);
    }
    Ok(event)
}

fn write_event(conn: &Connection, event: &Event) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO events (id, organization_id, name, description, created_at, roles)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             organization_id = excluded.organization_id,
             name = excluded.name,
             description = excluded.description,
             created_at = excluded.created_at,
             roles = excluded.roles",
        params![
            event.id,
            event.organization_id,
            event.name,
            event.description,
            event.created_at,
            serde_json::to_string(&event.roles)?,
        ],
    )?;
    Ok(())
}

impl EventRepository for SqliteStore {
    fn list_events(&self, organization_id: &str) -> StoreResult<Vec<Event>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM events WHERE organization_id = ?1 ORDER BY rowid",
            RawEvent::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params![organization_id], RawEvent::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawEvent::decode).collect()
    }

    fn get_event(&self, organization_id: &str, id: &str) -> StoreResult<Event> {
        let conn = self.lock()?;
        owned_event(&conn, organization_id, id)
    }

    fn put_event(&self, organization_id: &str, event: &Event) -> StoreResult<()> {
        if event.organization_id != organization_id {
            return Err(StoreError::Forbidden);
        }
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if let Some(existing) = fetch_event(&tx, &event.id)? {
            if existing.organization_id != organization_id {
                return Err(StoreError::Forbidden);
            }
        }
        write_event(&tx, event)?;
        tx.commit()?;
        Ok(())
    }

    fn update_event(
        &self,
        organization_id: &str,
        id: &str,
        apply: &mut dyn FnMut(&mut Event),
    ) -> StoreResult<Event> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut event = owned_event(&tx, organization_id, id)?;
        apply(&mut event);
        // Identity and ownership are not editable through an update.
        event.id = id.to_string();
        event.organization_id = organization_id.to_string();
        write_event(&tx, &event)?;
        tx.commit()?;
        Ok(event)
    }

    fn delete_event(&self, organization_id: &str, id: &str) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        owned_event(&tx, organization_id, id)?;
        tx.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let tag: String = row.get(2)?;
    let template_type = tag.parse::<TemplateType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(Template::new(id, name, template_type))
}

impl TemplateRepository for SqliteStore {
    fn list_templates(&self) -> StoreResult<Vec<Template>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, name, template_type FROM templates ORDER BY rowid")?;
        let templates = stmt
            .query_map([], template_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    fn get_template(&self, id: &str) -> StoreResult<Template> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, template_type FROM templates WHERE id = ?1",
            params![id],
            template_from_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound)
    }

    fn find_template_by_name(&self, name: &str) -> StoreResult<Option<Template>> {
        let conn = self.lock()?;
        let template = conn
            .query_row(
                "SELECT id, name, template_type FROM templates WHERE name = ?1 LIMIT 1",
                params![name],
                template_from_row,
            )
            .optional()?;
        Ok(template)
    }

    fn insert_template(&self, template: &Template) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO templates (id, name, template_type) VALUES (?1, ?2, ?3)",
            params![template.id, template.name, template.template_type.as_str()],
        )?;
        Ok(())
    }

    fn delete_template(&self, id: &str) -> StoreResult<()> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn certificate_from_row(row: &Row<'_>) -> rusqlite::Result<CertificateRecord> {
    Ok(CertificateRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        template_id: row.get(2)?,
        template_digest: row.get(3)?,
        fio: row.get(4)?,
        email: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const CERTIFICATE_COLUMNS: &str = "id, job_id, template_id, template_digest, fio, email, created_at";

impl CertificateRepository for SqliteStore {
    fn upsert_certificate(&self, record: &CertificateRecord) -> StoreResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO certificates
                 (id, job_id, template_id, template_digest, fio, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 job_id = excluded.job_id,
                 template_id = excluded.template_id,
                 template_digest = excluded.template_digest,
                 fio = excluded.fio,
                 email = excluded.email,
                 created_at = excluded.created_at",
            params![
                record.id,
                record.job_id,
                record.template_id,
                record.template_digest,
                record.fio,
                record.email,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_certificate(&self, id: &str) -> StoreResult<CertificateRecord> {
        let conn = self.lock()?;
        let sql = format!("SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE id = ?1");
        conn.query_row(&sql, params![id], certificate_from_row)
            .optional()?
            .ok_or(StoreError::NotFound)
    }

    fn list_job_certificates(&self, job_id: &str) -> StoreResult<Vec<CertificateRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE job_id = ?1 ORDER BY rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![job_id], certificate_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
