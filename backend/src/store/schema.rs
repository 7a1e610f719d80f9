/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS events (
    id              TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    name            TEXT NOT NULL,
    description     TEXT,
    created_at      TEXT NOT NULL,
    roles           TEXT NOT NULL DEFAULT '[]'   -- JSON array of {name, color}
);

CREATE TABLE IF NOT EXISTS templates (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    template_type TEXT NOT NULL                 -- 'svg' | 'html'
);

CREATE TABLE IF NOT EXISTS certificates (
    id              TEXT PRIMARY KEY,
    job_id          TEXT NOT NULL,
    template_id     TEXT NOT NULL,
    template_digest TEXT NOT NULL,
    fio             TEXT NOT NULL,
    email           TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS events_org_idx       ON events(organization_id);
CREATE INDEX IF NOT EXISTS certificates_job_idx ON certificates(job_id);
";
