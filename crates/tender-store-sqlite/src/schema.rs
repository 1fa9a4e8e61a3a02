//! SQL schema for the tender SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS tenders (
    tender_id                  TEXT PRIMARY KEY,
    reference_number           TEXT NOT NULL UNIQUE,
    title                      TEXT NOT NULL,
    issuing_authority          TEXT,
    submission_deadline        TEXT,   -- RFC 3339
    clarification_closing_date TEXT,   -- RFC 3339
    project_start_date         TEXT,   -- YYYY-MM-DD
    project_completion_date    TEXT,   -- YYYY-MM-DD
    site_location              TEXT,
    contract_type              TEXT,
    status                     TEXT NOT NULL DEFAULT 'pending',
    created_at                 TEXT NOT NULL,
    updated_at                 TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS addenda (
    addendum_id   TEXT PRIMARY KEY,
    tender_id     TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    number        INTEGER NOT NULL CHECK (number >= 1),
    kind          TEXT NOT NULL,   -- 'addendum' | 'clarification' | 'corrigendum'
    title         TEXT,
    summary       TEXT,
    source        TEXT,
    received_at   TEXT NOT NULL,
    processed     INTEGER NOT NULL DEFAULT 0,
    processed_at  TEXT,
    UNIQUE (tender_id, number)
);

CREATE TABLE IF NOT EXISTS qualification_criteria (
    criterion_id              TEXT PRIMARY KEY,
    tender_id                 TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    criterion_type            TEXT NOT NULL,
    description               TEXT NOT NULL,
    value                     TEXT,
    is_met                    INTEGER,          -- NULL until evaluated
    notes                     TEXT,
    checked_at                TEXT,
    source                    TEXT NOT NULL DEFAULT 'original',
    introduced_by_addendum_id TEXT REFERENCES addenda(addendum_id) ON DELETE CASCADE,
    requires_recheck          INTEGER NOT NULL DEFAULT 0,
    added_at                  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS required_documents (
    requirement_id            TEXT PRIMARY KEY,
    tender_id                 TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    name                      TEXT NOT NULL,
    category                  TEXT,
    description               TEXT,
    is_mandatory              INTEGER NOT NULL DEFAULT 1,
    is_received               INTEGER NOT NULL DEFAULT 0,
    source                    TEXT NOT NULL DEFAULT 'original',
    introduced_by_addendum_id TEXT REFERENCES addenda(addendum_id) ON DELETE CASCADE,
    added_at                  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS received_documents (
    received_id    TEXT PRIMARY KEY,
    tender_id      TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    file_reference TEXT,
    file_size_kb   INTEGER,
    uploaded_by    TEXT,
    received_at    TEXT NOT NULL
);

-- Only is_current and superseded_by are ever updated.
CREATE TABLE IF NOT EXISTS document_versions (
    version_id                TEXT PRIMARY KEY,
    tender_id                 TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    document_name             TEXT NOT NULL,
    version_label             TEXT NOT NULL,
    file_reference            TEXT NOT NULL,
    content_hash              TEXT,
    is_current                INTEGER NOT NULL DEFAULT 1,
    superseded_by             TEXT REFERENCES document_versions(version_id),
    introduced_by_addendum_id TEXT REFERENCES addenda(addendum_id) ON DELETE CASCADE,
    uploaded_at               TEXT NOT NULL,
    CHECK (superseded_by IS NULL OR superseded_by != version_id)
);

-- At most one current version per (tender, document).
CREATE UNIQUE INDEX IF NOT EXISTS document_versions_current_idx
    ON document_versions(tender_id, document_name) WHERE is_current = 1;

-- Append-only audit ledger. `sequence` orders entries tender-wide.
CREATE TABLE IF NOT EXISTS addendum_changes (
    sequence     INTEGER PRIMARY KEY AUTOINCREMENT,
    change_id    TEXT NOT NULL UNIQUE,
    tender_id    TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    addendum_id  TEXT NOT NULL REFERENCES addenda(addendum_id) ON DELETE CASCADE,
    entity_kind  TEXT NOT NULL,
    entity_id    TEXT NOT NULL,
    field_name   TEXT NOT NULL,
    old_value    TEXT,
    new_value    TEXT,
    change_kind  TEXT NOT NULL,   -- 'insert' | 'update'
    recorded_at  TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS addendum_changes_append_only
BEFORE UPDATE ON addendum_changes
BEGIN
    SELECT RAISE(ABORT, 'addendum_changes is append-only');
END;

-- Criteria awaiting re-evaluation. A row exists iff requires_recheck = 1.
CREATE TABLE IF NOT EXISTS recheck_queue (
    criterion_id TEXT PRIMARY KEY
                 REFERENCES qualification_criteria(criterion_id) ON DELETE CASCADE,
    tender_id    TEXT NOT NULL REFERENCES tenders(tender_id) ON DELETE CASCADE,
    addendum_id  TEXT REFERENCES addenda(addendum_id) ON DELETE CASCADE,
    enqueued_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS addenda_tender_idx     ON addenda(tender_id, processed);
CREATE INDEX IF NOT EXISTS criteria_tender_idx    ON qualification_criteria(tender_id);
CREATE INDEX IF NOT EXISTS required_tender_idx    ON required_documents(tender_id, name);
CREATE INDEX IF NOT EXISTS received_tender_idx    ON received_documents(tender_id, name);
CREATE INDEX IF NOT EXISTS versions_document_idx  ON document_versions(tender_id, document_name);
CREATE INDEX IF NOT EXISTS changes_addendum_idx   ON addendum_changes(addendum_id);
CREATE INDEX IF NOT EXISTS recheck_tender_idx     ON recheck_queue(tender_id);

PRAGMA user_version = 1;
";
