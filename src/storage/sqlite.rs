//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::state::{AnalysisResult, HeadingCounts, Status, WorkItem};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

const SELECT_COLUMNS: &str = "SELECT id, url, normalized_url, status, page_title, html_version,
     h1, h2, h3, h4, h5, h6, internal_links, external_links, inaccessible_links,
     has_login_form, error_reason, error_code, created_at, attempt
     FROM work_items";

const UPDATE_SQL: &str = "UPDATE work_items SET url = ?2, normalized_url = ?3, status = ?4,
     page_title = ?5, html_version = ?6, h1 = ?7, h2 = ?8, h3 = ?9, h4 = ?10, h5 = ?11,
     h6 = ?12, internal_links = ?13, external_links = ?14, inaccessible_links = ?15,
     has_login_form = ?16, error_reason = ?17, error_code = ?18, attempt = ?19
     WHERE id = ?1";

/// SQLite storage backend
///
/// The connection sits behind a mutex so the store can be shared between
/// concurrently running analysis tasks.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<WorkItem> {
    let created_at: String = row.get(18)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(18, Type::Text, Box::new(e)))?;

    let attempt: i64 = row.get(19)?;

    Ok(WorkItem {
        id: row.get(0)?,
        url: row.get(1)?,
        normalized_url: row.get(2)?,
        status: parse_status(row.get(3)?)?,
        result: AnalysisResult {
            page_title: row.get(4)?,
            html_version: row.get(5)?,
            headings: HeadingCounts {
                h1: row.get(6)?,
                h2: row.get(7)?,
                h3: row.get(8)?,
                h4: row.get(9)?,
                h5: row.get(10)?,
                h6: row.get(11)?,
            },
            internal_links: row.get(12)?,
            external_links: row.get(13)?,
            inaccessible_links: row.get(14)?,
            has_login_form: row.get(15)?,
        },
        error_reason: row.get(16)?,
        error_code: row.get(17)?,
        created_at,
        attempt: attempt.max(0) as u64,
    })
}

#[derive(Debug, Error)]
#[error("unknown status '{0}'")]
struct UnknownStatus(String);

fn parse_status(raw: String) -> rusqlite::Result<Status> {
    Status::from_db_string(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(UnknownStatus(raw)))
    })
}

fn update_item(
    conn: &Connection,
    sql: &str,
    item: &WorkItem,
    guard: &[&dyn ToSql],
) -> rusqlite::Result<usize> {
    let r = &item.result;
    let status = item.status.to_db_string();
    let attempt = item.attempt as i64;

    let mut values: Vec<&dyn ToSql> = vec![
        &item.id,
        &item.url,
        &item.normalized_url,
        &status,
        &r.page_title,
        &r.html_version,
        &r.headings.h1,
        &r.headings.h2,
        &r.headings.h3,
        &r.headings.h4,
        &r.headings.h5,
        &r.headings.h6,
        &r.internal_links,
        &r.external_links,
        &r.inaccessible_links,
        &r.has_login_form,
        &item.error_reason,
        &item.error_code,
        &attempt,
    ];
    values.extend_from_slice(guard);
    conn.execute(sql, values.as_slice())
}

impl Store for SqliteStore {
    fn create(&self, mut item: WorkItem) -> StorageResult<WorkItem> {
        if item.id.is_empty() {
            item.id = Uuid::new_v4().to_string();
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO work_items (id, url, normalized_url, status, created_at, attempt)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                item.id,
                item.url,
                item.normalized_url,
                item.status.to_db_string(),
                item.created_at.to_rfc3339(),
                item.attempt as i64,
            ],
        )?;
        // Result columns start from their defaults; carry any provided values over.
        update_item(&tx, UPDATE_SQL, &item, &[])?;
        tx.commit()?;

        Ok(item)
    }

    fn get(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        let conn = self.lock()?;
        let item = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn list(&self) -> StorageResult<Vec<WorkItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY created_at DESC", SELECT_COLUMNS))?;
        let items = stmt
            .query_map([], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn query_by_status(&self, status: Status) -> StorageResult<Vec<WorkItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE status = ?1 ORDER BY created_at ASC",
            SELECT_COLUMNS
        ))?;
        let items = stmt
            .query_map(params![status.to_db_string()], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn save(&self, item: &WorkItem) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = update_item(&conn, UPDATE_SQL, item, &[])?;
        Ok(changed > 0)
    }

    fn compare_and_save(
        &self,
        item: &WorkItem,
        expected_attempt: u64,
        expected_status: Status,
    ) -> StorageResult<bool> {
        let sql = format!("{} AND attempt = ?20 AND status = ?21", UPDATE_SQL);
        let expected_attempt = expected_attempt as i64;
        let expected_status = expected_status.to_db_string();

        let guard: [&dyn ToSql; 2] = [&expected_attempt, &expected_status];

        let conn = self.lock()?;
        let changed = update_item(&conn, &sql, item, &guard)?;
        Ok(changed > 0)
    }

    fn reset(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE work_items SET status = ?2, page_title = '', html_version = '',
             h1 = 0, h2 = 0, h3 = 0, h4 = 0, h5 = 0, h6 = 0,
             internal_links = 0, external_links = 0, inaccessible_links = 0,
             has_login_form = 0, error_reason = '', error_code = 0, attempt = attempt + 1
             WHERE id = ?1",
            params![id, Status::Queued.to_db_string()],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        let item = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    fn delete_by_id(&self, id: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM work_items WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    fn count_by_status(&self, status: Status) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM work_items WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
