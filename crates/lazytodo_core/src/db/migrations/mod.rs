//! SQLite migration registry and executor.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - After migrating, the todo slot table must match [`SLOT_COLUMNS`]; a table
//!   left behind by something else is rejected instead of written into.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

/// Table holding the serialized todo collections, one row per storage key.
pub const SLOT_TABLE: &str = "kv_store";
/// Column layout of [`SLOT_TABLE`] in declaration order.
pub const SLOT_COLUMNS: &[&str] = &["key", "value", "updated_at"];

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_kv_store.sql"),
}];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations in one transaction, then checks the slot table.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = current_user_version(conn)?;
    let latest = latest_version();

    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current < latest {
        let tx = conn.transaction()?;
        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            tx.execute_batch(migration.sql)?;
            tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        }
        tx.commit()?;
        info!("event=db_migrate module=db status=ok from_version={current} to_version={latest}");
    }

    verify_slot_table(conn)
}

fn verify_slot_table(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({SLOT_TABLE});"))?;
    let found = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if found.iter().map(String::as_str).eq(SLOT_COLUMNS.iter().copied()) {
        return Ok(());
    }
    error!(
        "event=db_migrate module=db status=error error_code=slot_schema_mismatch table={SLOT_TABLE} columns={}",
        found.len()
    );
    Err(DbError::SlotSchemaMismatch {
        table: SLOT_TABLE,
        found,
    })
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}
