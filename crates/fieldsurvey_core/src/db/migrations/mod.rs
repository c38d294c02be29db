//! Survey schema migrations.
//!
//! # Invariants
//! - Steps are listed in increasing `version` order and never edited once
//!   shipped; schema changes append a new step.
//! - A run applies every pending step in one transaction and records the
//!   final version in `PRAGMA user_version`.
//! - A migrated database must pass `PRAGMA foreign_key_check`.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "survey_tables",
        sql: include_str!("0001_init.sql"),
    },
    Step {
        version: 2,
        name: "lookup_indexes",
        sql: include_str!("0002_indexes.sql"),
    },
];

/// Schema version this binary migrates to.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to `latest_version()` and returns the version it started at.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let from = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending = STEPS.iter().filter(|step| step.version > from);
    let tx = conn.transaction()?;
    let mut applied = 0;
    for step in pending {
        debug!(
            "event=db_migrate_step module=db status=start version={} name={}",
            step.version, step.name
        );
        tx.execute_batch(step.sql)?;
        applied += 1;
    }
    if applied == 0 {
        return Ok(from);
    }
    tx.pragma_update(None, "user_version", latest)?;
    let dangling: i64 =
        tx.query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| row.get(0))?;
    if dangling > 0 {
        return Err(DbError::ForeignKeyCheck { violations: dangling });
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        from, latest, applied
    );
    Ok(from)
}
