//! Startup consistency sweep.
//!
//! # Invariants
//! - Responses interrupted mid-upload (`queued`, `uploading`,
//!   `waiting_for_location`) go back to `standby`.
//! - Responses without a uuid cannot be uploaded or addressed; they are
//!   reported and deleted together with their prompt responses.
//! - `purged` counts exactly the rows listed in `violations`.

use crate::error::StoreResult;
use crate::model::response::ResponseStatus;
use crate::provider::SurveyStore;
use crate::query::ContentValues;
use crate::schema::{responses, Table};
use log::{info, warn};
use rusqlite::types::Value;
use std::fmt::{Display, Formatter};

/// Row found in a state the store cannot serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    pub table: Table,
    pub row_id: i64,
    pub reason: &'static str,
}

impl Display for IntegrityViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} row {}: {}", self.table, self.row_id, self.reason)
    }
}

/// Outcome of `verify_state`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Responses moved back to `standby`.
    pub reset: usize,
    /// Responses deleted for lacking a uuid.
    pub purged: usize,
    pub violations: Vec<IntegrityViolation>,
}

/// Repairs state left behind by a crash or an interrupted upload.
pub fn verify_state(store: &SurveyStore) -> StoreResult<SweepReport> {
    let in_flight = ResponseStatus::IN_FLIGHT
        .iter()
        .map(|status| Value::Text(status.as_str().to_string()))
        .collect::<Vec<_>>();
    let placeholders = vec!["?"; in_flight.len()].join(", ");
    let reset = store.update(
        "responses",
        &ContentValues::new().with_text(responses::STATUS.name(), ResponseStatus::Standby.as_str()),
        Some(&format!("{} IN ({placeholders})", responses::STATUS.name())),
        &in_flight,
    )?;

    let missing_uuid = format!("{} IS NULL", responses::UUID.name());
    let violations = store.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT _id FROM responses WHERE {missing_uuid} ORDER BY _id"
        ))?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids
            .into_iter()
            .map(|row_id| IntegrityViolation {
                table: Table::Responses,
                row_id,
                reason: "response has no uuid",
            })
            .collect::<Vec<_>>())
    })?;
    for violation in &violations {
        warn!(
            "event=integrity_violation module=maintenance status=error table={} row_id={} reason={}",
            violation.table,
            violation.row_id,
            violation.reason.replace(' ', "_")
        );
    }

    // Rows turning up after the scan are left to the next sweep.
    let purged = if violations.is_empty() {
        0
    } else {
        let ids = violations
            .iter()
            .map(|violation| Value::Integer(violation.row_id))
            .collect::<Vec<_>>();
        let placeholders = vec!["?"; ids.len()].join(", ");
        store.delete(
            "responses",
            Some(&format!("_id IN ({placeholders}) AND {missing_uuid}")),
            &ids,
        )?
    };

    info!(
        "event=verify_state module=maintenance status=ok reset={} purged={}",
        reset, purged
    );
    Ok(SweepReport {
        reset,
        purged,
        violations,
    })
}
