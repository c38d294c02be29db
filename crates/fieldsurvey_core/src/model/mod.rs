//! Typed records for the five stored entities.
//!
//! # Responsibility
//! - Decode query rows (`RowRef`) into typed records.
//! - Encode new records into `ContentValues` for the mutation coordinator.
//!
//! # Invariants
//! - Status enums round-trip through their lowercase text form.
//! - Decoding never panics; a missing or mistyped required column is
//!   `StoreError::InvalidData`.

pub mod campaign;
pub mod response;
pub mod survey;

use crate::error::{StoreError, StoreResult};
use crate::query::RowRef;

/// Record that can be decoded from one query row.
pub trait FromRow: Sized {
    fn from_row(row: &RowRef<'_>) -> StoreResult<Self>;
}

macro_rules! impl_from_row {
    ($($ty:ty),+ $(,)?) => {
        $(impl FromRow for $ty {
            fn from_row(row: &RowRef<'_>) -> StoreResult<Self> {
                <$ty>::from_row(row)
            }
        })+
    };
}

impl_from_row!(
    campaign::Campaign,
    survey::Survey,
    survey::SurveyPrompt,
    response::Response,
    response::PromptResponse,
);

fn required_text(row: &RowRef<'_>, column: &str) -> StoreResult<String> {
    row.get_text(column)
        .map(str::to_string)
        .ok_or_else(|| StoreError::InvalidData(format!("column `{column}` is missing or not text")))
}

fn required_i64(row: &RowRef<'_>, column: &str) -> StoreResult<i64> {
    row.get_i64(column)
        .ok_or_else(|| StoreError::InvalidData(format!("column `{column}` is missing or not an integer")))
}

fn optional_text(row: &RowRef<'_>, column: &str) -> Option<String> {
    row.get_text(column).map(str::to_string)
}
