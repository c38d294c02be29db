//! Query building and result materialization.
//!
//! # Responsibility
//! - Compose FROM/join targets, column remapping and ANDed predicates.
//! - Execute SELECT/UPDATE/DELETE/INSERT against a bound connection.
//! - Hand results back as owned row sets so the store lock is never held by
//!   a caller iterating rows.

pub mod builder;
pub mod rowset;
pub mod values;

pub use builder::SelectionBuilder;
pub use rowset::{RowRef, RowSet};
pub use values::ContentValues;
