//! Store-level use cases built on the public data-access surface.
//!
//! # Responsibility
//! - Run multi-step maintenance (startup sweep) through `SurveyStore` so
//!   every change is routed, scoped and notified like a caller's would be.

pub mod maintenance;
