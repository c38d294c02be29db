//! Local store for field-survey campaigns, surveys and responses.
//!
//! Callers address data by hierarchical URI (`campaigns/{urn}/surveys`,
//! `responses/{id}/prompts`, ...) through [`SurveyStore`], which resolves
//! the route, scopes the query, keeps derived rows consistent and publishes
//! change notifications.

pub mod cache;
pub mod config;
pub mod db;
pub mod definition;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod provider;
pub mod query;
pub mod repo;
pub mod resolver;
pub mod route;
pub mod schema;
pub mod service;

pub use cache::{DisabledIconCache, FileIconCache, IconCache};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::campaign::{Campaign, CampaignStatus, NewCampaign};
pub use model::response::{NewResponse, PromptResponse, Response, ResponseStatus};
pub use model::survey::{Survey, SurveyPrompt};
pub use model::FromRow;
pub use notify::{ChangeNotifier, ChangeObserver};
pub use provider::SurveyStore;
pub use query::{ContentValues, RowRef, RowSet};
pub use resolver::Aggregate;
pub use route::{Cardinality, EntityKind, ResourceType, Route};
pub use rusqlite::types::Value;
pub use service::maintenance::{verify_state, IntegrityViolation, SweepReport};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
