//! Parsing of campaign configuration documents and response payloads.
//!
//! # Responsibility
//! - Turn a stored campaign configuration (XML or JSON) into the survey and
//!   prompt definitions that populate `surveys` / `survey_prompts`.
//! - Turn a stored response payload into per-prompt answers.
//!
//! # Invariants
//! - Parsing is pure; nothing here touches the database.
//! - A document that yields no usable structure is an error, never an empty
//!   success.

pub mod campaign;
pub mod response;

pub use campaign::{parse_campaign_document, CampaignDefinition, PromptDefinition, SurveyDefinition};
pub use response::{parse_response_payload, PromptAnswer};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failures while reading a configuration document or response payload.
#[derive(Debug)]
pub enum DefinitionError {
    Xml(quick_xml::Error),
    Json(serde_json::Error),
    /// An element was present without one of its required children.
    MissingField {
        element: &'static str,
        field: &'static str,
    },
    /// The document is blank.
    Empty,
}

impl Display for DefinitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Xml(err) => write!(f, "malformed campaign xml: {err}"),
            Self::Json(err) => write!(f, "malformed json document: {err}"),
            Self::MissingField { element, field } => {
                write!(f, "`{element}` is missing required field `{field}`")
            }
            Self::Empty => write!(f, "document is empty"),
        }
    }
}

impl Error for DefinitionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Xml(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for DefinitionError {
    fn from(value: quick_xml::Error) -> Self {
        Self::Xml(value)
    }
}

impl From<serde_json::Error> for DefinitionError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
