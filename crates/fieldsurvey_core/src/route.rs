//! Resource path router.
//!
//! # Responsibility
//! - Match a hierarchical resource path against the sixteen supported shapes.
//! - Extract typed path parameters.
//! - Render a route back to its canonical path.
//!
//! # Invariants
//! - Matching is purely structural: segment count plus literal/wildcard
//!   segments. The shapes are disjoint, so at most one variant matches.
//! - Numeric id segments (`responses/{id}`, `prompts/{id}`) must parse as
//!   `i64`; anything else is an unsupported route.
//! - `Route::parse(route.to_string())` yields the same route.

use crate::error::{StoreError, StoreResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One of the sixteen supported resource shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// `campaigns`
    Campaigns,
    /// `campaigns/{urn}`
    CampaignByUrn { urn: String },
    /// `surveys`
    Surveys,
    /// `campaigns/{urn}/surveys`
    CampaignSurveys { urn: String },
    /// `campaigns/{urn}/surveys/{id}`
    SurveyById { urn: String, survey_id: String },
    /// `campaigns/{urn}/surveys/{id}/prompts`
    SurveyPrompts { urn: String, survey_id: String },
    /// `surveys/prompts`
    AllSurveyPrompts,
    /// `responses`
    Responses,
    /// `responses/{id}`
    ResponseById { id: i64 },
    /// `responses/{id}/prompts`
    ResponsePrompts { id: i64 },
    /// `prompts`
    PromptResponses,
    /// `prompts/{id}`
    PromptResponseById { id: i64 },
    /// `campaigns/{urn}/responses`
    CampaignResponses { urn: String },
    /// `campaigns/{urn}/surveys/{id}/responses`
    SurveyResponses { urn: String, survey_id: String },
    /// `campaigns/{urn}/surveys/{id}/responses/prompts/{pid}`
    PromptValues {
        urn: String,
        survey_id: String,
        prompt_id: String,
    },
    /// `campaigns/{urn}/surveys/{id}/responses/prompts/{pid}/{aggregate}`
    PromptAggregate {
        urn: String,
        survey_id: String,
        prompt_id: String,
        aggregate: String,
    },
}

/// Entity family a route reads from or mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Campaign,
    Survey,
    SurveyPrompt,
    Response,
    PromptResponse,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::Campaign,
        EntityKind::Survey,
        EntityKind::SurveyPrompt,
        EntityKind::Response,
        EntityKind::PromptResponse,
    ];

    /// Canonical collection path observers subscribe to.
    pub fn collection_uri(self) -> &'static str {
        match self {
            Self::Campaign => "campaigns",
            Self::Survey => "surveys",
            Self::SurveyPrompt => "surveys/prompts",
            Self::Response => "responses",
            Self::PromptResponse => "prompts",
        }
    }

    /// Collections whose contents may change when this entity is mutated,
    /// starting with the entity's own collection.
    pub fn affected_collections(self) -> &'static [EntityKind] {
        match self {
            Self::Campaign => &EntityKind::ALL,
            Self::Survey => &[EntityKind::Survey, EntityKind::SurveyPrompt],
            Self::SurveyPrompt => &[EntityKind::SurveyPrompt],
            Self::Response => &[EntityKind::Response, EntityKind::PromptResponse],
            Self::PromptResponse => &[EntityKind::PromptResponse],
        }
    }
}

/// Whether a route addresses many rows or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Collection,
    Item,
}

/// Kind of resource a route yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceType {
    pub entity: EntityKind,
    pub cardinality: Cardinality,
}

impl Route {
    /// Matches `path` against the supported shapes.
    ///
    /// Leading and trailing `/` are ignored; empty inner segments never match.
    ///
    /// # Errors
    /// - `UnsupportedRoute` when no shape matches.
    pub fn parse(path: &str) -> StoreResult<Self> {
        let trimmed = path.trim().trim_matches('/');
        let segments = trimmed.split('/').collect::<Vec<_>>();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(unsupported(path));
        }

        let route = match segments.as_slice() {
            ["campaigns"] => Self::Campaigns,
            ["campaigns", urn] => Self::CampaignByUrn {
                urn: urn.to_string(),
            },
            ["surveys"] => Self::Surveys,
            ["surveys", "prompts"] => Self::AllSurveyPrompts,
            ["campaigns", urn, "surveys"] => Self::CampaignSurveys {
                urn: urn.to_string(),
            },
            ["campaigns", urn, "surveys", survey_id] => Self::SurveyById {
                urn: urn.to_string(),
                survey_id: survey_id.to_string(),
            },
            ["campaigns", urn, "surveys", survey_id, "prompts"] => Self::SurveyPrompts {
                urn: urn.to_string(),
                survey_id: survey_id.to_string(),
            },
            ["campaigns", urn, "responses"] => Self::CampaignResponses {
                urn: urn.to_string(),
            },
            ["campaigns", urn, "surveys", survey_id, "responses"] => Self::SurveyResponses {
                urn: urn.to_string(),
                survey_id: survey_id.to_string(),
            },
            ["campaigns", urn, "surveys", survey_id, "responses", "prompts", prompt_id] => {
                Self::PromptValues {
                    urn: urn.to_string(),
                    survey_id: survey_id.to_string(),
                    prompt_id: prompt_id.to_string(),
                }
            }
            ["campaigns", urn, "surveys", survey_id, "responses", "prompts", prompt_id, aggregate] => {
                Self::PromptAggregate {
                    urn: urn.to_string(),
                    survey_id: survey_id.to_string(),
                    prompt_id: prompt_id.to_string(),
                    aggregate: aggregate.to_string(),
                }
            }
            ["responses"] => Self::Responses,
            ["responses", id] => Self::ResponseById {
                id: parse_row_id(id, path)?,
            },
            ["responses", id, "prompts"] => Self::ResponsePrompts {
                id: parse_row_id(id, path)?,
            },
            ["prompts"] => Self::PromptResponses,
            ["prompts", id] => Self::PromptResponseById {
                id: parse_row_id(id, path)?,
            },
            _ => return Err(unsupported(path)),
        };
        Ok(route)
    }

    /// Entity family this route reads from or mutates.
    pub fn entity(&self) -> EntityKind {
        self.resource_type().entity
    }

    pub fn resource_type(&self) -> ResourceType {
        use Cardinality::{Collection, Item};

        let (entity, cardinality) = match self {
            Self::Campaigns => (EntityKind::Campaign, Collection),
            Self::CampaignByUrn { .. } => (EntityKind::Campaign, Item),
            Self::Surveys | Self::CampaignSurveys { .. } => (EntityKind::Survey, Collection),
            Self::SurveyById { .. } => (EntityKind::Survey, Item),
            Self::SurveyPrompts { .. } | Self::AllSurveyPrompts => {
                (EntityKind::SurveyPrompt, Collection)
            }
            Self::Responses | Self::CampaignResponses { .. } | Self::SurveyResponses { .. } => {
                (EntityKind::Response, Collection)
            }
            Self::ResponseById { .. } => (EntityKind::Response, Item),
            Self::PromptResponses
            | Self::ResponsePrompts { .. }
            | Self::PromptValues { .. }
            | Self::PromptAggregate { .. } => (EntityKind::PromptResponse, Collection),
            Self::PromptResponseById { .. } => (EntityKind::PromptResponse, Item),
        };
        ResourceType {
            entity,
            cardinality,
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Campaigns => f.write_str("campaigns"),
            Self::CampaignByUrn { urn } => write!(f, "campaigns/{urn}"),
            Self::Surveys => f.write_str("surveys"),
            Self::CampaignSurveys { urn } => write!(f, "campaigns/{urn}/surveys"),
            Self::SurveyById { urn, survey_id } => write!(f, "campaigns/{urn}/surveys/{survey_id}"),
            Self::SurveyPrompts { urn, survey_id } => {
                write!(f, "campaigns/{urn}/surveys/{survey_id}/prompts")
            }
            Self::AllSurveyPrompts => f.write_str("surveys/prompts"),
            Self::Responses => f.write_str("responses"),
            Self::ResponseById { id } => write!(f, "responses/{id}"),
            Self::ResponsePrompts { id } => write!(f, "responses/{id}/prompts"),
            Self::PromptResponses => f.write_str("prompts"),
            Self::PromptResponseById { id } => write!(f, "prompts/{id}"),
            Self::CampaignResponses { urn } => write!(f, "campaigns/{urn}/responses"),
            Self::SurveyResponses { urn, survey_id } => {
                write!(f, "campaigns/{urn}/surveys/{survey_id}/responses")
            }
            Self::PromptValues {
                urn,
                survey_id,
                prompt_id,
            } => write!(
                f,
                "campaigns/{urn}/surveys/{survey_id}/responses/prompts/{prompt_id}"
            ),
            Self::PromptAggregate {
                urn,
                survey_id,
                prompt_id,
                aggregate,
            } => write!(
                f,
                "campaigns/{urn}/surveys/{survey_id}/responses/prompts/{prompt_id}/{aggregate}"
            ),
        }
    }
}

impl FromStr for Route {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_row_id(segment: &str, path: &str) -> StoreResult<i64> {
    segment.parse::<i64>().map_err(|_| unsupported(path))
}

fn unsupported(path: &str) -> StoreError {
    StoreError::UnsupportedRoute(path.to_string())
}
