//! Per-entity schema descriptors.
//!
//! # Responsibility
//! - Name every table and column exactly once.
//! - Provide table-qualified accessors so joined queries never read a shared
//!   column name (`_id`, `campaign_urn`, `survey_id`, `prompt_id`) from the
//!   wrong table.
//! - Describe the join sources used by read routes.
//!
//! # Invariants
//! - A `Column` always carries its owner; `qualified()` is the only way SQL
//!   text refers to a column of a joined source.
//! - The prompt-type lookup (`SQ`) is a subquery recomputed per statement,
//!   never a stored table.

use std::fmt::{Display, Formatter};

/// One of the five stored tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Campaigns,
    Surveys,
    SurveyPrompts,
    Responses,
    PromptResponses,
}

impl Table {
    /// Every table in parent-to-child order.
    pub const ALL: [Table; 5] = [
        Table::Campaigns,
        Table::Surveys,
        Table::SurveyPrompts,
        Table::Responses,
        Table::PromptResponses,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Campaigns => "campaigns",
            Self::Surveys => "surveys",
            Self::SurveyPrompts => "survey_prompts",
            Self::Responses => "responses",
            Self::PromptResponses => "prompt_responses",
        }
    }

    /// Stored columns of this table.
    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Campaigns => campaigns::ALL,
            Self::Surveys => surveys::ALL,
            Self::SurveyPrompts => survey_prompts::ALL,
            Self::Responses => responses::ALL,
            Self::PromptResponses => prompt_responses::ALL,
        }
    }

    /// Looks up a stored column by its unqualified name.
    pub fn column(self, name: &str) -> Option<Column> {
        self.columns()
            .iter()
            .copied()
            .find(|column| column.name() == name)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Column reference bound to the table (or subquery alias) that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    owner: &'static str,
    name: &'static str,
}

impl Column {
    pub const fn new(owner: &'static str, name: &'static str) -> Self {
        Self { owner, name }
    }

    pub fn owner(self) -> &'static str {
        self.owner
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    /// `owner.name`, safe to use inside any join.
    pub fn qualified(self) -> String {
        format!("{}.{}", self.owner, self.name)
    }
}

pub mod campaigns {
    use super::Column;

    const T: &str = "campaigns";
    pub const ID: Column = Column::new(T, "_id");
    pub const URN: Column = Column::new(T, "campaign_urn");
    pub const NAME: Column = Column::new(T, "campaign_name");
    pub const DESCRIPTION: Column = Column::new(T, "campaign_description");
    pub const CREATED: Column = Column::new(T, "campaign_created");
    pub const DOWNLOADED: Column = Column::new(T, "campaign_downloaded");
    pub const CONFIGURATION: Column = Column::new(T, "campaign_configuration_xml");
    pub const STATUS: Column = Column::new(T, "campaign_status");
    pub const ICON: Column = Column::new(T, "campaign_icon");
    pub const PRIVACY: Column = Column::new(T, "campaign_privacy");
    pub const ALL: &[Column] = &[
        ID,
        URN,
        NAME,
        DESCRIPTION,
        CREATED,
        DOWNLOADED,
        CONFIGURATION,
        STATUS,
        ICON,
        PRIVACY,
    ];
}

pub mod surveys {
    use super::Column;

    const T: &str = "surveys";
    pub const ID: Column = Column::new(T, "_id");
    pub const CAMPAIGN_URN: Column = Column::new(T, "campaign_urn");
    pub const SURVEY_ID: Column = Column::new(T, "survey_id");
    pub const TITLE: Column = Column::new(T, "survey_title");
    pub const DESCRIPTION: Column = Column::new(T, "survey_description");
    pub const SUBMIT_TEXT: Column = Column::new(T, "survey_submit_text");
    pub const SHOW_SUMMARY: Column = Column::new(T, "survey_show_summary");
    pub const ANYTIME: Column = Column::new(T, "survey_anytime");
    pub const ALL: &[Column] = &[
        ID,
        CAMPAIGN_URN,
        SURVEY_ID,
        TITLE,
        DESCRIPTION,
        SUBMIT_TEXT,
        SHOW_SUMMARY,
        ANYTIME,
    ];
}

pub mod survey_prompts {
    use super::Column;

    const T: &str = "survey_prompts";
    pub const ID: Column = Column::new(T, "_id");
    pub const CAMPAIGN_URN: Column = Column::new(T, "campaign_urn");
    pub const SURVEY_ID: Column = Column::new(T, "survey_id");
    pub const PROMPT_ID: Column = Column::new(T, "prompt_id");
    pub const PROMPT_TYPE: Column = Column::new(T, "prompt_type");
    pub const PROMPT_TEXT: Column = Column::new(T, "prompt_text");
    pub const ALL: &[Column] = &[ID, CAMPAIGN_URN, SURVEY_ID, PROMPT_ID, PROMPT_TYPE, PROMPT_TEXT];
}

pub mod responses {
    use super::Column;

    const T: &str = "responses";
    pub const ID: Column = Column::new(T, "_id");
    pub const CAMPAIGN_URN: Column = Column::new(T, "campaign_urn");
    pub const SURVEY_ID: Column = Column::new(T, "survey_id");
    pub const UUID: Column = Column::new(T, "response_uuid");
    pub const TIME: Column = Column::new(T, "response_time");
    pub const TIMEZONE: Column = Column::new(T, "response_timezone");
    pub const LOCATION_STATUS: Column = Column::new(T, "response_location_status");
    pub const LATITUDE: Column = Column::new(T, "response_latitude");
    pub const LONGITUDE: Column = Column::new(T, "response_longitude");
    pub const PAYLOAD: Column = Column::new(T, "response_json");
    pub const STATUS: Column = Column::new(T, "response_status");
    pub const ALL: &[Column] = &[
        ID,
        CAMPAIGN_URN,
        SURVEY_ID,
        UUID,
        TIME,
        TIMEZONE,
        LOCATION_STATUS,
        LATITUDE,
        LONGITUDE,
        PAYLOAD,
        STATUS,
    ];
}

pub mod prompt_responses {
    use super::Column;

    const T: &str = "prompt_responses";
    pub const ID: Column = Column::new(T, "_id");
    pub const RESPONSE_ID: Column = Column::new(T, "response_id");
    pub const COMPOSITE_ID: Column = Column::new(T, "composite_id");
    pub const PROMPT_ID: Column = Column::new(T, "prompt_id");
    pub const VALUE: Column = Column::new(T, "prompt_value");
    pub const ALL: &[Column] = &[ID, RESPONSE_ID, COMPOSITE_ID, PROMPT_ID, VALUE];
}

/// Derived prompt-type lookup joined against `prompt_responses.composite_id`.
pub mod prompt_types {
    use super::Column;

    pub const ALIAS: &str = "SQ";
    pub const SUBQUERY: &str = "SELECT
            campaign_urn || ':' || survey_id || ':' || prompt_id AS composite_id,
            prompt_id,
            prompt_type,
            prompt_text
         FROM survey_prompts";
    pub const COMPOSITE_ID: Column = Column::new(ALIAS, "composite_id");
    pub const PROMPT_ID: Column = Column::new(ALIAS, "prompt_id");
    pub const PROMPT_TYPE: Column = Column::new(ALIAS, "prompt_type");
    pub const PROMPT_TEXT: Column = Column::new(ALIAS, "prompt_text");
}

/// Builds the composite id linking a prompt response to its survey prompt.
pub fn composite_id(campaign_urn: &str, survey_id: &str, prompt_id: &str) -> String {
    format!("{campaign_urn}:{survey_id}:{prompt_id}")
}

/// FROM target of a selection: a base table or one of the fixed joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Table(Table),
    /// `surveys` joined with the owning campaign.
    SurveysWithCampaign,
    /// `survey_prompts` joined with the owning survey.
    SurveyPromptsWithSurvey,
    /// `responses` joined with campaign and survey metadata.
    ResponsesWithContext,
    /// `prompt_responses` joined with response, campaign, survey and the
    /// prompt-type lookup.
    PromptResponsesWithContext,
}

impl Source {
    /// Returns the table when the source is not a join.
    pub fn base_table(self) -> Option<Table> {
        match self {
            Self::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn from_clause(self) -> String {
        match self {
            Self::Table(table) => table.name().to_string(),
            Self::SurveysWithCampaign => format!(
                "surveys INNER JOIN campaigns ON {} = {}",
                campaigns::URN.qualified(),
                surveys::CAMPAIGN_URN.qualified()
            ),
            Self::SurveyPromptsWithSurvey => format!(
                "survey_prompts INNER JOIN surveys ON {} = {} AND {} = {}",
                surveys::CAMPAIGN_URN.qualified(),
                survey_prompts::CAMPAIGN_URN.qualified(),
                surveys::SURVEY_ID.qualified(),
                survey_prompts::SURVEY_ID.qualified()
            ),
            Self::ResponsesWithContext => format!(
                "responses
                 INNER JOIN campaigns ON {} = {}
                 LEFT JOIN surveys ON {} = {} AND {} = {}",
                campaigns::URN.qualified(),
                responses::CAMPAIGN_URN.qualified(),
                surveys::CAMPAIGN_URN.qualified(),
                responses::CAMPAIGN_URN.qualified(),
                surveys::SURVEY_ID.qualified(),
                responses::SURVEY_ID.qualified()
            ),
            Self::PromptResponsesWithContext => format!(
                "prompt_responses
                 INNER JOIN responses ON {} = {}
                 INNER JOIN campaigns ON {} = {}
                 LEFT JOIN surveys ON {} = {} AND {} = {}
                 INNER JOIN ({}) {} ON {} = {}",
                responses::ID.qualified(),
                prompt_responses::RESPONSE_ID.qualified(),
                campaigns::URN.qualified(),
                responses::CAMPAIGN_URN.qualified(),
                surveys::CAMPAIGN_URN.qualified(),
                responses::CAMPAIGN_URN.qualified(),
                surveys::SURVEY_ID.qualified(),
                responses::SURVEY_ID.qualified(),
                prompt_types::SUBQUERY,
                prompt_types::ALIAS,
                prompt_types::COMPOSITE_ID.qualified(),
                prompt_responses::COMPOSITE_ID.qualified()
            ),
        }
    }
}

impl From<Table> for Source {
    fn from(value: Table) -> Self {
        Self::Table(value)
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table(table) => write!(f, "{table}"),
            Self::SurveysWithCampaign => f.write_str("surveys+campaigns"),
            Self::SurveyPromptsWithSurvey => f.write_str("survey_prompts+surveys"),
            Self::ResponsesWithContext => f.write_str("responses+campaigns+surveys"),
            Self::PromptResponsesWithContext => {
                f.write_str("prompt_responses+responses+campaigns+surveys+prompt_types")
            }
        }
    }
}
