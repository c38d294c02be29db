use super::{optional_text, required_i64, required_text};
use crate::definition::{PromptDefinition, SurveyDefinition};
use crate::error::StoreResult;
use crate::query::{ContentValues, RowRef};
use crate::schema::{self, survey_prompts, surveys};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Stored survey row, derived from its campaign's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    pub campaign_urn: String,
    pub survey_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub submit_text: Option<String>,
    pub show_summary: bool,
    pub anytime: bool,
}

impl Survey {
    pub fn from_row(row: &RowRef<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: required_i64(row, surveys::ID.name())?,
            campaign_urn: required_text(row, surveys::CAMPAIGN_URN.name())?,
            survey_id: required_text(row, surveys::SURVEY_ID.name())?,
            title: optional_text(row, surveys::TITLE.name()),
            description: optional_text(row, surveys::DESCRIPTION.name()),
            submit_text: optional_text(row, surveys::SUBMIT_TEXT.name()),
            show_summary: row.get_i64(surveys::SHOW_SUMMARY.name()).unwrap_or(0) != 0,
            anytime: row.get_i64(surveys::ANYTIME.name()).unwrap_or(1) != 0,
        })
    }

    /// Row values for `definition` under `campaign_urn`.
    pub(crate) fn values_for(campaign_urn: &str, definition: &SurveyDefinition) -> ContentValues {
        let mut values = ContentValues::new();
        values
            .put_text(surveys::CAMPAIGN_URN.name(), campaign_urn)
            .put_text(surveys::SURVEY_ID.name(), definition.id.as_str())
            .put(surveys::TITLE.name(), definition.title.clone())
            .put(surveys::DESCRIPTION.name(), definition.description.clone())
            .put(surveys::SUBMIT_TEXT.name(), definition.submit_text.clone())
            .put(surveys::SHOW_SUMMARY.name(), definition.show_summary)
            .put(surveys::ANYTIME.name(), definition.anytime);
        values
    }
}

/// Stored prompt row of a survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyPrompt {
    pub id: i64,
    pub campaign_urn: String,
    pub survey_id: String,
    pub prompt_id: String,
    pub prompt_type: Option<String>,
    pub prompt_text: Option<String>,
}

impl SurveyPrompt {
    pub fn from_row(row: &RowRef<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: required_i64(row, survey_prompts::ID.name())?,
            campaign_urn: required_text(row, survey_prompts::CAMPAIGN_URN.name())?,
            survey_id: required_text(row, survey_prompts::SURVEY_ID.name())?,
            prompt_id: required_text(row, survey_prompts::PROMPT_ID.name())?,
            prompt_type: optional_text(row, survey_prompts::PROMPT_TYPE.name()),
            prompt_text: optional_text(row, survey_prompts::PROMPT_TEXT.name()),
        })
    }

    /// Key shared with `prompt_responses.composite_id`.
    pub fn composite_id(&self) -> String {
        schema::composite_id(&self.campaign_urn, &self.survey_id, &self.prompt_id)
    }

    pub(crate) fn values_for(
        campaign_urn: &str,
        survey_id: &str,
        definition: &PromptDefinition,
    ) -> ContentValues {
        [
            (survey_prompts::CAMPAIGN_URN, Value::from(campaign_urn.to_string())),
            (survey_prompts::SURVEY_ID, Value::from(survey_id.to_string())),
            (survey_prompts::PROMPT_ID, Value::from(definition.id.clone())),
            (survey_prompts::PROMPT_TYPE, Value::from(definition.prompt_type.clone())),
            (survey_prompts::PROMPT_TEXT, Value::from(definition.prompt_text.clone())),
        ]
        .into_iter()
        .map(|(column, value)| (column.name(), value))
        .collect()
    }
}
