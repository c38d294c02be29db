use super::{optional_text, required_i64, required_text};
use crate::error::{StoreError, StoreResult};
use crate::query::{ContentValues, RowRef};
use crate::schema::{prompt_responses, responses};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Upload lifecycle of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Standby,
    Queued,
    Uploading,
    WaitingForLocation,
    Uploaded,
}

impl ResponseStatus {
    /// States that only make sense while an upload is running. A response
    /// found in one of them at startup was interrupted.
    pub const IN_FLIGHT: [ResponseStatus; 3] = [
        ResponseStatus::Queued,
        ResponseStatus::Uploading,
        ResponseStatus::WaitingForLocation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::Queued => "queued",
            Self::Uploading => "uploading",
            Self::WaitingForLocation => "waiting_for_location",
            Self::Uploaded => "uploaded",
        }
    }
}

impl Display for ResponseStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standby" => Ok(Self::Standby),
            "queued" => Ok(Self::Queued),
            "uploading" => Ok(Self::Uploading),
            "waiting_for_location" => Ok(Self::WaitingForLocation),
            "uploaded" => Ok(Self::Uploaded),
            other => Err(StoreError::InvalidData(format!(
                "unknown response status `{other}`"
            ))),
        }
    }
}

/// Stored response row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub campaign_urn: String,
    pub survey_id: String,
    pub uuid: Option<Uuid>,
    pub time: Option<i64>,
    pub timezone: Option<String>,
    pub location_status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payload: Option<String>,
    pub status: ResponseStatus,
}

impl Response {
    pub fn from_row(row: &RowRef<'_>) -> StoreResult<Self> {
        let uuid = row
            .get_text(responses::UUID.name())
            .map(|text| {
                Uuid::parse_str(text)
                    .map_err(|err| StoreError::InvalidData(format!("response uuid: {err}")))
            })
            .transpose()?;
        Ok(Self {
            id: required_i64(row, responses::ID.name())?,
            campaign_urn: required_text(row, responses::CAMPAIGN_URN.name())?,
            survey_id: required_text(row, responses::SURVEY_ID.name())?,
            uuid,
            time: row.get_i64(responses::TIME.name()),
            timezone: optional_text(row, responses::TIMEZONE.name()),
            location_status: optional_text(row, responses::LOCATION_STATUS.name()),
            latitude: row.get_f64(responses::LATITUDE.name()),
            longitude: row.get_f64(responses::LONGITUDE.name()),
            payload: optional_text(row, responses::PAYLOAD.name()),
            status: required_text(row, responses::STATUS.name())?.parse()?,
        })
    }
}

/// Response payload for `SurveyStore::insert("responses", ..)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResponse {
    pub campaign_urn: String,
    pub survey_id: String,
    pub uuid: Option<Uuid>,
    pub time: Option<i64>,
    pub timezone: Option<String>,
    pub location_status: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// JSON array of `{ "prompt_id", "value" }`; expanded into prompt responses.
    pub payload: Option<String>,
    pub status: ResponseStatus,
}

impl NewResponse {
    /// A standby response with a freshly generated uuid.
    pub fn new(campaign_urn: impl Into<String>, survey_id: impl Into<String>) -> Self {
        Self {
            campaign_urn: campaign_urn.into(),
            survey_id: survey_id.into(),
            uuid: Some(Uuid::new_v4()),
            time: None,
            timezone: None,
            location_status: None,
            latitude: None,
            longitude: None,
            payload: None,
            status: ResponseStatus::Standby,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn to_values(&self) -> ContentValues {
        let mut values = ContentValues::new();
        values
            .put_text(responses::CAMPAIGN_URN.name(), self.campaign_urn.as_str())
            .put_text(responses::SURVEY_ID.name(), self.survey_id.as_str())
            .put(
                responses::UUID.name(),
                self.uuid.map(|uuid| uuid.hyphenated().to_string()),
            )
            .put(responses::TIME.name(), self.time)
            .put(responses::TIMEZONE.name(), self.timezone.clone())
            .put(responses::LOCATION_STATUS.name(), self.location_status.clone())
            .put(responses::LATITUDE.name(), self.latitude)
            .put(responses::LONGITUDE.name(), self.longitude)
            .put(responses::PAYLOAD.name(), self.payload.clone())
            .put_text(responses::STATUS.name(), self.status.as_str());
        values
    }
}

/// One stored prompt answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub id: i64,
    pub response_id: i64,
    pub composite_id: String,
    pub prompt_id: String,
    /// Numeric answers keep their type; anything else is text.
    #[serde(skip)]
    pub value: Option<Value>,
}

impl PromptResponse {
    pub fn from_row(row: &RowRef<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: required_i64(row, prompt_responses::ID.name())?,
            response_id: required_i64(row, prompt_responses::RESPONSE_ID.name())?,
            composite_id: required_text(row, prompt_responses::COMPOSITE_ID.name())?,
            prompt_id: required_text(row, prompt_responses::PROMPT_ID.name())?,
            value: row
                .get(prompt_responses::VALUE.name())
                .filter(|value| **value != Value::Null)
                .cloned(),
        })
    }
}
