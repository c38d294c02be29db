use super::{optional_text, required_i64, required_text};
use crate::error::{StoreError, StoreResult};
use crate::query::{ContentValues, RowRef};
use crate::schema::campaigns;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Download state of a campaign on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// Known from the server listing, configuration not fetched.
    Remote,
    Downloading,
    /// Configuration stored and surveys derived.
    Ready,
}

impl CampaignStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Downloading => "downloading",
            Self::Ready => "ready",
        }
    }
}

impl Display for CampaignStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(Self::Remote),
            "downloading" => Ok(Self::Downloading),
            "ready" => Ok(Self::Ready),
            other => Err(StoreError::InvalidData(format!(
                "unknown campaign status `{other}`"
            ))),
        }
    }
}

/// Stored campaign row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub urn: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created: Option<String>,
    pub downloaded: Option<String>,
    pub configuration: Option<String>,
    pub status: CampaignStatus,
    pub icon: Option<String>,
    pub privacy: Option<String>,
}

impl Campaign {
    /// Decodes a row read through a campaign route.
    pub fn from_row(row: &RowRef<'_>) -> StoreResult<Self> {
        Ok(Self {
            id: required_i64(row, campaigns::ID.name())?,
            urn: required_text(row, campaigns::URN.name())?,
            name: optional_text(row, campaigns::NAME.name()),
            description: optional_text(row, campaigns::DESCRIPTION.name()),
            created: optional_text(row, campaigns::CREATED.name()),
            downloaded: optional_text(row, campaigns::DOWNLOADED.name()),
            configuration: optional_text(row, campaigns::CONFIGURATION.name()),
            status: required_text(row, campaigns::STATUS.name())?.parse()?,
            icon: optional_text(row, campaigns::ICON.name()),
            privacy: optional_text(row, campaigns::PRIVACY.name()),
        })
    }
}

/// Campaign payload for `SurveyStore::insert("campaigns", ..)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCampaign {
    pub urn: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created: Option<String>,
    pub downloaded: Option<String>,
    /// XML or JSON configuration; surveys are derived from it on insert.
    pub configuration: Option<String>,
    pub status: Option<CampaignStatus>,
    pub icon: Option<String>,
    pub privacy: Option<String>,
}

impl NewCampaign {
    pub fn new(urn: impl Into<String>) -> Self {
        Self {
            urn: urn.into(),
            ..Self::default()
        }
    }

    pub fn to_values(&self) -> ContentValues {
        let mut values = ContentValues::new();
        values.put_text(campaigns::URN.name(), self.urn.as_str());
        let optional = [
            (campaigns::NAME, &self.name),
            (campaigns::DESCRIPTION, &self.description),
            (campaigns::CREATED, &self.created),
            (campaigns::DOWNLOADED, &self.downloaded),
            (campaigns::CONFIGURATION, &self.configuration),
            (campaigns::ICON, &self.icon),
            (campaigns::PRIVACY, &self.privacy),
        ];
        for (column, value) in optional {
            if let Some(value) = value {
                values.put_text(column.name(), value.as_str());
            }
        }
        if let Some(status) = self.status {
            values.put_text(campaigns::STATUS.name(), status.as_str());
        }
        values
    }
}
