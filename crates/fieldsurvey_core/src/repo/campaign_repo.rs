//! Campaign persistence and survey derivation.

use crate::definition::parse_campaign_document;
use crate::error::{StoreError, StoreResult};
use crate::model::survey::{Survey, SurveyPrompt};
use crate::query::builder::insert_row;
use crate::query::ContentValues;
use crate::schema::{campaigns, Table};
use log::debug;
use rusqlite::{params, Connection};

/// Campaign storage operations used by the coordinator.
pub trait CampaignRepository {
    /// Inserts one campaign and derives its surveys when a configuration is
    /// present. Returns the new row id.
    fn insert_campaign(&self, values: &ContentValues) -> StoreResult<i64>;
    /// Replaces every survey and prompt of `urn` with those in `document`.
    /// Returns the number of surveys written.
    fn replace_surveys(&self, urn: &str, document: &str) -> StoreResult<usize>;
    /// Counts campaigns still pointing at `icon`.
    fn icon_reference_count(&self, icon: &str) -> StoreResult<i64>;
}

pub struct SqliteCampaignRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCampaignRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CampaignRepository for SqliteCampaignRepository<'_> {
    fn insert_campaign(&self, values: &ContentValues) -> StoreResult<i64> {
        let urn = values
            .get_text(campaigns::URN.name())
            .filter(|urn| !urn.trim().is_empty())
            .ok_or(StoreError::MissingValue("campaign_urn"))?
            .to_string();

        let row_id = insert_row(self.conn, Table::Campaigns, values)?;
        if let Some(document) = values.get_text(campaigns::CONFIGURATION.name()) {
            self.replace_surveys(&urn, document)?;
        }
        Ok(row_id)
    }

    fn replace_surveys(&self, urn: &str, document: &str) -> StoreResult<usize> {
        let definition = parse_campaign_document(document)?;

        self.conn
            .execute("DELETE FROM surveys WHERE campaign_urn = ?1;", params![urn])?;
        for survey in &definition.surveys {
            insert_row(self.conn, Table::Surveys, &Survey::values_for(urn, survey))?;
            for prompt in &survey.prompts {
                insert_row(
                    self.conn,
                    Table::SurveyPrompts,
                    &SurveyPrompt::values_for(urn, &survey.id, prompt),
                )?;
            }
        }

        debug!(
            "event=surveys_derived module=repo status=ok surveys={}",
            definition.surveys.len()
        );
        Ok(definition.surveys.len())
    }

    fn icon_reference_count(&self, icon: &str) -> StoreResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM campaigns WHERE campaign_icon = ?1;",
            params![icon],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::{CampaignRepository, SqliteCampaignRepository};
    use crate::db::open_db_in_memory;
    use crate::error::StoreError;
    use crate::query::ContentValues;

    const CONFIG: &str = r#"{"surveys": [
        {"id": "s1", "prompts": [{"id": "p1"}, {"id": "p2"}]},
        {"id": "s2"}
    ]}"#;

    fn count(conn: &rusqlite::Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn insert_derives_surveys_from_configuration() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteCampaignRepository::new(&conn);
        let values = ContentValues::new()
            .with_text("campaign_urn", "urn:a")
            .with_text("campaign_configuration_xml", CONFIG);

        repo.insert_campaign(&values).unwrap();
        assert_eq!(count(&conn, "surveys"), 2);
        assert_eq!(count(&conn, "survey_prompts"), 2);
    }

    #[test]
    fn replace_surveys_drops_previous_definition() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteCampaignRepository::new(&conn);
        repo.insert_campaign(
            &ContentValues::new()
                .with_text("campaign_urn", "urn:a")
                .with_text("campaign_configuration_xml", CONFIG),
        )
        .unwrap();

        let written = repo
            .replace_surveys("urn:a", r#"{"surveys": [{"id": "s3"}]}"#)
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(count(&conn, "surveys"), 1);
        assert_eq!(count(&conn, "survey_prompts"), 0);
    }

    #[test]
    fn insert_without_urn_is_rejected() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteCampaignRepository::new(&conn);
        let err = repo
            .insert_campaign(&ContentValues::new().with_text("campaign_name", "x"))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingValue("campaign_urn")));
    }
}
