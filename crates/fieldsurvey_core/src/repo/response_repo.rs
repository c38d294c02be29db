//! Response persistence and prompt-response expansion.

use crate::definition::parse_response_payload;
use crate::error::{StoreError, StoreResult};
use crate::query::builder::insert_row;
use crate::query::ContentValues;
use crate::schema::{self, prompt_responses, responses, Table};
use log::debug;
use rusqlite::types::Value;
use rusqlite::Connection;

pub trait ResponseRepository {
    /// Inserts one response and one prompt response per payload answer.
    /// Returns the new response row id.
    fn insert_response(&self, values: &ContentValues) -> StoreResult<i64>;
}

pub struct SqliteResponseRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteResponseRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ResponseRepository for SqliteResponseRepository<'_> {
    fn insert_response(&self, values: &ContentValues) -> StoreResult<i64> {
        let campaign_urn = required(values, responses::CAMPAIGN_URN.name(), "campaign_urn")?;
        let survey_id = required(values, responses::SURVEY_ID.name(), "survey_id")?;

        let response_id = insert_row(self.conn, Table::Responses, values)?;

        let Some(payload) = values.get_text(responses::PAYLOAD.name()) else {
            return Ok(response_id);
        };
        let answers = parse_response_payload(payload)?;
        for answer in &answers {
            let row: ContentValues = [
                (prompt_responses::RESPONSE_ID, Value::Integer(response_id)),
                (
                    prompt_responses::COMPOSITE_ID,
                    Value::Text(schema::composite_id(
                        &campaign_urn,
                        &survey_id,
                        &answer.prompt_id,
                    )),
                ),
                (prompt_responses::PROMPT_ID, Value::Text(answer.prompt_id.clone())),
                (prompt_responses::VALUE, answer.value.clone()),
            ]
            .into_iter()
            .map(|(column, value)| (column.name(), value))
            .collect();
            insert_row(self.conn, Table::PromptResponses, &row)?;
        }

        debug!(
            "event=prompt_responses_expanded module=repo status=ok response_id={} answers={}",
            response_id,
            answers.len()
        );
        Ok(response_id)
    }
}

fn required(values: &ContentValues, key: &str, name: &'static str) -> StoreResult<String> {
    values
        .get_text(key)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .ok_or(StoreError::MissingValue(name))
}
