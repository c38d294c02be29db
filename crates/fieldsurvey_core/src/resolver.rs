//! Route to query-plan resolution.
//!
//! # Responsibility
//! - Build the `SelectionBuilder` for each of the sixteen routes.
//! - Pick wide joins for reads and base tables for mutations.
//! - Parse the aggregate segment of the aggregate route.
//!
//! # Invariants
//! - Reads of a route never return rows outside the hierarchy named by its
//!   path parameters.
//! - Read plans over responses (and their prompt responses) hide rows whose
//!   `response_uuid` is NULL; mutation plans do not, so the integrity sweep
//!   can purge them.
//! - Mutation plans always target exactly one base table.

use crate::error::{StoreError, StoreResult};
use crate::query::SelectionBuilder;
use crate::route::Route;
use crate::schema::{
    campaigns, prompt_responses, prompt_types, responses, survey_prompts, surveys, Source, Table,
};
use rusqlite::types::Value;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Projection name of the aggregate route result column.
pub const AGGREGATE_COLUMN: &str = "aggregate";

/// Whether a plan is used to read rows or to mutate them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Mutation,
}

/// Aggregate functions accepted by the aggregate route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Avg,
    Count,
    Max,
    Min,
    Total,
}

impl Aggregate {
    pub fn sql_function(self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Total => "total",
        }
    }
}

impl FromStr for Aggregate {
    type Err = StoreError;

    /// Case-insensitive; `bogus` and friends fail with `InvalidAggregate`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avg" => Ok(Self::Avg),
            "count" => Ok(Self::Count),
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "total" => Ok(Self::Total),
            _ => Err(StoreError::InvalidAggregate(s.to_string())),
        }
    }
}

impl Display for Aggregate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_function())
    }
}

/// Builds the query plan for `route`.
///
/// # Errors
/// - `InvalidAggregate` for an unrecognized aggregate segment.
/// - `UnsupportedOperation` when mutating the read-only aggregate route.
pub fn resolve(route: &Route, access: Access) -> StoreResult<SelectionBuilder> {
    let builder = SelectionBuilder::new();
    let mutation = access == Access::Mutation;

    let plan = match route {
        Route::Campaigns => builder.table(Table::Campaigns),
        Route::CampaignByUrn { urn } => builder
            .table(Table::Campaigns)
            .where_eq(campaigns::URN, text(urn)),

        Route::Surveys => builder.table(Table::Surveys),
        Route::CampaignSurveys { urn } => builder
            .table(Table::Surveys)
            .where_eq(surveys::CAMPAIGN_URN, text(urn)),
        Route::SurveyById { urn, survey_id } => {
            let builder = if mutation {
                builder.table(Table::Surveys)
            } else {
                builder
                    .table(Source::SurveysWithCampaign)
                    .expose(&[campaigns::NAME, campaigns::STATUS, campaigns::ICON])
                    .expose(surveys::ALL)
            };
            builder
                .where_eq(surveys::CAMPAIGN_URN, text(urn))
                .where_eq(surveys::SURVEY_ID, text(survey_id))
        }

        Route::AllSurveyPrompts => builder.table(Table::SurveyPrompts),
        Route::SurveyPrompts { urn, survey_id } => {
            let builder = if mutation {
                builder.table(Table::SurveyPrompts)
            } else {
                builder
                    .table(Source::SurveyPromptsWithSurvey)
                    .expose(&[surveys::TITLE])
                    .expose(survey_prompts::ALL)
            };
            builder
                .where_eq(survey_prompts::CAMPAIGN_URN, text(urn))
                .where_eq(survey_prompts::SURVEY_ID, text(survey_id))
        }

        Route::Responses => response_plan(builder, mutation),
        Route::ResponseById { id } => {
            response_plan(builder, mutation).where_eq(responses::ID, *id)
        }
        Route::CampaignResponses { urn } => {
            response_plan(builder, mutation).where_eq(responses::CAMPAIGN_URN, text(urn))
        }
        Route::SurveyResponses { urn, survey_id } => response_plan(builder, mutation)
            .where_eq(responses::CAMPAIGN_URN, text(urn))
            .where_eq(responses::SURVEY_ID, text(survey_id)),

        Route::PromptResponses => prompt_response_plan(builder, mutation),
        Route::PromptResponseById { id } => {
            prompt_response_plan(builder, mutation).where_eq(prompt_responses::ID, *id)
        }
        Route::ResponsePrompts { id } => {
            if mutation {
                prompt_response_plan(builder, true).where_eq(prompt_responses::RESPONSE_ID, *id)
            } else {
                prompt_response_plan(builder, false).where_eq(responses::ID, *id)
            }
        }
        Route::PromptValues {
            urn,
            survey_id,
            prompt_id,
        } => {
            let builder = prompt_response_plan(builder, mutation)
                .where_eq(prompt_responses::PROMPT_ID, text(prompt_id));
            scope_prompt_responses(builder, mutation, urn, survey_id)
        }
        Route::PromptAggregate {
            urn,
            survey_id,
            prompt_id,
            aggregate,
        } => {
            let aggregate = aggregate.parse::<Aggregate>()?;
            if mutation {
                return Err(StoreError::UnsupportedOperation {
                    operation: "mutation",
                    target: route.to_string(),
                });
            }
            let builder = builder
                .table(Source::PromptResponsesWithContext)
                .where_sql(uuid_present(), None::<Value>)
                .map(
                    AGGREGATE_COLUMN,
                    format!(
                        "{}({})",
                        aggregate.sql_function(),
                        prompt_responses::VALUE.qualified()
                    ),
                )
                .expose_mapped(AGGREGATE_COLUMN)
                .where_eq(prompt_responses::PROMPT_ID, text(prompt_id));
            scope_prompt_responses(builder, false, urn, survey_id)
        }
    };
    Ok(plan)
}

fn response_plan(builder: SelectionBuilder, mutation: bool) -> SelectionBuilder {
    if mutation {
        return builder.table(Table::Responses);
    }
    builder
        .table(Source::ResponsesWithContext)
        .expose(&[campaigns::NAME, surveys::TITLE])
        .expose(responses::ALL)
        .where_sql(uuid_present(), None::<Value>)
}

fn prompt_response_plan(builder: SelectionBuilder, mutation: bool) -> SelectionBuilder {
    if mutation {
        return builder.table(Table::PromptResponses);
    }
    builder
        .table(Source::PromptResponsesWithContext)
        .expose(&[
            campaigns::NAME,
            responses::CAMPAIGN_URN,
            responses::SURVEY_ID,
            responses::UUID,
            responses::TIME,
            prompt_types::PROMPT_TYPE,
            prompt_types::PROMPT_TEXT,
        ])
        .expose(prompt_responses::ALL)
        .where_sql(uuid_present(), None::<Value>)
}

fn scope_prompt_responses(
    builder: SelectionBuilder,
    mutation: bool,
    urn: &str,
    survey_id: &str,
) -> SelectionBuilder {
    if mutation {
        return builder.where_sql(
            format!(
                "{} IN (SELECT _id FROM responses WHERE campaign_urn = ? AND survey_id = ?)",
                prompt_responses::RESPONSE_ID.qualified()
            ),
            [text(urn), text(survey_id)],
        );
    }
    builder
        .where_eq(responses::CAMPAIGN_URN, text(urn))
        .where_eq(responses::SURVEY_ID, text(survey_id))
}

fn uuid_present() -> String {
    format!("{} IS NOT NULL", responses::UUID.qualified())
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::{resolve, Access, Aggregate};
    use crate::error::StoreError;
    use crate::route::Route;
    use crate::schema::{Source, Table};

    #[test]
    fn aggregate_names_are_case_insensitive() {
        assert_eq!("AVG".parse::<Aggregate>().unwrap(), Aggregate::Avg);
        assert_eq!("total".parse::<Aggregate>().unwrap(), Aggregate::Total);
        assert!(matches!(
            "bogus".parse::<Aggregate>(),
            Err(StoreError::InvalidAggregate(name)) if name == "bogus"
        ));
    }

    #[test]
    fn reads_join_and_mutations_target_base_table() {
        let route = Route::parse("campaigns/urn:a/responses").unwrap();
        let read = resolve(&route, Access::Read).unwrap();
        let write = resolve(&route, Access::Mutation).unwrap();
        assert_eq!(read.source(), Some(Source::ResponsesWithContext));
        assert_eq!(write.source(), Some(Source::Table(Table::Responses)));
    }

    #[test]
    fn read_plans_hide_responses_without_uuid() {
        let route = Route::parse("responses").unwrap();
        let read = resolve(&route, Access::Read).unwrap();
        let write = resolve(&route, Access::Mutation).unwrap();
        assert!(read
            .selection()
            .unwrap()
            .contains("responses.response_uuid IS NOT NULL"));
        assert_eq!(write.selection(), None);
    }

    #[test]
    fn aggregate_route_projects_aggregate_column() {
        let route =
            Route::parse("campaigns/urn:a/surveys/s1/responses/prompts/p1/count").unwrap();
        let sql = resolve(&route, Access::Read)
            .unwrap()
            .select_sql(None, None)
            .unwrap();
        assert!(sql.starts_with("SELECT count(prompt_responses.prompt_value) AS aggregate FROM"));
    }

    #[test]
    fn aggregate_route_is_read_only() {
        let route = Route::parse("campaigns/urn:a/surveys/s1/responses/prompts/p1/avg").unwrap();
        assert!(matches!(
            resolve(&route, Access::Mutation),
            Err(StoreError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn invalid_aggregate_is_reported_before_access_checks() {
        let route =
            Route::parse("campaigns/urn:a/surveys/s1/responses/prompts/p1/bogus").unwrap();
        assert!(matches!(
            resolve(&route, Access::Read),
            Err(StoreError::InvalidAggregate(_))
        ));
    }
}
