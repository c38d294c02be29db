mod common;

use common::{count, insert_campaign, insert_response, store};
use fieldsurvey_core::{
    Cardinality, ContentValues, EntityKind, Response, StoreError, Survey, SurveyPrompt,
};
use rusqlite::types::Value;

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[test]
fn campaign_routes_never_leak_other_campaigns() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    insert_campaign(&store, "urn:b", None);

    assert_eq!(count(&store, "campaigns"), 2);
    assert_eq!(count(&store, "campaigns/urn:a"), 1);
    assert_eq!(count(&store, "surveys"), 4);

    let surveys: Vec<Survey> = store
        .query_as("campaigns/urn:a/surveys", None, &[], Some("survey_id"))
        .unwrap();
    assert_eq!(surveys.len(), 2);
    assert!(surveys.iter().all(|survey| survey.campaign_urn == "urn:a"));

    let prompts: Vec<SurveyPrompt> = store
        .query_as("campaigns/urn:b/surveys/s2/prompts", None, &[], Some("prompt_id"))
        .unwrap();
    let ids: Vec<&str> = prompts.iter().map(|p| p.prompt_id.as_str()).collect();
    assert_eq!(ids, ["q1", "q2", "q3"]);
    assert!(prompts.iter().all(|p| p.campaign_urn == "urn:b"));
}

#[test]
fn caller_filter_cannot_widen_route_scope() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    insert_campaign(&store, "urn:b", None);

    let rows = store
        .query(
            "campaigns/urn:a/surveys",
            None,
            Some("1 = 1 OR campaign_urn = ?"),
            &[text("urn:b")],
            None,
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn joined_reads_take_ids_from_the_addressed_table() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    let response_id = insert_response(&store, "urn:a", "s1", &[("p1", "5")]);

    let responses: Vec<Response> = store
        .query_as(&format!("responses/{response_id}"), None, &[], None)
        .unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].id, response_id);

    let rows = store
        .query(&format!("responses/{response_id}/prompts"), None, None, &[], None)
        .unwrap();
    let row = rows.row(0).unwrap();
    assert_eq!(row.get_i64("response_id"), Some(response_id));
    assert_eq!(row.get_text("prompt_type"), Some("number"));
    assert_eq!(row.get_i64("prompt_value"), Some(5));

    let survey = store
        .query("campaigns/urn:a/surveys/s1", None, None, &[], None)
        .unwrap();
    assert_eq!(survey.len(), 1);
    assert_eq!(survey.row(0).unwrap().get_text("survey_title"), Some("Morning"));
    assert_eq!(
        survey.row(0).unwrap().get_text("campaign_status"),
        Some("remote")
    );
}

#[test]
fn prompt_value_route_is_scoped_to_campaign_and_survey() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    insert_campaign(&store, "urn:b", None);
    insert_response(&store, "urn:a", "s1", &[("p1", "1"), ("p2", "2")]);
    insert_response(&store, "urn:b", "s1", &[("p1", "3")]);

    let rows = store
        .query(
            "campaigns/urn:a/surveys/s1/responses/prompts/p1",
            Some(&["prompt_id", "prompt_value", "campaign_urn"]),
            None,
            &[],
            None,
        )
        .unwrap();
    assert_eq!(rows.len(), 1);
    let row = rows.row(0).unwrap();
    assert_eq!(row.get_text("campaign_urn"), Some("urn:a"));
    assert_eq!(row.get_i64("prompt_value"), Some(1));

    assert_eq!(count(&store, "prompts"), 3);
    assert_eq!(count(&store, "campaigns/urn:b/responses"), 1);
    assert_eq!(count(&store, "campaigns/urn:a/surveys/s1/responses"), 1);
    assert_eq!(count(&store, "campaigns/urn:a/surveys/s2/responses"), 0);
}

#[test]
fn mutations_on_joined_routes_touch_only_the_scoped_rows() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    insert_campaign(&store, "urn:b", None);
    insert_response(&store, "urn:a", "s1", &[("p1", "1")]);
    insert_response(&store, "urn:b", "s1", &[("p1", "2")]);

    let updated = store
        .update(
            "campaigns/urn:a/responses",
            &ContentValues::new().with_text("response_status", "uploaded"),
            None,
            &[],
        )
        .unwrap();
    assert_eq!(updated, 1);

    let deleted = store
        .delete("campaigns/urn:b/surveys/s1/responses/prompts/p1", None, &[])
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(count(&store, "prompts"), 1);
    assert_eq!(count(&store, "responses"), 2);
}

#[test]
fn aggregate_route_rejects_mutation() {
    let store = store();
    let err = store
        .delete("campaigns/urn:a/surveys/s1/responses/prompts/p1/avg", None, &[])
        .unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedOperation { .. }));
}

#[test]
fn resource_types_follow_route_shape() {
    let store = store();
    let item = store.resource_type("campaigns/urn:a").unwrap();
    assert_eq!(item.entity, EntityKind::Campaign);
    assert_eq!(item.cardinality, Cardinality::Item);

    let prompts = store.resource_type("responses/4/prompts").unwrap();
    assert_eq!(prompts.entity, EntityKind::PromptResponse);
    assert_eq!(prompts.cardinality, Cardinality::Collection);

    assert!(matches!(
        store.resource_type("responses/abc"),
        Err(StoreError::UnsupportedRoute(_))
    ));
}

#[test]
fn projection_and_sort_must_be_plain_columns() {
    let store = store();
    assert!(matches!(
        store.query("campaigns", Some(&["campaign_urn; DROP TABLE campaigns"]), None, &[], None),
        Err(StoreError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        store.query("campaigns", None, None, &[], Some("random()")),
        Err(StoreError::InvalidIdentifier(_))
    ));
}

#[test]
fn qualified_filter_on_shared_column_works_for_reads_and_writes() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    insert_response(&store, "urn:a", "s1", &[("p1", "1")]);
    insert_response(&store, "urn:a", "s2", &[("q1", "2")]);

    let filter = Some("responses.survey_id = ?");
    let rows = store
        .query("responses", None, filter, &[text("s2")], None)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.row(0).unwrap().get_text("survey_id"), Some("s2"));

    assert_eq!(store.delete("responses", filter, &[text("s2")]).unwrap(), 1);
    assert_eq!(count(&store, "responses"), 1);
}
