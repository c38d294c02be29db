mod common;

use common::{insert_campaign, insert_response, store};
use fieldsurvey_core::StoreError;

const AVG_ROUTE: &str = "campaigns/urn:example:1/surveys/s1/responses/prompts/p1";

fn seeded() -> fieldsurvey_core::SurveyStore {
    let store = store();
    insert_campaign(&store, "urn:example:1", None);
    for value in ["2", "4", "6"] {
        insert_response(&store, "urn:example:1", "s1", &[("p1", value), ("p2", "100")]);
    }
    insert_response(&store, "urn:example:1", "s2", &[("q1", "50")]);
    store
}

fn aggregate(store: &fieldsurvey_core::SurveyStore, name: &str) -> rusqlite::types::Value {
    let rows = store
        .query(&format!("{AVG_ROUTE}/{name}"), None, None, &[], None)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.columns(), ["aggregate"]);
    rows.row(0).unwrap().get("aggregate").unwrap().clone()
}

#[test]
fn avg_over_prompt_values() {
    let store = seeded();
    let rows = store
        .query(&format!("{AVG_ROUTE}/avg"), None, None, &[], None)
        .unwrap();
    assert_eq!(rows.row(0).unwrap().get_f64("aggregate"), Some(4.0));
}

#[test]
fn every_aggregate_function_is_supported() {
    use rusqlite::types::Value;

    let store = seeded();
    assert_eq!(aggregate(&store, "count"), Value::Integer(3));
    assert_eq!(aggregate(&store, "max"), Value::Integer(6));
    assert_eq!(aggregate(&store, "min"), Value::Integer(2));
    assert_eq!(aggregate(&store, "total"), Value::Real(12.0));
    assert_eq!(aggregate(&store, "AVG"), Value::Real(4.0));
}

#[test]
fn unknown_aggregate_is_rejected() {
    let store = seeded();
    let err = store
        .query(&format!("{AVG_ROUTE}/bogus"), None, None, &[], None)
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidAggregate(name) if name == "bogus"));
}

#[test]
fn aggregate_over_no_rows() {
    let store = seeded();
    let rows = store
        .query(
            "campaigns/urn:example:1/surveys/s2/responses/prompts/p1/count",
            None,
            None,
            &[],
            None,
        )
        .unwrap();
    assert_eq!(rows.row(0).unwrap().get_i64("aggregate"), Some(0));
}
