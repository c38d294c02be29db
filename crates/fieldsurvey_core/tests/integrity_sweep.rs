mod common;

use common::{count, insert_campaign, insert_response, store};
use fieldsurvey_core::schema::Table;
use fieldsurvey_core::{
    verify_state, NewResponse, Response, ResponseStatus, StoreConfig, SurveyStore,
};
use rusqlite::Connection;

fn insert_without_uuid(store: &SurveyStore) {
    let mut response = NewResponse::new("urn:a", "s1")
        .with_payload(r#"[{"prompt_id": "p1", "value": 9}]"#);
    response.uuid = None;
    store.insert("responses", &response.to_values()).unwrap();
}

fn row_count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

#[test]
fn response_without_uuid_is_invisible_and_purged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("survey.db");
    let store = SurveyStore::open(&StoreConfig::at_path(&path)).unwrap();
    insert_campaign(&store, "urn:a", None);
    insert_response(&store, "urn:a", "s1", &[("p1", "1")]);
    insert_without_uuid(&store);

    assert_eq!(count(&store, "responses"), 1);
    assert_eq!(count(&store, "prompts"), 1);

    let raw = Connection::open(&path).unwrap();
    assert_eq!(
        row_count(&raw, "SELECT COUNT(*) FROM responses WHERE response_uuid IS NULL"),
        1
    );
    assert_eq!(row_count(&raw, "SELECT COUNT(*) FROM prompt_responses"), 2);

    let report = verify_state(&store).unwrap();
    assert_eq!(report.purged, 1);
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].table, Table::Responses);

    assert_eq!(
        row_count(&raw, "SELECT COUNT(*) FROM responses WHERE response_uuid IS NULL"),
        0
    );
    assert_eq!(row_count(&raw, "SELECT COUNT(*) FROM responses"), 1);
    assert_eq!(row_count(&raw, "SELECT COUNT(*) FROM prompt_responses"), 1);
    assert_eq!(verify_state(&store).unwrap(), Default::default());
}

#[test]
fn interrupted_uploads_return_to_standby() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    for status in [
        ResponseStatus::Queued,
        ResponseStatus::Uploading,
        ResponseStatus::WaitingForLocation,
        ResponseStatus::Uploaded,
    ] {
        let mut response = NewResponse::new("urn:a", "s1");
        response.status = status;
        store.insert("responses", &response.to_values()).unwrap();
    }

    let report = verify_state(&store).unwrap();
    assert_eq!(report.reset, 3);
    assert_eq!(report.purged, 0);
    assert!(report.violations.is_empty());

    let responses: Vec<Response> = store.query_as("responses", None, &[], Some("_id")).unwrap();
    let statuses: Vec<ResponseStatus> = responses.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [
            ResponseStatus::Standby,
            ResponseStatus::Standby,
            ResponseStatus::Standby,
            ResponseStatus::Uploaded,
        ]
    );
}

#[test]
fn sweep_on_clean_store_changes_nothing() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    insert_response(&store, "urn:a", "s1", &[("p1", "1")]);

    let report = verify_state(&store).unwrap();
    assert_eq!(report, Default::default());
}
