mod common;

use common::{insert_campaign, insert_response, recorder, store};
use fieldsurvey_core::{ChangeNotifier, ChangeObserver, ContentValues, NewResponse, SurveyStore};
use std::sync::{Arc, Mutex};

#[test]
fn response_insert_notifies_response_and_prompt_observers_once() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    let (responses_seen, responses_observer) = recorder();
    let (prompts_seen, prompts_observer) = recorder();
    store.subscribe("responses", &responses_observer).unwrap();
    store.subscribe("prompts", &prompts_observer).unwrap();

    insert_response(&store, "urn:a", "s1", &[("p1", "1")]);

    assert_eq!(*responses_seen.lock().unwrap(), ["responses"]);
    assert_eq!(*prompts_seen.lock().unwrap(), ["prompts"]);
}

#[test]
fn response_update_notifies_collections_and_item_uri() {
    let store = store();
    insert_campaign(&store, "urn:a", None);
    let id = insert_response(&store, "urn:a", "s1", &[("p1", "1")]);
    let item_uri = format!("responses/{id}");

    let (responses_seen, responses_observer) = recorder();
    let (prompts_seen, prompts_observer) = recorder();
    let (item_seen, item_observer) = recorder();
    store.subscribe("responses", &responses_observer).unwrap();
    store.subscribe("prompts", &prompts_observer).unwrap();
    store.subscribe(&format!("/{item_uri}/"), &item_observer).unwrap();

    let count = store
        .update(
            &item_uri,
            &ContentValues::new().with_text("response_status", "queued"),
            None,
            &[],
        )
        .unwrap();
    assert_eq!(count, 1);

    assert_eq!(responses_seen.lock().unwrap().len(), 1);
    assert_eq!(prompts_seen.lock().unwrap().len(), 1);
    assert_eq!(*item_seen.lock().unwrap(), [item_uri]);
}

#[test]
fn campaign_delete_notifies_every_collection() {
    let store = store();
    insert_campaign(&store, "urn:a", None);

    let mut seen = Vec::new();
    let mut observers = Vec::new();
    for uri in ["campaigns", "surveys", "surveys/prompts", "responses", "prompts"] {
        let (log, observer) = recorder();
        store.subscribe(uri, &observer).unwrap();
        seen.push(log);
        observers.push(observer);
    }

    store.delete("campaigns/urn:a", None, &[]).unwrap();
    for log in &seen {
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}

#[test]
fn mutation_matching_nothing_is_silent() {
    let store = store();
    let (seen, observer) = recorder();
    store.subscribe("campaigns", &observer).unwrap();

    assert_eq!(store.delete("campaigns/urn:none", None, &[]).unwrap(), 0);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn failed_insert_is_silent() {
    let store = store();
    let (seen, observer) = recorder();
    store.subscribe("responses", &observer).unwrap();

    let values = NewResponse::new("urn:missing", "s1").to_values();
    assert!(store.insert("responses", &values).is_err());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn observer_sees_committed_state() {
    let store = Arc::new(store());
    insert_campaign(&store, "urn:a", None);

    let counts = Arc::new(Mutex::new(Vec::new()));
    let reader = Arc::clone(&store);
    let sink = Arc::clone(&counts);
    let observer: Arc<dyn ChangeObserver> = Arc::new(move |_: &str| {
        let rows = reader.query("responses", None, None, &[], None).unwrap();
        sink.lock().unwrap().push(rows.len());
    });
    store.subscribe("responses", &observer).unwrap();

    insert_response(&store, "urn:a", "s1", &[("p1", "1")]);
    assert_eq!(*counts.lock().unwrap(), [1]);
}

#[test]
fn stores_sharing_a_notifier_see_each_other() {
    let notifier = Arc::new(ChangeNotifier::new());
    let first = SurveyStore::open_in_memory()
        .unwrap()
        .with_notifier(Arc::clone(&notifier));
    let second = SurveyStore::open_in_memory()
        .unwrap()
        .with_notifier(Arc::clone(&notifier));

    let (seen, observer) = recorder();
    second.subscribe("campaigns", &observer).unwrap();
    insert_campaign(&first, "urn:a", None);

    assert!(seen.lock().unwrap().contains(&"campaigns".to_string()));
}
