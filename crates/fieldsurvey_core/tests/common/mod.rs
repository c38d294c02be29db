#![allow(dead_code)]

use fieldsurvey_core::{ChangeObserver, ContentValues, NewCampaign, NewResponse, SurveyStore};
use std::sync::{Arc, Mutex};

/// Two surveys with three prompts each.
pub const TWO_SURVEY_CONFIG: &str = r#"
<campaign>
  <campaignUrn>urn:example:1</campaignUrn>
  <surveys>
    <survey>
      <id>s1</id><title>Morning</title>
      <contentList>
        <prompt><id>p1</id><promptType>number</promptType></prompt>
        <prompt><id>p2</id><promptType>number</promptType></prompt>
        <prompt><id>p3</id><promptType>text</promptType></prompt>
      </contentList>
    </survey>
    <survey>
      <id>s2</id><title>Evening</title>
      <contentList>
        <prompt><id>q1</id><promptType>number</promptType></prompt>
        <prompt><id>q2</id><promptType>number</promptType></prompt>
        <prompt><id>q3</id><promptType>text</promptType></prompt>
      </contentList>
    </survey>
  </surveys>
</campaign>"#;

pub fn store() -> SurveyStore {
    SurveyStore::open_in_memory().unwrap()
}

pub fn insert_campaign(store: &SurveyStore, urn: &str, icon: Option<&str>) {
    let mut campaign = NewCampaign::new(urn);
    campaign.configuration = Some(TWO_SURVEY_CONFIG.to_string());
    campaign.icon = icon.map(str::to_string);
    store.insert("campaigns", &campaign.to_values()).unwrap();
}

/// Inserts a response to `survey_id` answering `answers` and returns its id.
pub fn insert_response(
    store: &SurveyStore,
    urn: &str,
    survey_id: &str,
    answers: &[(&str, &str)],
) -> i64 {
    let payload = answers
        .iter()
        .map(|(prompt_id, value)| format!(r#"{{"prompt_id": "{prompt_id}", "value": {value}}}"#))
        .collect::<Vec<_>>()
        .join(", ");
    let values = NewResponse::new(urn, survey_id)
        .with_payload(format!("[{payload}]"))
        .to_values();
    let uri = store.insert("responses", &values).unwrap();
    uri.trim_start_matches("responses/").parse().unwrap()
}

pub fn count(store: &SurveyStore, uri: &str) -> usize {
    store.query(uri, None, None, &[], None).unwrap().len()
}

pub fn values() -> ContentValues {
    ContentValues::new()
}

/// Observer recording every URI it is told about.
pub fn recorder() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ChangeObserver>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer: Arc<dyn ChangeObserver> = Arc::new(move |uri: &str| {
        sink.lock().unwrap().push(uri.to_string());
    });
    (seen, observer)
}
