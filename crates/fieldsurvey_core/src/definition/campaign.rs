//! Campaign configuration documents.
//!
//! The server ships campaigns as XML:
//!
//! ```text
//! <campaign>
//!   <campaignUrn>..</campaignUrn><campaignName>..</campaignName>
//!   <surveys>
//!     <survey>
//!       <id/><title/><description/><submitText/><showSummary/><anytime/>
//!       <contentList><prompt><id/><promptType/><promptText/></prompt></contentList>
//!     </survey>
//!   </surveys>
//! </campaign>
//! ```
//!
//! The JSON form mirrors it with `prompts` in place of `contentList`.
//! Messages, repeatable sets and prompt properties are ignored.

use super::DefinitionError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignDefinition {
    pub urn: Option<String>,
    pub name: Option<String>,
    pub surveys: Vec<SurveyDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDefinition {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub submit_text: Option<String>,
    #[serde(default)]
    pub show_summary: bool,
    #[serde(default = "default_anytime")]
    pub anytime: bool,
    #[serde(default)]
    pub prompts: Vec<PromptDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDefinition {
    pub id: String,
    #[serde(default)]
    pub prompt_type: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
}

fn default_anytime() -> bool {
    true
}

/// Parses a campaign document, picking XML or JSON from its first
/// non-whitespace character.
///
/// # Errors
/// - `Empty` for a blank document.
/// - `Xml` / `Json` for malformed input.
/// - `MissingField` when the XML has no `campaign` root, or a survey or
///   prompt has no `id`.
pub fn parse_campaign_document(document: &str) -> Result<CampaignDefinition, DefinitionError> {
    let trimmed = document.trim_start();
    match trimmed.chars().next() {
        None => Err(DefinitionError::Empty),
        Some('<') => parse_xml(trimmed),
        Some(_) => {
            let definition: CampaignDefinition = serde_json::from_str(trimmed)?;
            for survey in &definition.surveys {
                require_id(&survey.id, "survey")?;
                for prompt in &survey.prompts {
                    require_id(&prompt.id, "prompt")?;
                }
            }
            Ok(definition)
        }
    }
}

fn require_id(id: &str, element: &'static str) -> Result<(), DefinitionError> {
    if id.trim().is_empty() {
        return Err(DefinitionError::MissingField { element, field: "id" });
    }
    Ok(())
}

#[derive(Default)]
struct SurveyDraft {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    submit_text: Option<String>,
    show_summary: Option<bool>,
    anytime: Option<bool>,
    prompts: Vec<PromptDefinition>,
}

impl SurveyDraft {
    fn finish(self) -> Result<SurveyDefinition, DefinitionError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(DefinitionError::MissingField {
                element: "survey",
                field: "id",
            })?;
        Ok(SurveyDefinition {
            id,
            title: self.title,
            description: self.description,
            submit_text: self.submit_text,
            show_summary: self.show_summary.unwrap_or(false),
            anytime: self.anytime.unwrap_or(true),
            prompts: self.prompts,
        })
    }
}

#[derive(Default)]
struct PromptDraft {
    id: Option<String>,
    prompt_type: Option<String>,
    prompt_text: Option<String>,
}

impl PromptDraft {
    fn finish(self) -> Result<PromptDefinition, DefinitionError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or(DefinitionError::MissingField {
                element: "prompt",
                field: "id",
            })?;
        Ok(PromptDefinition {
            id,
            prompt_type: self.prompt_type,
            prompt_text: self.prompt_text,
        })
    }
}

fn parse_xml(document: &str) -> Result<CampaignDefinition, DefinitionError> {
    let mut reader = Reader::from_str(document);
    reader.config_mut().trim_text(true);

    let mut definition = CampaignDefinition::default();
    let mut seen_root = false;
    let mut stack: Vec<String> = Vec::new();
    let mut survey: Option<SurveyDraft> = None;
    let mut prompt: Option<PromptDraft> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "campaign" if stack.is_empty() => seen_root = true,
                    "survey" if parent_is(&stack, "surveys") => {
                        survey = Some(SurveyDraft::default())
                    }
                    "prompt" if survey.is_some() => prompt = Some(PromptDraft::default()),
                    _ => {}
                }
                stack.push(name);
            }
            Event::Text(ref e) => {
                let text = e.unescape()?.to_string();
                assign_text(&stack, text, &mut definition, &mut survey, &mut prompt);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                assign_text(&stack, text, &mut definition, &mut survey, &mut prompt);
            }
            Event::End(ref e) => {
                match e.local_name().as_ref() {
                    b"prompt" => {
                        if let (Some(draft), Some(current)) = (prompt.take(), survey.as_mut()) {
                            current.prompts.push(draft.finish()?);
                        }
                    }
                    b"survey" => {
                        if let Some(draft) = survey.take() {
                            definition.surveys.push(draft.finish()?);
                        }
                    }
                    _ => {}
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(DefinitionError::MissingField {
            element: "document",
            field: "campaign",
        });
    }
    Ok(definition)
}

fn parent_is(stack: &[String], name: &str) -> bool {
    stack.last().map(String::as_str) == Some(name)
}

fn assign_text(
    stack: &[String],
    text: String,
    definition: &mut CampaignDefinition,
    survey: &mut Option<SurveyDraft>,
    prompt: &mut Option<PromptDraft>,
) {
    let [.., parent, field] = stack else {
        return;
    };

    match (parent.as_str(), prompt.as_mut(), survey.as_mut()) {
        ("prompt", Some(prompt), _) => match field.as_str() {
            "id" => prompt.id = Some(text),
            "promptType" => prompt.prompt_type = Some(text),
            "promptText" => prompt.prompt_text = Some(text),
            _ => {}
        },
        ("survey", None, Some(survey)) => match field.as_str() {
            "id" => survey.id = Some(text),
            "title" => survey.title = Some(text),
            "description" => survey.description = Some(text),
            "submitText" => survey.submit_text = Some(text),
            "showSummary" => survey.show_summary = Some(parse_flag(&text)),
            "anytime" => survey.anytime = Some(parse_flag(&text)),
            _ => {}
        },
        ("campaign", None, None) => match field.as_str() {
            "campaignUrn" => definition.urn = Some(text),
            "campaignName" => definition.name = Some(text),
            _ => {}
        },
        _ => {}
    }
}

fn parse_flag(text: &str) -> bool {
    matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::parse_campaign_document;
    use crate::definition::DefinitionError;

    const XML: &str = r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <campaign>
          <campaignUrn>urn:campaign:mood</campaignUrn>
          <campaignName>Mood</campaignName>
          <surveys>
            <survey>
              <id>daily</id>
              <title>Daily &amp; weekly</title>
              <showSummary>true</showSummary>
              <anytime>false</anytime>
              <contentList>
                <message><id>intro</id><messageText>Hi</messageText></message>
                <prompt>
                  <id>sleep</id>
                  <promptType>number</promptType>
                  <promptText><![CDATA[Hours <slept>?]]></promptText>
                  <properties><property><key>min</key><label>0</label></property></properties>
                </prompt>
                <prompt><id>mood</id><promptType>single_choice</promptType></prompt>
              </contentList>
            </survey>
            <survey><id>weekly</id></survey>
          </surveys>
        </campaign>"#;

    #[test]
    fn xml_document_yields_surveys_and_prompts() {
        let campaign = parse_campaign_document(XML).unwrap();
        assert_eq!(campaign.urn.as_deref(), Some("urn:campaign:mood"));
        assert_eq!(campaign.name.as_deref(), Some("Mood"));
        assert_eq!(campaign.surveys.len(), 2);

        let daily = &campaign.surveys[0];
        assert_eq!(daily.id, "daily");
        assert_eq!(daily.title.as_deref(), Some("Daily & weekly"));
        assert!(daily.show_summary);
        assert!(!daily.anytime);
        let prompt_ids: Vec<&str> = daily.prompts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(prompt_ids, ["sleep", "mood"]);
        assert_eq!(daily.prompts[0].prompt_text.as_deref(), Some("Hours <slept>?"));

        let weekly = &campaign.surveys[1];
        assert!(weekly.anytime);
        assert!(weekly.prompts.is_empty());
    }

    #[test]
    fn json_document_uses_same_shape() {
        let json = r#"{
            "urn": "urn:campaign:mood",
            "surveys": [
                {"id": "daily", "submitText": "Done", "prompts": [
                    {"id": "sleep", "promptType": "number"}
                ]}
            ]
        }"#;
        let campaign = parse_campaign_document(json).unwrap();
        assert_eq!(campaign.surveys[0].submit_text.as_deref(), Some("Done"));
        assert!(campaign.surveys[0].anytime);
        assert_eq!(campaign.surveys[0].prompts[0].prompt_type.as_deref(), Some("number"));
    }

    #[test]
    fn survey_without_id_is_rejected() {
        let xml = "<campaign><surveys><survey><title>x</title></survey></surveys></campaign>";
        assert!(matches!(
            parse_campaign_document(xml),
            Err(DefinitionError::MissingField {
                element: "survey",
                field: "id"
            })
        ));
    }

    #[test]
    fn blank_and_malformed_documents_fail() {
        assert!(matches!(parse_campaign_document("  \n"), Err(DefinitionError::Empty)));
        assert!(matches!(
            parse_campaign_document("<campaign><surveys></campaign>"),
            Err(DefinitionError::Xml(_))
        ));
        assert!(matches!(
            parse_campaign_document("{not json"),
            Err(DefinitionError::Json(_))
        ));
    }
}
