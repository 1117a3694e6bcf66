//! Turns an LLM's free-form reply into a [`ResumeRecord`].
//!
//! Steps: strip Markdown code fences, cut out the first JSON object, parse it,
//! check the required fields, then map the reply schema
//! (`summary`, `skills`, `workExperience`, `education`) onto the record schema.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::resume::{EducationEntry, ExperienceEntry, ResumeRecord};

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?").expect("valid code fence regex"));

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no JSON object found in AI response")]
    NoJsonObject,

    #[error("invalid JSON in AI response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("AI response JSON missing required fields: {0}")]
    MissingRequiredFields(&'static str),
}

/// Normalizes a raw reply. `contact_info` is copied from `prior` when given,
/// since the reply schema carries no contact details.
pub fn normalize(raw: &str, prior: Option<&ResumeRecord>) -> Result<ResumeRecord, ValidationError> {
    debug!("AI raw response: {raw}");

    let cleaned = strip_code_fences(raw);
    let json = extract_json_object(&cleaned).ok_or(ValidationError::NoJsonObject)?;
    let value: Value = serde_json::from_str(json)?;
    validate(&value)?;

    Ok(ResumeRecord {
        contact_info: prior.map(|p| p.contact_info.clone()).unwrap_or_default(),
        summary: str_field(&value, "summary"),
        skills: str_list(&value, "skills"),
        experience: objects(&value, "workExperience")
            .map(|job| ExperienceEntry {
                title: str_field(job, "position"),
                company: str_field(job, "company"),
                location: String::new(),
                date_range: str_field(job, "duration"),
                description: str_list(job, "bullets"),
            })
            .collect(),
        education: objects(&value, "education")
            .map(|edu| EducationEntry {
                degree: str_field(edu, "degree"),
                institution: str_field(edu, "institution"),
                date_range: str_field(edu, "date_range"),
                details: str_list(edu, "details"),
            })
            .collect(),
        optimization_note: None,
    })
}

/// Removes every ```` ``` ```` and ```` ```json ```` marker, wherever it appears.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Returns the first balanced `{...}` block, skipping braces inside JSON
/// strings. When the braces never balance, falls back to the span from the
/// first `{` to the last `}` and lets the JSON parser reject it.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn validate(value: &Value) -> Result<(), ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::MissingRequiredFields("top-level object"));
    }
    let has_summary = value
        .get("summary")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty());
    if !has_summary {
        return Err(ValidationError::MissingRequiredFields("summary"));
    }
    if !value.get("skills").is_some_and(Value::is_array) {
        return Err(ValidationError::MissingRequiredFields("skills"));
    }
    if !value.get("workExperience").is_some_and(Value::is_array) {
        return Err(ValidationError::MissingRequiredFields("workExperience"));
    }
    Ok(())
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn str_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn objects<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| v.is_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ContactInfo;

    const FENCED_REPLY: &str = "```json\n{\"summary\":\"S\",\"skills\":[\"A\"],\"workExperience\":[{\"company\":\"C\",\"position\":\"P\",\"duration\":\"D\",\"bullets\":[\"B\"]}]}\n```";

    #[test]
    fn test_fenced_reply_normalizes() {
        let record = normalize(FENCED_REPLY, None).unwrap();
        assert_eq!(record.summary, "S");
        assert_eq!(record.skills, vec!["A"]);
        assert_eq!(
            record.experience,
            vec![ExperienceEntry {
                title: "P".to_string(),
                company: "C".to_string(),
                location: String::new(),
                date_range: "D".to_string(),
                description: vec!["B".to_string()],
            }]
        );
        assert!(record.education.is_empty());
        assert_eq!(record.contact_info, ContactInfo::default());
        assert!(!record.is_fallback());
    }

    #[test]
    fn test_prose_around_json_is_ignored() {
        let raw = "Sure! Here is the resume:\n{\"summary\":\"S\",\"skills\":[],\"workExperience\":[]}\nLet me know {if} you need more.";
        let record = normalize(raw, None).unwrap();
        assert_eq!(record.summary, "S");
    }

    #[test]
    fn test_braces_inside_strings_do_not_end_the_object() {
        let raw = r#"{"summary":"Uses {braces} and \"quotes\"","skills":["C}"],"workExperience":[]}"#;
        let record = normalize(raw, None).unwrap();
        assert_eq!(record.summary, "Uses {braces} and \"quotes\"");
        assert_eq!(record.skills, vec!["C}"]);
    }

    #[test]
    fn test_education_maps_with_defaults() {
        let raw = r#"{"summary":"S","skills":[],"workExperience":[{"company":"C"}],
            "education":[{"degree":"BSc","details":["Honors", 3]}, "junk"]}"#;
        let record = normalize(raw, None).unwrap();
        assert_eq!(record.experience[0].title, "");
        assert_eq!(record.experience[0].company, "C");
        assert_eq!(record.education.len(), 1);
        assert_eq!(record.education[0].degree, "BSc");
        assert_eq!(record.education[0].institution, "");
        assert_eq!(record.education[0].details, vec!["Honors"]);
    }

    #[test]
    fn test_contact_info_comes_from_prior_record() {
        let prior = ResumeRecord {
            contact_info: ContactInfo {
                name: "Jane".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            },
            summary: "ignored".to_string(),
            ..Default::default()
        };
        let record = normalize(FENCED_REPLY, Some(&prior)).unwrap();
        assert_eq!(record.contact_info.name, "Jane");
        assert_eq!(record.summary, "S");
    }

    #[test]
    fn test_non_json_text_is_rejected() {
        assert!(matches!(
            normalize("I cannot help with that.", None),
            Err(ValidationError::NoJsonObject)
        ));
    }

    #[test]
    fn test_broken_json_is_invalid_json() {
        assert!(matches!(
            normalize("{\"summary\": \"S\", skills: }", None),
            Err(ValidationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_unbalanced_braces_are_invalid_json() {
        assert!(matches!(
            normalize("{\"summary\": {\"x\": 1}", None),
            Err(ValidationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_missing_or_empty_summary_is_rejected() {
        for raw in [
            r#"{"skills":[],"workExperience":[]}"#,
            r#"{"summary":"","skills":[],"workExperience":[]}"#,
            r#"{"summary":5,"skills":[],"workExperience":[]}"#,
        ] {
            assert!(matches!(
                normalize(raw, None),
                Err(ValidationError::MissingRequiredFields("summary"))
            ));
        }
    }

    #[test]
    fn test_non_array_skills_or_experience_is_rejected() {
        assert!(matches!(
            normalize(r#"{"summary":"S","skills":"Rust","workExperience":[]}"#, None),
            Err(ValidationError::MissingRequiredFields("skills"))
        ));
        assert!(matches!(
            normalize(r#"{"summary":"S","skills":[]}"#, None),
            Err(ValidationError::MissingRequiredFields("workExperience"))
        ));
    }

    #[test]
    fn test_extract_json_object_picks_first_complete_block() {
        assert_eq!(extract_json_object("a {\"x\":{}} b {\"y\":1}"), Some("{\"x\":{}}"));
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} {"), None);
    }

    #[test]
    fn test_strip_code_fences_anywhere() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("text ```{}``` more"), "text {} more");
    }
}
