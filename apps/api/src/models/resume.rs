use serde::{Deserialize, Serialize};

/// Note attached to records produced by the fallback synthesizer.
pub const FALLBACK_NOTE: &str = "Fallback optimization applied due to AI failure";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    pub location: String,
    pub date_range: String,
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub degree: String,
    pub institution: String,
    pub date_range: String,
    pub details: Vec<String>,
}

/// Canonical resume schema shared by the text extractor, the AI-response
/// normalizer, the fallback synthesizer and the document writer.
///
/// All five top-level fields are always serialized, empty when unknown.
/// Every field is optional on input so partially filled bodies can be rendered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRecord {
    pub contact_info: ContactInfo,
    pub summary: String,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    /// Present only on degraded output, see [`FALLBACK_NOTE`].
    #[serde(
        rename = "_optimization_note",
        skip_serializing_if = "Option::is_none"
    )]
    pub optimization_note: Option<String>,
}

impl ResumeRecord {
    pub fn is_fallback(&self) -> bool {
        self.optimization_note.is_some()
    }
}
