// Prompt constants for resume optimization.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

pub const OPTIMIZE_SYSTEM_BASE: &str = "You are an expert resume optimizer.";

/// Optimization prompt. Replace `{resume_text}` and `{job_description}` before sending.
pub const OPTIMIZE_PROMPT_TEMPLATE: &str = r#"You are an expert resume optimizer.

RESUME:
{resume_text}

JOB DESCRIPTION:
{job_description}

TASK:
- Identify relevant skills and experiences
- Suggest rephrasing of work experience
- Recommend skills to emphasize
- Suggest a tailored professional summary
- Identify gaps

Respond ONLY with valid JSON in exactly this format:
{
  "summary": "Concise professional summary",
  "skills": ["Skill 1", "Skill 2", "Skill 3"],
  "workExperience": [
    {
      "company": "Company Name",
      "position": "Job Title",
      "duration": "Date Range",
      "bullets": ["Accomplishment 1", "Accomplishment 2"]
    }
  ],
  "education": [
    {
      "degree": "Degree Name",
      "institution": "School Name",
      "date_range": "Year Range",
      "details": ["Detail 1", "Detail 2"]
    }
  ]
}"#;

pub fn optimize_system() -> String {
    format!("{OPTIMIZE_SYSTEM_BASE} {JSON_ONLY_INSTRUCTION}")
}

pub fn build_optimize_prompt(resume_text: &str, job_description: &str) -> String {
    OPTIMIZE_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_texts() {
        let prompt = build_optimize_prompt("RUST DEV RESUME", "Hiring Rust devs");
        assert!(prompt.contains("RUST DEV RESUME"));
        assert!(prompt.contains("Hiring Rust devs"));
        assert!(!prompt.contains("{resume_text}"));
        assert!(!prompt.contains("{job_description}"));
        assert!(prompt.contains("\"workExperience\""));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(optimize_system().contains("valid JSON only"));
    }
}
