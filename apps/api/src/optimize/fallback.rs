// Deterministic resume used when the AI path yields nothing usable.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::resume::{ResumeRecord, FALLBACK_NOTE};

const MAX_SKILLS: usize = 10;
const SUMMARY_SKILLS: usize = 3;

// Letters plus `+`/`#` so "C++" and "C#" survive as one token.
static SKILL_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z+#]+").expect("valid skill token regex"));

/// Builds a degraded record from the job description alone. Never fails.
pub fn synthesize(job_description: &str) -> ResumeRecord {
    let mut seen = HashSet::new();
    let skills: Vec<String> = SKILL_TOKEN
        .find_iter(job_description)
        .filter(|m| stands_alone(job_description, m.start(), m.end()))
        .map(|m| m.as_str())
        .filter(|token| seen.insert(*token))
        .take(MAX_SKILLS)
        .map(String::from)
        .collect();

    let summary = if skills.is_empty() {
        "Professional with expertise in relevant skills.".to_string()
    } else {
        let lead: Vec<&str> = skills.iter().take(SUMMARY_SKILLS).map(String::as_str).collect();
        format!("Professional with expertise in {}.", lead.join(", "))
    };

    ResumeRecord {
        summary,
        skills,
        optimization_note: Some(FALLBACK_NOTE.to_string()),
        ..Default::default()
    }
}

/// A token must not be glued to a digit, letter or underscore on either side,
/// so "EC2" or "snake_case" yield nothing.
fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    let is_word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    !text[..start].chars().next_back().is_some_and(is_word)
        && !text[end..].chars().next().is_some_and(is_word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tokens_gives_generic_summary() {
        for jd in ["", "1 2 3 !!", "a b c - 2024"] {
            let record = synthesize(jd);
            assert!(record.skills.is_empty());
            assert_eq!(record.summary, "Professional with expertise in relevant skills.");
            assert!(record.is_fallback());
        }
    }

    #[test]
    fn test_symbol_tokens_are_kept_whole() {
        let record = synthesize("Need C++ and C# plus Rust");
        assert_eq!(record.skills, vec!["Need", "C++", "and", "C#", "plus", "Rust"]);
        assert_eq!(record.summary, "Professional with expertise in Need, C++, and.");
    }

    #[test]
    fn test_tokens_glued_to_digits_or_underscores_are_skipped() {
        let record = synthesize("Python3 on AWS EC2 with snake_case and 2Go");
        assert_eq!(record.skills, vec!["on", "AWS", "with", "and"]);
    }

    #[test]
    fn test_tokens_are_deduplicated_and_capped() {
        let jd = "Rust Go Rust Python Java Kotlin Swift Ruby Perl Scala Haskell Elixir Go";
        let record = synthesize(jd);
        assert_eq!(record.skills.len(), MAX_SKILLS);
        assert_eq!(record.skills[0], "Rust");
        assert_eq!(record.skills[1], "Go");
        assert_eq!(record.skills[2], "Python");
        assert!(!record.skills.contains(&"Elixir".to_string()));
    }

    #[test]
    fn test_other_sections_stay_empty() {
        let record = synthesize("Senior Rust engineer");
        assert_eq!(record.contact_info, Default::default());
        assert!(record.experience.is_empty());
        assert!(record.education.is_empty());
        assert_eq!(record.optimization_note.as_deref(), Some(FALLBACK_NOTE));
    }
}
