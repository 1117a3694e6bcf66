//! Recovers a [`ResumeRecord`] from unstructured resume text with line
//! heuristics.
//!
//! Never fails: text with no recognizable headers yields a record whose name is
//! the first line and whose sections are empty.

pub mod contact;
pub mod rules;
pub mod sections;

use crate::extraction::contact::extract_contact;
use crate::extraction::rules::apply_rules;
use crate::extraction::sections::resume_rules;
use crate::models::resume::ResumeRecord;

pub fn extract(text: &str) -> ResumeRecord {
    let lines = split_lines(text);
    let mut record = ResumeRecord {
        contact_info: extract_contact(&lines),
        ..Default::default()
    };
    apply_rules(&resume_rules(), &lines, &mut record);
    record
}

/// Splits on LF or CRLF, trims each line and drops blank ones.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}
