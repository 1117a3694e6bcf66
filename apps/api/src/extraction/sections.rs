//! Section handlers for summary, skills, experience and education.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extraction::rules::{SectionHandler, SectionRule};
use crate::models::resume::{EducationEntry, ExperienceEntry, ResumeRecord};

static SUMMARY_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(professional\s+)?(summary|profile|objective)\s*:?$")
        .expect("valid summary header regex")
});
static SKILLS_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)skills").expect("valid skills header regex"));
static EXPERIENCE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)experience").expect("valid experience header regex"));
static EDUCATION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)education").expect("valid education header regex"));
static SKILLS_TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)experience|education").expect("valid skills terminator regex")
});
static SUMMARY_TERMINATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)skills|experience|education").expect("valid summary terminator regex")
});

static ROLE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\w.+ at .+$").expect("valid role line regex"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").expect("valid year regex"));
static DEGREE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)degree|bachelor|master|phd|associate").expect("valid degree regex")
});
static SKILL_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",|\s{2,}").expect("valid skill separator regex"));

const BULLET_GLYPHS: [char; 3] = ['-', '•', '*'];

/// Rules applied by [`crate::extraction::extract`], in order.
pub fn resume_rules() -> [SectionRule; 4] {
    [
        SectionRule {
            name: "summary",
            header: &SUMMARY_HEADER,
            terminator: &SUMMARY_TERMINATOR,
            handler: SummaryHandler::boxed,
        },
        SectionRule {
            name: "skills",
            header: &SKILLS_HEADER,
            terminator: &SKILLS_TERMINATOR,
            handler: SkillsHandler::boxed,
        },
        SectionRule {
            name: "experience",
            header: &EXPERIENCE_HEADER,
            terminator: &EDUCATION_HEADER,
            handler: ExperienceHandler::boxed,
        },
        SectionRule {
            name: "education",
            header: &EDUCATION_HEADER,
            terminator: &EXPERIENCE_HEADER,
            handler: EducationHandler::boxed,
        },
    ]
}

fn is_bullet(line: &str) -> bool {
    line.starts_with(BULLET_GLYPHS)
}

/// Removes a single leading bullet glyph.
fn clean_bullet(line: &str) -> String {
    line.strip_prefix(BULLET_GLYPHS)
        .unwrap_or(line)
        .trim()
        .to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Summary
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SummaryHandler {
    lines: Vec<String>,
}

impl SummaryHandler {
    fn boxed() -> Box<dyn SectionHandler> {
        Box::<Self>::default()
    }
}

impl SectionHandler for SummaryHandler {
    fn on_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn finish(self: Box<Self>, record: &mut ResumeRecord) {
        record.summary = self.lines.join(" ");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skills
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SkillsHandler {
    skills: Vec<String>,
    seen: HashSet<String>,
}

impl SkillsHandler {
    fn boxed() -> Box<dyn SectionHandler> {
        Box::<Self>::default()
    }
}

impl SectionHandler for SkillsHandler {
    fn on_line(&mut self, line: &str) {
        let line = line.trim_start_matches(BULLET_GLYPHS).trim();
        for token in SKILL_SEPARATOR.split(line) {
            let token = token.trim();
            if !token.is_empty() && self.seen.insert(token.to_string()) {
                self.skills.push(token.to_string());
            }
        }
    }

    fn finish(self: Box<Self>, record: &mut ResumeRecord) {
        record.skills = self.skills;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Experience
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ExperienceHandler {
    entries: Vec<ExperienceEntry>,
    open: Option<ExperienceEntry>,
}

impl ExperienceHandler {
    fn boxed() -> Box<dyn SectionHandler> {
        Box::<Self>::default()
    }
}

impl SectionHandler for ExperienceHandler {
    fn on_line(&mut self, line: &str) {
        if ROLE_LINE.is_match(line) {
            if let Some((title, company)) = line.split_once(" at ") {
                self.entries.extend(self.open.take());
                self.open = Some(ExperienceEntry {
                    title: title.trim().to_string(),
                    company: company.trim().to_string(),
                    ..Default::default()
                });
                return;
            }
        }

        let Some(entry) = self.open.as_mut() else {
            return;
        };
        if YEAR.is_match(line) {
            entry.date_range = line.to_string();
        } else if is_bullet(line) {
            entry.description.push(clean_bullet(line));
        }
    }

    fn finish(mut self: Box<Self>, record: &mut ResumeRecord) {
        self.entries.extend(self.open.take());
        record.experience = self.entries;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Education
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct EducationHandler {
    entries: Vec<EducationEntry>,
    open: Option<EducationEntry>,
}

impl EducationHandler {
    fn boxed() -> Box<dyn SectionHandler> {
        Box::<Self>::default()
    }
}

impl SectionHandler for EducationHandler {
    fn on_line(&mut self, line: &str) {
        if DEGREE_LINE.is_match(line) {
            self.entries.extend(self.open.take());
            self.open = Some(EducationEntry {
                degree: line.to_string(),
                ..Default::default()
            });
            return;
        }

        let Some(entry) = self.open.as_mut() else {
            return;
        };
        if YEAR.is_match(line) {
            entry.date_range = line.to_string();
        } else if entry.institution.is_empty() {
            entry.institution = line.to_string();
        } else {
            entry.details.push(line.to_string());
        }
    }

    fn finish(mut self: Box<Self>, record: &mut ResumeRecord) {
        self.entries.extend(self.open.take());
        record.education = self.entries;
    }
}
