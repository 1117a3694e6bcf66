//! Section rule engine.
//!
//! A resume is scanned by an ordered list of [`SectionRule`]s. Each rule owns a
//! header matcher, a terminator matcher and a line handler, and is applied
//! independently from the top of the document:
//!
//! 1. the cursor moves just past the *first* line matching the header,
//! 2. every following line is fed to the handler until a line matches the
//!    terminator (not consumed) or the input ends,
//! 3. the handler writes its result into the record.
//!
//! Rules never share a cursor, so out-of-order or overlapping headers can make
//! two rules capture the same lines. That is an accepted limitation of the
//! heuristic, not something the engine tries to repair.

use regex::Regex;
use tracing::debug;

use crate::models::resume::ResumeRecord;

/// Accumulates the lines of one section and writes the result into a record.
pub trait SectionHandler {
    fn on_line(&mut self, line: &str);

    fn finish(self: Box<Self>, record: &mut ResumeRecord);
}

pub struct SectionRule {
    pub name: &'static str,
    pub header: &'static Regex,
    pub terminator: &'static Regex,
    pub handler: fn() -> Box<dyn SectionHandler>,
}

impl SectionRule {
    /// Runs the rule over `lines`. Returns `false` when the header is absent,
    /// in which case the record is left untouched.
    pub fn apply(&self, lines: &[&str], record: &mut ResumeRecord) -> bool {
        let mut cursor = LineCursor::new(lines);
        if !cursor.seek_past(self.header) {
            return false;
        }

        let mut handler = (self.handler)();
        while let Some(line) = cursor.next_until(self.terminator) {
            handler.on_line(line);
        }
        handler.finish(record);
        true
    }
}

/// Applies every rule in order, each from the start of the document.
pub fn apply_rules(rules: &[SectionRule], lines: &[&str], record: &mut ResumeRecord) {
    for rule in rules {
        let found = rule.apply(lines, record);
        debug!(section = rule.name, found, "section rule applied");
    }
}

/// Forward-only position in a line sequence.
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: &'a [&'a str]) -> Self {
        Self { lines, pos: 0 }
    }

    /// Moves just past the first line at or after the cursor that matches
    /// `pattern`. On a miss the cursor is exhausted and `false` is returned.
    pub fn seek_past(&mut self, pattern: &Regex) -> bool {
        while let Some(line) = self.lines.get(self.pos) {
            self.pos += 1;
            if pattern.is_match(line) {
                return true;
            }
        }
        false
    }

    /// Returns the next line unless it matches `stop`. A stopping line is left
    /// in place, and once stopped the cursor keeps returning `None`.
    pub fn next_until(&mut self, stop: &Regex) -> Option<&'a str> {
        let line = *self.lines.get(self.pos)?;
        if stop.is_match(line) {
            return None;
        }
        self.pos += 1;
        Some(line)
    }
}
