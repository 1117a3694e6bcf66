use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::resume::ContactInfo;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?\d{1,3}[-.\s]?)?(\(?\d{3}\)?[-.\s]?){1,2}\d{4}").expect("valid phone regex")
});
static LINKEDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"linkedin\.com/in/[\w-]+").expect("valid linkedin regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://(?:www\.)?[\w.-]+\.\w+").expect("valid url regex"));
static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:located\s+in|location:)\s*([^,.|]+(?:,\s*[^,.|]+)?)")
        .expect("valid location regex")
});

/// Scans every line once. The first line is taken as the name; for each other
/// field only the first match in the document is kept.
pub fn extract_contact(lines: &[&str]) -> ContactInfo {
    let mut contact = ContactInfo {
        name: lines.first().map(|l| l.to_string()).unwrap_or_default(),
        ..Default::default()
    };

    for line in lines {
        fill_first(&mut contact.email, &EMAIL_RE, line);
        fill_first(&mut contact.phone, &PHONE_RE, line);

        if contact.linkedin.is_empty() {
            if let Some(m) = LINKEDIN_RE.find(line) {
                contact.linkedin = format!("https://{}", m.as_str());
            }
        }
        if contact.website.is_empty() {
            if let Some(m) = URL_RE.find(line).filter(|m| !m.as_str().contains("linkedin.com")) {
                contact.website = m.as_str().to_string();
            }
        }
        if contact.location.is_empty() {
            if let Some(caps) = LOCATION_RE.captures(line) {
                contact.location = caps[1].trim().to_string();
            }
        }
    }

    contact
}

fn fill_first(slot: &mut String, pattern: &Regex, line: &str) {
    if slot.is_empty() {
        if let Some(m) = pattern.find(line) {
            *slot = m.as_str().to_string();
        }
    }
}
