//! Resume optimization pipeline.
//!
//! Flow: extract prior record → build prompt → cached completion →
//!       normalize reply → (on any failure) fallback synthesis.
//!
//! Never fails once a provider is chosen: a fetch error or an unusable reply
//! both degrade to [`fallback::synthesize`].

use tracing::{info, warn};

use crate::cache::ResponseCache;
use crate::extraction::extract;
use crate::llm_client::CompletionProvider;
use crate::models::resume::ResumeRecord;
use crate::optimize::fallback;
use crate::optimize::normalizer::normalize;
use crate::optimize::prompts::{build_optimize_prompt, optimize_system};

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeOutcome {
    pub record: ResumeRecord,
    pub used_fallback: bool,
}

impl OptimizeOutcome {
    fn fallback(job_description: &str) -> Self {
        Self {
            record: fallback::synthesize(job_description),
            used_fallback: true,
        }
    }
}

pub async fn optimize_resume(
    resume_text: &str,
    job_description: &str,
    provider: &dyn CompletionProvider,
    cache: &ResponseCache,
) -> OptimizeOutcome {
    let prior = extract(resume_text);
    let prompt = build_optimize_prompt(resume_text, job_description);
    let system = optimize_system();

    let raw = match cache
        .get_or_fetch(resume_text, job_description, || {
            provider.complete(&prompt, &system)
        })
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!("{} completion failed, using fallback: {e}", provider.name());
            return OptimizeOutcome::fallback(job_description);
        }
    };

    match normalize(&raw, Some(&prior)) {
        Ok(record) => {
            info!(
                "Optimized resume via {}: {} skills, {} experience entries",
                provider.name(),
                record.skills.len(),
                record.experience.len()
            );
            OptimizeOutcome {
                record,
                used_fallback: false,
            }
        }
        Err(e) => {
            warn!("AI response rejected, using fallback: {e}");
            OptimizeOutcome::fallback(job_description)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::llm_client::LlmError;

    const RESUME: &str = "Jane Doe\njane@example.com\nSkills\nRust, Go\nExperience\nEngineer at Acme\n2020 - 2023\n- Built things";
    const JD: &str = "Looking for Kubernetes and Terraform experience";

    /// Replies with a fixed text (or a timeout) and counts calls.
    struct Scripted {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn replying(reply: &'static str) -> Self {
            Self {
                reply: Some(reply),
                calls: AtomicUsize::new(0),
            }
        }

        fn timing_out() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
            assert!(prompt.contains(JD));
            assert!(system.contains("JSON"));
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.map(String::from).ok_or(LlmError::Timeout)
        }
    }

    fn temp_cache() -> (tempfile::TempDir, ResponseCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResponseCache::on_disk(dir.path(), 24);
        (dir, cache)
    }

    #[tokio::test]
    async fn test_valid_reply_is_normalized_with_prior_contact() {
        let (_dir, cache) = temp_cache();
        let provider = Scripted::replying(
            r#"```json
{"summary":"Cloud engineer","skills":["Kubernetes"],"workExperience":[{"company":"Acme","position":"Engineer","duration":"2020 - 2023","bullets":["Ran clusters"]}]}
```"#,
        );

        let outcome = optimize_resume(RESUME, JD, &provider, &cache).await;
        assert!(!outcome.used_fallback);
        assert_eq!(outcome.record.summary, "Cloud engineer");
        assert_eq!(outcome.record.contact_info.name, "Jane Doe");
        assert_eq!(outcome.record.contact_info.email, "jane@example.com");
        assert_eq!(outcome.record.experience[0].title, "Engineer");
        assert!(!outcome.record.is_fallback());
    }

    #[tokio::test]
    async fn test_non_json_reply_falls_back_to_jd_tokens() {
        let (_dir, cache) = temp_cache();
        let provider = Scripted::replying("Sorry, I can't do that right now.");

        let outcome = optimize_resume(RESUME, JD, &provider, &cache).await;
        assert!(outcome.used_fallback);
        assert!(outcome.record.is_fallback());
        assert_eq!(
            outcome.record.summary,
            "Professional with expertise in Looking, for, Kubernetes."
        );
        assert!(outcome.record.skills.contains(&"Terraform".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_failure_falls_back() {
        let (_dir, cache) = temp_cache();
        let provider = Scripted::timing_out();

        let outcome = optimize_resume(RESUME, JD, &provider, &cache).await;
        assert!(outcome.used_fallback);
        assert!(outcome.record.contact_info.name.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_identical_request_is_served_from_cache() {
        let (_dir, cache) = temp_cache();
        let provider = Scripted::replying(r#"{"summary":"S","skills":[],"workExperience":[]}"#);

        let first = optimize_resume(RESUME, JD, &provider, &cache).await;
        let second = optimize_resume(RESUME, JD, &provider, &cache).await;
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let (_dir, cache) = temp_cache();
        let provider = Scripted::timing_out();

        optimize_resume(RESUME, JD, &provider, &cache).await;
        optimize_resume(RESUME, JD, &provider, &cache).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
