//! Prompts and input preparation for the LLM-backed oracles.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::error::Result;
use crate::types::{posting::Posting, profile::Profile, rejection::RejectionMemory};

/// Page text budget sent to the extraction model, in bytes.
pub const MAX_CONTENT_BYTES: usize = 48_000;

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract job posting details from web page content.

Output exactly one JSON object with these keys:
{
  "title": "",
  "company": "",
  "location": "",
  "employment_type": "",
  "salary": "",
  "job_description": "",
  "requirements": [],
  "qualifications": [],
  "skills_mentioned": []
}

Rules:
- Extract ONLY what appears in the content.
- NEVER invent information.
- Leave missing fields empty ("" or []).
- All lists are lists of strings.
- No markdown, no commentary."#;

pub const SCORING_SYSTEM_PROMPT: &str = r#"You judge how well a job posting fits a candidate.

You receive the posting, the candidate profile and the list of job ids the candidate has already rejected.

Score from 0 to 100:
- strongly mismatched: below 40
- partially matched: 40 to 69
- well matched: 70 or above
- subtract points for missing required skills
- subtract heavily for similarity to rejected jobs

pass = (score >= 60) unless the posting clearly conflicts with job_preferences (wrong location, wrong role type, on-site when the candidate wants remote only). When a conflict forces pass=false, name it in the rationale.

pass and score must agree. Never invent missing posting details; judge only what is present.

Respond with pass, score and a one or two sentence rationale."#;

static RE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(script|style|noscript|svg)\b.*?</(script|style|noscript|svg)>").unwrap());
static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static RE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(p|div|br|li|ul|ol|h[1-6]|tr|section|article)\b[^>]*>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\r\f]+").unwrap());
static RE_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n+").unwrap());

/// Reduce HTML to readable text. Plain text passes through mostly unchanged.
pub fn clean_html(html: &str) -> String {
    let text = RE_SCRIPT.replace_all(html, " ");
    let text = RE_COMMENT.replace_all(&text, " ");
    let text = RE_BLOCK.replace_all(&text, "\n");
    let text = RE_TAG.replace_all(&text, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    let text = RE_SPACES.replace_all(&text, " ");
    let text = RE_NEWLINES.replace_all(&text, "\n\n");

    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Truncate at a char boundary.
pub fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

pub fn extraction_user_prompt(url: &str, content: &str) -> String {
    let cleaned = clean_html(content);
    format!(
        "Job URL: {}\n\nPage content:\n{}",
        url,
        truncate_bytes(&cleaned, MAX_CONTENT_BYTES)
    )
}

pub fn scoring_user_prompt(
    posting: &Posting,
    profile: &Profile,
    rejections: &RejectionMemory,
) -> Result<String> {
    let input = json!({
        "job_details": posting,
        "profile": profile,
        "rejection_memory": rejections,
    });
    Ok(serde_json::to_string_pretty(&input)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_markup() {
        let html = r#"<html><head><style>.x{color:red}</style><script>var a = "<p>";</script></head>
            <body><h1>Rust Engineer</h1><!-- hidden --><p>Remote &amp; flexible</p></body></html>"#;

        let text = clean_html(html);
        assert!(text.contains("Rust Engineer"));
        assert!(text.contains("Remote & flexible"));
        assert!(!text.contains("color:red"));
        assert!(!text.contains("var a"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let s = "héllo";
        assert_eq!(truncate_bytes(s, 2), "h");
        assert_eq!(truncate_bytes(s, 3), "hé");
        assert_eq!(truncate_bytes(s, 100), s);
    }

    #[test]
    fn test_extraction_prompt_is_bounded() {
        let content = "a".repeat(MAX_CONTENT_BYTES * 2);
        let prompt = extraction_user_prompt("https://a.com/1", &content);
        assert!(prompt.len() < MAX_CONTENT_BYTES + 100);
        assert!(prompt.starts_with("Job URL: https://a.com/1"));
    }

    #[test]
    fn test_scoring_prompt_includes_all_inputs() {
        let posting = Posting {
            title: "Data Engineer".into(),
            ..Default::default()
        };
        let rejections: RejectionMemory = ["deadbeef00000000"].into_iter().collect();

        let prompt = scoring_user_prompt(&posting, &Profile::default(), &rejections).unwrap();
        let value: serde_json::Value = serde_json::from_str(&prompt).unwrap();
        assert_eq!(value["job_details"]["title"], "Data Engineer");
        assert_eq!(value["rejection_memory"][0], "deadbeef00000000");
        assert_eq!(value["profile"]["job_preferences"]["number_of_jobs_wanted"], 3);
    }
}
