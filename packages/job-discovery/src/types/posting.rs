//! Posting types - the structured job record and the oracle's raw fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::PostingId;
use crate::types::lenient::{list_from_value, text_from_value};

/// One job opening.
///
/// Absent data is an empty string or an empty list, never `null`.
/// Created once at first successful extraction and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Posting {
    /// Identity derived from `apply_url`
    #[serde(rename = "job_id")]
    pub identity: PostingId,

    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub salary: String,

    /// Free-text description
    pub job_description: String,

    pub requirements: Vec<String>,
    pub qualifications: Vec<String>,
    pub skills_mentioned: Vec<String>,

    /// Canonical source URL
    pub apply_url: String,
}

impl Posting {
    /// Build a posting from oracle output.
    ///
    /// `identity` and `apply_url` come from the input URL, whatever the
    /// oracle claimed.
    pub fn from_extraction(url: &str, fields: ExtractedFields) -> Self {
        Self {
            identity: PostingId::from_url(url),
            title: fields.title,
            company: fields.company,
            location: fields.location,
            employment_type: fields.employment_type,
            salary: fields.salary,
            job_description: fields.job_description,
            requirements: fields.requirements,
            qualifications: fields.qualifications,
            skills_mentioned: fields.skills_mentioned,
            apply_url: url.to_string(),
        }
    }

    /// Canonical text used for embedding.
    ///
    /// Stable field order so the same posting always embeds the same way.
    pub fn embedding_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        let headline = [self.title.as_str(), self.company.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" at ");
        if !headline.is_empty() {
            parts.push(headline);
        }

        for (label, value) in [
            ("Location", &self.location),
            ("Employment type", &self.employment_type),
            ("Salary", &self.salary),
        ] {
            if !value.is_empty() {
                parts.push(format!("{}: {}", label, value));
            }
        }

        if !self.job_description.is_empty() {
            parts.push(self.job_description.clone());
        }

        for (label, values) in [
            ("Requirements", &self.requirements),
            ("Qualifications", &self.qualifications),
            ("Skills", &self.skills_mentioned),
        ] {
            if !values.is_empty() {
                parts.push(format!("{}: {}", label, values.join(", ")));
            }
        }

        parts.join("\n")
    }
}

/// Fields returned by the extraction oracle, already backfilled.
///
/// [`ExtractedFields::from_value`] accepts whatever JSON the oracle produced
/// and never fails: unknown keys are ignored, missing or `null` keys become
/// empty, a bare string where a list is expected becomes a one-item list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub title: String,
    pub company: String,
    pub location: String,
    pub employment_type: String,
    pub salary: String,
    pub job_description: String,
    pub requirements: Vec<String>,
    pub qualifications: Vec<String>,
    pub skills_mentioned: Vec<String>,
}

impl ExtractedFields {
    /// Lenient conversion from arbitrary oracle JSON.
    pub fn from_value(value: &Value) -> Self {
        Self {
            title: text_field(value, "title"),
            company: text_field(value, "company"),
            location: text_field(value, "location"),
            employment_type: text_field(value, "employment_type"),
            salary: text_field(value, "salary"),
            job_description: text_field(value, "job_description"),
            requirements: list_field(value, "requirements"),
            qualifications: list_field(value, "qualifications"),
            skills_mentioned: list_field(value, "skills_mentioned"),
        }
    }
}

fn text_field(value: &Value, key: &str) -> String {
    value.get(key).map(text_from_value).unwrap_or_default()
}

fn list_field(value: &Value, key: &str) -> Vec<String> {
    value.get(key).map(list_from_value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_and_url_are_forced() {
        let fields = ExtractedFields {
            title: "ML Engineer".into(),
            ..Default::default()
        };
        let posting = Posting::from_extraction("https://jobs.example.com/1", fields);

        assert_eq!(posting.apply_url, "https://jobs.example.com/1");
        assert_eq!(
            posting.identity,
            PostingId::from_url("https://jobs.example.com/1")
        );
    }

    #[test]
    fn test_lenient_parse_backfills_missing_fields() {
        let raw = json!({
            "job_id": "hallucinated",
            "title": "Data Analyst",
            "company": null,
            "skills_mentioned": "Python",
            "requirements": ["SQL", 3, null, "  "],
            "apply_url": "https://wrong.example.com"
        });

        let fields = ExtractedFields::from_value(&raw);
        assert_eq!(fields.title, "Data Analyst");
        assert_eq!(fields.company, "");
        assert_eq!(fields.salary, "");
        assert_eq!(fields.skills_mentioned, vec!["Python"]);
        assert_eq!(fields.requirements, vec!["SQL", "3"]);
        assert!(fields.qualifications.is_empty());
    }

    #[test]
    fn test_non_object_parses_to_empty() {
        assert_eq!(
            ExtractedFields::from_value(&json!("not an object")),
            ExtractedFields::default()
        );
    }

    #[test]
    fn test_serialized_shape_is_complete() {
        let posting = Posting::from_extraction("https://a.example/1", ExtractedFields::default());
        let value = serde_json::to_value(&posting).unwrap();

        for key in [
            "job_id",
            "title",
            "company",
            "location",
            "employment_type",
            "salary",
            "job_description",
            "requirements",
            "qualifications",
            "skills_mentioned",
            "apply_url",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
            assert!(!value[key].is_null(), "null {}", key);
        }
    }

    #[test]
    fn test_embedding_text_skips_empty_fields() {
        let posting = Posting {
            title: "Rust Engineer".into(),
            company: "Acme".into(),
            skills_mentioned: vec!["tokio".into(), "serde".into()],
            ..Default::default()
        };

        let text = posting.embedding_text();
        assert_eq!(text, "Rust Engineer at Acme\nSkills: tokio, serde");
    }
}
