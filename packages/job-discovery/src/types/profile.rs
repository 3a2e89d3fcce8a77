//! The searching user's structured background.
//!
//! Owned by an external profile-building step. The pipeline only reads it.

use serde::{Deserialize, Serialize};

use crate::types::lenient;

/// Result count used when the profile does not ask for a specific number.
pub const DEFAULT_JOBS_WANTED: usize = 3;

/// Structured user profile.
///
/// Decoding is tolerant: `null`, a number where text is expected, or a bare
/// string where a list is expected fall back instead of rejecting the
/// whole profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub contact: Contact,
    #[serde(deserialize_with = "lenient::item_list")]
    pub education: Vec<Education>,
    #[serde(deserialize_with = "lenient::item_list")]
    pub experience: Vec<Experience>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "lenient::null_as_default")]
    pub job_preferences: JobPreferences,
    #[serde(deserialize_with = "lenient::text")]
    pub additional_notes: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub update_required: bool,
    /// Timestamp or date as the profile builder wrote it
    #[serde(deserialize_with = "lenient::text")]
    pub last_update: String,
}

impl Profile {
    /// How many results the user asked for, never zero.
    pub fn jobs_wanted(&self) -> usize {
        match self.job_preferences.number_of_jobs_wanted {
            0 => DEFAULT_JOBS_WANTED,
            n => n,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(deserialize_with = "lenient::text")]
    pub phone: String,
    #[serde(deserialize_with = "lenient::text")]
    pub linkedin: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(deserialize_with = "lenient::text")]
    pub degree: String,
    #[serde(deserialize_with = "lenient::text")]
    pub field: String,
    #[serde(deserialize_with = "lenient::text")]
    pub institution: String,
    #[serde(deserialize_with = "lenient::text")]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub company: String,
    #[serde(deserialize_with = "lenient::text")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub end_date: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
}

/// What the user is looking for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobPreferences {
    #[serde(deserialize_with = "lenient::text_list")]
    pub role_types: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub industries: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub locations: Vec<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub remote: bool,
    /// Unparseable values decode as 0, which [`Profile::jobs_wanted`] maps
    /// back to the default.
    #[serde(deserialize_with = "lenient::count")]
    pub number_of_jobs_wanted: usize,
}

impl Default for JobPreferences {
    fn default() -> Self {
        Self {
            role_types: Vec::new(),
            industries: Vec::new(),
            locations: Vec::new(),
            remote: false,
            number_of_jobs_wanted: DEFAULT_JOBS_WANTED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_a_valid_profile() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.job_preferences.number_of_jobs_wanted, 3);
    }

    #[test]
    fn test_partial_profile_parses() {
        let profile: Profile = serde_json::from_str(
            r#"{
                "name": "Ada",
                "skills": ["Rust", "SQL"],
                "job_preferences": {"role_types": ["Backend Engineer"], "remote": true}
            }"#,
        )
        .unwrap();

        assert_eq!(profile.skills, vec!["Rust", "SQL"]);
        assert!(profile.job_preferences.remote);
        assert_eq!(profile.jobs_wanted(), 3);
    }

    #[test]
    fn test_numeric_last_update() {
        let profile: Profile = serde_json::from_str(r#"{"last_update": 0}"#).unwrap();
        assert_eq!(profile.last_update, "0");
    }

    #[test]
    fn test_numeric_year_and_null_fields_parse() {
        let profile: Profile = serde_json::from_str(
            r#"{
                "name": null,
                "location": null,
                "contact": {"email": "ada@example.com", "phone": 5551234},
                "education": [
                    {"degree": "BSc", "field": "CS", "year": 2019},
                    "not an education entry"
                ],
                "experience": null,
                "skills": "Rust",
                "job_preferences": {
                    "role_types": null,
                    "remote": "yes",
                    "number_of_jobs_wanted": "5"
                },
                "update_required": null
            }"#,
        )
        .unwrap();

        assert_eq!(profile.name, "");
        assert_eq!(profile.location, "");
        assert_eq!(profile.contact.phone, "5551234");
        assert_eq!(profile.education.len(), 1);
        assert_eq!(profile.education[0].year, "2019");
        assert!(profile.experience.is_empty());
        assert_eq!(profile.skills, vec!["Rust"]);
        assert!(profile.job_preferences.role_types.is_empty());
        assert!(profile.job_preferences.remote);
        assert_eq!(profile.jobs_wanted(), 5);
        assert!(!profile.update_required);
    }

    #[test]
    fn test_null_preferences_use_defaults() {
        let profile: Profile =
            serde_json::from_str(r#"{"job_preferences": null, "contact": null}"#).unwrap();
        assert_eq!(profile.job_preferences, JobPreferences::default());
        assert_eq!(profile.jobs_wanted(), DEFAULT_JOBS_WANTED);

        let garbled: Profile =
            serde_json::from_str(r#"{"job_preferences": {"number_of_jobs_wanted": null}}"#).unwrap();
        assert_eq!(garbled.jobs_wanted(), DEFAULT_JOBS_WANTED);
    }

    #[test]
    fn test_zero_jobs_wanted_falls_back() {
        let mut profile = Profile::default();
        profile.job_preferences.number_of_jobs_wanted = 0;
        assert_eq!(profile.jobs_wanted(), DEFAULT_JOBS_WANTED);

        profile.job_preferences.number_of_jobs_wanted = 7;
        assert_eq!(profile.jobs_wanted(), 7);
    }
}
