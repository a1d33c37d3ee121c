use serde::{Deserialize, Serialize};

use crate::utils::{flexible_int, sanitize_input};

/// A customer review as persisted. `ip` exists only while the record sits in
/// the pending queue; `approved_at` only once it has been published. Both are
/// omitted from the JSON entirely when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    pub name: String,
    pub location: String,
    pub rating: i64,
    pub message: String,
    pub submitted: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<String>,
}

/// Wire payload of the public review form. Every field defaults so missing
/// input surfaces as validation errors, not decode errors.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "flexible_int")]
    pub rating: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// Field values after sanitization, ready to become a pending record.
#[derive(Debug)]
pub struct ValidatedReview {
    pub name: String,
    pub location: String,
    pub rating: i64,
    pub message: String,
}

impl ReviewSubmission {
    /// Sanitize then check every field, reporting all failures together
    /// rather than stopping at the first.
    pub fn validate(&self) -> Result<ValidatedReview, Vec<String>> {
        let name = sanitize_input(&self.name);
        let location = sanitize_input(&self.location);
        let message = sanitize_input(&self.message);

        let mut errors = Vec::new();
        if !(2..=100).contains(&name.chars().count()) {
            errors.push("Name must be between 2 and 100 characters.".to_string());
        }
        if !(2..=100).contains(&location.chars().count()) {
            errors.push("Location must be between 2 and 100 characters.".to_string());
        }
        if !(1..=5).contains(&self.rating) {
            errors.push("Rating must be between 1 and 5 stars.".to_string());
        }
        if !(10..=1000).contains(&message.chars().count()) {
            errors.push("Review must be between 10 and 1000 characters.".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ValidatedReview {
            name,
            location,
            rating: self.rating,
            message,
        })
    }
}
