use serde::Deserialize;
use validator::ValidateEmail;

use crate::utils::sanitize_input;

/// Wire payload of the quote request form.
#[derive(Debug, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// A validated quote request, ready to be mailed to the owner.
#[derive(Debug)]
pub struct QuoteRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_label: String,
    pub message: String,
}

impl ContactSubmission {
    pub fn validate(&self) -> Result<QuoteRequest, Vec<String>> {
        let name = sanitize_input(&self.name);
        let email = self.email.trim().to_string();
        let phone = sanitize_input(&self.phone);
        let service = sanitize_input(&self.service);
        let message = sanitize_input(&self.message);

        let mut errors = Vec::new();
        if !(2..=100).contains(&name.chars().count()) {
            errors.push("Please enter a valid name.".to_string());
        }
        if !email.validate_email() {
            errors.push("Please enter a valid email address.".to_string());
        }
        if !(7..=20).contains(&phone.chars().count()) {
            errors.push("Please enter a valid phone number.".to_string());
        }
        if service.is_empty() {
            errors.push("Please select a service.".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(QuoteRequest {
            name,
            email,
            phone,
            service_label: service_label(&service).to_string(),
            message,
        })
    }
}

/// Known service codes map to their display labels; anything else passes
/// through as typed so a stale front end still produces a readable email.
fn service_label(code: &str) -> &str {
    match code {
        "deep" => "Luxury Deep Cleaning",
        "recurring" => "Recurring Maintenance",
        "vacation" => "Vacation Rentals",
        other => other,
    }
}
