use std::env;

use bcrypt::DEFAULT_COST;

/// Runtime settings, read once at startup and injected into handlers as
/// `web::Data<Config>`. Everything comes from the environment (`.env` is
/// loaded by `main` before this runs); see `.env.example` for the full list.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub allowed_origin: String,
    pub site_name: String,
    pub data_dir: String,
    pub public_dir: String,

    /// bcrypt hash of the single shared admin password.
    pub admin_password_hash: String,
    /// Recipient for contact form submissions.
    pub admin_email: String,
    /// Shown to users when outbound mail fails.
    pub fallback_phone: String,

    pub max_reviews_per_hour: u32,
    pub max_contacts_per_hour: u32,

    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from_name: String,
    pub from_addr: String,
    /// "STARTTLS", "SSL"/"SMTPS" or "PLAIN"/"NONE".
    pub encryption: String,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:8080"),
            allowed_origin: var_or("ALLOWED_ORIGIN", "http://localhost:3000"),
            site_name: var_or("SITE_NAME", "Brightside Cleaning Co"),
            data_dir: var_or("DATA_DIR", "./data"),
            public_dir: var_or("PUBLIC_DIR", "./public"),
            admin_password_hash: admin_hash_from_env(),
            admin_email: var_or("ADMIN_EMAIL", "info@example.com"),
            fallback_phone: var_or("FALLBACK_PHONE", "(555) 010-0199"),
            max_reviews_per_hour: parse_or("MAX_REVIEWS_PER_HOUR", 3),
            max_contacts_per_hour: parse_or("MAX_CONTACTS_PER_HOUR", 5),
            smtp: SmtpConfig {
                host: var_or("SMTP_HOST", "localhost"),
                port: parse_or("SMTP_PORT", 587),
                user: var_or("SMTP_USER", ""),
                pass: var_or("SMTP_PASS", ""),
                from_name: var_or("SMTP_FROM_NAME", "Website"),
                from_addr: var_or("SMTP_FROM_ADDRESS", "noreply@example.com"),
                encryption: var_or("SMTP_ENCRYPTION", "STARTTLS").to_uppercase(),
            },
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// ADMIN_PASSWORD_HASH must be a bcrypt hash. If it is missing we hash a
/// well-known default so a fresh checkout still boots, and shout about it.
fn admin_hash_from_env() -> String {
    match env::var("ADMIN_PASSWORD_HASH") {
        Ok(hash) if !hash.trim().is_empty() => hash,
        _ => {
            log::warn!("ADMIN_PASSWORD_HASH not set, falling back to the default password");
            bcrypt::hash("ChangeMeBeforeLaunch!", DEFAULT_COST)
                .unwrap_or_else(|e| panic!("bcrypt hash of default password failed: {e}"))
        }
    }
}
