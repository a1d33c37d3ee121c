use std::collections::HashMap;

use chrono::Utc;

use crate::auth::SessionStore;
use crate::errors::ApiError;
use crate::store::{Collection, Store, StoreError};
use crate::utils::generate_token;

/// Sliding-window length for both public form categories.
pub const WINDOW_SECS: i64 = 3600;

pub const CATEGORY_REVIEWS: &str = "reviews";
pub const CATEGORY_CONTACTS: &str = "contacts";

/// `{category -> {client address -> [unix timestamps]}}`, persisted as
/// rate_limits.json.
pub type RateLimitTable = HashMap<String, HashMap<String, Vec<i64>>>;

/// Issue a new CSRF token for the session, replacing any unused one.
pub fn issue_csrf(sessions: &SessionStore, sid: &str) -> String {
    let token = generate_token();
    sessions.set_csrf(sid, &token);
    token
}

/// Validate and consume the CSRF token presented by a form submission.
/// A missing cookie, unknown session, missing token or mismatch all fail
/// the same way: 403, refresh and retry.
pub fn validate_csrf(
    sessions: &SessionStore,
    sid: Option<&str>,
    presented: &str,
) -> Result<(), ApiError> {
    let sid = sid.ok_or(ApiError::Csrf)?;
    if presented.is_empty() || !sessions.take_csrf(sid, presented) {
        return Err(ApiError::Csrf);
    }
    Ok(())
}

/// Bots fill every field; people never see this one.
pub fn honeypot_tripped(website: Option<&str>) -> bool {
    website.map(|w| !w.trim().is_empty()).unwrap_or(false)
}

/// Sliding-window rate limit check, check-and-record in one store cycle.
///
/// Prunes everything older than the window, then either records `now` for
/// this client and allows, or denies without recording — a rejected attempt
/// does not count against the window.
pub fn allow(
    store: &Store,
    category: &str,
    client_key: &str,
    max_per_window: u32,
) -> Result<bool, StoreError> {
    allow_at(store, category, client_key, max_per_window, Utc::now().timestamp())
}

fn allow_at(
    store: &Store,
    category: &str,
    client_key: &str,
    max_per_window: u32,
    now: i64,
) -> Result<bool, StoreError> {
    let cutoff = now - WINDOW_SECS;
    store.update::<RateLimitTable, _, _>(Collection::RateLimits, |table| {
        for addrs in table.values_mut() {
            for stamps in addrs.values_mut() {
                stamps.retain(|t| *t > cutoff);
            }
            addrs.retain(|_, stamps| !stamps.is_empty());
        }
        table.retain(|_, addrs| !addrs.is_empty());

        let stamps = table
            .entry(category.to_string())
            .or_default()
            .entry(client_key.to_string())
            .or_default();
        if stamps.len() >= max_per_window as usize {
            return false;
        }
        stamps.push(now);
        true
    })
}
