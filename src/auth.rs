use std::collections::HashMap;
use std::sync::Mutex;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::errors::ApiError;
use crate::utils::generate_token;

pub const SESSION_COOKIE: &str = "bs_session";

/// Absolute admin session lifetime, wall clock since login.
const SESSION_TTL_SECS: i64 = 7200;
/// Anonymous sessions (CSRF only) are swept after a day.
const SESSION_SWEEP_SECS: i64 = 86_400;

#[derive(Debug, Clone)]
struct Session {
    authenticated: bool,
    login_time: i64,
    csrf_token: Option<String>,
    created_at: i64,
}

impl Session {
    fn new(now: i64) -> Self {
        Session {
            authenticated: false,
            login_time: 0,
            csrf_token: None,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Valid,
    Expired,
    Unauthenticated,
}

/// Server-side session state keyed by the opaque id carried in the
/// `bs_session` cookie. Injected into handlers as `web::Data<SessionStore>`;
/// nothing session-shaped lives in globals.
pub struct SessionStore {
    inner: Mutex<HashMap<String, Session>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Session id from the request cookie, or a fresh one if the cookie is
    /// absent or stale. Returns `(id, created)` — when `created` is true the
    /// handler must attach the session cookie to its response.
    pub fn ensure(&self, req: &HttpRequest) -> (String, bool) {
        let now = Utc::now().timestamp();
        let mut sessions = self.lock();
        sessions.retain(|_, s| now - s.created_at <= SESSION_SWEEP_SECS);

        if let Some(cookie) = req.cookie(SESSION_COOKIE) {
            let sid = cookie.value().to_string();
            if sessions.contains_key(&sid) {
                return (sid, false);
            }
        }

        let sid = generate_token();
        sessions.insert(sid.clone(), Session::new(now));
        (sid, true)
    }

    /// Store a fresh CSRF token on the session, replacing any unused one.
    pub fn set_csrf(&self, sid: &str, token: &str) {
        if let Some(session) = self.lock().get_mut(sid) {
            session.csrf_token = Some(token.to_string());
        }
    }

    /// Consume-on-check: the stored token is removed before comparison, so a
    /// token validates at most once regardless of outcome.
    pub fn take_csrf(&self, sid: &str, presented: &str) -> bool {
        let stored = match self.lock().get_mut(sid) {
            Some(session) => session.csrf_token.take(),
            None => None,
        };
        match stored {
            Some(stored) => stored.as_bytes().ct_eq(presented.as_bytes()).into(),
            None => false,
        }
    }

    pub fn login(&self, sid: &str) {
        if let Some(session) = self.lock().get_mut(sid) {
            session.authenticated = true;
            session.login_time = Utc::now().timestamp();
        }
    }

    pub fn logout(&self, sid: &str) {
        if let Some(session) = self.lock().get_mut(sid) {
            session.authenticated = false;
            session.login_time = 0;
        }
    }

    /// Check authentication, enforcing absolute expiry. An expired session
    /// is de-authenticated here, not just reported.
    pub fn status(&self, sid: &str) -> SessionStatus {
        let now = Utc::now().timestamp();
        let mut sessions = self.lock();
        let Some(session) = sessions.get_mut(sid) else {
            return SessionStatus::Unauthenticated;
        };
        if !session.authenticated {
            return SessionStatus::Unauthenticated;
        }
        if now - session.login_time > SESSION_TTL_SECS {
            session.authenticated = false;
            session.login_time = 0;
            return SessionStatus::Expired;
        }
        SessionStatus::Valid
    }

    /// Test hook: backdate a login so expiry paths can be exercised.
    pub fn force_login_time(&self, sid: &str, login_time: i64) {
        if let Some(session) = self.lock().get_mut(sid) {
            session.login_time = login_time;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Guard for admin endpoints. Returns the session id so the handler can act
/// on the same session it authorized.
pub fn require_admin(req: &HttpRequest, sessions: &SessionStore) -> Result<String, ApiError> {
    let sid = req
        .cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::Auth("Authentication required."))?;

    match sessions.status(&sid) {
        SessionStatus::Valid => Ok(sid),
        SessionStatus::Expired => Err(ApiError::Auth("Session expired. Please log in again.")),
        SessionStatus::Unauthenticated => Err(ApiError::Auth("Authentication required.")),
    }
}

/// The session cookie handed to browsers. HttpOnly keeps the opaque id away
/// from page scripts; SameSite=Lax still lets top-level navigation carry it.
pub fn session_cookie(sid: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, sid.to_string())
        .path("/")
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .finish()
}
