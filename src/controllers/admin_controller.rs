use actix_web::{get, post, route, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, SessionStore, SESSION_COOKIE};
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::review::Review;
use crate::security;
use crate::store::{Collection, Store};
use crate::utils;

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct IdPayload {
    #[serde(default)]
    pub id: String,
}

#[post("/api/admin/login")]
pub async fn login(
    req: HttpRequest,
    body: web::Bytes,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let input: LoginPayload = utils::decode_payload(&body)?;

    let ok = bcrypt::verify(&input.password, &config.admin_password_hash).map_err(|e| {
        log::error!("bcrypt verify: {:?}", e);
        ApiError::Internal
    })?;

    if !ok {
        // fixed delay to blunt brute-force throughput; partial protection only
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
        return Err(ApiError::Auth("Invalid password."));
    }

    let (sid, created) = sessions.ensure(&req);
    sessions.login(&sid);

    let mut response = HttpResponse::Ok();
    if created {
        response.cookie(auth::session_cookie(&sid));
    }
    Ok(response.json(json!({ "success": true, "message": "Login successful." })))
}

#[route("/api/admin/status", method = "GET", method = "POST")]
pub async fn status(req: HttpRequest, sessions: web::Data<SessionStore>) -> HttpResponse {
    let authenticated = req
        .cookie(SESSION_COOKIE)
        .map(|c| sessions.status(c.value()) == auth::SessionStatus::Valid)
        .unwrap_or(false);

    HttpResponse::Ok().json(json!({ "success": true, "authenticated": authenticated }))
}

// Issued to anyone rendering one of the public forms, admin or not.
#[route("/api/admin/csrf", method = "GET", method = "POST")]
pub async fn csrf(req: HttpRequest, sessions: web::Data<SessionStore>) -> HttpResponse {
    let (sid, created) = sessions.ensure(&req);
    let token = security::issue_csrf(&sessions, &sid);

    let mut response = HttpResponse::Ok();
    if created {
        response.cookie(auth::session_cookie(&sid));
    }
    response.json(json!({ "success": true, "token": token }))
}

#[post("/api/admin/logout")]
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
) -> Result<HttpResponse, ApiError> {
    let sid = auth::require_admin(&req, &sessions)?;
    sessions.logout(&sid);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Logged out successfully." })))
}

#[get("/api/admin/pending")]
pub async fn pending(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
    store: web::Data<Store>,
) -> Result<HttpResponse, ApiError> {
    auth::require_admin(&req, &sessions)?;
    let reviews: Vec<Review> = store.read(Collection::PendingReviews);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "reviews": reviews })))
}

#[get("/api/admin/approved")]
pub async fn approved(
    req: HttpRequest,
    sessions: web::Data<SessionStore>,
    store: web::Data<Store>,
) -> Result<HttpResponse, ApiError> {
    auth::require_admin(&req, &sessions)?;
    let reviews: Vec<Review> = store.read(Collection::ApprovedReviews);
    Ok(HttpResponse::Ok().json(json!({ "success": true, "reviews": reviews })))
}

#[post("/api/admin/approve")]
pub async fn approve(
    req: HttpRequest,
    body: web::Bytes,
    sessions: web::Data<SessionStore>,
    store: web::Data<Store>,
) -> Result<HttpResponse, ApiError> {
    auth::require_admin(&req, &sessions)?;
    let id = required_id(&body)?;

    let guard = store.lock();
    let mut pending_reviews: Vec<Review> = store.read(Collection::PendingReviews);
    let position = pending_reviews
        .iter()
        .position(|r| r.id == id)
        .ok_or(ApiError::NotFound)?;

    let mut review = pending_reviews.remove(position);
    // published records never expose the submitter address
    review.ip = None;
    review.approved_at = Some(utils::now_stamp());

    let mut approved_reviews: Vec<Review> = store.read(Collection::ApprovedReviews);
    approved_reviews.push(review);

    // approved lands first: a crash between the two writes leaves the
    // record duplicated across the queues, never lost
    store.write(&guard, Collection::ApprovedReviews, &approved_reviews)?;
    store.write(&guard, Collection::PendingReviews, &pending_reviews)?;
    drop(guard);

    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Review approved and published." })))
}

#[post("/api/admin/reject")]
pub async fn reject(
    req: HttpRequest,
    body: web::Bytes,
    sessions: web::Data<SessionStore>,
    store: web::Data<Store>,
) -> Result<HttpResponse, ApiError> {
    auth::require_admin(&req, &sessions)?;
    let id = required_id(&body)?;

    remove_by_id(&store, Collection::PendingReviews, &id)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Review rejected and removed." })))
}

#[post("/api/admin/delete")]
pub async fn delete(
    req: HttpRequest,
    body: web::Bytes,
    sessions: web::Data<SessionStore>,
    store: web::Data<Store>,
) -> Result<HttpResponse, ApiError> {
    auth::require_admin(&req, &sessions)?;
    let id = required_id(&body)?;

    remove_by_id(&store, Collection::ApprovedReviews, &id)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Review deleted." })))
}

fn required_id(body: &[u8]) -> Result<String, ApiError> {
    let payload: IdPayload = utils::decode_payload(body)?;
    let id = utils::sanitize_input(&payload.id);
    if id.is_empty() {
        return Err(ApiError::Validation("Review ID required.".into()));
    }
    Ok(id)
}

fn remove_by_id(store: &Store, coll: Collection, id: &str) -> Result<(), ApiError> {
    let found = store.update::<Vec<Review>, _, _>(coll, |reviews| {
        let before = reviews.len();
        reviews.retain(|r| r.id != id);
        reviews.len() < before
    })?;

    if !found {
        return Err(ApiError::NotFound);
    }
    Ok(())
}
