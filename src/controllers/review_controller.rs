use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{SessionStore, SESSION_COOKIE};
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::review::{Review, ReviewSubmission};
use crate::security;
use crate::store::{Collection, Store};
use crate::utils;

const SUBMIT_THANKS: &str =
    "Thank you for your review! It will appear on our site after approval.";

// Public: only approved records, and those never carry an ip field.
#[get("/api/reviews")]
pub async fn get_reviews(store: web::Data<Store>) -> HttpResponse {
    let reviews: Vec<Review> = store.read(Collection::ApprovedReviews);
    HttpResponse::Ok().json(json!({ "success": true, "reviews": reviews }))
}

#[post("/api/reviews")]
pub async fn submit_review(
    req: HttpRequest,
    body: web::Bytes,
    store: web::Data<Store>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let input: ReviewSubmission = utils::decode_payload(&body)?;

    // Hidden field only bots fill in. Accept, discard, don't tip them off.
    if security::honeypot_tripped(input.website.as_deref()) {
        return Ok(HttpResponse::Ok().json(json!({ "success": true, "message": SUBMIT_THANKS })));
    }

    let sid = req.cookie(SESSION_COOKIE).map(|c| c.value().to_string());
    security::validate_csrf(
        &sessions,
        sid.as_deref(),
        input.csrf_token.as_deref().unwrap_or(""),
    )?;

    let ip = utils::client_ip(&req);
    if !security::allow(
        &store,
        security::CATEGORY_REVIEWS,
        &ip,
        config.max_reviews_per_hour,
    )? {
        return Err(ApiError::RateLimited);
    }

    let valid = input.validate().map_err(ApiError::validation)?;

    let review = Review {
        id: Uuid::new_v4().simple().to_string(),
        name: valid.name,
        location: valid.location,
        rating: valid.rating,
        message: valid.message,
        submitted: utils::now_stamp(),
        ip: Some(ip),
        approved_at: None,
    };

    store.update::<Vec<Review>, _, _>(Collection::PendingReviews, |pending| {
        pending.push(review);
    })?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": SUBMIT_THANKS })))
}
