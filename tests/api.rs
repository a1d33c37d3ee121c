use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use serde_json::{json, Value};
use tempfile::TempDir;

use brightside_backend::auth::SessionStore;
use brightside_backend::config::{Config, SmtpConfig};
use brightside_backend::models::review::Review;
use brightside_backend::routes;
use brightside_backend::store::{Collection, Store};
use brightside_backend::utils::now_stamp;

const ADMIN_PASSWORD: &str = "letmein-test";

struct TestState {
    _dir: TempDir,
    config: web::Data<Config>,
    store: web::Data<Store>,
    sessions: web::Data<SessionStore>,
}

fn state() -> TestState {
    state_with(|_| {})
}

fn state_with(tweak: impl FnOnce(&mut Config)) -> TestState {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config {
        bind_addr: "127.0.0.1:0".into(),
        allowed_origin: "http://localhost".into(),
        site_name: "Brightside Cleaning Co".into(),
        data_dir: dir.path().to_string_lossy().into_owned(),
        public_dir: "./public".into(),
        admin_password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).expect("hash"),
        admin_email: "owner@example.com".into(),
        fallback_phone: "(555) 010-0199".into(),
        max_reviews_per_hour: 3,
        max_contacts_per_hour: 5,
        smtp: SmtpConfig {
            // nothing listens here, so delivery fails fast in tests
            host: "127.0.0.1".into(),
            port: 1,
            user: "user".into(),
            pass: "pass".into(),
            from_name: "Website".into(),
            from_addr: "noreply@example.com".into(),
            encryption: "PLAIN".into(),
        },
    };
    tweak(&mut config);

    let store = web::Data::new(Store::new(config.data_dir.clone()));
    TestState {
        _dir: dir,
        config: web::Data::new(config),
        store,
        sessions: web::Data::new(SessionStore::new()),
    }
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.config.clone())
                .app_data($state.store.clone())
                .app_data($state.sessions.clone())
                .configure(routes),
        )
        .await
    };
}

/// Fetch a CSRF token; returns the session cookie plus the token.
macro_rules! fetch_csrf {
    ($app:expr) => {{
        let req = test::TestRequest::get().uri("/api/admin/csrf").to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .next()
            .map(|c| c.into_owned());
        let body: Value = test::read_body_json(resp).await;
        let token = body["token"].as_str().expect("token").to_string();
        (cookie, token)
    }};
}

macro_rules! admin_login {
    ($app:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/admin/login")
            .set_json(json!({ "password": ADMIN_PASSWORD }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.response()
            .cookies()
            .next()
            .expect("login sets the session cookie")
            .into_owned()
    }};
}

fn seed_pending(store: &Store, id: &str) {
    store
        .update::<Vec<Review>, _, _>(Collection::PendingReviews, |pending| {
            pending.push(Review {
                id: id.to_string(),
                name: "Jane Doe".into(),
                location: "Port Orange, FL".into(),
                rating: 5,
                message: "Spotless home, friendly crew.".into(),
                submitted: now_stamp(),
                ip: Some("9.9.9.9".into()),
                approved_at: None,
            });
        })
        .expect("seed pending");
}

fn review_body(token: &str) -> Value {
    json!({
        "name": "Jane Doe",
        "location": "Port Orange, FL",
        "rating": 5,
        "message": "Fantastic work, the whole house sparkles.",
        "csrf_token": token,
    })
}

// ---- review submission ----

#[actix_web::test]
async fn valid_submission_lands_in_pending_only() {
    let state = state();
    let app = init_app!(state);
    let (cookie, token) = fetch_csrf!(app);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .cookie(cookie.unwrap())
        .insert_header(("X-Real-IP", "203.0.113.9"))
        .set_json(review_body(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);

    let pending: Vec<Review> = state.store.read(Collection::PendingReviews);
    assert_eq!(pending.len(), 1);
    assert!(!pending[0].id.is_empty());
    assert_eq!(pending[0].ip.as_deref(), Some("203.0.113.9"));

    let approved: Vec<Review> = state.store.read(Collection::ApprovedReviews);
    assert!(approved.is_empty());
}

#[actix_web::test]
async fn form_encoded_submission_is_accepted() {
    let state = state();
    let app = init_app!(state);
    let (cookie, token) = fetch_csrf!(app);

    let body = format!(
        "name=Jane+Doe&location=Port+Orange&rating=4&message=Great+clean+every+time+thanks&csrf_token={token}"
    );
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .cookie(cookie.unwrap())
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let pending: Vec<Review> = state.store.read(Collection::PendingReviews);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].rating, 4);
}

#[actix_web::test]
async fn csrf_token_cannot_be_reused() {
    let state = state();
    let app = init_app!(state);
    let (cookie, token) = fetch_csrf!(app);
    let cookie = cookie.unwrap();

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .cookie(cookie.clone())
        .set_json(review_body(&token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // same token again: consumed on first validation
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .cookie(cookie)
        .set_json(review_body(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn submission_without_csrf_is_rejected() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .set_json(review_body("bogus"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn rate_limit_kicks_in_after_configured_ceiling() {
    let state = state_with(|c| c.max_reviews_per_hour = 2);
    let app = init_app!(state);

    for _ in 0..2 {
        let (cookie, token) = fetch_csrf!(app);
        let req = test::TestRequest::post()
            .uri("/api/reviews")
            .cookie(cookie.unwrap())
            .set_json(review_body(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let (cookie, token) = fetch_csrf!(app);
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .cookie(cookie.unwrap())
        .set_json(review_body(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    // the rejected attempt must not count against the window
    let pending: Vec<Review> = state.store.read(Collection::PendingReviews);
    assert_eq!(pending.len(), 2);
}

#[actix_web::test]
async fn honeypot_reports_success_but_stores_nothing() {
    let state = state();
    let app = init_app!(state);

    let mut body = review_body("irrelevant");
    body["website"] = json!("https://spam.example");
    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);

    let pending: Vec<Review> = state.store.read(Collection::PendingReviews);
    assert!(pending.is_empty());
}

#[actix_web::test]
async fn validation_failures_are_aggregated() {
    let state = state();
    let app = init_app!(state);
    let (cookie, token) = fetch_csrf!(app);

    let req = test::TestRequest::post()
        .uri("/api/reviews")
        .cookie(cookie.unwrap())
        .set_json(json!({
            "name": "Jane Doe",
            "location": "Port Orange, FL",
            "rating": 0,
            "message": "short",
            "csrf_token": token,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Rating must be between 1 and 5 stars."));
    assert!(error.contains("Review must be between 10 and 1000 characters."));
}

#[actix_web::test]
async fn public_listing_shows_approved_without_ip() {
    let state = state();
    let app = init_app!(state);

    state
        .store
        .update::<Vec<Review>, _, _>(Collection::ApprovedReviews, |approved| {
            approved.push(Review {
                id: "r1".into(),
                name: "Jane".into(),
                location: "Daytona".into(),
                rating: 5,
                message: "Wonderful deep clean.".into(),
                submitted: now_stamp(),
                ip: None,
                approved_at: Some(now_stamp()),
            });
        })
        .unwrap();

    let req = test::TestRequest::get().uri("/api/reviews").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);
    assert!(body["reviews"][0].get("ip").is_none());
}

// ---- moderation ----

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/admin/login")
        .set_json(json!({ "password": "nope" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn moderation_requires_a_session() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/admin/pending").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn approve_moves_record_and_strips_ip() {
    let state = state();
    let app = init_app!(state);
    seed_pending(&state.store, "rev-1");

    let cookie = admin_login!(app);
    let req = test::TestRequest::post()
        .uri("/api/admin/approve")
        .cookie(cookie)
        .set_json(json!({ "id": "rev-1" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let pending: Vec<Review> = state.store.read(Collection::PendingReviews);
    assert!(pending.is_empty());

    let approved: Vec<Review> = state.store.read(Collection::ApprovedReviews);
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, "rev-1");
    assert!(approved[0].ip.is_none());
    assert!(approved[0].approved_at.is_some());

    // stripped at approval time: the persisted document has no ip key at all
    let raw: Vec<Value> = state.store.read(Collection::ApprovedReviews);
    assert!(raw[0].get("ip").is_none());
}

#[actix_web::test]
async fn approve_unknown_id_is_not_found() {
    let state = state();
    let app = init_app!(state);

    let cookie = admin_login!(app);
    let req = test::TestRequest::post()
        .uri("/api/admin/approve")
        .cookie(cookie)
        .set_json(json!({ "id": "missing" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn reject_removes_from_both_worlds() {
    let state = state();
    let app = init_app!(state);
    seed_pending(&state.store, "rev-2");

    let cookie = admin_login!(app);
    let req = test::TestRequest::post()
        .uri("/api/admin/reject")
        .cookie(cookie)
        .set_json(json!({ "id": "rev-2" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let pending: Vec<Review> = state.store.read(Collection::PendingReviews);
    let approved: Vec<Review> = state.store.read(Collection::ApprovedReviews);
    assert!(pending.is_empty());
    assert!(approved.is_empty());
}

#[actix_web::test]
async fn delete_removes_an_approved_review() {
    let state = state();
    let app = init_app!(state);

    state
        .store
        .update::<Vec<Review>, _, _>(Collection::ApprovedReviews, |approved| {
            approved.push(Review {
                id: "r9".into(),
                name: "Old".into(),
                location: "Here".into(),
                rating: 3,
                message: "Removed later on.".into(),
                submitted: now_stamp(),
                ip: None,
                approved_at: Some(now_stamp()),
            });
        })
        .unwrap();

    let cookie = admin_login!(app);
    let req = test::TestRequest::post()
        .uri("/api/admin/delete")
        .cookie(cookie)
        .set_json(json!({ "id": "r9" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let approved: Vec<Review> = state.store.read(Collection::ApprovedReviews);
    assert!(approved.is_empty());
}

#[actix_web::test]
async fn expired_session_is_rejected_and_invalidated() {
    let state = state();
    let app = init_app!(state);

    let cookie = admin_login!(app);
    let sid = cookie.value().to_string();
    state
        .sessions
        .force_login_time(&sid, chrono::Utc::now().timestamp() - 7201);

    let req = test::TestRequest::get()
        .uri("/api/admin/pending")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Session expired. Please log in again.");

    // the expiry check de-authenticated the session for good
    let req = test::TestRequest::get()
        .uri("/api/admin/status")
        .cookie(cookie)
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["authenticated"], false);
}

#[actix_web::test]
async fn logout_invalidates_immediately() {
    let state = state();
    let app = init_app!(state);

    let cookie = admin_login!(app);
    let req = test::TestRequest::post()
        .uri("/api/admin/logout")
        .cookie(cookie.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/admin/pending")
        .cookie(cookie)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

// ---- contact form ----

#[actix_web::test]
async fn contact_validation_failures_are_aggregated() {
    let state = state();
    let app = init_app!(state);
    let (cookie, token) = fetch_csrf!(app);

    let req = test::TestRequest::post()
        .uri("/api/contact")
        .cookie(cookie.unwrap())
        .set_json(json!({
            "name": "J",
            "email": "not-an-address",
            "phone": "123",
            "service": "deep",
            "csrf_token": token,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("valid name"));
    assert!(error.contains("valid email address"));
    assert!(error.contains("valid phone number"));
}

#[actix_web::test]
async fn contact_honeypot_reports_success() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/contact")
        .set_json(json!({ "website": "http://spam.example" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn contact_delivery_failure_offers_fallback_phone() {
    let state = state();
    let app = init_app!(state);
    let (cookie, token) = fetch_csrf!(app);

    let req = test::TestRequest::post()
        .uri("/api/contact")
        .cookie(cookie.unwrap())
        .set_json(json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "386-555-0134",
            "service": "recurring",
            "message": "Weekly please.",
            "csrf_token": token,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("(555) 010-0199"));
}

// ---- misc surface ----

#[actix_web::test]
async fn unsupported_method_is_405() {
    let state = state();
    let app = init_app!(state);

    let req = test::TestRequest::delete().uri("/api/reviews").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Method not allowed.");
}
