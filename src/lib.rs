use actix_web::{web, HttpResponse};

pub mod auth;
pub mod config;
pub mod controllers;
pub mod errors;
pub mod models;
pub mod security;
pub mod store;
pub mod utils;

use errors::ApiError;

/// Every API route, shared between `main` and the integration tests.
/// The catch-all routes sit after the typed handlers so an unsupported
/// method on a known path answers 405 instead of 404.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(controllers::review_controller::get_reviews)
        .service(controllers::review_controller::submit_review)
        .service(controllers::contact_controller::submit_contact)
        .service(controllers::admin_controller::login)
        .service(controllers::admin_controller::status)
        .service(controllers::admin_controller::csrf)
        .service(controllers::admin_controller::logout)
        .service(controllers::admin_controller::pending)
        .service(controllers::admin_controller::approved)
        .service(controllers::admin_controller::approve)
        .service(controllers::admin_controller::reject)
        .service(controllers::admin_controller::delete);

    for path in [
        "/api/reviews",
        "/api/contact",
        "/api/admin/login",
        "/api/admin/status",
        "/api/admin/csrf",
        "/api/admin/logout",
        "/api/admin/pending",
        "/api/admin/approved",
        "/api/admin/approve",
        "/api/admin/reject",
        "/api/admin/delete",
    ] {
        cfg.route(path, web::route().to(method_not_allowed));
    }
}

async fn method_not_allowed() -> Result<HttpResponse, ApiError> {
    Err(ApiError::Method)
}
