use actix_web::{post, web, HttpRequest, HttpResponse};
use mail_send::mail_builder::MessageBuilder;
use mail_send::{Credentials, SmtpClientBuilder};
use serde_json::json;

use crate::auth::{SessionStore, SESSION_COOKIE};
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::contact::{ContactSubmission, QuoteRequest};
use crate::security;
use crate::store::Store;
use crate::utils;

const SUBMIT_THANKS: &str =
    "Thank you! Your quote request has been sent. We'll get back to you within 24 hours.";

// Fire-and-forget: validate, mail the owner, persist nothing.
#[post("/api/contact")]
pub async fn submit_contact(
    req: HttpRequest,
    body: web::Bytes,
    store: web::Data<Store>,
    sessions: web::Data<SessionStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let input: ContactSubmission = utils::decode_payload(&body)?;

    if security::honeypot_tripped(input.website.as_deref()) {
        return Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Thank you! We'll be in touch soon." })));
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
        security::CATEGORY_CONTACTS,
        &ip,
        config.max_contacts_per_hour,
    )? {
        return Err(ApiError::RateLimited);
    }

    let quote = input.validate().map_err(ApiError::validation)?;

    // no retry and no queue: a failed send is logged and the caller is
    // pointed at the phone number instead
    if let Err(e) = send_quote_email(&config, &quote, &ip).await {
        log::error!("quote email from {} failed: {}", quote.email, e);
        return Err(ApiError::Delivery(format!(
            "We couldn't send your request right now. Please call us at {} instead.",
            config.fallback_phone
        )));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": SUBMIT_THANKS })))
}

async fn send_quote_email(config: &Config, quote: &QuoteRequest, ip: &str) -> Result<(), String> {
    let smtp = &config.smtp;
    let rule = "======================================";

    let subject = format!("New Quote Request from {}", config.site_name);

    let mut text = format!(
        "{rule}\n  NEW QUOTE REQUEST - {site}\n{rule}\n\n\
         Name:     {name}\n\
         Email:    {email}\n\
         Phone:    {phone}\n\
         Service:  {service}\n",
        site = config.site_name,
        name = quote.name,
        email = quote.email,
        phone = quote.phone,
        service = quote.service_label,
    );
    if !quote.message.is_empty() {
        text.push_str(&format!("\nMessage:\n{}\n", quote.message));
    }
    text.push_str(&format!(
        "\n{rule}\nSubmitted: {}\nIP Address: {}\n{rule}\n",
        utils::now_stamp(),
        ip,
    ));

    let message = MessageBuilder::new()
        .from((smtp.from_name.as_str(), smtp.from_addr.as_str()))
        .to(config.admin_email.as_str())
        .reply_to(quote.email.as_str())
        .subject(subject)
        .text_body(text);

    let mut client_builder = SmtpClientBuilder::new(smtp.host.as_str(), smtp.port)
        .credentials(Credentials::new(smtp.user.as_str(), smtp.pass.as_str()));

    client_builder = match smtp.encryption.as_str() {
        "SSL" | "SMTPS" => client_builder.implicit_tls(true),
        _ => client_builder.implicit_tls(false),
    };

    client_builder
        .connect()
        .await
        .map_err(|e| format!("connect to SMTP server: {e}"))?
        .send(message)
        .await
        .map_err(|e| format!("send quote email: {e}"))?;

    Ok(())
}
