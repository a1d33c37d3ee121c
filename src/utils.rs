use actix_web::HttpRequest;
use chrono::Local;
use rand::RngCore;
use serde::de::DeserializeOwned;

use crate::errors::ApiError;

/// Strip markup and escape what's left. Stored text is rendered back into
/// the site later, so nothing tag-shaped may survive persistence.
pub fn sanitize_input(raw: &str) -> String {
    ammonia::Builder::empty()
        .clean(raw.trim())
        .to_string()
        .trim()
        .to_string()
}

/// Timestamp format used in the persisted documents and outbound mail.
pub fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// 64 hex chars of CSPRNG output; used for session ids and CSRF tokens.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Best-effort client address: proxy headers first, then the socket peer.
pub fn client_ip(req: &HttpRequest) -> String {
    for header in ["X-Forwarded-For", "X-Real-IP", "CF-Connecting-IP"] {
        if let Some(value) = req.headers().get(header).and_then(|h| h.to_str().ok()) {
            // X-Forwarded-For lists the original client first
            if let Some(ip) = value.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// One decoding step for every POST body: JSON first, form-encoded as the
/// fallback. Validation never looks at the wire encoding.
pub fn decode_payload<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if let Ok(decoded) = serde_json::from_slice::<T>(body) {
        return Ok(decoded);
    }
    serde_urlencoded::from_bytes::<T>(body)
        .map_err(|_| ApiError::Validation("Malformed request body.".into()))
}

/// Accept `5`, `"5"` or `5.0` for numeric form fields; anything else is 0
/// and gets caught by range validation.
pub fn flexible_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct IntVisitor;

    impl serde::de::Visitor<'_> for IntVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or a numeric string")
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(v as i64)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<i64, E> {
            Ok(v.trim().parse().unwrap_or(0))
        }
    }

    deserializer.deserialize_any(IntVisitor)
}
