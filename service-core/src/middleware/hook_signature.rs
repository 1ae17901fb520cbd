use crate::error::AppError;
use crate::utils::signature::verify_hook;
use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const HOOK_SIGNATURE_HEADER: &str = "x-hook-signature";
pub const HOOK_TIMESTAMP_HEADER: &str = "x-hook-timestamp";

/// Maximum clock skew accepted between the sender and this service.
pub const HOOK_TOLERANCE_SECS: i64 = 60;

/// Signed hook bodies larger than this are rejected before verification.
pub const MAX_HOOK_BODY_BYTES: usize = 64 * 1024;

/// Shared secret used to authenticate inbound event hooks.
///
/// With no secret configured every hook call is accepted. With one, each
/// call must carry a fresh timestamp and a signature that has not been seen
/// inside the tolerance window.
#[derive(Clone, Default)]
pub struct HookSignatureConfig {
    secret: Option<Arc<Secret<String>>>,
    seen: Arc<Mutex<HashMap<String, i64>>>,
}

impl HookSignatureConfig {
    pub fn new(secret: Option<Secret<String>>) -> Self {
        Self {
            secret: secret.map(Arc::new),
            seen: Arc::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Records `signature` as used. Returns false if it was already used.
    fn claim(&self, signature: &str, timestamp: i64, now: i64) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.retain(|_, ts| (now - *ts).abs() <= HOOK_TOLERANCE_SECS);
        seen.insert(signature.to_ascii_lowercase(), timestamp).is_none()
    }
}

/// Rejects hook calls unless `X-Hook-Signature` is the hex HMAC-SHA256 of
/// `"{X-Hook-Timestamp}.{raw body}"`, the timestamp is within
/// [`HOOK_TOLERANCE_SECS`] of now, and the signature is not a replay.
pub async fn hook_signature_middleware(
    State(config): State<HookSignatureConfig>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(secret) = config.secret.as_ref() else {
        return Ok(next.run(req).await);
    };

    let signature = get_header(req.headers(), HOOK_SIGNATURE_HEADER)?;
    let timestamp: i64 = get_header(req.headers(), HOOK_TIMESTAMP_HEADER)?
        .trim()
        .parse()
        .map_err(|_| AppError::Unauthenticated("Invalid hook timestamp".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    if (now - timestamp).abs() > HOOK_TOLERANCE_SECS {
        tracing::warn!(timestamp, now, "Rejected hook call outside the timestamp window");
        return Err(AppError::Unauthenticated("Hook timestamp expired".to_string()));
    }

    let (parts, body) = req.into_parts();
    let bytes = Limited::new(body, MAX_HOOK_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                AppError::BadRequest("Hook payload too large".to_string())
            } else {
                AppError::Internal(anyhow::anyhow!("Failed to read body: {}", e))
            }
        })?
        .to_bytes();

    let is_valid = verify_hook(secret.expose_secret(), timestamp, &bytes, &signature)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Signature verification error: {}", e)))?;

    if !is_valid {
        tracing::warn!(path = %parts.uri.path(), "Rejected hook call with invalid signature");
        return Err(AppError::Unauthenticated("Invalid hook signature".to_string()));
    }

    if !config.claim(signature.trim(), timestamp, now) {
        tracing::warn!(path = %parts.uri.path(), "Rejected replayed hook call");
        return Err(AppError::Unauthenticated("Replayed hook call".to_string()));
    }

    let req = Request::from_parts(parts, Body::from(bytes));
    Ok(next.run(req).await)
}

fn get_header(headers: &HeaderMap, key: &str) -> Result<String, AppError> {
    headers
        .get(key)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Unauthenticated(format!("Missing header: {}", key)))
}
