//! Service middleware: the access gate and request metrics.
//!
//! ## Metrics Exposed
//!
//! - `request_metric` - Request count and latency by path, method, status
//! - `gate_decision_metric` - Access gate outcomes by reason

use axum::{
    body::{self, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{info, warn};

use crate::extract::extract_claim;
use crate::gate::{authorize, AccessDecision};
use crate::token::{SessionToken, TokenService};

use super::cookie::{read_cookie, TOKEN_COOKIE};
use super::error::ApiError;

/// Largest body the access gate buffers to read the claim.
pub const MAX_CLAIM_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Access gate for protected routes.
///
/// 1. Reads and verifies the `token` cookie; a missing or invalid token
///    responds 401 before the body is touched.
/// 2. Extracts the claimed identity (query or body, by method) and runs the
///    access check; a denial responds 401 and the handler never runs.
/// 3. On success, forwards the request with the buffered body restored and
///    the verified `Identity` in its extensions.
pub async fn access_gate(
    State(tokens): State<Arc<TokenService>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(raw_token) = read_cookie(request.headers(), TOKEN_COOKIE) else {
        record_gate_decision("missing_token");
        return Err(ApiError::Unauthorized);
    };

    let identity = tokens
        .verify(&SessionToken::from_string(raw_token))
        .map_err(|e| {
            warn!(error = %e, "Session token rejected");
            record_gate_decision("invalid_token");
            ApiError::Unauthorized
        })?;

    let (parts, body) = request.into_parts();
    let bytes = body::to_bytes(body, MAX_CLAIM_BODY_BYTES)
        .await
        .map_err(|e| {
            if exceeds_length_limit(&e) {
                record_gate_decision("body_too_large");
                ApiError::PayloadTooLarge(format!(
                    "Request body exceeds {MAX_CLAIM_BODY_BYTES} bytes"
                ))
            } else {
                ApiError::BadRequest(format!("Unreadable request body: {e}"))
            }
        })?;

    let claim = extract_claim(&parts.method, parts.uri.query(), &bytes);
    if authorize(&identity, &claim) == AccessDecision::Deny {
        warn!(
            user_email = %identity.user_email,
            claimed_email = ?claim.email,
            claimed_user_id = ?claim.user_id,
            "Access gate denied request"
        );
        record_gate_decision("identity_mismatch");
        return Err(ApiError::Unauthorized);
    }

    record_gate_decision("allowed");
    let mut request = Request::from_parts(parts, Body::from(bytes));
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Whether a body read failed because it hit the buffering limit.
fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Metrics middleware that records request counts and latency.
///
/// Uses tracing for now - can be upgraded to prometheus metrics later.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "taskmaster::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Normalize path for metrics to avoid high cardinality.
///
/// Replaces task ids (UUIDs) with a `:id` placeholder.
fn normalize_path(path: &str) -> String {
    static UUID_REGEX: OnceLock<regex_lite::Regex> = OnceLock::new();
    let uuid_regex = UUID_REGEX.get_or_init(|| {
        regex_lite::Regex::new(
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}"
        )
        .expect("static regex is valid")
    });

    uuid_regex.replace_all(path, ":id").to_string()
}

/// Record an access gate outcome.
pub fn record_gate_decision(reason: &str) {
    info!(
        target: "taskmaster::metrics",
        metric_type = "gate_decision",
        reason = reason,
        "gate_decision_metric"
    );
}
