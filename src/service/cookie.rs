//! Session cookie helpers.
//!
//! | Mode | Attributes |
//! |------|------------|
//! | Development | `Path=/; HttpOnly; SameSite=Strict` |
//! | Production | `Path=/; HttpOnly; Secure; SameSite=None` |

use axum::http::{header::COOKIE, HeaderMap};

use crate::config::DeploymentMode;
use crate::token::SessionToken;

/// Name of the session cookie.
pub const TOKEN_COOKIE: &str = "token";

/// Read a cookie value from the request `Cookie` headers.
///
/// Empty values are treated as absent.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &SessionToken, mode: DeploymentMode) -> String {
    format!("{TOKEN_COOKIE}={token}; {}", attributes(mode))
}

/// `Set-Cookie` value that expires the session cookie.
pub fn clear_session_cookie(mode: DeploymentMode) -> String {
    format!(
        "{TOKEN_COOKIE}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; {}",
        attributes(mode)
    )
}

fn attributes(mode: DeploymentMode) -> &'static str {
    match mode {
        DeploymentMode::Production => "Path=/; HttpOnly; Secure; SameSite=None",
        DeploymentMode::Development => "Path=/; HttpOnly; SameSite=Strict",
    }
}
