//! Claimed-identity extraction.
//!
//! Read-style requests (`GET`, `DELETE`) carry their claim in the query
//! string; write-style requests (`POST`, `PUT`, `PATCH`) carry it in the JSON
//! body. Both use the keys `email` and `userId`. Anything missing, empty or
//! non-string is "no claim", never a wildcard.

use http::Method;
use serde_json::Value;

use crate::types::ClaimedIdentity;

/// Key holding the claimed email.
pub const EMAIL_KEY: &str = "email";

/// Key holding the claimed user id.
pub const USER_ID_KEY: &str = "userId";

/// Where a request's identity claim lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimSource {
    /// URL query parameters.
    Query,
    /// JSON request body.
    Body,
    /// The method carries no claim.
    Absent,
}

impl ClaimSource {
    /// Select the claim source for an HTTP method.
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::DELETE {
            Self::Query
        } else if *method == Method::POST || *method == Method::PUT || *method == Method::PATCH {
            Self::Body
        } else {
            Self::Absent
        }
    }
}

/// Extract the claim from a raw query string (without the leading `?`).
///
/// Values are percent-decoded. When a key repeats, the first value wins.
pub fn claim_from_query(query: Option<&str>) -> ClaimedIdentity {
    let Some(query) = query else {
        return ClaimedIdentity::none();
    };

    let mut email = None;
    let mut user_id = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match &*key {
            EMAIL_KEY if email.is_none() => email = Some(value.into_owned()),
            USER_ID_KEY if user_id.is_none() => user_id = Some(value.into_owned()),
            _ => {}
        }
    }
    ClaimedIdentity::new(email, user_id)
}

/// Extract the claim from a JSON request body.
///
/// Bodies that are not JSON objects yield an empty claim.
pub fn claim_from_body(body: &[u8]) -> ClaimedIdentity {
    let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) else {
        return ClaimedIdentity::none();
    };

    let string_field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    ClaimedIdentity::new(string_field(EMAIL_KEY), string_field(USER_ID_KEY))
}

/// Extract the claim for a request, choosing the source by method.
pub fn extract_claim(method: &Method, query: Option<&str>, body: &[u8]) -> ClaimedIdentity {
    match ClaimSource::for_method(method) {
        ClaimSource::Query => claim_from_query(query),
        ClaimSource::Body => claim_from_body(body),
        ClaimSource::Absent => ClaimedIdentity::none(),
    }
}
