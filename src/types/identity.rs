//! Identity types shared by the token service, claim extraction and the access gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A user identity as embedded in a session token.
///
/// Serialized with the camelCase field names the frontend sends
/// (`userEmail`, `userId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Email address of the user.
    pub user_email: String,
    /// Opaque user identifier (as assigned by the identity provider).
    pub user_id: String,
}

impl Identity {
    /// Create a new identity.
    pub fn new(user_email: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.user_email, self.user_id)
    }
}

/// The identity a request asserts about itself.
///
/// `None` means the request made no claim for that field. Empty strings are
/// normalized to `None` on construction, so an absent claim can never
/// compare equal to anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimedIdentity {
    /// Claimed email, if any.
    pub email: Option<String>,
    /// Claimed user id, if any.
    pub user_id: Option<String>,
}

impl ClaimedIdentity {
    /// Build a claim, collapsing empty strings to `None`.
    pub fn new(email: Option<String>, user_id: Option<String>) -> Self {
        Self {
            email: non_empty(email),
            user_id: non_empty(user_id),
        }
    }

    /// A claim with neither field present.
    pub fn none() -> Self {
        Self::default()
    }

    /// True when neither field carries a claim.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.user_id.is_none()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
