//! Access gate: compares the verified token identity with the identity a
//! request claims.
//!
//! ## Policy
//!
//! A request is allowed when **either** its claimed email or its claimed
//! user id matches the token. It is denied only when both fail to match.
//! A field matches only when the claim is present and equal to a non-empty
//! verified value, so two absent values never grant access.

use crate::types::{ClaimedIdentity, Identity};

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Continue to the handler.
    Allow,
    /// Respond 401 and stop.
    Deny,
}

impl AccessDecision {
    /// True for [`AccessDecision::Allow`].
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decide whether `claimed` is acceptable for the holder of `verified`.
pub fn authorize(verified: &Identity, claimed: &ClaimedIdentity) -> AccessDecision {
    let email_matches = field_matches(&verified.user_email, claimed.email.as_deref());
    let id_matches = field_matches(&verified.user_id, claimed.user_id.as_deref());

    // Inclusive OR: one matching field is enough
    if email_matches || id_matches {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny
    }
}

fn field_matches(verified: &str, claimed: Option<&str>) -> bool {
    !verified.is_empty() && claimed == Some(verified)
}
