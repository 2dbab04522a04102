//! # taskmaster-service
//!
//! REST backend for a task-tracking application.
//!
//! Users open a session by exchanging an email/user id pair for a signed
//! token delivered as an HTTP-only cookie. Task documents are stored in a
//! document collection and filtered by their owner's email.
//!
//! ## Architecture
//!
//! ```text
//! Request → AccessGate ─┬─ TokenService::verify  (cookie)
//!                       └─ extract_claim → authorize  (query/body)
//!                ↓
//!           Route handler → TaskStore (Postgres or Memory)
//! ```
//!
//! ## Guarantees
//!
//! - Tokens are HMAC-SHA256 signed and expire 24 hours after issue
//! - A missing or invalid token is rejected before any claim is read
//! - Absent claims never match, even against empty token fields
//! - Updates never insert

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod token;
pub mod extract;
pub mod gate;
pub mod config;
pub mod store;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    ClaimedIdentity, Identity, InsertAck, TaskDocument, TaskId, TaskRecord, TaskUpdate,
    UpdateAck,
};
pub use token::{SessionToken, TokenClaims, TokenError, TokenService, TOKEN_TTL_HOURS};
pub use extract::{claim_from_body, claim_from_query, extract_claim, ClaimSource};
pub use gate::{authorize, AccessDecision};
pub use config::{ConfigError, DeploymentMode, LogFormat, ServiceConfig};
pub use store::{InMemoryTaskStore, TaskStore};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresTaskStore};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
