//! Task Service REST API
//!
//! ## Endpoints
//!
//! - `POST /authenticate` - Issue a session token as the `token` cookie
//! - `POST /logout` - Expire the `token` cookie
//! - `GET /allTasks?email=` - List a user's tasks
//! - `POST /create-task` - Insert a task document
//! - `PUT /updateBlog/:id` - Replace fields of a task the caller owns (token + access gate)
//! - `GET /` - Banner
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe

pub mod cookie;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use cookie::{clear_session_cookie, read_cookie, session_cookie, TOKEN_COOKIE};
pub use error::{ApiError, ErrorResponse, MessageResponse, UNAUTHORIZED_MESSAGE};
pub use middleware::{access_gate, metrics_middleware, record_gate_decision, MAX_CLAIM_BODY_BYTES};
pub use routes::create_router;
pub use state::ServiceState;
