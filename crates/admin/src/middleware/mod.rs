//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Security headers (stricter CSP for admin)
//! 4. Session layer (tower-sessions, in-memory store)
//!
//! Authentication is per handler, through the [`RequireAdminAuth`] extractor.

pub mod auth;
pub mod security_headers;
pub mod session;

pub use auth::{AdminAuthRejection, OptionalAdminAuth, RequireAdminAuth};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
