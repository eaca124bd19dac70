//! Middleware layer.
//!
//! Middleware wraps a handler (or the whole dispatch) and is the place for
//! cross-cutting concerns:
//!
//! - [`trace`]: per-request span with method, path, status, latency
//! - [`auth`]: bearer-token inspection in front of protected routes

pub mod auth;
pub mod trace;
