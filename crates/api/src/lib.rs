//! HTTP API layer for afisha.
//!
//! This crate provides the REST API consumed by the Telegram mini-app:
//!
//! - **Endpoints**: events, polls, auth and admin dashboards
//! - **Extractors**: bearer authentication and the admin guard
//! - **Middleware**: token resolution and activity stamping
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
