//! Core business logic for afisha.

pub mod services;

pub use services::*;
