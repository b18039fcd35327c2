//! Common utilities and shared types for afisha.
//!
//! This crate provides foundational components used across all afisha crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **WebApp auth**: Telegram mini-app `initData` verification via [`webapp::verify_init_data`]
//! - **Bearer tokens**: HS256 session tokens via [`JwtService`]
//!
//! # Example
//!
//! ```no_run
//! use afisha_common::{Config, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Listening on {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod jwt;
pub mod webapp;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtService};
pub use webapp::{InitData, WebAppUser, verify_init_data};
