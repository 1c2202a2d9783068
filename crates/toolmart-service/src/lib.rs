//! Toolmart HTTP API Service.
//!
//! This crate provides the HTTP API for the toolmart marketplace core,
//! including:
//!
//! - User registration, deposits, and the payment audit trail
//! - Catalog browsing
//! - Purchases with discount codes
//! - License key rotation and third-party key validation
//! - Admin reporting
//!
//! # Authorization
//!
//! The web/session layer in front of this service is out of scope; acting
//! users arrive as IDs in request bodies, and admin endpoints check the
//! `is_admin` capability flag via the `x-admin-id` header.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for routing consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
