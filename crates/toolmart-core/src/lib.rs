//! Core types and utilities for toolmart.
//!
//! This crate provides the foundational types used throughout the toolmart
//! marketplace:
//!
//! - **Identifiers**: `UserId`, `ToolId`, `PurchaseId`, `DiscountCodeId`,
//!   `PaymentId`, `ValidationId`
//! - **Users**: `User`
//! - **Catalog**: `Tool`
//! - **Discounts**: `DiscountCode`, `DiscountType`
//! - **Purchases**: `Purchase`, license key minting
//! - **Ledger**: `Payment`, `PaymentType`, `PaymentStatus`
//! - **Key checks**: `KeyValidation`
//!
//! # Money Unit
//!
//! All amounts are stored as `i64` integer cents to avoid floating point
//! precision issues. Discount values use the same unit: percentage points
//! for percentage codes, cents for fixed codes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod discount;
pub mod error;
pub mod ids;
pub mod license;
pub mod payment;
pub mod purchase;
pub mod tool;
pub mod user;
pub mod validation;

pub use discount::{DiscountCode, DiscountType};
pub use error::{MarketError, Result};
pub use ids::{
    DiscountCodeId, IdError, PaymentId, PurchaseId, ToolId, UserId, ValidationId,
};
pub use license::{is_key_format, mint_key, KEY_LENGTH};
pub use payment::{Payment, PaymentStatus, PaymentType};
pub use purchase::{Purchase, DEFAULT_KEY_VALIDITY_DAYS};
pub use tool::Tool;
pub use user::User;
pub use validation::KeyValidation;
