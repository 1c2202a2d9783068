//! Authentication extractors.
//!
//! Session handling lives in the out-of-scope web layer; this module only
//! provides the `AdminUser` extractor that gates privileged endpoints on
//! the `is_admin` capability flag. The calling layer identifies the acting
//! admin via the `x-admin-id` header.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use toolmart_core::{User, UserId};
use toolmart_store::Store;

use crate::error::ApiError;
use crate::state::AppState;

/// Header carrying the acting admin's user ID.
pub const ADMIN_ID_HEADER: &str = "x-admin-id";

/// An admin user resolved from the `x-admin-id` header.
///
/// Rejects with `Unauthorized` when the header is missing or doesn't
/// resolve to a user, and with `Forbidden` when the user exists but lacks
/// the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser {
    /// The resolved admin user record.
    pub user: User,
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Self, Self::Rejection>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get(ADMIN_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<UserId>().ok())
                .ok_or(ApiError::Unauthorized)?;

            let user = state
                .store
                .get_user(&user_id)?
                .ok_or(ApiError::Unauthorized)?;

            if !user.is_admin {
                return Err(ApiError::Forbidden);
            }

            Ok(AdminUser { user })
        })
    }
}
