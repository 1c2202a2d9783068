//! Key-validation log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ToolId, UserId, ValidationId};

/// One external key-check attempt.
///
/// Written for every attempt regardless of outcome; consumed by the admin
/// surface for abuse monitoring. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValidation {
    /// Unique log entry ID (ULID for time-ordering).
    pub id: ValidationId,

    /// The key that was presented. May be unknown or malformed.
    pub key_value: String,

    /// Owning user when the lookup succeeded.
    pub user_id: Option<UserId>,

    /// Purchased tool when the lookup succeeded.
    pub tool_id: Option<ToolId>,

    /// Whether the key validated.
    pub is_valid: bool,

    /// Caller IP address as reported by the validation endpoint.
    pub ip_address: String,

    /// Caller user agent.
    pub user_agent: String,

    /// When the attempt happened.
    pub created_at: DateTime<Utc>,
}

impl KeyValidation {
    /// Record a successful validation.
    #[must_use]
    pub fn success(
        key_value: String,
        user_id: UserId,
        tool_id: ToolId,
        ip_address: String,
        user_agent: String,
    ) -> Self {
        Self {
            id: ValidationId::generate(),
            key_value,
            user_id: Some(user_id),
            tool_id: Some(tool_id),
            is_valid: true,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }

    /// Record a failed validation (unknown, expired, or revoked key).
    #[must_use]
    pub fn failure(key_value: String, ip_address: String, user_agent: String) -> Self {
        Self {
            id: ValidationId::generate(),
            key_value,
            user_id: None,
            tool_id: None,
            is_valid: false,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_has_no_resolution() {
        let row = KeyValidation::failure("BOGUS".into(), "10.0.0.1".into(), "curl/8".into());
        assert!(!row.is_valid);
        assert!(row.user_id.is_none());
        assert!(row.tool_id.is_none());
    }

    #[test]
    fn success_carries_resolution() {
        let user_id = UserId::generate();
        let tool_id = ToolId::generate();
        let row = KeyValidation::success(
            "ABCDEF0123456789".into(),
            user_id,
            tool_id,
            "10.0.0.1".into(),
            "curl/8".into(),
        );
        assert!(row.is_valid);
        assert_eq!(row.user_id, Some(user_id));
        assert_eq!(row.tool_id, Some(tool_id));
    }
}
