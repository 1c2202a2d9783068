//! Catalog tool types for toolmart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ToolId;

/// A software tool listed in the catalog.
///
/// Tools are soft-deleted by clearing `is_active`; the row stays so that
/// existing purchases keep resolving.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// The tool ID.
    pub id: ToolId,

    /// Display name.
    pub name: String,

    /// Price in cents at the time of listing.
    pub price_cents: i64,

    /// Whether the tool is purchasable. `false` means soft-deleted.
    pub is_active: bool,

    /// Number of catalog detail views.
    pub view_count: u64,

    /// When the tool was listed.
    pub created_at: DateTime<Utc>,

    /// When the tool was last edited.
    pub updated_at: DateTime<Utc>,
}

impl Tool {
    /// Create a new active tool.
    #[must_use]
    pub fn new(name: String, price_cents: i64) -> Self {
        let now = Utc::now();
        Self {
            id: ToolId::generate(),
            name,
            price_cents,
            is_active: true,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record one catalog detail view.
    pub fn record_view(&mut self) {
        self.view_count += 1;
    }
}
