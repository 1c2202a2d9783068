//! Catalog tool handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use toolmart_core::{Tool, ToolId};
use toolmart_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Tool response.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    /// Tool ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Price in cents.
    pub price_cents: i64,
    /// Whether the tool is purchasable.
    pub is_active: bool,
    /// Catalog detail views.
    pub view_count: u64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Tool> for ToolResponse {
    fn from(tool: &Tool) -> Self {
        Self {
            id: tool.id.to_string(),
            name: tool.name.clone(),
            price_cents: tool.price_cents,
            is_active: tool.is_active,
            view_count: tool.view_count,
            created_at: tool.created_at.to_rfc3339(),
        }
    }
}

/// Create tool request.
#[derive(Debug, Deserialize)]
pub struct CreateToolRequest {
    /// Display name.
    pub name: String,
    /// Price in cents.
    pub price_cents: i64,
}

/// List a new tool in the catalog (admin only).
pub async fn create_tool(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(body): Json<CreateToolRequest>,
) -> Result<Json<ToolResponse>, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".into()));
    }
    if body.price_cents < 0 {
        return Err(ApiError::InvalidAmount(body.price_cents));
    }

    let tool = Tool::new(body.name, body.price_cents);
    state.store.put_tool(&tool)?;

    tracing::info!(
        tool_id = %tool.id,
        admin_id = %admin.user.id,
        price_cents = tool.price_cents,
        "Tool listed"
    );

    Ok(Json(ToolResponse::from(&tool)))
}

/// List tools response.
#[derive(Debug, Serialize)]
pub struct ListToolsResponse {
    /// Active catalog tools, newest first.
    pub tools: Vec<ToolResponse>,
}

/// List active catalog tools.
pub async fn list_tools(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListToolsResponse>, ApiError> {
    let tools = state.store.list_tools(true)?;
    let tools = tools.iter().map(ToolResponse::from).collect();

    Ok(Json(ListToolsResponse { tools }))
}

/// Soft-delete a tool from the catalog (admin only).
pub async fn delete_tool(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(tool_id): Path<ToolId>,
) -> Result<Json<ToolResponse>, ApiError> {
    let tool = state.store.deactivate_tool(&tool_id)?;

    tracing::info!(
        tool_id = %tool.id,
        admin_id = %admin.user.id,
        "Tool deactivated"
    );

    Ok(Json(ToolResponse::from(&tool)))
}

/// Get a tool's catalog detail, bumping its view counter.
pub async fn get_tool(
    State(state): State<Arc<AppState>>,
    Path(tool_id): Path<ToolId>,
) -> Result<Json<ToolResponse>, ApiError> {
    let tool = state
        .store
        .get_tool(&tool_id)?
        .filter(|tool| tool.is_active)
        .ok_or_else(|| ApiError::NotFound(format!("tool not found: {tool_id}")))?;

    let tool = state.store.record_tool_view(&tool.id)?;

    Ok(Json(ToolResponse::from(&tool)))
}
