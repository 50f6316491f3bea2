use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::AppState;
use crate::handlers::RecordQuery;
use crate::middleware::{ApiResponse, ApiResult, MaybePrincipal};
use crate::services::{restore_resource, ResourceRequest};

/// POST /api/:collection/:id/restore - restore a soft-deleted record
pub async fn post(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Path((collection, id)): Path<(String, String)>,
    query: RecordQuery,
) -> ApiResult<Value> {
    let request = ResourceRequest {
        collection: &collection,
        id: &id,
        include: &query.include,
    };

    let data = restore_resource(&state, principal.principal(), request).await?;
    Ok(ApiResponse::success(data))
}
