use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::AppState;
use crate::handlers::RecordQuery;
use crate::middleware::{ApiResponse, ApiResult, MaybePrincipal};
use crate::services::{show_resource, ResourceRequest};

/// GET /api/:collection/:id - show single record by id
pub async fn get(
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

    let data = show_resource(&state, principal.principal(), request, query.with_trashed).await?;
    Ok(ApiResponse::success(data))
}
