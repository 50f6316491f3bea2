use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::AppState;
use crate::handlers::RecordQuery;
use crate::middleware::{ApiResponse, ApiResult, MaybePrincipal};
use crate::services::{show_related, RelationRequest};

/// GET /api/:collection/:id/:relation/:related - show one related row
pub async fn get(
    State(state): State<AppState>,
    principal: MaybePrincipal,
    Path((collection, parent_id, relation, related_id)): Path<(String, String, String, String)>,
    query: RecordQuery,
) -> ApiResult<Value> {
    let request = RelationRequest {
        collection: &collection,
        parent_id: &parent_id,
        relation: &relation,
        related_id: &related_id,
        include: &query.include,
    };

    let data = show_related(&state, principal.principal(), request, query.with_trashed).await?;
    Ok(ApiResponse::success(data))
}
