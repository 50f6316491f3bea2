use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::AppState;
use crate::handlers::RecordQuery;
use crate::middleware::{ApiResponse, ApiResult, MaybePrincipal};
use crate::services::{restore_related, RelationRequest};

/// POST /api/:collection/:id/:relation/:related/restore - restore a soft-deleted related row
pub async fn post(
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

    let data = restore_related(&state, principal.principal(), request).await?;
    Ok(ApiResponse::success(data))
}
