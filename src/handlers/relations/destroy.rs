use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::AppState;
use crate::handlers::RecordQuery;
use crate::middleware::{ApiResponse, ApiResult, MaybePrincipal};
use crate::services::{destroy_related, RelationRequest};

/// DELETE /api/:collection/:id/:relation/:related - trash, or with `force=true` remove, a related row
pub async fn delete(
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

    let data = destroy_related(&state, principal.principal(), request, query.force).await?;
    Ok(ApiResponse::success(data))
}
