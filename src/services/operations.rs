use serde_json::Value;

use crate::api::{AppState, RelationEndpoint, ResourceEndpoint};
use crate::auth::Principal;
use crate::error::ApiError;
use crate::model::{ModelDefinition, Record};
use crate::policy::Ability;
use crate::resource::parse_includes;
use crate::services::relation_service::{RelatedLookup, ResolvedRelation};
use crate::store::TrashedScope;

/// Raw path and query values of a nested relation request
#[derive(Debug, Clone, Copy)]
pub struct RelationRequest<'r> {
    pub collection: &'r str,
    pub parent_id: &'r str,
    pub relation: &'r str,
    pub related_id: &'r str,
    pub include: &'r [String],
}

/// Raw path and query values of a top-level resource request
#[derive(Debug, Clone, Copy)]
pub struct ResourceRequest<'r> {
    pub collection: &'r str,
    pub id: &'r str,
    pub include: &'r [String],
}

/// A nested relation request matched against the endpoint table
struct BoundRelation<'s> {
    endpoint: &'s RelationEndpoint,
    related_model: &'s ModelDefinition,
    parent_id: i64,
    related_id: i64,
    includes: Vec<String>,
}

/// Ids are numeric; anything else cannot name a row
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::not_found(format!("{} {} not found", what, raw)))
}

fn bind_relation<'s>(state: &'s AppState, request: &RelationRequest<'_>) -> Result<BoundRelation<'s>, ApiError> {
    let endpoint = state
        .endpoints
        .relation(request.collection, request.relation)
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "No relation endpoint /{}/{{id}}/{}",
                request.collection, request.relation
            ))
        })?;

    let parent_id = parse_id(request.parent_id, &endpoint.model)?;
    let (_, related_model) = state
        .models
        .relation_target(&endpoint.model, &endpoint.relation)
        .ok_or_else(|| ApiError::not_found(format!("Relation '{}' is not defined on {}", endpoint.relation, endpoint.model)))?;
    let related_id = parse_id(request.related_id, &related_model.name)?;

    let includes = parse_includes(request.include, related_model, &state.models, state.config.api.max_includes)?;

    tracing::debug!(
        "Bound /{}/{}/{}/{} to {} -> {}",
        request.collection,
        parent_id,
        request.relation,
        related_id,
        endpoint.model,
        related_model.name
    );

    Ok(BoundRelation {
        endpoint,
        related_model,
        parent_id,
        related_id,
        includes,
    })
}

async fn resolve_bound<'s>(
    state: &'s AppState,
    bound: &BoundRelation<'s>,
    lookup: RelatedLookup,
) -> Result<ResolvedRelation<'s>, ApiError> {
    let resolved = state
        .resolver()
        .resolve(
            &bound.endpoint.model,
            bound.parent_id,
            &bound.endpoint.relation,
            bound.related_id,
            lookup,
        )
        .await?;
    Ok(resolved)
}

async fn respond(state: &AppState, model: &ModelDefinition, record: &Record, includes: &[String]) -> Result<Value, ApiError> {
    let body = state.composer().compose(model, record, includes).await?;
    Ok(body)
}

/// POST /{collection}/{parent}/{relation}/{related}/restore
pub async fn restore_related(
    state: &AppState,
    principal: Option<&Principal>,
    request: RelationRequest<'_>,
) -> Result<Value, ApiError> {
    let bound = bind_relation(state, &request)?;
    let resolved = resolve_bound(state, &bound, RelatedLookup::restorable()).await?;

    state
        .gate
        .authorize(principal, Ability::Restore, &resolved.related_model.name, &resolved.related)?;

    let restored = state.soft_deletes().restore(resolved.related_model, resolved.related).await?;
    respond(state, bound.related_model, &restored, &bound.includes).await
}

/// GET /{collection}/{parent}/{relation}/{related}
pub async fn show_related(
    state: &AppState,
    principal: Option<&Principal>,
    request: RelationRequest<'_>,
    with_trashed: bool,
) -> Result<Value, ApiError> {
    let bound = bind_relation(state, &request)?;
    let lookup = if with_trashed {
        RelatedLookup::with_trashed()
    } else {
        RelatedLookup::live()
    };
    let resolved = resolve_bound(state, &bound, lookup).await?;

    state
        .gate
        .authorize(principal, Ability::View, &resolved.related_model.name, &resolved.related)?;

    respond(state, bound.related_model, &resolved.related, &bound.includes).await
}

/// DELETE /{collection}/{parent}/{relation}/{related}
///
/// Soft-deletable targets are trashed unless `force` is set. Targets without
/// soft deletes are always removed and only need the `delete` ability.
pub async fn destroy_related(
    state: &AppState,
    principal: Option<&Principal>,
    request: RelationRequest<'_>,
    force: bool,
) -> Result<Value, ApiError> {
    let bound = bind_relation(state, &request)?;
    let soft_deletes = bound.related_model.soft_deletes;
    let lookup = if force {
        RelatedLookup::with_trashed()
    } else {
        RelatedLookup::live()
    };
    let resolved = resolve_bound(state, &bound, lookup).await?;
    let model = resolved.related_model;

    let service = state.soft_deletes();
    let record = if soft_deletes && !force {
        state.gate.authorize(principal, Ability::Delete, &model.name, &resolved.related)?;
        service.trash(model, resolved.related).await?
    } else {
        let ability = if soft_deletes { Ability::ForceDelete } else { Ability::Delete };
        state.gate.authorize(principal, ability, &model.name, &resolved.related)?;
        service.force_delete(model, resolved.related).await?
    };

    respond(state, model, &record, &bound.includes).await
}

fn bind_resource<'s>(state: &'s AppState, request: &ResourceRequest<'_>) -> Result<(&'s ModelDefinition, i64, Vec<String>), ApiError> {
    let ResourceEndpoint { model, .. } = state
        .endpoints
        .resource(request.collection)
        .ok_or_else(|| ApiError::not_found(format!("No resource endpoint /{}", request.collection)))?;
    let definition = state
        .models
        .get(model)
        .ok_or_else(|| ApiError::not_found(format!("Model '{}' is not registered", model)))?;
    let id = parse_id(request.id, &definition.name)?;
    let includes = parse_includes(request.include, definition, &state.models, state.config.api.max_includes)?;
    Ok((definition, id, includes))
}

/// GET /{collection}/{id}
pub async fn show_resource(
    state: &AppState,
    principal: Option<&Principal>,
    request: ResourceRequest<'_>,
    with_trashed: bool,
) -> Result<Value, ApiError> {
    let (model, id, includes) = bind_resource(state, &request)?;
    let scope = if with_trashed { TrashedScope::Include } else { TrashedScope::Exclude };

    let record = state
        .resolver()
        .find(model, id, scope)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", model.name, id)))?;

    state.gate.authorize(principal, Ability::View, &model.name, &record)?;
    respond(state, model, &record, &includes).await
}

/// POST /{collection}/{id}/restore
pub async fn restore_resource(
    state: &AppState,
    principal: Option<&Principal>,
    request: ResourceRequest<'_>,
) -> Result<Value, ApiError> {
    let (model, id, includes) = bind_resource(state, &request)?;
    if !model.soft_deletes {
        return Err(ApiError::not_found(format!("{} does not support soft deletes", model.name)));
    }

    let record = state
        .resolver()
        .find(model, id, TrashedScope::Include)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", model.name, id)))?;

    state.gate.authorize(principal, Ability::Restore, &model.name, &record)?;
    let restored = state.soft_deletes().restore(model, record).await?;
    respond(state, model, &restored, &includes).await
}
