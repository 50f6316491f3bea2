use serde_json::Value;
use thiserror::Error;

use crate::model::{keys_match, ModelDefinition, ModelRegistry, Record, RelationDef, RelationKind};
use crate::store::{RecordStore, StoreError, TrashedScope};

#[derive(Debug, Error)]
pub enum RelationError {
    #[error("Model '{0}' is not registered")]
    UnknownModel(String),

    #[error("{model} {id} not found")]
    ParentNotFound { model: String, id: i64 },

    #[error("Relation '{relation}' is not defined on {model}")]
    UnknownRelation { model: String, relation: String },

    #[error("Relation '{relation}' targets {related}, which does not support soft deletes")]
    NotSoftDeletable { relation: String, related: String },

    #[error("{related} {id} not found through relation '{relation}'")]
    RelatedNotFound { relation: String, related: String, id: i64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A parent row and one row reached through one of its relations
#[derive(Debug, Clone)]
pub struct ResolvedRelation<'a> {
    pub parent_model: &'a ModelDefinition,
    pub parent: Record,
    pub relation: &'a RelationDef,
    pub related_model: &'a ModelDefinition,
    pub related: Record,
}

/// What a relation lookup must satisfy beyond association with the parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelatedLookup {
    pub scope: TrashedScope,
    pub require_soft_deletes: bool,
}

impl RelatedLookup {
    pub fn live() -> Self {
        Self {
            scope: TrashedScope::Exclude,
            require_soft_deletes: false,
        }
    }

    pub fn with_trashed() -> Self {
        Self {
            scope: TrashedScope::Include,
            require_soft_deletes: false,
        }
    }

    /// Trashed rows included, and the target must be soft-deletable
    pub fn restorable() -> Self {
        Self {
            scope: TrashedScope::Include,
            require_soft_deletes: true,
        }
    }
}

pub struct RelationResolver<'a> {
    models: &'a ModelRegistry,
    store: &'a dyn RecordStore,
}

impl<'a> RelationResolver<'a> {
    pub fn new(models: &'a ModelRegistry, store: &'a dyn RecordStore) -> Self {
        Self { models, store }
    }

    pub fn model(&self, name: &str) -> Result<&'a ModelDefinition, RelationError> {
        self.models
            .get(name)
            .ok_or_else(|| RelationError::UnknownModel(name.to_string()))
    }

    /// Fetch a top-level row, excluding trashed rows unless the scope admits them
    pub async fn find(&self, model: &ModelDefinition, id: i64, scope: TrashedScope) -> Result<Option<Record>, RelationError> {
        let scope = if model.soft_deletes { scope } else { TrashedScope::Include };
        Ok(self.store.find(&model.table, id, scope).await?)
    }

    pub async fn resolve(
        &self,
        parent_model: &str,
        parent_id: i64,
        relation: &str,
        related_id: i64,
        lookup: RelatedLookup,
    ) -> Result<ResolvedRelation<'a>, RelationError> {
        let parent_model = self.model(parent_model)?;
        let parent = self
            .store
            .find(&parent_model.table, parent_id, parent_model.default_scope())
            .await?
            .ok_or_else(|| RelationError::ParentNotFound {
                model: parent_model.name.clone(),
                id: parent_id,
            })?;
        tracing::debug!("Resolved parent {} {}", parent_model.name, parent_id);

        let relation_def = parent_model
            .get_relation(relation)
            .ok_or_else(|| RelationError::UnknownRelation {
                model: parent_model.name.clone(),
                relation: relation.to_string(),
            })?;
        let related_model = self.model(&relation_def.related)?;
        if lookup.require_soft_deletes && !related_model.soft_deletes {
            return Err(RelationError::NotSoftDeletable {
                relation: relation.to_string(),
                related: related_model.name.clone(),
            });
        }

        let not_found = || RelationError::RelatedNotFound {
            relation: relation.to_string(),
            related: related_model.name.clone(),
            id: related_id,
        };

        let scope = if related_model.soft_deletes { lookup.scope } else { TrashedScope::Include };
        let related = self
            .store
            .find(&related_model.table, related_id, scope)
            .await?
            .ok_or_else(not_found)?;

        if !self.is_associated(&parent, &relation_def.kind, &related).await? {
            tracing::debug!(
                "{} {} is not associated with {} {} through '{}'",
                related_model.name,
                related_id,
                parent_model.name,
                parent_id,
                relation
            );
            return Err(not_found());
        }

        Ok(ResolvedRelation {
            parent_model,
            parent,
            relation: relation_def,
            related_model,
            related,
        })
    }

    async fn is_associated(&self, parent: &Record, kind: &RelationKind, related: &Record) -> Result<bool, StoreError> {
        let linked = match kind {
            RelationKind::BelongsTo { foreign_key, owner_key } => {
                match (parent.key_value(foreign_key), related.key_value(owner_key)) {
                    (Some(fk), Some(owner)) => keys_match(&fk, &owner),
                    _ => false,
                }
            }
            RelationKind::HasOne { foreign_key, local_key } | RelationKind::HasMany { foreign_key, local_key } => {
                match (related.key_value(foreign_key), parent.key_value(local_key)) {
                    (Some(fk), Some(local)) => keys_match(&fk, &local),
                    _ => false,
                }
            }
            RelationKind::BelongsToMany {
                pivot_table,
                foreign_pivot_key,
                related_pivot_key,
            } => {
                let pivots = self
                    .store
                    .find_by(pivot_table, foreign_pivot_key, &Value::from(parent.id), TrashedScope::Include)
                    .await?;
                let related_id = Value::from(related.id);
                pivots
                    .iter()
                    .filter_map(|p| p.key_value(related_pivot_key))
                    .any(|v| keys_match(&v, &related_id))
            }
        };
        Ok(linked)
    }

    /// Every row reachable from `owner` through `relation`, trashed rows excluded
    pub async fn load(&self, owner: &Record, relation: &RelationDef) -> Result<Vec<Record>, RelationError> {
        let target = self.model(&relation.related)?;
        let scope = target.default_scope();

        let rows = match &relation.kind {
            RelationKind::BelongsTo { foreign_key, owner_key } => match owner.key_value(foreign_key) {
                None => Vec::new(),
                Some(fk) if owner_key == "id" => match fk.as_i64().or_else(|| fk.as_str().and_then(|s| s.parse().ok())) {
                    Some(id) => self.store.find(&target.table, id, scope).await?.into_iter().collect(),
                    None => Vec::new(),
                },
                Some(fk) => self.store.find_by(&target.table, owner_key, &fk, scope).await?,
            },
            RelationKind::HasOne { foreign_key, local_key } | RelationKind::HasMany { foreign_key, local_key } => {
                match owner.key_value(local_key) {
                    Some(local) => self.store.find_by(&target.table, foreign_key, &local, scope).await?,
                    None => Vec::new(),
                }
            }
            RelationKind::BelongsToMany {
                pivot_table,
                foreign_pivot_key,
                related_pivot_key,
            } => {
                let pivots = self
                    .store
                    .find_by(pivot_table, foreign_pivot_key, &Value::from(owner.id), TrashedScope::Include)
                    .await?;
                let mut rows = Vec::with_capacity(pivots.len());
                for id in pivots.iter().filter_map(|p| p.key_value(related_pivot_key)).filter_map(|v| v.as_i64()) {
                    if let Some(row) = self.store.find(&target.table, id, scope).await? {
                        rows.push(row);
                    }
                }
                rows
            }
        };

        Ok(rows)
    }
}
