use std::collections::HashMap;

use thiserror::Error;

use crate::model::{ModelRegistry, RelationKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Collection '{collection}' refers to unknown model '{model}'")]
    UnknownModel { collection: String, model: String },

    #[error("Model '{model}' has no relation '{relation}'")]
    UnknownRelation { model: String, relation: String },

    #[error("Relation '{relation}' on '{model}' is not a belongs-to relation")]
    NotBelongsTo { model: String, relation: String },

    #[error("Invalid route segment '{0}'")]
    InvalidSegment(String),
}

/// `/{collection}/{id}` endpoints for one model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEndpoint {
    pub collection: String,
    pub model: String,
}

/// `/{collection}/{id}/{relation}/{related}` endpoints for one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEndpoint {
    pub collection: String,
    pub model: String,
    pub relation: String,
}

#[derive(Debug, Clone)]
enum Pending {
    Resource { collection: String, model: String },
    Relation { collection: String, relation: String, belongs_to: bool },
}

/// Collects endpoint registrations and validates them against the model
/// registry once every model is known.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistrar {
    pending: Vec<Pending>,
}

impl ResourceRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(&mut self, collection: impl Into<String>, model: impl Into<String>) -> &mut Self {
        self.pending.push(Pending::Resource {
            collection: collection.into(),
            model: model.into(),
        });
        self
    }

    /// Expose a relation of any kind under a parent collection
    pub fn relation_resource(&mut self, collection: impl Into<String>, relation: impl Into<String>) -> &mut Self {
        self.pending.push(Pending::Relation {
            collection: collection.into(),
            relation: relation.into(),
            belongs_to: false,
        });
        self
    }

    /// Expose a belongs-to relation under a parent collection
    pub fn belongs_to_resource(&mut self, collection: impl Into<String>, relation: impl Into<String>) -> &mut Self {
        self.pending.push(Pending::Relation {
            collection: collection.into(),
            relation: relation.into(),
            belongs_to: true,
        });
        self
    }

    pub fn build(&self, models: &ModelRegistry) -> Result<EndpointTable, RegistrationError> {
        let mut table = EndpointTable::default();

        for entry in &self.pending {
            if let Pending::Resource { collection, model } = entry {
                validate_segment(collection)?;
                if models.get(model).is_none() {
                    return Err(RegistrationError::UnknownModel {
                        collection: collection.clone(),
                        model: model.clone(),
                    });
                }
                table.resources.insert(
                    collection.clone(),
                    ResourceEndpoint {
                        collection: collection.clone(),
                        model: model.clone(),
                    },
                );
            }
        }

        for entry in &self.pending {
            if let Pending::Relation {
                collection,
                relation,
                belongs_to,
            } = entry
            {
                validate_segment(collection)?;
                validate_segment(relation)?;

                // parent collections without a resource registration map to the model of the same name
                let model = table
                    .resources
                    .get(collection)
                    .map(|r| r.model.clone())
                    .unwrap_or_else(|| collection.clone());
                let definition = models.get(&model).ok_or_else(|| RegistrationError::UnknownModel {
                    collection: collection.clone(),
                    model: model.clone(),
                })?;
                let relation_def = definition.get_relation(relation).ok_or_else(|| RegistrationError::UnknownRelation {
                    model: model.clone(),
                    relation: relation.clone(),
                })?;
                if models.get(&relation_def.related).is_none() {
                    return Err(RegistrationError::UnknownModel {
                        collection: collection.clone(),
                        model: relation_def.related.clone(),
                    });
                }
                if *belongs_to && !matches!(relation_def.kind, RelationKind::BelongsTo { .. }) {
                    return Err(RegistrationError::NotBelongsTo {
                        model,
                        relation: relation.clone(),
                    });
                }

                tracing::debug!("Registered relation endpoint /{}/{{id}}/{}", collection, relation);
                table.relations.insert(
                    (collection.clone(), relation.clone()),
                    RelationEndpoint {
                        collection: collection.clone(),
                        model,
                        relation: relation.clone(),
                    },
                );
            }
        }

        Ok(table)
    }
}

fn validate_segment(segment: &str) -> Result<(), RegistrationError> {
    let valid = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RegistrationError::InvalidSegment(segment.to_string()))
    }
}

/// Validated endpoint lookup used while binding requests
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    resources: HashMap<String, ResourceEndpoint>,
    relations: HashMap<(String, String), RelationEndpoint>,
}

impl EndpointTable {
    pub fn resource(&self, collection: &str) -> Option<&ResourceEndpoint> {
        self.resources.get(collection)
    }

    pub fn relation(&self, collection: &str, relation: &str) -> Option<&RelationEndpoint> {
        self.relations.get(&(collection.to_string(), relation.to_string()))
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationEndpoint> {
        self.relations.values()
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceEndpoint> {
        self.resources.values()
    }
}
