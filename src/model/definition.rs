use std::collections::HashMap;

use crate::store::TrashedScope;

/// How a relation links the owning model to its related model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// Owner holds `foreign_key`, matched against the related `owner_key`
    BelongsTo { foreign_key: String, owner_key: String },
    /// Related rows hold `foreign_key`, matched against the owner `local_key`
    HasOne { foreign_key: String, local_key: String },
    HasMany { foreign_key: String, local_key: String },
    /// Rows of `pivot_table` link owner ids to related ids
    BelongsToMany {
        pivot_table: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
    },
}

impl RelationKind {
    pub fn belongs_to(foreign_key: impl Into<String>) -> Self {
        RelationKind::BelongsTo {
            foreign_key: foreign_key.into(),
            owner_key: "id".to_string(),
        }
    }

    pub fn has_one(foreign_key: impl Into<String>) -> Self {
        RelationKind::HasOne {
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
        }
    }

    pub fn has_many(foreign_key: impl Into<String>) -> Self {
        RelationKind::HasMany {
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
        }
    }

    pub fn belongs_to_many(
        pivot_table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        RelationKind::BelongsToMany {
            pivot_table: pivot_table.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
        }
    }

    /// Whether the relation yields a single row
    pub fn is_singular(&self) -> bool {
        matches!(self, RelationKind::BelongsTo { .. } | RelationKind::HasOne { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: String,
    pub related: String,
    pub kind: RelationKind,
    /// Can be embedded through `?include=`
    pub includable: bool,
}

#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    pub table: String,
    pub soft_deletes: bool,
    relations: HashMap<String, RelationDef>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            soft_deletes: false,
            relations: HashMap::new(),
        }
    }

    /// Store rows under a table name other than the model name
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn soft_deletes(mut self) -> Self {
        self.soft_deletes = true;
        self
    }

    pub fn relation(mut self, name: impl Into<String>, related: impl Into<String>, kind: RelationKind) -> Self {
        let name = name.into();
        self.relations.insert(
            name.clone(),
            RelationDef {
                name,
                related: related.into(),
                kind,
                includable: true,
            },
        );
        self
    }

    /// Declare a relation that resolves but is never embedded via includes
    pub fn hidden_relation(self, name: impl Into<String>, related: impl Into<String>, kind: RelationKind) -> Self {
        let name = name.into();
        let mut this = self.relation(name.clone(), related, kind);
        if let Some(rel) = this.relations.get_mut(&name) {
            rel.includable = false;
        }
        this
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.values()
    }

    /// Scope used when reading rows that the caller did not ask to see trashed
    pub fn default_scope(&self) -> TrashedScope {
        if self.soft_deletes {
            TrashedScope::Exclude
        } else {
            TrashedScope::Include
        }
    }
}

/// Startup-populated lookup of model definitions by name
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDefinition>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: ModelDefinition) -> &mut Self {
        tracing::debug!("Registered model '{}' (table '{}')", model.name, model.table);
        self.models.insert(model.name.clone(), model);
        self
    }

    pub fn with(mut self, model: ModelDefinition) -> Self {
        self.register(model);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.get(name)
    }

    /// Look up a relation together with the model it points at
    pub fn relation_target(&self, model: &str, relation: &str) -> Option<(&RelationDef, &ModelDefinition)> {
        let rel = self.get(model)?.get_relation(relation)?;
        let target = self.get(&rel.related)?;
        Some((rel, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with(
                ModelDefinition::new("posts")
                    .soft_deletes()
                    .relation("category", "categories", RelationKind::belongs_to("category_id"))
                    .hidden_relation("audits", "audits", RelationKind::has_many("post_id")),
            )
            .with(ModelDefinition::new("categories").soft_deletes())
    }

    #[test]
    fn resolves_relation_target() {
        let reg = registry();
        let (rel, target) = reg.relation_target("posts", "category").unwrap();
        assert_eq!(rel.related, "categories");
        assert!(target.soft_deletes);
        assert!(rel.kind.is_singular());
    }

    #[test]
    fn dangling_relation_has_no_target() {
        let reg = registry();
        assert!(reg.relation_target("posts", "audits").is_none());
        assert!(!reg.get("posts").unwrap().get_relation("audits").unwrap().includable);
    }

    #[test]
    fn default_scope_follows_soft_deletes() {
        assert_eq!(ModelDefinition::new("users").default_scope(), TrashedScope::Include);
        assert_eq!(ModelDefinition::new("posts").soft_deletes().default_scope(), TrashedScope::Exclude);
    }
}
