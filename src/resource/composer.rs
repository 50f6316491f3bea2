use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::model::{ModelDefinition, ModelRegistry, Record};
use crate::resource::resolver::ComponentsResolver;
use crate::services::relation_service::{RelationError, RelationResolver};
use crate::store::RecordStore;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Relation '{0}' cannot be included")]
    InvalidInclude(String),

    #[error("At most {max} relations may be included")]
    TooManyIncludes { max: usize },

    #[error(transparent)]
    Relation(#[from] RelationError),
}

/// Parse `include` values against a model's relations. Each value may itself
/// be a comma separated list. Blank entries and duplicates are dropped; order
/// is preserved.
pub fn parse_includes<S: AsRef<str>>(
    raw: &[S],
    model: &ModelDefinition,
    models: &ModelRegistry,
    max: usize,
) -> Result<Vec<String>, ComposeError> {
    let mut names: Vec<String> = Vec::new();
    for name in raw
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if names.iter().any(|n| n == name) {
            continue;
        }
        let includable = model
            .get_relation(name)
            .map(|rel| rel.includable && models.get(&rel.related).is_some())
            .unwrap_or(false);
        if !includable {
            return Err(ComposeError::InvalidInclude(name.to_string()));
        }
        names.push(name.to_string());
    }

    if names.len() > max {
        return Err(ComposeError::TooManyIncludes { max });
    }
    Ok(names)
}

/// Renders a row through its transformer and embeds requested relations
pub struct ResponseComposer<'a> {
    models: &'a ModelRegistry,
    store: &'a dyn RecordStore,
    components: &'a dyn ComponentsResolver,
}

impl<'a> ResponseComposer<'a> {
    pub fn new(models: &'a ModelRegistry, store: &'a dyn RecordStore, components: &'a dyn ComponentsResolver) -> Self {
        Self {
            models,
            store,
            components,
        }
    }

    pub async fn compose(&self, model: &ModelDefinition, record: &Record, includes: &[String]) -> Result<Value, ComposeError> {
        let transformer = self.components.resolve_resource(model);
        let mut body = transformer.transform(model, record);

        let loaded = self.load_includes(model, record, includes).await?;
        for (name, value) in loaded {
            body.insert(name, value);
        }

        Ok(Value::Object(body))
    }

    async fn load_includes(
        &self,
        model: &ModelDefinition,
        record: &Record,
        includes: &[String],
    ) -> Result<HashMap<String, Value>, ComposeError> {
        let resolver = RelationResolver::new(self.models, self.store);
        let mut loaded = HashMap::with_capacity(includes.len());

        for name in includes {
            let relation = model
                .get_relation(name)
                .filter(|rel| rel.includable)
                .ok_or_else(|| ComposeError::InvalidInclude(name.clone()))?;
            let rows = resolver.load(record, relation).await?;

            let value = if relation.kind.is_singular() {
                rows.first().map(Record::to_value).unwrap_or(Value::Null)
            } else {
                Value::Array(rows.iter().map(Record::to_value).collect())
            };
            tracing::debug!("Included '{}' on {} {}", name, model.name, record.id);
            loaded.insert(name.clone(), value);
        }

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationKind, SoftDeleteState};
    use crate::resource::resolver::StandardComponentsResolver;
    use crate::resource::transformer::OnlyFieldsTransformer;
    use crate::store::MemoryStore;
    use serde_json::{json, Map};

    fn attrs(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn registry() -> ModelRegistry {
        ModelRegistry::new()
            .with(
                ModelDefinition::new("categories")
                    .soft_deletes()
                    .relation("posts", "posts", RelationKind::has_many("category_id"))
                    .hidden_relation("drafts", "posts", RelationKind::has_many("category_id")),
            )
            .with(
                ModelDefinition::new("posts")
                    .soft_deletes()
                    .relation("category", "categories", RelationKind::belongs_to("category_id")),
            )
    }

    #[test]
    fn parses_and_dedupes_includes() {
        let models = registry();
        let categories = models.get("categories").unwrap();

        let names = parse_includes(&[" posts , ,posts", "posts"], categories, &models, 5).unwrap();
        assert_eq!(names, vec!["posts".to_string()]);
        assert!(parse_includes::<String>(&[], categories, &models, 5).unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_hidden_and_excess_includes() {
        let models = registry();
        let categories = models.get("categories").unwrap();

        assert!(matches!(
            parse_includes(&["authors"], categories, &models, 5),
            Err(ComposeError::InvalidInclude(name)) if name == "authors"
        ));
        assert!(parse_includes(&["posts", "drafts"], categories, &models, 5).is_err());
        assert!(matches!(
            parse_includes(&["posts"], categories, &models, 0),
            Err(ComposeError::TooManyIncludes { max: 0 })
        ));
    }

    #[tokio::test]
    async fn embeds_has_many_and_belongs_to_includes() {
        let store = MemoryStore::new();
        let models = registry();
        let components = StandardComponentsResolver::new();
        let category = store
            .insert("categories", attrs(json!({"name": "News"})), Some(SoftDeleteState::Active))
            .await
            .unwrap();
        let post = store
            .insert("posts", attrs(json!({"title": "hi", "category_id": category.id})), Some(SoftDeleteState::Active))
            .await
            .unwrap();

        let composer = ResponseComposer::new(&models, &store, &components);

        let body = composer
            .compose(models.get("categories").unwrap(), &category, &["posts".to_string()])
            .await
            .unwrap();
        assert_eq!(body["name"], json!("News"));
        assert_eq!(body["posts"], json!([post.to_value()]));

        let body = composer
            .compose(models.get("posts").unwrap(), &post, &["category".to_string()])
            .await
            .unwrap();
        assert_eq!(body["category"], category.to_value());
    }

    #[tokio::test]
    async fn custom_transformer_shapes_body() {
        let store = MemoryStore::new();
        let models = registry();
        let components = StandardComponentsResolver::new().resource("categories", OnlyFieldsTransformer::new(["name"]));
        let category = store
            .insert("categories", attrs(json!({"name": "News", "slug": "news"})), Some(SoftDeleteState::Active))
            .await
            .unwrap();

        let body = ResponseComposer::new(&models, &store, &components)
            .compose(models.get("categories").unwrap(), &category, &[])
            .await
            .unwrap();

        assert_eq!(body, json!({"id": category.id, "name": "News"}));
    }
}
