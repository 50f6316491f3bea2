use serde_json::{Map, Value};

use crate::model::{ModelDefinition, Record};

/// Turns a stored row into its external representation
pub trait ResourceTransformer: Send + Sync {
    fn transform(&self, model: &ModelDefinition, record: &Record) -> Map<String, Value>;
}

/// Exposes the row exactly as stored
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformer;

impl ResourceTransformer for DefaultTransformer {
    fn transform(&self, _model: &ModelDefinition, record: &Record) -> Map<String, Value> {
        match record.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// Exposes only a fixed set of columns (`id` is always kept)
#[derive(Debug, Clone, Default)]
pub struct OnlyFieldsTransformer {
    fields: Vec<String>,
}

impl OnlyFieldsTransformer {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResourceTransformer for OnlyFieldsTransformer {
    fn transform(&self, model: &ModelDefinition, record: &Record) -> Map<String, Value> {
        DefaultTransformer
            .transform(model, record)
            .into_iter()
            .filter(|(k, _)| k == "id" || self.fields.iter().any(|f| f == k))
            .collect()
    }
}
