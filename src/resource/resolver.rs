use std::collections::HashMap;
use std::sync::Arc;

use crate::model::ModelDefinition;
use crate::resource::transformer::{DefaultTransformer, ResourceTransformer};

/// Decides which transformer renders a model. Swappable per application so
/// endpoints can be given custom serialization.
pub trait ComponentsResolver: Send + Sync {
    fn resolve_resource(&self, model: &ModelDefinition) -> Arc<dyn ResourceTransformer>;
}

/// Registry lookup by model name with a fallback transformer
#[derive(Clone)]
pub struct StandardComponentsResolver {
    transformers: HashMap<String, Arc<dyn ResourceTransformer>>,
    fallback: Arc<dyn ResourceTransformer>,
}

impl Default for StandardComponentsResolver {
    fn default() -> Self {
        Self {
            transformers: HashMap::new(),
            fallback: Arc::new(DefaultTransformer),
        }
    }
}

impl StandardComponentsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource(mut self, model: impl Into<String>, transformer: impl ResourceTransformer + 'static) -> Self {
        self.transformers.insert(model.into(), Arc::new(transformer));
        self
    }
}

impl ComponentsResolver for StandardComponentsResolver {
    fn resolve_resource(&self, model: &ModelDefinition) -> Arc<dyn ResourceTransformer> {
        self.transformers
            .get(&model.name)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
