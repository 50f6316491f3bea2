use std::sync::Arc;

use crate::api::registrar::{EndpointTable, RegistrationError, ResourceRegistrar};
use crate::config::AppConfig;
use crate::model::{ModelDefinition, ModelRegistry};
use crate::observer::{Observer, ObserverPipeline};
use crate::policy::{Gate, Policy};
use crate::resource::{ComponentsResolver, ResponseComposer, StandardComponentsResolver};
use crate::services::{RelationResolver, SoftDeleteService};
use crate::store::RecordStore;

/// Everything a request handler needs, shared across requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub models: Arc<ModelRegistry>,
    pub endpoints: Arc<EndpointTable>,
    pub store: Arc<dyn RecordStore>,
    pub gate: Arc<Gate>,
    pub components: Arc<dyn ComponentsResolver>,
    pub observers: Arc<ObserverPipeline>,
}

impl AppState {
    pub fn builder(config: AppConfig, store: Arc<dyn RecordStore>) -> AppStateBuilder {
        AppStateBuilder {
            gate: Gate::new(config.security.require_authorization),
            config,
            store,
            models: ModelRegistry::new(),
            registrar: ResourceRegistrar::new(),
            components: None,
            observers: ObserverPipeline::new(),
        }
    }

    pub fn resolver(&self) -> RelationResolver<'_> {
        RelationResolver::new(&self.models, self.store.as_ref())
    }

    pub fn soft_deletes(&self) -> SoftDeleteService<'_> {
        SoftDeleteService::new(self.store.as_ref(), &self.observers)
    }

    pub fn composer(&self) -> ResponseComposer<'_> {
        ResponseComposer::new(&self.models, self.store.as_ref(), self.components.as_ref())
    }
}

pub struct AppStateBuilder {
    config: AppConfig,
    store: Arc<dyn RecordStore>,
    models: ModelRegistry,
    registrar: ResourceRegistrar,
    gate: Gate,
    components: Option<Arc<dyn ComponentsResolver>>,
    observers: ObserverPipeline,
}

impl AppStateBuilder {
    pub fn model(mut self, model: ModelDefinition) -> Self {
        self.models.register(model);
        self
    }

    pub fn resource(mut self, collection: &str, model: &str) -> Self {
        self.registrar.resource(collection, model);
        self
    }

    pub fn relation_resource(mut self, collection: &str, relation: &str) -> Self {
        self.registrar.relation_resource(collection, relation);
        self
    }

    pub fn belongs_to_resource(mut self, collection: &str, relation: &str) -> Self {
        self.registrar.belongs_to_resource(collection, relation);
        self
    }

    pub fn policy(mut self, model: &str, policy: impl Policy + 'static) -> Self {
        self.gate.policy(model, policy);
        self
    }

    pub fn components(mut self, resolver: impl ComponentsResolver + 'static) -> Self {
        self.components = Some(Arc::new(resolver));
        self
    }

    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observers.register(observer);
        self
    }

    pub fn build(self) -> Result<AppState, RegistrationError> {
        let endpoints = self.registrar.build(&self.models)?;
        let components = self
            .components
            .unwrap_or_else(|| Arc::new(StandardComponentsResolver::new()));

        tracing::info!(
            "API state ready: {} relation endpoint(s), store={}, require_authorization={}",
            endpoints.relations().count(),
            self.store.backend(),
            self.gate.requires_authorization()
        );

        Ok(AppState {
            config: Arc::new(self.config),
            models: Arc::new(self.models),
            endpoints: Arc::new(endpoints),
            store: self.store,
            gate: Arc::new(self.gate),
            components,
            observers: Arc::new(self.observers),
        })
    }
}
