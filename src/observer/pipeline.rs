use std::sync::Arc;
use std::time::Instant;

use tokio::time::timeout;

use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, RecordEvent};

/// Outcome of one dispatch; failures are reported, never raised
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub handled: Vec<&'static str>,
    pub errors: Vec<ObserverError>,
}

#[derive(Clone, Default)]
pub struct ObserverPipeline {
    observers: Vec<Arc<dyn Observer>>,
}

impl ObserverPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, observer: impl Observer + 'static) -> &mut Self {
        tracing::debug!("Registered observer '{}'", observer.name());
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Run every applicable observer in registration order
    pub async fn dispatch(&self, event: &RecordEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        for observer in &self.observers {
            if !observer.applies_to_model(&event.model) || !observer.applies_to_event(event.kind) {
                tracing::trace!("Observer {} skipped for {:?} on {}", observer.name(), event.kind, event.model);
                continue;
            }

            let started = Instant::now();
            match timeout(observer.timeout(), observer.handle(event)).await {
                Ok(Ok(())) => {
                    tracing::debug!(
                        "Observer: {} handled {:?} on {} {} in {:?}",
                        observer.name(),
                        event.kind,
                        event.model,
                        event.record.id,
                        started.elapsed()
                    );
                    report.handled.push(observer.name());
                }
                Ok(Err(error)) => {
                    tracing::warn!("Observer: {} failed: {}", observer.name(), error);
                    report.errors.push(error);
                }
                Err(_elapsed) => {
                    let error = ObserverError::Timeout {
                        observer: observer.name().to_string(),
                        millis: observer.timeout().as_millis(),
                    };
                    tracing::error!("{}", error);
                    report.errors.push(error);
                }
            }
        }

        report
    }
}
