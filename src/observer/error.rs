use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("Observer '{observer}' failed: {message}")]
    Failed { observer: String, message: String },

    #[error("Observer '{observer}' timed out after {millis}ms")]
    Timeout { observer: String, millis: u128 },
}

impl ObserverError {
    pub fn failed(observer: &str, message: impl Into<String>) -> Self {
        ObserverError::Failed {
            observer: observer.to_string(),
            message: message.into(),
        }
    }
}
