// Model lifecycle observers notified after soft-delete state changes

pub mod error;
pub mod pipeline;
pub mod traits;

pub use error::ObserverError;
pub use pipeline::{DispatchReport, ObserverPipeline};
pub use traits::{EventKind, Observer, RecordEvent};
