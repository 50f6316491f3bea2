pub mod definition;
pub mod record;

pub use definition::{ModelDefinition, ModelRegistry, RelationDef, RelationKind};
pub use record::{keys_match, Record, RecordError, SoftDeleteState, DELETED_AT};
