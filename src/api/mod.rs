pub mod registrar;
pub mod state;

pub use registrar::{EndpointTable, RegistrationError, RelationEndpoint, ResourceEndpoint, ResourceRegistrar};
pub use state::{AppState, AppStateBuilder};
