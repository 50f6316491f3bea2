pub mod composer;
pub mod resolver;
pub mod transformer;

pub use composer::{parse_includes, ComposeError, ResponseComposer};
pub use resolver::{ComponentsResolver, StandardComponentsResolver};
pub use transformer::{DefaultTransformer, OnlyFieldsTransformer, ResourceTransformer};
