pub mod operations;
pub mod relation_service;
pub mod soft_delete_service;

pub use operations::{
    destroy_related, parse_id, restore_related, restore_resource, show_related, show_resource, RelationRequest,
    ResourceRequest,
};
pub use relation_service::{RelatedLookup, RelationError, RelationResolver, ResolvedRelation};
pub use soft_delete_service::SoftDeleteService;
