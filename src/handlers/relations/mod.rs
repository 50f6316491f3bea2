pub mod destroy;
pub mod restore;
pub mod show;

pub use destroy::delete as relation_delete;
pub use restore::post as relation_restore;
pub use show::get as relation_get;
