pub mod restore;
pub mod show;

pub use restore::post as resource_restore;
pub use show::get as resource_get;
