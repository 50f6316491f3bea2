pub mod auth;
pub mod response;

pub use auth::{principal_middleware, MaybePrincipal};
pub use response::{ApiResponse, ApiResult, IntoApiResponse};
