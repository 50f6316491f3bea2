// Route tiers:
//   public     - service banner and health probe
//   resources  - /{collection}/{id}[/restore]
//   relations  - /{collection}/{id}/{relation}/{related}[/restore]
pub mod public;
pub mod relations;
pub mod resources;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Query parameters shared by every record endpoint.
///
/// `include` may be sent as a comma separated value, repeated
/// (`include=a&include=b`) or in bracket form (`include[]=a`, `include[0]=a`);
/// every occurrence is kept and split later.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordQuery {
    pub include: Vec<String>,
    pub with_trashed: bool,
    pub force: bool,
}

impl RecordQuery {
    pub fn parse(query: &str) -> Result<Self, ApiError> {
        let mut parsed = RecordQuery::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match base_key(&key) {
                "include" => parsed.include.push(value.into_owned()),
                "with_trashed" => parsed.with_trashed = parse_flag("with_trashed", &value)?,
                "force" => parsed.force = parse_flag("force", &value)?,
                _ => {}
            }
        }

        Ok(parsed)
    }
}

/// `include[]` and `include[3]` both name `include`
fn base_key(key: &str) -> &str {
    match key.find('[') {
        Some(open) if key.ends_with(']') => &key[..open],
        _ => key,
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ApiError> {
    match value {
        "" | "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "Query parameter '{}' must be true or false, got '{}'",
            name, other
        ))),
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RecordQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        RecordQuery::parse(parts.uri.query().unwrap_or_default())
    }
}
