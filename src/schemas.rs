//! Reusable request schemas.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::body::{validate_body, BodySchema, SchemaError};

const UUID_PATTERN: &str =
    "^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

/// `{ "id": "<uuid>" }`
pub fn id_param() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": { "type": "string", "pattern": UUID_PATTERN }
        },
        "required": ["id"]
    })
}

/// `{ "page": 1.., "limit": 1..=100 }`, both optional.
pub fn pagination() -> Value {
    json!({
        "type": "object",
        "properties": {
            "page": { "type": "integer", "minimum": 1 },
            "limit": { "type": "integer", "minimum": 1, "maximum": 100 }
        }
    })
}

pub fn id_param_schema() -> Result<BodySchema, SchemaError> {
    BodySchema::compile(&id_param())
}

pub fn pagination_schema() -> Result<BodySchema, SchemaError> {
    BodySchema::compile(&pagination())
}

/// Validate pagination input, accepting `page` and `limit` as integer
/// strings (`"2"`) the way query parameters arrive.
pub fn validate_pagination(
    body: Option<Value>,
    schema: &BodySchema,
) -> Result<Pagination, ApiError> {
    let mut body = body;
    if let Some(fields) = body.as_mut().and_then(Value::as_object_mut) {
        for key in ["page", "limit"] {
            if let Some(field) = fields.get_mut(key) {
                coerce_integer(field);
            }
        }
    }
    validate_body(body, schema)
}

// Non-numeric strings are left alone so the schema reports them.
fn coerce_integer(field: &mut Value) {
    let parsed = field.as_str().and_then(|s| s.trim().parse::<i64>().ok());
    if let Some(n) = parsed {
        *field = Value::from(n);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdParam {
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}
