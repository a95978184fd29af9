//! The three static documents that make up the Schema Resume standard.
//!
//! Copies are compiled into the crate; callers load them once with
//! [`SchemaBundle::embedded`] (or supply their own bytes) and hand the bundle
//! to [`Validator::from_bundle`](crate::Validator::from_bundle).

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{ResumeSchemaError, Result};

pub const SCHEMA_JSON: &[u8] = include_bytes!("../schemas/schema.json");
pub const META_SCHEMA_JSON: &[u8] = include_bytes!("../schemas/meta-schema.json");
pub const CONTEXT_JSONLD: &[u8] = include_bytes!("../schemas/context.jsonld");

/// Parsed schema, meta-schema and JSON-LD context.
///
/// The meta-schema and context are carried for consumers; validation only
/// uses the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaBundle {
    schema: Value,
    meta_schema: Value,
    context: Value,
}

impl SchemaBundle {
    pub fn embedded() -> Result<Self> {
        Self::from_slices(SCHEMA_JSON, META_SCHEMA_JSON, CONTEXT_JSONLD)
    }

    #[instrument(skip_all, fields(
        schema_len = schema.len(),
        meta_schema_len = meta_schema.len(),
        context_len = context.len()
    ))]
    pub fn from_slices(schema: &[u8], meta_schema: &[u8], context: &[u8]) -> Result<Self> {
        let schema: Value = serde_json::from_slice(schema)
            .map_err(|e| ResumeSchemaError::schema_parse(format!("not well-formed JSON: {e}")))?;
        if !schema.is_object() {
            return Err(ResumeSchemaError::schema_parse("schema document must be an object"));
        }

        let meta_schema = parse_object("meta-schema", meta_schema)?;
        let context = parse_object("context", context)?;

        debug!(
            schema_id = ?schema.get("$id"),
            version = ?schema.get("version"),
            "Schema bundle loaded"
        );

        Ok(Self {
            schema,
            meta_schema,
            context,
        })
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn meta_schema(&self) -> &Value {
        &self.meta_schema
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    /// The schema's `version` field, when present
    pub fn version(&self) -> Option<&str> {
        self.schema.get("version").and_then(Value::as_str)
    }
}

fn parse_object(document: &'static str, raw: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(raw).map_err(|e| ResumeSchemaError::BundleParse {
        document,
        reason: e.to_string(),
    })?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(ResumeSchemaError::BundleParse {
            document,
            reason: "expected a JSON object".to_string(),
        })
    }
}
