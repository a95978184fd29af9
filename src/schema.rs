//! Compiled form of a JSON Schema document.
//!
//! Only the Draft-07 vocabulary needed for resume documents is understood:
//! `type`, `properties`, `required`, `additionalProperties` (boolean form),
//! `items`, `enum`, `format`, `pattern`, numeric and length bounds, and the
//! `allOf`/`anyOf`/`oneOf` combinators. Local `$ref`s are inlined while
//! compiling, so the resulting tree never contains cycles.
//!
//! Compilation is permissive: a constraint holding a value of the wrong
//! JSON type is ignored instead of rejected, and keywords outside the
//! vocabulary are kept in [`SchemaNode::extra`] without affecting validation.

use std::cell::Cell;
use std::fmt;

use regex::Regex;
use serde_json::{Map, Number, Value};
use tracing::{debug, instrument, trace, warn};

use crate::error::{ResumeSchemaError, Result};

/// Depth used when no explicit bound is configured
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Compiled node count used when no explicit bound is configured
pub const DEFAULT_MAX_NODES: usize = 10_000;

/// Bounds applied while compiling. Inlined `$ref` targets count toward both,
/// so a schema referencing the same definition from many places grows
/// against `max_nodes` even when it stays shallow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaLimits {
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Primitive JSON Schema type tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Null => "null",
        }
    }

    /// Whether `value` has this runtime kind. `number` accepts integers;
    /// `integer` accepts any number without a fractional part.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => is_whole_number(value),
            Self::Boolean => value.is_boolean(),
            Self::Null => value.is_null(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn is_whole_number(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => true,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0),
        _ => false,
    }
}

/// Constraints applied when the instance is an object
#[derive(Debug, Clone, Default)]
pub struct ObjectRules {
    /// Declared properties in schema order
    pub properties: Vec<(String, SchemaNode)>,
    pub required: Vec<String>,
    /// `Some(false)` closes the object to undeclared keys
    pub additional_properties: Option<bool>,
}

impl ObjectRules {
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties
            .iter()
            .find(|(declared, _)| declared == name)
            .map(|(_, node)| node)
    }
}

/// Constraints applied when the instance is an array
#[derive(Debug, Clone, Default)]
pub struct ArrayRules {
    pub items: Option<Box<SchemaNode>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// Constraints applied when the instance is a string
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub format: Option<String>,
}

/// Constraints applied when the instance is a number
#[derive(Debug, Clone, Default)]
pub struct NumberRules {
    pub minimum: Option<Number>,
    pub maximum: Option<Number>,
}

/// One schema or sub-schema
#[derive(Debug, Clone, Default)]
pub struct SchemaNode {
    /// `None` accepts any kind. An empty list accepts nothing (the `false` schema).
    pub types: Option<Vec<SchemaType>>,
    pub enum_values: Option<Vec<Value>>,
    pub object: ObjectRules,
    pub array: ArrayRules,
    pub string: StringRules,
    pub number: NumberRules,
    pub all_of: Vec<SchemaNode>,
    pub any_of: Vec<SchemaNode>,
    pub one_of: Vec<SchemaNode>,
    /// Keywords outside the supported vocabulary, kept verbatim
    pub extra: Map<String, Value>,
}

impl SchemaNode {
    /// Node accepting every value
    pub fn any() -> Self {
        Self::default()
    }

    /// Node rejecting every value
    pub fn nothing() -> Self {
        Self {
            types: Some(Vec::new()),
            ..Self::default()
        }
    }
}

/// A compiled schema document
#[derive(Debug, Clone)]
pub struct SchemaModel {
    root: SchemaNode,
    id: Option<String>,
    title: Option<String>,
}

impl SchemaModel {
    pub fn parse(raw: &[u8]) -> Result<Self> {
        Self::parse_with_limits(raw, SchemaLimits::default())
    }

    #[instrument(skip(raw), fields(raw_len = raw.len()))]
    pub fn parse_with_limits(raw: &[u8], limits: SchemaLimits) -> Result<Self> {
        let document: Value = serde_json::from_slice(raw)
            .map_err(|e| ResumeSchemaError::schema_parse(format!("not well-formed JSON: {e}")))?;
        Self::from_value_with_limits(&document, limits)
    }

    pub fn from_value(document: &Value) -> Result<Self> {
        Self::from_value_with_limits(document, SchemaLimits::default())
    }

    #[instrument(skip(document))]
    pub fn from_value_with_limits(document: &Value, limits: SchemaLimits) -> Result<Self> {
        trace!("Compiling schema document");

        let compiler = Compiler {
            document,
            limits,
            nodes: Cell::new(0),
        };
        let root = compiler.compile(document, 0)?;

        let id = document.get("$id").and_then(Value::as_str).map(str::to_owned);
        let title = document
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_owned);

        debug!(id = ?id, nodes = compiler.nodes.get(), "Schema compiled");
        Ok(Self { root, id, title })
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// The document's `$id`, if declared
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

struct Compiler<'a> {
    document: &'a Value,
    limits: SchemaLimits,
    nodes: Cell<usize>,
}

impl Compiler<'_> {
    fn compile(&self, schema: &Value, depth: usize) -> Result<SchemaNode> {
        if depth > self.limits.max_depth {
            warn!(max_depth = self.limits.max_depth, "Schema nesting too deep");
            return Err(ResumeSchemaError::SchemaTooComplex {
                limit: "nesting depth",
                bound: self.limits.max_depth,
            });
        }

        let nodes = self.nodes.get() + 1;
        if nodes > self.limits.max_nodes {
            warn!(max_nodes = self.limits.max_nodes, "Schema expands to too many nodes");
            return Err(ResumeSchemaError::SchemaTooComplex {
                limit: "node count",
                bound: self.limits.max_nodes,
            });
        }
        self.nodes.set(nodes);

        let keywords = match schema {
            Value::Bool(true) => return Ok(SchemaNode::any()),
            Value::Bool(false) => return Ok(SchemaNode::nothing()),
            Value::Object(keywords) => keywords,
            other => {
                return Err(ResumeSchemaError::schema_parse(format!(
                    "schema must be an object or boolean, found {other}"
                )));
            }
        };

        // Draft-07: siblings of `$ref` are ignored
        if let Some(reference) = keywords.get("$ref") {
            return self.compile_reference(reference, depth);
        }

        let mut node = SchemaNode::default();

        for (keyword, value) in keywords {
            match keyword.as_str() {
                "type" => node.types = Some(parse_types(value)?),
                "enum" => match value {
                    Value::Array(members) => node.enum_values = Some(members.clone()),
                    _ => ignored(keyword, value),
                },
                "properties" => match value {
                    Value::Object(properties) => {
                        for (name, child) in properties {
                            let child = self.compile(child, depth + 1)?;
                            node.object.properties.push((name.clone(), child));
                        }
                    }
                    _ => ignored(keyword, value),
                },
                "required" => match value {
                    Value::Array(names) => {
                        node.object.required = names
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_owned)
                            .collect();
                    }
                    _ => ignored(keyword, value),
                },
                "additionalProperties" => match value {
                    Value::Bool(allowed) => node.object.additional_properties = Some(*allowed),
                    _ => {
                        debug!("Schema-valued additionalProperties is kept but not enforced");
                        node.extra.insert(keyword.clone(), value.clone());
                    }
                },
                "items" => match value {
                    Value::Object(_) | Value::Bool(_) => {
                        node.array.items = Some(Box::new(self.compile(value, depth + 1)?));
                    }
                    _ => {
                        debug!("Tuple-form items is kept but not enforced");
                        node.extra.insert(keyword.clone(), value.clone());
                    }
                },
                "minItems" => node.array.min_items = as_count(keyword, value),
                "maxItems" => node.array.max_items = as_count(keyword, value),
                "minLength" => node.string.min_length = as_count(keyword, value),
                "maxLength" => node.string.max_length = as_count(keyword, value),
                "pattern" => node.string.pattern = compile_pattern(value),
                "format" => match value {
                    Value::String(format) => node.string.format = Some(format.clone()),
                    _ => ignored(keyword, value),
                },
                "minimum" => node.number.minimum = as_bound(keyword, value),
                "maximum" => node.number.maximum = as_bound(keyword, value),
                "allOf" => node.all_of = self.compile_branches(keyword, value, depth)?,
                "anyOf" => node.any_of = self.compile_branches(keyword, value, depth)?,
                "oneOf" => node.one_of = self.compile_branches(keyword, value, depth)?,
                _ => {
                    node.extra.insert(keyword.clone(), value.clone());
                }
            }
        }

        Ok(node)
    }

    fn compile_branches(&self, keyword: &str, value: &Value, depth: usize) -> Result<Vec<SchemaNode>> {
        match value {
            Value::Array(branches) => branches
                .iter()
                .map(|branch| self.compile(branch, depth + 1))
                .collect(),
            _ => {
                ignored(keyword, value);
                Ok(Vec::new())
            }
        }
    }

    fn compile_reference(&self, reference: &Value, depth: usize) -> Result<SchemaNode> {
        let Some(reference) = reference.as_str() else {
            return Err(ResumeSchemaError::schema_parse("$ref must be a string"));
        };

        let Some(pointer) = reference.strip_prefix('#') else {
            return Err(ResumeSchemaError::schema_parse(format!(
                "non-local reference '{reference}' is not supported"
            )));
        };

        let target = self.document.pointer(pointer).ok_or_else(|| {
            ResumeSchemaError::schema_parse(format!("unresolved reference '{reference}'"))
        })?;

        trace!(reference, depth, "Inlining local reference");
        self.compile(target, depth + 1)
    }
}

fn parse_types(value: &Value) -> Result<Vec<SchemaType>> {
    let parse_token = |token: &Value| -> Result<SchemaType> {
        token
            .as_str()
            .and_then(SchemaType::parse)
            .ok_or_else(|| ResumeSchemaError::schema_parse(format!("unsupported type {token}")))
    };

    match value {
        Value::String(_) => Ok(vec![parse_token(value)?]),
        Value::Array(tokens) => tokens.iter().map(parse_token).collect(),
        other => Err(ResumeSchemaError::schema_parse(format!(
            "type must be a string or array of strings, found {other}"
        ))),
    }
}

fn compile_pattern(value: &Value) -> Option<Regex> {
    let source = value.as_str()?;
    match Regex::new(source) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(pattern = source, error = %e, "Ignoring pattern that does not compile");
            None
        }
    }
}

fn as_count(keyword: &str, value: &Value) -> Option<usize> {
    let count = value.as_u64().and_then(|n| usize::try_from(n).ok());
    if count.is_none() {
        ignored(keyword, value);
    }
    count
}

fn as_bound(keyword: &str, value: &Value) -> Option<Number> {
    match value {
        Value::Number(bound) => Some(bound.clone()),
        _ => {
            ignored(keyword, value);
            None
        }
    }
}

fn ignored(keyword: &str, value: &Value) {
    warn!(keyword, value = %value, "Ignoring malformed schema constraint");
}
