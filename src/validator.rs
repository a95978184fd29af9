use std::path::Path;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::bundle::SchemaBundle;
use crate::engine::Engine;
use crate::error::Result;
use crate::field_path::FieldPath;
use crate::format::FormatRegistry;
use crate::schema::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES, SchemaLimits, SchemaModel};
use crate::validation::ValidationResult;

/// Knobs for building a [`Validator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Deepest schema nesting (counting inlined `$ref`s) accepted at construction
    pub max_depth: usize,
    /// Most schema nodes (counting every inlined `$ref` copy) accepted at construction
    pub max_nodes: usize,
    /// When false, `format` keywords are not enforced
    pub validate_formats: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            validate_formats: true,
        }
    }
}

impl ValidatorOptions {
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    fn limits(&self) -> SchemaLimits {
        SchemaLimits {
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
        }
    }
}

/// Validates documents against one compiled schema.
///
/// The compiled schema is never mutated after construction, so a single
/// validator can be shared (e.g. behind an `Arc`) by concurrent callers.
#[derive(Debug)]
pub struct Validator {
    model: SchemaModel,
    formats: FormatRegistry,
    options: ValidatorOptions,
}

impl Validator {
    pub fn new(schema: &[u8]) -> Result<Self> {
        Self::with_options(schema, ValidatorOptions::default())
    }

    pub fn with_options(schema: &[u8], options: ValidatorOptions) -> Result<Self> {
        Self::with_formats(schema, options, FormatRegistry::with_builtins())
    }

    #[instrument(skip(schema, formats), fields(schema_len = schema.len()))]
    pub fn with_formats(
        schema: &[u8],
        options: ValidatorOptions,
        formats: FormatRegistry,
    ) -> Result<Self> {
        let model = SchemaModel::parse_with_limits(schema, options.limits())?;
        Ok(Self::from_model(model, formats, options))
    }

    /// Builds from an already parsed schema document
    pub fn from_value(schema: &Value, options: ValidatorOptions) -> Result<Self> {
        let model = SchemaModel::from_value_with_limits(schema, options.limits())?;
        Ok(Self::from_model(model, FormatRegistry::with_builtins(), options))
    }

    /// Reads and compiles a schema stored on disk. A missing or unreadable
    /// file fails with `Io`.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_schema_file(path: impl AsRef<Path>, options: ValidatorOptions) -> Result<Self> {
        let raw = std::fs::read(path.as_ref()).inspect_err(|e| {
            error!(error = %e, "Schema file could not be read");
        })?;
        Self::with_options(&raw, options)
    }

    pub fn from_bundle(bundle: &SchemaBundle) -> Result<Self> {
        Self::from_value(bundle.schema(), ValidatorOptions::default())
    }

    pub fn from_model(model: SchemaModel, formats: FormatRegistry, options: ValidatorOptions) -> Self {
        debug!(schema_id = ?model.id(), formats = ?formats, "Validator ready");
        Self {
            model,
            formats,
            options,
        }
    }

    /// Checks a parsed document. Never fails: a document of the wrong shape
    /// simply yields errors.
    #[instrument(skip_all)]
    pub fn validate(&self, document: &Value) -> ValidationResult {
        info!("Starting schema validation");

        let mut errors = Vec::new();
        Engine::new(&self.formats)
            .validate_formats(self.options.validate_formats)
            .evaluate(self.model.root(), document, &FieldPath::root(), &mut errors);

        if errors.is_empty() {
            info!("Schema validation passed with no errors");
        } else {
            warn!(error_count = errors.len(), "Schema validation found errors");
        }

        ValidationResult::from_errors(errors)
    }

    /// Parses then checks raw JSON bytes.
    /// Bytes that are not JSON fail with `DocumentParse`, before any schema check.
    #[instrument(skip(self, raw), fields(raw_len = raw.len()))]
    pub fn validate_slice(&self, raw: &[u8]) -> Result<ValidationResult> {
        let document: Value = serde_json::from_slice(raw).inspect_err(|e| {
            error!(error = %e, "Document parsing failed");
        })?;
        Ok(self.validate(&document))
    }

    pub fn validate_str(&self, raw: &str) -> Result<ValidationResult> {
        self.validate_slice(raw.as_bytes())
    }

    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<ValidationResult> {
        let raw = std::fs::read(path.as_ref())?;
        self.validate_slice(&raw)
    }

    pub fn model(&self) -> &SchemaModel {
        &self.model
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }
}
