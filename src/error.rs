use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeSchemaError {
    /// The schema document is malformed or uses an unsupported type token
    #[error("Failed to parse schema: {reason}")]
    SchemaParse { reason: String },

    /// Compiling the schema (including inlined `$ref` targets) went past the
    /// configured nesting depth or node count
    #[error("Schema too complex: {limit} exceeds {bound}")]
    SchemaTooComplex { limit: &'static str, bound: usize },

    /// Document bytes are not well-formed JSON
    #[error("Failed to parse document: {0}")]
    DocumentParse(#[from] serde_json::Error),

    /// Document or schema file could not be read
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// One of the bundled companion documents (meta-schema, context) is malformed
    #[error("Failed to parse bundled {document}: {reason}")]
    BundleParse {
        document: &'static str,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, ResumeSchemaError>;

impl ResumeSchemaError {
    pub(crate) fn schema_parse(reason: impl Into<String>) -> Self {
        ResumeSchemaError::SchemaParse {
            reason: reason.into(),
        }
    }

    /// True when the failure belongs to a single document rather than to validator construction
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            ResumeSchemaError::DocumentParse(_) | ResumeSchemaError::Io(_)
        )
    }
}
