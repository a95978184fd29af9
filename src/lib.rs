//! Validation of Schema Resume documents.
//!
//! A [`Validator`] compiles a JSON Schema once and checks any number of
//! documents against it, returning a [`ValidationResult`] that lists every
//! violation found in a single pass:
//!
//! ```
//! use schema_resume::{SchemaBundle, Validator};
//! use serde_json::json;
//!
//! let bundle = SchemaBundle::embedded()?;
//! let validator = Validator::from_bundle(&bundle)?;
//!
//! let result = validator.validate(&json!({ "basics": { "email": "not-an-email" } }));
//! assert!(!result.valid);
//! assert_eq!(result.errors[0].field, "basics.name");
//! assert_eq!(result.errors[1].field, "basics.email");
//! # Ok::<(), schema_resume::ResumeSchemaError>(())
//! ```
//!
//! [`diagnose`] wraps the same pipeline for editors, turning buffer text
//! into LSP diagnostics.

pub mod bundle;
pub mod diagnostic_range;
pub mod engine;
pub mod error;
pub mod field_path;
pub mod format;
pub mod line_number;
pub mod parsing;
pub mod pointer_index;
pub mod schema;
pub mod validation;
pub mod validator;

use serde_json::Value;
use tower_lsp::lsp_types::Diagnostic;
use tracing::{debug, info, instrument, warn};

pub use crate::bundle::SchemaBundle;
pub use crate::error::{ResumeSchemaError, Result};
pub use crate::format::FormatRegistry;
pub use crate::schema::{SchemaLimits, SchemaModel, SchemaNode, SchemaType};
pub use crate::validation::{ValidationError, ValidationResult, ViolationKind};
pub use crate::validator::{Validator, ValidatorOptions};

use crate::{parsing::ParsedContent, validation::ValidationDiagnostic};

/// `source` attached to every diagnostic this crate produces
pub const DIAGNOSTIC_SOURCE: &str = "schema-resume";

/// Validates buffer text and returns every problem as an LSP diagnostic with Error severity.
///
/// Syntax errors produce a single diagnostic at serde_json's reported position;
/// otherwise each schema violation becomes one diagnostic located at its field.
#[instrument(skip(validator, file_contents), fields(content_len = file_contents.len()))]
pub fn diagnose(validator: &Validator, file_contents: &str) -> Vec<Diagnostic> {
    info!("Starting resume diagnostics");

    let contents = parsing::strip_shebang(file_contents);

    match ParsedContent::new(&contents) {
        ParsedContent::Valid(json) => {
            debug!("JSON parsing successful, proceeding with schema validation");
            validator
                .validate(&json)
                .errors
                .iter()
                .map(|e| ValidationDiagnostic::new(e, &contents).into())
                .collect()
        }
        ParsedContent::ParseError(diagnostic) => {
            warn!("JSON parse error detected, returning parse diagnostic");
            vec![diagnostic]
        }
    }
}

/// Whether an editor buffer should be treated as a resume: it declares a
/// Schema Resume `$schema` or its file name ends in `resume.json`
pub fn is_resume_document(file_name: &str, file_contents: &str) -> bool {
    let declared = parsing::extract_schema_reference(file_contents)
        .is_some_and(|schema| schema.contains("schema-resume"));

    declared || file_name.to_ascii_lowercase().ends_with("resume.json")
}

/// Validates one document against the embedded Schema Resume schema
pub fn validate_resume(resume: &Value) -> Result<ValidationResult> {
    let validator = Validator::from_bundle(&SchemaBundle::embedded()?)?;
    Ok(validator.validate(resume))
}

/// Parses and validates raw JSON against the embedded Schema Resume schema
pub fn validate_resume_slice(raw: &[u8]) -> Result<ValidationResult> {
    let validator = Validator::from_bundle(&SchemaBundle::embedded()?)?;
    validator.validate_slice(raw)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use tower_lsp::lsp_types::{NumberOrString, Position};

    const TEST_CONTROL_JSON: &str = r#"{
  "$schema": "https://schema-resume.org/schema.json",
  "basics": {
    "name": "John Doe",
    "email": "john.doe@example.com",
    "location": { "city": "San Francisco", "countryCode": "US" }
  },
  "work": [
    { "name": "Tech Corp", "position": "Engineer", "startDate": "2020-03" }
  ]
}"#;

    const TEST_ERROR_JSON: &str = r#"{
  "$schema": "https://schema-resume.org/schema.json",
  "basics": {
    "email": "not-an-email"
  },
  "work": [
    { "name": "Tech Corp", "startDate": "March 2020" }
  ]
}"#;

    fn embedded_validator() -> std::result::Result<Validator, Box<dyn std::error::Error>> {
        Ok(Validator::from_bundle(&SchemaBundle::embedded()?)?)
    }

    #[test]
    fn validate_schema_works() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let validator = embedded_validator()?;
        let diagnostics = diagnose(&validator, TEST_CONTROL_JSON);
        assert_eq!(diagnostics, Vec::new());
        Ok(())
    }

    #[test]
    fn first_diagnostic_found() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let validator = embedded_validator()?;
        // drop the colon after "basics" to force a syntax error
        let broken_json = TEST_CONTROL_JSON.replace("\"basics\":", "\"basics\"");

        let diagnostics = diagnose(&validator, &broken_json);
        assert_eq!(diagnostics.len(), 1, "Should have caught a syntax error");
        assert_eq!(diagnostics[0].code, None);
        Ok(())
    }

    #[test]
    fn field_path_to_range_works() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let validator = embedded_validator()?;
        let diagnostics = diagnose(&validator, TEST_ERROR_JSON);

        let codes: Vec<_> = diagnostics
            .iter()
            .map(|d| (d.range.start.line, d.code.clone()))
            .collect();
        assert_eq!(
            codes,
            vec![
                (2, Some(NumberOrString::String("required".into()))),
                (3, Some(NumberOrString::String("invalid_format".into()))),
                (6, Some(NumberOrString::String("pattern_mismatch".into()))),
            ]
        );
        assert_eq!(
            diagnostics[1].range.start,
            Position { line: 3, character: 4 }
        );
        assert!(diagnostics[2].message.starts_with("work[0].startDate: "));
        Ok(())
    }

    #[test]
    fn resume_documents_are_recognised() {
        assert!(is_resume_document("/home/ada/cv.json", TEST_CONTROL_JSON));
        assert!(is_resume_document("/home/ada/Resume.json", "{}"));
        assert!(!is_resume_document("/home/ada/package.json", "{ \"name\": \"x\" }"));
    }

    #[test]
    fn convenience_functions_use_embedded_schema() -> std::result::Result<(), Box<dyn std::error::Error>> {
        assert!(validate_resume_slice(TEST_CONTROL_JSON.as_bytes())?.valid);
        assert!(!validate_resume(&serde_json::from_str(TEST_ERROR_JSON)?)?.valid);
        Ok(())
    }
}
