use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Range};
use tracing::{instrument, trace};

use crate::diagnostic_range;

/// Machine-readable category of a single violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    TypeMismatch,
    Required,
    EnumMismatch,
    MinItems,
    MaxItems,
    LengthOutOfRange,
    PatternMismatch,
    InvalidFormat,
    OutOfRange,
    AnyOfMismatch,
    OneOfNoMatch,
    OneOfAmbiguous,
    AdditionalProperty,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeMismatch => "type_mismatch",
            Self::Required => "required",
            Self::EnumMismatch => "enum_mismatch",
            Self::MinItems => "min_items",
            Self::MaxItems => "max_items",
            Self::LengthOutOfRange => "length_out_of_range",
            Self::PatternMismatch => "pattern_mismatch",
            Self::InvalidFormat => "invalid_format",
            Self::OutOfRange => "out_of_range",
            Self::AnyOfMismatch => "any_of_mismatch",
            Self::OneOfNoMatch => "one_of_no_match",
            Self::OneOfAmbiguous => "one_of_ambiguous",
            Self::AdditionalProperty => "additional_property",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single place where a document does not satisfy the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted path to the offending value, e.g. `basics.email`
    pub field: String,
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub description: String,
    /// Rendering of the offending value; empty when there is no value (missing property)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
}

impl ValidationError {
    pub fn new(
        field: impl Into<String>,
        kind: ViolationKind,
        description: impl Into<String>,
        value: Option<&Value>,
    ) -> Self {
        Self {
            field: field.into(),
            kind,
            description: description.into(),
            value: value.map(render_value).unwrap_or_default(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "(root): {} ({})", self.description, self.kind)
        } else {
            write!(f, "{}: {} ({})", self.field, self.description, self.kind)
        }
    }
}

/// Strings render without quotes, everything else as compact JSON
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Errors reported at exactly `field`
    pub fn errors_at<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.field == field)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return write!(f, "valid");
        }
        write!(f, "{} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

/// Wrapper for turning a validation error into an editor diagnostic
pub struct ValidationDiagnostic {
    field: String,
    kind: ViolationKind,
    description: String,
    range: Range,
}

impl ValidationDiagnostic {
    #[instrument(skip(error, file_contents), fields(field = %error.field))]
    pub fn new(error: &ValidationError, file_contents: &str) -> Self {
        trace!(kind = %error.kind, "Creating validation diagnostic");

        let range = diagnostic_range::from_field_path(&error.field, file_contents);

        Self {
            field: error.field.clone(),
            kind: error.kind,
            description: error.description.clone(),
            range,
        }
    }
}

impl From<ValidationDiagnostic> for Diagnostic {
    fn from(diag: ValidationDiagnostic) -> Self {
        let location = if diag.field.is_empty() {
            "(root)".to_string()
        } else {
            diag.field
        };

        Diagnostic {
            severity: Some(DiagnosticSeverity::ERROR),
            code: Some(NumberOrString::String(diag.kind.as_str().to_string())),
            source: Some(crate::DIAGNOSTIC_SOURCE.to_string()),
            message: format!("{location}: {}", diag.description),
            range: diag.range,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_type_key_and_omits_empty_value() -> Result<(), Box<dyn std::error::Error>> {
        let result = ValidationResult::from_errors(vec![
            ValidationError::new("basics.name", ViolationKind::Required, "name is required", None),
            ValidationError::new(
                "basics.email",
                ViolationKind::InvalidFormat,
                "Does not match format 'email'",
                Some(&json!("not-an-email")),
            ),
        ]);

        let encoded: Value = serde_json::from_str(&result.to_json()?)?;
        assert_eq!(
            encoded,
            json!({
                "valid": false,
                "errors": [
                    { "field": "basics.name", "type": "required", "description": "name is required" },
                    {
                        "field": "basics.email",
                        "type": "invalid_format",
                        "description": "Does not match format 'email'",
                        "value": "not-an-email"
                    }
                ]
            })
        );
        Ok(())
    }

    #[test]
    fn validity_follows_errors() {
        assert!(ValidationResult::from_errors(Vec::new()).is_valid());
        let invalid = ValidationResult::from_errors(vec![ValidationError::new(
            "",
            ViolationKind::TypeMismatch,
            "Expected object, found array",
            Some(&json!([])),
        )]);
        assert!(!invalid.is_valid());
        assert_eq!(invalid.to_string(), "1 error(s)\n  (root): Expected object, found array (type_mismatch)");
    }

    #[test]
    fn renders_values() {
        assert_eq!(render_value(&json!("plain")), "plain");
        assert_eq!(render_value(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(render_value(&json!(2.5)), "2.5");
    }

    #[test]
    fn kind_names_match_serialization() -> Result<(), Box<dyn std::error::Error>> {
        for kind in [
            ViolationKind::LengthOutOfRange,
            ViolationKind::OneOfAmbiguous,
            ViolationKind::AdditionalProperty,
        ] {
            assert_eq!(serde_json::to_value(kind)?, json!(kind.as_str()));
        }
        Ok(())
    }

    #[test]
    fn diagnostic_carries_kind_and_field() {
        let contents = "{\n  \"basics\": {\n    \"email\": \"x\"\n  }\n}";
        let error = ValidationError::new(
            "basics.email",
            ViolationKind::InvalidFormat,
            "Does not match format 'email'",
            Some(&json!("x")),
        );
        let diagnostic: Diagnostic = ValidationDiagnostic::new(&error, contents).into();

        assert_eq!(diagnostic.message, "basics.email: Does not match format 'email'");
        assert_eq!(
            diagnostic.code,
            Some(NumberOrString::String("invalid_format".into()))
        );
        assert_eq!(diagnostic.range.start.line, 2);
    }
}
