use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Position, Range};
use tracing::{debug, error, instrument, trace};

/// Returns the schema identifier a document declares, trying the shebang
/// form first and falling back to the `$schema` member found by regex, so
/// documents that do not parse yet can still be identified
pub fn extract_schema_reference(file_contents: &str) -> Option<String> {
    // Check shebang pattern first (must be on first line, first char)
    if let Some(schema) = check_shebang_schema(file_contents) {
        return Some(schema);
    }

    static SCHEMA_MEMBER_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SCHEMA_MEMBER_REGEX
        .get_or_init(|| Regex::new(r#""\$schema"\s*:\s*"([^"]+)""#).expect("Valid regex"));

    regex
        .captures(file_contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check for shebang-style: #$schema IDENTIFIER
/// Must be at the very start of the file (first line, first character)
fn check_shebang_schema(content: &str) -> Option<String> {
    static SHEBANG_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SHEBANG_REGEX.get_or_init(|| {
        // \S+ captures non-whitespace characters (the identifier)
        Regex::new(r"^#\$schema\s+(\S+)").expect("Valid regex")
    });

    // Only check the first line
    let first_line = content.lines().next()?;

    regex
        .captures(first_line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Blanks a leading `#$schema` line so the rest parses as JSON while line
/// numbers and byte offsets stay unchanged
pub fn strip_shebang(file_contents: &str) -> Cow<'_, str> {
    if check_shebang_schema(file_contents).is_none() {
        return Cow::Borrowed(file_contents);
    }

    let line_len = file_contents.find('\n').unwrap_or(file_contents.len());
    let mut stripped = " ".repeat(line_len);
    stripped.push_str(&file_contents[line_len..]);
    Cow::Owned(stripped)
}

/// Parsed content state of an editor buffer
pub enum ParsedContent {
    Valid(serde_json::Value),
    ParseError(Diagnostic),
}

impl ParsedContent {
    /// Parses JSON content and converts errors to diagnostics
    #[instrument(skip(file_contents), fields(content_len = file_contents.len()))]
    pub fn new(file_contents: &str) -> Self {
        trace!("Attempting to parse file contents as JSON");

        match serde_json::from_str(&strip_shebang(file_contents)) {
            Ok(json) => {
                debug!("Successfully parsed JSON content");
                ParsedContent::Valid(json)
            }
            Err(e) => {
                error!(error = %e, "JSON parsing failed");
                ParsedContent::ParseError(ParseErrorDiagnostic::from(e).into())
            }
        }
    }
}

/// Wrapper for creating parse error diagnostics
pub struct ParseErrorDiagnostic {
    line: u32,
    column: u32,
    message: String,
}

impl From<serde_json::Error> for ParseErrorDiagnostic {
    #[instrument(skip(error), fields(line = error.line(), column = error.column()))]
    fn from(error: serde_json::Error) -> Self {
        let (line, column) = ((error.line() as u32).saturating_sub(1), error.column() as u32);

        trace!(
            line = line,
            column = column,
            error = %error,
            "Creating parse error diagnostic"
        );

        Self {
            line,
            column,
            message: error.to_string(),
        }
    }
}

impl From<ParseErrorDiagnostic> for Diagnostic {
    fn from(diag: ParseErrorDiagnostic) -> Self {
        Diagnostic {
            range: Range {
                start: Position {
                    line: diag.line,
                    character: 0,
                },
                end: Position {
                    line: diag.line,
                    character: diag.column.saturating_sub(1),
                },
            },
            message: diag.message,
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(crate::DIAGNOSTIC_SOURCE.to_string()),
            ..Default::default()
        }
    }
}
