use tower_lsp::lsp_types::Range;
use tracing::{debug, instrument, trace};

use crate::field_path::FieldPath;
use crate::{line_number, pointer_index};

/// Converts a field path to the range from the located key (or element) to the
/// end of its line. `None` when nothing along the path could be located.
#[instrument(skip(raw_file_contents), fields(
    path = %path,
    content_len = raw_file_contents.len()
))]
pub fn into_range(path: &FieldPath, raw_file_contents: &str) -> Option<Range> {
    let index = pointer_index::calculate(path, raw_file_contents)?;

    debug!(resolved_index = index, "Calculated index for field path");

    let start = line_number::from_index(raw_file_contents, index);
    let end = line_number::from_index(
        raw_file_contents,
        line_number::line_end(raw_file_contents, index),
    );

    Some(Range { start, end })
}

/// Resolves the range for a diagnostic from a rendered field path such as `work[0].url`
#[instrument(skip(file_contents))]
pub fn from_field_path(field: &str, file_contents: &str) -> Range {
    match into_range(&FieldPath::parse(field), file_contents) {
        Some(range) => {
            trace!(
                line = range.start.line,
                character = range.start.character,
                "Successfully resolved diagnostic range"
            );
            range
        }
        None => {
            debug!(field, "Failed to resolve range, using default");
            Range::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    const TEST_RESUME_JSON: &str = r#"{
  "basics": {
    "name": "Ada Lovelace",
    "email": "not-an-email"
  }
}"#;

    #[test]
    fn range_spans_rest_of_line() {
        let range = from_field_path("basics.email", TEST_RESUME_JSON);
        assert_eq!(
            range,
            Range {
                start: Position { line: 3, character: 4 },
                end: Position { line: 3, character: 27 },
            }
        );
    }

    #[test]
    fn unresolvable_paths_use_default() {
        assert_eq!(from_field_path("work[0]", TEST_RESUME_JSON), Range::default());
    }
}
