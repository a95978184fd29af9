use tower_lsp::lsp_types::Position;
use tracing::{instrument, trace};

/// Converts a byte offset into an LSP position (zero-based line, UTF-16 column)
#[instrument(skip(raw_file_contents))]
pub(crate) fn from_index(raw_file_contents: &str, index: usize) -> Position {
    let mut safe_index = index.min(raw_file_contents.len());
    while !raw_file_contents.is_char_boundary(safe_index) {
        safe_index -= 1;
    }

    let before = &raw_file_contents[..safe_index];
    let line_number = before.bytes().filter(|b| *b == b'\n').count() as u32;
    let line_start = before.rfind('\n').map_or(0, |at| at + 1);
    let character = before[line_start..].encode_utf16().count() as u32;

    trace!(
        index = safe_index,
        line_number = line_number,
        character = character,
        "Calculated position from index"
    );

    Position {
        line: line_number,
        character,
    }
}

/// Byte offset of the end of the line containing `index` (before the newline)
pub(crate) fn line_end(raw_file_contents: &str, index: usize) -> usize {
    let safe_index = index.min(raw_file_contents.len());
    raw_file_contents[safe_index..]
        .find('\n')
        .map_or(raw_file_contents.len(), |at| safe_index + at)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_lines_and_columns() {
        let text = "{\n  \"basics\": {\n    \"email\": \"x\"\n  }\n}";
        let index = text.find("\"email\"").expect("present");
        assert_eq!(from_index(text, index), Position { line: 2, character: 4 });
        assert_eq!(from_index(text, 0), Position { line: 0, character: 0 });
    }

    #[test]
    fn columns_are_utf16() {
        let text = "\"\u{1F600}\": 1";
        let index = text.find(':').expect("present");
        assert_eq!(from_index(text, index).character, 4);
    }

    #[test]
    fn clamps_out_of_range_indices() {
        let text = "a\nb";
        assert_eq!(from_index(text, 99), Position { line: 1, character: 1 });
        assert_eq!(line_end(text, 0), 1);
        assert_eq!(line_end(text, 2), 3);
    }
}
