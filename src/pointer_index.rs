use tracing::{debug, instrument, trace};

use crate::field_path::{FieldPath, PathSegment};

/// Byte offset in `raw_file_contents` of the deepest segment of `path` that
/// can be located: the opening quote of an object key, or the first byte of
/// an array element.
///
/// Returns `None` when not even the first segment can be found. The root
/// path resolves to the first non-whitespace byte.
#[instrument(skip(raw_file_contents), fields(path = %path))]
pub(crate) fn calculate(path: &FieldPath, raw_file_contents: &str) -> Option<usize> {
    let raw = raw_file_contents.as_bytes();
    let mut value_at = skip_whitespace(raw, 0);
    let mut anchor = None;

    for (idx, segment) in path.segments().iter().enumerate() {
        let found = match segment {
            PathSegment::Key(key) if raw.get(value_at) == Some(&b'{') => {
                find_member(raw, value_at, key.as_bytes()).map(|key_at| {
                    (key_at, member_value(raw, key_at))
                })
            }
            PathSegment::Index(index) if raw.get(value_at) == Some(&b'[') => {
                find_element(raw, value_at, *index).map(|at| (at, at))
            }
            _ => None,
        };

        let Some((segment_at, next_value)) = found else {
            debug!(iteration = idx, segment = ?segment, "Path segment not found in content");
            break;
        };

        trace!(iteration = idx, offset = segment_at, "Resolved path segment");
        anchor = Some(segment_at);
        value_at = next_value;
    }

    if path.is_root() {
        return Some(value_at);
    }
    anchor
}

fn skip_whitespace(raw: &[u8], mut at: usize) -> usize {
    while raw.get(at).is_some_and(u8::is_ascii_whitespace) {
        at += 1;
    }
    at
}

/// Index one past the closing quote of the string starting at `at`
fn skip_string(raw: &[u8], at: usize) -> usize {
    let mut i = at + 1;
    while let Some(b) = raw.get(i) {
        match b {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    raw.len()
}

/// Start of the value belonging to the key whose opening quote is at `key_at`
fn member_value(raw: &[u8], key_at: usize) -> usize {
    let after_key = skip_whitespace(raw, skip_string(raw, key_at));
    // after_key is the colon
    skip_whitespace(raw, after_key + 1)
}

/// Finds the key `key` among the direct members of the object opening at `object_at`
fn find_member(raw: &[u8], object_at: usize, key: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = object_at + 1;

    while let Some(&b) = raw.get(i) {
        match b {
            b'"' => {
                let end = skip_string(raw, i);
                let is_key = raw.get(skip_whitespace(raw, end)) == Some(&b':');
                if depth == 0 && is_key && raw.get(i + 1..end - 1) == Some(key) {
                    return Some(i);
                }
                i = end;
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' if depth == 0 => return None,
            b'}' | b']' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Finds the first byte of element `index` of the array opening at `array_at`
fn find_element(raw: &[u8], array_at: usize, index: usize) -> Option<usize> {
    let first = skip_whitespace(raw, array_at + 1);
    if raw.get(first) == Some(&b']') {
        return None;
    }
    if index == 0 {
        return Some(first);
    }

    let mut seen = 0usize;
    let mut depth = 0usize;
    let mut i = first;

    while let Some(&b) = raw.get(i) {
        match b {
            b'"' => {
                i = skip_string(raw, i);
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' if depth == 0 => return None,
            b'}' | b']' => depth -= 1,
            b',' if depth == 0 => {
                seen += 1;
                if seen == index {
                    return Some(skip_whitespace(raw, i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = r#"{
  "basics": {
    "name": "Ada",
    "email": "ada@example"
  },
  "work": [
    { "name": "First", "url": "https://first.dev" },
    { "name": "Second, \"Inc\"", "url": "bad" }
  ]
}"#;

    fn line_of(offset: usize) -> usize {
        RESUME[..offset].matches('\n').count()
    }

    #[test]
    fn resolves_nested_keys() {
        let at = calculate(&FieldPath::parse("basics.email"), RESUME).expect("resolved");
        assert_eq!(line_of(at), 3);
        assert!(RESUME[at..].starts_with("\"email\""));
    }

    #[test]
    fn resolves_array_elements_past_tricky_strings() {
        let at = calculate(&FieldPath::parse("work[1].url"), RESUME).expect("resolved");
        assert_eq!(line_of(at), 7);
        assert!(RESUME[at..].starts_with("\"url\": \"bad\""));
    }

    #[test]
    fn keys_are_matched_within_their_object() {
        // "name" exists inside work items, but not at the top level
        assert_eq!(calculate(&FieldPath::parse("name"), RESUME), None);

        // basics.label is missing: falls back to the basics key
        let at = calculate(&FieldPath::parse("basics.label"), RESUME).expect("resolved");
        assert!(RESUME[at..].starts_with("\"basics\""));
    }

    #[test]
    fn root_and_out_of_range_indices() {
        assert_eq!(calculate(&FieldPath::root(), RESUME), Some(0));

        let at = calculate(&FieldPath::parse("work[5]"), RESUME).expect("falls back to work");
        assert!(RESUME[at..].starts_with("\"work\""));
    }
}
