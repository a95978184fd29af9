use std::fmt;

/// One step from a parent value to a child value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a value inside a document, rendered as `basics.profiles[1].url`.
///
/// The root renders as the empty string, so a missing top-level property
/// `name` is reported at field `name`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(name.to_owned()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// RFC 6901 form, e.g. `/basics/profiles/1/url`
    pub fn to_json_pointer(&self) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                PathSegment::Key(k) => format!("/{}", k.replace('~', "~0").replace('/', "~1")),
                PathSegment::Index(i) => format!("/{i}"),
            })
            .collect()
    }

    /// Parses the dotted rendering back into segments.
    /// Keys that themselves contain `.` or `[` do not survive the round trip.
    pub fn parse(rendered: &str) -> Self {
        let mut segments = Vec::new();

        for part in rendered.split('.').filter(|p| !p.is_empty()) {
            let (key, mut rest) = match part.find('[') {
                Some(at) => part.split_at(at),
                None => (part, ""),
            };
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_owned()));
            }
            while let Some(stripped) = rest.strip_prefix('[') {
                let Some(close) = stripped.find(']') else {
                    break;
                };
                match stripped[..close].parse::<usize>() {
                    Ok(i) => segments.push(PathSegment::Index(i)),
                    Err(_) => segments.push(PathSegment::Key(stripped[..close].to_owned())),
                }
                rest = &stripped[close + 1..];
            }
        }

        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if idx == 0 => write!(f, "{k}")?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_keys_and_indices() {
        let path = FieldPath::root().key("work").index(0).key("startDate");
        assert_eq!(path.to_string(), "work[0].startDate");
        assert_eq!(path.to_json_pointer(), "/work/0/startDate");
    }

    #[test]
    fn root_is_empty() {
        assert_eq!(FieldPath::root().to_string(), "");
        assert!(FieldPath::root().is_root());
        assert_eq!(FieldPath::root().key("name").to_string(), "name");
    }

    #[test]
    fn parse_recovers_segments() {
        let parsed = FieldPath::parse("basics.profiles[1].url");
        assert_eq!(
            parsed.segments(),
            &[
                PathSegment::Key("basics".into()),
                PathSegment::Key("profiles".into()),
                PathSegment::Index(1),
                PathSegment::Key("url".into()),
            ]
        );
        assert_eq!(FieldPath::parse(""), FieldPath::root());
    }

    #[test]
    fn pointer_escapes_special_characters() {
        assert_eq!(FieldPath::root().key("a/b~c").to_json_pointer(), "/a~1b~0c");
    }
}
