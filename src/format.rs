use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::trace;

/// Predicate deciding whether a string satisfies a named format
pub type FormatPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Maps `format` keyword values to string predicates.
///
/// Formats that are not registered are not enforced: `check` returns `true`
/// for them, so schemas using formats outside the registry still validate.
pub struct FormatRegistry {
    formats: HashMap<String, FormatPredicate>,
}

impl FormatRegistry {
    /// Registry without any formats; every `check` passes
    pub fn empty() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Registry with `email`, `date` and `uri`
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("email", is_email);
        registry.register("date", is_date);
        registry.register("uri", is_uri);
        registry
    }

    /// Adds or replaces the predicate for `name`
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.formats.insert(name.into(), Box::new(predicate));
    }

    pub fn check(&self, name: &str, value: &str) -> bool {
        match self.formats.get(name) {
            Some(predicate) => predicate(value),
            None => {
                trace!(format = name, "Format not registered, skipping");
                true
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// Registered format names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}

/// local@domain, no whitespace, at least one dot inside the domain
pub fn is_email(value: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("Valid regex"));

    regex.is_match(value)
}

/// `YYYY-MM-DD` or `YYYY-MM`, with a real calendar day when the day is present
pub fn is_date(value: &str) -> bool {
    static DATE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = DATE_REGEX
        .get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})(?:-(\d{2}))?$").expect("Valid regex"));

    let Some(caps) = regex.captures(value) else {
        return false;
    };

    let (Ok(year), Ok(month)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>()) else {
        return false;
    };
    let day = match caps.get(3).map(|day| day.as_str().parse::<u32>()) {
        Some(Ok(day)) => day,
        Some(Err(_)) => return false,
        None => 1,
    };

    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// Absolute URI: a scheme, a colon, and a non-empty whitespace-free remainder
pub fn is_uri(value: &str) -> bool {
    static URI_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URI_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]+$").expect("Valid regex"));

    regex.is_match(value)
}
