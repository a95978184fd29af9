//! Recursive evaluation of an instance against a compiled [`SchemaNode`].
//!
//! The walk is depth-first and never aborts: every violation is appended to
//! the caller's sink so one pass reports as much as possible. Children of a
//! node whose `type` does not match are not visited.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::field_path::FieldPath;
use crate::format::FormatRegistry;
use crate::schema::{ArrayRules, NumberRules, ObjectRules, SchemaNode, SchemaType, StringRules};
use crate::validation::{ValidationError, ViolationKind};

pub struct Engine<'a> {
    formats: &'a FormatRegistry,
    validate_formats: bool,
}

impl<'a> Engine<'a> {
    pub fn new(formats: &'a FormatRegistry) -> Self {
        Self {
            formats,
            validate_formats: true,
        }
    }

    /// Turns `format` enforcement on or off; off behaves as if no format were registered
    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    pub fn evaluate(
        &self,
        node: &SchemaNode,
        instance: &Value,
        path: &FieldPath,
        sink: &mut Vec<ValidationError>,
    ) {
        if let Some(types) = &node.types {
            if !types.iter().any(|t| t.matches(instance)) {
                trace!(field = %path, "Type mismatch, not descending");
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::TypeMismatch,
                    describe_types(types, instance),
                    Some(instance),
                ));
                return;
            }
        }

        if let Some(members) = &node.enum_values {
            if !members.iter().any(|member| json_equal(member, instance)) {
                let allowed: Vec<String> = members.iter().map(Value::to_string).collect();
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::EnumMismatch,
                    format!("Must be one of the following: {}", allowed.join(", ")),
                    Some(instance),
                ));
            }
        }

        match instance {
            Value::Object(map) => self.check_object(&node.object, map, path, sink),
            Value::Array(items) => self.check_array(&node.array, instance, items, path, sink),
            Value::String(s) => self.check_string(&node.string, instance, s, path, sink),
            Value::Number(_) => check_number(&node.number, instance, path, sink),
            Value::Bool(_) | Value::Null => {}
        }

        for branch in &node.all_of {
            self.evaluate(branch, instance, path, sink);
        }

        if !node.any_of.is_empty() {
            self.check_any_of(&node.any_of, instance, path, sink);
        }

        if !node.one_of.is_empty() {
            self.check_one_of(&node.one_of, instance, path, sink);
        }
    }

    /// True when `instance` produces no errors against `node`
    pub fn is_valid(&self, node: &SchemaNode, instance: &Value, path: &FieldPath) -> bool {
        let mut scratch = Vec::new();
        self.evaluate(node, instance, path, &mut scratch);
        scratch.is_empty()
    }

    fn check_object(
        &self,
        rules: &ObjectRules,
        map: &Map<String, Value>,
        path: &FieldPath,
        sink: &mut Vec<ValidationError>,
    ) {
        for name in &rules.required {
            if !map.contains_key(name) {
                sink.push(ValidationError::new(
                    path.key(name).to_string(),
                    ViolationKind::Required,
                    format!("{name} is required"),
                    None,
                ));
            }
        }

        for (name, child) in &rules.properties {
            if let Some(value) = map.get(name) {
                self.evaluate(child, value, &path.key(name), sink);
            }
        }

        if rules.additional_properties == Some(false) {
            for (key, value) in map {
                if rules.property(key).is_none() {
                    sink.push(ValidationError::new(
                        path.key(key).to_string(),
                        ViolationKind::AdditionalProperty,
                        format!("Additional property {key} is not allowed"),
                        Some(value),
                    ));
                }
            }
        }
    }

    fn check_array(
        &self,
        rules: &ArrayRules,
        instance: &Value,
        items: &[Value],
        path: &FieldPath,
        sink: &mut Vec<ValidationError>,
    ) {
        if let Some(min) = rules.min_items {
            if items.len() < min {
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::MinItems,
                    format!("Array must have at least {min} items"),
                    Some(instance),
                ));
            }
        }

        if let Some(max) = rules.max_items {
            if items.len() > max {
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::MaxItems,
                    format!("Array must have at most {max} items"),
                    Some(instance),
                ));
            }
        }

        if let Some(item_node) = &rules.items {
            for (index, item) in items.iter().enumerate() {
                self.evaluate(item_node, item, &path.index(index), sink);
            }
        }
    }

    fn check_string(
        &self,
        rules: &StringRules,
        instance: &Value,
        s: &str,
        path: &FieldPath,
        sink: &mut Vec<ValidationError>,
    ) {
        let length = s.chars().count();

        if let Some(min) = rules.min_length {
            if length < min {
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::LengthOutOfRange,
                    format!("String length must be greater than or equal to {min}"),
                    Some(instance),
                ));
            }
        }

        if let Some(max) = rules.max_length {
            if length > max {
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::LengthOutOfRange,
                    format!("String length must be less than or equal to {max}"),
                    Some(instance),
                ));
            }
        }

        if let Some(pattern) = &rules.pattern {
            if !pattern.is_match(s) {
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::PatternMismatch,
                    format!("Does not match pattern '{}'", pattern.as_str()),
                    Some(instance),
                ));
            }
        }

        if let Some(format) = &rules.format {
            if self.validate_formats && !self.formats.check(format, s) {
                sink.push(ValidationError::new(
                    path.to_string(),
                    ViolationKind::InvalidFormat,
                    format!("Does not match format '{format}'"),
                    Some(instance),
                ));
            }
        }
    }

    fn check_any_of(
        &self,
        branches: &[SchemaNode],
        instance: &Value,
        path: &FieldPath,
        sink: &mut Vec<ValidationError>,
    ) {
        if branches.iter().any(|b| self.is_valid(b, instance, path)) {
            return;
        }

        sink.push(ValidationError::new(
            path.to_string(),
            ViolationKind::AnyOfMismatch,
            format!(
                "Must validate at least one schema (anyOf), none of {} branches matched",
                branches.len()
            ),
            Some(instance),
        ));
    }

    fn check_one_of(
        &self,
        branches: &[SchemaNode],
        instance: &Value,
        path: &FieldPath,
        sink: &mut Vec<ValidationError>,
    ) {
        let matched = branches
            .iter()
            .filter(|b| self.is_valid(b, instance, path))
            .count();

        let (kind, description) = match matched {
            1 => return,
            0 => (
                ViolationKind::OneOfNoMatch,
                format!(
                    "Must validate one and only one schema (oneOf), none of {} branches matched",
                    branches.len()
                ),
            ),
            n => (
                ViolationKind::OneOfAmbiguous,
                format!(
                    "Must validate one and only one schema (oneOf), {n} of {} branches matched",
                    branches.len()
                ),
            ),
        };

        sink.push(ValidationError::new(
            path.to_string(),
            kind,
            description,
            Some(instance),
        ));
    }
}

fn check_number(
    rules: &NumberRules,
    instance: &Value,
    path: &FieldPath,
    sink: &mut Vec<ValidationError>,
) {
    let Value::Number(n) = instance else {
        return;
    };

    if let Some(min) = &rules.minimum {
        if compare_numbers(n, min) == Some(Ordering::Less) {
            sink.push(ValidationError::new(
                path.to_string(),
                ViolationKind::OutOfRange,
                format!("Must be greater than or equal to {min}"),
                Some(instance),
            ));
        }
    }

    if let Some(max) = &rules.maximum {
        if compare_numbers(n, max) == Some(Ordering::Greater) {
            sink.push(ValidationError::new(
                path.to_string(),
                ViolationKind::OutOfRange,
                format!("Must be less than or equal to {max}"),
                Some(instance),
            ));
        }
    }
}

fn describe_types(expected: &[SchemaType], instance: &Value) -> String {
    if expected.is_empty() {
        return "No value is allowed here".to_string();
    }

    let names: Vec<&str> = expected.iter().map(SchemaType::as_str).collect();
    format!("Expected {}, found {}", names.join(" or "), kind_name(instance))
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}

/// Orders two JSON numbers. Integers compare exactly, so values past 2^53
/// stay distinct; anything involving a float compares as `f64`.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (as_integer(a), as_integer(b)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn as_integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

/// JSON equality where numbers compare by value, so `1` equals `1.0`
fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            compare_numbers(x, y).map_or(x == y, Ordering::is_eq)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_equal(x, y)))
        }
        _ => a == b,
    }
}
