//! Cross-checks validity verdicts with the `jsonschema` crate on format-free schemas.

use schema_resume::{Validator, ValidatorOptions, ViolationKind};
use serde_json::{Value, json};

fn agree(schema: &Value, instances: &[Value]) {
    let ours = Validator::from_value(schema, ValidatorOptions::default()).expect("schema compiles");
    let reference = jsonschema::validator_for(schema).expect("reference schema compiles");

    for instance in instances {
        assert_eq!(
            ours.validate(instance).valid,
            reference.is_valid(instance),
            "verdicts differ for {instance} against {schema}"
        );
    }
}

#[test]
fn objects_and_required() {
    agree(
        &json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string", "minLength": 1, "maxLength": 10 },
                "age": { "type": "integer", "minimum": 0, "maximum": 150 }
            }
        }),
        &[
            json!({ "name": "Ada" }),
            json!({ "name": "" }),
            json!({ "name": "Ada", "age": 36 }),
            json!({ "name": "Ada", "age": 36.5 }),
            json!({ "name": "Ada", "age": -1 }),
            json!({ "age": 3 }),
            json!({ "name": "Ada", "unknown": [1, 2] }),
            json!("Ada"),
            json!(null),
        ],
    );
}

#[test]
fn arrays_and_items() {
    agree(
        &json!({
            "type": "array",
            "minItems": 1,
            "maxItems": 3,
            "items": { "type": ["string", "null"], "pattern": "^[a-z]+$" }
        }),
        &[
            json!([]),
            json!(["abc"]),
            json!(["abc", null]),
            json!(["ABC"]),
            json!(["a", "b", "c", "d"]),
            json!([1]),
            json!({}),
        ],
    );
}

#[test]
fn enums_and_closed_objects() {
    agree(
        &json!({
            "properties": {
                "fluency": { "enum": ["Native", "Fluent", "Basic", 1] }
            },
            "additionalProperties": false
        }),
        &[
            json!({}),
            json!({ "fluency": "Native" }),
            json!({ "fluency": "native" }),
            json!({ "fluency": 1.0 }),
            json!({ "fluency": "Basic", "extra": true }),
            json!(42),
        ],
    );
}

#[test]
fn combinators() {
    agree(
        &json!({
            "allOf": [{ "minLength": 2 }, { "maxLength": 5 }],
            "anyOf": [{ "pattern": "^a" }, { "pattern": "z$" }],
            "oneOf": [{ "pattern": "b" }, { "pattern": "c" }]
        }),
        &[
            json!("ab"),
            json!("abc"),
            json!("bz"),
            json!("cz"),
            json!("a"),
            json!("abcdefz"),
            json!("xx"),
            json!(7),
        ],
    );
}

#[test]
fn local_references() {
    agree(
        &json!({
            "definitions": {
                "date": { "type": "string", "pattern": "^[0-9]{4}(-[0-9]{2}){0,2}$" }
            },
            "type": "object",
            "properties": {
                "startDate": { "$ref": "#/definitions/date" },
                "endDate": { "$ref": "#/definitions/date" }
            }
        }),
        &[
            json!({ "startDate": "2020", "endDate": "2021-05" }),
            json!({ "startDate": "2020-01-01" }),
            json!({ "startDate": "May 2020" }),
            json!({ "endDate": 2020 }),
        ],
    );
}

#[test]
fn one_of_ambiguity_is_reported_once() {
    let validator = Validator::from_value(
        &json!({ "oneOf": [{ "type": "number" }, { "type": "integer" }, { "minimum": 0 }] }),
        ValidatorOptions::default(),
    )
    .expect("schema compiles");

    let result = validator.validate(&json!(5));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ViolationKind::OneOfAmbiguous);
    assert!(result.errors[0].description.contains("3 of 3"));
}
