//! Shape validation for book payloads.
//!
//! Every field is required and must carry the right primitive type. Unknown
//! keys are ignored. No range, format or uniqueness checks happen here.

use serde_json::Value;

use super::models::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    String,
    Integer,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => column_int(value).is_some(),
        }
    }
}

/// Reads a JSON number as an `INTEGER` column value. Whole floats such as
/// `100.0` count; fractions and anything outside `i32` do not.
fn column_int(value: &Value) -> Option<i32> {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    let n = value.as_f64()?;
    let in_range = n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX);
    (n.fract() == 0.0 && in_range).then_some(n as i32)
}

const BOOK_SCHEMA: &[(&str, FieldKind)] = &[
    ("isbn", FieldKind::String),
    ("amazon_url", FieldKind::String),
    ("author", FieldKind::String),
    ("language", FieldKind::String),
    ("pages", FieldKind::Integer),
    ("publisher", FieldKind::String),
    ("title", FieldKind::String),
    ("year", FieldKind::Integer),
];

/// Messages collected while validating a payload, one per offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("book payload failed validation: {}", .0.join("; "))]
pub struct ValidationErrors(pub Vec<String>);

/// Validate `body` against the book schema and convert it.
pub fn validate_book(body: &Value) -> Result<Book, ValidationErrors> {
    let Some(object) = body.as_object() else {
        return Err(ValidationErrors(vec![
            "instance is not of a type(s) object".to_string(),
        ]));
    };

    let errors: Vec<String> = BOOK_SCHEMA
        .iter()
        .filter_map(|&(field, kind)| match object.get(field) {
            None | Some(Value::Null) => Some(format!("instance requires property \"{field}\"")),
            Some(value) if !kind.accepts(value) => Some(format!(
                "instance.{field} is not of a type(s) {}",
                kind.name()
            )),
            Some(_) => None,
        })
        .collect();

    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    // Whole floats are rewritten as integers so they deserialize into i32.
    let mut normalized = object.clone();
    for &(field, kind) in BOOK_SCHEMA {
        if kind == FieldKind::Integer {
            if let Some(n) = normalized.get(field).and_then(column_int) {
                normalized.insert(field.to_string(), Value::from(n));
            }
        }
    }

    serde_json::from_value(Value::Object(normalized))
        .map_err(|err| ValidationErrors(vec![err.to_string()]))
}
