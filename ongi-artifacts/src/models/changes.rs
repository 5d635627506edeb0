//! Partial updates to editable artifact fields
//!
//! Parsing works on raw JSON so that every invalid field is reported at once,
//! keyed by field name. Keys that are not editable (`id`, `image_count`,
//! timestamps, the AI description pair) are ignored.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::artifact::ArtifactStatus;

/// Validation messages keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const NAME_MAX_CHARS: usize = 200;
const TIME_PERIOD_MAX_CHARS: usize = 100;
const ESTIMATED_YEAR_MAX_CHARS: usize = 100;
const ORIGIN_LOCATION_MAX_CHARS: usize = 200;
const MODEL_VERSION_MAX_CHARS: usize = 50;

/// Validated set of column changes
///
/// Outer `None` means "leave unchanged"; `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub time_period: Option<Option<String>>,
    pub estimated_year: Option<Option<String>>,
    pub origin_location: Option<Option<String>>,
    pub status: Option<ArtifactStatus>,
    pub ai_model_version: Option<Option<String>>,
}

impl ArtifactChanges {
    /// Validate a request body
    pub fn from_json(body: &Value) -> Result<Self, FieldErrors> {
        let Some(fields) = body.as_object() else {
            let mut errors = FieldErrors::new();
            errors.insert(
                "non_field_errors".to_string(),
                vec!["Invalid data. Expected a dictionary.".to_string()],
            );
            return Err(errors);
        };

        let mut errors = FieldErrors::new();
        let changes = ArtifactChanges {
            name: required_text(fields, "name", NAME_MAX_CHARS, &mut errors),
            description: nullable_text(fields, "description", None, &mut errors),
            time_period: nullable_text(
                fields,
                "time_period",
                Some(TIME_PERIOD_MAX_CHARS),
                &mut errors,
            ),
            estimated_year: nullable_text(
                fields,
                "estimated_year",
                Some(ESTIMATED_YEAR_MAX_CHARS),
                &mut errors,
            ),
            origin_location: nullable_text(
                fields,
                "origin_location",
                Some(ORIGIN_LOCATION_MAX_CHARS),
                &mut errors,
            ),
            status: status(fields, &mut errors),
            ai_model_version: nullable_text(
                fields,
                "ai_model_version",
                Some(MODEL_VERSION_MAX_CHARS),
                &mut errors,
            ),
        };

        if errors.is_empty() {
            Ok(changes)
        } else {
            Err(errors)
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == ArtifactChanges::default()
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn check_length(
    value: &str,
    field: &str,
    max_chars: Option<usize>,
    errors: &mut FieldErrors,
) -> bool {
    match max_chars {
        Some(max) if value.chars().count() > max => {
            push_error(
                errors,
                field,
                format!("Ensure this field has no more than {} characters.", max),
            );
            false
        }
        _ => true,
    }
}

fn required_text(
    fields: &Map<String, Value>,
    field: &str,
    max_chars: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    match fields.get(field)? {
        Value::Null => {
            push_error(errors, field, "This field may not be null.");
            None
        }
        Value::String(text) if text.trim().is_empty() => {
            push_error(errors, field, "This field may not be blank.");
            None
        }
        Value::String(text) => {
            check_length(text, field, Some(max_chars), errors).then(|| text.clone())
        }
        _ => {
            push_error(errors, field, "Not a valid string.");
            None
        }
    }
}

fn nullable_text(
    fields: &Map<String, Value>,
    field: &str,
    max_chars: Option<usize>,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    match fields.get(field)? {
        Value::Null => Some(None),
        Value::String(text) => {
            check_length(text, field, max_chars, errors).then(|| Some(text.clone()))
        }
        _ => {
            push_error(errors, field, "Not a valid string.");
            None
        }
    }
}

fn status(fields: &Map<String, Value>, errors: &mut FieldErrors) -> Option<ArtifactStatus> {
    match fields.get("status")? {
        Value::String(text) => match text.parse() {
            Ok(status) => Some(status),
            Err(message) => {
                push_error(errors, "status", message);
                None
            }
        },
        other => {
            push_error(errors, "status", format!("{} is not a valid choice.", other));
            None
        }
    }
}
