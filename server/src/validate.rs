//! Request body validation for create and update.
//!
//! # Design
//! Bodies are decoded with every field as a raw `serde_json::Value` so that a
//! field that is present but of the wrong type is reported as a validation
//! issue with a stable code instead of a generic deserialization failure.
//! Every issue in a body is collected before returning; nothing reaches a
//! store until the whole body is valid.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::{NewTodo, Priority, TodoPatch, TITLE_MAX_CHARS};

/// `POST /api/todos` body.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTodoBody {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub priority: Option<Value>,
}

/// `PATCH /api/todos/{id}` body. Absent and `null` fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoBody {
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub done: Option<Value>,
    #[serde(default)]
    pub priority: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingTitle,
    EmptyTitle,
    TitleTooLong,
    InvalidPriority,
    InvalidDone,
}

impl ValidationIssue {
    pub fn code(self) -> &'static str {
        match self {
            ValidationIssue::MissingTitle => "MISSING_TITLE",
            ValidationIssue::EmptyTitle => "EMPTY_TITLE",
            ValidationIssue::TitleTooLong => "TITLE_TOO_LONG",
            ValidationIssue::InvalidPriority => "INVALID_PRIORITY",
            ValidationIssue::InvalidDone => "INVALID_DONE",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ValidationIssue::MissingTitle => "Title is required and must be a string",
            ValidationIssue::EmptyTitle => "Title cannot be empty",
            ValidationIssue::TitleTooLong => "Title cannot exceed 500 characters",
            ValidationIssue::InvalidPriority => "Priority must be one of low, medium, high",
            ValidationIssue::InvalidDone => "Done must be a boolean",
        }
    }
}

/// One or more problems with a request body. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", .0.iter().map(|i| i.code()).collect::<Vec<_>>().join(", "))]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }
}

impl From<ValidationIssue> for ValidationErrors {
    fn from(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }
}

/// Trim and length-check a title value.
///
/// Whitespace and the byte-order mark are trimmed, and length is counted in
/// UTF-16 code units, so limits agree with browser clients.
pub fn normalize_title(value: &Value) -> Result<String, ValidationIssue> {
    let Value::String(raw) = value else {
        return Err(ValidationIssue::MissingTitle);
    };
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return Err(ValidationIssue::EmptyTitle);
    }
    if trimmed.encode_utf16().count() > TITLE_MAX_CHARS {
        return Err(ValidationIssue::TitleTooLong);
    }
    Ok(trimmed.to_string())
}

fn parse_priority(value: &Value) -> Result<Priority, ValidationIssue> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or(ValidationIssue::InvalidPriority)
}

pub fn validate_create(body: CreateTodoBody) -> Result<NewTodo, ValidationErrors> {
    let mut issues = Vec::new();

    let title = match body.title.as_ref() {
        None => Err(ValidationIssue::MissingTitle),
        Some(value) => normalize_title(value),
    }
    .map_err(|issue| issues.push(issue))
    .ok();

    let priority = match body.priority.as_ref() {
        None => Some(Priority::default()),
        Some(value) => parse_priority(value).map_err(|issue| issues.push(issue)).ok(),
    };

    match (title, priority) {
        (Some(title), Some(priority)) if issues.is_empty() => Ok(NewTodo { title, priority }),
        _ => Err(ValidationErrors(issues)),
    }
}

pub fn validate_update(body: UpdateTodoBody) -> Result<TodoPatch, ValidationErrors> {
    let mut issues = Vec::new();
    let mut patch = TodoPatch::default();

    if let Some(value) = body.title.as_ref() {
        match normalize_title(value) {
            Ok(title) => patch.title = Some(title),
            Err(issue) => issues.push(issue),
        }
    }
    if let Some(value) = body.done.as_ref() {
        match value.as_bool() {
            Some(done) => patch.done = Some(done),
            None => issues.push(ValidationIssue::InvalidDone),
        }
    }
    if let Some(value) = body.priority.as_ref() {
        match parse_priority(value) {
            Ok(priority) => patch.priority = Some(priority),
            Err(issue) => issues.push(issue),
        }
    }

    if issues.is_empty() {
        Ok(patch)
    } else {
        Err(ValidationErrors(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: Value) -> Result<NewTodo, ValidationErrors> {
        validate_create(serde_json::from_value(body).unwrap())
    }

    fn update(body: Value) -> Result<TodoPatch, ValidationErrors> {
        validate_update(serde_json::from_value(body).unwrap())
    }

    fn issues(err: ValidationErrors) -> Vec<ValidationIssue> {
        err.issues().to_vec()
    }

    #[test]
    fn create_trims_title_and_defaults_priority() {
        let todo = create(json!({"title": "  buy milk  "})).unwrap();
        assert_eq!(todo.title, "buy milk");
        assert_eq!(todo.priority, Priority::Medium);
    }

    #[test]
    fn create_accepts_explicit_priority() {
        let todo = create(json!({"title": "x", "priority": "high"})).unwrap();
        assert_eq!(todo.priority, Priority::High);
    }

    #[test]
    fn create_null_priority_uses_default() {
        let todo = create(json!({"title": "x", "priority": null})).unwrap();
        assert_eq!(todo.priority, Priority::Medium);
    }

    #[test]
    fn create_missing_or_non_text_title() {
        for body in [json!({}), json!({"title": null}), json!({"title": 42}), json!({"title": ["a"]})] {
            assert_eq!(issues(create(body).unwrap_err()), vec![ValidationIssue::MissingTitle]);
        }
    }

    #[test]
    fn create_blank_title() {
        for title in ["", "   ", "\t\n "] {
            let err = create(json!({ "title": title })).unwrap_err();
            assert_eq!(issues(err), vec![ValidationIssue::EmptyTitle]);
        }
    }

    #[test]
    fn title_length_is_counted_after_trim() {
        let exact = "a".repeat(500);
        let padded = format!("   {exact}   ");
        assert_eq!(create(json!({ "title": padded })).unwrap().title, exact);

        let long = "a".repeat(501);
        let err = create(json!({ "title": long })).unwrap_err();
        assert_eq!(issues(err), vec![ValidationIssue::TitleTooLong]);
    }

    #[test]
    fn title_length_counts_utf16_units_not_bytes() {
        let title = "é".repeat(500);
        assert!(create(json!({ "title": title })).is_ok());

        // Astral-plane characters take two UTF-16 units each.
        let emoji = "😀".repeat(250);
        assert!(create(json!({ "title": emoji })).is_ok());
        let emoji = "😀".repeat(251);
        let err = create(json!({ "title": emoji })).unwrap_err();
        assert_eq!(issues(err), vec![ValidationIssue::TitleTooLong]);
    }

    #[test]
    fn byte_order_mark_is_trimmed() {
        let todo = create(json!({ "title": "\u{feff} x \u{feff}" })).unwrap();
        assert_eq!(todo.title, "x");
        let err = create(json!({ "title": "\u{feff}" })).unwrap_err();
        assert_eq!(issues(err), vec![ValidationIssue::EmptyTitle]);
    }

    #[test]
    fn create_collects_every_issue() {
        let err = create(json!({"title": " ", "priority": "urgent"})).unwrap_err();
        assert_eq!(
            issues(err),
            vec![ValidationIssue::EmptyTitle, ValidationIssue::InvalidPriority]
        );
    }

    #[test]
    fn update_empty_body_is_a_no_op_patch() {
        assert_eq!(update(json!({})).unwrap(), TodoPatch::default());
    }

    #[test]
    fn update_partial_fields() {
        let patch = update(json!({"done": true})).unwrap();
        assert_eq!(patch.done, Some(true));
        assert!(patch.title.is_none());
        assert!(patch.priority.is_none());

        let patch = update(json!({"title": "  new  ", "priority": "low"})).unwrap();
        assert_eq!(patch.title.as_deref(), Some("new"));
        assert_eq!(patch.priority, Some(Priority::Low));
    }

    #[test]
    fn update_null_fields_are_absent() {
        assert_eq!(
            update(json!({"title": null, "done": null})).unwrap(),
            TodoPatch::default()
        );
    }

    #[test]
    fn update_rejects_bad_fields() {
        let err = update(json!({"title": "", "done": "yes", "priority": 3})).unwrap_err();
        assert_eq!(
            issues(err),
            vec![
                ValidationIssue::EmptyTitle,
                ValidationIssue::InvalidDone,
                ValidationIssue::InvalidPriority
            ]
        );
    }

    #[test]
    fn display_lists_codes() {
        let err = create(json!({"title": " ", "priority": 1})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: EMPTY_TITLE, INVALID_PRIORITY"
        );
    }
}
