pub mod appointments;
pub mod cash;
pub mod donations;
pub mod events;
pub mod news;
pub mod reports;
pub mod staff;

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as AxumJson, Response},
};
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

/// Field name → message, ordered for stable JSON output.
pub type ValidationErrors = BTreeMap<&'static str, String>;

pub fn ok(data: serde_json::Value) -> Response {
    (StatusCode::OK, AxumJson(json!({ "success": true, "data": data }))).into_response()
}

pub fn created(data: serde_json::Value) -> Response {
    (StatusCode::CREATED, AxumJson(json!({ "success": true, "data": data }))).into_response()
}

pub fn not_found(message: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        AxumJson(json!({ "success": false, "message": message })),
    )
        .into_response()
}

pub fn validation_failed(errors: ValidationErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        AxumJson(json!({
            "success": false,
            "message": "Validation failed",
            "errors": errors,
        })),
    )
        .into_response()
}

pub fn db_error(context: &str, err: anyhow::Error) -> Response {
    tracing::error!("{}: {}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        AxumJson(json!({ "success": false, "message": "Database Error" })),
    )
        .into_response()
}

pub fn parse_date_field(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field, format!("'{}' is not a valid date (YYYY-MM-DD)", value));
            None
        }
    }
}

/// Absent and blank both mean "no bound"; a present malformed value is an error.
pub fn parse_date_param(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<String>,
) -> Option<NaiveDate> {
    let raw = value.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    parse_date_field(errors, field, raw)
}

pub fn parse_time_field(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<String> {
    match NaiveTime::parse_from_str(value, "%H:%M") {
        Ok(time) => Some(time.format("%H:%M").to_string()),
        Err(_) => {
            errors.insert(field, format!("'{}' is not a valid time (HH:MM)", value));
            None
        }
    }
}

pub fn require_amount(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<f64>,
) -> Option<f64> {
    match value {
        None => {
            errors.insert(field, "amount is required".to_string());
            None
        }
        Some(v) if !v.is_finite() => {
            errors.insert(field, "amount must be a number".to_string());
            None
        }
        Some(v) if v < 0.0 => {
            errors.insert(field, "amount must not be negative".to_string());
            None
        }
        Some(v) => Some(v),
    }
}

pub fn require_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<String>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.insert(field, format!("{} is required", field));
            None
        }
    }
}

/// Optional free text: blank collapses to None.
pub fn clean_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_param_ignores_absent_and_blank() {
        let mut errors = ValidationErrors::new();
        assert!(parse_date_param(&mut errors, "from", &None).is_none());
        assert!(parse_date_param(&mut errors, "from", &Some("  ".to_string())).is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn date_param_rejects_malformed() {
        let mut errors = ValidationErrors::new();
        assert!(parse_date_param(&mut errors, "from", &Some("01-2025".to_string())).is_none());
        assert!(errors.contains_key("from"));
    }

    #[test]
    fn amount_rules() {
        let mut errors = ValidationErrors::new();
        assert_eq!(require_amount(&mut errors, "amount", Some(0.0)), Some(0.0));
        assert!(errors.is_empty());

        assert!(require_amount(&mut errors, "amount", Some(-1.0)).is_none());
        assert!(errors.contains_key("amount"));

        errors.clear();
        assert!(require_amount(&mut errors, "amount", None).is_none());
        assert!(errors.contains_key("amount"));
    }

    #[test]
    fn optional_text_collapses_blank() {
        assert_eq!(clean_optional(&Some("  ".to_string())), None);
        assert_eq!(
            clean_optional(&Some(" kajian ".to_string())),
            Some("kajian".to_string())
        );
    }
}
