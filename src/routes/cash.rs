use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::db::{self, models::CashEntry, models::Direction, CashFilter, CashSummary};
use crate::format::{format_rupiah, month_name_id};
use crate::AppState;

use super::{
    clean_optional, created, db_error, not_found, ok, parse_date_field, parse_date_param,
    require_amount, require_text, validation_failed, ValidationErrors,
};

#[derive(Deserialize)]
pub struct CashListParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub direction: Option<String>,
}

#[derive(Deserialize)]
pub struct MonthlyParams {
    pub year: Option<i32>,
}

#[derive(Deserialize)]
pub struct CashEntryRequest {
    pub date: String,
    pub direction: String,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
}

fn parse_filter(params: &CashListParams) -> Result<CashFilter, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let from = parse_date_param(&mut errors, "from", &params.from);
    let to = parse_date_param(&mut errors, "to", &params.to);
    let direction = match params.direction.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match Direction::parse(raw) {
            Some(d) => Some(d),
            None => {
                errors.insert("direction", format!("'{}' must be 'in' or 'out'", raw));
                None
            }
        },
    };

    if errors.is_empty() {
        Ok(CashFilter { from, to, direction })
    } else {
        Err(errors)
    }
}

fn validate_entry(
    req: &CashEntryRequest,
) -> Result<(NaiveDate, Direction, f64, String, Option<String>), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let date = parse_date_field(&mut errors, "date", req.date.trim());
    let direction = match Direction::parse(req.direction.trim()) {
        Some(d) => Some(d),
        None => {
            errors.insert("direction", "direction must be 'in' or 'out'".to_string());
            None
        }
    };
    let amount = require_amount(&mut errors, "amount", req.amount);
    let category = require_text(&mut errors, "category", &req.category);

    match (date, direction, amount, category) {
        (Some(date), Some(direction), Some(amount), Some(category)) if errors.is_empty() => {
            Ok((date, direction, amount, category, clean_optional(&req.description)))
        }
        _ => Err(errors),
    }
}

fn summary_payload(summary: &CashSummary) -> serde_json::Value {
    json!({
        "total_in": summary.total_in,
        "total_out": summary.total_out,
        "balance": summary.balance,
        "total_in_formatted": format_rupiah(summary.total_in),
        "total_out_formatted": format_rupiah(summary.total_out),
        "balance_formatted": format_rupiah(summary.balance),
    })
}

/// Public and admin listing: entries newest first plus derived totals over the
/// same filter.
pub async fn list_cash(
    State(state): State<AppState>,
    Query(params): Query<CashListParams>,
) -> Response {
    let filter = match parse_filter(&params) {
        Ok(f) => f,
        Err(errors) => return validation_failed(errors),
    };

    let entries = match db::list_cash_entries(&state.db, &filter) {
        Ok(entries) => entries,
        Err(e) => return db_error("List cash entries failed", e),
    };
    let summary = match db::cash_summary(&state.db, &filter) {
        Ok(summary) => summary,
        Err(e) => return db_error("Cash summary failed", e),
    };

    ok(json!({ "entries": entries, "summary": summary_payload(&summary) }))
}

pub async fn create_cash(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<CashEntryRequest>,
) -> Response {
    let (date, direction, amount, category, description) = match validate_entry(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let now = Utc::now();
    let entry = CashEntry {
        id: Uuid::new_v4().to_string(),
        date,
        direction,
        amount,
        category,
        description,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = db::insert_cash_entry(&state.db, &entry) {
        return db_error("Create cash entry failed", e);
    }
    created(json!(entry))
}

pub async fn get_cash(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::get_cash_entry(&state.db, &id) {
        Ok(Some(entry)) => ok(json!(entry)),
        Ok(None) => not_found("Cash entry not found"),
        Err(e) => db_error("Get cash entry failed", e),
    }
}

pub async fn update_cash(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<CashEntryRequest>,
) -> Response {
    let (date, direction, amount, category, description) = match validate_entry(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let existing = match db::get_cash_entry(&state.db, &id) {
        Ok(Some(entry)) => entry,
        Ok(None) => return not_found("Cash entry not found"),
        Err(e) => return db_error("Get cash entry failed", e),
    };

    let entry = CashEntry {
        id,
        date,
        direction,
        amount,
        category,
        description,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match db::update_cash_entry(&state.db, &entry) {
        Ok(true) => ok(json!(entry)),
        Ok(false) => not_found("Cash entry not found"),
        Err(e) => db_error("Update cash entry failed", e),
    }
}

pub async fn delete_cash(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::delete_cash_entry(&state.db, &id) {
        Ok(true) => ok(json!({ "deleted": id })),
        Ok(false) => not_found("Cash entry not found"),
        Err(e) => db_error("Delete cash entry failed", e),
    }
}

/// Totals over the filter plus month-to-date figures for the dashboard.
pub async fn summary(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<CashListParams>,
) -> Response {
    let filter = match parse_filter(&params) {
        Ok(f) => f,
        Err(errors) => return validation_failed(errors),
    };

    let overall = match db::cash_summary(&state.db, &filter) {
        Ok(summary) => summary,
        Err(e) => return db_error("Cash summary failed", e),
    };
    let month_to_date = match db::month_to_date_summary(&state.db, Utc::now().date_naive()) {
        Ok(summary) => summary,
        Err(e) => return db_error("Month-to-date summary failed", e),
    };

    ok(json!({
        "summary": summary_payload(&overall),
        "month_to_date": summary_payload(&month_to_date),
    }))
}

pub async fn monthly(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<MonthlyParams>,
) -> Response {
    let year = params.year.unwrap_or_else(|| {
        use chrono::Datelike;
        Utc::now().date_naive().year()
    });

    match db::monthly_totals(&state.db, year) {
        Ok(buckets) => {
            let months: Vec<serde_json::Value> = buckets
                .iter()
                .map(|b| {
                    json!({
                        "year": b.year,
                        "month": b.month,
                        "label": format!("{} {}", month_name_id(b.month).unwrap_or("-"), b.year),
                        "total_in": b.total_in,
                        "total_out": b.total_out,
                        "total_in_formatted": format_rupiah(b.total_in),
                        "total_out_formatted": format_rupiah(b.total_out),
                    })
                })
                .collect();
            ok(json!({ "year": year, "months": months }))
        }
        Err(e) => db_error("Monthly totals failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_validation_collects_field_errors() {
        let req = CashEntryRequest {
            date: "not-a-date".to_string(),
            direction: "sideways".to_string(),
            amount: Some(-5.0),
            category: None,
            description: None,
        };
        let errors = validate_entry(&req).unwrap_err();
        assert!(errors.contains_key("date"));
        assert!(errors.contains_key("direction"));
        assert!(errors.contains_key("amount"));
        assert!(errors.contains_key("category"));
    }

    #[test]
    fn entry_validation_accepts_complete_payload() {
        let req = CashEntryRequest {
            date: "2025-01-15".to_string(),
            direction: "in".to_string(),
            amount: Some(250000.0),
            category: Some("Infaq Jumat".to_string()),
            description: Some("  ".to_string()),
        };
        let (date, direction, amount, category, description) = validate_entry(&req).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(direction, Direction::In);
        assert_eq!(amount, 250000.0);
        assert_eq!(category, "Infaq Jumat");
        assert_eq!(description, None);
    }

    #[test]
    fn filter_rejects_bad_direction() {
        let params = CashListParams {
            from: None,
            to: None,
            direction: Some("inout".to_string()),
        };
        let errors = parse_filter(&params).unwrap_err();
        assert!(errors.contains_key("direction"));
    }
}
