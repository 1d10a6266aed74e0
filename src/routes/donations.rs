use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::db::{
    self,
    models::{Donation, DonationCategory, DonationStatus, PaymentMethod, ANONYMOUS_DONOR},
    DonationFilter, DonationStats,
};
use crate::format::format_rupiah;
use crate::AppState;

use super::{
    clean_optional, created, db_error, not_found, ok, parse_date_field, parse_date_param,
    require_amount, validation_failed, ValidationErrors,
};

#[derive(Deserialize)]
pub struct DonationListParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct DonationRequest {
    pub donor_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: String,
    pub category: Option<String>,
    pub program: Option<String>,
    pub amount: Option<f64>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub anonymous: Option<bool>,
    pub description: Option<String>,
}

fn parse_filter(params: &DonationListParams) -> Result<DonationFilter, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let from = parse_date_param(&mut errors, "from", &params.from);
    let to = parse_date_param(&mut errors, "to", &params.to);
    let category = match params.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match DonationCategory::parse(raw) {
            Some(c) => Some(c),
            None => {
                errors.insert(
                    "category",
                    format!("'{}' must be one of infaq, sedekah, zakat", raw),
                );
                None
            }
        },
    };
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match DonationStatus::parse(raw) {
            Some(s) => Some(s),
            None => {
                errors.insert(
                    "status",
                    format!("'{}' must be one of pending, confirmed, cancelled", raw),
                );
                None
            }
        },
    };

    if errors.is_empty() {
        Ok(DonationFilter {
            from,
            to,
            category,
            status,
        })
    } else {
        Err(errors)
    }
}

#[derive(Debug)]
struct ValidatedDonation {
    donor_name: String,
    email: Option<String>,
    phone: Option<String>,
    date: chrono::NaiveDate,
    category: DonationCategory,
    program: Option<String>,
    amount: f64,
    payment_method: PaymentMethod,
    status: DonationStatus,
    anonymous: bool,
    description: Option<String>,
}

fn validate_donation(req: &DonationRequest) -> Result<ValidatedDonation, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let date = parse_date_field(&mut errors, "date", req.date.trim());
    let category = match req.category.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match DonationCategory::parse(raw) {
            Some(c) => Some(c),
            None => {
                errors.insert(
                    "category",
                    format!("'{}' must be one of infaq, sedekah, zakat", raw),
                );
                None
            }
        },
        _ => {
            errors.insert("category", "category is required".to_string());
            None
        }
    };
    let amount = require_amount(&mut errors, "amount", req.amount);
    let payment_method = match req.payment_method.as_deref().map(str::trim) {
        None | Some("") => Some(PaymentMethod::Cash),
        Some(raw) => match PaymentMethod::parse(raw) {
            Some(m) => Some(m),
            None => {
                errors.insert(
                    "payment_method",
                    format!("'{}' must be one of cash, transfer, qris, ewallet", raw),
                );
                None
            }
        },
    };
    let status = match req.status.as_deref().map(str::trim) {
        None | Some("") => Some(DonationStatus::Pending),
        Some(raw) => match DonationStatus::parse(raw) {
            Some(s) => Some(s),
            None => {
                errors.insert(
                    "status",
                    format!("'{}' must be one of pending, confirmed, cancelled", raw),
                );
                None
            }
        },
    };

    let anonymous = req.anonymous.unwrap_or(false);
    let donor_name = match clean_optional(&req.donor_name) {
        Some(name) if !anonymous => name,
        _ => ANONYMOUS_DONOR.to_string(),
    };

    match (date, category, amount, payment_method, status) {
        (Some(date), Some(category), Some(amount), Some(payment_method), Some(status))
            if errors.is_empty() =>
        {
            Ok(ValidatedDonation {
                donor_name,
                email: clean_optional(&req.email),
                phone: clean_optional(&req.phone),
                date,
                category,
                program: clean_optional(&req.program),
                amount,
                payment_method,
                status,
                anonymous,
                description: clean_optional(&req.description),
            })
        }
        _ => Err(errors),
    }
}

fn build_donation(fields: ValidatedDonation, status: DonationStatus) -> Donation {
    let now = Utc::now();
    Donation {
        id: Uuid::new_v4().to_string(),
        donor_name: fields.donor_name,
        email: fields.email,
        phone: fields.phone,
        date: fields.date,
        category: fields.category,
        program: fields.program,
        amount: fields.amount,
        payment_method: fields.payment_method,
        status,
        anonymous: fields.anonymous,
        description: fields.description,
        created_at: now,
        updated_at: now,
    }
}

fn stats_payload(stats: &DonationStats) -> serde_json::Value {
    json!({
        "total": stats.total,
        "count": stats.count,
        "donor_count": stats.donor_count,
        "average": stats.average,
        "total_formatted": format_rupiah(stats.total),
        "average_formatted": format_rupiah(stats.average),
    })
}

/// Public listing: only confirmed donations count toward the public totals.
pub async fn public_list(
    State(state): State<AppState>,
    Query(params): Query<DonationListParams>,
) -> Response {
    let mut filter = match parse_filter(&params) {
        Ok(f) => f,
        Err(errors) => return validation_failed(errors),
    };
    filter.status = Some(DonationStatus::Confirmed);

    let donations = match db::list_donations(&state.db, &filter) {
        Ok(list) => list,
        Err(e) => return db_error("List donations failed", e),
    };
    let stats = match db::donation_stats(&state.db, &filter) {
        Ok(stats) => stats,
        Err(e) => return db_error("Donation stats failed", e),
    };

    ok(json!({ "donations": donations, "stats": stats_payload(&stats) }))
}

/// Public submission; status is forced to pending until an admin confirms it.
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<DonationRequest>,
) -> Response {
    let fields = match validate_donation(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let donation = build_donation(fields, DonationStatus::Pending);
    if let Err(e) = db::insert_donation(&state.db, &donation) {
        return db_error("Submit donation failed", e);
    }
    created(json!(donation))
}

pub async fn admin_list(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<DonationListParams>,
) -> Response {
    let filter = match parse_filter(&params) {
        Ok(f) => f,
        Err(errors) => return validation_failed(errors),
    };

    let donations = match db::list_donations(&state.db, &filter) {
        Ok(list) => list,
        Err(e) => return db_error("List donations failed", e),
    };
    let stats = match db::donation_stats(&state.db, &filter) {
        Ok(stats) => stats,
        Err(e) => return db_error("Donation stats failed", e),
    };

    ok(json!({ "donations": donations, "stats": stats_payload(&stats) }))
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<DonationRequest>,
) -> Response {
    let fields = match validate_donation(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let status = fields.status;
    let donation = build_donation(fields, status);
    if let Err(e) = db::insert_donation(&state.db, &donation) {
        return db_error("Create donation failed", e);
    }
    created(json!(donation))
}

pub async fn get(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::get_donation(&state.db, &id) {
        Ok(Some(donation)) => ok(json!(donation)),
        Ok(None) => not_found("Donation not found"),
        Err(e) => db_error("Get donation failed", e),
    }
}

pub async fn update(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<DonationRequest>,
) -> Response {
    let fields = match validate_donation(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let existing = match db::get_donation(&state.db, &id) {
        Ok(Some(donation)) => donation,
        Ok(None) => return not_found("Donation not found"),
        Err(e) => return db_error("Get donation failed", e),
    };

    let donation = Donation {
        id,
        donor_name: fields.donor_name,
        email: fields.email,
        phone: fields.phone,
        date: fields.date,
        category: fields.category,
        program: fields.program,
        amount: fields.amount,
        payment_method: fields.payment_method,
        status: fields.status,
        anonymous: fields.anonymous,
        description: fields.description,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match db::update_donation(&state.db, &donation) {
        Ok(true) => ok(json!(donation)),
        Ok(false) => not_found("Donation not found"),
        Err(e) => db_error("Update donation failed", e),
    }
}

pub async fn delete(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::delete_donation(&state.db, &id) {
        Ok(true) => ok(json!({ "deleted": id })),
        Ok(false) => not_found("Donation not found"),
        Err(e) => db_error("Delete donation failed", e),
    }
}

pub async fn stats(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<DonationListParams>,
) -> Response {
    let filter = match parse_filter(&params) {
        Ok(f) => f,
        Err(errors) => return validation_failed(errors),
    };

    match db::donation_stats(&state.db, &filter) {
        Ok(stats) => ok(stats_payload(&stats)),
        Err(e) => db_error("Donation stats failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> DonationRequest {
        DonationRequest {
            donor_name: Some("Pak Budi".to_string()),
            email: None,
            phone: None,
            date: "2025-01-01".to_string(),
            category: Some("infaq".to_string()),
            program: None,
            amount: Some(50000.0),
            payment_method: None,
            status: None,
            anonymous: None,
            description: None,
        }
    }

    #[test]
    fn blank_donor_defaults_to_placeholder() {
        let mut req = base_request();
        req.donor_name = Some("   ".to_string());
        let fields = validate_donation(&req).unwrap();
        assert_eq!(fields.donor_name, ANONYMOUS_DONOR);
    }

    #[test]
    fn anonymous_flag_overrides_donor_name() {
        let mut req = base_request();
        req.anonymous = Some(true);
        let fields = validate_donation(&req).unwrap();
        assert_eq!(fields.donor_name, ANONYMOUS_DONOR);
        assert!(fields.anonymous);
    }

    #[test]
    fn payment_method_defaults_to_cash() {
        let fields = validate_donation(&base_request()).unwrap();
        assert_eq!(fields.payment_method, PaymentMethod::Cash);
        assert_eq!(fields.status, DonationStatus::Pending);
    }

    #[test]
    fn rejects_unknown_category_and_negative_amount() {
        let mut req = base_request();
        req.category = Some("hadiah".to_string());
        req.amount = Some(-1.0);
        let errors = validate_donation(&req).unwrap_err();
        assert!(errors.contains_key("category"));
        assert!(errors.contains_key("amount"));
    }
}
