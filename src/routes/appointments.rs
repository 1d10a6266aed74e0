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
    models::{Appointment, AppointmentStatus},
};
use crate::AppState;

use super::{
    clean_optional, created, db_error, not_found, ok, parse_date_field, parse_time_field,
    require_text, validation_failed, ValidationErrors,
};

#[derive(Deserialize)]
pub struct AppointmentListParams {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AppointmentRequest {
    pub requester_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: String,
    pub time: String,
    pub ustadz_id: Option<String>,
    pub topic: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
struct ValidatedAppointment {
    requester_name: String,
    email: Option<String>,
    phone: Option<String>,
    date: chrono::NaiveDate,
    time: String,
    ustadz_id: Option<String>,
    topic: String,
    description: Option<String>,
    status: AppointmentStatus,
}

fn validate_appointment(req: &AppointmentRequest) -> Result<ValidatedAppointment, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let requester_name = require_text(&mut errors, "requester_name", &req.requester_name);
    let date = parse_date_field(&mut errors, "date", req.date.trim());
    let time = parse_time_field(&mut errors, "time", req.time.trim());
    let topic = require_text(&mut errors, "topic", &req.topic);
    let status = match req.status.as_deref().map(str::trim) {
        None | Some("") => Some(AppointmentStatus::Pending),
        Some(raw) => match AppointmentStatus::parse(raw) {
            Some(s) => Some(s),
            None => {
                errors.insert(
                    "status",
                    format!("'{}' must be one of pending, confirmed, cancelled, completed", raw),
                );
                None
            }
        },
    };

    match (requester_name, date, time, topic, status) {
        (Some(requester_name), Some(date), Some(time), Some(topic), Some(status))
            if errors.is_empty() =>
        {
            Ok(ValidatedAppointment {
                requester_name,
                email: clean_optional(&req.email),
                phone: clean_optional(&req.phone),
                date,
                time,
                ustadz_id: clean_optional(&req.ustadz_id),
                topic,
                description: clean_optional(&req.description),
                status,
            })
        }
        _ => Err(errors),
    }
}

fn build_appointment(fields: ValidatedAppointment, status: AppointmentStatus) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4().to_string(),
        requester_name: fields.requester_name,
        email: fields.email,
        phone: fields.phone,
        date: fields.date,
        time: fields.time,
        ustadz_id: fields.ustadz_id,
        topic: fields.topic,
        description: fields.description,
        status,
        created_at: now,
        updated_at: now,
    }
}

/// Public consultation request; always enters the queue as pending.
pub async fn submit(
    State(state): State<AppState>,
    Json(req): Json<AppointmentRequest>,
) -> Response {
    let fields = match validate_appointment(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let appointment = build_appointment(fields, AppointmentStatus::Pending);
    if let Err(e) = db::insert_appointment(&state.db, &appointment) {
        return db_error("Submit appointment failed", e);
    }
    created(json!(appointment))
}

pub async fn list(
    State(state): State<AppState>,
    _session: AdminSession,
    Query(params): Query<AppointmentListParams>,
) -> Response {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match AppointmentStatus::parse(raw) {
            Some(s) => Some(s),
            None => {
                let mut errors = ValidationErrors::new();
                errors.insert(
                    "status",
                    format!("'{}' must be one of pending, confirmed, cancelled, completed", raw),
                );
                return validation_failed(errors);
            }
        },
    };

    match db::list_appointments(&state.db, status) {
        Ok(appointments) => ok(json!({ "appointments": appointments })),
        Err(e) => db_error("List appointments failed", e),
    }
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<AppointmentRequest>,
) -> Response {
    let fields = match validate_appointment(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let status = fields.status;
    let appointment = build_appointment(fields, status);
    if let Err(e) = db::insert_appointment(&state.db, &appointment) {
        return db_error("Create appointment failed", e);
    }
    created(json!(appointment))
}

pub async fn get(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::get_appointment(&state.db, &id) {
        Ok(Some(appointment)) => ok(json!(appointment)),
        Ok(None) => not_found("Appointment not found"),
        Err(e) => db_error("Get appointment failed", e),
    }
}

/// Full-payload update; status transitions ride the same endpoint.
pub async fn update(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<AppointmentRequest>,
) -> Response {
    let fields = match validate_appointment(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let existing = match db::get_appointment(&state.db, &id) {
        Ok(Some(appointment)) => appointment,
        Ok(None) => return not_found("Appointment not found"),
        Err(e) => return db_error("Get appointment failed", e),
    };

    let appointment = Appointment {
        id,
        requester_name: fields.requester_name,
        email: fields.email,
        phone: fields.phone,
        date: fields.date,
        time: fields.time,
        ustadz_id: fields.ustadz_id,
        topic: fields.topic,
        description: fields.description,
        status: fields.status,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match db::update_appointment(&state.db, &appointment) {
        Ok(true) => ok(json!(appointment)),
        Ok(false) => not_found("Appointment not found"),
        Err(e) => db_error("Update appointment failed", e),
    }
}

pub async fn delete(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::delete_appointment(&state.db, &id) {
        Ok(true) => ok(json!({ "deleted": id })),
        Ok(false) => not_found("Appointment not found"),
        Err(e) => db_error("Delete appointment failed", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_required_fields() {
        let req = AppointmentRequest {
            requester_name: None,
            email: None,
            phone: None,
            date: "2025-03-10".to_string(),
            time: "25:99".to_string(),
            ustadz_id: None,
            topic: None,
            description: None,
            status: None,
        };
        let errors = validate_appointment(&req).unwrap_err();
        assert!(errors.contains_key("requester_name"));
        assert!(errors.contains_key("time"));
        assert!(errors.contains_key("topic"));
    }

    #[test]
    fn normalizes_time_and_defaults_status() {
        let req = AppointmentRequest {
            requester_name: Some("Ibu Siti".to_string()),
            email: None,
            phone: Some("0812000111".to_string()),
            date: "2025-03-10".to_string(),
            time: "9:05".to_string(),
            ustadz_id: None,
            topic: Some("Konsultasi zakat".to_string()),
            description: None,
            status: None,
        };
        let fields = validate_appointment(&req).unwrap();
        assert_eq!(fields.time, "09:05");
        assert_eq!(fields.status, AppointmentStatus::Pending);
    }
}
