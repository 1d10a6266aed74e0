use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::db::{self, models::Event};
use crate::format::format_date_id;
use crate::AppState;

use super::{
    clean_optional, created, db_error, not_found, ok, parse_date_field, parse_time_field,
    require_text, validation_failed, ValidationErrors,
};

#[derive(Deserialize)]
pub struct EventListParams {
    /// "true" limits the listing to today and later.
    pub upcoming: Option<bool>,
}

#[derive(Deserialize)]
pub struct EventRequest {
    pub title: Option<String>,
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

fn validate_event(
    req: &EventRequest,
) -> Result<(String, chrono::NaiveDate, Option<String>, String, Option<String>), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title = require_text(&mut errors, "title", &req.title);
    let date = parse_date_field(&mut errors, "date", req.date.trim());
    let location = require_text(&mut errors, "location", &req.location);
    let time = match req.time.as_deref().map(str::trim) {
        None | Some("") => Some(None),
        Some(raw) => parse_time_field(&mut errors, "time", raw).map(Some),
    };

    match (title, date, location, time) {
        (Some(title), Some(date), Some(location), Some(time)) if errors.is_empty() => {
            Ok((title, date, time, location, clean_optional(&req.description)))
        }
        _ => Err(errors),
    }
}

fn event_payload(event: &Event) -> serde_json::Value {
    json!({
        "id": event.id,
        "title": event.title,
        "date": event.date,
        "date_formatted": format_date_id(event.date),
        "time": event.time,
        "location": event.location,
        "description": event.description,
        "created_at": event.created_at,
        "updated_at": event.updated_at,
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<EventListParams>,
) -> Response {
    let after = if params.upcoming.unwrap_or(false) {
        Some(Utc::now().date_naive())
    } else {
        None
    };

    match db::list_events(&state.db, after) {
        Ok(events) => {
            let events: Vec<serde_json::Value> = events.iter().map(event_payload).collect();
            ok(json!({ "events": events }))
        }
        Err(e) => db_error("List events failed", e),
    }
}

pub async fn get(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    match db::get_event(&state.db, &id) {
        Ok(Some(event)) => ok(event_payload(&event)),
        Ok(None) => not_found("Event not found"),
        Err(e) => db_error("Get event failed", e),
    }
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<EventRequest>,
) -> Response {
    let (title, date, time, location, description) = match validate_event(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let now = Utc::now();
    let event = Event {
        id: Uuid::new_v4().to_string(),
        title,
        date,
        time,
        location,
        description,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = db::insert_event(&state.db, &event) {
        return db_error("Create event failed", e);
    }
    created(event_payload(&event))
}

pub async fn update(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<EventRequest>,
) -> Response {
    let (title, date, time, location, description) = match validate_event(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let existing = match db::get_event(&state.db, &id) {
        Ok(Some(event)) => event,
        Ok(None) => return not_found("Event not found"),
        Err(e) => return db_error("Get event failed", e),
    };

    let event = Event {
        id,
        title,
        date,
        time,
        location,
        description,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match db::update_event(&state.db, &event) {
        Ok(true) => ok(event_payload(&event)),
        Ok(false) => not_found("Event not found"),
        Err(e) => db_error("Update event failed", e),
    }
}

pub async fn delete(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::delete_event(&state.db, &id) {
        Ok(true) => ok(json!({ "deleted": id })),
        Ok(false) => not_found("Event not found"),
        Err(e) => db_error("Delete event failed", e),
    }
}
