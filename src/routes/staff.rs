use axum::{
    extract::{Json, Path, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::db::{self, models::StaffMember};
use crate::AppState;

use super::{
    clean_optional, created, db_error, not_found, ok, require_text, validation_failed,
    ValidationErrors,
};

#[derive(Deserialize)]
pub struct StaffRequest {
    pub name: Option<String>,
    pub position: Option<String>,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
}

fn validate_staff(req: &StaffRequest) -> Result<(String, String), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = require_text(&mut errors, "name", &req.name);
    let position = require_text(&mut errors, "position", &req.position);

    match (name, position) {
        (Some(name), Some(position)) if errors.is_empty() => Ok((name, position)),
        _ => Err(errors),
    }
}

pub async fn list(State(state): State<AppState>) -> Response {
    match db::list_staff(&state.db) {
        Ok(members) => ok(json!({ "staff": members })),
        Err(e) => db_error("List staff failed", e),
    }
}

pub async fn get(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::get_staff(&state.db, &id) {
        Ok(Some(member)) => ok(json!(member)),
        Ok(None) => not_found("Staff member not found"),
        Err(e) => db_error("Get staff member failed", e),
    }
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<StaffRequest>,
) -> Response {
    let (name, position) = match validate_staff(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let now = Utc::now();
    let member = StaffMember {
        id: Uuid::new_v4().to_string(),
        name,
        position,
        specialty: clean_optional(&req.specialty),
        phone: clean_optional(&req.phone),
        email: clean_optional(&req.email),
        bio: clean_optional(&req.bio),
        photo_url: clean_optional(&req.photo_url),
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = db::insert_staff(&state.db, &member) {
        return db_error("Create staff member failed", e);
    }
    created(json!(member))
}

pub async fn update(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<StaffRequest>,
) -> Response {
    let (name, position) = match validate_staff(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let existing = match db::get_staff(&state.db, &id) {
        Ok(Some(member)) => member,
        Ok(None) => return not_found("Staff member not found"),
        Err(e) => return db_error("Get staff member failed", e),
    };

    let member = StaffMember {
        id,
        name,
        position,
        specialty: clean_optional(&req.specialty),
        phone: clean_optional(&req.phone),
        email: clean_optional(&req.email),
        bio: clean_optional(&req.bio),
        photo_url: clean_optional(&req.photo_url),
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match db::update_staff(&state.db, &member) {
        Ok(true) => ok(json!(member)),
        Ok(false) => not_found("Staff member not found"),
        Err(e) => db_error("Update staff member failed", e),
    }
}

pub async fn delete(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::delete_staff(&state.db, &id) {
        Ok(true) => ok(json!({ "deleted": id })),
        Ok(false) => not_found("Staff member not found"),
        Err(e) => db_error("Delete staff member failed", e),
    }
}
