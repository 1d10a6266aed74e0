use axum::{
    extract::{Json, Path, State},
    response::Response,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::db::{self, models::NewsPost};
use crate::format::format_date_id;
use crate::AppState;

use super::{
    clean_optional, created, db_error, not_found, ok, parse_date_field, require_text,
    validation_failed, ValidationErrors,
};

#[derive(Deserialize)]
pub struct NewsRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub author: Option<String>,
    pub published_on: Option<String>,
}

fn validate_news(
    req: &NewsRequest,
) -> Result<(String, String, Option<String>, chrono::NaiveDate), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let title = require_text(&mut errors, "title", &req.title);
    let body = require_text(&mut errors, "body", &req.body);
    let published_on = match req.published_on.as_deref().map(str::trim) {
        None | Some("") => Some(Utc::now().date_naive()),
        Some(raw) => parse_date_field(&mut errors, "published_on", raw),
    };

    match (title, body, published_on) {
        (Some(title), Some(body), Some(published_on)) if errors.is_empty() => {
            Ok((title, body, clean_optional(&req.author), published_on))
        }
        _ => Err(errors),
    }
}

fn news_payload(post: &NewsPost) -> serde_json::Value {
    json!({
        "id": post.id,
        "title": post.title,
        "body": post.body,
        "author": post.author,
        "published_on": post.published_on,
        "published_on_formatted": format_date_id(post.published_on),
        "created_at": post.created_at,
        "updated_at": post.updated_at,
    })
}

pub async fn list(State(state): State<AppState>) -> Response {
    match db::list_news(&state.db) {
        Ok(posts) => {
            let posts: Vec<serde_json::Value> = posts.iter().map(news_payload).collect();
            ok(json!({ "posts": posts }))
        }
        Err(e) => db_error("List news failed", e),
    }
}

pub async fn get(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    match db::get_news(&state.db, &id) {
        Ok(Some(post)) => ok(news_payload(&post)),
        Ok(None) => not_found("News post not found"),
        Err(e) => db_error("Get news post failed", e),
    }
}

pub async fn create(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<NewsRequest>,
) -> Response {
    let (title, body, author, published_on) = match validate_news(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let now = Utc::now();
    let post = NewsPost {
        id: Uuid::new_v4().to_string(),
        title,
        body,
        author,
        published_on,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = db::insert_news(&state.db, &post) {
        return db_error("Create news post failed", e);
    }
    created(news_payload(&post))
}

pub async fn update(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
    Json(req): Json<NewsRequest>,
) -> Response {
    let (title, body, author, published_on) = match validate_news(&req) {
        Ok(fields) => fields,
        Err(errors) => return validation_failed(errors),
    };

    let existing = match db::get_news(&state.db, &id) {
        Ok(Some(post)) => post,
        Ok(None) => return not_found("News post not found"),
        Err(e) => return db_error("Get news post failed", e),
    };

    let post = NewsPost {
        id,
        title,
        body,
        author,
        published_on,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    match db::update_news(&state.db, &post) {
        Ok(true) => ok(news_payload(&post)),
        Ok(false) => not_found("News post not found"),
        Err(e) => db_error("Update news post failed", e),
    }
}

pub async fn delete(
    Path(id): Path<String>,
    State(state): State<AppState>,
    _session: AdminSession,
) -> Response {
    match db::delete_news(&state.db, &id) {
        Ok(true) => ok(json!({ "deleted": id })),
        Ok(false) => not_found("News post not found"),
        Err(e) => db_error("Delete news post failed", e),
    }
}
