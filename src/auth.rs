use std::env;
use std::future::Future;

use axum::{
    extract::{FromRequestParts, Json},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

const SESSION_COOKIE_NAME: &str = "masjidku_session";

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize, Clone)]
pub struct AdminProfile {
    pub username: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    exp: usize,
    iss: Option<String>,
}

/// Extractor for handlers behind the admin session boundary.
pub struct AdminSession {
    pub username: String,
    pub name: String,
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync + 'static,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let token = extract_token(parts).ok_or_else(|| unauthorized("Missing session token"))?;
            let claims = validate_token(&token).map_err(|e| {
                tracing::warn!("Session token rejected: {}", e);
                unauthorized("Invalid session token")
            })?;

            Ok(AdminSession {
                username: claims.sub,
                name: claims.name,
            })
        }
    }
}

fn unauthorized(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": message })),
    )
}

pub async fn login(Json(payload): Json<LoginRequest>) -> impl IntoResponse {
    let admin_user = match env::var("ADMIN_USERNAME") {
        Ok(v) => v,
        Err(_) => {
            tracing::error!("ADMIN_USERNAME not set");
            return server_error("Server configuration error");
        }
    };
    let password_hash = match env::var("ADMIN_PASSWORD_HASH") {
        Ok(v) => v,
        Err(_) => {
            tracing::error!("ADMIN_PASSWORD_HASH not set");
            return server_error("Server configuration error");
        }
    };

    let password_ok = bcrypt::verify(&payload.password, &password_hash).unwrap_or(false);
    if payload.username != admin_user || !password_ok {
        return unauthorized("Invalid credentials").into_response();
    }

    let profile = AdminProfile {
        username: payload.username,
        name: env::var("ADMIN_DISPLAY_NAME").unwrap_or_else(|_| "Pengurus Masjid".to_string()),
    };

    match create_session_token(&profile) {
        Ok(token) => {
            let cookie = build_session_cookie(&token);
            let mut response =
                Json(json!({ "success": true, "data": profile })).into_response();
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().insert(header::SET_COOKIE, value);
                    response
                }
                Err(e) => {
                    tracing::error!("Session cookie build failed: {}", e);
                    server_error("Login failed")
                }
            }
        }
        Err(e) => {
            tracing::error!("Session token creation failed: {}", e);
            server_error("Login failed")
        }
    }
}

pub async fn logout() -> impl IntoResponse {
    let cookie = clear_session_cookie();
    let mut response = Json(json!({ "success": true, "data": null })).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

pub async fn me(session: AdminSession) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "data": AdminProfile { username: session.username, name: session.name },
    }))
}

fn server_error(message: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

fn create_session_token(profile: &AdminProfile) -> anyhow::Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(12))
        .ok_or_else(|| anyhow::anyhow!("session expiry overflow"))?
        .timestamp();

    let claims = Claims {
        sub: profile.username.clone(),
        name: profile.name.clone(),
        exp: expiration as usize,
        iss: env::var("JWT_ISSUER").ok(),
    };

    let secret = env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?;
    Ok(token)
}

fn validate_token(token: &str) -> anyhow::Result<Claims> {
    let secret = env::var("JWT_SECRET")
        .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;
    let mut validation = Validation::default();
    validation.validate_exp = true;
    if let Ok(issuer) = env::var("JWT_ISSUER") {
        validation.set_issuer(&[issuer.as_str()]);
    }
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)?;
    Ok(data.claims)
}

/// Used by the router middleware guarding /api/admin and /admin pages.
pub fn validate_token_str(token: &str) -> anyhow::Result<()> {
    validate_token(token).map(|_| ())
}

pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE).and_then(|h| h.to_str().ok()) {
        for cookie in cookie_header.split(';') {
            let cookie = cookie.trim();
            if let Some((k, v)) = cookie.split_once('=') {
                if k == SESSION_COOKIE_NAME {
                    return Some(v.to_string());
                }
            }
        }
    }
    None
}

fn extract_token(parts: &Parts) -> Option<String> {
    extract_token_from_headers(&parts.headers)
}

fn build_session_cookie(token: &str) -> String {
    let secure = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production";
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=43200",
        SESSION_COOKIE_NAME, token
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie() -> String {
    let secure = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string()) == "production";
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        SESSION_COOKIE_NAME
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
