//! Admin session gate.
//!
//! A single administrator signs in with the configured email and password
//! and receives an opaque session token. Credentials are compared in
//! constant time to mitigate timing attacks.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use crate::config::MAX_SESSION_TTL_HOURS;
use crate::errors::{AppError, ErrorResponse};

/// Header carrying the session token, as an alternative to a bearer token.
pub const SESSION_HEADER: &str = "x-session-token";

/// Cookie carrying the session token for browser clients.
pub const SESSION_COOKIE: &str = "wedding_admin";

/// The administrator account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

/// An issued admin session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Login form body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication state reported to the admin page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub authenticated: bool,
    pub gate_enabled: bool,
}

/// Session store for the single admin account.
pub struct AdminGate {
    credentials: Option<AdminCredentials>,
    sessions: RwLock<HashMap<String, AdminSession>>,
    ttl: Duration,
}

impl AdminGate {
    /// Create a gate. With no credentials every request is treated as admin.
    pub fn new(credentials: Option<AdminCredentials>, ttl_hours: i64) -> Self {
        Self {
            credentials,
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::hours(ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    /// Check credentials and open a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminSession, AppError> {
        let Some(expected) = &self.credentials else {
            return Err(AppError::BadRequest(
                "No admin account is configured".to_string(),
            ));
        };

        // Evaluate both comparisons so timing does not reveal which one failed.
        let email_ok = constant_time_compare(email.trim(), &expected.email);
        let password_ok = constant_time_compare(password, &expected.password);
        if !(email_ok & password_ok) {
            tracing::warn!("Rejected admin login attempt");
            return Err(AppError::Unauthorized("Invalid email or password".to_string()));
        }

        let session = AdminSession {
            token: uuid::Uuid::new_v4().to_string(),
            email: expected.email.clone(),
            expires_at: Utc::now() + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(session.token.clone(), session.clone());

        tracing::info!("Admin signed in");
        Ok(session)
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) {
        if self.sessions.write().await.remove(token).is_some() {
            tracing::info!("Admin signed out");
        }
    }

    /// Whether the token belongs to a live session.
    pub async fn is_authenticated(&self, token: Option<&str>) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let Some(token) = token else {
            return false;
        };

        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .is_some_and(|session| session.expires_at > Utc::now())
    }

    pub async fn status(&self, token: Option<&str>) -> SessionStatus {
        SessionStatus {
            authenticated: self.is_authenticated(token).await,
            gate_enabled: self.is_enabled(),
        }
    }
}

/// Extract the session token from bearer, header or cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "));
    let explicit = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok());

    bearer
        .or(explicit)
        .map(|s| s.trim().to_string())
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
        .filter(|s| !s.is_empty())
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value for a freshly issued session.
pub fn session_cookie(session: &AdminSession, ttl_hours: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE,
        session.token,
        ttl_hours.clamp(1, MAX_SESSION_TTL_HOURS) * 3600
    )
}

/// `Set-Cookie` value that clears the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE)
}

/// Middleware guarding the admin routes.
pub async fn admin_auth_layer(gate: Arc<AdminGate>, request: Request, next: Next) -> Response {
    let token = session_token(request.headers());

    if gate.is_authenticated(token.as_deref()).await {
        next.run(request).await
    } else {
        unauthorized_response(if token.is_some() {
            "Session expired or invalid"
        } else {
            "Admin login required"
        })
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Create an unauthorized response.
fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse::new(&AppError::Unauthorized(message.to_string()), 0);
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}
