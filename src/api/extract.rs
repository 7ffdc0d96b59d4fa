//! Realm gates as axum extractors.
//!
//! A handler that takes `CurrentUser` or `CurrentAdmin` runs only if the
//! request carries a live session token for that realm, either as the
//! realm's cookie or as `Authorization: Bearer <token>`. A denied request
//! gets a 401 and a response that deletes the realm's cookie.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    response::{IntoResponse, Response},
};
use axum::Json;
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    WithRejection,
};
use std::sync::Arc;

use super::error::ApiError;
use crate::auth::{gate, GateDecision, SessionAuthority};
use crate::db::{AdminIdentity, AdminRole, UserIdentity};
use crate::AppState;

/// JSON body whose rejections render as `ApiError`
pub type ApiJson<T> = WithRejection<Json<T>, ApiError>;

/// Token from `Authorization: Bearer`, falling back to the named cookie
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

/// HttpOnly session cookie carrying `token`
pub fn session_cookie(name: &str, token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Jar whose only entry expires the named session cookie on the client
pub fn clear_session_cookie(name: &str) -> CookieJar {
    let mut cookie = Cookie::build((name.to_string(), "")).path("/").build();
    cookie.make_removal();
    CookieJar::new().add(cookie)
}

/// A gate denial (401, clears the realm's cookie) or a store failure (500)
#[derive(Debug)]
pub struct GateRejection {
    error: ApiError,
    clear_cookie: Option<String>,
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self.clear_cookie {
            Some(name) => (clear_session_cookie(&name), self.error).into_response(),
            None => self.error.into_response(),
        }
    }
}

async fn run_gate<A>(
    authority: &A,
    parts: &Parts,
    cookie_name: &str,
) -> Result<(A::Identity, String), GateRejection>
where
    A: SessionAuthority,
{
    let deny = || GateRejection {
        error: ApiError::unauthorized("Authentication required"),
        clear_cookie: Some(cookie_name.to_string()),
    };

    let token = session_token(&parts.headers, cookie_name);
    let decision = gate::check(authority, token.as_deref())
        .await
        .map_err(|e| GateRejection {
            error: ApiError::from(e),
            clear_cookie: None,
        })?;

    match (decision, token) {
        (GateDecision::Authorized(identity), Some(token)) => Ok((identity, token)),
        (GateDecision::Denied(reason), _) => {
            tracing::debug!(realm = %authority.realm(), %reason, "Gate denied request");
            Err(deny())
        }
        (GateDecision::Authorized(_), None) => Err(deny()),
    }
}

/// An authenticated student
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: UserIdentity,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (identity, token) =
            run_gate(&state.users, parts, &state.config.auth.user_cookie_name).await?;
        Ok(CurrentUser { identity, token })
    }
}

/// An authenticated back-office admin
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub identity: AdminIdentity,
    pub token: String,
}

impl CurrentAdmin {
    pub fn require_role(&self, role: AdminRole) -> Result<(), ApiError> {
        if self.identity.role.satisfies(role) {
            Ok(())
        } else {
            tracing::warn!(
                admin_id = self.identity.id,
                required = %role,
                "Admin lacks required role"
            );
            Err(ApiError::forbidden(format!("Requires {} role", role)))
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentAdmin {
    type Rejection = GateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (identity, token) =
            run_gate(&state.admins, parts, &state.config.auth.admin_cookie_name).await?;
        Ok(CurrentAdmin { identity, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::SET_COOKIE, HeaderValue, StatusCode};

    #[test]
    fn test_bearer_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        headers.insert("cookie", HeaderValue::from_static("portal_session=from-cookie"));
        assert_eq!(session_token(&headers, "portal_session").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_is_realm_specific() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("portal_session=tok"));
        assert_eq!(session_token(&headers, "portal_session").as_deref(), Some("tok"));
        assert!(session_token(&headers, "portal_admin_session").is_none());
    }

    #[test]
    fn test_malformed_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert!(session_token(&headers, "portal_session").is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(session_token(&headers, "portal_session").is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("portal_session", "tok".to_string(), true);
        assert_eq!(cookie.name(), "portal_session");
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_rejection_clears_cookie() {
        let rejection = GateRejection {
            error: ApiError::unauthorized("Authentication required"),
            clear_cookie: Some("portal_session".to_string()),
        };
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(set_cookie.starts_with("portal_session=;"));
        assert!(set_cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_store_failure_keeps_cookie() {
        let rejection = GateRejection {
            error: ApiError::database("A database error occurred"),
            clear_cookie: None,
        };
        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
