//! The request guard shared by both realms.
//!
//! `check` is independent of HTTP: it takes whatever token the caller
//! extracted and returns a tagged decision. The axum extractors in
//! `api::extract` are thin adapters over it.

use async_trait::async_trait;
use std::fmt;

use super::{AuthError, Realm};

/// Anything that can turn a realm's bearer token into that realm's identity
#[async_trait]
pub trait SessionAuthority: Send + Sync {
    type Identity: Send;

    fn realm(&self) -> Realm;

    /// `Ok(None)` for unknown, expired, revoked or deactivated sessions
    async fn resolve_identity(&self, token: &str) -> Result<Option<Self::Identity>, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingToken,
    InvalidSession,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::MissingToken => f.write_str("missing session token"),
            DenyReason::InvalidSession => f.write_str("invalid or expired session"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision<I> {
    Authorized(I),
    Denied(DenyReason),
}

impl<I> GateDecision<I> {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GateDecision::Authorized(_))
    }
}

/// Resolve `token` against `authority`.
///
/// Store failures are returned as `Err` and are not a denial; the caller
/// decides how to surface them.
pub async fn check<A>(
    authority: &A,
    token: Option<&str>,
) -> Result<GateDecision<A::Identity>, AuthError>
where
    A: SessionAuthority + ?Sized,
{
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(GateDecision::Denied(DenyReason::MissingToken)),
    };

    match authority.resolve_identity(token).await? {
        Some(identity) => Ok(GateDecision::Authorized(identity)),
        None => {
            tracing::debug!(realm = %authority.realm(), "Rejected session token");
            Ok(GateDecision::Denied(DenyReason::InvalidSession))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminAuthenticator, UserAuthenticator};
    use crate::db::{init_in_memory, AdminRole, RegisterAdminRequest, RegisterUserRequest};
    use chrono::Duration;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl SessionAuthority for Fixed {
        type Identity = &'static str;

        fn realm(&self) -> Realm {
            Realm::User
        }

        async fn resolve_identity(&self, _token: &str) -> Result<Option<&'static str>, AuthError> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn test_missing_token_is_denied_without_lookup() {
        let authority = Fixed(Some("asha"));
        assert_eq!(
            check(&authority, None).await.unwrap(),
            GateDecision::Denied(DenyReason::MissingToken)
        );
        assert_eq!(
            check(&authority, Some("   ")).await.unwrap(),
            GateDecision::Denied(DenyReason::MissingToken)
        );
    }

    #[tokio::test]
    async fn test_resolved_identity_passes_through() {
        let decision = check(&Fixed(Some("asha")), Some("token")).await.unwrap();
        assert!(decision.is_authorized());
        assert_eq!(decision, GateDecision::Authorized("asha"));

        let decision = check(&Fixed(None), Some("token")).await.unwrap();
        assert_eq!(decision, GateDecision::Denied(DenyReason::InvalidSession));
        assert!(!decision.is_authorized());
    }

    #[tokio::test]
    async fn test_asha_scenario() {
        let pool = init_in_memory().await.unwrap();
        let users = UserAuthenticator::new(pool.clone(), Duration::hours(24), 6);

        let req = RegisterUserRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            mobile: "9999999999".to_string(),
            password: "secret1".to_string(),
        };
        users.register(&req).await.unwrap();

        let duplicate = RegisterUserRequest {
            mobile: "8888888888".to_string(),
            ..req.clone()
        };
        match users.register(&duplicate).await {
            Err(AuthError::Conflict(msg)) => assert_eq!(msg, "Email already registered"),
            other => panic!("expected conflict, got {:?}", other),
        }

        assert!(matches!(
            users.login("asha@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));

        let outcome = users.login("asha@example.com", "secret1").await.unwrap();
        let identity = serde_json::to_value(&outcome.identity).unwrap();
        assert_eq!(identity["name"], "Asha");
        assert!(identity.get("password_hash").is_none());

        let decision = check(&users, Some(&outcome.token)).await.unwrap();
        assert_eq!(decision, GateDecision::Authorized(outcome.identity.clone()));

        users.logout(&outcome.token).await.unwrap();
        let decision = check(&users, Some(&outcome.token)).await.unwrap();
        assert_eq!(decision, GateDecision::Denied(DenyReason::InvalidSession));
    }

    #[tokio::test]
    async fn test_gates_never_cross_accept() {
        let pool = init_in_memory().await.unwrap();
        let users = UserAuthenticator::new(pool.clone(), Duration::hours(24), 6);
        let admins = AdminAuthenticator::new(pool.clone(), Duration::hours(8), 6);

        users
            .register(&RegisterUserRequest {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                mobile: "9999999999".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        admins
            .register(&RegisterAdminRequest {
                username: "ops".to_string(),
                email: "ops@example.com".to_string(),
                password: "admin-secret".to_string(),
                full_name: "Ops".to_string(),
                role: AdminRole::Admin,
            })
            .await
            .unwrap();

        let user_token = users.login("asha@example.com", "secret1").await.unwrap().token;
        let admin_token = admins.login("ops", "admin-secret").await.unwrap().token;

        assert_eq!(
            check(&admins, Some(&user_token)).await.unwrap(),
            GateDecision::Denied(DenyReason::InvalidSession)
        );
        assert_eq!(
            check(&users, Some(&admin_token)).await.unwrap(),
            GateDecision::Denied(DenyReason::InvalidSession)
        );
        assert!(check(&admins, Some(&admin_token)).await.unwrap().is_authorized());
        assert!(check(&users, Some(&user_token)).await.unwrap().is_authorized());
    }
}
