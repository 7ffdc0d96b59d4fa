//! Session ledger: opaque bearer tokens with an absolute expiry.
//!
//! Each realm owns one table (`user_sessions`, `admin_sessions`) with the
//! same shape. Only the SHA-256 of a token is stored. Expiry is lazy: a row
//! past its deadline stays in the table until [`SessionLedger::purge_expired`]
//! runs, but `resolve` never returns it.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqliteConnection;

use super::token::{generate_token, hash_token};
use super::{AuthError, Realm};
use crate::db::{format_timestamp, SessionRecord};
use crate::DbPool;

/// A freshly minted token. The raw token exists only here and in the
/// client's hands.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionLedger {
    db: DbPool,
    realm: Realm,
    ttl: Duration,
}

impl SessionLedger {
    pub fn new(db: DbPool, realm: Realm, ttl: Duration) -> Self {
        Self { db, realm, ttl }
    }

    pub fn realm(&self) -> Realm {
        self.realm
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `owner_id` valid for the realm's TTL
    pub async fn issue(&self, owner_id: i64) -> Result<IssuedSession, AuthError> {
        let mut conn = self.db.acquire().await?;
        self.issue_in(&mut *conn, owner_id, Utc::now()).await
    }

    /// Insert a session row on an existing connection or transaction
    pub(crate) async fn issue_in(
        &self,
        conn: &mut SqliteConnection,
        owner_id: i64,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        let token = generate_token();
        let session_id = uuid::Uuid::new_v4().to_string();
        let expires_at = now + self.ttl;

        let sql = format!(
            "INSERT INTO {} (id, {}, token_hash, created_at, expires_at) VALUES (?, ?, ?, ?, ?)",
            self.realm.session_table(),
            self.realm.owner_column(),
        );
        sqlx::query(&sql)
            .bind(&session_id)
            .bind(owner_id)
            .bind(hash_token(&token))
            .bind(format_timestamp(now))
            .bind(format_timestamp(expires_at))
            .execute(&mut *conn)
            .await?;

        Ok(IssuedSession {
            session_id,
            token,
            expires_at,
        })
    }

    /// Look up a live session. Read-only: expiry does not slide.
    pub async fn resolve(&self, token: &str) -> Result<Option<SessionRecord>, AuthError> {
        self.resolve_at(token, Utc::now()).await
    }

    pub async fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, AuthError> {
        let sql = format!(
            "SELECT id, {} AS owner_id, created_at, expires_at FROM {} WHERE token_hash = ? AND expires_at > ?",
            self.realm.owner_column(),
            self.realm.session_table(),
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(hash_token(token))
            .bind(format_timestamp(now))
            .fetch_optional(&self.db)
            .await?;
        Ok(record)
    }

    /// Delete the session behind `token`. Unknown and expired tokens are fine.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let sql = format!(
            "DELETE FROM {} WHERE token_hash = ?",
            self.realm.session_table()
        );
        sqlx::query(&sql)
            .bind(hash_token(token))
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Delete every session of one identity; returns the number removed
    #[cfg(test)]
    pub(crate) async fn revoke_all_for(&self, owner_id: i64) -> Result<u64, AuthError> {
        let mut conn = self.db.acquire().await?;
        self.revoke_all_in(&mut *conn, owner_id).await
    }

    pub(crate) async fn revoke_all_in(
        &self,
        conn: &mut SqliteConnection,
        owner_id: i64,
    ) -> Result<u64, AuthError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            self.realm.session_table(),
            self.realm.owner_column(),
        );
        let result = sqlx::query(&sql).bind(owner_id).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// Drop rows whose deadline has passed; returns the number removed
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        self.purge_expired_at(Utc::now()).await
    }

    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        let sql = format!(
            "DELETE FROM {} WHERE expires_at <= ?",
            self.realm.session_table()
        );
        let result = sqlx::query(&sql)
            .bind(format_timestamp(now))
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Rows currently stored, live or not
    #[cfg(test)]
    pub(crate) async fn row_count(&self) -> Result<i64, AuthError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.realm.session_table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.db).await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_in_memory, now_timestamp};

    async fn insert_user(pool: &DbPool, email: &str, mobile: &str) -> i64 {
        sqlx::query(
            "INSERT INTO users (name, email, mobile, password_hash, created_at) VALUES ('Test', ?, ?, 'x', ?)",
        )
        .bind(email)
        .bind(mobile)
        .bind(now_timestamp())
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    async fn ledger() -> (DbPool, SessionLedger, i64) {
        let pool = init_in_memory().await.unwrap();
        let user_id = insert_user(&pool, "asha@example.com", "9999999999").await;
        let ledger = SessionLedger::new(pool.clone(), Realm::User, Duration::hours(24));
        (pool, ledger, user_id)
    }

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let (_pool, ledger, user_id) = ledger().await;

        let issued = ledger.issue(user_id).await.unwrap();
        let record = ledger.resolve(&issued.token).await.unwrap().unwrap();

        assert_eq!(record.owner_id, user_id);
        assert_eq!(record.id, issued.session_id);
        assert_eq!(record.expires_at, format_timestamp(issued.expires_at));
    }

    #[tokio::test]
    async fn test_raw_token_is_not_stored() {
        let (pool, ledger, user_id) = ledger().await;
        let issued = ledger.issue(user_id).await.unwrap();

        let stored: String = sqlx::query_scalar("SELECT token_hash FROM user_sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_ne!(stored, issued.token);
        assert_eq!(stored, hash_token(&issued.token));
    }

    #[tokio::test]
    async fn test_resolve_after_ttl_returns_nothing() {
        let (_pool, ledger, user_id) = ledger().await;
        let issued = ledger.issue(user_id).await.unwrap();

        let just_before = issued.expires_at - Duration::seconds(1);
        assert!(ledger.resolve_at(&issued.token, just_before).await.unwrap().is_some());

        assert!(ledger
            .resolve_at(&issued.token, issued.expires_at)
            .await
            .unwrap()
            .is_none());
        let later = issued.expires_at + Duration::hours(1);
        assert!(ledger.resolve_at(&issued.token, later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_does_not_slide_expiry() {
        let (_pool, ledger, user_id) = ledger().await;
        let issued = ledger.issue(user_id).await.unwrap();

        let first = ledger.resolve(&issued.token).await.unwrap().unwrap();
        let second = ledger.resolve(&issued.token).await.unwrap().unwrap();
        assert_eq!(first.expires_at, second.expires_at);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let (_pool, ledger, user_id) = ledger().await;
        let issued = ledger.issue(user_id).await.unwrap();

        ledger.revoke(&issued.token).await.unwrap();
        assert!(ledger.resolve(&issued.token).await.unwrap().is_none());

        ledger.revoke(&issued.token).await.unwrap();
        ledger.revoke("never-issued").await.unwrap();
        assert!(ledger.resolve(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_are_independent() {
        let (_pool, ledger, user_id) = ledger().await;
        let first = ledger.issue(user_id).await.unwrap();
        let second = ledger.issue(user_id).await.unwrap();
        assert_ne!(first.token, second.token);

        ledger.revoke(&first.token).await.unwrap();
        assert!(ledger.resolve(&first.token).await.unwrap().is_none());
        assert!(ledger.resolve(&second.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_all_for_owner() {
        let (pool, ledger, user_id) = ledger().await;
        let other_id = insert_user(&pool, "ravi@example.com", "8888888888").await;
        ledger.issue(user_id).await.unwrap();
        ledger.issue(user_id).await.unwrap();
        let other = ledger.issue(other_id).await.unwrap();

        assert_eq!(ledger.revoke_all_for(user_id).await.unwrap(), 2);
        assert_eq!(ledger.row_count().await.unwrap(), 1);
        assert!(ledger.resolve(&other.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expired_rows_linger_until_purged() {
        let (_pool, ledger, user_id) = ledger().await;
        let issued = ledger.issue(user_id).await.unwrap();
        let _live = ledger.issue(user_id).await.unwrap();
        assert_eq!(ledger.row_count().await.unwrap(), 2);

        // Nothing is due yet
        assert_eq!(ledger.purge_expired().await.unwrap(), 0);

        let after = issued.expires_at + Duration::minutes(1);
        assert_eq!(ledger.purge_expired_at(after).await.unwrap(), 2);
        assert_eq!(ledger.row_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_realms_use_separate_tables() {
        let (pool, user_ledger, user_id) = ledger().await;
        let admin_ledger = SessionLedger::new(pool.clone(), Realm::Admin, Duration::hours(8));

        let issued = user_ledger.issue(user_id).await.unwrap();
        assert!(admin_ledger.resolve(&issued.token).await.unwrap().is_none());
        assert_eq!(admin_ledger.row_count().await.unwrap(), 0);
    }
}
