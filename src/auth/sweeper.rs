//! Periodic purge of expired session rows.
//!
//! Validity never depends on this task: `resolve` already ignores rows past
//! their deadline. The sweeper only bounds table growth.

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::{AuthError, SessionLedger};
use crate::config::SessionsConfig;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub user_sessions_removed: u64,
    pub admin_sessions_removed: u64,
}

pub struct SessionSweeper {
    ledgers: Vec<SessionLedger>,
}

impl SessionSweeper {
    pub fn new(user_ledger: SessionLedger, admin_ledger: SessionLedger) -> Self {
        Self {
            ledgers: vec![user_ledger, admin_ledger],
        }
    }

    /// Run a single sweep over every ledger
    pub async fn sweep(&self) -> Result<SweepStats, AuthError> {
        let mut stats = SweepStats::default();
        for ledger in &self.ledgers {
            let removed = ledger.purge_expired().await?;
            match ledger.realm() {
                super::Realm::User => stats.user_sessions_removed += removed,
                super::Realm::Admin => stats.admin_sessions_removed += removed,
            }
        }

        if stats.user_sessions_removed + stats.admin_sessions_removed > 0 {
            tracing::info!(
                user_sessions = stats.user_sessions_removed,
                admin_sessions = stats.admin_sessions_removed,
                "Purged expired sessions"
            );
        }
        Ok(stats)
    }
}

/// Spawn the background sweep task; `None` when disabled by config
pub fn spawn_sweeper_task(
    sweeper: SessionSweeper,
    config: &SessionsConfig,
) -> Option<JoinHandle<()>> {
    if config.sweep_interval_secs == 0 {
        tracing::info!("Session sweeper is disabled");
        return None;
    }

    let interval_secs = config.sweep_interval_secs;
    tracing::info!(interval_secs, "Starting session sweeper");

    Some(tokio::spawn(async move {
        let mut tick = interval(Duration::from_secs(interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick.tick().await;
            if let Err(e) = sweeper.sweep().await {
                tracing::error!(error = %e, "Session sweep failed");
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminAuthenticator, UserAuthenticator};
    use crate::db::{init_in_memory, RegisterUserRequest};

    #[tokio::test]
    async fn test_sweep_removes_only_expired_rows() {
        let pool = init_in_memory().await.unwrap();
        // A zero TTL makes every issued session already expired
        let expired = UserAuthenticator::new(pool.clone(), chrono::Duration::zero(), 6);
        let live = UserAuthenticator::new(pool.clone(), chrono::Duration::hours(24), 6);
        let admins = AdminAuthenticator::new(pool.clone(), chrono::Duration::hours(8), 6);

        let id = live
            .register(&RegisterUserRequest {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                mobile: "9999999999".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();
        expired.ledger().issue(id).await.unwrap();
        let kept = live.ledger().issue(id).await.unwrap();

        let sweeper = SessionSweeper::new(expired.ledger().clone(), admins.ledger().clone());
        let stats = sweeper.sweep().await.unwrap();
        assert_eq!(stats.user_sessions_removed, 1);
        assert_eq!(stats.admin_sessions_removed, 0);

        assert_eq!(live.ledger().row_count().await.unwrap(), 1);
        assert!(live.ledger().resolve(&kept.token).await.unwrap().is_some());

        assert_eq!(sweeper.sweep().await.unwrap(), SweepStats::default());
    }

    #[tokio::test]
    async fn test_zero_interval_disables_task() {
        let pool = init_in_memory().await.unwrap();
        let users = UserAuthenticator::new(pool.clone(), chrono::Duration::hours(24), 6);
        let admins = AdminAuthenticator::new(pool, chrono::Duration::hours(8), 6);
        let sweeper = SessionSweeper::new(users.ledger().clone(), admins.ledger().clone());

        let config = SessionsConfig {
            sweep_interval_secs: 0,
        };
        assert!(spawn_sweeper_task(sweeper, &config).is_none());
    }
}
