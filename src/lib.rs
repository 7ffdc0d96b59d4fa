pub mod api;
pub mod auth;
pub mod config;
pub mod db;

pub use db::DbPool;

use chrono::Duration;
use config::Config;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::auth::{AdminAuthenticator, UserAuthenticator};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub users: UserAuthenticator,
    pub admins: AdminAuthenticator,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let auth = &config.auth;
        let users = UserAuthenticator::new(
            db.clone(),
            Duration::hours(auth.user_session_hours),
            auth.min_password_length,
        );
        let admins = AdminAuthenticator::new(
            db.clone(),
            Duration::hours(auth.admin_session_hours),
            auth.min_password_length,
        );
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Self {
            config,
            db,
            users,
            admins,
            rate_limiter,
        }
    }
}
