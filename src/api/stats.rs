//! Back-office statistics and trend analytics.

use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::{format_timestamp, order_status, Analytics, DailyCount, DailyRevenue, Statistics};
use crate::{AppState, DbPool};

use super::error::ApiError;
use super::extract::CurrentAdmin;

const RECENT_DAYS: i64 = 7;
const TREND_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: Statistics,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub analytics: Analytics,
}

pub(crate) async fn collect_statistics(db: &DbPool) -> Result<Statistics, sqlx::Error> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;

    let by_status: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM user_assignments GROUP BY status")
            .fetch_all(db)
            .await?;
    let status_counts: BTreeMap<String, i64> = by_status.into_iter().collect();
    let total_assignments: i64 = status_counts.values().sum();

    let total_revenue: f64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM user_assignments WHERE status = ?")
            .bind(order_status::COMPLETED)
            .fetch_one(db)
            .await?;

    let since = format_timestamp(Utc::now() - Duration::days(RECENT_DAYS));
    let recent_assignments: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM user_assignments WHERE created_at >= ?")
            .bind(&since)
            .fetch_one(db)
            .await?;

    Ok(Statistics {
        total_users,
        total_assignments,
        total_revenue,
        status_counts,
        recent_assignments,
    })
}

pub(crate) async fn collect_analytics(db: &DbPool) -> Result<Analytics, sqlx::Error> {
    let since = format_timestamp(Utc::now() - Duration::days(TREND_DAYS));

    // Stored timestamps start with YYYY-MM-DD
    let user_trends = sqlx::query_as::<_, DailyCount>(
        r#"
        SELECT substr(created_at, 1, 10) AS date, COUNT(*) AS count
        FROM users
        WHERE created_at >= ?
        GROUP BY date
        ORDER BY date
        "#,
    )
    .bind(&since)
    .fetch_all(db)
    .await?;

    let revenue_trends = sqlx::query_as::<_, DailyRevenue>(
        r#"
        SELECT substr(created_at, 1, 10) AS date, COALESCE(SUM(amount), 0.0) AS revenue
        FROM user_assignments
        WHERE created_at >= ? AND status = ?
        GROUP BY date
        ORDER BY date
        "#,
    )
    .bind(&since)
    .bind(order_status::COMPLETED)
    .fetch_all(db)
    .await?;

    Ok(Analytics {
        user_trends,
        revenue_trends,
    })
}

pub async fn statistics(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
) -> Result<Json<StatisticsResponse>, ApiError> {
    let statistics = collect_statistics(&state.db).await?;
    Ok(Json(StatisticsResponse {
        success: true,
        statistics,
    }))
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    _admin: CurrentAdmin,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let analytics = collect_analytics(&state.db).await?;
    Ok(Json(AnalyticsResponse {
        success: true,
        analytics,
    }))
}
