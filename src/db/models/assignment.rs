//! Assignment orders and back-office statistics.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Order lifecycle. Only `Pending` is written here; the payment
/// collaborator moves orders on to `Completed` or `Failed`.
pub mod order_status {
    pub const PENDING: &str = "pending";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AssignmentOrder {
    pub id: i64,
    pub user_id: i64,
    /// Comma-separated course codes
    pub courses: String,
    pub transaction_id: Option<String>,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
}

impl AssignmentOrder {
    pub fn course_codes(&self) -> Vec<&str> {
        self.courses
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect()
    }
}

/// Order joined with the ordering student, for the admin list
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AssignmentOrderWithUser {
    pub id: i64,
    pub user_name: String,
    pub user_email: String,
    pub courses: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub course_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total_users: i64,
    pub total_assignments: i64,
    pub total_revenue: f64,
    pub status_counts: BTreeMap<String, i64>,
    pub recent_assignments: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DailyRevenue {
    pub date: String,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct Analytics {
    pub user_trends: Vec<DailyCount>,
    pub revenue_trends: Vec<DailyRevenue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_codes_split() {
        let order = AssignmentOrder {
            id: 1,
            user_id: 1,
            courses: "MMPC-001, MMPC-002,,MCS-011".to_string(),
            transaction_id: None,
            amount: 30.0,
            status: order_status::PENDING.to_string(),
            created_at: String::new(),
        };
        assert_eq!(order.course_codes(), vec!["MMPC-001", "MMPC-002", "MCS-011"]);
    }
}
