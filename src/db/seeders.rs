//! Database seeders for built-in data
//!
//! Seeds the program list shown on the student order form when the
//! programs table is empty. Existing rows are never touched.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::now_timestamp;

/// (program_code, program_name, description)
const DEFAULT_PROGRAMS: [(&str, &str, &str); 6] = [
    (
        "MBA",
        "Master of Business Administration",
        "MBA program for working professionals",
    ),
    (
        "MCA",
        "Master of Computer Applications",
        "MCA program for computer science graduates",
    ),
    (
        "BCA",
        "Bachelor of Computer Applications",
        "BCA program for computer applications",
    ),
    (
        "BBA",
        "Bachelor of Business Administration",
        "BBA program for business administration",
    ),
    ("BTECH", "Bachelor of Technology", "B.Tech program for engineering"),
    ("MTECH", "Master of Technology", "M.Tech program for engineering"),
];

/// Seed the default programs if no program exists yet
pub async fn seed_default_programs(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM programs")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        return Ok(());
    }

    info!("Seeding default programs...");

    let now = now_timestamp();
    let mut tx = pool.begin().await?;
    for (code, name, description) in DEFAULT_PROGRAMS {
        sqlx::query(
            "INSERT OR IGNORE INTO programs (program_code, program_name, description, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(code)
        .bind(name)
        .bind(description)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(count = DEFAULT_PROGRAMS.len(), "Default programs seeded");
    Ok(())
}
