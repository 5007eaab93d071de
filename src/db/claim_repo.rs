use std::collections::HashSet;

use sqlx::PgPool;

use crate::models::{ClaimLogEntry, ClaimStatus, NewClaimLogEntry};

/// Append a claim attempt. A second `claimed` row for the same condition is
/// rejected by the partial unique index and surfaces as an error.
pub async fn insert_entry(pool: &PgPool, entry: &NewClaimLogEntry) -> anyhow::Result<ClaimLogEntry> {
    let row = sqlx::query_as::<_, ClaimLogEntry>(
        r#"
        INSERT INTO claim_log (condition_id, market_slug, outcome, value, status, tx_hash, error, claimed_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $5 = 'claimed' THEN NOW() END)
        RETURNING *
        "#,
    )
    .bind(&entry.condition_id)
    .bind(&entry.market_slug)
    .bind(&entry.outcome)
    .bind(entry.value)
    .bind(entry.status.as_str())
    .bind(&entry.tx_hash)
    .bind(&entry.error)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Which of `condition_ids` already have a `claimed` row.
pub async fn get_claimed_condition_ids(
    pool: &PgPool,
    condition_ids: &[String],
) -> anyhow::Result<HashSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT condition_id FROM claim_log WHERE status = $1 AND condition_id = ANY($2)",
    )
    .bind(ClaimStatus::Claimed.as_str())
    .bind(condition_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.0).collect())
}

pub async fn get_recent(pool: &PgPool, limit: i64) -> anyhow::Result<Vec<ClaimLogEntry>> {
    let rows = sqlx::query_as::<_, ClaimLogEntry>(
        "SELECT * FROM claim_log ORDER BY created_at DESC, id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
