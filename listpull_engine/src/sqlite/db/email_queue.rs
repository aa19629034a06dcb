use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{EmailJob, EmailStatus, NewEmailJob};

pub async fn insert_job(job: NewEmailJob, conn: &mut SqliteConnection) -> Result<EmailJob, sqlx::Error> {
    let job = sqlx::query_as(
        r#"
            INSERT INTO email_queue (order_id, recipient, template, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(job.order_id)
    .bind(job.recipient)
    .bind(job.template)
    .bind(job.created_at)
    .fetch_one(conn)
    .await?;
    Ok(job)
}

pub async fn fetch_job(id: i64, conn: &mut SqliteConnection) -> Result<Option<EmailJob>, sqlx::Error> {
    let job = sqlx::query_as("SELECT * FROM email_queue WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(job)
}

pub async fn fetch_jobs(
    status: Option<EmailStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<EmailJob>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM email_queue");
    if let Some(status) = status {
        builder.push(" WHERE status = ");
        builder.push_bind(status);
    }
    builder.push(" ORDER BY id");
    let jobs = builder.build_query_as::<EmailJob>().fetch_all(conn).await?;
    Ok(jobs)
}

pub async fn mark_sent(
    id: i64,
    sent_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<EmailJob>, sqlx::Error> {
    let job = sqlx::query_as(
        "UPDATE email_queue SET status = 'sent', sent_at = $1 WHERE id = $2 AND status = 'pending' RETURNING *;",
    )
    .bind(sent_at)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(job)
}

/// Bumps the attempt counter and decides the new status in one statement.
pub async fn record_failure(
    id: i64,
    error: &str,
    max_attempts: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EmailJob>, sqlx::Error> {
    let job = sqlx::query_as(
        r#"
            UPDATE email_queue SET
                attempts = attempts + 1,
                status = CASE WHEN attempts + 1 >= $1 THEN 'failed' ELSE 'pending' END,
                last_error = $2
            WHERE id = $3 AND status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(max_attempts)
    .bind(error)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(job)
}

pub async fn delete_finished_before(cutoff: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM email_queue WHERE status IN ('sent', 'failed') AND created_at < $1")
        .bind(cutoff)
        .execute(conn)
        .await?;
    trace!("🗃️ Removed {} finished email jobs", result.rows_affected());
    Ok(result.rows_affected())
}
