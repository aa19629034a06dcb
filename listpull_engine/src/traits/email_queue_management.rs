use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{EmailJob, EmailStatus, NewEmailJob};

#[derive(Debug, Clone, Error)]
pub enum EmailQueueError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Email job {0} does not exist")]
    JobNotFound(i64),
}

impl From<sqlx::Error> for EmailQueueError {
    fn from(e: sqlx::Error) -> Self {
        EmailQueueError::DatabaseError(e.to_string())
    }
}

/// Storage behaviour for the outgoing email queue.
///
/// Every mutation is a single statement keyed by the job id, so that concurrent writers cannot interleave partial
/// updates.
#[allow(async_fn_in_trait)]
pub trait EmailQueueManagement {
    /// Inserts a new `pending` job with zero attempts.
    async fn enqueue_email(&self, job: NewEmailJob) -> Result<EmailJob, EmailQueueError>;

    async fn fetch_email_job(&self, id: i64) -> Result<Option<EmailJob>, EmailQueueError>;

    /// All `pending` jobs, in id order.
    async fn fetch_pending_emails(&self) -> Result<Vec<EmailJob>, EmailQueueError>;

    /// All jobs, optionally restricted to one status, in id order.
    async fn fetch_emails(&self, status: Option<EmailStatus>) -> Result<Vec<EmailJob>, EmailQueueError>;

    async fn mark_email_sent(&self, id: i64, sent_at: DateTime<Utc>) -> Result<EmailJob, EmailQueueError>;

    /// Counts a failed delivery attempt against the job. Once `attempts` reaches `max_attempts`, the job is marked
    /// `failed`; otherwise it stays `pending`. The error is recorded either way.
    async fn record_email_failure(
        &self,
        id: i64,
        error: &str,
        max_attempts: i64,
    ) -> Result<EmailJob, EmailQueueError>;

    /// Removes `sent` and `failed` jobs created before `cutoff`. Returns the number of rows removed.
    async fn delete_finished_emails_before(&self, cutoff: DateTime<Utc>) -> Result<u64, EmailQueueError>;
}
