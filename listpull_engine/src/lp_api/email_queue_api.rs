use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;

use crate::{
    db_types::{EmailJob, EmailStatus, EmailTemplate, NewEmailJob},
    traits::{EmailQueueError, EmailQueueManagement},
};

/// Finished jobs (sent or failed) are kept this long before cleanup removes them.
pub const EMAIL_RETENTION_DAYS: i64 = 30;

/// Queue-level operations on outgoing email. Delivery itself is the job of the
/// [`EmailDispatcher`](crate::mailer::EmailDispatcher).
pub struct EmailQueueApi<B> {
    db: B,
}

impl<B> Debug for EmailQueueApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmailQueueApi")
    }
}

impl<B> EmailQueueApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> EmailQueueApi<B>
where B: EmailQueueManagement
{
    /// Adds a `pending` job to the queue. No email is sent here.
    pub async fn enqueue(
        &self,
        order_id: i64,
        recipient: &str,
        template: EmailTemplate,
    ) -> Result<EmailJob, EmailQueueError> {
        let job = self.db.enqueue_email(NewEmailJob::new(order_id, recipient, template)).await?;
        debug!("📧 Queued {template} email #{} for order #{order_id}", job.id);
        Ok(job)
    }

    pub async fn fetch_job(&self, id: i64) -> Result<Option<EmailJob>, EmailQueueError> {
        self.db.fetch_email_job(id).await
    }

    pub async fn jobs(&self, status: Option<EmailStatus>) -> Result<Vec<EmailJob>, EmailQueueError> {
        self.db.fetch_emails(status).await
    }

    /// Deletes sent and failed jobs older than [`EMAIL_RETENTION_DAYS`]. Pending jobs are never touched.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> Result<u64, EmailQueueError> {
        let cutoff = now - Duration::days(EMAIL_RETENTION_DAYS);
        let removed = self.db.delete_finished_emails_before(cutoff).await?;
        if removed > 0 {
            info!("📧 Queue cleanup removed {removed} finished jobs created before {cutoff}");
        }
        Ok(removed)
    }
}
