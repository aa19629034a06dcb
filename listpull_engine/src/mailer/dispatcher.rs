use std::{
    fmt::Debug,
    sync::atomic::{AtomicBool, Ordering},
};

use chrono::{DateTime, Utc};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{EmailJob, EmailStatus},
    lp_api::email_queue_api::EmailQueueApi,
    mailer::{render_email, MailTransport},
    traits::{EmailQueueError, EmailQueueManagement, OrderManagement, OrderWithItems},
};

/// A job is marked `failed` once this many delivery attempts have failed.
pub const MAX_EMAIL_ATTEMPTS: i64 = 3;

/// Tally of one drain of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainSummary {
    pub sent: usize,
    /// Failed this time, but still `pending` and will be retried on the next drain.
    pub retrying: usize,
    /// Failed for the last time and now marked `failed`.
    pub failed: usize,
}

impl DrainSummary {
    pub fn total(&self) -> usize {
        self.sent + self.retrying + self.failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was already running, so this call did nothing.
    Skipped,
    Completed(DrainSummary),
}

/// Clears the in-flight flag when the drain finishes, however it finishes.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

enum Delivery {
    Sent,
    Failed(String),
}

/// Drains the email queue, rendering each pending job and handing it to the mail transport.
///
/// Only one drain runs at a time per dispatcher. A second call to [`EmailDispatcher::process_queue`] while a drain is
/// in flight returns [`DrainOutcome::Skipped`] straight away without touching any rows.
pub struct EmailDispatcher<B, T> {
    db: B,
    transport: T,
    store_name: String,
    draining: AtomicBool,
}

impl<B, T> Debug for EmailDispatcher<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmailDispatcher({}, draining: {})", self.store_name, self.draining.load(Ordering::Relaxed))
    }
}

impl<B, T> EmailDispatcher<B, T> {
    pub fn new<S: Into<String>>(db: B, transport: T, store_name: S) -> Self {
        Self { db, transport, store_name: store_name.into(), draining: AtomicBool::new(false) }
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}

impl<B, T> EmailDispatcher<B, T>
where
    B: OrderManagement + EmailQueueManagement + Clone,
    T: MailTransport,
{
    /// Attempts delivery of every `pending` job, in id order.
    ///
    /// Per-job problems (missing order, transport errors, storage hiccups while recording the outcome) are logged and
    /// counted; they never abort the drain. Only a failure to read the queue itself is returned as an error.
    pub async fn process_queue(&self) -> Result<DrainOutcome, EmailQueueError> {
        if self.draining.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            debug!("📧 A queue drain is already in progress. Skipping this one.");
            return Ok(DrainOutcome::Skipped);
        }
        let _guard = DrainGuard(&self.draining);
        let jobs = self.db.fetch_pending_emails().await?;
        let mut summary = DrainSummary::default();
        if jobs.is_empty() {
            trace!("📧 Email queue is empty");
            return Ok(DrainOutcome::Completed(summary));
        }
        debug!("📧 Draining {} pending emails", jobs.len());
        for job in jobs {
            match self.deliver(&job).await {
                Delivery::Sent => match self.db.mark_email_sent(job.id, Utc::now()).await {
                    Ok(_) => {
                        info!("📧 Sent {} email #{} to {}", job.template, job.id, job.recipient);
                        summary.sent += 1;
                    },
                    Err(e) => error!("📧 Email #{} was delivered, but could not be marked as sent. {e}", job.id),
                },
                Delivery::Failed(reason) => {
                    match self.db.record_email_failure(job.id, &reason, MAX_EMAIL_ATTEMPTS).await {
                        Ok(updated) if updated.status == EmailStatus::Failed => {
                            error!(
                                "📧 Giving up on {} email #{} after {} attempts. {reason}",
                                job.template, job.id, updated.attempts
                            );
                            summary.failed += 1;
                        },
                        Ok(updated) => {
                            warn!(
                                "📧 Attempt {}/{MAX_EMAIL_ATTEMPTS} for {} email #{} failed. {reason}",
                                updated.attempts, job.template, job.id
                            );
                            summary.retrying += 1;
                        },
                        Err(e) => error!("📧 Could not record the failure of email #{}. {e}", job.id),
                    }
                },
            }
        }
        info!(
            "📧 Queue drain complete. {} sent, {} retrying, {} failed",
            summary.sent, summary.retrying, summary.failed
        );
        Ok(DrainOutcome::Completed(summary))
    }

    async fn deliver(&self, job: &EmailJob) -> Delivery {
        let order = match self.db.fetch_order_by_id(job.order_id).await {
            Ok(Some(o)) => o,
            Ok(None) => return Delivery::Failed(format!("Order #{} does not exist", job.order_id)),
            Err(e) => return Delivery::Failed(format!("Could not load order #{}. {e}", job.order_id)),
        };
        let items = match self.db.fetch_order_items(order.id).await {
            Ok(items) => items,
            Err(e) => return Delivery::Failed(format!("Could not load items for order #{}. {e}", order.id)),
        };
        let mut message = render_email(job.template, &OrderWithItems::new(order, items), &self.store_name);
        // The queued recipient wins if the order's email has since been edited
        message.to = job.recipient.clone();
        match self.transport.send(&message).await {
            Ok(true) => Delivery::Sent,
            Ok(false) => Delivery::Failed("The mail transport did not accept the message".to_string()),
            Err(e) => Delivery::Failed(e.to_string()),
        }
    }

    /// Removes finished jobs past the retention window. See [`EmailQueueApi::cleanup`].
    pub async fn cleanup_queue(&self, now: DateTime<Utc>) -> Result<u64, EmailQueueError> {
        EmailQueueApi::new(self.db.clone()).cleanup(now).await
    }
}
