use std::{sync::Arc, time::Duration};

use chrono::Utc;
use listpull_engine::{
    mailer::{ConfiguredTransport, MailTransport},
    DrainOutcome,
    EmailDispatcher,
    EmailQueueManagement,
    OrderManagement,
    SqliteDatabase,
};
use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// How often the email queue is drained.
pub const DRAIN_INTERVAL: Duration = Duration::from_secs(30);
/// Queue cleanup runs on every Nth drain tick, i.e. once an hour.
pub const CLEANUP_EVERY_N_TICKS: u64 = 120;

/// Drives an [`EmailDispatcher`] from a timer: one drain per tick, plus the occasional queue cleanup.
pub struct EmailWorker<B, T> {
    dispatcher: Arc<EmailDispatcher<B, T>>,
    ticks: u64,
}

impl<B, T> EmailWorker<B, T>
where
    B: OrderManagement + EmailQueueManagement + Clone,
    T: MailTransport,
{
    pub fn new(dispatcher: Arc<EmailDispatcher<B, T>>) -> Self {
        Self { dispatcher, ticks: 0 }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Clears out old finished jobs before the first drain.
    pub async fn startup(&self) {
        self.cleanup().await;
    }

    /// Drains the queue once, and cleans it up on every [`CLEANUP_EVERY_N_TICKS`]th tick.
    pub async fn tick(&mut self) -> Option<DrainOutcome> {
        self.ticks += 1;
        let outcome = match self.dispatcher.process_queue().await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("📧 Could not read the email queue. {e}");
                None
            },
        };
        if self.ticks % CLEANUP_EVERY_N_TICKS == 0 {
            self.cleanup().await;
        }
        outcome
    }

    async fn cleanup(&self) {
        match self.dispatcher.cleanup_queue(Utc::now()).await {
            Ok(n) => trace!("📧 Queue cleanup removed {n} jobs"),
            Err(e) => error!("📧 Email queue cleanup failed. {e}"),
        }
    }
}

/// Starts the email worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_email_worker(dispatcher: Arc<EmailDispatcher<SqliteDatabase, ConfiguredTransport>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut worker = EmailWorker::new(dispatcher);
        let mut timer = tokio::time::interval(DRAIN_INTERVAL);
        // A tick that lands while a slow drain is still running is dropped, not queued
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("📧 Email worker started. Draining the queue every {}s", DRAIN_INTERVAL.as_secs());
        worker.startup().await;
        loop {
            timer.tick().await;
            if let Some(DrainOutcome::Skipped) = worker.tick().await {
                debug!("📧 Previous drain still running on tick {}", worker.ticks());
            }
        }
    })
}
