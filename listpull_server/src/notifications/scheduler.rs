use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use discord_tools::{DiscordWebhook, Notifier};
use listpull_engine::{OrderManagement, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

use crate::{
    config::NotificationConfig,
    errors::ServerError,
    notifications::{digest::run_digest, sweep::run_stale_sweep},
};

/// How often the scheduler wakes up.
pub const TICK_INTERVAL: StdDuration = StdDuration::from_secs(60);
/// Minimum time, in minutes, between two stale order sweeps.
pub const SWEEP_INTERVAL_MINUTES: i64 = 30;

/// Which jobs a tick started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub digest: bool,
    pub sweep: bool,
}

/// Decides when the digest and the stale order sweep run.
///
/// The digest runs at the first tick that falls in the configured hour, once per calendar day in the configured
/// timezone. The sweep runs at most once every [`SWEEP_INTERVAL_MINUTES`].
pub struct Scheduler<B, N> {
    db: B,
    notifier: N,
    config: NotificationConfig,
    last_digest_date: Option<NaiveDate>,
    last_stale_check_at: Option<DateTime<Utc>>,
}

impl<B, N> Scheduler<B, N>
where
    B: OrderManagement,
    N: Notifier,
{
    pub fn new(db: B, notifier: N, config: NotificationConfig) -> Self {
        Self { db, notifier, config, last_digest_date: None, last_stale_check_at: None }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    /// The local date the digest last ran on.
    pub fn last_digest_date(&self) -> Option<NaiveDate> {
        self.last_digest_date
    }

    pub fn last_stale_check_at(&self) -> Option<DateTime<Utc>> {
        self.last_stale_check_at
    }

    /// Runs the sweep straight away, without waiting for the sweep interval.
    pub async fn startup(&mut self, now: DateTime<Utc>) {
        if !self.notifier.is_enabled() {
            return;
        }
        self.last_stale_check_at = Some(now);
        self.sweep(now).await;
    }

    pub async fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        if !self.notifier.is_enabled() {
            return report;
        }
        let local = now.with_timezone(&self.config.timezone);
        let today = local.date_naive();
        if local.hour() == self.config.digest_hour && self.last_digest_date != Some(today) {
            self.last_digest_date = Some(today);
            report.digest = true;
            self.digest(now).await;
        }
        let sweep_interval = Duration::minutes(SWEEP_INTERVAL_MINUTES);
        let sweep_due = self.last_stale_check_at.map(|last| now - last >= sweep_interval).unwrap_or(true);
        if sweep_due {
            self.last_stale_check_at = Some(now);
            report.sweep = true;
            self.sweep(now).await;
        }
        report
    }

    async fn digest(&self, now: DateTime<Utc>) {
        match run_digest(&self.db, &self.notifier, &self.config, now).await {
            Ok(true) => debug!("🕰️ Daily digest posted"),
            Ok(false) => warn!("🕰️ The daily digest could not be delivered"),
            Err(e) => error!("🕰️ Daily digest failed. {e}"),
        }
    }

    async fn sweep(&self, now: DateTime<Utc>) {
        if let Err(e) = run_stale_sweep(&self.db, &self.notifier, &self.config, now).await {
            error!("🕰️ Stale order sweep failed. {e}");
        }
    }
}

/// Starts the notification scheduler. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Without a webhook URL this logs once and returns `None`; no timer is installed.
pub fn start_scheduler(
    db: SqliteDatabase,
    config: NotificationConfig,
) -> Result<Option<JoinHandle<()>>, ServerError> {
    if !config.discord.is_enabled() {
        info!("🕰️ No Discord webhook is configured. Digests and stale order alerts are disabled.");
        return Ok(None);
    }
    let notifier =
        DiscordWebhook::new(config.discord.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handle = tokio::spawn(async move {
        info!(
            "🕰️ Notification scheduler started. Digest at {:02}:00 {}, stale sweep every {} minutes",
            config.digest_hour,
            config.timezone,
            SWEEP_INTERVAL_MINUTES
        );
        let mut scheduler = Scheduler::new(db, notifier, config);
        scheduler.startup(Utc::now()).await;
        let mut timer = tokio::time::interval(TICK_INTERVAL);
        loop {
            timer.tick().await;
            scheduler.tick(Utc::now()).await;
        }
    });
    Ok(Some(handle))
}
