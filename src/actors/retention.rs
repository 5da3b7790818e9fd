//! RetentionActor - deletes components that stopped reporting long ago
//!
//! ## Architecture
//!
//! The actor owns a [`ComponentStore`] handle and wakes on a fixed interval.
//! Each tick deletes every component whose last write is older than
//! `now - threshold`, regardless of its declared or effective severity.
//!
//! A failed sweep is logged and counted; the actor keeps running and the
//! next tick tries again. A threshold `<= 0` disables sweeping entirely: the
//! actor still answers commands but never deletes anything.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace};

use super::messages::{RetentionCommand, RetentionStats};
use crate::store::ComponentStore;

/// Default retention threshold: one week
pub const DEFAULT_RETENTION_MINUTES: i64 = 7 * 24 * 60;

/// Default sweep period: hourly
pub const DEFAULT_SWEEP_INTERVAL_MINUTES: u64 = 60;

/// Retention policy
#[derive(Debug, Clone, Copy)]
pub struct RetentionSettings {
    /// Components older than this are deleted; `<= 0` disables the sweep
    pub threshold_minutes: i64,

    /// Time between sweeps
    pub interval: Duration,
}

impl RetentionSettings {
    pub fn enabled(&self) -> bool {
        self.threshold_minutes > 0
    }
}

impl Default for RetentionSettings {
    fn default() -> Self {
        Self {
            threshold_minutes: DEFAULT_RETENTION_MINUTES,
            interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_MINUTES * 60),
        }
    }
}

/// Retention actor
pub struct RetentionActor {
    store: ComponentStore,
    settings: RetentionSettings,
    command_rx: mpsc::Receiver<RetentionCommand>,
    stats: RetentionStats,
}

impl RetentionActor {
    pub fn new(
        store: ComponentStore,
        settings: RetentionSettings,
        command_rx: mpsc::Receiver<RetentionCommand>,
    ) -> Self {
        let stats = RetentionStats {
            enabled: settings.enabled(),
            threshold_minutes: settings.threshold_minutes,
            interval_minutes: settings.interval.as_secs() / 60,
            ..RetentionStats::default()
        };

        Self {
            store,
            settings,
            command_rx,
            stats,
        }
    }

    /// Run the actor's main loop
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        let enabled = self.settings.enabled();

        if enabled {
            debug!(
                "starting retention actor (threshold: {} minutes, interval: {:?})",
                self.settings.threshold_minutes, self.settings.interval
            );
        } else {
            info!("retention sweep disabled (threshold <= 0)");
        }

        // interval() panics on a zero period
        let period = self.settings.interval.max(Duration::from_secs(1));
        let mut sweep_interval = time::interval_at(time::Instant::now() + period, period);
        sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = sweep_interval.tick(), if enabled => {
                    trace!("scheduled retention sweep triggered");
                    let _ = self.sweep().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    if !self.handle_command(cmd).await {
                        break;
                    }
                }

                else => {
                    debug!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("retention actor stopped");
    }

    /// Run one sweep, updating statistics
    async fn sweep(&mut self) -> anyhow::Result<usize> {
        if !self.settings.enabled() {
            return Ok(0);
        }

        let threshold = chrono::Duration::minutes(self.settings.threshold_minutes);
        let result = self.store.sweep_older_than(threshold).await;
        self.stats.last_sweep = Some(self.store.now());

        match result {
            Ok(deleted) => {
                self.stats.sweep_count += 1;
                self.stats.last_deleted = deleted;
                self.stats.total_deleted += deleted as u64;

                if deleted > 0 {
                    info!(
                        "retention sweep deleted {} components (total: {})",
                        deleted, self.stats.total_deleted
                    );
                } else {
                    trace!("retention sweep: nothing to delete");
                }
                Ok(deleted)
            }
            Err(e) => {
                self.stats.failed_sweeps += 1;
                error!("retention sweep failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Handle a command, returning false when the actor should stop
    async fn handle_command(&mut self, cmd: RetentionCommand) -> bool {
        match cmd {
            RetentionCommand::SweepNow { respond_to } => {
                debug!("manual retention sweep requested");
                let result = self.sweep().await;
                let _ = respond_to.send(result);
                true
            }

            RetentionCommand::GetStats { respond_to } => {
                let _ = respond_to.send(self.stats.clone());
                true
            }

            RetentionCommand::Shutdown => {
                debug!("received shutdown command");
                false
            }
        }
    }
}

/// Handle for controlling the RetentionActor
#[derive(Clone)]
pub struct RetentionHandle {
    sender: mpsc::Sender<RetentionCommand>,
}

impl RetentionHandle {
    /// Spawn a retention actor over `store`
    pub fn spawn(store: ComponentStore, settings: RetentionSettings) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = RetentionActor::new(store, settings, cmd_rx);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Sweep immediately, returning the number of deleted components
    pub async fn sweep_now(&self) -> anyhow::Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RetentionCommand::SweepNow { respond_to: tx })
            .await?;

        rx.await?
    }

    pub async fn get_stats(&self) -> Option<RetentionStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(RetentionCommand::GetStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.sender.send(RetentionCommand::Shutdown).await?;
        Ok(())
    }
}
