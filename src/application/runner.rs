//! BridgeRunner - periodic driver for the stream bridge.
//!
//! Calls [`StreamBridge::tick`] on a fixed interval until a shutdown signal
//! arrives.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `tick_interval` | 10ms | Time between bridge ticks |
//!
//! ## Graceful Shutdown
//!
//! On shutdown the runner performs one final tick, so input already received
//! from clients reaches the stream, then force-closes every client.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use super::{StreamBridge, TickReport};

/// Configuration for the BridgeRunner.
#[derive(Debug, Clone)]
pub struct BridgeRunnerConfig {
    /// Time between bridge ticks.
    pub tick_interval: Duration,
}

impl Default for BridgeRunnerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
        }
    }
}

impl BridgeRunnerConfig {
    /// Create config with custom tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }
}

/// Drives a [`StreamBridge`] once per tick interval.
pub struct BridgeRunner {
    bridge: StreamBridge,
    config: BridgeRunnerConfig,
}

impl BridgeRunner {
    /// Create a runner with default configuration.
    pub fn new(bridge: StreamBridge) -> Self {
        Self::with_config(bridge, BridgeRunnerConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(bridge: StreamBridge, config: BridgeRunnerConfig) -> Self {
        Self { bridge, config }
    }

    /// The bridge being driven.
    pub fn bridge(&self) -> &StreamBridge {
        &self.bridge
    }

    /// Run ticks until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Returns the bridge so callers can inspect it after shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> StreamBridge {
        let mut interval = time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.stop();
                        return self.bridge;
                    }
                }

                _ = interval.tick() => {
                    self.tick_once();
                }
            }
        }
    }

    /// Run exactly one tick (for testing).
    pub fn tick_once(&mut self) -> TickReport {
        let report = self.bridge.tick();
        if !report.is_idle() {
            tracing::trace!(
                reaped = report.reaped,
                broadcast = report.broadcast,
                flushed = report.flushed,
                clients = report.clients,
                "Bridge tick"
            );
        }
        report
    }

    fn stop(&mut self) {
        self.tick_once();
        let closed = self.bridge.shutdown();
        tracing::info!(closed, "Stream bridge stopped");
    }
}
