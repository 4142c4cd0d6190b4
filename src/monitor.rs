//! The sampling loop: read sensors, drive the indicator, raise alerts, sleep.

use crate::alerts::AlertManager;
use crate::indicator::{IndicatorController, Severity};
use crate::sensors::SensorStateReader;
use log::{debug, info, warn};
use std::time::Duration;
use strum::Display;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LoopState {
    Running,
    Stopping,
    Stopped,
}

pub struct SensorLoop {
    reader: SensorStateReader,
    indicator: IndicatorController,
    alerts: AlertManager,
    interval: Duration,
    state: LoopState,
    cycles: u64,
}

impl SensorLoop {
    pub fn new(
        reader: SensorStateReader,
        indicator: IndicatorController,
        alerts: AlertManager,
        interval: Duration,
    ) -> Self {
        Self {
            reader,
            indicator,
            alerts,
            interval,
            state: LoopState::Running,
            cycles: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run one sample → indicator → alert pass.
    pub async fn run_cycle(&mut self) -> Severity {
        let snapshot = self.reader.sample();
        if log::log_enabled!(log::Level::Debug) {
            match serde_json::to_string(&*snapshot) {
                Ok(json) => debug!("Snapshot: {}", json),
                Err(e) => debug!("Snapshot not serializable: {}", e),
            }
        }

        let severity = self.indicator.apply(&snapshot);
        self.alerts.evaluate(&snapshot).await;
        self.cycles += 1;
        severity
    }

    /// Sample every `interval` until `shutdown` fires, then release the
    /// hardware. Consuming `self` means the release happens exactly once.
    ///
    /// A cycle that has started always finishes, including any alert still
    /// being delivered (bounded by the notifier timeout). Only the sleep
    /// between cycles is cut short.
    pub async fn run(mut self, shutdown: CancellationToken) -> LoopState {
        info!("Sensor loop started, sampling every {:?}", self.interval);

        while self.state == LoopState::Running {
            if shutdown.is_cancelled() {
                self.state = LoopState::Stopping;
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = shutdown.cancelled() => self.state = LoopState::Stopping,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(
            "Sensor loop {} after {} cycles, releasing hardware",
            self.state, self.cycles
        );
        self.release();
        self.state = LoopState::Stopped;
        info!("Sensor loop {}", self.state);
        self.state
    }

    fn release(&mut self) {
        if let Err(e) = self.indicator.release() {
            warn!("Failed to release indicator outputs: {}", e);
        }
        if let Err(e) = self.reader.release() {
            warn!("Failed to release sensors: {}", e);
        }
    }
}
