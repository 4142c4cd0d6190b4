//! Per-cycle sensor polling.

use super::filter::SmoothedTemperatureFilter;
use super::snapshot::{SharedSnapshot, Snapshot};
use super::{DigitalInput, TemperatureBand, Thermometer};
use crate::error::Result;
use log::{debug, warn};
use std::sync::Arc;

/// GPIO lines of the two digital detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPins {
    pub sound: u8,
    pub light: u8,
}

/// Polls the detectors and the thermometer once per cycle.
///
/// Nothing is retried inside a cycle. A failed temperature read leaves the
/// moving average untouched and the next cycle is the retry. A failed
/// digital read reuses the last level seen on that pin.
pub struct SensorStateReader {
    inputs: Box<dyn DigitalInput>,
    thermometer: Box<dyn Thermometer>,
    pins: InputPins,
    filter: SmoothedTemperatureFilter,
    band: TemperatureBand,
    latest: SharedSnapshot,
    last_sound: bool,
    last_light: bool,
}

impl SensorStateReader {
    pub fn new(
        inputs: Box<dyn DigitalInput>,
        thermometer: Box<dyn Thermometer>,
        pins: InputPins,
        filter: SmoothedTemperatureFilter,
        band: TemperatureBand,
        latest: SharedSnapshot,
    ) -> Self {
        Self {
            inputs,
            thermometer,
            pins,
            filter,
            band,
            latest,
            last_sound: false,
            last_light: false,
        }
    }

    /// Take one sample of every sensor and publish it as the latest snapshot.
    pub fn sample(&mut self) -> Arc<Snapshot> {
        self.last_sound = read_level(self.inputs.as_mut(), self.pins.sound, self.last_sound);
        self.last_light = read_level(self.inputs.as_mut(), self.pins.light, self.last_light);

        match self.thermometer.read_celsius() {
            Ok(celsius) => self.filter.record(celsius),
            Err(e) => debug!("Temperature read skipped this cycle: {}", e),
        }

        let snapshot = Snapshot::new(
            self.last_sound,
            self.last_light,
            self.filter.average(),
            self.band,
        );
        self.latest.publish(snapshot)
    }

    pub fn filter(&self) -> &SmoothedTemperatureFilter {
        &self.filter
    }

    /// Release the detectors and the thermometer.
    pub fn release(&mut self) -> Result<()> {
        let inputs = self.inputs.release();
        let thermometer = self.thermometer.release();
        inputs.and(thermometer)
    }
}

fn read_level(inputs: &mut dyn DigitalInput, pin: u8, last: bool) -> bool {
    match inputs.read(pin) {
        Ok(level) => level,
        Err(e) => {
            warn!("Reading GPIO {} failed, keeping last level: {}", pin, e);
            last
        }
    }
}
