//! Sensor sampling for the classroom monitor.
//!
//! The hardware is reached through three narrow traits so the sampling,
//! smoothing and alerting logic never touches a bus directly:
//!
//! - [`DigitalInput`]: polled digital levels (sound and light detectors)
//! - [`DigitalOutput`]: indicator LEDs
//! - [`Thermometer`]: temperature sensor that may fail transiently
//!
//! Linux backends live in [`sysfs`] and [`iio`]; [`simulation`] provides
//! in-memory hardware for `--simulate` and tests.

pub mod filter;
pub mod iio;
pub mod reader;
pub mod simulation;
pub mod snapshot;
pub mod sysfs;

pub use filter::SmoothedTemperatureFilter;
pub use reader::{InputPins, SensorStateReader};
pub use snapshot::{LightStatus, SharedSnapshot, Snapshot, SoundStatus, TemperatureStatus};

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Digital input source, polled once per cycle.
pub trait DigitalInput: Send {
    /// Read the level of `pin`. `true` is logic high.
    fn read(&mut self, pin: u8) -> Result<bool>;

    /// Give the pins back to the system.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Digital output sink. Each write takes effect immediately.
pub trait DigitalOutput: Send {
    fn write(&mut self, pin: u8, level: bool) -> Result<()>;

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Temperature sensor.
///
/// `read_celsius` may fail transiently (checksum or timing errors on the
/// sensor bus); callers skip the sample and try again next cycle.
pub trait Thermometer: Send {
    fn read_celsius(&mut self) -> Result<f64>;

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Inclusive range of temperatures considered ideal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBand {
    pub min_c: f64,
    pub max_c: f64,
}

impl TemperatureBand {
    pub const fn new(min_c: f64, max_c: f64) -> Self {
        Self { min_c, max_c }
    }

    pub fn contains(&self, celsius: f64) -> bool {
        (self.min_c..=self.max_c).contains(&celsius)
    }
}

impl Default for TemperatureBand {
    fn default() -> Self {
        Self::new(19.0, 25.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_is_inclusive() {
        let band = TemperatureBand::default();
        assert!(band.contains(19.0));
        assert!(band.contains(25.0));
        assert!(band.contains(22.0));
        assert!(!band.contains(18.9));
        assert!(!band.contains(25.1));
        assert!(!band.contains(f64::NAN));
    }
}
