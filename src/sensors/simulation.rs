//! Simulated hardware for development and testing.
//!
//! Every simulated device is a cheap handle around shared state, so a test
//! (or the random driver task) can keep a clone and change levels while the
//! sensor loop owns the other clone.

use super::reader::InputPins;
use super::{DigitalInput, DigitalOutput, Thermometer};
use crate::error::{MonitorError, Result};
use log::info;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Simulated digital inputs. Unset pins read low.
#[derive(Clone, Default)]
pub struct SimulatedInputs {
    levels: Arc<Mutex<BTreeMap<u8, bool>>>,
    failing: Arc<Mutex<HashSet<u8>>>,
    released: Arc<AtomicUsize>,
}

impl SimulatedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pin: u8, level: bool) {
        self.levels.lock().insert(pin, level);
    }

    pub fn get(&self, pin: u8) -> bool {
        self.levels.lock().get(&pin).copied().unwrap_or(false)
    }

    /// Make reads of `pin` fail until cleared.
    pub fn set_failing(&self, pin: u8, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(pin);
        } else {
            set.remove(&pin);
        }
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl DigitalInput for SimulatedInputs {
    fn read(&mut self, pin: u8) -> Result<bool> {
        if self.failing.lock().contains(&pin) {
            return Err(MonitorError::Gpio {
                pin,
                source: std::io::Error::other("simulated read failure"),
            });
        }
        Ok(self.get(pin))
    }

    fn release(&mut self) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Simulated outputs that remember every write.
#[derive(Clone, Default)]
pub struct SimulatedOutputs {
    levels: Arc<Mutex<BTreeMap<u8, bool>>>,
    writes: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl SimulatedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, pin: u8) -> bool {
        self.levels.lock().get(&pin).copied().unwrap_or(false)
    }

    /// Pins currently driven high, in ascending order.
    pub fn lit_pins(&self) -> Vec<u8> {
        self.levels
            .lock()
            .iter()
            .filter(|(_, level)| **level)
            .map(|(pin, _)| *pin)
            .collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl DigitalOutput for SimulatedOutputs {
    fn write(&mut self, pin: u8, level: bool) -> Result<()> {
        self.levels.lock().insert(pin, level);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ThermometerState {
    celsius: Option<f64>,
    scripted: VecDeque<Option<f64>>,
    failure_rate: f64,
    rng: StdRng,
}

/// Simulated temperature sensor.
///
/// Scripted readings are consumed first (`None` is a failed read). After
/// that, reads return the current value, failing at random with
/// `failure_rate` the way a DHT11 drops frames.
#[derive(Clone)]
pub struct SimulatedThermometer {
    state: Arc<Mutex<ThermometerState>>,
    released: Arc<AtomicUsize>,
}

impl SimulatedThermometer {
    pub fn new(celsius: Option<f64>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ThermometerState {
                celsius,
                scripted: VecDeque::new(),
                failure_rate: 0.0,
                rng: StdRng::from_entropy(),
            })),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, celsius: Option<f64>) {
        self.state.lock().celsius = celsius;
    }

    pub fn get(&self) -> Option<f64> {
        self.state.lock().celsius
    }

    /// Queue readings returned before falling back to the current value.
    pub fn script(&self, readings: impl IntoIterator<Item = Option<f64>>) {
        self.state.lock().scripted.extend(readings);
    }

    pub fn set_failure_rate(&self, rate: f64) {
        self.state.lock().failure_rate = rate.clamp(0.0, 1.0);
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Thermometer for SimulatedThermometer {
    fn read_celsius(&mut self) -> Result<f64> {
        let mut state = self.state.lock();
        let reading = match state.scripted.pop_front() {
            Some(reading) => reading,
            None => {
                let rate = state.failure_rate;
                if rate > 0.0 && state.rng.gen_bool(rate) {
                    None
                } else {
                    state.celsius
                }
            }
        };
        reading.ok_or_else(|| MonitorError::SensorRead("simulated checksum error".to_string()))
    }

    fn release(&mut self) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Spawn a task that wanders the simulated environment around.
///
/// Every `period` the sound and light levels may flip and the temperature
/// takes a small random step, drifting in and out of the comfortable range.
pub fn run_environment_simulation(
    inputs: SimulatedInputs,
    thermometer: SimulatedThermometer,
    pins: InputPins,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }

            if rng.gen_bool(0.2) {
                let loud = !inputs.get(pins.sound);
                inputs.set(pins.sound, loud);
                info!("[Sim] Sound detector now {}", if loud { "high" } else { "low" });
            }
            if rng.gen_bool(0.1) {
                let bright = !inputs.get(pins.light);
                inputs.set(pins.light, bright);
                info!("[Sim] Light detector now {}", if bright { "high" } else { "low" });
            }

            let current = thermometer.get().unwrap_or(22.0);
            let next = (current + rng.gen_range(-0.8f64..=0.8)).clamp(14.0, 32.0);
            thermometer.set(Some(next));
        }
    })
}
