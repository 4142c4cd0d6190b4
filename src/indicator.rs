//! Three-LED status indicator.
//!
//! Counts how many conditions are bad and lights exactly one LED:
//! green for none, yellow for one, red for two or more.

use crate::error::Result;
use crate::sensors::{DigitalOutput, Snapshot};
use log::{info, warn};
use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    pub fn from_bad_count(bad_count: usize) -> Self {
        match bad_count {
            0 => Severity::Green,
            1 => Severity::Yellow,
            _ => Severity::Red,
        }
    }
}

/// Number of conditions that are not ideal.
///
/// An unreadable temperature counts as bad here, unlike for alerting.
pub fn bad_count(snapshot: &Snapshot) -> usize {
    let temperature_bad = match snapshot.temperature_c() {
        None => true,
        Some(t) => !snapshot.band().contains(t),
    };
    [
        snapshot.sound_detected(),
        !snapshot.light_detected(),
        temperature_bad,
    ]
    .into_iter()
    .filter(|bad| *bad)
    .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedPins {
    pub green: u8,
    pub yellow: u8,
    pub red: u8,
}

impl LedPins {
    pub fn all(&self) -> [u8; 3] {
        [self.green, self.yellow, self.red]
    }

    fn for_severity(&self, severity: Severity) -> u8 {
        match severity {
            Severity::Green => self.green,
            Severity::Yellow => self.yellow,
            Severity::Red => self.red,
        }
    }
}

pub struct IndicatorController {
    outputs: Box<dyn DigitalOutput>,
    pins: LedPins,
    current: Option<Severity>,
}

impl IndicatorController {
    pub fn new(outputs: Box<dyn DigitalOutput>, pins: LedPins) -> Self {
        Self {
            outputs,
            pins,
            current: None,
        }
    }

    /// Drive the LEDs for `snapshot` and return the severity shown.
    ///
    /// The inactive LEDs go dark before the active one lights, so two are
    /// never on together. Write failures are logged and skipped.
    pub fn apply(&mut self, snapshot: &Snapshot) -> Severity {
        let severity = Severity::from_bad_count(bad_count(snapshot));
        let active = self.pins.for_severity(severity);

        for pin in self.pins.all().into_iter().filter(|pin| *pin != active) {
            self.write(pin, false);
        }
        self.write(active, true);

        if self.current != Some(severity) {
            info!("Indicator is now {}", severity);
            self.current = Some(severity);
        }
        severity
    }

    pub fn current(&self) -> Option<Severity> {
        self.current
    }

    /// Switch every LED off and hand the outputs back.
    pub fn release(&mut self) -> Result<()> {
        for pin in self.pins.all() {
            self.write(pin, false);
        }
        self.current = None;
        self.outputs.release()
    }

    fn write(&mut self, pin: u8, level: bool) {
        if let Err(e) = self.outputs.write(pin, level) {
            warn!("Setting LED on GPIO {} to {} failed: {}", pin, level, e);
        }
    }
}
