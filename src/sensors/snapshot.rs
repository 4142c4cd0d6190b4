//! Snapshot of one sampling cycle and the shared "latest snapshot" slot.

use super::TemperatureBand;
use chrono::{DateTime, Local};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SoundStatus {
    #[strum(to_string = "ideal")]
    Ideal,
    #[strum(to_string = "elevated")]
    Elevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum LightStatus {
    #[strum(to_string = "ideal")]
    Ideal,
    #[strum(to_string = "insufficient")]
    Insufficient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureStatus {
    #[strum(to_string = "ideal")]
    Ideal,
    #[strum(to_string = "out of range")]
    OutOfRange,
    #[strum(to_string = "unreadable")]
    Unreadable,
}

/// Immutable result of one sampling cycle.
///
/// Status labels are derived from the raw values on demand and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    sound_detected: bool,
    light_detected: bool,
    temperature_c: Option<f64>,
    band: TemperatureBand,
    taken_at: DateTime<Local>,
}

impl Snapshot {
    pub fn new(
        sound_detected: bool,
        light_detected: bool,
        temperature_c: Option<f64>,
        band: TemperatureBand,
    ) -> Self {
        Self {
            sound_detected,
            light_detected,
            temperature_c,
            band,
            taken_at: Local::now(),
        }
    }

    pub fn sound_detected(&self) -> bool {
        self.sound_detected
    }

    /// `true` when there is adequate light.
    pub fn light_detected(&self) -> bool {
        self.light_detected
    }

    /// Smoothed temperature, `None` until the first successful reading.
    pub fn temperature_c(&self) -> Option<f64> {
        self.temperature_c
    }

    pub fn band(&self) -> TemperatureBand {
        self.band
    }

    pub fn taken_at(&self) -> DateTime<Local> {
        self.taken_at
    }

    pub fn sound_status(&self) -> SoundStatus {
        if self.sound_detected {
            SoundStatus::Elevated
        } else {
            SoundStatus::Ideal
        }
    }

    pub fn light_status(&self) -> LightStatus {
        if self.light_detected {
            LightStatus::Ideal
        } else {
            LightStatus::Insufficient
        }
    }

    pub fn temperature_status(&self) -> TemperatureStatus {
        match self.temperature_c {
            None => TemperatureStatus::Unreadable,
            Some(t) if self.band.contains(t) => TemperatureStatus::Ideal,
            Some(_) => TemperatureStatus::OutOfRange,
        }
    }
}

/// Process-wide slot holding the most recent [`Snapshot`].
///
/// Written by the sampling loop, read concurrently by the bot. A snapshot is
/// published as a whole `Arc`, so readers always see every field from the
/// same cycle. The lock is only held long enough to clone or swap a pointer.
#[derive(Clone, Default)]
pub struct SharedSnapshot {
    inner: Arc<RwLock<Option<Arc<Snapshot>>>>,
}

impl SharedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the latest snapshot.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.inner.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// The latest snapshot, or `None` before the first cycle completes.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(sound: bool, light: bool, temp: Option<f64>) -> Snapshot {
        Snapshot::new(sound, light, temp, TemperatureBand::default())
    }

    #[test]
    fn test_status_labels() {
        let s = snapshot(false, true, Some(22.0));
        assert_eq!(s.sound_status().to_string(), "ideal");
        assert_eq!(s.light_status().to_string(), "ideal");
        assert_eq!(s.temperature_status().to_string(), "ideal");

        let s = snapshot(true, false, Some(30.0));
        assert_eq!(s.sound_status().to_string(), "elevated");
        assert_eq!(s.light_status().to_string(), "insufficient");
        assert_eq!(s.temperature_status().to_string(), "out of range");

        let s = snapshot(false, true, None);
        assert_eq!(s.temperature_status().to_string(), "unreadable");
    }

    #[test]
    fn test_temperature_status_uses_inclusive_band() {
        assert_eq!(
            snapshot(false, true, Some(19.0)).temperature_status(),
            TemperatureStatus::Ideal
        );
        assert_eq!(
            snapshot(false, true, Some(25.0)).temperature_status(),
            TemperatureStatus::Ideal
        );
        assert_eq!(
            snapshot(false, true, Some(18.9)).temperature_status(),
            TemperatureStatus::OutOfRange
        );
        assert_eq!(
            snapshot(false, true, Some(25.1)).temperature_status(),
            TemperatureStatus::OutOfRange
        );
    }

    #[test]
    fn test_shared_snapshot_starts_empty_and_replaces() {
        let shared = SharedSnapshot::new();
        assert!(shared.latest().is_none());

        shared.publish(snapshot(false, true, Some(20.0)));
        let first = shared.latest().unwrap();
        assert_eq!(first.temperature_c(), Some(20.0));

        shared.publish(snapshot(true, false, Some(21.0)));
        let second = shared.latest().unwrap();
        assert!(second.sound_detected());
        assert!(!second.light_detected());

        // Readers holding the old snapshot keep a consistent copy
        assert!(!first.sound_detected());
        assert_eq!(first.temperature_c(), Some(20.0));
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_fields() {
        let shared = SharedSnapshot::new();
        shared.publish(snapshot(false, true, Some(20.0)));

        let writer = {
            let shared = shared.clone();
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    // Even cycles: quiet+light+20, odd cycles: loud+dark+30
                    let odd = i % 2 == 1;
                    let temp = if odd { 30.0 } else { 20.0 };
                    shared.publish(snapshot(odd, !odd, Some(temp)));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let s = shared.latest().unwrap();
                        let odd = s.sound_detected();
                        assert_eq!(s.light_detected(), !odd);
                        assert_eq!(s.temperature_c(), Some(if odd { 30.0 } else { 20.0 }));
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
