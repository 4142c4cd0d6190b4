//! Edge-triggered alerting.
//!
//! Each condition raises one notification when it turns bad and stays quiet
//! until it has been good for at least one cycle. A flapping network never
//! causes a retry storm: the flag is set even when delivery fails.

use crate::notifier::Notifier;
use crate::sensors::Snapshot;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Condition {
    SoundElevated,
    LightInsufficient,
    TemperatureOutOfRange,
}

impl Condition {
    pub fn is_bad(self, snapshot: &Snapshot) -> bool {
        match self {
            Condition::SoundElevated => snapshot.sound_detected(),
            Condition::LightInsufficient => !snapshot.light_detected(),
            // An unreadable sensor is not an excursion
            Condition::TemperatureOutOfRange => snapshot
                .temperature_c()
                .is_some_and(|t| !snapshot.band().contains(t)),
        }
    }

    pub fn message(self, snapshot: &Snapshot) -> String {
        match self {
            Condition::SoundElevated => "Warning: ambient sound level has risen!".to_string(),
            Condition::LightInsufficient => "Warning: light level is insufficient!".to_string(),
            Condition::TemperatureOutOfRange => format!(
                "Warning: temperature is out of the ideal range! ({:.1}°C)",
                snapshot.temperature_c().unwrap_or(f64::NAN)
            ),
        }
    }
}

/// Per-condition "already notified for this excursion" flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    pub sound: bool,
    pub light: bool,
    pub temperature: bool,
}

impl AlertState {
    pub fn get(&self, condition: Condition) -> bool {
        match condition {
            Condition::SoundElevated => self.sound,
            Condition::LightInsufficient => self.light,
            Condition::TemperatureOutOfRange => self.temperature,
        }
    }

    fn set(&mut self, condition: Condition, sent: bool) {
        match condition {
            Condition::SoundElevated => self.sound = sent,
            Condition::LightInsufficient => self.light = sent,
            Condition::TemperatureOutOfRange => self.temperature = sent,
        }
    }
}

pub struct AlertManager {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    state: AlertState,
}

impl AlertManager {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self {
            notifier,
            timeout,
            state: AlertState::default(),
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Check every condition against `snapshot`, notifying on each
    /// good-to-bad transition. Returns the conditions that fired.
    ///
    /// Never fails: delivery errors and timeouts are logged and dropped.
    pub async fn evaluate(&mut self, snapshot: &Snapshot) -> Vec<Condition> {
        let mut fired = Vec::new();
        for condition in Condition::iter() {
            if !condition.is_bad(snapshot) {
                self.state.set(condition, false);
                continue;
            }
            if self.state.get(condition) {
                continue;
            }

            self.dispatch(condition, &condition.message(snapshot)).await;
            self.state.set(condition, true);
            fired.push(condition);
        }
        fired
    }

    async fn dispatch(&self, condition: Condition, text: &str) {
        match tokio::time::timeout(self.timeout, self.notifier.send(text)).await {
            Ok(Ok(())) => info!("Alert sent ({}): {}", condition, text),
            Ok(Err(e)) => warn!("Failed to send {} alert: {}", condition, e),
            Err(_) => warn!(
                "Sending {} alert timed out after {:?}",
                condition, self.timeout
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::testing::{FailingNotifier, HangingNotifier, RecordingNotifier};
    use crate::sensors::{SmoothedTemperatureFilter, TemperatureBand, TemperatureStatus};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn snapshot(sound: bool, light: bool, temp: Option<f64>) -> Snapshot {
        Snapshot::new(sound, light, temp, TemperatureBand::default())
    }

    fn manager() -> (AlertManager, RecordingNotifier) {
        let notifier = RecordingNotifier::default();
        (
            AlertManager::new(Arc::new(notifier.clone()), TIMEOUT),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_all_ideal_sends_nothing() {
        let (mut alerts, notifier) = manager();
        let fired = alerts.evaluate(&snapshot(false, true, Some(22.0))).await;
        assert!(fired.is_empty());
        assert!(notifier.sent().is_empty());
        assert_eq!(alerts.state(), AlertState::default());
    }

    #[tokio::test]
    async fn test_edge_triggered_sequence() {
        let (mut alerts, notifier) = manager();
        let pattern = [false, true, true, false, true];
        let mut fired_at = Vec::new();

        for (i, loud) in pattern.into_iter().enumerate() {
            let fired = alerts.evaluate(&snapshot(loud, true, Some(22.0))).await;
            if fired.contains(&Condition::SoundElevated) {
                fired_at.push(i);
            }
        }

        assert_eq!(fired_at, vec![1, 4]);
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_bad_state_sends_once() {
        let (mut alerts, notifier) = manager();
        for _ in 0..4 {
            alerts.evaluate(&snapshot(true, true, Some(22.0))).await;
        }
        assert_eq!(
            notifier.sent(),
            vec!["Warning: ambient sound level has risen!".to_string()]
        );
        assert!(alerts.state().sound);
    }

    #[tokio::test]
    async fn test_all_three_fire_in_one_cycle() {
        let (mut alerts, notifier) = manager();
        let fired = alerts.evaluate(&snapshot(true, false, Some(30.0))).await;

        assert_eq!(
            fired,
            vec![
                Condition::SoundElevated,
                Condition::LightInsufficient,
                Condition::TemperatureOutOfRange
            ]
        );
        assert_eq!(
            notifier.sent(),
            vec![
                "Warning: ambient sound level has risen!".to_string(),
                "Warning: light level is insufficient!".to_string(),
                "Warning: temperature is out of the ideal range! (30.0°C)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_temperature_bounds_are_inclusive() {
        for (temp, alerts_expected) in [(19.0, false), (25.0, false), (18.9, true), (25.1, true)] {
            let (mut alerts, _) = manager();
            let fired = alerts.evaluate(&snapshot(false, true, Some(temp))).await;
            assert_eq!(
                fired.contains(&Condition::TemperatureOutOfRange),
                alerts_expected,
                "temperature {temp}"
            );
        }
    }

    #[tokio::test]
    async fn test_smoothed_mean_on_band_edge_is_ideal() {
        for window in [vec![24.6, 24.7, 25.3, 25.4], vec![18.8, 18.9, 19.3]] {
            let mut filter = SmoothedTemperatureFilter::new(window.len());
            for sample in &window {
                filter.record(*sample);
            }
            let edge = snapshot(false, true, filter.average());
            assert_eq!(
                edge.temperature_status(),
                TemperatureStatus::Ideal,
                "window {window:?}"
            );

            let (mut alerts, notifier) = manager();
            assert!(alerts.evaluate(&edge).await.is_empty());
            assert!(notifier.sent().is_empty());
        }
    }

    #[tokio::test]
    async fn test_unreadable_temperature_never_alerts() {
        let (mut alerts, notifier) = manager();
        for _ in 0..3 {
            let fired = alerts.evaluate(&snapshot(false, true, None)).await;
            assert!(fired.is_empty());
        }
        assert!(notifier.sent().is_empty());
        assert!(!alerts.state().temperature);
    }

    #[tokio::test]
    async fn test_unreadable_resets_temperature_flag() {
        let (mut alerts, notifier) = manager();
        alerts.evaluate(&snapshot(false, true, Some(30.0))).await;
        assert!(alerts.state().temperature);

        alerts.evaluate(&snapshot(false, true, None)).await;
        assert!(!alerts.state().temperature);

        alerts.evaluate(&snapshot(false, true, Some(17.3))).await;
        assert_eq!(
            notifier.sent().last().unwrap(),
            "Warning: temperature is out of the ideal range! (17.3°C)"
        );
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_conditions_are_independent() {
        let (mut alerts, notifier) = manager();
        alerts.evaluate(&snapshot(true, true, Some(22.0))).await;
        alerts.evaluate(&snapshot(true, false, Some(22.0))).await;
        alerts.evaluate(&snapshot(false, false, Some(22.0))).await;

        assert_eq!(notifier.sent().len(), 2);
        assert!(!alerts.state().sound);
        assert!(alerts.state().light);
    }

    #[tokio::test]
    async fn test_failed_delivery_still_marks_sent() {
        let notifier = FailingNotifier::default();
        let mut alerts = AlertManager::new(Arc::new(notifier.clone()), TIMEOUT);

        let fired = alerts.evaluate(&snapshot(true, true, Some(22.0))).await;
        assert_eq!(fired, vec![Condition::SoundElevated]);
        assert!(alerts.state().sound);

        alerts.evaluate(&snapshot(true, true, Some(22.0))).await;
        assert_eq!(notifier.attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_delivery_is_bounded_by_timeout() {
        let mut alerts = AlertManager::new(Arc::new(HangingNotifier), TIMEOUT);
        let started = tokio::time::Instant::now();

        let fired = alerts.evaluate(&snapshot(true, true, Some(22.0))).await;

        assert_eq!(fired, vec![Condition::SoundElevated]);
        assert!(alerts.state().sound);
        assert!(started.elapsed() >= TIMEOUT);
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[test]
    fn test_condition_names() {
        assert_eq!(Condition::SoundElevated.to_string(), "sound-elevated");
        assert_eq!(Condition::LightInsufficient.to_string(), "light-insufficient");
        assert_eq!(
            Condition::TemperatureOutOfRange.to_string(),
            "temperature-out-of-range"
        );
    }
}
