//! Wiring: turn a [`Config`] into a ready-to-run [`SensorLoop`].

use crate::alerts::AlertManager;
use crate::config::Config;
use crate::error::Result;
use crate::indicator::{IndicatorController, LedPins};
use crate::monitor::SensorLoop;
use crate::notifier::Notifier;
use crate::sensors::iio::IioThermometer;
use crate::sensors::simulation::{SimulatedInputs, SimulatedOutputs, SimulatedThermometer};
use crate::sensors::sysfs::SysfsGpio;
use crate::sensors::{
    DigitalInput, DigitalOutput, InputPins, SensorStateReader, SharedSnapshot,
    SmoothedTemperatureFilter, TemperatureBand, Thermometer,
};
use log::warn;
use std::sync::Arc;

/// The three hardware collaborators the sensor loop owns.
pub struct Hardware {
    pub inputs: Box<dyn DigitalInput>,
    pub outputs: Box<dyn DigitalOutput>,
    pub thermometer: Box<dyn Thermometer>,
}

/// Handles for steering simulated hardware from outside the loop.
pub struct SimulationHandles {
    pub inputs: SimulatedInputs,
    pub outputs: SimulatedOutputs,
    pub thermometer: SimulatedThermometer,
}

impl Hardware {
    /// Claim the GPIO lines and bind the thermometer.
    ///
    /// Any failure here is a deployment problem and aborts startup. Lines
    /// claimed before the failure are handed back first.
    pub fn open(config: &Config) -> Result<Self> {
        let root = &config.pins.gpio_root;
        let pins = input_pins(config);
        let leds = led_pins(config);

        let mut inputs = SysfsGpio::open_inputs(root, &[pins.sound, pins.light])?;
        let mut outputs = match SysfsGpio::open_outputs(root, &leds.all()) {
            Ok(outputs) => outputs,
            Err(e) => {
                release_quietly(&mut inputs);
                return Err(e);
            }
        };
        let thermometer = match IioThermometer::open(&config.thermometer.path) {
            Ok(thermometer) => thermometer,
            Err(e) => {
                release_quietly(&mut inputs);
                if let Err(release_err) = DigitalOutput::release(&mut outputs) {
                    warn!("Releasing outputs after failed startup: {}", release_err);
                }
                return Err(e);
            }
        };

        Ok(Self {
            inputs: Box::new(inputs),
            outputs: Box::new(outputs),
            thermometer: Box::new(thermometer),
        })
    }

    /// In-memory hardware starting in a comfortable, quiet, well-lit room.
    /// About one temperature read in five fails, like a real DHT11.
    pub fn simulated(config: &Config) -> (Self, SimulationHandles) {
        let pins = input_pins(config);
        let inputs = SimulatedInputs::new();
        inputs.set(pins.sound, false);
        inputs.set(pins.light, true);
        let outputs = SimulatedOutputs::new();
        let thermometer = SimulatedThermometer::new(Some(22.0));
        thermometer.set_failure_rate(0.2);

        let hardware = Self {
            inputs: Box::new(inputs.clone()),
            outputs: Box::new(outputs.clone()),
            thermometer: Box::new(thermometer.clone()),
        };
        let handles = SimulationHandles {
            inputs,
            outputs,
            thermometer,
        };
        (hardware, handles)
    }
}

fn release_quietly(inputs: &mut SysfsGpio) {
    if let Err(e) = DigitalInput::release(inputs) {
        warn!("Releasing inputs after failed startup: {}", e);
    }
}

pub fn input_pins(config: &Config) -> InputPins {
    InputPins {
        sound: config.pins.sound,
        light: config.pins.light,
    }
}

pub fn led_pins(config: &Config) -> LedPins {
    LedPins {
        green: config.pins.led_green,
        yellow: config.pins.led_yellow,
        red: config.pins.led_red,
    }
}

pub fn temperature_band(config: &Config) -> TemperatureBand {
    TemperatureBand::new(config.sampling.ideal_min_c, config.sampling.ideal_max_c)
}

/// Assemble a fresh loop: empty history, all alerts armed.
pub fn build_sensor_loop(
    config: &Config,
    hardware: Hardware,
    notifier: Arc<dyn Notifier>,
    latest: SharedSnapshot,
) -> SensorLoop {
    let reader = SensorStateReader::new(
        hardware.inputs,
        hardware.thermometer,
        input_pins(config),
        SmoothedTemperatureFilter::new(config.sampling.moving_average_size),
        temperature_band(config),
        latest,
    );
    let indicator = IndicatorController::new(hardware.outputs, led_pins(config));
    let alerts = AlertManager::new(notifier, config.notify_timeout());
    SensorLoop::new(reader, indicator, alerts, config.sample_interval())
}
