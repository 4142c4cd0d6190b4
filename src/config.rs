use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from a .env file.
/// Values already present in the environment take precedence.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

fn load_dotenv_from(env_path: &Path) {
    let Ok(content) = fs::read_to_string(env_path) else {
        return;
    };

    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the async runtime starts any threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split a `KEY=value` line, skipping blanks and comments.
/// Values may contain spaces and may be wrapped in single or double quotes.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let mut value = value.trim();
    if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        value = &value[1..value.len() - 1];
    }

    Some((key, value))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub sampling: SamplingConfig,
    pub pins: PinConfig,
    pub thermometer: ThermometerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    /// Destination for alerts. Opaque: a numeric chat id or an `@channel` name.
    pub chat_id: Option<String>,
    pub poll_timeout_secs: u64,
    pub notify_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub interval_secs: u64,
    pub moving_average_size: usize,
    pub ideal_min_c: f64,
    pub ideal_max_c: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    pub gpio_root: String,
    pub sound: u8,
    pub light: u8,
    pub led_green: u8,
    pub led_yellow: u8,
    pub led_red: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermometerConfig {
    /// IIO attribute exposed by the kernel dht11 driver (millidegrees Celsius).
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: None,
                chat_id: None,
                poll_timeout_secs: 30,
                notify_timeout_secs: 5,
            },
            sampling: SamplingConfig {
                interval_secs: 5,
                moving_average_size: 5,
                ideal_min_c: 19.0,
                ideal_max_c: 25.0,
            },
            pins: PinConfig {
                gpio_root: "/sys/class/gpio".to_string(),
                sound: 17,
                light: 27,
                led_green: 5,
                led_yellow: 6,
                led_red: 13,
            },
            thermometer: ThermometerConfig {
                path: "/sys/bus/iio/devices/iio:device0/in_temp_input".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Telegram
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN")
            && !token.trim().is_empty()
        {
            config.telegram.bot_token = Some(token.trim().to_string());
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID")
            && !chat_id.trim().is_empty()
        {
            config.telegram.chat_id = Some(chat_id.trim().to_string());
        }
        if let Some(secs) = env_parse("TELEGRAM_POLL_TIMEOUT_SECS") {
            config.telegram.poll_timeout_secs = secs;
        }
        if let Some(secs) = env_parse("NOTIFY_TIMEOUT_SECS") {
            config.telegram.notify_timeout_secs = secs;
        }

        // Sampling
        if let Some(secs) = env_parse("SAMPLE_INTERVAL_SECS") {
            config.sampling.interval_secs = secs;
        }
        if let Some(size) = env_parse("MOVING_AVERAGE_SIZE") {
            config.sampling.moving_average_size = size;
        }
        if let Some(min) = env_parse("TEMP_IDEAL_MIN") {
            config.sampling.ideal_min_c = min;
        }
        if let Some(max) = env_parse("TEMP_IDEAL_MAX") {
            config.sampling.ideal_max_c = max;
        }

        // Hardware
        if let Ok(root) = std::env::var("GPIO_ROOT") {
            config.pins.gpio_root = root;
        }
        if let Some(pin) = env_parse("SOUND_PIN") {
            config.pins.sound = pin;
        }
        if let Some(pin) = env_parse("LIGHT_PIN") {
            config.pins.light = pin;
        }
        if let Some(pin) = env_parse("LED_GREEN_PIN") {
            config.pins.led_green = pin;
        }
        if let Some(pin) = env_parse("LED_YELLOW_PIN") {
            config.pins.led_yellow = pin;
        }
        if let Some(pin) = env_parse("LED_RED_PIN") {
            config.pins.led_red = pin;
        }
        if let Ok(path) = std::env::var("THERMOMETER_PATH") {
            config.thermometer.path = path;
        }

        config
    }

    /// Reject settings that would make the monitor misbehave silently.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.moving_average_size == 0 {
            return Err(MonitorError::Config(
                "MOVING_AVERAGE_SIZE must be at least 1".to_string(),
            ));
        }
        if self.sampling.interval_secs == 0 {
            return Err(MonitorError::Config(
                "SAMPLE_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        if self.telegram.notify_timeout_secs == 0 {
            return Err(MonitorError::Config(
                "NOTIFY_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        let (min, max) = (self.sampling.ideal_min_c, self.sampling.ideal_max_c);
        if min.is_nan() || max.is_nan() || min > max {
            return Err(MonitorError::Config(format!(
                "ideal temperature band is invalid ({} .. {})",
                min, max
            )));
        }

        let p = &self.pins;
        let mut pins = [p.sound, p.light, p.led_green, p.led_yellow, p.led_red];
        pins.sort_unstable();
        if pins.windows(2).any(|w| w[0] == w[1]) {
            return Err(MonitorError::Config(
                "GPIO pins must all be distinct".to_string(),
            ));
        }

        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sampling.interval_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.notify_timeout_secs)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.telegram.poll_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}
