use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum MonitorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("GPIO {pin} error: {source}")]
    Gpio {
        pin: u8,
        #[source]
        source: std::io::Error,
    },

    #[error("Thermometer unavailable: {0}")]
    ThermometerUnavailable(String),

    /// Transient read failure (checksum/timing on the sensor bus).
    #[error("Sensor read failed: {0}")]
    SensorRead(String),

    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("Another instance is already running")]
    InstanceLocked,

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
