//! Temperature from the kernel's IIO subsystem.
//!
//! The `dht11` driver exposes `in_temp_input` in millidegrees Celsius and
//! returns an I/O error when a frame fails its checksum or times out. Those
//! errors are transient and surface as [`MonitorError::SensorRead`].

use super::Thermometer;
use crate::error::{MonitorError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct IioThermometer {
    path: PathBuf,
}

impl IioThermometer {
    /// Bind to an IIO temperature attribute. A missing attribute means the
    /// overlay or driver is not loaded, which is a deployment error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MonitorError::ThermometerUnavailable(format!(
                "{} does not exist (is the dht11 overlay loaded?)",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Thermometer for IioThermometer {
    fn read_celsius(&mut self) -> Result<f64> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| MonitorError::SensorRead(format!("{}: {}", self.path.display(), e)))?;
        parse_millidegrees(&raw)
    }
}

fn parse_millidegrees(raw: &str) -> Result<f64> {
    let milli: i32 = raw
        .trim()
        .parse()
        .map_err(|_| MonitorError::SensorRead(format!("unexpected reading {:?}", raw.trim())))?;
    Ok(milli as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_millidegrees() {
        assert_eq!(parse_millidegrees("22000\n").unwrap(), 22.0);
        assert_eq!(parse_millidegrees("-1500").unwrap(), -1.5);
        assert!(matches!(
            parse_millidegrees("garbage"),
            Err(MonitorError::SensorRead(_))
        ));
        assert!(parse_millidegrees("").is_err());
    }

    #[test]
    fn test_open_missing_attribute_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = IioThermometer::open(dir.path().join("in_temp_input"));
        assert!(matches!(
            result,
            Err(MonitorError::ThermometerUnavailable(_))
        ));
    }

    #[test]
    fn test_read_and_transient_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in_temp_input");
        fs::write(&path, "23000\n").unwrap();

        let mut thermo = IioThermometer::open(&path).unwrap();
        assert_eq!(thermo.read_celsius().unwrap(), 23.0);

        // Disappearing attribute behaves like a bus error: transient
        fs::remove_file(&path).unwrap();
        assert!(matches!(
            thermo.read_celsius(),
            Err(MonitorError::SensorRead(_))
        ));
    }
}
