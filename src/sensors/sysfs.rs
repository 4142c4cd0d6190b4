//! GPIO access through the Linux sysfs interface (`/sys/class/gpio`).
//!
//! Each pin is exported, given a direction, then read or written through its
//! `value` attribute. Releasing the handle unexports every pin it claimed.

use super::{DigitalInput, DigitalOutput};
use crate::error::{MonitorError, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// A set of GPIO lines claimed in one direction.
pub struct SysfsGpio {
    root: PathBuf,
    pins: Vec<u8>,
    direction: Direction,
}

impl SysfsGpio {
    /// Claim `pins` as inputs. Fails if any pin cannot be exported.
    pub fn open_inputs(root: impl AsRef<Path>, pins: &[u8]) -> Result<Self> {
        Self::open(root.as_ref(), pins, Direction::In)
    }

    /// Claim `pins` as outputs, initially driven low.
    pub fn open_outputs(root: impl AsRef<Path>, pins: &[u8]) -> Result<Self> {
        Self::open(root.as_ref(), pins, Direction::Out)
    }

    fn open(root: &Path, pins: &[u8], direction: Direction) -> Result<Self> {
        let mut gpio = Self {
            root: root.to_path_buf(),
            pins: Vec::with_capacity(pins.len()),
            direction,
        };

        for &pin in pins {
            if let Err(e) = gpio.claim(pin) {
                // Hand back whatever was claimed before failing
                let _ = gpio.unexport_all();
                return Err(e);
            }
        }

        info!(
            "Claimed GPIO {:?} as {} via {}",
            gpio.pins,
            direction.as_str(),
            gpio.root.display()
        );
        Ok(gpio)
    }

    fn pin_dir(&self, pin: u8) -> PathBuf {
        self.root.join(format!("gpio{}", pin))
    }

    fn claim(&mut self, pin: u8) -> Result<()> {
        self.export(pin)?;
        self.pins.push(pin);
        write_attr(
            &self.pin_dir(pin).join("direction"),
            pin,
            self.direction.as_str(),
        )?;
        if self.direction == Direction::Out {
            write_attr(&self.pin_dir(pin).join("value"), pin, "0")?;
        }
        Ok(())
    }

    fn export(&self, pin: u8) -> Result<()> {
        if self.pin_dir(pin).exists() {
            debug!("GPIO {} already exported", pin);
            return Ok(());
        }
        write_attr(&self.root.join("export"), pin, &pin.to_string())
    }

    fn claimed(&self, pin: u8) -> Result<()> {
        if self.pins.contains(&pin) {
            Ok(())
        } else {
            Err(MonitorError::Gpio {
                pin,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("pin not claimed as {}", self.direction.as_str()),
                ),
            })
        }
    }

    fn unexport_all(&mut self) -> Result<()> {
        let mut first_error = None;
        for pin in self.pins.drain(..) {
            let result = write_attr(&self.root.join("unexport"), pin, &pin.to_string());
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl DigitalInput for SysfsGpio {
    fn read(&mut self, pin: u8) -> Result<bool> {
        self.claimed(pin)?;
        let path = self.pin_dir(pin).join("value");
        let raw = fs::read_to_string(&path).map_err(|source| MonitorError::Gpio { pin, source })?;
        Ok(raw.trim() == "1")
    }

    fn release(&mut self) -> Result<()> {
        self.unexport_all()
    }
}

impl DigitalOutput for SysfsGpio {
    fn write(&mut self, pin: u8, level: bool) -> Result<()> {
        self.claimed(pin)?;
        write_attr(
            &self.pin_dir(pin).join("value"),
            pin,
            if level { "1" } else { "0" },
        )
    }

    fn release(&mut self) -> Result<()> {
        self.unexport_all()
    }
}

fn write_attr(path: &Path, pin: u8, value: &str) -> Result<()> {
    fs::write(path, value).map_err(|source| MonitorError::Gpio { pin, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a fake sysfs tree with the given pins already exported.
    fn fake_sysfs(pins: &[u8]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("export"), "").unwrap();
        fs::write(dir.path().join("unexport"), "").unwrap();
        for pin in pins {
            let pin_dir = dir.path().join(format!("gpio{}", pin));
            fs::create_dir(&pin_dir).unwrap();
            fs::write(pin_dir.join("direction"), "in").unwrap();
            fs::write(pin_dir.join("value"), "0").unwrap();
        }
        dir
    }

    #[test]
    fn test_inputs_read_value_attribute() {
        let sysfs = fake_sysfs(&[17, 27]);
        let mut gpio = SysfsGpio::open_inputs(sysfs.path(), &[17, 27]).unwrap();

        fs::write(sysfs.path().join("gpio17/value"), "1\n").unwrap();
        assert!(gpio.read(17).unwrap());
        assert!(!gpio.read(27).unwrap());
        assert_eq!(
            fs::read_to_string(sysfs.path().join("gpio27/direction")).unwrap(),
            "in"
        );
    }

    #[test]
    fn test_outputs_start_low_and_write() {
        let sysfs = fake_sysfs(&[5, 6, 13]);
        fs::write(sysfs.path().join("gpio5/value"), "1").unwrap();

        let mut gpio = SysfsGpio::open_outputs(sysfs.path(), &[5, 6, 13]).unwrap();
        let value = |pin: u8| fs::read_to_string(sysfs.path().join(format!("gpio{pin}/value"))).unwrap();
        assert_eq!(value(5), "0");
        assert_eq!(
            fs::read_to_string(sysfs.path().join("gpio13/direction")).unwrap(),
            "out"
        );

        gpio.write(6, true).unwrap();
        assert_eq!(value(6), "1");
    }

    #[test]
    fn test_unclaimed_pin_is_rejected() {
        let sysfs = fake_sysfs(&[17]);
        let mut gpio = SysfsGpio::open_inputs(sysfs.path(), &[17]).unwrap();
        assert!(matches!(gpio.read(4), Err(MonitorError::Gpio { pin: 4, .. })));
    }

    #[test]
    fn test_missing_pin_directory_fails_open() {
        // Export "succeeds" on a plain file but the kernel never creates gpio22/
        let sysfs = fake_sysfs(&[]);
        let result = SysfsGpio::open_inputs(sysfs.path(), &[22]);
        assert!(matches!(result, Err(MonitorError::Gpio { pin: 22, .. })));
    }

    #[test]
    fn test_release_unexports_once() {
        let sysfs = fake_sysfs(&[5]);
        let mut gpio = SysfsGpio::open_outputs(sysfs.path(), &[5]).unwrap();

        DigitalOutput::release(&mut gpio).unwrap();
        assert_eq!(
            fs::read_to_string(sysfs.path().join("unexport")).unwrap(),
            "5"
        );
        assert!(gpio.pins.is_empty());
        assert!(gpio.write(5, true).is_err());
    }
}
