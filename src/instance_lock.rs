//! Single instance lock using a Unix socket.
//!
//! Two monitors driving the same GPIO lines would fight over the LEDs. The
//! socket is released by the OS when the process dies, so a crash never
//! leaves a stale lock behind.

use crate::error::{MonitorError, Result};
use log::debug;
use std::io;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOCK_NAME: &str = "classroom-monitor.sock";

/// Held for as long as the process should own the hardware.
pub struct InstanceLock {
    _listener: UnixListener,
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lock in the runtime directory.
    pub fn acquire() -> Result<Self> {
        Self::acquire_at(&Self::socket_path(DEFAULT_LOCK_NAME))
    }

    /// Take the lock at an explicit socket path.
    pub fn acquire_at(path: &Path) -> Result<Self> {
        if path.exists() {
            // A live listener answers; a dead one leaves a stale file behind
            if UnixStream::connect(path).is_ok() {
                return Err(MonitorError::InstanceLocked);
            }
            debug!("Removing stale instance lock {}", path.display());
            let _ = std::fs::remove_file(path);
        }

        match UnixListener::bind(path) {
            Ok(listener) => Ok(Self {
                _listener: listener,
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => Err(MonitorError::InstanceLocked),
            Err(e) => Err(MonitorError::IoError(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `$XDG_RUNTIME_DIR/<name>`, falling back to `/tmp/<name>`.
    pub fn socket_path(name: &str) -> PathBuf {
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(name)
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.sock");

        let lock = InstanceLock::acquire_at(&path).unwrap();
        assert_eq!(lock.path(), path.as_path());
        assert!(matches!(
            InstanceLock::acquire_at(&path),
            Err(MonitorError::InstanceLocked)
        ));

        drop(lock);
        assert!(!path.exists());
        assert!(InstanceLock::acquire_at(&path).is_ok());
    }

    #[test]
    fn test_stale_socket_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.sock");

        // Bind and drop the listener without cleanup, like a SIGKILL'd process
        drop(UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        assert!(InstanceLock::acquire_at(&path).is_ok());
    }

    #[test]
    fn test_socket_path_ends_with_name() {
        let path = InstanceLock::socket_path(DEFAULT_LOCK_NAME);
        assert!(path.ends_with(DEFAULT_LOCK_NAME));
    }
}
