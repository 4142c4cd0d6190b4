//! Classroom environment monitor library.
//!
//! Samples sound, light and temperature sensors on a single-board computer,
//! shows the overall state on a green/yellow/red LED indicator and alerts an
//! operator over Telegram when the room drifts out of range.

pub mod alerts;
pub mod app;
pub mod bot;
pub mod config;
pub mod error;
pub mod indicator;
pub mod instance_lock;
pub mod monitor;
pub mod notifier;
pub mod sensors;
pub mod telegram;
