// src/exec/mod.rs

//! Execution layer.
//!
//! - [`payload`] defines the type-erased unit of work a task carries.
//! - [`bridge`] provides the `DeviceBridge` abstraction for running device
//!   tool commands (e.g. `adb install app.apk`) and a concrete
//!   `ShellBridge` backed by `tokio::process::Command`, plus the
//!   [`bridge_payload`] constructor that turns a command into a task payload.
//!
//! The scheduler itself does not care what a payload does; these are the
//! payloads the CLI builds from its config.

pub mod bridge;
pub mod payload;

pub use bridge::{BridgeFuture, BridgeOutput, DeviceBridge, ShellBridge, bridge_payload};
pub use payload::{Payload, PayloadFuture, PayloadResult};
