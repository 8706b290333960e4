// src/exec/bridge.rs

//! Device-bridge invoker.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use super::payload::Payload;

pub type BridgeFuture<'a> = Pin<Box<dyn Future<Output = Result<BridgeOutput>> + Send + 'a>>;

/// Captured result of a bridge command that managed to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl BridgeOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a command against a device tool and reports what happened.
///
/// An `Err` means the command could not be launched at all; a command that
/// ran and failed is an `Ok` with a non-zero `exit_code`.
pub trait DeviceBridge: Send + Sync {
    fn invoke<'a>(&'a self, command: &'a str) -> BridgeFuture<'a>;
}

/// Bridge that runs commands through the platform shell.
///
/// With a `program` set (e.g. `adb`), `invoke("install app.apk")` runs
/// `adb install app.apk`; without one the command is passed through as is.
#[derive(Debug, Clone, Default)]
pub struct ShellBridge {
    program: Option<String>,
}

impl ShellBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: Some(program.into()),
        }
    }

    fn command_line(&self, command: &str) -> String {
        match &self.program {
            Some(program) => format!("{program} {command}"),
            None => command.to_string(),
        }
    }
}

impl DeviceBridge for ShellBridge {
    fn invoke<'a>(&'a self, command: &'a str) -> BridgeFuture<'a> {
        Box::pin(async move {
            let line = self.command_line(command);
            debug!(cmd = %line, "invoking bridge command");

            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&line);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&line);
                c
            };

            let output = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("launching bridge command `{line}`"))?;

            let result = BridgeOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
            };

            info!(
                cmd = %line,
                exit_code = ?result.exit_code,
                success = result.success(),
                "bridge command exited"
            );
            if !result.stderr.is_empty() {
                debug!(cmd = %line, stderr = %result.stderr.trim_end(), "bridge command stderr");
            }

            Ok(result)
        })
    }
}

/// Payload that runs `command` on `bridge`.
///
/// Succeeds with the trimmed stdout when the command exits with status 0;
/// anything else (launch failure, non-zero exit, signal) fails the task.
pub fn bridge_payload(bridge: Arc<dyn DeviceBridge>, command: impl Into<String>) -> Payload {
    let command = command.into();
    Payload::new(move || async move {
        let output = bridge.invoke(&command).await?;
        if !output.success() {
            let code = output
                .exit_code
                .map_or_else(|| "a signal".to_string(), |c| format!("status {c}"));
            bail!(
                "command `{}` exited with {}: {}",
                command,
                code,
                output.stderr.trim()
            );
        }
        Ok(output.stdout.trim().to_string())
    })
}
