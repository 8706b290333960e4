use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use taskpace::exec::{BridgeFuture, BridgeOutput, DeviceBridge};

/// A fake device bridge that:
/// - records every command it was asked to run
/// - answers with a canned `BridgeOutput` (exit 0 and the command echoed on
///   stdout unless overridden with [`FakeBridge::respond`]).
#[derive(Clone, Default)]
pub struct FakeBridge {
    invoked: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<HashMap<String, BridgeOutput>>>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, command: &str, exit_code: i32, stdout: &str, stderr: &str) {
        self.responses.lock().unwrap().insert(
            command.to_string(),
            BridgeOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code: Some(exit_code),
            },
        );
    }

    pub fn invoked(&self) -> Vec<String> {
        self.invoked.lock().unwrap().clone()
    }
}

impl DeviceBridge for FakeBridge {
    fn invoke<'a>(&'a self, command: &'a str) -> BridgeFuture<'a> {
        Box::pin(async move {
            self.invoked.lock().unwrap().push(command.to_string());
            let canned = self.responses.lock().unwrap().get(command).cloned();
            Ok(canned.unwrap_or_else(|| BridgeOutput {
                stdout: format!("{command}\n"),
                stderr: String::new(),
                exit_code: Some(0),
            }))
        })
    }
}
