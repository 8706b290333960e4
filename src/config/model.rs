// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::SchedulerConfig;
use crate::manifest::ManifestSpec;
use crate::types::Priority;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// short_delay = "1s"
/// long_delay = "5s"
/// retention = "5m"
///
/// [permissions]
/// user123 = ["read_contacts", "access_location"]
///
/// [manifest]
/// package = "com.example.myapp"
/// app_name = "My Awesome App"
/// main_activity = ".MainActivity"
///
/// [[task]]
/// name = "Generate manifest"
/// manifest = "build/AndroidManifest.xml"
///
/// [[task]]
/// name = "Upload Image"
/// priority = "urgent"
/// cmd = "adb push image.png /sdcard/"
/// subject = "user123"
/// capability = "access_location"
/// ```
///
/// Tasks are an array of tables so that file order is admission order.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    /// Subject -> granted capabilities.
    #[serde(default)]
    pub permissions: BTreeMap<String, Vec<String>>,

    /// App description used by `manifest` tasks.
    #[serde(default)]
    pub manifest: Option<ManifestSpec>,

    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[scheduler]` section. Durations are kept as strings until validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Delay before each urgent task.
    #[serde(default = "default_short_delay")]
    pub short_delay: String,

    /// Delay before each normal task.
    #[serde(default = "default_long_delay")]
    pub long_delay: String,

    /// Retention window for finished task records; `"none"` keeps them
    /// forever.
    #[serde(default = "default_retention")]
    pub retention: String,
}

fn default_short_delay() -> String {
    "1s".to_string()
}

fn default_long_delay() -> String {
    "5s".to_string()
}

fn default_retention() -> String {
    "5m".to_string()
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            short_delay: default_short_delay(),
            long_delay: default_long_delay(),
            retention: default_retention(),
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    /// Label used in logs and the summary; need not be unique.
    pub name: String,

    /// `"urgent"` or `"normal"` (default).
    #[serde(default)]
    pub priority: Priority,

    /// Command passed to the device bridge.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Write the `[manifest]` section to this path instead of running a
    /// command.
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Subject checked against `[permissions]` before the command runs.
    #[serde(default)]
    pub subject: Option<String>,

    /// Capability `subject` must hold.
    #[serde(default)]
    pub capability: Option<String>,
}

/// What a configured task does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction<'a> {
    Command(&'a str),
    Manifest(&'a Path),
}

impl TaskConfig {
    /// `None` unless exactly one of `cmd` and `manifest` is set.
    pub fn action(&self) -> Option<TaskAction<'_>> {
        match (&self.cmd, &self.manifest) {
            (Some(cmd), None) => Some(TaskAction::Command(cmd)),
            (None, Some(path)) => Some(TaskAction::Manifest(path)),
            _ => None,
        }
    }

    /// `(subject, capability)` if this task is permission-gated.
    pub fn permission(&self) -> Option<(&str, &str)> {
        match (&self.subject, &self.capability) {
            (Some(subject), Some(capability)) => Some((subject, capability)),
            _ => None,
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerConfig,
    pub permissions: BTreeMap<String, Vec<String>>,
    pub manifest: Option<ManifestSpec>,
    pub tasks: Vec<TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerConfig,
        permissions: BTreeMap<String, Vec<String>>,
        manifest: Option<ManifestSpec>,
        tasks: Vec<TaskConfig>,
    ) -> Self {
        Self {
            scheduler,
            permissions,
            manifest,
            tasks,
        }
    }
}
