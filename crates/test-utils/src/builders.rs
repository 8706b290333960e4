#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use taskpace::config::{ConfigFile, RawConfigFile, SchedulerSection, TaskConfig};
use taskpace::manifest::ManifestSpec;
use taskpace::types::Priority;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                scheduler: SchedulerSection::default(),
                permissions: BTreeMap::new(),
                manifest: None,
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn with_delays(mut self, short: &str, long: &str) -> Self {
        self.config.scheduler.short_delay = short.to_string();
        self.config.scheduler.long_delay = long.to_string();
        self
    }

    pub fn with_retention(mut self, retention: &str) -> Self {
        self.config.scheduler.retention = retention.to_string();
        self
    }

    pub fn with_grant(mut self, subject: &str, capability: &str) -> Self {
        self.config
            .permissions
            .entry(subject.to_string())
            .or_default()
            .push(capability.to_string());
        self
    }

    pub fn with_manifest(mut self, manifest: ManifestSpec) -> Self {
        self.config.manifest = Some(manifest);
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(name: &str, cmd: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                priority: Priority::Normal,
                cmd: Some(cmd.to_string()),
                manifest: None,
                subject: None,
                capability: None,
            },
        }
    }

    /// Task that writes the `[manifest]` section to `path`.
    pub fn manifest(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                priority: Priority::Normal,
                cmd: None,
                manifest: Some(path.into()),
                subject: None,
                capability: None,
            },
        }
    }

    pub fn urgent(mut self) -> Self {
        self.task.priority = Priority::Urgent;
        self
    }

    pub fn requires(mut self, subject: &str, capability: &str) -> Self {
        self.task.subject = Some(subject.to_string());
        self.task.capability = Some(capability.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
