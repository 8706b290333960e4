// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile, SchedulerSection, TaskAction};
use crate::engine::{DelayPolicy, SchedulerConfig};
use crate::errors::{Result, SchedulerError};
use crate::manifest::ManifestSpec;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SchedulerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_tasks(&raw)?;
        if let Some(manifest) = &raw.manifest {
            validate_manifest(manifest)?;
        }
        let scheduler = scheduler_config(&raw.scheduler)?;
        Ok(ConfigFile::new_unchecked(
            scheduler,
            raw.permissions,
            raw.manifest,
            raw.task,
        ))
    }
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SchedulerError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (idx, task) in cfg.task.iter().enumerate() {
        if task.name.trim().is_empty() {
            return Err(SchedulerError::ConfigError(format!(
                "task #{} has an empty `name`",
                idx + 1
            )));
        }
        match task.action() {
            Some(TaskAction::Command(cmd)) if cmd.trim().is_empty() => {
                return Err(SchedulerError::ConfigError(format!(
                    "task '{}' has an empty `cmd`",
                    task.name
                )));
            }
            Some(TaskAction::Manifest(path)) if path.as_os_str().is_empty() => {
                return Err(SchedulerError::ConfigError(format!(
                    "task '{}' has an empty `manifest` path",
                    task.name
                )));
            }
            Some(TaskAction::Manifest(_)) if cfg.manifest.is_none() => {
                return Err(SchedulerError::ConfigError(format!(
                    "task '{}' writes a manifest but there is no [manifest] section",
                    task.name
                )));
            }
            Some(_) => {}
            None => {
                return Err(SchedulerError::ConfigError(format!(
                    "task '{}' must set exactly one of `cmd` or `manifest`",
                    task.name
                )));
            }
        }
        if task.subject.is_some() != task.capability.is_some() {
            return Err(SchedulerError::ConfigError(format!(
                "task '{}' must set both `subject` and `capability`, or neither",
                task.name
            )));
        }
    }
    Ok(())
}

fn validate_manifest(manifest: &ManifestSpec) -> Result<()> {
    let required = [
        ("package", &manifest.package),
        ("app_name", &manifest.app_name),
        ("main_activity", &manifest.main_activity),
        ("icon", &manifest.icon),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(SchedulerError::ConfigError(format!(
                "[manifest].{field} must not be empty"
            )));
        }
    }

    if !manifest.package.contains('.') {
        return Err(SchedulerError::ConfigError(format!(
            "[manifest].package '{}' must be a dotted name like com.example.app",
            manifest.package
        )));
    }

    if manifest.permissions.iter().any(|p| p.trim().is_empty()) {
        return Err(SchedulerError::ConfigError(
            "[manifest].permissions must not contain empty entries".to_string(),
        ));
    }
    Ok(())
}

fn scheduler_config(section: &SchedulerSection) -> Result<SchedulerConfig> {
    let short_delay = field_duration("short_delay", &section.short_delay)?;
    let long_delay = field_duration("long_delay", &section.long_delay)?;

    let retention = match section.retention.trim().to_lowercase().as_str() {
        "none" | "forever" => None,
        _ => Some(field_duration("retention", &section.retention)?),
    };

    Ok(SchedulerConfig {
        delay: DelayPolicy::new(short_delay, long_delay),
        retention,
    })
}

fn field_duration(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| SchedulerError::ConfigError(format!("[scheduler].{field}: {e}")))
}
