// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod permissions;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, TaskAction, TaskConfig, load_and_validate};
use crate::engine::{
    DelayPolicy, Scheduler, TaskEvent, TaskId, TaskReport, TaskSpec, TaskState,
};
use crate::exec::{DeviceBridge, Payload, ShellBridge, bridge_payload};
use crate::manifest::manifest_payload;
use crate::permissions::{PermissionOracle, PermissionTable, gated};

/// Final tally of a CLI run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Tasks still pending or running when the run stopped (Ctrl-C).
    pub unfinished: usize,
    /// Reports for every task whose record was still retained at the end.
    pub reports: Vec<TaskReport>,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - scheduler construction
/// - device bridge + permission oracle
/// - event stream printing and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let cfg = load_and_validate(&args.config)?;

    if args.print_manifest {
        let spec = cfg
            .manifest
            .as_ref()
            .context("config has no [manifest] section")?;
        print!("{}", manifest::render(spec)?);
        return Ok(RunSummary::default());
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(RunSummary::default());
    }

    let bridge: Arc<dyn DeviceBridge> = Arc::new(ShellBridge::new());
    let summary = run_config(cfg, bridge, args.no_delay).await?;
    print_summary(&summary);
    Ok(summary)
}

/// Admit every configured task, in file order, and wait until the scheduler
/// drains them (or Ctrl-C arrives).
pub async fn run_config(
    cfg: ConfigFile,
    bridge: Arc<dyn DeviceBridge>,
    no_delay: bool,
) -> Result<RunSummary> {
    let mut scheduler_cfg = cfg.scheduler;
    if no_delay {
        scheduler_cfg.delay = DelayPolicy::immediate();
    }

    let scheduler = Scheduler::new(scheduler_cfg);
    let mut events = scheduler.subscribe();
    let oracle: Arc<dyn PermissionOracle> = Arc::new(PermissionTable::from_config(&cfg.permissions));

    let mut ids = Vec::with_capacity(cfg.tasks.len());
    for task in &cfg.tasks {
        let mut payload = task_payload(&cfg, task, &bridge)?;
        if let Some((subject, capability)) = task.permission() {
            payload = gated(payload, Arc::clone(&oracle), subject, capability);
        }

        let id = scheduler.admit(TaskSpec::new(task.name.clone(), task.priority).with_payload(payload))?;
        ids.push(id);
    }
    info!(tasks = ids.len(), "all configured tasks admitted");

    // Latest state seen for each task, fed by the event stream.
    let mut latest: BTreeMap<TaskId, TaskState> = BTreeMap::new();

    let idle = scheduler.wait_idle();
    tokio::pin!(idle);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                print_event(&event);
                latest.insert(event.id, event.state);
            }
            _ = &mut idle => {
                debug!("scheduler idle");
                break;
            }
            res = &mut ctrl_c => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                let cancelled = ids.iter().filter(|id| scheduler.cancel(**id)).count();
                warn!(cancelled, "interrupted; cancelled pending tasks");
                break;
            }
        }
    }

    while let Some(event) = events.try_recv() {
        print_event(&event);
        latest.insert(event.id, event.state);
    }

    let mut summary = RunSummary::default();
    for state in latest.values() {
        match state {
            TaskState::Completed => summary.completed += 1,
            TaskState::Failed => summary.failed += 1,
            TaskState::Cancelled => summary.cancelled += 1,
            TaskState::Pending | TaskState::Running => summary.unfinished += 1,
        }
    }
    summary.reports = ids
        .iter()
        .filter_map(|id| scheduler.report(*id).ok())
        .collect();

    Ok(summary)
}

/// Build the payload a configured task runs.
fn task_payload(cfg: &ConfigFile, task: &TaskConfig, bridge: &Arc<dyn DeviceBridge>) -> Result<Payload> {
    match task.action() {
        Some(TaskAction::Command(cmd)) => Ok(bridge_payload(Arc::clone(bridge), cmd)),
        Some(TaskAction::Manifest(path)) => {
            let spec = cfg
                .manifest
                .clone()
                .with_context(|| format!("task '{}' needs a [manifest] section", task.name))?;
            Ok(manifest_payload(spec, path))
        }
        None => anyhow::bail!("task '{}' must set exactly one of `cmd` or `manifest`", task.name),
    }
}

fn print_event(event: &TaskEvent) {
    println!(
        "{} {:>4} {:<9} {}",
        event.timestamp.format("%H:%M:%S%.3f"),
        event.id.to_string(),
        event.state.to_string(),
        event.name
    );
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "summary: {} completed, {} failed, {} cancelled, {} unfinished",
        summary.completed, summary.failed, summary.cancelled, summary.unfinished
    );
    for report in &summary.reports {
        if let Some(ref error) = report.error {
            println!("  {} {} failed: {}", report.id, report.name, error);
        }
    }
}

/// Simple dry-run output: print scheduler settings and tasks in run order.
fn print_dry_run(cfg: &ConfigFile) {
    println!("taskpace dry-run");
    println!("  scheduler.short_delay = {:?}", cfg.scheduler.delay.short_delay);
    println!("  scheduler.long_delay = {:?}", cfg.scheduler.delay.long_delay);
    match cfg.scheduler.retention {
        Some(window) => println!("  scheduler.retention = {window:?}"),
        None => println!("  scheduler.retention = none"),
    }
    println!();

    if let Some(ref manifest) = cfg.manifest {
        println!("manifest: {} ({})", manifest.package, manifest.app_name);
        println!();
    }

    println!("tasks ({}):", cfg.tasks.len());
    for task in &cfg.tasks {
        println!("  - {} [{}]", task.name, task.priority);
        match task.action() {
            Some(TaskAction::Command(cmd)) => println!("      cmd: {cmd}"),
            Some(TaskAction::Manifest(path)) => println!("      manifest: {}", path.display()),
            None => println!("      (no action)"),
        }
        if let Some((subject, capability)) = task.permission() {
            println!("      requires: {subject} -> {capability}");
        }
    }

    debug!("dry-run complete (no execution)");
}
