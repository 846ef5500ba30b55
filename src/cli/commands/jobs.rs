//! Periodic job commands.
//!
//! `jobs run` plays the host scheduler: it fires every registered export
//! job whose window has opened and records the run.

use crate::cli::commands::{format_time, now_ms, Runtime};
use crate::cli::JobsCommands;
use crate::error::{Error, Result};
use crate::transfer::{JobScheduler, JOB_NAMESPACE};
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct JobRun {
    id: i64,
    job_name: String,
    ran: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    succeeded: Option<bool>,
}

/// Execute jobs commands.
///
/// # Errors
///
/// Returns an error if job registrations cannot be read or updated.
pub fn execute(command: &JobsCommands, runtime: &Runtime, json: bool) -> Result<()> {
    match command {
        JobsCommands::Run { force } => run(runtime, *force, json),
        JobsCommands::List => list(runtime, json),
    }
}

fn run(runtime: &Runtime, force: bool, json: bool) -> Result<()> {
    let scheduler = runtime.job_scheduler();
    let now = now_ms();
    let (due, waiting): (Vec<_>, Vec<_>) = scheduler
        .pending(JOB_NAMESPACE)?
        .into_iter()
        .filter(|job| job.extras.user_id == runtime.user)
        .partition(|job| force || job.is_due(now));

    let mut runs: Vec<JobRun> = waiting
        .into_iter()
        .map(|job| JobRun {
            id: job.id,
            job_name: job.extras.job_name,
            ran: false,
            succeeded: None,
        })
        .collect();
    let mut failed = 0;

    if !due.is_empty() {
        let exporter = runtime.export_manager(runtime.open_storage()?);
        let jobs = runtime.jobs(scheduler.clone());

        for job in due {
            let succeeded = jobs.execute_periodic_export_job(&exporter, &job.extras, now);
            scheduler.record_run(JOB_NAMESPACE, job.id, now)?;
            if !succeeded {
                failed += 1;
            }
            runs.push(JobRun {
                id: job.id,
                job_name: job.extras.job_name,
                ran: true,
                succeeded: Some(succeeded),
            });
        }
    }

    if json {
        println!("{}", serde_json::to_string(&runs)?);
    } else if runs.iter().all(|r| !r.ran) {
        println!("No jobs due.");
    } else {
        for r in runs.iter().filter(|r| r.ran) {
            let status = if r.succeeded == Some(true) {
                "ok".green()
            } else {
                "failed".red()
            };
            println!("  {} {} [{status}]", r.id, r.job_name);
        }
    }

    if failed > 0 {
        return Err(Error::Other(format!("{failed} job(s) failed")));
    }
    Ok(())
}

fn list(runtime: &Runtime, json: bool) -> Result<()> {
    let jobs = runtime.job_scheduler().pending(JOB_NAMESPACE)?;

    if json {
        println!("{}", serde_json::to_string(&jobs)?);
        return Ok(());
    }

    if jobs.is_empty() {
        println!("No jobs registered.");
        return Ok(());
    }

    let now = now_ms();
    for job in &jobs {
        let due = if job.is_due(now) {
            "due".yellow()
        } else {
            "waiting".normal()
        };
        println!("{} {} [{due}]", job.id, job.extras.job_name.bold());
        println!(
            "  Every {}h, flex {}h, charging={}, idle={}",
            job.interval_ms / 3_600_000,
            job.flex_ms / 3_600_000,
            job.requires_charging,
            job.requires_device_idle
        );
        println!("  Next window: {}", format_time(job.next_window_start_ms()));
        if let Some(last) = job.last_run_ms {
            println!("  Last run:    {}", format_time(last));
        }
    }

    Ok(())
}
