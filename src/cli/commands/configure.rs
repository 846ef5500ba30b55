//! Update export settings and reschedule the periodic export.

use crate::cli::commands::{now_ms, Runtime};
use crate::error::{Error, Result};
use serde::Serialize;

/// Longest supported gap between scheduled exports.
pub const MAX_EXPORT_PERIOD_DAYS: i32 = 365;

#[derive(Serialize)]
struct ConfigureOutput {
    export_period_days: i32,
    destination_uri: Option<String>,
    scheduled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    interval_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_first_export: Option<bool>,
}

/// Execute the configure command.
///
/// The job is rescheduled even when no option is given, which repairs a
/// lost registration.
///
/// # Errors
///
/// Returns an error if the period is out of range or settings cannot be
/// saved.
pub fn execute(
    runtime: &Runtime,
    period: Option<i32>,
    destination: Option<&str>,
    json: bool,
) -> Result<()> {
    if let Some(days) = period {
        if !(0..=MAX_EXPORT_PERIOD_DAYS).contains(&days) {
            return Err(Error::InvalidArgument(format!(
                "export period must be between 0 and {MAX_EXPORT_PERIOD_DAYS} days, got {days}"
            )));
        }
    }
    if destination.is_some_and(|d| d.trim().is_empty()) {
        return Err(Error::InvalidArgument("destination must not be empty".to_string()));
    }

    if let Some(days) = period {
        runtime.settings.set_export_period(days)?;
    }
    if let Some(uri) = destination {
        runtime.settings.set_destination_uri(uri)?;
    }

    let jobs = runtime.jobs(runtime.job_scheduler());
    let job = jobs.schedule_periodic_export_job(now_ms())?;
    let settings = runtime.settings.load()?;

    if json {
        let output = ConfigureOutput {
            export_period_days: settings.export_period_days,
            destination_uri: settings.destination_uri,
            scheduled: job.is_some(),
            interval_ms: job.as_ref().map(|j| j.interval_ms),
            is_first_export: job.as_ref().map(|j| j.extras.is_first_export),
        };
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("Export settings saved");
    match &settings.destination_uri {
        Some(uri) => println!("  Destination: {uri}"),
        None => println!("  Destination: (none)"),
    }
    match job {
        Some(job) => {
            println!("  Period:      every {} day(s)", settings.export_period_days);
            if job.extras.is_first_export {
                println!("  First export to this destination runs within the hour.");
            }
        }
        None => println!("  Scheduled exports are disabled."),
    }

    Ok(())
}
