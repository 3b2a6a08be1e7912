//! CLI smoke entry point.
//!
//! # Responsibility
//! - Resolve settings, start logging and open the configured store.
//! - Print the tracker status so core wiring can be checked quickly.

use std::process::ExitCode;
use tally_core::{
    core_version, default_log_level, init_logging, open_repository, EntryFilter, Settings,
    TimePeriod, TrackerService,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let level = settings
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    // Logging is best-effort for a status probe.
    if let Err(err) = init_logging(&level, &settings.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let repo = open_repository(&settings.data_filename)?;
    let tracker = TrackerService::new(
        repo,
        Box::new(settings.shell_editor()),
        settings.auto_tag_engine()?,
    );

    println!("tally_core version={}", core_version());
    println!("store={}", settings.data_filename.display());
    match tracker.get_active_entry()? {
        Some(entry) => println!(
            "active={} project={} since={}",
            entry.id,
            entry.project,
            entry.start_time.to_rfc3339()
        ),
        None => println!("active=none"),
    }

    let today = tracker.list_entries(Some(&EntryFilter::for_period_now(TimePeriod::Default)))?;
    let total_minutes: i64 = today.iter().map(|entry| entry.duration().num_minutes()).sum();
    println!("today_entries={} today_minutes={total_minutes}", today.len());
    log::info!(
        "event=cli_status module=cli status=ok entries={}",
        today.len()
    );
    Ok(())
}
