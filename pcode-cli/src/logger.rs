//! Logger setup for the command line.
use env_logger::Builder;
use log::trace;
use log::LevelFilter;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Configures the log with the specified verbosity.
///
/// Each `-v` raises the level by one, from errors only up to tracing
/// every executed instruction.
pub fn configure(verbosity: u8, log_file: Option<PathBuf>) -> Result<(), String> {
    let log_level = level_for(verbosity)?;

    let mut builder = Builder::new();

    if let Some(log_location) = log_file {
        let file = File::create(&log_location).map_err(|e| {
            format!(
                "unable to create log file {}: {}",
                log_location.display(),
                e
            )
        })?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{} {}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                timestamp(),
                record.args()
            )
        })
        .filter_level(log_level)
        .init();

    trace!("logger verbosity {log_level}");
    Ok(())
}

/// Current UTC time as RFC 3339, e.g. `2024-05-01T12:30:00.123Z`.
fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("unknown"))
}

fn level_for(verbosity: u8) -> Result<LevelFilter, String> {
    match verbosity {
        0 => Ok(LevelFilter::Error),
        1 => Ok(LevelFilter::Warn),
        2 => Ok(LevelFilter::Info),
        3 => Ok(LevelFilter::Debug),
        4 => Ok(LevelFilter::Trace),
        _ => Err(format!("verbosity {verbosity} is above the maximum of 4")),
    }
}
