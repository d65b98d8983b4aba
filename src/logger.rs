//! Logging module

use std::path::Path;

use anyhow::Result;
use log::LevelFilter;
use tokio::sync::mpsc;

/// Where console log lines go
pub enum LogConsole {
    Stderr,
    /// Handed to the presenter so lines land above the progress bars;
    /// falls back to stderr once the receiver is gone
    Channel(mpsc::UnboundedSender<String>),
}

pub fn setup_logger(level: LevelFilter, log_file: Option<&Path>, console: LogConsole) -> Result<()> {
    let console_output: fern::Output = match console {
        LogConsole::Stderr => std::io::stderr().into(),
        LogConsole::Channel(sender) => fern::Output::call(move |record| {
            let line = record.args().to_string();
            if let Err(mpsc::error::SendError(line)) = sender.send(line) {
                eprintln!("{}", line);
            }
        }),
    };

    let mut base_config = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for("fetcher", level)
        .chain(console_output);

    if let Some(file) = log_file {
        base_config = base_config.chain(fern::log_file(file)?);
    }

    base_config.apply()?;

    Ok(())
}
