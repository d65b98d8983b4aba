use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use tokio::sync::mpsc;

use fetcher::cli::CliArgs;
use fetcher::config::Config;
use fetcher::fetch::{FetchError, Fetcher};
use fetcher::logger::{setup_logger, LogConsole};
use fetcher::presenter::{OutputMode, Presenter};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mode = if args.json { OutputMode::Json } else { OutputMode::Bars };
    let mut presenter = Presenter::new(mode);
    let console = match mode {
        OutputMode::Bars => {
            let (log_sender, log_receiver) = mpsc::unbounded_channel();
            presenter = presenter.with_log_lines(log_receiver);
            LogConsole::Channel(log_sender)
        }
        OutputMode::Json => LogConsole::Stderr,
    };
    setup_logger(level, args.log_file.as_deref(), console).context("Logger setup failed")?;

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    let fetcher = Fetcher::new(Arc::new(config)).context("Invalid configuration")?;

    let (event_sender, event_receiver) = mpsc::unbounded_channel();
    let mut handles = Vec::new();
    let mut rejected = 0;

    for url in &args.urls {
        match fetcher.request(url) {
            Ok(request) => {
                info!("Fetching {} -> {}", request.url, request.destination.display());
                let label = request.file_name();
                let handle = fetcher.spawn(request, event_sender.clone());
                presenter.register(handle.id(), label);
                handles.push(handle);
            }
            Err(err) => {
                error!("Rejected {}: {}", url, err);
                rejected += 1;
            }
        }
    }
    // Presenter stops once the last worker drops its sender
    drop(event_sender);

    let summary = presenter.run(event_receiver).await?;
    let mut crashed = 0;
    for handle in handles {
        // Fetch failures were already reported through events, a crashed worker was not
        if let Err(FetchError::Worker(err)) = handle.join().await {
            error!("Fetch worker crashed: {}", err);
            crashed += 1;
        }
    }

    info!("{} succeeded, {} failed, {} rejected", summary.succeeded, summary.failed + crashed, rejected);

    if summary.failed > 0 || crashed > 0 || rejected > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
