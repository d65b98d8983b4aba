use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Download files over HTTP(S), one background fetch per url
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Urls to download
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// JSON config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory the files are written to
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// File name prefix
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Read buffer size in bytes
    #[arg(short, long)]
    pub buffer_size: Option<NonZeroUsize>,

    /// Print events as JSON lines instead of progress bars
    #[arg(long)]
    pub json: bool,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Command line flags win over the config file
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.dir {
            config.download_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.file_prefix = prefix.clone();
        }
        if let Some(buffer_size) = self.buffer_size {
            config.buffer_size = buffer_size;
        }
    }
}
