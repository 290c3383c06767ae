use clap::Parser;
use std::path::PathBuf;

use crate::CompressionOpts;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Batch JPEG recompressor.
#[derive(Clone, Parser)]
#[command(name = "jpegpress")]
#[command(
    about = "Compress every JPEG under a directory into a sibling <name>_compressed.<ext> file."
)]
pub struct Cli {
    /// Source folder to look for JPEG images in. Default: current directory.
    #[arg(value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Descend into subdirectories.
    #[arg(long, short = 'r', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub recursive: Option<bool>,

    /// Encode quality in (0, 1]. Default: 0.75.
    #[arg(long, short = 'q')]
    pub quality: Option<f32>,

    /// Resize ratio in (0, 1] applied to width and height. Default: 1.0.
    #[arg(long, short = 's')]
    pub scale: Option<f32>,

    /// Number of compression threads. Default: available threads.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Tasks queued in the worker pool before dispatch waits. Default: 4 per worker.
    #[arg(long)]
    pub backlog: Option<usize>,

    /// Also write the log to this file in the current working directory.
    #[arg(long, value_name = "NAME")]
    pub log_file: Option<String>,

    /// Verbose output (debug logging and a progress counter).
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Overwrite opts with every flag given on the command line. Call after file settings.
    pub fn apply_to_opts(&self, opts: &mut CompressionOpts) {
        if self.recursive.is_some() {
            opts.recursive = self.recursive;
        }
        if self.quality.is_some() {
            opts.quality = self.quality;
        }
        if self.scale.is_some() {
            opts.scale = self.scale;
        }
        if self.workers.is_some() {
            opts.workers = self.workers;
        }
        if self.backlog.is_some() {
            opts.backlog = self.backlog;
        }
    }
}
