//! jpegpress CLI: compress every JPEG in a directory (optionally recursive).

use anyhow::Result;
use clap::Parser;
use jpegpress::engine::arg_parser::Cli;
use jpegpress::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
