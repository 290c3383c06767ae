use colored::Colorize;
use env_logger::{Builder, Target};
use log::Level;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::utils::config::PackagePaths;

/// Writes every log line to stderr and to a log file.
struct TeeWriter {
    file: File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Set up env_logger for the CLI. `log_file` is created in the current working directory and
/// receives the same lines as stderr (colors stripped).
pub fn setup_logging(verbose: bool, log_file: Option<&str>) {
    use log::LevelFilter;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), level) // Our crate: use requested level
        .format(|buf, record| {
            let name = PackagePaths::get().pkg_name();
            let thread = std::thread::current();
            let thread_name = thread.name().unwrap_or("unnamed");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!(
                        "[{} {} {} {}] {}",
                        name.cyan(),
                        level_str,
                        path,
                        thread_name,
                        record.args()
                    )
                }
                Level::Debug | Level::Trace => {
                    format!("[{} {}] {}", name.cyan(), thread_name, record.args())
                }
                _ => format!("[{}] {}", name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        });

    let log_path = log_file.and_then(|name| {
        std::env::current_dir()
            .ok()
            .map(|cwd| cwd.join(name))
            .or_else(|| Some(PathBuf::from(name)))
    });
    let mut file_error = None;
    if let Some(path) = &log_path {
        match File::create(path) {
            Ok(file) => {
                colored::control::set_override(false);
                builder.target(Target::Pipe(Box::new(TeeWriter { file })));
            }
            Err(e) => file_error = Some(format!("{}: {}", path.display(), e)),
        }
    }
    builder.init();

    if let Some(msg) = file_error {
        log::warn!("Cannot create log file {}; logging to stderr only", msg);
    }
}
