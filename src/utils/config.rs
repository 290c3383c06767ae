//! Application configuration constants.
//! Defaults and tuning in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    settings_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                settings_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory settings file read by the CLI (e.g. `.jpegpress.toml`).
    pub fn settings_filename(&self) -> &str {
        &self.settings_filename
    }
}

// ---- Compression defaults ----

/// Values used when an option is left unset.
pub struct Defaults;

impl Defaults {
    pub const QUALITY: f32 = 0.75;
    pub const SCALE: f32 = 1.0;
    pub const SUFFIX: &'static str = "_compressed";
    /// Pool backlog per worker before `submit` blocks the dispatcher.
    pub const BACKLOG_PER_WORKER: usize = 4;

    /// Default worker count: rayon's view of available threads, never below 1.
    pub fn workers() -> usize {
        rayon::current_num_threads().max(1)
    }
}

// ---- File matching ----

/// Extensions picked up by the enumerator (compared case-insensitively).
pub const JPEG_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];

// ---- Cancellation ----

/// How often blocking waits (queue pop, pool submit, pool drain) re-check the cancel token.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---- Reporting ----

/// Skipped files listed at warn level at the end of a run; the rest go to debug.
pub const SKIPPED_LIST_THRESHOLD: usize = 10;
