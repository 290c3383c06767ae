//! Load `.jpegpress.toml` from the root directory (CLI only). Lib callers pass [`CompressionOpts`] directly.

use serde::Deserialize;
use std::path::Path;

use crate::CompressionOpts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Deserialize)]
pub struct SettingsToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    quality: Option<f32>,
    scale: Option<f32>,
    workers: Option<usize>,
    recursive: Option<bool>,
    backlog: Option<usize>,
    verbose: Option<bool>,
    log_file: Option<String>,
}

impl SettingsToml {
    pub fn verbose(&self) -> Option<bool> {
        self.settings.verbose
    }

    pub fn log_file(&self) -> Option<&str> {
        self.settings.log_file.as_deref()
    }
}

/// Load the settings file from `dir` if present. Returns None if the file is missing or
/// unreadable; a parse error is logged and also yields None.
pub fn load_settings_toml(dir: &Path) -> Option<SettingsToml> {
    let path = dir.join(PackagePaths::get().settings_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_settings_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_settings_toml(s: &str) -> Result<SettingsToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field {
            $opts.$field = Some(v);
        }
    };
}

/// Apply file settings to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &SettingsToml, opts: &mut CompressionOpts) {
    let section = &file.settings;
    apply_file_opt!(section, opts, quality);
    apply_file_opt!(section, opts, scale);
    apply_file_opt!(section, opts, workers);
    apply_file_opt!(section, opts, recursive);
    apply_file_opt!(section, opts, backlog);
}
