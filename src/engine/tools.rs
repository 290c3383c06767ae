//! Path and sizing utilities

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::utils::config::JPEG_EXTENSIONS;

/// True if the extension is `jpg` or `jpeg`, in any case.
pub fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| JPEG_EXTENSIONS.iter().any(|j| ext.eq_ignore_ascii_case(j)))
}

/// The source a previous run would have compressed into `path`: same directory and extension,
/// stem without `suffix`. None unless the stem is `<non-empty base><suffix>`.
pub fn source_for_output(path: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_str()?;
    let base = stem.strip_suffix(suffix).filter(|b| !b.is_empty())?;
    let mut name = OsString::from(base);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    Some(path.with_file_name(name))
}

/// True if `path` is an output of a previous run: its stem ends with `suffix` and the source it
/// was made from still sits next to it. A lone `trip_compressed.jpg` is a normal input.
pub fn is_compressed_output(path: &Path, suffix: &str) -> bool {
    source_for_output(path, suffix).is_some_and(|source| source.is_file())
}

/// Returns true if the enumerator should queue this file.
pub fn is_compress_candidate(path: &Path, suffix: &str) -> bool {
    is_jpeg_path(path) && !is_compressed_output(path, suffix)
}

/// `<dir>/<stem><suffix><.ext>` next to the source, keeping the original extension as written.
/// Built on `OsString` so non-UTF-8 names map to distinct outputs.
pub fn destination_path(source: &Path, suffix: &str) -> Option<PathBuf> {
    let mut name = source.file_stem()?.to_os_string();
    name.push(suffix);
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }
    Some(source.with_file_name(name))
}

/// round(width * scale) x round(height * scale), never below 1x1.
pub fn target_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    let scale = f64::from(scale);
    let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
    (scaled(width), scaled(height))
}

/// Bytes as fractional MiB for display.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
