use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling temp path an output is written to before being renamed into place.
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Write `bytes` to `dest` via a temp file + rename so a reader never sees a half-written output.
/// On any failure the temp file is removed and nothing is left at `dest` by this call.
pub fn write_atomically(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(dest);
    let result = write_and_sync(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, dest));
    if result.is_err() {
        remove_partial_output(&temp_path);
    }
    result
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Best-effort cleanup of a failed write. The rename is the only step that touches the
/// destination, so the temp file is all a failure can leave behind.
pub fn remove_partial_output(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path)
        && e.kind() != io::ErrorKind::NotFound
    {
        log::warn!("Cannot remove partial output {}: {}", temp_path.display(), e);
    }
}
