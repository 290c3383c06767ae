//! Progress counter for verbose runs

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

use crate::pipeline::ProgressFn;

pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (files are counted as they finish, the total is not known
/// up front because enumeration runs alongside compression).
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " files"
    )))
}

/// Advance the bar by `n`. Called from worker threads once per finished item.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.lock() {
        let _ = pb.update(n);
    }
}

/// Force a refresh of the bar (e.g. so the counter shows "0 files" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Progress hook for the pipeline that ticks `bar`.
pub fn progress_callback(bar: &ProgressBar) -> ProgressFn {
    let bar = Arc::clone(bar);
    Arc::new(move |n: usize| update_progress_bar(&bar, n))
}
