//! Producer stage: walk the source tree and push one work item per JPEG, then the terminator.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};
use walkdir::WalkDir;

use crate::engine::tools::is_compress_candidate;
use crate::error::PipelineError;
use crate::types::{Message, WorkItem};

use super::context::{PipelineContext, Stage};

/// One result from a directory walk: either a file to consider or an error with optional path.
pub enum WalkOutcome {
    File(PathBuf),
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`WalkOutcome`]. Directories and other non-files yield None.
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> Option<WalkOutcome> {
    match r {
        Ok(entry) => {
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && entry.path().is_file());
            is_file.then(|| WalkOutcome::File(entry.into_path()))
        }
        Err(err) => Some(WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        }),
    }
}

/// Depth-first walk of `root`. Only the root's own entries unless `recursive`. Entries within a
/// directory come in file-name order so repeated runs enqueue in the same order.
fn walkdir_iter(root: &Path, recursive: bool) -> impl Iterator<Item = WalkOutcome> {
    WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(to_outcome_walkdir)
}

/// Fail unless `root` exists and is a directory. Nothing may be pushed before this passes.
pub fn check_root(root: &Path) -> Result<PathBuf, PipelineError> {
    let meta = std::fs::metadata(root).map_err(|e| {
        PipelineError::Configuration(format!(
            "source folder {} is not accessible: {}",
            root.display(),
            e
        ))
    })?;
    if !meta.is_dir() {
        return Err(PipelineError::Configuration(format!(
            "source folder {} is not a directory",
            root.display()
        )));
    }
    Ok(root.to_path_buf())
}

/// The producer. Pushes work items in walk order and always finishes with exactly one terminator
/// (unless the run was cancelled, in which case the dispatcher stops on the cancel token).
pub struct PathEnumerator {
    root: PathBuf,
    recursive: bool,
    suffix: String,
    ctx: PipelineContext,
}

impl PathEnumerator {
    pub fn new(root: &Path, recursive: bool, suffix: &str, ctx: PipelineContext) -> Self {
        Self {
            root: root.to_path_buf(),
            recursive,
            suffix: suffix.to_string(),
            ctx,
        }
    }

    /// Consume `iter`, pushing every compress candidate. Returns the number of items pushed.
    /// A walk error is fatal: the loop stops and the error is returned.
    pub fn run_walk_loop<I>(&self, iter: I) -> Result<u64, PipelineError>
    where
        I: Iterator<Item = WalkOutcome>,
    {
        let mut count = 0_u64;
        for outcome in iter {
            self.ctx.cancel.check()?;
            match outcome {
                WalkOutcome::File(path) => {
                    if !is_compress_candidate(&path, &self.suffix) {
                        continue;
                    }
                    debug!("Queued {}", path.display());
                    self.ctx.queue.push(Message::Work(WorkItem::new(path)))?;
                    self.ctx.stats.record_produced();
                    count += 1;
                }
                WalkOutcome::Err { msg, path } => {
                    return Err(PipelineError::Enumeration {
                        path: path.unwrap_or_else(|| self.root.clone()),
                        reason: msg,
                    });
                }
            }
        }
        Ok(count)
    }

    /// Walk `iter` and post the terminator, even when the walk failed, so the dispatcher still
    /// drains what was already queued. No terminator after a cancel: the dispatcher stops on
    /// the token instead.
    pub fn enumerate<I>(&self, iter: I) -> Result<u64, PipelineError>
    where
        I: Iterator<Item = WalkOutcome>,
    {
        let walked = self.run_walk_loop(iter);
        let posted = match &walked {
            Err(PipelineError::Cancelled) => Ok(()),
            _ => self.post_terminator(),
        };
        let count = walked?;
        posted?;
        Ok(count)
    }

    fn post_terminator(&self) -> Result<(), PipelineError> {
        self.ctx.queue.push(Message::Terminator)?;
        debug!("Posted terminator, no more work will be queued");
        Ok(())
    }
}

impl Stage for PathEnumerator {
    type Output = u64;

    fn name(&self) -> &'static str {
        "enumerator"
    }

    fn run(self) -> Result<u64, PipelineError> {
        check_root(&self.root)?;
        let start = Instant::now();
        info!(
            "Loading files from {}{}",
            self.root.display(),
            if self.recursive { " (recursive)" } else { "" }
        );

        let count = self.enumerate(walkdir_iter(&self.root, self.recursive))?;
        info!("Loaded {} files in {} ms", count, start.elapsed().as_millis());
        Ok(count)
    }
}
