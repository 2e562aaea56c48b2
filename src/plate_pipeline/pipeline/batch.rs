use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{error, info, warn};

use crate::plate_pipeline::common::error::{AnalysisError, Result};
use crate::plate_pipeline::pipeline::types::PlateReport;
use crate::plate_pipeline::tiles::LOG_FILE_NAME;

/// Depth-first walk yielding every directory below `root` (inclusive) that
/// holds a plate log. Children are visited in name order. Unreadable
/// directories are skipped with a warning.
pub struct PlateDirs {
    stack: Vec<PathBuf>,
}

impl PlateDirs {
    pub fn new(root: &Path) -> Self {
        Self {
            stack: vec![root.to_path_buf()],
        }
    }
}

impl Iterator for PlateDirs {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        while let Some(dir) = self.stack.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            let mut children: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect();
            children.sort();
            // Reversed so the smallest name is popped first.
            self.stack.extend(children.into_iter().rev());

            if dir.join(LOG_FILE_NAME).is_file() {
                return Some(dir);
            }
        }
        None
    }
}

/// Cooperative cancellation, checked between plates only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct PlateFailure {
    pub dir: PathBuf,
    pub error: AnalysisError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<PlateReport>,
    pub failures: Vec<PlateFailure>,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn total_worms(&self) -> u64 {
        self.processed.iter().map(|r| r.worms).sum()
    }
}

/// Runs `process` on each directory until `dirs` is exhausted or `cancel`
/// fires. A failing plate is recorded and the batch moves on.
pub fn run_batch<I, F>(dirs: I, cancel: &CancelToken, mut process: F) -> BatchReport
where
    I: IntoIterator<Item = PathBuf>,
    F: FnMut(&Path) -> Result<PlateReport>,
{
    let mut report = BatchReport::default();
    for dir in dirs {
        if cancel.is_cancelled() {
            warn!(next = %dir.display(), "batch cancelled");
            report.cancelled = true;
            break;
        }
        match process(&dir) {
            Ok(plate) => report.processed.push(plate),
            Err(error) => {
                error!(dir = %dir.display(), %error, "plate failed");
                report.failures.push(PlateFailure { dir, error });
            }
        }
    }
    info!(
        processed = report.processed.len(),
        failed = report.failures.len(),
        cancelled = report.cancelled,
        "batch finished"
    );
    report
}
