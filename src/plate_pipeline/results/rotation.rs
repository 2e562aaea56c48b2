use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::plate_pipeline::common::error::Result;

/// `historical.<n>.<name>` next to `path`.
pub fn historical_path(path: &Path, n: u32) -> PathBuf {
    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("historical.{n}.{name}"))
}

/// Moves an existing file at `path` to the first free historical name.
/// Returns the new location, or `None` when there was nothing to move.
pub fn rotate(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut n = 1;
    while historical_path(path, n).exists() {
        n += 1;
    }
    let target = historical_path(path, n);
    fs::rename(path, &target)?;
    debug!(from = %path.display(), to = %target.display(), "rotated results file");
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_takes_smallest_free_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("worm_count.txt");

        assert_eq!(rotate(&path).unwrap(), None);

        fs::write(&path, "first").unwrap();
        let first = rotate(&path).unwrap().unwrap();
        assert_eq!(first, dir.path().join("historical.1.worm_count.txt"));
        assert!(!path.exists());

        fs::write(historical_path(&path, 2), "pre-existing").unwrap();
        fs::write(&path, "second").unwrap();
        let second = rotate(&path).unwrap().unwrap();
        assert_eq!(second, dir.path().join("historical.3.worm_count.txt"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "first");
        assert_eq!(fs::read_to_string(&second).unwrap(), "second");
    }
}
