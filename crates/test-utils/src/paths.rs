//! Temporary file helpers for tests that need real paths on disk.

use std::path::PathBuf;

/// Creates a temporary directory that is removed when dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

/// Writes `contents` to `name` inside `dir` and returns the full path.
pub fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write fixture file");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_fixture() {
        let dir = temp_test_dir();
        let path = write_fixture(&dir, "grid.csv", "hrrr_id\n1\n");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hrrr_id\n1\n");
    }
}
