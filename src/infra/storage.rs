// ============================================================
// Layer 6 — Atomic File Writes
// ============================================================
// Every artifact the pipeline persists goes through write_atomic:
//
//   1. write the bytes to "<name>.partial" next to the target
//   2. sync_all() so the data is on disk
//   3. rename over the target (atomic on the same filesystem)
//
// If any step fails the partial file is removed and the target
// is untouched, so a half-written checkpoint can never replace
// a good one.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::error::PipelineError;

/// Atomically replace `path` with `bytes`.
///
/// # Errors
/// `WriteFailure` naming the file that could not be written.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let partial = partial_path(path);

    let result = (|| -> std::io::Result<()> {
        let mut f = fs::File::create(&partial)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        fs::rename(&partial, path)
    })();

    result.map_err(|source| {
        // Best effort: the partial may not exist if create() failed
        let _ = fs::remove_file(&partial);
        PipelineError::WriteFailure { path: path.to_path_buf(), source }
    })
}

/// Serialise `value` as pretty JSON and write it atomically.
pub fn write_json_atomic<T: serde::Serialize>(
    path:  &Path,
    value: &T,
) -> Result<(), PipelineError> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| PipelineError::WriteFailure {
        path:   path.to_path_buf(),
        source: e.into(),
    })?;
    write_atomic(path, &json)
}

/// Staging path used while `path` is being written.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("scaler.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        write_atomic(&path, b"good").unwrap();

        // A directory sitting at the staging path makes File::create fail
        fs::create_dir(partial_path(&path)).unwrap();

        let err = write_atomic(&path, b"bad").unwrap_err();
        assert!(matches!(err, PipelineError::WriteFailure { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"good");
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        let p = partial_path(Path::new("/tmp/a/best_checkpoint.json"));
        assert_eq!(p, PathBuf::from("/tmp/a/best_checkpoint.json.partial"));
    }
}
