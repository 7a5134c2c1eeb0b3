use std::path::{Path, PathBuf};

use crate::tool::ToolSourceError;

/// Resolves `relative` against `working_folder`, rejecting any path that escapes it
/// (via `..` or an absolute path pointing elsewhere) once canonicalized.
pub fn resolve_path_under(working_folder: &Path, relative: &str) -> Result<PathBuf, ToolSourceError> {
    let candidate = working_folder.join(relative);
    let base = working_folder
        .canonicalize()
        .map_err(|e| ToolSourceError::ExecutionFailed(format!("working folder: {e}")))?;

    // The file may not exist yet (e.g. write_file creating a new file), so canonicalize
    // the deepest existing ancestor and rebuild the tail instead of requiring the whole
    // path to exist.
    let mut existing = candidate.clone();
    let mut tail = Vec::new();
    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                tail.push(name.to_owned());
                existing.pop();
            }
            None => break,
        }
    }
    let canon_existing = existing
        .canonicalize()
        .map_err(|e| ToolSourceError::ExecutionFailed(format!("resolve path: {e}")))?;
    if !canon_existing.starts_with(&base) {
        return Err(ToolSourceError::InvalidArguments(format!(
            "path escapes working folder: {relative}"
        )));
    }
    let mut resolved = canon_existing;
    for part in tail.into_iter().rev() {
        resolved.push(part);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_existing_file_under_working_folder() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, "hi").unwrap();
        let resolved = resolve_path_under(dir.path(), "a.txt").unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[tokio::test]
    async fn rejects_path_escaping_working_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_path_under(dir.path(), "../outside.txt").unwrap_err();
        assert!(matches!(err, ToolSourceError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn resolves_not_yet_existing_file_for_writes() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_path_under(dir.path(), "new/file.txt").unwrap();
        assert!(resolved.ends_with("new/file.txt"));
    }
}
