use crate::errors::PackError;
use std::fs;
use std::path::Path;

/// Writes `content` through a sibling temp file and a rename, creating parent dirs.
pub(crate) fn atomic_write(path: &Path, content: &str) -> Result<(), PackError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PackError::io("failed to create dir", parent, e))?;
    }

    if path.is_dir() {
        return Err(PackError::io(
            "refusing to overwrite directory with file",
            path,
            std::io::Error::other("target is a directory"),
        ));
    }

    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    if tmp.exists() {
        let _ = fs::remove_file(&tmp);
    }
    fs::write(&tmp, content.as_bytes())
        .map_err(|e| PackError::io("failed to write tmp file", &tmp, e))?;

    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Windows rename() won't overwrite an existing file.
            if path.exists() {
                fs::remove_file(path)
                    .map_err(|e2| PackError::io("failed to remove existing file", path, e2))?;
                fs::rename(&tmp, path)
                    .map_err(|e3| PackError::io("failed to rename tmp file onto", path, e3))
            } else {
                let _ = fs::remove_file(&tmp);
                Err(PackError::io("failed to rename tmp file onto", path, e))
            }
        }
    }
}

/// Removes `dir` (if present) and recreates it empty.
pub(crate) fn reset_dir(dir: &Path) -> Result<(), PackError> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => {
            fs::remove_dir_all(dir).map_err(|e| PackError::io("failed to remove dir", dir, e))?;
        }
        Ok(_) => {
            fs::remove_file(dir).map_err(|e| PackError::io("failed to remove file", dir, e))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(PackError::io("failed to stat", dir, e)),
    }
    fs::create_dir_all(dir).map_err(|e| PackError::io("failed to create dir", dir, e))
}
