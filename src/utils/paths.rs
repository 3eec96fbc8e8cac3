//! Path display helper for log lines

use std::path::Path;

/// Path relative to `base` when it lives under it, otherwise the path as given
pub fn pretty_path(path: &Path, base: &Path) -> String {
    let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());

    match resolved.strip_prefix(&base) {
        Ok(relative) => relative.display().to_string(),
        Err(_) => path.display().to_string(),
    }
}
