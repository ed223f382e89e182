use std::path::{Path, PathBuf};

/// Resolve the directory commands operate on.
///
/// Priority:
/// 1. `--root` flag / `CIN7_ROOT` env var (passed in as `explicit`)
/// 2. The current working directory
///
/// `create` treats the result as the parent of the new project; every other
/// command expects a `package.json` in it.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn defaults_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve_root(None), cwd);
    }
}
