use crate::error::{Cin7Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const PACKAGE_JSON: &str = "package.json";
pub const CIN7_CONFIG: &str = "cin7.config.js";
pub const VITE_CONFIG_JS: &str = "vite.config.js";
pub const VITE_CONFIG_TS: &str = "vite.config.ts";
pub const TSCONFIG: &str = "tsconfig.json";
pub const TSCONFIG_NODE: &str = "tsconfig.node.json";
pub const GITIGNORE: &str = ".gitignore";
pub const README: &str = "README.md";
pub const INDEX_HTML: &str = "index.html";

pub const PNPM_LOCK: &str = "pnpm-lock.yaml";
pub const YARN_LOCK: &str = "yarn.lock";
pub const NPM_LOCK: &str = "package-lock.json";

pub const SRC_DIR: &str = "src";
pub const DIST_DIR: &str = "dist";
pub const PUBLIC_DIR: &str = "public";
pub const SERVICE_WORKER: &str = "sw.js";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn package_json_path(root: &Path) -> PathBuf {
    root.join(PACKAGE_JSON)
}

pub fn cin7_config_path(root: &Path) -> PathBuf {
    root.join(CIN7_CONFIG)
}

pub fn dist_dir(root: &Path) -> PathBuf {
    root.join(DIST_DIR)
}

pub fn src_dir(root: &Path) -> PathBuf {
    root.join(SRC_DIR)
}

/// True when either `vite.config.js` or `vite.config.ts` is present.
pub fn has_vite_config(root: &Path) -> bool {
    root.join(VITE_CONFIG_JS).exists() || root.join(VITE_CONFIG_TS).exists()
}

/// Fail with `NotAProject` unless `root/package.json` exists.
pub fn require_project(root: &Path) -> Result<()> {
    if package_json_path(root).is_file() {
        Ok(())
    } else {
        Err(Cin7Error::NotAProject(root.display().to_string()))
    }
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static PROJECT_NAME_RE: OnceLock<Regex> = OnceLock::new();
static IDENTIFIER_RE: OnceLock<Regex> = OnceLock::new();

fn project_name_re() -> &'static Regex {
    PROJECT_NAME_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9._\-]*$").unwrap())
}

fn identifier_re() -> &'static Regex {
    IDENTIFIER_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Za-z0-9]*$").unwrap())
}

/// Project names double as the npm package name, so they follow npm's rules
/// for unscoped names.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 214 || !project_name_re().is_match(name) {
        return Err(Cin7Error::InvalidProjectName(name.to_string()));
    }
    Ok(())
}

/// Generated components, repositories and use cases become class and
/// function names, so they must be PascalCase identifiers.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.len() > 64 || !identifier_re().is_match(name) {
        return Err(Cin7Error::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn valid_project_names() {
        for name in ["myapp", "my-app", "app_2", "a", "shop.admin"] {
            validate_project_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_project_names() {
        for name in ["", "MyApp", "-app", ".hidden", "has space", "a/b"] {
            assert!(
                validate_project_name(name).is_err(),
                "expected invalid: {name}"
            );
        }
    }

    #[test]
    fn identifiers_must_be_pascal_case() {
        validate_identifier("ProductCard").unwrap();
        validate_identifier("A1").unwrap();
        assert!(validate_identifier("productCard").is_err());
        assert!(validate_identifier("Product-Card").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn vite_config_detection() {
        let dir = TempDir::new().unwrap();
        assert!(!has_vite_config(dir.path()));
        std::fs::write(dir.path().join(VITE_CONFIG_TS), "").unwrap();
        assert!(has_vite_config(dir.path()));
    }

    #[test]
    fn require_project_needs_package_json() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            require_project(dir.path()),
            Err(Cin7Error::NotAProject(_))
        ));
        std::fs::write(dir.path().join(PACKAGE_JSON), "{}").unwrap();
        require_project(dir.path()).unwrap();
    }
}
