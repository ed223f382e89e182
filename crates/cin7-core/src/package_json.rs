use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

type Map = serde_json::Map<String, serde_json::Value>;

/// The subset of `package.json` the CLI reads and writes.
///
/// Unknown keys are kept in `extra` so a load/save round trip leaves the rest
/// of the manifest untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub scripts: Map,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub dependencies: Map,
    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "Map::is_empty"
    )]
    pub dev_dependencies: Map,
    #[serde(flatten)]
    pub extra: Map,
}

impl PackageJson {
    pub fn load(root: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(paths::package_json_path(root))?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        io::write_json_pretty(&paths::package_json_path(root), self)
    }

    pub fn has_script(&self, script: &str) -> bool {
        self.scripts
            .get(script)
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.trim().is_empty())
    }

    /// True when `name` appears in dependencies or devDependencies.
    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }

    /// Every dependency and devDependency name.
    pub fn installed(&self) -> HashSet<String> {
        self.dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"{
  "name": "shop",
  "version": "1.0.0",
  "type": "module",
  "scripts": { "dev": "vite", "lint": "" },
  "dependencies": { "react": "^18.2.0" },
  "devDependencies": { "vite": "^5.0.0" },
  "engines": { "node": ">=18" }
}"#;

    #[test]
    fn queries_scripts_and_dependencies() {
        let pkg: PackageJson = serde_json::from_str(SAMPLE).unwrap();
        assert!(pkg.has_script("dev"));
        assert!(!pkg.has_script("lint"), "empty scripts do not count");
        assert!(!pkg.has_script("build"));
        assert!(pkg.has_dependency("react"));
        assert!(pkg.has_dependency("vite"));
        assert!(!pkg.has_dependency("vue"));
        assert_eq!(pkg.installed().len(), 2);
    }

    #[test]
    fn round_trip_preserves_unknown_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), SAMPLE).unwrap();

        let pkg = PackageJson::load(dir.path()).unwrap();
        pkg.save(dir.path()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("package.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["type"], "module");
        assert_eq!(raw["engines"]["node"], ">=18");
        assert_eq!(raw["devDependencies"]["vite"], "^5.0.0");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let pkg: PackageJson = serde_json::from_str(r#"{"name":"bare"}"#).unwrap();
        assert!(pkg.scripts.is_empty());
        assert!(pkg.installed().is_empty());
    }
}
