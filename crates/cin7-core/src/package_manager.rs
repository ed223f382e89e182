//! Package manager detection and command-line construction.

use crate::paths;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallOptions {
    pub dev: bool,
    pub exact: bool,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// Detect the package manager a project uses from its lockfile.
    ///
    /// `pnpm-lock.yaml` wins over `yarn.lock`; anything else is npm.
    pub fn detect(root: &Path) -> Self {
        if root.join(paths::PNPM_LOCK).exists() {
            PackageManager::Pnpm
        } else if root.join(paths::YARN_LOCK).exists() {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    /// Pick a package manager for a project that has no lockfile yet:
    /// the first of pnpm, yarn found on `PATH`, else npm.
    pub fn detect_available() -> Self {
        if which::which("pnpm").is_ok() {
            PackageManager::Pnpm
        } else if which::which("yarn").is_ok() {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    /// Arguments for adding `packages` to the project.
    pub fn install_args(&self, packages: &[String], opts: InstallOptions) -> Vec<String> {
        let mut args: Vec<String> = Vec::with_capacity(packages.len() + 3);
        match self {
            PackageManager::Pnpm => {
                args.push("add".into());
                if opts.dev {
                    args.push("-D".into());
                }
                if opts.exact {
                    args.push("--exact".into());
                }
            }
            PackageManager::Yarn => {
                args.push("add".into());
                if opts.dev {
                    args.push("--dev".into());
                }
                if opts.exact {
                    args.push("--exact".into());
                }
            }
            PackageManager::Npm => {
                args.push("install".into());
                args.push(if opts.dev { "--save-dev" } else { "--save" }.into());
                if opts.exact {
                    args.push("--save-exact".into());
                }
            }
        }
        args.extend(packages.iter().cloned());
        args
    }

    /// Arguments for a bare `install` of everything in `package.json`.
    pub fn install_all_args(&self) -> Vec<String> {
        vec!["install".to_string()]
    }

    /// Arguments for `run <script>`; npm needs `--` before forwarded flags.
    pub fn run_script_args(&self, script: &str, extra: &[String]) -> Vec<String> {
        let mut args = vec!["run".to_string(), script.to_string()];
        if !extra.is_empty() {
            if *self == PackageManager::Npm {
                args.push("--".to_string());
            }
            args.extend(extra.iter().cloned());
        }
        args
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The full install command as a single shell-style string.
pub fn build_install_command(
    manager: PackageManager,
    packages: &[String],
    opts: InstallOptions,
) -> String {
    let mut parts = vec![manager.as_str().to_string()];
    parts.extend(manager.install_args(packages, opts));
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pkgs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn pnpm_dev_exact_command() {
        let cmd = build_install_command(
            PackageManager::Pnpm,
            &pkgs(&["@cin7/core"]),
            InstallOptions {
                dev: true,
                exact: true,
            },
        );
        assert_eq!(cmd, "pnpm add -D --exact @cin7/core");
    }

    #[test]
    fn yarn_and_npm_commands() {
        let list = pkgs(&["@cin7/core", "@cin7/auth"]);
        assert_eq!(
            build_install_command(PackageManager::Yarn, &list, InstallOptions { dev: true, exact: false }),
            "yarn add --dev @cin7/core @cin7/auth"
        );
        assert_eq!(
            build_install_command(PackageManager::Npm, &list, InstallOptions::default()),
            "npm install --save @cin7/core @cin7/auth"
        );
        assert_eq!(
            build_install_command(PackageManager::Npm, &list, InstallOptions { dev: true, exact: true }),
            "npm install --save-dev --save-exact @cin7/core @cin7/auth"
        );
    }

    #[test]
    fn detect_prefers_pnpm_then_yarn_then_npm() {
        let dir = TempDir::new().unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Npm);

        std::fs::write(dir.path().join(paths::YARN_LOCK), "").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Yarn);

        std::fs::write(dir.path().join(paths::PNPM_LOCK), "").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Pnpm);
    }

    #[test]
    fn package_lock_alone_means_npm() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(paths::NPM_LOCK), "{}").unwrap();
        assert_eq!(PackageManager::detect(dir.path()), PackageManager::Npm);
    }

    #[test]
    fn npm_run_separates_forwarded_args() {
        let extra = pkgs(&["--port", "4000"]);
        assert_eq!(
            PackageManager::Npm.run_script_args("dev", &extra),
            pkgs(&["run", "dev", "--", "--port", "4000"])
        );
        assert_eq!(
            PackageManager::Pnpm.run_script_args("dev", &extra),
            pkgs(&["run", "dev", "--port", "4000"])
        );
        assert_eq!(PackageManager::Yarn.run_script_args("build", &[]), pkgs(&["run", "build"]));
    }
}
