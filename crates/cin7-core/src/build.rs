//! Production build planning, bundle statistics and `dist/` post-processing.

use std::path::Path;

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::Result;
use crate::package_json::PackageJson;
use crate::package_manager::PackageManager;
use crate::process::CommandSpec;
use crate::{io, paths};

/// Bundles above this size get a warning with splitting advice.
pub const SIZE_WARNING_BYTES: u64 = 5 * 1024 * 1024;

pub const VISUALIZER_PACKAGE: &str = "rollup-plugin-visualizer";

/// Layer buckets, matched in order against each file's path under `dist/`.
/// The first substring hit wins.
pub const LAYER_PATTERNS: &[(&str, &str)] = &[
    ("core", "core"),
    ("vanilla", "vanilla-js"),
    ("polaris", "polaris"),
    ("extjs", "extjs"),
    ("sdk", "sdk"),
];

const DESIGN_TOKENS_PRELOAD: &str =
    r#"<link rel="preload" href="/assets/design-tokens.css" as="style">"#;
const DNS_PREFETCH: &str = r#"<link rel="dns-prefetch" href="https://cdn.jsdelivr.net">"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub sourcemap: bool,
    pub minify: bool,
    pub target: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            sourcemap: true,
            minify: true,
            target: "es2020".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Optional checks run before building, as `(label, script)`. Only scripts
/// the project defines are returned.
pub fn pre_build_checks(pkg: &PackageJson) -> Vec<(&'static str, &'static str)> {
    [("TypeScript", "typecheck"), ("Linting", "lint")]
        .into_iter()
        .filter(|(_, script)| pkg.has_script(script))
        .collect()
}

/// The build invocation: the project's `build` script when it has one,
/// otherwise `npx vite build` with the requested flags.
pub fn build_command(
    root: &Path,
    pkg: &PackageJson,
    manager: PackageManager,
    opts: &BuildOptions,
) -> CommandSpec {
    let spec = if pkg.has_script("build") {
        CommandSpec::new(manager.as_str(), root).args(manager.run_script_args("build", &[]))
    } else {
        let mut spec = CommandSpec::new("npx", root).args(["vite", "build"]);
        if !opts.sourcemap {
            spec = spec.args(["--sourcemap", "false"]);
        }
        if !opts.minify {
            spec = spec.args(["--minify", "false"]);
        }
        spec
    };
    spec.env("NODE_ENV", "production")
        .env("VITE_BUILD_TARGET", opts.target.as_str())
}

/// Remove `dist/` ahead of a fresh build.
pub fn clean_dist(root: &Path) -> Result<bool> {
    let dist = paths::dist_dir(root);
    if !dist.exists() {
        return Ok(false);
    }
    std::fs::remove_dir_all(&dist)?;
    Ok(true)
}

pub fn has_visualizer(pkg: &PackageJson) -> bool {
    pkg.has_dependency(VISUALIZER_PACKAGE)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStat {
    /// Path relative to `dist/`, `/`-separated.
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerStat {
    pub layer: &'static str,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub total_size: u64,
    /// Largest first.
    pub files: Vec<FileStat>,
    /// One entry per layer bucket, in `LAYER_PATTERNS` order.
    pub layers: Vec<LayerStat>,
}

impl BuildStats {
    pub fn largest(&self, n: usize) -> &[FileStat] {
        &self.files[..n.min(self.files.len())]
    }

    pub fn exceeds_size_warning(&self) -> bool {
        self.total_size > SIZE_WARNING_BYTES
    }

    /// Percentage of the total taken by `size`.
    pub fn share(&self, size: u64) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            size as f64 * 100.0 / self.total_size as f64
        }
    }
}

/// The layer bucket a built file belongs to, if any.
pub fn categorize(relative_path: &str) -> Option<&'static str> {
    LAYER_PATTERNS
        .iter()
        .find(|(pattern, _)| relative_path.contains(pattern))
        .map(|(_, layer)| *layer)
}

/// Size every `.js` and `.css` file under `dist`.
pub fn collect_stats(dist: &Path) -> Result<BuildStats> {
    let mut stats = BuildStats {
        layers: LAYER_PATTERNS
            .iter()
            .map(|&(_, layer)| LayerStat { layer, size: 0 })
            .collect(),
        ..Default::default()
    };
    if !dist.is_dir() {
        return Ok(stats);
    }

    for entry in WalkDir::new(dist).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_asset = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "js" || e == "css");
        if !is_asset {
            continue;
        }

        let size = entry.metadata().map_err(std::io::Error::from)?.len();
        let name = path
            .strip_prefix(dist)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");

        stats.total_size += size;
        if let Some(layer) = categorize(&name) {
            if let Some(bucket) = stats.layers.iter_mut().find(|l| l.layer == layer) {
                bucket.size += size;
            }
        }
        stats.files.push(FileStat { name, size });
    }

    stats
        .files
        .sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    tracing::debug!(files = stats.files.len(), total = stats.total_size, "collected build stats");
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

/// Insert resource hints before `</head>`. Returns the new document and a
/// description of each change. Hints already present are not added again.
pub fn optimize_index_html(html: &str) -> (String, Vec<&'static str>) {
    let mut hints = Vec::new();
    let mut applied = Vec::new();

    if html.contains("design-tokens") && !html.contains(DESIGN_TOKENS_PRELOAD) {
        hints.push(DESIGN_TOKENS_PRELOAD);
        applied.push("Added design tokens preload");
    }
    if !html.contains(DNS_PREFETCH) {
        hints.push(DNS_PREFETCH);
        applied.push("Added resource hints");
    }

    let Some(head_end) = html.find("</head>") else {
        return (html.to_string(), Vec::new());
    };
    if hints.is_empty() {
        return (html.to_string(), applied);
    }

    let mut out = String::with_capacity(html.len() + 128);
    out.push_str(&html[..head_end]);
    for hint in hints {
        out.push_str(hint);
        out.push('\n');
    }
    out.push_str(&html[head_end..]);
    (out, applied)
}

/// Post-build tweaks to `dist/`: resource hints in `index.html` and the
/// service worker copied from `public/`.
pub fn apply_optimizations(root: &Path) -> Result<Vec<String>> {
    let dist = paths::dist_dir(root);
    let mut applied = Vec::new();

    let index = dist.join(paths::INDEX_HTML);
    if index.is_file() {
        let html = std::fs::read_to_string(&index)?;
        let (optimized, changes) = optimize_index_html(&html);
        if optimized != html {
            io::atomic_write(&index, optimized.as_bytes())?;
        }
        applied.extend(changes.into_iter().map(String::from));
    }

    let sw = root.join(paths::PUBLIC_DIR).join(paths::SERVICE_WORKER);
    if sw.is_file() {
        io::ensure_dir(&dist)?;
        std::fs::copy(&sw, dist.join(paths::SERVICE_WORKER))?;
        applied.push("Copied service worker".to_string());
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, len: usize) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, vec![b'x'; len]).unwrap();
    }

    #[test]
    fn categorize_uses_first_matching_pattern() {
        assert_eq!(categorize("assets/core-abc.js"), Some("core"));
        assert_eq!(categorize("assets/vanilla-js-1.js"), Some("vanilla-js"));
        assert_eq!(categorize("assets/polaris-core.js"), Some("core"));
        assert_eq!(categorize("assets/typescript-sdk.js"), Some("sdk"));
        assert_eq!(categorize("assets/index.js"), None);
    }

    #[test]
    fn stats_sizes_sort_and_bucket() {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("dist");
        write(&dist, "assets/index.js", 100);
        write(&dist, "assets/polaris-adapter.js", 400);
        write(&dist, "assets/core.css", 50);
        write(&dist, "assets/logo.svg", 999);
        write(&dist, "index.html", 999);

        let stats = collect_stats(&dist).unwrap();
        assert_eq!(stats.total_size, 550);
        let names: Vec<&str> = stats.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["assets/polaris-adapter.js", "assets/index.js", "assets/core.css"]
        );
        let polaris = stats.layers.iter().find(|l| l.layer == "polaris").unwrap();
        assert_eq!(polaris.size, 400);
        let core = stats.layers.iter().find(|l| l.layer == "core").unwrap();
        assert_eq!(core.size, 50);
        assert_eq!(stats.largest(2).len(), 2);
        assert!(!stats.exceeds_size_warning());
    }

    #[test]
    fn project_directory_name_does_not_skew_buckets() {
        let dir = TempDir::new().unwrap();
        let dist = dir.path().join("core-app").join("dist");
        write(&dist, "assets/index.js", 10);
        let stats = collect_stats(&dist).unwrap();
        assert!(stats.layers.iter().all(|l| l.size == 0));
    }

    #[test]
    fn missing_dist_is_empty_stats() {
        let dir = TempDir::new().unwrap();
        let stats = collect_stats(&dir.path().join("dist")).unwrap();
        assert_eq!(stats.total_size, 0);
        assert_eq!(stats.layers.len(), LAYER_PATTERNS.len());
        assert_eq!(stats.share(0), 0.0);
    }

    #[test]
    fn index_html_gets_hints_once() {
        let html = "<html><head><link href=\"/assets/design-tokens.css\"></head></html>";
        let (once, applied) = optimize_index_html(html);
        assert_eq!(applied.len(), 2);
        assert!(once.contains(DESIGN_TOKENS_PRELOAD));
        assert!(once.find(DNS_PREFETCH).unwrap() < once.find("</head>").unwrap());

        let (twice, applied) = optimize_index_html(&once);
        assert_eq!(twice, once);
        assert!(applied.is_empty());
    }

    #[test]
    fn plain_index_html_only_gets_dns_prefetch() {
        let (out, applied) = optimize_index_html("<head></head>");
        assert_eq!(applied, vec!["Added resource hints"]);
        assert!(!out.contains("preload"));
    }

    #[test]
    fn apply_optimizations_copies_service_worker() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "public/sw.js", 10);
        std::fs::create_dir_all(dir.path().join("dist")).unwrap();
        std::fs::write(dir.path().join("dist/index.html"), "<head></head>").unwrap();

        let applied = apply_optimizations(dir.path()).unwrap();
        assert!(applied.iter().any(|a| a == "Copied service worker"));
        assert!(dir.path().join("dist/sw.js").is_file());
        let html = std::fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert!(html.contains("dns-prefetch"));
    }

    #[test]
    fn build_command_prefers_script() {
        let dir = TempDir::new().unwrap();
        let mut pkg = PackageJson::default();
        let opts = BuildOptions {
            sourcemap: false,
            minify: false,
            target: "es2015".into(),
        };

        let spec = build_command(dir.path(), &pkg, PackageManager::Pnpm, &opts);
        assert_eq!(spec.to_string(), "npx vite build --sourcemap false --minify false");
        assert!(spec
            .env
            .contains(&("VITE_BUILD_TARGET".to_string(), "es2015".to_string())));

        pkg.scripts.insert("build".into(), serde_json::json!("vite build"));
        let spec = build_command(dir.path(), &pkg, PackageManager::Pnpm, &opts);
        assert_eq!(spec.to_string(), "pnpm run build");
        assert!(spec
            .env
            .contains(&("NODE_ENV".to_string(), "production".to_string())));
    }

    #[test]
    fn pre_build_checks_only_for_defined_scripts() {
        let mut pkg = PackageJson::default();
        assert!(pre_build_checks(&pkg).is_empty());
        pkg.scripts.insert("lint".into(), serde_json::json!("eslint ."));
        assert_eq!(pre_build_checks(&pkg), vec![("Linting", "lint")]);
    }
}
