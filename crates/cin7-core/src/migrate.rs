//! Migration heuristics for moving existing front-ends onto cin7 layers.
//!
//! Everything here is pattern matching over source text. Nothing is parsed
//! as JavaScript; the goal is a quick survey, not a codemod.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::error::Result;
use crate::package_json::PackageJson;
use crate::{io, paths, templates};

pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist"];

/// Prefix of the comment lines `convert` writes into migrated files.
pub const MARKER: &str = "// cin7-migrate:";

// ---------------------------------------------------------------------------
// Framework detection
// ---------------------------------------------------------------------------

/// The UI framework a project depends on, judged from its manifest.
pub fn detect_framework(pkg: &PackageJson) -> &'static str {
    if pkg.has_dependency("@shopify/polaris") {
        "polaris"
    } else if pkg.has_dependency("extjs") || pkg.has_dependency("ext-react") {
        "extjs"
    } else if pkg.has_dependency("react") {
        "react"
    } else if pkg.has_dependency("vue") {
        "vue"
    } else if pkg.has_dependency("angular") {
        "angular"
    } else {
        "unknown"
    }
}

// ---------------------------------------------------------------------------
// Source discovery
// ---------------------------------------------------------------------------

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

/// Script sources under `path`, sorted. A file path yields itself.
pub fn discover_sources(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    // Surface a missing path as an I/O error rather than an empty result.
    std::fs::metadata(path)?;

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_source_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Pattern analysis
// ---------------------------------------------------------------------------

static DATA_ARRAY_RE: OnceLock<Regex> = OnceLock::new();
static INTERACTION_RE: OnceLock<Regex> = OnceLock::new();
static TEXT_INPUT_RE: OnceLock<Regex> = OnceLock::new();

fn data_array_re() -> &'static Regex {
    DATA_ARRAY_RE.get_or_init(|| Regex::new(r"data\s*=\s*\[").unwrap())
}

fn interaction_re() -> &'static Regex {
    INTERACTION_RE.get_or_init(|| Regex::new(r"onClick|addEventListener").unwrap())
}

fn text_input_re() -> &'static Regex {
    TEXT_INPUT_RE.get_or_init(|| Regex::new(r#"input.*type=["'](?:text|email|password)"#).unwrap())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatternCounts {
    pub data_intensive: usize,
    pub simple_interactions: usize,
    pub complex_forms: usize,
    pub modern_ui: usize,
}

impl PatternCounts {
    pub fn total(&self) -> usize {
        self.data_intensive + self.simple_interactions + self.complex_forms + self.modern_ui
    }

    /// Count each pattern at most once for `content`.
    pub fn add_source(&mut self, content: &str) {
        let has = |needle: &str| content.contains(needle);

        if has("DataTable") || has("Grid") || has("Table") || data_array_re().is_match(content) {
            self.data_intensive += 1;
        }
        if interaction_re().is_match(content) && !has("useState") && !has("class") {
            self.simple_interactions += 1;
        }
        if has("Form") || has("TextField") || text_input_re().is_match(content) {
            self.complex_forms += 1;
        }
        if has("Modal") || has("Drawer") || has("Toast") || has("Animation") {
            self.modern_ui += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn from_total(total: usize) -> Self {
        if total < 10 {
            Complexity::Low
        } else if total > 30 {
            Complexity::High
        } else {
            Complexity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationAnalysis {
    pub framework: String,
    pub components: usize,
    pub patterns: PatternCounts,
    pub recommendations: Vec<String>,
    pub complexity: Complexity,
}

/// Recommendations and complexity for a set of pattern counts.
pub fn assess(framework: &str, components: usize, patterns: PatternCounts) -> MigrationAnalysis {
    let mut recommendations = Vec::new();
    if patterns.data_intensive > 5 {
        recommendations
            .push("Consider using ExtJS adapters for data-intensive components".to_string());
    }
    if patterns.simple_interactions > 10 {
        recommendations.push(
            "Use vanilla-js layer for simple DOM interactions to reduce bundle size".to_string(),
        );
    }
    if framework == "polaris" && patterns.modern_ui > 5 {
        recommendations.push(
            "Keep Polaris for modern UI components, optimize with selective imports".to_string(),
        );
    }
    MigrationAnalysis {
        framework: framework.to_string(),
        components,
        patterns,
        recommendations,
        complexity: Complexity::from_total(patterns.total()),
    }
}

/// Survey `root/src`. `framework` overrides detection from `package.json`.
pub fn analyze_project(root: &Path, framework: Option<&str>) -> Result<MigrationAnalysis> {
    let framework = match framework {
        Some(f) => f.to_string(),
        None => detect_framework(&PackageJson::load(root)?).to_string(),
    };

    let src = paths::src_dir(root);
    let files = if src.is_dir() {
        discover_sources(&src)?
    } else {
        Vec::new()
    };

    let mut patterns = PatternCounts::default();
    for file in &files {
        match std::fs::read_to_string(file) {
            Ok(content) => patterns.add_source(&content),
            Err(e) => tracing::warn!(file = %file.display(), error = %e, "skipping unreadable source"),
        }
    }
    tracing::debug!(?patterns, files = files.len(), "analyzed sources");
    Ok(assess(&framework, files.len(), patterns))
}

/// Standalone HTML report for an analysis.
pub fn render_report(analysis: &MigrationAnalysis) -> Result<String> {
    templates::render(
        "reports/migration.html",
        minijinja::context! {
            analysis => analysis,
            generated_at => chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        },
    )
}

pub fn write_report(analysis: &MigrationAnalysis, path: &Path) -> Result<()> {
    io::atomic_write(path, render_report(analysis)?.as_bytes())
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    pub name: String,
    pub tasks: Vec<String>,
    pub effort: String,
}

impl Phase {
    fn new(name: &str, tasks: &[&str], effort: &str) -> Self {
        Self {
            name: name.to_string(),
            tasks: tasks.iter().map(|t| t.to_string()).collect(),
            effort: effort.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub from: String,
    pub to: String,
    pub phases: Vec<Phase>,
    pub estimated_effort: String,
    pub breaking_changes: Vec<String>,
    pub dependencies: Vec<String>,
}

pub fn plan(from: &str, to: &str) -> MigrationPlan {
    let mut phases = vec![Phase::new(
        "Setup Cin7 DSL",
        &[
            "Install @cin7/core and @cin7/design-tokens",
            "Set up build configuration",
            "Configure design tokens",
        ],
        "2-4 hours",
    )];
    if from == "polaris" {
        phases.push(Phase::new(
            "Adopt Multi-Layer Architecture",
            &[
                "Identify simple interactions for vanilla-js layer",
                "Move data tables to ExtJS adapters",
                "Keep Polaris for modern UI components",
                "Add TypeScript SDK for business logic",
            ],
            "1-2 weeks",
        ));
    }
    phases.push(Phase::new(
        "Performance Optimization",
        &[
            "Implement code splitting",
            "Optimize bundle sizes",
            "Add lazy loading",
            "Performance testing",
        ],
        "3-5 days",
    ));

    MigrationPlan {
        from: from.to_string(),
        to: to.to_string(),
        phases,
        estimated_effort: "medium".to_string(),
        breaking_changes: Vec::new(),
        dependencies: Vec::new(),
    }
}

/// Write a plan as YAML when `path` ends in `.yaml`/`.yml`, JSON otherwise.
pub fn write_plan(plan: &MigrationPlan, path: &Path) -> Result<()> {
    let yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    if yaml {
        io::atomic_write(path, serde_yaml::to_string(plan)?.as_bytes())
    } else {
        io::write_json_pretty(path, plan)
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMigration {
    pub file: PathBuf,
    pub changes: Vec<String>,
    pub recommendations: Vec<String>,
    /// False when a change has to be made by hand.
    pub automatic: bool,
}

/// Changes and advice for one source file. `None` when there is nothing to
/// say about it.
pub fn migrate_source(file: &Path, content: &str, from: &str) -> Option<FileMigration> {
    let mut result = FileMigration {
        file: file.to_path_buf(),
        changes: Vec::new(),
        recommendations: Vec::new(),
        automatic: true,
    };

    if from == "polaris" {
        if content.contains("onClick") && !content.contains("useState") {
            result
                .changes
                .push("Convert simple onClick handlers to vanilla-js".to_string());
            result
                .recommendations
                .push("Use @cin7/vanilla-js for lightweight event handling".to_string());
        }
        if content.contains("DataTable") || content.contains("IndexTable") {
            result
                .changes
                .push("Convert DataTable to ExtJS Grid adapter".to_string());
            result.recommendations.push(
                "ExtJS grids provide better performance for large datasets".to_string(),
            );
            result.automatic = false;
        }
        if content.contains("Form") && content.contains("TextField") {
            result.recommendations.push(
                "Consider ExtJS forms for complex validation scenarios".to_string(),
            );
        }
    }

    if result.changes.is_empty() && result.recommendations.is_empty() {
        None
    } else {
        Some(result)
    }
}

/// Run `migrate_source` over every script under `path`.
pub fn convert(path: &Path, from: &str) -> Result<Vec<FileMigration>> {
    let mut results = Vec::new();
    for file in discover_sources(path)? {
        let content = std::fs::read_to_string(&file)?;
        if let Some(result) = migrate_source(&file, &content, from) {
            results.push(result);
        }
    }
    Ok(results)
}

/// Record a migration's planned changes as marker comments at the top of
/// `content`, after any shebang. Lines already present are not repeated.
pub fn annotate(content: &str, changes: &[String]) -> String {
    let missing: Vec<String> = changes
        .iter()
        .map(|c| format!("{MARKER} {c}"))
        .filter(|line| !content.lines().any(|l| l.trim_end() == line.as_str()))
        .collect();
    if missing.is_empty() {
        return content.to_string();
    }

    let split = if content.starts_with("#!") {
        content.find('\n').map(|i| i + 1).unwrap_or(content.len())
    } else {
        0
    };
    let mut out = String::with_capacity(content.len() + missing.len() * 64);
    out.push_str(&content[..split]);
    if split == content.len() && !content.is_empty() && !content.ends_with('\n') {
        out.push('\n');
    }
    for line in &missing {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&content[split..]);
    out
}

/// Annotate every automatic migration on disk. Returns the files changed.
pub fn apply(results: &[FileMigration]) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    for result in results.iter().filter(|r| r.automatic) {
        let content = std::fs::read_to_string(&result.file)?;
        let updated = annotate(&content, &result.changes);
        if updated != content {
            io::atomic_write(&result.file, updated.as_bytes())?;
            changed.push(result.file.clone());
        }
    }
    tracing::info!(files = changed.len(), "applied migrations");
    Ok(changed)
}
