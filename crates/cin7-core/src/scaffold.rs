//! New project scaffolding for `cin7 create`.

use std::path::{Path, PathBuf};

use minijinja::context;
use serde_json::{json, Map, Value};

use crate::catalog::ProjectTemplate;
use crate::error::{Cin7Error, Result};
use crate::package_json::PackageJson;
use crate::package_manager::PackageManager;
use crate::process::CommandSpec;
use crate::{cin7_config, io, paths, templates};

pub const DEV_SERVER_PORT: u16 = 3000;

const VITE_VERSION: &str = "^5.0.0";
const TYPESCRIPT_VERSION: &str = "^5.3.3";
const TYPES_NODE_VERSION: &str = "^20.10.5";

/// Directories created even when no file lands in them.
pub const PROJECT_DIRS: &[&str] = &["src", "src/components", "src/styles", "public"];

#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub name: String,
    pub template: &'static ProjectTemplate,
    pub typescript: bool,
    pub package_manager: PackageManager,
}

impl ProjectOptions {
    fn script_ext(&self) -> &'static str {
        if self.typescript {
            "ts"
        } else {
            "js"
        }
    }
}

/// A file to write, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub content: String,
}

impl ProjectFile {
    fn new(path: impl Into<PathBuf>, content: String) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Every file of a new project, in the order they are written.
pub fn render_project(opts: &ProjectOptions) -> Result<Vec<ProjectFile>> {
    let ext = opts.script_ext();
    let layers = opts.template.layers();
    let uses_design_tokens = opts.template.packages.contains(&"@cin7/design-tokens");

    let mut files = vec![
        ProjectFile::new(paths::PACKAGE_JSON, package_json_text(opts)?),
        ProjectFile::new(
            paths::VITE_CONFIG_JS,
            templates::render("project/vite.config.js", context! { port => DEV_SERVER_PORT })?,
        ),
    ];

    if opts.typescript {
        files.push(ProjectFile::new(paths::TSCONFIG, pretty(&tsconfig())?));
        files.push(ProjectFile::new(paths::TSCONFIG_NODE, pretty(&tsconfig_node())?));
    }

    files.push(ProjectFile::new(
        paths::GITIGNORE,
        templates::render("project/gitignore", context! {})?,
    ));
    files.push(ProjectFile::new(
        paths::README,
        templates::render(
            "project/README.md",
            context! {
                name => &opts.name,
                template => opts.template.key,
                package_manager => opts.package_manager.as_str(),
                typescript => opts.typescript,
                layers => &layers,
                ext => ext,
            },
        )?,
    ));
    files.push(ProjectFile::new(
        paths::CIN7_CONFIG,
        cin7_config::render_config(&layers)?,
    ));
    files.push(ProjectFile::new(
        paths::INDEX_HTML,
        templates::render("project/index.html", context! { name => &opts.name, ext => ext })?,
    ));
    files.push(ProjectFile::new(
        format!("src/main.{ext}"),
        templates::render(
            "project/main",
            context! { name => &opts.name, uses_design_tokens => uses_design_tokens },
        )?,
    ));
    files.push(ProjectFile::new(
        "src/styles/main.css",
        templates::render("project/main.css", context! {})?,
    ));
    Ok(files)
}

/// The initial manifest: vite scripts, template packages pinned to `latest`.
pub fn package_json(opts: &ProjectOptions) -> PackageJson {
    let mut scripts = Map::new();
    scripts.insert("dev".into(), json!("vite"));
    scripts.insert("build".into(), json!("vite build"));
    scripts.insert("preview".into(), json!("vite preview"));
    scripts.insert("lint".into(), json!("eslint ."));
    if opts.typescript {
        scripts.insert("typecheck".into(), json!("tsc --noEmit"));
    }

    let dependencies: Map<String, Value> = opts
        .template
        .packages
        .iter()
        .map(|pkg| (pkg.to_string(), json!("latest")))
        .collect();

    let mut dev_dependencies = Map::new();
    dev_dependencies.insert("vite".into(), json!(VITE_VERSION));
    if opts.typescript {
        dev_dependencies.insert("typescript".into(), json!(TYPESCRIPT_VERSION));
        dev_dependencies.insert("@types/node".into(), json!(TYPES_NODE_VERSION));
    }

    PackageJson {
        name: Some(opts.name.clone()),
        version: Some("0.1.0".into()),
        private: Some(true),
        scripts,
        dependencies,
        dev_dependencies,
        extra: Map::new(),
    }
}

fn package_json_text(opts: &ProjectOptions) -> Result<String> {
    pretty(&package_json(opts))
}

pub fn tsconfig() -> Value {
    json!({
        "compilerOptions": {
            "target": "ES2020",
            "useDefineForClassFields": true,
            "module": "ESNext",
            "lib": ["ES2020", "DOM", "DOM.Iterable"],
            "skipLibCheck": true,
            "moduleResolution": "bundler",
            "allowImportingTsExtensions": true,
            "resolveJsonModule": true,
            "isolatedModules": true,
            "noEmit": true,
            "jsx": "react-jsx",
            "strict": true,
            "noUnusedLocals": true,
            "noUnusedParameters": true,
            "noFallthroughCasesInSwitch": true,
            "paths": { "@/*": ["./src/*"] }
        },
        "include": ["src"],
        "references": [{ "path": "./tsconfig.node.json" }]
    })
}

pub fn tsconfig_node() -> Value {
    json!({
        "compilerOptions": {
            "composite": true,
            "skipLibCheck": true,
            "module": "ESNext",
            "moduleResolution": "bundler",
            "allowSyntheticDefaultImports": true
        },
        "include": ["vite.config.js"]
    })
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    Ok(text)
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Create `parent/<name>` and write the project into it.
///
/// Fails with `ProjectExists` when the directory is already there. If any
/// write fails the half-created directory is removed before the error is
/// returned.
pub fn create_project(parent: &Path, opts: &ProjectOptions) -> Result<PathBuf> {
    paths::validate_project_name(&opts.name)?;
    let dir = parent.join(&opts.name);
    if dir.exists() {
        return Err(Cin7Error::ProjectExists(opts.name.clone()));
    }

    let result = render_project(opts).and_then(|files| write_project(&dir, &files));
    if let Err(e) = result {
        tracing::warn!(dir = %dir.display(), error = %e, "removing partially created project");
        if dir.exists() {
            if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %cleanup,
                    "could not remove partially created project"
                );
            }
        }
        return Err(e);
    }
    tracing::info!(dir = %dir.display(), template = opts.template.key, "project created");
    Ok(dir)
}

fn write_project(dir: &Path, files: &[ProjectFile]) -> Result<()> {
    io::ensure_dir(dir)?;
    for sub in PROJECT_DIRS {
        io::ensure_dir(&dir.join(sub))?;
    }
    for file in files {
        io::atomic_write(&dir.join(&file.path), file.content.as_bytes())?;
    }
    Ok(())
}

/// `git init`, stage everything, and make the first commit.
pub fn init_git(dir: &Path) -> Result<()> {
    CommandSpec::new("git", dir).arg("init").run_quiet()?;
    CommandSpec::new("git", dir).args(["add", "."]).run_quiet()?;
    CommandSpec::new("git", dir)
        .args(["commit", "-m", "Initial commit"])
        .run_quiet()?;
    Ok(())
}

/// Install every dependency of the new project.
pub fn install_dependencies(dir: &Path, manager: PackageManager) -> Result<()> {
    CommandSpec::new(manager.as_str(), dir)
        .args(manager.install_all_args())
        .run_inherit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_template;
    use tempfile::TempDir;

    fn options(name: &str, template: &str, typescript: bool) -> ProjectOptions {
        ProjectOptions {
            name: name.to_string(),
            template: find_template(template).unwrap(),
            typescript,
            package_manager: PackageManager::Pnpm,
        }
    }

    fn file<'a>(files: &'a [ProjectFile], path: &str) -> Option<&'a ProjectFile> {
        files.iter().find(|f| f.path == Path::new(path))
    }

    #[test]
    fn typescript_project_file_set() {
        let files = render_project(&options("shop", "basic", true)).unwrap();
        for path in [
            "package.json",
            "vite.config.js",
            "tsconfig.json",
            "tsconfig.node.json",
            ".gitignore",
            "README.md",
            "cin7.config.js",
            "index.html",
            "src/main.ts",
            "src/styles/main.css",
        ] {
            assert!(file(&files, path).is_some(), "missing {path}");
        }
        assert!(file(&files, "index.html")
            .unwrap()
            .content
            .contains("/src/main.ts"));
    }

    #[test]
    fn javascript_project_skips_tsconfig() {
        let files = render_project(&options("shop", "basic", false)).unwrap();
        assert!(file(&files, "tsconfig.json").is_none());
        assert!(file(&files, "src/main.js").is_some());
        let pkg = package_json(&options("shop", "basic", false));
        assert!(!pkg.scripts.contains_key("typecheck"));
        assert!(!pkg.dev_dependencies.contains_key("typescript"));
    }

    #[test]
    fn package_json_lists_template_packages() {
        let pkg = package_json(&options("shop", "polaris-enhanced", true));
        assert_eq!(pkg.name.as_deref(), Some("shop"));
        assert_eq!(pkg.dependencies["@cin7/polaris-adapter"], "latest");
        assert_eq!(pkg.dependencies.len(), 4);
        assert_eq!(pkg.scripts["typecheck"], "tsc --noEmit");
        assert_eq!(pkg.dev_dependencies["vite"], VITE_VERSION);
        let keys: Vec<&String> = pkg.scripts.keys().collect();
        assert_eq!(keys, ["dev", "build", "preview", "lint", "typecheck"]);
    }

    #[test]
    fn config_layers_match_template() {
        let files = render_project(&options("shop", "extjs-modern", true)).unwrap();
        let config = &file(&files, "cin7.config.js").unwrap().content;
        assert_eq!(
            cin7_config::parse_layers(config).unwrap().layers,
            vec!["core", "design-tokens", "extjs-adapters"]
        );
    }

    #[test]
    fn design_tokens_import_only_when_template_has_them() {
        let basic = render_project(&options("shop", "basic", true)).unwrap();
        assert!(!file(&basic, "src/main.ts")
            .unwrap()
            .content
            .contains("design-tokens"));

        let full = render_project(&options("shop", "full-stack", true)).unwrap();
        assert!(file(&full, "src/main.ts")
            .unwrap()
            .content
            .contains("import '@cin7/design-tokens/css';"));
    }

    #[test]
    fn create_project_writes_tree() {
        let dir = TempDir::new().unwrap();
        let project = create_project(dir.path(), &options("myapp", "basic", true)).unwrap();
        assert!(project.join("package.json").is_file());
        assert!(project.join("src/components").is_dir());
        assert!(project.join("public").is_dir());
        let pkg = PackageJson::load(&project).unwrap();
        assert!(pkg.has_dependency("@cin7/core"));
        assert!(pkg.has_dependency("@cin7/vanilla-js"));
    }

    #[test]
    fn create_project_refuses_existing_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("myapp")).unwrap();
        let err = create_project(dir.path(), &options("myapp", "basic", true)).unwrap_err();
        assert!(matches!(err, Cin7Error::ProjectExists(_)));
    }

    #[test]
    fn create_project_failure_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let err = create_project(&blocker, &options("myapp", "basic", true)).unwrap_err();
        assert!(matches!(err, Cin7Error::Io(_)));
        assert!(!blocker.join("myapp").exists());
        assert!(blocker.is_file());
    }

    #[test]
    fn create_project_rejects_bad_names() {
        let dir = TempDir::new().unwrap();
        let err = create_project(dir.path(), &options("My App", "basic", true)).unwrap_err();
        assert!(matches!(err, Cin7Error::InvalidProjectName(_)));
        assert!(!dir.path().join("My App").exists());
    }
}
