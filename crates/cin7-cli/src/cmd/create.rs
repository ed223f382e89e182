use crate::output;
use crate::prompt;
use anyhow::Context;
use cin7_core::{
    catalog::{self, ProjectTemplate, DEFAULT_TEMPLATE, TEMPLATES},
    package_manager::PackageManager,
    paths,
    scaffold::{self, ProjectOptions, DEV_SERVER_PORT},
    Cin7Error,
};
use clap::Args;
use std::path::Path;

#[derive(Args)]
pub struct CreateArgs {
    /// Project name (also the directory created)
    pub name: String,

    /// Project template
    #[arg(long, short = 't', default_value = DEFAULT_TEMPLATE)]
    pub template: String,

    /// Generate TypeScript (default)
    #[arg(long, overrides_with = "no_typescript")]
    pub typescript: bool,

    /// Generate JavaScript instead of TypeScript
    #[arg(long, overrides_with = "typescript")]
    pub no_typescript: bool,

    /// Initialize a git repository (default)
    #[arg(long, overrides_with = "no_git")]
    pub git: bool,

    /// Skip git initialization
    #[arg(long, overrides_with = "git")]
    pub no_git: bool,

    /// Install dependencies (default)
    #[arg(long, overrides_with = "no_install")]
    pub install: bool,

    /// Skip dependency installation
    #[arg(long, overrides_with = "install")]
    pub no_install: bool,
}

impl CreateArgs {
    // Paired flags override each other, so at most one side of a pair is set.
    fn typescript(&self) -> bool {
        self.typescript || !self.no_typescript
    }

    fn git(&self) -> bool {
        self.git || !self.no_git
    }

    fn install(&self) -> bool {
        self.install || !self.no_install
    }
}

pub fn run(root: &Path, args: CreateArgs, json: bool) -> anyhow::Result<()> {
    paths::validate_project_name(&args.name)?;
    let dir = root.join(&args.name);
    if dir.exists() {
        return Err(Cin7Error::ProjectExists(args.name.clone()).into());
    }

    let template = resolve_template(&args.template)?;
    let package_manager = PackageManager::detect_available();
    let opts = ProjectOptions {
        name: args.name.clone(),
        template,
        typescript: args.typescript(),
        package_manager,
    };

    let dir = scaffold::create_project(root, &opts)
        .with_context(|| format!("failed to create project '{}'", args.name))?;

    let git_initialized = args.git() && init_git(&dir);
    let installed = args.install() && install(&dir, package_manager);

    if json {
        return output::print_json(&serde_json::json!({
            "name": opts.name,
            "path": dir.display().to_string(),
            "template": template.key,
            "typescript": opts.typescript,
            "packageManager": package_manager.as_str(),
            "git": git_initialized,
            "installed": installed,
        }));
    }

    output::success(&format!("Created {} with the {} template", args.name, template.name));
    output::header("Next steps:");
    output::detail(&format!("cd {}", args.name));
    if !installed {
        output::detail(&format!("{package_manager} install"));
    }
    output::detail(&format!("{package_manager} run dev"));
    println!(
        "\nThe dev server runs on http://localhost:{DEV_SERVER_PORT}. Layers: {}",
        template.layers().join(", ")
    );
    Ok(())
}

/// Unknown templates fall back to a picker when a terminal is attached.
fn resolve_template(key: &str) -> anyhow::Result<&'static ProjectTemplate> {
    if let Some(t) = catalog::find_template(key) {
        return Ok(t);
    }
    let available: Vec<&str> = TEMPLATES.iter().map(|t| t.key).collect();
    if !prompt::is_interactive() {
        anyhow::bail!(
            "{}; available templates: {}",
            Cin7Error::UnknownTemplate(key.to_string()),
            available.join(", ")
        );
    }

    output::warning(&format!("unknown template '{key}'"));
    let choices: Vec<String> = TEMPLATES
        .iter()
        .map(|t| format!("{} ({}): {}", t.name, t.key, t.description))
        .collect();
    let idx = prompt::select_one("Select a template:", &choices)?;
    Ok(&TEMPLATES[idx])
}

fn init_git(dir: &Path) -> bool {
    match scaffold::init_git(dir) {
        Ok(()) => {
            output::success("Initialized git repository");
            true
        }
        Err(e) => {
            output::warning(&format!("git initialization skipped: {e}"));
            false
        }
    }
}

fn install(dir: &Path, manager: PackageManager) -> bool {
    println!("Installing dependencies with {manager}...");
    match scaffold::install_dependencies(dir, manager) {
        Ok(()) => {
            output::success("Dependencies installed");
            true
        }
        Err(e) => {
            output::warning(&format!(
                "dependency installation failed: {e}\n  run `{manager} install` inside the project manually"
            ));
            false
        }
    }
}
