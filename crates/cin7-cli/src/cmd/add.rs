use crate::output;
use crate::prompt;
use anyhow::Context;
use cin7_core::{
    catalog::{self, InstallPlan, PACKAGES, SCOPE},
    cin7_config,
    package_json::PackageJson,
    package_manager::{build_install_command, InstallOptions, PackageManager},
    paths,
    process::CommandSpec,
    Cin7Error,
};
use clap::Args;
use std::path::Path;

#[derive(Args)]
pub struct AddArgs {
    /// Packages to add by catalog key (e.g. vanilla-js polaris-adapter)
    pub packages: Vec<String>,

    /// Add as devDependencies
    #[arg(long, short = 'D')]
    pub dev: bool,

    /// Pin exact versions
    #[arg(long, short = 'E')]
    pub exact: bool,

    /// Accept missing peer dependencies without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Print the install command instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(root: &Path, args: AddArgs, json: bool) -> anyhow::Result<()> {
    paths::require_project(root)?;
    let pkg = PackageJson::load(root).context("failed to read package.json")?;
    let installed = pkg.installed();

    let selected = if args.packages.is_empty() {
        let candidates: Vec<_> = PACKAGES
            .iter()
            .filter(|p| !installed.contains(p.name))
            .collect();
        if candidates.is_empty() {
            println!("All cin7 packages are already installed.");
            return Ok(());
        }
        let choices: Vec<String> = candidates
            .iter()
            .map(|p| format!("{}: {}", p.name, p.description))
            .collect();
        let picked = prompt::select_many("Select packages to add:", &choices)?;
        if picked.is_empty() {
            println!("No packages selected.");
            return Ok(());
        }
        picked.into_iter().map(|i| candidates[i].key.to_string()).collect()
    } else {
        args.packages.clone()
    };

    let plan = catalog::resolve_install(&selected, &installed).map_err(|e| {
        if matches!(e, Cin7Error::UnknownPackages(_)) {
            let available: Vec<&str> = PACKAGES.iter().map(|p| p.key).collect();
            anyhow::anyhow!("{e}; available packages: {}", available.join(", "))
        } else {
            anyhow::Error::from(e)
        }
    })?;

    let include_peers = confirm_peers(&plan, args.yes)?;
    let packages = plan.install_set(include_peers);
    let manager = PackageManager::detect(root);
    let opts = InstallOptions {
        dev: args.dev,
        exact: args.exact,
    };
    let command = build_install_command(manager, &packages, opts);

    if args.dry_run {
        if json {
            return output::print_json(&serde_json::json!({
                "packageManager": manager.as_str(),
                "command": command,
                "plan": plan,
                "packages": packages,
            }));
        }
        println!("{command}");
        return Ok(());
    }

    println!("Running: {command}");
    CommandSpec::new(manager.as_str(), root)
        .args(manager.install_args(&packages, opts))
        .run_inherit()
        .context("package installation failed")?;

    let layers: Vec<String> = plan
        .packages
        .iter()
        .filter_map(|p| p.strip_prefix(SCOPE))
        .map(str::to_string)
        .collect();
    match cin7_config::update_config_file(root, &layers) {
        Ok(true) => output::success("Updated cin7.config.js layers"),
        Ok(false) => {}
        Err(e) => output::warning(&format!("could not update cin7.config.js: {e}")),
    }

    if json {
        return output::print_json(&serde_json::json!({
            "packageManager": manager.as_str(),
            "command": command,
            "plan": plan,
            "packages": packages,
            "layers": layers,
        }));
    }

    output::success(&format!("Added {}", plan.selected.join(", ")));
    print_hints(&plan.selected);
    Ok(())
}

/// Missing third-party peers are installed only when accepted.
fn confirm_peers(plan: &InstallPlan, yes: bool) -> anyhow::Result<bool> {
    if plan.missing_peers.is_empty() {
        return Ok(false);
    }
    if yes {
        return Ok(true);
    }
    let accepted = prompt::confirm(
        &format!(
            "Missing peer dependencies: {}. Install them too?",
            plan.missing_peers.join(", ")
        ),
        true,
    )?;
    if !accepted {
        output::warning("skipping peer dependencies; the added packages may not work until they are installed");
    }
    Ok(accepted)
}

fn print_hints(selected: &[String]) {
    for key in selected {
        if let Some((title, lines)) = catalog::post_install_hint(key) {
            output::header(title);
            for line in lines {
                output::detail(line);
            }
        }
    }
}
