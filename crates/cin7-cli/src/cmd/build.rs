use crate::output::{self, format_bytes_kb, format_bytes_mb, print_table};
use anyhow::Context;
use cin7_core::{
    build::{self, BuildOptions, BuildStats, VISUALIZER_PACKAGE},
    package_json::PackageJson,
    package_manager::PackageManager,
    paths,
    process::CommandSpec,
};
use clap::Args;
use serde::Serialize;
use std::path::Path;

#[derive(Args)]
pub struct BuildArgs {
    /// Report whether a bundle visualizer is configured
    #[arg(long)]
    pub analyze: bool,

    /// Disable source maps
    #[arg(long)]
    pub no_sourcemap: bool,

    /// Disable minification
    #[arg(long)]
    pub no_minify: bool,

    /// Build target passed to vite as VITE_BUILD_TARGET
    #[arg(long, default_value = "es2020")]
    pub target: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildSummary {
    stats: BuildStats,
    size_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    visualizer: Option<bool>,
    optimizations: Vec<String>,
    skipped_checks: Vec<String>,
}

pub fn run(root: &Path, args: BuildArgs, json: bool) -> anyhow::Result<()> {
    paths::require_project(root)?;
    let pkg = PackageJson::load(root).context("failed to read package.json")?;
    let manager = PackageManager::detect(root);
    let opts = BuildOptions {
        sourcemap: !args.no_sourcemap,
        minify: !args.no_minify,
        target: args.target.clone(),
    };

    let mut skipped_checks = Vec::new();
    for (label, script) in build::pre_build_checks(&pkg) {
        let check = CommandSpec::new(manager.as_str(), root).args(manager.run_script_args(script, &[]));
        match check.run_quiet() {
            Ok(_) => {
                if !json {
                    output::success(&format!("{label} check passed"));
                }
            }
            Err(e) => {
                output::warning(&format!("{label} check failed, continuing: {e}"));
                skipped_checks.push(label.to_string());
            }
        }
    }

    if build::clean_dist(root).context("failed to clean dist/")? {
        tracing::debug!("removed previous dist/");
    }

    let command = build::build_command(root, &pkg, manager, &opts);
    if json {
        command.run_quiet().context("build failed")?;
    } else {
        println!("Building: {command}");
        command.run_inherit().context("build failed")?;
    }

    let stats = build::collect_stats(&paths::dist_dir(root)).context("failed to read dist/")?;
    let visualizer = args.analyze.then(|| build::has_visualizer(&pkg));
    let optimizations = match build::apply_optimizations(root) {
        Ok(applied) => applied,
        Err(e) => {
            output::warning(&format!("post-build optimizations skipped: {e}"));
            Vec::new()
        }
    };

    let summary = BuildSummary {
        size_warning: stats.exceeds_size_warning(),
        stats,
        visualizer,
        optimizations,
        skipped_checks,
    };
    if json {
        return output::print_json(&summary);
    }
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BuildSummary) {
    let stats = &summary.stats;
    output::success("Build complete");

    output::header("Bundle size");
    println!("  Total: {}", format_bytes_mb(stats.total_size));
    if summary.size_warning {
        output::warning("bundle exceeds 5 MB; consider code splitting or dropping unused layers");
    }

    if !stats.files.is_empty() {
        output::header("Largest files");
        let rows = stats
            .largest(5)
            .iter()
            .map(|f| vec![f.name.clone(), format_bytes_kb(f.size)])
            .collect();
        print_table(&["FILE", "SIZE"], rows);
    }

    let layers: Vec<Vec<String>> = stats
        .layers
        .iter()
        .filter(|l| l.size > 0)
        .map(|l| {
            vec![
                l.layer.to_string(),
                format_bytes_kb(l.size),
                format!("{:.1}%", stats.share(l.size)),
            ]
        })
        .collect();
    if !layers.is_empty() {
        output::header("Layer breakdown");
        print_table(&["LAYER", "SIZE", "SHARE"], layers);
    }

    if let Some(configured) = summary.visualizer {
        output::header("Bundle analysis");
        if configured {
            output::detail("Open dist/stats.html to inspect the bundle");
        } else {
            output::hint(&format!(
                "Add {VISUALIZER_PACKAGE} to vite.config.js for a detailed bundle report"
            ));
        }
    }

    if !summary.optimizations.is_empty() {
        output::header("Optimizations");
        for applied in &summary.optimizations {
            output::success_detail(applied);
        }
    }
}
