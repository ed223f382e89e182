use crate::output::{self, print_json};
use crate::prompt;
use anyhow::Context;
use cin7_core::{
    migrate::{self, FileMigration, MigrationAnalysis, MigrationPlan},
    paths,
};
use clap::Subcommand;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum MigrateSubcommand {
    /// Survey the current project and estimate migration complexity
    Analyze {
        /// Framework to assume instead of detecting it from package.json
        #[arg(long)]
        from: Option<String>,
        /// Write an HTML report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Produce a phased migration plan
    Plan {
        #[arg(long, default_value = "polaris")]
        from: String,
        #[arg(long, default_value = "cin7")]
        to: String,
        /// Write the plan as JSON (or YAML for .yaml/.yml)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Report per-file changes and mark automatic ones in the sources
    Convert {
        /// File or directory to convert
        path: PathBuf,
        #[arg(long, default_value = "polaris")]
        from: String,
        /// Show planned changes without touching files
        #[arg(long)]
        dry_run: bool,
        /// Apply without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: MigrateSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MigrateSubcommand::Analyze { from, report } => {
            analyze(root, from.as_deref(), report.as_deref(), json)
        }
        MigrateSubcommand::Plan { from, to, output } => {
            plan(root, &from, &to, output.as_deref(), json)
        }
        MigrateSubcommand::Convert {
            path,
            from,
            dry_run,
            yes,
        } => convert(root, &path, &from, dry_run, yes, json),
    }
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

fn analyze(
    root: &Path,
    from: Option<&str>,
    report: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    if from.is_none() {
        paths::require_project(root)?;
    }
    let analysis = migrate::analyze_project(root, from).context("migration analysis failed")?;

    let report_path = report.map(|p| root.join(p));
    if let Some(path) = &report_path {
        migrate::write_report(&analysis, path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    if json {
        return print_json(&analysis);
    }
    print_analysis(&analysis);
    if let Some(path) = &report_path {
        output::success(&format!("Report written to {}", path.display()));
    }
    Ok(())
}

fn print_analysis(analysis: &MigrationAnalysis) {
    output::header("Migration analysis");
    println!("  Framework:   {}", analysis.framework);
    println!("  Components:  {}", analysis.components);
    println!("  Complexity:  {}", analysis.complexity);

    output::header("Patterns");
    let p = &analysis.patterns;
    println!("  Data-intensive:       {}", p.data_intensive);
    println!("  Simple interactions:  {}", p.simple_interactions);
    println!("  Complex forms:        {}", p.complex_forms);
    println!("  Modern UI:            {}", p.modern_ui);

    if !analysis.recommendations.is_empty() {
        output::header("Recommendations");
        for rec in &analysis.recommendations {
            output::hint(rec);
        }
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

fn plan(
    root: &Path,
    from: &str,
    to: &str,
    out: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let plan = migrate::plan(from, to);

    let out_path = out.map(|p| root.join(p));
    if let Some(path) = &out_path {
        migrate::write_plan(&plan, path)
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
    }

    if json {
        return print_json(&plan);
    }
    print_plan(&plan);
    if let Some(path) = &out_path {
        output::success(&format!("Plan written to {}", path.display()));
    }
    Ok(())
}

fn print_plan(plan: &MigrationPlan) {
    output::header(&format!("Migration plan: {} -> {}", plan.from, plan.to));
    for (i, phase) in plan.phases.iter().enumerate() {
        println!("\n  {}. {} ({})", i + 1, phase.name, phase.effort);
        for task in &phase.tasks {
            println!("     - {task}");
        }
    }
    println!("\n  Estimated effort: {}", plan.estimated_effort);
}

// ---------------------------------------------------------------------------
// convert
// ---------------------------------------------------------------------------

fn convert(
    root: &Path,
    path: &Path,
    from: &str,
    dry_run: bool,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let target = root.join(path);
    let results = migrate::convert(&target, from)
        .with_context(|| format!("failed to scan {}", target.display()))?;
    if !json {
        print_results(root, &results);
    }

    let automatic = results.iter().filter(|r| r.automatic).count();
    let changed = if dry_run || automatic == 0 {
        if !json && !results.is_empty() && !dry_run {
            println!("\nNo automatic migrations to apply.");
        }
        Vec::new()
    } else if yes
        || prompt::confirm(
            &format!("Mark {automatic} file(s) with their planned changes?"),
            false,
        )?
    {
        migrate::apply(&results).context("failed to apply migrations")?
    } else {
        if !json {
            println!("Aborted; no files changed.");
        }
        Vec::new()
    };

    if json {
        return print_json(&serde_json::json!({
            "results": results,
            "changed": changed,
        }));
    }
    if !changed.is_empty() {
        output::success(&format!("Updated {} file(s)", changed.len()));
    }
    Ok(())
}

fn print_results(root: &Path, results: &[FileMigration]) {
    if results.is_empty() {
        println!("Nothing to migrate.");
        return;
    }
    for result in results {
        let shown = result.file.strip_prefix(root).unwrap_or(&result.file);
        let mode = if result.automatic { "automatic" } else { "manual" };
        output::header(&format!("{} ({mode})", shown.display()));
        for change in &result.changes {
            output::success_detail(change);
        }
        for rec in &result.recommendations {
            output::hint(rec);
        }
    }
}
