use crate::output;
use crate::prompt;
use anyhow::Context;
use cin7_core::generate::{self, GenerateOptions, GeneratorKind};
use clap::Args;
use std::path::Path;

#[derive(Args)]
pub struct GenerateArgs {
    /// What to generate: component, repository, usecase or migration
    #[arg(value_name = "TYPE")]
    pub kind: String,

    /// PascalCase name, e.g. ProductCard
    pub name: String,

    /// Target layer (prompted when the type supports several)
    #[arg(long, short = 'l')]
    pub layer: Option<String>,

    /// Generate TypeScript (default)
    #[arg(long, overrides_with = "no_typescript")]
    pub typescript: bool,

    /// Generate JavaScript instead of TypeScript
    #[arg(long, overrides_with = "typescript")]
    pub no_typescript: bool,

    /// Generate a test file (default)
    #[arg(long, overrides_with = "no_test")]
    pub test: bool,

    /// Skip the test file
    #[arg(long, overrides_with = "test")]
    pub no_test: bool,

    /// Generate a stylesheet (default)
    #[arg(long, overrides_with = "no_style")]
    pub style: bool,

    /// Skip the stylesheet
    #[arg(long, overrides_with = "style")]
    pub no_style: bool,
}

impl GenerateArgs {
    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            typescript: self.typescript || !self.no_typescript,
            test: self.test || !self.no_test,
            style: self.style || !self.no_style,
        }
    }
}

pub fn run(root: &Path, args: GenerateArgs, json: bool) -> anyhow::Result<()> {
    let kind = GeneratorKind::parse(&args.kind).map_err(|e| {
        let types: Vec<&str> = GeneratorKind::ALL.iter().map(|k| k.as_str()).collect();
        anyhow::anyhow!("{e}; available types: {}", types.join(", "))
    })?;

    let layer = match kind.resolve_layer(args.layer.as_deref())? {
        Some(layer) => layer,
        None => {
            let layers = kind.layers();
            let choices: Vec<String> = layers.iter().map(|l| l.to_string()).collect();
            let idx = prompt::select_one(&format!("Which layer should the {kind} target?"), &choices)
                .with_context(|| format!("pass --layer ({})", choices.join(", ")))?;
            layers[idx]
        }
    };

    let opts = args.options();
    let files = generate::plan_files(kind, &args.name, layer, opts)?;
    let report = generate::write_files(root, &files).context("failed to write generated files")?;

    if json {
        return output::print_json(&serde_json::json!({
            "type": kind.as_str(),
            "name": args.name,
            "layer": layer,
            "created": report.created,
            "skipped": report.skipped,
        }));
    }

    output::success(&format!("Generated {kind} {} ({layer})", args.name));
    for path in &report.created {
        output::success_detail(&path.display());
    }
    for path in &report.skipped {
        output::warning(&format!("{} already exists, skipped", path.display()));
    }

    output::header("Usage");
    output::snippet(&generate::usage(kind, &args.name, layer));
    Ok(())
}
