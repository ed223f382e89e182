use crate::output::{self, print_table};
use anyhow::Context;
use cin7_core::{
    io,
    lighthouse::{
        self, Device, LayerDetection, LighthouseRun, Rating, Report, ReportFormat, Summary,
        DEFAULT_CATEGORIES, PROBE_PORTS,
    },
    Cin7Error,
};
use clap::{Args, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Html,
    Json,
    Csv,
}

impl From<FormatArg> for ReportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Html => ReportFormat::Html,
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Csv => ReportFormat::Csv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DeviceArg {
    Mobile,
    Desktop,
}

impl From<DeviceArg> for Device {
    fn from(d: DeviceArg) -> Self {
        match d {
            DeviceArg::Mobile => Device::Mobile,
            DeviceArg::Desktop => Device::Desktop,
        }
    }
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// URL to audit (default: first local dev server found)
    pub url: Option<String>,

    /// Save the report to this path (relative to the project root)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, short = 'f', value_enum, default_value = "html")]
    pub format: FormatArg,

    /// Previous report (JSON) to compare against
    #[arg(long)]
    pub compare: Option<PathBuf>,

    /// Comma-separated Lighthouse categories
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Device to emulate
    #[arg(long, value_enum, default_value = "desktop")]
    pub device: DeviceArg,
}

pub fn run(root: &Path, args: AnalyzeArgs, json: bool) -> anyhow::Result<()> {
    let url = match args.url {
        Some(url) => url,
        None => lighthouse::detect_local_server(PROBE_PORTS).ok_or_else(|| {
            let ports: Vec<String> = PROBE_PORTS.iter().map(u16::to_string).collect();
            anyhow::anyhow!(
                "{}; start one with `cin7 dev` or pass a URL",
                Cin7Error::NoLocalServer(ports.join(", "))
            )
        })?,
    };

    let categories = if args.metrics.is_empty() {
        DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
    } else {
        args.metrics.clone()
    };
    let lh = LighthouseRun {
        url: url.clone(),
        categories,
        device: args.device.into(),
        format: args.format.into(),
    };

    if !json {
        println!("Running Lighthouse against {url} ({})...", lh.device.as_str());
    }
    let result = lh.run(root).context("lighthouse run failed")?;

    let previous = args.compare.as_deref().and_then(|path| match Report::load(&root.join(path)) {
        Ok(report) => Some(report),
        Err(e) => {
            output::warning(&format!("cannot compare with {}: {e}", path.display()));
            None
        }
    });
    let summary = result.report.summarize(previous.as_ref());

    let output_path = args.output.as_deref().map(|p| root.join(p));
    if let Some(path) = &output_path {
        io::atomic_write(path, result.rendered.as_bytes())
            .with_context(|| format!("failed to save report to {}", path.display()))?;
    }

    if json {
        return output::print_json(&summary);
    }
    print_summary(&summary);
    if let Some(path) = &output_path {
        output::success(&format!("Report saved to {}", path.display()));
    }
    Ok(())
}

fn mark(rating: Rating) -> colored::ColoredString {
    match rating {
        Rating::Good => "✓".green(),
        Rating::Average => "!".yellow(),
        Rating::Poor => "✗".red(),
    }
}

fn print_summary(summary: &Summary) {
    output::header("Scores");
    for cat in &summary.categories {
        println!("  {} {:<16} {:>3}", mark(cat.rating), cat.title, cat.score);
    }

    if !summary.metrics.is_empty() {
        output::header("Key metrics");
        for metric in &summary.metrics {
            let marker = metric.rating.map(mark).unwrap_or_else(|| " ".normal());
            println!("  {} {:<26} {}", marker, metric.name, metric.display);
        }
    }

    output::header("cin7 layers");
    let detected = detected_layers(&summary.layers);
    if detected.is_empty() {
        output::detail("No cin7 layers detected");
    } else {
        output::detail(&detected.join(", "));
        if summary.layers.multi_layer {
            output::detail("Multi-layer architecture detected");
        }
    }

    if let Some(comparison) = &summary.comparison {
        output::header("Comparison");
        let rows = comparison
            .iter()
            .map(|d| {
                vec![
                    d.title.clone(),
                    d.previous.to_string(),
                    d.current.to_string(),
                    format!("{:+}", d.delta),
                ]
            })
            .collect();
        print_table(&["CATEGORY", "BEFORE", "AFTER", "DELTA"], rows);
    }

    if !summary.recommendations.is_empty() {
        output::header("Recommendations");
        for rec in &summary.recommendations {
            output::hint(rec);
        }
    }
}

fn detected_layers(layers: &LayerDetection) -> Vec<&'static str> {
    [
        (layers.vanilla_js, "Vanilla JS"),
        (layers.polaris, "Polaris"),
        (layers.extjs, "ExtJS"),
        (layers.design_tokens, "Design tokens"),
    ]
    .into_iter()
    .filter_map(|(found, name)| found.then_some(name))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detected_layer_names_in_fixed_order() {
        let layers = LayerDetection {
            vanilla_js: true,
            extjs: true,
            multi_layer: true,
            ..Default::default()
        };
        assert_eq!(detected_layers(&layers), ["Vanilla JS", "ExtJS"]);
        assert!(detected_layers(&LayerDetection::default()).is_empty());
    }
}
