//! Lighthouse runs and report interpretation for `cin7 analyze`.
//!
//! The audit itself is delegated to the `lighthouse` CLI through `npx`. This
//! module builds its arguments, reads back the JSON result (LHR) and derives
//! the summary, layer detection, comparison and recommendations shown to the
//! user.

use std::fmt;
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Cin7Error, Result};
use crate::process::CommandSpec;

pub const DEFAULT_CATEGORIES: &[&str] = &["performance", "accessibility", "best-practices", "seo"];

/// Ports probed, in order, when no URL is given.
pub const PROBE_PORTS: &[u16] = &[3000, 5173, 8080, 4200, 3001];

const PROBE_TIMEOUT: Duration = Duration::from_millis(250);

const KEY_METRICS: &[(&str, &str)] = &[
    ("first-contentful-paint", "First Contentful Paint"),
    ("largest-contentful-paint", "Largest Contentful Paint"),
    ("total-blocking-time", "Total Blocking Time"),
    ("cumulative-layout-shift", "Cumulative Layout Shift"),
    ("speed-index", "Speed Index"),
];

const BYTE_WEIGHT_LIMIT: f64 = 1_000_000.0;
const DOM_SIZE_LIMIT: f64 = 1500.0;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Mobile,
    Desktop,
}

/// Screen emulation settings for a device profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pub mobile: bool,
    pub width: u32,
    pub height: u32,
    pub scale: u32,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Mobile => "mobile",
            Device::Desktop => "desktop",
        }
    }

    pub fn screen(&self) -> Screen {
        match self {
            Device::Mobile => Screen {
                mobile: true,
                width: 375,
                height: 667,
                scale: 2,
            },
            Device::Desktop => Screen {
                mobile: false,
                width: 1350,
                height: 940,
                scale: 1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Html,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Running lighthouse
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LighthouseRun {
    pub url: String,
    pub categories: Vec<String>,
    pub device: Device,
    pub format: ReportFormat,
}

/// What a run produced: the parsed LHR and the report in the requested format.
#[derive(Debug, Clone)]
pub struct LighthouseOutput {
    pub report: Report,
    pub rendered: String,
}

impl LighthouseRun {
    /// Arguments after `npx`. JSON is always requested so the result can be
    /// interpreted; the user's format is added when it differs.
    pub fn args(&self, output_base: &Path) -> Vec<String> {
        let screen = self.device.screen();
        let mut args = vec![
            "--yes".to_string(),
            "lighthouse".to_string(),
            self.url.clone(),
            "--quiet".to_string(),
            "--chrome-flags=--headless --disable-gpu".to_string(),
            "--output=json".to_string(),
        ];
        if self.format != ReportFormat::Json {
            args.push(format!("--output={}", self.format));
        }
        args.extend([
            format!("--output-path={}", output_base.display()),
            format!("--only-categories={}", self.categories.join(",")),
            format!("--form-factor={}", self.device.as_str()),
            format!("--screenEmulation.mobile={}", screen.mobile),
            format!("--screenEmulation.width={}", screen.width),
            format!("--screenEmulation.height={}", screen.height),
            format!("--screenEmulation.deviceScaleFactor={}", screen.scale),
            "--screenEmulation.disabled=false".to_string(),
        ]);
        args
    }

    /// Run lighthouse into a scratch directory and read its outputs back.
    pub fn run(&self, cwd: &Path) -> Result<LighthouseOutput> {
        let scratch = tempfile::tempdir()?;
        let base = if self.format == ReportFormat::Json {
            scratch.path().join("report.json")
        } else {
            scratch.path().join("report")
        };

        CommandSpec::new("npx", cwd)
            .args(self.args(&base))
            .run_quiet()?;

        let json_path = find_output(scratch.path(), "json")?;
        let json_text = std::fs::read_to_string(&json_path)?;
        let report = Report::from_value(serde_json::from_str(&json_text)?)?;
        let rendered = if self.format == ReportFormat::Json {
            json_text
        } else {
            std::fs::read_to_string(find_output(scratch.path(), self.format.as_str())?)?
        };
        Ok(LighthouseOutput { report, rendered })
    }
}

/// Lighthouse names multi-output files `<base>.report.<ext>`; a single
/// output lands exactly on the requested path. Either way there is one file
/// per extension in the scratch directory.
fn find_output(dir: &Path, ext: &str) -> Result<PathBuf> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some(ext) {
            return Ok(path);
        }
    }
    Err(Cin7Error::MalformedReport(format!(
        "lighthouse produced no .{ext} output"
    )))
}

/// First local dev server answering on one of `ports`.
pub fn detect_local_server(ports: &[u16]) -> Option<String> {
    ports.iter().copied().find_map(|port| {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match TcpStream::connect_timeout(&addr, PROBE_TIMEOUT) {
            Ok(_) => Some(format!("http://localhost:{port}")),
            Err(e) => {
                tracing::debug!(port, error = %e, "no server");
                None
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Report interpretation
// ---------------------------------------------------------------------------

/// A Lighthouse result. Only `categories` and `audits` are read.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    lhr: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Good,
    Average,
    Poor,
}

impl Rating {
    /// Rating for a 0-100 score.
    pub fn from_score(score: u32) -> Self {
        if score >= 90 {
            Rating::Good
        } else if score >= 50 {
            Rating::Average
        } else {
            Rating::Poor
        }
    }

    /// Rating for a raw 0.0-1.0 audit score.
    pub fn from_fraction(score: f64) -> Self {
        if score >= 0.9 {
            Rating::Good
        } else if score >= 0.5 {
            Rating::Average
        } else {
            Rating::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub key: String,
    pub title: String,
    pub score: u32,
    pub rating: Rating,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub key: &'static str,
    pub name: &'static str,
    pub display: String,
    pub rating: Option<Rating>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerDetection {
    pub vanilla_js: bool,
    pub polaris: bool,
    pub extjs: bool,
    pub design_tokens: bool,
    pub multi_layer: bool,
    /// Polaris is loaded and images are not responsive.
    pub polaris_image_hint: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreDelta {
    pub key: String,
    pub title: String,
    pub current: u32,
    pub previous: u32,
    pub delta: i64,
}

/// Everything `cin7 analyze` reports about one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub categories: Vec<CategoryScore>,
    pub metrics: Vec<Metric>,
    pub layers: LayerDetection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<Vec<ScoreDelta>>,
    pub recommendations: Vec<String>,
}

impl Report {
    /// Accept a bare LHR or a saved runner result of the form `{ "lhr": ... }`.
    pub fn from_value(value: Value) -> Result<Self> {
        let lhr = match value {
            Value::Object(mut map) if map.contains_key("lhr") => {
                map.remove("lhr").unwrap_or(Value::Null)
            }
            other => other,
        };
        if !lhr.get("categories").is_some_and(Value::is_object) {
            return Err(Cin7Error::MalformedReport("missing `categories`".into()));
        }
        Ok(Self { lhr })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&text)?)
    }

    fn audit(&self, key: &str) -> Option<&Value> {
        self.lhr.get("audits").and_then(|a| a.get(key))
    }

    fn audit_score(&self, key: &str) -> Option<f64> {
        self.audit(key).and_then(|a| a.get("score")).and_then(Value::as_f64)
    }

    fn audit_numeric(&self, key: &str) -> Option<f64> {
        self.audit(key)
            .and_then(|a| a.get("numericValue"))
            .and_then(Value::as_f64)
    }

    fn raw_category_score(&self, key: &str) -> Option<f64> {
        self.lhr
            .get("categories")
            .and_then(|c| c.get(key))
            .and_then(|c| c.get("score"))
            .and_then(Value::as_f64)
    }

    /// Category scores in report order, rounded to 0-100. A null score
    /// counts as zero.
    pub fn category_scores(&self) -> Vec<CategoryScore> {
        let Some(categories) = self.lhr.get("categories").and_then(Value::as_object) else {
            return Vec::new();
        };
        categories
            .iter()
            .map(|(key, cat)| {
                let score = to_percent(cat.get("score").and_then(Value::as_f64));
                CategoryScore {
                    key: key.clone(),
                    title: cat
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or(key)
                        .to_string(),
                    score,
                    rating: Rating::from_score(score),
                }
            })
            .collect()
    }

    /// The key web vitals that are present in the report.
    pub fn key_metrics(&self) -> Vec<Metric> {
        KEY_METRICS
            .iter()
            .filter_map(|&(key, name)| {
                let audit = self.audit(key)?;
                let score = audit.get("score").and_then(Value::as_f64);
                let display = audit
                    .get("displayValue")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| score.map(|s| s.to_string()))
                    .unwrap_or_else(|| "n/a".to_string());
                Some(Metric {
                    key,
                    name,
                    display,
                    rating: score.map(Rating::from_fraction),
                })
            })
            .collect()
    }

    /// Which cin7 packages the page loaded, from `network-requests` URLs.
    pub fn detect_layers(&self) -> LayerDetection {
        let mut found = LayerDetection::default();
        let items = self
            .audit("network-requests")
            .and_then(|a| a.pointer("/details/items"))
            .and_then(Value::as_array);
        for item in items.into_iter().flatten() {
            let Some(url) = item.get("url").and_then(Value::as_str) else {
                continue;
            };
            found.vanilla_js |= url.contains("@cin7/vanilla-js");
            found.polaris |= url.contains("@cin7/polaris-adapter");
            found.extjs |= url.contains("@cin7/extjs-adapters");
            found.design_tokens |= url.contains("@cin7/design-tokens");
        }
        let count = [found.vanilla_js, found.polaris, found.extjs, found.design_tokens]
            .iter()
            .filter(|&&hit| hit)
            .count();
        found.multi_layer = count >= 2;
        found.polaris_image_hint = found.polaris
            && self
                .audit_score("uses-responsive-images")
                .is_some_and(|s| s < 0.9);
        found
    }

    /// Score change per current category against `previous`. Categories the
    /// previous report lacks compare against zero.
    pub fn compare(&self, previous: &Report) -> Vec<ScoreDelta> {
        self.category_scores()
            .into_iter()
            .map(|cat| {
                let prev = to_percent(previous.raw_category_score(&cat.key));
                ScoreDelta {
                    delta: i64::from(cat.score) - i64::from(prev),
                    key: cat.key,
                    title: cat.title,
                    current: cat.score,
                    previous: prev,
                }
            })
            .collect()
    }

    pub fn recommendations(&self) -> Vec<String> {
        let mut recs = Vec::new();

        let performance = self.raw_category_score("performance");
        if performance.is_some_and(|s| s < 0.9) {
            let failing = |key: &str| self.audit_score(key).is_some_and(|s| s < 1.0);
            if failing("uses-text-compression") {
                recs.push("Enable text compression (gzip/brotli) on your server".to_string());
            }
            if failing("uses-responsive-images") {
                recs.push(
                    "Optimize images with responsive sizing and modern formats".to_string(),
                );
            }
            if failing("render-blocking-resources") {
                recs.push("Eliminate render-blocking resources".to_string());
            }
        }

        if self
            .audit_numeric("total-byte-weight")
            .is_some_and(|b| b > BYTE_WEIGHT_LIMIT)
        {
            recs.push(
                "Consider using @cin7/vanilla-js for lightweight interactions instead of heavy frameworks"
                    .to_string(),
            );
        }
        if self
            .audit_numeric("dom-size")
            .is_some_and(|n| n > DOM_SIZE_LIMIT)
        {
            recs.push(
                "Large DOM detected - consider using ExtJS virtual scrolling for data tables"
                    .to_string(),
            );
        }
        recs
    }

    pub fn summarize(&self, previous: Option<&Report>) -> Summary {
        Summary {
            categories: self.category_scores(),
            metrics: self.key_metrics(),
            layers: self.detect_layers(),
            comparison: previous.map(|p| self.compare(p)),
            recommendations: self.recommendations(),
        }
    }
}

fn to_percent(score: Option<f64>) -> u32 {
    (score.unwrap_or(0.0).clamp(0.0, 1.0) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "categories": {
                "performance": { "title": "Performance", "score": 0.72 },
                "accessibility": { "title": "Accessibility", "score": 0.95 },
                "seo": { "title": "SEO", "score": 0.3 }
            },
            "audits": {
                "first-contentful-paint": { "score": 0.95, "displayValue": "0.8 s" },
                "largest-contentful-paint": { "score": 0.4, "displayValue": "4.1 s" },
                "cumulative-layout-shift": { "score": 1, "displayValue": "0" },
                "uses-text-compression": { "score": 0 },
                "uses-responsive-images": { "score": 0.5 },
                "render-blocking-resources": { "score": 1 },
                "total-byte-weight": { "numericValue": 2_400_000.0 },
                "dom-size": { "numericValue": 900.0 },
                "network-requests": {
                    "details": {
                        "items": [
                            { "url": "https://cdn.example.com/@cin7/polaris-adapter/index.js" },
                            { "url": "https://cdn.example.com/@cin7/vanilla-js/index.js" },
                            { "url": "https://example.com/app.js" }
                        ]
                    }
                }
            }
        })
    }

    #[test]
    fn category_scores_round_and_rate() {
        let report = Report::from_value(sample()).unwrap();
        let scores = report.category_scores();
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[0].key, "performance");
        assert_eq!(scores[0].score, 72);
        assert_eq!(scores[0].rating, Rating::Average);
        assert_eq!(scores[1].rating, Rating::Good);
        assert_eq!(scores[2].rating, Rating::Poor);
    }

    #[test]
    fn runner_wrapper_is_unwrapped() {
        let wrapped = json!({ "lhr": sample(), "report": "<html>" });
        let report = Report::from_value(wrapped).unwrap();
        assert_eq!(report.category_scores()[1].title, "Accessibility");
    }

    #[test]
    fn malformed_reports_are_rejected() {
        assert!(matches!(
            Report::from_value(json!({ "audits": {} })),
            Err(Cin7Error::MalformedReport(_))
        ));
    }

    #[test]
    fn key_metrics_skip_missing_audits() {
        let report = Report::from_value(sample()).unwrap();
        let metrics = report.key_metrics();
        let keys: Vec<&str> = metrics.iter().map(|m| m.key).collect();
        assert_eq!(
            keys,
            [
                "first-contentful-paint",
                "largest-contentful-paint",
                "cumulative-layout-shift"
            ]
        );
        assert_eq!(metrics[1].display, "4.1 s");
        assert_eq!(metrics[1].rating, Some(Rating::Poor));
    }

    #[test]
    fn layers_detected_from_network_requests() {
        let report = Report::from_value(sample()).unwrap();
        let layers = report.detect_layers();
        assert!(layers.polaris);
        assert!(layers.vanilla_js);
        assert!(!layers.extjs);
        assert!(!layers.design_tokens);
        assert!(layers.multi_layer);
        assert!(layers.polaris_image_hint);
    }

    #[test]
    fn single_layer_is_not_multi_layer() {
        let report = Report::from_value(json!({
            "categories": {},
            "audits": { "network-requests": { "details": { "items": [
                { "url": "/node_modules/@cin7/design-tokens/tokens.css" }
            ] } } }
        }))
        .unwrap();
        let layers = report.detect_layers();
        assert!(layers.design_tokens);
        assert!(!layers.multi_layer);
    }

    #[test]
    fn comparison_reports_deltas() {
        let current = Report::from_value(sample()).unwrap();
        let previous = Report::from_value(json!({
            "categories": {
                "performance": { "title": "Performance", "score": 0.8 },
                "accessibility": { "title": "Accessibility", "score": 0.95 }
            }
        }))
        .unwrap();
        let deltas = current.compare(&previous);
        assert_eq!(deltas[0].delta, -8);
        assert_eq!(deltas[1].delta, 0);
        assert_eq!(deltas[2].previous, 0);
        assert_eq!(deltas[2].delta, 30);
    }

    #[test]
    fn recommendations_follow_failing_audits() {
        let report = Report::from_value(sample()).unwrap();
        let recs = report.recommendations();
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("text compression"));
        assert!(recs[1].contains("responsive sizing"));
        assert!(recs[2].contains("@cin7/vanilla-js"));
    }

    #[test]
    fn fast_pages_skip_performance_recommendations() {
        let report = Report::from_value(json!({
            "categories": { "performance": { "title": "Performance", "score": 0.98 } },
            "audits": {
                "uses-text-compression": { "score": 0 },
                "dom-size": { "numericValue": 2000.0 }
            }
        }))
        .unwrap();
        let recs = report.recommendations();
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("Large DOM"));
    }

    #[test]
    fn args_include_emulation_and_both_outputs() {
        let run = LighthouseRun {
            url: "http://localhost:3000".into(),
            categories: vec!["performance".into(), "seo".into()],
            device: Device::Mobile,
            format: ReportFormat::Html,
        };
        let args = run.args(Path::new("/tmp/report"));
        assert_eq!(args[1], "lighthouse");
        assert_eq!(args[2], "http://localhost:3000");
        for expected in [
            "--output=json",
            "--output=html",
            "--only-categories=performance,seo",
            "--form-factor=mobile",
            "--screenEmulation.width=375",
            "--screenEmulation.height=667",
            "--screenEmulation.deviceScaleFactor=2",
            "--screenEmulation.mobile=true",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {expected}");
        }
    }

    #[test]
    fn json_format_requests_a_single_output() {
        let run = LighthouseRun {
            url: "https://example.com".into(),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            device: Device::Desktop,
            format: ReportFormat::Json,
        };
        let args = run.args(Path::new("/tmp/report.json"));
        assert_eq!(args.iter().filter(|a| a.starts_with("--output=")).count(), 1);
        assert!(args.iter().any(|a| a == "--screenEmulation.width=1350"));
    }

    #[test]
    fn probing_finds_listening_server() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        assert_eq!(
            detect_local_server(&[port]),
            Some(format!("http://localhost:{port}"))
        );
        drop(listener);
        assert_eq!(detect_local_server(&[]), None);
    }
}
