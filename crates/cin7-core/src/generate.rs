//! Code generators behind `cin7 generate`.

use std::fmt;
use std::path::{Path, PathBuf};

use minijinja::context;
use serde::Serialize;

use crate::error::{Cin7Error, Result};
use crate::{io, paths, templates};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Component,
    Repository,
    UseCase,
    Migration,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 4] = [
        GeneratorKind::Component,
        GeneratorKind::Repository,
        GeneratorKind::UseCase,
        GeneratorKind::Migration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Component => "component",
            GeneratorKind::Repository => "repository",
            GeneratorKind::UseCase => "usecase",
            GeneratorKind::Migration => "migration",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| Cin7Error::UnknownGenerator(s.to_string()))
    }

    /// Layers this kind can target, in prompt order.
    pub fn layers(&self) -> &'static [&'static str] {
        match self {
            GeneratorKind::Component => &["react", "extjs", "vanilla"],
            GeneratorKind::Repository | GeneratorKind::UseCase => &["typescript-sdk"],
            GeneratorKind::Migration => &["vanilla"],
        }
    }

    /// Pick the target layer. `Ok(None)` means the kind has several layers
    /// and the caller has to ask.
    pub fn resolve_layer(&self, requested: Option<&str>) -> Result<Option<&'static str>> {
        let layers = self.layers();
        match requested {
            Some(layer) => layers
                .iter()
                .copied()
                .find(|l| *l == layer)
                .map(Some)
                .ok_or_else(|| Cin7Error::InvalidLayer {
                    kind: self.as_str().to_string(),
                    layer: layer.to_string(),
                    available: layers.iter().map(|l| l.to_string()).collect(),
                }),
            None if layers.len() == 1 => Ok(Some(layers[0])),
            None => Ok(None),
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub typescript: bool,
    pub test: bool,
    pub style: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            typescript: true,
            test: true,
            style: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    /// Relative to the project root.
    pub path: PathBuf,
    #[serde(skip)]
    pub content: String,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// The files a generator produces for `name` on `layer`.
pub fn plan_files(
    kind: GeneratorKind,
    name: &str,
    layer: &str,
    opts: GenerateOptions,
) -> Result<Vec<GeneratedFile>> {
    paths::validate_identifier(name)?;
    // Revalidates an explicit layer so callers cannot skip `resolve_layer`.
    kind.resolve_layer(Some(layer))?;

    let ext = if opts.typescript { "ts" } else { "js" };
    let jsx_ext = if opts.typescript { "tsx" } else { "jsx" };
    let ctx = context! {
        name => name,
        typescript => opts.typescript,
        style => opts.style,
    };
    let render = |template: &str| templates::render(template, &ctx);

    let mut files = Vec::new();
    let mut push = |path: String, content: String| {
        files.push(GeneratedFile {
            path: PathBuf::from(path),
            content,
        })
    };

    match (kind, layer) {
        (GeneratorKind::Component, "react") => {
            let dir = format!("src/components/{name}");
            push(
                format!("{dir}/{name}.{jsx_ext}"),
                render("generate/react-component")?,
            );
            if opts.style {
                push(
                    format!("{dir}/{name}.module.css"),
                    render("generate/component.css")?,
                );
            }
            if opts.test {
                push(
                    format!("{dir}/{name}.test.{jsx_ext}"),
                    render("generate/react-component.test")?,
                );
            }
            push(format!("{dir}/index.{ext}"), render("generate/index")?);
        }
        (GeneratorKind::Component, "extjs") => {
            push(
                format!("src/components/{name}/{name}.{ext}"),
                render("generate/extjs-component")?,
            );
        }
        (GeneratorKind::Component, _) => {
            let dir = format!("src/components/{name}");
            push(
                format!("{dir}/{name}.{ext}"),
                render("generate/vanilla-component")?,
            );
            if opts.style {
                push(format!("{dir}/{name}.css"), render("generate/component.css")?);
            }
        }
        (GeneratorKind::Repository, _) => {
            push(
                format!("src/repositories/{name}Repository.{ext}"),
                render("generate/repository")?,
            );
            if opts.test {
                push(
                    format!("src/repositories/{name}Repository.test.{ext}"),
                    render("generate/repository.test")?,
                );
            }
        }
        (GeneratorKind::UseCase, _) => {
            push(
                format!("src/usecases/{name}UseCase.{ext}"),
                render("generate/usecase")?,
            );
            if opts.test {
                push(
                    format!("src/usecases/{name}UseCase.test.{ext}"),
                    render("generate/usecase.test")?,
                );
            }
        }
        (GeneratorKind::Migration, _) => {
            push(
                format!("src/migrations/{name}Wrapper.{ext}"),
                render("generate/migration-wrapper")?,
            );
        }
    }
    Ok(files)
}

/// Outcome of writing a generator's files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub created: Vec<PathBuf>,
    /// Files that already existed and were left untouched.
    pub skipped: Vec<PathBuf>,
}

/// Write generated files under `root`, never overwriting.
pub fn write_files(root: &Path, files: &[GeneratedFile]) -> Result<WriteReport> {
    let mut report = WriteReport::default();
    for file in files {
        let target = root.join(&file.path);
        if io::write_if_missing(&target, file.content.as_bytes())? {
            report.created.push(file.path.clone());
        } else {
            tracing::debug!(path = %target.display(), "exists, skipping");
            report.skipped.push(file.path.clone());
        }
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Usage snippets
// ---------------------------------------------------------------------------

/// How to use what was just generated.
pub fn usage(kind: GeneratorKind, name: &str, layer: &str) -> String {
    match (kind, layer) {
        (GeneratorKind::Component, "react") => format!(
            "// Import and use your component:\n\
             import {name} from './components/{name}';\n\n\
             function App() {{\n  \
               return <{name} title=\"My Component\" onAction={{() => console.log('Action!')}} />;\n\
             }}"
        ),
        (GeneratorKind::Component, "extjs") => format!(
            "// Register and use your component:\n\
             import './components/{name}/{name}';\n\n\
             Ext.create('{name}', {{\n  \
               renderTo: 'app',\n  \
               title: 'My Component'\n\
             }});"
        ),
        (GeneratorKind::Component, _) => format!(
            "// Import and use your component:\n\
             import create{name} from './components/{name}/{name}';\n\n\
             const component = create{name}({{\n  \
               container: '#app',\n  \
               title: 'My Component',\n  \
               onAction: () => console.log('Action!')\n\
             }});"
        ),
        (GeneratorKind::Repository, _) => format!(
            "// Import and use your repository:\n\
             import {name}Repository from './repositories/{name}Repository';\n\n\
             const repository = new {name}Repository();\n\
             const items = await repository.findAll({{ page: 1, limit: 10 }});"
        ),
        (GeneratorKind::UseCase, _) => format!(
            "// Import and use your use case:\n\
             import {name}UseCase from './usecases/{name}UseCase';\n\n\
             const useCase = new {name}UseCase();\n\
             const result = await useCase.execute({{ /* request data */ }});"
        ),
        (GeneratorKind::Migration, _) => format!(
            "// Wrap a legacy component behind a stable mount point:\n\
             import mount{name} from './migrations/{name}Wrapper';\n\n\
             const wrapper = mount{name}({{\n  \
               container: '#app',\n  \
               mountLegacy: (host) => legacyRender(host),\n  \
               useModern: false\n\
             }});"
        ),
    }
}
