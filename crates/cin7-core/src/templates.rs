//! Embedded MiniJinja templates for scaffolded projects, generated code and
//! reports.

use crate::error::Result;
use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use std::sync::OnceLock;

mod embedded {
    // Project scaffolding
    pub const VITE_CONFIG: &str = include_str!("../templates/project/vite.config.js.jinja");
    pub const GITIGNORE: &str = include_str!("../templates/project/gitignore.jinja");
    pub const README: &str = include_str!("../templates/project/README.md.jinja");
    pub const CIN7_CONFIG: &str = include_str!("../templates/project/cin7.config.js.jinja");
    pub const INDEX_HTML: &str = include_str!("../templates/project/index.html.jinja");
    pub const MAIN: &str = include_str!("../templates/project/main.jinja");
    pub const MAIN_CSS: &str = include_str!("../templates/project/main.css.jinja");

    // Generators
    pub const REACT_COMPONENT: &str =
        include_str!("../templates/generate/react-component.jinja");
    pub const REACT_COMPONENT_TEST: &str =
        include_str!("../templates/generate/react-component.test.jinja");
    pub const COMPONENT_CSS: &str = include_str!("../templates/generate/component.css.jinja");
    pub const INDEX: &str = include_str!("../templates/generate/index.jinja");
    pub const EXTJS_COMPONENT: &str =
        include_str!("../templates/generate/extjs-component.jinja");
    pub const VANILLA_COMPONENT: &str =
        include_str!("../templates/generate/vanilla-component.jinja");
    pub const REPOSITORY: &str = include_str!("../templates/generate/repository.jinja");
    pub const REPOSITORY_TEST: &str =
        include_str!("../templates/generate/repository.test.jinja");
    pub const USECASE: &str = include_str!("../templates/generate/usecase.jinja");
    pub const USECASE_TEST: &str = include_str!("../templates/generate/usecase.test.jinja");
    pub const MIGRATION_WRAPPER: &str =
        include_str!("../templates/generate/migration-wrapper.jinja");

    // Reports
    pub const MIGRATION_REPORT: &str =
        include_str!("../templates/reports/migration.html.jinja");
}

const TEMPLATES: &[(&str, &str)] = &[
    ("project/vite.config.js", embedded::VITE_CONFIG),
    ("project/gitignore", embedded::GITIGNORE),
    ("project/README.md", embedded::README),
    ("project/cin7.config.js", embedded::CIN7_CONFIG),
    ("project/index.html", embedded::INDEX_HTML),
    ("project/main", embedded::MAIN),
    ("project/main.css", embedded::MAIN_CSS),
    ("generate/react-component", embedded::REACT_COMPONENT),
    ("generate/react-component.test", embedded::REACT_COMPONENT_TEST),
    ("generate/component.css", embedded::COMPONENT_CSS),
    ("generate/index", embedded::INDEX),
    ("generate/extjs-component", embedded::EXTJS_COMPONENT),
    ("generate/vanilla-component", embedded::VANILLA_COMPONENT),
    ("generate/repository", embedded::REPOSITORY),
    ("generate/repository.test", embedded::REPOSITORY_TEST),
    ("generate/usecase", embedded::USECASE),
    ("generate/usecase.test", embedded::USECASE_TEST),
    ("generate/migration-wrapper", embedded::MIGRATION_WRAPPER),
    ("reports/migration.html", embedded::MIGRATION_REPORT),
];

/// Build an environment with every embedded template loaded.
///
/// Source templates are emitted verbatim; only report templates are HTML
/// escaped.
pub fn engine() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|name| {
        if name.starts_with("reports/") {
            AutoEscape::Html
        } else {
            AutoEscape::None
        }
    });
    env.add_filter("kebab_case", kebab_case);

    for &(name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

static ENGINE: OnceLock<Environment<'static>> = OnceLock::new();

/// The process-wide environment, built on first use.
fn shared_engine() -> Result<&'static Environment<'static>> {
    if let Some(env) = ENGINE.get() {
        return Ok(env);
    }
    let env = engine()?;
    Ok(ENGINE.get_or_init(|| env))
}

/// Render one embedded template.
pub fn render<S: Serialize>(name: &str, ctx: S) -> Result<String> {
    let template = shared_engine()?.get_template(name)?;
    Ok(template.render(ctx)?)
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// `ProductCard` -> `product-card`. Runs of capitals stay together:
/// `HTTPClient` -> `http-client`.
pub fn kebab_case(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                out.push('-');
            }
        }
        if c == '_' || c == ' ' {
            out.push('-');
        } else {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}
