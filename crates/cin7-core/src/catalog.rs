//! Static tables of installable cin7 packages and project templates.

use crate::error::{Cin7Error, Result};
use serde::Serialize;
use std::collections::HashSet;

/// npm scope shared by every first-party package.
pub const SCOPE: &str = "@cin7/";

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Package {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub peer_dependencies: &'static [&'static str],
}

pub const PACKAGES: &[Package] = &[
    Package {
        key: "vanilla-js",
        name: "@cin7/vanilla-js",
        description: "Lightweight DOM manipulation and event utilities",
        peer_dependencies: &["@cin7/core"],
    },
    Package {
        key: "typescript-sdk",
        name: "@cin7/typescript-sdk",
        description: "Business logic patterns and state management",
        peer_dependencies: &["@cin7/core"],
    },
    Package {
        key: "design-tokens",
        name: "@cin7/design-tokens",
        description: "Extended design system tokens",
        peer_dependencies: &[],
    },
    Package {
        key: "polaris-adapter",
        name: "@cin7/polaris-adapter",
        description: "React components with Polaris integration",
        peer_dependencies: &["@cin7/core", "@cin7/design-tokens", "react", "react-dom"],
    },
    Package {
        key: "extjs-adapters",
        name: "@cin7/extjs-adapters",
        description: "Enterprise ExtJS component adapters",
        peer_dependencies: &["@cin7/core", "@cin7/design-tokens"],
    },
    Package {
        key: "auth",
        name: "@cin7/auth",
        description: "Authentication and authorization utilities",
        peer_dependencies: &["@cin7/core"],
    },
];

pub fn find_package(key: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| p.key == key)
}

/// Usage snippet shown after a package has been added.
pub fn post_install_hint(key: &str) -> Option<(&'static str, [&'static str; 2])> {
    let hint = match key {
        "vanilla-js" => (
            "Vanilla JS utilities",
            [
                r#"import { $, on, ready } from "@cin7/vanilla-js";"#,
                r##"ready(() => $("#app").textContent = "Hello!");"##,
            ],
        ),
        "typescript-sdk" => (
            "TypeScript SDK",
            [
                r#"import { BaseRepository, UseCase } from "@cin7/typescript-sdk";"#,
                "class ProductRepository extends BaseRepository { ... }",
            ],
        ),
        "polaris-adapter" => (
            "Polaris React components",
            [
                r#"import { PolarisProvider, Button } from "@cin7/polaris-adapter";"#,
                "<PolarisProvider><Button>Click me</Button></PolarisProvider>",
            ],
        ),
        "extjs-adapters" => (
            "ExtJS adapters",
            [
                r#"import { createEnterpriseGrid } from "@cin7/extjs-adapters";"#,
                "const grid = createEnterpriseGrid({ ... });",
            ],
        ),
        "design-tokens" => (
            "Design tokens",
            [
                r#"import "@cin7/design-tokens/css";"#,
                "// CSS variables are now available",
            ],
        ),
        _ => return None,
    };
    Some(hint)
}

// ---------------------------------------------------------------------------
// Install planning
// ---------------------------------------------------------------------------

/// Packages to install for a set of selected catalog keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallPlan {
    /// Catalog keys that were selected, in selection order.
    pub selected: Vec<String>,
    /// Selected packages plus their first-party peers.
    pub packages: Vec<String>,
    /// Third-party peers the project does not depend on yet.
    pub missing_peers: Vec<String>,
}

impl InstallPlan {
    /// The deduplicated install list; missing third-party peers are appended
    /// only when `include_peers` is set.
    pub fn install_set(&self, include_peers: bool) -> Vec<String> {
        let mut out = self.packages.clone();
        if include_peers {
            for peer in &self.missing_peers {
                push_unique(&mut out, peer);
            }
        }
        out
    }
}

/// Resolve selected catalog keys against the project's installed packages.
///
/// Every unknown key is reported in a single `UnknownPackages` error.
pub fn resolve_install(selected: &[String], installed: &HashSet<String>) -> Result<InstallPlan> {
    let unknown: Vec<String> = selected
        .iter()
        .filter(|key| find_package(key).is_none())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(Cin7Error::UnknownPackages(unknown));
    }

    let mut plan = InstallPlan::default();
    for key in selected {
        let Some(pkg) = find_package(key) else {
            continue;
        };
        push_unique(&mut plan.selected, key);
        push_unique(&mut plan.packages, pkg.name);
        for peer in pkg.peer_dependencies {
            if peer.starts_with(SCOPE) {
                push_unique(&mut plan.packages, peer);
            } else if !installed.contains(*peer) {
                push_unique(&mut plan.missing_peers, peer);
            }
        }
    }
    tracing::debug!(?plan, "resolved install plan");
    Ok(plan)
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

// ---------------------------------------------------------------------------
// Project templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProjectTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub packages: &'static [&'static str],
}

impl ProjectTemplate {
    /// Layer names recorded in `cin7.config.js`: the package names without scope.
    pub fn layers(&self) -> Vec<String> {
        self.packages
            .iter()
            .map(|p| p.strip_prefix(SCOPE).unwrap_or(p).to_string())
            .collect()
    }
}

pub const DEFAULT_TEMPLATE: &str = "basic";

pub const TEMPLATES: &[ProjectTemplate] = &[
    ProjectTemplate {
        key: "basic",
        name: "Basic",
        description: "Minimal setup with core packages",
        packages: &["@cin7/core", "@cin7/vanilla-js"],
    },
    ProjectTemplate {
        key: "full-stack",
        name: "Full Stack",
        description: "All layers configured",
        packages: &[
            "@cin7/core",
            "@cin7/vanilla-js",
            "@cin7/typescript-sdk",
            "@cin7/design-tokens",
            "@cin7/polaris-adapter",
            "@cin7/extjs-adapters",
        ],
    },
    ProjectTemplate {
        key: "polaris-enhanced",
        name: "Polaris Enhanced",
        description: "Polaris with performance optimizations",
        packages: &[
            "@cin7/core",
            "@cin7/vanilla-js",
            "@cin7/design-tokens",
            "@cin7/polaris-adapter",
        ],
    },
    ProjectTemplate {
        key: "extjs-modern",
        name: "ExtJS Modern",
        description: "Modernized ExtJS application",
        packages: &["@cin7/core", "@cin7/design-tokens", "@cin7/extjs-adapters"],
    },
];

pub fn find_template(key: &str) -> Option<&'static ProjectTemplate> {
    TEMPLATES.iter().find(|t| t.key == key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn vanilla_js_hint_text() {
        let (title, lines) = post_install_hint("vanilla-js").unwrap();
        assert_eq!(title, "Vanilla JS utilities");
        assert_eq!(
            lines,
            [
                "import { $, on, ready } from \"@cin7/vanilla-js\";",
                "ready(() => $(\"#app\").textContent = \"Hello!\");",
            ]
        );
        assert!(post_install_hint("auth").is_none());
    }

    #[test]
    fn polaris_adapter_pulls_in_all_peers() {
        let plan = resolve_install(&keys(&["polaris-adapter"]), &HashSet::new()).unwrap();
        let set = plan.install_set(true);
        for expected in [
            "@cin7/polaris-adapter",
            "@cin7/core",
            "@cin7/design-tokens",
            "react",
            "react-dom",
        ] {
            assert!(set.iter().any(|p| p == expected), "missing {expected}");
        }
        assert_eq!(plan.missing_peers, vec!["react", "react-dom"]);
    }

    #[test]
    fn installed_third_party_peers_are_not_missing() {
        let installed: HashSet<String> = ["react".to_string(), "react-dom".to_string()].into();
        let plan = resolve_install(&keys(&["polaris-adapter"]), &installed).unwrap();
        assert!(plan.missing_peers.is_empty());
        assert!(!plan.install_set(true).iter().any(|p| p == "react"));
    }

    #[test]
    fn declined_peers_stay_out_of_install_set() {
        let plan = resolve_install(&keys(&["polaris-adapter"]), &HashSet::new()).unwrap();
        let set = plan.install_set(false);
        assert!(!set.iter().any(|p| p == "react"));
        assert!(set.iter().any(|p| p == "@cin7/core"));
    }

    #[test]
    fn shared_peers_are_deduplicated() {
        let plan =
            resolve_install(&keys(&["vanilla-js", "auth", "vanilla-js"]), &HashSet::new()).unwrap();
        assert_eq!(
            plan.packages,
            vec!["@cin7/vanilla-js", "@cin7/core", "@cin7/auth"]
        );
        assert_eq!(plan.selected, vec!["vanilla-js", "auth"]);
    }

    #[test]
    fn unknown_packages_are_reported_together() {
        let err = resolve_install(&keys(&["auth", "nope", "also-nope"]), &HashSet::new())
            .unwrap_err();
        match err {
            Cin7Error::UnknownPackages(list) => assert_eq!(list, vec!["nope", "also-nope"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn template_layers_strip_scope() {
        let basic = find_template("basic").unwrap();
        assert_eq!(basic.layers(), vec!["core", "vanilla-js"]);
        assert!(find_template("missing").is_none());
    }

    #[test]
    fn every_catalog_package_except_auth_has_a_hint() {
        for pkg in PACKAGES.iter().filter(|p| p.key != "auth") {
            assert!(post_install_hint(pkg.key).is_some(), "{}", pkg.key);
        }
    }
}
