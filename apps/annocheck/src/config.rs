//! Configuration discovery and effective settings resolution.
//!
//! Annocheck reads `annocheck.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `snapshots`: `snapshots/**/*.{json,toml,yaml,yml}`
//! - `output`: `human`
//! - `disabled_rules`, `[severity]`: empty
//! - `[lang] roots`: none (translation checks off)
//! - `[lang] default_namespace`: `examplemod`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::dependency::{AnnotationDependency, RuleRegistry};
use crate::engine::{self, CheckSettings, RuleFilter};
use crate::error::{Error, Result};
use crate::hierarchy::TypeDecl;
use crate::lang::DEFAULT_NAMESPACE;
use crate::models::tree::AttributeValue;
use crate::models::{AnnotationTemplate, Severity, TargetKind};
use crate::types::simple_name;
use log::warn;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILES: [&str; 3] = ["annocheck.toml", "annocheck.yaml", "annocheck.yml"];

pub const DEFAULT_SNAPSHOTS: [&str; 4] = [
    "snapshots/**/*.json",
    "snapshots/**/*.toml",
    "snapshots/**/*.yaml",
    "snapshots/**/*.yml",
];

#[derive(Debug, Default, Deserialize, Clone)]
/// Language file lookup under `[lang]`.
pub struct LangCfg {
    pub roots: Option<Vec<String>>,
    pub default_namespace: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
/// Extra `[[dependencies]]` entry.
pub struct DependencyCfg {
    pub source: String,
    pub required: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[templates.<annotation>]`: annotation inserted by `AddAnnotation` fixes.
pub struct TemplateCfg {
    #[serde(default)]
    pub defaults: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub target: TargetKind,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `annocheck.toml|yaml`.
pub struct AnnocheckConfig {
    pub snapshots: Option<Vec<String>>,
    pub output: Option<String>,
    #[serde(default)]
    pub disabled_rules: Vec<String>,
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,
    pub lang: Option<LangCfg>,
    #[serde(default)]
    pub dependencies: Vec<DependencyCfg>,
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateCfg>,
    #[serde(default)]
    pub types: BTreeMap<String, TypeDecl>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub snapshots: Vec<String>,
    pub output: String,
    pub lang_roots: Vec<PathBuf>,
    pub default_namespace: String,
    pub filter: RuleFilter,
    pub dependencies: Vec<AnnotationDependency>,
    pub templates: Vec<AnnotationTemplate>,
    pub types: BTreeMap<String, TypeDecl>,
}

impl Effective {
    /// Built-in rules extended with the configured dependencies and templates.
    pub fn registry(&self) -> RuleRegistry {
        let mut registry = RuleRegistry::builtin();
        for d in &self.dependencies {
            registry.add_dependency(d.clone());
        }
        for t in &self.templates {
            registry.register_template(t.clone());
        }
        registry
    }

    pub fn check_settings(&self) -> CheckSettings {
        CheckSettings {
            repo_root: self.repo_root.clone(),
            snapshots: self.snapshots.clone(),
            registry: self.registry(),
            types: self.types.clone(),
            lang_roots: self.lang_roots.clone(),
            default_namespace: self.default_namespace.clone(),
            filter: self.filter.clone(),
        }
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when an `annocheck.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|name| cur.join(name).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `AnnocheckConfig` from `annocheck.toml` or `annocheck.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<AnnocheckConfig>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let cfg = if name.ends_with(".toml") {
            toml::from_str(&s).map_err(|e| Error::Config(format!("{}: {}", name, e)))?
        } else {
            serde_yaml::from_str(&s).map_err(|e| Error::Config(format!("{}: {}", name, e)))?
        };
        return Ok(Some(cfg));
    }
    Ok(None)
}

fn known_rule(id: &str, ids: &[&str]) -> bool {
    if !ids.contains(&id) {
        warn!("config: unknown rule id '{}'", id);
        return false;
    }
    true
}

fn dependency_from(cfg: DependencyCfg) -> AnnotationDependency {
    let description = cfg.description.unwrap_or_else(|| {
        let required: Vec<String> = cfg
            .required
            .iter()
            .map(|r| format!("@{}", simple_name(r)))
            .collect();
        format!(
            "Elements with @{} must also be annotated with {}.",
            simple_name(&cfg.source),
            required.join(" or ")
        )
    });
    AnnotationDependency {
        source: cfg.source,
        required: cfg.required,
        description,
        severity: cfg.severity.unwrap_or(Severity::Error),
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
///
/// Empty CLI lists mean "not given".
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_snapshots: &[String],
    cli_output: Option<&str>,
    cli_lang_roots: &[String],
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let snapshots = if !cli_snapshots.is_empty() {
        cli_snapshots.to_vec()
    } else {
        cfg.snapshots
            .unwrap_or_else(|| DEFAULT_SNAPSHOTS.iter().map(|s| s.to_string()).collect())
    };

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(Error::Config(format!("unknown output mode '{}' (human|json)", output)));
    }

    let lang = cfg.lang.unwrap_or_default();
    let lang_roots = if !cli_lang_roots.is_empty() {
        cli_lang_roots.to_vec()
    } else {
        lang.roots.unwrap_or_default()
    };
    let default_namespace = lang
        .default_namespace
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    let ids = engine::rule_ids();
    let filter = RuleFilter {
        disabled: cfg
            .disabled_rules
            .into_iter()
            .filter(|id| known_rule(id, &ids))
            .collect::<BTreeSet<_>>(),
        severity: cfg
            .severity
            .into_iter()
            .filter(|(id, _)| known_rule(id, &ids))
            .collect(),
    };

    let templates = cfg
        .templates
        .into_iter()
        .map(|(name, t)| AnnotationTemplate {
            name,
            defaults: t.defaults,
            target: t.target,
        })
        .collect();

    Ok(Effective {
        repo_root,
        config_found,
        snapshots,
        output,
        lang_roots: lang_roots.into_iter().map(PathBuf::from).collect(),
        default_namespace,
        filter,
        dependencies: cfg.dependencies.into_iter().map(dependency_from).collect(),
        templates,
        types: cfg.types,
    })
}
