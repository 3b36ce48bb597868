//! Validation orchestrator and the file-level check runner.
//!
//! [`validate_tree`] runs every enabled check over one source tree and
//! returns the diagnostics sorted. [`run_check`] expands snapshot globs,
//! builds the project-wide type hierarchy, class index and RPC packet index,
//! so supertypes and packets declared in other snapshots resolve, validates
//! files in parallel and aggregates a summary. Snapshots that cannot be
//! loaded become `load-snapshot` errors instead of aborting the run.

use crate::dependency::{self, RuleRegistry};
use crate::error::{Error, Result};
use crate::hierarchy::{TypeDecl, TypeHierarchy};
use crate::lang::{self, LangIndex, LangLookup};
use crate::models::tree::{ClassIndex, ClassLookup, Snapshot, SourceTree};
use crate::models::{CheckResult, Diagnostic, FixDescriptor, Location, Severity, Summary};
use crate::rules::{CheckContext, PacketIndex, RuleKind};
use crate::type_check;
use glob::glob;
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub const LOAD_RULE_ID: &str = "load-snapshot";

/// Rule ids switched off and per-id severity overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleFilter {
    pub disabled: BTreeSet<String>,
    pub severity: BTreeMap<String, Severity>,
}

impl RuleFilter {
    pub fn is_enabled(&self, id: &str) -> bool {
        !self.disabled.contains(id)
    }

    fn apply(&self, diagnostics: &mut Vec<Diagnostic>) {
        diagnostics.retain(|d| self.is_enabled(&d.rule));
        for d in diagnostics.iter_mut() {
            if let Some(sev) = self.severity.get(&d.rule) {
                d.severity = *sev;
            }
        }
    }
}

/// Every rule id the engine can emit, in listing order.
pub fn rule_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = RuleKind::ALL.iter().map(|k| k.id()).collect();
    ids.extend([dependency::RULE_ID, type_check::RULE_ID, lang::RULE_ID, LOAD_RULE_ID]);
    ids
}

/// Shared, read-only inputs for validating any tree of a run.
pub struct EngineContext<'a> {
    /// Project-wide classes; the validated tree alone when absent.
    pub classes: Option<&'a dyn ClassLookup>,
    pub hierarchy: &'a TypeHierarchy,
    pub registry: &'a RuleRegistry,
    pub packets: &'a PacketIndex,
    /// Language files; lang checks are skipped when absent.
    pub lang: Option<&'a dyn LangLookup>,
    pub default_namespace: &'a str,
    pub filter: &'a RuleFilter,
}

/// Run all enabled checks over `tree`. Every element is visited by every
/// check; one finding never hides another.
pub fn validate_tree(tree: &SourceTree, ctx: &EngineContext<'_>) -> Vec<Diagnostic> {
    let kinds: Vec<RuleKind> = RuleKind::ALL
        .into_iter()
        .filter(|k| ctx.filter.is_enabled(k.id()))
        .collect();
    let dependencies = ctx.filter.is_enabled(dependency::RULE_ID);
    let types = ctx.filter.is_enabled(type_check::RULE_ID);
    let lang = ctx.lang.filter(|_| ctx.filter.is_enabled(lang::RULE_ID));

    let classes: &dyn ClassLookup = match ctx.classes {
        Some(classes) => classes,
        None => tree,
    };
    let check = CheckContext {
        tree,
        classes,
        hierarchy: ctx.hierarchy,
        registry: ctx.registry,
        packets: ctx.packets,
    };
    let mut out = Vec::new();
    for class in tree.classes() {
        if dependencies {
            dependency::check_class(&check, class, &mut out);
        }
        for kind in &kinds {
            kind.check_class(&check, class, &mut out);
        }
        for field in &class.fields {
            for kind in &kinds {
                kind.check_field(&check, class, field, &mut out);
            }
            if dependencies {
                dependency::check_field(&check, class, field, &mut out);
            }
            if types {
                type_check::check_field(&check, class, field, &mut out);
            }
            if let Some(lang) = lang {
                lang::check_field(&check, lang, ctx.default_namespace, class, field, &mut out);
            }
        }
        for method in &class.methods {
            for kind in &kinds {
                kind.check_method(&check, class, method, &mut out);
            }
            if dependencies {
                dependency::check_method(&check, class, method, &mut out);
            }
        }
    }
    ctx.filter.apply(&mut out);
    out.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    debug!("engine: {} diagnostics for {}", out.len(), tree.file());
    out
}

/// Inputs of a check run, resolved from CLI and configuration.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub repo_root: PathBuf,
    /// Glob patterns relative to `repo_root`.
    pub snapshots: Vec<String>,
    pub registry: RuleRegistry,
    pub types: BTreeMap<String, TypeDecl>,
    pub lang_roots: Vec<PathBuf>,
    pub default_namespace: String,
    pub filter: RuleFilter,
}

impl CheckSettings {
    pub fn new(repo_root: &Path, snapshots: Vec<String>) -> Self {
        CheckSettings {
            repo_root: repo_root.to_path_buf(),
            snapshots,
            registry: RuleRegistry::builtin(),
            types: BTreeMap::new(),
            lang_roots: Vec::new(),
            default_namespace: lang::DEFAULT_NAMESPACE.to_string(),
            filter: RuleFilter::default(),
        }
    }
}

/// Snapshot files matched by `patterns`, sorted and without duplicates.
pub fn expand_snapshots(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pat in patterns {
        let pattern = root.join(pat).to_string_lossy().to_string();
        let entries = glob(&pattern).map_err(|e| Error::Config(format!("bad snapshot pattern '{}': {}", pat, e)))?;
        paths.extend(entries.flatten().filter(|p| p.is_file()));
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

fn display_path(path: &Path, root: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

fn load_failure(file: String, err: &Error) -> Diagnostic {
    Diagnostic {
        rule: LOAD_RULE_ID.to_string(),
        severity: Severity::Error,
        message: err.to_string(),
        location: Location {
            file,
            ..Location::default()
        },
        fixes: vec![FixDescriptor::NoFixAvailable],
    }
}

/// Trees that loaded, plus one diagnostic per snapshot that did not.
#[derive(Debug, Default)]
pub struct LoadedTrees {
    pub trees: Vec<(PathBuf, SourceTree)>,
    pub failures: Vec<(PathBuf, Diagnostic)>,
}

pub fn load_trees(root: &Path, patterns: &[String]) -> Result<LoadedTrees> {
    let paths = expand_snapshots(root, patterns)?;
    let loaded: Vec<(PathBuf, Result<SourceTree>)> = paths
        .par_iter()
        .map(|path| {
            let label = display_path(path, root);
            let tree = Snapshot::load(path).map(|s| SourceTree::new(s, &label));
            (path.clone(), tree)
        })
        .collect();

    let mut out = LoadedTrees::default();
    for (path, tree) in loaded {
        match tree {
            Ok(tree) => out.trees.push((path, tree)),
            Err(e) => {
                debug!("engine: cannot load {}: {}", path.display(), e);
                let failure = load_failure(display_path(&path, root), &e);
                out.failures.push((path, failure));
            }
        }
    }
    Ok(out)
}

/// Diagnostics of one snapshot file.
#[derive(Debug, Clone)]
pub struct FileCheck {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Default)]
pub struct CheckRun {
    pub files: Vec<FileCheck>,
    pub result: CheckResult,
}

/// Validate every snapshot matched by the settings.
pub fn run_check(settings: &CheckSettings) -> Result<CheckRun> {
    let root = &settings.repo_root;
    let loaded = load_trees(root, &settings.snapshots)?;

    let mut hierarchy = TypeHierarchy::builtin();
    for (name, decl) in &settings.types {
        hierarchy.declare(name, decl);
    }
    for (_, tree) in &loaded.trees {
        hierarchy.add_tree(tree);
    }
    let packets = PacketIndex::from_trees(loaded.trees.iter().map(|(_, t)| t));
    let classes = ClassIndex::from_trees(loaded.trees.iter().map(|(_, t)| t));
    debug!(
        "engine: {} classes, {} rpc packets indexed",
        classes.len(),
        packets.len()
    );

    let lang_index = if settings.lang_roots.is_empty() {
        None
    } else {
        let roots: Vec<PathBuf> = settings.lang_roots.iter().map(|r| root.join(r)).collect();
        Some(LangIndex::load(&roots)?)
    };

    let ctx = EngineContext {
        classes: Some(&classes as &dyn ClassLookup),
        hierarchy: &hierarchy,
        registry: &settings.registry,
        packets: &packets,
        lang: lang_index.as_ref().map(|l| l as &dyn LangLookup),
        default_namespace: &settings.default_namespace,
        filter: &settings.filter,
    };

    let mut files: Vec<FileCheck> = loaded
        .trees
        .par_iter()
        .map(|(path, tree)| FileCheck {
            path: path.clone(),
            diagnostics: validate_tree(tree, &ctx),
        })
        .collect();
    files.extend(loaded.failures.into_iter().map(|(path, d)| FileCheck {
        path,
        diagnostics: vec![d],
    }));
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let mut diagnostics: Vec<Diagnostic> = files.iter().flat_map(|f| f.diagnostics.iter().cloned()).collect();
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    let summary = Summary::from_diagnostics(&diagnostics, files.len());
    Ok(CheckRun {
        files,
        result: CheckResult { diagnostics, summary },
    })
}
