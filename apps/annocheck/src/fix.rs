//! Applying fix descriptors.
//!
//! Diagnostics only describe fixes. A [`FixApplier`] turns them into edits:
//! [`SnapshotFixer`] edits an owned snapshot (stubs, static flags,
//! annotations) and [`LangFileFixer`] edits language files on disk. The
//! first fix of a diagnostic is the one applied; the others are
//! alternatives offered to a human.

use crate::dependency::names_match;
use crate::error::{Error, Result};
use crate::lang;
use crate::models::tree::{AnnotationInstance, ClassDescriptor, MethodDescriptor, Parameter, Snapshot};
use crate::models::{AnnotationTemplate, Diagnostic, ElementRef, FixDescriptor, MethodStub, TargetKind};
use crate::types::JavaType;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub trait FixApplier {
    /// Apply `fix`; `Ok(false)` when it was already applied or does not
    /// concern this applier.
    fn apply(&mut self, fix: &FixDescriptor) -> Result<bool>;
}

/// Edits classes of one snapshot in place.
#[derive(Debug, Clone)]
pub struct SnapshotFixer {
    snapshot: Snapshot,
}

impl SnapshotFixer {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotFixer { snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    fn class_mut(&mut self, name: &str) -> Option<&mut ClassDescriptor> {
        let found = self.snapshot.classes.iter_mut().find(|c| c.name == name);
        if found.is_none() {
            warn!("fix: class {} is not part of this snapshot", name);
        }
        found
    }

    fn generate_stub(&mut self, class: &str, stub: &MethodStub) -> bool {
        let Some(c) = self.class_mut(class) else {
            return false;
        };
        let method = stub_method(stub);
        let exists = c.methods.iter().any(|m| {
            m.name == method.name
                && m.parameters.len() == method.parameters.len()
                && m.parameters.iter().zip(&method.parameters).all(|(a, b)| a.ty == b.ty)
        });
        if exists {
            return false;
        }
        c.methods.push(method);
        true
    }

    fn remove_static(&mut self, class: &str, method: &str, parameters: &[JavaType]) -> bool {
        let Some(c) = self.class_mut(class) else {
            return false;
        };
        let target = c.methods.iter_mut().find(|m| {
            m.name == method
                && m.is_static
                && m.parameters.len() == parameters.len()
                && m.parameters.iter().zip(parameters).all(|(p, ty)| p.ty == *ty)
        });
        match target {
            Some(m) => {
                m.is_static = false;
                true
            }
            None => false,
        }
    }

    fn add_annotation(&mut self, target: &ElementRef, template: &AnnotationTemplate) -> bool {
        let Some(c) = self.class_mut(&target.class) else {
            return false;
        };
        let member = target.member.as_deref().unwrap_or_default();
        let annotations = match target.kind {
            TargetKind::Class => Some(&mut c.annotations),
            TargetKind::Field => c
                .fields
                .iter_mut()
                .find(|f| f.name == member)
                .map(|f| &mut f.annotations),
            TargetKind::Method => c
                .methods
                .iter_mut()
                .find(|m| m.name == member)
                .map(|m| &mut m.annotations),
        };
        let Some(annotations) = annotations else {
            warn!("fix: {} has no member '{}'", target.class, member);
            return false;
        };
        if annotations.iter().any(|a| names_match(&a.name, &template.name)) {
            return false;
        }
        annotations.push(AnnotationInstance {
            name: template.name.clone(),
            attributes: template.defaults.clone(),
            position: None,
        });
        true
    }
}

/// Method descriptor equivalent to a generated stub.
fn stub_method(stub: &MethodStub) -> MethodDescriptor {
    MethodDescriptor {
        name: stub.name.clone(),
        return_type: stub.return_type.clone(),
        parameters: stub
            .params
            .iter()
            .map(|p| Parameter {
                ty: p.ty.clone(),
                name: Some(p.name.clone()),
            })
            .collect(),
        is_static: false,
        annotations: Vec::new(),
        position: None,
        owner: String::new(),
    }
}

impl FixApplier for SnapshotFixer {
    fn apply(&mut self, fix: &FixDescriptor) -> Result<bool> {
        Ok(match fix {
            FixDescriptor::GenerateMethodStub { class, stub } => self.generate_stub(class, stub),
            FixDescriptor::RemoveStaticModifier {
                class,
                method,
                parameters,
            } => self.remove_static(class, method, parameters),
            FixDescriptor::AddAnnotation { target, template } => self.add_annotation(target, template),
            _ => false,
        })
    }
}

/// Writes missing keys into language files below `root`.
#[derive(Debug, Clone)]
pub struct LangFileFixer {
    root: PathBuf,
}

impl LangFileFixer {
    pub fn new(root: &Path) -> Self {
        LangFileFixer {
            root: root.to_path_buf(),
        }
    }
}

impl FixApplier for LangFileFixer {
    fn apply(&mut self, fix: &FixDescriptor) -> Result<bool> {
        lang::apply_fix(&self.root, fix)
    }
}

fn is_lang_fix(fix: &FixDescriptor) -> bool {
    matches!(fix, FixDescriptor::AddLangKey { .. } | FixDescriptor::CreateLangFile { .. })
}

/// Outcome of fixing one snapshot file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixResult {
    pub file: String,
    /// Titles of the fixes that changed something (or would, in preview).
    pub applied: Vec<String>,
    pub changed: bool,
    pub wrote: bool,
    /// Rewritten snapshot text when not writing.
    pub preview: Option<String>,
}

/// Apply the first fix of every diagnostic to the snapshot at `path`.
/// Language fixes touch the disk only when `write` is set; in preview they
/// are listed but not applied.
pub fn fix_snapshot(path: &Path, root: &Path, diagnostics: &[Diagnostic], write: bool) -> Result<FixResult> {
    let label = pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string();
    let mut result = FixResult {
        file: label,
        ..FixResult::default()
    };
    let mut snapshot = SnapshotFixer::new(Snapshot::load(path)?);
    let mut lang_files = LangFileFixer::new(root);

    for fix in diagnostics.iter().filter_map(|d| d.fixes.first()) {
        let applied = if is_lang_fix(fix) {
            if write {
                lang_files.apply(fix)?
            } else {
                !result.applied.contains(&fix.title())
            }
        } else {
            let changed = snapshot.apply(fix)?;
            result.changed |= changed;
            changed
        };
        if applied {
            debug!("fix: {} in {}", fix.title(), result.file);
            result.applied.push(fix.title());
        }
    }

    if result.changed {
        let text = snapshot.snapshot().render_for(path)?;
        if write {
            fs::write(path, text).map_err(|e| Error::io(path, e))?;
            result.wrote = true;
        } else {
            result.preview = Some(text);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{CONFIG_COLOR, CONFIGURABLE, UPDATE_LISTENER};
    use crate::dependency::default_registry;
    use crate::engine::{validate_tree, EngineContext, RuleFilter};
    use crate::hierarchy::TypeHierarchy;
    use crate::models::tree::{FieldDescriptor, SourceTree};
    use crate::rules::PacketIndex;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn validate(snapshot: &Snapshot) -> Vec<Diagnostic> {
        let tree = SourceTree::new(snapshot.clone(), "Machine.json");
        let hierarchy = TypeHierarchy::for_tree(&tree, &BTreeMap::new());
        let packets = PacketIndex::from_trees([&tree]);
        let filter = RuleFilter::default();
        let ctx = EngineContext {
            classes: None,
            hierarchy: &hierarchy,
            registry: default_registry(),
            packets: &packets,
            lang: None,
            default_namespace: "ldlib",
            filter: &filter,
        };
        validate_tree(&tree, &ctx)
    }

    fn broken() -> Snapshot {
        Snapshot {
            file: None,
            classes: vec![ClassDescriptor::new("com.acme.Machine")
                .field(
                    FieldDescriptor::new("color", "int")
                        .annotated(AnnotationInstance::new(UPDATE_LISTENER).with_str("methodName", "onColorChanged"))
                        .annotated(AnnotationInstance::new(crate::annotations::DESC_SYNCED)),
                )
                .field(FieldDescriptor::new("tint", "int").annotated(AnnotationInstance::new(CONFIG_COLOR)))
                .method(MethodDescriptor::new("helper", "void", &[]).make_static())],
        }
    }

    #[test]
    fn test_applying_first_fixes_clears_diagnostics() {
        let before = validate(&broken());
        assert_eq!(before.len(), 2, "{:?}", before);

        let mut fixer = SnapshotFixer::new(broken());
        for d in &before {
            assert!(fixer.apply(&d.fixes[0]).unwrap());
        }
        let fixed = fixer.into_snapshot();
        assert!(validate(&fixed).is_empty());

        let class = &fixed.classes[0];
        let stub = class.methods.iter().find(|m| m.name == "onColorChanged").unwrap();
        assert_eq!(stub.parameters.len(), 2);
        assert_eq!(stub.parameters[1].name.as_deref(), Some("newValue"));
        assert!(class.fields[1].has_annotation(CONFIGURABLE));
    }

    #[test]
    fn test_fixes_are_idempotent() {
        let fixes: Vec<FixDescriptor> = validate(&broken()).into_iter().map(|d| d.fixes[0].clone()).collect();
        let mut fixer = SnapshotFixer::new(broken());
        for f in &fixes {
            fixer.apply(f).unwrap();
        }
        let once = fixer.snapshot().clone();
        for f in &fixes {
            assert!(!fixer.apply(f).unwrap());
        }
        assert_eq!(fixer.into_snapshot(), once);
    }

    #[test]
    fn test_remove_static_only_touches_named_method() {
        let mut fixer = SnapshotFixer::new(broken());
        let fix = FixDescriptor::RemoveStaticModifier {
            class: "com.acme.Machine".into(),
            method: "helper".into(),
            parameters: Vec::new(),
        };
        assert!(fixer.apply(&fix).unwrap());
        assert!(!fixer.snapshot().classes[0].methods[0].is_static);
        assert!(!fixer.apply(&FixDescriptor::NoFixAvailable).unwrap());
    }

    #[test]
    fn test_remove_static_keeps_other_static_overloads() {
        let snapshot = Snapshot {
            file: None,
            classes: vec![ClassDescriptor::new("com.acme.Machine")
                .field(
                    FieldDescriptor::new("color", "int")
                        .annotated(AnnotationInstance::new(UPDATE_LISTENER).with_str("methodName", "onColorChanged"))
                        .annotated(AnnotationInstance::new(crate::annotations::DESC_SYNCED)),
                )
                .method(MethodDescriptor::new("onColorChanged", "void", &["int", "int"]).make_static())
                .method(MethodDescriptor::new("onColorChanged", "void", &["String"]).make_static())],
        };
        let diags = validate(&snapshot);
        assert_eq!(diags.len(), 1);
        let mut fixer = SnapshotFixer::new(snapshot);
        assert!(fixer.apply(&diags[0].fixes[0]).unwrap());

        let statics: Vec<bool> = fixer.snapshot().classes[0].methods.iter().map(|m| m.is_static).collect();
        assert_eq!(statics, vec![false, true]);
        assert!(validate(fixer.snapshot()).is_empty());
    }

    #[test]
    fn test_fix_snapshot_preview_and_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Machine.json");
        fs::write(&path, serde_json::to_string_pretty(&broken()).unwrap()).unwrap();
        let diags = validate(&broken());

        let preview = fix_snapshot(&path, dir.path(), &diags, false).unwrap();
        assert_eq!(preview.file, "Machine.json");
        assert!(preview.changed);
        assert!(!preview.wrote);
        assert_eq!(preview.applied.len(), 2);
        assert!(preview.preview.as_deref().unwrap_or("").contains("onColorChanged"));
        assert_eq!(Snapshot::load(&path).unwrap(), broken());

        let written = fix_snapshot(&path, dir.path(), &diags, true).unwrap();
        assert!(written.wrote);
        assert!(validate(&Snapshot::load(&path).unwrap()).is_empty());
    }
}
