//! Reverse lookup from methods to the annotations that reference them.
//!
//! Answers "why is this method used" for otherwise unreferenced companions
//! and produces navigation markers (`annocheck markers`).

use crate::models::tree::{
    CallSite, ClassDescriptor, ClassIndex, ClassLookup, FieldDescriptor, MethodDescriptor, SourceTree,
};
use crate::models::{ElementRef, Location};
use crate::rules::{declared_name, rpc, RuleKind};
use serde::Serialize;

/// Field-driven annotation on `field` whose companion attribute names `method`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionUse<'a> {
    pub kind: RuleKind,
    pub field: &'a FieldDescriptor,
    pub attribute: &'static str,
}

/// Fields visible from the method's class that name it as a companion.
pub fn companion_fields<'a>(
    classes: &'a dyn ClassLookup,
    class: &'a ClassDescriptor,
    method: &MethodDescriptor,
) -> Vec<CompanionUse<'a>> {
    let mut out = Vec::new();
    for c in classes.ancestors(class) {
        for field in &c.fields {
            for kind in RuleKind::ALL.into_iter().filter(|k| k.is_field_driven()) {
                let Some(annotation) = kind.annotation_of(field) else {
                    continue;
                };
                for attr in kind.method_attributes() {
                    if declared_name(annotation, attr.attribute) == Some(method.name.as_str()) {
                        out.push(CompanionUse {
                            kind,
                            field,
                            attribute: attr.attribute,
                        });
                    }
                }
            }
        }
    }
    out
}

/// Field targeted by a `@ConfigSetter` / `@SkipPersistedValue` method.
pub fn target_field<'a>(
    classes: &'a dyn ClassLookup,
    class: &'a ClassDescriptor,
    method: &MethodDescriptor,
) -> Option<(RuleKind, &'a FieldDescriptor)> {
    [RuleKind::ConfigSetter, RuleKind::SkipPersistedValue]
        .into_iter()
        .find_map(|kind| {
            let name = kind.target_field_name(method)?;
            classes.find_field_in_hierarchy(class, name).map(|f| (kind, f))
        })
}

/// Methods of `class` carrying `kind` and naming `field`.
pub fn methods_targeting<'a>(
    class: &'a ClassDescriptor,
    kind: RuleKind,
    field: &FieldDescriptor,
) -> Vec<&'a MethodDescriptor> {
    class
        .methods
        .iter()
        .filter(|m| kind.target_field_name(m) == Some(field.name.as_str()))
        .collect()
}

/// Distributor calls across `trees` sending the packet declared by `method`.
pub fn rpc_calls<'a>(trees: &'a [SourceTree], method: &MethodDescriptor) -> Vec<(&'a SourceTree, &'a CallSite)> {
    let Some(id) = rpc::packet_id_of(method) else {
        return Vec::new();
    };
    trees
        .iter()
        .flat_map(|t| t.classes().iter().flat_map(move |c| c.calls.iter().map(move |call| (t, call))))
        .filter(|(_, call)| rpc::call_packet_id(call) == Some(id))
        .collect()
}

/// Whether something other than a direct call keeps `method` alive.
pub fn is_implicitly_used(classes: &dyn ClassLookup, class: &ClassDescriptor, method: &MethodDescriptor) -> bool {
    !companion_fields(classes, class, method).is_empty() || target_field(classes, class, method).is_some()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerTarget {
    pub file: String,
    pub element: ElementRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// A navigation marker attached to a field or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marker {
    pub location: Location,
    pub tooltip: String,
    pub targets: Vec<MarkerTarget>,
}

fn anchor(tree: &SourceTree, class: &ClassDescriptor, member: &str, line: Option<u32>) -> Location {
    Location {
        file: tree.file().to_string(),
        class: class.name.clone(),
        member: Some(member.to_string()),
        line,
        ..Location::default()
    }
}

fn field_target(index: &ClassIndex<'_>, tree: &SourceTree, field: &FieldDescriptor) -> MarkerTarget {
    MarkerTarget {
        file: index.file_of(&field.owner).unwrap_or(tree.file()).to_string(),
        element: ElementRef::field(&field.owner, &field.name),
        line: field.position.map(|p| p.line),
    }
}

fn method_marker(
    trees: &[SourceTree],
    index: &ClassIndex<'_>,
    tree: &SourceTree,
    class: &ClassDescriptor,
    m: &MethodDescriptor,
) -> Option<Marker> {
    let at = anchor(tree, class, &m.name, m.position.map(|p| p.line));
    if let Some(id) = rpc::packet_id_of(m) {
        let calls = rpc_calls(trees, m);
        if !calls.is_empty() {
            return Some(Marker {
                location: at,
                tooltip: format!("Navigate to RPCPacketDistributor calls for: {}", id),
                targets: calls
                    .into_iter()
                    .map(|(t, call)| MarkerTarget {
                        file: t.file().to_string(),
                        element: match &call.caller {
                            Some(caller) => ElementRef::method(&call.owner, caller),
                            None => ElementRef::class(&call.owner),
                        },
                        line: call.position.map(|p| p.line),
                    })
                    .collect(),
            });
        }
    }
    if let Some(first) = companion_fields(index, class, m).into_iter().next() {
        return Some(Marker {
            location: at,
            tooltip: format!(
                "Navigate to {} field: {}",
                first.kind.display_name(),
                first.field.name
            ),
            targets: vec![field_target(index, tree, first.field)],
        });
    }
    if let Some((kind, field)) = target_field(index, class, m) {
        return Some(Marker {
            location: at,
            tooltip: format!("Navigate to field with @{}: {}", kind.display_name(), field.name),
            targets: vec![field_target(index, tree, field)],
        });
    }
    None
}

fn field_marker(tree: &SourceTree, class: &ClassDescriptor, field: &FieldDescriptor) -> Option<Marker> {
    [RuleKind::ConfigSetter, RuleKind::SkipPersistedValue]
        .into_iter()
        .find_map(|kind| {
            let methods = methods_targeting(class, kind, field);
            if methods.is_empty() {
                return None;
            }
            Some(Marker {
                location: anchor(tree, class, &field.name, field.position.map(|p| p.line)),
                tooltip: format!("Navigate to {} methods for field: {}", kind.display_name(), field.name),
                targets: methods
                    .into_iter()
                    .map(|m| MarkerTarget {
                        file: tree.file().to_string(),
                        element: ElementRef::method(&class.name, &m.name),
                        line: m.position.map(|p| p.line),
                    })
                    .collect(),
            })
        })
}

/// Markers for every tree; supertypes and RPC call sites are searched
/// across all of them.
pub fn markers(trees: &[SourceTree]) -> Vec<Marker> {
    let index = ClassIndex::from_trees(trees);
    let mut out = Vec::new();
    for tree in trees {
        for class in tree.classes() {
            out.extend(class.fields.iter().filter_map(|f| field_marker(tree, class, f)));
            out.extend(class.methods.iter().filter_map(|m| method_marker(trees, &index, tree, class, m)));
        }
    }
    out.sort_by(|a, b| {
        (&a.location.file, a.location.line, &a.location.class, &a.location.member).cmp(&(
            &b.location.file,
            b.location.line,
            &b.location.class,
            &b.location.member,
        ))
    });
    out
}
