//! Per-annotation rule modules.
//!
//! Each supported annotation is a [`RuleKind`] variant mapped to plain
//! functions; there is no trait object per rule. Field-driven kinds name
//! companion methods through string attributes and share
//! [`check_companions`]. `ConfigSetter` and `SkipPersistedValue` sit on a
//! method and name a target field. `RPCPacket` cross-checks call sites.

pub mod conditional_synced;
pub mod config_list;
pub mod config_search;
pub mod config_selector;
pub mod config_setter;
pub mod read_only_managed;
pub mod rpc;
pub mod skip_persisted_value;
mod target_field;
pub mod update_listener;

use crate::annotations;
use crate::compat::get_element_type;
use crate::dependency::RuleRegistry;
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::{
    AnnotationInstance, ClassDescriptor, ClassLookup, FieldDescriptor, MethodDescriptor, Position,
    SourceTree,
};
use crate::models::{Diagnostic, FixDescriptor, Location, MethodStub, Severity};
use crate::types::{JavaType, Primitive};
use log::debug;
use serde::Serialize;

pub use rpc::PacketIndex;

/// Read-only inputs shared by every rule while one tree is validated.
pub struct CheckContext<'a> {
    pub tree: &'a SourceTree,
    /// Resolves supertypes; may span more trees than `tree`.
    pub classes: &'a dyn ClassLookup,
    pub hierarchy: &'a TypeHierarchy,
    pub registry: &'a RuleRegistry,
    pub packets: &'a PacketIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RuleKind {
    UpdateListener,
    ConditionalSynced,
    ReadOnlyManaged,
    ConfigSetter,
    ConfigList,
    ConfigSelector,
    ConfigSearch,
    SkipPersistedValue,
    RpcPacket,
}

/// Role of a companion method; selects its signature rule and stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MethodKind {
    Listener,
    SyncCondition,
    OnDirty,
    Serialize,
    Deserialize,
    Configurator,
    AddDefault,
    SubConfiguratorBuilder,
    SearchConfigurator,
}

/// Companion attribute metadata: which annotation attribute names the
/// method, how it is called in messages, and which shape it must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodAttribute {
    pub attribute: &'static str,
    pub display: &'static str,
    pub kind: MethodKind,
}

impl RuleKind {
    pub const ALL: [RuleKind; 9] = [
        RuleKind::UpdateListener,
        RuleKind::ConditionalSynced,
        RuleKind::ReadOnlyManaged,
        RuleKind::ConfigSetter,
        RuleKind::ConfigList,
        RuleKind::ConfigSelector,
        RuleKind::ConfigSearch,
        RuleKind::SkipPersistedValue,
        RuleKind::RpcPacket,
    ];

    /// Stable id used in diagnostics, `disabled_rules` and `[severity]`.
    pub fn id(self) -> &'static str {
        match self {
            RuleKind::UpdateListener => "update-listener",
            RuleKind::ConditionalSynced => "conditional-synced",
            RuleKind::ReadOnlyManaged => "read-only-managed",
            RuleKind::ConfigSetter => "config-setter",
            RuleKind::ConfigList => "config-list",
            RuleKind::ConfigSelector => "config-selector",
            RuleKind::ConfigSearch => "config-search",
            RuleKind::SkipPersistedValue => "skip-persisted-value",
            RuleKind::RpcPacket => "rpc-packet",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RuleKind::UpdateListener => "UpdateListener",
            RuleKind::ConditionalSynced => "ConditionalSynced",
            RuleKind::ReadOnlyManaged => "ReadOnlyManaged",
            RuleKind::ConfigSetter => "ConfigSetter",
            RuleKind::ConfigList => "ConfigList",
            RuleKind::ConfigSelector => "ConfigSelector",
            RuleKind::ConfigSearch => "ConfigSearch",
            RuleKind::SkipPersistedValue => "SkipPersistedValue",
            RuleKind::RpcPacket => "RPCPacket",
        }
    }

    pub fn annotation(self) -> &'static str {
        match self {
            RuleKind::UpdateListener => annotations::UPDATE_LISTENER,
            RuleKind::ConditionalSynced => annotations::CONDITIONAL_SYNCED,
            RuleKind::ReadOnlyManaged => annotations::READ_ONLY_MANAGED,
            RuleKind::ConfigSetter => annotations::CONFIG_SETTER,
            RuleKind::ConfigList => annotations::CONFIG_LIST,
            RuleKind::ConfigSelector => annotations::CONFIG_SELECTOR,
            RuleKind::ConfigSearch => annotations::CONFIG_SEARCH,
            RuleKind::SkipPersistedValue => annotations::SKIP_PERSISTED_VALUE,
            RuleKind::RpcPacket => annotations::RPC_PACKET,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RuleKind::UpdateListener => "listener method named by @UpdateListener(methodName)",
            RuleKind::ConditionalSynced => "sync condition named by @ConditionalSynced(methodName)",
            RuleKind::ReadOnlyManaged => "onDirty/serialize/deserialize methods of @ReadOnlyManaged",
            RuleKind::ConfigSetter => "@ConfigSetter method and its target field",
            RuleKind::ConfigList => "configurator and add-default methods of @ConfigList",
            RuleKind::ConfigSelector => "sub configurator builder of @ConfigSelector",
            RuleKind::ConfigSearch => "search configurator of @ConfigSearch",
            RuleKind::SkipPersistedValue => "@SkipPersistedValue method and its target field",
            RuleKind::RpcPacket => "rpcTo* call arguments against the @RPCPacket method",
        }
    }

    pub fn from_id(id: &str) -> Option<RuleKind> {
        RuleKind::ALL.into_iter().find(|k| k.id() == id)
    }

    /// Companion attributes read from a field annotation. Empty for the
    /// method-driven kinds and for RPC.
    pub fn method_attributes(self) -> &'static [MethodAttribute] {
        match self {
            RuleKind::UpdateListener => update_listener::ATTRIBUTES,
            RuleKind::ConditionalSynced => conditional_synced::ATTRIBUTES,
            RuleKind::ReadOnlyManaged => read_only_managed::ATTRIBUTES,
            RuleKind::ConfigList => config_list::ATTRIBUTES,
            RuleKind::ConfigSelector => config_selector::ATTRIBUTES,
            RuleKind::ConfigSearch => config_search::ATTRIBUTES,
            RuleKind::ConfigSetter | RuleKind::SkipPersistedValue | RuleKind::RpcPacket => &[],
        }
    }

    pub fn is_field_driven(self) -> bool {
        !self.method_attributes().is_empty()
    }

    pub fn is_annotated_field(self, field: &FieldDescriptor) -> bool {
        self.is_field_driven() && field.has_annotation(self.annotation())
    }

    pub fn annotation_of(self, field: &FieldDescriptor) -> Option<&AnnotationInstance> {
        field.annotation(self.annotation())
    }

    /// Type the companion signatures are checked against: the field type,
    /// or the element type for `ConfigList`. `None` means the field shape
    /// is unsupported and there is nothing to validate.
    pub fn subject_type(self, h: &TypeHierarchy, field: &FieldDescriptor) -> Option<JavaType> {
        match self {
            RuleKind::ConfigList => get_element_type(h, &field.ty),
            _ if field.ty.is_known() => Some(field.ty.clone()),
            _ => None,
        }
    }

    /// Field named by a method-driven annotation (`field = "..."`) on `method`.
    pub fn target_field_name(self, method: &MethodDescriptor) -> Option<&str> {
        match self {
            RuleKind::ConfigSetter | RuleKind::SkipPersistedValue => {
                declared_name(method.annotation(self.annotation())?, target_field::FIELD_ATTRIBUTE)
            }
            _ => None,
        }
    }

    pub fn check_field(
        self,
        ctx: &CheckContext<'_>,
        class: &ClassDescriptor,
        field: &FieldDescriptor,
        out: &mut Vec<Diagnostic>,
    ) {
        if self.is_annotated_field(field) {
            check_companions(ctx, self, class, field, out);
        }
    }

    pub fn check_method(
        self,
        ctx: &CheckContext<'_>,
        class: &ClassDescriptor,
        method: &MethodDescriptor,
        out: &mut Vec<Diagnostic>,
    ) {
        match self {
            RuleKind::ConfigSetter => config_setter::check(ctx, class, method, out),
            RuleKind::SkipPersistedValue => skip_persisted_value::check(ctx, class, method, out),
            _ => {}
        }
    }

    pub fn check_class(self, ctx: &CheckContext<'_>, class: &ClassDescriptor, out: &mut Vec<Diagnostic>) {
        if self == RuleKind::RpcPacket {
            rpc::check(ctx, class, out);
        }
    }
}

/// Literal string value of `attribute`; `None` when absent, blank or not a literal.
pub fn declared_name<'a>(annotation: &'a AnnotationInstance, attribute: &str) -> Option<&'a str> {
    annotation.string_literal(attribute)
}

impl MethodKind {
    /// Parameter count of a well-formed companion; drives the static-priority rule.
    pub fn expected_arity(self) -> usize {
        match self {
            MethodKind::OnDirty | MethodKind::AddDefault | MethodKind::SearchConfigurator => 0,
            MethodKind::SyncCondition | MethodKind::Serialize | MethodKind::Deserialize => 1,
            MethodKind::Listener | MethodKind::Configurator | MethodKind::SubConfiguratorBuilder => 2,
        }
    }

    /// Non-static and matching the shape for `subject`.
    pub fn is_valid(self, h: &TypeHierarchy, m: &MethodDescriptor, subject: &JavaType) -> bool {
        if m.is_static || m.arity() != self.expected_arity() {
            return false;
        }
        match self {
            MethodKind::Listener => update_listener::is_valid_listener(h, m, subject),
            MethodKind::SyncCondition => conditional_synced::is_valid_condition(h, m, subject),
            MethodKind::OnDirty => read_only_managed::is_valid_on_dirty(m),
            MethodKind::Serialize => read_only_managed::is_valid_serialize(h, m, subject),
            MethodKind::Deserialize => read_only_managed::is_valid_deserialize(h, m, subject),
            MethodKind::Configurator => config_list::is_valid_configurator(h, m, subject),
            MethodKind::AddDefault => config_list::is_valid_add_default(h, m, subject),
            MethodKind::SubConfiguratorBuilder => config_selector::is_valid_builder(h, m, subject),
            MethodKind::SearchConfigurator => config_search::is_valid_search(m),
        }
    }

    pub fn stub(self, name: &str, subject: &JavaType, field_name: &str) -> MethodStub {
        match self {
            MethodKind::Listener => update_listener::stub(name, subject, field_name),
            MethodKind::SyncCondition => conditional_synced::stub(name, subject, field_name),
            MethodKind::OnDirty => read_only_managed::on_dirty_stub(name, field_name),
            MethodKind::Serialize => read_only_managed::serialize_stub(name, subject, field_name),
            MethodKind::Deserialize => read_only_managed::deserialize_stub(name, subject, field_name),
            MethodKind::Configurator => config_list::configurator_stub(name, subject, field_name),
            MethodKind::AddDefault => config_list::add_default_stub(name, subject, field_name),
            MethodKind::SubConfiguratorBuilder => config_selector::stub(name, subject, field_name),
            MethodKind::SearchConfigurator => config_search::stub(name, field_name),
        }
    }
}

/// Classification of one companion lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome<'a> {
    Valid,
    Missing,
    StaticOnly(&'a MethodDescriptor),
    IncorrectSignature,
}

/// Classify the methods named `name` visible from `class`.
pub fn classify<'a>(
    ctx: &CheckContext<'a>,
    class: &'a ClassDescriptor,
    name: &str,
    kind: MethodKind,
    subject: &JavaType,
) -> Outcome<'a> {
    let candidates = ctx.classes.find_methods_by_name(class, name);
    if candidates.iter().any(|m| kind.is_valid(ctx.hierarchy, m, subject)) {
        return Outcome::Valid;
    }
    if let Some(m) = candidates
        .iter()
        .copied()
        .find(|m| m.is_static && m.arity() == kind.expected_arity())
    {
        return Outcome::StaticOnly(m);
    }
    if candidates.is_empty() {
        Outcome::Missing
    } else {
        Outcome::IncorrectSignature
    }
}

/// Shared field-driven algorithm: one diagnostic at most per companion attribute.
pub fn check_companions(
    ctx: &CheckContext<'_>,
    kind: RuleKind,
    class: &ClassDescriptor,
    field: &FieldDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    let Some(annotation) = kind.annotation_of(field) else {
        return;
    };
    let Some(subject) = kind.subject_type(ctx.hierarchy, field) else {
        debug!(
            "{}: skipping {}.{} (unsupported field type {})",
            kind.id(),
            class.name,
            field.name,
            field.ty
        );
        return;
    };
    for attr in kind.method_attributes() {
        let Some(name) = declared_name(annotation, attr.attribute) else {
            continue;
        };
        let prefix = format!("{} {} '{}'", kind.display_name(), attr.display, name);
        let (message, fix) = match classify(ctx, class, name, attr.kind, &subject) {
            Outcome::Valid => continue,
            Outcome::StaticOnly(m) => (
                format!("{} cannot be static", prefix),
                FixDescriptor::RemoveStaticModifier {
                    class: m.owner.clone(),
                    method: m.name.clone(),
                    parameters: m.parameter_types(),
                },
            ),
            Outcome::IncorrectSignature => (
                format!("{} has incorrect signature", prefix),
                FixDescriptor::NoFixAvailable,
            ),
            Outcome::Missing => (
                format!("{} not found", prefix),
                FixDescriptor::GenerateMethodStub {
                    class: class.name.clone(),
                    stub: attr.kind.stub(name, &subject, &field.name),
                },
            ),
        };
        out.push(Diagnostic {
            rule: kind.id().to_string(),
            severity: Severity::Error,
            message,
            location: locate(
                ctx.tree,
                class,
                Some(field.name.as_str()),
                Some(annotation),
                Some(attr.attribute),
                field.position,
            ),
            fixes: vec![fix],
        });
    }
}

/// Build a location, preferring the annotation position over the element's.
pub(crate) fn locate(
    tree: &SourceTree,
    class: &ClassDescriptor,
    member: Option<&str>,
    annotation: Option<&AnnotationInstance>,
    attribute: Option<&str>,
    element: Option<Position>,
) -> Location {
    let pos = annotation
        .and_then(|a| a.position)
        .or(element)
        .or(class.position);
    Location {
        file: tree.file().to_string(),
        class: class.name.clone(),
        member: member.map(str::to_string),
        annotation: annotation.map(|a| annotations::at_simple(&a.name)),
        attribute: attribute.map(str::to_string),
        line: pos.map(|p| p.line),
        column: pos.map(|p| p.column),
    }
}

/// Primitive type arguments are boxed (`Supplier<Integer>`, not `Supplier<int>`).
pub(crate) fn boxed(t: &JavaType) -> JavaType {
    match t {
        JavaType::Primitive(p) => JavaType::class(p.boxed_name()),
        other => other.clone(),
    }
}

/// `return <default>;` for a stub returning `t`.
pub(crate) fn default_return(t: &JavaType) -> &'static str {
    match t {
        JavaType::Primitive(Primitive::Boolean) => "return false;",
        JavaType::Primitive(Primitive::Char) => "return '\\0';",
        JavaType::Primitive(_) => "return 0;",
        JavaType::Void => "",
        _ => "return null;",
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixture helpers shared by the rule tests.

    use super::*;
    use crate::dependency::default_registry;
    use crate::models::tree::AttributeValue;
    use std::collections::BTreeMap;

    pub fn run(tree: &SourceTree, kind: RuleKind) -> Vec<Diagnostic> {
        let hierarchy = TypeHierarchy::for_tree(tree, &BTreeMap::new());
        let packets = PacketIndex::from_trees([tree]);
        let ctx = CheckContext {
            tree,
            classes: tree,
            hierarchy: &hierarchy,
            registry: default_registry(),
            packets: &packets,
        };
        let mut out = Vec::new();
        for class in tree.classes() {
            for f in &class.fields {
                kind.check_field(&ctx, class, f, &mut out);
            }
            for m in &class.methods {
                kind.check_method(&ctx, class, m, &mut out);
            }
            kind.check_class(&ctx, class, &mut out);
        }
        out
    }

    pub fn annotated(name: &str, attrs: &[(&str, &str)]) -> AnnotationInstance {
        let mut a = AnnotationInstance::new(name);
        for (k, v) in attrs {
            a.attributes
                .insert(k.to_string(), AttributeValue::Str(v.to_string()));
        }
        a
    }

    pub fn messages(diags: &[Diagnostic]) -> Vec<String> {
        diags.iter().map(|d| d.message.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::annotations::UPDATE_LISTENER;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rule_ids_round_trip() {
        for kind in RuleKind::ALL {
            assert_eq!(RuleKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(RuleKind::from_id("nope"), None);
    }

    #[test]
    fn test_blank_or_non_literal_attribute_is_skipped() {
        let mut expr = AnnotationInstance::new(UPDATE_LISTENER);
        expr.attributes.insert(
            "methodName".into(),
            crate::models::tree::AttributeValue::Expr {
                expr: "NAMES.LISTENER".into(),
            },
        );
        let tree = SourceTree::from_classes(vec![ClassDescriptor::new("a.Machine")
            .field(FieldDescriptor::new("a", "int").annotated(annotated(UPDATE_LISTENER, &[("methodName", "  ")])))
            .field(FieldDescriptor::new("b", "int").annotated(expr))
            .field(FieldDescriptor::new("c", "int").annotated(annotated(UPDATE_LISTENER, &[])))]);
        assert!(run(&tree, RuleKind::UpdateListener).is_empty());
    }

    #[test]
    fn test_missing_companion_reported_once_per_attribute() {
        let tree = SourceTree::from_classes(vec![ClassDescriptor::new("a.Machine")
            .field(FieldDescriptor::new("color", "int").annotated(annotated(
                UPDATE_LISTENER,
                &[("methodName", "onColorChanged")],
            )))
            .method(MethodDescriptor::new("unrelated", "void", &[]))]);
        let diags = run(&tree, RuleKind::UpdateListener);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(
            diags[0].message,
            "UpdateListener listener method 'onColorChanged' not found"
        );
        assert_eq!(diags[0].location.attribute.as_deref(), Some("methodName"));
        assert_eq!(diags[0].location.annotation.as_deref(), Some("@UpdateListener"));
    }

    #[test]
    fn test_static_priority_over_incorrect_signature() {
        let tree = SourceTree::from_classes(vec![ClassDescriptor::new("a.Machine")
            .field(FieldDescriptor::new("color", "int").annotated(annotated(
                UPDATE_LISTENER,
                &[("methodName", "onColorChanged")],
            )))
            .method(MethodDescriptor::new("onColorChanged", "void", &["int"]))
            .method(MethodDescriptor::new("onColorChanged", "void", &["String", "String"]).make_static())]);
        let diags = run(&tree, RuleKind::UpdateListener);
        assert_eq!(messages(&diags), vec!["UpdateListener listener method 'onColorChanged' cannot be static"]);
        assert_eq!(
            diags[0].fixes,
            vec![FixDescriptor::RemoveStaticModifier {
                class: "a.Machine".into(),
                method: "onColorChanged".into(),
                parameters: vec![JavaType::parse("String"), JavaType::parse("String")],
            }]
        );
    }

    #[test]
    fn test_companion_found_in_superclass() {
        let tree = SourceTree::from_classes(vec![
            ClassDescriptor::new("a.Base").method(MethodDescriptor::new("onColorChanged", "void", &["int", "int"])),
            ClassDescriptor::new("a.Machine").extends("a.Base").field(
                FieldDescriptor::new("color", "int").annotated(annotated(
                    UPDATE_LISTENER,
                    &[("methodName", "onColorChanged")],
                )),
            ),
        ]);
        assert!(run(&tree, RuleKind::UpdateListener).is_empty());
    }

    #[test]
    fn test_default_return_and_boxing() {
        assert_eq!(default_return(&JavaType::parse("boolean")), "return false;");
        assert_eq!(default_return(&JavaType::parse("int")), "return 0;");
        assert_eq!(default_return(&JavaType::parse("String")), "return null;");
        assert_eq!(boxed(&JavaType::parse("int")), JavaType::class("java.lang.Integer"));
    }
}
