//! Field-shape requirements of configurator annotations.
//!
//! A small table maps an annotation to a predicate over the annotated
//! field's type. Fields whose type could not be read are skipped.

use crate::annotations::{at_simple, CONFIG_COLOR, CONFIG_HDR, CONFIG_LIST, CONFIG_SELECTOR};
use crate::compat::{
    is_array_or_collection, is_enum_or_string_type, is_int_type, is_vector4f_type, type_description,
};
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::{AnnotationInstance, ClassDescriptor, FieldDescriptor};
use crate::models::{Diagnostic, FixDescriptor, Severity};
use crate::rules::{locate, CheckContext};
use crate::types::JavaType;

pub const RULE_ID: &str = "annotation-type";

/// `annotation` requires the field type to satisfy `accepts`.
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub annotation: &'static str,
    pub expected: &'static str,
    pub accepts: fn(&TypeHierarchy, &JavaType) -> bool,
}

pub const BUILTIN_RULES: &[TypeRule] = &[
    TypeRule {
        annotation: CONFIG_COLOR,
        expected: "int or Integer",
        accepts: |_, t| is_int_type(t),
    },
    TypeRule {
        annotation: CONFIG_HDR,
        expected: "Vector4f",
        accepts: |_, t| is_vector4f_type(t),
    },
    TypeRule {
        annotation: CONFIG_LIST,
        expected: "array or Collection",
        accepts: is_array_or_collection,
    },
    TypeRule {
        annotation: CONFIG_SELECTOR,
        expected: "enum or String",
        accepts: is_enum_or_string_type,
    },
];

/// A field whose type does not fit one of its annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeViolation<'a> {
    pub annotation: &'a AnnotationInstance,
    pub field: &'a FieldDescriptor,
    pub expected: &'static str,
    pub actual: String,
}

impl TypeViolation<'_> {
    pub fn message(&self) -> String {
        format!(
            "{} requires {}, but field is {}",
            at_simple(&self.annotation.name),
            self.expected,
            self.actual
        )
    }
}

pub fn field_violations<'a>(
    rules: &[TypeRule],
    h: &TypeHierarchy,
    field: &'a FieldDescriptor,
) -> Vec<TypeViolation<'a>> {
    if !field.ty.is_known() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for annotation in &field.annotations {
        for rule in rules.iter().filter(|r| annotation.is(r.annotation)) {
            if !(rule.accepts)(h, &field.ty) {
                out.push(TypeViolation {
                    annotation,
                    field,
                    expected: rule.expected,
                    actual: type_description(&field.ty),
                });
            }
        }
    }
    out
}

pub fn check_field(
    ctx: &CheckContext<'_>,
    class: &ClassDescriptor,
    field: &FieldDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    for v in field_violations(ctx.registry.type_rules(), ctx.hierarchy, field) {
        out.push(Diagnostic {
            rule: RULE_ID.to_string(),
            severity: Severity::Warning,
            message: v.message(),
            location: locate(
                ctx.tree,
                class,
                Some(field.name.as_str()),
                Some(v.annotation),
                None,
                field.position,
            ),
            fixes: vec![FixDescriptor::NoFixAvailable],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::TypeDecl;
    use crate::models::tree::SourceTree;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn violations_for(ty: &str, annotation: &str) -> Vec<String> {
        let mut extras = BTreeMap::new();
        extras.insert(
            "com.acme.Mode".to_string(),
            TypeDecl {
                supertypes: vec![],
                is_enum: true,
            },
        );
        let h = TypeHierarchy::for_tree(&SourceTree::from_classes(vec![]), &extras);
        let field = FieldDescriptor::new("f", ty).annotated(AnnotationInstance::new(annotation));
        field_violations(BUILTIN_RULES, &h, &field)
            .iter()
            .map(TypeViolation::message)
            .collect()
    }

    #[test]
    fn test_config_color_on_string() {
        assert_eq!(
            violations_for("String", CONFIG_COLOR),
            vec!["@ConfigColor requires int or Integer, but field is String"]
        );
        assert!(violations_for("int", CONFIG_COLOR).is_empty());
        assert!(violations_for("Integer", CONFIG_COLOR).is_empty());
    }

    #[test]
    fn test_other_shapes() {
        assert!(violations_for("org.joml.Vector4f", CONFIG_HDR).is_empty());
        assert_eq!(
            violations_for("float[]", CONFIG_HDR),
            vec!["@ConfigHDR requires Vector4f, but field is float[]"]
        );
        assert!(violations_for("java.util.Set<String>", CONFIG_LIST).is_empty());
        assert_eq!(
            violations_for("java.util.Map<String, String>", CONFIG_LIST),
            vec!["@ConfigList requires array or Collection, but field is Map<String, String>"]
        );
        assert!(violations_for("com.acme.Mode", CONFIG_SELECTOR).is_empty());
        assert_eq!(
            violations_for("int", CONFIG_SELECTOR),
            vec!["@ConfigSelector requires enum or String, but field is int"]
        );
    }

    #[test]
    fn test_unreadable_type_is_skipped() {
        assert!(violations_for("List<", CONFIG_COLOR).is_empty());
    }
}
