//! Shared check for annotations placed on a method that name a target field
//! through their `field` attribute (`@ConfigSetter`, `@SkipPersistedValue`).
//!
//! Only the first failing condition is reported.

use super::{locate, CheckContext, RuleKind};
use crate::annotations::{CONFIGURABLE, PERSISTED};
use crate::compat::is_loosely_compatible;
use crate::models::tree::{ClassDescriptor, MethodDescriptor};
use crate::models::{Diagnostic, ElementRef, FixDescriptor, Severity};
use crate::types::JavaType;

pub(super) const FIELD_ATTRIBUTE: &str = "field";

pub(super) struct TargetRule {
    pub kind: RuleKind,
    /// Java text of the required return type, used in the message.
    pub returns: &'static str,
    pub return_ok: fn(&JavaType) -> bool,
}

pub(super) fn check(
    ctx: &CheckContext<'_>,
    rule: &TargetRule,
    class: &ClassDescriptor,
    method: &MethodDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    let kind = rule.kind;
    let Some(annotation) = method.annotation(kind.annotation()) else {
        return;
    };
    let Some(field_name) = kind.target_field_name(method) else {
        return;
    };
    let location = locate(
        ctx.tree,
        class,
        Some(method.name.as_str()),
        Some(annotation),
        Some(FIELD_ATTRIBUTE),
        method.position,
    );
    let mut report = |message: String, fix: FixDescriptor| {
        out.push(Diagnostic {
            rule: kind.id().to_string(),
            severity: Severity::Error,
            message,
            location: location.clone(),
            fixes: vec![fix],
        })
    };

    let Some(field) = ctx.classes.find_field_in_hierarchy(class, field_name) else {
        report(
            format!("{} field '{}' not found", kind.display_name(), field_name),
            FixDescriptor::NoFixAvailable,
        );
        return;
    };
    if !field.has_annotation(CONFIGURABLE) && !field.has_annotation(PERSISTED) {
        let fix = match ctx.registry.template_for(CONFIGURABLE) {
            Some(template) => FixDescriptor::AddAnnotation {
                target: ElementRef::field(&field.owner, &field.name),
                template: template.clone(),
            },
            None => FixDescriptor::NoFixAvailable,
        };
        report(
            format!(
                "{} field '{}' is not annotated with @Configurable or @Persisted",
                kind.display_name(),
                field_name
            ),
            fix,
        );
        return;
    }

    let prefix = format!("{} method '{}'", kind.display_name(), method.name);
    let failure = if method.is_static {
        Some((
            format!("{} cannot be static", prefix),
            FixDescriptor::RemoveStaticModifier {
                class: method.owner.clone(),
                method: method.name.clone(),
                parameters: method.parameter_types(),
            },
        ))
    } else if !(rule.return_ok)(&method.return_type) {
        Some((format!("{} must return {}", prefix, rule.returns), FixDescriptor::NoFixAvailable))
    } else if method.arity() != 1 {
        Some((
            format!("{} must have exactly one parameter", prefix),
            FixDescriptor::NoFixAvailable,
        ))
    } else {
        match method.param_type(0) {
            Some(param)
                if field.ty.is_known() && !is_loosely_compatible(ctx.hierarchy, param, &field.ty) =>
            {
                Some((
                    format!("{} parameter type is incompatible with field type", prefix),
                    FixDescriptor::NoFixAvailable,
                ))
            }
            _ => None,
        }
    };
    if let Some((message, fix)) = failure {
        report(message, fix);
    }
}
