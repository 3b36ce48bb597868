//! Annotation dependency registry and checker.
//!
//! A dependency says "an element carrying `source` must also carry one of
//! `required`". Fields and methods also satisfy it through their containing
//! class; classes only through themselves. The registry additionally holds
//! the annotation templates used by `AddAnnotation` fixes and the field type
//! table consumed by [`crate::type_check`].
//!
//! The registry is assembled once (built-ins plus configuration) and shared
//! read-only; [`default_registry`] is the built-in instance.

use crate::annotations::{
    at_simple, CONDITIONAL_SYNCED, CONFIGURABLE, CONFIG_COLOR, CONFIG_HDR, CONFIG_LIST,
    CONFIG_NUMBER, CONFIG_SELECTOR, DEFAULT_VALUE, DESC_SYNCED, REQUIRE_RERENDER, UPDATE_LISTENER,
};
use crate::models::tree::{
    AnnotationInstance, AttributeValue, ClassDescriptor, FieldDescriptor, MethodDescriptor,
    Position,
};
use crate::models::{AnnotationTemplate, Diagnostic, ElementRef, FixDescriptor, Severity, TargetKind};
use crate::rules::{locate, CheckContext};
use crate::type_check::{TypeRule, BUILTIN_RULES};
use crate::types::simple_name;
use log::debug;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const RULE_ID: &str = "annotation-dependency";

/// `source` requires any one of `required` (OR semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationDependency {
    pub source: String,
    pub required: Vec<String>,
    pub description: String,
    pub severity: Severity,
}

/// An unsatisfied dependency on one element.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyViolation<'a> {
    pub dependency: &'a AnnotationDependency,
    pub missing: Vec<String>,
    pub target: ElementRef,
    pub source: &'a AnnotationInstance,
}

impl DependencyViolation<'_> {
    pub fn message(&self) -> String {
        let mut message = self.dependency.description.trim_end().to_string();
        if !message.ends_with('.') {
            message.push('.');
        }
        match &self.missing[..] {
            [one] => message.push_str(&format!(" Missing: {}", at_simple(one))),
            many => {
                let names: Vec<String> = many.iter().map(|m| at_simple(m)).collect();
                message.push_str(&format!(" Missing one of: {}", names.join(", ")));
            }
        }
        message
    }
}

/// Qualified names match exactly; an unqualified name on either side
/// matches by simple name.
pub fn names_match(a: &str, b: &str) -> bool {
    a == b || ((!a.contains('.') || !b.contains('.')) && simple_name(a) == simple_name(b))
}

#[derive(Debug, Clone)]
pub struct RuleRegistry {
    dependencies: Vec<AnnotationDependency>,
    templates: BTreeMap<String, AnnotationTemplate>,
    type_rules: Vec<TypeRule>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        RuleRegistry {
            dependencies: Vec::new(),
            templates: BTreeMap::new(),
            type_rules: BUILTIN_RULES.to_vec(),
        }
    }
}

impl RuleRegistry {
    /// Built-in dependencies and templates of the framework.
    pub fn builtin() -> Self {
        let mut r = RuleRegistry::default();
        for source in [
            CONFIG_LIST,
            CONFIG_COLOR,
            CONFIG_HDR,
            CONFIG_NUMBER,
            CONFIG_SELECTOR,
            DEFAULT_VALUE,
        ] {
            r.register(
                source,
                &[CONFIGURABLE],
                &format!("Fields with {} must also be annotated with @Configurable.", at_simple(source)),
                Severity::Error,
            );
        }
        for source in [UPDATE_LISTENER, CONDITIONAL_SYNCED, REQUIRE_RERENDER] {
            r.register(
                source,
                &[DESC_SYNCED],
                &format!("Fields with {} must also have @DescSynced.", at_simple(source)),
                Severity::Error,
            );
        }

        let mut defaults = BTreeMap::new();
        defaults.insert("name".to_string(), AttributeValue::Str(String::new()));
        r.register_template(AnnotationTemplate {
            name: CONFIGURABLE.to_string(),
            defaults,
            target: TargetKind::Field,
        });
        r.register_template(AnnotationTemplate {
            name: DESC_SYNCED.to_string(),
            defaults: BTreeMap::new(),
            target: TargetKind::Field,
        });
        r
    }

    pub fn register(&mut self, source: &str, required: &[&str], description: &str, severity: Severity) {
        self.add_dependency(AnnotationDependency {
            source: source.to_string(),
            required: required.iter().map(|s| s.to_string()).collect(),
            description: description.to_string(),
            severity,
        });
    }

    /// Exact duplicates are ignored.
    pub fn add_dependency(&mut self, dependency: AnnotationDependency) {
        if self.dependencies.contains(&dependency) {
            debug!("dependency: ignoring duplicate rule for {}", dependency.source);
            return;
        }
        self.dependencies.push(dependency);
    }

    /// Replaces any template registered under the same name.
    pub fn register_template(&mut self, template: AnnotationTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    pub fn lookup<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a AnnotationDependency> + 'a {
        self.dependencies
            .iter()
            .filter(move |d| names_match(&d.source, source))
    }

    pub fn template_for(&self, name: &str) -> Option<&AnnotationTemplate> {
        self.templates
            .get(name)
            .or_else(|| self.templates.values().find(|t| names_match(&t.name, name)))
    }

    pub fn dependencies(&self) -> &[AnnotationDependency] {
        &self.dependencies
    }

    pub fn templates(&self) -> impl Iterator<Item = &AnnotationTemplate> {
        self.templates.values()
    }

    pub fn type_rules(&self) -> &[TypeRule] {
        &self.type_rules
    }
}

static DEFAULT_REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();

/// Shared built-in registry, created on first use.
pub fn default_registry() -> &'static RuleRegistry {
    DEFAULT_REGISTRY.get_or_init(RuleRegistry::builtin)
}

fn has(annotations: &[AnnotationInstance], name: &str) -> bool {
    annotations.iter().any(|a| names_match(&a.name, name))
}

/// Unsatisfied dependencies of one element. `inherited` holds the annotations
/// of the containing class for fields and methods.
pub fn violations<'a>(
    registry: &'a RuleRegistry,
    target: &ElementRef,
    annotations: &'a [AnnotationInstance],
    inherited: &[AnnotationInstance],
) -> Vec<DependencyViolation<'a>> {
    let mut out = Vec::new();
    for source in annotations {
        for dependency in registry.lookup(&source.name) {
            let satisfied = dependency
                .required
                .iter()
                .any(|r| has(annotations, r) || has(inherited, r));
            if !satisfied {
                out.push(DependencyViolation {
                    dependency,
                    missing: dependency.required.clone(),
                    target: target.clone(),
                    source,
                });
            }
        }
    }
    out
}

fn report(
    ctx: &CheckContext<'_>,
    class: &ClassDescriptor,
    member: Option<&str>,
    position: Option<Position>,
    found: Vec<DependencyViolation<'_>>,
    out: &mut Vec<Diagnostic>,
) {
    for v in found {
        let mut fixes: Vec<FixDescriptor> = v
            .missing
            .iter()
            .filter_map(|m| ctx.registry.template_for(m))
            .map(|template| FixDescriptor::AddAnnotation {
                target: v.target.clone(),
                template: template.clone(),
            })
            .collect();
        if fixes.is_empty() {
            fixes.push(FixDescriptor::NoFixAvailable);
        }
        out.push(Diagnostic {
            rule: RULE_ID.to_string(),
            severity: v.dependency.severity,
            message: v.message(),
            location: locate(ctx.tree, class, member, Some(v.source), None, position),
            fixes,
        });
    }
}

pub fn check_class(ctx: &CheckContext<'_>, class: &ClassDescriptor, out: &mut Vec<Diagnostic>) {
    let target = ElementRef::class(&class.name);
    let found = violations(ctx.registry, &target, &class.annotations, &[]);
    report(ctx, class, None, class.position, found, out);
}

pub fn check_field(
    ctx: &CheckContext<'_>,
    class: &ClassDescriptor,
    field: &FieldDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    let target = ElementRef::field(&class.name, &field.name);
    let found = violations(ctx.registry, &target, &field.annotations, &class.annotations);
    report(ctx, class, Some(field.name.as_str()), field.position, found, out);
}

pub fn check_method(
    ctx: &CheckContext<'_>,
    class: &ClassDescriptor,
    method: &MethodDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    let target = ElementRef::method(&class.name, &method.name);
    let found = violations(ctx.registry, &target, &method.annotations, &class.annotations);
    report(ctx, class, Some(method.name.as_str()), method.position, found, out);
}
