//! `@ConfigSetter(field = "...")` on `void f(T value)`.

use super::target_field::{self, TargetRule};
use super::{CheckContext, RuleKind};
use crate::models::tree::{ClassDescriptor, MethodDescriptor};
use crate::models::Diagnostic;
use crate::types::JavaType;

const RULE: TargetRule = TargetRule {
    kind: RuleKind::ConfigSetter,
    returns: "void",
    return_ok: JavaType::is_void,
};

pub fn check(
    ctx: &CheckContext<'_>,
    class: &ClassDescriptor,
    method: &MethodDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    target_field::check(ctx, &RULE, class, method, out);
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::RuleKind;
    use crate::annotations::{CONFIGURABLE, CONFIG_SETTER, PERSISTED};
    use crate::models::tree::{AnnotationInstance, ClassDescriptor, FieldDescriptor, MethodDescriptor, SourceTree};
    use crate::models::{ElementRef, FixDescriptor};
    use pretty_assertions::assert_eq;

    fn setter(params: &[&str]) -> MethodDescriptor {
        MethodDescriptor::new("setSpeed", "void", params)
            .annotated(annotated(CONFIG_SETTER, &[("field", "speed")]))
    }

    fn tree(field: FieldDescriptor, method: MethodDescriptor) -> SourceTree {
        SourceTree::from_classes(vec![ClassDescriptor::new("com.acme.Fan").field(field).method(method)])
    }

    fn speed() -> FieldDescriptor {
        FieldDescriptor::new("speed", "float").annotated(AnnotationInstance::new(CONFIGURABLE))
    }

    #[test]
    fn test_valid_setter_accepts_either_direction() {
        assert!(run(&tree(speed(), setter(&["float"])), RuleKind::ConfigSetter).is_empty());
        assert!(run(&tree(speed(), setter(&["double"])), RuleKind::ConfigSetter).is_empty());
        assert!(run(&tree(speed(), setter(&["int"])), RuleKind::ConfigSetter).is_empty());
        let persisted = FieldDescriptor::new("speed", "float").annotated(AnnotationInstance::new(PERSISTED));
        assert!(run(&tree(persisted, setter(&["Float"])), RuleKind::ConfigSetter).is_empty());
    }

    #[test]
    fn test_target_field_found_in_superclass() {
        let tree = SourceTree::from_classes(vec![
            ClassDescriptor::new("com.acme.Base").field(speed()),
            ClassDescriptor::new("com.acme.Fan")
                .extends("com.acme.Base")
                .method(setter(&["float"])),
        ]);
        assert!(run(&tree, RuleKind::ConfigSetter).is_empty());
    }

    #[test]
    fn test_missing_field_has_no_fix() {
        let diags = run(
            &tree(FieldDescriptor::new("other", "int"), setter(&["float"])),
            RuleKind::ConfigSetter,
        );
        assert_eq!(messages(&diags), vec!["ConfigSetter field 'speed' not found"]);
        assert_eq!(diags[0].fixes, vec![FixDescriptor::NoFixAvailable]);
        assert_eq!(diags[0].location.member.as_deref(), Some("setSpeed"));
    }

    #[test]
    fn test_unmarked_field_offers_configurable() {
        let diags = run(
            &tree(FieldDescriptor::new("speed", "float"), setter(&["float"])),
            RuleKind::ConfigSetter,
        );
        assert_eq!(
            messages(&diags),
            vec!["ConfigSetter field 'speed' is not annotated with @Configurable or @Persisted"]
        );
        match &diags[0].fixes[..] {
            [FixDescriptor::AddAnnotation { target, template }] => {
                assert_eq!(target, &ElementRef::field("com.acme.Fan", "speed"));
                assert_eq!(template.render(), "@Configurable(name = \"\")");
            }
            other => panic!("unexpected fixes: {:?}", other),
        }
    }

    #[test]
    fn test_shape_failures_in_order() {
        let cases = [
            (setter(&["float"]).make_static(), "ConfigSetter method 'setSpeed' cannot be static"),
            (
                MethodDescriptor::new("setSpeed", "boolean", &["float"])
                    .annotated(annotated(CONFIG_SETTER, &[("field", "speed")])),
                "ConfigSetter method 'setSpeed' must return void",
            ),
            (setter(&[]), "ConfigSetter method 'setSpeed' must have exactly one parameter"),
            (
                setter(&["String"]),
                "ConfigSetter method 'setSpeed' parameter type is incompatible with field type",
            ),
        ];
        for (method, expected) in cases {
            let diags = run(&tree(speed(), method), RuleKind::ConfigSetter);
            assert_eq!(messages(&diags), vec![expected]);
        }
    }

    #[test]
    fn test_blank_field_attribute_is_ignored() {
        let m = MethodDescriptor::new("setSpeed", "void", &["float"])
            .annotated(annotated(CONFIG_SETTER, &[("field", "")]));
        assert!(run(&tree(speed(), m), RuleKind::ConfigSetter).is_empty());
    }
}
