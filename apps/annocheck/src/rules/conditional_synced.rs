//! `@ConditionalSynced(methodName = "...")`: `boolean f(T value)`.

use super::{MethodAttribute, MethodKind};
use crate::compat::{is_boolean_type, is_type_compatible};
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::MethodDescriptor;
use crate::models::MethodStub;
use crate::types::{JavaType, Primitive};

pub const ATTRIBUTES: &[MethodAttribute] = &[MethodAttribute {
    attribute: "methodName",
    display: "conditional sync method",
    kind: MethodKind::SyncCondition,
}];

pub fn is_valid_condition(h: &TypeHierarchy, m: &MethodDescriptor, field_ty: &JavaType) -> bool {
    is_boolean_type(&m.return_type)
        && m.param_type(0)
            .is_some_and(|p| is_type_compatible(h, p, field_ty))
}

pub fn stub(name: &str, field_ty: &JavaType, field_name: &str) -> MethodStub {
    MethodStub::new("public", JavaType::Primitive(Primitive::Boolean), name)
        .param(field_ty.clone(), "value")
        .body(&format!(
            "// TODO: Implement {} sync condition\nreturn true;",
            field_name
        ))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::RuleKind;
    use crate::annotations::CONDITIONAL_SYNCED;
    use crate::models::tree::{ClassDescriptor, FieldDescriptor, MethodDescriptor, SourceTree};
    use crate::models::FixDescriptor;
    use pretty_assertions::assert_eq;

    fn tree(method: Option<MethodDescriptor>) -> SourceTree {
        let mut class = ClassDescriptor::new("com.acme.Tank").field(
            FieldDescriptor::new("fluid", "com.acme.FluidStack").annotated(annotated(
                CONDITIONAL_SYNCED,
                &[("methodName", "shouldSyncFluid")],
            )),
        );
        class.methods.extend(method);
        SourceTree::from_classes(vec![class])
    }

    #[test]
    fn test_boolean_and_boxed_boolean_returns_are_valid() {
        for ret in ["boolean", "Boolean"] {
            let m = MethodDescriptor::new("shouldSyncFluid", ret, &["com.acme.FluidStack"]);
            assert!(run(&tree(Some(m)), RuleKind::ConditionalSynced).is_empty());
        }
    }

    #[test]
    fn test_void_return_is_incorrect() {
        let m = MethodDescriptor::new("shouldSyncFluid", "void", &["com.acme.FluidStack"]);
        assert_eq!(
            messages(&run(&tree(Some(m)), RuleKind::ConditionalSynced)),
            vec!["ConditionalSynced conditional sync method 'shouldSyncFluid' has incorrect signature"]
        );
    }

    #[test]
    fn test_missing_condition_stub() {
        let diags = run(&tree(None), RuleKind::ConditionalSynced);
        let FixDescriptor::GenerateMethodStub { stub, .. } = &diags[0].fixes[0] else {
            panic!("expected a stub");
        };
        assert_eq!(
            stub.render(),
            "public boolean shouldSyncFluid(FluidStack value) {\n    // TODO: Implement fluid sync condition\n    return true;\n}"
        );
    }
}
