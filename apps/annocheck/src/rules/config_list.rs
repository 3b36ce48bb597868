//! `@ConfigList` on an array or collection field with element type `E`:
//!
//! * `configuratorMethod`: `Configurator f(Supplier<E> getter, Consumer<E> setter)`
//! * `addDefaultMethod`: `E f()`
//!
//! Fields without a resolvable element type (raw collections, non-collections)
//! are left to the type checker.

use super::{boxed, default_return, MethodAttribute, MethodKind};
use crate::annotations::{CONFIGURATOR, CONSUMER, SUPPLIER};
use crate::compat::{is_exactly, is_subtype_of, is_type_compatible};
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::MethodDescriptor;
use crate::models::MethodStub;
use crate::types::JavaType;

pub const ATTRIBUTES: &[MethodAttribute] = &[
    MethodAttribute {
        attribute: "configuratorMethod",
        display: "configurator method",
        kind: MethodKind::Configurator,
    },
    MethodAttribute {
        attribute: "addDefaultMethod",
        display: "add default method",
        kind: MethodKind::AddDefault,
    },
];

/// `wrapper` is exactly `functional` with a single argument compatible with `element`.
fn is_functional_of(h: &TypeHierarchy, wrapper: &JavaType, functional: &str, element: &JavaType) -> bool {
    if !is_exactly(wrapper, functional) {
        return false;
    }
    match wrapper.type_args() {
        [arg] => is_type_compatible(h, arg, &boxed(element)) || is_type_compatible(h, arg, element),
        _ => false,
    }
}

pub fn is_valid_configurator(h: &TypeHierarchy, m: &MethodDescriptor, element: &JavaType) -> bool {
    let (Some(getter), Some(setter)) = (m.param_type(0), m.param_type(1)) else {
        return false;
    };
    is_subtype_of(h, &m.return_type, CONFIGURATOR)
        && is_functional_of(h, getter, SUPPLIER, element)
        && is_functional_of(h, setter, CONSUMER, element)
}

pub fn is_valid_add_default(h: &TypeHierarchy, m: &MethodDescriptor, element: &JavaType) -> bool {
    m.parameters.is_empty() && is_type_compatible(h, &m.return_type, element)
}

pub fn configurator_stub(name: &str, element: &JavaType, field_name: &str) -> MethodStub {
    let e = boxed(element);
    MethodStub::new("private", JavaType::class(CONFIGURATOR), name)
        .param(JavaType::generic(SUPPLIER, vec![e.clone()]), "getter")
        .param(JavaType::generic(CONSUMER, vec![e]), "setter")
        .body(&format!(
            "// TODO: Implement {} configurator method\nreturn null;",
            field_name
        ))
}

pub fn add_default_stub(name: &str, element: &JavaType, field_name: &str) -> MethodStub {
    MethodStub::new("private", element.clone(), name).body(&format!(
        "// TODO: Implement {} add default method\n{}",
        field_name,
        default_return(element)
    ))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::RuleKind;
    use crate::annotations::CONFIG_LIST;
    use crate::models::tree::{ClassDescriptor, FieldDescriptor, MethodDescriptor, SourceTree};
    use crate::models::FixDescriptor;
    use pretty_assertions::assert_eq;

    fn tree(field_ty: &str, methods: Vec<MethodDescriptor>) -> SourceTree {
        let mut class = ClassDescriptor::new("com.acme.Shelf")
            .field(FieldDescriptor::new("items", field_ty).annotated(annotated(
                CONFIG_LIST,
                &[
                    ("configuratorMethod", "itemConfigurator"),
                    ("addDefaultMethod", "newItem"),
                ],
            )))
            .field(FieldDescriptor::new("unrelated", "int"));
        class.methods = methods;
        SourceTree::from_classes(vec![
            ClassDescriptor::new("com.acme.Item"),
            class,
        ])
    }

    fn configurator(ret: &str, supplier: &str, consumer: &str) -> MethodDescriptor {
        MethodDescriptor::new("itemConfigurator", ret, &[supplier, consumer])
    }

    #[test]
    fn test_static_configurator_reports_cannot_be_static() {
        let diags = run(
            &tree(
                "java.util.List<com.acme.Item>",
                vec![
                    configurator(
                        "com.lowdragmc.lowdraglib2.configurator.ui.Configurator",
                        "java.util.function.Supplier<com.acme.Item>",
                        "java.util.function.Consumer<com.acme.Item>",
                    )
                    .make_static(),
                    MethodDescriptor::new("newItem", "com.acme.Item", &[]),
                ],
            ),
            RuleKind::ConfigList,
        );
        assert_eq!(
            messages(&diags),
            vec!["ConfigList configurator method 'itemConfigurator' cannot be static"]
        );
        assert!(matches!(
            diags[0].fixes[0],
            FixDescriptor::RemoveStaticModifier { .. }
        ));
    }

    #[test]
    fn test_valid_pair_on_array_and_group_return() {
        let diags = run(
            &tree(
                "com.acme.Item[]",
                vec![
                    configurator(
                        "com.lowdragmc.lowdraglib2.configurator.ui.ConfiguratorGroup",
                        "java.util.function.Supplier<com.acme.Item>",
                        "java.util.function.Consumer<com.acme.Item>",
                    ),
                    MethodDescriptor::new("newItem", "com.acme.Item", &[]),
                ],
            ),
            RuleKind::ConfigList,
        );
        assert!(diags.is_empty(), "{:?}", messages(&diags));
    }

    #[test]
    fn test_primitive_elements_accept_boxed_functional_arguments() {
        let diags = run(
            &tree(
                "int[]",
                vec![
                    configurator(
                        "com.lowdragmc.lowdraglib2.configurator.ui.Configurator",
                        "java.util.function.Supplier<Integer>",
                        "java.util.function.Consumer<Integer>",
                    ),
                    MethodDescriptor::new("newItem", "int", &[]),
                ],
            ),
            RuleKind::ConfigList,
        );
        assert!(diags.is_empty(), "{:?}", messages(&diags));
    }

    #[test]
    fn test_wrong_functional_types_are_incorrect() {
        let diags = run(
            &tree(
                "java.util.List<com.acme.Item>",
                vec![
                    configurator(
                        "com.lowdragmc.lowdraglib2.configurator.ui.Configurator",
                        "java.util.function.Supplier<String>",
                        "java.util.function.Consumer<com.acme.Item>",
                    ),
                    MethodDescriptor::new("newItem", "String", &[]),
                ],
            ),
            RuleKind::ConfigList,
        );
        assert_eq!(
            messages(&diags),
            vec![
                "ConfigList configurator method 'itemConfigurator' has incorrect signature",
                "ConfigList add default method 'newItem' has incorrect signature",
            ]
        );
    }

    #[test]
    fn test_missing_stubs_use_element_type() {
        let diags = run(&tree("java.util.ArrayList<com.acme.Item>", vec![]), RuleKind::ConfigList);
        let sigs: Vec<String> = diags
            .iter()
            .filter_map(|d| match &d.fixes[0] {
                FixDescriptor::GenerateMethodStub { stub, .. } => Some(stub.signature()),
                _ => None,
            })
            .collect();
        assert_eq!(
            sigs,
            vec![
                "Configurator itemConfigurator(Supplier<Item> getter, Consumer<Item> setter)",
                "Item newItem()",
            ]
        );
    }

    #[test]
    fn test_raw_collection_and_non_collection_are_skipped() {
        assert!(run(&tree("java.util.List", vec![]), RuleKind::ConfigList).is_empty());
        assert!(run(&tree("String", vec![]), RuleKind::ConfigList).is_empty());
    }
}
