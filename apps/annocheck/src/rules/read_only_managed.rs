//! `@ReadOnlyManaged`: three companions around a field the sync layer cannot
//! handle by itself.
//!
//! * `onDirtyMethod`: `boolean f()`
//! * `serializeMethod`: `Tag f(T value)`, any `Tag` subclass as return
//! * `deserializeMethod`: `T f(Tag tag)`, any `Tag` subclass as parameter

use super::{default_return, MethodAttribute, MethodKind};
use crate::annotations::TAG;
use crate::compat::{is_boolean_type, is_subtype_of, is_type_compatible};
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::MethodDescriptor;
use crate::models::MethodStub;
use crate::types::{JavaType, Primitive};

pub const ATTRIBUTES: &[MethodAttribute] = &[
    MethodAttribute {
        attribute: "onDirtyMethod",
        display: "onDirty method",
        kind: MethodKind::OnDirty,
    },
    MethodAttribute {
        attribute: "serializeMethod",
        display: "serialize method",
        kind: MethodKind::Serialize,
    },
    MethodAttribute {
        attribute: "deserializeMethod",
        display: "deserialize method",
        kind: MethodKind::Deserialize,
    },
];

pub fn is_valid_on_dirty(m: &MethodDescriptor) -> bool {
    m.parameters.is_empty() && is_boolean_type(&m.return_type)
}

pub fn is_valid_serialize(h: &TypeHierarchy, m: &MethodDescriptor, field_ty: &JavaType) -> bool {
    m.param_type(0)
        .is_some_and(|p| is_type_compatible(h, p, field_ty))
        && is_subtype_of(h, &m.return_type, TAG)
}

pub fn is_valid_deserialize(h: &TypeHierarchy, m: &MethodDescriptor, field_ty: &JavaType) -> bool {
    m.param_type(0).is_some_and(|p| is_subtype_of(h, p, TAG))
        && is_type_compatible(h, &m.return_type, field_ty)
}

pub fn on_dirty_stub(name: &str, field_name: &str) -> MethodStub {
    MethodStub::new("private", JavaType::Primitive(Primitive::Boolean), name).body(&format!(
        "// TODO: Implement {} dirty state check\nreturn false;",
        field_name
    ))
}

pub fn serialize_stub(name: &str, field_ty: &JavaType, field_name: &str) -> MethodStub {
    MethodStub::new("private", JavaType::class(TAG), name)
        .param(field_ty.clone(), "value")
        .body(&format!(
            "// TODO: Implement {} serialization\nreturn null;",
            field_name
        ))
}

pub fn deserialize_stub(name: &str, field_ty: &JavaType, field_name: &str) -> MethodStub {
    MethodStub::new("private", field_ty.clone(), name)
        .param(JavaType::class(TAG), "tag")
        .body(&format!(
            "// TODO: Implement {} deserialization\n{}",
            field_name,
            default_return(field_ty)
        ))
}
