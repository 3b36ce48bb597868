//! `@UpdateListener(methodName = "...")`: `void f(T oldValue, T newValue)`.

use super::{MethodAttribute, MethodKind};
use crate::compat::is_type_compatible;
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::MethodDescriptor;
use crate::models::MethodStub;
use crate::types::JavaType;

pub const ATTRIBUTES: &[MethodAttribute] = &[MethodAttribute {
    attribute: "methodName",
    display: "listener method",
    kind: MethodKind::Listener,
}];

/// Both parameters must accept the field type. The return type is not checked.
pub fn is_valid_listener(h: &TypeHierarchy, m: &MethodDescriptor, field_ty: &JavaType) -> bool {
    m.parameters.len() == 2 && m.parameters.iter().all(|p| is_type_compatible(h, &p.ty, field_ty))
}

pub fn stub(name: &str, field_ty: &JavaType, field_name: &str) -> MethodStub {
    MethodStub::new("private", JavaType::Void, name)
        .param(field_ty.clone(), "oldValue")
        .param(field_ty.clone(), "newValue")
        .body(&format!("// TODO: Implement {} update listener", field_name))
}
