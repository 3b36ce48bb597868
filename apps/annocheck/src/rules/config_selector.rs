//! `@ConfigSelector(subConfiguratorBuilder = "...")`:
//! `void f(T value, ConfiguratorGroup group)`.

use super::{MethodAttribute, MethodKind};
use crate::annotations::CONFIGURATOR_GROUP;
use crate::compat::{is_loosely_compatible, is_subtype_of};
use crate::hierarchy::TypeHierarchy;
use crate::models::tree::MethodDescriptor;
use crate::models::MethodStub;
use crate::types::JavaType;

pub const ATTRIBUTES: &[MethodAttribute] = &[MethodAttribute {
    attribute: "subConfiguratorBuilder",
    display: "sub configurator builder method",
    kind: MethodKind::SubConfiguratorBuilder,
}];

/// The value parameter may be narrower or wider than the field; the group
/// parameter must be a `ConfiguratorGroup`.
pub fn is_valid_builder(h: &TypeHierarchy, m: &MethodDescriptor, field_ty: &JavaType) -> bool {
    let (Some(value), Some(group)) = (m.param_type(0), m.param_type(1)) else {
        return false;
    };
    is_loosely_compatible(h, value, field_ty) && is_subtype_of(h, group, CONFIGURATOR_GROUP)
}

pub fn stub(name: &str, field_ty: &JavaType, field_name: &str) -> MethodStub {
    MethodStub::new("private", JavaType::Void, name)
        .param(field_ty.clone(), "value")
        .param(JavaType::class(CONFIGURATOR_GROUP), "group")
        .body(&format!("// TODO: Build {} sub configurators", field_name))
}
