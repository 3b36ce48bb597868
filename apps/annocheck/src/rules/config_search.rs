//! `@ConfigSearch(searchConfiguratorMethod = "...")`: `ISearchConfigurator f()`.

use super::{MethodAttribute, MethodKind};
use crate::annotations::SEARCH_CONFIGURATOR;
use crate::compat::is_exactly;
use crate::models::tree::MethodDescriptor;
use crate::models::MethodStub;
use crate::types::JavaType;

pub const ATTRIBUTES: &[MethodAttribute] = &[MethodAttribute {
    attribute: "searchConfiguratorMethod",
    display: "search configurator method",
    kind: MethodKind::SearchConfigurator,
}];

/// Exact return type; subclasses of the interface do not count.
pub fn is_valid_search(m: &MethodDescriptor) -> bool {
    m.parameters.is_empty() && is_exactly(&m.return_type, SEARCH_CONFIGURATOR)
}

pub fn stub(name: &str, field_name: &str) -> MethodStub {
    MethodStub::new("private", JavaType::class(SEARCH_CONFIGURATOR), name).body(&format!(
        "// TODO: Implement {} search configurator\nreturn null;",
        field_name
    ))
}
