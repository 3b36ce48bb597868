//! Type compatibility predicates shared by the rule modules.
//!
//! All functions are total: an unknown or unresolvable type yields `false`
//! (or `None`), never a panic.

use crate::annotations::{COLLECTION, VECTOR4F};
use crate::hierarchy::TypeHierarchy;
use crate::types::{simple_name, JavaType, Primitive, WildcardBound};

/// `a == b`, or `b` assignable to `a`.
pub fn is_type_compatible(h: &TypeHierarchy, a: &JavaType, b: &JavaType) -> bool {
    if !a.is_known() || !b.is_known() {
        return false;
    }
    h.same_type(a, b) || h.is_assignable(a, b)
}

/// Compatible in either direction.
pub fn is_loosely_compatible(h: &TypeHierarchy, a: &JavaType, b: &JavaType) -> bool {
    is_type_compatible(h, a, b) || is_type_compatible(h, b, a)
}

fn is_primitive_or_box(t: &JavaType, p: Primitive) -> bool {
    match t {
        JavaType::Primitive(q) => *q == p,
        JavaType::Class { name, .. } => name == p.boxed_name(),
        _ => false,
    }
}

pub fn is_boolean_type(t: &JavaType) -> bool {
    is_primitive_or_box(t, Primitive::Boolean)
}

pub fn is_int_type(t: &JavaType) -> bool {
    is_primitive_or_box(t, Primitive::Int)
}

pub fn is_string_type(t: &JavaType) -> bool {
    t.class_name() == Some("java.lang.String")
}

pub fn is_enum_type(h: &TypeHierarchy, t: &JavaType) -> bool {
    t.class_name().is_some_and(|n| h.is_enum(n))
}

pub fn is_enum_or_string_type(h: &TypeHierarchy, t: &JavaType) -> bool {
    is_string_type(t) || is_enum_type(h, t)
}

pub fn is_vector4f_type(t: &JavaType) -> bool {
    match t.class_name() {
        Some(n) if n.contains('.') => n == VECTOR4F,
        Some(n) => n == simple_name(VECTOR4F),
        None => false,
    }
}

pub fn is_array_or_collection(h: &TypeHierarchy, t: &JavaType) -> bool {
    match t {
        JavaType::Array(_) => true,
        JavaType::Class { name, .. } => h.is_subclass(name, COLLECTION),
        _ => false,
    }
}

/// Element type of an array, or of a collection with exactly one type
/// argument. `? extends T` yields `T`; other wildcards yield nothing.
pub fn get_element_type(h: &TypeHierarchy, t: &JavaType) -> Option<JavaType> {
    match t {
        JavaType::Array(c) => Some((**c).clone()),
        JavaType::Class { name, args } if args.len() == 1 && h.is_subclass(name, COLLECTION) => {
            match &args[0] {
                JavaType::Wildcard(WildcardBound::Extends(b)) => Some((**b).clone()),
                JavaType::Wildcard(_) => None,
                arg => Some(arg.clone()),
            }
        }
        _ => None,
    }
}

/// Class type that is-a `qualified` (reflexive).
pub fn is_subtype_of(h: &TypeHierarchy, t: &JavaType, qualified: &str) -> bool {
    t.class_name().is_some_and(|n| h.is_subclass(n, qualified))
}

/// Class type whose name is exactly `qualified`.
pub fn is_exactly(t: &JavaType, qualified: &str) -> bool {
    match t.class_name() {
        Some(n) if n.contains('.') => n == qualified,
        Some(n) => n == simple_name(qualified),
        None => false,
    }
}

/// Human-readable rendering used in messages.
pub fn type_description(t: &JavaType) -> String {
    t.presentable_text()
}
