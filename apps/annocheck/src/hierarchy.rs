//! Class hierarchy used for subtype and assignability questions.
//!
//! The hierarchy is an adjacency map `class -> direct supertypes`, seeded with
//! the JDK and framework types the rules reason about, then extended with the
//! classes of the tree under validation and any `[types]` declared in config.
//! It is built once per tree and read-only afterwards.

use crate::annotations::{
    COLLECTION, CONFIGURATOR, CONFIGURATOR_GROUP, CONSUMER, OBJECT, RPC_SENDER, SEARCH_CONFIGURATOR,
    SUPPLIER, TAG, VECTOR4F,
};
use crate::models::tree::{ClassKind, SourceTree};
use crate::types::{qualify, simple_name, JavaType, Primitive, WildcardBound};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

const ENUM: &str = "java.lang.Enum";

/// Extra type declared in configuration (`[types.<name>]`).
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct TypeDecl {
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default, rename = "enum")]
    pub is_enum: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TypeHierarchy {
    supertypes: HashMap<String, Vec<String>>,
    enums: HashSet<String>,
    simple: HashMap<String, Vec<String>>,
}

impl TypeHierarchy {
    /// Hierarchy containing only the built-in JDK and framework seeds.
    pub fn builtin() -> Self {
        let mut h = TypeHierarchy::default();
        h.add(OBJECT, &[]);

        for boxed in [
            "java.lang.Integer",
            "java.lang.Long",
            "java.lang.Short",
            "java.lang.Byte",
            "java.lang.Float",
            "java.lang.Double",
        ] {
            h.add(boxed, &["java.lang.Number", "java.lang.Comparable"]);
        }
        h.add("java.lang.Number", &[]);
        h.add("java.lang.Boolean", &["java.lang.Comparable"]);
        h.add("java.lang.Character", &["java.lang.Comparable"]);
        h.add("java.lang.String", &["java.lang.CharSequence", "java.lang.Comparable"]);
        h.add(ENUM, &["java.lang.Comparable"]);

        h.add(COLLECTION, &["java.lang.Iterable"]);
        h.add("java.util.List", &[COLLECTION]);
        h.add("java.util.Set", &[COLLECTION]);
        h.add("java.util.Queue", &[COLLECTION]);
        h.add("java.util.Deque", &["java.util.Queue"]);
        h.add("java.util.ArrayList", &["java.util.List"]);
        h.add("java.util.LinkedList", &["java.util.List", "java.util.Deque"]);
        h.add("java.util.HashSet", &["java.util.Set"]);
        h.add("java.util.LinkedHashSet", &["java.util.HashSet"]);
        h.add("java.util.TreeSet", &["java.util.Set"]);
        h.add("java.util.ArrayDeque", &["java.util.Deque"]);
        h.add(SUPPLIER, &[]);
        h.add(CONSUMER, &[]);

        h.add(TAG, &[]);
        h.add("net.minecraft.nbt.CompoundTag", &[TAG]);
        h.add("net.minecraft.nbt.StringTag", &[TAG]);
        h.add("net.minecraft.nbt.EndTag", &[TAG]);
        h.add("net.minecraft.nbt.NumericTag", &[TAG]);
        h.add("net.minecraft.nbt.CollectionTag", &[TAG]);
        for numeric in ["Byte", "Short", "Int", "Long", "Float", "Double"] {
            h.add(&format!("net.minecraft.nbt.{}Tag", numeric), &["net.minecraft.nbt.NumericTag"]);
        }
        for coll in ["ListTag", "ByteArrayTag", "IntArrayTag", "LongArrayTag"] {
            h.add(&format!("net.minecraft.nbt.{}", coll), &["net.minecraft.nbt.CollectionTag"]);
        }

        h.add(CONFIGURATOR, &[]);
        h.add(CONFIGURATOR_GROUP, &[CONFIGURATOR]);
        h.add(SEARCH_CONFIGURATOR, &[]);
        h.add(RPC_SENDER, &[]);
        h.add(VECTOR4F, &[]);
        h
    }

    /// Built-in seeds plus every class of `tree` plus configured extras.
    pub fn for_tree(tree: &SourceTree, extras: &BTreeMap<String, TypeDecl>) -> Self {
        let mut h = Self::builtin();
        for (name, decl) in extras {
            h.declare(name, decl);
        }
        h.add_tree(tree);
        h
    }

    fn add(&mut self, name: &str, supers: &[&str]) {
        self.insert(name.to_string(), supers.iter().map(|s| s.to_string()).collect());
    }

    fn insert(&mut self, name: String, supers: Vec<String>) {
        let simple = simple_name(&name).to_string();
        let known = self.simple.entry(simple).or_default();
        if !known.contains(&name) {
            known.push(name.clone());
        }
        let entry = self.supertypes.entry(name).or_default();
        for s in supers {
            if !entry.contains(&s) {
                entry.push(s);
            }
        }
    }

    pub fn declare(&mut self, name: &str, decl: &TypeDecl) {
        let name = qualify(name);
        let mut supers: Vec<String> = decl.supertypes.iter().map(|s| qualify(s)).collect();
        if decl.is_enum {
            supers.push(ENUM.to_string());
            self.enums.insert(name.clone());
        }
        self.insert(name, supers);
    }

    pub fn add_tree(&mut self, tree: &SourceTree) {
        let resolve = |n: &str| -> String {
            tree.class(n)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| qualify(n))
        };
        for class in tree.classes() {
            let mut supers: Vec<String> = class.superclass.iter().map(|s| resolve(s.as_str())).collect();
            supers.extend(class.interfaces.iter().map(|i| resolve(i.as_str())));
            if class.kind == ClassKind::Enum {
                supers.push(ENUM.to_string());
                self.enums.insert(class.name.clone());
            }
            self.insert(class.name.clone(), supers);
        }
    }

    /// Qualify a bare name when exactly one known type carries it.
    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        if name.contains('.') {
            return name;
        }
        match self.simple.get(name) {
            Some(hits) if hits.len() == 1 => &hits[0],
            _ => name,
        }
    }

    pub fn is_enum(&self, name: &str) -> bool {
        let name = self.resolve(name);
        self.enums.contains(name) || (name != ENUM && self.is_subclass(name, ENUM))
    }

    /// Reflexive, transitive is-a over superclasses and interfaces.
    /// Every class is a subclass of `Object`.
    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        let sub = self.resolve(sub);
        let sup = self.resolve(sup);
        if sub == sup || sup == OBJECT {
            return true;
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![sub];
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur) {
                continue;
            }
            for s in self.supertypes.get(cur).map(Vec::as_slice).unwrap_or(&[]) {
                let s = self.resolve(s);
                if s == sup {
                    return true;
                }
                stack.push(s);
            }
        }
        false
    }

    /// Whether a value of type `source` can be assigned to `target`.
    /// Unknown types are never assignable.
    pub fn is_assignable(&self, target: &JavaType, source: &JavaType) -> bool {
        if !target.is_known() || !source.is_known() {
            return false;
        }
        match (target, source) {
            (JavaType::Void, JavaType::Void) => true,
            (JavaType::Void, _) | (_, JavaType::Void) => false,
            (JavaType::Primitive(t), JavaType::Primitive(s)) => s.widens_to(*t),
            (JavaType::Primitive(t), JavaType::Class { name, .. }) => {
                Primitive::from_boxed_name(name).is_some_and(|p| p.widens_to(*t))
            }
            (JavaType::Class { name, .. }, JavaType::Primitive(s)) => self.is_subclass(s.boxed_name(), name),
            (JavaType::Class { name: tn, args: targs }, JavaType::Class { name: sn, args: sargs }) => {
                if self.resolve(tn) == OBJECT {
                    return true;
                }
                if !self.is_subclass(sn, tn) {
                    return false;
                }
                if targs.is_empty() || sargs.is_empty() {
                    return true;
                }
                targs.len() == sargs.len()
                    && targs.iter().zip(sargs).all(|(t, s)| self.contains(t, s))
            }
            (JavaType::Class { name, .. }, JavaType::Array(_)) => {
                matches!(
                    self.resolve(name),
                    OBJECT | "java.lang.Cloneable" | "java.io.Serializable"
                )
            }
            (JavaType::Array(tc), JavaType::Array(sc)) => match (tc.as_ref(), sc.as_ref()) {
                (JavaType::Primitive(a), JavaType::Primitive(b)) => a == b,
                (JavaType::Primitive(_), _) | (_, JavaType::Primitive(_)) => false,
                (t, s) => self.is_assignable(t, s),
            },
            (JavaType::Wildcard(_), s) => self.contains(target, s),
            (t, JavaType::Wildcard(WildcardBound::Extends(b))) => self.is_assignable(t, b),
            (t, JavaType::Wildcard(_)) => self.is_assignable(t, &JavaType::class(OBJECT)),
            _ => false,
        }
    }

    /// Type-argument containment: does `target` (possibly a wildcard) admit `source`?
    fn contains(&self, target: &JavaType, source: &JavaType) -> bool {
        match target {
            JavaType::Wildcard(WildcardBound::Unbounded) => true,
            JavaType::Wildcard(WildcardBound::Extends(b)) => match source {
                JavaType::Wildcard(WildcardBound::Extends(sb)) => self.is_assignable(b, sb),
                JavaType::Wildcard(_) => self.resolve_type_name(b) == Some(OBJECT),
                s => self.is_assignable(b, s),
            },
            JavaType::Wildcard(WildcardBound::Super(b)) => match source {
                JavaType::Wildcard(WildcardBound::Super(sb)) => self.is_assignable(sb, b),
                JavaType::Wildcard(_) => false,
                s => self.is_assignable(s, b),
            },
            t => self.same_type(t, source),
        }
    }

    fn resolve_type_name<'a>(&'a self, t: &'a JavaType) -> Option<&'a str> {
        t.class_name().map(|n| self.resolve(n))
    }

    /// Structural equality after resolving bare class names.
    pub fn same_type(&self, a: &JavaType, b: &JavaType) -> bool {
        match (a, b) {
            (JavaType::Class { name: an, args: aa }, JavaType::Class { name: bn, args: ba }) => {
                self.resolve(an) == self.resolve(bn)
                    && aa.len() == ba.len()
                    && aa.iter().zip(ba).all(|(x, y)| self.same_type(x, y))
            }
            (JavaType::Array(x), JavaType::Array(y)) => self.same_type(x, y),
            (JavaType::Unknown(_), _) | (_, JavaType::Unknown(_)) => false,
            _ => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tree::ClassDescriptor;

    fn t(s: &str) -> JavaType {
        JavaType::parse(s)
    }

    #[test]
    fn test_builtin_collection_family() {
        let h = TypeHierarchy::builtin();
        assert!(h.is_subclass("java.util.ArrayList", COLLECTION));
        assert!(h.is_subclass("java.util.LinkedHashSet", "java.lang.Iterable"));
        assert!(h.is_subclass("java.util.ArrayDeque", "java.util.Queue"));
        assert!(!h.is_subclass("java.util.List", "java.util.Set"));
        assert!(h.is_subclass("net.minecraft.nbt.IntTag", TAG));
        assert!(h.is_subclass(CONFIGURATOR_GROUP, CONFIGURATOR));
    }

    #[test]
    fn test_boxing_unboxing_and_widening() {
        let h = TypeHierarchy::builtin();
        assert!(h.is_assignable(&t("int"), &t("Integer")));
        assert!(h.is_assignable(&t("Integer"), &t("int")));
        assert!(h.is_assignable(&t("long"), &t("int")));
        assert!(h.is_assignable(&t("Number"), &t("int")));
        assert!(h.is_assignable(&t("Object"), &t("boolean")));
        assert!(!h.is_assignable(&t("int"), &t("long")));
        assert!(!h.is_assignable(&t("Long"), &t("int")));
        assert!(!h.is_assignable(&t("boolean"), &t("int")));
    }

    #[test]
    fn test_generic_arguments_and_wildcards() {
        let h = TypeHierarchy::builtin();
        assert!(h.is_assignable(&t("java.util.List<String>"), &t("java.util.ArrayList<String>")));
        assert!(h.is_assignable(&t("java.util.List"), &t("java.util.ArrayList<String>")));
        assert!(!h.is_assignable(&t("java.util.List<Object>"), &t("java.util.List<String>")));
        assert!(h.is_assignable(&t("java.util.List<?>"), &t("java.util.List<String>")));
        assert!(h.is_assignable(
            &t("java.util.List<? extends Number>"),
            &t("java.util.List<Integer>")
        ));
        assert!(!h.is_assignable(
            &t("java.util.List<? extends Number>"),
            &t("java.util.List<String>")
        ));
        assert!(h.is_assignable(
            &t("java.util.function.Consumer<? super Integer>"),
            &t("java.util.function.Consumer<Number>")
        ));
    }

    #[test]
    fn test_arrays_and_unknown() {
        let h = TypeHierarchy::builtin();
        assert!(h.is_assignable(&t("Object[]"), &t("String[]")));
        assert!(!h.is_assignable(&t("long[]"), &t("int[]")));
        assert!(h.is_assignable(&t("Object"), &t("int[]")));
        assert!(!h.is_assignable(&t("List<"), &t("List<")));
    }

    #[test]
    fn test_tree_classes_and_cycles() {
        let mut enum_class = ClassDescriptor::new("com.acme.Mode");
        enum_class.kind = ClassKind::Enum;
        let tree = SourceTree::from_classes(vec![
            ClassDescriptor::new("com.acme.A").extends("B"),
            ClassDescriptor::new("com.acme.B").extends("com.acme.A"),
            ClassDescriptor::new("com.acme.Item").extends("com.acme.B"),
            enum_class,
        ]);
        let h = TypeHierarchy::for_tree(&tree, &BTreeMap::new());
        assert!(h.is_subclass("com.acme.Item", "com.acme.A"));
        assert!(!h.is_subclass("com.acme.A", "com.acme.Item"));
        assert!(h.is_enum("com.acme.Mode"));
        assert!(h.is_enum("Mode"));
        assert!(!h.is_enum("com.acme.Item"));
        assert!(h.is_assignable(&t("com.acme.A"), &t("Item")));
    }

    #[test]
    fn test_configured_types() {
        let mut extras = BTreeMap::new();
        extras.insert(
            "com.acme.ColorMode".to_string(),
            TypeDecl {
                supertypes: vec![],
                is_enum: true,
            },
        );
        extras.insert(
            "com.acme.MyTag".to_string(),
            TypeDecl {
                supertypes: vec![TAG.to_string()],
                is_enum: false,
            },
        );
        let h = TypeHierarchy::for_tree(&SourceTree::from_classes(vec![]), &extras);
        assert!(h.is_enum("com.acme.ColorMode"));
        assert!(h.is_subclass("com.acme.MyTag", TAG));
    }
}
