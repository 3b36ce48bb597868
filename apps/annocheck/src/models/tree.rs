//! Source-tree snapshot: the read-only view of classes, fields, methods,
//! annotations and call sites that every check consumes.
//!
//! `Snapshot` is the interchange format loaded from JSON/TOML/YAML.
//! `SourceTree` is its indexed form (class lookup, owner back-references,
//! ancestor walks). The engine never builds or walks host ASTs itself.

use crate::error::{Error, Result};
use crate::types::{simple_name, JavaType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

/// Annotation attribute value: literals, arrays, or a non-literal expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Expr { expr: String },
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationInstance {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl AnnotationInstance {
    pub fn new(name: &str) -> Self {
        AnnotationInstance {
            name: name.to_string(),
            attributes: BTreeMap::new(),
            position: None,
        }
    }

    pub fn with(mut self, key: &str, value: AttributeValue) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn with_str(self, key: &str, value: &str) -> Self {
        self.with(key, AttributeValue::Str(value.to_string()))
    }

    /// Matches the qualified name, or its simple name when the snapshot
    /// recorded an unqualified annotation.
    pub fn is(&self, qualified: &str) -> bool {
        self.name == qualified || (!self.name.contains('.') && self.name == simple_name(qualified))
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// String literal value of `key`; `None` when absent, blank or not a literal.
    pub fn string_literal(&self, key: &str) -> Option<&str> {
        self.attribute(key)
            .and_then(AttributeValue::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

fn find_annotation<'a>(list: &'a [AnnotationInstance], qualified: &str) -> Option<&'a AnnotationInstance> {
    list.iter().find(|a| a.is(qualified))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: JavaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Qualified name of the owning class; filled when the tree is indexed.
    #[serde(skip)]
    pub owner: String,
}

impl FieldDescriptor {
    pub fn new(name: &str, ty: &str) -> Self {
        FieldDescriptor {
            name: name.to_string(),
            ty: JavaType::parse(ty),
            annotations: Vec::new(),
            position: None,
            owner: String::new(),
        }
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn annotation(&self, qualified: &str) -> Option<&AnnotationInstance> {
        find_annotation(&self.annotations, qualified)
    }

    pub fn has_annotation(&self, qualified: &str) -> bool {
        self.annotation(qualified).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParameterRepr")]
pub struct Parameter {
    #[serde(rename = "type")]
    pub ty: JavaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Parameters may be written as a bare type string or as `{ type, name }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ParameterRepr {
    Bare(JavaType),
    Full {
        #[serde(rename = "type")]
        ty: JavaType,
        #[serde(default)]
        name: Option<String>,
    },
}

impl From<ParameterRepr> for Parameter {
    fn from(r: ParameterRepr) -> Self {
        match r {
            ParameterRepr::Bare(ty) => Parameter { ty, name: None },
            ParameterRepr::Full { ty, name } => Parameter { ty, name },
        }
    }
}

fn void_type() -> JavaType {
    JavaType::Void
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default = "void_type")]
    pub return_type: JavaType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip)]
    pub owner: String,
}

impl MethodDescriptor {
    pub fn new(name: &str, return_type: &str, params: &[&str]) -> Self {
        MethodDescriptor {
            name: name.to_string(),
            return_type: JavaType::parse(return_type),
            parameters: params
                .iter()
                .map(|p| Parameter {
                    ty: JavaType::parse(p),
                    name: None,
                })
                .collect(),
            is_static: false,
            annotations: Vec::new(),
            position: None,
            owner: String::new(),
        }
    }

    pub fn make_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn param_type(&self, index: usize) -> Option<&JavaType> {
        self.parameters.get(index).map(|p| &p.ty)
    }

    pub fn annotation(&self, qualified: &str) -> Option<&AnnotationInstance> {
        find_annotation(&self.annotations, qualified)
    }

    pub fn has_annotation(&self, qualified: &str) -> bool {
        self.annotation(qualified).is_some()
    }

    pub fn parameter_types(&self) -> Vec<JavaType> {
        self.parameters.iter().map(|p| p.ty.clone()).collect()
    }
}

/// One argument at a call site; either part may be unknown.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Argument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub literal: Option<AttributeValue>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<JavaType>,
}

/// A resolved method invocation inside a class body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    /// Enclosing method, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
    /// Invoked method name.
    pub method: String,
    /// Qualified name of the class declaring the invoked method.
    pub class: String,
    #[serde(default)]
    pub arguments: Vec<Argument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip)]
    pub owner: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationInstance>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallSite>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ClassDescriptor {
    pub fn new(name: &str) -> Self {
        ClassDescriptor {
            name: name.to_string(),
            kind: ClassKind::Class,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            calls: Vec::new(),
            position: None,
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn has_annotation(&self, qualified: &str) -> bool {
        find_annotation(&self.annotations, qualified).is_some()
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Serialized snapshot of one source file (or any group of classes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassDescriptor>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Format {
    Json,
    Toml,
    Yaml,
}

fn format_of(path: &Path) -> Result<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        _ => Err(Error::UnsupportedFormat(path.to_string_lossy().to_string())),
    }
}

impl Snapshot {
    /// Load a snapshot; the format follows the file extension.
    pub fn load(path: &Path) -> Result<Snapshot> {
        let format = format_of(path)?;
        let data = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&data, format, &path.to_string_lossy())
    }

    fn parse(data: &str, format: Format, label: &str) -> Result<Snapshot> {
        match format {
            Format::Json => serde_json::from_str(data).map_err(|e| Error::parse(label, e)),
            Format::Toml => toml::from_str(data).map_err(|e| Error::parse(label, e)),
            Format::Yaml => serde_yaml::from_str(data).map_err(|e| Error::parse(label, e)),
        }
    }

    /// Serialize in the format implied by `path`.
    pub fn render_for(&self, path: &Path) -> Result<String> {
        let label = path.to_string_lossy();
        match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| Error::parse(label, e)),
            Format::Toml => toml::to_string_pretty(self).map_err(|e| Error::parse(label, e)),
            Format::Yaml => serde_yaml::to_string(self).map_err(|e| Error::parse(label, e)),
        }
    }
}

/// Indexed, read-only source tree.
#[derive(Debug, Clone)]
pub struct SourceTree {
    file: String,
    snapshot: Snapshot,
    by_name: HashMap<String, usize>,
    by_simple: HashMap<String, Vec<usize>>,
}

impl SourceTree {
    /// Index a snapshot. `label` names the file in diagnostics unless the
    /// snapshot carries its own `file`.
    pub fn new(mut snapshot: Snapshot, label: &str) -> Self {
        let mut by_name = HashMap::new();
        let mut by_simple: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, class) in snapshot.classes.iter_mut().enumerate() {
            let owner = class.name.clone();
            for f in class.fields.iter_mut() {
                f.owner = owner.clone();
            }
            for m in class.methods.iter_mut() {
                m.owner = owner.clone();
            }
            for c in class.calls.iter_mut() {
                c.owner = owner.clone();
            }
            by_name.entry(owner.clone()).or_insert(i);
            by_simple
                .entry(simple_name(&owner).to_string())
                .or_default()
                .push(i);
        }
        let file = snapshot.file.clone().unwrap_or_else(|| label.to_string());
        SourceTree {
            file,
            snapshot,
            by_name,
            by_simple,
        }
    }

    pub fn from_classes(classes: Vec<ClassDescriptor>) -> Self {
        SourceTree::new(
            Snapshot {
                file: None,
                classes,
            },
            "<memory>",
        )
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }

    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.snapshot.classes
    }

    /// Look a class up by qualified name, falling back to a unique simple name.
    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        if let Some(&i) = self.by_name.get(name) {
            return self.snapshot.classes.get(i);
        }
        match self.by_simple.get(simple_name(name)) {
            Some(hits) if hits.len() == 1 && !name.contains('.') => self.snapshot.classes.get(hits[0]),
            _ => None,
        }
    }

    pub fn all_methods(&self) -> impl Iterator<Item = (&ClassDescriptor, &MethodDescriptor)> {
        self.classes()
            .iter()
            .flat_map(|c| c.methods.iter().map(move |m| (c, m)))
    }
}

/// Class resolution by qualified or unique simple name, plus the hierarchy
/// walks built on it. [`SourceTree`] resolves within one snapshot,
/// [`ClassIndex`] across every snapshot of a run.
pub trait ClassLookup: Sync {
    fn class(&self, name: &str) -> Option<&ClassDescriptor>;

    /// `class` followed by every reachable supertype (superclass chain first,
    /// then interfaces), without repeats.
    fn ancestors<'a>(&'a self, class: &'a ClassDescriptor) -> Vec<&'a ClassDescriptor> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(class);
        while let Some(c) = queue.pop_front() {
            if !seen.insert(c.name.as_str()) {
                continue;
            }
            out.push(c);
            if let Some(sup) = c.superclass.as_deref().and_then(|s| self.class(s)) {
                queue.push_back(sup);
            }
            for iface in &c.interfaces {
                if let Some(i) = self.class(iface) {
                    queue.push_back(i);
                }
            }
        }
        out
    }

    /// Methods named `name` declared on `class` or any ancestor.
    fn find_methods_by_name<'a>(&'a self, class: &'a ClassDescriptor, name: &str) -> Vec<&'a MethodDescriptor> {
        self.ancestors(class)
            .into_iter()
            .flat_map(|c| c.methods.iter())
            .filter(|m| m.name == name)
            .collect()
    }

    /// Field named `name` on `class` or along its superclass chain.
    fn find_field_in_hierarchy<'a>(&'a self, class: &'a ClassDescriptor, name: &str) -> Option<&'a FieldDescriptor> {
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(c) = current {
            if !seen.insert(c.name.as_str()) {
                break;
            }
            if let Some(f) = c.fields.iter().find(|f| f.name == name) {
                return Some(f);
            }
            current = c.superclass.as_deref().and_then(|s| self.class(s));
        }
        None
    }
}

impl ClassLookup for SourceTree {
    fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        SourceTree::class(self, name)
    }
}

/// Classes of several trees by name. The first tree declaring a qualified
/// name wins.
#[derive(Debug, Default)]
pub struct ClassIndex<'a> {
    by_name: HashMap<&'a str, &'a ClassDescriptor>,
    by_simple: HashMap<&'a str, Vec<&'a ClassDescriptor>>,
    files: HashMap<&'a str, &'a str>,
}

impl<'a> ClassIndex<'a> {
    pub fn from_trees(trees: impl IntoIterator<Item = &'a SourceTree>) -> Self {
        let mut index = ClassIndex::default();
        for tree in trees {
            for class in tree.classes() {
                index.by_name.entry(class.name.as_str()).or_insert(class);
                index.files.entry(class.name.as_str()).or_insert(tree.file());
                index.by_simple.entry(simple_name(&class.name)).or_default().push(class);
            }
        }
        index
    }

    /// Diagnostic label of the tree declaring `class`.
    pub fn file_of(&self, class: &str) -> Option<&'a str> {
        self.files.get(class).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl ClassLookup for ClassIndex<'_> {
    fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        if let Some(c) = self.by_name.get(name) {
            return Some(*c);
        }
        match self.by_simple.get(simple_name(name)) {
            Some(hits) if hits.len() == 1 && !name.contains('.') => Some(hits[0]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_string_literal_skips_blank_and_non_literal() {
        let a = AnnotationInstance::new("UpdateListener")
            .with_str("methodName", "onChanged")
            .with_str("blank", "   ")
            .with(
                "expr",
                AttributeValue::Expr {
                    expr: "NAME".into(),
                },
            )
            .with("num", AttributeValue::Int(3));
        assert_eq!(a.string_literal("methodName"), Some("onChanged"));
        assert_eq!(a.string_literal("blank"), None);
        assert_eq!(a.string_literal("expr"), None);
        assert_eq!(a.string_literal("num"), None);
        assert_eq!(a.string_literal("missing"), None);
    }

    #[test]
    fn test_annotation_matches_simple_or_qualified() {
        let q = crate::annotations::UPDATE_LISTENER;
        assert!(AnnotationInstance::new(q).is(q));
        assert!(AnnotationInstance::new("UpdateListener").is(q));
        assert!(!AnnotationInstance::new("other.UpdateListener").is(q));
    }

    #[test]
    fn test_load_json_snapshot_with_bare_and_full_parameters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Machine.json");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(
            f,
            "{}",
            r#"{
  "file": "src/Machine.java",
  "classes": [{
    "name": "com.acme.Machine",
    "fields": [{ "name": "color", "type": "int",
                 "annotations": [{ "name": "UpdateListener", "attributes": { "methodName": "onColorChanged" } }] }],
    "methods": [
      { "name": "onColorChanged", "parameters": ["int", { "type": "Integer", "name": "newValue" }] },
      { "name": "helper", "return_type": "boolean", "static": true }
    ]
  }]
}"#
        )
        .unwrap();
        let snap = Snapshot::load(&path).unwrap();
        let tree = SourceTree::new(snap, "ignored");
        assert_eq!(tree.file(), "src/Machine.java");
        let class = tree.class("com.acme.Machine").unwrap();
        assert_eq!(class.fields[0].owner, "com.acme.Machine");
        let m = &class.methods[0];
        assert_eq!(m.return_type, JavaType::Void);
        assert_eq!(m.parameters[1].name.as_deref(), Some("newValue"));
        assert_eq!(m.parameters[1].ty, JavaType::class("java.lang.Integer"));
        assert!(class.methods[1].is_static);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snap.txt");
        fs::write(&path, "{}").unwrap();
        assert!(matches!(Snapshot::load(&path), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_ancestors_and_method_search_walk_hierarchy_without_cycles() {
        let tree = SourceTree::from_classes(vec![
            ClassDescriptor::new("a.Base")
                .extends("a.Child")
                .method(MethodDescriptor::new("onDirty", "boolean", &[])),
            ClassDescriptor::new("a.Child")
                .extends("a.Base")
                .method(MethodDescriptor::new("onDirty", "boolean", &["int"])),
        ]);
        let child = tree.class("a.Child").unwrap();
        let names: Vec<_> = tree.ancestors(child).iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["a.Child", "a.Base"]);
        assert_eq!(tree.find_methods_by_name(child, "onDirty").len(), 2);
        assert!(tree.find_field_in_hierarchy(child, "nothing").is_none());
    }

    #[test]
    fn test_class_index_resolves_supertypes_across_trees() {
        let base = SourceTree::from_classes(vec![ClassDescriptor::new("com.acme.Base")
            .field(FieldDescriptor::new("speed", "float"))
            .method(MethodDescriptor::new("onColorChanged", "void", &["int", "int"]))]);
        let machine = SourceTree::from_classes(vec![ClassDescriptor::new("com.acme.Machine").extends("com.acme.Base")]);
        let class = machine.class("com.acme.Machine").unwrap();
        assert!(machine.find_methods_by_name(class, "onColorChanged").is_empty());

        let index = ClassIndex::from_trees([&base, &machine]);
        assert_eq!(index.len(), 2);
        let names: Vec<_> = index.ancestors(class).iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["com.acme.Machine", "com.acme.Base"]);
        assert_eq!(index.find_methods_by_name(class, "onColorChanged").len(), 1);
        assert_eq!(
            index.find_field_in_hierarchy(class, "speed").map(|f| f.owner.as_str()),
            Some("com.acme.Base")
        );
    }

    #[test]
    fn test_class_lookup_by_unique_simple_name() {
        let tree = SourceTree::from_classes(vec![
            ClassDescriptor::new("a.Item"),
            ClassDescriptor::new("b.Thing"),
            ClassDescriptor::new("c.Thing"),
        ]);
        assert!(tree.class("Item").is_some());
        assert!(tree.class("Thing").is_none());
        assert!(tree.class("c.Thing").is_some());
    }
}
