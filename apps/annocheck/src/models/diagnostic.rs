//! Diagnostics and the immutable fix descriptors attached to them.

use crate::types::{simple_name, JavaType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::tree::AttributeValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    #[default]
    #[serde(alias = "warn")]
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Where a diagnostic points.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Kind of element an annotation template may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Field,
    Class,
    Method,
}

/// Reference to a class, field or method in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub kind: TargetKind,
    pub class: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
}

impl ElementRef {
    pub fn class(class: &str) -> Self {
        ElementRef {
            kind: TargetKind::Class,
            class: class.to_string(),
            member: None,
        }
    }

    pub fn field(class: &str, field: &str) -> Self {
        ElementRef {
            kind: TargetKind::Field,
            class: class.to_string(),
            member: Some(field.to_string()),
        }
    }

    pub fn method(class: &str, method: &str) -> Self {
        ElementRef {
            kind: TargetKind::Method,
            class: class.to_string(),
            member: Some(method.to_string()),
        }
    }
}

/// Annotation synthesized by an `AddAnnotation` fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub target: TargetKind,
}

impl AnnotationTemplate {
    /// `@Configurable(name = "")` style source rendering.
    pub fn render(&self) -> String {
        if self.defaults.is_empty() {
            return format!("@{}", simple_name(&self.name));
        }
        let attrs: Vec<String> = self
            .defaults
            .iter()
            .map(|(k, v)| format!("{} = {}", k, render_value(v)))
            .collect();
        format!("@{}({})", simple_name(&self.name), attrs.join(", "))
    }
}

fn render_value(v: &AttributeValue) -> String {
    match v {
        AttributeValue::Str(s) => format!("{:?}", s),
        AttributeValue::Bool(b) => b.to_string(),
        AttributeValue::Int(i) => i.to_string(),
        AttributeValue::Float(f) => f.to_string(),
        AttributeValue::Expr { expr } => expr.clone(),
        AttributeValue::Array(items) => {
            let inner: Vec<String> = items.iter().map(render_value).collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StubParam {
    #[serde(rename = "type")]
    pub ty: JavaType,
    pub name: String,
}

/// Method to generate for a missing companion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStub {
    pub visibility: String,
    pub return_type: JavaType,
    pub name: String,
    pub params: Vec<StubParam>,
    /// Statement(s) placed in the body.
    pub body: String,
}

impl MethodStub {
    pub fn new(visibility: &str, return_type: JavaType, name: &str) -> Self {
        MethodStub {
            visibility: visibility.to_string(),
            return_type,
            name: name.to_string(),
            params: Vec::new(),
            body: String::new(),
        }
    }

    pub fn param(mut self, ty: JavaType, name: &str) -> Self {
        self.params.push(StubParam {
            ty,
            name: name.to_string(),
        });
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// `void onColorChanged(int oldValue, int newValue)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty.presentable_text(), p.name))
            .collect();
        format!(
            "{} {}({})",
            self.return_type.presentable_text(),
            self.name,
            params.join(", ")
        )
    }

    /// Full source text of the stub.
    pub fn render(&self) -> String {
        let mut out = format!("{} {} {{\n", self.visibility, self.signature());
        for line in self.body.lines() {
            out.push_str("    ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('}');
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FixDescriptor {
    GenerateMethodStub {
        class: String,
        stub: MethodStub,
    },
    /// Targets the one overload with exactly these parameter types.
    RemoveStaticModifier {
        class: String,
        method: String,
        #[serde(default)]
        parameters: Vec<JavaType>,
    },
    AddAnnotation {
        target: ElementRef,
        template: AnnotationTemplate,
    },
    NoFixAvailable,
    AddLangKey {
        path: String,
        namespace: String,
        key: String,
        value: String,
    },
    CreateLangFile {
        path: String,
        key: String,
        value: String,
    },
}

impl FixDescriptor {
    /// Short action title shown next to a diagnostic.
    pub fn title(&self) -> String {
        match self {
            FixDescriptor::GenerateMethodStub { stub, .. } => {
                format!("Create method '{}'", stub.signature())
            }
            FixDescriptor::RemoveStaticModifier { method, .. } => {
                format!("Remove static modifier from '{}'", method)
            }
            FixDescriptor::AddAnnotation { template, .. } => {
                format!("Add {}", template.render())
            }
            FixDescriptor::NoFixAvailable => "No fix available".to_string(),
            FixDescriptor::AddLangKey { namespace, key, .. } => {
                format!("Add '{}' to {} language file", key, namespace)
            }
            FixDescriptor::CreateLangFile { path, key, .. } => {
                format!("Create {} with key '{}'", path, key)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<FixDescriptor>,
}

impl Diagnostic {
    /// Stable ordering key: file, line, class, member, rule, message.
    pub fn sort_key(&self) -> (&str, u32, &str, &str, &str, &str) {
        (
            &self.location.file,
            self.location.line.unwrap_or(0),
            &self.location.class,
            self.location.member.as_deref().unwrap_or(""),
            &self.rule,
            &self.message,
        )
    }
}
