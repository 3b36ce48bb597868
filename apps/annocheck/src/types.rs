//! Semantic Java type model used by every rule.
//!
//! Types arrive as strings in snapshots (`int`, `java.util.List<Item>`,
//! `String[]`, `Supplier<? extends Item>`) and are parsed into [`JavaType`].
//! Parsing is total: text that cannot be read becomes [`JavaType::Unknown`],
//! which all predicates treat as "no information".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Java primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    pub const fn java_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    /// Fully qualified name of the boxed counterpart.
    pub const fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
            Primitive::Char => "java.lang.Character",
        }
    }

    pub fn from_java_name(name: &str) -> Option<Self> {
        Some(match name {
            "boolean" => Primitive::Boolean,
            "byte" => Primitive::Byte,
            "short" => Primitive::Short,
            "int" => Primitive::Int,
            "long" => Primitive::Long,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "char" => Primitive::Char,
            _ => return None,
        })
    }

    pub fn from_boxed_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.boxed_name() == name)
    }

    const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Char,
    ];

    /// Whether a value of `self` can be widened into `target` (JLS 5.1.2).
    pub fn widens_to(self, target: Primitive) -> bool {
        use Primitive::*;
        if self == target {
            return true;
        }
        let targets: &[Primitive] = match self {
            Byte => &[Short, Int, Long, Float, Double],
            Short => &[Int, Long, Float, Double],
            Char => &[Int, Long, Float, Double],
            Int => &[Long, Float, Double],
            Long => &[Float, Double],
            Float => &[Double],
            Double | Boolean => &[],
        };
        targets.contains(&target)
    }
}

/// Bound of a wildcard type argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<JavaType>),
    Super(Box<JavaType>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JavaType {
    Void,
    Primitive(Primitive),
    Class { name: String, args: Vec<JavaType> },
    Array(Box<JavaType>),
    Wildcard(WildcardBound),
    Unknown(String),
}

impl JavaType {
    pub fn parse(text: &str) -> JavaType {
        let trimmed = text.trim();
        let mut parser = TypeParser {
            src: trimmed.as_bytes(),
            pos: 0,
        };
        match parser.parse_type() {
            Some(ty) if parser.at_end() => ty,
            _ => JavaType::Unknown(trimmed.to_string()),
        }
    }

    pub fn class(name: &str) -> JavaType {
        JavaType::Class {
            name: qualify(name),
            args: Vec::new(),
        }
    }

    pub fn generic(name: &str, args: Vec<JavaType>) -> JavaType {
        JavaType::Class {
            name: qualify(name),
            args,
        }
    }

    pub fn array_of(component: JavaType) -> JavaType {
        JavaType::Array(Box::new(component))
    }

    /// Qualified class name for class types, `None` otherwise.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            JavaType::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn type_args(&self) -> &[JavaType] {
        match self {
            JavaType::Class { args, .. } => args,
            _ => &[],
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, JavaType::Void)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, JavaType::Class { .. } | JavaType::Array(_))
    }

    pub fn is_known(&self) -> bool {
        match self {
            JavaType::Unknown(_) => false,
            JavaType::Class { args, .. } => args.iter().all(JavaType::is_known),
            JavaType::Array(c) => c.is_known(),
            JavaType::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => b.is_known(),
            _ => true,
        }
    }

    /// Short, source-like rendering: simple class names, generics kept.
    pub fn presentable_text(&self) -> String {
        match self {
            JavaType::Void => "void".to_string(),
            JavaType::Primitive(p) => p.java_name().to_string(),
            JavaType::Class { name, args } => {
                let simple = simple_name(name);
                if args.is_empty() {
                    simple.to_string()
                } else {
                    let inner: Vec<String> = args.iter().map(|a| a.presentable_text()).collect();
                    format!("{}<{}>", simple, inner.join(", "))
                }
            }
            JavaType::Array(c) => format!("{}[]", c.presentable_text()),
            JavaType::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
            JavaType::Wildcard(WildcardBound::Extends(b)) => {
                format!("? extends {}", b.presentable_text())
            }
            JavaType::Wildcard(WildcardBound::Super(b)) => {
                format!("? super {}", b.presentable_text())
            }
            JavaType::Unknown(text) => text.clone(),
        }
    }
}

impl fmt::Display for JavaType {
    /// Canonical rendering with qualified names; parses back to the same value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Void => write!(f, "void"),
            JavaType::Primitive(p) => write!(f, "{}", p.java_name()),
            JavaType::Class { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", a)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            JavaType::Array(c) => write!(f, "{}[]", c),
            JavaType::Wildcard(WildcardBound::Unbounded) => write!(f, "?"),
            JavaType::Wildcard(WildcardBound::Extends(b)) => write!(f, "? extends {}", b),
            JavaType::Wildcard(WildcardBound::Super(b)) => write!(f, "? super {}", b),
            JavaType::Unknown(text) => write!(f, "{}", text),
        }
    }
}

impl From<String> for JavaType {
    fn from(s: String) -> Self {
        JavaType::parse(&s)
    }
}

impl From<&str> for JavaType {
    fn from(s: &str) -> Self {
        JavaType::parse(s)
    }
}

impl From<JavaType> for String {
    fn from(t: JavaType) -> Self {
        t.to_string()
    }
}

/// Last segment of a dotted name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

const JAVA_LANG: &[&str] = &[
    "Object",
    "String",
    "CharSequence",
    "Number",
    "Boolean",
    "Byte",
    "Short",
    "Integer",
    "Long",
    "Float",
    "Double",
    "Character",
    "Enum",
    "Iterable",
    "Comparable",
    "Class",
];

/// Qualify bare `java.lang` names; anything else is returned unchanged.
pub fn qualify(name: &str) -> String {
    if !name.contains('.') && JAVA_LANG.contains(&name) {
        format!("java.lang.{}", name)
    } else {
        name.to_string()
    }
}

struct TypeParser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(token.as_bytes()) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let rest = &self.src[self.pos..];
        if rest.starts_with(kw.as_bytes()) {
            let next = rest.get(kw.len()).copied();
            if next.map_or(true, |c| !is_ident_byte(c)) {
                self.pos += kw.len();
                return true;
            }
        }
        false
    }

    fn ident(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len() && (is_ident_byte(self.src[self.pos]) || self.src[self.pos] == b'.')
        {
            // stop before a varargs ellipsis
            if self.src[self.pos..].starts_with(b"...") {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        let name = std::str::from_utf8(&self.src[start..self.pos]).ok()?;
        if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
            return None;
        }
        Some(name.to_string())
    }

    fn parse_type(&mut self) -> Option<JavaType> {
        if self.eat("?") {
            let bound = if self.eat_keyword("extends") {
                WildcardBound::Extends(Box::new(self.parse_type()?))
            } else if self.eat_keyword("super") {
                WildcardBound::Super(Box::new(self.parse_type()?))
            } else {
                WildcardBound::Unbounded
            };
            return Some(JavaType::Wildcard(bound));
        }
        let name = self.ident()?;
        let mut ty = if name == "void" {
            JavaType::Void
        } else if let Some(p) = Primitive::from_java_name(&name) {
            JavaType::Primitive(p)
        } else {
            let mut args = Vec::new();
            if self.eat("<") {
                if !self.eat(">") {
                    loop {
                        args.push(self.parse_type()?);
                        if self.eat(",") {
                            continue;
                        }
                        if self.eat(">") {
                            break;
                        }
                        return None;
                    }
                }
            }
            JavaType::Class {
                name: qualify(&name),
                args,
            }
        };
        loop {
            if self.eat("[") {
                if !self.eat("]") {
                    return None;
                }
                ty = JavaType::Array(Box::new(ty));
            } else if self.eat("...") {
                ty = JavaType::Array(Box::new(ty));
            } else {
                break;
            }
        }
        Some(ty)
    }
}

fn is_ident_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}
