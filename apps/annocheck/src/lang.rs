//! Translation keys referenced by configurator annotations.
//!
//! `@Configurable(name, tips)` and `@ConfigHeader(value)` name keys that must
//! exist in a mod language file
//! (`src/main/resources/assets/<namespace>/lang/en_us.json`). Lookup goes
//! through [`LangLookup`] so hosts can supply their own index; [`LangIndex`]
//! is the filesystem implementation.

use crate::annotations::{CONFIGURABLE, CONFIG_HEADER};
use crate::error::{Error, Result};
use crate::models::tree::{AnnotationInstance, AttributeValue, ClassDescriptor, FieldDescriptor};
use crate::models::{Diagnostic, FixDescriptor, Severity};
use crate::rules::{locate, CheckContext};
use glob::glob;
use log::{debug, warn};
use regex::Regex;
use serde_json::{Map, Value as Json};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const RULE_ID: &str = "lang-key";
pub const LANG_FILE_NAME: &str = "en_us.json";
/// Namespace used for a new language file when none exists yet.
pub const DEFAULT_NAMESPACE: &str = "examplemod";

fn lang_path_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r".*/src/main/resources/assets/([^/]+)/lang/en_us\.json$").ok())
        .as_ref()
}

/// A language file and the namespace (mod id) it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct LangEntry {
    pub path: PathBuf,
    pub namespace: String,
}

pub trait LangLookup: Sync {
    /// First language file defining `key`.
    fn find_key(&self, key: &str) -> Option<LangEntry>;
    /// Every known language file.
    fn files(&self) -> Vec<LangEntry>;
}

/// Namespace of a path shaped like `.../assets/<namespace>/lang/en_us.json`.
pub fn namespace_of(path: &Path) -> Option<String> {
    let text = path.to_string_lossy().replace('\\', "/");
    lang_path_regex()?
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Relative path of the language file for `namespace`.
pub fn lang_file_path(namespace: &str) -> String {
    format!("src/main/resources/assets/{}/lang/{}", namespace, LANG_FILE_NAME)
}

#[derive(Debug, Clone)]
struct LangFile {
    entry: LangEntry,
    keys: BTreeSet<String>,
}

/// In-memory index of language files found under a set of roots.
#[derive(Debug, Clone, Default)]
pub struct LangIndex {
    files: Vec<LangFile>,
}

impl LangIndex {
    /// Index every `en_us.json` below `roots`. Unreadable files and files
    /// that are not JSON objects are skipped with a warning.
    pub fn load(roots: &[PathBuf]) -> Result<Self> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for root in roots {
            let pattern = root.join("**").join(LANG_FILE_NAME);
            let pattern = pattern.to_string_lossy().to_string();
            let entries = glob(&pattern).map_err(|e| Error::Config(format!("bad lang root {}: {}", pattern, e)))?;
            paths.extend(entries.flatten());
        }
        paths.sort();
        paths.dedup();

        let mut index = LangIndex::default();
        for path in paths {
            let Some(namespace) = namespace_of(&path) else {
                continue;
            };
            let data = match fs::read_to_string(&path) {
                Ok(data) => data,
                Err(e) => {
                    warn!("lang: {}, skipped", Error::io(&path, e));
                    continue;
                }
            };
            match serde_json::from_str::<Json>(&data) {
                Ok(Json::Object(obj)) => {
                    debug!("lang: {} keys in {}", obj.len(), path.display());
                    index.insert(path, &namespace, obj.keys().cloned());
                }
                _ => warn!("lang: {} is not a JSON object, skipped", path.display()),
            }
        }
        Ok(index)
    }

    pub fn insert(&mut self, path: PathBuf, namespace: &str, keys: impl IntoIterator<Item = String>) {
        self.files.push(LangFile {
            entry: LangEntry {
                path,
                namespace: namespace.to_string(),
            },
            keys: keys.into_iter().collect(),
        });
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl LangLookup for LangIndex {
    fn find_key(&self, key: &str) -> Option<LangEntry> {
        self.files
            .iter()
            .find(|f| f.keys.contains(key))
            .map(|f| f.entry.clone())
    }

    fn files(&self) -> Vec<LangEntry> {
        self.files.iter().map(|f| f.entry.clone()).collect()
    }
}

/// Display text for a key: last dotted segment, split before capitals,
/// first letter upper-cased (`menu.autoSave` -> `Auto Save`).
pub fn humanize(key: &str) -> String {
    let last = key.rsplit('.').next().unwrap_or(key);
    let mut out = String::with_capacity(last.len() + 4);
    for (i, c) in last.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => out,
    }
}

/// A translation key referenced by an annotation attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyRef<'a> {
    pub annotation: &'a AnnotationInstance,
    pub attribute: &'static str,
    pub key: &'a str,
}

fn literal_keys(value: &AttributeValue) -> Vec<&str> {
    let keep = |s: &&str| !s.trim().is_empty();
    match value {
        AttributeValue::Str(s) => Some(s.as_str()).filter(keep).into_iter().collect(),
        AttributeValue::Array(items) => items.iter().filter_map(AttributeValue::as_str).filter(keep).collect(),
        _ => Vec::new(),
    }
}

/// Keys named by `@Configurable(name, tips)` and `@ConfigHeader(value)` on a field.
pub fn translation_keys(field: &FieldDescriptor) -> Vec<KeyRef<'_>> {
    const SOURCES: [(&str, &str, bool); 3] = [
        (CONFIGURABLE, "name", false),
        (CONFIGURABLE, "tips", true),
        (CONFIG_HEADER, "value", false),
    ];
    let mut out = Vec::new();
    for (qualified, attribute, many) in SOURCES {
        let Some(annotation) = field.annotation(qualified) else {
            continue;
        };
        let Some(value) = annotation.attribute(attribute) else {
            continue;
        };
        let keys = match value {
            AttributeValue::Array(_) if !many => Vec::new(),
            v => literal_keys(v),
        };
        out.extend(keys.into_iter().map(|key| KeyRef {
            annotation,
            attribute,
            key,
        }));
    }
    out
}

/// Fixes offered for a missing key.
pub fn fixes_for(lang: &dyn LangLookup, key: &str, default_namespace: &str) -> Vec<FixDescriptor> {
    let files = lang.files();
    if files.is_empty() {
        return vec![FixDescriptor::CreateLangFile {
            path: lang_file_path(default_namespace),
            key: key.to_string(),
            value: humanize(key),
        }];
    }
    files
        .into_iter()
        .map(|f| FixDescriptor::AddLangKey {
            path: f.path.to_string_lossy().to_string(),
            namespace: f.namespace,
            key: key.to_string(),
            value: humanize(key),
        })
        .collect()
}

pub fn check_field(
    ctx: &CheckContext<'_>,
    lang: &dyn LangLookup,
    default_namespace: &str,
    class: &ClassDescriptor,
    field: &FieldDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    for r in translation_keys(field) {
        if lang.find_key(r.key).is_some() {
            continue;
        }
        out.push(Diagnostic {
            rule: RULE_ID.to_string(),
            severity: Severity::Warning,
            message: format!("Missing translation key '{}' in language files", r.key),
            location: locate(
                ctx.tree,
                class,
                Some(field.name.as_str()),
                Some(r.annotation),
                Some(r.attribute),
                field.position,
            ),
            fixes: fixes_for(lang, r.key, default_namespace),
        });
    }
}

fn write_lang(path: &Path, obj: Map<String, Json>) -> Result<()> {
    let mut text = serde_json::to_string_pretty(&Json::Object(obj))
        .map_err(|e| Error::parse(path.to_string_lossy(), e))?;
    text.push('\n');
    fs::write(path, text).map_err(|e| Error::io(path, e))
}

/// Apply an `AddLangKey` or `CreateLangFile` fix below `root`. Returns
/// whether a file changed; other fix kinds and present keys are no-ops.
pub fn apply_fix(root: &Path, fix: &FixDescriptor) -> Result<bool> {
    let (path, key, value) = match fix {
        FixDescriptor::AddLangKey { path, key, value, .. }
        | FixDescriptor::CreateLangFile { path, key, value } => (path, key, value),
        _ => return Ok(false),
    };
    let target = root.join(path);
    let mut obj = if target.exists() {
        let data = fs::read_to_string(&target).map_err(|e| Error::io(&target, e))?;
        if data.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Json>(&data) {
                Ok(Json::Object(obj)) => obj,
                Ok(_) => return Err(Error::parse(path.as_str(), "language file is not a JSON object")),
                Err(e) => return Err(Error::parse(path.as_str(), e)),
            }
        }
    } else {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        Map::new()
    };
    if obj.contains_key(key) {
        return Ok(false);
    }
    obj.insert(key.clone(), Json::String(value.clone()));
    write_lang(&target, obj)?;
    Ok(true)
}
