//! Output rendering for check, fix, markers and rules commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-item fields and a top-level summary.

use crate::dependency::RuleRegistry;
use crate::engine;
use crate::fix::FixResult;
use crate::models::{CheckResult, FixDescriptor, Location, Severity};
use crate::rules::RuleKind;
use crate::usage::Marker;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn stderr_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if stderr_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if stderr_colors() {
        "note:".yellow().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if stderr_colors() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

fn print_json(value: &JsonVal) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// `file:line:col` followed by `Class.member`.
pub fn location_text(loc: &Location) -> String {
    let mut at = loc.file.clone();
    if let Some(line) = loc.line {
        at.push_str(&format!(":{}", line));
        if let Some(col) = loc.column.filter(|c| *c > 0) {
            at.push_str(&format!(":{}", col));
        }
    }
    if loc.class.is_empty() {
        return at;
    }
    let class = crate::types::simple_name(&loc.class);
    match &loc.member {
        Some(member) => format!("{} {}.{}", at, class, member),
        None => format!("{} {}", at, class),
    }
}

fn severity_tag(sev: Severity, color: bool) -> (String, String) {
    let (tag, icon) = match sev {
        Severity::Error => ("⟦error⟧", "✖"),
        Severity::Warning => ("⟦warn⟧", "▲"),
        Severity::Info => ("⟦info⟧", "◆"),
    };
    if !color {
        return (tag.to_string(), icon.to_string());
    }
    match sev {
        Severity::Error => (tag.red().bold().to_string(), icon.red().to_string()),
        Severity::Warning => (tag.yellow().bold().to_string(), icon.yellow().to_string()),
        Severity::Info => (tag.blue().bold().to_string(), icon.blue().to_string()),
    }
}

/// Print check results in the requested format.
pub fn print_check(res: &CheckResult, output: &str) {
    match output {
        "json" => print_json(&compose_check_json(res)),
        _ => {
            let color = use_colors(output);
            for d in &res.diagnostics {
                let (sev, icon) = severity_tag(d.severity, color);
                let at = location_text(&d.location);
                let at = if color { at.bold().to_string() } else { at };
                println!("{} {} {} ❲{}❳ — {}", icon, sev, at, d.rule, d.message);
                for fix in d.fixes.iter().filter(|f| **f != FixDescriptor::NoFixAvailable) {
                    if color {
                        println!("    {} {}", "fix:".green(), fix.title());
                    } else {
                        println!("    fix: {}", fix.title());
                    }
                }
            }
            let summary = format!(
                "— Summary — errors={} warnings={} infos={} files={}",
                res.summary.errors, res.summary.warnings, res.summary.infos, res.summary.files
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print fix results. Without `write`, rewritten snapshots are previewed.
pub fn print_fixes(results: &[FixResult], output: &str, write: bool) {
    match output {
        "json" => print_json(&compose_fix_json(results, write)),
        _ => {
            let color = use_colors(output);
            for r in results {
                if r.applied.is_empty() {
                    if color {
                        println!("{} {}", "no fixes:".bright_black(), r.file);
                    } else {
                        println!("no fixes: {}", r.file);
                    }
                    continue;
                }
                let head = if write { "fixed:" } else { "would fix:" };
                if color {
                    println!("{} {}", head.green().bold(), r.file.bold());
                } else {
                    println!("{} {}", head, r.file);
                }
                for title in &r.applied {
                    println!("    {}", title);
                }
                if let Some(prev) = &r.preview {
                    if color {
                        println!("{} {}\n{}", "---".cyan().bold(), r.file.bold(), prev);
                    } else {
                        println!("--- {}\n{}", r.file, prev);
                    }
                }
            }
        }
    }
}

/// Print navigation markers.
pub fn print_markers(markers: &[Marker], output: &str) {
    match output {
        "json" => print_json(&compose_markers_json(markers)),
        _ => {
            let color = use_colors(output);
            for m in markers {
                let at = location_text(&m.location);
                if color {
                    println!("{} {}", at.bold(), m.tooltip.cyan());
                } else {
                    println!("{} {}", at, m.tooltip);
                }
                for t in &m.targets {
                    let member = t.element.member.as_deref().unwrap_or("");
                    let line = t.line.map(|l| format!(":{}", l)).unwrap_or_default();
                    println!("    → {}{} {}.{}", t.file, line, t.element.class, member);
                }
            }
        }
    }
}

/// Print the rule table and the active dependency rules.
pub fn print_rules(registry: &RuleRegistry, output: &str) {
    match output {
        "json" => print_json(&compose_rules_json(registry)),
        _ => {
            let color = use_colors(output);
            for kind in RuleKind::ALL {
                let id = if color {
                    kind.id().bold().to_string()
                } else {
                    kind.id().to_string()
                };
                println!("{:<28} @{:<20} {}", id, kind.display_name(), kind.description());
            }
            for id in [
                crate::dependency::RULE_ID,
                crate::type_check::RULE_ID,
                crate::lang::RULE_ID,
                engine::LOAD_RULE_ID,
            ] {
                println!("{}", id);
            }
            println!();
            for d in registry.dependencies() {
                println!("{} [{}] {}", crate::annotations::at_simple(&d.source), d.severity, d.description);
            }
        }
    }
}

/// Compose check JSON object (pure) for testing/snapshot purposes.
pub fn compose_check_json(res: &CheckResult) -> JsonVal {
    serde_json::to_value(res).unwrap_or(JsonVal::Null)
}

/// Compose fix JSON object (pure) for testing/snapshot purposes.
pub fn compose_fix_json(results: &[FixResult], write: bool) -> JsonVal {
    let items: Vec<_> = results
        .iter()
        .map(|r| {
            json!({
                "file": r.file,
                "applied": r.applied,
                "changed": r.changed,
                "wrote": r.wrote,
                "preview": if write { None } else { r.preview.as_ref() },
            })
        })
        .collect();
    let summary = json!({
        "changed": results.iter().filter(|r| r.changed).count(),
        "fixes": results.iter().map(|r| r.applied.len()).sum::<usize>(),
        "wrote": results.iter().filter(|r| r.wrote).count(),
        "total": results.len(),
    });
    json!({"results": items, "summary": summary})
}

pub fn compose_markers_json(markers: &[Marker]) -> JsonVal {
    json!({ "markers": markers, "total": markers.len() })
}

pub fn compose_rules_json(registry: &RuleRegistry) -> JsonVal {
    let rules: Vec<_> = RuleKind::ALL
        .iter()
        .map(|k| {
            json!({
                "id": k.id(),
                "annotation": k.annotation(),
                "description": k.description(),
            })
        })
        .collect();
    let dependencies: Vec<_> = registry
        .dependencies()
        .iter()
        .map(|d| {
            json!({
                "source": d.source,
                "required": d.required,
                "description": d.description,
                "severity": d.severity,
            })
        })
        .collect();
    json!({ "rules": rules, "checks": engine::rule_ids(), "dependencies": dependencies })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnostic, Summary};
    use pretty_assertions::assert_eq;

    fn diagnostic() -> Diagnostic {
        Diagnostic {
            rule: "config-list".into(),
            severity: Severity::Error,
            message: "ConfigList configurator method 'buildItems' cannot be static".into(),
            location: Location {
                file: "snapshots/Machine.json".into(),
                class: "com.acme.Machine".into(),
                member: Some("items".into()),
                annotation: Some("@ConfigList".into()),
                attribute: Some("configuratorMethod".into()),
                line: Some(12),
                column: Some(5),
            },
            fixes: vec![FixDescriptor::RemoveStaticModifier {
                class: "com.acme.Machine".into(),
                method: "buildItems".into(),
                parameters: Vec::new(),
            }],
        }
    }

    #[test]
    fn test_location_text() {
        assert_eq!(
            location_text(&diagnostic().location),
            "snapshots/Machine.json:12:5 Machine.items"
        );
        let bare = Location {
            file: "broken.json".into(),
            ..Location::default()
        };
        assert_eq!(location_text(&bare), "broken.json");
    }

    #[test]
    fn test_compose_check_json_shape() {
        let res = CheckResult {
            diagnostics: vec![diagnostic()],
            summary: Summary {
                errors: 1,
                warnings: 0,
                infos: 0,
                files: 1,
            },
        };
        let out = compose_check_json(&res);
        assert_eq!(out["summary"]["errors"], 1);
        assert_eq!(out["diagnostics"][0]["severity"], "error");
        assert_eq!(out["diagnostics"][0]["location"]["attribute"], "configuratorMethod");
        assert_eq!(out["diagnostics"][0]["fixes"][0]["kind"], "remove-static-modifier");
    }

    #[test]
    fn test_compose_fix_json_write_and_preview() {
        let results = vec![
            FixResult {
                file: "a.json".into(),
                applied: vec!["Add @DescSynced".into()],
                changed: true,
                wrote: false,
                preview: Some("{}".into()),
            },
            FixResult {
                file: "b.json".into(),
                ..FixResult::default()
            },
        ];
        let out = compose_fix_json(&results, false);
        assert_eq!(out["summary"]["changed"], 1);
        assert_eq!(out["summary"]["fixes"], 1);
        assert!(out["results"][0]["preview"].is_string());
        let out = compose_fix_json(&results, true);
        assert!(out["results"][0]["preview"].is_null());
    }

    #[test]
    fn test_compose_rules_json_lists_every_check() {
        let out = compose_rules_json(&RuleRegistry::builtin());
        assert_eq!(out["rules"].as_array().map(Vec::len), Some(RuleKind::ALL.len()));
        assert_eq!(out["dependencies"].as_array().map(Vec::len), Some(9));
        assert_eq!(out["checks"][9], "annotation-dependency");
    }
}
