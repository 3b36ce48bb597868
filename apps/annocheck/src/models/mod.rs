//! Shared data models: the source-tree snapshot and check outputs.

pub mod diagnostic;
pub mod tree;

pub use diagnostic::{
    AnnotationTemplate, Diagnostic, ElementRef, FixDescriptor, Location, MethodStub, Severity,
    TargetKind,
};

use serde::Serialize;

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
/// Aggregated check summary used by printers.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub files: usize,
}

impl Summary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic], files: usize) -> Self {
        let mut s = Summary {
            files,
            ..Summary::default()
        };
        for d in diagnostics {
            match d.severity {
                Severity::Error => s.errors += 1,
                Severity::Warning => s.warnings += 1,
                Severity::Info => s.infos += 1,
            }
        }
        s
    }
}

#[derive(Serialize, Debug, Default, Clone)]
/// Check results container.
pub struct CheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub summary: Summary,
}
