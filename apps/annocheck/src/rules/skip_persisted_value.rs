//! `@SkipPersistedValue(field = "...")` on `boolean f(T value)`.

use super::target_field::{self, TargetRule};
use super::{CheckContext, RuleKind};
use crate::compat::is_boolean_type;
use crate::models::tree::{ClassDescriptor, MethodDescriptor};
use crate::models::Diagnostic;

const RULE: TargetRule = TargetRule {
    kind: RuleKind::SkipPersistedValue,
    returns: "boolean",
    return_ok: is_boolean_type,
};

pub fn check(
    ctx: &CheckContext<'_>,
    class: &ClassDescriptor,
    method: &MethodDescriptor,
    out: &mut Vec<Diagnostic>,
) {
    target_field::check(ctx, &RULE, class, method, out);
}
