//! `@RPCPacket("id")` cross-reference.
//!
//! Calls to `RPCPacketDistributor.rpcTo*` carry a literal packet id followed
//! by the packet arguments. The id is looked up in a project-wide
//! [`PacketIndex`] and the remaining arguments are checked against the
//! parameters of the packet method, minus a leading `RPCSender`.

use super::{locate, CheckContext, RuleKind};
use crate::annotations::{RPC_DISTRIBUTOR, RPC_PACKET, RPC_SENDER};
use crate::compat::{is_exactly, is_type_compatible, type_description};
use crate::models::tree::{CallSite, ClassDescriptor, MethodDescriptor, SourceTree};
use crate::models::{Diagnostic, FixDescriptor, Severity};
use crate::types::JavaType;
use log::debug;
use std::collections::BTreeMap;

const PACKET_ID: &str = "value";
const CALL_PREFIX: &str = "rpcTo";

/// Packet methods keyed by their `@RPCPacket` id. The first declaration of
/// an id wins; later duplicates are ignored.
#[derive(Debug, Default, Clone)]
pub struct PacketIndex {
    packets: BTreeMap<String, MethodDescriptor>,
}

impl PacketIndex {
    pub fn from_trees<'a>(trees: impl IntoIterator<Item = &'a SourceTree>) -> Self {
        let mut index = PacketIndex::default();
        for tree in trees {
            for (_, method) in tree.all_methods() {
                let Some(id) = packet_id_of(method) else {
                    continue;
                };
                if index.packets.contains_key(id) {
                    debug!("rpc: duplicate packet id '{}' on {}.{}", id, method.owner, method.name);
                    continue;
                }
                index.packets.insert(id.to_string(), method.clone());
            }
        }
        index
    }

    pub fn lookup(&self, id: &str) -> Option<&MethodDescriptor> {
        self.packets.get(id)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

/// Literal `@RPCPacket` id declared on `method`.
pub fn packet_id_of(method: &MethodDescriptor) -> Option<&str> {
    method.annotation(RPC_PACKET)?.string_literal(PACKET_ID)
}

fn is_distributor_call(call: &CallSite) -> bool {
    call.method.starts_with(CALL_PREFIX) && is_exactly(&JavaType::class(&call.class), RPC_DISTRIBUTOR)
}

/// Position of the packet id among the call arguments.
fn id_index(call: &CallSite) -> usize {
    match call.method.as_str() {
        "rpcToPlayer" | "rpcToTracking" => 1,
        _ => 0,
    }
}

/// Literal packet id sent by a distributor call, if any.
pub fn call_packet_id(call: &CallSite) -> Option<&str> {
    if !is_distributor_call(call) {
        return None;
    }
    call.arguments
        .get(id_index(call))?
        .literal
        .as_ref()?
        .as_str()
}

/// Parameters the caller has to supply; a leading `RPCSender` is injected.
pub fn effective_parameters(method: &MethodDescriptor) -> &[crate::models::tree::Parameter] {
    match method.parameters.split_first() {
        Some((first, rest)) if is_exactly(&first.ty, RPC_SENDER) => rest,
        _ => &method.parameters,
    }
}

pub fn check(ctx: &CheckContext<'_>, class: &ClassDescriptor, out: &mut Vec<Diagnostic>) {
    for call in &class.calls {
        let Some(id) = call_packet_id(call) else {
            continue;
        };
        let Some(packet) = ctx.packets.lookup(id) else {
            debug!("rpc: no packet method for id '{}' in {}", id, class.name);
            continue;
        };
        let expected = effective_parameters(packet);
        let actual = &call.arguments[id_index(call) + 1..];
        let mut report = |message: String| {
            out.push(Diagnostic {
                rule: RuleKind::RpcPacket.id().to_string(),
                severity: Severity::Warning,
                message,
                location: locate(ctx.tree, class, call.caller.as_deref(), None, None, call.position),
                fixes: vec![FixDescriptor::NoFixAvailable],
            })
        };
        if expected.len() != actual.len() {
            report(format!(
                "Arguments count mismatch. Expected {}, but got {}.",
                expected.len(),
                actual.len()
            ));
            continue;
        }
        for (param, arg) in expected.iter().zip(actual) {
            let Some(arg_ty) = arg.ty.as_ref().filter(|t| t.is_known()) else {
                continue;
            };
            if !is_type_compatible(ctx.hierarchy, &param.ty, arg_ty) {
                report(format!(
                    "Argument type mismatch. Expected '{}', but got '{}'.",
                    type_description(&param.ty),
                    type_description(arg_ty)
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::models::tree::{Argument, AttributeValue};
    use pretty_assertions::assert_eq;

    fn lit(s: &str) -> Argument {
        Argument {
            literal: Some(AttributeValue::Str(s.to_string())),
            ty: Some(JavaType::class("String")),
        }
    }

    fn typed(t: &str) -> Argument {
        Argument {
            literal: None,
            ty: Some(JavaType::parse(t)),
        }
    }

    fn call(method: &str, arguments: Vec<Argument>) -> CallSite {
        CallSite {
            caller: Some("sync".into()),
            method: method.into(),
            class: RPC_DISTRIBUTOR.into(),
            arguments,
            position: None,
            owner: String::new(),
        }
    }

    fn tree(calls: Vec<CallSite>) -> SourceTree {
        let mut client = ClassDescriptor::new("com.acme.Client");
        client.calls = calls;
        SourceTree::from_classes(vec![
            ClassDescriptor::new("com.acme.Packets").method(
                MethodDescriptor::new(
                    "onSync",
                    "void",
                    &["com.lowdragmc.lowdraglib2.syncdata.rpc.RPCSender", "int", "String"],
                )
                .annotated(annotated(RPC_PACKET, &[("value", "sync")])),
            ),
            client,
        ])
    }

    #[test]
    fn test_matching_call_is_clean() {
        let diags = run(
            &tree(vec![call("rpcToServer", vec![lit("sync"), typed("Integer"), typed("String")])]),
            RuleKind::RpcPacket,
        );
        assert!(diags.is_empty(), "{:?}", messages(&diags));
    }

    #[test]
    fn test_player_variant_reads_id_at_second_position() {
        let diags = run(
            &tree(vec![call(
                "rpcToPlayer",
                vec![typed("net.minecraft.server.level.ServerPlayer"), lit("sync"), typed("int")],
            )]),
            RuleKind::RpcPacket,
        );
        assert_eq!(messages(&diags), vec!["Arguments count mismatch. Expected 2, but got 1."]);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].location.member.as_deref(), Some("sync"));
    }

    #[test]
    fn test_type_mismatch_reports_each_argument() {
        let diags = run(
            &tree(vec![call("rpcToServer", vec![lit("sync"), typed("String"), typed("int")])]),
            RuleKind::RpcPacket,
        );
        assert_eq!(
            messages(&diags),
            vec![
                "Argument type mismatch. Expected 'int', but got 'String'.",
                "Argument type mismatch. Expected 'String', but got 'int'.",
            ]
        );
    }

    #[test]
    fn test_unknown_id_non_literal_and_other_classes_are_ignored() {
        let mut foreign = call("rpcToServer", vec![lit("sync")]);
        foreign.class = "com.other.Distributor".into();
        let diags = run(
            &tree(vec![
                call("rpcToServer", vec![lit("missing"), typed("int")]),
                call("rpcToServer", vec![typed("String"), typed("int")]),
                call("rpcToPlayer", vec![typed("Object")]),
                foreign,
            ]),
            RuleKind::RpcPacket,
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_index_spans_trees_and_keeps_first_declaration() {
        let a = SourceTree::from_classes(vec![ClassDescriptor::new("a.A").method(
            MethodDescriptor::new("first", "void", &["int"]).annotated(annotated(RPC_PACKET, &[("value", "p")])),
        )]);
        let b = SourceTree::from_classes(vec![ClassDescriptor::new("b.B").method(
            MethodDescriptor::new("second", "void", &[]).annotated(annotated(RPC_PACKET, &[("value", "p")])),
        )]);
        let index = PacketIndex::from_trees([&a, &b]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("p").map(|m| m.name.as_str()), Some("first"));
    }
}
