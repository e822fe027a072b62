//! Conservative side-effect detection.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ast::{Ast, BinaryOperator, NodeId, NodeKind, UnaryOperator};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SideEffectOptions {
    /// Treat every property read as a possible getter call.
    pub consider_getters: bool,
    /// Treat operators that coerce non-literal operands as possible
    /// `valueOf`/`toString` calls.
    pub consider_implicit_type_conversion: bool,
}

/// Child slots to visit per node type.
///
/// Types without an entry fall back to every child slot of the node.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct VisitorKeys {
    keys: HashMap<String, Vec<String>>,
}

impl VisitorKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I, S>(mut self, node_type: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys
            .insert(node_type.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn get(&self, node_type: &str) -> Option<&[String]> {
        self.keys.get(node_type).map(Vec::as_slice)
    }

    fn children(&self, kind: &NodeKind) -> Vec<NodeId> {
        let slots = kind.slots();
        match self.get(kind.type_name()) {
            Some(keys) => keys
                .iter()
                .filter_map(|key| slots.iter().find(|(name, _)| name == key))
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect(),
            None => slots.into_iter().flat_map(|(_, ids)| ids).collect(),
        }
    }
}

/// Whether evaluating `node` may have an observable effect.
pub fn has_side_effect(
    ast: &Ast,
    node: NodeId,
    visitor_keys: &VisitorKeys,
    options: SideEffectOptions,
) -> bool {
    SideEffectVisitor {
        ast,
        visitor_keys,
        options,
    }
    .visit(node)
}

struct SideEffectVisitor<'a> {
    ast: &'a Ast,
    visitor_keys: &'a VisitorKeys,
    options: SideEffectOptions,
}

impl SideEffectVisitor<'_> {
    fn visit(&self, node: NodeId) -> bool {
        let conversions = self.options.consider_implicit_type_conversion;
        match self.ast.kind(node) {
            NodeKind::ArrowFunctionExpression(_) | NodeKind::FunctionExpression(_) => false,
            NodeKind::AssignmentExpression { .. }
            | NodeKind::AwaitExpression { .. }
            | NodeKind::CallExpression { .. }
            | NodeKind::ImportExpression { .. }
            | NodeKind::NewExpression { .. }
            | NodeKind::UpdateExpression { .. }
            | NodeKind::YieldExpression { .. } => true,
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } if conversions
                && converts_operands(*operator)
                && !(self.is_literal(*left) && self.is_literal(*right)) =>
            {
                true
            }
            NodeKind::MemberExpression { .. } if self.options.consider_getters => true,
            NodeKind::MemberExpression {
                property,
                computed: true,
                ..
            } if conversions && !self.is_literal(*property) => true,
            NodeKind::Property {
                key,
                computed: true,
                ..
            }
            | NodeKind::MethodDefinition {
                key,
                computed: true,
                ..
            }
            | NodeKind::PropertyDefinition {
                key,
                computed: true,
                ..
            } if conversions && !self.is_literal(*key) => true,
            NodeKind::UnaryExpression {
                operator: UnaryOperator::Delete,
                ..
            } => true,
            NodeKind::UnaryExpression { operator, argument }
                if conversions
                    && matches!(
                        operator,
                        UnaryOperator::Minus
                            | UnaryOperator::Plus
                            | UnaryOperator::Not
                            | UnaryOperator::BitNot
                    )
                    && !self.is_literal(*argument) =>
            {
                true
            }
            kind => self
                .visitor_keys
                .children(kind)
                .into_iter()
                .any(|child| self.visit(child)),
        }
    }

    fn is_literal(&self, node: NodeId) -> bool {
        matches!(self.ast.kind(node), NodeKind::Literal(_))
    }
}

fn converts_operands(operator: BinaryOperator) -> bool {
    !matches!(
        operator,
        BinaryOperator::StrictEq
            | BinaryOperator::StrictNotEq
            | BinaryOperator::Exp
            | BinaryOperator::InstanceOf
    )
}
