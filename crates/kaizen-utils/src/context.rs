//! Read-only view over a lowered tree and its scope analysis.

use serde::Serialize;
use swc_common::Span;

use crate::ast::{Ast, NodeId};
use crate::scope::{ScopeId, ScopeManager};

/// 1-based line, 1-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub ast: &'a Ast,
    pub scopes: &'a ScopeManager,
}

impl<'a> Context<'a> {
    pub fn new(ast: &'a Ast, scopes: &'a ScopeManager) -> Self {
        Self { ast, scopes }
    }

    pub fn global_scope(&self) -> ScopeId {
        self.scopes.global_scope()
    }

    /// Innermost scope containing `node`.
    pub fn scope_of(&self, node: NodeId) -> ScopeId {
        crate::find_variable::get_innermost_scope(self.scopes, self.ast, self.global_scope(), node)
    }

    pub fn span_to_location(&self, span: Span) -> Location {
        let source = self.ast.source();
        let lo = span.lo.0 as usize;

        if source.is_empty() || lo == 0 {
            return Location { line: 1, column: 1 };
        }

        let prefix = &source[..lo.min(source.len())];
        let line = prefix.matches('\n').count() + 1;
        let last_newline = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = lo - last_newline + 1;

        Location { line, column }
    }

    pub fn get_source_text(&self, span: Span) -> Option<&'a str> {
        let source = self.ast.source();
        let lo = span.lo.0 as usize;
        let hi = span.hi.0 as usize;

        if lo <= hi && hi <= source.len() {
            source.get(lo..hi)
        } else {
            None
        }
    }

    pub fn node_text(&self, node: NodeId) -> &'a str {
        self.ast.source_text(node)
    }
}
