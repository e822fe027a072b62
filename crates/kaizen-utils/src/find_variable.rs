//! Variable lookup along the scope chain.

use crate::ast::{Ast, NodeId};
use crate::scope::{ScopeId, ScopeManager, VariableId};

/// What to look up: a bare name, or an identifier node whose position also
/// selects the innermost scope to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableQuery<'q> {
    Name(&'q str),
    Node(NodeId),
}

impl<'q> From<&'q str> for VariableQuery<'q> {
    fn from(name: &'q str) -> Self {
        VariableQuery::Name(name)
    }
}

impl<'q> From<&'q String> for VariableQuery<'q> {
    fn from(name: &'q String) -> Self {
        VariableQuery::Name(name)
    }
}

impl From<NodeId> for VariableQuery<'_> {
    fn from(node: NodeId) -> Self {
        VariableQuery::Node(node)
    }
}

/// Scope nearest to `node` among the descendants of `initial`.
///
/// Descends into the child scope whose block contains the node's start
/// offset until no child matches.
pub fn get_innermost_scope(
    scopes: &ScopeManager,
    ast: &Ast,
    initial: ScopeId,
    node: NodeId,
) -> ScopeId {
    let location = ast.get(node).start();
    let mut scope = initial;

    'descend: loop {
        for &child in &scopes.get(scope).child_scopes {
            let block = ast.get(scopes.get(child).block);
            if block.start() <= location && location < block.end() {
                scope = child;
                continue 'descend;
            }
        }
        return scope;
    }
}

pub fn find_variable<'q>(
    scopes: &ScopeManager,
    ast: &Ast,
    initial: ScopeId,
    query: impl Into<VariableQuery<'q>>,
) -> Option<VariableId> {
    let (name, start) = match query.into() {
        VariableQuery::Name(name) => (name, initial),
        VariableQuery::Node(node) => (
            ast.kind(node).identifier_name().unwrap_or_default(),
            get_innermost_scope(scopes, ast, initial, node),
        ),
    };

    scopes
        .ancestors(start)
        .find_map(|scope| scope.set.get(name).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::ParsedFile;
    use crate::scope::ScopeKind;

    fn identifiers<'a>(file: &'a ParsedFile, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        file.ast()
            .iter()
            .filter(move |n| {
                matches!(&n.kind, NodeKind::Identifier { name: ident } if ident == name)
            })
            .map(|n| n.id)
    }

    #[test]
    fn finds_by_name_from_module_scope() {
        let file = ParsedFile::from_source("test.js", "var a = 1;");
        let scopes = file.scopes();
        let module = scopes.get(scopes.global_scope()).child_scopes[0];

        let found = find_variable(scopes, file.ast(), module, "a");

        assert!(found.is_some());
        assert_eq!(scopes.variable(found.unwrap()).name, "a");
    }

    #[test]
    fn name_lookup_does_not_descend() {
        let file = ParsedFile::from_source("test.js", "function f() { var inner; }");
        let scopes = file.scopes();

        assert!(find_variable(scopes, file.ast(), scopes.global_scope(), "inner").is_none());
    }

    #[test]
    fn node_lookup_starts_from_innermost_scope() {
        let code = "let a = 1; function f() { let a = 2; a; }";
        let file = ParsedFile::from_source("test.js", code);
        let scopes = file.scopes();
        let inner_use = identifiers(&file, "a").last().unwrap();

        let found = find_variable(scopes, file.ast(), scopes.global_scope(), inner_use).unwrap();

        assert_eq!(scopes.get(scopes.variable(found).scope).kind, ScopeKind::Function);
    }

    #[test]
    fn innermost_scope_is_idempotent() {
        let code = "function f() { { let x; x; } }";
        let file = ParsedFile::from_source("test.js", code);
        let scopes = file.scopes();
        let ast = file.ast();
        let x = identifiers(&file, "x").last().unwrap();

        let from_global = get_innermost_scope(scopes, ast, scopes.global_scope(), x);
        let again = get_innermost_scope(scopes, ast, from_global, x);

        assert_eq!(from_global, again);
        assert_eq!(scopes.get(from_global).kind, ScopeKind::Block);
        assert_eq!(
            find_variable(scopes, ast, scopes.global_scope(), x),
            find_variable(scopes, ast, from_global, x)
        );
    }

    #[test]
    fn unknown_name_is_none() {
        let file = ParsedFile::from_source("test.js", "a;");
        let scopes = file.scopes();

        assert!(find_variable(scopes, file.ast(), scopes.global_scope(), "nothing").is_none());
    }
}
