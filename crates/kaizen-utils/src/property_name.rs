//! Static names of member accesses and property keys.

use crate::ast::{NodeId, NodeKind};
use crate::context::Context;
use crate::scope::ScopeId;
use crate::static_value::get_string_if_constant;

/// Name of the property accessed by a member expression or defined by an
/// object property, method or class field.
///
/// Private names are never reported. Computed keys are evaluated, with
/// identifiers resolved only when `scope` is given.
pub fn get_property_name(
    ctx: &Context<'_>,
    node: NodeId,
    scope: Option<ScopeId>,
) -> Option<String> {
    let ast = ctx.ast;
    let (key, computed) = match ast.kind(node) {
        NodeKind::MemberExpression {
            property, computed, ..
        } => (*property, *computed),
        NodeKind::Property { key, computed, .. }
        | NodeKind::MethodDefinition { key, computed, .. }
        | NodeKind::PropertyDefinition { key, computed, .. } => (*key, *computed),
        _ => return None,
    };

    if computed {
        return get_string_if_constant(ctx, key, scope);
    }
    match ast.kind(key) {
        NodeKind::Identifier { name } => Some(name.clone()),
        NodeKind::Literal(_) => get_string_if_constant(ctx, key, None),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsedFile;

    fn names(code: &str, type_name: &str, with_scope: bool) -> Vec<Option<String>> {
        let file = ParsedFile::from_source("test.js", code);
        let ctx = file.context();
        let scope = with_scope.then(|| ctx.global_scope());
        file.ast()
            .iter()
            .filter(|n| n.type_name() == type_name)
            .map(|n| get_property_name(&ctx, n.id, scope))
            .collect()
    }

    fn name(code: &str, type_name: &str) -> Option<String> {
        names(code, type_name, true).into_iter().next().flatten()
    }

    #[test]
    fn member_expressions() {
        assert_eq!(name("a.b", "MemberExpression"), Some("b".to_string()));
        assert_eq!(name("a['b']", "MemberExpression"), Some("b".to_string()));
        assert_eq!(name("a[`b`]", "MemberExpression"), Some("b".to_string()));
        assert_eq!(name("a[1 + 1]", "MemberExpression"), Some("2".to_string()));
        assert_eq!(name("a[b]", "MemberExpression"), None);
    }

    #[test]
    fn computed_names_resolve_constants_only_with_a_scope() {
        let code = "const key = 'k'; a[key];";
        assert_eq!(names(code, "MemberExpression", true), vec![Some("k".to_string())]);
        assert_eq!(names(code, "MemberExpression", false), vec![None]);
    }

    #[test]
    fn object_properties_and_literal_keys() {
        assert_eq!(name("({ a: 1 })", "Property"), Some("a".to_string()));
        assert_eq!(name("({ 'a b': 1 })", "Property"), Some("a b".to_string()));
        assert_eq!(name("({ 0x10: 1 })", "Property"), Some("16".to_string()));
        assert_eq!(name("({ 1n: 1 })", "Property"), Some("1".to_string()));
        assert_eq!(name("({ [`x${1}`]: 1 })", "Property"), Some("x1".to_string()));
        assert_eq!(name("({ [unknownName]: 1 })", "Property"), None);
    }

    #[test]
    fn class_members() {
        let code = "class A { foo() {} static ['bar']() {} #secret = 1; baz = 2; }";
        let methods = names(code, "MethodDefinition", true);
        assert_eq!(methods, vec![Some("foo".to_string()), Some("bar".to_string())]);
        let fields = names(code, "PropertyDefinition", true);
        assert_eq!(fields, vec![None, Some("baz".to_string())]);
    }

    #[test]
    fn private_member_access_is_unknown() {
        let code = "class A { #x; m() { return this.#x; } }";
        assert_eq!(names(code, "MemberExpression", true), vec![None]);
    }

    #[test]
    fn other_nodes_have_no_name() {
        assert_eq!(name("f()", "CallExpression"), None);
    }
}
