//! Redundant parentheses around expressions.
//!
//! Lowering strips explicit parentheses and counts them on the wrapped
//! node, so the syntactic parentheses of `if (a)`, `while (a)`, `f(a)` and
//! friends never show up here.

use crate::ast::{Ast, NodeId};
use crate::error::MisuseError;

pub fn is_parenthesized(ast: &Ast, node: NodeId) -> bool {
    ast.get(node).parens >= 1
}

/// Whether `node` is wrapped in at least `times` pairs of parentheses.
pub fn is_parenthesized_times(ast: &Ast, times: u32, node: NodeId) -> Result<bool, MisuseError> {
    if times == 0 {
        return Err(MisuseError::NonPositiveParenCount);
    }
    Ok(ast.get(node).parens >= times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::parser::ParsedFile;

    fn find(file: &ParsedFile, text: &str) -> NodeId {
        let ctx = file.context();
        file.ast()
            .iter()
            .filter(|n| {
                !matches!(
                    n.kind,
                    NodeKind::Program { .. } | NodeKind::ExpressionStatement { .. }
                )
            })
            .find(|n| ctx.node_text(n.id) == text)
            .map(|n| n.id)
            .unwrap_or_else(|| panic!("no node with text {text:?}"))
    }

    fn check(code: &str, cases: &[(&str, bool)]) {
        let file = ParsedFile::from_source("test.js", code);
        for &(text, expected) in cases {
            assert_eq!(
                is_parenthesized(file.ast(), find(&file, text)),
                expected,
                "`{text}` in `{code}`"
            );
        }
    }

    #[test]
    fn plain_expressions() {
        check("777", &[("777", false)]);
        check("(777)", &[("777", true)]);
        check("(777 + 223)", &[("777 + 223", true), ("777", false)]);
        check("((777) + 223)", &[("(777) + 223", true), ("777", true), ("223", false)]);
        check("(f())", &[("f()", true), ("f", false)]);
    }

    #[test]
    fn call_and_new_arguments() {
        check("f(a)", &[("a", false)]);
        check("f((a))", &[("a", true)]);
        check("f((a),b)", &[("a", true), ("b", false)]);
        check("new f(a)", &[("a", false)]);
        check("new f((a))", &[("a", true)]);
    }

    #[test]
    fn statement_heads_are_not_parentheses() {
        check("do f(); while (a)", &[("a", false)]);
        check("do (f()); while ((a))", &[("a", true), ("f()", true)]);
        check("if (a) b()", &[("a", false), ("b()", false)]);
        check("if ((a)) (b())", &[("a", true), ("b()", true)]);
        check("while ((a)) b()", &[("a", true)]);
        check("switch (a) {}", &[("a", false)]);
        check("switch ((a)) {}", &[("a", true)]);
        check("import(a)", &[("a", false)]);
    }

    #[test]
    fn catch_params_and_program_are_never_parenthesized() {
        let file = ParsedFile::from_source("test.js", "try {} catch (a) {}");
        assert!(!is_parenthesized(file.ast(), find(&file, "a")));
        assert!(!is_parenthesized(file.ast(), file.ast().root()));
    }

    #[test]
    fn counts_nested_pairs() {
        let file = ParsedFile::from_source("test.js", "((777))");
        let ast = file.ast();
        let node = find(&file, "777");

        assert_eq!(is_parenthesized_times(ast, 1, node), Ok(true));
        assert_eq!(is_parenthesized_times(ast, 2, node), Ok(true));
        assert_eq!(is_parenthesized_times(ast, 3, node), Ok(false));
    }

    #[test]
    fn zero_times_is_rejected() {
        let file = ParsedFile::from_source("test.js", "(a)");
        let node = find(&file, "a");
        assert_eq!(
            is_parenthesized_times(file.ast(), 0, node),
            Err(MisuseError::NonPositiveParenCount)
        );
    }
}
