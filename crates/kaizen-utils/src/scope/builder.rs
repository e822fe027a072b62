//! Scope builder walking the lowered tree
//!
//! Declarations are recorded as they are met and references are kept
//! pending on their scope until it closes. Resolution at close time makes
//! hoisting order irrelevant: a reference resolves against the closing
//! scope's `set` or is handed to the enclosing scope.

use std::collections::HashMap;

use id_arena::Arena;
use indexmap::IndexMap;

use super::{
    Definition, DefinitionKind, Reference, ReferenceFlags, ReferenceId, Scope, ScopeId,
    ScopeKind, ScopeManager, ScopeOptions, Variable, VariableId,
};
use crate::ast::{Ast, Function, Literal, LiteralValue, NodeId, NodeKind, SourceType, VariableKind};

pub struct ScopeBuilder<'a> {
    ast: &'a Ast,
    scopes: Arena<Scope>,
    variables: Arena<Variable>,
    references: Arena<Reference>,
    node_scopes: HashMap<NodeId, Vec<ScopeId>>,
    global: ScopeId,
    current: ScopeId,
    /// Unresolved references per open scope, innermost last.
    pending: Vec<Vec<ReferenceId>>,
}

struct PatternTarget {
    identifier: NodeId,
    /// Enclosing `AssignmentPattern`s, outermost first.
    assignments: Vec<NodeId>,
}

#[derive(Default)]
struct PatternInfo {
    targets: Vec<PatternTarget>,
    /// Expressions inside the pattern evaluated as ordinary reads.
    right_hand: Vec<NodeId>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionFlavor {
    Declaration,
    Expression,
    Arrow,
}

impl<'a> ScopeBuilder<'a> {
    pub fn new(ast: &'a Ast, options: &ScopeOptions) -> Self {
        let mut scopes = Arena::new();
        let root = ast.root();
        let strict = match ast.kind(root) {
            NodeKind::Program { body, .. } => has_use_strict(ast, body),
            _ => false,
        };
        let global = scopes.alloc_with_id(|id| Scope {
            id,
            kind: ScopeKind::Global,
            block: root,
            upper: None,
            child_scopes: Vec::new(),
            set: IndexMap::new(),
            variables: Vec::new(),
            references: Vec::new(),
            through: Vec::new(),
            variable_scope: id,
            strict,
        });

        let mut builder = Self {
            ast,
            scopes,
            variables: Arena::new(),
            references: Arena::new(),
            node_scopes: HashMap::from([(root, vec![global])]),
            global,
            current: global,
            pending: vec![Vec::new()],
        };
        for name in &options.globals {
            builder.declare_variable(global, name);
        }
        builder
    }

    pub fn build(mut self) -> ScopeManager {
        let ast = self.ast;
        let root = ast.root();
        if let NodeKind::Program { body, .. } = ast.kind(root) {
            let module = ast.source_type() == SourceType::Module;
            if module {
                self.nest(ScopeKind::Module, root);
            }
            for &stmt in body {
                self.visit(stmt);
            }
            if module {
                self.close();
            }
        }
        self.close();

        ScopeManager {
            scopes: self.scopes,
            variables: self.variables,
            references: self.references,
            global: self.global,
            node_scopes: self.node_scopes,
        }
    }

    // ---- scope stack ----

    fn nest(&mut self, kind: ScopeKind, block: NodeId) -> ScopeId {
        let upper = self.current;
        let upper_strict = self.scopes[upper].strict;
        let upper_variable_scope = self.scopes[upper].variable_scope;
        let strict = upper_strict
            || matches!(kind, ScopeKind::Module | ScopeKind::Class)
            || (kind == ScopeKind::Function && self.function_has_use_strict(block));

        let id = self.scopes.alloc_with_id(|id| Scope {
            id,
            kind,
            block,
            upper: Some(upper),
            child_scopes: Vec::new(),
            set: IndexMap::new(),
            variables: Vec::new(),
            references: Vec::new(),
            through: Vec::new(),
            variable_scope: if kind.is_variable_scope() {
                id
            } else {
                upper_variable_scope
            },
            strict,
        });
        self.scopes[upper].child_scopes.push(id);
        self.node_scopes.entry(block).or_default().push(id);
        self.pending.push(Vec::new());
        self.current = id;
        id
    }

    fn close(&mut self) {
        let ast = self.ast;
        let scope = self.current;
        let left = self.pending.pop().unwrap_or_default();

        for reference in left {
            let identifier = self.references[reference].identifier;
            let name = ast.kind(identifier).identifier_name().unwrap_or_default();
            match self.scopes[scope].set.get(name).copied() {
                Some(variable) => {
                    self.references[reference].resolved = Some(variable);
                    self.variables[variable].references.push(reference);
                }
                None => {
                    self.scopes[scope].through.push(reference);
                    if let Some(upper) = self.pending.last_mut() {
                        upper.push(reference);
                    }
                }
            }
        }

        if let Some(upper) = self.scopes[scope].upper {
            self.current = upper;
        }
    }

    // ---- bindings ----

    fn declare_variable(&mut self, scope: ScopeId, name: &str) -> VariableId {
        if let Some(&id) = self.scopes[scope].set.get(name) {
            return id;
        }
        let id = self.variables.alloc_with_id(|id| Variable {
            id,
            name: name.to_string(),
            scope,
            identifiers: Vec::new(),
            defs: Vec::new(),
            references: Vec::new(),
        });
        self.scopes[scope].set.insert(name.to_string(), id);
        self.scopes[scope].variables.push(id);
        id
    }

    fn define(&mut self, scope: ScopeId, def: Definition) {
        let ast = self.ast;
        let Some(name) = ast.kind(def.name).identifier_name() else {
            return;
        };
        if name.is_empty() {
            return;
        }
        let variable = self.declare_variable(scope, name);
        let variable = &mut self.variables[variable];
        variable.identifiers.push(def.name);
        variable.defs.push(def);
    }

    fn reference(
        &mut self,
        identifier: NodeId,
        flags: ReferenceFlags,
        write_expr: Option<NodeId>,
        init: bool,
    ) {
        match self.ast.kind(identifier).identifier_name() {
            Some(name) if !name.is_empty() => {}
            _ => return,
        }
        let from = self.current;
        let id = self.references.alloc_with_id(|id| Reference {
            id,
            identifier,
            from,
            resolved: None,
            flags,
            init,
            write_expr,
        });
        self.scopes[from].references.push(id);
        if let Some(pending) = self.pending.last_mut() {
            pending.push(id);
        }
    }

    fn reference_default_values(&mut self, target: &PatternTarget, init: bool) {
        let ast = self.ast;
        for &assignment in &target.assignments {
            if let NodeKind::AssignmentPattern { right, .. } = ast.kind(assignment) {
                self.reference(target.identifier, ReferenceFlags::Write, Some(*right), init);
            }
        }
    }

    fn visit_all(&mut self, nodes: &[NodeId]) {
        for &node in nodes {
            self.visit(node);
        }
    }

    // ---- traversal ----

    fn visit_children(&mut self, node: NodeId) {
        for child in self.ast.children(node) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: NodeId) {
        let ast = self.ast;
        match ast.kind(node) {
            NodeKind::Identifier { .. } => {
                self.reference(node, ReferenceFlags::Read, None, false);
            }
            NodeKind::FunctionDeclaration(function) => {
                if let Some(id) = function.id {
                    self.define(
                        self.current,
                        Definition {
                            kind: DefinitionKind::FunctionName,
                            name: id,
                            node,
                            parent: None,
                            declaration_kind: None,
                        },
                    );
                }
                self.visit_function(node, function, FunctionFlavor::Declaration);
            }
            NodeKind::FunctionExpression(function) => {
                self.visit_function(node, function, FunctionFlavor::Expression);
            }
            NodeKind::ArrowFunctionExpression(function) => {
                self.visit_function(node, function, FunctionFlavor::Arrow);
            }
            NodeKind::ClassDeclaration(class) => {
                if let Some(id) = class.id {
                    self.define(
                        self.current,
                        Definition {
                            kind: DefinitionKind::ClassName,
                            name: id,
                            node,
                            parent: None,
                            declaration_kind: None,
                        },
                    );
                }
                self.visit_class(node, class.id, class.super_class, class.body);
            }
            NodeKind::ClassExpression(class) => {
                self.visit_class(node, class.id, class.super_class, class.body);
            }
            NodeKind::MethodDefinition {
                key,
                value,
                computed,
                ..
            }
            | NodeKind::Property {
                key,
                value,
                computed,
                ..
            } => {
                if *computed {
                    self.visit(*key);
                }
                self.visit(*value);
            }
            NodeKind::PropertyDefinition {
                key,
                value,
                computed,
                ..
            } => {
                if *computed {
                    self.visit(*key);
                }
                if let Some(value) = *value {
                    self.nest(ScopeKind::ClassFieldInitializer, value);
                    self.visit(value);
                    self.close();
                }
            }
            NodeKind::StaticBlock { body } => {
                self.nest(ScopeKind::ClassStaticBlock, node);
                self.visit_all(body);
                self.close();
            }
            NodeKind::MemberExpression {
                object,
                property,
                computed,
                ..
            } => {
                self.visit(*object);
                if *computed {
                    self.visit(*property);
                }
            }
            NodeKind::MetaProperty { .. } => {}
            NodeKind::LabeledStatement { body, .. } => self.visit(*body),
            NodeKind::BreakStatement { .. } | NodeKind::ContinueStatement { .. } => {}
            NodeKind::BlockStatement { body } => {
                self.nest(ScopeKind::Block, node);
                self.visit_all(body);
                self.close();
            }
            NodeKind::CatchClause { param, body } => {
                self.nest(ScopeKind::Catch, node);
                if let Some(param) = *param {
                    let info = collect_pattern(ast, param);
                    for target in &info.targets {
                        self.define(
                            self.current,
                            Definition {
                                kind: DefinitionKind::CatchClause,
                                name: target.identifier,
                                node,
                                parent: None,
                                declaration_kind: None,
                            },
                        );
                        self.reference_default_values(target, true);
                    }
                    self.visit_all(&info.right_hand);
                }
                self.visit(*body);
                self.close();
            }
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            } => {
                self.visit(*discriminant);
                self.nest(ScopeKind::Switch, node);
                self.visit_all(cases);
                self.close();
            }
            NodeKind::WithStatement { object, body } => {
                self.visit(*object);
                self.nest(ScopeKind::With, node);
                self.visit(*body);
                self.close();
            }
            NodeKind::ForStatement { init, .. } => {
                let lexical = init.is_some_and(|init| is_lexical_declaration(ast, init));
                if lexical {
                    self.nest(ScopeKind::For, node);
                }
                self.visit_children(node);
                if lexical {
                    self.close();
                }
            }
            NodeKind::ForInStatement { left, right, body }
            | NodeKind::ForOfStatement {
                left, right, body, ..
            } => self.visit_for_in(node, *left, *right, *body),
            NodeKind::VariableDeclaration { kind, declarations } => {
                self.visit_variable_declaration(node, *kind, declarations);
            }
            NodeKind::AssignmentExpression {
                operator,
                left,
                right,
            } => {
                let target = unwrap_ts(ast, *left);
                if is_pattern(ast, target) {
                    if *operator == crate::ast::AssignmentOperator::Assign {
                        let info = collect_pattern(ast, target);
                        for target in &info.targets {
                            self.reference_default_values(target, false);
                            self.reference(
                                target.identifier,
                                ReferenceFlags::Write,
                                Some(*right),
                                false,
                            );
                        }
                        self.visit_all(&info.right_hand);
                    } else {
                        self.reference(target, ReferenceFlags::ReadWrite, Some(*right), false);
                    }
                } else {
                    self.visit(*left);
                }
                self.visit(*right);
            }
            NodeKind::UpdateExpression { argument, .. } => {
                let target = unwrap_ts(ast, *argument);
                if matches!(ast.kind(target), NodeKind::Identifier { .. }) {
                    self.reference(target, ReferenceFlags::ReadWrite, None, false);
                } else {
                    self.visit(*argument);
                }
            }
            NodeKind::ImportDeclaration { specifiers, .. } => {
                for &specifier in specifiers {
                    let local = match ast.kind(specifier) {
                        NodeKind::ImportSpecifier { local, .. }
                        | NodeKind::ImportDefaultSpecifier { local }
                        | NodeKind::ImportNamespaceSpecifier { local } => *local,
                        _ => continue,
                    };
                    self.define(
                        self.current,
                        Definition {
                            kind: DefinitionKind::ImportBinding,
                            name: local,
                            node: specifier,
                            parent: Some(node),
                            declaration_kind: None,
                        },
                    );
                }
            }
            NodeKind::ExportNamedDeclaration {
                declaration,
                specifiers,
                source,
            } => {
                if source.is_some() {
                    return;
                }
                match declaration {
                    Some(declaration) => self.visit(*declaration),
                    None => self.visit_all(specifiers),
                }
            }
            NodeKind::ExportSpecifier { local, .. } => self.visit(*local),
            NodeKind::ExportAllDeclaration { .. } => {}
            _ => self.visit_children(node),
        }
    }

    fn visit_function(&mut self, node: NodeId, function: &Function, flavor: FunctionFlavor) {
        let ast = self.ast;
        let named_expression = flavor == FunctionFlavor::Expression && function.id.is_some();
        if named_expression {
            self.nest(ScopeKind::FunctionExpressionName, node);
            if let Some(id) = function.id {
                self.define(
                    self.current,
                    Definition {
                        kind: DefinitionKind::FunctionName,
                        name: id,
                        node,
                        parent: None,
                        declaration_kind: None,
                    },
                );
            }
        }

        let scope = self.nest(ScopeKind::Function, node);
        if flavor != FunctionFlavor::Arrow {
            self.declare_variable(scope, "arguments");
        }

        for &param in &function.params {
            let info = collect_pattern(ast, param);
            for target in &info.targets {
                self.define(
                    scope,
                    Definition {
                        kind: DefinitionKind::Parameter,
                        name: target.identifier,
                        node,
                        parent: None,
                        declaration_kind: None,
                    },
                );
                self.reference_default_values(target, true);
            }
            self.visit_all(&info.right_hand);
        }

        if let Some(body) = function.body {
            match ast.kind(body) {
                NodeKind::BlockStatement { body } => self.visit_all(body),
                _ => self.visit(body),
            }
        }

        self.close();
        if named_expression {
            self.close();
        }
    }

    fn visit_class(
        &mut self,
        node: NodeId,
        id: Option<NodeId>,
        super_class: Option<NodeId>,
        body: NodeId,
    ) {
        self.nest(ScopeKind::Class, node);
        if let Some(id) = id {
            self.define(
                self.current,
                Definition {
                    kind: DefinitionKind::ClassName,
                    name: id,
                    node,
                    parent: None,
                    declaration_kind: None,
                },
            );
        }
        if let Some(super_class) = super_class {
            self.visit(super_class);
        }
        self.visit(body);
        self.close();
    }

    fn visit_variable_declaration(
        &mut self,
        node: NodeId,
        kind: VariableKind,
        declarations: &[NodeId],
    ) {
        let ast = self.ast;
        let target_scope = if kind == VariableKind::Var {
            self.scopes[self.current].variable_scope
        } else {
            self.current
        };

        for &declarator in declarations {
            let NodeKind::VariableDeclarator { id, init } = ast.kind(declarator) else {
                continue;
            };
            let info = collect_pattern(ast, *id);
            for target in &info.targets {
                self.define(
                    target_scope,
                    Definition {
                        kind: DefinitionKind::Variable,
                        name: target.identifier,
                        node: declarator,
                        parent: Some(node),
                        declaration_kind: Some(kind),
                    },
                );
                self.reference_default_values(target, true);
                if let Some(init) = *init {
                    self.reference(target.identifier, ReferenceFlags::Write, Some(init), true);
                }
            }
            self.visit_all(&info.right_hand);
            if let Some(init) = *init {
                self.visit(init);
            }
        }
    }

    fn visit_for_in(&mut self, node: NodeId, left: NodeId, right: NodeId, body: NodeId) {
        let ast = self.ast;
        let lexical = is_lexical_declaration(ast, left);
        if lexical {
            self.nest(ScopeKind::For, node);
        }

        if let NodeKind::VariableDeclaration { declarations, .. } = ast.kind(left) {
            self.visit(left);
            let first = declarations.first().and_then(|&d| match ast.kind(d) {
                NodeKind::VariableDeclarator { id, .. } => Some(*id),
                _ => None,
            });
            if let Some(pattern) = first {
                for target in collect_pattern(ast, pattern).targets {
                    self.reference(target.identifier, ReferenceFlags::Write, Some(right), true);
                }
            }
        } else {
            let info = collect_pattern(ast, unwrap_ts(ast, left));
            for target in &info.targets {
                self.reference_default_values(target, false);
                self.reference(target.identifier, ReferenceFlags::Write, Some(right), false);
            }
            self.visit_all(&info.right_hand);
        }

        self.visit(right);
        self.visit(body);
        if lexical {
            self.close();
        }
    }

    fn function_has_use_strict(&self, block: NodeId) -> bool {
        let ast = self.ast;
        let Some(function) = ast.kind(block).as_function() else {
            return false;
        };
        match function.body.map(|body| ast.kind(body)) {
            Some(NodeKind::BlockStatement { body }) => has_use_strict(ast, body),
            _ => false,
        }
    }
}

/// Directive prologue contains `"use strict"`.
fn has_use_strict(ast: &Ast, body: &[NodeId]) -> bool {
    for &stmt in body {
        let NodeKind::ExpressionStatement { expression } = ast.kind(stmt) else {
            break;
        };
        let NodeKind::Literal(Literal {
            value: LiteralValue::String(_),
            raw,
        }) = ast.kind(*expression)
        else {
            break;
        };
        if ast.get(*expression).parens > 0 {
            break;
        }
        if raw.len() >= 2 && &raw[1..raw.len() - 1] == "use strict" {
            return true;
        }
    }
    false
}

fn is_lexical_declaration(ast: &Ast, node: NodeId) -> bool {
    matches!(
        ast.kind(node),
        NodeKind::VariableDeclaration { kind, .. } if *kind != VariableKind::Var
    )
}

fn is_pattern(ast: &Ast, node: NodeId) -> bool {
    matches!(
        ast.kind(node),
        NodeKind::Identifier { .. }
            | NodeKind::ObjectPattern { .. }
            | NodeKind::ArrayPattern { .. }
            | NodeKind::RestElement { .. }
            | NodeKind::AssignmentPattern { .. }
            | NodeKind::SpreadElement { .. }
    )
}

fn unwrap_ts(ast: &Ast, mut node: NodeId) -> NodeId {
    while let Some(inner) = ast.kind(node).ts_wrapped_expression() {
        node = inner;
    }
    node
}

fn collect_pattern(ast: &Ast, root: NodeId) -> PatternInfo {
    let mut info = PatternInfo::default();
    let mut assignments = Vec::new();
    walk_pattern(ast, root, &mut assignments, &mut info);
    info
}

fn walk_pattern(ast: &Ast, node: NodeId, assignments: &mut Vec<NodeId>, info: &mut PatternInfo) {
    match ast.kind(node) {
        NodeKind::Identifier { .. } => info.targets.push(PatternTarget {
            identifier: node,
            assignments: assignments.clone(),
        }),
        NodeKind::Property {
            key,
            value,
            computed,
            ..
        } => {
            if *computed {
                info.right_hand.push(*key);
            }
            walk_pattern(ast, *value, assignments, info);
        }
        NodeKind::ArrayPattern { elements } => {
            for &element in elements.iter().flatten() {
                walk_pattern(ast, element, assignments, info);
            }
        }
        NodeKind::ObjectPattern { properties } => {
            for &property in properties {
                walk_pattern(ast, property, assignments, info);
            }
        }
        NodeKind::AssignmentPattern { left, right } => {
            assignments.push(node);
            walk_pattern(ast, *left, assignments, info);
            info.right_hand.push(*right);
            assignments.pop();
        }
        NodeKind::RestElement { argument } | NodeKind::SpreadElement { argument } => {
            walk_pattern(ast, *argument, assignments, info);
        }
        NodeKind::MemberExpression {
            object,
            property,
            computed,
            ..
        } => {
            if *computed {
                info.right_hand.push(*property);
            }
            info.right_hand.push(*object);
        }
        kind => match kind.ts_wrapped_expression() {
            Some(inner) => walk_pattern(ast, inner, assignments, info),
            None => info.right_hand.push(node),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ParsedFile;
    use crate::scope::{DefinitionKind, ScopeKind};

    #[test]
    fn class_name_is_defined_inside_and_outside() {
        let file = ParsedFile::from_source("test.js", "class A extends B { m() { return A; } }");
        let defs: Vec<_> = file
            .scopes()
            .variables()
            .filter(|v| v.name == "A")
            .map(|v| (file.scopes().get(v.scope).kind, v.defs[0].kind))
            .collect();

        assert_eq!(
            defs,
            vec![
                (ScopeKind::Module, DefinitionKind::ClassName),
                (ScopeKind::Class, DefinitionKind::ClassName),
            ]
        );
        let inner = file
            .scopes()
            .variables()
            .find(|v| v.name == "A" && file.scopes().get(v.scope).kind == ScopeKind::Class)
            .unwrap();
        assert_eq!(inner.references.len(), 1);
    }

    #[test]
    fn for_of_declaration_writes_with_right_side() {
        let file = ParsedFile::from_source("test.js", "for (const x of list) x;");
        let x = file.scopes().variables().find(|v| v.name == "x").unwrap();
        let refs: Vec<_> = file.scopes().references_of(x.id).collect();

        assert_eq!(refs.len(), 2);
        assert!(refs[0].init && refs[0].is_write());
        assert!(refs[0].write_expr.is_some());
        assert!(refs[1].is_read_only());
    }

    #[test]
    fn default_values_are_read_in_the_parameter_scope() {
        let file = ParsedFile::from_source("test.js", "const d = 1; function f({ a = d }) {}");
        let d = file.scopes().variables().find(|v| v.name == "d").unwrap();
        let a = file.scopes().variables().find(|v| v.name == "a").unwrap();

        assert_eq!(d.references.len(), 2);
        assert_eq!(a.references.len(), 1);
        assert!(file.scopes().reference(a.references[0]).init);
    }

    #[test]
    fn member_assignment_reads_the_object() {
        let file = ParsedFile::from_source("test.js", "const o = {}; o.x = 1; o[k] += 2;");
        let o = file.scopes().variables().find(|v| v.name == "o").unwrap();
        let reads = file
            .scopes()
            .references_of(o.id)
            .filter(|r| r.is_read_only())
            .count();

        assert_eq!(reads, 2);
    }

    #[test]
    fn export_specifier_reads_local_binding() {
        let file = ParsedFile::from_source(
            "test.js",
            "const a = 1; export { a as b }; export { c } from 'm';",
        );
        let a = file.scopes().variables().find(|v| v.name == "a").unwrap();

        assert_eq!(a.references.len(), 2);
        assert!(!file.scopes().variables().any(|v| v.name == "c"));
    }

    #[test]
    fn catch_param_lives_in_catch_scope() {
        let file = ParsedFile::from_source("test.js", "try {} catch (e) { e; }");
        let e = file.scopes().variables().find(|v| v.name == "e").unwrap();

        assert_eq!(file.scopes().get(e.scope).kind, ScopeKind::Catch);
        assert_eq!(e.defs[0].kind, DefinitionKind::CatchClause);
        assert_eq!(e.references.len(), 1);
    }
}
