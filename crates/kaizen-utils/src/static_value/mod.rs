//! Static evaluation of expressions.
//!
//! A narrow interpreter for side-effect-free expression forms. Anything it
//! cannot prove is reported as `None`, which is distinct from a known
//! `undefined` value. Host built-ins are only reached through the sandbox in
//! [`builtins`].

mod builtins;
mod number;
mod operators;
mod value;

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::ast::{
    Ast, BinaryOperator, Literal, LiteralValue, LogicalOperator, NodeId, NodeKind, PropertyKind,
    UnaryOperator, VariableKind,
};
use crate::context::Context;
use crate::find_variable::find_variable;
use crate::regexp::parse_literal;
use crate::scope::{DefinitionKind, ScopeId, ScopeManager, Variable, VariableId};

pub use builtins::{Builtin, CallPolicy};
pub use value::{
    ArrayValue, IntegrityLevel, IteratorKind, IteratorValue, JsString, MapValue, Namespace,
    ObjectValue, PropertyKey, RegExpValue, SetValue, Symbol, Value,
};

use builtins::{call, construct, get_property, global_value, iterate, own_enumerable_entries};
use value::*;

const MAX_DEPTH: usize = 512;

/// Static `Object` methods that lock their first argument.
const LOCKING_METHODS: &[&str] = &["freeze", "preventExtensions", "seal"];

/// Methods that change the receiver in place.
const MUTATING_METHODS: &[&str] = &[
    "push",
    "pop",
    "shift",
    "unshift",
    "splice",
    "sort",
    "reverse",
    "fill",
    "copyWithin",
    "add",
    "set",
    "delete",
    "clear",
];

/// A statically known value.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticValue {
    pub value: Value,
    /// Set when an optional chain short-circuited; `value` is then
    /// `undefined`.
    pub optional: bool,
}

impl StaticValue {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            optional: false,
        }
    }

    fn short_circuit() -> Self {
        Self {
            value: Value::Undefined,
            optional: true,
        }
    }
}

/// Evaluates `node` if its value can be known without running the program.
///
/// Identifiers are only resolved when `scope` is given; lookups start at
/// the innermost scope below it that contains the identifier.
pub fn get_static_value(
    ctx: &Context<'_>,
    node: NodeId,
    scope: Option<ScopeId>,
) -> Option<StaticValue> {
    let mut evaluator = Evaluator::new(*ctx, scope);
    match evaluator.eval(node) {
        Ok(value) => Some(value),
        Err(err) => {
            trace!(node = ctx.ast.get(node).type_name(), %err, "not statically determinable");
            None
        }
    }
}

/// The string form of `node`'s static value, as `String(value)` renders it.
///
/// Regex and bigint literals are rendered from their source text.
pub fn get_string_if_constant(
    ctx: &Context<'_>,
    node: NodeId,
    scope: Option<ScopeId>,
) -> Option<String> {
    if let NodeKind::Literal(literal) = ctx.ast.kind(node) {
        match &literal.value {
            LiteralValue::RegExp { pattern, flags } => return Some(format!("/{pattern}/{flags}")),
            LiteralValue::BigInt(digits) => return Some(digits.clone()),
            _ => {}
        }
    }
    let evaluated = get_static_value(ctx, node, scope)?;
    to_display_string(&evaluated.value)
        .ok()
        .map(|s| s.to_rust_lossy())
}

struct Evaluator<'a> {
    ctx: Context<'a>,
    scope: Option<ScopeId>,
    depth: usize,
    in_progress: Vec<VariableId>,
    constants: HashMap<VariableId, Option<StaticValue>>,
}

impl<'a> Evaluator<'a> {
    fn new(ctx: Context<'a>, scope: Option<ScopeId>) -> Self {
        Self {
            ctx,
            scope,
            depth: 0,
            in_progress: Vec::new(),
            constants: HashMap::new(),
        }
    }

    fn eval(&mut self, node: NodeId) -> EvalResult<StaticValue> {
        if self.depth >= MAX_DEPTH {
            debug!(depth = self.depth, "static evaluation too deep");
            return unsupported("expression nesting too deep");
        }
        self.depth += 1;
        let result = self.eval_node(node);
        self.depth -= 1;
        result
    }

    fn value(&mut self, node: NodeId) -> EvalResult<Value> {
        self.eval(node).map(|v| v.value)
    }

    fn eval_node(&mut self, node: NodeId) -> EvalResult<StaticValue> {
        let ast = self.ctx.ast;
        match ast.kind(node) {
            NodeKind::ExpressionStatement { expression } => self.eval(*expression),
            NodeKind::Identifier { .. } => self.identifier(node),
            NodeKind::Literal(literal) => literal_value(literal).map(StaticValue::new),
            NodeKind::ArrayExpression { elements } => {
                let items = self.element_values(elements)?;
                if items.len() > MAX_ARRAY_LENGTH {
                    return range_error("Invalid array length");
                }
                Ok(StaticValue::new(Value::array_with_holes(items)))
            }
            NodeKind::ObjectExpression { properties } => self.object(properties),
            NodeKind::TemplateLiteral {
                quasis,
                expressions,
            } => self.template(quasis, expressions),
            NodeKind::TaggedTemplateExpression { tag, quasi } => self.tagged_template(*tag, *quasi),
            NodeKind::BinaryExpression {
                operator: BinaryOperator::In | BinaryOperator::InstanceOf,
                ..
            } => unsupported("in/instanceof"),
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } => {
                let left = self.value(*left)?;
                let right = self.value(*right)?;
                operators::binary(*operator, &left, &right).map(StaticValue::new)
            }
            NodeKind::LogicalExpression {
                operator,
                left,
                right,
            } => {
                let left_value = self.eval(*left)?;
                let short_circuits = match operator {
                    LogicalOperator::Or => to_boolean(&left_value.value),
                    LogicalOperator::And => !to_boolean(&left_value.value),
                    LogicalOperator::Nullish => !left_value.value.is_nullish(),
                };
                if short_circuits {
                    Ok(left_value)
                } else {
                    self.eval(*right)
                }
            }
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                if to_boolean(&self.value(*test)?) {
                    self.eval(*consequent)
                } else {
                    self.eval(*alternate)
                }
            }
            NodeKind::UnaryExpression {
                operator: UnaryOperator::Delete,
                ..
            } => unsupported("delete"),
            NodeKind::UnaryExpression {
                operator: UnaryOperator::Void,
                ..
            } => Ok(StaticValue::new(Value::Undefined)),
            NodeKind::UnaryExpression { operator, argument } => {
                let argument = self.value(*argument)?;
                operators::unary(*operator, &argument).map(StaticValue::new)
            }
            NodeKind::AssignmentExpression {
                operator: crate::ast::AssignmentOperator::Assign,
                right,
                ..
            } => self.eval(*right),
            NodeKind::SequenceExpression { expressions } => match expressions.last() {
                Some(last) => self.eval(*last),
                None => unsupported("empty sequence"),
            },
            NodeKind::ChainExpression { expression } => {
                self.value(*expression).map(StaticValue::new)
            }
            NodeKind::MemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                if is_private(ast, *property) {
                    return unsupported("private member");
                }
                let base = self.eval(*object)?;
                if base.value.is_nullish() && (base.optional || *optional) {
                    return Ok(StaticValue::short_circuit());
                }
                let key = self.property_key(*property, *computed)?;
                get_property(&base.value, &key).map(StaticValue::new)
            }
            NodeKind::CallExpression {
                callee,
                arguments,
                optional,
            } => self.call_expression(*callee, arguments, *optional),
            NodeKind::NewExpression { callee, arguments } => {
                let callee = self.value(*callee)?;
                let args = self.argument_values(arguments)?;
                construct(&callee, &args).map(StaticValue::new)
            }
            kind => match kind.ts_wrapped_expression() {
                Some(inner) => self.eval(inner),
                None => unsupported(format!("{} node", kind.type_name())),
            },
        }
    }

    /// Elements of an array literal or argument list. Holes stay `None`;
    /// spreads are expanded through the iterator protocol.
    fn element_values(&mut self, elements: &[Option<NodeId>]) -> EvalResult<Vec<Option<Value>>> {
        let ast = self.ctx.ast;
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                None => values.push(None),
                Some(id) => match ast.kind(*id) {
                    NodeKind::SpreadElement { argument } => {
                        let source = self.value(*argument)?;
                        values.extend(iterate(&source)?.into_iter().map(Some));
                    }
                    _ => values.push(Some(self.value(*id)?)),
                },
            }
        }
        Ok(values)
    }

    fn argument_values(&mut self, arguments: &[NodeId]) -> EvalResult<Vec<Value>> {
        let elements: Vec<Option<NodeId>> = arguments.iter().copied().map(Some).collect();
        Ok(self
            .element_values(&elements)?
            .into_iter()
            .map(|v| v.unwrap_or(Value::Undefined))
            .collect())
    }

    fn property_key(&mut self, key: NodeId, computed: bool) -> EvalResult<PropertyKey> {
        if computed {
            let value = self.value(key)?;
            return to_property_key(&value);
        }
        match self.ctx.ast.kind(key) {
            NodeKind::Identifier { name } => Ok(PropertyKey::from(name.as_str())),
            NodeKind::Literal(literal) => to_property_key(&literal_value(literal)?),
            _ => unsupported("property key"),
        }
    }

    fn object(&mut self, properties: &[NodeId]) -> EvalResult<StaticValue> {
        let ast = self.ctx.ast;
        let mut object = ObjectValue::new();
        for &property in properties {
            match ast.kind(property) {
                NodeKind::Property {
                    key,
                    value,
                    kind: PropertyKind::Init,
                    computed,
                    shorthand,
                    ..
                } => {
                    let key = self.property_key(*key, *computed)?;
                    if !computed && !shorthand && key == PropertyKey::from("__proto__") {
                        return unsupported("prototype in object literal");
                    }
                    let value = self.value(*value)?;
                    object.insert(key, value);
                }
                NodeKind::SpreadElement { argument } => {
                    let source = self.value(*argument)?;
                    for (key, value) in own_enumerable_entries(&source)? {
                        object.insert(key, value);
                    }
                }
                _ => return unsupported("accessor property"),
            }
        }
        Ok(StaticValue::new(Value::Object(Rc::new(object))))
    }

    fn template(&mut self, quasis: &[NodeId], expressions: &[NodeId]) -> EvalResult<StaticValue> {
        let ast = self.ctx.ast;
        let values = expressions
            .iter()
            .map(|&expression| self.value(expression))
            .collect::<EvalResult<Vec<_>>>()?;

        let mut units: Vec<u16> = Vec::new();
        for (i, &quasi) in quasis.iter().enumerate() {
            match ast.kind(quasi) {
                NodeKind::TemplateElement {
                    cooked: Some(text), ..
                } => units.extend(text.encode_utf16()),
                _ => return unsupported("template without cooked text"),
            }
            if let Some(value) = values.get(i) {
                units.extend_from_slice(to_js_string(value)?.units());
            }
            check_string_length(units.len())?;
        }
        Ok(StaticValue::new(Value::String(JsString::from_units(units))))
    }

    fn tagged_template(&mut self, tag: NodeId, quasi: NodeId) -> EvalResult<StaticValue> {
        let ast = self.ctx.ast;
        let tag = self.value(tag)?;
        let NodeKind::TemplateLiteral {
            quasis,
            expressions,
        } = ast.kind(quasi)
        else {
            return unsupported("tagged template without template");
        };
        let substitutions = self.argument_values(expressions)?;
        if !matches!(&tag, Value::Function(builtin) if builtin.key() == "String.raw") {
            return unsupported("template tag");
        }

        let mut cooked = Vec::with_capacity(quasis.len());
        let mut raw = Vec::with_capacity(quasis.len());
        for &element in quasis {
            if let NodeKind::TemplateElement {
                cooked: text, raw: raw_text, ..
            } = ast.kind(element)
            {
                cooked.push(Some(match text {
                    Some(text) => Value::from(text.as_str()),
                    None => Value::Undefined,
                }));
                raw.push(Value::from(raw_text.as_str()));
            }
        }
        let strings = Value::Array(Rc::new(ArrayValue {
            elements: cooked,
            properties: IndexMap::from([(JsString::from("raw"), Value::array(raw))]),
            ..ArrayValue::default()
        }));

        let mut args = Vec::with_capacity(substitutions.len() + 1);
        args.push(strings);
        args.extend(substitutions);
        call(&tag, &Value::Undefined, &args).map(StaticValue::new)
    }

    fn call_expression(
        &mut self,
        callee: NodeId,
        arguments: &[NodeId],
        optional: bool,
    ) -> EvalResult<StaticValue> {
        let ast = self.ctx.ast;
        let args = self.argument_values(arguments)?;

        if let NodeKind::MemberExpression {
            object,
            property,
            computed,
            optional: member_optional,
        } = ast.kind(callee)
        {
            if is_private(ast, *property) {
                return unsupported("private method");
            }
            let receiver = self.eval(*object)?;
            if receiver.value.is_nullish() && (receiver.optional || optional || *member_optional) {
                return Ok(StaticValue::short_circuit());
            }
            let key = self.property_key(*property, *computed)?;
            let method = get_property(&receiver.value, &key)?;
            return call(&method, &receiver.value, &args).map(StaticValue::new);
        }

        let callee = self.eval(callee)?;
        if callee.value.is_nullish() && (callee.optional || optional) {
            return Ok(StaticValue::short_circuit());
        }
        call(&callee.value, &Value::Undefined, &args).map(StaticValue::new)
    }

    fn identifier(&mut self, node: NodeId) -> EvalResult<StaticValue> {
        let Some(scope) = self.scope else {
            return unsupported("identifier without scope");
        };
        let Context { ast, scopes } = self.ctx;
        let Some(id) = find_variable(scopes, ast, scope, node) else {
            return unsupported("unresolved identifier");
        };
        let variable = scopes.variable(id);

        if variable.defs.is_empty() {
            return match global_value(&variable.name) {
                Some(value) => Ok(StaticValue::new(value)),
                None => unsupported(format!("global {}", variable.name)),
            };
        }

        if let Some(cached) = self.constants.get(&id) {
            return match cached {
                Some(value) => Ok(value.clone()),
                None => unsupported(format!("binding {}", variable.name)),
            };
        }
        if self.in_progress.contains(&id) {
            debug!(name = %variable.name, "cyclic constant initializer");
            return unsupported("cyclic initializer");
        }

        let init = constant_initializer(ast, scopes, variable)?;
        self.in_progress.push(id);
        let result = self.eval(init).and_then(|value| {
            if !value.value.is_primitive() && is_mutated(ast, scopes, id) {
                debug!(name = %variable.name, "constant object is mutated");
                return unsupported("mutated object");
            }
            Ok(value)
        });
        self.in_progress.pop();

        self.constants.insert(id, result.as_ref().ok().cloned());
        result
    }
}

fn literal_value(literal: &Literal) -> EvalResult<Value> {
    match &literal.value {
        LiteralValue::Null => Ok(Value::Null),
        LiteralValue::Boolean(b) => Ok(Value::Bool(*b)),
        LiteralValue::Number(n) => Ok(Value::Number(*n)),
        LiteralValue::String(s) => Ok(Value::from(s.as_str())),
        LiteralValue::BigInt(digits) => match digits.parse::<i128>() {
            Ok(n) => Ok(Value::BigInt(n)),
            Err(_) => unsupported("bigint literal out of range"),
        },
        LiteralValue::RegExp { pattern, flags } => {
            match parse_literal(&format!("/{pattern}/{flags}")) {
                Ok(parsed) => Ok(Value::RegExp(Rc::new(RegExpValue::new(
                    pattern.clone(),
                    parsed,
                )))),
                Err(err) => {
                    debug!(%err, "regex literal rejected");
                    unsupported("regex literal")
                }
            }
        }
    }
}

fn is_private(ast: &Ast, property: NodeId) -> bool {
    matches!(ast.kind(property), NodeKind::PrivateIdentifier { .. })
}

/// Initializer of a binding that is never reassigned.
fn constant_initializer(
    ast: &Ast,
    scopes: &ScopeManager,
    variable: &Variable,
) -> EvalResult<NodeId> {
    let [def] = variable.defs.as_slice() else {
        return unsupported("multiple declarations");
    };
    if def.kind != DefinitionKind::Variable || def.parent.is_none() {
        return unsupported("not a variable declaration");
    }
    if def.declaration_kind != Some(VariableKind::Const) && !is_effectively_const(scopes, variable)
    {
        return unsupported("reassigned binding");
    }
    match ast.kind(def.node) {
        NodeKind::VariableDeclarator {
            id,
            init: Some(init),
        } if matches!(ast.kind(*id), NodeKind::Identifier { .. }) => Ok(*init),
        _ => unsupported("destructured or uninitialized binding"),
    }
}

/// One initializing write, every other reference a plain read.
fn is_effectively_const(scopes: &ScopeManager, variable: &Variable) -> bool {
    let mut total = 0;
    let mut inits = 0;
    let mut reads = 0;
    for reference in scopes.references_of(variable.id) {
        total += 1;
        if reference.init {
            inits += 1;
        } else if reference.is_read_only() {
            reads += 1;
        }
    }
    inits == 1 && inits + reads == total
}

fn is_mutated(ast: &Ast, scopes: &ScopeManager, variable: VariableId) -> bool {
    scopes
        .references_of(variable)
        .any(|reference| mutates_through(ast, reference.identifier))
}

/// Whether `identifier` is the root of a property path that is written,
/// deleted or used as the receiver of a mutating method.
fn mutates_through(ast: &Ast, identifier: NodeId) -> bool {
    let mut node = identifier;
    let mut through_member = false;
    while let Some(parent) = ast.parent(node) {
        match ast.kind(parent) {
            NodeKind::MemberExpression { object, .. } if *object == node => {
                through_member = true;
            }
            NodeKind::ChainExpression { .. } => {}
            kind if kind.ts_wrapped_expression() == Some(node) => {}
            _ => break,
        }
        node = parent;
    }
    if !through_member {
        return is_locked_by_call(ast, node);
    }
    let Some(parent) = ast.parent(node) else {
        return false;
    };
    match ast.kind(parent) {
        NodeKind::AssignmentExpression { left, .. } => *left == node,
        NodeKind::UpdateExpression { .. } => true,
        NodeKind::UnaryExpression {
            operator: UnaryOperator::Delete,
            ..
        } => true,
        NodeKind::ForInStatement { left, .. } | NodeKind::ForOfStatement { left, .. } => {
            *left == node
        }
        NodeKind::ArrayPattern { .. } | NodeKind::RestElement { .. } => true,
        NodeKind::AssignmentPattern { left, .. } => *left == node,
        NodeKind::Property { value, .. } => {
            *value == node
                && ast
                    .parent(parent)
                    .is_some_and(|p| matches!(ast.kind(p), NodeKind::ObjectPattern { .. }))
        }
        NodeKind::CallExpression { callee, .. } => *callee == node && calls_mutator(ast, node),
        _ => false,
    }
}

fn calls_mutator(ast: &Ast, callee: NodeId) -> bool {
    calls_method_among(ast, callee, MUTATING_METHODS)
}

/// `Object.freeze(value)` and friends change the integrity level in place.
fn is_locked_by_call(ast: &Ast, node: NodeId) -> bool {
    let Some(parent) = ast.parent(node) else {
        return false;
    };
    match ast.kind(parent) {
        NodeKind::CallExpression {
            callee, arguments, ..
        } => arguments.first() == Some(&node) && calls_method_among(ast, *callee, LOCKING_METHODS),
        _ => false,
    }
}

fn calls_method_among(ast: &Ast, callee: NodeId, methods: &[&str]) -> bool {
    let NodeKind::MemberExpression {
        property, computed, ..
    } = ast.kind(callee)
    else {
        return false;
    };
    let name = match ast.kind(*property) {
        NodeKind::Identifier { name } if !computed => Some(name.as_str()),
        NodeKind::Literal(Literal {
            value: LiteralValue::String(name),
            ..
        }) if *computed => Some(name.as_str()),
        _ => None,
    };
    // an unknown computed method name may be any of them
    name.is_none_or(|name| methods.contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsedFile;

    fn last_expression(file: &ParsedFile) -> NodeId {
        let ast = file.ast();
        let NodeKind::Program { body, .. } = ast.kind(ast.root()) else {
            panic!("expected program");
        };
        match ast.kind(*body.last().unwrap()) {
            NodeKind::ExpressionStatement { expression } => *expression,
            other => panic!("expected expression statement, got {}", other.type_name()),
        }
    }

    fn eval(code: &str) -> Option<StaticValue> {
        let file = ParsedFile::from_source("test.js", code);
        let ctx = file.context();
        get_static_value(&ctx, last_expression(&file), Some(ctx.global_scope()))
    }

    fn value(code: &str) -> Option<Value> {
        eval(code).map(|v| v.value)
    }

    fn string(code: &str) -> Option<String> {
        let file = ParsedFile::from_source("test.js", code);
        let ctx = file.context();
        get_string_if_constant(&ctx, last_expression(&file), Some(ctx.global_scope()))
    }

    #[test]
    fn evaluates_operators_with_coercion() {
        assert_eq!(value("1 + 2 * 3"), Some(Value::Number(7.0)));
        assert_eq!(value("'a' + 1"), Some(Value::from("a1")));
        assert_eq!(value("1n + 2n"), Some(Value::BigInt(3)));
        assert_eq!(value("'2' == 2"), Some(Value::Bool(true)));
        assert_eq!(value("typeof 'a'"), Some(Value::from("string")));
        assert_eq!(value("1n + 1"), None);
        assert_eq!(value("'a' in {}"), None);
    }

    #[test]
    fn known_undefined_differs_from_unknown() {
        assert_eq!(eval("void 0"), Some(StaticValue::new(Value::Undefined)));
        assert_eq!(eval("void unknownName()"), Some(StaticValue::new(Value::Undefined)));
        assert_eq!(eval("unknownName"), None);
        assert_eq!(value("undefined"), Some(Value::Undefined));
    }

    #[test]
    fn identifiers_need_a_scope() {
        let file = ParsedFile::from_source("test.js", "const a = 1; a");
        let ctx = file.context();

        assert_eq!(get_static_value(&ctx, last_expression(&file), None), None);
        assert_eq!(
            get_static_value(&ctx, last_expression(&file), Some(ctx.global_scope())),
            Some(StaticValue::new(Value::Number(1.0)))
        );
    }

    #[test]
    fn resolves_constants_and_effectively_constant_bindings() {
        assert_eq!(value("const a = [1, 2]; a.length"), Some(Value::Number(2.0)));
        assert_eq!(value("let b = 3; b * 2"), Some(Value::Number(6.0)));
        assert_eq!(value("let b = 3; b = 4; b"), None);
        assert_eq!(value("var c = 1; var c = 2; c"), None);
        assert_eq!(value("const { x } = { x: 1 }; x"), None);
        assert_eq!(value("function f() {} f"), None);
    }

    #[test]
    fn mutated_objects_are_not_constant() {
        assert_eq!(value("const o = { x: 1 }; o.x"), Some(Value::Number(1.0)));
        assert_eq!(value("const o = { x: 1 }; o.x = 2; o.x"), None);
        assert_eq!(value("const o = { x: { y: 1 } }; o.x.y++; o.x.y"), None);
        assert_eq!(value("const a = [3, 1]; a.sort(); a[0]"), None);
        assert_eq!(value("const a = [3, 1]; a.slice(); a[0]"), Some(Value::Number(3.0)));
        assert_eq!(value("const o = { x: 1 }; delete o.x; o"), None);
        assert_eq!(value("const s = 'ab'; s.length"), Some(Value::Number(2.0)));
    }

    #[test]
    fn constant_objects_keep_identity_within_one_evaluation() {
        assert_eq!(value("const a = []; a === a"), Some(Value::Bool(true)));
        assert_eq!(value("[] === []"), Some(Value::Bool(false)));
    }

    #[test]
    fn cyclic_initializers_are_unknown() {
        assert_eq!(value("const a = b; const b = a; a"), None);
    }

    #[test]
    fn deep_chains_hit_the_depth_limit() {
        fn chain_is_known(n: usize) -> bool {
            let mut code = String::from("const a0 = 1;\n");
            for i in 1..=n {
                code.push_str(&format!("const a{i} = a{};\n", i - 1));
            }
            code.push_str(&format!("a{n}"));
            value(&code).is_some()
        }

        let handle = std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(|| (chain_is_known(100), chain_is_known(600)))
            .unwrap();
        assert_eq!(handle.join().unwrap(), (true, false));
    }

    #[test]
    fn logical_and_conditional_expressions_short_circuit() {
        assert_eq!(value("0 || 'x'"), Some(Value::from("x")));
        assert_eq!(value("1 || unknownName"), Some(Value::Number(1.0)));
        assert_eq!(value("0 && unknownName"), Some(Value::Number(0.0)));
        assert_eq!(value("null ?? 2"), Some(Value::Number(2.0)));
        assert_eq!(value("1 && unknownName"), None);
        assert_eq!(value("true ? 1 : unknownName()"), Some(Value::Number(1.0)));
        assert_eq!(value("unknownName ? 1 : 1"), None);
    }

    #[test]
    fn sequence_and_assignment_use_their_last_value() {
        assert_eq!(value("(unknownName(), 2)"), Some(Value::Number(2.0)));
        assert_eq!(value("x = 5"), Some(Value::Number(5.0)));
        assert_eq!(value("x += 5"), None);
        assert_eq!(value("delete x.y"), None);
    }

    #[test]
    fn optional_chains_short_circuit() {
        let file = ParsedFile::from_source("test.js", "const a = null; a?.b.c");
        let ctx = file.context();
        let chain = last_expression(&file);
        let NodeKind::ChainExpression { expression } = file.ast().kind(chain) else {
            panic!("expected chain");
        };

        let inner = get_static_value(&ctx, *expression, Some(ctx.global_scope()));
        assert_eq!(
            inner,
            Some(StaticValue {
                value: Value::Undefined,
                optional: true
            })
        );
        let whole = get_static_value(&ctx, chain, Some(ctx.global_scope()));
        assert_eq!(whole, Some(StaticValue::new(Value::Undefined)));

        assert_eq!(value("const a = null; a.b"), None);
        assert_eq!(value("const a = null; (a?.b).c"), None);
        assert_eq!(value("const a = null; a?.toString()"), Some(Value::Undefined));
        assert_eq!(value("a?.()"), None);
        assert_eq!(value("const f = null; f?.()"), Some(Value::Undefined));
    }

    #[test]
    fn arrays_keep_holes_and_expand_spreads() {
        assert_eq!(
            value("[...[1, 2], , 3]"),
            Some(Value::array_with_holes(vec![
                Some(Value::Number(1.0)),
                Some(Value::Number(2.0)),
                None,
                Some(Value::Number(3.0)),
            ]))
        );
        assert_eq!(
            value("[...'ab']"),
            Some(Value::array(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(value("[...1]"), None);
        assert_eq!(value("[1, unknownName]"), None);
    }

    #[test]
    fn objects_take_init_properties_and_spreads() {
        assert_eq!(
            value("({ a: 1, ...{ b: 2, a: 3 }, ['c' + 1]: 4, 5: 6 })"),
            Some(Value::object([
                ("a", Value::Number(3.0)),
                ("b", Value::Number(2.0)),
                ("c1", Value::Number(4.0)),
                ("5", Value::Number(6.0)),
            ]))
        );
        assert_eq!(value("({ get a() { return 1; } })"), None);
        assert_eq!(value("({ f() {} })"), None);
        assert_eq!(value("({ __proto__: null })"), None);
        assert_eq!(value("({ ...null })"), Some(Value::object(Vec::<(&str, Value)>::new())));
    }

    #[test]
    fn templates_and_raw_strings() {
        assert_eq!(value("const n = 2; `a${n}b${[1, 2]}`"), Some(Value::from("a2b1,2")));
        assert_eq!(value("String.raw`a\\n${1}`"), Some(Value::from("a\\n1")));
        assert_eq!(value("unknownTag`a`"), None);
        assert_eq!(value("`${unknownName}`"), None);
    }

    #[test]
    fn calls_go_through_the_sandbox() {
        assert_eq!(value("Math.max(1, 3)"), Some(Value::Number(3.0)));
        assert_eq!(value("'abc'.slice(1)"), Some(Value::from("bc")));
        assert_eq!(value("parseInt('ff', 16)"), Some(Value::Number(255.0)));
        assert_eq!(value("Math.random()"), None);
        assert_eq!(
            value("Object.freeze([1])"),
            Some(Value::array(vec![Value::Number(1.0)]))
        );
        assert_eq!(value("Object.isFrozen(Object.freeze({}))"), Some(Value::Bool(true)));
        assert_eq!(value("Object.isFrozen({ a: 1 })"), Some(Value::Bool(false)));
        assert_eq!(
            value("const o = Object.seal({ a: 1 }); Object.isSealed(o)"),
            Some(Value::Bool(true))
        );
        assert_eq!(value("const o = {}; Object.freeze(o); Object.isFrozen(o)"), None);
        assert_eq!(
            value("'a-b'.split('-')"),
            Some(Value::array(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(value("'aaa'.replace(/(a+)+$/, '')"), None);
        assert_eq!(value("unknownName()"), None);
    }

    #[test]
    fn shadowed_globals_are_not_builtins() {
        assert_eq!(value("const Math = { max: 1 }; Math.max"), Some(Value::Number(1.0)));
        assert_eq!(value("function f(Math) { return Math.max(1, 2); } f"), None);
    }

    #[test]
    fn new_expressions_need_constructible_builtins() {
        assert_eq!(value("new Set([1, 1, 2]).size"), Some(Value::Number(2.0)));
        assert_eq!(value("new Map([['a', 1]]).get('a')"), Some(Value::Number(1.0)));
        assert_eq!(value("new Date()"), None);
        assert_eq!(value("new Array(3)"), None);
    }

    #[test]
    fn literals_the_host_cannot_represent_are_unknown() {
        assert_eq!(value("340282366920938463463374607431768211456n"), None);
        assert!(matches!(value("/a/g"), Some(Value::RegExp(_))));
        assert_eq!(value("/a/g.flags"), Some(Value::from("g")));
    }

    #[test]
    fn type_assertions_are_transparent() {
        let file =
            ParsedFile::from_source("test.ts", "const a = 1; (a as number) satisfies number");
        let ctx = file.context();
        assert_eq!(
            get_static_value(&ctx, last_expression(&file), Some(ctx.global_scope())),
            Some(StaticValue::new(Value::Number(1.0)))
        );
    }

    #[test]
    fn string_if_constant_renders_like_string() {
        assert_eq!(string("/a+/g"), Some("/a+/g".to_string()));
        assert_eq!(string("123n"), Some("123".to_string()));
        assert_eq!(string("1e21"), Some("1e+21".to_string()));
        assert_eq!(string("[1, [2, 3]]"), Some("1,2,3".to_string()));
        assert_eq!(string("Symbol.for('x')"), Some("Symbol(x)".to_string()));
        assert_eq!(string("null"), Some("null".to_string()));
        assert_eq!(string("unknownName"), None);
    }
}
