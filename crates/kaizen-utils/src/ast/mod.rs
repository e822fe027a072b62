//! ESTree-shaped syntax tree with parent links
//!
//! SWC trees carry no parent pointers and keep parentheses as explicit
//! nodes. Every analysis in this crate walks upwards from identifiers, so
//! the SWC program is lowered once into an [`Ast`] arena where each node
//! knows its parent and how many redundant parentheses wrapped it.

pub mod lower;

use id_arena::{Arena, Id};
use serde::Serialize;
use swc_common::{BytePos, Span};

pub type NodeId = Id<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Module,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableKind {
    Var,
    Let,
    Const,
    Using,
    AwaitUsing,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
            VariableKind::Using => "using",
            VariableKind::AwaitUsing => "await using",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    Not,
    BitNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    BitOr,
    BitXor,
    BitAnd,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    Or,
    And,
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Exp,
    Shl,
    Shr,
    UShr,
    BitOr,
    BitXor,
    BitAnd,
    Or,
    And,
    Nullish,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Decimal digits, optionally with a leading minus sign.
    BigInt(String),
    RegExp { pattern: String, flags: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<NodeId>,
    pub params: Vec<NodeId>,
    /// `None` only for bodiless TypeScript signatures.
    pub body: Option<NodeId>,
    pub is_async: bool,
    pub is_generator: bool,
    /// Arrow function with an expression body.
    pub expression: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<NodeId>,
    pub super_class: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program {
        body: Vec<NodeId>,
        source_type: SourceType,
    },

    // statements
    ExpressionStatement {
        expression: NodeId,
    },
    BlockStatement {
        body: Vec<NodeId>,
    },
    StaticBlock {
        body: Vec<NodeId>,
    },
    EmptyStatement,
    DebuggerStatement,
    WithStatement {
        object: NodeId,
        body: NodeId,
    },
    ReturnStatement {
        argument: Option<NodeId>,
    },
    LabeledStatement {
        label: NodeId,
        body: NodeId,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    IfStatement {
        test: NodeId,
        consequent: NodeId,
        alternate: Option<NodeId>,
    },
    SwitchStatement {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    SwitchCase {
        test: Option<NodeId>,
        consequent: Vec<NodeId>,
    },
    ThrowStatement {
        argument: NodeId,
    },
    TryStatement {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    CatchClause {
        param: Option<NodeId>,
        body: NodeId,
    },
    WhileStatement {
        test: NodeId,
        body: NodeId,
    },
    DoWhileStatement {
        body: NodeId,
        test: NodeId,
    },
    ForStatement {
        init: Option<NodeId>,
        test: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForInStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
    },
    ForOfStatement {
        left: NodeId,
        right: NodeId,
        body: NodeId,
        is_await: bool,
    },

    // declarations
    FunctionDeclaration(Function),
    VariableDeclaration {
        kind: VariableKind,
        declarations: Vec<NodeId>,
    },
    VariableDeclarator {
        id: NodeId,
        init: Option<NodeId>,
    },
    ClassDeclaration(Class),
    ClassExpression(Class),
    ClassBody {
        body: Vec<NodeId>,
    },
    MethodDefinition {
        key: NodeId,
        value: NodeId,
        kind: MethodKind,
        computed: bool,
        is_static: bool,
    },
    PropertyDefinition {
        key: NodeId,
        value: Option<NodeId>,
        computed: bool,
        is_static: bool,
    },

    // modules
    ImportDeclaration {
        specifiers: Vec<NodeId>,
        source: NodeId,
    },
    ImportSpecifier {
        imported: NodeId,
        local: NodeId,
    },
    ImportDefaultSpecifier {
        local: NodeId,
    },
    ImportNamespaceSpecifier {
        local: NodeId,
    },
    ExportNamedDeclaration {
        declaration: Option<NodeId>,
        specifiers: Vec<NodeId>,
        source: Option<NodeId>,
    },
    ExportSpecifier {
        local: NodeId,
        exported: NodeId,
    },
    ExportDefaultDeclaration {
        declaration: NodeId,
    },
    ExportAllDeclaration {
        exported: Option<NodeId>,
        source: NodeId,
    },

    // expressions
    Identifier {
        name: String,
    },
    PrivateIdentifier {
        name: String,
    },
    Literal(Literal),
    ThisExpression,
    Super,
    ArrayExpression {
        elements: Vec<Option<NodeId>>,
    },
    ObjectExpression {
        properties: Vec<NodeId>,
    },
    Property {
        key: NodeId,
        value: NodeId,
        kind: PropertyKind,
        computed: bool,
        method: bool,
        shorthand: bool,
    },
    SpreadElement {
        argument: NodeId,
    },
    FunctionExpression(Function),
    ArrowFunctionExpression(Function),
    UnaryExpression {
        operator: UnaryOperator,
        argument: NodeId,
    },
    UpdateExpression {
        operator: UpdateOperator,
        prefix: bool,
        argument: NodeId,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: NodeId,
        right: NodeId,
    },
    LogicalExpression {
        operator: LogicalOperator,
        left: NodeId,
        right: NodeId,
    },
    AssignmentExpression {
        operator: AssignmentOperator,
        left: NodeId,
        right: NodeId,
    },
    MemberExpression {
        object: NodeId,
        property: NodeId,
        computed: bool,
        optional: bool,
    },
    ChainExpression {
        expression: NodeId,
    },
    CallExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
        optional: bool,
    },
    NewExpression {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    ConditionalExpression {
        test: NodeId,
        consequent: NodeId,
        alternate: NodeId,
    },
    SequenceExpression {
        expressions: Vec<NodeId>,
    },
    TemplateLiteral {
        quasis: Vec<NodeId>,
        expressions: Vec<NodeId>,
    },
    TemplateElement {
        cooked: Option<String>,
        raw: String,
        tail: bool,
    },
    TaggedTemplateExpression {
        tag: NodeId,
        quasi: NodeId,
    },
    YieldExpression {
        argument: Option<NodeId>,
        delegate: bool,
    },
    AwaitExpression {
        argument: NodeId,
    },
    ImportExpression {
        source: NodeId,
        options: Option<NodeId>,
    },
    MetaProperty {
        meta: NodeId,
        property: NodeId,
    },

    // patterns
    ObjectPattern {
        properties: Vec<NodeId>,
    },
    ArrayPattern {
        elements: Vec<Option<NodeId>>,
    },
    RestElement {
        argument: NodeId,
    },
    AssignmentPattern {
        left: NodeId,
        right: NodeId,
    },

    // typescript wrappers around a runtime expression
    TSAsExpression {
        expression: NodeId,
    },
    TSTypeAssertion {
        expression: NodeId,
    },
    TSNonNullExpression {
        expression: NodeId,
    },
    TSSatisfiesExpression {
        expression: NodeId,
    },
    TSInstantiationExpression {
        expression: NodeId,
    },
    /// Type-only declaration with no runtime behavior.
    TSDeclaration,
    /// JSX subtree. Embedded expressions are not lowered.
    JSXElement,
}

/// One named child slot of a node, in visiting order.
pub type Slot = (&'static str, Vec<NodeId>);

fn one(name: &'static str, id: NodeId) -> Slot {
    (name, vec![id])
}

fn opt(name: &'static str, id: Option<NodeId>) -> Slot {
    (name, id.into_iter().collect())
}

fn many(name: &'static str, ids: &[NodeId]) -> Slot {
    (name, ids.to_vec())
}

fn holes(name: &'static str, ids: &[Option<NodeId>]) -> Slot {
    (name, ids.iter().flatten().copied().collect())
}

fn function_slots(f: &Function) -> Vec<Slot> {
    vec![
        opt("id", f.id),
        many("params", &f.params),
        opt("body", f.body),
    ]
}

fn class_slots(c: &Class) -> Vec<Slot> {
    vec![
        opt("id", c.id),
        opt("superClass", c.super_class),
        one("body", c.body),
    ]
}

impl NodeKind {
    /// ESTree type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Program { .. } => "Program",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::BlockStatement { .. } => "BlockStatement",
            NodeKind::StaticBlock { .. } => "StaticBlock",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::DebuggerStatement => "DebuggerStatement",
            NodeKind::WithStatement { .. } => "WithStatement",
            NodeKind::ReturnStatement { .. } => "ReturnStatement",
            NodeKind::LabeledStatement { .. } => "LabeledStatement",
            NodeKind::BreakStatement { .. } => "BreakStatement",
            NodeKind::ContinueStatement { .. } => "ContinueStatement",
            NodeKind::IfStatement { .. } => "IfStatement",
            NodeKind::SwitchStatement { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::ThrowStatement { .. } => "ThrowStatement",
            NodeKind::TryStatement { .. } => "TryStatement",
            NodeKind::CatchClause { .. } => "CatchClause",
            NodeKind::WhileStatement { .. } => "WhileStatement",
            NodeKind::DoWhileStatement { .. } => "DoWhileStatement",
            NodeKind::ForStatement { .. } => "ForStatement",
            NodeKind::ForInStatement { .. } => "ForInStatement",
            NodeKind::ForOfStatement { .. } => "ForOfStatement",
            NodeKind::FunctionDeclaration(_) => "FunctionDeclaration",
            NodeKind::VariableDeclaration { .. } => "VariableDeclaration",
            NodeKind::VariableDeclarator { .. } => "VariableDeclarator",
            NodeKind::ClassDeclaration(_) => "ClassDeclaration",
            NodeKind::ClassExpression(_) => "ClassExpression",
            NodeKind::ClassBody { .. } => "ClassBody",
            NodeKind::MethodDefinition { .. } => "MethodDefinition",
            NodeKind::PropertyDefinition { .. } => "PropertyDefinition",
            NodeKind::ImportDeclaration { .. } => "ImportDeclaration",
            NodeKind::ImportSpecifier { .. } => "ImportSpecifier",
            NodeKind::ImportDefaultSpecifier { .. } => "ImportDefaultSpecifier",
            NodeKind::ImportNamespaceSpecifier { .. } => "ImportNamespaceSpecifier",
            NodeKind::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            NodeKind::ExportSpecifier { .. } => "ExportSpecifier",
            NodeKind::ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            NodeKind::ExportAllDeclaration { .. } => "ExportAllDeclaration",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::PrivateIdentifier { .. } => "PrivateIdentifier",
            NodeKind::Literal(_) => "Literal",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::Super => "Super",
            NodeKind::ArrayExpression { .. } => "ArrayExpression",
            NodeKind::ObjectExpression { .. } => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::SpreadElement { .. } => "SpreadElement",
            NodeKind::FunctionExpression(_) => "FunctionExpression",
            NodeKind::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
            NodeKind::UnaryExpression { .. } => "UnaryExpression",
            NodeKind::UpdateExpression { .. } => "UpdateExpression",
            NodeKind::BinaryExpression { .. } => "BinaryExpression",
            NodeKind::LogicalExpression { .. } => "LogicalExpression",
            NodeKind::AssignmentExpression { .. } => "AssignmentExpression",
            NodeKind::MemberExpression { .. } => "MemberExpression",
            NodeKind::ChainExpression { .. } => "ChainExpression",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::NewExpression { .. } => "NewExpression",
            NodeKind::ConditionalExpression { .. } => "ConditionalExpression",
            NodeKind::SequenceExpression { .. } => "SequenceExpression",
            NodeKind::TemplateLiteral { .. } => "TemplateLiteral",
            NodeKind::TemplateElement { .. } => "TemplateElement",
            NodeKind::TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
            NodeKind::YieldExpression { .. } => "YieldExpression",
            NodeKind::AwaitExpression { .. } => "AwaitExpression",
            NodeKind::ImportExpression { .. } => "ImportExpression",
            NodeKind::MetaProperty { .. } => "MetaProperty",
            NodeKind::ObjectPattern { .. } => "ObjectPattern",
            NodeKind::ArrayPattern { .. } => "ArrayPattern",
            NodeKind::RestElement { .. } => "RestElement",
            NodeKind::AssignmentPattern { .. } => "AssignmentPattern",
            NodeKind::TSAsExpression { .. } => "TSAsExpression",
            NodeKind::TSTypeAssertion { .. } => "TSTypeAssertion",
            NodeKind::TSNonNullExpression { .. } => "TSNonNullExpression",
            NodeKind::TSSatisfiesExpression { .. } => "TSSatisfiesExpression",
            NodeKind::TSInstantiationExpression { .. } => "TSInstantiationExpression",
            NodeKind::TSDeclaration => "TSDeclaration",
            NodeKind::JSXElement => "JSXElement",
        }
    }

    /// Child slots in ESTree visitor-key order.
    pub fn slots(&self) -> Vec<Slot> {
        match self {
            NodeKind::Program { body, .. }
            | NodeKind::BlockStatement { body }
            | NodeKind::StaticBlock { body }
            | NodeKind::ClassBody { body } => vec![many("body", body)],
            NodeKind::ExpressionStatement { expression }
            | NodeKind::ChainExpression { expression } => vec![one("expression", *expression)],
            NodeKind::WithStatement { object, body } => {
                vec![one("object", *object), one("body", *body)]
            }
            NodeKind::ReturnStatement { argument } => vec![opt("argument", *argument)],
            NodeKind::LabeledStatement { label, body } => {
                vec![one("label", *label), one("body", *body)]
            }
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => {
                vec![opt("label", *label)]
            }
            NodeKind::IfStatement {
                test,
                consequent,
                alternate,
            } => vec![
                one("test", *test),
                one("consequent", *consequent),
                opt("alternate", *alternate),
            ],
            NodeKind::SwitchStatement {
                discriminant,
                cases,
            } => vec![one("discriminant", *discriminant), many("cases", cases)],
            NodeKind::SwitchCase { test, consequent } => {
                vec![opt("test", *test), many("consequent", consequent)]
            }
            NodeKind::ThrowStatement { argument }
            | NodeKind::SpreadElement { argument }
            | NodeKind::UnaryExpression { argument, .. }
            | NodeKind::UpdateExpression { argument, .. }
            | NodeKind::AwaitExpression { argument }
            | NodeKind::RestElement { argument } => vec![one("argument", *argument)],
            NodeKind::TryStatement {
                block,
                handler,
                finalizer,
            } => vec![
                one("block", *block),
                opt("handler", *handler),
                opt("finalizer", *finalizer),
            ],
            NodeKind::CatchClause { param, body } => {
                vec![opt("param", *param), one("body", *body)]
            }
            NodeKind::WhileStatement { test, body } => {
                vec![one("test", *test), one("body", *body)]
            }
            NodeKind::DoWhileStatement { body, test } => {
                vec![one("body", *body), one("test", *test)]
            }
            NodeKind::ForStatement {
                init,
                test,
                update,
                body,
            } => vec![
                opt("init", *init),
                opt("test", *test),
                opt("update", *update),
                one("body", *body),
            ],
            NodeKind::ForInStatement { left, right, body }
            | NodeKind::ForOfStatement {
                left, right, body, ..
            } => vec![one("left", *left), one("right", *right), one("body", *body)],
            NodeKind::FunctionDeclaration(f)
            | NodeKind::FunctionExpression(f)
            | NodeKind::ArrowFunctionExpression(f) => function_slots(f),
            NodeKind::VariableDeclaration { declarations, .. } => {
                vec![many("declarations", declarations)]
            }
            NodeKind::VariableDeclarator { id, init } => {
                vec![one("id", *id), opt("init", *init)]
            }
            NodeKind::ClassDeclaration(c) | NodeKind::ClassExpression(c) => class_slots(c),
            NodeKind::MethodDefinition { key, value, .. } => {
                vec![one("key", *key), one("value", *value)]
            }
            NodeKind::PropertyDefinition { key, value, .. } => {
                vec![one("key", *key), opt("value", *value)]
            }
            NodeKind::ImportDeclaration { specifiers, source } => {
                vec![many("specifiers", specifiers), one("source", *source)]
            }
            NodeKind::ImportSpecifier { imported, local } => {
                vec![one("imported", *imported), one("local", *local)]
            }
            NodeKind::ImportDefaultSpecifier { local }
            | NodeKind::ImportNamespaceSpecifier { local } => vec![one("local", *local)],
            NodeKind::ExportNamedDeclaration {
                declaration,
                specifiers,
                source,
            } => vec![
                opt("declaration", *declaration),
                many("specifiers", specifiers),
                opt("source", *source),
            ],
            NodeKind::ExportSpecifier { local, exported } => {
                vec![one("exported", *exported), one("local", *local)]
            }
            NodeKind::ExportDefaultDeclaration { declaration } => {
                vec![one("declaration", *declaration)]
            }
            NodeKind::ExportAllDeclaration { exported, source } => {
                vec![opt("exported", *exported), one("source", *source)]
            }
            NodeKind::ArrayExpression { elements } | NodeKind::ArrayPattern { elements } => {
                vec![holes("elements", elements)]
            }
            NodeKind::ObjectExpression { properties } | NodeKind::ObjectPattern { properties } => {
                vec![many("properties", properties)]
            }
            NodeKind::Property { key, value, .. } => {
                vec![one("key", *key), one("value", *value)]
            }
            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. }
            | NodeKind::AssignmentExpression { left, right, .. }
            | NodeKind::AssignmentPattern { left, right } => {
                vec![one("left", *left), one("right", *right)]
            }
            NodeKind::MemberExpression {
                object, property, ..
            } => vec![one("object", *object), one("property", *property)],
            NodeKind::CallExpression {
                callee, arguments, ..
            }
            | NodeKind::NewExpression { callee, arguments } => {
                vec![one("callee", *callee), many("arguments", arguments)]
            }
            NodeKind::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => vec![
                one("test", *test),
                one("consequent", *consequent),
                one("alternate", *alternate),
            ],
            NodeKind::SequenceExpression { expressions } => {
                vec![many("expressions", expressions)]
            }
            NodeKind::TemplateLiteral {
                quasis,
                expressions,
            } => vec![many("quasis", quasis), many("expressions", expressions)],
            NodeKind::TaggedTemplateExpression { tag, quasi } => {
                vec![one("tag", *tag), one("quasi", *quasi)]
            }
            NodeKind::YieldExpression { argument, .. } => vec![opt("argument", *argument)],
            NodeKind::ImportExpression { source, options } => {
                vec![one("source", *source), opt("options", *options)]
            }
            NodeKind::MetaProperty { meta, property } => {
                vec![one("meta", *meta), one("property", *property)]
            }
            NodeKind::TSAsExpression { expression }
            | NodeKind::TSTypeAssertion { expression }
            | NodeKind::TSNonNullExpression { expression }
            | NodeKind::TSSatisfiesExpression { expression }
            | NodeKind::TSInstantiationExpression { expression } => {
                vec![one("expression", *expression)]
            }
            NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::Identifier { .. }
            | NodeKind::PrivateIdentifier { .. }
            | NodeKind::Literal(_)
            | NodeKind::ThisExpression
            | NodeKind::Super
            | NodeKind::TemplateElement { .. }
            | NodeKind::TSDeclaration
            | NodeKind::JSXElement => Vec::new(),
        }
    }

    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDeclaration(_)
                | NodeKind::FunctionExpression(_)
                | NodeKind::ArrowFunctionExpression(_)
        )
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            NodeKind::FunctionDeclaration(f)
            | NodeKind::FunctionExpression(f)
            | NodeKind::ArrowFunctionExpression(f) => Some(f),
            _ => None,
        }
    }

    /// TypeScript wrappers that leave the runtime value untouched.
    pub fn ts_wrapped_expression(&self) -> Option<NodeId> {
        match self {
            NodeKind::TSAsExpression { expression }
            | NodeKind::TSTypeAssertion { expression }
            | NodeKind::TSNonNullExpression { expression }
            | NodeKind::TSSatisfiesExpression { expression }
            | NodeKind::TSInstantiationExpression { expression } => Some(*expression),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// 0-based byte offsets into the source.
    pub span: Span,
    pub parent: Option<NodeId>,
    /// Number of redundant parenthesis pairs around this node.
    pub parens: u32,
}

impl Node {
    pub fn start(&self) -> u32 {
        self.span.lo.0
    }

    pub fn end(&self) -> u32 {
        self.span.hi.0
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

pub struct Ast {
    arena: Arena<Node>,
    root: NodeId,
    source: String,
    source_type: SourceType,
}

impl std::fmt::Debug for Ast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ast")
            .field("nodes", &self.arena.len())
            .field("source_type", &self.source_type)
            .finish()
    }
}

/// Accumulates nodes bottom-up; children are allocated before their parent.
pub(crate) struct AstBuilder {
    arena: Arena<Node>,
    source: String,
    source_type: SourceType,
}

impl AstBuilder {
    pub(crate) fn new(source: &str, source_type: SourceType) -> Self {
        Self {
            arena: Arena::new(),
            source: source.to_string(),
            source_type,
        }
    }

    /// Allocates a node and adopts every node referenced by its slots.
    pub(crate) fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let children: Vec<NodeId> = kind.slots().into_iter().flat_map(|(_, ids)| ids).collect();
        let id = self.arena.alloc_with_id(|id| Node {
            id,
            kind,
            span,
            parent: None,
            parens: 0,
        });
        for child in children {
            self.arena[child].parent = Some(id);
        }
        id
    }

    pub(crate) fn add_parens(&mut self, id: NodeId) {
        self.arena[id].parens += 1;
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn finish(self, root: NodeId) -> Ast {
        Ast {
            arena: self.arena,
            root,
            source: self.source,
            source_type: self.source_type,
        }
    }
}

impl Ast {
    /// A tree holding only an empty program, used when parsing failed.
    pub fn empty(source: &str, source_type: SourceType) -> Self {
        let mut builder = AstBuilder::new(source, source_type);
        let span = Span::new(BytePos(0), BytePos(source.len() as u32));
        let root = builder.alloc(
            NodeKind::Program {
                body: Vec::new(),
                source_type,
            },
            span,
        );
        builder.finish(root)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.arena[id].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.arena[id].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.arena[id]
            .kind
            .slots()
            .into_iter()
            .flat_map(|(_, ids)| ids)
            .collect()
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            current: self.parent(id),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.arena.iter().map(|(_, node)| node)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn source_text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.source
            .get(span.lo.0 as usize..span.hi.0 as usize)
            .unwrap_or("")
    }

    /// 1-based line and 0-based column of a byte offset.
    pub fn line_column(&self, offset: u32) -> (usize, usize) {
        let offset = (offset as usize).min(self.source.len());
        let prefix = &self.source[..offset];
        let line = prefix.matches('\n').count() + 1;
        let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, prefix[line_start..].chars().count())
    }

    /// Whether `inner` lies within `outer`'s span.
    pub fn contains(&self, outer: NodeId, inner: NodeId) -> bool {
        let outer = self.span(outer);
        let inner = self.span(inner);
        outer.lo <= inner.lo && inner.hi <= outer.hi
    }
}

impl std::ops::Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }
}

pub struct Ancestors<'a> {
    ast: &'a Ast,
    current: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.ast.parent(current);
        Some(current)
    }
}
