//! Lowering from SWC's AST into [`Ast`]
//!
//! Children are lowered before their parent so that [`AstBuilder::alloc`]
//! can fix up parent links in one step. `ParenExpr` disappears and bumps the
//! wrapped node's paren count; `OptChainExpr` becomes an ESTree
//! `ChainExpression` whose inner members and calls carry `optional` flags.

use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast as swc;

use super::{
    AssignmentOperator, Ast, AstBuilder, BinaryOperator, Class, Function, Literal, LiteralValue,
    LogicalOperator, MethodKind, NodeId, NodeKind, PropertyKind, SourceType, UnaryOperator,
    UpdateOperator, VariableKind,
};

pub fn lower_program(program: &swc::Program, source: &str, base: BytePos) -> Ast {
    let source_type = match program {
        swc::Program::Module(_) => SourceType::Module,
        swc::Program::Script(_) => SourceType::Script,
    };
    let mut lowerer = Lowerer {
        builder: AstBuilder::new(source, source_type),
        base: base.0,
    };

    let (body, span) = match program {
        swc::Program::Module(module) => (
            module
                .body
                .iter()
                .map(|item| lowerer.module_item(item))
                .collect(),
            module.span,
        ),
        swc::Program::Script(script) => (
            script.body.iter().map(|stmt| lowerer.stmt(stmt)).collect(),
            script.span,
        ),
    };

    let mut span = lowerer.span(span);
    span.lo = BytePos(0);
    span.hi = BytePos(source.len() as u32);
    let root = lowerer
        .builder
        .alloc(NodeKind::Program { body, source_type }, span);
    lowerer.builder.finish(root)
}

struct Lowerer {
    builder: AstBuilder,
    base: u32,
}

impl Lowerer {
    fn span(&self, span: Span) -> Span {
        Span::new(
            BytePos(span.lo.0.saturating_sub(self.base)),
            BytePos(span.hi.0.saturating_sub(self.base)),
        )
    }

    fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let span = self.span(span);
        self.builder.alloc(kind, span)
    }

    fn raw(&self, span: Span) -> String {
        let span = self.span(span);
        self.builder
            .source()
            .get(span.lo.0 as usize..span.hi.0 as usize)
            .unwrap_or("")
            .to_string()
    }

    fn ident(&mut self, ident: &swc::Ident) -> NodeId {
        self.alloc(
            NodeKind::Identifier {
                name: ident.sym.to_string(),
            },
            ident.span,
        )
    }

    fn ident_name(&mut self, ident: &swc::IdentName) -> NodeId {
        self.alloc(
            NodeKind::Identifier {
                name: ident.sym.to_string(),
            },
            ident.span,
        )
    }

    fn private_name(&mut self, name: &swc::PrivateName) -> NodeId {
        self.alloc(
            NodeKind::PrivateIdentifier {
                name: name.name.to_string(),
            },
            name.span,
        )
    }

    fn string_literal(&mut self, s: &swc::Str) -> NodeId {
        let raw = self.raw(s.span);
        self.alloc(
            NodeKind::Literal(Literal {
                value: LiteralValue::String(s.value.to_string()),
                raw,
            }),
            s.span,
        )
    }

    fn ts_declaration(&mut self, span: Span) -> NodeId {
        self.alloc(NodeKind::TSDeclaration, span)
    }

    // ---- modules ----

    fn module_item(&mut self, item: &swc::ModuleItem) -> NodeId {
        match item {
            swc::ModuleItem::Stmt(stmt) => self.stmt(stmt),
            swc::ModuleItem::ModuleDecl(decl) => self.module_decl(decl),
        }
    }

    fn module_export_name(&mut self, name: &swc::ModuleExportName) -> NodeId {
        match name {
            swc::ModuleExportName::Ident(ident) => self.ident(ident),
            swc::ModuleExportName::Str(s) => self.string_literal(s),
        }
    }

    fn module_decl(&mut self, decl: &swc::ModuleDecl) -> NodeId {
        match decl {
            swc::ModuleDecl::Import(import) => {
                if import.type_only {
                    return self.ts_declaration(import.span);
                }
                let specifiers = import
                    .specifiers
                    .iter()
                    .map(|specifier| self.import_specifier(specifier))
                    .collect();
                let source = self.string_literal(&import.src);
                self.alloc(
                    NodeKind::ImportDeclaration { specifiers, source },
                    import.span,
                )
            }
            swc::ModuleDecl::ExportDecl(export) => {
                let declaration = self.decl(&export.decl);
                self.alloc(
                    NodeKind::ExportNamedDeclaration {
                        declaration: Some(declaration),
                        specifiers: Vec::new(),
                        source: None,
                    },
                    export.span,
                )
            }
            swc::ModuleDecl::ExportNamed(named) => self.named_export(named),
            swc::ModuleDecl::ExportDefaultDecl(export) => {
                let declaration = match &export.decl {
                    swc::DefaultDecl::Class(class) => {
                        let id = class.ident.as_ref().map(|ident| self.ident(ident));
                        let class_node = self.class(id, &class.class);
                        self.alloc(NodeKind::ClassDeclaration(class_node), class.class.span)
                    }
                    swc::DefaultDecl::Fn(f) => {
                        let id = f.ident.as_ref().map(|ident| self.ident(ident));
                        let function = self.function(id, &f.function);
                        self.alloc(NodeKind::FunctionDeclaration(function), f.function.span)
                    }
                    swc::DefaultDecl::TsInterfaceDecl(decl) => self.ts_declaration(decl.span),
                };
                self.alloc(
                    NodeKind::ExportDefaultDeclaration { declaration },
                    export.span,
                )
            }
            swc::ModuleDecl::ExportDefaultExpr(export) => {
                let declaration = self.expr(&export.expr);
                self.alloc(
                    NodeKind::ExportDefaultDeclaration { declaration },
                    export.span,
                )
            }
            swc::ModuleDecl::ExportAll(export) => {
                if export.type_only {
                    return self.ts_declaration(export.span);
                }
                let source = self.string_literal(&export.src);
                self.alloc(
                    NodeKind::ExportAllDeclaration {
                        exported: None,
                        source,
                    },
                    export.span,
                )
            }
            other => self.ts_declaration(other.span()),
        }
    }

    fn import_specifier(&mut self, specifier: &swc::ImportSpecifier) -> NodeId {
        match specifier {
            swc::ImportSpecifier::Named(named) => {
                let imported = match &named.imported {
                    Some(name) => self.module_export_name(name),
                    None => self.ident(&named.local),
                };
                let local = self.ident(&named.local);
                self.alloc(NodeKind::ImportSpecifier { imported, local }, named.span)
            }
            swc::ImportSpecifier::Default(default) => {
                let local = self.ident(&default.local);
                self.alloc(NodeKind::ImportDefaultSpecifier { local }, default.span)
            }
            swc::ImportSpecifier::Namespace(namespace) => {
                let local = self.ident(&namespace.local);
                self.alloc(NodeKind::ImportNamespaceSpecifier { local }, namespace.span)
            }
        }
    }

    fn named_export(&mut self, named: &swc::NamedExport) -> NodeId {
        if named.type_only {
            return self.ts_declaration(named.span);
        }

        let namespace = named.specifiers.iter().find_map(|specifier| match specifier {
            swc::ExportSpecifier::Namespace(namespace) => Some(namespace),
            _ => None,
        });
        if let (Some(namespace), Some(src)) = (namespace, &named.src) {
            let exported = self.module_export_name(&namespace.name);
            let source = self.string_literal(src);
            return self.alloc(
                NodeKind::ExportAllDeclaration {
                    exported: Some(exported),
                    source,
                },
                named.span,
            );
        }

        let mut specifiers = Vec::new();
        for specifier in &named.specifiers {
            match specifier {
                swc::ExportSpecifier::Named(spec) => {
                    if spec.is_type_only {
                        continue;
                    }
                    let local = self.module_export_name(&spec.orig);
                    let exported = match &spec.exported {
                        Some(name) => self.module_export_name(name),
                        None => self.module_export_name(&spec.orig),
                    };
                    specifiers.push(self.alloc(
                        NodeKind::ExportSpecifier { local, exported },
                        spec.span,
                    ));
                }
                swc::ExportSpecifier::Default(spec) => {
                    let local = self.ident(&spec.exported);
                    let exported = self.ident(&spec.exported);
                    specifiers.push(self.alloc(
                        NodeKind::ExportSpecifier { local, exported },
                        spec.exported.span,
                    ));
                }
                swc::ExportSpecifier::Namespace(_) => {}
            }
        }
        let source = named.src.as_ref().map(|src| self.string_literal(src));
        self.alloc(
            NodeKind::ExportNamedDeclaration {
                declaration: None,
                specifiers,
                source,
            },
            named.span,
        )
    }

    // ---- statements ----

    fn block(&mut self, block: &swc::BlockStmt) -> NodeId {
        let body = block.stmts.iter().map(|stmt| self.stmt(stmt)).collect();
        self.alloc(NodeKind::BlockStatement { body }, block.span)
    }

    fn stmt(&mut self, stmt: &swc::Stmt) -> NodeId {
        match stmt {
            swc::Stmt::Block(block) => self.block(block),
            swc::Stmt::Empty(empty) => self.alloc(NodeKind::EmptyStatement, empty.span),
            swc::Stmt::Debugger(debugger) => {
                self.alloc(NodeKind::DebuggerStatement, debugger.span)
            }
            swc::Stmt::With(with) => {
                let object = self.expr(&with.obj);
                let body = self.stmt(&with.body);
                self.alloc(NodeKind::WithStatement { object, body }, with.span)
            }
            swc::Stmt::Return(ret) => {
                let argument = ret.arg.as_ref().map(|arg| self.expr(arg));
                self.alloc(NodeKind::ReturnStatement { argument }, ret.span)
            }
            swc::Stmt::Labeled(labeled) => {
                let label = self.ident(&labeled.label);
                let body = self.stmt(&labeled.body);
                self.alloc(NodeKind::LabeledStatement { label, body }, labeled.span)
            }
            swc::Stmt::Break(brk) => {
                let label = brk.label.as_ref().map(|label| self.ident(label));
                self.alloc(NodeKind::BreakStatement { label }, brk.span)
            }
            swc::Stmt::Continue(cont) => {
                let label = cont.label.as_ref().map(|label| self.ident(label));
                self.alloc(NodeKind::ContinueStatement { label }, cont.span)
            }
            swc::Stmt::If(if_stmt) => {
                let test = self.expr(&if_stmt.test);
                let consequent = self.stmt(&if_stmt.cons);
                let alternate = if_stmt.alt.as_ref().map(|alt| self.stmt(alt));
                self.alloc(
                    NodeKind::IfStatement {
                        test,
                        consequent,
                        alternate,
                    },
                    if_stmt.span,
                )
            }
            swc::Stmt::Switch(switch) => {
                let discriminant = self.expr(&switch.discriminant);
                let cases = switch
                    .cases
                    .iter()
                    .map(|case| {
                        let test = case.test.as_ref().map(|test| self.expr(test));
                        let consequent = case.cons.iter().map(|stmt| self.stmt(stmt)).collect();
                        self.alloc(NodeKind::SwitchCase { test, consequent }, case.span)
                    })
                    .collect();
                self.alloc(
                    NodeKind::SwitchStatement {
                        discriminant,
                        cases,
                    },
                    switch.span,
                )
            }
            swc::Stmt::Throw(throw) => {
                let argument = self.expr(&throw.arg);
                self.alloc(NodeKind::ThrowStatement { argument }, throw.span)
            }
            swc::Stmt::Try(try_stmt) => {
                let block = self.block(&try_stmt.block);
                let handler = try_stmt.handler.as_ref().map(|handler| {
                    let param = handler.param.as_ref().map(|param| self.pat(param));
                    let body = self.block(&handler.body);
                    self.alloc(NodeKind::CatchClause { param, body }, handler.span)
                });
                let finalizer = try_stmt.finalizer.as_ref().map(|block| self.block(block));
                self.alloc(
                    NodeKind::TryStatement {
                        block,
                        handler,
                        finalizer,
                    },
                    try_stmt.span,
                )
            }
            swc::Stmt::While(while_stmt) => {
                let test = self.expr(&while_stmt.test);
                let body = self.stmt(&while_stmt.body);
                self.alloc(NodeKind::WhileStatement { test, body }, while_stmt.span)
            }
            swc::Stmt::DoWhile(do_while) => {
                let body = self.stmt(&do_while.body);
                let test = self.expr(&do_while.test);
                self.alloc(NodeKind::DoWhileStatement { body, test }, do_while.span)
            }
            swc::Stmt::For(for_stmt) => {
                let init = for_stmt.init.as_ref().map(|init| match init {
                    swc::VarDeclOrExpr::VarDecl(var) => self.var_decl(var),
                    swc::VarDeclOrExpr::Expr(expr) => self.expr(expr),
                });
                let test = for_stmt.test.as_ref().map(|test| self.expr(test));
                let update = for_stmt.update.as_ref().map(|update| self.expr(update));
                let body = self.stmt(&for_stmt.body);
                self.alloc(
                    NodeKind::ForStatement {
                        init,
                        test,
                        update,
                        body,
                    },
                    for_stmt.span,
                )
            }
            swc::Stmt::ForIn(for_in) => {
                let left = self.for_head(&for_in.left);
                let right = self.expr(&for_in.right);
                let body = self.stmt(&for_in.body);
                self.alloc(NodeKind::ForInStatement { left, right, body }, for_in.span)
            }
            swc::Stmt::ForOf(for_of) => {
                let left = self.for_head(&for_of.left);
                let right = self.expr(&for_of.right);
                let body = self.stmt(&for_of.body);
                self.alloc(
                    NodeKind::ForOfStatement {
                        left,
                        right,
                        body,
                        is_await: for_of.is_await,
                    },
                    for_of.span,
                )
            }
            swc::Stmt::Decl(decl) => self.decl(decl),
            swc::Stmt::Expr(expr_stmt) => {
                let expression = self.expr(&expr_stmt.expr);
                self.alloc(NodeKind::ExpressionStatement { expression }, expr_stmt.span)
            }
        }
    }

    fn for_head(&mut self, head: &swc::ForHead) -> NodeId {
        match head {
            swc::ForHead::VarDecl(var) => self.var_decl(var),
            swc::ForHead::UsingDecl(using) => self.using_decl(using),
            swc::ForHead::Pat(pat) => self.pat(pat),
        }
    }

    fn decl(&mut self, decl: &swc::Decl) -> NodeId {
        match decl {
            swc::Decl::Class(class) => {
                if class.declare {
                    return self.ts_declaration(class.class.span);
                }
                let id = self.ident(&class.ident);
                let class_node = self.class(Some(id), &class.class);
                self.alloc(NodeKind::ClassDeclaration(class_node), class.class.span)
            }
            swc::Decl::Fn(f) => {
                if f.declare || f.function.body.is_none() {
                    return self.ts_declaration(f.function.span);
                }
                let id = self.ident(&f.ident);
                let function = self.function(Some(id), &f.function);
                self.alloc(NodeKind::FunctionDeclaration(function), f.function.span)
            }
            swc::Decl::Var(var) => {
                if var.declare {
                    return self.ts_declaration(var.span);
                }
                self.var_decl(var)
            }
            swc::Decl::Using(using) => self.using_decl(using),
            other => self.ts_declaration(other.span()),
        }
    }

    fn var_decl(&mut self, var: &swc::VarDecl) -> NodeId {
        let kind = match var.kind {
            swc::VarDeclKind::Var => VariableKind::Var,
            swc::VarDeclKind::Let => VariableKind::Let,
            swc::VarDeclKind::Const => VariableKind::Const,
        };
        let declarations = var
            .decls
            .iter()
            .map(|declarator| self.declarator(declarator))
            .collect();
        self.alloc(NodeKind::VariableDeclaration { kind, declarations }, var.span)
    }

    fn using_decl(&mut self, using: &swc::UsingDecl) -> NodeId {
        let kind = if using.is_await {
            VariableKind::AwaitUsing
        } else {
            VariableKind::Using
        };
        let declarations = using
            .decls
            .iter()
            .map(|declarator| self.declarator(declarator))
            .collect();
        self.alloc(
            NodeKind::VariableDeclaration { kind, declarations },
            using.span,
        )
    }

    fn declarator(&mut self, declarator: &swc::VarDeclarator) -> NodeId {
        let id = self.pat(&declarator.name);
        let init = declarator.init.as_ref().map(|init| self.expr(init));
        self.alloc(NodeKind::VariableDeclarator { id, init }, declarator.span)
    }

    // ---- functions and classes ----

    fn function(&mut self, id: Option<NodeId>, function: &swc::Function) -> Function {
        let params = function
            .params
            .iter()
            .map(|param| self.pat(&param.pat))
            .collect();
        let body = function.body.as_ref().map(|body| self.block(body));
        Function {
            id,
            params,
            body,
            is_async: function.is_async,
            is_generator: function.is_generator,
            expression: false,
        }
    }

    fn function_expression(&mut self, function: &swc::Function) -> NodeId {
        let lowered = self.function(None, function);
        self.alloc(NodeKind::FunctionExpression(lowered), function.span)
    }

    fn arrow(&mut self, arrow: &swc::ArrowExpr) -> NodeId {
        let params = arrow.params.iter().map(|param| self.pat(param)).collect();
        let (body, expression) = match &*arrow.body {
            swc::BlockStmtOrExpr::BlockStmt(block) => (self.block(block), false),
            swc::BlockStmtOrExpr::Expr(expr) => (self.expr(expr), true),
        };
        self.alloc(
            NodeKind::ArrowFunctionExpression(Function {
                id: None,
                params,
                body: Some(body),
                is_async: arrow.is_async,
                is_generator: arrow.is_generator,
                expression,
            }),
            arrow.span,
        )
    }

    fn class(&mut self, id: Option<NodeId>, class: &swc::Class) -> Class {
        let super_class = class.super_class.as_ref().map(|sup| self.expr(sup));
        let members = class
            .body
            .iter()
            .filter_map(|member| self.class_member(member))
            .collect();
        let body = self.alloc(NodeKind::ClassBody { body: members }, class.span);
        Class {
            id,
            super_class,
            body,
        }
    }

    fn class_member(&mut self, member: &swc::ClassMember) -> Option<NodeId> {
        let node = match member {
            swc::ClassMember::Constructor(ctor) => {
                let body = ctor.body.as_ref()?;
                let key = self.prop_name(&ctor.key).0;
                let params = ctor
                    .params
                    .iter()
                    .map(|param| match param {
                        swc::ParamOrTsParamProp::Param(param) => self.pat(&param.pat),
                        swc::ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                            swc::TsParamPropParam::Ident(ident) => self.ident(&ident.id),
                            swc::TsParamPropParam::Assign(assign) => self.assign_pat(assign),
                        },
                    })
                    .collect();
                let body = self.block(body);
                let value = self.alloc(
                    NodeKind::FunctionExpression(Function {
                        id: None,
                        params,
                        body: Some(body),
                        is_async: false,
                        is_generator: false,
                        expression: false,
                    }),
                    ctor.span,
                );
                self.alloc(
                    NodeKind::MethodDefinition {
                        key,
                        value,
                        kind: MethodKind::Constructor,
                        computed: false,
                        is_static: false,
                    },
                    ctor.span,
                )
            }
            swc::ClassMember::Method(method) => {
                method.function.body.as_ref()?;
                let (key, computed) = self.prop_name(&method.key);
                let value = self.function_expression(&method.function);
                self.alloc(
                    NodeKind::MethodDefinition {
                        key,
                        value,
                        kind: method_kind(method.kind),
                        computed,
                        is_static: method.is_static,
                    },
                    method.span,
                )
            }
            swc::ClassMember::PrivateMethod(method) => {
                method.function.body.as_ref()?;
                let key = self.private_name(&method.key);
                let value = self.function_expression(&method.function);
                self.alloc(
                    NodeKind::MethodDefinition {
                        key,
                        value,
                        kind: method_kind(method.kind),
                        computed: false,
                        is_static: method.is_static,
                    },
                    method.span,
                )
            }
            swc::ClassMember::ClassProp(prop) => {
                if prop.declare {
                    return None;
                }
                let (key, computed) = self.prop_name(&prop.key);
                let value = prop.value.as_ref().map(|value| self.expr(value));
                self.alloc(
                    NodeKind::PropertyDefinition {
                        key,
                        value,
                        computed,
                        is_static: prop.is_static,
                    },
                    prop.span,
                )
            }
            swc::ClassMember::PrivateProp(prop) => {
                let key = self.private_name(&prop.key);
                let value = prop.value.as_ref().map(|value| self.expr(value));
                self.alloc(
                    NodeKind::PropertyDefinition {
                        key,
                        value,
                        computed: false,
                        is_static: prop.is_static,
                    },
                    prop.span,
                )
            }
            swc::ClassMember::StaticBlock(block) => {
                let body = block.body.stmts.iter().map(|stmt| self.stmt(stmt)).collect();
                self.alloc(NodeKind::StaticBlock { body }, block.span)
            }
            _ => return None,
        };
        Some(node)
    }

    /// Returns the lowered key and whether it was computed.
    fn prop_name(&mut self, name: &swc::PropName) -> (NodeId, bool) {
        match name {
            swc::PropName::Ident(ident) => (self.ident_name(ident), false),
            swc::PropName::Str(s) => (self.string_literal(s), false),
            swc::PropName::Num(num) => {
                let raw = self.raw(num.span);
                let id = self.alloc(
                    NodeKind::Literal(Literal {
                        value: LiteralValue::Number(num.value),
                        raw,
                    }),
                    num.span,
                );
                (id, false)
            }
            swc::PropName::BigInt(big) => {
                let raw = self.raw(big.span);
                let id = self.alloc(
                    NodeKind::Literal(Literal {
                        value: LiteralValue::BigInt(big.value.to_string()),
                        raw,
                    }),
                    big.span,
                );
                (id, false)
            }
            swc::PropName::Computed(computed) => (self.expr(&computed.expr), true),
        }
    }

    // ---- patterns ----

    fn pat(&mut self, pat: &swc::Pat) -> NodeId {
        match pat {
            swc::Pat::Ident(binding) => self.ident(&binding.id),
            swc::Pat::Array(array) => {
                let elements = array
                    .elems
                    .iter()
                    .map(|elem| elem.as_ref().map(|elem| self.pat(elem)))
                    .collect();
                self.alloc(NodeKind::ArrayPattern { elements }, array.span)
            }
            swc::Pat::Rest(rest) => {
                let argument = self.pat(&rest.arg);
                self.alloc(NodeKind::RestElement { argument }, rest.span)
            }
            swc::Pat::Object(object) => self.object_pat(object),
            swc::Pat::Assign(assign) => self.assign_pat(assign),
            swc::Pat::Expr(expr) => self.expr(expr),
            swc::Pat::Invalid(invalid) => self.alloc(
                NodeKind::Identifier {
                    name: String::new(),
                },
                invalid.span,
            ),
        }
    }

    fn assign_pat(&mut self, assign: &swc::AssignPat) -> NodeId {
        let left = self.pat(&assign.left);
        let right = self.expr(&assign.right);
        self.alloc(NodeKind::AssignmentPattern { left, right }, assign.span)
    }

    fn object_pat(&mut self, object: &swc::ObjectPat) -> NodeId {
        let properties = object
            .props
            .iter()
            .map(|prop| match prop {
                swc::ObjectPatProp::KeyValue(kv) => {
                    let (key, computed) = self.prop_name(&kv.key);
                    let value = self.pat(&kv.value);
                    let span = Span::new(kv.key.span().lo, kv.value.span().hi);
                    self.alloc(
                        NodeKind::Property {
                            key,
                            value,
                            kind: PropertyKind::Init,
                            computed,
                            method: false,
                            shorthand: false,
                        },
                        span,
                    )
                }
                swc::ObjectPatProp::Assign(assign) => {
                    let key = self.ident(&assign.key.id);
                    let value = match &assign.value {
                        Some(default) => {
                            let left = self.ident(&assign.key.id);
                            let right = self.expr(default);
                            self.alloc(NodeKind::AssignmentPattern { left, right }, assign.span)
                        }
                        None => self.ident(&assign.key.id),
                    };
                    self.alloc(
                        NodeKind::Property {
                            key,
                            value,
                            kind: PropertyKind::Init,
                            computed: false,
                            method: false,
                            shorthand: true,
                        },
                        assign.span,
                    )
                }
                swc::ObjectPatProp::Rest(rest) => {
                    let argument = self.pat(&rest.arg);
                    self.alloc(NodeKind::RestElement { argument }, rest.span)
                }
            })
            .collect();
        self.alloc(NodeKind::ObjectPattern { properties }, object.span)
    }

    fn assign_target(&mut self, target: &swc::AssignTarget) -> NodeId {
        match target {
            swc::AssignTarget::Simple(simple) => match simple {
                swc::SimpleAssignTarget::Ident(binding) => self.ident(&binding.id),
                swc::SimpleAssignTarget::Member(member) => self.member(member, false),
                swc::SimpleAssignTarget::SuperProp(sup) => self.super_prop(sup),
                swc::SimpleAssignTarget::Paren(paren) => self.paren(paren),
                swc::SimpleAssignTarget::OptChain(chain) => self.opt_chain(chain, false),
                swc::SimpleAssignTarget::TsAs(ts) => {
                    let expression = self.expr(&ts.expr);
                    self.alloc(NodeKind::TSAsExpression { expression }, ts.span)
                }
                swc::SimpleAssignTarget::TsSatisfies(ts) => {
                    let expression = self.expr(&ts.expr);
                    self.alloc(NodeKind::TSSatisfiesExpression { expression }, ts.span)
                }
                swc::SimpleAssignTarget::TsNonNull(ts) => {
                    let expression = self.expr(&ts.expr);
                    self.alloc(NodeKind::TSNonNullExpression { expression }, ts.span)
                }
                swc::SimpleAssignTarget::TsTypeAssertion(ts) => {
                    let expression = self.expr(&ts.expr);
                    self.alloc(NodeKind::TSTypeAssertion { expression }, ts.span)
                }
                other => self.alloc(
                    NodeKind::Identifier {
                        name: String::new(),
                    },
                    other.span(),
                ),
            },
            swc::AssignTarget::Pat(pat) => match pat {
                swc::AssignTargetPat::Array(array) => {
                    let elements = array
                        .elems
                        .iter()
                        .map(|elem| elem.as_ref().map(|elem| self.pat(elem)))
                        .collect();
                    self.alloc(NodeKind::ArrayPattern { elements }, array.span)
                }
                swc::AssignTargetPat::Object(object) => self.object_pat(object),
                swc::AssignTargetPat::Invalid(invalid) => self.alloc(
                    NodeKind::Identifier {
                        name: String::new(),
                    },
                    invalid.span,
                ),
            },
        }
    }

    // ---- expressions ----

    fn expr(&mut self, expr: &swc::Expr) -> NodeId {
        self.expr_in(expr, false)
    }

    fn paren(&mut self, paren: &swc::ParenExpr) -> NodeId {
        let inner = self.expr_in(&paren.expr, false);
        self.builder.add_parens(inner);
        inner
    }

    fn expr_or_spread(&mut self, arg: &swc::ExprOrSpread) -> NodeId {
        match arg.spread {
            Some(dot3) => {
                let argument = self.expr(&arg.expr);
                let span = Span::new(dot3.lo, arg.expr.span().hi);
                self.alloc(NodeKind::SpreadElement { argument }, span)
            }
            None => self.expr(&arg.expr),
        }
    }

    fn member(&mut self, member: &swc::MemberExpr, in_chain: bool) -> NodeId {
        self.member_with(member, in_chain, false)
    }

    fn member_with(&mut self, member: &swc::MemberExpr, in_chain: bool, optional: bool) -> NodeId {
        let object = self.expr_in(&member.obj, in_chain);
        let (property, computed) = match &member.prop {
            swc::MemberProp::Ident(ident) => (self.ident_name(ident), false),
            swc::MemberProp::PrivateName(name) => (self.private_name(name), false),
            swc::MemberProp::Computed(computed) => (self.expr(&computed.expr), true),
        };
        self.alloc(
            NodeKind::MemberExpression {
                object,
                property,
                computed,
                optional,
            },
            member.span,
        )
    }

    fn super_prop(&mut self, sup: &swc::SuperPropExpr) -> NodeId {
        let object = self.alloc(NodeKind::Super, sup.obj.span);
        let (property, computed) = match &sup.prop {
            swc::SuperProp::Ident(ident) => (self.ident_name(ident), false),
            swc::SuperProp::Computed(computed) => (self.expr(&computed.expr), true),
        };
        self.alloc(
            NodeKind::MemberExpression {
                object,
                property,
                computed,
                optional: false,
            },
            sup.span,
        )
    }

    fn call(&mut self, call: &swc::CallExpr, in_chain: bool) -> NodeId {
        match &call.callee {
            swc::Callee::Import(_) => {
                let mut args = call.args.iter();
                let source = match args.next() {
                    Some(arg) => self.expr_or_spread(arg),
                    None => self.alloc(
                        NodeKind::Identifier {
                            name: String::new(),
                        },
                        call.span,
                    ),
                };
                let options = args.next().map(|arg| self.expr_or_spread(arg));
                self.alloc(NodeKind::ImportExpression { source, options }, call.span)
            }
            swc::Callee::Super(sup) => {
                let callee = self.alloc(NodeKind::Super, sup.span);
                let arguments = call.args.iter().map(|arg| self.expr_or_spread(arg)).collect();
                self.alloc(
                    NodeKind::CallExpression {
                        callee,
                        arguments,
                        optional: false,
                    },
                    call.span,
                )
            }
            swc::Callee::Expr(expr) => {
                let callee = self.expr_in(expr, in_chain);
                let arguments = call.args.iter().map(|arg| self.expr_or_spread(arg)).collect();
                self.alloc(
                    NodeKind::CallExpression {
                        callee,
                        arguments,
                        optional: false,
                    },
                    call.span,
                )
            }
        }
    }

    fn opt_chain(&mut self, chain: &swc::OptChainExpr, in_chain: bool) -> NodeId {
        let inner = match &*chain.base {
            swc::OptChainBase::Member(member) => self.member_with(member, true, chain.optional),
            swc::OptChainBase::Call(call) => {
                let callee = self.expr_in(&call.callee, true);
                let arguments = call.args.iter().map(|arg| self.expr_or_spread(arg)).collect();
                self.alloc(
                    NodeKind::CallExpression {
                        callee,
                        arguments,
                        optional: chain.optional,
                    },
                    call.span,
                )
            }
        };
        if in_chain {
            inner
        } else {
            self.alloc(NodeKind::ChainExpression { expression: inner }, chain.span)
        }
    }

    fn template(&mut self, tpl: &swc::Tpl) -> NodeId {
        let quasis = tpl
            .quasis
            .iter()
            .map(|quasi| {
                self.alloc(
                    NodeKind::TemplateElement {
                        cooked: quasi.cooked.as_ref().map(|cooked| cooked.to_string()),
                        raw: quasi.raw.to_string(),
                        tail: quasi.tail,
                    },
                    quasi.span,
                )
            })
            .collect();
        let expressions = tpl.exprs.iter().map(|expr| self.expr(expr)).collect();
        self.alloc(
            NodeKind::TemplateLiteral {
                quasis,
                expressions,
            },
            tpl.span,
        )
    }

    fn literal(&mut self, lit: &swc::Lit) -> NodeId {
        let span = lit.span();
        let raw = self.raw(span);
        let value = match lit {
            swc::Lit::Str(s) => LiteralValue::String(s.value.to_string()),
            swc::Lit::Bool(b) => LiteralValue::Boolean(b.value),
            swc::Lit::Null(_) => LiteralValue::Null,
            swc::Lit::Num(num) => LiteralValue::Number(num.value),
            swc::Lit::BigInt(big) => LiteralValue::BigInt(big.value.to_string()),
            swc::Lit::Regex(regex) => LiteralValue::RegExp {
                pattern: regex.exp.to_string(),
                flags: regex.flags.to_string(),
            },
            swc::Lit::JSXText(text) => LiteralValue::String(text.value.to_string()),
        };
        self.alloc(NodeKind::Literal(Literal { value, raw }), span)
    }

    fn prop(&mut self, prop: &swc::Prop) -> NodeId {
        let span = prop.span();
        let property = |key, value, kind, computed, method, shorthand| NodeKind::Property {
            key,
            value,
            kind,
            computed,
            method,
            shorthand,
        };
        match prop {
            swc::Prop::Shorthand(ident) => {
                let key = self.ident(ident);
                let value = self.ident(ident);
                self.alloc(property(key, value, PropertyKind::Init, false, false, true), span)
            }
            swc::Prop::KeyValue(kv) => {
                let (key, computed) = self.prop_name(&kv.key);
                let value = self.expr(&kv.value);
                self.alloc(
                    property(key, value, PropertyKind::Init, computed, false, false),
                    span,
                )
            }
            swc::Prop::Assign(assign) => {
                let key = self.ident(&assign.key);
                let left = self.ident(&assign.key);
                let right = self.expr(&assign.value);
                let value = self.alloc(NodeKind::AssignmentPattern { left, right }, assign.span);
                self.alloc(property(key, value, PropertyKind::Init, false, false, true), span)
            }
            swc::Prop::Getter(getter) => {
                let (key, computed) = self.prop_name(&getter.key);
                let body = getter.body.as_ref().map(|body| self.block(body));
                let value = self.alloc(
                    NodeKind::FunctionExpression(Function {
                        id: None,
                        params: Vec::new(),
                        body,
                        is_async: false,
                        is_generator: false,
                        expression: false,
                    }),
                    getter.span,
                );
                self.alloc(
                    property(key, value, PropertyKind::Get, computed, false, false),
                    span,
                )
            }
            swc::Prop::Setter(setter) => {
                let (key, computed) = self.prop_name(&setter.key);
                let param = self.pat(&setter.param);
                let body = setter.body.as_ref().map(|body| self.block(body));
                let value = self.alloc(
                    NodeKind::FunctionExpression(Function {
                        id: None,
                        params: vec![param],
                        body,
                        is_async: false,
                        is_generator: false,
                        expression: false,
                    }),
                    setter.span,
                );
                self.alloc(
                    property(key, value, PropertyKind::Set, computed, false, false),
                    span,
                )
            }
            swc::Prop::Method(method) => {
                let (key, computed) = self.prop_name(&method.key);
                let value = self.function_expression(&method.function);
                self.alloc(
                    property(key, value, PropertyKind::Init, computed, true, false),
                    span,
                )
            }
        }
    }

    fn expr_in(&mut self, expr: &swc::Expr, in_chain: bool) -> NodeId {
        match expr {
            swc::Expr::This(this) => self.alloc(NodeKind::ThisExpression, this.span),
            swc::Expr::Array(array) => {
                let elements = array
                    .elems
                    .iter()
                    .map(|elem| elem.as_ref().map(|elem| self.expr_or_spread(elem)))
                    .collect();
                self.alloc(NodeKind::ArrayExpression { elements }, array.span)
            }
            swc::Expr::Object(object) => {
                let properties = object
                    .props
                    .iter()
                    .map(|prop| match prop {
                        swc::PropOrSpread::Spread(spread) => {
                            let argument = self.expr(&spread.expr);
                            let span = Span::new(spread.dot3_token.lo, spread.expr.span().hi);
                            self.alloc(NodeKind::SpreadElement { argument }, span)
                        }
                        swc::PropOrSpread::Prop(prop) => self.prop(prop),
                    })
                    .collect();
                self.alloc(NodeKind::ObjectExpression { properties }, object.span)
            }
            swc::Expr::Fn(f) => {
                let id = f.ident.as_ref().map(|ident| self.ident(ident));
                let function = self.function(id, &f.function);
                self.alloc(NodeKind::FunctionExpression(function), f.function.span)
            }
            swc::Expr::Unary(unary) => {
                let argument = self.expr(&unary.arg);
                let operator = match unary.op {
                    swc::UnaryOp::Minus => UnaryOperator::Minus,
                    swc::UnaryOp::Plus => UnaryOperator::Plus,
                    swc::UnaryOp::Bang => UnaryOperator::Not,
                    swc::UnaryOp::Tilde => UnaryOperator::BitNot,
                    swc::UnaryOp::TypeOf => UnaryOperator::Typeof,
                    swc::UnaryOp::Void => UnaryOperator::Void,
                    swc::UnaryOp::Delete => UnaryOperator::Delete,
                };
                self.alloc(NodeKind::UnaryExpression { operator, argument }, unary.span)
            }
            swc::Expr::Update(update) => {
                let argument = self.expr(&update.arg);
                let operator = match update.op {
                    swc::UpdateOp::PlusPlus => UpdateOperator::Increment,
                    swc::UpdateOp::MinusMinus => UpdateOperator::Decrement,
                };
                self.alloc(
                    NodeKind::UpdateExpression {
                        operator,
                        prefix: update.prefix,
                        argument,
                    },
                    update.span,
                )
            }
            swc::Expr::Bin(bin) => {
                let left = self.expr(&bin.left);
                let right = self.expr(&bin.right);
                let kind = match logical_operator(bin.op) {
                    Some(operator) => NodeKind::LogicalExpression {
                        operator,
                        left,
                        right,
                    },
                    None => NodeKind::BinaryExpression {
                        operator: binary_operator(bin.op),
                        left,
                        right,
                    },
                };
                self.alloc(kind, bin.span)
            }
            swc::Expr::Assign(assign) => {
                let left = self.assign_target(&assign.left);
                let right = self.expr(&assign.right);
                self.alloc(
                    NodeKind::AssignmentExpression {
                        operator: assignment_operator(assign.op),
                        left,
                        right,
                    },
                    assign.span,
                )
            }
            swc::Expr::Member(member) => self.member(member, in_chain),
            swc::Expr::SuperProp(sup) => self.super_prop(sup),
            swc::Expr::Cond(cond) => {
                let test = self.expr(&cond.test);
                let consequent = self.expr(&cond.cons);
                let alternate = self.expr(&cond.alt);
                self.alloc(
                    NodeKind::ConditionalExpression {
                        test,
                        consequent,
                        alternate,
                    },
                    cond.span,
                )
            }
            swc::Expr::Call(call) => self.call(call, in_chain),
            swc::Expr::New(new) => {
                let callee = self.expr(&new.callee);
                let arguments = new
                    .args
                    .as_ref()
                    .map(|args| args.iter().map(|arg| self.expr_or_spread(arg)).collect())
                    .unwrap_or_default();
                self.alloc(NodeKind::NewExpression { callee, arguments }, new.span)
            }
            swc::Expr::Seq(seq) => {
                let expressions = seq.exprs.iter().map(|expr| self.expr(expr)).collect();
                self.alloc(NodeKind::SequenceExpression { expressions }, seq.span)
            }
            swc::Expr::Ident(ident) => self.ident(ident),
            swc::Expr::Lit(lit) => self.literal(lit),
            swc::Expr::Tpl(tpl) => self.template(tpl),
            swc::Expr::TaggedTpl(tagged) => {
                let tag = self.expr(&tagged.tag);
                let quasi = self.template(&tagged.tpl);
                self.alloc(NodeKind::TaggedTemplateExpression { tag, quasi }, tagged.span)
            }
            swc::Expr::Arrow(arrow) => self.arrow(arrow),
            swc::Expr::Class(class) => {
                let id = class.ident.as_ref().map(|ident| self.ident(ident));
                let class_node = self.class(id, &class.class);
                self.alloc(NodeKind::ClassExpression(class_node), class.class.span)
            }
            swc::Expr::Yield(yield_expr) => {
                let argument = yield_expr.arg.as_ref().map(|arg| self.expr(arg));
                self.alloc(
                    NodeKind::YieldExpression {
                        argument,
                        delegate: yield_expr.delegate,
                    },
                    yield_expr.span,
                )
            }
            swc::Expr::MetaProp(meta) => {
                let (meta_name, property_name) = match meta.kind {
                    swc::MetaPropKind::NewTarget => ("new", "target"),
                    swc::MetaPropKind::ImportMeta => ("import", "meta"),
                };
                let meta_node = self.alloc(
                    NodeKind::Identifier {
                        name: meta_name.to_string(),
                    },
                    meta.span,
                );
                let property = self.alloc(
                    NodeKind::Identifier {
                        name: property_name.to_string(),
                    },
                    meta.span,
                );
                self.alloc(
                    NodeKind::MetaProperty {
                        meta: meta_node,
                        property,
                    },
                    meta.span,
                )
            }
            swc::Expr::Await(await_expr) => {
                let argument = self.expr(&await_expr.arg);
                self.alloc(NodeKind::AwaitExpression { argument }, await_expr.span)
            }
            swc::Expr::Paren(paren) => self.paren(paren),
            swc::Expr::PrivateName(name) => self.private_name(name),
            swc::Expr::OptChain(chain) => self.opt_chain(chain, in_chain),
            swc::Expr::TsTypeAssertion(ts) => {
                let expression = self.expr_in(&ts.expr, in_chain);
                self.alloc(NodeKind::TSTypeAssertion { expression }, ts.span)
            }
            swc::Expr::TsConstAssertion(ts) => {
                let expression = self.expr_in(&ts.expr, in_chain);
                self.alloc(NodeKind::TSAsExpression { expression }, ts.span)
            }
            swc::Expr::TsNonNull(ts) => {
                let expression = self.expr_in(&ts.expr, in_chain);
                self.alloc(NodeKind::TSNonNullExpression { expression }, ts.span)
            }
            swc::Expr::TsAs(ts) => {
                let expression = self.expr_in(&ts.expr, in_chain);
                self.alloc(NodeKind::TSAsExpression { expression }, ts.span)
            }
            swc::Expr::TsInstantiation(ts) => {
                let expression = self.expr_in(&ts.expr, in_chain);
                self.alloc(NodeKind::TSInstantiationExpression { expression }, ts.span)
            }
            swc::Expr::TsSatisfies(ts) => {
                let expression = self.expr_in(&ts.expr, in_chain);
                self.alloc(NodeKind::TSSatisfiesExpression { expression }, ts.span)
            }
            swc::Expr::Invalid(invalid) => self.alloc(
                NodeKind::Identifier {
                    name: String::new(),
                },
                invalid.span,
            ),
            other => self.alloc(NodeKind::JSXElement, other.span()),
        }
    }
}

fn method_kind(kind: swc::MethodKind) -> MethodKind {
    match kind {
        swc::MethodKind::Method => MethodKind::Method,
        swc::MethodKind::Getter => MethodKind::Get,
        swc::MethodKind::Setter => MethodKind::Set,
    }
}

fn logical_operator(op: swc::BinaryOp) -> Option<LogicalOperator> {
    match op {
        swc::BinaryOp::LogicalOr => Some(LogicalOperator::Or),
        swc::BinaryOp::LogicalAnd => Some(LogicalOperator::And),
        swc::BinaryOp::NullishCoalescing => Some(LogicalOperator::Nullish),
        _ => None,
    }
}

fn binary_operator(op: swc::BinaryOp) -> BinaryOperator {
    match op {
        swc::BinaryOp::EqEq => BinaryOperator::Eq,
        swc::BinaryOp::NotEq => BinaryOperator::NotEq,
        swc::BinaryOp::EqEqEq => BinaryOperator::StrictEq,
        swc::BinaryOp::NotEqEq => BinaryOperator::StrictNotEq,
        swc::BinaryOp::Lt => BinaryOperator::Lt,
        swc::BinaryOp::LtEq => BinaryOperator::LtEq,
        swc::BinaryOp::Gt => BinaryOperator::Gt,
        swc::BinaryOp::GtEq => BinaryOperator::GtEq,
        swc::BinaryOp::LShift => BinaryOperator::Shl,
        swc::BinaryOp::RShift => BinaryOperator::Shr,
        swc::BinaryOp::ZeroFillRShift => BinaryOperator::UShr,
        swc::BinaryOp::Add => BinaryOperator::Add,
        swc::BinaryOp::Sub => BinaryOperator::Sub,
        swc::BinaryOp::Mul => BinaryOperator::Mul,
        swc::BinaryOp::Div => BinaryOperator::Div,
        swc::BinaryOp::Mod => BinaryOperator::Rem,
        swc::BinaryOp::Exp => BinaryOperator::Exp,
        swc::BinaryOp::BitOr => BinaryOperator::BitOr,
        swc::BinaryOp::BitXor => BinaryOperator::BitXor,
        swc::BinaryOp::BitAnd => BinaryOperator::BitAnd,
        swc::BinaryOp::In => BinaryOperator::In,
        swc::BinaryOp::InstanceOf => BinaryOperator::InstanceOf,
        // logical operators are lowered separately
        swc::BinaryOp::LogicalOr
        | swc::BinaryOp::LogicalAnd
        | swc::BinaryOp::NullishCoalescing => BinaryOperator::BitOr,
    }
}

fn assignment_operator(op: swc::AssignOp) -> AssignmentOperator {
    match op {
        swc::AssignOp::Assign => AssignmentOperator::Assign,
        swc::AssignOp::AddAssign => AssignmentOperator::Add,
        swc::AssignOp::SubAssign => AssignmentOperator::Sub,
        swc::AssignOp::MulAssign => AssignmentOperator::Mul,
        swc::AssignOp::DivAssign => AssignmentOperator::Div,
        swc::AssignOp::ModAssign => AssignmentOperator::Rem,
        swc::AssignOp::ExpAssign => AssignmentOperator::Exp,
        swc::AssignOp::LShiftAssign => AssignmentOperator::Shl,
        swc::AssignOp::RShiftAssign => AssignmentOperator::Shr,
        swc::AssignOp::ZeroFillRShiftAssign => AssignmentOperator::UShr,
        swc::AssignOp::BitOrAssign => AssignmentOperator::BitOr,
        swc::AssignOp::BitXorAssign => AssignmentOperator::BitXor,
        swc::AssignOp::BitAndAssign => AssignmentOperator::BitAnd,
        swc::AssignOp::OrAssign => AssignmentOperator::Or,
        swc::AssignOp::AndAssign => AssignmentOperator::And,
        swc::AssignOp::NullishAssign => AssignmentOperator::Nullish,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{LiteralValue, NodeKind};
    use crate::parser::ParsedFile;

    fn first_expression(code: &str) -> (ParsedFile, crate::ast::NodeId) {
        let file = ParsedFile::from_source("test.js", code);
        let ast = file.ast();
        let NodeKind::Program { body, .. } = ast.kind(ast.root()) else {
            panic!("expected program");
        };
        let NodeKind::ExpressionStatement { expression } = ast.kind(body[0]) else {
            panic!("expected expression statement");
        };
        let expression = *expression;
        (file, expression)
    }

    #[test]
    fn parentheses_are_counted_not_kept() {
        let (file, expr) = first_expression("((a));");
        let node = file.ast().get(expr);

        assert_eq!(node.type_name(), "Identifier");
        assert_eq!(node.parens, 2);
    }

    #[test]
    fn optional_chain_becomes_chain_expression() {
        let (file, expr) = first_expression("a?.b.c;");
        let ast = file.ast();
        let NodeKind::ChainExpression { expression } = ast.kind(expr) else {
            panic!("expected chain");
        };
        let NodeKind::MemberExpression { object, optional, .. } = ast.kind(*expression) else {
            panic!("expected member");
        };
        assert!(!optional);
        assert!(matches!(
            ast.kind(*object),
            NodeKind::MemberExpression { optional: true, .. }
        ));
    }

    #[test]
    fn parenthesized_chain_is_its_own_chain() {
        let (file, expr) = first_expression("(a?.b).c;");
        let ast = file.ast();
        let NodeKind::MemberExpression { object, .. } = ast.kind(expr) else {
            panic!("expected member, got {}", ast.get(expr).type_name());
        };
        assert_eq!(ast.get(*object).type_name(), "ChainExpression");
    }

    #[test]
    fn logical_operators_are_separate_nodes() {
        let (file, expr) = first_expression("a ?? b;");

        assert_eq!(file.ast().get(expr).type_name(), "LogicalExpression");
    }

    #[test]
    fn children_have_parent_links() {
        let (file, expr) = first_expression("f(x, y);");
        let ast = file.ast();

        for child in ast.children(expr) {
            assert_eq!(ast.parent(child), Some(expr));
        }
        assert_eq!(ast.children(expr).len(), 3);
    }

    #[test]
    fn object_properties_follow_estree() {
        let (file, expr) = first_expression("({ a, b: 1, [c]: 2, d() {}, get e() { return 1 } });");
        let ast = file.ast();
        let NodeKind::ObjectExpression { properties } = ast.kind(expr) else {
            panic!("expected object");
        };
        let shapes: Vec<_> = properties
            .iter()
            .map(|p| match ast.kind(*p) {
                NodeKind::Property {
                    computed,
                    method,
                    shorthand,
                    kind,
                    ..
                } => (*computed, *method, *shorthand, *kind),
                _ => panic!("expected property"),
            })
            .collect();

        use crate::ast::PropertyKind::*;
        assert_eq!(
            shapes,
            vec![
                (false, false, true, Init),
                (false, false, false, Init),
                (true, false, false, Init),
                (false, true, false, Init),
                (false, false, false, Get),
            ]
        );
    }

    #[test]
    fn array_holes_are_preserved() {
        let (file, expr) = first_expression("[1, , 3];");
        let NodeKind::ArrayExpression { elements } = file.ast().kind(expr) else {
            panic!("expected array");
        };

        assert_eq!(elements.len(), 3);
        assert!(elements[1].is_none());
    }

    #[test]
    fn literal_keeps_raw_text() {
        let (file, expr) = first_expression("0x10;");
        let NodeKind::Literal(literal) = file.ast().kind(expr) else {
            panic!("expected literal");
        };

        assert_eq!(literal.raw, "0x10");
        assert_eq!(literal.value, LiteralValue::Number(16.0));
    }

    #[test]
    fn regex_literal_keeps_pattern_and_flags() {
        let (file, expr) = first_expression("/a+b/gu;");
        let NodeKind::Literal(literal) = file.ast().kind(expr) else {
            panic!("expected literal");
        };

        assert_eq!(
            literal.value,
            LiteralValue::RegExp {
                pattern: "a+b".to_string(),
                flags: "gu".to_string()
            }
        );
    }
}
