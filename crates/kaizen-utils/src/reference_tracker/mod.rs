//! Tracking uses of well-known globals and modules.
//!
//! A [`TraceMap`] lists the property paths of interest. The tracker follows
//! every read of a traced global, `require(...)` result or import binding
//! through member accesses, aliasing assignments and destructuring, and
//! reports the reads, calls and constructions the map marks.
//!
//! Iterators are lazy. Their traversal state lives on an explicit work
//! stack, so dropping one part-way releases everything.

mod trace_map;

use std::sync::LazyLock;

use serde::Deserialize;
use tracing::debug;

use crate::ast::{Ast, LiteralValue, NodeId, NodeKind};
use crate::context::Context;
use crate::find_variable::find_variable;
use crate::property_name::get_property_name;
use crate::scope::{ScopeId, VariableId};
use crate::static_value::get_string_if_constant;

pub use trace_map::TraceMap;
use trace_map::TraceNode;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackerMode {
    /// Named imports from a CommonJS module only reach its `default`.
    #[default]
    Strict,
    /// Named imports from a CommonJS module also reach its own members.
    Legacy,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReferenceTrackerOptions {
    pub mode: TrackerMode,
    /// Names that refer to the global object itself.
    pub global_object_names: Vec<String>,
}

impl Default for ReferenceTrackerOptions {
    fn default() -> Self {
        Self {
            mode: TrackerMode::Strict,
            global_object_names: ["global", "globalThis", "self", "window"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Read,
    Call,
    Construct,
}

/// A traced use of the API surface.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedReference<'m, T> {
    pub node: NodeId,
    /// Property path from the traced root.
    pub path: Vec<String>,
    pub kind: ReferenceKind,
    pub info: &'m T,
}

static REQUIRE_CALL: LazyLock<TraceMap<()>> =
    LazyLock::new(|| TraceMap::new().child("require", TraceMap::new().call(())));

pub struct ReferenceTracker<'a> {
    ctx: Context<'a>,
    global_scope: ScopeId,
    options: ReferenceTrackerOptions,
}

impl<'a> ReferenceTracker<'a> {
    pub fn new(ctx: &Context<'a>, global_scope: ScopeId, options: ReferenceTrackerOptions) -> Self {
        Self {
            ctx: *ctx,
            global_scope,
            options,
        }
    }

    /// References to traced globals, first by name and then through the
    /// global object aliases (`window.Foo` for `Foo`).
    pub fn iterate_global_references<'m, T>(
        &self,
        trace_map: &'m TraceMap<T>,
    ) -> GlobalReferences<'a, 'm, T> {
        let mut walker = Walker::new(self.ctx, self.global_scope);
        let roots = trace_map
            .children
            .iter()
            .map(|(name, child)| Task::Global {
                name: name.clone(),
                path: vec![name.clone()],
                trace: TraceNode::Map(child),
                report: true,
            })
            .chain(self.options.global_object_names.iter().map(|name| Task::Global {
                name: name.clone(),
                path: Vec::new(),
                trace: TraceNode::Map(trace_map),
                report: false,
            }));
        walker.push_in_order(roots);
        GlobalReferences { walker }
    }

    /// References reached through `require("id")` calls with a constant
    /// module id.
    pub fn iterate_cjs_references<'m, T>(
        &self,
        trace_map: &'m TraceMap<T>,
    ) -> CjsReferences<'a, 'm, T> {
        CjsReferences {
            requires: self.iterate_global_references(&*REQUIRE_CALL),
            walker: Walker::new(self.ctx, self.global_scope),
            trace_map,
        }
    }

    /// References reached through import and re-export declarations.
    pub fn iterate_esm_references<'m, T>(
        &self,
        trace_map: &'m TraceMap<T>,
    ) -> EsmReferences<'a, 'm, T> {
        let ast = self.ctx.ast;
        let block = self.ctx.scopes.get(self.global_scope).block;
        let declarations = match ast.kind(block) {
            NodeKind::Program { body, .. } => body.clone(),
            _ => Vec::new(),
        };
        EsmReferences {
            ast,
            legacy: self.options.mode == TrackerMode::Legacy,
            declarations: declarations.into_iter(),
            pending: Vec::new(),
            walker: Walker::new(self.ctx, self.global_scope),
            interop: false,
            trace_map,
        }
    }
}

enum Task<'m, T> {
    /// A top-level global lookup.
    Global {
        name: String,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
        report: bool,
    },
    /// Read references of a variable from `next` on. The variable sits on
    /// the walker's variable stack until this task finishes.
    Variable {
        variable: VariableId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
        report: bool,
        next: usize,
    },
    /// How the value at `node` is consumed.
    Property {
        node: NodeId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    },
    /// A binding target receiving the traced value.
    Pattern {
        pattern: NodeId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    },
    /// Object pattern properties from `next` on.
    ObjectPattern {
        properties: Vec<NodeId>,
        next: usize,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    },
    /// An import or export specifier.
    Specifier {
        specifier: NodeId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    },
}

struct Walker<'a, 'm, T> {
    ctx: Context<'a>,
    global_scope: ScopeId,
    tasks: Vec<Task<'m, T>>,
    variable_stack: Vec<VariableId>,
}

impl<'a, 'm, T> Walker<'a, 'm, T> {
    fn new(ctx: Context<'a>, global_scope: ScopeId) -> Self {
        Self {
            ctx,
            global_scope,
            tasks: Vec::new(),
            variable_stack: Vec::new(),
        }
    }

    /// Schedules `tasks` to run in iteration order.
    fn push_in_order(&mut self, tasks: impl IntoIterator<Item = Task<'m, T>>) {
        let mut tasks: Vec<_> = tasks.into_iter().collect();
        tasks.reverse();
        self.tasks.extend(tasks);
    }

    fn next_reference(&mut self) -> Option<TrackedReference<'m, T>> {
        while let Some(task) = self.tasks.pop() {
            if let Some(reference) = self.step(task) {
                return Some(reference);
            }
        }
        None
    }

    fn ast(&self) -> &'a Ast {
        self.ctx.ast
    }

    fn enter_variable(
        &mut self,
        variable: VariableId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
        report: bool,
    ) {
        if self.variable_stack.contains(&variable) {
            return;
        }
        self.variable_stack.push(variable);
        self.tasks.push(Task::Variable {
            variable,
            path,
            trace,
            report,
            next: 0,
        });
    }

    fn step(&mut self, task: Task<'m, T>) -> Option<TrackedReference<'m, T>> {
        match task {
            Task::Global {
                name,
                path,
                trace,
                report,
            } => {
                let scopes = self.ctx.scopes;
                let variable = scopes.get(self.global_scope).set.get(&name).copied()?;
                let info = scopes.variable(variable);
                if !info.defs.is_empty() || scopes.references_of(variable).any(|r| r.is_write()) {
                    debug!(name = %name, "skipping modified global");
                    return None;
                }
                self.enter_variable(variable, path, trace, report);
                None
            }
            Task::Variable {
                variable,
                path,
                trace,
                report,
                next,
            } => self.step_variable(variable, path, trace, report, next),
            Task::Property { node, path, trace } => self.step_property(node, path, trace),
            Task::Pattern {
                pattern,
                path,
                trace,
            } => {
                self.step_pattern(pattern, path, trace);
                None
            }
            Task::ObjectPattern {
                properties,
                next,
                path,
                trace,
            } => self.step_object_pattern(properties, next, path, trace),
            Task::Specifier {
                specifier,
                path,
                trace,
            } => self.step_specifier(specifier, path, trace),
        }
    }

    fn step_variable(
        &mut self,
        variable: VariableId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
        report: bool,
        next: usize,
    ) -> Option<TrackedReference<'m, T>> {
        let scopes = self.ctx.scopes;
        let references = &scopes.variable(variable).references;
        let Some(offset) = references[next..]
            .iter()
            .position(|&r| scopes.reference(r).is_read())
        else {
            self.variable_stack.pop();
            return None;
        };
        let index = next + offset;
        let node = scopes.reference(references[index]).identifier;

        self.tasks.push(Task::Variable {
            variable,
            path: path.clone(),
            trace,
            report,
            next: index + 1,
        });
        let reported = report.then(|| trace.read()).flatten().map(|info| TrackedReference {
            node,
            path: path.clone(),
            kind: ReferenceKind::Read,
            info,
        });
        self.tasks.push(Task::Property { node, path, trace });
        reported
    }

    fn step_property(
        &mut self,
        node: NodeId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    ) -> Option<TrackedReference<'m, T>> {
        let ast = self.ast();
        let mut node = node;
        while let Some(parent) = ast.parent(node) {
            if !is_pass_through(ast, parent, node) {
                break;
            }
            node = parent;
        }
        let parent = ast.parent(node)?;

        match ast.kind(parent) {
            NodeKind::MemberExpression { object, .. } if *object == node => {
                let key = get_property_name(&self.ctx, parent, None)?;
                let child = trace.child(&key)?;
                let mut path = path;
                path.push(key);
                let reported = child.read().map(|info| TrackedReference {
                    node: parent,
                    path: path.clone(),
                    kind: ReferenceKind::Read,
                    info,
                });
                self.tasks.push(Task::Property {
                    node: parent,
                    path,
                    trace: child,
                });
                reported
            }
            NodeKind::CallExpression { callee, .. } if *callee == node => {
                trace.call().map(|info| TrackedReference {
                    node: parent,
                    path,
                    kind: ReferenceKind::Call,
                    info,
                })
            }
            NodeKind::NewExpression { callee, .. } if *callee == node => {
                trace.construct().map(|info| TrackedReference {
                    node: parent,
                    path,
                    kind: ReferenceKind::Construct,
                    info,
                })
            }
            NodeKind::AssignmentExpression { left, right, .. } if *right == node => {
                self.tasks.push(Task::Property {
                    node: parent,
                    path: path.clone(),
                    trace,
                });
                self.tasks.push(Task::Pattern {
                    pattern: *left,
                    path,
                    trace,
                });
                None
            }
            NodeKind::AssignmentPattern { left, right } if *right == node => {
                self.tasks.push(Task::Pattern {
                    pattern: *left,
                    path,
                    trace,
                });
                None
            }
            NodeKind::VariableDeclarator { id, init: Some(init) } if *init == node => {
                self.tasks.push(Task::Pattern {
                    pattern: *id,
                    path,
                    trace,
                });
                None
            }
            _ => None,
        }
    }

    fn step_pattern(&mut self, pattern: NodeId, path: Vec<String>, trace: TraceNode<'m, T>) {
        let ast = self.ast();
        match ast.kind(pattern) {
            NodeKind::Identifier { .. } => {
                let Context { ast, scopes } = self.ctx;
                if let Some(variable) = find_variable(scopes, ast, self.global_scope, pattern) {
                    self.enter_variable(variable, path, trace, false);
                }
            }
            NodeKind::ObjectPattern { properties } => self.tasks.push(Task::ObjectPattern {
                properties: properties.clone(),
                next: 0,
                path,
                trace,
            }),
            NodeKind::AssignmentPattern { left, .. } => self.tasks.push(Task::Pattern {
                pattern: *left,
                path,
                trace,
            }),
            _ => {}
        }
    }

    fn step_object_pattern(
        &mut self,
        properties: Vec<NodeId>,
        next: usize,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    ) -> Option<TrackedReference<'m, T>> {
        let ast = self.ast();
        let found = properties[next..].iter().enumerate().find_map(|(offset, &property)| {
            let key = get_property_name(&self.ctx, property, None)?;
            let child = trace.child(&key)?;
            Some((next + offset, property, key, child))
        });
        let (index, property, key, child) = found?;

        self.tasks.push(Task::ObjectPattern {
            properties,
            next: index + 1,
            path: path.clone(),
            trace,
        });
        let mut path = path;
        path.push(key);
        let reported = child.read().map(|info| TrackedReference {
            node: property,
            path: path.clone(),
            kind: ReferenceKind::Read,
            info,
        });
        if let NodeKind::Property { value, .. } = ast.kind(property) {
            self.tasks.push(Task::Pattern {
                pattern: *value,
                path,
                trace: child,
            });
        }
        reported
    }

    fn step_specifier(
        &mut self,
        specifier: NodeId,
        path: Vec<String>,
        trace: TraceNode<'m, T>,
    ) -> Option<TrackedReference<'m, T>> {
        let ast = self.ast();
        let (key, local) = match ast.kind(specifier) {
            NodeKind::ImportSpecifier { imported, local } => {
                (module_export_name(ast, *imported)?, Some(*local))
            }
            NodeKind::ImportDefaultSpecifier { local } => ("default", Some(*local)),
            NodeKind::ImportNamespaceSpecifier { local } => {
                self.enter_local(*local, path, trace);
                return None;
            }
            NodeKind::ExportSpecifier { local, .. } => (module_export_name(ast, *local)?, None),
            _ => return None,
        };

        let child = trace.child(key)?;
        let mut path = path;
        path.push(key.to_string());
        let reported = child.read().map(|info| TrackedReference {
            node: specifier,
            path: path.clone(),
            kind: ReferenceKind::Read,
            info,
        });
        if let Some(local) = local {
            self.enter_local(local, path, child);
        }
        reported
    }

    fn enter_local(&mut self, local: NodeId, path: Vec<String>, trace: TraceNode<'m, T>) {
        let Context { ast, scopes } = self.ctx;
        if let Some(variable) = find_variable(scopes, ast, self.global_scope, local) {
            self.enter_variable(variable, path, trace, false);
        }
    }
}

/// Whether `parent` hands the value of `node` on unchanged.
fn is_pass_through(ast: &Ast, parent: NodeId, node: NodeId) -> bool {
    match ast.kind(parent) {
        NodeKind::ConditionalExpression {
            consequent,
            alternate,
            ..
        } => *consequent == node || *alternate == node,
        NodeKind::LogicalExpression { .. } | NodeKind::ChainExpression { .. } => true,
        NodeKind::SequenceExpression { expressions } => expressions.last() == Some(&node),
        kind => kind.ts_wrapped_expression() == Some(node),
    }
}

fn module_export_name(ast: &Ast, node: NodeId) -> Option<&str> {
    match ast.kind(node) {
        NodeKind::Identifier { name } => Some(name.as_str()),
        NodeKind::Literal(literal) => match &literal.value {
            LiteralValue::String(name) => Some(name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

pub struct GlobalReferences<'a, 'm, T> {
    walker: Walker<'a, 'm, T>,
}

impl<'m, T> Iterator for GlobalReferences<'_, 'm, T> {
    type Item = TrackedReference<'m, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.next_reference()
    }
}

pub struct CjsReferences<'a, 'm, T> {
    requires: GlobalReferences<'a, 'static, ()>,
    walker: Walker<'a, 'm, T>,
    trace_map: &'m TraceMap<T>,
}

impl<'m, T> Iterator for CjsReferences<'_, 'm, T> {
    type Item = TrackedReference<'m, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reference) = self.walker.next_reference() {
                return Some(reference);
            }
            let call = self.requires.next()?.node;
            let ctx = self.walker.ctx;
            let NodeKind::CallExpression { arguments, .. } = ctx.ast.kind(call) else {
                continue;
            };
            let Some(id) = arguments
                .first()
                .and_then(|&argument| get_string_if_constant(&ctx, argument, None))
            else {
                continue;
            };
            let Some(module) = self.trace_map.get(&id) else {
                continue;
            };

            let trace = TraceNode::Map(module);
            self.walker.tasks.push(Task::Property {
                node: call,
                path: vec![id.clone()],
                trace,
            });
            if let Some(info) = module.read.as_ref() {
                return Some(TrackedReference {
                    node: call,
                    path: vec![id],
                    kind: ReferenceKind::Read,
                    info,
                });
            }
        }
    }
}

pub struct EsmReferences<'a, 'm, T> {
    ast: &'a Ast,
    legacy: bool,
    declarations: std::vec::IntoIter<NodeId>,
    /// Declaration-level reports, in reverse order.
    pending: Vec<TrackedReference<'m, T>>,
    walker: Walker<'a, 'm, T>,
    /// Specifier reports of the current declaration follow CommonJS interop.
    interop: bool,
    trace_map: &'m TraceMap<T>,
}

impl<'m, T> EsmReferences<'_, 'm, T> {
    fn open(&mut self, declaration: NodeId) {
        let ast = self.ast;
        let (source, specifiers, export_all) = match ast.kind(declaration) {
            NodeKind::ImportDeclaration { specifiers, source } => {
                (*source, specifiers.as_slice(), false)
            }
            NodeKind::ExportNamedDeclaration {
                specifiers,
                source: Some(source),
                ..
            } => (*source, specifiers.as_slice(), false),
            NodeKind::ExportAllDeclaration { source, .. } => (*source, &[][..], true),
            _ => return,
        };
        let Some(id) = module_export_name(ast, source) else {
            return;
        };
        let Some(module) = self.trace_map.get(id) else {
            return;
        };
        let path = vec![id.to_string()];

        let mut reports = Vec::new();
        if let Some(info) = module.read.as_ref() {
            reports.push(TrackedReference {
                node: declaration,
                path: path.clone(),
                kind: ReferenceKind::Read,
                info,
            });
        }
        if export_all {
            for (key, export) in &module.children {
                if let Some(info) = export.read.as_ref() {
                    let mut path = path.clone();
                    path.push(key.clone());
                    reports.push(TrackedReference {
                        node: declaration,
                        path,
                        kind: ReferenceKind::Read,
                        info,
                    });
                }
            }
        }
        reports.reverse();
        self.pending = reports;

        self.interop = !module.esm;
        let trace = if module.esm {
            TraceNode::Map(module)
        } else {
            TraceNode::Interop {
                module,
                legacy: self.legacy,
            }
        };
        self.walker
            .push_in_order(specifiers.iter().map(|&specifier| Task::Specifier {
                specifier,
                path: path.clone(),
                trace,
            }));
    }
}

impl<'m, T> Iterator for EsmReferences<'_, 'm, T> {
    type Item = TrackedReference<'m, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(reference) = self.pending.pop() {
                return Some(reference);
            }
            while let Some(mut reference) = self.walker.next_reference() {
                if !self.interop {
                    return Some(reference);
                }
                if reference.path.get(1).is_some_and(|segment| segment == "default") {
                    reference.path.remove(1);
                }
                if reference.path.len() >= 2 || reference.kind != ReferenceKind::Read {
                    return Some(reference);
                }
            }
            let declaration = self.declarations.next()?;
            self.open(declaration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsedFile;
    use crate::scope::ScopeOptions;

    fn parse(code: &str) -> ParsedFile {
        let options = ScopeOptions::default().with_globals(["Foo", "lib"]);
        ParsedFile::with_scope_options("test.js", code, &options)
    }

    fn tracker<'a>(ctx: &Context<'a>) -> ReferenceTracker<'a> {
        ReferenceTracker::new(ctx, ctx.global_scope(), ReferenceTrackerOptions::default())
    }

    fn summary<'m, T: Clone + 'm>(
        ctx: &Context<'_>,
        refs: impl Iterator<Item = TrackedReference<'m, T>>,
    ) -> Vec<(String, String, ReferenceKind, T)> {
        refs.map(|r| {
            (
                ctx.node_text(r.node).to_string(),
                r.path.join("."),
                r.kind,
                r.info.clone(),
            )
        })
        .collect()
    }

    #[test]
    fn follows_global_member_chains() {
        let file = parse("Object.keys(a); Object.entries; foo.keys();");
        let ctx = file.context();
        let map = TraceMap::new().child(
            "Object",
            TraceMap::new()
                .child("keys", TraceMap::new().call("keys"))
                .child("entries", TraceMap::new().read("entries")),
        );

        let refs = summary(&ctx, tracker(&ctx).iterate_global_references(&map));

        assert_eq!(
            refs,
            vec![
                (
                    "Object.keys(a)".to_string(),
                    "Object.keys".to_string(),
                    ReferenceKind::Call,
                    "keys"
                ),
                (
                    "Object.entries".to_string(),
                    "Object.entries".to_string(),
                    ReferenceKind::Read,
                    "entries"
                ),
            ]
        );
    }

    #[test]
    fn global_object_aliases_reach_the_same_names() {
        let file = parse("window.Foo(); globalThis.Foo(); Foo();");
        let ctx = file.context();
        let map = TraceMap::new().child("Foo", TraceMap::new().call(1));

        let refs: Vec<_> = tracker(&ctx)
            .iterate_global_references(&map)
            .map(|r| (ctx.node_text(r.node).to_string(), r.path))
            .collect();

        assert_eq!(
            refs,
            vec![
                ("Foo()".to_string(), vec!["Foo".to_string()]),
                ("globalThis.Foo()".to_string(), vec!["Foo".to_string()]),
                ("window.Foo()".to_string(), vec!["Foo".to_string()]),
            ]
        );
    }

    #[test]
    fn modified_globals_are_skipped() {
        let map = TraceMap::new().child("Foo", TraceMap::new().call(1));
        for code in [
            "Foo = null; Foo();",
            "var Foo; Foo();",
            "window = {}; window.Foo();",
            "var window; window.Foo();",
        ] {
            let file = parse(code);
            let ctx = file.context();
            assert_eq!(tracker(&ctx).iterate_global_references(&map).count(), 0, "{code}");
        }
    }

    #[test]
    fn aliases_and_destructuring_are_followed() {
        let code = concat!(
            "const { a: { b }, c = 1 } = lib; b(); ",
            "const x = lib.a; x.b(); let y; y = lib; y.a.b();"
        );
        let file = parse(code);
        let ctx = file.context();
        let map = TraceMap::new().child(
            "lib",
            TraceMap::new().child("a", TraceMap::new().child("b", TraceMap::new().call("b"))),
        );

        let refs: Vec<_> = tracker(&ctx)
            .iterate_global_references(&map)
            .map(|r| ctx.node_text(r.node).to_string())
            .collect();

        assert_eq!(refs, vec!["b()", "x.b()", "y.a.b()"]);
    }

    #[test]
    fn pass_through_expressions_keep_the_traced_value() {
        let code = "(a || lib).run(); (0, lib).run(); (c ? lib : other).run(); lib?.run();";
        let file = parse(code);
        let ctx = file.context();
        let map =
            TraceMap::new().child("lib", TraceMap::new().child("run", TraceMap::new().call(())));

        assert_eq!(tracker(&ctx).iterate_global_references(&map).count(), 4);
    }

    #[test]
    fn construct_markers_report_new_expressions() {
        let file = parse("new Foo(); Foo();");
        let ctx = file.context();
        let map = TraceMap::new().child("Foo", TraceMap::new().construct("new"));

        let refs = summary(&ctx, tracker(&ctx).iterate_global_references(&map));

        assert_eq!(
            refs,
            vec![("new Foo()".to_string(), "Foo".to_string(), ReferenceKind::Construct, "new")]
        );
    }

    #[test]
    fn require_calls_trace_module_exports() {
        let code = concat!(
            "const fs = require('fs'); fs.readFileSync(p); ",
            "require('fs').readFile(); require(name);"
        );
        let file = parse(code);
        let ctx = file.context();
        let map = TraceMap::new().child(
            "fs",
            TraceMap::new()
                .read("module")
                .child("readFileSync", TraceMap::new().call("sync"))
                .child("readFile", TraceMap::new().call("async")),
        );

        let refs = summary(&ctx, tracker(&ctx).iterate_cjs_references(&map));

        assert_eq!(
            refs,
            vec![
                ("require('fs')".to_string(), "fs".to_string(), ReferenceKind::Read, "module"),
                (
                    "fs.readFileSync(p)".to_string(),
                    "fs.readFileSync".to_string(),
                    ReferenceKind::Call,
                    "sync"
                ),
                ("require('fs')".to_string(), "fs".to_string(), ReferenceKind::Read, "module"),
                (
                    "require('fs').readFile()".to_string(),
                    "fs.readFile".to_string(),
                    ReferenceKind::Call,
                    "async"
                ),
            ]
        );
    }

    #[test]
    fn require_call_without_use_reports_nothing() {
        let map = TraceMap::new().child("lib", TraceMap::new().call("info"));

        let file = parse("require('lib')();");
        let ctx = file.context();
        let refs = summary(&ctx, tracker(&ctx).iterate_cjs_references(&map));
        assert_eq!(
            refs,
            vec![("require('lib')()".to_string(), "lib".to_string(), ReferenceKind::Call, "info")]
        );

        let file = parse("require('lib');");
        let ctx = file.context();
        assert_eq!(tracker(&ctx).iterate_cjs_references(&map).count(), 0);
    }

    #[test]
    fn esm_imports_of_commonjs_modules_go_through_default() {
        let code = concat!(
            "import lib, { named } from 'lib'; import * as ns from 'lib'; ",
            "lib.run(); named(); ns.default.run();"
        );
        let file = parse(code);
        let ctx = file.context();
        let map = TraceMap::new().child(
            "lib",
            TraceMap::new()
                .child("run", TraceMap::new().call("run"))
                .child("named", TraceMap::new().call("named")),
        );

        let refs = summary(&ctx, tracker(&ctx).iterate_esm_references(&map));
        assert_eq!(
            refs,
            vec![
                ("lib.run()".to_string(), "lib.run".to_string(), ReferenceKind::Call, "run"),
                ("ns.default.run()".to_string(), "lib.run".to_string(), ReferenceKind::Call, "run"),
            ]
        );

        let legacy = ReferenceTrackerOptions {
            mode: TrackerMode::Legacy,
            ..Default::default()
        };
        let refs: Vec<_> = ReferenceTracker::new(&ctx, ctx.global_scope(), legacy)
            .iterate_esm_references(&map)
            .map(|r| ctx.node_text(r.node).to_string())
            .collect();
        assert_eq!(refs, vec!["lib.run()", "named()", "ns.default.run()"]);
    }

    #[test]
    fn esm_modules_use_their_own_members() {
        let code =
            "import def, { a } from 'm'; export { b } from 'm'; export * from 'm'; def(); a();";
        let file = parse(code);
        let ctx = file.context();
        let map = TraceMap::new().child(
            "m",
            TraceMap::new()
                .esm()
                .child("default", TraceMap::new().call("default"))
                .child("a", TraceMap::new().call("a"))
                .child("b", TraceMap::new().read("b")),
        );

        let refs: Vec<_> = tracker(&ctx)
            .iterate_esm_references(&map)
            .map(|r| (ctx.ast.get(r.node).type_name(), r.path.join("."), r.kind, *r.info))
            .collect();
        assert_eq!(
            refs,
            vec![
                ("CallExpression", "m.default".to_string(), ReferenceKind::Call, "default"),
                ("CallExpression", "m.a".to_string(), ReferenceKind::Call, "a"),
                ("ExportSpecifier", "m.b".to_string(), ReferenceKind::Read, "b"),
                ("ExportAllDeclaration", "m.b".to_string(), ReferenceKind::Read, "b"),
            ]
        );
    }

    #[test]
    fn cyclic_aliases_terminate() {
        let code = "var a = lib; var b = a; a = b; b.x();";
        let file = parse(code);
        let ctx = file.context();
        let map =
            TraceMap::new().child("lib", TraceMap::new().child("x", TraceMap::new().call(())));

        assert_eq!(tracker(&ctx).iterate_global_references(&map).count(), 1);
    }

    #[test]
    fn dropping_an_iterator_early_is_clean() {
        let file = parse("Foo(); Foo(); Foo();");
        let ctx = file.context();
        let map = TraceMap::new().child("Foo", TraceMap::new().call(()));
        let tracker = tracker(&ctx);

        let mut first = tracker.iterate_global_references(&map);
        assert!(first.next().is_some());
        drop(first);

        assert_eq!(tracker.iterate_global_references(&map).count(), 3);
    }
}
