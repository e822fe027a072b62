//! Lexical scope analysis for variable bindings and references
//!
//! The model follows eslint-scope: a tree of [`Scope`]s, each holding the
//! [`Variable`]s it declares in `set`, the [`Reference`]s created inside it,
//! and the references it could not resolve (`through`).

mod builder;
pub mod globals;

use std::collections::HashMap;

use id_arena::{Arena, Id};
use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{Ast, NodeId, VariableKind};

pub use builder::ScopeBuilder;
pub use globals::Environment;

pub type ScopeId = Id<Scope>;
pub type VariableId = Id<Variable>;
pub type ReferenceId = Id<Reference>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    FunctionExpressionName,
    Block,
    For,
    Switch,
    Catch,
    Class,
    ClassFieldInitializer,
    ClassStaticBlock,
    With,
}

impl ScopeKind {
    /// Scopes that receive `var` declarations.
    pub fn is_variable_scope(self) -> bool {
        matches!(
            self,
            ScopeKind::Global
                | ScopeKind::Module
                | ScopeKind::Function
                | ScopeKind::ClassFieldInitializer
                | ScopeKind::ClassStaticBlock
        )
    }
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// Node that opens this scope.
    pub block: NodeId,
    pub upper: Option<ScopeId>,
    pub child_scopes: Vec<ScopeId>,
    pub set: IndexMap<String, VariableId>,
    pub variables: Vec<VariableId>,
    pub references: Vec<ReferenceId>,
    /// References left unresolved after closing this scope.
    pub through: Vec<ReferenceId>,
    pub variable_scope: ScopeId,
    pub strict: bool,
}

impl Scope {
    pub fn is_strict(&self) -> bool {
        self.strict
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DefinitionKind {
    Variable,
    Parameter,
    FunctionName,
    ClassName,
    CatchClause,
    ImportBinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    pub kind: DefinitionKind,
    /// The binding identifier.
    pub name: NodeId,
    /// Declarator, function, class, catch clause or import specifier.
    pub node: NodeId,
    /// Enclosing declaration, when there is one.
    pub parent: Option<NodeId>,
    pub declaration_kind: Option<VariableKind>,
}

#[derive(Debug)]
pub struct Variable {
    pub id: VariableId,
    pub name: String,
    pub scope: ScopeId,
    pub identifiers: Vec<NodeId>,
    pub defs: Vec<Definition>,
    pub references: Vec<ReferenceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReferenceFlags {
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug)]
pub struct Reference {
    pub id: ReferenceId,
    pub identifier: NodeId,
    pub from: ScopeId,
    pub resolved: Option<VariableId>,
    pub flags: ReferenceFlags,
    /// Write performed by a declaration initializer or default value.
    pub init: bool,
    pub write_expr: Option<NodeId>,
}

impl Reference {
    pub fn is_read(&self) -> bool {
        matches!(self.flags, ReferenceFlags::Read | ReferenceFlags::ReadWrite)
    }

    pub fn is_write(&self) -> bool {
        matches!(self.flags, ReferenceFlags::Write | ReferenceFlags::ReadWrite)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags == ReferenceFlags::Read
    }

    pub fn is_write_only(&self) -> bool {
        self.flags == ReferenceFlags::Write
    }

    pub fn is_read_write(&self) -> bool {
        self.flags == ReferenceFlags::ReadWrite
    }
}

/// Globals declared up front in the global scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOptions {
    pub globals: Vec<String>,
}

impl ScopeOptions {
    /// No predeclared globals.
    pub fn empty() -> Self {
        Self {
            globals: Vec::new(),
        }
    }

    pub fn from_environments(builtin: bool, environments: &[Environment]) -> Self {
        let mut globals: Vec<String> = Vec::new();
        if builtin {
            globals.extend(globals::BUILTIN.iter().map(|name| name.to_string()));
        }
        for env in environments {
            globals.extend(env.globals().iter().map(|name| name.to_string()));
        }
        let mut options = Self { globals };
        options.dedup();
        options
    }

    pub fn with_globals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.globals.extend(names.into_iter().map(Into::into));
        self.dedup();
        self
    }

    fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.globals.retain(|name| seen.insert(name.clone()));
    }
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self::from_environments(
            true,
            &[Environment::Browser, Environment::Node, Environment::CommonJs],
        )
    }
}

pub struct ScopeManager {
    scopes: Arena<Scope>,
    variables: Arena<Variable>,
    references: Arena<Reference>,
    global: ScopeId,
    node_scopes: HashMap<NodeId, Vec<ScopeId>>,
}

impl std::fmt::Debug for ScopeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeManager")
            .field("scopes", &self.scopes.len())
            .field("variables", &self.variables.len())
            .field("references", &self.references.len())
            .finish()
    }
}

impl ScopeManager {
    pub fn analyze(ast: &Ast, options: &ScopeOptions) -> Self {
        let manager = ScopeBuilder::new(ast, options).build();
        tracing::debug!(
            scopes = manager.scopes.len(),
            variables = manager.variables.len(),
            references = manager.references.len(),
            "scope analysis complete"
        );
        manager
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id]
    }

    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id]
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter().map(|(_, scope)| scope)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter().map(|(_, variable)| variable)
    }

    pub fn references_of(&self, variable: VariableId) -> impl Iterator<Item = &Reference> {
        self.variables[variable]
            .references
            .iter()
            .map(|&id| &self.references[id])
    }

    /// Reference created for `identifier`, if it is a reference at all.
    pub fn reference_for(&self, identifier: NodeId) -> Option<&Reference> {
        self.references
            .iter()
            .map(|(_, reference)| reference)
            .find(|reference| reference.identifier == identifier)
    }

    /// Outermost scope opened by `node`.
    pub fn acquire(&self, node: NodeId) -> Option<ScopeId> {
        self.node_scopes.get(&node)?.first().copied()
    }

    /// Every scope opened by `node`, outermost first.
    pub fn acquire_all(&self, node: NodeId) -> &[ScopeId] {
        self.node_scopes
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn ancestors(&self, id: ScopeId) -> AncestorIter<'_> {
        AncestorIter {
            manager: self,
            current: Some(id),
        }
    }

    pub fn is_descendant_of(&self, scope: ScopeId, ancestor: ScopeId) -> bool {
        self.ancestors(scope).any(|s| s.id == ancestor)
    }
}

pub struct AncestorIter<'a> {
    manager: &'a ScopeManager,
    current: Option<ScopeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.current?;
        let scope = &self.manager.scopes[current_id];
        self.current = scope.upper;
        Some(scope)
    }
}
