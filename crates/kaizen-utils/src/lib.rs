//! AST analysis primitives for JavaScript and TypeScript lint rules.
//!
//! Parse a file with [`ParsedFile::from_source`], then hand its
//! [`Context`] to the analyses: variable lookup, static evaluation,
//! property names, side-effect detection, API reference tracking and regex
//! backtracking checks.

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod find_variable;
pub mod function_name;
pub mod parenthesized;
pub mod parser;
pub mod pattern_matcher;
pub mod property_name;
pub mod reference_tracker;
pub mod regexp;
pub mod scope;
pub mod side_effect;
pub mod static_value;

pub use ast::{Ast, NodeId, NodeKind};
pub use config::{AnalysisConfig, ConfigError, load_config};
pub use context::{Context, Location};
pub use error::MisuseError;
pub use find_variable::{VariableQuery, find_variable, get_innermost_scope};
pub use function_name::{get_function_head_location, get_function_name_with_kind};
pub use parenthesized::{is_parenthesized, is_parenthesized_times};
pub use parser::ParsedFile;
pub use pattern_matcher::{PatternMatch, PatternMatcher, PatternMatcherOptions};
pub use property_name::get_property_name;
pub use reference_tracker::{
    ReferenceKind, ReferenceTracker, ReferenceTrackerOptions, TraceMap, TrackedReference,
    TrackerMode,
};
pub use regexp::is_safe_regex;
pub use scope::{ScopeId, ScopeManager, ScopeOptions, VariableId};
pub use side_effect::{SideEffectOptions, VisitorKeys, has_side_effect};
pub use static_value::{StaticValue, Value, get_static_value, get_string_if_constant};
