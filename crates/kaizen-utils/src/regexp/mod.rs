//! JavaScript regular expressions: parsing, backtracking-risk analysis and
//! sandboxed execution.

pub mod ast;
mod parser;
mod safety;
mod translate;

pub use ast::{Flags, Pattern, RegExpLiteral};
pub use parser::{RegexSyntaxError, parse_flags, parse_literal, parse_pattern};
pub use safety::{
    Direction, PathCount, RegexNode, SAFE_PATH_LIMIT, is_safe_regex, max_possible_paths,
};
pub use translate::{CompiledRegex, RegexMatch};
