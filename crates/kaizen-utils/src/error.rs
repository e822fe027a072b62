//! Errors for calls the API cannot give a meaningful answer to.

use crate::regexp::RegexSyntaxError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MisuseError {
    #[error("'times' should be a positive integer")]
    NonPositiveParenCount,
    #[error("Expected a function node, found {0}")]
    NotAFunction(&'static str),
    #[error("Pattern should contain the 'g' flag")]
    MissingGlobalFlag,
    #[error(transparent)]
    InvalidPattern(#[from] RegexSyntaxError),
    #[error("Pattern '{0}' cannot be executed by the regex engine")]
    UnsupportedPattern(String),
}
