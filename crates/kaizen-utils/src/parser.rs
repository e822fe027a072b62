//! SWC front end: parses a file, lowers the result into the crate's own
//! [`Ast`] and runs scope analysis over it.

use std::ops::Range;
use std::sync::OnceLock;

use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceFile, SourceMap, Span, Spanned};
use swc_ecma_parser::{
    EsSyntax, Parser as SwcParser, StringInput, Syntax, TsSyntax, lexer::Lexer,
    parse_file_as_module, parse_file_as_script,
};

use crate::ast::{Ast, SourceType, lower};
use crate::config::AnalysisConfig;
use crate::context::{Context, Location};
use crate::scope::{ScopeManager, ScopeOptions};

pub use swc_ecma_ast::{EsVersion, Module, Program, Script};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
}

pub fn detect_language(filename: &str) -> Language {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    match ext.as_str() {
        "ts" | "mts" | "cts" => Language::TypeScript,
        "tsx" => Language::Tsx,
        "jsx" => Language::Jsx,
        _ => Language::JavaScript,
    }
}

/// A syntax error reported by SWC. Offsets are 0-based byte positions into
/// the parsed source.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {line}:{column}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub span_lo: u32,
    pub span_hi: u32,
    pub message: String,
}

impl ParseError {
    fn from_swc(
        error: &swc_ecma_parser::error::Error,
        source_map: &SourceMap,
        fm: &SourceFile,
    ) -> Self {
        let span = error.span();
        let loc = source_map.lookup_char_pos(span.lo);
        Self {
            line: loc.line,
            column: loc.col_display,
            span_lo: span.lo.0.saturating_sub(fm.start_pos.0),
            span_hi: span.hi.0.saturating_sub(fm.start_pos.0),
            message: error.kind().msg().to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<ParseError>,
    /// Position of the first byte of the source inside the SWC source map.
    pub base: BytePos,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.program.is_some()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub filename: String,
    pub language: Language,
    pub source_type: SourceType,
    pub line_count: usize,
    pub has_errors: bool,
}

/// A source file together with its lowered tree and scope analysis.
pub struct ParsedFile {
    metadata: FileMetadata,
    ast: Ast,
    scopes: ScopeManager,
    errors: Vec<ParseError>,
    line_ranges: OnceLock<Vec<Range<usize>>>,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("metadata", &self.metadata)
            .field("node_count", &self.ast.len())
            .field("error_count", &self.errors.len())
            .finish()
    }
}

impl ParsedFile {
    pub fn from_source(filename: &str, source: &str) -> Self {
        Self::with_scope_options(filename, source, &ScopeOptions::default())
    }

    pub fn with_config(filename: &str, source: &str, config: &AnalysisConfig) -> Self {
        Self::with_scope_options(filename, source, &config.scope_options())
    }

    /// Parses as a module first and falls back to the script goal when the
    /// module parse fails or only the script parse is clean.
    pub fn with_scope_options(filename: &str, source: &str, options: &ScopeOptions) -> Self {
        let language = detect_language(filename);
        let parser = Parser::for_file(filename);

        let mut source_type = SourceType::Module;
        let mut result = parser.parse_recovering(source, SourceType::Module);
        if result.has_errors() {
            let script = parser.parse_recovering(source, SourceType::Script);
            if script.is_ok() && (!script.has_errors() || !result.is_ok()) {
                tracing::debug!(filename, "falling back to script goal");
                source_type = SourceType::Script;
                result = script;
            }
        }

        let ast = match &result.program {
            Some(program) => lower::lower_program(program, source, result.base),
            None => Ast::empty(source, source_type),
        };
        let scopes = ScopeManager::analyze(&ast, options);

        let line_count = if source.is_empty() {
            0
        } else {
            source.lines().count()
        };

        let metadata = FileMetadata {
            filename: filename.to_string(),
            language,
            source_type: ast.source_type(),
            line_count,
            has_errors: result.has_errors(),
        };

        Self {
            metadata,
            ast,
            scopes,
            errors: result.errors,
            line_ranges: OnceLock::new(),
        }
    }

    pub fn metadata(&self) -> &FileMetadata {
        &self.metadata
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn scopes(&self) -> &ScopeManager {
        &self.scopes
    }

    pub fn context(&self) -> Context<'_> {
        Context::new(&self.ast, &self.scopes)
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn source(&self) -> &str {
        self.ast.source()
    }

    pub fn get_line(&self, line_number: usize) -> Option<&str> {
        if line_number == 0 {
            return None;
        }

        let ranges = self.line_ranges.get_or_init(|| self.build_line_ranges());
        let index = line_number - 1;

        ranges.get(index).map(|range| &self.source()[range.clone()])
    }

    pub fn get_source_text(&self, span: Span) -> Option<&str> {
        self.context().get_source_text(span)
    }

    pub fn span_to_location(&self, span: Span) -> Location {
        self.context().span_to_location(span)
    }

    fn build_line_ranges(&self) -> Vec<Range<usize>> {
        let source = self.source();
        let mut ranges = Vec::new();
        let mut start = 0;

        for (i, c) in source.char_indices() {
            if c == '\n' {
                ranges.push(start..i);
                start = i + 1;
            }
        }

        if start < source.len() || (start == 0 && !source.is_empty()) {
            ranges.push(start..source.len());
        }

        ranges
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserBuilder {
    jsx: bool,
    typescript: bool,
    decorators: bool,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jsx(mut self, enabled: bool) -> Self {
        self.jsx = enabled;
        self
    }

    pub fn typescript(mut self, enabled: bool) -> Self {
        self.typescript = enabled;
        self
    }

    pub fn decorators(mut self, enabled: bool) -> Self {
        self.decorators = enabled;
        self
    }

    pub fn build(self) -> Parser {
        let syntax = if self.typescript {
            Syntax::Typescript(TsSyntax {
                tsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.jsx,
                decorators: self.decorators,
                ..Default::default()
            })
        };

        Parser { syntax }
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    syntax: Syntax,
}

impl Parser {
    pub fn new() -> Self {
        Self {
            syntax: Syntax::Es(Default::default()),
        }
    }

    pub fn for_file(filename: &str) -> Self {
        let language = detect_language(filename);
        match language {
            Language::JavaScript => Self::new(),
            Language::TypeScript => Self::builder().typescript(true).build(),
            Language::Jsx => Self::builder().jsx(true).build(),
            Language::Tsx => Self::builder().typescript(true).jsx(true).build(),
        }
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn parse_script(&self, code: &str) -> Result<Script, ParseError> {
        self.parse_strict(code, |parser| parser.parse_script())
    }

    pub fn parse_module(&self, code: &str) -> Result<Module, ParseError> {
        self.parse_strict(code, |parser| parser.parse_module())
    }

    /// Stops at the first syntax error.
    fn parse_strict<T>(
        &self,
        code: &str,
        goal: impl FnOnce(&mut SwcParser<Lexer<'_>>) -> Result<T, swc_ecma_parser::error::Error>,
    ) -> Result<T, ParseError> {
        let (source_map, fm) = source_file(code);
        let lexer = Lexer::new(self.syntax, EsVersion::latest(), StringInput::from(&*fm), None);
        goal(&mut SwcParser::new_from(lexer))
            .map_err(|e| ParseError::from_swc(&e, &source_map, &fm))
    }

    /// Collects recoverable errors and keeps the program whenever SWC
    /// produced one.
    pub fn parse_recovering(&self, code: &str, source_type: SourceType) -> ParseResult {
        let (source_map, fm) = source_file(code);
        let mut recovered = Vec::new();

        let result = match source_type {
            SourceType::Module => {
                parse_file_as_module(&fm, self.syntax, EsVersion::latest(), None, &mut recovered)
                    .map(Program::Module)
            }
            SourceType::Script => {
                parse_file_as_script(&fm, self.syntax, EsVersion::latest(), None, &mut recovered)
                    .map(Program::Script)
            }
        };

        let mut errors: Vec<ParseError> = recovered
            .iter()
            .map(|e| ParseError::from_swc(e, &source_map, &fm))
            .collect();
        let program = match result {
            Ok(program) => Some(program),
            Err(fatal) => {
                errors.push(ParseError::from_swc(&fatal, &source_map, &fm));
                None
            }
        };

        ParseResult {
            program,
            errors,
            base: fm.start_pos,
        }
    }
}

fn source_file(code: &str) -> (Lrc<SourceMap>, Lrc<SourceFile>) {
    let source_map: Lrc<SourceMap> = Default::default();
    let fm = source_map.new_source_file(FileName::Anon.into(), code.to_string());
    (source_map, fm)
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    #[test]
    fn parse_invalid_syntax_returns_error() {
        let parser = Parser::new();
        let code = "const = ;";

        let result = parser.parse_script(code);

        assert!(result.is_err());
        let error = result.unwrap_err();
        assert_eq!(error.line, 1);
        assert!(!error.message.is_empty());
    }

    #[test]
    fn script_goal_rejects_imports() {
        let parser = Parser::new();

        assert!(parser.parse_module("import x from 'y';").is_ok());
        assert!(parser.parse_script("import x from 'y';").is_err());
    }

    #[test]
    fn typescript_files_lower_type_wrappers() {
        let parsed = ParsedFile::from_source("test.ts", "let x = y as number;");

        assert!(!parsed.metadata().has_errors);
        assert_eq!(parsed.metadata().language, Language::TypeScript);
        assert!(
            parsed
                .ast()
                .iter()
                .any(|node| node.type_name() == "TSAsExpression")
        );
    }

    #[test]
    fn tsx_files_accept_jsx() {
        let parsed = ParsedFile::from_source("component.tsx", "const App = () => <div />;");

        assert!(!parsed.metadata().has_errors);
        assert!(parsed.ast().iter().any(|node| node.type_name() == "JSXElement"));
    }

    #[test]
    fn detect_language_from_extension() {
        assert_eq!(detect_language("file.js"), Language::JavaScript);
        assert_eq!(detect_language("file.mjs"), Language::JavaScript);
        assert_eq!(detect_language("file.cjs"), Language::JavaScript);
        assert_eq!(detect_language("file.jsx"), Language::Jsx);
        assert_eq!(detect_language("file.ts"), Language::TypeScript);
        assert_eq!(detect_language("file.mts"), Language::TypeScript);
        assert_eq!(detect_language("file.tsx"), Language::Tsx);
        assert_eq!(detect_language("unknown"), Language::JavaScript);
    }

    #[test]
    fn parse_recovering_valid_code_has_no_errors() {
        let parser = Parser::new();
        let code = "const x = 1;\nfunction add(a, b) { return a + b; }\n";

        let result = parser.parse_recovering(code, SourceType::Module);

        assert!(result.is_ok());
        assert!(!result.has_errors());
    }

    #[test]
    fn parse_incomplete_code() {
        let parser = Parser::new();
        let result = parser.parse_recovering("const x =", SourceType::Module);

        assert!(result.has_errors());
    }

    #[test]
    fn error_offsets_are_relative_to_source() {
        let parser = Parser::new();
        let result = parser.parse_recovering("const = ;", SourceType::Module);

        let error = &result.errors[0];
        assert_eq!(error.line, 1);
        assert!(error.span_lo <= 9);
        assert!(error.span_hi >= error.span_lo);
    }

    #[test]
    fn parsed_file_prefers_module_goal() {
        let parsed = ParsedFile::from_source("test.js", "import x from 'y'; x;");

        assert_eq!(parsed.metadata().source_type, SourceType::Module);
        assert!(!parsed.metadata().has_errors);
    }

    #[test]
    fn parsed_file_falls_back_to_script_goal() {
        let parsed = ParsedFile::from_source("test.js", "with (obj) { foo; }");

        assert_eq!(parsed.metadata().source_type, SourceType::Script);
        let program = parsed.ast().root();
        let NodeKind::Program { body, .. } = parsed.ast().kind(program) else {
            panic!("expected program");
        };
        assert!(matches!(
            parsed.ast().kind(body[0]),
            NodeKind::WithStatement { .. }
        ));
    }

    #[test]
    fn parsed_file_spans_start_at_zero() {
        let parsed = ParsedFile::from_source("test.js", "foo;");
        let program = parsed.ast().root();
        let NodeKind::Program { body, .. } = parsed.ast().kind(program) else {
            panic!("expected program");
        };

        assert_eq!(parsed.ast().get(body[0]).span.lo.0, 0);
        assert_eq!(parsed.ast().source_text(body[0]), "foo;");
    }

    #[test]
    fn parsed_file_metadata_returns_line_count() {
        let parsed = ParsedFile::from_source("test.js", "const x = 1;\nconst y = 2;\nconst z = 3;");

        assert_eq!(parsed.metadata().line_count, 3);
        assert_eq!(parsed.get_line(2), Some("const y = 2;"));
        assert_eq!(parsed.get_line(0), None);
        assert_eq!(parsed.get_line(4), None);
    }

    #[test]
    fn parsed_file_reports_fatal_errors() {
        let parsed = ParsedFile::from_source("test.js", "const = ;");

        assert!(parsed.metadata().has_errors);
        assert!(!parsed.errors().is_empty());
    }

    #[test]
    fn parsed_file_line_count_empty_source() {
        let parsed = ParsedFile::from_source("test.js", "");

        assert_eq!(parsed.metadata().line_count, 0);
    }
}
