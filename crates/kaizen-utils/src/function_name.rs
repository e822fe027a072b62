//! Human-readable names and report locations for function nodes.

use swc_common::{BytePos, Span};

use crate::ast::{Ast, MethodKind, NodeId, NodeKind, PropertyKind};
use crate::context::Context;
use crate::error::MisuseError;
use crate::property_name::get_property_name;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Constructor,
    Getter,
    Setter,
    Method,
}

/// The object property, class method or class field a function is the
/// value of.
struct Member {
    owner: NodeId,
    key: NodeId,
    role: Role,
    /// `Some(is_static)` for class members.
    class: Option<bool>,
}

fn member_of(ast: &Ast, node: NodeId) -> Option<Member> {
    let owner = ast.parent(node)?;
    let member = match ast.kind(owner) {
        NodeKind::Property {
            key, value, kind, ..
        } if *value == node => Member {
            owner,
            key: *key,
            role: match kind {
                PropertyKind::Init => Role::Method,
                PropertyKind::Get => Role::Getter,
                PropertyKind::Set => Role::Setter,
            },
            class: None,
        },
        NodeKind::MethodDefinition {
            key,
            value,
            kind,
            is_static,
            ..
        } if *value == node => Member {
            owner,
            key: *key,
            role: match kind {
                MethodKind::Constructor => Role::Constructor,
                MethodKind::Get => Role::Getter,
                MethodKind::Set => Role::Setter,
                MethodKind::Method => Role::Method,
            },
            class: Some(*is_static),
        },
        NodeKind::PropertyDefinition {
            key,
            value: Some(value),
            is_static,
            ..
        } if *value == node => Member {
            owner,
            key: *key,
            role: Role::Method,
            class: Some(*is_static),
        },
        _ => return None,
    };
    Some(member)
}

/// Describes a function the way lint messages name it, e.g.
/// `static private async generator method #run` or `arrow function 'cb'`.
pub fn get_function_name_with_kind(ctx: &Context<'_>, node: NodeId) -> Result<String, MisuseError> {
    let ast = ctx.ast;
    let kind = ast.kind(node);
    let function = kind
        .as_function()
        .ok_or(MisuseError::NotAFunction(kind.type_name()))?;
    let member = member_of(ast, node);
    let private_key = member.as_ref().and_then(|m| match ast.kind(m.key) {
        NodeKind::PrivateIdentifier { name } => Some(name.as_str()),
        _ => None,
    });
    let mut tokens: Vec<String> = Vec::new();

    if let Some(Member {
        class: Some(is_static),
        ..
    }) = member
    {
        if is_static {
            tokens.push("static".into());
        }
        if private_key.is_some() {
            tokens.push("private".into());
        }
    }
    if function.is_async {
        tokens.push("async".into());
    }
    if function.is_generator {
        tokens.push("generator".into());
    }

    match &member {
        Some(member) => tokens.push(
            match member.role {
                Role::Constructor => return Ok("constructor".into()),
                Role::Getter => "getter",
                Role::Setter => "setter",
                Role::Method => "method",
            }
            .into(),
        ),
        None => {
            if matches!(kind, NodeKind::ArrowFunctionExpression(_)) {
                tokens.push("arrow".into());
            }
            tokens.push("function".into());
        }
    }

    let parent = ast.parent(node);
    if let Some(member) = &member {
        if let Some(name) = private_key {
            tokens.push(format!("#{name}"));
        } else {
            match get_property_name(ctx, member.owner, None).filter(|name| !name.is_empty()) {
                Some(name) => tokens.push(format!("'{name}'")),
                None => {
                    let key_text = ast.source_text(member.key);
                    if !key_text.contains('\n') {
                        tokens.push(format!("[{key_text}]"));
                    }
                }
            }
        }
    } else if let Some(id) = function.id {
        tokens.push(format!("'{}'", ast.kind(id).identifier_name().unwrap_or_default()));
    } else if let Some(name) = parent.and_then(|parent| binding_name(ast, parent, node)) {
        tokens.push(format!("'{name}'"));
    }

    Ok(tokens.join(" "))
}

/// Name a function expression picks up from where it is stored.
fn binding_name<'a>(ast: &'a Ast, parent: NodeId, node: NodeId) -> Option<&'a str> {
    match ast.kind(parent) {
        NodeKind::VariableDeclarator { id, .. } => ast.kind(*id).identifier_name(),
        NodeKind::AssignmentExpression { left, .. } | NodeKind::AssignmentPattern { left, .. } => {
            ast.kind(*left).identifier_name()
        }
        NodeKind::ExportDefaultDeclaration { declaration } if *declaration == node => {
            Some("default")
        }
        _ => None,
    }
}

/// Span to report a function at: the `=>` of an arrow, or the text from the
/// start of the function (or of the property or method owning it) up to the
/// opening parenthesis of its parameters.
pub fn get_function_head_location(ast: &Ast, node: NodeId) -> Result<Span, MisuseError> {
    let kind = ast.kind(node);
    let function = kind
        .as_function()
        .ok_or(MisuseError::NotAFunction(kind.type_name()))?;
    let start = ast.get(node).start();

    if let NodeKind::ArrowFunctionExpression(_) = kind {
        let from = function.params.last().map_or(start, |&param| ast.get(param).end());
        let to = function.body.map_or(ast.get(node).end(), |body| ast.get(body).start());
        let arrow = last_arrow(ast.source(), from, to).unwrap_or(from);
        return Ok(span(arrow, arrow + 2));
    }

    let member = member_of(ast, node);
    let paren_search_from = match (&function.id, &member) {
        (Some(id), _) => ast.get(*id).end(),
        (None, Some(member)) if ast.get(member.key).end() > start => ast.get(member.key).end(),
        (None, _) => start,
    };
    let paren = code_bytes(ast.source(), paren_search_from, ast.get(node).end())
        .find(|&(_, byte)| byte == b'(')
        .map_or(paren_search_from, |(at, _)| at as u32);
    let head_start = match &member {
        Some(member) => ast.get(member.owner).start(),
        None => start,
    };
    Ok(span(head_start, paren))
}

fn span(lo: u32, hi: u32) -> Span {
    Span::new(BytePos(lo), BytePos(hi))
}

fn last_arrow(source: &str, from: u32, to: u32) -> Option<u32> {
    let mut previous = None;
    let mut found = None;
    for (at, byte) in code_bytes(source, from, to) {
        if byte == b'>' && previous == Some((at.wrapping_sub(1), b'=')) {
            found = Some(at as u32 - 1);
        }
        previous = Some((at, byte));
    }
    found
}

fn code_bytes(source: &str, from: u32, to: u32) -> CodeBytes<'_> {
    let end = (to as usize).min(source.len());
    CodeBytes {
        bytes: source.as_bytes(),
        pos: (from as usize).min(end),
        end,
    }
}

/// Bytes of `source` outside comments and string literals.
struct CodeBytes<'s> {
    bytes: &'s [u8],
    pos: usize,
    end: usize,
}

impl Iterator for CodeBytes<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = &self.bytes[..self.end];
        while self.pos < self.end {
            let at = self.pos;
            match (bytes[at], bytes.get(at + 1)) {
                (b'/', Some(b'/')) => {
                    self.pos = bytes[at..]
                        .iter()
                        .position(|&b| b == b'\n')
                        .map_or(self.end, |offset| at + offset);
                }
                (b'/', Some(b'*')) => {
                    self.pos = bytes[at + 2..]
                        .windows(2)
                        .position(|pair| pair == b"*/")
                        .map_or(self.end, |offset| at + 2 + offset + 2);
                }
                (quote @ (b'\'' | b'"' | b'`'), _) => {
                    let mut i = at + 1;
                    while i < self.end {
                        match bytes[i] {
                            b'\\' => i += 2,
                            b if b == quote => {
                                i += 1;
                                break;
                            }
                            _ => i += 1,
                        }
                    }
                    self.pos = i;
                }
                (byte, _) => {
                    self.pos = at + 1;
                    return Some((at, byte));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ParsedFile;

    fn functions(file: &ParsedFile) -> Vec<NodeId> {
        file.ast()
            .iter()
            .filter(|n| n.kind.is_function())
            .map(|n| n.id)
            .collect()
    }

    fn names(code: &str) -> Vec<String> {
        let file = ParsedFile::from_source("test.js", code);
        let ctx = file.context();
        functions(&file)
            .into_iter()
            .map(|f| get_function_name_with_kind(&ctx, f).unwrap())
            .collect()
    }

    fn heads(code: &str) -> Vec<String> {
        let file = ParsedFile::from_source("test.js", code);
        functions(&file)
            .into_iter()
            .map(|f| {
                let span = get_function_head_location(file.ast(), f).unwrap();
                code[span.lo.0 as usize..span.hi.0 as usize].to_string()
            })
            .collect()
    }

    #[test]
    fn plain_functions() {
        assert_eq!(names("function foo() {}"), ["function 'foo'"]);
        assert_eq!(names("async function* foo() {}"), ["async generator function 'foo'"]);
        assert_eq!(names("(function () {})"), ["function"]);
        assert_eq!(names("const foo = () => {}"), ["arrow function 'foo'"]);
        assert_eq!(names("foo = function () {}"), ["function 'foo'"]);
        assert_eq!(names("const bar = function foo() {}"), ["function 'foo'"]);
    }

    #[test]
    fn default_exports_and_defaults() {
        assert_eq!(names("export default function () {}"), ["function 'default'"]);
        assert_eq!(names("export default async () => {}"), ["async arrow function 'default'"]);
        assert_eq!(
            names("function f(cb = () => {}) {}"),
            ["arrow function 'cb'", "function 'f'"]
        );
    }

    #[test]
    fn object_members() {
        assert_eq!(
            names(concat!(
                "({ foo() {}, get bar() {}, set bar(v) {}, ",
                "baz: function () {}, async *gen() {} })"
            )),
            [
                "method 'foo'",
                "getter 'bar'",
                "setter 'bar'",
                "method 'baz'",
                "async generator method 'gen'",
            ]
        );
        assert_eq!(names("({ ['x']() {} })"), ["method 'x'"]);
        assert_eq!(names("({ [a + b]() {} })"), ["method [a + b]"]);
    }

    #[test]
    fn class_members() {
        let code = concat!(
            "class A { constructor() {} static async *#run() {} static get size() {} ",
            "handler = () => {} #init = function () {} }"
        );
        assert_eq!(
            names(code),
            [
                "constructor",
                "static private async generator method #run",
                "static getter 'size'",
                "method 'handler'",
                "private method #init",
            ]
        );
    }

    #[test]
    fn non_functions_are_rejected() {
        let file = ParsedFile::from_source("test.js", "a");
        let ctx = file.context();
        let identifier = file
            .ast()
            .iter()
            .find(|n| n.type_name() == "Identifier")
            .map(|n| n.id)
            .unwrap();

        assert_eq!(
            get_function_name_with_kind(&ctx, identifier),
            Err(MisuseError::NotAFunction("Identifier"))
        );
        assert_eq!(
            get_function_head_location(file.ast(), identifier),
            Err(MisuseError::NotAFunction("Identifier"))
        );
    }

    #[test]
    fn head_of_declarations_and_expressions() {
        assert_eq!(heads("function foo(a) {}"), ["function foo"]);
        assert_eq!(heads("(async function (a) {})"), ["async function "]);
        assert_eq!(heads("(function /* ( */ named(a) {})"), ["function /* ( */ named"]);
    }

    #[test]
    fn head_of_arrows_is_the_arrow() {
        assert_eq!(heads("const f = (a, b) => a"), ["=>"]);
        assert_eq!(heads("const f = async x => x"), ["=>"]);
        assert_eq!(heads("const f = ( /* => */ ) => 1"), ["=>"]);
        assert_eq!(heads("const f = (a = () => 1) => a"), ["=>", "=>"]);
    }

    #[test]
    fn arrow_head_skips_arrows_in_parameters() {
        let code = "const f = (a = () => 1) => a";
        let file = ParsedFile::from_source("test.js", code);
        let outer = functions(&file).pop().unwrap();
        let span = get_function_head_location(file.ast(), outer).unwrap();
        assert_eq!(span.lo.0 as usize, code.rfind("=>").unwrap());
    }

    #[test]
    fn head_of_members_starts_at_the_key() {
        assert_eq!(heads("({ foo(a) {} })"), ["foo"]);
        assert_eq!(heads("({ foo: function (a) {} })"), ["foo: function "]);
        assert_eq!(heads("({ [f(1)](a) {} })"), ["[f(1)]"]);
        assert_eq!(heads("class A { bar(a) {} }"), ["bar"]);
        assert_eq!(heads("class A { field = function () {} }"), ["field = function "]);
    }
}
