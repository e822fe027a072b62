//! Execution of parsed patterns through the `regex` crate.
//!
//! Only patterns whose `regex` semantics coincide with ECMAScript
//! semantics are translated. A translated pattern may still refuse a
//! haystack, see [`CompiledRegex::accepts`].

use std::fmt::Write;

use regex::Regex;
use tracing::trace;

use super::ast::*;

/// ECMAScript `\s`.
const SPACE_CLASS: &str = concat!(
    r"\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}",
    r"\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}",
);

#[derive(Debug, Clone)]
pub struct RegexMatch {
    /// Byte offsets into the haystack.
    pub start: usize,
    pub end: usize,
    pub groups: Vec<Option<(usize, usize)>>,
}

#[derive(Debug, Clone)]
pub struct CompiledRegex {
    regex: Regex,
    flags: Flags,
    needs_ascii: bool,
    group_names: Vec<Option<String>>,
}

impl CompiledRegex {
    /// `None` when the pattern has no faithful translation.
    pub fn new(literal: &RegExpLiteral) -> Option<Self> {
        let flags = literal.flags;
        if flags.sticky || flags.has_indices || literal.pattern.has_repeated_captures() {
            return None;
        }

        let mut translator = Translator {
            flags,
            needs_ascii: flags.ignore_case,
            out: String::new(),
        };
        if flags.ignore_case {
            translator.out.push_str("(?i)");
        }
        if flags.multiline {
            translator.out.push_str("(?m)");
        }
        translator.alternatives(&literal.pattern.alternatives)?;

        let regex = match Regex::new(&translator.out) {
            Ok(regex) => regex,
            Err(err) => {
                trace!(pattern = %translator.out, error = %err, "translated pattern rejected");
                return None;
            }
        };
        Some(Self {
            regex,
            flags,
            needs_ascii: translator.needs_ascii,
            group_names: literal.pattern.group_names(),
        })
    }

    pub fn into_regex(self) -> Regex {
        self.regex
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn group_names(&self) -> &[Option<String>] {
        &self.group_names
    }

    /// Whether matching `haystack` behaves exactly as in ECMAScript.
    pub fn accepts(&self, haystack: &str) -> bool {
        if self.needs_ascii && !haystack.is_ascii() {
            return false;
        }
        if !self.flags.unicode_mode() && haystack.chars().any(|c| c as u32 > 0xFFFF) {
            return false;
        }
        if self.flags.multiline && haystack.contains(['\r', '\u{2028}', '\u{2029}']) {
            return false;
        }
        true
    }

    /// First match starting at or after byte offset `start`.
    pub fn exec_at(&self, haystack: &str, start: usize) -> Option<RegexMatch> {
        let captures = self.regex.captures_at(haystack, start)?;
        let whole = captures.get(0)?;
        let groups = (1..captures.len())
            .map(|i| captures.get(i).map(|m| (m.start(), m.end())))
            .collect();
        Some(RegexMatch {
            start: whole.start(),
            end: whole.end(),
            groups,
        })
    }
}

struct Translator {
    flags: Flags,
    needs_ascii: bool,
    out: String,
}

impl Translator {
    fn alternatives(&mut self, alternatives: &[Alternative]) -> Option<()> {
        for (i, alternative) in alternatives.iter().enumerate() {
            if i > 0 {
                self.out.push('|');
            }
            for element in &alternative.elements {
                self.element(element)?;
            }
        }
        Some(())
    }

    fn element(&mut self, element: &Element) -> Option<()> {
        match element {
            Element::Assertion(assertion) => match assertion {
                Assertion::Start => self.out.push('^'),
                Assertion::End => self.out.push('$'),
                Assertion::WordBoundary { negate } => {
                    self.needs_ascii = true;
                    self.out.push_str(if *negate { r"\B" } else { r"\b" });
                }
                Assertion::Lookahead { .. } | Assertion::Lookbehind { .. } => return None,
            },
            Element::Quantifier(quantifier) => {
                self.out.push_str("(?:");
                self.element(&quantifier.element)?;
                self.out.push(')');
                match quantifier.max {
                    Some(max) => write!(self.out, "{{{},{}}}", quantifier.min, max).ok()?,
                    None => write!(self.out, "{{{},}}", quantifier.min).ok()?,
                }
                if !quantifier.greedy {
                    self.out.push('?');
                }
            }
            Element::CapturingGroup(group) => {
                self.out.push('(');
                self.alternatives(&group.alternatives)?;
                self.out.push(')');
            }
            Element::Group(group) => {
                self.out.push_str("(?:");
                self.alternatives(&group.alternatives)?;
                self.out.push(')');
            }
            Element::Character(c) => self.character(*c)?,
            Element::CharacterSet(set) => self.set(set)?,
            Element::CharacterClass(class) => self.class(class)?,
            Element::ExpressionCharacterClass(_) | Element::Backreference(_) => return None,
        }
        Some(())
    }

    fn character(&mut self, c: Character) -> Option<()> {
        let ch = char::from_u32(c.value)?;
        if self.flags.ignore_case && !ch.is_ascii() {
            return None;
        }
        if ch.is_ascii_alphanumeric() {
            self.out.push(ch);
        } else {
            write!(self.out, r"\x{{{:X}}}", c.value).ok()?;
        }
        Some(())
    }

    fn set(&mut self, set: &CharacterSet) -> Option<()> {
        match set {
            CharacterSet::Any => {
                if self.flags.dot_all {
                    self.out.push_str("(?s:.)");
                } else {
                    self.out.push_str(r"[^\n\r\x{2028}\x{2029}]");
                }
            }
            CharacterSet::Digit { negate } => self.bracket(*negate, "0-9"),
            CharacterSet::Word { negate } => self.bracket(*negate, "0-9A-Za-z_"),
            CharacterSet::Space { negate } => self.bracket(*negate, SPACE_CLASS),
            CharacterSet::Property {
                key,
                value,
                negate,
                strings,
            } => {
                if *strings || self.flags.ignore_case {
                    return None;
                }
                let escape = if *negate { 'P' } else { 'p' };
                match value {
                    Some(value) => write!(self.out, r"\{escape}{{{key}={value}}}").ok()?,
                    None => write!(self.out, r"\{escape}{{{key}}}").ok()?,
                }
            }
        }
        Some(())
    }

    fn bracket(&mut self, negate: bool, body: &str) {
        self.out.push('[');
        if negate {
            self.out.push('^');
        }
        self.out.push_str(body);
        self.out.push(']');
    }

    fn class(&mut self, class: &CharacterClass) -> Option<()> {
        if class.elements.is_empty() {
            if class.negate {
                self.out.push_str("(?s:.)");
                return Some(());
            }
            return None;
        }
        self.out.push('[');
        if class.negate {
            self.out.push('^');
        }
        for element in &class.elements {
            match element {
                ClassElement::Character(c) => self.class_character(*c)?,
                ClassElement::Range(range) => {
                    self.class_character(range.min)?;
                    self.out.push('-');
                    self.class_character(range.max)?;
                }
                ClassElement::Set(set) => self.set(set)?,
                ClassElement::Class(nested) => {
                    if nested.elements.is_empty() {
                        return None;
                    }
                    self.class(nested)?;
                }
                ClassElement::Expression(_) | ClassElement::StringDisjunction(_) => return None,
            }
        }
        self.out.push(']');
        Some(())
    }

    fn class_character(&mut self, c: Character) -> Option<()> {
        if char::from_u32(c.value).is_none() || (self.flags.ignore_case && c.value > 0x7F) {
            return None;
        }
        write!(self.out, r"\x{{{:X}}}", c.value).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regexp::parse_literal;

    fn compile(literal: &str) -> Option<CompiledRegex> {
        CompiledRegex::new(&parse_literal(literal).expect("valid regex"))
    }

    #[test]
    fn executes_translated_patterns() {
        let re = compile("/b(c+)/").unwrap();
        let m = re.exec_at("abccd", 0).unwrap();
        assert_eq!((m.start, m.end), (1, 4));
        assert_eq!(m.groups, vec![Some((2, 4))]);
    }

    #[test]
    fn dot_excludes_line_terminators() {
        let re = compile("/a.b/").unwrap();
        assert!(re.exec_at("a\rb", 0).is_none());
        let re = compile("/a.b/s").unwrap();
        assert!(re.exec_at("a\rb", 0).is_some());
    }

    #[test]
    fn refuses_untranslatable_constructs() {
        assert!(compile("/(a)\\1/").is_none());
        assert!(compile("/a(?=b)/").is_none());
        assert!(compile("/a/y").is_none());
        assert!(compile("/[]/").is_none());
        assert!(compile("/(?:(a)|b)+/").is_none());
    }

    #[test]
    fn refuses_haystacks_with_diverging_semantics() {
        let re = compile("/a/i").unwrap();
        assert!(re.accepts("ABC"));
        assert!(!re.accepts("\u{17f}"));
        let re = compile("/./").unwrap();
        assert!(!re.accepts("\u{1F600}"));
        assert!(compile("/./u").unwrap().accepts("\u{1F600}"));
    }
}
