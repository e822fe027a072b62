//! Recursive-descent parser for ECMAScript regular expressions, including
//! `v`-mode class set syntax and Annex B leniency outside unicode mode.

use thiserror::Error;

use super::ast::*;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid regular expression: {message} at offset {offset}")]
pub struct RegexSyntaxError {
    pub message: String,
    pub offset: usize,
}

type PResult<T> = Result<T, RegexSyntaxError>;

/// Parses a literal such as `/ab+c/gi`.
pub fn parse_literal(literal: &str) -> PResult<RegExpLiteral> {
    let chars: Vec<char> = literal.chars().collect();
    let error = |message: &str, offset: usize| RegexSyntaxError {
        message: message.to_string(),
        offset,
    };

    if chars.first() != Some(&'/') {
        return Err(error("Unexpected character", 0));
    }

    let mut i = 1;
    let mut in_class = false;
    let end = loop {
        match chars.get(i) {
            None | Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => {
                return Err(error("Unterminated regular expression", i));
            }
            Some('\\') => i += 2,
            Some('[') => {
                in_class = true;
                i += 1;
            }
            Some(']') => {
                in_class = false;
                i += 1;
            }
            Some('/') if !in_class => break i,
            Some(_) => i += 1,
        }
    };
    if end == 1 {
        return Err(error("Empty regular expression", 1));
    }

    let source: String = chars[1..end].iter().collect();
    let flags: String = chars[end + 1..].iter().collect();
    parse_pattern(&source, &flags)
}

/// Parses a pattern body together with its flags.
pub fn parse_pattern(source: &str, flags: &str) -> PResult<RegExpLiteral> {
    let flags = parse_flags(flags)?;
    let pattern = PatternParser::new(source, flags).parse()?;
    Ok(RegExpLiteral { pattern, flags })
}

pub fn parse_flags(text: &str) -> PResult<Flags> {
    let mut flags = Flags::default();
    for (offset, c) in text.chars().enumerate() {
        let slot = match c {
            'd' => &mut flags.has_indices,
            'g' => &mut flags.global,
            'i' => &mut flags.ignore_case,
            'm' => &mut flags.multiline,
            's' => &mut flags.dot_all,
            'u' => &mut flags.unicode,
            'v' => &mut flags.unicode_sets,
            'y' => &mut flags.sticky,
            _ => {
                return Err(RegexSyntaxError {
                    message: format!("Invalid flag '{c}'"),
                    offset,
                });
            }
        };
        if *slot {
            return Err(RegexSyntaxError {
                message: format!("Duplicated flag '{c}'"),
                offset,
            });
        }
        *slot = true;
    }
    if flags.unicode && flags.unicode_sets {
        return Err(RegexSyntaxError {
            message: "Regular expression may not use both 'u' and 'v' flags".to_string(),
            offset: 0,
        });
    }
    Ok(flags)
}

const SYNTAX_CHARACTERS: &str = "^$\\.*+?()[]{}|";
const CLASS_SET_RESERVED_DOUBLE: &str = "&!#$%*+,.:;<=>?@^`~";
const CLASS_SET_RESERVED_PUNCTUATORS: &str = "&-!#%,:;<=>@`~";
const CLASS_SET_SYNTAX: &str = "()[]{}/-\\|";

const STRING_PROPERTIES: &[&str] = &[
    "Basic_Emoji",
    "Emoji_Keycap_Sequence",
    "RGI_Emoji",
    "RGI_Emoji_Flag_Sequence",
    "RGI_Emoji_Modifier_Sequence",
    "RGI_Emoji_Tag_Sequence",
    "RGI_Emoji_ZWJ_Sequence",
];

const GENERAL_CATEGORY_VALUES: &[&str] = &[
    "C", "Other", "Cc", "Control", "cntrl", "Cf", "Format", "Cn", "Unassigned", "Co",
    "Private_Use", "Cs", "Surrogate", "L", "Letter", "LC", "Cased_Letter", "Ll",
    "Lowercase_Letter", "Lm", "Modifier_Letter", "Lo", "Other_Letter", "Lt",
    "Titlecase_Letter", "Lu", "Uppercase_Letter", "M", "Mark", "Combining_Mark", "Mc",
    "Spacing_Mark", "Me", "Enclosing_Mark", "Mn", "Nonspacing_Mark", "N", "Number", "Nd",
    "Decimal_Number", "digit", "Nl", "Letter_Number", "No", "Other_Number", "P",
    "Punctuation", "punct", "Pc", "Connector_Punctuation", "Pd", "Dash_Punctuation", "Pe",
    "Close_Punctuation", "Pf", "Final_Punctuation", "Pi", "Initial_Punctuation", "Po",
    "Other_Punctuation", "Ps", "Open_Punctuation", "S", "Symbol", "Sc", "Currency_Symbol",
    "Sk", "Modifier_Symbol", "Sm", "Math_Symbol", "So", "Other_Symbol", "Z", "Separator",
    "Zl", "Line_Separator", "Zp", "Paragraph_Separator", "Zs", "Space_Separator",
];

const BINARY_PROPERTIES: &[&str] = &[
    "ASCII", "ASCII_Hex_Digit", "AHex", "Alphabetic", "Alpha", "Any", "Assigned",
    "Bidi_Control", "Bidi_C", "Bidi_Mirrored", "Bidi_M", "Case_Ignorable", "CI", "Cased",
    "Changes_When_Casefolded", "CWCF", "Changes_When_Casemapped", "CWCM",
    "Changes_When_Lowercased", "CWL", "Changes_When_NFKC_Casefolded", "CWKCF",
    "Changes_When_Titlecased", "CWT", "Changes_When_Uppercased", "CWU", "Dash",
    "Default_Ignorable_Code_Point", "DI", "Deprecated", "Dep", "Diacritic", "Dia", "Emoji",
    "Emoji_Component", "EComp", "Emoji_Modifier", "EMod", "Emoji_Modifier_Base", "EBase",
    "Emoji_Presentation", "EPres", "Extended_Pictographic", "ExtPict", "Extender", "Ext",
    "Grapheme_Base", "Gr_Base", "Grapheme_Extend", "Gr_Ext", "Hex_Digit", "Hex",
    "IDS_Binary_Operator", "IDSB", "IDS_Trinary_Operator", "IDST", "ID_Continue", "IDC",
    "ID_Start", "IDS", "Ideographic", "Ideo", "Join_Control", "Join_C",
    "Logical_Order_Exception", "LOE", "Lowercase", "Lower", "Math",
    "Noncharacter_Code_Point", "NChar", "Pattern_Syntax", "Pat_Syn", "Pattern_White_Space",
    "Pat_WS", "Quotation_Mark", "QMark", "Radical", "Regional_Indicator", "RI",
    "Sentence_Terminal", "STerm", "Soft_Dotted", "SD", "Terminal_Punctuation", "Term",
    "Unified_Ideograph", "UIdeo", "Uppercase", "Upper", "Variation_Selector", "VS",
    "White_Space", "space", "XID_Continue", "XIDC", "XID_Start", "XIDS",
];

fn is_script_name(value: &str) -> bool {
    let mut chars = value.chars();
    chars.next().is_some_and(|c| c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn surrogates(code_point: u32) -> (u32, u32) {
    let offset = code_point - 0x10000;
    (0xD800 + (offset >> 10), 0xDC00 + (offset & 0x3FF))
}

/// Result of parsing one class atom in non-`v` classes.
enum ClassAtom {
    Character(Character),
    Set(CharacterSet),
}

/// Operand of a `v`-mode class set expression.
enum SetOperand {
    Element(ClassElement),
    Character(Character),
}

impl SetOperand {
    fn into_element(self) -> ClassElement {
        match self {
            SetOperand::Element(element) => element,
            SetOperand::Character(c) => ClassElement::Character(c),
        }
    }
}

struct PatternParser {
    chars: Vec<char>,
    pos: usize,
    unicode: bool,
    unicode_sets: bool,
    group_count: u32,
    has_named_groups: bool,
    next_group: u32,
    group_names: Vec<String>,
    named_references: Vec<(String, usize)>,
}

impl PatternParser {
    fn new(source: &str, flags: Flags) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let (group_count, has_named_groups) = count_groups(&chars, flags.unicode_sets);
        Self {
            chars,
            pos: 0,
            unicode: flags.unicode_mode(),
            unicode_sets: flags.unicode_sets,
            group_count,
            has_named_groups,
            next_group: 0,
            group_names: Vec::new(),
            named_references: Vec::new(),
        }
    }

    fn parse(mut self) -> PResult<Pattern> {
        let alternatives = self.parse_disjunction()?;
        if let Some(c) = self.peek() {
            return Err(if c == ')' {
                self.error("Unmatched ')'")
            } else {
                self.error("Unexpected character")
            });
        }
        for (name, offset) in &self.named_references {
            if !self.group_names.contains(name) {
                return Err(RegexSyntaxError {
                    message: "Invalid named capture referenced".to_string(),
                    offset: *offset,
                });
            }
        }
        Ok(Pattern {
            span: 0..self.chars.len(),
            alternatives,
        })
    }

    fn error(&self, message: &str) -> RegexSyntaxError {
        RegexSyntaxError {
            message: message.to_string(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        let len = s.chars().count();
        if self.chars[self.pos.min(self.chars.len())..]
            .iter()
            .take(len)
            .copied()
            .eq(s.chars())
        {
            self.pos += len;
            true
        } else {
            false
        }
    }

    fn parse_disjunction(&mut self) -> PResult<Vec<Alternative>> {
        let mut alternatives = vec![self.parse_alternative()?];
        while self.eat('|') {
            alternatives.push(self.parse_alternative()?);
        }
        Ok(alternatives)
    }

    fn parse_alternative(&mut self) -> PResult<Alternative> {
        let start = self.pos;
        let mut elements = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            self.parse_term(&mut elements)?;
        }
        Ok(Alternative {
            span: start..self.pos,
            elements,
        })
    }

    fn parse_term(&mut self, elements: &mut Vec<Element>) -> PResult<()> {
        if let Some(assertion) = self.parse_assertion()? {
            let quantifiable = !self.unicode && matches!(assertion, Assertion::Lookahead { .. });
            let element = Element::Assertion(assertion);
            if quantifiable {
                let element = self.parse_quantifier(element)?;
                elements.push(element);
            } else {
                if self.at_quantifier() {
                    return Err(self.error("Nothing to repeat"));
                }
                elements.push(element);
            }
            return Ok(());
        }

        let atom = match self.peek() {
            Some(c) if !self.unicode && c as u32 > 0xFFFF => {
                self.pos += 1;
                let (high, low) = surrogates(c as u32);
                elements.push(Element::Character(Character { value: high }));
                Element::Character(Character { value: low })
            }
            _ => self.parse_atom()?,
        };
        let element = self.parse_quantifier(atom)?;
        elements.push(element);
        Ok(())
    }

    fn parse_assertion(&mut self) -> PResult<Option<Assertion>> {
        if self.eat('^') {
            return Ok(Some(Assertion::Start));
        }
        if self.eat('$') {
            return Ok(Some(Assertion::End));
        }
        if self.eat_str("\\b") {
            return Ok(Some(Assertion::WordBoundary { negate: false }));
        }
        if self.eat_str("\\B") {
            return Ok(Some(Assertion::WordBoundary { negate: true }));
        }

        let lookaround = if self.eat_str("(?=") {
            Some((false, false))
        } else if self.eat_str("(?!") {
            Some((false, true))
        } else if self.eat_str("(?<=") {
            Some((true, false))
        } else if self.eat_str("(?<!") {
            Some((true, true))
        } else {
            None
        };
        let Some((behind, negate)) = lookaround else {
            return Ok(None);
        };

        let alternatives = self.parse_disjunction()?;
        if !self.eat(')') {
            return Err(self.error("Unterminated group"));
        }
        Ok(Some(if behind {
            Assertion::Lookbehind {
                negate,
                alternatives,
            }
        } else {
            Assertion::Lookahead {
                negate,
                alternatives,
            }
        }))
    }

    fn at_quantifier(&self) -> bool {
        match self.peek() {
            Some('*' | '+' | '?') => true,
            Some('{') => self.scan_brace_quantifier().is_some(),
            _ => false,
        }
    }

    /// `{n}`, `{n,}` or `{n,m}` at the cursor, without consuming it.
    fn scan_brace_quantifier(&self) -> Option<(u64, Option<u64>, usize)> {
        let mut i = self.pos;
        if self.chars.get(i) != Some(&'{') {
            return None;
        }
        i += 1;
        let read_number = |i: &mut usize| -> Option<u64> {
            let start = *i;
            let mut value: u64 = 0;
            while let Some(d) = self.chars.get(*i).and_then(|c| c.to_digit(10)) {
                value = value.saturating_mul(10).saturating_add(d as u64);
                *i += 1;
            }
            (*i > start).then_some(value)
        };
        let min = read_number(&mut i)?;
        let max = if self.chars.get(i) == Some(&',') {
            i += 1;
            if self.chars.get(i) == Some(&'}') {
                None
            } else {
                Some(read_number(&mut i)?)
            }
        } else {
            Some(min)
        };
        if self.chars.get(i) != Some(&'}') {
            return None;
        }
        Some((min, max, i + 1 - self.pos))
    }

    fn parse_quantifier(&mut self, element: Element) -> PResult<Element> {
        let start = self.pos;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.pos += 1;
                (0, None)
            }
            Some('+') => {
                self.pos += 1;
                (1, None)
            }
            Some('?') => {
                self.pos += 1;
                (0, Some(1))
            }
            Some('{') => match self.scan_brace_quantifier() {
                Some((min, max, len)) => {
                    self.pos += len;
                    (min, max)
                }
                None if self.unicode => return Err(self.error("Incomplete quantifier")),
                None => return Ok(element),
            },
            _ => return Ok(element),
        };
        if max.is_some_and(|max| max < min) {
            return Err(RegexSyntaxError {
                message: "numbers out of order in {} quantifier".to_string(),
                offset: start,
            });
        }
        let greedy = !self.eat('?');
        Ok(Element::Quantifier(Quantifier {
            min,
            max,
            greedy,
            element: Box::new(element),
        }))
    }

    fn parse_atom(&mut self) -> PResult<Element> {
        let Some(c) = self.peek() else {
            return Err(self.error("Unexpected end of pattern"));
        };
        match c {
            '.' => {
                self.pos += 1;
                Ok(Element::CharacterSet(CharacterSet::Any))
            }
            '(' => self.parse_group(),
            '[' => {
                self.pos += 1;
                if self.unicode_sets {
                    let start = self.pos;
                    let element = self.parse_class_v()?;
                    self.reject_negated_strings(&element, start)?;
                    match element {
                        ClassElement::Class(class) => Ok(Element::CharacterClass(class)),
                        ClassElement::Expression(expr) => {
                            Ok(Element::ExpressionCharacterClass(expr))
                        }
                        _ => Err(self.error("Invalid character class")),
                    }
                } else {
                    self.parse_class().map(Element::CharacterClass)
                }
            }
            '\\' => {
                self.pos += 1;
                self.parse_atom_escape()
            }
            '*' | '+' | '?' => Err(self.error("Nothing to repeat")),
            '{' if self.unicode => Err(self.error("Lone quantifier brackets")),
            '{' if self.scan_brace_quantifier().is_some() => Err(self.error("Nothing to repeat")),
            '}' | ']' if self.unicode => Err(self.error("Lone quantifier brackets")),
            _ => {
                self.pos += 1;
                Ok(Element::Character(Character { value: c as u32 }))
            }
        }
    }

    fn parse_group(&mut self) -> PResult<Element> {
        self.pos += 1;
        let element = if self.eat_str("?:") {
            let alternatives = self.parse_disjunction()?;
            Element::Group(Group { alternatives })
        } else if self.peek() == Some('?') {
            if self.peek_at(1) != Some('<') {
                return Err(self.error("Invalid group"));
            }
            self.pos += 2;
            let name = self.parse_group_name()?;
            if self.group_names.contains(&name) {
                return Err(self.error("Duplicate capture group name"));
            }
            self.group_names.push(name.clone());
            self.next_group += 1;
            let index = self.next_group;
            let alternatives = self.parse_disjunction()?;
            Element::CapturingGroup(CapturingGroup {
                name: Some(name),
                index,
                alternatives,
            })
        } else {
            self.next_group += 1;
            let index = self.next_group;
            let alternatives = self.parse_disjunction()?;
            Element::CapturingGroup(CapturingGroup {
                name: None,
                index,
                alternatives,
            })
        };
        if !self.eat(')') {
            return Err(self.error("Unterminated group"));
        }
        Ok(element)
    }

    /// Reads `name>` after the opening `<`.
    fn parse_group_name(&mut self) -> PResult<String> {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c == '>' {
                break;
            }
            let valid = if name.is_empty() {
                c == '$' || c == '_' || c.is_alphabetic()
            } else {
                c == '$' || c == '_' || c == '\u{200c}' || c == '\u{200d}' || c.is_alphanumeric()
            };
            if !valid {
                return Err(self.error("Invalid capture group name"));
            }
            name.push(c);
            self.pos += 1;
        }
        if name.is_empty() || !self.eat('>') {
            return Err(self.error("Invalid capture group name"));
        }
        Ok(name)
    }

    fn parse_atom_escape(&mut self) -> PResult<Element> {
        let Some(c) = self.peek() else {
            return Err(self.error("\\ at end of pattern"));
        };

        if let Some(set) = self.parse_character_class_escape()? {
            return Ok(Element::CharacterSet(set));
        }

        if c == 'k' && (self.unicode || self.has_named_groups) {
            let offset = self.pos;
            self.pos += 1;
            if !self.eat('<') {
                return Err(self.error("Invalid named reference"));
            }
            let name = self.parse_group_name()?;
            self.named_references.push((name.clone(), offset));
            return Ok(Element::Backreference(Backreference::Name(name)));
        }

        if let Some(first) = c.to_digit(10).filter(|&d| d != 0) {
            let start = self.pos;
            let mut value: u32 = first;
            self.pos += 1;
            while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
                value = value.saturating_mul(10).saturating_add(d);
                self.pos += 1;
            }
            if value <= self.group_count {
                return Ok(Element::Backreference(Backreference::Index(value)));
            }
            if self.unicode {
                return Err(self.error("Invalid escape"));
            }
            self.pos = start;
            return Ok(Element::Character(self.parse_legacy_octal_or_identity()));
        }

        self.parse_character_escape(false).map(Element::Character)
    }

    /// `\d \D \s \S \w \W`, and `\p{…}`/`\P{…}` in unicode mode.
    fn parse_character_class_escape(&mut self) -> PResult<Option<CharacterSet>> {
        let set = match self.peek() {
            Some('d') => CharacterSet::Digit { negate: false },
            Some('D') => CharacterSet::Digit { negate: true },
            Some('s') => CharacterSet::Space { negate: false },
            Some('S') => CharacterSet::Space { negate: true },
            Some('w') => CharacterSet::Word { negate: false },
            Some('W') => CharacterSet::Word { negate: true },
            Some(p @ ('p' | 'P')) if self.unicode => {
                self.pos += 1;
                return self.parse_property(p == 'P').map(Some);
            }
            _ => return Ok(None),
        };
        self.pos += 1;
        Ok(Some(set))
    }

    fn parse_property(&mut self, negate: bool) -> PResult<CharacterSet> {
        if !self.eat('{') {
            return Err(self.error("Invalid property name"));
        }
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '=')
        {
            self.pos += 1;
        }
        let body: String = self.chars[start..self.pos].iter().collect();
        if !self.eat('}') {
            return Err(self.error("Invalid property name"));
        }

        let invalid = || RegexSyntaxError {
            message: "Invalid property name".to_string(),
            offset: start,
        };
        if let Some((key, value)) = body.split_once('=') {
            let valid = match key {
                "General_Category" | "gc" => GENERAL_CATEGORY_VALUES.contains(&value),
                "Script" | "sc" | "Script_Extensions" | "scx" => is_script_name(value),
                _ => false,
            };
            if !valid {
                return Err(invalid());
            }
            return Ok(CharacterSet::Property {
                key: key.to_string(),
                value: Some(value.to_string()),
                negate,
                strings: false,
            });
        }

        if GENERAL_CATEGORY_VALUES.contains(&body.as_str()) {
            return Ok(CharacterSet::Property {
                key: "General_Category".to_string(),
                value: Some(body),
                negate,
                strings: false,
            });
        }
        if BINARY_PROPERTIES.contains(&body.as_str()) {
            return Ok(CharacterSet::Property {
                key: body,
                value: None,
                negate,
                strings: false,
            });
        }
        if self.unicode_sets && STRING_PROPERTIES.contains(&body.as_str()) {
            if negate {
                return Err(invalid());
            }
            return Ok(CharacterSet::Property {
                key: body,
                value: None,
                negate,
                strings: true,
            });
        }
        Err(invalid())
    }

    /// Annex B `\0nn`-style octal escape, or an identity escape of `8`/`9`.
    fn parse_legacy_octal_or_identity(&mut self) -> Character {
        let Some(first) = self.peek() else {
            return Character { value: '\\' as u32 };
        };
        self.pos += 1;
        let Some(mut value) = first.to_digit(8) else {
            return Character {
                value: first as u32,
            };
        };
        let max_digits = if first <= '3' { 3 } else { 2 };
        for _ in 1..max_digits {
            match self.peek().and_then(|c| c.to_digit(8)) {
                Some(d) => {
                    value = value * 8 + d;
                    self.pos += 1;
                }
                None => break,
            }
        }
        Character { value }
    }

    fn read_hex(&mut self, digits: usize) -> Option<u32> {
        let mut value = 0;
        for i in 0..digits {
            value = value * 16 + self.peek_at(i)?.to_digit(16)?;
        }
        self.pos += digits;
        Some(value)
    }

    /// Escapes shared by atoms and classes. The cursor is after `\`.
    fn parse_character_escape(&mut self, in_class: bool) -> PResult<Character> {
        let Some(c) = self.peek() else {
            return Err(self.error("\\ at end of pattern"));
        };
        let simple = match c {
            'f' => Some(0x0C),
            'n' => Some(0x0A),
            'r' => Some(0x0D),
            't' => Some(0x09),
            'v' => Some(0x0B),
            _ => None,
        };
        if let Some(value) = simple {
            self.pos += 1;
            return Ok(Character { value });
        }

        match c {
            'c' => {
                let next = self.peek_at(1);
                if let Some(letter) = next.filter(char::is_ascii_alphabetic) {
                    self.pos += 2;
                    return Ok(Character {
                        value: letter as u32 % 32,
                    });
                }
                if in_class
                    && !self.unicode
                    && next.is_some_and(|n| n.is_ascii_digit() || n == '_')
                {
                    self.pos += 2;
                    return Ok(Character {
                        value: next.map_or(0, |n| n as u32 % 32),
                    });
                }
                if self.unicode {
                    return Err(self.error("Invalid unicode escape"));
                }
                Ok(Character { value: '\\' as u32 })
            }
            '0' if !self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => {
                self.pos += 1;
                Ok(Character { value: 0 })
            }
            '0'..='9' => {
                if self.unicode {
                    return Err(self.error("Invalid decimal escape"));
                }
                Ok(self.parse_legacy_octal_or_identity())
            }
            'x' => {
                self.pos += 1;
                match self.read_hex(2) {
                    Some(value) => Ok(Character { value }),
                    None if self.unicode => Err(self.error("Invalid escape")),
                    None => Ok(Character { value: 'x' as u32 }),
                }
            }
            'u' => {
                self.pos += 1;
                self.parse_unicode_escape()
            }
            _ => {
                let identity = if self.unicode {
                    SYNTAX_CHARACTERS.contains(c)
                        || c == '/'
                        || (in_class && c == '-')
                        || (in_class
                            && self.unicode_sets
                            && CLASS_SET_RESERVED_PUNCTUATORS.contains(c))
                } else {
                    true
                };
                if !identity {
                    return Err(self.error("Invalid escape"));
                }
                self.pos += 1;
                Ok(Character { value: c as u32 })
            }
        }
    }

    /// The cursor is after `\u`.
    fn parse_unicode_escape(&mut self) -> PResult<Character> {
        if self.unicode && self.peek() == Some('{') {
            let start = self.pos;
            self.pos += 1;
            let mut value: u32 = 0;
            let mut digits = 0;
            while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
                value = value.saturating_mul(16).saturating_add(d);
                digits += 1;
                self.pos += 1;
            }
            if digits == 0 || value > 0x10FFFF || !self.eat('}') {
                self.pos = start;
                return Err(self.error("Invalid unicode escape"));
            }
            return Ok(Character { value });
        }

        let Some(lead) = self.read_hex(4) else {
            if self.unicode {
                return Err(self.error("Invalid unicode escape"));
            }
            return Ok(Character { value: 'u' as u32 });
        };
        if self.unicode && (0xD800..0xDC00).contains(&lead) {
            let save = self.pos;
            if self.eat_str("\\u") {
                if let Some(trail) = self.read_hex(4).filter(|t| (0xDC00..0xE000).contains(t)) {
                    return Ok(Character {
                        value: 0x10000 + ((lead - 0xD800) << 10) + (trail - 0xDC00),
                    });
                }
            }
            self.pos = save;
        }
        Ok(Character { value: lead })
    }

    /// Non-`v` class body after `[`.
    fn parse_class(&mut self) -> PResult<CharacterClass> {
        let negate = self.eat('^');
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated character class")),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(c) if !self.unicode && c as u32 > 0xFFFF => {
                    self.pos += 1;
                    let (high, low) = surrogates(c as u32);
                    elements.push(ClassElement::Character(Character { value: high }));
                    elements.push(ClassElement::Character(Character { value: low }));
                    continue;
                }
                Some(_) => {}
            }

            let range_start = self.pos;
            let first = self.parse_class_atom()?;
            let forms_range = self.peek() == Some('-')
                && self.peek_at(1).is_some_and(|c| c != ']');
            if !forms_range {
                elements.push(class_atom_element(first));
                continue;
            }
            self.pos += 1;
            let second = self.parse_class_atom()?;
            match (first, second) {
                (ClassAtom::Character(min), ClassAtom::Character(max)) => {
                    if min.value > max.value {
                        return Err(RegexSyntaxError {
                            message: "Range out of order in character class".to_string(),
                            offset: range_start,
                        });
                    }
                    elements.push(ClassElement::Range(CharacterClassRange { min, max }));
                }
                (first, second) => {
                    if self.unicode {
                        return Err(self.error("Invalid character class"));
                    }
                    elements.push(class_atom_element(first));
                    elements.push(ClassElement::Character(Character { value: '-' as u32 }));
                    elements.push(class_atom_element(second));
                }
            }
        }
        Ok(CharacterClass {
            negate,
            unicode_sets: false,
            elements,
        })
    }

    fn parse_class_atom(&mut self) -> PResult<ClassAtom> {
        let Some(c) = self.peek() else {
            return Err(self.error("Unterminated character class"));
        };
        self.pos += 1;
        if c != '\\' {
            return Ok(ClassAtom::Character(Character { value: c as u32 }));
        }

        match self.peek() {
            Some('b') => {
                self.pos += 1;
                return Ok(ClassAtom::Character(Character { value: 0x08 }));
            }
            Some('-') if self.unicode => {
                self.pos += 1;
                return Ok(ClassAtom::Character(Character { value: '-' as u32 }));
            }
            Some('B' | 'k') if self.unicode => return Err(self.error("Invalid escape")),
            _ => {}
        }
        if let Some(set) = self.parse_character_class_escape()? {
            return Ok(ClassAtom::Set(set));
        }
        if !self.unicode && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            return Ok(ClassAtom::Character(self.parse_legacy_octal_or_identity()));
        }
        self.parse_character_escape(true).map(ClassAtom::Character)
    }

    /// `v`-mode class body after `[`.
    fn parse_class_v(&mut self) -> PResult<ClassElement> {
        let negate = self.eat('^');
        if self.eat(']') {
            return Ok(ClassElement::Class(CharacterClass {
                negate,
                unicode_sets: true,
                elements: Vec::new(),
            }));
        }

        let first = self.parse_set_operand()?;
        if self.peek() == Some('&') && self.peek_at(1) == Some('&') {
            let mut expression = ClassSetExpression::Operand(Box::new(first.into_element()));
            while self.eat_str("&&") {
                if self.peek() == Some('&') {
                    return Err(self.error("Invalid character in character class"));
                }
                let right = self.parse_set_operand()?.into_element();
                expression = ClassSetExpression::Intersection(ClassIntersection {
                    left: Box::new(expression),
                    right: Box::new(right),
                });
            }
            return self.finish_expression_class(negate, expression);
        }
        if self.peek() == Some('-') && self.peek_at(1) == Some('-') {
            let mut expression = ClassSetExpression::Operand(Box::new(first.into_element()));
            while self.eat_str("--") {
                let right = self.parse_set_operand()?.into_element();
                expression = ClassSetExpression::Subtraction(ClassSubtraction {
                    left: Box::new(expression),
                    right: Box::new(right),
                });
            }
            return self.finish_expression_class(negate, expression);
        }

        let mut elements = Vec::new();
        let mut pending = Some(first);
        loop {
            let Some(operand) = pending.take() else {
                break;
            };
            if let SetOperand::Character(min) = operand {
                if self.peek() == Some('-') && self.peek_at(1) != Some('-') {
                    self.pos += 1;
                    let offset = self.pos;
                    let SetOperand::Character(max) = self.parse_set_operand()? else {
                        return Err(self.error("Invalid character class"));
                    };
                    if min.value > max.value {
                        return Err(RegexSyntaxError {
                            message: "Range out of order in character class".to_string(),
                            offset,
                        });
                    }
                    elements.push(ClassElement::Range(CharacterClassRange { min, max }));
                } else {
                    elements.push(ClassElement::Character(min));
                }
            } else {
                elements.push(operand.into_element());
            }

            match self.peek() {
                None => return Err(self.error("Unterminated character class")),
                Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some('&') if self.peek_at(1) == Some('&') => {
                    return Err(self.error("Invalid set operation in character class"));
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    return Err(self.error("Invalid set operation in character class"));
                }
                Some(_) => pending = Some(self.parse_set_operand()?),
            }
        }
        Ok(ClassElement::Class(CharacterClass {
            negate,
            unicode_sets: true,
            elements,
        }))
    }

    fn finish_expression_class(
        &mut self,
        negate: bool,
        expression: ClassSetExpression,
    ) -> PResult<ClassElement> {
        if !self.eat(']') {
            return Err(match self.peek() {
                None => self.error("Unterminated character class"),
                Some(_) => self.error("Invalid set operation in character class"),
            });
        }
        Ok(ClassElement::Expression(ExpressionCharacterClass {
            negate,
            expression,
        }))
    }

    fn parse_set_operand(&mut self) -> PResult<SetOperand> {
        let Some(c) = self.peek() else {
            return Err(self.error("Unterminated character class"));
        };
        if c == '[' {
            self.pos += 1;
            let start = self.pos;
            let nested = self.parse_class_v()?;
            self.reject_negated_strings(&nested, start)?;
            return Ok(SetOperand::Element(nested));
        }
        if c == '\\' {
            self.pos += 1;
            if self.eat_str("q{") {
                return self.parse_string_disjunction().map(SetOperand::Element);
            }
            if self.eat('b') {
                return Ok(SetOperand::Character(Character { value: 0x08 }));
            }
            if let Some(set) = self.parse_character_class_escape()? {
                return Ok(SetOperand::Element(ClassElement::Set(set)));
            }
            return self.parse_character_escape(true).map(SetOperand::Character);
        }
        if CLASS_SET_SYNTAX.contains(c) {
            return Err(self.error("Invalid character in character class"));
        }
        if CLASS_SET_RESERVED_DOUBLE.contains(c) && self.peek_at(1) == Some(c) {
            return Err(self.error("Invalid set operation in character class"));
        }
        self.pos += 1;
        Ok(SetOperand::Character(Character { value: c as u32 }))
    }

    /// `\q{…}` body after the opening brace.
    fn parse_string_disjunction(&mut self) -> PResult<ClassElement> {
        let mut alternatives = Vec::new();
        let mut current = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("Unterminated class string disjunction")),
                Some('}') => {
                    self.pos += 1;
                    alternatives.push(StringAlternative { elements: current });
                    break;
                }
                Some('|') => {
                    self.pos += 1;
                    alternatives.push(StringAlternative {
                        elements: std::mem::take(&mut current),
                    });
                }
                Some('\\') => {
                    self.pos += 1;
                    if self.eat('b') {
                        current.push(Character { value: 0x08 });
                    } else {
                        current.push(self.parse_character_escape(true)?);
                    }
                }
                Some(c) => {
                    if CLASS_SET_SYNTAX.contains(c) {
                        return Err(self.error("Invalid character in character class"));
                    }
                    if CLASS_SET_RESERVED_DOUBLE.contains(c) && self.peek_at(1) == Some(c) {
                        return Err(self.error("Invalid set operation in character class"));
                    }
                    self.pos += 1;
                    current.push(Character { value: c as u32 });
                }
            }
        }
        Ok(ClassElement::StringDisjunction(ClassStringDisjunction {
            alternatives,
        }))
    }

    fn reject_negated_strings(&self, element: &ClassElement, offset: usize) -> PResult<()> {
        let negated = match element {
            ClassElement::Class(class) => class.negate,
            ClassElement::Expression(expr) => expr.negate,
            _ => false,
        };
        if negated && element_may_contain_strings(element, true) {
            return Err(RegexSyntaxError {
                message: "Negated character class may contain strings".to_string(),
                offset,
            });
        }
        Ok(())
    }
}

fn class_atom_element(atom: ClassAtom) -> ClassElement {
    match atom {
        ClassAtom::Character(c) => ClassElement::Character(c),
        ClassAtom::Set(set) => ClassElement::Set(set),
    }
}

/// `MayContainStrings`. `ignore_negation` inspects the body of the class
/// being checked itself.
fn element_may_contain_strings(element: &ClassElement, ignore_negation: bool) -> bool {
    match element {
        ClassElement::Character(_) | ClassElement::Range(_) => false,
        ClassElement::Set(set) => matches!(set, CharacterSet::Property { strings: true, .. }),
        ClassElement::StringDisjunction(disjunction) => disjunction
            .alternatives
            .iter()
            .any(|alt| alt.elements.len() != 1),
        ClassElement::Class(class) => {
            (ignore_negation || !class.negate)
                && class
                    .elements
                    .iter()
                    .any(|e| element_may_contain_strings(e, false))
        }
        ClassElement::Expression(expr) => {
            (ignore_negation || !expr.negate) && expression_may_contain_strings(&expr.expression)
        }
    }
}

fn expression_may_contain_strings(expression: &ClassSetExpression) -> bool {
    match expression {
        ClassSetExpression::Operand(operand) => element_may_contain_strings(operand, false),
        ClassSetExpression::Intersection(i) => {
            expression_may_contain_strings(&i.left) && element_may_contain_strings(&i.right, false)
        }
        ClassSetExpression::Subtraction(s) => expression_may_contain_strings(&s.left),
    }
}

/// Counts capturing groups ahead of parsing, so backreferences can be
/// told apart from legacy octal escapes.
fn count_groups(chars: &[char], unicode_sets: bool) -> (u32, bool) {
    let mut count = 0;
    let mut named = false;
    let mut class_depth = 0u32;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' if class_depth == 0 || unicode_sets => class_depth += 1,
            ']' if class_depth > 0 => class_depth -= 1,
            '(' if class_depth == 0 => {
                if chars.get(i + 1) != Some(&'?') {
                    count += 1;
                } else if chars.get(i + 2) == Some(&'<')
                    && !matches!(chars.get(i + 3), Some('=' | '!'))
                {
                    count += 1;
                    named = true;
                }
            }
            _ => {}
        }
        i += 1;
    }
    (count, named)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements(literal: &str) -> Vec<Element> {
        let parsed = parse_literal(literal).expect("valid regex");
        parsed.pattern.alternatives[0].elements.clone()
    }

    #[test]
    fn parses_flags_in_any_order() {
        let flags = parse_flags("gimsuy").unwrap();
        assert!(flags.global && flags.ignore_case && flags.sticky);
        assert_eq!(flags.canonical(), "gimsuy");
        assert!(parse_flags("gg").is_err());
        assert!(parse_flags("uv").is_err());
        assert!(parse_flags("x").is_err());
    }

    #[test]
    fn parses_quantifiers() {
        let els = elements("/a{2,4}?/");
        let Element::Quantifier(q) = &els[0] else {
            panic!("expected quantifier");
        };
        assert_eq!((q.min, q.max, q.greedy), (2, Some(4), false));

        let els = elements("/a+/");
        assert!(matches!(&els[0], Element::Quantifier(Quantifier { min: 1, max: None, .. })));
    }

    #[test]
    fn annex_b_braces_are_literals() {
        let els = elements("/a{/");
        assert_eq!(els.len(), 2);
        assert!(matches!(&els[1], Element::Character(Character { value: 0x7B })));
        assert!(parse_literal("/a{/u").is_err());
        assert!(parse_literal("/{1}/").is_err());
    }

    #[test]
    fn distinguishes_backreferences_from_octals() {
        let els = elements("/(a)\\1/");
        assert!(matches!(&els[1], Element::Backreference(Backreference::Index(1))));

        let els = elements("/\\1/");
        assert!(matches!(&els[0], Element::Character(Character { value: 1 })));

        assert!(parse_literal("/\\1/u").is_err());
        assert!(parse_literal("/(?<x>a)\\k<x>/").is_ok());
        assert!(parse_literal("/(?<x>a)\\k<y>/").is_err());
    }

    #[test]
    fn parses_classes_and_ranges() {
        let els = elements("/[^a-z\\d]/");
        let Element::CharacterClass(class) = &els[0] else {
            panic!("expected class");
        };
        assert!(class.negate);
        assert_eq!(class.elements.len(), 2);
        assert!(parse_literal("/[z-a]/").is_err());
        assert!(parse_literal("/[\\d-a]/").is_ok());
        assert!(parse_literal("/[\\d-a]/u").is_err());
    }

    #[test]
    fn parses_unicode_sets() {
        let els = elements("/[\\w&&\\q{foo|bar}]/v");
        assert!(matches!(&els[0], Element::ExpressionCharacterClass(_)));

        let els = elements("/[[a-z]--[aeiou]]/v");
        let Element::ExpressionCharacterClass(expr) = &els[0] else {
            panic!("expected expression class");
        };
        assert!(matches!(expr.expression, ClassSetExpression::Subtraction(_)));

        assert!(parse_literal("/[\\p{RGI_Emoji}]/v").is_ok());
        assert!(parse_literal("/[^\\p{RGI_Emoji}]/v").is_err());
        assert!(parse_literal("/[a&&&b]/v").is_err());
        assert!(parse_literal("/[a&&b--c]/v").is_err());
    }

    #[test]
    fn validates_properties() {
        assert!(parse_literal("/\\p{Lu}/u").is_ok());
        assert!(parse_literal("/\\p{Script=Greek}/u").is_ok());
        assert!(parse_literal("/\\p{Nope}/u").is_err());
        assert!(parse_literal("/\\p{RGI_Emoji}/u").is_err());
        // Without the u flag `\p` is an identity escape.
        assert!(parse_literal("/\\p{Nope}/").is_ok());
    }

    #[test]
    fn rejects_malformed_literals() {
        for source in ["/(/", "/a)/", "/*/", "/foo[a-/u", "foo", "/a", "//"] {
            assert!(parse_literal(source).is_err(), "{source}");
        }
    }

    #[test]
    fn literal_slashes_inside_classes() {
        let parsed = parse_literal("/[/]/").unwrap();
        assert_eq!(parsed.pattern.alternatives[0].elements.len(), 1);
    }

    #[test]
    fn finds_repeated_captures() {
        let parsed = parse_literal("/(?:(a)|b)+/").unwrap();
        assert!(parsed.pattern.has_repeated_captures());
        let parsed = parse_literal("/(a)(b)?/").unwrap();
        assert!(!parsed.pattern.has_repeated_captures());
        assert_eq!(parsed.pattern.group_names(), vec![None, None]);
    }
}
