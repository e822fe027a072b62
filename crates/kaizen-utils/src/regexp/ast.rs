//! Regular-expression syntax tree.
//!
//! Offsets are character indices into the pattern source.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

impl Flags {
    /// Flags in canonical `dgimsuvy` order.
    pub fn canonical(&self) -> String {
        [
            (self.has_indices, 'd'),
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
            (self.unicode, 'u'),
            (self.unicode_sets, 'v'),
            (self.sticky, 'y'),
        ]
        .into_iter()
        .filter_map(|(set, c)| set.then_some(c))
        .collect()
    }

    /// `u` or `v`: the pattern is matched by code point.
    pub fn unicode_mode(&self) -> bool {
        self.unicode || self.unicode_sets
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegExpLiteral {
    pub pattern: Pattern,
    pub flags: Flags,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub span: Range<usize>,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    pub span: Range<usize>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Assertion(Assertion),
    Quantifier(Quantifier),
    CapturingGroup(CapturingGroup),
    Group(Group),
    Character(Character),
    CharacterSet(CharacterSet),
    CharacterClass(CharacterClass),
    ExpressionCharacterClass(ExpressionCharacterClass),
    Backreference(Backreference),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    Start,
    End,
    WordBoundary { negate: bool },
    Lookahead { negate: bool, alternatives: Vec<Alternative> },
    Lookbehind { negate: bool, alternatives: Vec<Alternative> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Quantifier {
    pub min: u64,
    /// `None` is unbounded.
    pub max: Option<u64>,
    pub greedy: bool,
    pub element: Box<Element>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapturingGroup {
    pub name: Option<String>,
    /// 1-based group number.
    pub index: u32,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    /// Code point, or a single UTF-16 code unit outside unicode mode.
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CharacterSet {
    Any,
    Digit { negate: bool },
    Space { negate: bool },
    Word { negate: bool },
    Property {
        key: String,
        value: Option<String>,
        negate: bool,
        /// A property of strings such as `RGI_Emoji`.
        strings: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharacterClass {
    pub negate: bool,
    pub unicode_sets: bool,
    pub elements: Vec<ClassElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassElement {
    Character(Character),
    Range(CharacterClassRange),
    Set(CharacterSet),
    Class(CharacterClass),
    Expression(ExpressionCharacterClass),
    StringDisjunction(ClassStringDisjunction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterClassRange {
    pub min: Character,
    pub max: Character,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassStringDisjunction {
    pub alternatives: Vec<StringAlternative>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringAlternative {
    pub elements: Vec<Character>,
}

/// A `v`-mode class whose body is an intersection or a subtraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionCharacterClass {
    pub negate: bool,
    pub expression: ClassSetExpression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassSetExpression {
    Intersection(ClassIntersection),
    Subtraction(ClassSubtraction),
    Operand(Box<ClassElement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassIntersection {
    pub left: Box<ClassSetExpression>,
    pub right: Box<ClassElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassSubtraction {
    pub left: Box<ClassSetExpression>,
    pub right: Box<ClassElement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backreference {
    Index(u32),
    Name(String),
}

impl Pattern {
    /// Whether any capturing group sits inside a quantifier that can repeat.
    pub fn has_repeated_captures(&self) -> bool {
        fn in_alternatives(alternatives: &[Alternative], repeated: bool) -> bool {
            alternatives
                .iter()
                .flat_map(|alt| &alt.elements)
                .any(|el| in_element(el, repeated))
        }
        fn in_element(element: &Element, repeated: bool) -> bool {
            match element {
                Element::CapturingGroup(group) => {
                    repeated || in_alternatives(&group.alternatives, repeated)
                }
                Element::Group(group) => in_alternatives(&group.alternatives, repeated),
                Element::Quantifier(q) => in_element(&q.element, repeated || q.max != Some(1)),
                Element::Assertion(
                    Assertion::Lookahead { alternatives, .. }
                    | Assertion::Lookbehind { alternatives, .. },
                ) => in_alternatives(alternatives, repeated),
                _ => false,
            }
        }
        in_alternatives(&self.alternatives, false)
    }

    /// Names of capturing groups in group-number order.
    pub fn group_names(&self) -> Vec<Option<String>> {
        fn collect(alternatives: &[Alternative], out: &mut Vec<(u32, Option<String>)>) {
            for element in alternatives.iter().flat_map(|alt| &alt.elements) {
                collect_element(element, out);
            }
        }
        fn collect_element(element: &Element, out: &mut Vec<(u32, Option<String>)>) {
            match element {
                Element::CapturingGroup(group) => {
                    out.push((group.index, group.name.clone()));
                    collect(&group.alternatives, out);
                }
                Element::Group(group) => collect(&group.alternatives, out),
                Element::Quantifier(q) => collect_element(&q.element, out),
                Element::Assertion(
                    Assertion::Lookahead { alternatives, .. }
                    | Assertion::Lookbehind { alternatives, .. },
                ) => collect(alternatives, out),
                _ => {}
            }
        }
        let mut groups = Vec::new();
        collect(&self.alternatives, &mut groups);
        groups.sort_by_key(|(index, _)| *index);
        groups.into_iter().map(|(_, name)| name).collect()
    }
}
