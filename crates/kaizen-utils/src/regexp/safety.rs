//! Worst-case path counting over a regex tree.
//!
//! The count approximates how many distinct ways a subtree can match. A
//! pattern whose count reaches [`SAFE_PATH_LIMIT`] (or infinity) is treated
//! as prone to catastrophic backtracking.

use tracing::trace;

use super::ast::*;
use super::parser::parse_literal;

pub type PathCount = f64;

pub const SAFE_PATH_LIMIT: PathCount = 100.0;

/// Paths contributed by one property-of-strings member.
const STRING_PROPERTY_PATHS: PathCount = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
}

/// Any node [`max_possible_paths`] can start from.
#[derive(Debug, Clone, Copy)]
pub enum RegexNode<'a> {
    Pattern(&'a Pattern),
    Alternative(&'a Alternative),
    Element(&'a Element),
}

impl<'a> From<&'a Pattern> for RegexNode<'a> {
    fn from(pattern: &'a Pattern) -> Self {
        RegexNode::Pattern(pattern)
    }
}

impl<'a> From<&'a Alternative> for RegexNode<'a> {
    fn from(alternative: &'a Alternative) -> Self {
        RegexNode::Alternative(alternative)
    }
}

impl<'a> From<&'a Element> for RegexNode<'a> {
    fn from(element: &'a Element) -> Self {
        RegexNode::Element(element)
    }
}

/// Whether a regex literal such as `/(a|b)+c/` is free of excessive
/// backtracking. Unparseable literals are unsafe.
pub fn is_safe_regex(literal: &str) -> bool {
    match parse_literal(literal) {
        Ok(parsed) => {
            let paths = max_possible_paths(&parsed.pattern, Direction::Ltr);
            trace!(literal, paths, "regex path count");
            paths < SAFE_PATH_LIMIT
        }
        Err(err) => {
            trace!(literal, error = %err, "regex did not parse");
            false
        }
    }
}

pub fn max_possible_paths<'a>(node: impl Into<RegexNode<'a>>, direction: Direction) -> PathCount {
    match node.into() {
        RegexNode::Pattern(pattern) => sum_alternatives(&pattern.alternatives, direction),
        RegexNode::Alternative(alternative) => alternative_paths(alternative, direction),
        RegexNode::Element(element) => element_paths(element, direction),
    }
}

fn sum_alternatives(alternatives: &[Alternative], direction: Direction) -> PathCount {
    let mut total = 0.0;
    for alternative in alternatives {
        total += alternative_paths(alternative, direction);
        if total == f64::INFINITY {
            return total;
        }
    }
    total
}

fn alternative_paths(alternative: &Alternative, direction: Direction) -> PathCount {
    let mut product = 1.0;
    let mut multiply = |element: &Element| {
        product *= element_paths(element, direction);
        product == 0.0 || product == f64::INFINITY
    };
    match direction {
        Direction::Ltr => {
            for element in &alternative.elements {
                if multiply(element) {
                    break;
                }
            }
        }
        Direction::Rtl => {
            for element in alternative.elements.iter().rev() {
                if multiply(element) {
                    break;
                }
            }
        }
    }
    product
}

fn element_paths(element: &Element, direction: Direction) -> PathCount {
    match element {
        Element::Assertion(Assertion::Lookahead { alternatives, .. }) => {
            sum_alternatives(alternatives, Direction::Ltr)
        }
        Element::Assertion(Assertion::Lookbehind { alternatives, .. }) => {
            sum_alternatives(alternatives, Direction::Rtl)
        }
        Element::Assertion(_) | Element::Backreference(_) => 1.0,
        Element::Character(_) | Element::CharacterSet(_) => {
            let class = ClassElementRef::from_element(element);
            class.strings() + if class.has_no_characters() { 0.0 } else { 1.0 }
        }
        Element::CharacterClass(class) => {
            let class = ClassElementRef::Class(class);
            class.strings() + if class.has_no_characters() { 0.0 } else { 1.0 }
        }
        Element::ExpressionCharacterClass(expr) => {
            let class = ClassElementRef::Expression(expr);
            class.strings() + if class.has_no_characters() { 0.0 } else { 1.0 }
        }
        Element::Quantifier(quantifier) => quantifier_paths(quantifier, direction),
        Element::CapturingGroup(CapturingGroup { alternatives, .. })
        | Element::Group(Group { alternatives }) => sum_alternatives(alternatives, direction),
    }
}

fn quantifier_paths(quantifier: &Quantifier, direction: Direction) -> PathCount {
    if quantifier.max == Some(0) {
        return 1.0;
    }
    let inner = element_paths(&quantifier.element, direction);
    if inner == 0.0 {
        return if quantifier.min == 0 { 1.0 } else { 0.0 };
    }
    let Some(max) = quantifier.max else {
        return f64::INFINITY;
    };
    if inner == f64::INFINITY {
        return f64::INFINITY;
    }

    let constant = inner.powf(quantifier.min as f64);
    if quantifier.min == max {
        return constant;
    }
    let p = (max - quantifier.min) as f64;
    let extra = if inner < 2.0 {
        p * inner + 1.0
    } else {
        (inner.powf(p + 1.0) / (inner - 1.0)).ceil() - 1.0
    };
    constant * extra
}

/// Character-like nodes inside and outside classes, viewed uniformly.
#[derive(Clone, Copy)]
enum ClassElementRef<'a> {
    Character,
    Set(&'a CharacterSet),
    Class(&'a CharacterClass),
    Expression(&'a ExpressionCharacterClass),
    StringDisjunction(&'a ClassStringDisjunction),
    Range,
}

impl<'a> ClassElementRef<'a> {
    fn from_element(element: &'a Element) -> Self {
        match element {
            Element::CharacterSet(set) => ClassElementRef::Set(set),
            Element::CharacterClass(class) => ClassElementRef::Class(class),
            Element::ExpressionCharacterClass(expr) => ClassElementRef::Expression(expr),
            _ => ClassElementRef::Character,
        }
    }

    fn from_class_element(element: &'a ClassElement) -> Self {
        match element {
            ClassElement::Character(_) => ClassElementRef::Character,
            ClassElement::Range(_) => ClassElementRef::Range,
            ClassElement::Set(set) => ClassElementRef::Set(set),
            ClassElement::Class(class) => ClassElementRef::Class(class),
            ClassElement::Expression(expr) => ClassElementRef::Expression(expr),
            ClassElement::StringDisjunction(d) => ClassElementRef::StringDisjunction(d),
        }
    }

    /// Multi-character strings the node may match.
    fn strings(self) -> PathCount {
        match self {
            ClassElementRef::Character | ClassElementRef::Range => 0.0,
            ClassElementRef::Set(set) => match set {
                CharacterSet::Property { strings: true, .. } => STRING_PROPERTY_PATHS,
                _ => 0.0,
            },
            ClassElementRef::StringDisjunction(disjunction) => disjunction
                .alternatives
                .iter()
                .filter(|alt| alt.elements.len() != 1)
                .count() as PathCount,
            ClassElementRef::Class(class) => {
                if class.negate || !class.unicode_sets {
                    0.0
                } else {
                    class
                        .elements
                        .iter()
                        .map(|e| ClassElementRef::from_class_element(e).strings())
                        .sum()
                }
            }
            ClassElementRef::Expression(expr) => {
                if expr.negate {
                    0.0
                } else {
                    expression_strings(&expr.expression)
                }
            }
        }
    }

    /// Whether the node cannot match any single character.
    fn has_no_characters(self) -> bool {
        match self {
            ClassElementRef::Character | ClassElementRef::Range | ClassElementRef::Set(_) => false,
            ClassElementRef::StringDisjunction(disjunction) => disjunction
                .alternatives
                .iter()
                .all(|alt| alt.elements.len() != 1),
            ClassElementRef::Class(class) => {
                !class.negate
                    && class
                        .elements
                        .iter()
                        .all(|e| ClassElementRef::from_class_element(e).has_no_characters())
            }
            ClassElementRef::Expression(expr) => {
                !expr.negate && expression_has_no_characters(&expr.expression)
            }
        }
    }
}

fn expression_strings(expression: &ClassSetExpression) -> PathCount {
    match expression {
        ClassSetExpression::Operand(operand) => {
            ClassElementRef::from_class_element(operand).strings()
        }
        ClassSetExpression::Intersection(intersection) => expression_strings(&intersection.left)
            .min(ClassElementRef::from_class_element(&intersection.right).strings()),
        ClassSetExpression::Subtraction(subtraction) => expression_strings(&subtraction.left),
    }
}

fn expression_has_no_characters(expression: &ClassSetExpression) -> bool {
    match expression {
        ClassSetExpression::Operand(operand) => {
            ClassElementRef::from_class_element(operand).has_no_characters()
        }
        ClassSetExpression::Intersection(intersection) => {
            expression_has_no_characters(&intersection.left)
                || ClassElementRef::from_class_element(&intersection.right).has_no_characters()
        }
        ClassSetExpression::Subtraction(subtraction) => {
            expression_has_no_characters(&subtraction.left)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(literal: &str) -> PathCount {
        let parsed = parse_literal(literal).expect("valid regex");
        max_possible_paths(&parsed.pattern, Direction::Ltr)
    }

    #[test]
    fn counts_alternations_and_quantifiers() {
        assert_eq!(paths("/abc/"), 1.0);
        assert_eq!(paths("/a|b|c/"), 3.0);
        assert_eq!(paths("/a{2,4}/"), 3.0);
        assert_eq!(paths("/(a|b){2,4}/"), 28.0);
        assert_eq!(paths("/(a|b|c){2,4}/"), 117.0);
        assert_eq!(paths("/a*/"), f64::INFINITY);
    }

    #[test]
    fn empty_classes_match_nothing() {
        assert_eq!(paths("/[]/"), 0.0);
        assert_eq!(paths("/[]*/"), 1.0);
        assert_eq!(paths("/[]+/"), 0.0);
        assert_eq!(paths("/b+[]/"), f64::INFINITY);
        assert_eq!(paths("/[]b+/"), 0.0);
    }

    #[test]
    fn lookbehind_counts_right_to_left() {
        assert_eq!(paths("/(?<=cb+[])a/"), 0.0);
        assert_eq!(paths("/(?=[]b+)a/"), 0.0);
        assert_eq!(paths("/(?<=[]b+)a/"), f64::INFINITY);
    }

    #[test]
    fn unsafe_and_safe_literals() {
        assert!(is_safe_regex("/a{2,4}/"));
        assert!(!is_safe_regex("/(a|b|c){2,4}/"));
        assert!(!is_safe_regex("/(a+)b\\1/"));
        assert!(!is_safe_regex("/foo[a-/u"));
    }
}
