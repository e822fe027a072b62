//! Global regex matching that skips backslash-escaped occurrences.

use regex::{Captures, Regex};

use crate::error::MisuseError;
use crate::regexp::{CompiledRegex, parse_literal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternMatcherOptions {
    /// Also report matches preceded by an odd number of backslashes.
    pub escaped: bool,
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Regex,
    escaped: bool,
}

/// One match together with the haystack it was found in.
#[derive(Debug)]
pub struct PatternMatch<'h> {
    captures: Captures<'h>,
    input: &'h str,
}

impl<'h> PatternMatch<'h> {
    pub fn as_str(&self) -> &'h str {
        self.group(0).unwrap_or_default()
    }

    pub fn start(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.start())
    }

    pub fn end(&self) -> usize {
        self.captures.get(0).map_or(0, |m| m.end())
    }

    /// Text of capture group `index`; `None` when the group did not take
    /// part in the match or does not exist.
    pub fn group(&self, index: usize) -> Option<&'h str> {
        self.captures.get(index).map(|m| m.as_str())
    }

    pub fn name(&self, name: &str) -> Option<&'h str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// Number of groups, counting the whole match.
    pub fn len(&self) -> usize {
        self.captures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captures.len() == 0
    }

    pub fn input(&self) -> &'h str {
        self.input
    }
}

impl PatternMatcher {
    pub fn new(pattern: Regex, options: PatternMatcherOptions) -> Self {
        Self {
            pattern,
            escaped: options.escaped,
        }
    }

    /// Builds a matcher from a JavaScript regex literal such as `/\$\{\w+\}/g`.
    pub fn from_literal(
        literal: &str,
        options: PatternMatcherOptions,
    ) -> Result<Self, MisuseError> {
        let parsed = parse_literal(literal)?;
        if !parsed.flags.global {
            return Err(MisuseError::MissingGlobalFlag);
        }
        let compiled = CompiledRegex::new(&parsed)
            .ok_or_else(|| MisuseError::UnsupportedPattern(literal.to_string()))?;
        Ok(Self::new(compiled.into_regex(), options))
    }

    pub fn exec_all<'m, 'h>(
        &'m self,
        haystack: &'h str,
    ) -> impl Iterator<Item = PatternMatch<'h>> + 'm
    where
        'h: 'm,
    {
        self.pattern
            .captures_iter(haystack)
            .filter(move |captures| {
                self.escaped || captures.get(0).is_none_or(|m| !is_escaped(haystack, m.start()))
            })
            .map(move |captures| PatternMatch {
                captures,
                input: haystack,
            })
    }

    pub fn test(&self, haystack: &str) -> bool {
        self.exec_all(haystack).next().is_some()
    }

    /// Replaces every match, expanding `$$`, `$&`, `` $` ``, `$'` and
    /// `$1`..`$99` in `replacement`. References to groups the pattern does
    /// not have stay as written.
    pub fn replace_with_str(&self, haystack: &str, replacement: &str) -> String {
        self.replace_with_fn(haystack, |m| expand(replacement, m))
    }

    pub fn replace_with_fn<F>(&self, haystack: &str, mut replace: F) -> String
    where
        F: FnMut(&PatternMatch<'_>) -> String,
    {
        let mut out = String::with_capacity(haystack.len());
        let mut index = 0;
        for m in self.exec_all(haystack) {
            out.push_str(&haystack[index..m.start()]);
            out.push_str(&replace(&m));
            index = m.end();
        }
        out.push_str(&haystack[index..]);
        out
    }
}

fn is_escaped(haystack: &str, index: usize) -> bool {
    haystack.as_bytes()[..index]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 1
}

fn expand(replacement: &str, m: &PatternMatch<'_>) -> String {
    let input = m.input();
    let mut out = String::new();
    let mut rest = replacement;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let tail = &rest[dollar + 1..];
        let bytes = tail.as_bytes();
        let consumed = match bytes.first() {
            Some(b'$') => {
                out.push('$');
                1
            }
            Some(b'&') => {
                out.push_str(m.as_str());
                1
            }
            Some(b'`') => {
                out.push_str(&input[..m.start()]);
                1
            }
            Some(b'\'') => {
                out.push_str(&input[m.end()..]);
                1
            }
            Some(&first @ b'1'..=b'9') => {
                let mut index = usize::from(first - b'0');
                let mut digits = 1;
                if let Some(&second @ b'0'..=b'9') = bytes.get(1) {
                    index = index * 10 + usize::from(second - b'0');
                    digits = 2;
                }
                if index < m.len() {
                    out.push_str(m.group(index).unwrap_or_default());
                } else {
                    out.push('$');
                    out.push_str(&tail[..digits]);
                }
                digits
            }
            _ => {
                out.push('$');
                0
            }
        };
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(pattern: &str) -> PatternMatcher {
        PatternMatcher::new(Regex::new(pattern).unwrap(), PatternMatcherOptions::default())
    }

    #[test]
    fn escaped_matches_are_skipped() {
        let m = matcher(r"\$\{\w+\}");
        let found: Vec<_> = m
            .exec_all(r"${a} \${b} \\${c}")
            .map(|m| (m.start(), m.as_str()))
            .collect();
        assert_eq!(found, vec![(0, "${a}"), (13, "${c}")]);
    }

    #[test]
    fn escaped_option_reports_everything() {
        let m = PatternMatcher::new(
            Regex::new(r"\$\{\w+\}").unwrap(),
            PatternMatcherOptions { escaped: true },
        );
        assert_eq!(m.exec_all(r"${a} \${b}").count(), 2);
    }

    #[test]
    fn test_finds_unescaped_matches_only() {
        let m = matcher("a");
        assert!(m.test("xa"));
        assert!(!m.test(r"x\a"));
        assert!(m.test(r"x\\a"));
    }

    #[test]
    fn replace_with_placeholders() {
        let m = matcher(r"(\w)(\d)");
        assert_eq!(m.replace_with_str("a1 b2", "[$2$1]"), "[1a] [2b]");
        assert_eq!(m.replace_with_str("a1", "$$-$&"), "$-a1");
        assert_eq!(m.replace_with_str("xa1y", "<$`|$'>"), "x<x|y>y");
        assert_eq!(m.replace_with_str("a1", "$3 $12 $"), "$3 $12 $");
        assert_eq!(m.replace_with_str("a1", "$x"), "$x");
    }

    #[test]
    fn replacement_skips_escaped_matches() {
        let m = matcher("o");
        assert_eq!(m.replace_with_str(r"foo \o", "0"), r"f00 \o");
    }

    #[test]
    fn replace_with_closure_sees_groups_and_input() {
        let m = matcher(r"(?<word>\w+)");
        let out = m.replace_with_fn("ab cd", |found| {
            let word = found.name("word").unwrap().to_uppercase();
            format!("{}@{}/{}", word, found.start(), found.input().len())
        });
        assert_eq!(out, "AB@0/5 CD@3/5");
    }

    #[test]
    fn from_literal_requires_global_flag() {
        assert!(PatternMatcher::from_literal(r"/\w+/g", PatternMatcherOptions::default()).is_ok());
        assert_eq!(
            PatternMatcher::from_literal(r"/\w+/", PatternMatcherOptions::default()).unwrap_err(),
            MisuseError::MissingGlobalFlag
        );
        assert!(matches!(
            PatternMatcher::from_literal("/(/g", PatternMatcherOptions::default()),
            Err(MisuseError::InvalidPattern(_))
        ));
        assert!(matches!(
            PatternMatcher::from_literal(r"/(a)\1/g", PatternMatcherOptions::default()),
            Err(MisuseError::UnsupportedPattern(_))
        ));
    }

    #[test]
    fn literals_translate_to_ecmascript_semantics() {
        let m = PatternMatcher::from_literal(r"/\d+/g", PatternMatcherOptions::default()).unwrap();
        assert_eq!(m.replace_with_str("a12b3", "#"), "a#b#");
    }
}
