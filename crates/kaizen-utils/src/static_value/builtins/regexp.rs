//! `RegExp`, and the string methods that search with a pattern.
//!
//! Matching runs through [`CompiledRegex`]; offsets it reports are bytes
//! into the UTF-8 haystack and are converted back to UTF-16 indices here.

use std::rc::Rc;

use super::string::this_string;
use super::*;
use crate::regexp::{CompiledRegex, RegexMatch, is_safe_regex, parse_pattern};

pub(super) fn register(r: &mut Registry) {
    r.constructor("RegExp", Some(regexp_call), regexp_construct);
    r.deny(&[
        "RegExp.escape",
        "RegExp.prototype.compile",
        "RegExp.prototype.exec",
        "RegExp.prototype.test",
        "RegExp.prototype.toString",
    ]);

    r.search_checked("String.prototype.match", string_match);
    r.search_checked("String.prototype.matchAll", string_match_all);
    r.search_checked("String.prototype.replace", string_replace);
    r.search_checked("String.prototype.replaceAll", string_replace_all);
    r.search_checked("String.prototype.split", string_split);
}

fn new_regexp(pattern: &Value, flags: &Value) -> EvalResult<Value> {
    let (source, default_flags) = match pattern {
        Value::RegExp(existing) => (existing.pattern.clone(), existing.flags()),
        Value::Undefined => (String::new(), String::new()),
        other => (to_js_string(other)?.to_rust_lossy(), String::new()),
    };
    let flags = match flags {
        Value::Undefined => default_flags,
        other => to_js_string(other)?.to_rust_lossy(),
    };
    match parse_pattern(&source, &flags) {
        Ok(literal) => Ok(Value::RegExp(Rc::new(RegExpValue::new(source, literal)))),
        Err(err) => type_error(err.to_string()),
    }
}

fn regexp_call(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);
    if matches!((&pattern, &flags), (Value::RegExp(_), Value::Undefined)) {
        return Ok(pattern);
    }
    new_regexp(&pattern, &flags)
}

fn regexp_construct(_: &Value, args: &[Value]) -> EvalResult<Value> {
    new_regexp(&arg(args, 0), &arg(args, 1))
}

/// Properties of a regular expression object.
pub(super) fn property(regexp: &RegExpValue, key: &PropertyKey) -> EvalResult<Value> {
    let name = key.as_string().map(JsString::to_rust_lossy);
    let flags = regexp.literal.flags;
    let value = match name.as_deref() {
        Some("lastIndex") => Value::Number(0.0),
        Some("flags") => Value::from(regexp.flags()),
        Some("source") => Value::from(regexp.source()),
        Some("global") => Value::Bool(flags.global),
        Some("ignoreCase") => Value::Bool(flags.ignore_case),
        Some("multiline") => Value::Bool(flags.multiline),
        Some("dotAll") => Value::Bool(flags.dot_all),
        Some("unicode") => Value::Bool(flags.unicode),
        Some("sticky") => Value::Bool(flags.sticky),
        Some("hasIndices") => Value::Bool(flags.has_indices),
        Some("unicodeSets") => return unsupported("RegExp.prototype.unicodeSets getter"),
        _ => return prototype_member("RegExp", key),
    };
    Ok(value)
}

enum Search {
    Text(JsString),
    Pattern(Rc<RegExpValue>),
}

/// Accepts plain strings, and regular expressions with bounded
/// backtracking.
fn check_search(value: &Value) -> EvalResult<Search> {
    match value {
        Value::String(text) => Ok(Search::Text(text.clone())),
        Value::RegExp(regexp) => {
            let literal = regexp.to_literal_text();
            if is_safe_regex(&literal) {
                Ok(Search::Pattern(Rc::clone(regexp)))
            } else {
                debug!(%literal, "unsafe search value");
                Err(EvalError::DangerousCall(literal))
            }
        }
        other => {
            debug!(kind = other.type_of(), "unverifiable search value");
            Err(EvalError::DangerousCall(format!("search value of type {}", other.type_of())))
        }
    }
}

/// The subject as UTF-8 together with a compiled pattern that treats it
/// exactly as ECMAScript would.
fn prepare<'r>(
    regexp: &'r RegExpValue,
    subject: &JsString,
) -> EvalResult<(&'r CompiledRegex, String)> {
    let Some(haystack) = subject.to_rust() else {
        return unsupported("lone surrogate in regex subject");
    };
    let Some(compiled) = regexp.compiled() else {
        return unsupported(format!("no faithful translation for {}", regexp.to_literal_text()));
    };
    if !compiled.accepts(&haystack) {
        return unsupported("subject outside the modelled regex semantics");
    }
    Ok((compiled, haystack))
}

/// Byte offset just past the character at `at`.
fn next_char_boundary(haystack: &str, at: usize) -> usize {
    haystack[at..]
        .chars()
        .next()
        .map_or(at + 1, |c| at + c.len_utf8())
}

/// Every match a global regex visits, or the first one otherwise.
fn exec_all(compiled: &CompiledRegex, haystack: &str, global: bool) -> Vec<RegexMatch> {
    let mut matches = Vec::new();
    let mut position = 0;
    while position <= haystack.len() {
        let Some(found) = compiled.exec_at(haystack, position) else {
            break;
        };
        position = if found.end == found.start {
            next_char_boundary(haystack, found.end)
        } else {
            found.end
        };
        matches.push(found);
        if !global {
            break;
        }
    }
    matches
}

/// Converts increasing byte offsets into UTF-16 indices.
struct Utf16Cursor<'h> {
    haystack: &'h str,
    byte: usize,
    unit: usize,
}

impl<'h> Utf16Cursor<'h> {
    fn new(haystack: &'h str) -> Self {
        Self {
            haystack,
            byte: 0,
            unit: 0,
        }
    }

    fn index(&mut self, byte: usize) -> usize {
        if byte < self.byte {
            self.byte = 0;
            self.unit = 0;
        }
        self.unit += self.haystack[self.byte..byte].encode_utf16().count();
        self.byte = byte;
        self.unit
    }
}

/// One match in UTF-16 terms.
struct MatchInfo {
    start: usize,
    matched: JsString,
    captures: Vec<Value>,
    groups: Value,
}

fn match_info(
    compiled: &CompiledRegex,
    haystack: &str,
    found: &RegexMatch,
    cursor: &mut Utf16Cursor<'_>,
) -> MatchInfo {
    let captures: Vec<Value> = found
        .groups
        .iter()
        .map(|group| match group {
            Some((start, end)) => Value::from(&haystack[*start..*end]),
            None => Value::Undefined,
        })
        .collect();
    let names = compiled.group_names();
    let groups = if names.iter().any(Option::is_some) {
        Value::object(
            names
                .iter()
                .zip(&captures)
                .filter_map(|(name, value)| name.as_deref().map(|n| (n, value.clone()))),
        )
    } else {
        Value::Undefined
    };
    MatchInfo {
        start: cursor.index(found.start),
        matched: JsString::from(&haystack[found.start..found.end]),
        captures,
        groups,
    }
}

fn regex_matches(
    regexp: &RegExpValue,
    subject: &JsString,
    global: bool,
) -> EvalResult<Vec<MatchInfo>> {
    let (compiled, haystack) = prepare(regexp, subject)?;
    let mut cursor = Utf16Cursor::new(&haystack);
    Ok(exec_all(compiled, &haystack, global)
        .iter()
        .map(|found| match_info(compiled, &haystack, found, &mut cursor))
        .collect())
}

/// The array `RegExp.prototype.exec` would return.
fn match_result(info: MatchInfo, subject: &JsString) -> Value {
    let mut elements = Vec::with_capacity(info.captures.len() + 1);
    elements.push(Some(Value::String(info.matched)));
    elements.extend(info.captures.into_iter().map(Some));
    let mut array = ArrayValue {
        elements,
        ..ArrayValue::default()
    };
    array.properties.insert(JsString::from("index"), Value::Number(info.start as f64));
    array.properties.insert(JsString::from("input"), Value::String(subject.clone()));
    array.properties.insert(JsString::from("groups"), info.groups);
    Value::Array(Rc::new(array))
}

/// A string search value used where a pattern is expected.
fn pattern_from_text(text: &JsString, flags: &str) -> EvalResult<Rc<RegExpValue>> {
    match new_regexp(&Value::String(text.clone()), &Value::from(flags))? {
        Value::RegExp(regexp) => Ok(regexp),
        _ => unsupported("pattern construction"),
    }
}

fn string_match(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let search = check_search(&arg(args, 0))?;
    let subject = this_string(this)?;
    let regexp = match search {
        Search::Text(text) => pattern_from_text(&text, "")?,
        Search::Pattern(regexp) => regexp,
    };
    let global = regexp.literal.flags.global;
    let mut matches = regex_matches(&regexp, &subject, global)?;
    if matches.is_empty() {
        return Ok(Value::Null);
    }
    if global {
        let items = matches.into_iter().map(|m| Value::String(m.matched)).collect();
        return Ok(Value::array(items));
    }
    Ok(match_result(matches.remove(0), &subject))
}

fn string_match_all(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let search = check_search(&arg(args, 0))?;
    let subject = this_string(this)?;
    let regexp = match search {
        Search::Text(text) => pattern_from_text(&text, "g")?,
        Search::Pattern(regexp) if !regexp.literal.flags.global => {
            return type_error("String.prototype.matchAll called with a non-global RegExp argument");
        }
        Search::Pattern(regexp) => regexp,
    };
    let items = regex_matches(&regexp, &subject, true)?
        .into_iter()
        .map(|m| match_result(m, &subject))
        .collect();
    Ok(Value::Iterator(Rc::new(IteratorValue::new(
        IteratorKind::RegExpString,
        items,
    ))))
}

fn text_matches(subject: &JsString, search: &JsString, all: bool) -> Vec<MatchInfo> {
    let advance = search.len().max(1);
    let mut matches = Vec::new();
    let mut from = 0;
    while let Some(start) = subject.index_of(search, from) {
        matches.push(MatchInfo {
            start,
            matched: search.clone(),
            captures: Vec::new(),
            groups: Value::Undefined,
        });
        if !all {
            break;
        }
        from = start + advance;
    }
    matches
}

/// `GetSubstitution`.
fn substitute(info: &MatchInfo, subject: &JsString, template: &JsString) -> EvalResult<Vec<u16>> {
    let units = template.units();
    let dollar = u16::from(b'$');
    let digit = |unit: Option<&u16>| {
        unit.and_then(|&u| char::from_u32(u32::from(u)))
            .and_then(|c| c.to_digit(10))
            .map(|d| d as usize)
    };
    let tail_start = (info.start + info.matched.len()).min(subject.len());
    let group_count = info.captures.len();

    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if units[i] != dollar || i + 1 == units.len() {
            out.push(units[i]);
            i += 1;
            continue;
        }
        let next = units[i + 1];
        match char::from_u32(u32::from(next)) {
            Some('$') => {
                out.push(dollar);
                i += 2;
            }
            Some('&') => {
                out.extend_from_slice(info.matched.units());
                i += 2;
            }
            Some('`') => {
                out.extend_from_slice(&subject.units()[..info.start.min(subject.len())]);
                i += 2;
            }
            Some('\'') => {
                out.extend_from_slice(&subject.units()[tail_start..]);
                i += 2;
            }
            Some('0'..='9') => {
                let first = digit(Some(&next)).unwrap_or(0);
                let two = digit(units.get(i + 2)).map(|second| first * 10 + second);
                let (index, width) = match two {
                    Some(n) if (1..=group_count).contains(&n) => (n, 3),
                    _ if (1..=group_count).contains(&first) => (first, 2),
                    _ => {
                        out.push(dollar);
                        i += 1;
                        continue;
                    }
                };
                if let Value::String(s) = &info.captures[index - 1] {
                    out.extend_from_slice(s.units());
                }
                i += width;
            }
            Some('<') if !matches!(info.groups, Value::Undefined) => {
                let close = units[i + 2..].iter().position(|&u| u == u16::from(b'>'));
                let Some(close) = close else {
                    out.extend_from_slice(&units[i..i + 2]);
                    i += 2;
                    continue;
                };
                let name = JsString::from_units(units[i + 2..i + 2 + close].to_vec());
                let value = get_property(&info.groups, &PropertyKey::String(name))?;
                if !matches!(value, Value::Undefined) {
                    out.extend_from_slice(to_js_string(&value)?.units());
                }
                i += close + 3;
            }
            _ => {
                out.push(dollar);
                i += 1;
            }
        }
    }
    Ok(out)
}

fn replace_matches(
    subject: &JsString,
    matches: Vec<MatchInfo>,
    replacement: &Value,
) -> EvalResult<Value> {
    let template = match replacement {
        Value::Function(_) => None,
        other => Some(to_js_string(other)?),
    };
    let mut out = Vec::with_capacity(subject.len());
    let mut next = 0;
    for info in matches {
        let replaced = match &template {
            Some(template) => substitute(&info, subject, template)?,
            None => {
                let mut args = Vec::with_capacity(info.captures.len() + 4);
                args.push(Value::String(info.matched.clone()));
                args.extend(info.captures.iter().cloned());
                args.push(Value::Number(info.start as f64));
                args.push(Value::String(subject.clone()));
                if !matches!(info.groups, Value::Undefined) {
                    args.push(info.groups.clone());
                }
                let result = call(replacement, &Value::Undefined, &args)?;
                to_js_string(&result)?.units().to_vec()
            }
        };
        if info.start >= next {
            out.extend_from_slice(&subject.units()[next..info.start]);
            out.extend_from_slice(&replaced);
            next = info.start + info.matched.len();
        }
        check_string_length(out.len())?;
    }
    out.extend_from_slice(&subject.units()[next.min(subject.len())..]);
    check_string_length(out.len())?;
    Ok(Value::String(JsString::from_units(out)))
}

fn string_replace(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let search = check_search(&arg(args, 0))?;
    let subject = this_string(this)?;
    let matches = match search {
        Search::Text(text) => text_matches(&subject, &text, false),
        Search::Pattern(regexp) => regex_matches(&regexp, &subject, regexp.literal.flags.global)?,
    };
    replace_matches(&subject, matches, &arg(args, 1))
}

fn string_replace_all(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let search = check_search(&arg(args, 0))?;
    let subject = this_string(this)?;
    let matches = match search {
        Search::Text(text) => text_matches(&subject, &text, true),
        Search::Pattern(regexp) if !regexp.literal.flags.global => {
            return type_error("replaceAll must be called with a global RegExp");
        }
        Search::Pattern(regexp) => regex_matches(&regexp, &subject, true)?,
    };
    replace_matches(&subject, matches, &arg(args, 1))
}

fn split_limit(value: &Value) -> EvalResult<usize> {
    match value {
        Value::Undefined => Ok(u32::MAX as usize),
        other => Ok(to_uint32(to_number(other)?) as usize),
    }
}

fn split_text(subject: &JsString, separator: &JsString, limit: usize) -> Vec<Value> {
    if separator.is_empty() {
        return subject
            .units()
            .iter()
            .take(limit)
            .map(|&unit| Value::String(JsString::from_units(vec![unit])))
            .collect();
    }
    let mut parts = Vec::new();
    let mut from = 0;
    while let Some(found) = subject.index_of(separator, from) {
        parts.push(Value::String(subject.slice(from, found)));
        if parts.len() == limit {
            return parts;
        }
        from = found + separator.len();
    }
    parts.push(Value::String(subject.slice(from, subject.len())));
    parts
}

/// `RegExp.prototype[Symbol.split]`, on byte offsets.
fn split_pattern(regexp: &RegExpValue, subject: &JsString, limit: usize) -> EvalResult<Vec<Value>> {
    let (compiled, haystack) = prepare(regexp, subject)?;
    let size = haystack.len();
    if size == 0 {
        return Ok(match compiled.exec_at(&haystack, 0) {
            Some(_) => Vec::new(),
            None => vec![Value::String(subject.clone())],
        });
    }

    let mut parts = Vec::new();
    let mut last = 0;
    let mut position = 0;
    while position < size {
        let Some(found) = compiled.exec_at(&haystack, position) else {
            break;
        };
        if found.start >= size {
            break;
        }
        let end = found.end.min(size);
        if end == last {
            position = next_char_boundary(&haystack, found.start);
            continue;
        }
        parts.push(Value::from(&haystack[last..found.start]));
        if parts.len() == limit {
            return Ok(parts);
        }
        for group in &found.groups {
            parts.push(match group {
                Some((start, end)) => Value::from(&haystack[*start..*end]),
                None => Value::Undefined,
            });
            if parts.len() == limit {
                return Ok(parts);
            }
        }
        last = end;
        position = end;
    }
    parts.push(Value::from(&haystack[last..]));
    Ok(parts)
}

fn string_split(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let search = check_search(&arg(args, 0))?;
    let subject = this_string(this)?;
    let limit = split_limit(&arg(args, 1))?;
    if limit == 0 {
        return Ok(Value::array(Vec::new()));
    }
    let parts = match search {
        Search::Text(separator) => {
            if subject.is_empty() && !separator.is_empty() {
                vec![Value::String(subject)]
            } else {
                split_text(&subject, &separator, limit)
            }
        }
        Search::Pattern(regexp) => split_pattern(&regexp, &subject, limit)?,
    };
    Ok(Value::array(parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regexp::parse_literal;

    fn regex(literal: &str) -> Value {
        let parsed = parse_literal(literal).unwrap();
        let body = &literal[1..literal.rfind('/').unwrap()];
        Value::RegExp(Rc::new(RegExpValue::new(body.to_string(), parsed)))
    }

    fn method(name: &str, this: &str, args: &[Value]) -> EvalResult<Value> {
        let this = Value::from(this);
        let callee = get_property(&this, &PropertyKey::from(name))?;
        call(&callee, &this, args)
    }

    #[test]
    fn regexp_getters() {
        let value = regex("/a\\/b/gi");
        let get = |name: &str| get_property(&value, &PropertyKey::from(name)).unwrap();
        assert_eq!(get("flags"), Value::from("gi"));
        assert_eq!(get("source"), Value::from("a\\/b"));
        assert_eq!(get("global"), Value::Bool(true));
        assert_eq!(get("sticky"), Value::Bool(false));
        assert_eq!(get("lastIndex"), Value::Number(0.0));
    }

    #[test]
    fn constructor_reuses_or_copies_patterns() {
        let ctor = global_value("RegExp").unwrap();
        let original = regex("/x/g");
        let same = call(&ctor, &Value::Undefined, &[original.clone()]).unwrap();
        assert!(strict_equals(&same, &original));
        let copy = construct(&ctor, &[original.clone(), Value::from("i")]).unwrap();
        assert!(!strict_equals(&copy, &original));
        assert_eq!(
            get_property(&copy, &PropertyKey::from("flags")).unwrap(),
            Value::from("i")
        );
        assert!(construct(&ctor, &[Value::from("(")]).is_err());
    }

    #[test]
    fn match_produces_exec_arrays() {
        let result = method("match", "a1b22", &[regex("/b(\\d\\d)/")]).unwrap();
        let Value::Array(array) = &result else {
            panic!("expected an array, got {result:?}");
        };
        assert_eq!(array.elements[0], Some(Value::from("b22")));
        assert_eq!(array.elements[1], Some(Value::from("22")));
        assert_eq!(array.properties.get(&JsString::from("index")), Some(&Value::Number(2.0)));

        let all = method("match", "a1b22", &[regex("/\\d/g")]).unwrap();
        assert_eq!(all, Value::array(vec![Value::from("1"), Value::from("2"), Value::from("2")]));
        assert_eq!(method("match", "abc", &[regex("/z/")]).unwrap(), Value::Null);
    }

    #[test]
    fn replace_with_templates() {
        assert_eq!(
            method(
                "replace",
                "john smith",
                &[regex("/(\\w{4}) (\\w{5})/"), Value::from("$2, $1")]
            )
            .unwrap(),
            Value::from("smith, john")
        );
        assert_eq!(
            method("replaceAll", "a.b.c", &[Value::from("."), Value::from("[$&]")]).unwrap(),
            Value::from("a[.]b[.]c")
        );
        assert_eq!(
            method("replace", "aaa", &[Value::from("a"), Value::from("$'|")]).unwrap(),
            Value::from("aa|aa")
        );
        assert_eq!(
            method("replace", "x", &[regex("/(?<n>x)/"), Value::from("<$<n>>")]).unwrap(),
            Value::from("<x>")
        );
    }

    #[test]
    fn replace_with_callback_runs_in_the_sandbox() {
        let upper = get_property(&Value::from(""), &PropertyKey::from("toUpperCase")).unwrap();
        assert!(method("replace", "ab", &[Value::from("a"), upper]).is_err());
        let string = global_value("String").unwrap();
        assert_eq!(
            method("replace", "ab", &[regex("/b/"), string]).unwrap(),
            Value::from("ab")
        );
    }

    #[test]
    fn replace_all_requires_a_global_pattern() {
        assert!(matches!(
            method("replaceAll", "aa", &[regex("/a/"), Value::from("b")]),
            Err(EvalError::TypeError(_))
        ));
        assert_eq!(
            method("replaceAll", "ab", &[Value::from(""), Value::from("-")]).unwrap(),
            Value::from("-a-b-")
        );
    }

    #[test]
    fn split_by_text_and_pattern() {
        let parts = |v: &[&str]| Value::array(v.iter().map(|s| Value::from(*s)).collect());
        assert_eq!(
            method("split", "a,b,,c", &[Value::from(",")]).unwrap(),
            parts(&["a", "b", "", "c"])
        );
        assert_eq!(
            method("split", "a,b,c", &[Value::from(","), Value::Number(2.0)]).unwrap(),
            parts(&["a", "b"])
        );
        assert_eq!(method("split", "abc", &[Value::from("")]).unwrap(), parts(&["a", "b", "c"]));
        assert_eq!(method("split", "", &[Value::from(",")]).unwrap(), parts(&[""]));
        assert_eq!(method("split", "a1b2c", &[regex("/\\d/")]).unwrap(), parts(&["a", "b", "c"]));
        assert_eq!(
            method("split", "a1b", &[regex("/(\\d)/")]).unwrap(),
            parts(&["a", "1", "b"])
        );
        assert_eq!(method("split", "ab", &[regex("/(?:)/")]).unwrap(), parts(&["a", "b"]));
    }

    #[test]
    fn unsafe_or_unknown_search_values_are_rejected() {
        assert!(matches!(
            method("replace", "aaaa", &[regex("/(a+)+$/"), Value::from("")]),
            Err(EvalError::DangerousCall(_))
        ));
        assert!(matches!(
            method("split", "a b", &[]),
            Err(EvalError::DangerousCall(_))
        ));
    }

    #[test]
    fn match_all_yields_every_match() {
        let iterator = method("matchAll", "a1a2", &[regex("/a(\\d)/g")]).unwrap();
        let matches = iterate(&iterator).unwrap();
        assert_eq!(matches.len(), 2);
        let Value::Array(second) = &matches[1] else {
            panic!("expected a match array");
        };
        assert_eq!(second.elements[1], Some(Value::from("2")));
        assert!(method("matchAll", "a", &[regex("/a/")]).is_err());
    }
}
