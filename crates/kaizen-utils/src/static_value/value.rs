//! Runtime values produced by static evaluation.
//!
//! Strings are sequences of UTF-16 code units so `length` and indexing
//! agree with JavaScript. BigInts are `i128`; anything wider is not
//! determinable. Object-like values are `Rc`-shared and compare by identity
//! under `===`, while `PartialEq` compares structurally.

use std::cell::{Cell, OnceCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use thiserror::Error;

use super::builtins::Builtin;
use super::number;
use crate::regexp::{CompiledRegex, RegExpLiteral};

pub(crate) const MAX_STRING_LENGTH: usize = 1 << 20;
pub(crate) const MAX_ARRAY_LENGTH: usize = 1 << 20;

/// Why an evaluation step produced no value.
#[derive(Debug, Clone, Error)]
pub(crate) enum EvalError {
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("RangeError: {0}")]
    RangeError(String),
    #[error("not modelled: {0}")]
    Unsupported(String),
    #[error("call to {0} is not allowed")]
    DangerousCall(String),
}

pub(crate) type EvalResult<T> = Result<T, EvalError>;

pub(crate) fn type_error<T>(message: impl Into<String>) -> EvalResult<T> {
    Err(EvalError::TypeError(message.into()))
}

pub(crate) fn range_error<T>(message: impl Into<String>) -> EvalResult<T> {
    Err(EvalError::RangeError(message.into()))
}

pub(crate) fn unsupported<T>(message: impl Into<String>) -> EvalResult<T> {
    Err(EvalError::Unsupported(message.into()))
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<[u16]>);

impl JsString {
    pub fn empty() -> Self {
        JsString(Rc::from(Vec::new()))
    }

    pub fn from_units(units: Vec<u16>) -> Self {
        JsString(Rc::from(units))
    }

    pub fn units(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lone surrogates become U+FFFD.
    pub fn to_rust_lossy(&self) -> String {
        String::from_utf16_lossy(&self.0)
    }

    /// `None` when the string holds lone surrogates.
    pub fn to_rust(&self) -> Option<String> {
        String::from_utf16(&self.0).ok()
    }

    pub(crate) fn concat(&self, other: &JsString) -> EvalResult<JsString> {
        check_string_length(self.len() + other.len())?;
        let mut units = Vec::with_capacity(self.len() + other.len());
        units.extend_from_slice(&self.0);
        units.extend_from_slice(&other.0);
        Ok(JsString::from_units(units))
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> JsString {
        let end = end.min(self.len());
        let start = start.min(end);
        JsString::from_units(self.0[start..end].to_vec())
    }

    pub(crate) fn index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let (haystack, needle) = (self.units(), search.units());
        if from > haystack.len() {
            return None;
        }
        if needle.is_empty() {
            return Some(from);
        }
        (from..=haystack.len().saturating_sub(needle.len()))
            .find(|&i| haystack[i..].starts_with(needle))
    }

    pub(crate) fn last_index_of(&self, search: &JsString, from: usize) -> Option<usize> {
        let (haystack, needle) = (self.units(), search.units());
        if needle.len() > haystack.len() {
            return None;
        }
        let last = from.min(haystack.len() - needle.len());
        (0..=last)
            .rev()
            .find(|&i| haystack[i..].starts_with(needle))
    }

    /// Canonical array index such as `"3"`.
    pub fn as_array_index(&self) -> Option<u32> {
        let units = self.units();
        if units.is_empty() || units.len() > 10 || (units.len() > 1 && units[0] == b'0' as u16) {
            return None;
        }
        let mut value: u64 = 0;
        for &unit in units {
            let digit = char::from_u32(unit as u32)?.to_digit(10)?;
            value = value * 10 + digit as u64;
        }
        (value < u32::MAX as u64).then_some(value as u32)
    }

    /// Code points, with lone surrogates kept as their own unit.
    pub(crate) fn code_points(&self) -> Vec<JsString> {
        let units = self.units();
        let mut out = Vec::new();
        let mut i = 0;
        while i < units.len() {
            let len = if is_high_surrogate(units[i])
                && units.get(i + 1).is_some_and(|&u| is_low_surrogate(u))
            {
                2
            } else {
                1
            };
            out.push(JsString::from_units(units[i..i + len].to_vec()));
            i += len;
        }
        out
    }
}

pub(crate) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

pub(crate) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

pub(crate) fn check_string_length(len: usize) -> EvalResult<()> {
    if len > MAX_STRING_LENGTH {
        return unsupported("string too long");
    }
    Ok(())
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString::from_units(s.encode_utf16().collect())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString::from(s.as_str())
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rust_lossy())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_rust_lossy())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `Symbol.iterator` and friends, by their property name.
    WellKnown(&'static str),
    /// `Symbol.for(key)`.
    Registered(JsString),
}

impl Symbol {
    pub fn description(&self) -> String {
        match self {
            Symbol::WellKnown(name) => format!("Symbol.{name}"),
            Symbol::Registered(key) => key.to_rust_lossy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Symbol(Symbol),
}

impl PropertyKey {
    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    pub fn array_index(&self) -> Option<u32> {
        self.as_string().and_then(JsString::as_array_index)
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(JsString::from(s))
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        PropertyKey::String(s)
    }
}

/// How far `Object.preventExtensions`, `seal` or `freeze` has locked a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntegrityLevel {
    #[default]
    Extensible,
    NonExtensible,
    Sealed,
    Frozen,
}

#[derive(Debug, Default)]
pub struct ArrayValue {
    /// `None` is a hole.
    pub elements: Vec<Option<Value>>,
    /// Named properties such as `index` on match results.
    pub properties: IndexMap<JsString, Value>,
    pub(crate) integrity: Cell<IntegrityLevel>,
}

impl ArrayValue {
    pub fn integrity(&self) -> IntegrityLevel {
        self.integrity.get()
    }

    /// Levels only ever tighten.
    pub fn restrict(&self, level: IntegrityLevel) {
        self.integrity.set(self.integrity.get().max(level));
    }

    pub fn has_own_properties(&self) -> bool {
        !self.properties.is_empty() || self.elements.iter().any(Option::is_some)
    }
}

#[derive(Debug, Default)]
pub struct ObjectValue {
    properties: IndexMap<PropertyKey, Value>,
    integrity: Cell<IntegrityLevel>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn integrity(&self) -> IntegrityLevel {
        self.integrity.get()
    }

    pub fn restrict(&self, level: IntegrityLevel) {
        self.integrity.set(self.integrity.get().max(level));
    }

    /// Redefining a key keeps its original position.
    pub fn insert(&mut self, key: PropertyKey, value: Value) {
        self.properties.insert(key, value);
    }

    pub fn get(&self, key: &PropertyKey) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Array-index keys ascending, then other strings in insertion order,
    /// then symbols in insertion order.
    pub fn own_keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<(u32, &PropertyKey)> = self
            .properties
            .keys()
            .filter_map(|k| k.array_index().map(|i| (i, k)))
            .collect();
        indices.sort_by_key(|(i, _)| *i);

        let strings = self
            .properties
            .keys()
            .filter(|k| matches!(k, PropertyKey::String(_)) && k.array_index().is_none());
        let symbols = self
            .properties
            .keys()
            .filter(|k| matches!(k, PropertyKey::Symbol(_)));

        indices
            .into_iter()
            .map(|(_, k)| k)
            .chain(strings)
            .chain(symbols)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> Vec<(PropertyKey, Value)> {
        self.own_keys()
            .into_iter()
            .filter_map(|k| self.properties.get(&k).cloned().map(|v| (k, v)))
            .collect()
    }
}

#[derive(Debug)]
pub struct RegExpValue {
    /// Pattern text as written or passed to the constructor.
    pub pattern: String,
    pub literal: RegExpLiteral,
    compiled: OnceCell<Option<CompiledRegex>>,
}

impl RegExpValue {
    pub fn new(pattern: String, literal: RegExpLiteral) -> Self {
        Self {
            pattern,
            literal,
            compiled: OnceCell::new(),
        }
    }

    pub fn flags(&self) -> String {
        self.literal.flags.canonical()
    }

    /// `RegExp.prototype.source`: `/` and line terminators escaped.
    pub fn source(&self) -> String {
        if self.pattern.is_empty() {
            return "(?:)".to_string();
        }
        let mut out = String::with_capacity(self.pattern.len());
        let mut escaped = false;
        let mut in_class = false;
        for c in self.pattern.chars() {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\u{2028}' => out.push_str("\\u2028"),
                '\u{2029}' => out.push_str("\\u2029"),
                '/' if !escaped && !in_class => out.push_str("\\/"),
                _ => out.push(c),
            }
            if !escaped {
                match c {
                    '[' => in_class = true,
                    ']' => in_class = false,
                    _ => {}
                }
            }
            escaped = !escaped && c == '\\';
        }
        out
    }

    /// `/source/flags`.
    pub fn to_literal_text(&self) -> String {
        format!("/{}/{}", self.source(), self.flags())
    }

    pub(crate) fn compiled(&self) -> Option<&CompiledRegex> {
        self.compiled
            .get_or_init(|| CompiledRegex::new(&self.literal))
            .as_ref()
    }
}

#[derive(Debug, Default)]
pub struct MapValue {
    pub entries: Vec<(Value, Value)>,
}

impl MapValue {
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| same_value_zero(k, key))
            .map(|(_, v)| v)
    }
}

#[derive(Debug, Default)]
pub struct SetValue {
    pub values: Vec<Value>,
}

impl SetValue {
    pub fn has(&self, value: &Value) -> bool {
        self.values.iter().any(|v| same_value_zero(v, value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorKind {
    Array,
    Map,
    Set,
    String,
    RegExpString,
}

impl IteratorKind {
    pub fn tag(self) -> &'static str {
        match self {
            IteratorKind::Array => "Array Iterator",
            IteratorKind::Map => "Map Iterator",
            IteratorKind::Set => "Set Iterator",
            IteratorKind::String => "String Iterator",
            IteratorKind::RegExpString => "RegExp String Iterator",
        }
    }
}

/// A materialised iterator. Consuming it once exhausts it.
#[derive(Debug)]
pub struct IteratorValue {
    pub kind: IteratorKind,
    items: Vec<Value>,
    done: Cell<bool>,
}

impl IteratorValue {
    pub fn new(kind: IteratorKind, items: Vec<Value>) -> Self {
        Self {
            kind,
            items,
            done: Cell::new(false),
        }
    }

    pub(crate) fn take(&self) -> Vec<Value> {
        if self.done.replace(true) {
            Vec::new()
        } else {
            self.items.clone()
        }
    }

    pub fn remaining(&self) -> &[Value] {
        if self.done.get() { &[] } else { &self.items }
    }
}

/// Plain global objects that are not functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Math,
    Json,
    Reflect,
}

impl Namespace {
    pub fn name(self) -> &'static str {
        match self {
            Namespace::Math => "Math",
            Namespace::Json => "JSON",
            Namespace::Reflect => "Reflect",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(JsString),
    BigInt(i128),
    Symbol(Symbol),
    Array(Rc<ArrayValue>),
    Object(Rc<ObjectValue>),
    RegExp(Rc<RegExpValue>),
    Set(Rc<SetValue>),
    Map(Rc<MapValue>),
    Iterator(Rc<IteratorValue>),
    Function(&'static Builtin),
    Namespace(Namespace),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(ArrayValue {
            elements: items.into_iter().map(Some).collect(),
            ..ArrayValue::default()
        }))
    }

    pub fn array_with_holes(items: Vec<Option<Value>>) -> Value {
        Value::Array(Rc::new(ArrayValue {
            elements: items,
            ..ArrayValue::default()
        }))
    }

    pub fn object<K: Into<PropertyKey>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        let mut object = ObjectValue::new();
        for (key, value) in entries {
            object.insert(key.into(), value);
        }
        Value::Object(Rc::new(object))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined
                | Value::Null
                | Value::Bool(_)
                | Value::Number(_)
                | Value::String(_)
                | Value::BigInt(_)
                | Value::Symbol(_)
        )
    }

    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::BigInt(_) => "bigint",
            Value::Symbol(_) => "symbol",
            Value::Function(_) => "function",
            Value::Array(_)
            | Value::Object(_)
            | Value::RegExp(_)
            | Value::Set(_)
            | Value::Map(_)
            | Value::Iterator(_)
            | Value::Namespace(_) => "object",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.to_rust_lossy()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Value::String(s)
    }
}

/// Structural equality with `Object.is` semantics for numbers.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => same_value_number(*a, *b),
            (Value::Array(a), Value::Array(b)) => {
                a.elements == b.elements && a.properties == b.properties
            }
            (Value::Object(a), Value::Object(b)) => {
                a.properties.len() == b.properties.len()
                    && a.properties
                        .iter()
                        .zip(b.properties.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
            }
            (Value::RegExp(a), Value::RegExp(b)) => {
                a.source() == b.source() && a.flags() == b.flags()
            }
            (Value::Set(a), Value::Set(b)) => a.values == b.values,
            (Value::Map(a), Value::Map(b)) => a.entries == b.entries,
            (Value::Iterator(a), Value::Iterator(b)) => {
                a.kind == b.kind && a.remaining() == b.remaining()
            }
            _ => strict_equals(self, other),
        }
    }
}

fn same_value_number(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    a == b && a.is_sign_negative() == b.is_sign_negative()
}

pub(crate) fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => !(*n == 0.0 || n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::BigInt(b) => *b != 0,
        _ => true,
    }
}

/// `ToPrimitive` for the modelled object kinds.
pub(crate) fn to_primitive(value: &Value) -> EvalResult<Value> {
    let text = match value {
        v if v.is_primitive() => return Ok(v.clone()),
        Value::Array(array) => return array_join(array, &JsString::from(",")).map(Value::String),
        Value::Object(object) => {
            let overridden = ["toString", "valueOf"]
                .iter()
                .any(|name| object.get(&PropertyKey::from(*name)).is_some())
                || object
                    .get(&PropertyKey::Symbol(Symbol::WellKnown("toPrimitive")))
                    .is_some();
            if overridden {
                return unsupported("object with custom conversion");
            }
            "[object Object]".to_string()
        }
        Value::RegExp(regexp) => regexp.to_literal_text(),
        Value::Set(_) => "[object Set]".to_string(),
        Value::Map(_) => "[object Map]".to_string(),
        Value::Iterator(iterator) => format!("[object {}]", iterator.kind.tag()),
        Value::Function(builtin) => format!("function {}() {{ [native code] }}", builtin.name()),
        Value::Namespace(ns) => format!("[object {}]", ns.name()),
        _ => return unsupported("conversion"),
    };
    Ok(Value::from(text))
}

pub(crate) fn to_number(value: &Value) -> EvalResult<f64> {
    match value {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Ok(*n),
        Value::String(s) => match number::string_to_number(&s.to_rust_lossy()) {
            Some(n) => Ok(n),
            None => unsupported("numeric string out of range"),
        },
        Value::BigInt(_) => type_error("Cannot convert a BigInt value to a number"),
        Value::Symbol(_) => type_error("Cannot convert a Symbol value to a number"),
        _ => to_number(&to_primitive(value)?),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Numeric {
    Number(f64),
    BigInt(i128),
}

pub(crate) fn to_numeric(value: &Value) -> EvalResult<Numeric> {
    match to_primitive(value)? {
        Value::BigInt(b) => Ok(Numeric::BigInt(b)),
        primitive => Ok(Numeric::Number(to_number(&primitive)?)),
    }
}

pub(crate) fn to_js_string(value: &Value) -> EvalResult<JsString> {
    match value {
        Value::Undefined => Ok(JsString::from("undefined")),
        Value::Null => Ok(JsString::from("null")),
        Value::Bool(b) => Ok(JsString::from(if *b { "true" } else { "false" })),
        Value::Number(n) => Ok(JsString::from(number::number_to_string(*n))),
        Value::String(s) => Ok(s.clone()),
        Value::BigInt(b) => Ok(JsString::from(b.to_string())),
        Value::Symbol(_) => type_error("Cannot convert a Symbol value to a string"),
        _ => to_js_string(&to_primitive(value)?),
    }
}

/// `String(value)`, which unlike `ToString` accepts symbols.
pub(crate) fn to_display_string(value: &Value) -> EvalResult<JsString> {
    match value {
        Value::Symbol(symbol) => Ok(JsString::from(format!("Symbol({})", symbol.description()))),
        _ => to_js_string(value),
    }
}

pub(crate) fn to_property_key(value: &Value) -> EvalResult<PropertyKey> {
    match to_primitive(value)? {
        Value::Symbol(symbol) => Ok(PropertyKey::Symbol(symbol)),
        primitive => Ok(PropertyKey::String(to_js_string(&primitive)?)),
    }
}

pub(crate) fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

pub(crate) fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    n.trunc().rem_euclid(4_294_967_296.0) as u32
}

pub(crate) fn to_integer_or_infinity(n: f64) -> f64 {
    if n.is_nan() {
        return 0.0;
    }
    let t = n.trunc();
    if t == 0.0 { 0.0 } else { t }
}

/// `StringToBigInt`. `Ok(None)` when the text is not a BigInt literal.
pub(crate) fn string_to_bigint(s: &JsString) -> EvalResult<Option<i128>> {
    let text = s.to_rust_lossy();
    let trimmed = text.trim_matches(number::is_js_whitespace);
    if trimmed.is_empty() {
        return Ok(Some(0));
    }

    let lower = trimmed.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits, negative) = match lower.as_deref() {
        Some("0x") => (16, &trimmed[2..], false),
        Some("0o") => (8, &trimmed[2..], false),
        Some("0b") => (2, &trimmed[2..], false),
        _ => match trimmed.as_bytes()[0] {
            b'+' => (10, &trimmed[1..], false),
            b'-' => (10, &trimmed[1..], true),
            _ => (10, trimmed, false),
        },
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Ok(None);
    }
    match i128::from_str_radix(digits, radix) {
        Ok(value) => Ok(Some(if negative { -value } else { value })),
        Err(_) => unsupported("BigInt out of range"),
    }
}

/// Compares a BigInt with a Number; `None` when the Number is NaN.
pub(crate) fn compare_bigint_number(b: i128, n: f64) -> Option<Ordering> {
    if n.is_nan() {
        return None;
    }
    if n == f64::INFINITY {
        return Some(Ordering::Less);
    }
    if n == f64::NEG_INFINITY {
        return Some(Ordering::Greater);
    }
    let floor = n.floor();
    if floor >= 1.7e38 {
        return Some(Ordering::Less);
    }
    if floor < -1.7e38 {
        return Some(Ordering::Greater);
    }
    match b.cmp(&(floor as i128)) {
        Ordering::Equal if n > floor => Some(Ordering::Less),
        ordering => Some(ordering),
    }
}

pub(crate) fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::BigInt(x), Value::BigInt(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::RegExp(x), Value::RegExp(y)) => Rc::ptr_eq(x, y),
        (Value::Set(x), Value::Set(y)) => Rc::ptr_eq(x, y),
        (Value::Map(x), Value::Map(y)) => Rc::ptr_eq(x, y),
        (Value::Iterator(x), Value::Iterator(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => std::ptr::eq(*x, *y),
        (Value::Namespace(x), Value::Namespace(y)) => x == y,
        _ => false,
    }
}

pub(crate) fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
        _ => strict_equals(a, b),
    }
}

pub(crate) fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => same_value_number(*x, *y),
        _ => strict_equals(a, b),
    }
}

/// `IsLooselyEqual`.
pub(crate) fn loose_equals(a: &Value, b: &Value) -> EvalResult<bool> {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => Ok(false),
        (Value::Number(_), Value::String(_)) => Ok(strict_equals(a, &Value::Number(to_number(b)?))),
        (Value::String(_), Value::Number(_)) => Ok(strict_equals(&Value::Number(to_number(a)?), b)),
        (Value::BigInt(x), Value::String(s)) | (Value::String(s), Value::BigInt(x)) => {
            Ok(string_to_bigint(s)? == Some(*x))
        }
        (Value::Bool(_), _) => loose_equals(&Value::Number(to_number(a)?), b),
        (_, Value::Bool(_)) => loose_equals(a, &Value::Number(to_number(b)?)),
        (Value::BigInt(x), Value::Number(n)) | (Value::Number(n), Value::BigInt(x)) => {
            Ok(compare_bigint_number(*x, *n) == Some(Ordering::Equal))
        }
        _ if a.is_primitive() == b.is_primitive() => Ok(strict_equals(a, b)),
        _ if a.is_primitive() => loose_equals(a, &to_primitive(b)?),
        _ => loose_equals(&to_primitive(a)?, b),
    }
}

/// `IsLessThan`; `None` stands for the `undefined` outcome.
pub(crate) fn less_than(a: &Value, b: &Value) -> EvalResult<Option<bool>> {
    let pa = to_primitive(a)?;
    let pb = to_primitive(b)?;
    if let (Value::String(x), Value::String(y)) = (&pa, &pb) {
        return Ok(Some(x < y));
    }
    if let (Value::BigInt(x), Value::String(s)) = (&pa, &pb) {
        return Ok(string_to_bigint(s)?.map(|y| *x < y));
    }
    if let (Value::String(s), Value::BigInt(y)) = (&pa, &pb) {
        return Ok(string_to_bigint(s)?.map(|x| x < *y));
    }

    Ok(match (to_numeric(&pa)?, to_numeric(&pb)?) {
        (Numeric::Number(x), Numeric::Number(y)) => {
            if x.is_nan() || y.is_nan() {
                None
            } else {
                Some(x < y)
            }
        }
        (Numeric::BigInt(x), Numeric::BigInt(y)) => Some(x < y),
        (Numeric::BigInt(x), Numeric::Number(y)) => {
            compare_bigint_number(x, y).map(|o| o == Ordering::Less)
        }
        (Numeric::Number(x), Numeric::BigInt(y)) => {
            compare_bigint_number(y, x).map(|o| o == Ordering::Greater)
        }
    })
}

pub(crate) fn array_join(array: &ArrayValue, separator: &JsString) -> EvalResult<JsString> {
    let mut units: Vec<u16> = Vec::new();
    for (i, element) in array.elements.iter().enumerate() {
        if i > 0 {
            units.extend_from_slice(separator.units());
        }
        match element {
            None | Some(Value::Undefined | Value::Null) => {}
            Some(value) => units.extend_from_slice(to_js_string(value)?.units()),
        }
        check_string_length(units.len())?;
    }
    Ok(JsString::from_units(units))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_utf16() {
        let s = JsString::from("a😀");
        assert_eq!(s.len(), 3);
        assert_eq!(s.code_points().len(), 2);
        assert_eq!(s.slice(1, 2).to_rust(), None);
    }

    #[test]
    fn array_index_keys_are_canonical() {
        assert_eq!(JsString::from("10").as_array_index(), Some(10));
        assert_eq!(JsString::from("01").as_array_index(), None);
        assert_eq!(JsString::from("4294967295").as_array_index(), None);
    }

    #[test]
    fn object_keys_put_indices_first() {
        let Value::Object(object) = Value::object([
            ("b", Value::Null),
            ("2", Value::Null),
            ("a", Value::Null),
            ("1", Value::Null),
        ]) else {
            unreachable!()
        };
        let keys: Vec<String> = object
            .own_keys()
            .iter()
            .map(|k| k.as_string().unwrap().to_rust_lossy())
            .collect();
        assert_eq!(keys, ["1", "2", "b", "a"]);
    }

    #[test]
    fn coercions_follow_ecmascript() {
        assert!(to_number(&Value::from("  12 ")).unwrap() == 12.0);
        assert!(to_number(&Value::array(vec![Value::from(5.0)])).unwrap() == 5.0);
        assert_eq!(to_js_string(&Value::from(1e21)).unwrap().to_rust_lossy(), "1e+21");
        assert!(to_number(&Value::BigInt(1)).is_err());
        assert_eq!(to_int32(4_294_967_295.0), -1);
        assert_eq!(to_uint32(-1.0), 4_294_967_295);
    }

    #[test]
    fn equality_algorithms() {
        assert!(loose_equals(&Value::from(1.0), &Value::from("1")).unwrap());
        assert!(loose_equals(&Value::Null, &Value::Undefined).unwrap());
        assert!(!loose_equals(&Value::Null, &Value::from(0.0)).unwrap());
        assert!(loose_equals(&Value::BigInt(2), &Value::from(2.0)).unwrap());
        assert!(loose_equals(&Value::from(true), &Value::from("1")).unwrap());
        assert!(!strict_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(same_value_zero(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!same_value(&Value::from(0.0), &Value::from(-0.0)));
    }

    #[test]
    fn relational_comparison() {
        assert_eq!(less_than(&Value::from("a"), &Value::from("b")).unwrap(), Some(true));
        assert_eq!(less_than(&Value::from(1.0), &Value::from(f64::NAN)).unwrap(), None);
        assert_eq!(less_than(&Value::BigInt(1), &Value::from(1.5)).unwrap(), Some(true));
        assert_eq!(less_than(&Value::from(2.5), &Value::BigInt(2)).unwrap(), Some(false));
    }
}
