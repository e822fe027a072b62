//! Sandbox of host built-ins available to static evaluation.
//!
//! Every built-in the evaluator can observe is registered under a stable
//! key such as `"Array.prototype.slice"`. Registration makes the function a
//! value (so `typeof` and `===` work on it); its [`CallPolicy`] decides
//! whether evaluation may invoke it.

mod array;
mod collections;
mod global;
mod numeric;
mod object;
mod regexp;
mod string;

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use tracing::debug;

use super::value::*;
use crate::scope::globals::BUILTIN;

pub(crate) type NativeFn = fn(&Value, &[Value]) -> EvalResult<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPolicy {
    /// Pure and deterministic.
    Allowed,
    /// Returns its first argument, after the native hook records its
    /// integrity level.
    PassThrough,
    /// Allowed once the search argument is a string or a safe regex.
    SearchChecked,
    /// Real, but never invoked.
    Denied,
}

pub struct Builtin {
    pub(crate) key: &'static str,
    pub(crate) name: &'static str,
    pub(crate) policy: CallPolicy,
    pub(crate) call: Option<NativeFn>,
    pub(crate) construct: Option<NativeFn>,
}

impl Builtin {
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// The function's `name` property.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> CallPolicy {
        self.policy
    }

    pub fn is_constructible(&self) -> bool {
        self.policy != CallPolicy::Denied && self.construct.is_some()
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("key", &self.key)
            .field("policy", &self.policy)
            .finish()
    }
}

#[derive(Default)]
pub(super) struct Registry {
    entries: HashMap<&'static str, Builtin>,
}

impl Registry {
    fn insert(
        &mut self,
        key: &'static str,
        policy: CallPolicy,
        call: Option<NativeFn>,
        construct: Option<NativeFn>,
    ) {
        let name = match key.find('[') {
            Some(start) => &key[start..],
            None => key.rsplit('.').next().unwrap_or(key),
        };
        self.entries.insert(
            key,
            Builtin {
                key,
                name,
                policy,
                call,
                construct,
            },
        );
    }

    pub(super) fn allow(&mut self, key: &'static str, call: NativeFn) {
        self.insert(key, CallPolicy::Allowed, Some(call), None);
    }

    pub(super) fn pass_through(&mut self, key: &'static str, hook: NativeFn) {
        self.insert(key, CallPolicy::PassThrough, Some(hook), None);
    }

    pub(super) fn search_checked(&mut self, key: &'static str, call: NativeFn) {
        self.insert(key, CallPolicy::SearchChecked, Some(call), None);
    }

    pub(super) fn constructor(
        &mut self,
        key: &'static str,
        call: Option<NativeFn>,
        construct: NativeFn,
    ) {
        self.insert(key, CallPolicy::Allowed, call, Some(construct));
    }

    pub(super) fn deny(&mut self, keys: &[&'static str]) {
        for &key in keys {
            self.insert(key, CallPolicy::Denied, None, None);
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

static REGISTRY: LazyLock<HashMap<&'static str, Builtin>> = LazyLock::new(|| {
    let mut registry = Registry::default();
    array::register(&mut registry);
    collections::register(&mut registry);
    global::register(&mut registry);
    numeric::register(&mut registry);
    object::register(&mut registry);
    regexp::register(&mut registry);
    string::register(&mut registry);

    for &name in BUILTIN {
        let is_object = global_data_value(name).is_some()
            || matches!(name, "globalThis" | "Atomics" | "Intl");
        if !is_object && !registry.contains(name) {
            registry.deny(&[name]);
        }
    }
    registry.entries
});

pub(crate) fn lookup(key: &str) -> Option<&'static Builtin> {
    REGISTRY.get(key)
}

/// Globals whose value is not a function.
fn global_data_value(name: &str) -> Option<Value> {
    match name {
        "undefined" => Some(Value::Undefined),
        "NaN" => Some(Value::Number(f64::NAN)),
        "Infinity" => Some(Value::Number(f64::INFINITY)),
        "Math" => Some(Value::Namespace(Namespace::Math)),
        "JSON" => Some(Value::Namespace(Namespace::Json)),
        "Reflect" => Some(Value::Namespace(Namespace::Reflect)),
        _ => None,
    }
}

/// Globals static evaluation may read.
pub(crate) const EVALUABLE_GLOBALS: &[&str] = &[
    "Array",
    "ArrayBuffer",
    "BigInt",
    "BigInt64Array",
    "BigUint64Array",
    "Boolean",
    "DataView",
    "Date",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "escape",
    "Float32Array",
    "Float64Array",
    "Function",
    "Infinity",
    "Int16Array",
    "Int32Array",
    "Int8Array",
    "isFinite",
    "isNaN",
    "isPrototypeOf",
    "JSON",
    "Map",
    "Math",
    "NaN",
    "Number",
    "Object",
    "parseFloat",
    "parseInt",
    "Promise",
    "Proxy",
    "Reflect",
    "RegExp",
    "Set",
    "String",
    "Symbol",
    "Uint16Array",
    "Uint32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "undefined",
    "unescape",
    "WeakMap",
    "WeakSet",
];

/// Value of an evaluable global.
pub(crate) fn global_value(name: &str) -> Option<Value> {
    if !EVALUABLE_GLOBALS.contains(&name) {
        return None;
    }
    if name == "isPrototypeOf" {
        return lookup("Object.prototype.isPrototypeOf").map(Value::Function);
    }
    global_data_value(name).or_else(|| lookup(name).map(Value::Function))
}

/// Invokes `callee` if its policy permits.
pub(crate) fn call(callee: &Value, this: &Value, args: &[Value]) -> EvalResult<Value> {
    let Value::Function(builtin) = callee else {
        return type_error(format!("{} is not a function", callee.type_of()));
    };
    match builtin.policy {
        CallPolicy::PassThrough => {
            if let Some(hook) = builtin.call {
                hook(this, args)?;
            }
            Ok(arg(args, 0))
        }
        CallPolicy::Allowed | CallPolicy::SearchChecked => match builtin.call {
            Some(native) => native(this, args),
            None => type_error(format!("Constructor {} requires 'new'", builtin.name)),
        },
        CallPolicy::Denied => {
            debug!(builtin = builtin.key, policy = ?builtin.policy, "call rejected");
            Err(EvalError::DangerousCall(builtin.key.to_string()))
        }
    }
}

/// `new callee(...args)` for constructible built-ins.
pub(crate) fn construct(callee: &Value, args: &[Value]) -> EvalResult<Value> {
    let Value::Function(builtin) = callee else {
        return type_error(format!("{} is not a constructor", callee.type_of()));
    };
    match builtin.construct {
        Some(native) if builtin.policy != CallPolicy::Denied => native(&Value::Undefined, args),
        _ => {
            debug!(builtin = builtin.key, policy = ?builtin.policy, "construct rejected");
            Err(EvalError::DangerousCall(builtin.key.to_string()))
        }
    }
}

pub(super) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

pub(super) fn require_callable(value: &Value) -> EvalResult<()> {
    match value {
        Value::Function(_) => Ok(()),
        _ => type_error(format!("{} is not a function", value.type_of())),
    }
}

/// Resolves a possibly negative relative index against `len`.
pub(super) fn relative_index(value: &Value, len: usize, default: usize) -> EvalResult<usize> {
    if matches!(value, Value::Undefined) {
        return Ok(default);
    }
    let n = to_integer_or_infinity(to_number(value)?);
    let len = len as f64;
    let index = if n < 0.0 { (len + n).max(0.0) } else { n.min(len) };
    Ok(index as usize)
}

/// `ToIntegerOrInfinity` clamped into `0..=len`.
pub(super) fn clamped_index(value: &Value, len: usize, default: usize) -> EvalResult<usize> {
    if matches!(value, Value::Undefined) {
        return Ok(default);
    }
    let n = to_integer_or_infinity(to_number(value)?);
    Ok(n.clamp(0.0, len as f64) as usize)
}

/// `ToLength`.
pub(super) fn to_length(value: &Value) -> EvalResult<f64> {
    let n = to_integer_or_infinity(to_number(value)?);
    Ok(n.clamp(0.0, 9_007_199_254_740_991.0))
}

/// Values produced by iterating `value` with the iterator protocol.
pub(crate) fn iterate(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::Array(array) => Ok(array
            .elements
            .iter()
            .map(|e| e.clone().unwrap_or(Value::Undefined))
            .collect()),
        Value::String(s) => Ok(s.code_points().into_iter().map(Value::String).collect()),
        Value::Set(set) => Ok(set.values.clone()),
        Value::Map(map) => Ok(map
            .entries
            .iter()
            .map(|(k, v)| Value::array(vec![k.clone(), v.clone()]))
            .collect()),
        Value::Iterator(iterator) => Ok(iterator.take()),
        Value::Object(object) if object.get(&well_known("iterator")).is_some() => {
            unsupported("user-defined iterator")
        }
        _ => type_error(format!("{} is not iterable", value.type_of())),
    }
}

/// Own enumerable properties, as `Object.assign` and spread copy them.
pub(crate) fn own_enumerable_entries(value: &Value) -> EvalResult<Vec<(PropertyKey, Value)>> {
    let entries = match value {
        Value::Undefined | Value::Null => Vec::new(),
        Value::String(s) => (0..s.len())
            .map(|i| {
                let key = PropertyKey::String(JsString::from(i.to_string()));
                (key, Value::String(s.slice(i, i + 1)))
            })
            .collect(),
        Value::Array(array) => {
            let mut entries: Vec<(PropertyKey, Value)> = array
                .elements
                .iter()
                .enumerate()
                .filter_map(|(i, e)| {
                    let key = PropertyKey::String(JsString::from(i.to_string()));
                    e.clone().map(|v| (key, v))
                })
                .collect();
            entries.extend(
                array
                    .properties
                    .iter()
                    .map(|(k, v)| (PropertyKey::String(k.clone()), v.clone())),
            );
            entries
        }
        Value::Object(object) => object.entries(),
        _ => Vec::new(),
    };
    Ok(entries)
}

pub(super) fn well_known(name: &'static str) -> PropertyKey {
    PropertyKey::Symbol(Symbol::WellKnown(name))
}

fn builtin_value(key: &str) -> EvalResult<Value> {
    match lookup(key) {
        Some(builtin) => Ok(Value::Function(builtin)),
        None => unsupported(format!("unknown built-in {key}")),
    }
}

/// `object[key]`, refusing getters outside the allowed set.
pub(crate) fn get_property(object: &Value, key: &PropertyKey) -> EvalResult<Value> {
    let name = key.as_string().map(JsString::to_rust_lossy);
    let name = name.as_deref();
    if name == Some("__proto__") {
        return unsupported("__proto__ accessor");
    }

    match object {
        Value::Undefined => type_error("Cannot read properties of undefined"),
        Value::Null => type_error("Cannot read properties of null"),
        Value::String(s) => {
            if name == Some("length") {
                return Ok(Value::Number(s.len() as f64));
            }
            if let Some(index) = key.array_index() {
                let index = index as usize;
                return Ok(if index < s.len() {
                    Value::String(s.slice(index, index + 1))
                } else {
                    Value::Undefined
                });
            }
            prototype_member("String", key)
        }
        Value::Number(_) => prototype_member("Number", key),
        Value::Bool(_) => prototype_member("Boolean", key),
        Value::BigInt(_) => prototype_member("BigInt", key),
        Value::Symbol(_) => {
            if name == Some("description") {
                return unsupported("Symbol.prototype.description getter");
            }
            prototype_member("Symbol", key)
        }
        Value::Array(array) => {
            if let Some(index) = key.array_index() {
                return Ok(array
                    .elements
                    .get(index as usize)
                    .cloned()
                    .flatten()
                    .unwrap_or(Value::Undefined));
            }
            if name == Some("length") {
                return Ok(Value::Number(array.elements.len() as f64));
            }
            if let Some(value) = key.as_string().and_then(|k| array.properties.get(k)) {
                return Ok(value.clone());
            }
            prototype_member("Array", key)
        }
        Value::Object(o) => match o.get(key) {
            Some(value) => Ok(value.clone()),
            None => prototype_member("Object", key),
        },
        Value::RegExp(r) => regexp::property(r, key),
        Value::Map(map) => match name {
            Some("size") => Ok(Value::Number(map.entries.len() as f64)),
            _ => prototype_member("Map", key),
        },
        Value::Set(set) => match name {
            Some("size") => Ok(Value::Number(set.values.len() as f64)),
            _ => prototype_member("Set", key),
        },
        Value::Iterator(_) => unsupported("iterator protocol"),
        Value::Function(builtin) => function_member(builtin, key),
        Value::Namespace(namespace) => namespace_member(*namespace, key),
    }
}

/// Alternative names that are the same function object.
fn canonical_member<'n>(owner: &str, name: &'n str) -> &'n str {
    match (owner, name) {
        ("String", "trimLeft") => "trimStart",
        ("String", "trimRight") => "trimEnd",
        ("Set", "keys") => "values",
        _ => name,
    }
}

fn prototype_member(owner: &'static str, key: &PropertyKey) -> EvalResult<Value> {
    let name = match key {
        PropertyKey::String(s) => s.to_rust_lossy(),
        PropertyKey::Symbol(symbol) => return prototype_symbol_member(owner, symbol),
    };
    if name == "constructor" {
        return builtin_value(owner);
    }
    let canonical = canonical_member(owner, &name);
    if let Some(builtin) = lookup(&format!("{owner}.prototype.{canonical}")) {
        return Ok(Value::Function(builtin));
    }
    if owner != "Object" {
        return prototype_member("Object", key);
    }
    Ok(Value::Undefined)
}

fn prototype_symbol_member(owner: &'static str, symbol: &Symbol) -> EvalResult<Value> {
    let Symbol::WellKnown(name) = symbol else {
        return Ok(Value::Undefined);
    };
    match (owner, *name) {
        ("Array", "iterator") | ("Set", "iterator") => {
            builtin_value(&format!("{owner}.prototype.values"))
        }
        ("Map", "iterator") => builtin_value("Map.prototype.entries"),
        ("String", "iterator") => builtin_value("String.prototype[Symbol.iterator]"),
        ("Map" | "Set" | "Symbol" | "BigInt", "toStringTag") => Ok(Value::from(owner)),
        ("Symbol", "toPrimitive") => builtin_value("Symbol.prototype[Symbol.toPrimitive]"),
        ("Array", "unscopables") => unsupported("Array.prototype[Symbol.unscopables]"),
        (
            "RegExp",
            "match" | "matchAll" | "replace" | "search" | "split",
        ) => unsupported("RegExp protocol method"),
        _ => Ok(Value::Undefined),
    }
}

/// Constructors and namespaces whose complete static surface is registered.
const STATIC_TABLES: &[&str] = &[
    "Object", "Array", "Number", "String", "Symbol", "RegExp", "Promise", "Boolean", "BigInt",
    "Map", "Set",
];

const REGEXP_LEGACY_STATICS: &[&str] = &[
    "$1", "$2", "$3", "$4", "$5", "$6", "$7", "$8", "$9", "input", "$_", "lastMatch", "$&",
    "lastParen", "$+", "leftContext", "$`", "rightContext", "$'",
];

fn function_member(builtin: &'static Builtin, key: &PropertyKey) -> EvalResult<Value> {
    let name = match key {
        PropertyKey::String(s) => s.to_rust_lossy(),
        PropertyKey::Symbol(Symbol::WellKnown("species")) => {
            return unsupported("Symbol.species getter");
        }
        PropertyKey::Symbol(Symbol::WellKnown("hasInstance")) => {
            return builtin_value("Function.prototype[Symbol.hasInstance]");
        }
        PropertyKey::Symbol(_) => return Ok(Value::Undefined),
    };
    let owner = builtin.key;

    match name.as_str() {
        "name" => return Ok(Value::from(builtin.name)),
        "length" | "prototype" | "caller" | "arguments" => {
            return unsupported(format!("{owner}.{name}"));
        }
        "constructor" => return builtin_value("Function"),
        _ => {}
    }
    if owner == "RegExp" && REGEXP_LEGACY_STATICS.contains(&name.as_str()) {
        return unsupported("legacy RegExp static accessor");
    }

    let is_method = owner.contains('.') || owner.contains('[');
    if !is_method {
        if let Some(constant) = static_constant(owner, &name) {
            return Ok(constant);
        }
        let static_key = match (owner, name.as_str()) {
            ("Number", "parseFloat") => "parseFloat".to_string(),
            ("Number", "parseInt") => "parseInt".to_string(),
            _ => format!("{owner}.{name}"),
        };
        if let Some(member) = lookup(&static_key) {
            return Ok(Value::Function(member));
        }
    }
    if let Some(member) = lookup(&format!("Function.prototype.{name}")) {
        return Ok(Value::Function(member));
    }

    let starts_lowercase = owner.starts_with(|c: char| c.is_ascii_lowercase());
    if is_method || starts_lowercase || STATIC_TABLES.contains(&owner) {
        Ok(Value::Undefined)
    } else {
        unsupported(format!("static member {owner}.{name}"))
    }
}

fn static_constant(owner: &str, name: &str) -> Option<Value> {
    let number = match (owner, name) {
        ("Number", "EPSILON") => f64::EPSILON,
        ("Number", "MAX_SAFE_INTEGER") => 9_007_199_254_740_991.0,
        ("Number", "MIN_SAFE_INTEGER") => -9_007_199_254_740_991.0,
        ("Number", "MAX_VALUE") => f64::MAX,
        ("Number", "MIN_VALUE") => f64::from_bits(1),
        ("Number", "NaN") => f64::NAN,
        ("Number", "NEGATIVE_INFINITY") => f64::NEG_INFINITY,
        ("Number", "POSITIVE_INFINITY") => f64::INFINITY,
        ("Math", "E") => std::f64::consts::E,
        ("Math", "LN10") => std::f64::consts::LN_10,
        ("Math", "LN2") => std::f64::consts::LN_2,
        ("Math", "LOG10E") => std::f64::consts::LOG10_E,
        ("Math", "LOG2E") => std::f64::consts::LOG2_E,
        ("Math", "PI") => std::f64::consts::PI,
        ("Math", "SQRT1_2") => std::f64::consts::FRAC_1_SQRT_2,
        ("Math", "SQRT2") => std::f64::consts::SQRT_2,
        ("Symbol", _) => return well_known_symbol(name).map(Value::Symbol),
        _ => return None,
    };
    Some(Value::Number(number))
}

fn well_known_symbol(name: &str) -> Option<Symbol> {
    const NAMES: &[&str] = &[
        "asyncIterator",
        "hasInstance",
        "isConcatSpreadable",
        "iterator",
        "match",
        "matchAll",
        "replace",
        "search",
        "species",
        "split",
        "toPrimitive",
        "toStringTag",
        "unscopables",
    ];
    NAMES
        .iter()
        .find(|&&n| n == name)
        .map(|&n| Symbol::WellKnown(n))
}

fn namespace_member(namespace: Namespace, key: &PropertyKey) -> EvalResult<Value> {
    let owner = namespace.name();
    let name = match key {
        PropertyKey::String(s) => s.to_rust_lossy(),
        PropertyKey::Symbol(Symbol::WellKnown("toStringTag")) => return Ok(Value::from(owner)),
        PropertyKey::Symbol(_) => return Ok(Value::Undefined),
    };
    if let Some(constant) = static_constant(owner, &name) {
        return Ok(constant);
    }
    if let Some(member) = lookup(&format!("{owner}.{name}")) {
        return Ok(Value::Function(member));
    }
    prototype_member("Object", key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get(object: &Value, name: &str) -> EvalResult<Value> {
        get_property(object, &PropertyKey::from(name))
    }

    #[test]
    fn registry_knows_denied_builtins() {
        let push = lookup("Array.prototype.push").unwrap();
        assert_eq!(push.policy(), CallPolicy::Denied);
        assert_eq!(push.name(), "push");
        assert!(lookup("Date").is_some());
        assert!(lookup("Math.random").is_some());
    }

    #[test]
    fn aliases_share_identity() {
        let s = Value::from("x");
        let left = get(&s, "trimLeft").unwrap();
        let start = get(&s, "trimStart").unwrap();
        assert!(strict_equals(&left, &start));

        let number = global_value("Number").unwrap();
        let parse = get(&number, "parseInt").unwrap();
        assert!(strict_equals(&parse, &global_value("parseInt").unwrap()));
    }

    #[test]
    fn denied_calls_are_rejected() {
        let random = get(&global_value("Math").unwrap(), "random").unwrap();
        assert!(matches!(
            call(&random, &Value::Undefined, &[]),
            Err(EvalError::DangerousCall(_))
        ));
    }

    #[test]
    fn getters_outside_the_allowed_set_abort() {
        let symbol = Value::Symbol(Symbol::WellKnown("iterator"));
        assert!(get(&symbol, "description").is_err());
        let regexp = global_value("RegExp").unwrap();
        assert!(get(&regexp, "$1").is_err());
        assert!(get(&Value::object(Vec::<(&str, Value)>::new()), "__proto__").is_err());
    }

    #[test]
    fn unknown_members_read_as_undefined() {
        let math = global_value("Math").unwrap();
        assert_eq!(get(&math, "nope").unwrap(), Value::Undefined);
        assert_eq!(get(&Value::from("abc"), "length").unwrap(), Value::Number(3.0));
        assert_eq!(get(&Value::from("abc"), "5").unwrap(), Value::Undefined);
        assert!(get(&global_value("Date").unwrap(), "now").is_err());
    }

    #[test]
    fn non_evaluable_globals_are_hidden() {
        assert!(global_value("globalThis").is_none());
        assert!(global_value("window").is_none());
        assert!(global_value("Error").is_none());
        assert_eq!(global_value("undefined"), Some(Value::Undefined));
    }
}
