//! `String` and `String.prototype`.

use super::*;
use crate::static_value::number::{is_js_whitespace, number_to_string};

pub(super) fn register(r: &mut Registry) {
    r.allow("String", string);
    r.allow("String.fromCharCode", from_char_code);
    r.allow("String.fromCodePoint", from_code_point);
    r.allow("String.raw", raw);

    r.allow("String.prototype.at", at);
    r.allow("String.prototype.charAt", char_at);
    r.allow("String.prototype.charCodeAt", char_code_at);
    r.allow("String.prototype.codePointAt", code_point_at);
    r.allow("String.prototype.concat", concat);
    r.allow("String.prototype.endsWith", ends_with);
    r.allow("String.prototype.includes", includes);
    r.allow("String.prototype.indexOf", index_of);
    r.allow("String.prototype.lastIndexOf", last_index_of);
    r.allow("String.prototype.normalize", normalize);
    r.allow("String.prototype.padEnd", pad_end);
    r.allow("String.prototype.padStart", pad_start);
    r.allow("String.prototype.slice", slice);
    r.allow("String.prototype.startsWith", starts_with);
    r.allow("String.prototype.substr", substr);
    r.allow("String.prototype.substring", substring);
    r.allow("String.prototype.toLowerCase", to_lower_case);
    r.allow("String.prototype.toString", to_string);
    r.allow("String.prototype.toUpperCase", to_upper_case);
    r.allow("String.prototype.trim", trim);
    r.allow("String.prototype.trimEnd", trim_end);
    r.allow("String.prototype.trimStart", trim_start);

    r.deny(&[
        "String.prototype.anchor",
        "String.prototype.big",
        "String.prototype.blink",
        "String.prototype.bold",
        "String.prototype.fixed",
        "String.prototype.fontcolor",
        "String.prototype.fontsize",
        "String.prototype.isWellFormed",
        "String.prototype.italics",
        "String.prototype.link",
        "String.prototype.localeCompare",
        "String.prototype.repeat",
        "String.prototype.search",
        "String.prototype.small",
        "String.prototype.strike",
        "String.prototype.sub",
        "String.prototype.sup",
        "String.prototype.toLocaleLowerCase",
        "String.prototype.toLocaleUpperCase",
        "String.prototype.toWellFormed",
        "String.prototype.valueOf",
        "String.prototype[Symbol.iterator]",
    ]);
}

/// `RequireObjectCoercible(this)` followed by `ToString`.
pub(super) fn this_string(this: &Value) -> EvalResult<JsString> {
    if this.is_nullish() {
        return type_error("String.prototype method called on null or undefined");
    }
    to_js_string(this)
}

/// Search arguments of `includes`, `startsWith` and `endsWith` must not be
/// regular expressions.
fn search_string(value: &Value) -> EvalResult<JsString> {
    if matches!(value, Value::RegExp(_)) {
        return type_error("First argument must not be a regular expression");
    }
    to_js_string(value)
}

fn string(_: &Value, args: &[Value]) -> EvalResult<Value> {
    if args.is_empty() {
        return Ok(Value::String(JsString::empty()));
    }
    to_display_string(&args[0]).map(Value::String)
}

fn from_char_code(_: &Value, args: &[Value]) -> EvalResult<Value> {
    check_string_length(args.len())?;
    let units = args
        .iter()
        .map(|a| to_number(a).map(|n| to_uint32(n) as u16))
        .collect::<EvalResult<Vec<u16>>>()?;
    Ok(Value::String(JsString::from_units(units)))
}

pub(super) fn push_code_point(units: &mut Vec<u16>, code_point: u32) {
    if code_point < 0x10000 {
        units.push(code_point as u16);
    } else {
        let offset = code_point - 0x10000;
        units.push(0xD800 + (offset >> 10) as u16);
        units.push(0xDC00 + (offset & 0x3FF) as u16);
    }
}

fn from_code_point(_: &Value, args: &[Value]) -> EvalResult<Value> {
    check_string_length(args.len() * 2)?;
    let mut units = Vec::with_capacity(args.len());
    for arg in args {
        let n = to_number(arg)?;
        if n.fract() != 0.0 || !(0.0..=1_114_111.0).contains(&n) {
            return range_error(format!("Invalid code point {}", number_to_string(n)));
        }
        push_code_point(&mut units, n as u32);
    }
    Ok(Value::String(JsString::from_units(units)))
}

fn raw(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let template = arg(args, 0);
    if template.is_nullish() {
        return type_error("Cannot convert undefined or null to object");
    }
    let literal = get_property(&template, &PropertyKey::from("raw"))?;
    if literal.is_nullish() {
        return type_error("Cannot convert undefined or null to object");
    }
    let length = to_length(&get_property(&literal, &PropertyKey::from("length"))?)?;
    check_string_length(length as usize)?;

    let mut units = Vec::new();
    for i in 0..length as usize {
        let segment = get_property(&literal, &PropertyKey::from(i.to_string().as_str()))?;
        units.extend_from_slice(to_js_string(&segment)?.units());
        if i + 1 < length as usize && i + 1 < args.len() {
            units.extend_from_slice(to_js_string(&args[i + 1])?.units());
        }
        check_string_length(units.len())?;
    }
    Ok(Value::String(JsString::from_units(units)))
}

fn at(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let n = to_integer_or_infinity(to_number(&arg(args, 0))?);
    let len = s.len() as f64;
    let k = if n >= 0.0 { n } else { len + n };
    if k < 0.0 || k >= len {
        return Ok(Value::Undefined);
    }
    Ok(Value::String(s.slice(k as usize, k as usize + 1)))
}

fn position(s: &JsString, args: &[Value]) -> EvalResult<Option<usize>> {
    let n = to_integer_or_infinity(to_number(&arg(args, 0))?);
    Ok((n >= 0.0 && n < s.len() as f64).then_some(n as usize))
}

fn char_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    Ok(Value::String(match position(&s, args)? {
        Some(i) => s.slice(i, i + 1),
        None => JsString::empty(),
    }))
}

fn char_code_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    Ok(Value::Number(match position(&s, args)? {
        Some(i) => s.units()[i] as f64,
        None => f64::NAN,
    }))
}

fn code_point_at(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let Some(i) = position(&s, args)? else {
        return Ok(Value::Undefined);
    };
    let units = s.units();
    let first = units[i];
    if is_high_surrogate(first) {
        if let Some(&second) = units.get(i + 1).filter(|&&u| is_low_surrogate(u)) {
            let code_point =
                0x10000 + ((first as u32 - 0xD800) << 10) + (second as u32 - 0xDC00);
            return Ok(Value::Number(code_point as f64));
        }
    }
    Ok(Value::Number(first as f64))
}

fn concat(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut s = this_string(this)?;
    for arg in args {
        s = s.concat(&to_js_string(arg)?)?;
    }
    Ok(Value::String(s))
}

fn ends_with(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let search = search_string(&arg(args, 0))?;
    let end = clamped_index(&arg(args, 1), s.len(), s.len())?;
    Ok(Value::Bool(
        end >= search.len() && s.units()[end - search.len()..end] == *search.units(),
    ))
}

fn includes(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let search = search_string(&arg(args, 0))?;
    let start = clamped_index(&arg(args, 1), s.len(), 0)?;
    Ok(Value::Bool(s.index_of(&search, start).is_some()))
}

fn index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let search = to_js_string(&arg(args, 0))?;
    let start = clamped_index(&arg(args, 1), s.len(), 0)?;
    Ok(Value::Number(
        s.index_of(&search, start).map_or(-1.0, |i| i as f64),
    ))
}

fn last_index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let search = to_js_string(&arg(args, 0))?;
    let position = to_number(&arg(args, 1))?;
    let start = if position.is_nan() {
        s.len()
    } else {
        to_integer_or_infinity(position).clamp(0.0, s.len() as f64) as usize
    };
    Ok(Value::Number(
        s.last_index_of(&search, start).map_or(-1.0, |i| i as f64),
    ))
}

fn normalize(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let form = match arg(args, 0) {
        Value::Undefined => JsString::from("NFC"),
        other => to_js_string(&other)?,
    };
    if !["NFC", "NFD", "NFKC", "NFKD"].contains(&form.to_rust_lossy().as_str()) {
        return range_error("The normalization form should be one of NFC, NFD, NFKC, NFKD.");
    }
    if s.units().iter().all(|&u| u < 0x80) {
        return Ok(Value::String(s));
    }
    unsupported("Unicode normalization")
}

fn pad(this: &Value, args: &[Value], at_start: bool) -> EvalResult<Value> {
    let s = this_string(this)?;
    let max_length = to_length(&arg(args, 0))?;
    if max_length <= s.len() as f64 {
        return Ok(Value::String(s));
    }
    let filler = match arg(args, 1) {
        Value::Undefined => JsString::from(" "),
        other => to_js_string(&other)?,
    };
    if filler.is_empty() {
        return Ok(Value::String(s));
    }
    check_string_length(max_length as usize)?;

    let fill_len = max_length as usize - s.len();
    let padding: Vec<u16> = filler.units().iter().copied().cycle().take(fill_len).collect();
    let padding = JsString::from_units(padding);
    let result = if at_start {
        padding.concat(&s)?
    } else {
        s.concat(&padding)?
    };
    Ok(Value::String(result))
}

fn pad_end(this: &Value, args: &[Value]) -> EvalResult<Value> {
    pad(this, args, false)
}

fn pad_start(this: &Value, args: &[Value]) -> EvalResult<Value> {
    pad(this, args, true)
}

fn slice(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let from = relative_index(&arg(args, 0), s.len(), 0)?;
    let to = relative_index(&arg(args, 1), s.len(), s.len())?;
    Ok(Value::String(s.slice(from, to.max(from))))
}

fn starts_with(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let search = search_string(&arg(args, 0))?;
    let start = clamped_index(&arg(args, 1), s.len(), 0)?;
    Ok(Value::Bool(s.units()[start..].starts_with(search.units())))
}

fn substr(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let start = relative_index(&arg(args, 0), s.len(), 0)?;
    let length = match arg(args, 1) {
        Value::Undefined => s.len() - start,
        other => to_integer_or_infinity(to_number(&other)?).clamp(0.0, (s.len() - start) as f64)
            as usize,
    };
    Ok(Value::String(s.slice(start, start + length)))
}

fn substring(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let s = this_string(this)?;
    let start = clamped_index(&arg(args, 0), s.len(), 0)?;
    let end = clamped_index(&arg(args, 1), s.len(), s.len())?;
    Ok(Value::String(s.slice(start.min(end), start.max(end))))
}

fn map_case(this: &Value, upper: bool) -> EvalResult<Value> {
    let s = this_string(this)?;
    let Some(text) = s.to_rust() else {
        return unsupported("case mapping of lone surrogates");
    };
    let mapped = if upper {
        text.to_uppercase()
    } else {
        text.to_lowercase()
    };
    Ok(Value::from(mapped))
}

fn to_lower_case(this: &Value, _: &[Value]) -> EvalResult<Value> {
    map_case(this, false)
}

fn to_upper_case(this: &Value, _: &[Value]) -> EvalResult<Value> {
    map_case(this, true)
}

fn to_string(this: &Value, _: &[Value]) -> EvalResult<Value> {
    match this {
        Value::String(_) => Ok(this.clone()),
        _ => type_error("String.prototype.toString requires that 'this' be a String"),
    }
}

fn is_whitespace_unit(unit: &u16) -> bool {
    char::from_u32(*unit as u32).is_some_and(is_js_whitespace)
}

fn trim_units(this: &Value, start: bool, end: bool) -> EvalResult<Value> {
    let s = this_string(this)?;
    let units = s.units();
    let mut from = 0;
    let mut to = units.len();
    if start {
        while from < to && is_whitespace_unit(&units[from]) {
            from += 1;
        }
    }
    if end {
        while to > from && is_whitespace_unit(&units[to - 1]) {
            to -= 1;
        }
    }
    Ok(Value::String(s.slice(from, to)))
}

fn trim(this: &Value, _: &[Value]) -> EvalResult<Value> {
    trim_units(this, true, true)
}

fn trim_end(this: &Value, _: &[Value]) -> EvalResult<Value> {
    trim_units(this, false, true)
}

fn trim_start(this: &Value, _: &[Value]) -> EvalResult<Value> {
    trim_units(this, true, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, this: &str, args: &[Value]) -> EvalResult<Value> {
        let callee = get_property(&Value::from(this), &PropertyKey::from(name))?;
        call(&callee, &Value::from(this), args)
    }

    #[test]
    fn indexing_methods_use_code_units() {
        assert_eq!(method("charAt", "abc", &[Value::from(1.0)]).unwrap(), Value::from("b"));
        assert_eq!(method("at", "abc", &[Value::from(-1.0)]).unwrap(), Value::from("c"));
        assert_eq!(method("charCodeAt", "abc", &[Value::from(0.0)]).unwrap(), Value::from(97.0));
        assert_eq!(
            method("codePointAt", "😀", &[Value::from(0.0)]).unwrap(),
            Value::from(128512.0)
        );
        let code_unit = method("charCodeAt", "a", &[Value::from(3.0)]).unwrap();
        assert!(code_unit.as_number().unwrap().is_nan());
    }

    #[test]
    fn searching_and_slicing() {
        assert_eq!(
            method("indexOf", "abcabc", &[Value::from("c"), Value::from(3.0)]).unwrap(),
            Value::from(5.0)
        );
        assert_eq!(method("lastIndexOf", "abcabc", &[Value::from("a")]).unwrap(), Value::from(3.0));
        assert_eq!(method("slice", "hello", &[Value::from(-3.0)]).unwrap(), Value::from("llo"));
        assert_eq!(
            method("substring", "hello", &[Value::from(4.0), Value::from(1.0)]).unwrap(),
            Value::from("ell")
        );
        assert_eq!(
            method("substr", "hello", &[Value::from(1.0), Value::from(2.0)]).unwrap(),
            Value::from("el")
        );
        assert_eq!(
            method("endsWith", "hello", &[Value::from("ll"), Value::from(4.0)]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn padding_and_trimming() {
        assert_eq!(
            method("padStart", "5", &[Value::from(3.0), Value::from("0")]).unwrap(),
            Value::from("005")
        );
        assert_eq!(
            method("padEnd", "ab", &[Value::from(7.0), Value::from("xyz")]).unwrap(),
            Value::from("abxyzxy")
        );
        assert_eq!(method("trim", " \n a \u{3000}", &[]).unwrap(), Value::from("a"));
        assert_eq!(method("trimLeft", "  a ", &[]).unwrap(), Value::from("a "));
    }

    #[test]
    fn case_mapping() {
        assert_eq!(method("toUpperCase", "straße", &[]).unwrap(), Value::from("STRASSE"));
        assert_eq!(method("toLowerCase", "ABC", &[]).unwrap(), Value::from("abc"));
    }

    #[test]
    fn denied_methods_are_values_but_not_callable() {
        let repeat = get_property(&Value::from("a"), &PropertyKey::from("repeat")).unwrap();
        assert_eq!(repeat.type_of(), "function");
        assert!(call(&repeat, &Value::from("a"), &[Value::from(3.0)]).is_err());
    }

    #[test]
    fn static_constructors() {
        let string = global_value("String").unwrap();
        let from = get_property(&string, &PropertyKey::from("fromCharCode")).unwrap();
        assert_eq!(
            call(&from, &Value::Undefined, &[Value::from(104.0), Value::from(105.0)]).unwrap(),
            Value::from("hi")
        );
        let symbol = Value::Symbol(Symbol::Registered(JsString::from("k")));
        assert_eq!(call(&string, &Value::Undefined, &[symbol]).unwrap(), Value::from("Symbol(k)"));
    }
}
