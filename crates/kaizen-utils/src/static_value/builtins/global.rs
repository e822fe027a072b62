//! Global functions, `Symbol`, and the `JSON`, `Reflect` and `Promise`
//! surfaces.

use super::string::push_code_point;
use super::*;
use crate::static_value::number::{parse_float, parse_int};

pub(super) fn register(r: &mut Registry) {
    r.allow("parseInt", global_parse_int);
    r.allow("parseFloat", global_parse_float);
    r.allow("isFinite", is_finite);
    r.allow("isNaN", is_nan);
    r.allow("decodeURI", decode_uri);
    r.allow("decodeURIComponent", decode_uri_component);
    r.allow("encodeURI", encode_uri);
    r.allow("encodeURIComponent", encode_uri_component);
    r.allow("escape", escape);
    r.allow("unescape", unescape);

    r.allow("Symbol.for", symbol_for);
    r.allow("Symbol.keyFor", symbol_key_for);

    r.deny(&[
        "Symbol",
        "Symbol.prototype.toString",
        "Symbol.prototype.valueOf",
        "Symbol.prototype[Symbol.toPrimitive]",
        "JSON.isRawJSON",
        "JSON.parse",
        "JSON.rawJSON",
        "JSON.stringify",
        "Reflect.apply",
        "Reflect.construct",
        "Reflect.defineProperty",
        "Reflect.deleteProperty",
        "Reflect.get",
        "Reflect.getOwnPropertyDescriptor",
        "Reflect.getPrototypeOf",
        "Reflect.has",
        "Reflect.isExtensible",
        "Reflect.ownKeys",
        "Reflect.preventExtensions",
        "Reflect.set",
        "Reflect.setPrototypeOf",
        "Promise",
        "Promise.all",
        "Promise.allSettled",
        "Promise.any",
        "Promise.race",
        "Promise.reject",
        "Promise.resolve",
        "Promise.try",
        "Promise.withResolvers",
        "Promise.prototype.catch",
        "Promise.prototype.finally",
        "Promise.prototype.then",
    ]);
}

fn global_parse_int(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = to_js_string(&arg(args, 0))?.to_rust_lossy();
    let radix = to_int32(to_number(&arg(args, 1))?);
    match parse_int(&text, radix) {
        Some(n) => Ok(Value::Number(n)),
        None => unsupported("parseInt precision"),
    }
}

fn global_parse_float(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let text = to_js_string(&arg(args, 0))?.to_rust_lossy();
    Ok(Value::Number(parse_float(&text)))
}

fn is_finite(_: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(to_number(&arg(args, 0))?.is_finite()))
}

fn is_nan(_: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(to_number(&arg(args, 0))?.is_nan()))
}

const URI_RESERVED: &str = ";/?:@&=+$,#";
const URI_MARK: &str = "-_.!~*'()";

fn uri_error<T>() -> EvalResult<T> {
    type_error("URI malformed")
}

fn push_percent(out: &mut Vec<u16>, byte: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push(u16::from(b'%'));
    out.push(u16::from(HEX[usize::from(byte >> 4)]));
    out.push(u16::from(HEX[usize::from(byte & 0xF)]));
}

fn encode(input: &JsString, extra_unescaped: &str) -> EvalResult<Value> {
    let units = input.units();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        let keep = char::from_u32(u32::from(unit)).is_some_and(|c| {
            c.is_ascii_alphanumeric() || URI_MARK.contains(c) || extra_unescaped.contains(c)
        });
        if keep {
            out.push(unit);
            i += 1;
            continue;
        }

        let code_point = if is_low_surrogate(unit) {
            return uri_error();
        } else if is_high_surrogate(unit) {
            match units.get(i + 1) {
                Some(&low) if is_low_surrogate(low) => {
                    i += 1;
                    0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
                }
                _ => return uri_error(),
            }
        } else {
            u32::from(unit)
        };
        i += 1;

        let Some(c) = char::from_u32(code_point) else {
            return uri_error();
        };
        let mut buffer = [0u8; 4];
        for byte in c.encode_utf8(&mut buffer).bytes() {
            push_percent(&mut out, byte);
        }
        check_string_length(out.len())?;
    }
    Ok(Value::String(JsString::from_units(out)))
}

fn hex_value(unit: u16) -> Option<u8> {
    char::from_u32(u32::from(unit))
        .and_then(|c| c.to_digit(16))
        .map(|d| d as u8)
}

fn percent_byte(units: &[u16], at: usize) -> Option<u8> {
    if units.get(at) != Some(&u16::from(b'%')) {
        return None;
    }
    let high = hex_value(*units.get(at + 1)?)?;
    let low = hex_value(*units.get(at + 2)?)?;
    Some(high << 4 | low)
}

fn decode(input: &JsString, preserve: &str) -> EvalResult<Value> {
    let units = input.units();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        if units[i] != u16::from(b'%') {
            out.push(units[i]);
            i += 1;
            continue;
        }
        let Some(first) = percent_byte(units, i) else {
            return uri_error();
        };
        if first < 0x80 {
            if preserve.contains(char::from(first)) {
                out.extend_from_slice(&units[i..i + 3]);
            } else {
                out.push(u16::from(first));
            }
            i += 3;
            continue;
        }

        let width = match first {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => return uri_error(),
        };
        let mut bytes = vec![first];
        for k in 1..width {
            match percent_byte(units, i + 3 * k) {
                Some(byte) if byte & 0xC0 == 0x80 => bytes.push(byte),
                _ => return uri_error(),
            }
        }
        let Some(c) = std::str::from_utf8(&bytes).ok().and_then(|s| s.chars().next()) else {
            return uri_error();
        };
        push_code_point(&mut out, u32::from(c));
        i += 3 * width;
    }
    Ok(Value::String(JsString::from_units(out)))
}

fn encode_uri(_: &Value, args: &[Value]) -> EvalResult<Value> {
    encode(&to_js_string(&arg(args, 0))?, URI_RESERVED)
}

fn encode_uri_component(_: &Value, args: &[Value]) -> EvalResult<Value> {
    encode(&to_js_string(&arg(args, 0))?, "")
}

fn decode_uri(_: &Value, args: &[Value]) -> EvalResult<Value> {
    decode(&to_js_string(&arg(args, 0))?, URI_RESERVED)
}

fn decode_uri_component(_: &Value, args: &[Value]) -> EvalResult<Value> {
    decode(&to_js_string(&arg(args, 0))?, "")
}

fn escape(_: &Value, args: &[Value]) -> EvalResult<Value> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let input = to_js_string(&arg(args, 0))?;
    let mut out = Vec::with_capacity(input.len());
    for &unit in input.units() {
        let keep = char::from_u32(u32::from(unit))
            .is_some_and(|c| c.is_ascii_alphanumeric() || "@*_+-./".contains(c));
        if keep {
            out.push(unit);
        } else if unit < 256 {
            push_percent(&mut out, unit as u8);
        } else {
            out.push(u16::from(b'%'));
            out.push(u16::from(b'u'));
            for shift in [12, 8, 4, 0] {
                out.push(u16::from(HEX[usize::from((unit >> shift) & 0xF)]));
            }
        }
        check_string_length(out.len())?;
    }
    Ok(Value::String(JsString::from_units(out)))
}

fn unescape(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let input = to_js_string(&arg(args, 0))?;
    let units = input.units();
    let mut out = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if unit == u16::from(b'%') {
            if units.get(i + 1) == Some(&u16::from(b'u')) {
                let digits: Option<Vec<u8>> = units
                    .get(i + 2..i + 6)
                    .and_then(|hex| hex.iter().map(|&u| hex_value(u)).collect());
                if let Some(digits) = digits {
                    let value = digits.iter().fold(0u16, |acc, &d| acc << 4 | u16::from(d));
                    out.push(value);
                    i += 6;
                    continue;
                }
            } else if let Some(byte) = percent_byte(units, i) {
                out.push(u16::from(byte));
                i += 3;
                continue;
            }
        }
        out.push(unit);
        i += 1;
    }
    Ok(Value::String(JsString::from_units(out)))
}

fn symbol_for(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let key = to_js_string(&arg(args, 0))?;
    Ok(Value::Symbol(Symbol::Registered(key)))
}

fn symbol_key_for(_: &Value, args: &[Value]) -> EvalResult<Value> {
    match arg(args, 0) {
        Value::Symbol(Symbol::Registered(key)) => Ok(Value::String(key)),
        Value::Symbol(_) => Ok(Value::Undefined),
        other => type_error(format!("{} is not a symbol", other.type_of())),
    }
}
