//! `Number`, `Math`, `Boolean` and `BigInt`.

use super::*;
use crate::static_value::number::{
    number_to_radix_string, number_to_string, to_exponential, to_fixed, to_precision,
};
use crate::static_value::operators::js_pow;

pub(super) fn register(r: &mut Registry) {
    r.allow("Number", number);
    r.allow("Number.isFinite", number_is_finite);
    r.allow("Number.isNaN", number_is_nan);
    r.allow("Number.prototype.toExponential", to_exponential_method);
    r.allow("Number.prototype.toFixed", to_fixed_method);
    r.allow("Number.prototype.toPrecision", to_precision_method);
    r.allow("Number.prototype.toString", number_to_string_method);

    r.allow("Boolean", boolean);
    r.allow("BigInt", bigint);

    r.allow("Math.abs", math_abs);
    r.allow("Math.acos", math_acos);
    r.allow("Math.acosh", math_acosh);
    r.allow("Math.asin", math_asin);
    r.allow("Math.asinh", math_asinh);
    r.allow("Math.atan", math_atan);
    r.allow("Math.atanh", math_atanh);
    r.allow("Math.atan2", math_atan2);
    r.allow("Math.cbrt", math_cbrt);
    r.allow("Math.ceil", math_ceil);
    r.allow("Math.clz32", math_clz32);
    r.allow("Math.cos", math_cos);
    r.allow("Math.cosh", math_cosh);
    r.allow("Math.exp", math_exp);
    r.allow("Math.expm1", math_expm1);
    r.allow("Math.floor", math_floor);
    r.allow("Math.fround", math_fround);
    r.allow("Math.hypot", math_hypot);
    r.allow("Math.imul", math_imul);
    r.allow("Math.log", math_log);
    r.allow("Math.log10", math_log10);
    r.allow("Math.log1p", math_log1p);
    r.allow("Math.log2", math_log2);
    r.allow("Math.max", math_max);
    r.allow("Math.min", math_min);
    r.allow("Math.pow", math_pow);
    r.allow("Math.round", math_round);
    r.allow("Math.sign", math_sign);
    r.allow("Math.sin", math_sin);
    r.allow("Math.sinh", math_sinh);
    r.allow("Math.sqrt", math_sqrt);
    r.allow("Math.tan", math_tan);
    r.allow("Math.tanh", math_tanh);
    r.allow("Math.trunc", math_trunc);

    r.deny(&[
        "Number.isInteger",
        "Number.isSafeInteger",
        "Number.prototype.toLocaleString",
        "Number.prototype.valueOf",
        "Boolean.prototype.toString",
        "Boolean.prototype.valueOf",
        "BigInt.asIntN",
        "BigInt.asUintN",
        "BigInt.prototype.toLocaleString",
        "BigInt.prototype.toString",
        "BigInt.prototype.valueOf",
        "Math.f16round",
        "Math.random",
    ]);
}

fn number(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let Some(value) = args.first() else {
        return Ok(Value::Number(0.0));
    };
    match to_numeric(value)? {
        Numeric::Number(n) => Ok(Value::Number(n)),
        Numeric::BigInt(b) => Ok(Value::Number(b as f64)),
    }
}

fn number_is_finite(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let finite = matches!(arg(args, 0), Value::Number(n) if n.is_finite());
    Ok(Value::Bool(finite))
}

fn number_is_nan(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let nan = matches!(arg(args, 0), Value::Number(n) if n.is_nan());
    Ok(Value::Bool(nan))
}

fn this_number(this: &Value) -> EvalResult<f64> {
    match this {
        Value::Number(n) => Ok(*n),
        _ => type_error("Number.prototype method requires that 'this' be a Number"),
    }
}

/// Converts a digit-count argument and checks it against `range`.
fn digits_argument(
    value: &Value,
    range: std::ops::RangeInclusive<f64>,
    what: &str,
) -> EvalResult<u32> {
    let digits = to_integer_or_infinity(to_number(value)?);
    if !range.contains(&digits) {
        let (start, end) = (range.start(), range.end());
        return range_error(format!("{what} argument must be between {start} and {end}"));
    }
    Ok(digits as u32)
}

fn to_fixed_method(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let x = this_number(this)?;
    let digits = digits_argument(&arg(args, 0), 0.0..=100.0, "toFixed()")?;
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    Ok(Value::from(to_fixed(x, digits)))
}

fn to_exponential_method(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let x = this_number(this)?;
    let requested = arg(args, 0);
    let digits = to_integer_or_infinity(to_number(&requested)?);
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    if matches!(requested, Value::Undefined) {
        return Ok(Value::from(to_exponential(x, None)));
    }
    if !(0.0..=100.0).contains(&digits) {
        return range_error("toExponential() argument must be between 0 and 100");
    }
    Ok(Value::from(to_exponential(x, Some(digits as u32))))
}

fn to_precision_method(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let x = this_number(this)?;
    let requested = arg(args, 0);
    if matches!(requested, Value::Undefined) {
        return Ok(Value::from(number_to_string(x)));
    }
    let precision = to_integer_or_infinity(to_number(&requested)?);
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    if !(1.0..=100.0).contains(&precision) {
        return range_error("toPrecision() argument must be between 1 and 100");
    }
    Ok(Value::from(to_precision(x, precision as u32)))
}

fn number_to_string_method(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let x = this_number(this)?;
    let radix = match arg(args, 0) {
        Value::Undefined => 10,
        other => digits_argument(&other, 2.0..=36.0, "toString() radix")?,
    };
    match number_to_radix_string(x, radix) {
        Some(text) => Ok(Value::from(text)),
        None => unsupported("fractional radix conversion"),
    }
}

fn boolean(_: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(to_boolean(&arg(args, 0))))
}

fn bigint(_: &Value, args: &[Value]) -> EvalResult<Value> {
    match to_primitive(&arg(args, 0))? {
        Value::Number(n) => {
            if n.fract() != 0.0 || !n.is_finite() {
                return range_error(format!(
                    "The number {} cannot be converted to a BigInt because it is not an integer",
                    number_to_string(n)
                ));
            }
            if n.abs() >= 2f64.powi(127) {
                return unsupported("BigInt overflow");
            }
            Ok(Value::BigInt(n as i128))
        }
        Value::Bool(b) => Ok(Value::BigInt(i128::from(b))),
        Value::BigInt(b) => Ok(Value::BigInt(b)),
        Value::String(s) => match string_to_bigint(&s)? {
            Some(b) => Ok(Value::BigInt(b)),
            None => type_error(format!("Cannot convert {s} to a BigInt")),
        },
        other => type_error(format!("Cannot convert {} to a BigInt", other.type_of())),
    }
}

fn numbers(args: &[Value]) -> EvalResult<Vec<f64>> {
    args.iter().map(to_number).collect()
}

macro_rules! math_unary {
    ($($name:ident => $op:expr),* $(,)?) => {
        $(
            fn $name(_: &Value, args: &[Value]) -> EvalResult<Value> {
                let op: fn(f64) -> f64 = $op;
                Ok(Value::Number(op(to_number(&arg(args, 0))?)))
            }
        )*
    };
}

math_unary! {
    math_abs => f64::abs,
    math_acos => f64::acos,
    math_acosh => f64::acosh,
    math_asin => f64::asin,
    math_asinh => f64::asinh,
    math_atan => f64::atan,
    math_atanh => f64::atanh,
    math_cbrt => f64::cbrt,
    math_ceil => f64::ceil,
    math_clz32 => |x: f64| to_uint32(x).leading_zeros() as f64,
    math_cos => f64::cos,
    math_cosh => f64::cosh,
    math_exp => f64::exp,
    math_expm1 => f64::exp_m1,
    math_floor => f64::floor,
    math_fround => |x: f64| x as f32 as f64,
    math_log => f64::ln,
    math_log10 => f64::log10,
    math_log1p => f64::ln_1p,
    math_log2 => f64::log2,
    math_round => round,
    math_sign => sign,
    math_sin => f64::sin,
    math_sinh => f64::sinh,
    math_sqrt => f64::sqrt,
    math_tan => f64::tan,
    math_tanh => f64::tanh,
    math_trunc => f64::trunc,
}

/// Rounds half toward positive infinity, keeping `-0`.
fn round(x: f64) -> f64 {
    if !x.is_finite() || x == 0.0 {
        return x;
    }
    if x < 0.0 && x >= -0.5 {
        return -0.0;
    }
    let floor = x.floor();
    if x - floor >= 0.5 { floor + 1.0 } else { floor }
}

fn sign(x: f64) -> f64 {
    if x.is_nan() || x == 0.0 { x } else { x.signum() }
}

fn math_atan2(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let y = to_number(&arg(args, 0))?;
    let x = to_number(&arg(args, 1))?;
    Ok(Value::Number(y.atan2(x)))
}

fn math_pow(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let base = to_number(&arg(args, 0))?;
    let exponent = to_number(&arg(args, 1))?;
    Ok(Value::Number(js_pow(base, exponent)))
}

fn math_imul(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let a = to_int32(to_number(&arg(args, 0))?);
    let b = to_int32(to_number(&arg(args, 1))?);
    Ok(Value::Number(a.wrapping_mul(b) as f64))
}

fn math_hypot(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let values = numbers(args)?;
    if values.iter().any(|v| v.is_infinite()) {
        return Ok(Value::Number(f64::INFINITY));
    }
    if values.iter().any(|v| v.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(values.iter().fold(0.0, |acc, v| acc.hypot(*v))))
}

fn math_max(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let values = numbers(args)?;
    let mut best = f64::NEG_INFINITY;
    for v in values {
        if v.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if v > best || (v == 0.0 && best == 0.0 && best.is_sign_negative()) {
            best = v;
        }
    }
    Ok(Value::Number(best))
}

fn math_min(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let values = numbers(args)?;
    let mut best = f64::INFINITY;
    for v in values {
        if v.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if v < best || (v == 0.0 && best == 0.0 && v.is_sign_negative()) {
            best = v;
        }
    }
    Ok(Value::Number(best))
}
