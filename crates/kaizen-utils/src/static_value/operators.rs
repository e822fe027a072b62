//! Binary and unary operators over [`Value`]s.

use crate::ast::{BinaryOperator, UnaryOperator};

use super::value::*;

pub(crate) fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    use BinaryOperator::*;

    let result = match operator {
        Eq => Value::Bool(loose_equals(left, right)?),
        NotEq => Value::Bool(!loose_equals(left, right)?),
        StrictEq => Value::Bool(strict_equals(left, right)),
        StrictNotEq => Value::Bool(!strict_equals(left, right)),
        Lt => Value::Bool(less_than(left, right)? == Some(true)),
        Gt => Value::Bool(less_than(right, left)? == Some(true)),
        LtEq => Value::Bool(less_than(right, left)? == Some(false)),
        GtEq => Value::Bool(less_than(left, right)? == Some(false)),
        Add => add(left, right)?,
        In | InstanceOf => return unsupported("relational operator on objects"),
        _ => match (to_numeric(left)?, to_numeric(right)?) {
            (Numeric::Number(x), Numeric::Number(y)) => Value::Number(number_op(operator, x, y)),
            (Numeric::BigInt(x), Numeric::BigInt(y)) => Value::BigInt(bigint_op(operator, x, y)?),
            _ => return type_error("Cannot mix BigInt and other types, use explicit conversions"),
        },
    };
    Ok(result)
}

fn add(left: &Value, right: &Value) -> EvalResult<Value> {
    let lp = to_primitive(left)?;
    let rp = to_primitive(right)?;
    if matches!(lp, Value::String(_)) || matches!(rp, Value::String(_)) {
        let joined = to_js_string(&lp)?.concat(&to_js_string(&rp)?)?;
        return Ok(Value::String(joined));
    }
    match (to_numeric(&lp)?, to_numeric(&rp)?) {
        (Numeric::Number(x), Numeric::Number(y)) => Ok(Value::Number(x + y)),
        (Numeric::BigInt(x), Numeric::BigInt(y)) => match x.checked_add(y) {
            Some(sum) => Ok(Value::BigInt(sum)),
            None => unsupported("BigInt overflow"),
        },
        _ => type_error("Cannot mix BigInt and other types, use explicit conversions"),
    }
}

/// `Number::exponentiate`.
pub(crate) fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    if exponent == 0.0 {
        return 1.0;
    }
    if base.abs() == 1.0 && exponent.is_infinite() {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn number_op(operator: BinaryOperator, x: f64, y: f64) -> f64 {
    use BinaryOperator::*;

    match operator {
        Sub => x - y,
        Mul => x * y,
        Div => x / y,
        Rem => x % y,
        Exp => js_pow(x, y),
        Shl => to_int32(x).wrapping_shl(to_uint32(y) & 31) as f64,
        Shr => (to_int32(x) >> (to_uint32(y) & 31)) as f64,
        UShr => (to_uint32(x) >> (to_uint32(y) & 31)) as f64,
        BitAnd => (to_int32(x) & to_int32(y)) as f64,
        BitOr => (to_int32(x) | to_int32(y)) as f64,
        BitXor => (to_int32(x) ^ to_int32(y)) as f64,
        _ => f64::NAN,
    }
}

fn bigint_op(operator: BinaryOperator, x: i128, y: i128) -> EvalResult<i128> {
    use BinaryOperator::*;

    let result = match operator {
        Sub => x.checked_sub(y),
        Mul => x.checked_mul(y),
        Div | Rem if y == 0 => return range_error("Division by zero"),
        Div => x.checked_div(y),
        Rem => x.checked_rem(y),
        Exp => {
            if y < 0 {
                return range_error("Exponent must be non-negative");
            }
            u32::try_from(y).ok().and_then(|e| x.checked_pow(e))
        }
        Shl => shift_left(x, y),
        Shr => y.checked_neg().and_then(|y| shift_left(x, y)),
        UShr => return type_error("BigInts have no unsigned right shift, use >> instead"),
        BitAnd => Some(x & y),
        BitOr => Some(x | y),
        BitXor => Some(x ^ y),
        _ => None,
    };
    match result {
        Some(value) => Ok(value),
        None => unsupported("BigInt overflow"),
    }
}

fn shift_left(x: i128, shift: i128) -> Option<i128> {
    if shift < 0 {
        let amount = shift.unsigned_abs().min(127) as u32;
        return Some(x >> amount);
    }
    if x == 0 {
        return Some(0);
    }
    let amount = u32::try_from(shift).ok().filter(|&s| s < 127)?;
    let shifted = x << amount;
    (shifted >> amount == x).then_some(shifted)
}

pub(crate) fn unary(operator: UnaryOperator, value: &Value) -> EvalResult<Value> {
    let result = match operator {
        UnaryOperator::Minus => match to_numeric(value)? {
            Numeric::Number(n) => Value::Number(-n),
            Numeric::BigInt(b) => match b.checked_neg() {
                Some(negated) => Value::BigInt(negated),
                None => return unsupported("BigInt overflow"),
            },
        },
        UnaryOperator::Plus => Value::Number(to_number(value)?),
        UnaryOperator::Not => Value::Bool(!to_boolean(value)),
        UnaryOperator::BitNot => match to_numeric(value)? {
            Numeric::Number(n) => Value::Number(!to_int32(n) as f64),
            Numeric::BigInt(b) => Value::BigInt(!b),
        },
        UnaryOperator::Typeof => Value::from(value.type_of()),
        UnaryOperator::Void => Value::Undefined,
        UnaryOperator::Delete => return unsupported("delete"),
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn addition_concatenates_when_either_side_is_a_string() {
        assert_eq!(
            binary(BinaryOperator::Add, &num(1.0), &Value::from("1")).unwrap(),
            Value::from("11")
        );
        assert_eq!(
            binary(
                BinaryOperator::Add,
                &Value::array(vec![num(1.0), num(2.0)]),
                &num(3.0)
            )
            .unwrap(),
            Value::from("1,23")
        );
        assert_eq!(binary(BinaryOperator::Add, &Value::Null, &num(1.0)).unwrap(), num(1.0));
    }

    #[test]
    fn bitwise_operators_use_int32() {
        assert_eq!(binary(BinaryOperator::Shl, &num(1.0), &num(33.0)).unwrap(), num(2.0));
        assert_eq!(binary(BinaryOperator::UShr, &num(-1.0), &num(0.0)).unwrap(), num(4294967295.0));
        assert_eq!(binary(BinaryOperator::Shr, &num(-8.0), &num(1.0)).unwrap(), num(-4.0));
        assert_eq!(unary(UnaryOperator::BitNot, &num(5.0)).unwrap(), num(-6.0));
    }

    #[test]
    fn exponent_edge_cases() {
        assert!(js_pow(1.0, f64::INFINITY).is_nan());
        assert_eq!(js_pow(f64::NAN, 0.0), 1.0);
        assert_eq!(js_pow(2.0, 10.0), 1024.0);
    }

    #[test]
    fn bigint_arithmetic() {
        let big = |n| Value::BigInt(n);
        assert_eq!(binary(BinaryOperator::Div, &big(7), &big(2)).unwrap(), big(3));
        assert_eq!(binary(BinaryOperator::Rem, &big(-7), &big(2)).unwrap(), big(-1));
        assert_eq!(binary(BinaryOperator::Shr, &big(-5), &big(1)).unwrap(), big(-3));
        assert!(matches!(
            binary(BinaryOperator::Div, &big(1), &big(0)),
            Err(EvalError::RangeError(_))
        ));
        assert!(matches!(
            binary(BinaryOperator::Add, &big(1), &num(1.0)),
            Err(EvalError::TypeError(_))
        ));
        assert!(matches!(
            binary(BinaryOperator::UShr, &big(1), &big(1)),
            Err(EvalError::TypeError(_))
        ));
        assert_eq!(binary(BinaryOperator::Lt, &big(1), &num(2.0)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn comparisons_with_nan_are_false() {
        assert_eq!(
            binary(BinaryOperator::LtEq, &num(f64::NAN), &num(1.0)).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(binary(BinaryOperator::GtEq, &num(2.0), &num(1.0)).unwrap(), Value::Bool(true));
        assert_eq!(
            binary(BinaryOperator::Gt, &Value::from("b"), &Value::from("a")).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn typeof_reports_dynamic_type() {
        assert_eq!(unary(UnaryOperator::Typeof, &Value::Null).unwrap(), Value::from("object"));
        assert_eq!(unary(UnaryOperator::Typeof, &Value::BigInt(1)).unwrap(), Value::from("bigint"));
    }
}
