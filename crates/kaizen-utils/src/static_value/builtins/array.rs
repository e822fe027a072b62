//! `Array` and `Array.prototype`.

use std::rc::Rc;

use super::*;

pub(super) fn register(r: &mut Registry) {
    r.allow("Array.isArray", is_array);
    r.allow("Array.of", of);

    r.allow("Array.prototype.at", at);
    r.allow("Array.prototype.concat", concat);
    r.allow("Array.prototype.entries", entries);
    r.allow("Array.prototype.every", every);
    r.allow("Array.prototype.filter", filter);
    r.allow("Array.prototype.find", find);
    r.allow("Array.prototype.findIndex", find_index);
    r.allow("Array.prototype.flat", flat);
    r.allow("Array.prototype.includes", includes);
    r.allow("Array.prototype.indexOf", index_of);
    r.allow("Array.prototype.join", join);
    r.allow("Array.prototype.keys", keys);
    r.allow("Array.prototype.lastIndexOf", last_index_of);
    r.allow("Array.prototype.slice", slice);
    r.allow("Array.prototype.some", some);
    r.allow("Array.prototype.toString", to_string);
    r.allow("Array.prototype.values", values);

    r.deny(&[
        "Array",
        "Array.from",
        "Array.fromAsync",
        "Array.prototype.copyWithin",
        "Array.prototype.fill",
        "Array.prototype.findLast",
        "Array.prototype.findLastIndex",
        "Array.prototype.flatMap",
        "Array.prototype.forEach",
        "Array.prototype.map",
        "Array.prototype.pop",
        "Array.prototype.push",
        "Array.prototype.reduce",
        "Array.prototype.reduceRight",
        "Array.prototype.reverse",
        "Array.prototype.shift",
        "Array.prototype.sort",
        "Array.prototype.splice",
        "Array.prototype.toLocaleString",
        "Array.prototype.toReversed",
        "Array.prototype.toSorted",
        "Array.prototype.toSpliced",
        "Array.prototype.unshift",
        "Array.prototype.with",
    ]);
}

fn this_array(this: &Value) -> EvalResult<&Rc<ArrayValue>> {
    match this {
        Value::Array(array) => Ok(array),
        Value::Undefined | Value::Null => {
            type_error("Array.prototype method called on null or undefined")
        }
        _ => unsupported("array method on an array-like receiver"),
    }
}

fn element(array: &ArrayValue, index: usize) -> Value {
    array
        .elements
        .get(index)
        .cloned()
        .flatten()
        .unwrap_or(Value::Undefined)
}

fn is_array(_: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))
}

fn of(_: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::array(args.to_vec()))
}

fn at(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let len = array.elements.len() as f64;
    let n = to_integer_or_infinity(to_number(&arg(args, 0))?);
    let k = if n >= 0.0 { n } else { len + n };
    if k < 0.0 || k >= len {
        return Ok(Value::Undefined);
    }
    Ok(element(array, k as usize))
}

fn concat(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let mut elements = array.elements.clone();
    for item in args {
        match item {
            Value::Array(other) => elements.extend(other.elements.iter().cloned()),
            Value::Object(object) if object.get(&well_known("isConcatSpreadable")).is_some() => {
                return unsupported("Symbol.isConcatSpreadable");
            }
            other => elements.push(Some(other.clone())),
        }
        if elements.len() > MAX_ARRAY_LENGTH {
            return unsupported("array too long");
        }
    }
    Ok(Value::array_with_holes(elements))
}

fn iterator(this: &Value, map: impl Fn(usize, Value) -> Value) -> EvalResult<Value> {
    let array = this_array(this)?;
    let items = (0..array.elements.len())
        .map(|i| map(i, element(array, i)))
        .collect();
    Ok(Value::Iterator(Rc::new(IteratorValue::new(
        IteratorKind::Array,
        items,
    ))))
}

fn entries(this: &Value, _: &[Value]) -> EvalResult<Value> {
    iterator(this, |i, v| Value::array(vec![Value::Number(i as f64), v]))
}

fn keys(this: &Value, _: &[Value]) -> EvalResult<Value> {
    iterator(this, |i, _| Value::Number(i as f64))
}

fn values(this: &Value, _: &[Value]) -> EvalResult<Value> {
    iterator(this, |_, v| v)
}

/// Calls `callback(element, index, array)` for each element; `visit`
/// returns `Some` to stop early.
fn each<T>(
    this: &Value,
    args: &[Value],
    skip_holes: bool,
    mut visit: impl FnMut(usize, &Value, bool) -> Option<T>,
) -> EvalResult<Option<T>> {
    let array = this_array(this)?;
    let callback = arg(args, 0);
    require_callable(&callback)?;
    let this_arg = arg(args, 1);

    for (i, slot) in array.elements.iter().enumerate() {
        if skip_holes && slot.is_none() {
            continue;
        }
        let value = slot.clone().unwrap_or(Value::Undefined);
        let result = call(
            &callback,
            &this_arg,
            &[value.clone(), Value::Number(i as f64), this.clone()],
        )?;
        if let Some(done) = visit(i, &value, to_boolean(&result)) {
            return Ok(Some(done));
        }
    }
    Ok(None)
}

fn every(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let failed = each(this, args, true, |_, _, ok| (!ok).then_some(()))?;
    Ok(Value::Bool(failed.is_none()))
}

fn some(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = each(this, args, true, |_, _, ok| ok.then_some(()))?;
    Ok(Value::Bool(found.is_some()))
}

fn filter(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut kept = Vec::new();
    each::<()>(this, args, true, |_, value, ok| {
        if ok {
            kept.push(value.clone());
        }
        None
    })?;
    Ok(Value::array(kept))
}

fn find(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = each(this, args, false, |_, value, ok| ok.then(|| value.clone()))?;
    Ok(found.unwrap_or(Value::Undefined))
}

fn find_index(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let found = each(this, args, false, |i, _, ok| ok.then_some(i))?;
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn flatten_into(out: &mut Vec<Option<Value>>, array: &ArrayValue, depth: f64) -> EvalResult<()> {
    for value in array.elements.iter().flatten() {
        match value {
            Value::Array(inner) if depth > 0.0 => flatten_into(out, inner, depth - 1.0)?,
            other => out.push(Some(other.clone())),
        }
        if out.len() > MAX_ARRAY_LENGTH {
            return unsupported("array too long");
        }
    }
    Ok(())
}

fn flat(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let depth = match arg(args, 0) {
        Value::Undefined => 1.0,
        other => to_integer_or_infinity(to_number(&other)?).max(0.0),
    };
    let mut out = Vec::new();
    flatten_into(&mut out, array, depth)?;
    Ok(Value::array_with_holes(out))
}

fn includes(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let search = arg(args, 0);
    let start = relative_index(&arg(args, 1), array.elements.len(), 0)?;
    let found = (start..array.elements.len()).any(|i| same_value_zero(&element(array, i), &search));
    Ok(Value::Bool(found))
}

fn index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let search = arg(args, 0);
    let start = relative_index(&arg(args, 1), array.elements.len(), 0)?;
    let found = array.elements[start..]
        .iter()
        .position(|slot| slot.as_ref().is_some_and(|v| strict_equals(v, &search)))
        .map(|i| i + start);
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn last_index_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let len = array.elements.len();
    if len == 0 {
        return Ok(Value::Number(-1.0));
    }
    let search = arg(args, 0);
    let from = if args.len() > 1 {
        to_integer_or_infinity(to_number(&args[1])?)
    } else {
        len as f64 - 1.0
    };
    let last = if from >= 0.0 {
        from.min(len as f64 - 1.0)
    } else {
        len as f64 + from
    };
    if last < 0.0 {
        return Ok(Value::Number(-1.0));
    }
    let found = array.elements[..=last as usize]
        .iter()
        .rposition(|slot| slot.as_ref().is_some_and(|v| strict_equals(v, &search)));
    Ok(Value::Number(found.map_or(-1.0, |i| i as f64)))
}

fn join(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let separator = match arg(args, 0) {
        Value::Undefined => JsString::from(","),
        other => to_js_string(&other)?,
    };
    array_join(array, &separator).map(Value::String)
}

fn slice(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let array = this_array(this)?;
    let len = array.elements.len();
    let start = relative_index(&arg(args, 0), len, 0)?;
    let end = relative_index(&arg(args, 1), len, len)?;
    let elements = if start < end {
        array.elements[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(Value::array_with_holes(elements))
}

fn to_string(this: &Value, _: &[Value]) -> EvalResult<Value> {
    join(this, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, this: &Value, args: &[Value]) -> EvalResult<Value> {
        let callee = get_property(this, &PropertyKey::from(name))?;
        call(&callee, this, args)
    }

    fn numbers(items: &[f64]) -> Value {
        Value::array(items.iter().map(|&n| Value::Number(n)).collect())
    }

    #[test]
    fn callbacks_run_through_the_sandbox() {
        let boolean = global_value("Boolean").unwrap();
        let array = numbers(&[0.0, 1.0, 2.0]);
        assert_eq!(method("filter", &array, &[boolean.clone()]).unwrap(), numbers(&[1.0, 2.0]));
        assert_eq!(method("every", &array, &[boolean.clone()]).unwrap(), Value::Bool(false));
        assert_eq!(method("findIndex", &array, &[boolean.clone()]).unwrap(), Value::Number(1.0));

        let push = get_property(&array, &PropertyKey::from("push")).unwrap();
        assert!(method("some", &array, &[push]).is_err());
    }

    #[test]
    fn searches_follow_equality_rules() {
        let array = numbers(&[1.0, f64::NAN, 1.0]);
        assert_eq!(
            method("includes", &array, &[Value::Number(f64::NAN)]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            method("indexOf", &array, &[Value::Number(f64::NAN)]).unwrap(),
            Value::Number(-1.0)
        );
        assert_eq!(
            method("lastIndexOf", &array, &[Value::Number(1.0)]).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            method("lastIndexOf", &array, &[Value::Number(1.0), Value::Number(-2.0)]).unwrap(),
            Value::Number(0.0)
        );
    }

    #[test]
    fn slicing_and_flattening() {
        let array = numbers(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(method("slice", &array, &[Value::Number(-2.0)]).unwrap(), numbers(&[3.0, 4.0]));
        let nested = Value::array(vec![
            Value::Number(1.0),
            Value::array(vec![Value::Number(2.0), numbers(&[3.0])]),
        ]);
        assert_eq!(
            method("flat", &nested, &[]).unwrap(),
            Value::array(vec![Value::Number(1.0), Value::Number(2.0), numbers(&[3.0])])
        );
        assert_eq!(
            method("flat", &nested, &[Value::Number(f64::INFINITY)]).unwrap(),
            numbers(&[1.0, 2.0, 3.0])
        );
    }

    #[test]
    fn join_skips_nullish_and_holes() {
        let array =
            Value::array_with_holes(vec![Some(Value::Null), None, Some(Value::Number(1.0))]);
        assert_eq!(method("join", &array, &[Value::from("-")]).unwrap(), Value::from("--1"));
        assert_eq!(method("toString", &numbers(&[1.0, 2.0]), &[]).unwrap(), Value::from("1,2"));
    }

    #[test]
    fn iterators_are_single_use() {
        let array = numbers(&[5.0, 6.0]);
        let keys = method("keys", &array, &[]).unwrap();
        assert_eq!(iterate(&keys).unwrap(), vec![Value::Number(0.0), Value::Number(1.0)]);
        assert!(iterate(&keys).unwrap().is_empty());
    }
}
