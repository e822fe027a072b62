//! `Map` and `Set`.
//!
//! Collections are read-only here: construction and lookups are modelled,
//! every mutator is denied.

use std::rc::Rc;

use super::*;

pub(super) fn register(r: &mut Registry) {
    r.constructor("Map", None, construct_map);
    r.allow("Map.prototype.entries", map_entries);
    r.allow("Map.prototype.get", map_get);
    r.allow("Map.prototype.has", map_has);
    r.allow("Map.prototype.keys", map_keys);
    r.allow("Map.prototype.values", map_values);

    r.constructor("Set", None, construct_set);
    r.allow("Set.prototype.entries", set_entries);
    r.allow("Set.prototype.has", set_has);
    r.allow("Set.prototype.values", set_values);

    r.deny(&[
        "Map.groupBy",
        "Map.prototype.clear",
        "Map.prototype.delete",
        "Map.prototype.forEach",
        "Map.prototype.set",
        "Set.prototype.add",
        "Set.prototype.clear",
        "Set.prototype.delete",
        "Set.prototype.difference",
        "Set.prototype.forEach",
        "Set.prototype.intersection",
        "Set.prototype.isDisjointFrom",
        "Set.prototype.isSubsetOf",
        "Set.prototype.isSupersetOf",
        "Set.prototype.symmetricDifference",
        "Set.prototype.union",
    ]);
}

/// Map keys and set members store `-0` as `+0`.
fn normalize_zero(value: Value) -> Value {
    match value {
        Value::Number(n) if n == 0.0 => Value::Number(0.0),
        other => other,
    }
}

fn construct_map(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut map = MapValue::default();
    let source = arg(args, 0);
    if !source.is_nullish() {
        for entry in iterate(&source)? {
            if entry.is_primitive() {
                return type_error("Iterator value is not an entry object");
            }
            let key = normalize_zero(get_property(&entry, &PropertyKey::from("0"))?);
            let value = get_property(&entry, &PropertyKey::from("1"))?;
            match map.entries.iter_mut().find(|(k, _)| same_value_zero(k, &key)) {
                Some(slot) => slot.1 = value,
                None => map.entries.push((key, value)),
            }
        }
    }
    Ok(Value::Map(Rc::new(map)))
}

fn construct_set(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let mut set = SetValue::default();
    let source = arg(args, 0);
    if !source.is_nullish() {
        for value in iterate(&source)? {
            let value = normalize_zero(value);
            if !set.has(&value) {
                set.values.push(value);
            }
        }
    }
    Ok(Value::Set(Rc::new(set)))
}

fn this_map(this: &Value) -> EvalResult<&MapValue> {
    match this {
        Value::Map(map) => Ok(&**map),
        _ => type_error("Method Map.prototype called on incompatible receiver"),
    }
}

fn this_set(this: &Value) -> EvalResult<&SetValue> {
    match this {
        Value::Set(set) => Ok(&**set),
        _ => type_error("Method Set.prototype called on incompatible receiver"),
    }
}

fn iterator(kind: IteratorKind, items: Vec<Value>) -> Value {
    Value::Iterator(Rc::new(IteratorValue::new(kind, items)))
}

fn map_entries(this: &Value, _: &[Value]) -> EvalResult<Value> {
    let map = this_map(this)?;
    let items = map
        .entries
        .iter()
        .map(|(k, v)| Value::array(vec![k.clone(), v.clone()]))
        .collect();
    Ok(iterator(IteratorKind::Map, items))
}

fn map_get(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let map = this_map(this)?;
    Ok(map.get(&arg(args, 0)).cloned().unwrap_or(Value::Undefined))
}

fn map_has(this: &Value, args: &[Value]) -> EvalResult<Value> {
    let map = this_map(this)?;
    Ok(Value::Bool(map.get(&arg(args, 0)).is_some()))
}

fn map_keys(this: &Value, _: &[Value]) -> EvalResult<Value> {
    let map = this_map(this)?;
    let items = map.entries.iter().map(|(k, _)| k.clone()).collect();
    Ok(iterator(IteratorKind::Map, items))
}

fn map_values(this: &Value, _: &[Value]) -> EvalResult<Value> {
    let map = this_map(this)?;
    let items = map.entries.iter().map(|(_, v)| v.clone()).collect();
    Ok(iterator(IteratorKind::Map, items))
}

fn set_entries(this: &Value, _: &[Value]) -> EvalResult<Value> {
    let set = this_set(this)?;
    let items = set
        .values
        .iter()
        .map(|v| Value::array(vec![v.clone(), v.clone()]))
        .collect();
    Ok(iterator(IteratorKind::Set, items))
}

fn set_has(this: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(this_set(this)?.has(&arg(args, 0))))
}

fn set_values(this: &Value, _: &[Value]) -> EvalResult<Value> {
    let set = this_set(this)?;
    Ok(iterator(IteratorKind::Set, set.values.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, this: &Value, args: &[Value]) -> EvalResult<Value> {
        let callee = get_property(this, &PropertyKey::from(name))?;
        call(&callee, this, args)
    }

    fn pair(key: &str, value: f64) -> Value {
        Value::array(vec![Value::from(key), Value::Number(value)])
    }

    #[test]
    fn map_construction_keeps_last_value_for_duplicate_keys() {
        let map_ctor = global_value("Map").unwrap();
        let source = Value::array(vec![pair("a", 1.0), pair("b", 2.0), pair("a", 3.0)]);
        let map = construct(&map_ctor, &[source]).unwrap();

        assert_eq!(get_property(&map, &PropertyKey::from("size")).unwrap(), Value::Number(2.0));
        assert_eq!(method("get", &map, &[Value::from("a")]).unwrap(), Value::Number(3.0));
        assert_eq!(method("has", &map, &[Value::from("c")]).unwrap(), Value::Bool(false));
        let keys = method("keys", &map, &[]).unwrap();
        assert_eq!(iterate(&keys).unwrap(), vec![Value::from("a"), Value::from("b")]);
    }

    #[test]
    fn set_construction_dedupes_with_same_value_zero() {
        let set_ctor = global_value("Set").unwrap();
        let source = Value::array(vec![
            Value::Number(-0.0),
            Value::Number(0.0),
            Value::Number(f64::NAN),
            Value::Number(f64::NAN),
        ]);
        let set = construct(&set_ctor, &[source]).unwrap();
        assert_eq!(get_property(&set, &PropertyKey::from("size")).unwrap(), Value::Number(2.0));
        assert_eq!(method("has", &set, &[Value::Number(f64::NAN)]).unwrap(), Value::Bool(true));

        let from_string = construct(&set_ctor, &[Value::from("aab")]).unwrap();
        assert_eq!(
            get_property(&from_string, &PropertyKey::from("size")).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn collections_require_new() {
        let map_ctor = global_value("Map").unwrap();
        assert!(matches!(
            call(&map_ctor, &Value::Undefined, &[]),
            Err(EvalError::TypeError(_))
        ));
    }

    #[test]
    fn mutators_are_denied() {
        let set = construct(&global_value("Set").unwrap(), &[]).unwrap();
        assert!(matches!(
            method("add", &set, &[Value::Number(1.0)]),
            Err(EvalError::DangerousCall(_))
        ));
    }
}
