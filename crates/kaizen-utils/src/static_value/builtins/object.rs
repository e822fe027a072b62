//! `Object`, `Object.prototype` and `Function.prototype`.

use super::*;

pub(super) fn register(r: &mut Registry) {
    r.allow("Object", object);
    r.allow("Object.entries", entries);
    r.allow("Object.is", is);
    r.allow("Object.isExtensible", is_extensible);
    r.allow("Object.isFrozen", is_frozen);
    r.allow("Object.isSealed", is_sealed);
    r.allow("Object.keys", keys);
    r.allow("Object.values", values);
    r.pass_through("Object.freeze", freeze);
    r.pass_through("Object.preventExtensions", prevent_extensions);
    r.pass_through("Object.seal", seal);

    r.allow("Object.prototype.isPrototypeOf", is_prototype_of);

    r.deny(&[
        "Object.assign",
        "Object.create",
        "Object.defineProperties",
        "Object.defineProperty",
        "Object.fromEntries",
        "Object.getOwnPropertyDescriptor",
        "Object.getOwnPropertyDescriptors",
        "Object.getOwnPropertyNames",
        "Object.getOwnPropertySymbols",
        "Object.getPrototypeOf",
        "Object.groupBy",
        "Object.hasOwn",
        "Object.setPrototypeOf",
        "Object.prototype.__defineGetter__",
        "Object.prototype.__defineSetter__",
        "Object.prototype.__lookupGetter__",
        "Object.prototype.__lookupSetter__",
        "Object.prototype.hasOwnProperty",
        "Object.prototype.propertyIsEnumerable",
        "Object.prototype.toLocaleString",
        "Object.prototype.toString",
        "Object.prototype.valueOf",
        "Function.prototype.apply",
        "Function.prototype.bind",
        "Function.prototype.call",
        "Function.prototype.toString",
        "Function.prototype[Symbol.hasInstance]",
    ]);
}

fn object(_: &Value, args: &[Value]) -> EvalResult<Value> {
    match arg(args, 0) {
        Value::Undefined | Value::Null => Ok(Value::object(Vec::<(PropertyKey, Value)>::new())),
        value if value.is_primitive() => unsupported("primitive wrapper object"),
        value => Ok(value),
    }
}

fn string_entries(value: &Value) -> EvalResult<Vec<(JsString, Value)>> {
    if value.is_nullish() {
        return type_error("Cannot convert undefined or null to object");
    }
    let entries = own_enumerable_entries(value)?;
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match key {
            PropertyKey::String(key) => Some((key, value)),
            PropertyKey::Symbol(_) => None,
        })
        .collect())
}

fn keys(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = string_entries(&arg(args, 0))?
        .into_iter()
        .map(|(key, _)| Value::String(key))
        .collect();
    Ok(Value::array(items))
}

fn values(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = string_entries(&arg(args, 0))?
        .into_iter()
        .map(|(_, value)| value)
        .collect();
    Ok(Value::array(items))
}

fn entries(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let items = string_entries(&arg(args, 0))?
        .into_iter()
        .map(|(key, value)| Value::array(vec![Value::String(key), value]))
        .collect();
    Ok(Value::array(items))
}

fn is(_: &Value, args: &[Value]) -> EvalResult<Value> {
    Ok(Value::Bool(same_value(&arg(args, 0), &arg(args, 1))))
}

fn freeze(_: &Value, args: &[Value]) -> EvalResult<Value> {
    restrict(args, IntegrityLevel::Frozen)
}

fn seal(_: &Value, args: &[Value]) -> EvalResult<Value> {
    restrict(args, IntegrityLevel::Sealed)
}

fn prevent_extensions(_: &Value, args: &[Value]) -> EvalResult<Value> {
    restrict(args, IntegrityLevel::NonExtensible)
}

/// Only plain objects and arrays carry a level; locking a shared value such
/// as a collection or a namespace is not determinable.
fn restrict(args: &[Value], level: IntegrityLevel) -> EvalResult<Value> {
    let target = arg(args, 0);
    match &target {
        Value::Object(object) => object.restrict(level),
        Value::Array(array) => array.restrict(level),
        value if value.is_primitive() => {}
        _ => return unsupported("object integrity level"),
    }
    Ok(target)
}

fn is_extensible(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let extensible = match arg(args, 0) {
        Value::Object(object) => object.integrity() == IntegrityLevel::Extensible,
        Value::Array(array) => array.integrity() == IntegrityLevel::Extensible,
        value => !value.is_primitive(),
    };
    Ok(Value::Bool(extensible))
}

/// A non-extensible value with no own properties is trivially sealed.
fn is_sealed(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let sealed = match arg(args, 0) {
        Value::Object(object) => match object.integrity() {
            IntegrityLevel::Extensible => false,
            IntegrityLevel::NonExtensible => object.is_empty(),
            IntegrityLevel::Sealed | IntegrityLevel::Frozen => true,
        },
        Value::Array(array) => match array.integrity() {
            IntegrityLevel::Extensible => false,
            IntegrityLevel::NonExtensible => !array.has_own_properties(),
            IntegrityLevel::Sealed | IntegrityLevel::Frozen => true,
        },
        value => value.is_primitive(),
    };
    Ok(Value::Bool(sealed))
}

/// An array's `length` stays writable until it is frozen.
fn is_frozen(_: &Value, args: &[Value]) -> EvalResult<Value> {
    let frozen = match arg(args, 0) {
        Value::Object(object) => match object.integrity() {
            IntegrityLevel::Extensible => false,
            IntegrityLevel::NonExtensible | IntegrityLevel::Sealed => object.is_empty(),
            IntegrityLevel::Frozen => true,
        },
        Value::Array(array) => array.integrity() == IntegrityLevel::Frozen,
        value => value.is_primitive(),
    };
    Ok(Value::Bool(frozen))
}

fn is_prototype_of(this: &Value, args: &[Value]) -> EvalResult<Value> {
    if arg(args, 0).is_primitive() {
        return Ok(Value::Bool(false));
    }
    if this.is_nullish() {
        return type_error("Cannot convert undefined or null to object");
    }
    unsupported("prototype chain")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_static(name: &str, args: &[Value]) -> EvalResult<Value> {
        let object = global_value("Object").unwrap();
        let callee = get_property(&object, &PropertyKey::from(name))?;
        call(&callee, &object, args)
    }

    #[test]
    fn keys_list_indices_first() {
        let value = Value::object([
            ("b", Value::Number(1.0)),
            ("2", Value::Number(2.0)),
            ("a", Value::Number(3.0)),
            ("1", Value::Number(4.0)),
        ]);
        let keys = object_static("keys", &[value]).unwrap();
        assert_eq!(
            keys,
            Value::array(vec![
                Value::from("1"),
                Value::from("2"),
                Value::from("b"),
                Value::from("a"),
            ])
        );
    }

    #[test]
    fn entries_of_strings_and_arrays() {
        let entries = object_static("entries", &[Value::from("ab")]).unwrap();
        assert_eq!(
            entries,
            Value::array(vec![
                Value::array(vec![Value::from("0"), Value::from("a")]),
                Value::array(vec![Value::from("1"), Value::from("b")]),
            ])
        );
        let holes = Value::array_with_holes(vec![Some(Value::Null), None]);
        assert_eq!(object_static("values", &[holes]).unwrap(), Value::array(vec![Value::Null]));
        assert!(matches!(
            object_static("keys", &[Value::Null]),
            Err(EvalError::TypeError(_))
        ));
    }

    #[test]
    fn freeze_passes_its_argument_through() {
        let value = Value::array(vec![Value::Number(1.0)]);
        assert_eq!(object_static("isFrozen", &[value.clone()]).unwrap(), Value::Bool(false));

        let frozen = object_static("freeze", &[value.clone()]).unwrap();
        assert!(strict_equals(&frozen, &value));
        assert_eq!(object_static("isFrozen", &[value.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(object_static("isSealed", &[value.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(object_static("isExtensible", &[value]).unwrap(), Value::Bool(false));
        assert_eq!(object_static("isFrozen", &[Value::Number(1.0)]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn integrity_levels_only_tighten() {
        let value = Value::object([("a", Value::Number(1.0))]);
        assert_eq!(object_static("isExtensible", &[value.clone()]).unwrap(), Value::Bool(true));

        object_static("seal", &[value.clone()]).unwrap();
        assert_eq!(object_static("isSealed", &[value.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(object_static("isFrozen", &[value.clone()]).unwrap(), Value::Bool(false));

        object_static("freeze", &[value.clone()]).unwrap();
        object_static("preventExtensions", &[value.clone()]).unwrap();
        assert_eq!(object_static("isFrozen", &[value]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn empty_non_extensible_values() {
        let object = Value::object::<&str>([]);
        object_static("preventExtensions", &[object.clone()]).unwrap();
        assert_eq!(object_static("isFrozen", &[object.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(object_static("isSealed", &[object]).unwrap(), Value::Bool(true));

        let array = Value::array_with_holes(vec![None]);
        object_static("preventExtensions", &[array.clone()]).unwrap();
        assert_eq!(object_static("isSealed", &[array.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(object_static("isFrozen", &[array]).unwrap(), Value::Bool(false));
    }

    #[test]
    fn collections_cannot_be_locked() {
        let set = construct(&global_value("Set").unwrap(), &[]).unwrap();
        assert_eq!(object_static("isExtensible", &[set.clone()]).unwrap(), Value::Bool(true));
        assert_eq!(object_static("isFrozen", &[set.clone()]).unwrap(), Value::Bool(false));
        assert!(matches!(
            object_static("freeze", &[set]),
            Err(EvalError::Unsupported(_))
        ));
    }

    #[test]
    fn object_is_uses_same_value() {
        let args = [Value::Number(f64::NAN), Value::Number(f64::NAN)];
        assert_eq!(object_static("is", &args).unwrap(), Value::Bool(true));
        let args = [Value::Number(0.0), Value::Number(-0.0)];
        assert_eq!(object_static("is", &args).unwrap(), Value::Bool(false));
    }

    #[test]
    fn reflective_statics_are_denied() {
        assert!(matches!(
            object_static("defineProperty", &[]),
            Err(EvalError::DangerousCall(_))
        ));
        let to_string = get_property(
            &Value::object([("a", Value::Null)]),
            &PropertyKey::from("toString"),
        )
        .unwrap();
        assert!(call(&to_string, &Value::Undefined, &[]).is_err());
    }
}
