//! The Reflect namespace object
//!
//! Each method forwards to the matching internal method after checking that
//! the target is an object.

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::Value;

fn target(interp: &Interpreter, value: &Value, method: &str) -> JsResult<ObjectId> {
    match value {
        Value::Object(obj) => Ok(*obj),
        other => Err(JsError::type_error(format!(
            "Reflect.{} called on non-object {}",
            method,
            interp.display(other)
        ))),
    }
}

fn reflect_apply(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let f = call.arg(0);
    if !interp.is_callable(&f) {
        return Err(JsError::type_error(format!("{} is not a function", interp.display(&f))));
    }
    let args = interp.create_list_from_array_like(&call.arg(2))?;
    interp.call(&f, &call.arg(1), &args)
}

fn reflect_construct(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let target_value = call.arg(0);
    let Value::Object(target_obj) = target_value else {
        return Err(JsError::type_error(format!("{} is not a constructor", interp.display(&target_value))));
    };
    if !interp.is_constructor(&target_value) {
        return Err(JsError::type_error(format!("{} is not a constructor", interp.display(&target_value))));
    }
    let new_target = match call.args.get(2) {
        None => target_obj,
        Some(nt @ Value::Object(obj)) if interp.is_constructor(nt) => *obj,
        Some(other) => {
            return Err(JsError::type_error(format!("{} is not a constructor", interp.display(other))))
        }
    };
    let args = interp.create_list_from_array_like(&call.arg(1))?;
    Ok(Value::Object(interp.construct(target_obj, &args, Some(new_target))?))
}

fn reflect_define_property(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "defineProperty")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.to_property_descriptor(&call.arg(2))?;
    Ok(Value::Boolean(interp.define_own_property(obj, &key, desc)?))
}

fn reflect_delete_property(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "deleteProperty")?;
    let key = interp.to_property_key(&call.arg(1))?;
    Ok(Value::Boolean(interp.delete(obj, &key)?))
}

fn reflect_get(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "get")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let receiver = call.args.get(2).cloned().unwrap_or(Value::Object(obj));
    interp.get_with_receiver(obj, &key, &receiver)
}

fn reflect_get_own_property_descriptor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "getOwnPropertyDescriptor")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.get_own_property(obj, &key)?;
    interp.from_property_descriptor(desc.as_ref())
}

fn reflect_get_prototype_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "getPrototypeOf")?;
    Ok(interp.get_prototype_of(obj)?.map(Value::Object).unwrap_or(Value::Null))
}

fn reflect_has(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "has")?;
    let key = interp.to_property_key(&call.arg(1))?;
    Ok(Value::Boolean(interp.has_property(obj, &key)?))
}

fn reflect_is_extensible(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "isExtensible")?;
    Ok(Value::Boolean(interp.is_extensible(obj)?))
}

fn reflect_own_keys(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "ownKeys")?;
    let keys = interp
        .own_property_keys(obj)?
        .iter()
        .map(|key| key.to_value())
        .collect();
    Ok(Value::Object(interp.create_array_from_list(keys)?))
}

fn reflect_prevent_extensions(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "preventExtensions")?;
    Ok(Value::Boolean(interp.prevent_extensions(obj)?))
}

fn reflect_set(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "set")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let receiver = call.args.get(3).cloned().unwrap_or(Value::Object(obj));
    Ok(Value::Boolean(interp.set_with_receiver(obj, &key, call.arg(2), &receiver)?))
}

fn reflect_set_prototype_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = target(interp, &call.arg(0), "setPrototypeOf")?;
    let proto = match call.arg(1) {
        Value::Object(proto) => Some(proto),
        Value::Null => None,
        other => {
            return Err(JsError::type_error(format!(
                "Object prototype may only be an Object or null: {}",
                interp.display(&other)
            )))
        }
    };
    Ok(Value::Boolean(interp.set_prototype_of(obj, proto)?))
}

pub fn init_reflect(interp: &Interpreter) -> JsResult<()> {
    let reflect = interp.intrinsic(|i| i.reflect)?;
    let methods: [(&str, super::NativeFn, usize); 13] = [
        ("apply", reflect_apply, 3),
        ("construct", reflect_construct, 2),
        ("defineProperty", reflect_define_property, 3),
        ("deleteProperty", reflect_delete_property, 2),
        ("get", reflect_get, 2),
        ("getOwnPropertyDescriptor", reflect_get_own_property_descriptor, 2),
        ("getPrototypeOf", reflect_get_prototype_of, 1),
        ("has", reflect_has, 2),
        ("isExtensible", reflect_is_extensible, 1),
        ("ownKeys", reflect_own_keys, 1),
        ("preventExtensions", reflect_prevent_extensions, 1),
        ("set", reflect_set, 3),
        ("setPrototypeOf", reflect_set_prototype_of, 2),
    ];
    for (name, behavior, length) in methods {
        interp.register_method(reflect, name, behavior, length)?;
    }
    interp.register_to_string_tag(reflect, "Reflect")?;
    Ok(())
}
