//! The Boolean constructor and Boolean.prototype

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::ObjectKind;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Boolean(value)
pub fn boolean_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let b = call.arg(0).to_boolean();
    let Some(new_target) = call.new_target else {
        return Ok(Value::Boolean(b));
    };
    let obj = interp.ordinary_create_from_constructor(Some(new_target), |i| i.boolean_prototype, ObjectKind::Boolean(b))?;
    Ok(Value::Object(obj))
}

/// thisBooleanValue(value)
fn this_boolean_value(interp: &Interpreter, value: &Value) -> JsResult<bool> {
    let b = match value {
        Value::Boolean(b) => Some(*b),
        Value::Object(obj) => interp.object(*obj, |d| match &d.kind {
            ObjectKind::Boolean(b) => Some(*b),
            _ => None,
        })?,
        _ => None,
    };
    b.ok_or_else(|| JsError::type_error("Boolean.prototype method requires that 'this' be a Boolean"))
}

fn boolean_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let b = this_boolean_value(interp, call.this)?;
    Ok(Value::from(if b { "true" } else { "false" }))
}

fn boolean_value_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(this_boolean_value(interp, call.this)?))
}

pub fn init_boolean(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let proto = realm.intrinsics.boolean_prototype;
    interp.register_constructor(realm.intrinsics.boolean_constructor, "Boolean", 1, Some(proto))?;
    interp.register_method(proto, "toString", boolean_to_string, 0)?;
    interp.register_method(proto, "valueOf", boolean_value_of, 0)?;
    Ok(())
}
