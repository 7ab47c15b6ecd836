//! Function.prototype, the Function constructor and %ThrowTypeError%

use crate::error::{ErrorKind, JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::{IntegrityLevel, Property, PropertyDescriptor};
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// [[Call]] of %Function.prototype% itself.
pub fn function_prototype_call(_interp: &Interpreter, _call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Undefined)
}

/// `Function(...)`, `GeneratorFunction(...)` and their async variants.
/// Creating functions from source text at run time is not supported.
pub fn function_constructor(interp: &Interpreter, _call: &NativeCall<'_>) -> JsResult<Value> {
    interp.throw(
        ErrorKind::EvalError,
        "Code generation from strings is not supported",
    )
}

/// %ThrowTypeError%
pub fn throw_type_error(_interp: &Interpreter, _call: &NativeCall<'_>) -> JsResult<Value> {
    Err(JsError::type_error(
        "'caller', 'callee', and 'arguments' properties may not be accessed on strict mode functions or the arguments objects for calls to them",
    ))
}

fn require_callable(interp: &Interpreter, value: &Value, method: &str) -> JsResult<()> {
    if interp.is_callable(value) {
        Ok(())
    } else {
        Err(JsError::type_error(format!(
            "Function.prototype.{} called on {}, which is not a function",
            method,
            interp.type_of(value)
        )))
    }
}

/// Function.prototype.call(thisArg, ...args)
fn function_call(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    require_callable(interp, call.this, "call")?;
    let args = call.args.get(1..).unwrap_or_default();
    interp.call(call.this, &call.arg(0), args)
}

/// Function.prototype.apply(thisArg, argArray)
fn function_apply(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    require_callable(interp, call.this, "apply")?;
    let arg_array = call.arg(1);
    let args = if arg_array.is_nullish() {
        Vec::new()
    } else {
        interp.create_list_from_array_like(&arg_array)?
    };
    interp.call(call.this, &call.arg(0), &args)
}

/// Function.prototype.bind(thisArg, ...args)
fn function_bind(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    require_callable(interp, call.this, "bind")?;
    let Value::Object(target) = call.this else {
        return Err(JsError::type_error("Bind must be called on a function"));
    };
    let bound_args = call.args.get(1..).unwrap_or_default().to_vec();
    let arg_count = bound_args.len() as f64;
    let f = interp.bound_function_create(*target, call.arg(0), bound_args)?;

    let length_key = interp.key("length");
    let mut length = 0.0;
    if interp.has_own_property(*target, &length_key)? {
        if let Value::Number(target_len) = interp.get(*target, &length_key)? {
            length = if target_len == f64::INFINITY {
                f64::INFINITY
            } else if target_len == f64::NEG_INFINITY {
                0.0
            } else {
                let target_len = interp.to_integer_or_infinity(&Value::Number(target_len))?;
                (target_len - arg_count).max(0.0)
            };
        }
    }
    interp.define_property_or_throw(
        f,
        &length_key,
        PropertyDescriptor::data(Value::Number(length), false, false, true),
    )?;

    let name = match interp.get(*target, &interp.key("name"))? {
        Value::String(name) => name,
        _ => JsString::default(),
    };
    interp.set_function_name(f, &PropertyKey::String(name), Some("bound"))?;
    Ok(Value::Object(f))
}

/// Function.prototype.toString
fn function_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(f) = call.this else {
        return Err(JsError::type_error("Function.prototype.toString requires that 'this' be a Function"));
    };
    if let Some(source) = interp.function_source_text(*f)? {
        return Ok(Value::String(source));
    }
    if interp.is_callable(call.this) {
        let name = interp.function_display_name(*f).unwrap_or_default();
        return Ok(Value::from(format!("function {}() {{ [native code] }}", name)));
    }
    Err(JsError::type_error("Function.prototype.toString requires that 'this' be a Function"))
}

/// Function.prototype[@@hasInstance](V)
fn function_has_instance(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(interp.ordinary_has_instance(call.this, &call.arg(0))?))
}

pub fn init_function(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let proto = realm.intrinsics.function_prototype;
    let ctor = realm.intrinsics.function_constructor;
    interp.name_builtin(proto, 0, JsString::default())?;
    interp.register_constructor(ctor, "Function", 1, Some(proto))?;

    interp.register_method(proto, "call", function_call, 1)?;
    interp.register_method(proto, "apply", function_apply, 2)?;
    interp.register_method(proto, "bind", function_bind, 1)?;
    interp.register_method(proto, "toString", function_to_string, 0)?;
    let has_instance = interp.create_builtin_function(
        function_has_instance,
        1,
        interp.intern("[Symbol.hasInstance]"),
        super::Captures::None,
    )?;
    interp.insert_property(
        proto,
        PropertyKey::Symbol(interp.well_known().has_instance.cheap_clone()),
        Property::frozen(Value::Object(has_instance)),
    )?;

    // %ThrowTypeError% is frozen, and AddRestrictedFunctionProperties puts
    // it on Function.prototype.
    let thrower = realm.intrinsics.throw_type_error;
    interp.insert_property(
        thrower,
        interp.key("length"),
        Property::frozen(Value::Number(0.0)),
    )?;
    interp.insert_property(thrower, interp.key("name"), Property::frozen(Value::from("")))?;
    interp.set_integrity_level(thrower, IntegrityLevel::Frozen)?;
    for name in ["caller", "arguments"] {
        interp.insert_property(
            proto,
            interp.key(name),
            Property::accessor(Some(thrower), Some(thrower), false, true),
        )?;
    }
    Ok(())
}
