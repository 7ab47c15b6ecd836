//! The Symbol constructor and Symbol.prototype

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::object::{ObjectKind, Property};
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, JsSymbol, PropertyKey, Value};

/// Symbol([description])
pub fn symbol_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    if call.new_target.is_some() {
        return Err(JsError::type_error("Symbol is not a constructor"));
    }
    let description = match call.arg(0) {
        Value::Undefined => None,
        value => Some(interp.to_string(&value)?),
    };
    Ok(Value::Symbol(interp.new_symbol(description)))
}

/// thisSymbolValue(value)
fn this_symbol_value(interp: &Interpreter, value: &Value) -> JsResult<JsSymbol> {
    match value {
        Value::Symbol(symbol) => Ok(symbol.cheap_clone()),
        Value::Object(obj) => interp
            .object(*obj, |d| match &d.kind {
                ObjectKind::Symbol(symbol) => Some(symbol.cheap_clone()),
                _ => None,
            })?
            .ok_or_else(|| JsError::type_error("Symbol.prototype method called on incompatible receiver")),
        _ => Err(JsError::type_error("Symbol.prototype method called on incompatible receiver")),
    }
}

fn symbol_for(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let key = interp.to_string(&call.arg(0))?;
    Ok(Value::Symbol(interp.symbol_for(key)))
}

fn symbol_key_for(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Symbol(symbol) = call.arg(0) else {
        return Err(JsError::type_error(format!(
            "{} is not a symbol",
            interp.display(&call.arg(0))
        )));
    };
    Ok(interp
        .symbol_key_for(&symbol)
        .map(Value::String)
        .unwrap_or(Value::Undefined))
}

fn symbol_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let symbol = this_symbol_value(interp, call.this)?;
    Ok(Value::String(symbol.descriptive_string()))
}

fn symbol_value_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Symbol(this_symbol_value(interp, call.this)?))
}

fn symbol_description(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let symbol = this_symbol_value(interp, call.this)?;
    Ok(symbol
        .description()
        .map(|d| Value::String(d.cheap_clone()))
        .unwrap_or(Value::Undefined))
}

pub fn init_symbol(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let ctor = realm.intrinsics.symbol_constructor;
    let proto = realm.intrinsics.symbol_prototype;
    interp.register_constructor(ctor, "Symbol", 0, Some(proto))?;
    interp.register_method(ctor, "for", symbol_for, 1)?;
    interp.register_method(ctor, "keyFor", symbol_key_for, 1)?;

    let wk = interp.well_known();
    let well_known = [
        ("asyncIterator", &wk.async_iterator),
        ("hasInstance", &wk.has_instance),
        ("isConcatSpreadable", &wk.is_concat_spreadable),
        ("iterator", &wk.iterator),
        ("match", &wk.match_),
        ("matchAll", &wk.match_all),
        ("replace", &wk.replace),
        ("search", &wk.search),
        ("species", &wk.species),
        ("split", &wk.split),
        ("toPrimitive", &wk.to_primitive),
        ("toStringTag", &wk.to_string_tag),
        ("unscopables", &wk.unscopables),
    ];
    for (name, symbol) in well_known {
        interp.register_constant(ctor, name, Value::Symbol(symbol.cheap_clone()))?;
    }

    interp.register_method(proto, "toString", symbol_to_string, 0)?;
    interp.register_method(proto, "valueOf", symbol_value_of, 0)?;
    interp.register_accessor(proto, interp.key("description"), symbol_description, None)?;
    let to_primitive = interp.create_builtin_function(
        symbol_value_of,
        1,
        interp.intern("[Symbol.toPrimitive]"),
        Captures::None,
    )?;
    interp.insert_property(
        proto,
        PropertyKey::Symbol(wk.to_primitive.cheap_clone()),
        Property::data(Value::Object(to_primitive), false, false, true),
    )?;
    interp.register_to_string_tag(proto, "Symbol")?;
    Ok(())
}
