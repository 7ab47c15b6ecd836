//! The Object constructor and Object.prototype

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::iteration::IteratorHint;
use crate::interpreter::object::{IntegrityLevel, ObjectKind, PropertyNameKind};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// Object(value)
pub fn object_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    if let Some(new_target) = call.new_target {
        if new_target != call.function {
            let obj = interp.ordinary_create_from_constructor(
                Some(new_target),
                |i| i.object_prototype,
                ObjectKind::Ordinary,
            )?;
            return Ok(Value::Object(obj));
        }
    }
    let value = call.arg(0);
    if value.is_nullish() {
        return Ok(Value::Object(interp.ordinary_object()?));
    }
    Ok(Value::Object(interp.to_object(&value)?))
}

/// The object argument, or a TypeError naming the operation.
fn object_arg(value: &Value, operation: &str) -> JsResult<ObjectId> {
    value
        .as_object()
        .ok_or_else(|| JsError::type_error(format!("{} called on non-object", operation)))
}

/// A prototype argument: an object or `null`.
fn proto_arg(interp: &Interpreter, value: &Value) -> JsResult<Option<ObjectId>> {
    match value {
        Value::Object(obj) => Ok(Some(*obj)),
        Value::Null => Ok(None),
        other => Err(JsError::type_error(format!(
            "Object prototype may only be an Object or null: {}",
            interp.display(other)
        ))),
    }
}

impl Interpreter {
    /// ObjectDefineProperties(O, Properties)
    fn object_define_properties(&self, obj: ObjectId, properties: &Value) -> JsResult<()> {
        let props = self.to_object(properties)?;
        let mut descriptors = Vec::new();
        for key in self.own_property_keys(props)? {
            let Some(prop_desc) = self.get_own_property(props, &key)? else {
                continue;
            };
            if prop_desc.enumerable == Some(true) {
                let desc_obj = self.get(props, &key)?;
                descriptors.push((key, self.to_property_descriptor(&desc_obj)?));
            }
        }
        for (key, desc) in descriptors {
            self.define_property_or_throw(obj, &key, desc)?;
        }
        Ok(())
    }

    /// GetOwnPropertyKeys(O, type) as an array.
    fn own_keys_array(&self, value: &Value, symbols: bool) -> JsResult<Value> {
        let obj = self.to_object(value)?;
        let keys: Vec<Value> = self
            .own_property_keys(obj)?
            .into_iter()
            .filter(|key| key.is_symbol() == symbols)
            .map(|key| key.to_value())
            .collect();
        Ok(Value::Object(self.create_array_from_list(keys)?))
    }

    /// The default Object.prototype.toString tag of `obj`.
    fn builtin_tag(&self, obj: ObjectId) -> JsResult<&'static str> {
        if self.is_array(&Value::Object(obj))? {
            return Ok("Array");
        }
        if self.is_callable(&Value::Object(obj)) {
            return Ok("Function");
        }
        self.object(obj, |d| match &d.kind {
            ObjectKind::Arguments(_) => "Arguments",
            ObjectKind::Error => "Error",
            ObjectKind::Boolean(_) => "Boolean",
            ObjectKind::Number(_) => "Number",
            ObjectKind::String(_) => "String",
            _ => "Object",
        })
    }
}

fn object_get_prototype_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = interp.to_object(&call.arg(0))?;
    Ok(Value::from(interp.get_prototype_of(obj)?))
}

fn object_set_prototype_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let target = call.arg(0);
    interp.require_object_coercible(&target)?;
    let proto = proto_arg(interp, &call.arg(1))?;
    let Value::Object(obj) = target else {
        return Ok(target);
    };
    if !interp.set_prototype_of(obj, proto)? {
        return Err(JsError::type_error("Object.setPrototypeOf: cannot set prototype"));
    }
    Ok(Value::Object(obj))
}

fn object_create(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let proto = proto_arg(interp, &call.arg(0))?;
    let obj = interp.object_create(proto, ObjectKind::Ordinary);
    let properties = call.arg(1);
    if !properties.is_undefined() {
        interp.object_define_properties(obj, &properties)?;
    }
    Ok(Value::Object(obj))
}

fn object_define_property(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = object_arg(&call.arg(0), "Object.defineProperty")?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.to_property_descriptor(&call.arg(2))?;
    interp.define_property_or_throw(obj, &key, desc)?;
    Ok(Value::Object(obj))
}

fn object_define_properties(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = object_arg(&call.arg(0), "Object.defineProperties")?;
    interp.object_define_properties(obj, &call.arg(1))?;
    Ok(Value::Object(obj))
}

fn object_get_own_property_descriptor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = interp.to_object(&call.arg(0))?;
    let key = interp.to_property_key(&call.arg(1))?;
    let desc = interp.get_own_property(obj, &key)?;
    interp.from_property_descriptor(desc.as_ref())
}

fn object_get_own_property_descriptors(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = interp.to_object(&call.arg(0))?;
    let descriptors = interp.ordinary_object()?;
    for key in interp.own_property_keys(obj)? {
        let desc = interp.get_own_property(obj, &key)?;
        let desc = interp.from_property_descriptor(desc.as_ref())?;
        if !desc.is_undefined() {
            interp.create_data_property_or_throw(descriptors, key, desc)?;
        }
    }
    Ok(Value::Object(descriptors))
}

fn object_get_own_property_names(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.own_keys_array(&call.arg(0), false)
}

fn object_get_own_property_symbols(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.own_keys_array(&call.arg(0), true)
}

fn enumerable_own(interp: &Interpreter, call: &NativeCall<'_>, kind: PropertyNameKind) -> JsResult<Value> {
    let obj = interp.to_object(&call.arg(0))?;
    let list = interp.enumerable_own_properties(obj, kind)?;
    Ok(Value::Object(interp.create_array_from_list(list)?))
}

fn object_keys(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    enumerable_own(interp, call, PropertyNameKind::Key)
}

fn object_values(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    enumerable_own(interp, call, PropertyNameKind::Value)
}

fn object_entries(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    enumerable_own(interp, call, PropertyNameKind::KeyValue)
}

fn object_assign(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let to = interp.to_object(&call.arg(0))?;
    for source in call.args.iter().skip(1) {
        if source.is_nullish() {
            continue;
        }
        let from = interp.to_object(source)?;
        for key in interp.own_property_keys(from)? {
            let Some(desc) = interp.get_own_property(from, &key)? else {
                continue;
            };
            if desc.enumerable == Some(true) {
                let value = interp.get(from, &key)?;
                interp.set(to, &key, value, true)?;
            }
        }
    }
    Ok(Value::Object(to))
}

fn object_freeze(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let value = call.arg(0);
    let Value::Object(obj) = value else {
        return Ok(value);
    };
    if !interp.set_integrity_level(obj, IntegrityLevel::Frozen)? {
        return Err(JsError::type_error("Cannot freeze object"));
    }
    Ok(value)
}

fn object_is_frozen(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match call.arg(0) {
        Value::Object(obj) => Ok(Value::Boolean(interp.test_integrity_level(obj, IntegrityLevel::Frozen)?)),
        _ => Ok(Value::Boolean(true)),
    }
}

fn object_seal(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let value = call.arg(0);
    let Value::Object(obj) = value else {
        return Ok(value);
    };
    if !interp.set_integrity_level(obj, IntegrityLevel::Sealed)? {
        return Err(JsError::type_error("Cannot seal object"));
    }
    Ok(value)
}

fn object_is_sealed(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match call.arg(0) {
        Value::Object(obj) => Ok(Value::Boolean(interp.test_integrity_level(obj, IntegrityLevel::Sealed)?)),
        _ => Ok(Value::Boolean(true)),
    }
}

fn object_prevent_extensions(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let value = call.arg(0);
    let Value::Object(obj) = value else {
        return Ok(value);
    };
    if !interp.prevent_extensions(obj)? {
        return Err(JsError::type_error("Cannot prevent extensions"));
    }
    Ok(value)
}

fn object_is_extensible(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match call.arg(0) {
        Value::Object(obj) => Ok(Value::Boolean(interp.is_extensible(obj)?)),
        _ => Ok(Value::Boolean(false)),
    }
}

fn object_is(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(call.arg(0).same_value(&call.arg(1))))
}

fn object_has_own(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = interp.to_object(&call.arg(0))?;
    let key = interp.to_property_key(&call.arg(1))?;
    Ok(Value::Boolean(interp.has_own_property(obj, &key)?))
}

fn object_from_entries(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let iterable = call.arg(0);
    interp.require_object_coercible(&iterable)?;
    let obj = interp.ordinary_object()?;
    let mut record = interp.get_iterator(&iterable, IteratorHint::Sync)?;
    while let Some(entry) = interp.iterator_step_value(&mut record)? {
        let added = (|| {
            let Value::Object(entry) = entry else {
                return Err(JsError::type_error(format!(
                    "Iterator value {} is not an entry object",
                    interp.display(&entry)
                )));
            };
            let k = interp.get(entry, &PropertyKey::Index(0))?;
            let v = interp.get(entry, &PropertyKey::Index(1))?;
            let key = interp.to_property_key(&k)?;
            interp.create_data_property_or_throw(obj, key, v)
        })();
        if added.is_err() {
            return interp.iterator_close(&record, added).map(|()| Value::Undefined);
        }
    }
    Ok(Value::Object(obj))
}

// ============ Object.prototype ============

fn object_proto_has_own_property(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let key = interp.to_property_key(&call.arg(0))?;
    let obj = interp.to_object(call.this)?;
    Ok(Value::Boolean(interp.has_own_property(obj, &key)?))
}

fn object_proto_is_prototype_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(mut current) = call.arg(0) else {
        return Ok(Value::Boolean(false));
    };
    let obj = interp.to_object(call.this)?;
    loop {
        match interp.get_prototype_of(current)? {
            None => return Ok(Value::Boolean(false)),
            Some(proto) if proto == obj => return Ok(Value::Boolean(true)),
            Some(proto) => current = proto,
        }
    }
}

fn object_proto_property_is_enumerable(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let key = interp.to_property_key(&call.arg(0))?;
    let obj = interp.to_object(call.this)?;
    let desc = interp.get_own_property(obj, &key)?;
    Ok(Value::Boolean(desc.is_some_and(|d| d.enumerable == Some(true))))
}

/// Object.prototype.toString
fn object_proto_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match call.this {
        Value::Undefined => return Ok(Value::from("[object Undefined]")),
        Value::Null => return Ok(Value::from("[object Null]")),
        _ => {}
    }
    let obj = interp.to_object(call.this)?;
    let builtin_tag = interp.builtin_tag(obj)?;
    let tag_key = PropertyKey::Symbol(interp.well_known().to_string_tag.cheap_clone());
    let tag: JsString = match interp.get(obj, &tag_key)? {
        Value::String(tag) => tag,
        _ => JsString::from(builtin_tag),
    };
    Ok(Value::from(format!("[object {}]", tag)))
}

fn object_proto_to_locale_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.invoke(call.this, &interp.key("toString"), &[])
}

fn object_proto_value_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Object(interp.to_object(call.this)?))
}

/// get Object.prototype.__proto__
fn object_proto_get_proto(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let obj = interp.to_object(call.this)?;
    Ok(Value::from(interp.get_prototype_of(obj)?))
}

/// set Object.prototype.__proto__
fn object_proto_set_proto(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.require_object_coercible(call.this)?;
    let proto = match call.arg(0) {
        Value::Object(proto) => Some(proto),
        Value::Null => None,
        _ => return Ok(Value::Undefined),
    };
    let Value::Object(obj) = call.this else {
        return Ok(Value::Undefined);
    };
    if !interp.set_prototype_of(*obj, proto)? {
        return Err(JsError::type_error("Object.prototype.__proto__: cannot set prototype"));
    }
    Ok(Value::Undefined)
}

pub fn init_object(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let ctor = realm.intrinsics.object_constructor;
    let proto = realm.intrinsics.object_prototype;
    interp.register_constructor(ctor, "Object", 1, Some(proto))?;

    interp.register_method(ctor, "getPrototypeOf", object_get_prototype_of, 1)?;
    interp.register_method(ctor, "setPrototypeOf", object_set_prototype_of, 2)?;
    interp.register_method(ctor, "create", object_create, 2)?;
    interp.register_method(ctor, "defineProperty", object_define_property, 3)?;
    interp.register_method(ctor, "defineProperties", object_define_properties, 2)?;
    interp.register_method(ctor, "getOwnPropertyDescriptor", object_get_own_property_descriptor, 2)?;
    interp.register_method(ctor, "getOwnPropertyDescriptors", object_get_own_property_descriptors, 1)?;
    interp.register_method(ctor, "getOwnPropertyNames", object_get_own_property_names, 1)?;
    interp.register_method(ctor, "getOwnPropertySymbols", object_get_own_property_symbols, 1)?;
    interp.register_method(ctor, "keys", object_keys, 1)?;
    interp.register_method(ctor, "values", object_values, 1)?;
    interp.register_method(ctor, "entries", object_entries, 1)?;
    interp.register_method(ctor, "assign", object_assign, 2)?;
    interp.register_method(ctor, "freeze", object_freeze, 1)?;
    interp.register_method(ctor, "isFrozen", object_is_frozen, 1)?;
    interp.register_method(ctor, "seal", object_seal, 1)?;
    interp.register_method(ctor, "isSealed", object_is_sealed, 1)?;
    interp.register_method(ctor, "preventExtensions", object_prevent_extensions, 1)?;
    interp.register_method(ctor, "isExtensible", object_is_extensible, 1)?;
    interp.register_method(ctor, "is", object_is, 2)?;
    interp.register_method(ctor, "hasOwn", object_has_own, 2)?;
    interp.register_method(ctor, "fromEntries", object_from_entries, 1)?;

    interp.register_method(proto, "hasOwnProperty", object_proto_has_own_property, 1)?;
    interp.register_method(proto, "isPrototypeOf", object_proto_is_prototype_of, 1)?;
    interp.register_method(proto, "propertyIsEnumerable", object_proto_property_is_enumerable, 1)?;
    interp.register_method(proto, "toString", object_proto_to_string, 0)?;
    interp.register_method(proto, "toLocaleString", object_proto_to_locale_string, 0)?;
    interp.register_method(proto, "valueOf", object_proto_value_of, 0)?;
    interp.register_accessor(
        proto,
        interp.key("__proto__"),
        object_proto_get_proto,
        Some(object_proto_set_proto),
    )?;
    Ok(())
}
