//! Ordinary object internal methods

use crate::error::JsResult;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, PropertyKey, Value};

use super::property::{validate_and_apply_property_descriptor, Property, PropertyDescriptor};
use super::{InternalMethods, ObjectKind, PropertyMap};

/// Internal methods of an ordinary object: every default of the trait.
pub struct OrdinaryMethods;

impl InternalMethods for OrdinaryMethods {}

/// OrdinaryGetPrototypeOf
pub fn get_prototype_of(interp: &Interpreter, obj: ObjectId) -> JsResult<Option<ObjectId>> {
    interp.object(obj, |d| d.prototype)
}

/// OrdinarySetPrototypeOf
pub fn set_prototype_of(
    interp: &Interpreter,
    obj: ObjectId,
    proto: Option<ObjectId>,
) -> JsResult<bool> {
    let (current, extensible) = interp.object(obj, |d| (d.prototype, d.extensible))?;
    if current == proto {
        return Ok(true);
    }
    if !extensible {
        return Ok(false);
    }
    // Refuse cycles, stopping at the first proxy whose [[GetPrototypeOf]]
    // cannot be inspected without running code.
    let mut p = proto;
    while let Some(candidate) = p {
        if candidate == obj {
            return Ok(false);
        }
        let (is_proxy, next) = interp.object(candidate, |d| {
            (matches!(d.kind, ObjectKind::Proxy(_)), d.prototype)
        })?;
        if is_proxy {
            break;
        }
        p = next;
    }
    interp.object_mut(obj, |d| d.prototype = proto)?;
    Ok(true)
}

/// OrdinaryIsExtensible
pub fn is_extensible(interp: &Interpreter, obj: ObjectId) -> JsResult<bool> {
    interp.object(obj, |d| d.extensible)
}

/// OrdinaryPreventExtensions
pub fn prevent_extensions(interp: &Interpreter, obj: ObjectId) -> JsResult<bool> {
    interp.object_mut(obj, |d| d.extensible = false)?;
    Ok(true)
}

/// OrdinaryGetOwnProperty
pub fn get_own_property(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
) -> JsResult<Option<PropertyDescriptor>> {
    interp.object(obj, |d| d.properties.get(key).map(Property::to_descriptor))
}

/// OrdinaryDefineOwnProperty
pub fn define_own_property(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
    desc: PropertyDescriptor,
) -> JsResult<bool> {
    interp.object_mut(obj, |d| {
        let current = d.properties.get(key).cloned();
        validate_and_apply_property_descriptor(
            Some(&mut d.properties),
            key,
            d.extensible,
            desc,
            current.as_ref(),
        )
    })
}

/// OrdinaryHasProperty
pub fn has_property(interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
    if interp.get_own_property(obj, key)?.is_some() {
        return Ok(true);
    }
    match interp.get_prototype_of(obj)? {
        Some(parent) => interp.has_property(parent, key),
        None => Ok(false),
    }
}

/// OrdinaryGet
pub fn get(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
    receiver: &Value,
) -> JsResult<Value> {
    let Some(desc) = interp.get_own_property(obj, key)? else {
        return match interp.get_prototype_of(obj)? {
            Some(parent) => interp.get_with_receiver(parent, key, receiver),
            None => Ok(Value::Undefined),
        };
    };
    if desc.is_data_descriptor() {
        return Ok(desc.value.unwrap_or_default());
    }
    match desc.get {
        Some(getter @ Value::Object(_)) => interp.call(&getter, receiver, &[]),
        _ => Ok(Value::Undefined),
    }
}

/// OrdinarySet
pub fn set(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
    value: Value,
    receiver: &Value,
) -> JsResult<bool> {
    let own = interp.get_own_property(obj, key)?;
    set_with_own_descriptor(interp, obj, key, value, receiver, own)
}

/// OrdinarySetWithOwnDescriptor
pub fn set_with_own_descriptor(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
    value: Value,
    receiver: &Value,
    own: Option<PropertyDescriptor>,
) -> JsResult<bool> {
    let own = match own {
        Some(desc) => desc,
        None => match interp.get_prototype_of(obj)? {
            Some(parent) => return interp.set_with_receiver(parent, key, value, receiver),
            None => PropertyDescriptor::data(Value::Undefined, true, true, true),
        },
    };

    if own.is_data_descriptor() {
        if own.writable != Some(true) {
            return Ok(false);
        }
        let Value::Object(receiver) = receiver else {
            return Ok(false);
        };
        let receiver = *receiver;
        return match interp.get_own_property(receiver, key)? {
            Some(existing) => {
                if existing.is_accessor_descriptor() || existing.writable != Some(true) {
                    return Ok(false);
                }
                interp.define_own_property(receiver, key, PropertyDescriptor::value_only(value))
            }
            None => interp.create_data_property(receiver, key.cheap_clone(), value),
        };
    }

    match own.set {
        Some(setter @ Value::Object(_)) => {
            interp.call(&setter, receiver, &[value])?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// OrdinaryDelete
pub fn delete(interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
    interp.object_mut(obj, |d| match d.properties.get(key) {
        None => true,
        Some(property) if property.configurable => {
            d.properties.shift_remove(key);
            true
        }
        Some(_) => false,
    })
}

/// OrdinaryOwnPropertyKeys
pub fn own_property_keys(interp: &Interpreter, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
    interp.object(obj, |d| ordered_keys(&d.properties))
}

/// Integer indices ascending, then strings, then symbols, each group in
/// creation order.
pub fn ordered_keys(properties: &PropertyMap) -> Vec<PropertyKey> {
    let mut indices: Vec<u32> = properties.keys().filter_map(PropertyKey::as_index).collect();
    indices.sort_unstable();
    let mut keys: Vec<PropertyKey> = Vec::with_capacity(properties.len());
    keys.extend(indices.into_iter().map(PropertyKey::Index));
    keys.extend(
        properties
            .keys()
            .filter(|k| matches!(k, PropertyKey::String(_)))
            .cloned(),
    );
    keys.extend(properties.keys().filter(|k| k.is_symbol()).cloned());
    keys
}
