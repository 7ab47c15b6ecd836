//! Operations on objects
//!
//! The abstract operations layered over the internal methods: Get, Set,
//! CreateDataProperty, DefinePropertyOrThrow, integrity levels, array-like
//! conversion and constructor-relative prototype lookup.

use crate::error::{JsError, JsResult};
use crate::interpreter::realm::{Intrinsics, RealmId};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

use super::property::PropertyDescriptor;
use super::ObjectKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityLevel {
    Sealed,
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyNameKind {
    Key,
    Value,
    KeyValue,
}

impl Interpreter {
    /// Get(O, P)
    pub fn get(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<Value> {
        self.get_with_receiver(obj, key, &Value::Object(obj))
    }

    /// GetV(V, P): property lookup on any value, primitives through their
    /// prototype without allocating a wrapper.
    pub fn get_v(&self, value: &Value, key: &PropertyKey) -> JsResult<Value> {
        let proto = match value {
            Value::Object(obj) => return self.get(*obj, key),
            Value::Undefined | Value::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    self.display(value),
                    key
                )));
            }
            Value::String(s) => {
                if key.eq_str("length") {
                    return Ok(Value::Number(s.utf16_len() as f64));
                }
                if let Some(index) = key.as_index() {
                    if let Some(unit) = s.code_units().get(index as usize) {
                        return Ok(Value::String(JsString::from_utf16(&[*unit])));
                    }
                }
                self.intrinsic(|i| i.string_prototype)?
            }
            Value::Boolean(_) => self.intrinsic(|i| i.boolean_prototype)?,
            Value::Number(_) => self.intrinsic(|i| i.number_prototype)?,
            Value::Symbol(_) => self.intrinsic(|i| i.symbol_prototype)?,
        };
        self.get_with_receiver(proto, key, value)
    }

    /// Set(O, P, V, Throw)
    pub fn set(&self, obj: ObjectId, key: &PropertyKey, value: Value, throw: bool) -> JsResult<()> {
        let ok = self.set_with_receiver(obj, key, value, &Value::Object(obj))?;
        if !ok && throw {
            return Err(JsError::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                key
            )));
        }
        Ok(())
    }

    /// CreateDataProperty(O, P, V)
    pub fn create_data_property(
        &self,
        obj: ObjectId,
        key: PropertyKey,
        value: Value,
    ) -> JsResult<bool> {
        self.define_own_property(obj, &key, PropertyDescriptor::data(value, true, true, true))
    }

    /// CreateDataPropertyOrThrow(O, P, V)
    pub fn create_data_property_or_throw(
        &self,
        obj: ObjectId,
        key: PropertyKey,
        value: Value,
    ) -> JsResult<()> {
        let ok = self.create_data_property(obj, key.cheap_clone(), value)?;
        if !ok {
            return Err(JsError::type_error(format!("Cannot define property {}", key)));
        }
        Ok(())
    }

    /// DefinePropertyOrThrow(O, P, desc)
    pub fn define_property_or_throw(
        &self,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<()> {
        if !self.define_own_property(obj, key, desc)? {
            return Err(JsError::type_error(format!("Cannot redefine property: {}", key)));
        }
        Ok(())
    }

    /// DeletePropertyOrThrow(O, P)
    pub fn delete_property_or_throw(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<()> {
        if !self.delete(obj, key)? {
            return Err(JsError::type_error(format!("Cannot delete property '{}'", key)));
        }
        Ok(())
    }

    /// HasOwnProperty(O, P)
    pub fn has_own_property(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        Ok(self.get_own_property(obj, key)?.is_some())
    }

    /// GetMethod(V, P): `None` for undefined or null.
    pub fn get_method(&self, value: &Value, key: &PropertyKey) -> JsResult<Option<Value>> {
        let func = self.get_v(value, key)?;
        if func.is_nullish() {
            return Ok(None);
        }
        if !self.is_callable(&func) {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                self.display(&func)
            )));
        }
        Ok(Some(func))
    }

    /// Invoke(V, P, args)
    pub fn invoke(&self, value: &Value, key: &PropertyKey, args: &[Value]) -> JsResult<Value> {
        let func = self.get_v(value, key)?;
        self.call(&func, value, args)
    }

    /// SetIntegrityLevel(O, level)
    pub fn set_integrity_level(&self, obj: ObjectId, level: IntegrityLevel) -> JsResult<bool> {
        if !self.prevent_extensions(obj)? {
            return Ok(false);
        }
        let keys = self.own_property_keys(obj)?;
        for key in keys {
            let desc = match level {
                IntegrityLevel::Sealed => PropertyDescriptor {
                    configurable: Some(false),
                    ..PropertyDescriptor::default()
                },
                IntegrityLevel::Frozen => {
                    let Some(current) = self.get_own_property(obj, &key)? else {
                        continue;
                    };
                    if current.is_accessor_descriptor() {
                        PropertyDescriptor {
                            configurable: Some(false),
                            ..PropertyDescriptor::default()
                        }
                    } else {
                        PropertyDescriptor {
                            configurable: Some(false),
                            writable: Some(false),
                            ..PropertyDescriptor::default()
                        }
                    }
                }
            };
            self.define_property_or_throw(obj, &key, desc)?;
        }
        Ok(true)
    }

    /// TestIntegrityLevel(O, level)
    pub fn test_integrity_level(&self, obj: ObjectId, level: IntegrityLevel) -> JsResult<bool> {
        if self.is_extensible(obj)? {
            return Ok(false);
        }
        for key in self.own_property_keys(obj)? {
            if let Some(current) = self.get_own_property(obj, &key)? {
                if current.configurable == Some(true) {
                    return Ok(false);
                }
                if level == IntegrityLevel::Frozen
                    && current.is_data_descriptor()
                    && current.writable == Some(true)
                {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// LengthOfArrayLike(obj)
    pub fn length_of_array_like(&self, obj: ObjectId) -> JsResult<u64> {
        let length = self.get(obj, &self.key("length"))?;
        self.to_length(&length)
    }

    /// CreateListFromArrayLike(obj)
    pub fn create_list_from_array_like(&self, value: &Value) -> JsResult<Vec<Value>> {
        let Value::Object(obj) = value else {
            return Err(JsError::type_error("CreateListFromArrayLike called on non-object"));
        };
        let len = self.length_of_array_like(*obj)?;
        let mut list = Vec::new();
        for index in 0..len {
            list.push(self.get(*obj, &PropertyKey::from(index as usize))?);
        }
        Ok(list)
    }

    /// EnumerableOwnProperties(O, kind)
    pub fn enumerable_own_properties(
        &self,
        obj: ObjectId,
        kind: PropertyNameKind,
    ) -> JsResult<Vec<Value>> {
        let mut properties = Vec::new();
        for key in self.own_property_keys(obj)? {
            if key.is_symbol() {
                continue;
            }
            let Some(desc) = self.get_own_property(obj, &key)? else {
                continue;
            };
            if desc.enumerable != Some(true) {
                continue;
            }
            match kind {
                PropertyNameKind::Key => properties.push(key.to_value()),
                PropertyNameKind::Value => properties.push(self.get(obj, &key)?),
                PropertyNameKind::KeyValue => {
                    let value = self.get(obj, &key)?;
                    let entry = self.create_array_from_list(vec![key.to_value(), value])?;
                    properties.push(Value::Object(entry));
                }
            }
        }
        Ok(properties)
    }

    /// CopyDataProperties(target, source, excludedItems)
    pub fn copy_data_properties(
        &self,
        target: ObjectId,
        source: &Value,
        excluded: &[PropertyKey],
    ) -> JsResult<()> {
        if source.is_nullish() {
            return Ok(());
        }
        let from = self.to_object(source)?;
        for key in self.own_property_keys(from)? {
            if excluded.contains(&key) {
                continue;
            }
            if let Some(desc) = self.get_own_property(from, &key)? {
                if desc.enumerable == Some(true) {
                    let value = self.get(from, &key)?;
                    self.create_data_property_or_throw(target, key, value)?;
                }
            }
        }
        Ok(())
    }

    /// GetFunctionRealm(obj)
    pub fn get_function_realm(&self, obj: ObjectId) -> JsResult<RealmId> {
        enum Next {
            Realm(RealmId),
            Follow(ObjectId),
            Revoked,
            Current,
        }
        let next = self.object(obj, |d| match &d.kind {
            ObjectKind::Function(f) => Next::Realm(f.realm),
            ObjectKind::Builtin(b) => Next::Realm(b.realm),
            ObjectKind::BoundFunction(b) => Next::Follow(b.target),
            ObjectKind::Proxy(p) => p.target.map_or(Next::Revoked, Next::Follow),
            _ => Next::Current,
        })?;
        match next {
            Next::Realm(realm) => Ok(realm),
            Next::Follow(target) => self.get_function_realm(target),
            Next::Revoked => Err(JsError::type_error(
                "Cannot get the realm of a revoked proxy",
            )),
            Next::Current => Ok(self.current_realm_id()),
        }
    }

    /// GetPrototypeFromConstructor(constructor, intrinsicDefaultProto)
    pub fn get_prototype_from_constructor(
        &self,
        constructor: ObjectId,
        fallback: fn(&Intrinsics) -> ObjectId,
    ) -> JsResult<ObjectId> {
        match self.get(constructor, &self.key("prototype"))? {
            Value::Object(proto) => Ok(proto),
            _ => {
                let realm = self.get_function_realm(constructor)?;
                Ok(fallback(&self.realm(realm)?.intrinsics))
            }
        }
    }

    /// OrdinaryCreateFromConstructor(constructor, intrinsicDefaultProto)
    pub fn ordinary_create_from_constructor(
        &self,
        constructor: Option<ObjectId>,
        fallback: fn(&Intrinsics) -> ObjectId,
        kind: ObjectKind,
    ) -> JsResult<ObjectId> {
        let proto = match constructor {
            Some(ctor) => self.get_prototype_from_constructor(ctor, fallback)?,
            None => self.intrinsic(fallback)?,
        };
        Ok(self.object_create(Some(proto), kind))
    }

    /// SpeciesConstructor(O, defaultConstructor)
    pub fn species_constructor(&self, obj: ObjectId, default: ObjectId) -> JsResult<ObjectId> {
        let ctor = self.get(obj, &self.key("constructor"))?;
        let ctor = match ctor {
            Value::Undefined => return Ok(default),
            Value::Object(ctor) => ctor,
            _ => return Err(JsError::type_error("object.constructor is not an object")),
        };
        let species = self.get(ctor, &PropertyKey::Symbol(self.well_known().species.cheap_clone()))?;
        match species {
            Value::Undefined | Value::Null => Ok(default),
            Value::Object(s) if self.is_constructor(&Value::Object(s)) => Ok(s),
            _ => Err(JsError::type_error("object.constructor[Symbol.species] is not a constructor")),
        }
    }
}
