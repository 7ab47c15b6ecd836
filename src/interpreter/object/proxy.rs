//! Proxy exotic objects
//!
//! Every internal method looks up its trap on the handler, falls back to the
//! target when the trap is absent, and checks the trap result against the
//! target's invariants. Revocation clears both target and handler; any later
//! operation on the proxy throws.

use rustc_hash::FxHashSet;

use crate::error::{JsError, JsResult};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, PropertyKey, Value};

use super::property::{is_compatible_property_descriptor, PropertyDescriptor};
use super::{InternalMethods, ObjectKind};

#[derive(Debug, Clone, Copy)]
pub struct ProxyData {
    /// `None` once revoked.
    pub target: Option<ObjectId>,
    pub handler: Option<ObjectId>,
    pub callable: bool,
    pub constructor: bool,
}

pub struct ProxyMethods;

fn invariant(message: &str) -> JsError {
    JsError::type_error(format!("'{}' on proxy: trap result violates an invariant", message))
}

/// The target and handler of a live proxy.
fn parts(interp: &Interpreter, proxy: ObjectId, operation: &str) -> JsResult<(ObjectId, ObjectId)> {
    let data = interp.object(proxy, |d| match &d.kind {
        ObjectKind::Proxy(p) => Some(*p),
        _ => None,
    })?;
    match data {
        Some(ProxyData {
            target: Some(target),
            handler: Some(handler),
            ..
        }) => Ok((target, handler)),
        Some(_) => Err(JsError::type_error(format!(
            "Cannot perform '{}' on a proxy that has been revoked",
            operation
        ))),
        None => Err(JsError::internal("not a proxy")),
    }
}

fn trap(interp: &Interpreter, handler: ObjectId, name: &str) -> JsResult<Option<Value>> {
    interp.get_method(&Value::Object(handler), &interp.key(name))
}

impl InternalMethods for ProxyMethods {
    fn get_prototype_of(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Option<ObjectId>> {
        let (target, handler) = parts(interp, obj, "getPrototypeOf")?;
        let Some(trap) = trap(interp, handler, "getPrototypeOf")? else {
            return interp.get_prototype_of(target);
        };
        let result = interp.call(&trap, &Value::Object(handler), &[Value::Object(target)])?;
        let handler_proto = match result {
            Value::Object(proto) => Some(proto),
            Value::Null => None,
            _ => return Err(invariant("getPrototypeOf")),
        };
        if interp.is_extensible(target)? {
            return Ok(handler_proto);
        }
        if interp.get_prototype_of(target)? != handler_proto {
            return Err(invariant("getPrototypeOf"));
        }
        Ok(handler_proto)
    }

    fn set_prototype_of(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "setPrototypeOf")?;
        let Some(trap) = trap(interp, handler, "setPrototypeOf")? else {
            return interp.set_prototype_of(target, proto);
        };
        let args = [Value::Object(target), Value::from(proto)];
        if !interp.call(&trap, &Value::Object(handler), &args)?.to_boolean() {
            return Ok(false);
        }
        if interp.is_extensible(target)? {
            return Ok(true);
        }
        if interp.get_prototype_of(target)? != proto {
            return Err(invariant("setPrototypeOf"));
        }
        Ok(true)
    }

    fn is_extensible(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "isExtensible")?;
        let Some(trap) = trap(interp, handler, "isExtensible")? else {
            return interp.is_extensible(target);
        };
        let result = interp
            .call(&trap, &Value::Object(handler), &[Value::Object(target)])?
            .to_boolean();
        if result != interp.is_extensible(target)? {
            return Err(invariant("isExtensible"));
        }
        Ok(result)
    }

    fn prevent_extensions(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "preventExtensions")?;
        let Some(trap) = trap(interp, handler, "preventExtensions")? else {
            return interp.prevent_extensions(target);
        };
        let result = interp
            .call(&trap, &Value::Object(handler), &[Value::Object(target)])?
            .to_boolean();
        if result && interp.is_extensible(target)? {
            return Err(invariant("preventExtensions"));
        }
        Ok(result)
    }

    fn get_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let (target, handler) = parts(interp, obj, "getOwnPropertyDescriptor")?;
        let Some(trap) = trap(interp, handler, "getOwnPropertyDescriptor")? else {
            return interp.get_own_property(target, key);
        };
        let result = interp.call(
            &trap,
            &Value::Object(handler),
            &[Value::Object(target), key.to_value()],
        )?;
        if !result.is_object() && !result.is_undefined() {
            return Err(invariant("getOwnPropertyDescriptor"));
        }
        let target_desc = interp.get_own_property(target, key)?;
        if result.is_undefined() {
            let Some(target_desc) = target_desc else {
                return Ok(None);
            };
            if target_desc.configurable == Some(false) || !interp.is_extensible(target)? {
                return Err(invariant("getOwnPropertyDescriptor"));
            }
            return Ok(None);
        }
        let extensible = interp.is_extensible(target)?;
        let mut result_desc = interp.to_property_descriptor(&result)?;
        result_desc.complete();
        if !is_compatible_property_descriptor(extensible, &result_desc, target_desc.as_ref()) {
            return Err(invariant("getOwnPropertyDescriptor"));
        }
        if result_desc.configurable == Some(false) {
            match &target_desc {
                None => return Err(invariant("getOwnPropertyDescriptor")),
                Some(t) if t.configurable == Some(true) => {
                    return Err(invariant("getOwnPropertyDescriptor"));
                }
                Some(t) => {
                    if result_desc.writable == Some(false) && t.writable == Some(true) {
                        return Err(invariant("getOwnPropertyDescriptor"));
                    }
                }
            }
        }
        Ok(Some(result_desc))
    }

    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "defineProperty")?;
        let Some(trap) = trap(interp, handler, "defineProperty")? else {
            return interp.define_own_property(target, key, desc);
        };
        let desc_obj = interp.from_property_descriptor(Some(&desc))?;
        let args = [Value::Object(target), key.to_value(), desc_obj];
        if !interp.call(&trap, &Value::Object(handler), &args)?.to_boolean() {
            return Ok(false);
        }
        let target_desc = interp.get_own_property(target, key)?;
        let extensible = interp.is_extensible(target)?;
        let setting_config_false = desc.configurable == Some(false);
        match target_desc {
            None => {
                if !extensible || setting_config_false {
                    return Err(invariant("defineProperty"));
                }
            }
            Some(target_desc) => {
                if !is_compatible_property_descriptor(extensible, &desc, Some(&target_desc)) {
                    return Err(invariant("defineProperty"));
                }
                if setting_config_false && target_desc.configurable == Some(true) {
                    return Err(invariant("defineProperty"));
                }
                if target_desc.is_data_descriptor()
                    && target_desc.configurable == Some(false)
                    && target_desc.writable == Some(true)
                    && desc.writable == Some(false)
                {
                    return Err(invariant("defineProperty"));
                }
            }
        }
        Ok(true)
    }

    fn has_property(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "has")?;
        let Some(trap) = trap(interp, handler, "has")? else {
            return interp.has_property(target, key);
        };
        let result = interp
            .call(
                &trap,
                &Value::Object(handler),
                &[Value::Object(target), key.to_value()],
            )?
            .to_boolean();
        if !result {
            if let Some(target_desc) = interp.get_own_property(target, key)? {
                if target_desc.configurable == Some(false) || !interp.is_extensible(target)? {
                    return Err(invariant("has"));
                }
            }
        }
        Ok(result)
    }

    fn get(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        receiver: &Value,
    ) -> JsResult<Value> {
        let (target, handler) = parts(interp, obj, "get")?;
        let Some(trap) = trap(interp, handler, "get")? else {
            return interp.get_with_receiver(target, key, receiver);
        };
        let result = interp.call(
            &trap,
            &Value::Object(handler),
            &[Value::Object(target), key.to_value(), receiver.cheap_clone()],
        )?;
        if let Some(target_desc) = interp.get_own_property(target, key)? {
            if target_desc.configurable == Some(false) {
                if target_desc.is_data_descriptor()
                    && target_desc.writable == Some(false)
                    && !result.same_value(target_desc.value.as_ref().unwrap_or(&Value::Undefined))
                {
                    return Err(invariant("get"));
                }
                if target_desc.is_accessor_descriptor()
                    && matches!(target_desc.get, Some(Value::Undefined) | None)
                    && !result.is_undefined()
                {
                    return Err(invariant("get"));
                }
            }
        }
        Ok(result)
    }

    fn set(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "set")?;
        let Some(trap) = trap(interp, handler, "set")? else {
            return interp.set_with_receiver(target, key, value, receiver);
        };
        let args = [
            Value::Object(target),
            key.to_value(),
            value.cheap_clone(),
            receiver.cheap_clone(),
        ];
        if !interp.call(&trap, &Value::Object(handler), &args)?.to_boolean() {
            return Ok(false);
        }
        if let Some(target_desc) = interp.get_own_property(target, key)? {
            if target_desc.configurable == Some(false) {
                if target_desc.is_data_descriptor()
                    && target_desc.writable == Some(false)
                    && !value.same_value(target_desc.value.as_ref().unwrap_or(&Value::Undefined))
                {
                    return Err(invariant("set"));
                }
                if target_desc.is_accessor_descriptor()
                    && matches!(target_desc.set, Some(Value::Undefined) | None)
                {
                    return Err(invariant("set"));
                }
            }
        }
        Ok(true)
    }

    fn delete(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let (target, handler) = parts(interp, obj, "deleteProperty")?;
        let Some(trap) = trap(interp, handler, "deleteProperty")? else {
            return interp.delete(target, key);
        };
        let result = interp
            .call(
                &trap,
                &Value::Object(handler),
                &[Value::Object(target), key.to_value()],
            )?
            .to_boolean();
        if !result {
            return Ok(false);
        }
        let Some(target_desc) = interp.get_own_property(target, key)? else {
            return Ok(true);
        };
        if target_desc.configurable == Some(false) || !interp.is_extensible(target)? {
            return Err(invariant("deleteProperty"));
        }
        Ok(true)
    }

    fn own_property_keys(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let (target, handler) = parts(interp, obj, "ownKeys")?;
        let Some(trap) = trap(interp, handler, "ownKeys")? else {
            return interp.own_property_keys(target);
        };
        let result = interp.call(&trap, &Value::Object(handler), &[Value::Object(target)])?;
        let Value::Object(_) = result else {
            return Err(JsError::type_error("CreateListFromArrayLike called on non-object"));
        };
        let mut keys = Vec::new();
        let mut seen = FxHashSet::default();
        for element in interp.create_list_from_array_like(&result)? {
            let key = match element {
                Value::String(s) => PropertyKey::from(s),
                Value::Symbol(s) => PropertyKey::Symbol(s),
                other => {
                    return Err(JsError::type_error(format!(
                        "{} is not a valid property name",
                        interp.display(&other)
                    )));
                }
            };
            if !seen.insert(key.cheap_clone()) {
                return Err(JsError::type_error(format!(
                    "'ownKeys' on proxy: trap returned duplicate entries ('{}')",
                    key
                )));
            }
            keys.push(key);
        }

        let extensible = interp.is_extensible(target)?;
        let mut configurable_keys = Vec::new();
        let mut nonconfigurable_keys = Vec::new();
        for key in interp.own_property_keys(target)? {
            match interp.get_own_property(target, &key)? {
                Some(desc) if desc.configurable == Some(false) => nonconfigurable_keys.push(key),
                _ => configurable_keys.push(key),
            }
        }
        if extensible && nonconfigurable_keys.is_empty() {
            return Ok(keys);
        }
        let mut unchecked = seen;
        for key in &nonconfigurable_keys {
            if !unchecked.remove(key) {
                return Err(invariant("ownKeys"));
            }
        }
        if extensible {
            return Ok(keys);
        }
        for key in &configurable_keys {
            if !unchecked.remove(key) {
                return Err(invariant("ownKeys"));
            }
        }
        if !unchecked.is_empty() {
            return Err(invariant("ownKeys"));
        }
        Ok(keys)
    }
}

impl Interpreter {
    /// ProxyCreate(target, handler)
    pub fn proxy_create(&self, target: &Value, handler: &Value) -> JsResult<ObjectId> {
        let (Value::Object(target_obj), Value::Object(handler_obj)) = (target, handler) else {
            return Err(JsError::type_error(
                "Cannot create proxy with a non-object as target or handler",
            ));
        };
        let data = ProxyData {
            target: Some(*target_obj),
            handler: Some(*handler_obj),
            callable: self.is_callable(target),
            constructor: self.is_constructor(target),
        };
        Ok(self.object_create(None, ObjectKind::Proxy(data)))
    }

    /// Clear target and handler of a proxy.
    pub(crate) fn proxy_revoke(&self, proxy: ObjectId) -> JsResult<()> {
        self.object_mut(proxy, |d| {
            if let ObjectKind::Proxy(p) = &mut d.kind {
                p.target = None;
                p.handler = None;
            }
        })
    }

    /// [[Call]] of a proxy
    pub(crate) fn call_proxy(&self, proxy: ObjectId, this: &Value, args: &[Value]) -> JsResult<Value> {
        let (target, handler) = parts(self, proxy, "apply")?;
        let Some(trap) = trap(self, handler, "apply")? else {
            return self.call(&Value::Object(target), this, args);
        };
        let arg_array = self.create_array_from_list(args.to_vec())?;
        self.call(
            &trap,
            &Value::Object(handler),
            &[Value::Object(target), this.cheap_clone(), Value::Object(arg_array)],
        )
    }

    /// [[Construct]] of a proxy
    pub(crate) fn construct_proxy(
        &self,
        proxy: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> JsResult<ObjectId> {
        let (target, handler) = parts(self, proxy, "construct")?;
        let Some(trap) = trap(self, handler, "construct")? else {
            return self.construct(target, args, Some(new_target));
        };
        let arg_array = self.create_array_from_list(args.to_vec())?;
        let result = self.call(
            &trap,
            &Value::Object(handler),
            &[
                Value::Object(target),
                Value::Object(arg_array),
                Value::Object(new_target),
            ],
        )?;
        match result {
            Value::Object(obj) => Ok(obj),
            _ => Err(JsError::type_error("proxy [[Construct]] must return an object")),
        }
    }
}
