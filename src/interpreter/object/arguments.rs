//! Arguments exotic objects
//!
//! Sloppy functions with simple parameter lists get a mapped arguments
//! object whose index properties alias the parameter bindings until the
//! mapping is broken by a redefinition or deletion.

use rustc_hash::FxHashSet;

use crate::error::JsResult;
use crate::interpreter::{EnvId, Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

use super::ordinary;
use super::property::{Property, PropertyDescriptor};
use super::{InternalMethods, ObjectKind};

/// The parameter map: index `i` aliases `names[i]` in `env` while `Some`.
pub struct MappedArguments {
    pub env: EnvId,
    pub names: Vec<Option<JsString>>,
}

pub struct MappedArgumentsMethods;

/// The environment and binding name `key` is mapped to, if any.
fn mapping(interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<Option<(EnvId, JsString)>> {
    let Some(index) = key.as_index() else {
        return Ok(None);
    };
    interp.object(obj, |d| match &d.kind {
        ObjectKind::Arguments(Some(map)) => map
            .names
            .get(index as usize)
            .and_then(Option::as_ref)
            .map(|name| (map.env, name.cheap_clone())),
        _ => None,
    })
}

fn unmap(interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<()> {
    let Some(index) = key.as_index() else {
        return Ok(());
    };
    interp.object_mut(obj, |d| {
        if let ObjectKind::Arguments(Some(map)) = &mut d.kind {
            if let Some(slot) = map.names.get_mut(index as usize) {
                *slot = None;
            }
        }
    })
}

impl InternalMethods for MappedArgumentsMethods {
    fn get_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let Some(mut desc) = ordinary::get_own_property(interp, obj, key)? else {
            return Ok(None);
        };
        if let Some((env, name)) = mapping(interp, obj, key)? {
            desc.value = Some(interp.get_binding_value(env, &name, false)?);
        }
        Ok(Some(desc))
    }

    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let mapped = mapping(interp, obj, key)?;
        let mut new_arg_desc = desc.clone();
        if let Some((env, name)) = &mapped {
            if desc.is_data_descriptor() && desc.value.is_none() && desc.writable == Some(false) {
                new_arg_desc.value = Some(interp.get_binding_value(*env, name, false)?);
            }
        }
        if !ordinary::define_own_property(interp, obj, key, new_arg_desc)? {
            return Ok(false);
        }
        if let Some((env, name)) = mapped {
            if desc.is_accessor_descriptor() {
                unmap(interp, obj, key)?;
            } else {
                if let Some(value) = desc.value {
                    interp.set_mutable_binding(env, &name, value, false)?;
                }
                if desc.writable == Some(false) {
                    unmap(interp, obj, key)?;
                }
            }
        }
        Ok(true)
    }

    fn get(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        receiver: &Value,
    ) -> JsResult<Value> {
        match mapping(interp, obj, key)? {
            Some((env, name)) => interp.get_binding_value(env, &name, false),
            None => ordinary::get(interp, obj, key, receiver),
        }
    }

    fn set(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> JsResult<bool> {
        let same_receiver = matches!(receiver, Value::Object(r) if *r == obj);
        if same_receiver {
            if let Some((env, name)) = mapping(interp, obj, key)? {
                interp.set_mutable_binding(env, &name, value.cheap_clone(), false)?;
            }
        }
        ordinary::set(interp, obj, key, value, receiver)
    }

    fn delete(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        let result = ordinary::delete(interp, obj, key)?;
        if result {
            unmap(interp, obj, key)?;
        }
        Ok(result)
    }
}

impl Interpreter {
    fn arguments_object(&self, args: &[Value], map: Option<Box<MappedArguments>>) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.object_prototype)?;
        let values = self.intrinsic(|i| i.array_prototype_values)?;
        let obj = self.object_create(Some(proto), ObjectKind::Arguments(map));
        self.object_mut(obj, |d| {
            for (index, value) in args.iter().enumerate() {
                d.properties
                    .insert(PropertyKey::from(index), Property::plain(value.cheap_clone()));
            }
        })?;
        self.insert_property(
            obj,
            self.key("length"),
            Property::hidden(Value::Number(args.len() as f64)),
        )?;
        self.insert_property(
            obj,
            PropertyKey::Symbol(self.well_known().iterator.cheap_clone()),
            Property::hidden(Value::Object(values)),
        )?;
        Ok(obj)
    }

    /// CreateUnmappedArgumentsObject(argumentsList)
    pub(crate) fn create_unmapped_arguments_object(&self, args: &[Value]) -> JsResult<ObjectId> {
        let obj = self.arguments_object(args, None)?;
        let thrower = self.intrinsic(|i| i.throw_type_error)?;
        self.insert_property(
            obj,
            self.key("callee"),
            Property::accessor(Some(thrower), Some(thrower), false, false),
        )?;
        Ok(obj)
    }

    /// CreateMappedArgumentsObject(func, formals, argumentsList, env)
    pub(crate) fn create_mapped_arguments_object(
        &self,
        func: ObjectId,
        formals: &[JsString],
        args: &[Value],
        env: EnvId,
    ) -> JsResult<ObjectId> {
        let mut names: Vec<Option<JsString>> = vec![None; args.len()];
        let mut mapped_names = FxHashSet::default();
        for (index, name) in formals.iter().enumerate().rev() {
            if mapped_names.insert(name.cheap_clone()) {
                if let Some(slot) = names.get_mut(index) {
                    *slot = Some(name.cheap_clone());
                }
            }
        }
        let obj = self.arguments_object(args, Some(Box::new(MappedArguments { env, names })))?;
        self.insert_property(obj, self.key("callee"), Property::hidden(Value::Object(func)))?;
        Ok(obj)
    }
}
