//! Module namespace exotic objects

use crate::error::JsResult;
use crate::interpreter::module::ModuleId;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{JsString, PropertyKey, Value};

use super::immutable::set_immutable_prototype;
use super::ordinary;
use super::property::PropertyDescriptor;
use super::InternalMethods;
use super::ObjectKind;

/// [[Module]] and [[Exports]], the export names sorted by code units.
pub struct NamespaceData {
    pub module: ModuleId,
    pub exports: Vec<JsString>,
}

pub struct NamespaceMethods;

/// The export `key` names, or `None` for symbols and unknown names.
fn export_of(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
) -> JsResult<Option<(ModuleId, JsString)>> {
    let Some(name) = key.to_js_string() else {
        return Ok(None);
    };
    interp.object(obj, |d| match &d.kind {
        ObjectKind::Namespace(ns) => ns
            .exports
            .iter()
            .find(|export| **export == name)
            .map(|export| (ns.module, export.clone())),
        _ => None,
    })
}

impl InternalMethods for NamespaceMethods {
    fn get_prototype_of(&self, _interp: &Interpreter, _obj: ObjectId) -> JsResult<Option<ObjectId>> {
        Ok(None)
    }

    fn set_prototype_of(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<bool> {
        set_immutable_prototype(interp, obj, proto)
    }

    fn is_extensible(&self, _interp: &Interpreter, _obj: ObjectId) -> JsResult<bool> {
        Ok(false)
    }

    fn prevent_extensions(&self, _interp: &Interpreter, _obj: ObjectId) -> JsResult<bool> {
        Ok(true)
    }

    fn get_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        if key.is_symbol() {
            return ordinary::get_own_property(interp, obj, key);
        }
        let Some((module, name)) = export_of(interp, obj, key)? else {
            return Ok(None);
        };
        let value = interp.module_export_value(module, &name)?;
        Ok(Some(PropertyDescriptor::data(value, true, true, false)))
    }

    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        if key.is_symbol() {
            return ordinary::define_own_property(interp, obj, key, desc);
        }
        let Some(current) = self.get_own_property(interp, obj, key)? else {
            return Ok(false);
        };
        if desc.configurable == Some(true)
            || desc.enumerable == Some(false)
            || desc.is_accessor_descriptor()
            || desc.writable == Some(false)
        {
            return Ok(false);
        }
        Ok(match (&desc.value, &current.value) {
            (Some(new), Some(old)) => new.same_value(old),
            _ => true,
        })
    }

    fn has_property(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        if key.is_symbol() {
            return ordinary::has_property(interp, obj, key);
        }
        Ok(export_of(interp, obj, key)?.is_some())
    }

    fn get(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        receiver: &Value,
    ) -> JsResult<Value> {
        if key.is_symbol() {
            return ordinary::get(interp, obj, key, receiver);
        }
        match export_of(interp, obj, key)? {
            Some((module, name)) => interp.module_export_value(module, &name),
            None => Ok(Value::Undefined),
        }
    }

    fn set(
        &self,
        _interp: &Interpreter,
        _obj: ObjectId,
        _key: &PropertyKey,
        _value: Value,
        _receiver: &Value,
    ) -> JsResult<bool> {
        Ok(false)
    }

    fn delete(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        if key.is_symbol() {
            return ordinary::delete(interp, obj, key);
        }
        Ok(export_of(interp, obj, key)?.is_none())
    }

    fn own_property_keys(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let mut keys: Vec<PropertyKey> = interp.object(obj, |d| match &d.kind {
            ObjectKind::Namespace(ns) => ns.exports.iter().cloned().map(PropertyKey::from).collect(),
            _ => Vec::new(),
        })?;
        keys.extend(
            ordinary::own_property_keys(interp, obj)?
                .into_iter()
                .filter(PropertyKey::is_symbol),
        );
        Ok(keys)
    }
}

impl Interpreter {
    /// ModuleNamespaceCreate(module, exports)
    pub(crate) fn module_namespace_create(
        &self,
        module: ModuleId,
        mut exports: Vec<JsString>,
    ) -> JsResult<ObjectId> {
        exports.sort_by(|a, b| a.code_units().cmp(&b.code_units()));
        let obj = self.object_create(
            None,
            ObjectKind::Namespace(Box::new(NamespaceData { module, exports })),
        );
        self.insert_property(
            obj,
            PropertyKey::Symbol(self.well_known().to_string_tag.clone()),
            super::Property::frozen(Value::from("Module")),
        )?;
        self.object_mut(obj, |d| d.extensible = false)?;
        Ok(obj)
    }
}
