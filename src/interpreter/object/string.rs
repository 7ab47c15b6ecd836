//! String exotic objects
//!
//! A `String` wrapper exposes each UTF-16 code unit of its primitive value as
//! a read-only, enumerable index property and has a non-writable `length`.

use crate::error::JsResult;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{JsString, PropertyKey, Value};

use super::ordinary;
use super::property::{is_compatible_property_descriptor, Property, PropertyDescriptor};
use super::{InternalMethods, ObjectKind};

pub struct StringMethods;

fn primitive(interp: &Interpreter, obj: ObjectId) -> JsResult<JsString> {
    interp.object(obj, |d| match &d.kind {
        ObjectKind::String(s) => s.clone(),
        _ => JsString::default(),
    })
}

/// StringGetOwnProperty(S, P)
fn string_get_own_property(
    interp: &Interpreter,
    obj: ObjectId,
    key: &PropertyKey,
) -> JsResult<Option<PropertyDescriptor>> {
    let Some(index) = key.as_index() else {
        return Ok(None);
    };
    let units = primitive(interp, obj)?.code_units();
    Ok(units.get(index as usize).map(|unit| {
        PropertyDescriptor::data(
            Value::String(JsString::from_utf16(&[*unit])),
            false,
            true,
            false,
        )
    }))
}

impl InternalMethods for StringMethods {
    fn get_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        if let Some(desc) = ordinary::get_own_property(interp, obj, key)? {
            return Ok(Some(desc));
        }
        string_get_own_property(interp, obj, key)
    }

    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        if let Some(current) = string_get_own_property(interp, obj, key)? {
            let extensible = interp.is_extensible(obj)?;
            return Ok(is_compatible_property_descriptor(extensible, &desc, Some(&current)));
        }
        ordinary::define_own_property(interp, obj, key, desc)
    }

    fn own_property_keys(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let length = primitive(interp, obj)?.utf16_len();
        let own = ordinary::own_property_keys(interp, obj)?;
        let mut keys: Vec<PropertyKey> = (0..length).map(PropertyKey::from).collect();
        keys.extend(own.into_iter().filter(|key| match key.as_index() {
            Some(index) => index as usize >= length,
            None => true,
        }));
        Ok(keys)
    }
}

impl Interpreter {
    /// StringCreate(value, prototype)
    pub fn string_create(&self, value: JsString, proto: Option<ObjectId>) -> JsResult<ObjectId> {
        let proto = match proto {
            Some(proto) => proto,
            None => self.intrinsic(|i| i.string_prototype)?,
        };
        let length = value.utf16_len();
        let obj = self.object_create(Some(proto), ObjectKind::String(value));
        self.insert_property(
            obj,
            self.key("length"),
            Property::data(Value::Number(length as f64), false, false, false),
        )?;
        Ok(obj)
    }
}
