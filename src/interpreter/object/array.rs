//! Array exotic objects
//!
//! `length` is an ordinary data property; [[DefineOwnProperty]] keeps it one
//! past the greatest index and truncates from the top when it shrinks.

use crate::error::{JsError, JsResult};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{PropertyKey, Value};

use super::ordinary;
use super::property::{Property, PropertyDescriptor};
use super::{InternalMethods, ObjectKind};

/// Largest valid array length.
pub const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;

pub struct ArrayMethods;

impl InternalMethods for ArrayMethods {
    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        if key.eq_str("length") {
            return array_set_length(interp, obj, desc);
        }
        let Some(index) = key.as_index() else {
            return ordinary::define_own_property(interp, obj, key, desc);
        };
        let length_key = interp.key("length");
        let (length, length_writable) = length_state(interp, obj, &length_key)?;
        if index >= length && !length_writable {
            return Ok(false);
        }
        if !ordinary::define_own_property(interp, obj, key, desc)? {
            return Ok(false);
        }
        if index >= length {
            let new_length = PropertyDescriptor::value_only(Value::Number(f64::from(index) + 1.0));
            ordinary::define_own_property(interp, obj, &length_key, new_length)?;
        }
        Ok(true)
    }
}

/// The stored length and whether it is writable.
fn length_state(interp: &Interpreter, obj: ObjectId, length_key: &PropertyKey) -> JsResult<(u32, bool)> {
    interp.object(obj, |d| match d.properties.get(length_key) {
        Some(property) => {
            let length = property.value().and_then(Value::as_number).unwrap_or(0.0);
            (length as u32, property.writable())
        }
        None => (0, true),
    })
}

/// ArraySetLength(A, Desc)
fn array_set_length(interp: &Interpreter, obj: ObjectId, desc: PropertyDescriptor) -> JsResult<bool> {
    let length_key = interp.key("length");
    let Some(value) = &desc.value else {
        return ordinary::define_own_property(interp, obj, &length_key, desc);
    };
    let new_len = interp.to_uint32(value)?;
    let number_len = interp.to_number(value)?;
    if f64::from(new_len) != number_len {
        return Err(JsError::range_error("Invalid array length"));
    }
    let mut new_len_desc = desc.clone();
    new_len_desc.value = Some(Value::Number(f64::from(new_len)));

    let (old_len, old_writable) = length_state(interp, obj, &length_key)?;
    if new_len >= old_len {
        return ordinary::define_own_property(interp, obj, &length_key, new_len_desc);
    }
    if !old_writable {
        return Ok(false);
    }
    let new_writable = new_len_desc.writable != Some(false);
    if !new_writable {
        new_len_desc.writable = Some(true);
    }
    if !ordinary::define_own_property(interp, obj, &length_key, new_len_desc.clone())? {
        return Ok(false);
    }

    let mut doomed: Vec<u32> = interp.object(obj, |d| {
        d.properties
            .keys()
            .filter_map(PropertyKey::as_index)
            .filter(|index| *index >= new_len)
            .collect()
    })?;
    doomed.sort_unstable_by(|a, b| b.cmp(a));
    for index in doomed {
        if !interp.delete(obj, &PropertyKey::Index(index))? {
            new_len_desc.value = Some(Value::Number(f64::from(index) + 1.0));
            if !new_writable {
                new_len_desc.writable = Some(false);
            }
            ordinary::define_own_property(interp, obj, &length_key, new_len_desc)?;
            return Ok(false);
        }
    }
    if !new_writable {
        let freeze = PropertyDescriptor {
            writable: Some(false),
            ..PropertyDescriptor::default()
        };
        ordinary::define_own_property(interp, obj, &length_key, freeze)?;
    }
    Ok(true)
}

impl Interpreter {
    /// ArrayCreate(length, proto)
    pub fn array_create(&self, length: u64, proto: Option<ObjectId>) -> JsResult<ObjectId> {
        if length > MAX_ARRAY_LENGTH {
            return Err(JsError::range_error("Invalid array length"));
        }
        let proto = match proto {
            Some(proto) => proto,
            None => self.intrinsic(|i| i.array_prototype)?,
        };
        let array = self.object_create(Some(proto), ObjectKind::Array);
        self.insert_property(
            array,
            self.key("length"),
            Property::data(Value::Number(length as f64), true, false, false),
        )?;
        Ok(array)
    }

    /// CreateArrayFromList(elements)
    pub fn create_array_from_list(&self, elements: Vec<Value>) -> JsResult<ObjectId> {
        let length = elements.len();
        let array = self.array_create(0, None)?;
        let length_key = self.key("length");
        self.object_mut(array, |d| {
            for (index, value) in elements.into_iter().enumerate() {
                d.properties
                    .insert(PropertyKey::from(index), Property::plain(value));
            }
            if let Some(property) = d.properties.get_mut(&length_key) {
                property.slot = super::Slot::Data {
                    value: Value::Number(length as f64),
                    writable: true,
                };
            }
        })?;
        Ok(array)
    }
}
