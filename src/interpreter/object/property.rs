//! Property descriptors and stored properties
//!
//! `PropertyDescriptor` is the ECMAScript record with every field optional: absent
//! is distinct from present-and-undefined. `Property` is what an object
//! actually stores, always complete.

use crate::error::JsResult;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, PropertyKey, Value};

use super::PropertyMap;

/// A property as stored in an object's property table.
#[derive(Debug, Clone)]
pub struct Property {
    pub slot: Slot,
    pub enumerable: bool,
    pub configurable: bool,
}

#[derive(Debug, Clone)]
pub enum Slot {
    Data { value: Value, writable: bool },
    Accessor {
        get: Option<ObjectId>,
        set: Option<ObjectId>,
    },
}

impl Property {
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            slot: Slot::Data { value, writable },
            enumerable,
            configurable,
        }
    }

    /// Writable, enumerable, configurable: what CreateDataProperty makes.
    pub fn plain(value: Value) -> Self {
        Self::data(value, true, true, true)
    }

    /// Writable, non-enumerable, configurable: built-in methods.
    pub fn hidden(value: Value) -> Self {
        Self::data(value, true, false, true)
    }

    /// Non-writable, non-enumerable, non-configurable.
    pub fn frozen(value: Value) -> Self {
        Self::data(value, false, false, false)
    }

    pub fn accessor(
        get: Option<ObjectId>,
        set: Option<ObjectId>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            slot: Slot::Accessor { get, set },
            enumerable,
            configurable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.slot, Slot::Accessor { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data { value, .. } => Some(value),
            Slot::Accessor { .. } => None,
        }
    }

    pub fn writable(&self) -> bool {
        matches!(self.slot, Slot::Data { writable: true, .. })
    }

    pub fn to_descriptor(&self) -> PropertyDescriptor {
        let mut desc = PropertyDescriptor {
            enumerable: Some(self.enumerable),
            configurable: Some(self.configurable),
            ..PropertyDescriptor::default()
        };
        match &self.slot {
            Slot::Data { value, writable } => {
                desc.value = Some(value.cheap_clone());
                desc.writable = Some(*writable);
            }
            Slot::Accessor { get, set } => {
                desc.get = Some(function_or_undefined(*get));
                desc.set = Some(function_or_undefined(*set));
            }
        }
        desc
    }
}

fn function_or_undefined(f: Option<ObjectId>) -> Value {
    f.map_or(Value::Undefined, Value::Object)
}

fn accessor_function(value: &Value) -> Option<ObjectId> {
    value.as_object()
}

/// A Property Descriptor record; every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Value>,
    pub set: Option<Value>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// A complete data descriptor.
    pub fn data(value: Value, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Self::default()
        }
    }

    /// `{ [[Value]]: value }` with nothing else present.
    pub fn value_only(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// IsAccessorDescriptor
    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// IsDataDescriptor
    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// IsGenericDescriptor
    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    /// CompletePropertyDescriptor
    pub fn complete(&mut self) {
        if self.is_generic_descriptor() || self.is_data_descriptor() {
            self.value.get_or_insert(Value::Undefined);
            self.writable.get_or_insert(false);
        } else {
            self.get.get_or_insert(Value::Undefined);
            self.set.get_or_insert(Value::Undefined);
        }
        self.enumerable.get_or_insert(false);
        self.configurable.get_or_insert(false);
    }

    /// Every field of the classification present.
    pub fn is_complete(&self) -> bool {
        let attributes = self.enumerable.is_some() && self.configurable.is_some();
        if self.is_accessor_descriptor() {
            attributes && self.get.is_some() && self.set.is_some()
        } else {
            attributes && self.value.is_some() && self.writable.is_some()
        }
    }

    /// A stored property built from this descriptor, absent fields taking
    /// their defaults.
    pub fn to_property(&self) -> Property {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor_descriptor() {
            Property::accessor(
                self.get.as_ref().and_then(accessor_function),
                self.set.as_ref().and_then(accessor_function),
                enumerable,
                configurable,
            )
        } else {
            Property::data(
                self.value.clone().unwrap_or_default(),
                self.writable.unwrap_or(false),
                enumerable,
                configurable,
            )
        }
    }
}

/// The validation half of ValidateAndApplyPropertyDescriptor, also used as
/// IsCompatiblePropertyDescriptor.
pub fn is_compatible_property_descriptor(
    extensible: bool,
    desc: &PropertyDescriptor,
    current: Option<&PropertyDescriptor>,
) -> bool {
    let Some(current) = current else {
        return extensible;
    };
    if current.configurable == Some(false) {
        if desc.configurable == Some(true) {
            return false;
        }
        if let Some(enumerable) = desc.enumerable {
            if Some(enumerable) != current.enumerable {
                return false;
            }
        }
        if !desc.is_generic_descriptor()
            && desc.is_accessor_descriptor() != current.is_accessor_descriptor()
        {
            return false;
        }
        if current.is_accessor_descriptor() {
            if let Some(get) = &desc.get {
                if !same_value_opt(get, current.get.as_ref()) {
                    return false;
                }
            }
            if let Some(set) = &desc.set {
                if !same_value_opt(set, current.set.as_ref()) {
                    return false;
                }
            }
        } else if current.writable == Some(false) {
            if desc.writable == Some(true) {
                return false;
            }
            if let Some(value) = &desc.value {
                if !same_value_opt(value, current.value.as_ref()) {
                    return false;
                }
            }
        }
    }
    true
}

fn same_value_opt(a: &Value, b: Option<&Value>) -> bool {
    a.same_value(b.unwrap_or(&Value::Undefined))
}

/// ValidateAndApplyPropertyDescriptor. `properties` is `None` when only
/// validation is wanted (O is undefined).
pub fn validate_and_apply_property_descriptor(
    properties: Option<&mut PropertyMap>,
    key: &PropertyKey,
    extensible: bool,
    desc: PropertyDescriptor,
    current: Option<&Property>,
) -> bool {
    let current_desc = current.map(Property::to_descriptor);
    if !is_compatible_property_descriptor(extensible, &desc, current_desc.as_ref()) {
        return false;
    }
    let Some(properties) = properties else {
        return true;
    };
    let property = match current {
        None => desc.to_property(),
        Some(current) => merge(current, &desc),
    };
    properties.insert(key.cheap_clone(), property);
    true
}

/// Apply the present fields of `desc` over `current`, converting between
/// data and accessor shapes when the descriptor asks for the other kind.
fn merge(current: &Property, desc: &PropertyDescriptor) -> Property {
    let enumerable = desc.enumerable.unwrap_or(current.enumerable);
    let configurable = desc.configurable.unwrap_or(current.configurable);
    let slot = match &current.slot {
        Slot::Data { value, writable } if !desc.is_accessor_descriptor() => Slot::Data {
            value: desc.value.clone().unwrap_or_else(|| value.cheap_clone()),
            writable: desc.writable.unwrap_or(*writable),
        },
        Slot::Accessor { get, set } if !desc.is_data_descriptor() => Slot::Accessor {
            get: desc.get.as_ref().map_or(*get, accessor_function),
            set: desc.set.as_ref().map_or(*set, accessor_function),
        },
        Slot::Data { .. } => Slot::Accessor {
            get: desc.get.as_ref().and_then(accessor_function),
            set: desc.set.as_ref().and_then(accessor_function),
        },
        Slot::Accessor { .. } => Slot::Data {
            value: desc.value.clone().unwrap_or_default(),
            writable: desc.writable.unwrap_or(false),
        },
    };
    Property {
        slot,
        enumerable,
        configurable,
    }
}

impl Interpreter {
    /// ToPropertyDescriptor
    pub(crate) fn to_property_descriptor(&self, value: &Value) -> JsResult<PropertyDescriptor> {
        let Value::Object(obj) = value else {
            return Err(crate::error::JsError::type_error(
                "Property description must be an object",
            ));
        };
        let obj = *obj;
        let mut desc = PropertyDescriptor::default();
        let enumerable = self.key("enumerable");
        if self.has_property(obj, &enumerable)? {
            desc.enumerable = Some(self.get(obj, &enumerable)?.to_boolean());
        }
        let configurable = self.key("configurable");
        if self.has_property(obj, &configurable)? {
            desc.configurable = Some(self.get(obj, &configurable)?.to_boolean());
        }
        let value_key = self.key("value");
        if self.has_property(obj, &value_key)? {
            desc.value = Some(self.get(obj, &value_key)?);
        }
        let writable = self.key("writable");
        if self.has_property(obj, &writable)? {
            desc.writable = Some(self.get(obj, &writable)?.to_boolean());
        }
        for (name, is_getter) in [("get", true), ("set", false)] {
            let key = self.key(name);
            if self.has_property(obj, &key)? {
                let accessor = self.get(obj, &key)?;
                if !accessor.is_undefined() && !self.is_callable(&accessor) {
                    return Err(crate::error::JsError::type_error(format!(
                        "{} must be a function: {}",
                        if is_getter { "Getter" } else { "Setter" },
                        self.display(&accessor)
                    )));
                }
                if is_getter {
                    desc.get = Some(accessor);
                } else {
                    desc.set = Some(accessor);
                }
            }
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(crate::error::JsError::type_error(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
            ));
        }
        Ok(desc)
    }

    /// FromPropertyDescriptor
    pub(crate) fn from_property_descriptor(
        &self,
        desc: Option<&PropertyDescriptor>,
    ) -> JsResult<Value> {
        let Some(desc) = desc else {
            return Ok(Value::Undefined);
        };
        let obj = self.ordinary_object()?;
        let fields: [(&str, Option<Value>); 6] = [
            ("value", desc.value.clone()),
            ("writable", desc.writable.map(Value::Boolean)),
            ("get", desc.get.clone()),
            ("set", desc.set.clone()),
            ("enumerable", desc.enumerable.map(Value::Boolean)),
            ("configurable", desc.configurable.map(Value::Boolean)),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                self.create_data_property_or_throw(obj, self.key(name), value)?;
            }
        }
        Ok(Value::Object(obj))
    }
}
