//! Integer-indexed exotic objects (typed arrays)
//!
//! String keys that are canonical numeric strings never reach the ordinary
//! property table: they address elements of the backing buffer, and keys
//! outside the current length behave as absent and unwritable.

use crate::error::JsResult;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{number_to_string, PropertyKey, Value};

use super::ordinary;
use super::property::PropertyDescriptor;
use super::{InternalMethods, ObjectKind};

/// Element types of the nine Number typed arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl ElementType {
    pub const ALL: [ElementType; 9] = [
        ElementType::Int8,
        ElementType::Uint8,
        ElementType::Uint8Clamped,
        ElementType::Int16,
        ElementType::Uint16,
        ElementType::Int32,
        ElementType::Uint32,
        ElementType::Float32,
        ElementType::Float64,
    ];

    pub fn size(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 | ElementType::Uint8Clamped => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Int32 | ElementType::Uint32 | ElementType::Float32 => 4,
            ElementType::Float64 => 8,
        }
    }

    /// Constructor name, e.g. `Uint8ClampedArray`.
    pub fn constructor_name(self) -> &'static str {
        match self {
            ElementType::Int8 => "Int8Array",
            ElementType::Uint8 => "Uint8Array",
            ElementType::Uint8Clamped => "Uint8ClampedArray",
            ElementType::Int16 => "Int16Array",
            ElementType::Uint16 => "Uint16Array",
            ElementType::Int32 => "Int32Array",
            ElementType::Uint32 => "Uint32Array",
            ElementType::Float32 => "Float32Array",
            ElementType::Float64 => "Float64Array",
        }
    }

    /// NumericToRawBytes(type, value, isLittleEndian)
    pub fn to_raw_bytes(self, value: f64, little_endian: bool) -> Vec<u8> {
        macro_rules! bytes {
            ($v:expr) => {
                if little_endian {
                    $v.to_le_bytes().to_vec()
                } else {
                    $v.to_be_bytes().to_vec()
                }
            };
        }
        match self {
            ElementType::Int8 => bytes!(modulo_bits(value, 8) as u8 as i8),
            ElementType::Uint8 => bytes!(modulo_bits(value, 8) as u8),
            ElementType::Uint8Clamped => bytes!(clamp_uint8(value)),
            ElementType::Int16 => bytes!(modulo_bits(value, 16) as u16 as i16),
            ElementType::Uint16 => bytes!(modulo_bits(value, 16) as u16),
            ElementType::Int32 => bytes!(modulo_bits(value, 32) as u32 as i32),
            ElementType::Uint32 => bytes!(modulo_bits(value, 32) as u32),
            ElementType::Float32 => bytes!(value as f32),
            ElementType::Float64 => bytes!(value),
        }
    }

    /// RawBytesToNumeric(type, rawBytes, isLittleEndian). `bytes` must hold
    /// exactly `self.size()` bytes; anything else reads as NaN.
    pub fn from_raw_bytes(self, bytes: &[u8], little_endian: bool) -> f64 {
        macro_rules! read {
            ($t:ty, $n:literal) => {
                match <[u8; $n]>::try_from(bytes) {
                    Ok(raw) if little_endian => f64::from(<$t>::from_le_bytes(raw)),
                    Ok(raw) => f64::from(<$t>::from_be_bytes(raw)),
                    Err(_) => f64::NAN,
                }
            };
        }
        match self {
            ElementType::Int8 => read!(i8, 1),
            ElementType::Uint8 | ElementType::Uint8Clamped => read!(u8, 1),
            ElementType::Int16 => read!(i16, 2),
            ElementType::Uint16 => read!(u16, 2),
            ElementType::Int32 => read!(i32, 4),
            ElementType::Uint32 => read!(u32, 4),
            ElementType::Float32 => read!(f32, 4),
            ElementType::Float64 => match <[u8; 8]>::try_from(bytes) {
                Ok(raw) if little_endian => f64::from_le_bytes(raw),
                Ok(raw) => f64::from_be_bytes(raw),
                Err(_) => f64::NAN,
            },
        }
    }
}

/// The integer conversion shared by ToInt8 … ToUint32: truncate, then
/// reduce modulo 2^bits.
fn modulo_bits(value: f64, bits: u32) -> u64 {
    if !value.is_finite() || value == 0.0 {
        return 0;
    }
    let modulus = 2f64.powi(bits as i32);
    value.trunc().rem_euclid(modulus) as u64
}

/// ToUint8Clamp
fn clamp_uint8(value: f64) -> u8 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    if value >= 255.0 {
        return 255;
    }
    value.round_ties_even() as u8
}

/// One value per element type, for intrinsics tables.
#[derive(Debug, Clone, Copy)]
pub struct PerElementType<T: Copy> {
    pub int8: T,
    pub uint8: T,
    pub uint8_clamped: T,
    pub int16: T,
    pub uint16: T,
    pub int32: T,
    pub uint32: T,
    pub float32: T,
    pub float64: T,
}

impl<T: Copy> PerElementType<T> {
    pub fn try_from_fn<E>(mut f: impl FnMut(ElementType) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            int8: f(ElementType::Int8)?,
            uint8: f(ElementType::Uint8)?,
            uint8_clamped: f(ElementType::Uint8Clamped)?,
            int16: f(ElementType::Int16)?,
            uint16: f(ElementType::Uint16)?,
            int32: f(ElementType::Int32)?,
            uint32: f(ElementType::Uint32)?,
            float32: f(ElementType::Float32)?,
            float64: f(ElementType::Float64)?,
        })
    }

    pub fn get(&self, ty: ElementType) -> T {
        match ty {
            ElementType::Int8 => self.int8,
            ElementType::Uint8 => self.uint8,
            ElementType::Uint8Clamped => self.uint8_clamped,
            ElementType::Int16 => self.int16,
            ElementType::Uint16 => self.uint16,
            ElementType::Int32 => self.int32,
            ElementType::Uint32 => self.uint32,
            ElementType::Float32 => self.float32,
            ElementType::Float64 => self.float64,
        }
    }
}

/// [[TypedArrayName]], [[ViewedArrayBuffer]], [[ByteOffset]], [[ArrayLength]]
#[derive(Debug, Clone, Copy)]
pub struct TypedArrayData {
    pub element: ElementType,
    pub buffer: ObjectId,
    pub byte_offset: usize,
    pub length: usize,
}

/// CanonicalNumericIndexString, applied to a property key. Index keys are
/// canonical by construction.
pub fn canonical_numeric_index(key: &PropertyKey) -> Option<f64> {
    match key {
        PropertyKey::Index(index) => Some(f64::from(*index)),
        PropertyKey::Symbol(_) => None,
        PropertyKey::String(s) => {
            if s.as_str() == "-0" {
                return Some(-0.0);
            }
            let n = crate::interpreter::conversions::string_to_number(s.as_str());
            (number_to_string(n) == s.as_str()).then_some(n)
        }
    }
}

pub struct IntegerIndexedMethods;

fn data(interp: &Interpreter, obj: ObjectId) -> JsResult<Option<TypedArrayData>> {
    interp.object(obj, |d| match &d.kind {
        ObjectKind::TypedArray(t) => Some(*t),
        _ => None,
    })
}

impl Interpreter {
    /// The typed array's slots, `None` for other objects.
    pub(crate) fn typed_array_data(&self, obj: ObjectId) -> JsResult<Option<TypedArrayData>> {
        data(self, obj)
    }

    /// IsValidIntegerIndex(O, index): the element index when valid.
    pub(crate) fn valid_integer_index(&self, obj: ObjectId, index: f64) -> JsResult<Option<usize>> {
        let Some(ta) = data(self, obj)? else {
            return Ok(None);
        };
        if self.is_detached_buffer(ta.buffer)? {
            return Ok(None);
        }
        if index.fract() != 0.0 || !index.is_finite() {
            return Ok(None);
        }
        if index == 0.0 && index.is_sign_negative() {
            return Ok(None);
        }
        if index < 0.0 || index >= ta.length as f64 {
            return Ok(None);
        }
        Ok(Some(index as usize))
    }

    /// TypedArrayGetElement(O, index)
    pub(crate) fn typed_array_get_element(&self, obj: ObjectId, index: f64) -> JsResult<Value> {
        let Some(index) = self.valid_integer_index(obj, index)? else {
            return Ok(Value::Undefined);
        };
        let Some(ta) = data(self, obj)? else {
            return Ok(Value::Undefined);
        };
        let byte_index = ta.byte_offset + index * ta.element.size();
        let n = self.get_value_from_buffer(ta.buffer, byte_index, ta.element, true)?;
        Ok(Value::Number(n))
    }

    /// TypedArraySetElement(O, index, value)
    pub(crate) fn typed_array_set_element(
        &self,
        obj: ObjectId,
        index: f64,
        value: &Value,
    ) -> JsResult<()> {
        let n = self.to_number(value)?;
        let Some(index) = self.valid_integer_index(obj, index)? else {
            return Ok(());
        };
        let Some(ta) = data(self, obj)? else {
            return Ok(());
        };
        let byte_index = ta.byte_offset + index * ta.element.size();
        self.set_value_in_buffer(ta.buffer, byte_index, ta.element, n, true)
    }
}

impl InternalMethods for IntegerIndexedMethods {
    fn get_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        let Some(index) = canonical_numeric_index(key) else {
            return ordinary::get_own_property(interp, obj, key);
        };
        let value = interp.typed_array_get_element(obj, index)?;
        if value.is_undefined() {
            return Ok(None);
        }
        Ok(Some(PropertyDescriptor::data(value, true, true, true)))
    }

    fn has_property(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match canonical_numeric_index(key) {
            Some(index) => Ok(interp.valid_integer_index(obj, index)?.is_some()),
            None => ordinary::has_property(interp, obj, key),
        }
    }

    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        let Some(index) = canonical_numeric_index(key) else {
            return ordinary::define_own_property(interp, obj, key, desc);
        };
        if interp.valid_integer_index(obj, index)?.is_none() {
            return Ok(false);
        }
        if desc.configurable == Some(false)
            || desc.enumerable == Some(false)
            || desc.is_accessor_descriptor()
            || desc.writable == Some(false)
        {
            return Ok(false);
        }
        if let Some(value) = &desc.value {
            interp.typed_array_set_element(obj, index, value)?;
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
        match canonical_numeric_index(key) {
            Some(index) => interp.typed_array_get_element(obj, index),
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
        if let Some(index) = canonical_numeric_index(key) {
            if matches!(receiver, Value::Object(r) if *r == obj) {
                interp.typed_array_set_element(obj, index, &value)?;
                return Ok(true);
            }
            if interp.valid_integer_index(obj, index)?.is_none() {
                return Ok(true);
            }
        }
        ordinary::set(interp, obj, key, value, receiver)
    }

    fn delete(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        match canonical_numeric_index(key) {
            Some(index) => Ok(interp.valid_integer_index(obj, index)?.is_none()),
            None => ordinary::delete(interp, obj, key),
        }
    }

    fn own_property_keys(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let mut keys = Vec::new();
        if let Some(ta) = data(interp, obj)? {
            if !interp.is_detached_buffer(ta.buffer)? {
                keys.extend((0..ta.length).map(PropertyKey::from));
            }
        }
        keys.extend(ordinary::own_property_keys(interp, obj)?);
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::JsString;

    #[test]
    fn integer_conversions_wrap() {
        assert_eq!(ElementType::Int8.to_raw_bytes(255.0, true), vec![0xff]);
        assert_eq!(ElementType::Uint8.to_raw_bytes(-1.0, true), vec![0xff]);
        assert_eq!(ElementType::Uint8.to_raw_bytes(256.0, true), vec![0]);
        assert_eq!(ElementType::Int16.to_raw_bytes(f64::NAN, true), vec![0, 0]);
        assert_eq!(ElementType::Uint32.to_raw_bytes(1.9, false), vec![0, 0, 0, 1]);
    }

    #[test]
    fn clamped_rounds_half_to_even() {
        assert_eq!(ElementType::Uint8Clamped.to_raw_bytes(2.5, true), vec![2]);
        assert_eq!(ElementType::Uint8Clamped.to_raw_bytes(3.5, true), vec![4]);
        assert_eq!(ElementType::Uint8Clamped.to_raw_bytes(300.0, true), vec![255]);
        assert_eq!(ElementType::Uint8Clamped.to_raw_bytes(-3.0, true), vec![0]);
    }

    #[test]
    fn endianness() {
        let le = ElementType::Int16.to_raw_bytes(0x0102 as f64, true);
        let be = ElementType::Int16.to_raw_bytes(0x0102 as f64, false);
        assert_eq!(le, vec![2, 1]);
        assert_eq!(be, vec![1, 2]);
        assert_eq!(ElementType::Int16.from_raw_bytes(&le, true), 258.0);
        assert_eq!(ElementType::Int16.from_raw_bytes(&be, false), 258.0);
        assert_eq!(ElementType::Int16.from_raw_bytes(&[0xff, 0xff], true), -1.0);
    }

    #[test]
    fn floats() {
        let bytes = ElementType::Float32.to_raw_bytes(1.5, true);
        assert_eq!(ElementType::Float32.from_raw_bytes(&bytes, true), 1.5);
        let bytes = ElementType::Float64.to_raw_bytes(-0.25, false);
        assert_eq!(ElementType::Float64.from_raw_bytes(&bytes, false), -0.25);
    }

    #[test]
    fn canonical_numeric_strings() {
        assert_eq!(canonical_numeric_index(&PropertyKey::Index(3)), Some(3.0));
        let minus_zero = canonical_numeric_index(&PropertyKey::String(JsString::from("-0")));
        assert!(minus_zero.is_some_and(|n| n == 0.0 && n.is_sign_negative()));
        assert_eq!(
            canonical_numeric_index(&PropertyKey::String(JsString::from("1.5"))),
            Some(1.5)
        );
        assert_eq!(
            canonical_numeric_index(&PropertyKey::String(JsString::from("01"))),
            None
        );
        assert_eq!(
            canonical_numeric_index(&PropertyKey::String(JsString::from("foo"))),
            None
        );
        assert!(canonical_numeric_index(&PropertyKey::String(JsString::from("NaN")))
            .is_some_and(f64::is_nan));
    }
}
