//! ArrayBuffer objects and the raw byte access shared with typed arrays
//! and DataView

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::typed_array::ElementType;
use crate::interpreter::object::ObjectKind;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::Value;

/// Largest buffer `new ArrayBuffer` will allocate.
pub const MAX_BYTE_LENGTH: usize = 1 << 30;

/// [[ArrayBufferData]]; `None` once the buffer is detached.
#[derive(Debug, Default)]
pub struct ArrayBufferData {
    pub bytes: Option<Vec<u8>>,
}

impl Interpreter {
    /// AllocateArrayBuffer(constructor, byteLength)
    pub(crate) fn allocate_array_buffer(
        &self,
        constructor: Option<ObjectId>,
        byte_length: usize,
    ) -> JsResult<ObjectId> {
        let bytes = zeroed(byte_length)?;
        self.ordinary_create_from_constructor(
            constructor,
            |i| i.array_buffer_prototype,
            ObjectKind::ArrayBuffer(ArrayBufferData { bytes: Some(bytes) }),
        )
    }

    /// IsDetachedBuffer(arrayBuffer)
    pub(crate) fn is_detached_buffer(&self, buffer: ObjectId) -> JsResult<bool> {
        self.object(buffer, |d| match &d.kind {
            ObjectKind::ArrayBuffer(b) => Ok(b.bytes.is_none()),
            _ => Err(JsError::internal("not an ArrayBuffer")),
        })?
    }

    /// The buffer's byte length, `0` when detached.
    pub(crate) fn array_buffer_byte_length(&self, buffer: ObjectId) -> JsResult<usize> {
        self.object(buffer, |d| match &d.kind {
            ObjectKind::ArrayBuffer(b) => Ok(b.bytes.as_ref().map_or(0, Vec::len)),
            _ => Err(JsError::internal("not an ArrayBuffer")),
        })?
    }

    /// DetachArrayBuffer(arrayBuffer): the previous contents.
    pub(crate) fn detach_array_buffer(&self, buffer: ObjectId) -> JsResult<Vec<u8>> {
        self.object_mut(buffer, |d| match &mut d.kind {
            ObjectKind::ArrayBuffer(b) => Ok(b.bytes.take().unwrap_or_default()),
            _ => Err(JsError::internal("not an ArrayBuffer")),
        })?
    }

    /// Copy `len` bytes starting at `from` out of a live buffer.
    pub(crate) fn read_buffer_bytes(&self, buffer: ObjectId, from: usize, len: usize) -> JsResult<Vec<u8>> {
        self.object(buffer, |d| {
            let ObjectKind::ArrayBuffer(b) = &d.kind else {
                return Err(JsError::internal("not an ArrayBuffer"));
            };
            let bytes = b.bytes.as_ref().ok_or_else(detached_error)?;
            from.checked_add(len)
                .and_then(|end| bytes.get(from..end))
                .map(<[u8]>::to_vec)
                .ok_or_else(|| JsError::range_error("Offset is outside the bounds of the buffer"))
        })?
    }

    /// Overwrite bytes of a live buffer starting at `from`.
    pub(crate) fn write_buffer_bytes(&self, buffer: ObjectId, from: usize, data: &[u8]) -> JsResult<()> {
        self.object_mut(buffer, |d| {
            let ObjectKind::ArrayBuffer(b) = &mut d.kind else {
                return Err(JsError::internal("not an ArrayBuffer"));
            };
            let bytes = b.bytes.as_mut().ok_or_else(detached_error)?;
            let target = from
                .checked_add(data.len())
                .and_then(|end| bytes.get_mut(from..end))
                .ok_or_else(|| JsError::range_error("Offset is outside the bounds of the buffer"))?;
            target.copy_from_slice(data);
            Ok(())
        })?
    }

    /// GetValueFromBuffer(arrayBuffer, byteIndex, type, isLittleEndian)
    pub(crate) fn get_value_from_buffer(
        &self,
        buffer: ObjectId,
        byte_index: usize,
        ty: ElementType,
        little_endian: bool,
    ) -> JsResult<f64> {
        let raw = self.read_buffer_bytes(buffer, byte_index, ty.size())?;
        Ok(ty.from_raw_bytes(&raw, little_endian))
    }

    /// SetValueInBuffer(arrayBuffer, byteIndex, type, value, isLittleEndian)
    pub(crate) fn set_value_in_buffer(
        &self,
        buffer: ObjectId,
        byte_index: usize,
        ty: ElementType,
        value: f64,
        little_endian: bool,
    ) -> JsResult<()> {
        let raw = ty.to_raw_bytes(value, little_endian);
        self.write_buffer_bytes(buffer, byte_index, &raw)
    }

    /// The receiver as an ArrayBuffer, for prototype methods.
    fn this_array_buffer(&self, this: &Value, method: &str) -> JsResult<ObjectId> {
        let obj = this
            .as_object()
            .filter(|obj| self.kind_is(*obj, |k| matches!(k, ObjectKind::ArrayBuffer(_))));
        obj.ok_or_else(|| {
            JsError::type_error(format!(
                "Method ArrayBuffer.prototype.{} called on incompatible receiver {}",
                method,
                self.display(this)
            ))
        })
    }
}

fn detached_error() -> JsError {
    JsError::type_error("Cannot perform this operation on a detached ArrayBuffer")
}

/// A zero-filled block, or a RangeError when it cannot be allocated.
fn zeroed(byte_length: usize) -> JsResult<Vec<u8>> {
    if byte_length > MAX_BYTE_LENGTH {
        return Err(JsError::range_error("Array buffer allocation failed"));
    }
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(byte_length)
        .map_err(|_| JsError::range_error("Array buffer allocation failed"))?;
    bytes.resize(byte_length, 0);
    Ok(bytes)
}

/// new ArrayBuffer(length)
pub fn array_buffer_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Some(new_target) = call.new_target else {
        return Err(JsError::type_error("Constructor ArrayBuffer requires 'new'"));
    };
    let byte_length = interp.to_index(&call.arg(0))?;
    tracing::trace!(target: "ecmavm::buffer", byte_length, "allocate ArrayBuffer");
    Ok(Value::Object(interp.allocate_array_buffer(Some(new_target), byte_length)?))
}

/// ArrayBuffer.isView(arg)
fn array_buffer_is_view(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let is_view = match call.arg(0) {
        Value::Object(obj) => interp.kind_is(obj, |k| {
            matches!(k, ObjectKind::TypedArray(_) | ObjectKind::DataView(_))
        }),
        _ => false,
    };
    Ok(Value::Boolean(is_view))
}

fn array_buffer_byte_length(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let buffer = interp.this_array_buffer(call.this, "byteLength")?;
    Ok(Value::Number(interp.array_buffer_byte_length(buffer)? as f64))
}

fn array_buffer_detached(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let buffer = interp.this_array_buffer(call.this, "detached")?;
    Ok(Value::Boolean(interp.is_detached_buffer(buffer)?))
}

/// ArrayBuffer.prototype.slice(start, end)
fn array_buffer_slice(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let buffer = interp.this_array_buffer(call.this, "slice")?;
    if interp.is_detached_buffer(buffer)? {
        return Err(detached_error());
    }
    let len = interp.array_buffer_byte_length(buffer)? as f64;
    let clamp = |relative: f64| {
        if relative < 0.0 {
            (len + relative).max(0.0)
        } else {
            relative.min(len)
        }
    };
    let first = clamp(interp.to_integer_or_infinity(&call.arg(0))?);
    let end = call.arg(1);
    let last = if end.is_undefined() {
        len
    } else {
        clamp(interp.to_integer_or_infinity(&end)?)
    };
    let new_len = (last - first).max(0.0) as usize;

    let default_ctor = interp.intrinsic(|i| i.array_buffer_constructor)?;
    let ctor = interp.species_constructor(buffer, default_ctor)?;
    let new = interp.construct(ctor, &[Value::Number(new_len as f64)], None)?;
    if !interp.kind_is(new, |k| matches!(k, ObjectKind::ArrayBuffer(_))) {
        return Err(JsError::type_error("ArrayBuffer subclass returned a non-buffer"));
    }
    if interp.is_detached_buffer(new)? {
        return Err(detached_error());
    }
    if new == buffer {
        return Err(JsError::type_error("ArrayBuffer subclass returned this from species constructor"));
    }
    if interp.array_buffer_byte_length(new)? < new_len {
        return Err(JsError::type_error("Species constructor returned a buffer that is too small"));
    }
    if interp.is_detached_buffer(buffer)? {
        return Err(detached_error());
    }
    let bytes = interp.read_buffer_bytes(buffer, first as usize, new_len)?;
    interp.write_buffer_bytes(new, 0, &bytes)?;
    Ok(Value::Object(new))
}

/// ArrayBuffer.prototype.transfer(newLength): moves the contents into a new
/// buffer and detaches this one.
fn array_buffer_transfer(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let buffer = interp.this_array_buffer(call.this, "transfer")?;
    let new_length = match call.arg(0) {
        Value::Undefined => interp.array_buffer_byte_length(buffer)?,
        other => interp.to_index(&other)?,
    };
    if interp.is_detached_buffer(buffer)? {
        return Err(detached_error());
    }
    let mut bytes = interp.detach_array_buffer(buffer)?;
    if new_length > MAX_BYTE_LENGTH {
        return Err(JsError::range_error("Array buffer allocation failed"));
    }
    bytes.resize(new_length, 0);
    tracing::trace!(target: "ecmavm::buffer", new_length, "ArrayBuffer transferred");
    let proto = interp.intrinsic(|i| i.array_buffer_prototype)?;
    let new = interp.object_create(Some(proto), ObjectKind::ArrayBuffer(ArrayBufferData { bytes: Some(bytes) }));
    Ok(Value::Object(new))
}

pub fn init_array_buffer(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let i = &realm.intrinsics;
    let (ctor, proto) = (i.array_buffer_constructor, i.array_buffer_prototype);
    interp.register_constructor(ctor, "ArrayBuffer", 1, Some(proto))?;
    interp.register_method(ctor, "isView", array_buffer_is_view, 1)?;

    interp.register_accessor(proto, interp.key("byteLength"), array_buffer_byte_length, None)?;
    interp.register_accessor(proto, interp.key("detached"), array_buffer_detached, None)?;
    interp.register_method(proto, "slice", array_buffer_slice, 2)?;
    interp.register_method(proto, "transfer", array_buffer_transfer, 0)?;
    interp.register_to_string_tag(proto, "ArrayBuffer")?;
    Ok(())
}
