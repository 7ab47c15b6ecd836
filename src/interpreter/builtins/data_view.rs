//! DataView objects
//!
//! Each `getX`/`setX` method carries its element type in its captures, so
//! one pair of native functions serves all sixteen methods.

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::object::typed_array::ElementType;
use crate::interpreter::object::{ObjectKind, Property};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, Value};

/// [[ViewedArrayBuffer]], [[ByteOffset]], [[ByteLength]]
#[derive(Debug, Clone, Copy)]
pub struct DataViewData {
    pub buffer: ObjectId,
    pub byte_offset: usize,
    pub byte_length: usize,
}

fn detached(method: &str) -> JsError {
    JsError::type_error(format!("Cannot perform DataView.prototype.{} on a detached ArrayBuffer", method))
}

fn this_data_view(interp: &Interpreter, this: &Value, method: &str) -> JsResult<DataViewData> {
    let view = match this {
        Value::Object(obj) => interp.object(*obj, |d| match &d.kind {
            ObjectKind::DataView(v) => Some(*v),
            _ => None,
        })?,
        _ => None,
    };
    view.ok_or_else(|| {
        JsError::type_error(format!(
            "Method DataView.prototype.{} called on incompatible receiver {}",
            method,
            interp.display(this)
        ))
    })
}

/// new DataView(buffer, byteOffset, byteLength)
pub fn data_view_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Some(new_target) = call.new_target else {
        return Err(JsError::type_error("Constructor DataView requires 'new'"));
    };
    let buffer = match call.arg(0) {
        Value::Object(obj) if interp.kind_is(obj, |k| matches!(k, ObjectKind::ArrayBuffer(_))) => obj,
        _ => return Err(JsError::type_error("First argument to DataView constructor must be an ArrayBuffer")),
    };
    let offset = interp.to_index(&call.arg(1))?;
    if interp.is_detached_buffer(buffer)? {
        return Err(JsError::type_error("Cannot construct a DataView on a detached ArrayBuffer"));
    }
    let buffer_length = interp.array_buffer_byte_length(buffer)?;
    if offset > buffer_length {
        return Err(JsError::range_error(format!("Start offset {} is outside the bounds of the buffer", offset)));
    }
    let byte_length = match call.arg(2) {
        Value::Undefined => buffer_length - offset,
        length => {
            let length = interp.to_index(&length)?;
            if offset.saturating_add(length) > buffer_length {
                return Err(JsError::range_error(format!("Invalid DataView length {}", length)));
            }
            length
        }
    };
    let view = DataViewData {
        buffer,
        byte_offset: offset,
        byte_length,
    };
    let obj = interp.ordinary_create_from_constructor(Some(new_target), |i| i.data_view_prototype, ObjectKind::DataView(view))?;
    // The prototype lookup above can run user code that detaches the buffer.
    if interp.is_detached_buffer(buffer)? {
        return Err(JsError::type_error("Cannot construct a DataView on a detached ArrayBuffer"));
    }
    Ok(Value::Object(obj))
}

fn element_type(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<ElementType> {
    match interp.builtin_captures(call.function)? {
        Captures::ElementType(ty) => Ok(ty),
        _ => Err(JsError::internal("DataView accessor without an element type")),
    }
}

/// The buffer index for an access of `size` bytes at `request` in `view`.
fn view_index(view: (usize, usize), request: usize, size: usize, method: &str) -> JsResult<usize> {
    let (byte_offset, byte_length) = view;
    match request.checked_add(size) {
        Some(end) if end <= byte_length => Ok(byte_offset + request),
        _ => Err(JsError::range_error(format!(
            "Offset is outside the bounds of the DataView in DataView.prototype.{}",
            method
        ))),
    }
}

/// GetViewValue(view, requestIndex, isLittleEndian, type)
fn data_view_get(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ty = element_type(interp, call)?;
    let method = "get";
    let view = this_data_view(interp, call.this, method)?;
    let request = interp.to_index(&call.arg(0))?;
    let little_endian = call.arg(1).to_boolean();
    if interp.is_detached_buffer(view.buffer)? {
        return Err(detached(method));
    }
    let index = view_index((view.byte_offset, view.byte_length), request, ty.size(), method)?;
    Ok(Value::Number(interp.get_value_from_buffer(view.buffer, index, ty, little_endian)?))
}

/// SetViewValue(view, requestIndex, isLittleEndian, type, value)
fn data_view_set(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ty = element_type(interp, call)?;
    let method = "set";
    let view = this_data_view(interp, call.this, method)?;
    let request = interp.to_index(&call.arg(0))?;
    let value = interp.to_number(&call.arg(1))?;
    let little_endian = call.arg(2).to_boolean();
    if interp.is_detached_buffer(view.buffer)? {
        return Err(detached(method));
    }
    let index = view_index((view.byte_offset, view.byte_length), request, ty.size(), method)?;
    interp.set_value_in_buffer(view.buffer, index, ty, value, little_endian)?;
    Ok(Value::Undefined)
}

fn data_view_buffer(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Object(this_data_view(interp, call.this, "buffer")?.buffer))
}

fn data_view_byte_length(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let view = this_data_view(interp, call.this, "byteLength")?;
    if interp.is_detached_buffer(view.buffer)? {
        return Err(detached("byteLength"));
    }
    Ok(Value::Number(view.byte_length as f64))
}

fn data_view_byte_offset(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let view = this_data_view(interp, call.this, "byteOffset")?;
    if interp.is_detached_buffer(view.buffer)? {
        return Err(detached("byteOffset"));
    }
    Ok(Value::Number(view.byte_offset as f64))
}

pub fn init_data_view(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let (ctor, proto) = (realm.intrinsics.data_view_constructor, realm.intrinsics.data_view_prototype);
    interp.register_constructor(ctor, "DataView", 1, Some(proto))?;

    interp.register_accessor(proto, interp.key("buffer"), data_view_buffer, None)?;
    interp.register_accessor(proto, interp.key("byteLength"), data_view_byte_length, None)?;
    interp.register_accessor(proto, interp.key("byteOffset"), data_view_byte_offset, None)?;

    for ty in ElementType::ALL {
        if ty == ElementType::Uint8Clamped {
            continue;
        }
        let suffix = ty.constructor_name().trim_end_matches("Array");
        for (prefix, behavior, length) in [("get", data_view_get as super::NativeFn, 1), ("set", data_view_set, 2)] {
            let name = interp.intern(&format!("{}{}", prefix, suffix));
            let f = interp.create_builtin_function(behavior, length, name.cheap_clone(), Captures::ElementType(ty))?;
            interp.insert_property(proto, name.into(), Property::hidden(Value::Object(f)))?;
        }
    }
    interp.register_to_string_tag(proto, "DataView")?;
    Ok(())
}
