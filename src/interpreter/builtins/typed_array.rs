//! %TypedArray% and the nine Number element constructors
//!
//! Element access goes through the integer-indexed exotic methods in
//! `object::typed_array`; this module holds construction, the shared
//! prototype and the bulk copies that work on raw bytes.

use std::cmp::Ordering;

use super::array::{callback, index_key, merge_sort, relative_index};
use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::object::typed_array::{ElementType, TypedArrayData};
use crate::interpreter::object::{ObjectKind, Property, PropertyNameKind};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

impl Interpreter {
    /// ValidateTypedArray(O): the receiver's slots, rejecting detached
    /// buffers.
    fn validate_typed_array(&self, value: &Value, method: &str) -> JsResult<(ObjectId, TypedArrayData)> {
        let incompatible = || {
            JsError::type_error(format!(
                "Method %TypedArray%.prototype.{} called on incompatible receiver {}",
                method,
                self.display(value)
            ))
        };
        let obj = value.as_object().ok_or_else(incompatible)?;
        let ta = self.typed_array_data(obj)?.ok_or_else(incompatible)?;
        if self.is_detached_buffer(ta.buffer)? {
            return Err(JsError::type_error(format!(
                "Cannot perform %TypedArray%.prototype.{} on a detached ArrayBuffer",
                method
            )));
        }
        Ok((obj, ta))
    }

    /// The prototype for a new `ty` array constructed through `new_target`.
    fn typed_array_prototype_from(&self, ty: ElementType, new_target: Option<ObjectId>) -> JsResult<ObjectId> {
        let Some(new_target) = new_target else {
            return Ok(self.current_realm()?.intrinsics.typed_array_prototypes.get(ty));
        };
        match self.get(new_target, &self.key("prototype"))? {
            Value::Object(proto) => Ok(proto),
            _ => {
                let realm = self.get_function_realm(new_target)?;
                Ok(self.realm(realm)?.intrinsics.typed_array_prototypes.get(ty))
            }
        }
    }

    /// AllocateTypedArray with a fresh zeroed buffer of `length` elements.
    fn allocate_typed_array(&self, ty: ElementType, proto: ObjectId, length: usize) -> JsResult<ObjectId> {
        let byte_length = length
            .checked_mul(ty.size())
            .ok_or_else(|| JsError::range_error(format!("Invalid typed array length: {}", length)))?;
        let buffer = self.allocate_array_buffer(None, byte_length)?;
        Ok(self.object_create(
            Some(proto),
            ObjectKind::TypedArray(TypedArrayData {
                element: ty,
                buffer,
                byte_offset: 0,
                length,
            }),
        ))
    }

    /// TypedArrayCreateSameType(exemplar, length)
    fn typed_array_create_same_type(&self, ty: ElementType, length: usize) -> JsResult<ObjectId> {
        let proto = self.typed_array_prototype_from(ty, None)?;
        self.allocate_typed_array(ty, proto, length)
    }

    /// TypedArrayCreateFromConstructor(constructor, argumentList)
    fn typed_array_create_from_constructor(
        &self,
        ctor: ObjectId,
        args: &[Value],
        min_length: Option<usize>,
    ) -> JsResult<(ObjectId, TypedArrayData)> {
        let new = Value::Object(self.construct(ctor, args, None)?);
        let (obj, ta) = self.validate_typed_array(&new, "constructor")?;
        if let Some(min) = min_length {
            if ta.length < min {
                return Err(JsError::type_error(format!(
                    "Derived TypedArray constructor created an array which was too small: {} < {}",
                    ta.length, min
                )));
            }
        }
        Ok((obj, ta))
    }

    /// TypedArraySpeciesCreate(exemplar, argumentList)
    fn typed_array_species_create(
        &self,
        exemplar: ObjectId,
        ty: ElementType,
        args: &[Value],
        min_length: Option<usize>,
    ) -> JsResult<(ObjectId, TypedArrayData)> {
        let default = self.current_realm()?.intrinsics.typed_array_constructors.get(ty);
        let ctor = self.species_constructor(exemplar, default)?;
        self.typed_array_create_from_constructor(ctor, args, min_length)
    }

    fn typed_array_element(&self, obj: ObjectId, index: usize) -> JsResult<Value> {
        self.typed_array_get_element(obj, index as f64)
    }

    fn typed_array_elements(&self, obj: ObjectId, length: usize) -> JsResult<Vec<Value>> {
        (0..length).map(|k| self.typed_array_element(obj, k)).collect()
    }

    /// Write `values` into `target` starting at element `offset`.
    fn fill_typed_array(&self, target: ObjectId, offset: usize, values: &[Value]) -> JsResult<()> {
        for (k, value) in values.iter().enumerate() {
            self.tick()?;
            self.set(target, &PropertyKey::from(offset + k), value.clone(), true)?;
        }
        Ok(())
    }

    /// Collect the values of an iterable obtained through `method`.
    fn iterable_values(&self, value: &Value, method: &Value) -> JsResult<Vec<Value>> {
        let mut record = self.get_iterator_from_method(value, method)?;
        let mut values = Vec::new();
        while let Some(value) = self.iterator_step_value(&mut record)? {
            self.tick()?;
            values.push(value);
        }
        Ok(values)
    }

    /// Copy `count` elements of the same type between typed arrays as bytes.
    fn copy_elements_as_bytes(
        &self,
        source: &TypedArrayData,
        source_index: usize,
        target: &TypedArrayData,
        target_index: usize,
        count: usize,
    ) -> JsResult<()> {
        let size = source.element.size();
        let bytes = self.read_buffer_bytes(source.buffer, source.byte_offset + source_index * size, count * size)?;
        self.write_buffer_bytes(target.buffer, target.byte_offset + target_index * size, &bytes)
    }
}

/// The default typed array sort order: numeric, `-0` before `+0`, NaN last.
fn numeric_order(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match x.partial_cmp(&y) {
            Some(Ordering::Equal) if x == 0.0 => y.is_sign_negative().cmp(&x.is_sign_negative()),
            Some(ordering) => ordering,
            None => Ordering::Equal,
        },
    }
}

fn element_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => *n,
        _ => f64::NAN,
    }
}

// ============ CONSTRUCTORS ============

/// %TypedArray%: abstract, only reachable through `super()`.
pub fn typed_array_constructor(_interp: &Interpreter, _call: &NativeCall<'_>) -> JsResult<Value> {
    Err(JsError::type_error("Abstract class TypedArray not directly constructable"))
}

/// Int8Array … Float64Array
pub fn typed_array_element_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Captures::ElementType(ty) = interp.builtin_captures(call.function)? else {
        return Err(JsError::internal("typed array constructor without an element type"));
    };
    let Some(new_target) = call.new_target else {
        return Err(JsError::type_error(format!("Constructor {} requires 'new'", ty.constructor_name())));
    };
    let first = call.arg(0);
    let Value::Object(source) = first else {
        let length = interp.to_index(&first)?;
        let proto = interp.typed_array_prototype_from(ty, Some(new_target))?;
        return Ok(Value::Object(interp.allocate_typed_array(ty, proto, length)?));
    };
    let proto = interp.typed_array_prototype_from(ty, Some(new_target))?;

    if let Some(src) = interp.typed_array_data(source)? {
        if interp.is_detached_buffer(src.buffer)? {
            return Err(JsError::type_error("Cannot construct from a detached ArrayBuffer"));
        }
        let obj = interp.allocate_typed_array(ty, proto, src.length)?;
        let target = interp.typed_array_data(obj)?.ok_or_else(|| JsError::internal("typed array lost its slots"))?;
        if src.element == ty {
            interp.copy_elements_as_bytes(&src, 0, &target, 0, src.length)?;
        } else {
            let values = interp.typed_array_elements(source, src.length)?;
            interp.fill_typed_array(obj, 0, &values)?;
        }
        return Ok(Value::Object(obj));
    }

    if interp.kind_is(source, |k| matches!(k, ObjectKind::ArrayBuffer(_))) {
        let size = ty.size();
        let offset = interp.to_index(&call.arg(1))?;
        if offset % size != 0 {
            return Err(JsError::range_error(format!(
                "start offset of {} should be a multiple of {}",
                ty.constructor_name(),
                size
            )));
        }
        let length_arg = call.arg(2);
        let new_length = match &length_arg {
            Value::Undefined => None,
            other => Some(interp.to_index(other)?),
        };
        if interp.is_detached_buffer(source)? {
            return Err(JsError::type_error("Cannot construct from a detached ArrayBuffer"));
        }
        let buffer_length = interp.array_buffer_byte_length(source)?;
        let byte_length = match new_length {
            None => {
                if buffer_length % size != 0 {
                    return Err(JsError::range_error(format!(
                        "byte length of {} should be a multiple of {}",
                        ty.constructor_name(),
                        size
                    )));
                }
                buffer_length
                    .checked_sub(offset)
                    .ok_or_else(|| JsError::range_error(format!("Start offset {} is outside the bounds of the buffer", offset)))?
            }
            Some(length) => {
                let byte_length = length
                    .checked_mul(size)
                    .ok_or_else(|| JsError::range_error(format!("Invalid typed array length: {}", length)))?;
                if offset.saturating_add(byte_length) > buffer_length {
                    return Err(JsError::range_error(format!("Invalid typed array length: {}", length)));
                }
                byte_length
            }
        };
        let obj = interp.object_create(
            Some(proto),
            ObjectKind::TypedArray(TypedArrayData {
                element: ty,
                buffer: source,
                byte_offset: offset,
                length: byte_length / size,
            }),
        );
        return Ok(Value::Object(obj));
    }

    let iterator_key = PropertyKey::Symbol(interp.well_known().iterator.cheap_clone());
    let values = match interp.get_method(&first, &iterator_key)? {
        Some(method) => interp.iterable_values(&first, &method)?,
        None => {
            let len = interp.length_of_array_like(source)?;
            (0..len)
                .map(|k| interp.get(source, &index_key(k)))
                .collect::<JsResult<Vec<_>>>()?
        }
    };
    let obj = interp.allocate_typed_array(ty, proto, values.len())?;
    interp.fill_typed_array(obj, 0, &values)?;
    Ok(Value::Object(obj))
}

/// %TypedArray%.from(source, mapfn, thisArg)
fn typed_array_from(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ctor = match call.this {
        Value::Object(c) if interp.is_constructor(call.this) => *c,
        other => return Err(JsError::type_error(format!("{} is not a constructor", interp.display(other)))),
    };
    let mapfn = match call.arg(1) {
        Value::Undefined => None,
        f => Some(callback(interp, f)?),
    };
    let this_arg = call.arg(2);
    let source = call.arg(0);
    let iterator_key = PropertyKey::Symbol(interp.well_known().iterator.cheap_clone());
    let values = match interp.get_method(&source, &iterator_key)? {
        Some(method) => interp.iterable_values(&source, &method)?,
        None => {
            let array_like = interp.to_object(&source)?;
            let len = interp.length_of_array_like(array_like)?;
            (0..len)
                .map(|k| interp.get(array_like, &index_key(k)))
                .collect::<JsResult<Vec<_>>>()?
        }
    };
    let len = values.len();
    let (target, _) = interp.typed_array_create_from_constructor(ctor, &[Value::Number(len as f64)], Some(len))?;
    for (k, value) in values.into_iter().enumerate() {
        interp.tick()?;
        let mapped = match &mapfn {
            Some(f) => interp.call(f, &this_arg, &[value, Value::Number(k as f64)])?,
            None => value,
        };
        interp.set(target, &PropertyKey::from(k), mapped, true)?;
    }
    Ok(Value::Object(target))
}

/// %TypedArray%.of(...items)
fn typed_array_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ctor = match call.this {
        Value::Object(c) if interp.is_constructor(call.this) => *c,
        other => return Err(JsError::type_error(format!("{} is not a constructor", interp.display(other)))),
    };
    let len = call.args.len();
    let (target, _) = interp.typed_array_create_from_constructor(ctor, &[Value::Number(len as f64)], Some(len))?;
    interp.fill_typed_array(target, 0, call.args)?;
    Ok(Value::Object(target))
}

// ============ ACCESSORS ============

/// The receiver's slots without the detached check, for the accessors.
fn this_slots(interp: &Interpreter, this: &Value, name: &str) -> JsResult<TypedArrayData> {
    let slots = match this {
        Value::Object(obj) => interp.typed_array_data(*obj)?,
        _ => None,
    };
    slots.ok_or_else(|| {
        JsError::type_error(format!(
            "get %TypedArray%.prototype.{} called on incompatible receiver {}",
            name,
            interp.display(this)
        ))
    })
}

fn typed_array_buffer(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Object(this_slots(interp, call.this, "buffer")?.buffer))
}

fn typed_array_byte_length(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ta = this_slots(interp, call.this, "byteLength")?;
    if interp.is_detached_buffer(ta.buffer)? {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number((ta.length * ta.element.size()) as f64))
}

fn typed_array_byte_offset(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ta = this_slots(interp, call.this, "byteOffset")?;
    if interp.is_detached_buffer(ta.buffer)? {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(ta.byte_offset as f64))
}

fn typed_array_length(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ta = this_slots(interp, call.this, "length")?;
    if interp.is_detached_buffer(ta.buffer)? {
        return Ok(Value::Number(0.0));
    }
    Ok(Value::Number(ta.length as f64))
}

/// get %TypedArray%.prototype[@@toStringTag]: `undefined` for non-typed arrays.
fn typed_array_to_string_tag(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let slots = match call.this {
        Value::Object(obj) => interp.typed_array_data(*obj)?,
        _ => None,
    };
    Ok(slots.map_or(Value::Undefined, |ta| Value::from(ta.element.constructor_name())))
}

// ============ PROTOTYPE METHODS ============

fn typed_array_at(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "at")?;
    let len = ta.length as f64;
    let relative = interp.to_integer_or_infinity(&call.arg(0))?;
    let k = if relative >= 0.0 { relative } else { len + relative };
    if k < 0.0 || k >= len {
        return Ok(Value::Undefined);
    }
    interp.typed_array_get_element(o, k)
}

fn typed_array_copy_within(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "copyWithin")?;
    let len = ta.length as u64;
    let to = relative_index(interp, &call.arg(0), len, 0)?;
    let from = relative_index(interp, &call.arg(1), len, 0)?;
    let end = relative_index(interp, &call.arg(2), len, len)?;
    let count = end.saturating_sub(from).min(len - to) as usize;
    if count > 0 {
        if interp.is_detached_buffer(ta.buffer)? {
            return Err(JsError::type_error("Cannot perform %TypedArray%.prototype.copyWithin on a detached ArrayBuffer"));
        }
        interp.copy_elements_as_bytes(&ta, from as usize, &ta, to as usize, count)?;
    }
    Ok(Value::Object(o))
}

fn typed_array_entries(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, _) = interp.validate_typed_array(call.this, "entries")?;
    Ok(Value::Object(interp.create_array_iterator(o, PropertyNameKind::KeyValue)?))
}

fn typed_array_keys(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, _) = interp.validate_typed_array(call.this, "keys")?;
    Ok(Value::Object(interp.create_array_iterator(o, PropertyNameKind::Key)?))
}

fn typed_array_values(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, _) = interp.validate_typed_array(call.this, "values")?;
    Ok(Value::Object(interp.create_array_iterator(o, PropertyNameKind::Value)?))
}

/// Call `f(value, index, array)` for every element until `visit` says stop.
fn each_element(
    interp: &Interpreter,
    call: &NativeCall<'_>,
    method: &str,
    ascending: bool,
    mut visit: impl FnMut(usize, &Value, bool) -> Option<Value>,
) -> JsResult<Option<Value>> {
    let (o, ta) = interp.validate_typed_array(call.this, method)?;
    let f = callback(interp, call.arg(0))?;
    let this_arg = call.arg(1);
    let indices: Box<dyn Iterator<Item = usize>> = if ascending {
        Box::new(0..ta.length)
    } else {
        Box::new((0..ta.length).rev())
    };
    for k in indices {
        interp.tick()?;
        let value = interp.typed_array_element(o, k)?;
        let result = interp.call(&f, &this_arg, &[value.clone(), Value::Number(k as f64), Value::Object(o)])?;
        if let Some(out) = visit(k, &value, result.to_boolean()) {
            return Ok(Some(out));
        }
    }
    Ok(None)
}

fn typed_array_every(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let failed = each_element(interp, call, "every", true, |_, _, ok| (!ok).then_some(Value::Boolean(false)))?;
    Ok(failed.unwrap_or(Value::Boolean(true)))
}

fn typed_array_some(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let found = each_element(interp, call, "some", true, |_, _, ok| ok.then_some(Value::Boolean(true)))?;
    Ok(found.unwrap_or(Value::Boolean(false)))
}

fn typed_array_for_each(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    each_element(interp, call, "forEach", true, |_, _, _| None)?;
    Ok(Value::Undefined)
}

fn typed_array_find(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let found = each_element(interp, call, "find", true, |_, v, ok| ok.then(|| v.clone()))?;
    Ok(found.unwrap_or(Value::Undefined))
}

fn typed_array_find_index(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let found = each_element(interp, call, "findIndex", true, |k, _, ok| ok.then_some(Value::Number(k as f64)))?;
    Ok(found.unwrap_or(Value::Number(-1.0)))
}

fn typed_array_find_last(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let found = each_element(interp, call, "findLast", false, |_, v, ok| ok.then(|| v.clone()))?;
    Ok(found.unwrap_or(Value::Undefined))
}

fn typed_array_find_last_index(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let found = each_element(interp, call, "findLastIndex", false, |k, _, ok| ok.then_some(Value::Number(k as f64)))?;
    Ok(found.unwrap_or(Value::Number(-1.0)))
}

fn typed_array_filter(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "filter")?;
    let mut kept = Vec::new();
    each_element(interp, call, "filter", true, |_, v, ok| {
        if ok {
            kept.push(v.clone());
        }
        None
    })?;
    let len = kept.len();
    let (a, _) = interp.typed_array_species_create(o, ta.element, &[Value::Number(len as f64)], Some(len))?;
    interp.fill_typed_array(a, 0, &kept)?;
    Ok(Value::Object(a))
}

fn typed_array_map(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "map")?;
    let f = callback(interp, call.arg(0))?;
    let this_arg = call.arg(1);
    let (a, _) = interp.typed_array_species_create(o, ta.element, &[Value::Number(ta.length as f64)], Some(ta.length))?;
    for k in 0..ta.length {
        interp.tick()?;
        let value = interp.typed_array_element(o, k)?;
        let mapped = interp.call(&f, &this_arg, &[value, Value::Number(k as f64), Value::Object(o)])?;
        interp.set(a, &PropertyKey::from(k), mapped, true)?;
    }
    Ok(Value::Object(a))
}

fn reduce(interp: &Interpreter, call: &NativeCall<'_>, ascending: bool) -> JsResult<Value> {
    let method = if ascending { "reduce" } else { "reduceRight" };
    let (o, ta) = interp.validate_typed_array(call.this, method)?;
    let f = callback(interp, call.arg(0))?;
    let mut indices: Box<dyn Iterator<Item = usize>> = if ascending {
        Box::new(0..ta.length)
    } else {
        Box::new((0..ta.length).rev())
    };
    let mut accumulator = match call.args.get(1) {
        Some(initial) => initial.clone(),
        None => match indices.next() {
            Some(k) => interp.typed_array_element(o, k)?,
            None => return Err(JsError::type_error("Reduce of empty array with no initial value")),
        },
    };
    for k in indices {
        interp.tick()?;
        let value = interp.typed_array_element(o, k)?;
        accumulator = interp.call(
            &f,
            &Value::Undefined,
            &[accumulator, value, Value::Number(k as f64), Value::Object(o)],
        )?;
    }
    Ok(accumulator)
}

fn typed_array_reduce(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    reduce(interp, call, true)
}

fn typed_array_reduce_right(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    reduce(interp, call, false)
}

fn typed_array_fill(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "fill")?;
    let len = ta.length as u64;
    let value = Value::Number(interp.to_number(&call.arg(0))?);
    let start = relative_index(interp, &call.arg(1), len, 0)?;
    let end = relative_index(interp, &call.arg(2), len, len)?;
    if interp.is_detached_buffer(ta.buffer)? {
        return Err(JsError::type_error("Cannot perform %TypedArray%.prototype.fill on a detached ArrayBuffer"));
    }
    for k in start..end {
        interp.tick()?;
        interp.typed_array_set_element(o, k as f64, &value)?;
    }
    Ok(Value::Object(o))
}

/// Start index shared by indexOf and includes, `None` when the search is empty.
fn search_start(interp: &Interpreter, from: &Value, len: usize) -> JsResult<Option<usize>> {
    if len == 0 {
        return Ok(None);
    }
    let n = interp.to_integer_or_infinity(from)?;
    if n == f64::INFINITY {
        return Ok(None);
    }
    let k = if n >= 0.0 { n } else { (len as f64 + n).max(0.0) };
    Ok((k < len as f64).then_some(k as usize))
}

fn typed_array_includes(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "includes")?;
    let Some(start) = search_start(interp, &call.arg(1), ta.length)? else {
        return Ok(Value::Boolean(false));
    };
    let target = call.arg(0);
    for k in start..ta.length {
        if interp.typed_array_element(o, k)?.same_value_zero(&target) {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

fn typed_array_index_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "indexOf")?;
    let Some(start) = search_start(interp, &call.arg(1), ta.length)? else {
        return Ok(Value::Number(-1.0));
    };
    let target = call.arg(0);
    for k in start..ta.length {
        if interp.valid_integer_index(o, k as f64)?.is_some()
            && interp.typed_array_element(o, k)?.strict_equals(&target)
        {
            return Ok(Value::Number(k as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

fn typed_array_last_index_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "lastIndexOf")?;
    let len = ta.length as f64;
    if ta.length == 0 {
        return Ok(Value::Number(-1.0));
    }
    let n = match call.args.get(1) {
        Some(from) => interp.to_integer_or_infinity(from)?,
        None => len - 1.0,
    };
    if n == f64::NEG_INFINITY {
        return Ok(Value::Number(-1.0));
    }
    let k = if n >= 0.0 { n.min(len - 1.0) } else { len + n };
    if k < 0.0 {
        return Ok(Value::Number(-1.0));
    }
    let target = call.arg(0);
    for k in (0..=k as usize).rev() {
        if interp.valid_integer_index(o, k as f64)?.is_some()
            && interp.typed_array_element(o, k)?.strict_equals(&target)
        {
            return Ok(Value::Number(k as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

fn typed_array_join(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "join")?;
    let separator = match call.arg(0) {
        Value::Undefined => JsString::from(","),
        sep => interp.to_string(&sep)?,
    };
    let mut out = String::new();
    for k in 0..ta.length {
        interp.tick()?;
        if k > 0 {
            out.push_str(separator.as_str());
        }
        let element = interp.typed_array_element(o, k)?;
        if !element.is_undefined() {
            out.push_str(interp.to_string(&element)?.as_str());
        }
    }
    Ok(Value::from(out))
}

fn typed_array_to_locale_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "toLocaleString")?;
    let mut out = String::new();
    for k in 0..ta.length {
        interp.tick()?;
        if k > 0 {
            out.push(',');
        }
        let element = interp.typed_array_element(o, k)?;
        if !element.is_nullish() {
            let s = interp.invoke(&element, &interp.key("toLocaleString"), &[])?;
            out.push_str(interp.to_string(&s)?.as_str());
        }
    }
    Ok(Value::from(out))
}

fn typed_array_reverse(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "reverse")?;
    let mut values = interp.typed_array_elements(o, ta.length)?;
    values.reverse();
    interp.fill_typed_array(o, 0, &values)?;
    Ok(Value::Object(o))
}

fn typed_array_to_reversed(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "toReversed")?;
    let mut values = interp.typed_array_elements(o, ta.length)?;
    values.reverse();
    let a = interp.typed_array_create_same_type(ta.element, ta.length)?;
    interp.fill_typed_array(a, 0, &values)?;
    Ok(Value::Object(a))
}

/// %TypedArray%.prototype.set(source, offset)
fn typed_array_set(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let target_value = call.this;
    let target = target_value.as_object().ok_or_else(|| {
        JsError::type_error("Method %TypedArray%.prototype.set called on incompatible receiver")
    })?;
    let target_slots = interp
        .typed_array_data(target)?
        .ok_or_else(|| JsError::type_error("Method %TypedArray%.prototype.set called on incompatible receiver"))?;
    let target_offset = interp.to_integer_or_infinity(&call.arg(1))?;
    if target_offset < 0.0 {
        return Err(JsError::range_error("offset is out of bounds"));
    }
    if interp.is_detached_buffer(target_slots.buffer)? {
        return Err(JsError::type_error("Cannot perform %TypedArray%.prototype.set on a detached ArrayBuffer"));
    }
    let source = call.arg(0);
    let source_slots = match &source {
        Value::Object(obj) => interp.typed_array_data(*obj)?.map(|slots| (*obj, slots)),
        _ => None,
    };

    if let Some((source_obj, src)) = source_slots {
        if interp.is_detached_buffer(src.buffer)? {
            return Err(JsError::type_error("Cannot perform %TypedArray%.prototype.set on a detached ArrayBuffer"));
        }
        if src.length as f64 + target_offset > target_slots.length as f64 {
            return Err(JsError::range_error("offset is out of bounds"));
        }
        let offset = target_offset as usize;
        if src.element == target_slots.element {
            interp.copy_elements_as_bytes(&src, 0, &target_slots, offset, src.length)?;
        } else {
            // Read everything first: source and target may share a buffer.
            let values = interp.typed_array_elements(source_obj, src.length)?;
            for (k, value) in values.iter().enumerate() {
                interp.typed_array_set_element(target, (offset + k) as f64, value)?;
            }
        }
        return Ok(Value::Undefined);
    }

    let src = interp.to_object(&source)?;
    let src_length = interp.length_of_array_like(src)?;
    if target_offset == f64::INFINITY || src_length as f64 + target_offset > target_slots.length as f64 {
        return Err(JsError::range_error("offset is out of bounds"));
    }
    let offset = target_offset as usize;
    for k in 0..src_length as usize {
        interp.tick()?;
        let value = interp.get(src, &PropertyKey::from(k))?;
        interp.typed_array_set_element(target, (offset + k) as f64, &value)?;
    }
    Ok(Value::Undefined)
}

fn typed_array_slice(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "slice")?;
    let len = ta.length as u64;
    let start = relative_index(interp, &call.arg(0), len, 0)?;
    let end = relative_index(interp, &call.arg(1), len, len)?;
    let count = end.saturating_sub(start) as usize;
    let (a, target) = interp.typed_array_species_create(o, ta.element, &[Value::Number(count as f64)], Some(count))?;
    if count > 0 {
        if interp.is_detached_buffer(ta.buffer)? {
            return Err(JsError::type_error("Cannot perform %TypedArray%.prototype.slice on a detached ArrayBuffer"));
        }
        if target.element == ta.element {
            interp.copy_elements_as_bytes(&ta, start as usize, &target, 0, count)?;
        } else {
            for n in 0..count {
                let value = interp.typed_array_element(o, start as usize + n)?;
                interp.set(a, &PropertyKey::from(n), value, true)?;
            }
        }
    }
    Ok(Value::Object(a))
}

fn sorted_elements(interp: &Interpreter, o: ObjectId, ta: &TypedArrayData, compare_fn: &Value) -> JsResult<Vec<Value>> {
    let values = interp.typed_array_elements(o, ta.length)?;
    merge_sort(values, &mut |x, y| {
        if compare_fn.is_undefined() {
            return Ok(numeric_order(element_number(x), element_number(y)));
        }
        let v = interp.to_number(&interp.call(compare_fn, &Value::Undefined, &[x.clone(), y.clone()])?)?;
        Ok(v.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
    })
}

fn compare_fn_arg(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match call.arg(0) {
        Value::Undefined => Ok(Value::Undefined),
        f => callback(interp, f),
    }
}

fn typed_array_sort(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let compare_fn = compare_fn_arg(interp, call)?;
    let (o, ta) = interp.validate_typed_array(call.this, "sort")?;
    let sorted = sorted_elements(interp, o, &ta, &compare_fn)?;
    for (k, value) in sorted.iter().enumerate() {
        interp.typed_array_set_element(o, k as f64, value)?;
    }
    Ok(Value::Object(o))
}

fn typed_array_to_sorted(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let compare_fn = compare_fn_arg(interp, call)?;
    let (o, ta) = interp.validate_typed_array(call.this, "toSorted")?;
    let a = interp.typed_array_create_same_type(ta.element, ta.length)?;
    let sorted = sorted_elements(interp, o, &ta, &compare_fn)?;
    interp.fill_typed_array(a, 0, &sorted)?;
    Ok(Value::Object(a))
}

fn typed_array_subarray(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = call.this.as_object().ok_or_else(|| {
        JsError::type_error("Method %TypedArray%.prototype.subarray called on incompatible receiver")
    })?;
    let ta = this_slots(interp, call.this, "subarray")?;
    let len = if interp.is_detached_buffer(ta.buffer)? { 0 } else { ta.length as u64 };
    let begin = relative_index(interp, &call.arg(0), len, 0)?;
    let end = relative_index(interp, &call.arg(1), len, len)?;
    let new_length = end.saturating_sub(begin);
    let begin_byte_offset = ta.byte_offset as u64 + begin * ta.element.size() as u64;
    let args = [
        Value::Object(ta.buffer),
        Value::Number(begin_byte_offset as f64),
        Value::Number(new_length as f64),
    ];
    let (a, _) = interp.typed_array_species_create(o, ta.element, &args, None)?;
    Ok(Value::Object(a))
}

fn typed_array_with(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let (o, ta) = interp.validate_typed_array(call.this, "with")?;
    let len = ta.length as f64;
    let relative = interp.to_integer_or_infinity(&call.arg(0))?;
    let actual = if relative >= 0.0 { relative } else { len + relative };
    let value = Value::Number(interp.to_number(&call.arg(1))?);
    if interp.valid_integer_index(o, actual)?.is_none() {
        return Err(JsError::range_error("Invalid typed array index"));
    }
    let mut values = interp.typed_array_elements(o, ta.length)?;
    if let Some(slot) = values.get_mut(actual as usize) {
        *slot = value;
    }
    let a = interp.typed_array_create_same_type(ta.element, ta.length)?;
    interp.fill_typed_array(a, 0, &values)?;
    Ok(Value::Object(a))
}

pub fn init_typed_arrays(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let i = &realm.intrinsics;
    let (ctor, proto) = (i.typed_array_constructor, i.typed_array_prototype);
    interp.register_constructor(ctor, "TypedArray", 0, Some(proto))?;
    interp.register_method(ctor, "from", typed_array_from, 1)?;
    interp.register_method(ctor, "of", typed_array_of, 0)?;

    interp.register_accessor(proto, interp.key("buffer"), typed_array_buffer, None)?;
    interp.register_accessor(proto, interp.key("byteLength"), typed_array_byte_length, None)?;
    interp.register_accessor(proto, interp.key("byteOffset"), typed_array_byte_offset, None)?;
    interp.register_accessor(proto, interp.key("length"), typed_array_length, None)?;
    interp.register_accessor(
        proto,
        PropertyKey::Symbol(interp.well_known().to_string_tag.cheap_clone()),
        typed_array_to_string_tag,
        None,
    )?;

    let methods: [(&str, super::NativeFn, usize); 29] = [
        ("at", typed_array_at, 1),
        ("copyWithin", typed_array_copy_within, 2),
        ("entries", typed_array_entries, 0),
        ("every", typed_array_every, 1),
        ("fill", typed_array_fill, 1),
        ("filter", typed_array_filter, 1),
        ("find", typed_array_find, 1),
        ("findIndex", typed_array_find_index, 1),
        ("findLast", typed_array_find_last, 1),
        ("findLastIndex", typed_array_find_last_index, 1),
        ("forEach", typed_array_for_each, 1),
        ("includes", typed_array_includes, 1),
        ("indexOf", typed_array_index_of, 1),
        ("join", typed_array_join, 1),
        ("keys", typed_array_keys, 0),
        ("lastIndexOf", typed_array_last_index_of, 1),
        ("map", typed_array_map, 1),
        ("reduce", typed_array_reduce, 1),
        ("reduceRight", typed_array_reduce_right, 1),
        ("reverse", typed_array_reverse, 0),
        ("set", typed_array_set, 1),
        ("slice", typed_array_slice, 2),
        ("some", typed_array_some, 1),
        ("sort", typed_array_sort, 1),
        ("subarray", typed_array_subarray, 2),
        ("toLocaleString", typed_array_to_locale_string, 0),
        ("toReversed", typed_array_to_reversed, 0),
        ("toSorted", typed_array_to_sorted, 1),
        ("with", typed_array_with, 2),
    ];
    for (name, behavior, length) in methods {
        interp.register_method(proto, name, behavior, length)?;
    }
    let values = interp.register_method(proto, "values", typed_array_values, 0)?;
    interp.insert_property(
        proto,
        PropertyKey::Symbol(interp.well_known().iterator.cheap_clone()),
        Property::hidden(Value::Object(values)),
    )?;
    // Shares the function object with Array.prototype.toString.
    let to_string = interp.get(i.array_prototype, &interp.key("toString"))?;
    interp.register_value(proto, "toString", to_string)?;

    for ty in ElementType::ALL {
        let ctor = i.typed_array_constructors.get(ty);
        let proto = i.typed_array_prototypes.get(ty);
        interp.register_constructor(ctor, ty.constructor_name(), 3, Some(proto))?;
        let bytes = Value::Number(ty.size() as f64);
        interp.register_constant(ctor, "BYTES_PER_ELEMENT", bytes.clone())?;
        interp.register_constant(proto, "BYTES_PER_ELEMENT", bytes)?;
    }
    Ok(())
}
