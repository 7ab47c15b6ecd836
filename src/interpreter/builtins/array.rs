//! The Array constructor and Array.prototype
//!
//! The prototype methods are generic: they work on any object through
//! [[Get]], [[Set]] and friends, so array-likes, proxies and typed arrays
//! all go through the same code.

use std::cmp::Ordering;

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::{Property, PropertyNameKind};
use crate::interpreter::operators::compare_code_units;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// 2^53 - 1
const MAX_SAFE_LENGTH: u64 = 9_007_199_254_740_991;

/// The property key for an array index that may exceed the u32 range.
pub(super) fn index_key(index: u64) -> PropertyKey {
    match u32::try_from(index) {
        Ok(i) => PropertyKey::from(i),
        Err(_) => PropertyKey::from(index.to_string()),
    }
}

/// Resolve a relative index argument (negative counts from the end) into
/// `0..=len`.
pub(super) fn relative_index(interp: &Interpreter, value: &Value, len: u64, default: u64) -> JsResult<u64> {
    if value.is_undefined() {
        return Ok(default);
    }
    let relative = interp.to_integer_or_infinity(value)?;
    Ok(if relative < 0.0 {
        (len as f64 + relative).max(0.0) as u64
    } else {
        relative.min(len as f64) as u64
    })
}

pub(super) fn callback(interp: &Interpreter, value: Value) -> JsResult<Value> {
    if interp.is_callable(&value) {
        Ok(value)
    } else {
        Err(JsError::type_error(format!("{} is not a function", interp.display(&value))))
    }
}

fn set_length(interp: &Interpreter, obj: ObjectId, len: u64) -> JsResult<()> {
    interp.set(obj, &interp.key("length"), Value::Number(len as f64), true)
}

impl Interpreter {
    /// ArraySpeciesCreate(originalArray, length)
    pub(crate) fn array_species_create(&self, original: ObjectId, length: u64) -> JsResult<ObjectId> {
        if !self.is_array(&Value::Object(original))? {
            return self.array_create(length, None);
        }
        let mut ctor = self.get(original, &self.key("constructor"))?;
        if let Value::Object(c) = &ctor {
            if self.is_constructor(&ctor) {
                let realm = self.get_function_realm(*c)?;
                if realm != self.current_realm_id() && self.realm(realm)?.intrinsics.array_constructor == *c {
                    ctor = Value::Undefined;
                }
            }
        }
        if let Value::Object(c) = &ctor {
            let species = PropertyKey::Symbol(self.well_known().species.cheap_clone());
            ctor = match self.get(*c, &species)? {
                Value::Null => Value::Undefined,
                other => other,
            };
        }
        match ctor {
            Value::Undefined => self.array_create(length, None),
            Value::Object(c) if self.is_constructor(&ctor) => {
                self.construct(c, &[Value::Number(length as f64)], None)
            }
            other => Err(JsError::type_error(format!(
                "{} is not a constructor",
                self.display(&other)
            ))),
        }
    }

    /// IsConcatSpreadable(O)
    fn is_concat_spreadable(&self, value: &Value) -> JsResult<bool> {
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        let key = PropertyKey::Symbol(self.well_known().is_concat_spreadable.cheap_clone());
        match self.get(*obj, &key)? {
            Value::Undefined => self.is_array(value),
            spreadable => Ok(spreadable.to_boolean()),
        }
    }

    /// FlattenIntoArray(target, source, sourceLen, start, depth, mapper, thisArg)
    fn flatten_into_array(
        &self,
        target: ObjectId,
        source: ObjectId,
        source_len: u64,
        start: u64,
        depth: f64,
        mapper: Option<(&Value, &Value)>,
    ) -> JsResult<u64> {
        let mut target_index = start;
        for source_index in 0..source_len {
            self.tick()?;
            let key = index_key(source_index);
            if !self.has_property(source, &key)? {
                continue;
            }
            let mut element = self.get(source, &key)?;
            if let Some((mapper, this_arg)) = mapper {
                element = self.call(
                    mapper,
                    this_arg,
                    &[element, Value::Number(source_index as f64), Value::Object(source)],
                )?;
            }
            let flatten = depth > 0.0 && self.is_array(&element)?;
            match &element {
                Value::Object(inner) if flatten => {
                    let len = self.length_of_array_like(*inner)?;
                    target_index = self.flatten_into_array(target, *inner, len, target_index, depth - 1.0, None)?;
                }
                _ => {
                    if target_index >= MAX_SAFE_LENGTH {
                        return Err(JsError::type_error("Array too long"));
                    }
                    self.create_data_property_or_throw(target, index_key(target_index), element)?;
                    target_index += 1;
                }
            }
        }
        Ok(target_index)
    }

    /// SortIndexedProperties(obj, len, SortCompare, holes): the present
    /// elements in sorted order.
    fn sort_indexed_properties(&self, obj: ObjectId, len: u64, compare_fn: &Value, skip_holes: bool) -> JsResult<Vec<Value>> {
        let mut items = Vec::new();
        for k in 0..len {
            let key = index_key(k);
            if skip_holes && !self.has_property(obj, &key)? {
                continue;
            }
            items.push(self.get(obj, &key)?);
        }
        let (mut defined, undefined): (Vec<Value>, Vec<Value>) =
            items.into_iter().partition(|v| !v.is_undefined());
        defined = merge_sort(defined, &mut |x, y| self.sort_compare(x, y, compare_fn))?;
        defined.extend(undefined);
        Ok(defined)
    }

    /// SortCompare(x, y) for defined values.
    fn sort_compare(&self, x: &Value, y: &Value, compare_fn: &Value) -> JsResult<Ordering> {
        self.tick()?;
        if !compare_fn.is_undefined() {
            let v = self.to_number(&self.call(compare_fn, &Value::Undefined, &[x.cheap_clone(), y.cheap_clone()])?)?;
            return Ok(if v < 0.0 {
                Ordering::Less
            } else if v > 0.0 {
                Ordering::Greater
            } else {
                Ordering::Equal
            });
        }
        let xs = self.to_string(x)?;
        let ys = self.to_string(y)?;
        Ok(compare_code_units(xs.as_str(), ys.as_str()))
    }

    /// Shared loop of find, findIndex, findLast and findLastIndex.
    fn find_via_predicate(&self, call: &NativeCall<'_>, ascending: bool) -> JsResult<Option<(u64, Value)>> {
        let o = self.to_object(call.this)?;
        let len = self.length_of_array_like(o)?;
        let predicate = callback(self, call.arg(0))?;
        let this_arg = call.arg(1);
        for step in 0..len {
            let k = if ascending { step } else { len - 1 - step };
            let value = self.get(o, &index_key(k))?;
            let test = self.call(
                &predicate,
                &this_arg,
                &[value.cheap_clone(), Value::Number(k as f64), Value::Object(o)],
            )?;
            if test.to_boolean() {
                return Ok(Some((k, value)));
            }
        }
        Ok(None)
    }

    /// Shared loop of forEach, map, filter, some and every: calls the
    /// callback for each present element and hands the result to `visit`,
    /// which returns `false` to stop early.
    fn for_each_present(
        &self,
        o: ObjectId,
        len: u64,
        callback_fn: &Value,
        this_arg: &Value,
        mut visit: impl FnMut(u64, Value, Value) -> JsResult<bool>,
    ) -> JsResult<()> {
        for k in 0..len {
            let key = index_key(k);
            if !self.has_property(o, &key)? {
                continue;
            }
            let value = self.get(o, &key)?;
            let result = self.call(
                callback_fn,
                this_arg,
                &[value.cheap_clone(), Value::Number(k as f64), Value::Object(o)],
            )?;
            if !visit(k, value, result)? {
                break;
            }
        }
        Ok(())
    }
}

/// Stable merge sort with a fallible comparator. Unlike `slice::sort_by`
/// it tolerates inconsistent user comparators.
pub(super) fn merge_sort(
    mut items: Vec<Value>,
    compare: &mut dyn FnMut(&Value, &Value) -> JsResult<Ordering>,
) -> JsResult<Vec<Value>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l)? == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    Ok(merged)
}

// ============ CONSTRUCTOR ============

/// Array(...values)
pub fn array_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let new_target = call.new_target.unwrap_or(call.function);
    let proto = interp.get_prototype_from_constructor(new_target, |i| i.array_prototype)?;
    match call.args {
        [] => Ok(Value::Object(interp.array_create(0, Some(proto))?)),
        [len] => {
            let array = interp.array_create(0, Some(proto))?;
            let int_len = match len {
                Value::Number(n) => {
                    let int_len = interp.to_uint32(len)?;
                    if f64::from(int_len) != *n {
                        return Err(JsError::range_error("Invalid array length"));
                    }
                    int_len
                }
                other => {
                    interp.create_data_property_or_throw(array, PropertyKey::Index(0), other.cheap_clone())?;
                    1
                }
            };
            set_length(interp, array, u64::from(int_len))?;
            Ok(Value::Object(array))
        }
        values => {
            let array = interp.array_create(values.len() as u64, Some(proto))?;
            for (k, value) in values.iter().enumerate() {
                interp.create_data_property_or_throw(array, PropertyKey::from(k), value.cheap_clone())?;
            }
            Ok(Value::Object(array))
        }
    }
}

/// Array.isArray(arg)
fn array_is_array(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(interp.is_array(&call.arg(0))?))
}

/// `new C(len)` when `this` is a constructor, otherwise ArrayCreate(len).
fn construct_this_or_array(interp: &Interpreter, this: &Value, len: Option<u64>) -> JsResult<ObjectId> {
    match this {
        Value::Object(c) if interp.is_constructor(this) => {
            let args: Vec<Value> = len.map(|n| Value::Number(n as f64)).into_iter().collect();
            interp.construct(*c, &args, None)
        }
        _ => interp.array_create(len.unwrap_or(0), None),
    }
}

/// Array.of(...items)
fn array_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let len = call.args.len() as u64;
    let a = construct_this_or_array(interp, call.this, Some(len))?;
    for (k, item) in call.args.iter().enumerate() {
        interp.create_data_property_or_throw(a, PropertyKey::from(k), item.cheap_clone())?;
    }
    set_length(interp, a, len)?;
    Ok(Value::Object(a))
}

/// Array.from(items, mapfn, thisArg)
fn array_from(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let items = call.arg(0);
    let mapfn = call.arg(1);
    let this_arg = call.arg(2);
    let mapping = !mapfn.is_undefined();
    if mapping && !interp.is_callable(&mapfn) {
        return Err(JsError::type_error(format!("{} is not a function", interp.display(&mapfn))));
    }
    let map = |value: Value, k: u64| -> JsResult<Value> {
        if mapping {
            interp.call(&mapfn, &this_arg, &[value, Value::Number(k as f64)])
        } else {
            Ok(value)
        }
    };

    let iterator_key = PropertyKey::Symbol(interp.well_known().iterator.cheap_clone());
    if let Some(using_iterator) = interp.get_method(&items, &iterator_key)? {
        let a = construct_this_or_array(interp, call.this, None)?;
        let mut record = interp.get_iterator_from_method(&items, &using_iterator)?;
        let mut k = 0u64;
        loop {
            interp.tick()?;
            let Some(next) = interp.iterator_step_value(&mut record)? else {
                set_length(interp, a, k)?;
                return Ok(Value::Object(a));
            };
            let stored = map(next, k)
                .and_then(|value| interp.create_data_property_or_throw(a, index_key(k), value));
            if let Err(error) = stored {
                return interp.iterator_close(&record, Err(error));
            }
            k += 1;
        }
    }

    let array_like = interp.to_object(&items)?;
    let len = interp.length_of_array_like(array_like)?;
    let a = construct_this_or_array(interp, call.this, Some(len))?;
    for k in 0..len {
        let value = interp.get(array_like, &index_key(k))?;
        let value = map(value, k)?;
        interp.create_data_property_or_throw(a, index_key(k), value)?;
    }
    set_length(interp, a, len)?;
    Ok(Value::Object(a))
}

// ============ ITERATION ============

fn array_for_each(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let f = callback(interp, call.arg(0))?;
    interp.for_each_present(o, len, &f, &call.arg(1), |_, _, _| Ok(true))?;
    Ok(Value::Undefined)
}

fn array_map(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let f = callback(interp, call.arg(0))?;
    let a = interp.array_species_create(o, len)?;
    interp.for_each_present(o, len, &f, &call.arg(1), |k, _, mapped| {
        interp.create_data_property_or_throw(a, index_key(k), mapped)?;
        Ok(true)
    })?;
    Ok(Value::Object(a))
}

fn array_filter(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let f = callback(interp, call.arg(0))?;
    let a = interp.array_species_create(o, 0)?;
    let mut to = 0u64;
    interp.for_each_present(o, len, &f, &call.arg(1), |_, value, selected| {
        if selected.to_boolean() {
            interp.create_data_property_or_throw(a, index_key(to), value)?;
            to += 1;
        }
        Ok(true)
    })?;
    Ok(Value::Object(a))
}

fn array_some(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let f = callback(interp, call.arg(0))?;
    let mut found = false;
    interp.for_each_present(o, len, &f, &call.arg(1), |_, _, test| {
        found = test.to_boolean();
        Ok(!found)
    })?;
    Ok(Value::Boolean(found))
}

fn array_every(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let f = callback(interp, call.arg(0))?;
    let mut all = true;
    interp.for_each_present(o, len, &f, &call.arg(1), |_, _, test| {
        all = test.to_boolean();
        Ok(all)
    })?;
    Ok(Value::Boolean(all))
}

fn reduce(interp: &Interpreter, call: &NativeCall<'_>, ascending: bool) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let f = callback(interp, call.arg(0))?;
    let mut indices: Box<dyn Iterator<Item = u64>> = if ascending {
        Box::new(0..len)
    } else {
        Box::new((0..len).rev())
    };
    let mut accumulator = match call.args.get(1) {
        Some(initial) => initial.cheap_clone(),
        None => {
            let mut first = None;
            for k in indices.by_ref() {
                let key = index_key(k);
                if interp.has_property(o, &key)? {
                    first = Some(interp.get(o, &key)?);
                    break;
                }
            }
            first.ok_or_else(|| JsError::type_error("Reduce of empty array with no initial value"))?
        }
    };
    for k in indices {
        let key = index_key(k);
        if !interp.has_property(o, &key)? {
            continue;
        }
        let value = interp.get(o, &key)?;
        accumulator = interp.call(
            &f,
            &Value::Undefined,
            &[accumulator, value, Value::Number(k as f64), Value::Object(o)],
        )?;
    }
    Ok(accumulator)
}

fn array_reduce(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    reduce(interp, call, true)
}

fn array_reduce_right(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    reduce(interp, call, false)
}

fn array_find(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(interp.find_via_predicate(call, true)?.map(|(_, v)| v).unwrap_or_default())
}

fn array_find_index(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Number(
        interp.find_via_predicate(call, true)?.map_or(-1.0, |(k, _)| k as f64),
    ))
}

fn array_find_last(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(interp.find_via_predicate(call, false)?.map(|(_, v)| v).unwrap_or_default())
}

fn array_find_last_index(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Number(
        interp.find_via_predicate(call, false)?.map_or(-1.0, |(k, _)| k as f64),
    ))
}

fn array_flat(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let depth = match call.arg(0) {
        Value::Undefined => 1.0,
        depth => interp.to_integer_or_infinity(&depth)?.max(0.0),
    };
    let a = interp.array_species_create(o, 0)?;
    interp.flatten_into_array(a, o, len, 0, depth, None)?;
    Ok(Value::Object(a))
}

fn array_flat_map(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let mapper = callback(interp, call.arg(0))?;
    let a = interp.array_species_create(o, 0)?;
    interp.flatten_into_array(a, o, len, 0, 1.0, Some((&mapper, &call.arg(1))))?;
    Ok(Value::Object(a))
}

// ============ SEARCH ============

fn array_index_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    if len == 0 {
        return Ok(Value::Number(-1.0));
    }
    let target = call.arg(0);
    let start = relative_index(interp, &call.arg(1), len, 0)?;
    for k in start..len {
        let key = index_key(k);
        if interp.has_property(o, &key)? && interp.get(o, &key)?.strict_equals(&target) {
            return Ok(Value::Number(k as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

fn array_last_index_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    if len == 0 {
        return Ok(Value::Number(-1.0));
    }
    let target = call.arg(0);
    let from = match call.args.get(1) {
        Some(from) => interp.to_integer_or_infinity(from)?,
        None => len as f64 - 1.0,
    };
    let start = if from < 0.0 { len as f64 + from } else { from.min(len as f64 - 1.0) };
    if start < 0.0 {
        return Ok(Value::Number(-1.0));
    }
    for k in (0..=start as u64).rev() {
        let key = index_key(k);
        if interp.has_property(o, &key)? && interp.get(o, &key)?.strict_equals(&target) {
            return Ok(Value::Number(k as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

fn array_includes(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    if len == 0 {
        return Ok(Value::Boolean(false));
    }
    let target = call.arg(0);
    let start = relative_index(interp, &call.arg(1), len, 0)?;
    for k in start..len {
        if interp.get(o, &index_key(k))?.same_value_zero(&target) {
            return Ok(Value::Boolean(true));
        }
    }
    Ok(Value::Boolean(false))
}

fn array_at(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)? as f64;
    let relative = interp.to_integer_or_infinity(&call.arg(0))?;
    let k = if relative >= 0.0 { relative } else { len + relative };
    if k < 0.0 || k >= len {
        return Ok(Value::Undefined);
    }
    interp.get(o, &index_key(k as u64))
}

// ============ MUTATION ============

fn array_push(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    if len + call.args.len() as u64 > MAX_SAFE_LENGTH {
        return Err(JsError::type_error("Pushing elements past 2^53-1 is not allowed"));
    }
    let mut len = len;
    for item in call.args {
        interp.set(o, &index_key(len), item.cheap_clone(), true)?;
        len += 1;
    }
    set_length(interp, o, len)?;
    Ok(Value::Number(len as f64))
}

fn array_pop(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    if len == 0 {
        set_length(interp, o, 0)?;
        return Ok(Value::Undefined);
    }
    let key = index_key(len - 1);
    let element = interp.get(o, &key)?;
    interp.delete_property_or_throw(o, &key)?;
    set_length(interp, o, len - 1)?;
    Ok(element)
}

fn array_shift(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    if len == 0 {
        set_length(interp, o, 0)?;
        return Ok(Value::Undefined);
    }
    let first = interp.get(o, &PropertyKey::Index(0))?;
    move_elements(interp, o, 1, 0, len - 1)?;
    interp.delete_property_or_throw(o, &index_key(len - 1))?;
    set_length(interp, o, len - 1)?;
    Ok(first)
}

fn array_unshift(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let count = call.args.len() as u64;
    if count > 0 {
        if len + count > MAX_SAFE_LENGTH {
            return Err(JsError::type_error("Unshifting elements past 2^53-1 is not allowed"));
        }
        move_elements(interp, o, 0, count, len)?;
        for (j, item) in call.args.iter().enumerate() {
            interp.set(o, &PropertyKey::from(j), item.cheap_clone(), true)?;
        }
    }
    set_length(interp, o, len + count)?;
    Ok(Value::Number((len + count) as f64))
}

/// Move `count` elements from `from` to `to`, preserving holes. Iterates in
/// the direction that never overwrites unread elements.
fn move_elements(interp: &Interpreter, o: ObjectId, from: u64, to: u64, count: u64) -> JsResult<()> {
    let step = |k: u64| -> JsResult<()> {
        let from_key = index_key(from + k);
        let to_key = index_key(to + k);
        if interp.has_property(o, &from_key)? {
            let value = interp.get(o, &from_key)?;
            interp.set(o, &to_key, value, true)
        } else {
            interp.delete_property_or_throw(o, &to_key)
        }
    };
    if from > to {
        (0..count).try_for_each(step)
    } else {
        (0..count).rev().try_for_each(step)
    }
}

fn array_splice(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let start = relative_index(interp, &call.arg(0), len, 0)?;
    let items = call.args.get(2..).unwrap_or_default();
    let delete_count = match call.args.len() {
        0 => 0,
        1 => len - start,
        _ => {
            let dc = interp.to_integer_or_infinity(&call.arg(1))?;
            dc.clamp(0.0, (len - start) as f64) as u64
        }
    };
    let item_count = items.len() as u64;
    if len + item_count - delete_count > MAX_SAFE_LENGTH {
        return Err(JsError::type_error("Splice result exceeds 2^53-1"));
    }

    let removed = interp.array_species_create(o, delete_count)?;
    for k in 0..delete_count {
        let from = index_key(start + k);
        if interp.has_property(o, &from)? {
            let value = interp.get(o, &from)?;
            interp.create_data_property_or_throw(removed, index_key(k), value)?;
        }
    }
    set_length(interp, removed, delete_count)?;

    if item_count < delete_count {
        move_elements(interp, o, start + delete_count, start + item_count, len - start - delete_count)?;
        for k in (len - delete_count + item_count..len).rev() {
            interp.delete_property_or_throw(o, &index_key(k))?;
        }
    } else if item_count > delete_count {
        move_elements(interp, o, start + delete_count, start + item_count, len - start - delete_count)?;
    }
    for (j, item) in items.iter().enumerate() {
        interp.set(o, &index_key(start + j as u64), item.cheap_clone(), true)?;
    }
    set_length(interp, o, len - delete_count + item_count)?;
    Ok(Value::Object(removed))
}

fn array_reverse(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let middle = len / 2;
    for lower in 0..middle {
        let upper = len - lower - 1;
        let lower_key = index_key(lower);
        let upper_key = index_key(upper);
        let lower_exists = interp.has_property(o, &lower_key)?;
        let lower_value = if lower_exists { interp.get(o, &lower_key)? } else { Value::Undefined };
        let upper_exists = interp.has_property(o, &upper_key)?;
        let upper_value = if upper_exists { interp.get(o, &upper_key)? } else { Value::Undefined };
        match (lower_exists, upper_exists) {
            (true, true) => {
                interp.set(o, &lower_key, upper_value, true)?;
                interp.set(o, &upper_key, lower_value, true)?;
            }
            (false, true) => {
                interp.set(o, &lower_key, upper_value, true)?;
                interp.delete_property_or_throw(o, &upper_key)?;
            }
            (true, false) => {
                interp.delete_property_or_throw(o, &lower_key)?;
                interp.set(o, &upper_key, lower_value, true)?;
            }
            (false, false) => {}
        }
    }
    Ok(Value::Object(o))
}

fn compare_fn_arg(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let compare_fn = call.arg(0);
    if !compare_fn.is_undefined() && !interp.is_callable(&compare_fn) {
        return Err(JsError::type_error(
            "The comparison function must be either a function or undefined",
        ));
    }
    Ok(compare_fn)
}

fn array_sort(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let compare_fn = compare_fn_arg(interp, call)?;
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let sorted = interp.sort_indexed_properties(o, len, &compare_fn, true)?;
    let count = sorted.len() as u64;
    for (j, value) in sorted.into_iter().enumerate() {
        interp.set(o, &PropertyKey::from(j), value, true)?;
    }
    for k in count..len {
        interp.delete_property_or_throw(o, &index_key(k))?;
    }
    Ok(Value::Object(o))
}

fn array_fill(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let start = relative_index(interp, &call.arg(1), len, 0)?;
    let end = relative_index(interp, &call.arg(2), len, len)?;
    for k in start..end {
        interp.set(o, &index_key(k), call.arg(0), true)?;
    }
    Ok(Value::Object(o))
}

fn array_copy_within(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let to = relative_index(interp, &call.arg(0), len, 0)?;
    let from = relative_index(interp, &call.arg(1), len, 0)?;
    let end = relative_index(interp, &call.arg(2), len, len)?;
    let count = end.saturating_sub(from).min(len - to);
    move_elements(interp, o, from, to, count)?;
    Ok(Value::Object(o))
}

// ============ ACCESSORS ============

fn array_concat(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let a = interp.array_species_create(o, 0)?;
    let mut n = 0u64;
    let items = std::iter::once(Value::Object(o)).chain(call.args.iter().cloned());
    for item in items {
        match &item {
            Value::Object(e) if interp.is_concat_spreadable(&item)? => {
                let len = interp.length_of_array_like(*e)?;
                if n + len > MAX_SAFE_LENGTH {
                    return Err(JsError::type_error("Concatenated array exceeds 2^53-1"));
                }
                for k in 0..len {
                    let key = index_key(k);
                    if interp.has_property(*e, &key)? {
                        let value = interp.get(*e, &key)?;
                        interp.create_data_property_or_throw(a, index_key(n), value)?;
                    }
                    n += 1;
                }
            }
            _ => {
                if n >= MAX_SAFE_LENGTH {
                    return Err(JsError::type_error("Concatenated array exceeds 2^53-1"));
                }
                interp.create_data_property_or_throw(a, index_key(n), item)?;
                n += 1;
            }
        }
    }
    set_length(interp, a, n)?;
    Ok(Value::Object(a))
}

fn array_slice(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let start = relative_index(interp, &call.arg(0), len, 0)?;
    let end = relative_index(interp, &call.arg(1), len, len)?;
    let count = end.saturating_sub(start);
    let a = interp.array_species_create(o, count)?;
    let mut n = 0u64;
    for k in start..end {
        let key = index_key(k);
        if interp.has_property(o, &key)? {
            let value = interp.get(o, &key)?;
            interp.create_data_property_or_throw(a, index_key(n), value)?;
        }
        n += 1;
    }
    set_length(interp, a, n)?;
    Ok(Value::Object(a))
}

fn array_join(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let separator = match call.arg(0) {
        Value::Undefined => JsString::from(","),
        sep => interp.to_string(&sep)?,
    };
    let mut out = String::new();
    for k in 0..len {
        interp.tick()?;
        if k > 0 {
            out.push_str(separator.as_str());
        }
        let element = interp.get(o, &index_key(k))?;
        if !element.is_nullish() {
            out.push_str(interp.to_string(&element)?.as_str());
        }
    }
    Ok(Value::from(out))
}

fn array_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let join = interp.get(o, &interp.key("join"))?;
    if interp.is_callable(&join) {
        return interp.call(&join, &Value::Object(o), &[]);
    }
    let to_string = interp.intrinsic(|i| i.object_prototype)?;
    let to_string = interp.get(to_string, &interp.key("toString"))?;
    interp.call(&to_string, &Value::Object(o), &[])
}

fn array_to_locale_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let mut out = String::new();
    for k in 0..len {
        if k > 0 {
            out.push(',');
        }
        let element = interp.get(o, &index_key(k))?;
        if !element.is_nullish() {
            let s = interp.invoke(&element, &interp.key("toLocaleString"), &[])?;
            out.push_str(interp.to_string(&s)?.as_str());
        }
    }
    Ok(Value::from(out))
}

// ============ COPYING VARIANTS ============

fn array_to_reversed(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let a = interp.array_create(len, None)?;
    for k in 0..len {
        let value = interp.get(o, &index_key(len - k - 1))?;
        interp.create_data_property_or_throw(a, index_key(k), value)?;
    }
    Ok(Value::Object(a))
}

fn array_to_sorted(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let compare_fn = compare_fn_arg(interp, call)?;
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let sorted = interp.sort_indexed_properties(o, len, &compare_fn, false)?;
    Ok(Value::Object(interp.create_array_from_list(sorted)?))
}

fn array_to_spliced(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let start = relative_index(interp, &call.arg(0), len, 0)?;
    let items = call.args.get(2..).unwrap_or_default();
    let skip = match call.args.len() {
        0 => 0,
        1 => len - start,
        _ => interp.to_integer_or_infinity(&call.arg(1))?.clamp(0.0, (len - start) as f64) as u64,
    };
    let new_len = len + items.len() as u64 - skip;
    if new_len > MAX_SAFE_LENGTH {
        return Err(JsError::type_error("toSpliced result exceeds 2^53-1"));
    }
    let a = interp.array_create(new_len, None)?;
    let mut i = 0u64;
    for k in 0..start {
        let value = interp.get(o, &index_key(k))?;
        interp.create_data_property_or_throw(a, index_key(i), value)?;
        i += 1;
    }
    for item in items {
        interp.create_data_property_or_throw(a, index_key(i), item.cheap_clone())?;
        i += 1;
    }
    for k in start + skip..len {
        let value = interp.get(o, &index_key(k))?;
        interp.create_data_property_or_throw(a, index_key(i), value)?;
        i += 1;
    }
    Ok(Value::Object(a))
}

fn array_with(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    let len = interp.length_of_array_like(o)?;
    let relative = interp.to_integer_or_infinity(&call.arg(0))?;
    let actual = if relative >= 0.0 { relative } else { len as f64 + relative };
    if actual < 0.0 || actual >= len as f64 {
        return Err(JsError::range_error("Invalid index"));
    }
    let actual = actual as u64;
    let a = interp.array_create(len, None)?;
    for k in 0..len {
        let value = if k == actual { call.arg(1) } else { interp.get(o, &index_key(k))? };
        interp.create_data_property_or_throw(a, index_key(k), value)?;
    }
    Ok(Value::Object(a))
}

// ============ ITERATORS ============

fn array_keys(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    Ok(Value::Object(interp.create_array_iterator(o, PropertyNameKind::Key)?))
}

/// Array.prototype.values, also installed as `[Symbol.iterator]`.
pub fn array_values(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    Ok(Value::Object(interp.create_array_iterator(o, PropertyNameKind::Value)?))
}

fn array_entries(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let o = interp.to_object(call.this)?;
    Ok(Value::Object(interp.create_array_iterator(o, PropertyNameKind::KeyValue)?))
}

pub fn init_array(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let proto = realm.intrinsics.array_prototype;
    let ctor = realm.intrinsics.array_constructor;
    interp.register_constructor(ctor, "Array", 1, Some(proto))?;
    interp.register_method(ctor, "isArray", array_is_array, 1)?;
    interp.register_method(ctor, "of", array_of, 0)?;
    interp.register_method(ctor, "from", array_from, 1)?;

    let methods: [(&str, super::NativeFn, usize); 37] = [
        ("at", array_at, 1),
        ("concat", array_concat, 1),
        ("copyWithin", array_copy_within, 2),
        ("entries", array_entries, 0),
        ("every", array_every, 1),
        ("fill", array_fill, 1),
        ("filter", array_filter, 1),
        ("find", array_find, 1),
        ("findIndex", array_find_index, 1),
        ("findLast", array_find_last, 1),
        ("findLastIndex", array_find_last_index, 1),
        ("flat", array_flat, 0),
        ("flatMap", array_flat_map, 1),
        ("forEach", array_for_each, 1),
        ("includes", array_includes, 1),
        ("indexOf", array_index_of, 1),
        ("join", array_join, 1),
        ("keys", array_keys, 0),
        ("lastIndexOf", array_last_index_of, 1),
        ("map", array_map, 1),
        ("pop", array_pop, 0),
        ("push", array_push, 1),
        ("reduce", array_reduce, 1),
        ("reduceRight", array_reduce_right, 1),
        ("reverse", array_reverse, 0),
        ("shift", array_shift, 0),
        ("slice", array_slice, 2),
        ("some", array_some, 1),
        ("sort", array_sort, 1),
        ("splice", array_splice, 2),
        ("toLocaleString", array_to_locale_string, 0),
        ("toReversed", array_to_reversed, 0),
        ("toSorted", array_to_sorted, 1),
        ("toSpliced", array_to_spliced, 2),
        ("toString", array_to_string, 0),
        ("unshift", array_unshift, 1),
        ("with", array_with, 2),
    ];
    for (name, behavior, length) in methods {
        interp.register_method(proto, name, behavior, length)?;
    }

    let values = realm.intrinsics.array_prototype_values;
    interp.name_builtin(values, 0, interp.intern("values"))?;
    interp.insert_property(proto, interp.key("values"), Property::hidden(Value::Object(values)))?;
    interp.insert_property(
        proto,
        PropertyKey::Symbol(interp.well_known().iterator.cheap_clone()),
        Property::hidden(Value::Object(values)),
    )?;

    let unscopables = interp.object_create(None, crate::interpreter::object::ObjectKind::Ordinary);
    for name in [
        "at",
        "copyWithin",
        "entries",
        "fill",
        "find",
        "findIndex",
        "findLast",
        "findLastIndex",
        "flat",
        "flatMap",
        "includes",
        "keys",
        "toReversed",
        "toSorted",
        "toSpliced",
        "values",
    ] {
        interp.create_data_property_or_throw(unscopables, interp.key(name), Value::Boolean(true))?;
    }
    interp.insert_property(
        proto,
        PropertyKey::Symbol(interp.well_known().unscopables.cheap_clone()),
        Property::data(Value::Object(unscopables), false, false, true),
    )?;
    Ok(())
}
