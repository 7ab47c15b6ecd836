//! Iterator prototypes: %IteratorPrototype%, %AsyncIteratorPrototype%,
//! %ArrayIteratorPrototype%, %StringIteratorPrototype% and
//! %AsyncFromSyncIteratorPrototype%

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::promise::{reject_abrupt, PromiseCapability};
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::iteration::IteratorRecord;
use crate::interpreter::object::{ObjectKind, PropertyNameKind};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// Slots of an Array Iterator. `iterated` is cleared once exhausted.
#[derive(Debug, Clone)]
pub struct ArrayIteratorData {
    pub iterated: Option<ObjectId>,
    pub next_index: usize,
    pub kind: PropertyNameKind,
}

/// Slots of a String Iterator; `position` is a byte offset into `string`.
#[derive(Debug, Clone)]
pub struct StringIteratorData {
    pub string: Option<JsString>,
    pub position: usize,
}

impl Interpreter {
    /// CreateArrayIterator(array, kind)
    pub(crate) fn create_array_iterator(&self, array: ObjectId, kind: PropertyNameKind) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.array_iterator_prototype)?;
        Ok(self.object_create(
            Some(proto),
            ObjectKind::ArrayIterator(ArrayIteratorData {
                iterated: Some(array),
                next_index: 0,
                kind,
            }),
        ))
    }

    /// CreateStringIterator(string)
    pub(crate) fn create_string_iterator(&self, string: JsString) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.string_iterator_prototype)?;
        Ok(self.object_create(
            Some(proto),
            ObjectKind::StringIterator(StringIteratorData {
                string: Some(string),
                position: 0,
            }),
        ))
    }
}

/// `%IteratorPrototype%[@@iterator]` and `%AsyncIteratorPrototype%[@@asyncIterator]`
fn return_this(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(call.this.cheap_clone())
}

/// %ArrayIteratorPrototype%.next()
fn array_iterator_next(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(iterator) = call.this else {
        return Err(JsError::type_error("next method called on incompatible receiver"));
    };
    let iterator = *iterator;
    let state = interp.object(iterator, |d| match &d.kind {
        ObjectKind::ArrayIterator(data) => Some(data.clone()),
        _ => None,
    })?;
    let Some(state) = state else {
        return Err(JsError::type_error(format!(
            "next method called on incompatible receiver {}",
            interp.display(call.this)
        )));
    };
    let Some(array) = state.iterated else {
        return Ok(Value::Object(interp.create_iter_result_object(Value::Undefined, true)?));
    };

    let len = match interp.typed_array_data(array)? {
        Some(ta) => {
            if interp.is_detached_buffer(ta.buffer)? {
                return Err(JsError::type_error("Cannot perform %ArrayIteratorPrototype%.next on a detached ArrayBuffer"));
            }
            ta.length as u64
        }
        None => interp.length_of_array_like(array)?,
    };

    let index = state.next_index;
    if index as u64 >= len {
        interp.object_mut(iterator, |d| {
            if let ObjectKind::ArrayIterator(data) = &mut d.kind {
                data.iterated = None;
            }
        })?;
        return Ok(Value::Object(interp.create_iter_result_object(Value::Undefined, true)?));
    }
    interp.object_mut(iterator, |d| {
        if let ObjectKind::ArrayIterator(data) = &mut d.kind {
            data.next_index = index + 1;
        }
    })?;

    let result = match state.kind {
        PropertyNameKind::Key => Value::Number(index as f64),
        PropertyNameKind::Value => interp.get(array, &PropertyKey::from(index))?,
        PropertyNameKind::KeyValue => {
            let value = interp.get(array, &PropertyKey::from(index))?;
            Value::Object(interp.create_array_from_list(vec![Value::Number(index as f64), value])?)
        }
    };
    Ok(Value::Object(interp.create_iter_result_object(result, false)?))
}

/// %StringIteratorPrototype%.next(): one code point per step.
fn string_iterator_next(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(iterator) = call.this else {
        return Err(JsError::type_error("next method called on incompatible receiver"));
    };
    let step = interp.object_mut(*iterator, |d| match &mut d.kind {
        ObjectKind::StringIterator(data) => {
            let Some(string) = &data.string else {
                return Some(None);
            };
            let next = string.as_str().get(data.position..).and_then(|rest| rest.chars().next());
            match next {
                Some(c) => {
                    data.position += c.len_utf8();
                    Some(Some(c))
                }
                None => {
                    data.string = None;
                    Some(None)
                }
            }
        }
        _ => None,
    })?;
    let result = match step {
        None => {
            return Err(JsError::type_error(format!(
                "next method called on incompatible receiver {}",
                interp.display(call.this)
            )))
        }
        Some(Some(c)) => interp.create_iter_result_object(Value::from(c.to_string()), false)?,
        Some(None) => interp.create_iter_result_object(Value::Undefined, true)?,
    };
    Ok(Value::Object(result))
}

/// The sync iterator record behind an async-from-sync iterator.
fn sync_iterator_record(interp: &Interpreter, this: &Value) -> JsResult<IteratorRecord> {
    let record = match this {
        Value::Object(obj) => interp.object(*obj, |d| match &d.kind {
            ObjectKind::AsyncFromSyncIterator(record) => Some(record.clone()),
            _ => None,
        })?,
        _ => None,
    };
    record.ok_or_else(|| JsError::internal("async-from-sync iterator without its sync record"))
}

/// AsyncFromSyncIteratorContinuation(result, promiseCapability, syncIteratorRecord, closeOnRejection)
fn async_from_sync_continuation(
    interp: &Interpreter,
    result: ObjectId,
    capability: &PromiseCapability,
    record: &IteratorRecord,
    close_on_rejection: bool,
) -> JsResult<Value> {
    let done = match reject_abrupt(interp, interp.iterator_complete(result), capability)? {
        Ok(done) => done,
        Err(promise) => return Ok(promise),
    };
    let value = match reject_abrupt(interp, interp.iterator_value(result), capability)? {
        Ok(value) => value,
        Err(promise) => return Ok(promise),
    };
    let promise_ctor = interp.intrinsic(|i| i.promise_constructor)?;
    let mut wrapper = interp.promise_resolve(promise_ctor, &value);
    if wrapper.is_err() && !done && close_on_rejection {
        wrapper = interp.iterator_close(record, wrapper);
    }
    let wrapper = match reject_abrupt(interp, wrapper, capability)? {
        Ok(wrapper) => wrapper,
        Err(promise) => return Ok(promise),
    };

    let on_fulfilled = interp.create_closure(async_from_sync_unwrap, 1, Captures::AsyncFromSyncUnwrap { done })?;
    let on_rejected = if done || !close_on_rejection {
        Value::Undefined
    } else {
        Value::Object(interp.create_closure(
            async_from_sync_close,
            1,
            Captures::AsyncFromSyncClose(record.clone()),
        )?)
    };
    interp.perform_promise_then(
        wrapper,
        &Value::Object(on_fulfilled),
        &on_rejected,
        Some(capability.clone()),
    )?;
    Ok(Value::Object(capability.promise))
}

/// `v => CreateIterResultObject(v, done)`
fn async_from_sync_unwrap(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Captures::AsyncFromSyncUnwrap { done } = interp.builtin_captures(call.function)? else {
        return Err(JsError::internal("unwrap closure without captures"));
    };
    Ok(Value::Object(interp.create_iter_result_object(call.arg(0), done)?))
}

/// `error => IteratorClose(syncIteratorRecord, ThrowCompletion(error))`
fn async_from_sync_close(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Captures::AsyncFromSyncClose(record) = interp.builtin_captures(call.function)? else {
        return Err(JsError::internal("close closure without captures"));
    };
    interp.iterator_close(&record, Err(JsError::thrown(call.arg(0))))
}

/// %AsyncFromSyncIteratorPrototype%.next(value)
fn async_from_sync_next(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let promise_ctor = Value::Object(interp.intrinsic(|i| i.promise_constructor)?);
    let capability = interp.new_promise_capability(&promise_ctor)?;
    let record = sync_iterator_record(interp, call.this)?;
    let value = call.args.first();
    let result = match reject_abrupt(interp, interp.iterator_next(&record, value), &capability)? {
        Ok(result) => result,
        Err(promise) => return Ok(promise),
    };
    async_from_sync_continuation(interp, result, &capability, &record, true)
}

/// %AsyncFromSyncIteratorPrototype%.return(value)
fn async_from_sync_return(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let promise_ctor = Value::Object(interp.intrinsic(|i| i.promise_constructor)?);
    let capability = interp.new_promise_capability(&promise_ctor)?;
    let record = sync_iterator_record(interp, call.this)?;
    let iterator = Value::Object(record.iterator);
    let method = interp.get_method(&iterator, &interp.key("return"));
    let method = match reject_abrupt(interp, method, &capability)? {
        Ok(method) => method,
        Err(promise) => return Ok(promise),
    };
    let Some(method) = method else {
        let done = interp.create_iter_result_object(call.arg(0), true)?;
        interp.call(&capability.resolve, &Value::Undefined, &[Value::Object(done)])?;
        return Ok(Value::Object(capability.promise));
    };
    let result = interp.call(&method, &iterator, call.args.get(..1).unwrap_or_default());
    let result = match reject_abrupt(interp, result, &capability)? {
        Ok(result) => result,
        Err(promise) => return Ok(promise),
    };
    let Value::Object(result) = result else {
        let error = interp.create_error(crate::error::ErrorKind::TypeError, "iterator.return() did not return an object")?;
        interp.call(&capability.reject, &Value::Undefined, &[Value::Object(error)])?;
        return Ok(Value::Object(capability.promise));
    };
    async_from_sync_continuation(interp, result, &capability, &record, false)
}

/// %AsyncFromSyncIteratorPrototype%.throw(value)
fn async_from_sync_throw(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let promise_ctor = Value::Object(interp.intrinsic(|i| i.promise_constructor)?);
    let capability = interp.new_promise_capability(&promise_ctor)?;
    let record = sync_iterator_record(interp, call.this)?;
    let iterator = Value::Object(record.iterator);
    let method = interp.get_method(&iterator, &interp.key("throw"));
    let method = match reject_abrupt(interp, method, &capability)? {
        Ok(method) => method,
        Err(promise) => return Ok(promise),
    };
    let Some(method) = method else {
        // The protocol was violated: close the sync iterator, then reject.
        let closed = interp.iterator_close(&record, Ok(Value::Undefined));
        if let Err(promise) = reject_abrupt(interp, closed, &capability)? {
            return Ok(promise);
        }
        let error = interp.create_error(
            crate::error::ErrorKind::TypeError,
            "The iterator does not provide a 'throw' method",
        )?;
        interp.call(&capability.reject, &Value::Undefined, &[Value::Object(error)])?;
        return Ok(Value::Object(capability.promise));
    };
    let result = interp.call(&method, &iterator, call.args.get(..1).unwrap_or_default());
    let result = match reject_abrupt(interp, result, &capability)? {
        Ok(result) => result,
        Err(promise) => return Ok(promise),
    };
    let Value::Object(result) = result else {
        let error = interp.create_error(crate::error::ErrorKind::TypeError, "iterator.throw() did not return an object")?;
        interp.call(&capability.reject, &Value::Undefined, &[Value::Object(error)])?;
        return Ok(Value::Object(capability.promise));
    };
    async_from_sync_continuation(interp, result, &capability, &record, true)
}

pub fn init_iterators(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let i = &realm.intrinsics;
    let wk = interp.well_known();

    interp.register_symbol_method(i.iterator_prototype, wk.iterator.cheap_clone(), return_this, 0)?;
    interp.register_symbol_method(
        i.async_iterator_prototype,
        wk.async_iterator.cheap_clone(),
        return_this,
        0,
    )?;

    interp.register_method(i.array_iterator_prototype, "next", array_iterator_next, 0)?;
    interp.register_to_string_tag(i.array_iterator_prototype, "Array Iterator")?;

    interp.register_method(i.string_iterator_prototype, "next", string_iterator_next, 0)?;
    interp.register_to_string_tag(i.string_iterator_prototype, "String Iterator")?;

    let afs = i.async_from_sync_iterator_prototype;
    interp.register_method(afs, "next", async_from_sync_next, 1)?;
    interp.register_method(afs, "return", async_from_sync_return, 1)?;
    interp.register_method(afs, "throw", async_from_sync_throw, 1)?;
    Ok(())
}
