//! Iterator protocol operations
//!
//! Iterator records and the abstract operations over them. Everything here
//! is synchronous except `async_iterator_close`, which awaits the result of
//! the `return` method and therefore only runs inside an async body.

use crate::error::{JsError, JsResult};
use crate::interpreter::object::ObjectKind;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, PropertyKey, Value};

/// Iterator Record: the iterator, its cached `next` method and [[Done]].
#[derive(Debug, Clone)]
pub struct IteratorRecord {
    pub iterator: ObjectId,
    pub next_method: Value,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorHint {
    Sync,
    Async,
}

impl Interpreter {
    /// GetIteratorFromMethod(obj, method)
    pub(crate) fn get_iterator_from_method(&self, value: &Value, method: &Value) -> JsResult<IteratorRecord> {
        let iterator = self.call(method, value, &[])?;
        let Value::Object(iterator) = iterator else {
            return Err(JsError::type_error("Result of the Symbol.iterator method is not an object"));
        };
        let next_method = self.get(iterator, &self.key("next"))?;
        Ok(IteratorRecord {
            iterator,
            next_method,
            done: false,
        })
    }

    /// GetIterator(obj, kind)
    pub(crate) fn get_iterator(&self, value: &Value, hint: IteratorHint) -> JsResult<IteratorRecord> {
        let sync_key = PropertyKey::Symbol(self.well_known().iterator.cheap_clone());
        if hint == IteratorHint::Async {
            let async_key = PropertyKey::Symbol(self.well_known().async_iterator.cheap_clone());
            if let Some(method) = self.get_method(value, &async_key)? {
                return self.get_iterator_from_method(value, &method);
            }
            let Some(sync_method) = self.get_method(value, &sync_key)? else {
                return Err(JsError::type_error(format!(
                    "{} is not async iterable",
                    self.display(value)
                )));
            };
            let sync = self.get_iterator_from_method(value, &sync_method)?;
            return self.create_async_from_sync_iterator(sync);
        }
        match self.get_method(value, &sync_key)? {
            Some(method) => self.get_iterator_from_method(value, &method),
            None => Err(JsError::type_error(format!("{} is not iterable", self.display(value)))),
        }
    }

    /// IteratorNext(iteratorRecord, value)
    pub(crate) fn iterator_next(&self, record: &IteratorRecord, value: Option<&Value>) -> JsResult<ObjectId> {
        let args: Vec<Value> = value.into_iter().cloned().collect();
        let result = self.call(&record.next_method, &Value::Object(record.iterator), &args)?;
        match result {
            Value::Object(obj) => Ok(obj),
            other => Err(JsError::type_error(format!(
                "Iterator result {} is not an object",
                self.display(&other)
            ))),
        }
    }

    /// IteratorComplete(iterResult)
    pub(crate) fn iterator_complete(&self, result: ObjectId) -> JsResult<bool> {
        Ok(self.get(result, &self.key("done"))?.to_boolean())
    }

    /// IteratorValue(iterResult)
    pub(crate) fn iterator_value(&self, result: ObjectId) -> JsResult<Value> {
        self.get(result, &self.key("value"))
    }

    /// IteratorStep(iteratorRecord): the result object, or `None` once done.
    /// [[Done]] is set when the iterator finishes or misbehaves.
    pub(crate) fn iterator_step(&self, record: &mut IteratorRecord) -> JsResult<Option<ObjectId>> {
        let result = match self.iterator_next(record, None) {
            Ok(result) => result,
            Err(e) => {
                record.done = true;
                return Err(e);
            }
        };
        match self.iterator_complete(result) {
            Ok(true) => {
                record.done = true;
                Ok(None)
            }
            Ok(false) => Ok(Some(result)),
            Err(e) => {
                record.done = true;
                Err(e)
            }
        }
    }

    /// IteratorStepValue(iteratorRecord)
    pub(crate) fn iterator_step_value(&self, record: &mut IteratorRecord) -> JsResult<Option<Value>> {
        let Some(result) = self.iterator_step(record)? else {
            return Ok(None);
        };
        match self.iterator_value(result) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                record.done = true;
                Err(e)
            }
        }
    }

    /// IteratorClose(iteratorRecord, completion). Fatal errors skip the
    /// `return` call; a throw completion wins over catchable errors from `return`.
    pub(crate) fn iterator_close<T>(&self, record: &IteratorRecord, completion: JsResult<T>) -> JsResult<T> {
        if matches!(&completion, Err(e) if e.is_fatal()) {
            return completion;
        }
        let iterator = Value::Object(record.iterator);
        let inner = self
            .get_method(&iterator, &self.key("return"))
            .and_then(|method| match method {
                Some(method) => self.call(&method, &iterator, &[]).map(Some),
                None => Ok(None),
            });
        close_result(completion, inner)
    }

    /// AsyncIteratorClose(iteratorRecord, completion)
    pub(crate) async fn async_iterator_close<T>(
        &self,
        record: &IteratorRecord,
        completion: JsResult<T>,
    ) -> JsResult<T> {
        if matches!(&completion, Err(e) if e.is_fatal()) {
            return completion;
        }
        let iterator = Value::Object(record.iterator);
        let method = match self.get_method(&iterator, &self.key("return")) {
            Ok(method) => method,
            Err(e) => return close_result(completion, Err(e)),
        };
        let inner = match method {
            Some(method) => match self.call(&method, &iterator, &[]) {
                Ok(result) => self.await_value(result).await.map(Some),
                Err(e) => Err(e),
            },
            None => Ok(None),
        };
        close_result(completion, inner)
    }

    /// CreateIterResultObject(value, done)
    pub(crate) fn create_iter_result_object(&self, value: Value, done: bool) -> JsResult<ObjectId> {
        let obj = self.ordinary_object()?;
        self.create_data_property_or_throw(obj, self.key("value"), value)?;
        self.create_data_property_or_throw(obj, self.key("done"), Value::Boolean(done))?;
        Ok(obj)
    }

    /// IteratorToList(GetIterator(value, sync))
    pub(crate) fn iterate_to_list(&self, value: &Value) -> JsResult<Vec<Value>> {
        let mut record = self.get_iterator(value, IteratorHint::Sync)?;
        let mut values = Vec::new();
        while let Some(value) = self.iterator_step_value(&mut record)? {
            self.tick()?;
            values.push(value);
        }
        Ok(values)
    }

    /// CreateAsyncFromSyncIterator(syncIteratorRecord)
    pub(crate) fn create_async_from_sync_iterator(&self, sync: IteratorRecord) -> JsResult<IteratorRecord> {
        let proto = self.intrinsic(|i| i.async_from_sync_iterator_prototype)?;
        let iterator = self.object_create(Some(proto), ObjectKind::AsyncFromSyncIterator(sync));
        let next_method = self.get(iterator, &self.key("next"))?;
        Ok(IteratorRecord {
            iterator,
            next_method,
            done: false,
        })
    }
}

/// Steps 5-7 of IteratorClose: combine the original completion with the
/// outcome of calling `return`.
fn close_result<T>(completion: JsResult<T>, inner: JsResult<Option<Value>>) -> JsResult<T> {
    // A fatal condition raised by `return` unwinds past any throw.
    let inner = match inner {
        Err(e) if e.is_fatal() => return Err(e),
        other => other,
    };
    if matches!(&completion, Err(e) if !matches!(e, JsError::GeneratorReturn(_))) {
        return completion;
    }
    match inner? {
        None | Some(Value::Object(_)) => completion,
        Some(_) => Err(JsError::type_error("Iterator result is not an object")),
    }
}
