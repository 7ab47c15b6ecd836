//! Promise objects, their abstract operations and the Promise built-ins
//!
//! Settling a promise never runs handlers directly: reactions become jobs
//! on the interpreter's queue (see `jobs`).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{ErrorKind, JsError, JsResult};
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::iteration::{IteratorHint, IteratorRecord};
use crate::interpreter::jobs::Job;
use crate::interpreter::object::ObjectKind;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, Value};

/// [[PromiseState]] together with [[PromiseResult]]
#[derive(Debug, Clone)]
pub enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

/// Internal slots of a promise object.
pub struct PromiseData {
    pub state: PromiseState,
    fulfill_reactions: Vec<PromiseReaction>,
    reject_reactions: Vec<PromiseReaction>,
    pub is_handled: bool,
}

impl PromiseData {
    pub fn new() -> Self {
        Self {
            state: PromiseState::Pending,
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            is_handled: false,
        }
    }
}

impl Default for PromiseData {
    fn default() -> Self {
        Self::new()
    }
}

/// PromiseCapability Record
#[derive(Debug, Clone)]
pub struct PromiseCapability {
    pub promise: ObjectId,
    pub resolve: Value,
    pub reject: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionType {
    Fulfill,
    Reject,
}

/// PromiseReaction Record
#[derive(Debug, Clone)]
pub struct PromiseReaction {
    pub capability: Option<PromiseCapability>,
    pub kind: ReactionType,
    pub handler: Option<Value>,
}

/// The resolve and reject slots GetCapabilitiesExecutor fills in.
#[derive(Default)]
pub struct CapabilitySlots {
    resolve: Value,
    reject: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    All,
    AllSettledFulfilled,
    AllSettledRejected,
    Any,
}

/// State shared by the element functions of one combinator call.
struct Combinator {
    values: RefCell<Vec<Value>>,
    remaining: Cell<usize>,
    capability: PromiseCapability,
}

/// One element function of `Promise.all`, `allSettled` or `any`.
pub struct PromiseElement {
    index: usize,
    kind: ElementKind,
    already_called: Cell<bool>,
    shared: Rc<Combinator>,
}

impl Interpreter {
    fn with_promise<R>(&self, obj: ObjectId, f: impl FnOnce(&mut PromiseData) -> R) -> JsResult<Option<R>> {
        self.object_mut(obj, |d| match &mut d.kind {
            ObjectKind::Promise(p) => Some(f(p)),
            _ => None,
        })
    }

    /// IsPromise(x)
    pub(crate) fn is_promise(&self, value: &Value) -> bool {
        match value {
            Value::Object(obj) => self.kind_is(*obj, |k| matches!(k, ObjectKind::Promise(_))),
            _ => false,
        }
    }

    /// The settled state of a promise, `None` for other objects.
    pub(crate) fn promise_state(&self, obj: ObjectId) -> JsResult<Option<PromiseState>> {
        self.with_promise(obj, |p| p.state.clone())
    }

    /// The reason of a rejected promise.
    pub(crate) fn promise_rejection_reason(&self, obj: ObjectId) -> Option<Value> {
        match self.promise_state(obj) {
            Ok(Some(PromiseState::Rejected(reason))) => Some(reason),
            _ => None,
        }
    }

    /// A pending promise with %Promise.prototype% of the current realm.
    pub(crate) fn new_intrinsic_promise(&self) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.promise_prototype)?;
        Ok(self.object_create(Some(proto), ObjectKind::Promise(Box::default())))
    }

    /// CreateResolvingFunctions(promise)
    pub(crate) fn create_resolving_functions(&self, promise: ObjectId) -> JsResult<(ObjectId, ObjectId)> {
        let already_resolved = Rc::new(Cell::new(false));
        let resolve = self.create_closure(
            promise_resolve_function,
            1,
            Captures::Resolving {
                promise,
                already_resolved: already_resolved.clone(),
            },
        )?;
        let reject = self.create_closure(
            promise_reject_function,
            1,
            Captures::Resolving {
                promise,
                already_resolved,
            },
        )?;
        Ok((resolve, reject))
    }

    /// The resolution steps of a promise resolve function.
    fn resolve_promise(&self, promise: ObjectId, resolution: Value) -> JsResult<()> {
        let Value::Object(obj) = resolution else {
            return self.fulfill_promise(promise, resolution);
        };
        if obj == promise {
            let error = self.create_error(ErrorKind::TypeError, "Chaining cycle detected for promise")?;
            return self.reject_promise(promise, Value::Object(error));
        }
        let then = match self.get(obj, &self.key("then")) {
            Ok(then) => then,
            Err(error) => {
                let reason = self.catchable_value(error)?;
                return self.reject_promise(promise, reason);
            }
        };
        if !self.is_callable(&then) {
            return self.fulfill_promise(promise, Value::Object(obj));
        }
        let realm = match &then {
            Value::Object(f) => self.get_function_realm(*f).unwrap_or_else(|_| self.current_realm_id()),
            _ => self.current_realm_id(),
        };
        self.enqueue_job(Job::ResolveThenable {
            promise,
            thenable: Value::Object(obj),
            then,
            realm,
        });
        Ok(())
    }

    /// FulfillPromise(promise, value)
    pub(crate) fn fulfill_promise(&self, promise: ObjectId, value: Value) -> JsResult<()> {
        let reactions = self.with_promise(promise, |p| {
            if !matches!(p.state, PromiseState::Pending) {
                return Vec::new();
            }
            p.state = PromiseState::Fulfilled(value.cheap_clone());
            p.reject_reactions.clear();
            std::mem::take(&mut p.fulfill_reactions)
        })?;
        self.trigger_promise_reactions(reactions.unwrap_or_default(), &value);
        Ok(())
    }

    /// RejectPromise(promise, reason)
    pub(crate) fn reject_promise(&self, promise: ObjectId, reason: Value) -> JsResult<()> {
        let settled = self.with_promise(promise, |p| {
            if !matches!(p.state, PromiseState::Pending) {
                return None;
            }
            p.state = PromiseState::Rejected(reason.cheap_clone());
            p.fulfill_reactions.clear();
            Some((std::mem::take(&mut p.reject_reactions), p.is_handled))
        })?;
        let Some(Some((reactions, handled))) = settled else {
            return Ok(());
        };
        if !handled {
            self.rejections.rejected(promise);
        }
        self.trigger_promise_reactions(reactions, &reason);
        Ok(())
    }

    /// TriggerPromiseReactions(reactions, argument)
    fn trigger_promise_reactions(&self, reactions: Vec<PromiseReaction>, argument: &Value) {
        for reaction in reactions {
            let realm = match &reaction.handler {
                Some(Value::Object(f)) => self.get_function_realm(*f).unwrap_or_else(|_| self.current_realm_id()),
                _ => self.current_realm_id(),
            };
            self.enqueue_job(Job::Reaction {
                reaction,
                argument: argument.cheap_clone(),
                realm,
            });
        }
    }

    /// NewPromiseCapability(C)
    pub(crate) fn new_promise_capability(&self, constructor: &Value) -> JsResult<PromiseCapability> {
        let Value::Object(ctor) = constructor else {
            return Err(JsError::type_error("Promise capability constructor is not a constructor"));
        };
        if !self.is_constructor(constructor) {
            return Err(JsError::type_error(format!(
                "{} is not a constructor",
                self.display(constructor)
            )));
        }
        let slots = Rc::new(RefCell::new(CapabilitySlots::default()));
        let executor = self.create_closure(
            get_capabilities_executor,
            2,
            Captures::CapabilityExecutor(slots.clone()),
        )?;
        let promise = self.construct(*ctor, &[Value::Object(executor)], None)?;
        let (resolve, reject) = {
            let slots = slots.borrow();
            (slots.resolve.cheap_clone(), slots.reject.cheap_clone())
        };
        if !self.is_callable(&resolve) {
            return Err(JsError::type_error("Promise resolve function is not callable"));
        }
        if !self.is_callable(&reject) {
            return Err(JsError::type_error("Promise reject function is not callable"));
        }
        Ok(PromiseCapability {
            promise,
            resolve,
            reject,
        })
    }

    /// PromiseResolve(C, x)
    pub(crate) fn promise_resolve(&self, constructor: ObjectId, value: &Value) -> JsResult<ObjectId> {
        if let Value::Object(obj) = value {
            if self.is_promise(value) {
                let value_constructor = self.get(*obj, &self.key("constructor"))?;
                if value_constructor.same_value(&Value::Object(constructor)) {
                    return Ok(*obj);
                }
            }
        }
        let capability = self.new_promise_capability(&Value::Object(constructor))?;
        self.call(&capability.resolve, &Value::Undefined, &[value.cheap_clone()])?;
        Ok(capability.promise)
    }

    /// PerformPromiseThen(promise, onFulfilled, onRejected, resultCapability)
    pub(crate) fn perform_promise_then(
        &self,
        promise: ObjectId,
        on_fulfilled: &Value,
        on_rejected: &Value,
        capability: Option<PromiseCapability>,
    ) -> JsResult<Value> {
        let handler = |h: &Value| self.is_callable(h).then(|| h.cheap_clone());
        let fulfill = PromiseReaction {
            capability: capability.clone(),
            kind: ReactionType::Fulfill,
            handler: handler(on_fulfilled),
        };
        let reject = PromiseReaction {
            capability: capability.clone(),
            kind: ReactionType::Reject,
            handler: handler(on_rejected),
        };
        let settled = self
            .with_promise(promise, |p| {
                let was_handled = p.is_handled;
                p.is_handled = true;
                match &p.state {
                    PromiseState::Pending => {
                        p.fulfill_reactions.push(fulfill.clone());
                        p.reject_reactions.push(reject.clone());
                        None
                    }
                    PromiseState::Fulfilled(v) => Some((fulfill.clone(), v.cheap_clone(), true)),
                    PromiseState::Rejected(r) => Some((reject.clone(), r.cheap_clone(), was_handled)),
                }
            })?
            .ok_or_else(|| JsError::type_error("PerformPromiseThen on a non-promise"))?;
        if let Some((reaction, argument, was_handled)) = settled {
            if !was_handled {
                self.rejections.handled(promise);
            }
            self.trigger_promise_reactions(vec![reaction], &argument);
        }
        Ok(capability.map_or(Value::Undefined, |c| Value::Object(c.promise)))
    }

    /// A promise of the current realm already rejected with `reason`.
    pub(crate) fn rejected_promise(&self, reason: Value) -> JsResult<ObjectId> {
        let promise = self.new_intrinsic_promise()?;
        self.reject_promise(promise, reason)?;
        Ok(promise)
    }

    /// A promise of the current realm already fulfilled with `value`.
    pub(crate) fn fulfilled_promise(&self, value: Value) -> JsResult<ObjectId> {
        let promise = self.new_intrinsic_promise()?;
        self.fulfill_promise(promise, value)?;
        Ok(promise)
    }
}

// ============ CLOSURES ============

fn resolving_captures(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Option<ObjectId>> {
    match interp.builtin_captures(call.function)? {
        Captures::Resolving {
            promise,
            already_resolved,
        } => {
            if already_resolved.get() {
                return Ok(None);
            }
            already_resolved.set(true);
            Ok(Some(promise))
        }
        _ => Err(JsError::internal("promise resolving function without captures")),
    }
}

/// Promise Resolve Functions
fn promise_resolve_function(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    if let Some(promise) = resolving_captures(interp, call)? {
        interp.resolve_promise(promise, call.arg(0))?;
    }
    Ok(Value::Undefined)
}

/// Promise Reject Functions
fn promise_reject_function(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    if let Some(promise) = resolving_captures(interp, call)? {
        interp.reject_promise(promise, call.arg(0))?;
    }
    Ok(Value::Undefined)
}

/// GetCapabilitiesExecutor Functions
fn get_capabilities_executor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Captures::CapabilityExecutor(slots) = interp.builtin_captures(call.function)? else {
        return Err(JsError::internal("capability executor without captures"));
    };
    let mut slots = slots.borrow_mut();
    if !slots.resolve.is_undefined() {
        return Err(JsError::type_error("Promise executor has already been invoked"));
    }
    if !slots.reject.is_undefined() {
        return Err(JsError::type_error("Promise executor has already been invoked"));
    }
    slots.resolve = call.arg(0);
    slots.reject = call.arg(1);
    Ok(Value::Undefined)
}

// ============ CONSTRUCTOR ============

/// Promise(executor)
pub fn promise_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Some(new_target) = call.new_target else {
        return Err(JsError::type_error("Promise constructor cannot be invoked without 'new'"));
    };
    let executor = call.arg(0);
    if !interp.is_callable(&executor) {
        return Err(JsError::type_error(format!(
            "Promise resolver {} is not a function",
            interp.display(&executor)
        )));
    }
    let promise = interp.ordinary_create_from_constructor(
        Some(new_target),
        |i| i.promise_prototype,
        ObjectKind::Promise(Box::default()),
    )?;
    let (resolve, reject) = interp.create_resolving_functions(promise)?;
    let result = interp.call(
        &executor,
        &Value::Undefined,
        &[Value::Object(resolve), Value::Object(reject)],
    );
    if let Err(error) = result {
        let reason = interp.catchable_value(error)?;
        interp.call(&Value::Object(reject), &Value::Undefined, &[reason])?;
    }
    Ok(Value::Object(promise))
}

fn this_constructor(interp: &Interpreter, this: &Value) -> JsResult<ObjectId> {
    match this {
        Value::Object(obj) => Ok(*obj),
        other => Err(JsError::type_error(format!(
            "{} is not an object",
            interp.display(other)
        ))),
    }
}

/// Promise.resolve(x)
fn promise_static_resolve(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let ctor = this_constructor(interp, call.this)?;
    Ok(Value::Object(interp.promise_resolve(ctor, &call.arg(0))?))
}

/// Promise.reject(r)
fn promise_static_reject(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let capability = interp.new_promise_capability(call.this)?;
    interp.call(&capability.reject, &Value::Undefined, &[call.arg(0)])?;
    Ok(Value::Object(capability.promise))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum CombinatorKind {
    All,
    AllSettled,
    Any,
    Race,
}

/// IfAbruptRejectPromise(value, capability)
pub(crate) fn reject_abrupt<T>(
    interp: &Interpreter,
    result: JsResult<T>,
    capability: &PromiseCapability,
) -> JsResult<Result<T, Value>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(error) => {
            let reason = interp.catchable_value(error)?;
            interp.call(&capability.reject, &Value::Undefined, &[reason])?;
            Ok(Err(Value::Object(capability.promise)))
        }
    }
}

/// The shared skeleton of `Promise.all`, `allSettled`, `any` and `race`.
fn promise_combinator(interp: &Interpreter, call: &NativeCall<'_>, kind: CombinatorKind) -> JsResult<Value> {
    let ctor = this_constructor(interp, call.this)?;
    let capability = interp.new_promise_capability(call.this)?;
    let promise_resolve = interp.get(ctor, &interp.key("resolve")).and_then(|resolve| {
        if interp.is_callable(&resolve) {
            Ok(resolve)
        } else {
            Err(JsError::type_error("Promise resolve is not a function"))
        }
    });
    let promise_resolve = match reject_abrupt(interp, promise_resolve, &capability)? {
        Ok(resolve) => resolve,
        Err(promise) => return Ok(promise),
    };
    let record = interp.get_iterator(&call.arg(0), IteratorHint::Sync);
    let mut record = match reject_abrupt(interp, record, &capability)? {
        Ok(record) => record,
        Err(promise) => return Ok(promise),
    };
    let result = perform_combinator(interp, &mut record, ctor, &capability, &promise_resolve, kind);
    let result = match result {
        Err(error) if !record.done => interp.iterator_close(&record, Err(error)),
        other => other,
    };
    Ok(match reject_abrupt(interp, result, &capability)? {
        Ok(value) | Err(value) => value,
    })
}

fn element_function(
    interp: &Interpreter,
    index: usize,
    kind: ElementKind,
    shared: &Rc<Combinator>,
) -> JsResult<Value> {
    let element = PromiseElement {
        index,
        kind,
        already_called: Cell::new(false),
        shared: shared.clone(),
    };
    let f = interp.create_closure(promise_element_function, 1, Captures::PromiseElement(Rc::new(element)))?;
    Ok(Value::Object(f))
}

/// PerformPromiseAll, PerformPromiseAllSettled, PerformPromiseAny and
/// PerformPromiseRace.
fn perform_combinator(
    interp: &Interpreter,
    record: &mut IteratorRecord,
    ctor: ObjectId,
    capability: &PromiseCapability,
    promise_resolve: &Value,
    kind: CombinatorKind,
) -> JsResult<Value> {
    let shared = Rc::new(Combinator {
        values: RefCell::new(Vec::new()),
        remaining: Cell::new(1),
        capability: capability.clone(),
    });
    let mut index = 0usize;
    loop {
        let Some(next) = interp.iterator_step_value(record)? else {
            if kind == CombinatorKind::Race {
                return Ok(Value::Object(capability.promise));
            }
            shared.remaining.set(shared.remaining.get() - 1);
            if shared.remaining.get() == 0 {
                finish_combinator(interp, &shared, kind)?;
            }
            return Ok(Value::Object(capability.promise));
        };
        interp.tick()?;
        let next_promise = interp.call(promise_resolve, &Value::Object(ctor), &[next])?;
        let (on_fulfilled, on_rejected) = match kind {
            CombinatorKind::Race => (capability.resolve.cheap_clone(), capability.reject.cheap_clone()),
            CombinatorKind::All => (
                element_function(interp, index, ElementKind::All, &shared)?,
                capability.reject.cheap_clone(),
            ),
            CombinatorKind::AllSettled => (
                element_function(interp, index, ElementKind::AllSettledFulfilled, &shared)?,
                element_function(interp, index, ElementKind::AllSettledRejected, &shared)?,
            ),
            CombinatorKind::Any => (
                capability.resolve.cheap_clone(),
                element_function(interp, index, ElementKind::Any, &shared)?,
            ),
        };
        if kind != CombinatorKind::Race {
            shared.values.borrow_mut().push(Value::Undefined);
            shared.remaining.set(shared.remaining.get() + 1);
        }
        interp.invoke(&next_promise, &interp.key("then"), &[on_fulfilled, on_rejected])?;
        index += 1;
    }
}

/// Settle the combinator's promise once every element reported.
fn finish_combinator(interp: &Interpreter, shared: &Combinator, kind: CombinatorKind) -> JsResult<()> {
    let values = shared.values.borrow().clone();
    let array = interp.create_array_from_list(values)?;
    if kind == CombinatorKind::Any {
        let error = interp.create_aggregate_error(array, "All promises were rejected")?;
        interp.call(&shared.capability.reject, &Value::Undefined, &[Value::Object(error)])?;
    } else {
        interp.call(&shared.capability.resolve, &Value::Undefined, &[Value::Object(array)])?;
    }
    Ok(())
}

/// Promise.all / allSettled / any element functions
fn promise_element_function(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Captures::PromiseElement(element) = interp.builtin_captures(call.function)? else {
        return Err(JsError::internal("promise element function without captures"));
    };
    if element.already_called.replace(true) {
        return Ok(Value::Undefined);
    }
    let x = call.arg(0);
    let value = match element.kind {
        ElementKind::All | ElementKind::Any => x,
        ElementKind::AllSettledFulfilled | ElementKind::AllSettledRejected => {
            let obj = interp.ordinary_object()?;
            let (status, key) = if element.kind == ElementKind::AllSettledFulfilled {
                ("fulfilled", "value")
            } else {
                ("rejected", "reason")
            };
            interp.create_data_property_or_throw(obj, interp.key("status"), Value::String(interp.intern(status)))?;
            interp.create_data_property_or_throw(obj, interp.key(key), x)?;
            Value::Object(obj)
        }
    };
    let shared = &element.shared;
    if let Some(slot) = shared.values.borrow_mut().get_mut(element.index) {
        *slot = value;
    }
    // allSettled shares one already-called flag between the two element
    // functions of an index; the second one to run finds the slot filled.
    shared.remaining.set(shared.remaining.get().saturating_sub(1));
    if shared.remaining.get() == 0 {
        let kind = match element.kind {
            ElementKind::All => CombinatorKind::All,
            ElementKind::Any => CombinatorKind::Any,
            _ => CombinatorKind::AllSettled,
        };
        finish_combinator(interp, shared, kind)?;
    }
    Ok(Value::Undefined)
}

fn promise_all(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    promise_combinator(interp, call, CombinatorKind::All)
}

fn promise_all_settled(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    promise_combinator(interp, call, CombinatorKind::AllSettled)
}

fn promise_any(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    promise_combinator(interp, call, CombinatorKind::Any)
}

fn promise_race(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    promise_combinator(interp, call, CombinatorKind::Race)
}

// ============ PROTOTYPE ============

/// Promise.prototype.then(onFulfilled, onRejected)
fn promise_then(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(promise) = call.this else {
        return Err(JsError::type_error("Promise.prototype.then called on a non-promise"));
    };
    if !interp.is_promise(call.this) {
        return Err(JsError::type_error("Promise.prototype.then called on a non-promise"));
    }
    let default = interp.intrinsic(|i| i.promise_constructor)?;
    let ctor = interp.species_constructor(*promise, default)?;
    let capability = interp.new_promise_capability(&Value::Object(ctor))?;
    interp.perform_promise_then(*promise, &call.arg(0), &call.arg(1), Some(capability))
}

/// Promise.prototype.catch(onRejected)
fn promise_catch(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.invoke(call.this, &interp.key("then"), &[Value::Undefined, call.arg(0)])
}

/// Promise.prototype.finally(onFinally)
fn promise_finally(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(promise) = call.this else {
        return Err(JsError::type_error("Promise.prototype.finally called on a non-object"));
    };
    let default = interp.intrinsic(|i| i.promise_constructor)?;
    let ctor = interp.species_constructor(*promise, default)?;
    let on_finally = call.arg(0);
    let (then_finally, catch_finally) = if interp.is_callable(&on_finally) {
        let captures = Captures::Finally {
            on_finally,
            constructor: ctor,
        };
        (
            Value::Object(interp.create_closure(then_finally_function, 1, captures.clone())?),
            Value::Object(interp.create_closure(catch_finally_function, 1, captures)?),
        )
    } else {
        (on_finally.cheap_clone(), on_finally)
    };
    interp.invoke(call.this, &interp.key("then"), &[then_finally, catch_finally])
}

fn finally_step(interp: &Interpreter, call: &NativeCall<'_>, thunk: super::NativeFn) -> JsResult<Value> {
    let Captures::Finally {
        on_finally,
        constructor,
    } = interp.builtin_captures(call.function)?
    else {
        return Err(JsError::internal("finally reaction without captures"));
    };
    let result = interp.call(&on_finally, &Value::Undefined, &[])?;
    let promise = interp.promise_resolve(constructor, &result)?;
    let thunk = interp.create_closure(thunk, 0, Captures::Thunk(call.arg(0)))?;
    interp.invoke(&Value::Object(promise), &interp.key("then"), &[Value::Object(thunk)])
}

fn then_finally_function(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    finally_step(interp, call, value_thunk)
}

fn catch_finally_function(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    finally_step(interp, call, thrower_thunk)
}

/// `() => value`
pub(crate) fn value_thunk(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match interp.builtin_captures(call.function)? {
        Captures::Thunk(value) => Ok(value),
        _ => Err(JsError::internal("thunk without captures")),
    }
}

/// `() => { throw reason }`
pub(crate) fn thrower_thunk(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    match interp.builtin_captures(call.function)? {
        Captures::Thunk(reason) => Err(JsError::thrown(reason)),
        _ => Err(JsError::internal("thunk without captures")),
    }
}

pub fn init_promise(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let proto = realm.intrinsics.promise_prototype;
    let ctor = realm.intrinsics.promise_constructor;

    interp.register_constructor(ctor, "Promise", 1, Some(proto))?;
    interp.register_method(ctor, "resolve", promise_static_resolve, 1)?;
    interp.register_method(ctor, "reject", promise_static_reject, 1)?;
    interp.register_method(ctor, "all", promise_all, 1)?;
    interp.register_method(ctor, "allSettled", promise_all_settled, 1)?;
    interp.register_method(ctor, "any", promise_any, 1)?;
    interp.register_method(ctor, "race", promise_race, 1)?;

    interp.register_method(proto, "then", promise_then, 2)?;
    interp.register_method(proto, "catch", promise_catch, 1)?;
    interp.register_method(proto, "finally", promise_finally, 1)?;
    interp.register_to_string_tag(proto, "Promise")?;
    Ok(())
}
