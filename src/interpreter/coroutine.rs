//! Generators, async functions and async generators
//!
//! A coroutine owns the boxed future of a function body. The body suspends
//! by writing a [`Suspend`] into its channel's outbox and returning
//! `Pending`; a driver reads the outbox, does whatever the suspension asks
//! for (deliver a yielded value, subscribe to a promise) and later polls the
//! future again with a [`Resume`] in the inbox. Only the driver that holds
//! the body future can poll it, so at most one frame of a coroutine is ever
//! live.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::promise::PromiseCapability;
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::function::BodyFuture;
use crate::interpreter::iteration::IteratorHint;
use crate::interpreter::object::ObjectKind;
use crate::interpreter::{ExecutionContext, Interpreter, ObjectId};
use crate::value::{CheapClone, Value};

/// How a suspended body is resumed.
#[derive(Debug, Clone)]
pub enum Resume {
    Next(Value),
    Throw(Value),
    Return(Value),
}

/// Why a body suspended.
#[derive(Debug, Clone)]
pub enum Suspend {
    /// `yield value`
    Yield(Value),
    /// `yield*` in a sync generator hands the inner result object out as is.
    YieldResult(Value),
    /// `await value`
    Await(Value),
}

/// Single-slot mailbox between a body future and its driver.
pub(crate) struct Channel {
    inbox: RefCell<Option<Resume>>,
    outbox: RefCell<Option<Suspend>>,
    /// Yields inside this body follow the async generator protocol.
    pub(crate) async_generator: bool,
}

/// Resolves with the next resumption once the driver polls again.
struct SuspendFuture {
    channel: Rc<Channel>,
    request: Option<Suspend>,
}

impl Future for SuspendFuture {
    type Output = JsResult<Resume>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(request) = self.request.take() {
            *self.channel.outbox.borrow_mut() = Some(request);
            return Poll::Pending;
        }
        match self.channel.inbox.borrow_mut().take() {
            Some(resume) => Poll::Ready(Ok(resume)),
            None => Poll::Ready(Err(JsError::internal("coroutine resumed without a value"))),
        }
    }
}

fn suspend(channel: Rc<Channel>, request: Suspend) -> SuspendFuture {
    SuspendFuture {
        channel,
        request: Some(request),
    }
}

/// What completes when the body finishes.
#[derive(Clone)]
pub(crate) enum CoroutineKind {
    Generator,
    AsyncFunction(PromiseCapability),
    AsyncGenerator(ObjectId),
}

pub(crate) struct Coroutine {
    body: RefCell<Option<BodyFuture>>,
    channel: Rc<Channel>,
    /// The execution context of the body while it is suspended.
    context: RefCell<Option<ExecutionContext>>,
    kind: CoroutineKind,
}

enum Step {
    Suspended(Suspend),
    Complete(JsResult<Value>),
}

/// [[GeneratorState]]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    SuspendedStart,
    SuspendedYield,
    Executing,
    Completed,
}

pub struct GeneratorData {
    pub state: GeneratorState,
    pub(crate) coroutine: Option<Rc<Coroutine>>,
}

/// [[AsyncGeneratorState]]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncGeneratorState {
    SuspendedStart,
    SuspendedYield,
    Executing,
    AwaitingReturn,
    Completed,
}

/// AsyncGeneratorRequest Record
#[derive(Clone)]
pub struct AsyncGeneratorRequest {
    pub completion: Resume,
    pub capability: PromiseCapability,
}

pub struct AsyncGeneratorData {
    pub state: AsyncGeneratorState,
    pub queue: VecDeque<AsyncGeneratorRequest>,
    pub(crate) coroutine: Option<Rc<Coroutine>>,
}

impl Interpreter {
    // ============ DRIVING ============

    /// Wrap a body future. The running context becomes the body's context.
    pub(crate) fn create_coroutine(&self, body: BodyFuture, kind: CoroutineKind) -> JsResult<Rc<Coroutine>> {
        let channel = Rc::new(Channel {
            inbox: RefCell::new(None),
            outbox: RefCell::new(None),
            async_generator: matches!(kind, CoroutineKind::AsyncGenerator(_)),
        });
        let mut context = self.running(|ctx| ctx.clone())?;
        context.coroutine = Some(channel.clone());
        Ok(Rc::new(Coroutine {
            body: RefCell::new(Some(body)),
            channel,
            context: RefCell::new(Some(context)),
            kind,
        }))
    }

    /// Poll the body once. With `enter`, the saved context is pushed for the
    /// duration of the poll; otherwise the body runs in the running context,
    /// which is the case only for the first step of an async function.
    fn step(&self, co: &Rc<Coroutine>, resume: Option<Resume>) -> JsResult<Step> {
        self.poll_body(co, resume, true)
    }

    fn poll_body(&self, co: &Rc<Coroutine>, resume: Option<Resume>, enter: bool) -> JsResult<Step> {
        let mut body = co
            .body
            .borrow_mut()
            .take()
            .ok_or_else(|| JsError::internal("coroutine is running or finished"))?;
        *co.channel.inbox.borrow_mut() = resume;

        let previous_channel = if enter {
            let context = co
                .context
                .borrow_mut()
                .take()
                .ok_or_else(|| JsError::internal("coroutine has no saved context"))?;
            self.push_context(context)?;
            None
        } else {
            Some(self.running_mut(|ctx| ctx.coroutine.replace(co.channel.clone()))?)
        };

        let mut cx = Context::from_waker(Waker::noop());
        let polled = body.as_mut().poll(&mut cx);

        match previous_channel {
            None => {
                let context = self.pop_context()?;
                *co.context.borrow_mut() = Some(context);
            }
            Some(previous) => {
                let context = self.running(|ctx| ctx.clone())?;
                *co.context.borrow_mut() = Some(context);
                self.running_mut(|ctx| ctx.coroutine = previous)?;
            }
        }
        co.channel.inbox.borrow_mut().take();

        match polled {
            Poll::Ready(result) => {
                co.context.borrow_mut().take();
                Ok(Step::Complete(result))
            }
            Poll::Pending => {
                let request = co
                    .channel
                    .outbox
                    .borrow_mut()
                    .take()
                    .ok_or_else(|| JsError::internal("coroutine suspended without a request"))?;
                *co.body.borrow_mut() = Some(body);
                Ok(Step::Suspended(request))
            }
        }
    }

    /// AsyncFunctionStart / AsyncBlockStart: run the body up to its first
    /// `await` inside the caller-pushed function context.
    pub(crate) fn async_function_start(&self, co: &Rc<Coroutine>) -> JsResult<()> {
        let step = self.poll_body(co, None, false)?;
        self.continue_async(co, step)
    }

    /// Resume an async function or async generator and drive it to its
    /// next `await` subscription, yield or completion.
    fn run_async(&self, co: &Rc<Coroutine>, resume: Resume) -> JsResult<()> {
        let step = self.step(co, Some(resume))?;
        self.continue_async(co, step)
    }

    fn continue_async(&self, co: &Rc<Coroutine>, mut step: Step) -> JsResult<()> {
        loop {
            let next = match step {
                Step::Suspended(Suspend::Await(value)) => match self.subscribe_await(co, value)? {
                    None => return Ok(()),
                    Some(resume) => resume,
                },
                Step::Suspended(Suspend::Yield(value)) => {
                    let CoroutineKind::AsyncGenerator(generator) = co.kind else {
                        return Err(JsError::internal("yield in an async function"));
                    };
                    match self.async_generator_yielded(generator, value)? {
                        None => return Ok(()),
                        Some(resume) => resume,
                    }
                }
                Step::Suspended(Suspend::YieldResult(_)) => {
                    return Err(JsError::internal("sync delegation in an async body"));
                }
                Step::Complete(result) => return self.finish_async(co, result),
            };
            step = self.step(co, Some(next))?;
        }
    }

    /// Await steps 2-9: resolve the value to a promise and subscribe the
    /// continuation. A failure to subscribe resumes immediately.
    fn subscribe_await(&self, co: &Rc<Coroutine>, value: Value) -> JsResult<Option<Resume>> {
        let promise_ctor = self.intrinsic(|i| i.promise_constructor)?;
        let promise = match self.promise_resolve(promise_ctor, &value) {
            Ok(promise) => promise,
            Err(error) => return Ok(Some(Resume::Throw(self.catchable_value(error)?))),
        };
        let on_fulfilled = self.create_closure(await_fulfilled, 1, Captures::Await(co.clone()))?;
        let on_rejected = self.create_closure(await_rejected, 1, Captures::Await(co.clone()))?;
        self.perform_promise_then(
            promise,
            &Value::Object(on_fulfilled),
            &Value::Object(on_rejected),
            None,
        )?;
        Ok(None)
    }

    fn finish_async(&self, co: &Rc<Coroutine>, result: JsResult<Value>) -> JsResult<()> {
        match &co.kind {
            CoroutineKind::AsyncFunction(capability) => {
                match result {
                    Ok(value) => self.call(&capability.resolve, &Value::Undefined, &[value])?,
                    Err(error) => {
                        let reason = self.catchable_value(error)?;
                        self.call(&capability.reject, &Value::Undefined, &[reason])?
                    }
                };
                Ok(())
            }
            CoroutineKind::AsyncGenerator(generator) => {
                let generator = *generator;
                self.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
                self.with_async_generator(generator, |g| g.coroutine = None)?;
                let result = match result {
                    Ok(value) => Ok(value),
                    Err(error) => Err(self.catchable_value(error)?),
                };
                self.async_generator_complete_step(generator, result, true)?;
                self.async_generator_drain_queue(generator)
            }
            CoroutineKind::Generator => Err(JsError::internal("sync generator driven asynchronously")),
        }
    }

    // ============ SUSPENSION POINTS ============

    /// The running context is the body of an async generator.
    pub(crate) fn in_async_generator(&self) -> bool {
        self.coroutine_channel().is_ok_and(|channel| channel.async_generator)
    }

    /// Await(value)
    pub(crate) async fn await_value(&self, value: Value) -> JsResult<Value> {
        let channel = self.coroutine_channel()?;
        match suspend(channel, Suspend::Await(value)).await? {
            Resume::Next(value) => Ok(value),
            Resume::Throw(reason) => Err(JsError::thrown(reason)),
            Resume::Return(_) => Err(JsError::internal("await resumed with a return completion")),
        }
    }

    /// AsyncGeneratorYield plus AsyncGeneratorUnwrapYieldResumption: a
    /// return resumption has its value awaited first.
    async fn async_generator_yield(&self, value: Value) -> JsResult<Resume> {
        let channel = self.coroutine_channel()?;
        match suspend(channel, Suspend::Yield(value)).await? {
            Resume::Return(value) => match self.await_value(value).await {
                Ok(awaited) => Ok(Resume::Return(awaited)),
                Err(error) => Ok(Resume::Throw(self.catchable_value(error)?)),
            },
            other => Ok(other),
        }
    }

    /// Evaluation of `yield value`.
    pub(crate) async fn generator_yield(&self, value: Value) -> JsResult<Value> {
        let channel = self.coroutine_channel()?;
        let resume = if channel.async_generator {
            let value = self.await_value(value).await?;
            self.async_generator_yield(value).await?
        } else {
            suspend(channel, Suspend::Yield(value)).await?
        };
        match resume {
            Resume::Next(value) => Ok(value),
            Resume::Throw(reason) => Err(JsError::thrown(reason)),
            Resume::Return(value) => Err(JsError::GeneratorReturn(value)),
        }
    }

    /// Evaluation of `yield* iterable`.
    pub(crate) async fn generator_yield_delegate(&self, iterable: Value) -> JsResult<Value> {
        let channel = self.coroutine_channel()?;
        let is_async = channel.async_generator;
        let hint = if is_async {
            IteratorHint::Async
        } else {
            IteratorHint::Sync
        };
        let record = self.get_iterator(&iterable, hint)?;
        let iterator = Value::Object(record.iterator);
        let mut received = Resume::Next(Value::Undefined);
        loop {
            let inner = match received {
                Resume::Next(value) => self.call(&record.next_method, &iterator, &[value])?,
                Resume::Throw(value) => match self.get_method(&iterator, &self.key("throw"))? {
                    Some(throw) => self.call(&throw, &iterator, &[value])?,
                    None => {
                        if is_async {
                            self.async_iterator_close(&record, Ok(())).await?;
                        } else {
                            self.iterator_close(&record, Ok(()))?;
                        }
                        return Err(JsError::type_error("The iterator does not provide a 'throw' method"));
                    }
                },
                Resume::Return(value) => match self.get_method(&iterator, &self.key("return"))? {
                    Some(ret) => {
                        let inner = self.call(&ret, &iterator, &[value])?;
                        let inner = if is_async { self.await_value(inner).await? } else { inner };
                        let Value::Object(inner_obj) = inner else {
                            return Err(JsError::type_error("Iterator result is not an object"));
                        };
                        if self.iterator_complete(inner_obj)? {
                            let value = self.iterator_value(inner_obj)?;
                            let value = if is_async { self.await_value(value).await? } else { value };
                            return Err(JsError::GeneratorReturn(value));
                        }
                        received = if is_async {
                            let value = self.iterator_value(inner_obj)?;
                            self.async_generator_yield(value).await?
                        } else {
                            suspend(channel.clone(), Suspend::YieldResult(Value::Object(inner_obj))).await?
                        };
                        continue;
                    }
                    None => {
                        let value = if is_async { self.await_value(value).await? } else { value };
                        return Err(JsError::GeneratorReturn(value));
                    }
                },
            };
            let inner = if is_async { self.await_value(inner).await? } else { inner };
            let Value::Object(inner_obj) = inner else {
                return Err(JsError::type_error("Iterator result is not an object"));
            };
            if self.iterator_complete(inner_obj)? {
                return self.iterator_value(inner_obj);
            }
            received = if is_async {
                let value = self.iterator_value(inner_obj)?;
                self.async_generator_yield(value).await?
            } else {
                suspend(channel.clone(), Suspend::YieldResult(Value::Object(inner_obj))).await?
            };
        }
    }

    // ============ GENERATORS ============

    fn generator_parts(&self, generator: &Value) -> JsResult<(ObjectId, GeneratorState, Option<Rc<Coroutine>>)> {
        let found = match generator {
            Value::Object(obj) => self.object(*obj, |d| match &d.kind {
                ObjectKind::Generator(g) => Some((*obj, g.state, g.coroutine.clone())),
                _ => None,
            })?,
            _ => None,
        };
        found.ok_or_else(|| JsError::type_error("next method called on incompatible receiver"))
    }

    fn set_generator_state(&self, generator: ObjectId, state: GeneratorState) -> JsResult<()> {
        self.object_mut(generator, |d| {
            if let ObjectKind::Generator(g) = &mut d.kind {
                g.state = state;
                if state == GeneratorState::Completed {
                    g.coroutine = None;
                }
            }
        })
    }

    /// GeneratorResume(generator, value) and GeneratorResumeAbrupt.
    pub(crate) fn generator_resume(&self, generator: &Value, resume: Resume) -> JsResult<Value> {
        let (obj, state, coroutine) = self.generator_parts(generator)?;
        let state = match (state, &resume) {
            (GeneratorState::Executing, _) => {
                return Err(JsError::type_error("Generator is already running"));
            }
            (GeneratorState::SuspendedStart, Resume::Throw(_) | Resume::Return(_)) => {
                self.set_generator_state(obj, GeneratorState::Completed)?;
                GeneratorState::Completed
            }
            (state, _) => state,
        };
        if state == GeneratorState::Completed {
            return match resume {
                Resume::Next(_) => Ok(Value::Object(self.create_iter_result_object(Value::Undefined, true)?)),
                Resume::Return(value) => Ok(Value::Object(self.create_iter_result_object(value, true)?)),
                Resume::Throw(reason) => Err(JsError::thrown(reason)),
            };
        }
        let coroutine = coroutine.ok_or_else(|| JsError::internal("suspended generator without a body"))?;
        self.set_generator_state(obj, GeneratorState::Executing)?;
        let step = self.step(&coroutine, Some(resume));
        match step {
            Ok(Step::Suspended(Suspend::Yield(value))) => {
                self.set_generator_state(obj, GeneratorState::SuspendedYield)?;
                Ok(Value::Object(self.create_iter_result_object(value, false)?))
            }
            Ok(Step::Suspended(Suspend::YieldResult(result))) => {
                self.set_generator_state(obj, GeneratorState::SuspendedYield)?;
                Ok(result)
            }
            Ok(Step::Suspended(Suspend::Await(_))) => {
                self.set_generator_state(obj, GeneratorState::Completed)?;
                Err(JsError::internal("await in a sync generator"))
            }
            Ok(Step::Complete(result)) => {
                self.set_generator_state(obj, GeneratorState::Completed)?;
                Ok(Value::Object(self.create_iter_result_object(result?, true)?))
            }
            Err(error) => {
                self.set_generator_state(obj, GeneratorState::Completed)?;
                Err(error)
            }
        }
    }

    // ============ ASYNC GENERATORS ============

    fn with_async_generator<R>(
        &self,
        generator: ObjectId,
        f: impl FnOnce(&mut AsyncGeneratorData) -> R,
    ) -> JsResult<R> {
        self.object_mut(generator, |d| match &mut d.kind {
            ObjectKind::AsyncGenerator(g) => Ok(f(g)),
            _ => Err(JsError::internal("not an async generator")),
        })?
    }

    pub(crate) fn set_async_generator_state(&self, generator: ObjectId, state: AsyncGeneratorState) -> JsResult<()> {
        self.with_async_generator(generator, |g| g.state = state)
    }

    pub(crate) fn async_generator_state(&self, generator: ObjectId) -> JsResult<AsyncGeneratorState> {
        self.with_async_generator(generator, |g| g.state)
    }

    /// AsyncGeneratorValidate: the generator object, or `None` when `value`
    /// is not one.
    pub(crate) fn as_async_generator(&self, value: &Value) -> Option<ObjectId> {
        let obj = value.as_object()?;
        self.kind_is(obj, |k| matches!(k, ObjectKind::AsyncGenerator(_)))
            .then_some(obj)
    }

    /// AsyncGeneratorEnqueue(generator, completion, capability)
    pub(crate) fn async_generator_enqueue(
        &self,
        generator: ObjectId,
        completion: Resume,
        capability: PromiseCapability,
    ) -> JsResult<()> {
        self.with_async_generator(generator, |g| {
            g.queue.push_back(AsyncGeneratorRequest {
                completion,
                capability,
            })
        })
    }

    /// AsyncGeneratorResume(generator, completion)
    pub(crate) fn async_generator_resume(&self, generator: ObjectId, completion: Resume) -> JsResult<()> {
        let coroutine = self
            .with_async_generator(generator, |g| {
                g.state = AsyncGeneratorState::Executing;
                g.coroutine.clone()
            })?
            .ok_or_else(|| JsError::internal("suspended async generator without a body"))?;
        self.run_async(&coroutine, completion)
    }

    /// The driver's half of AsyncGeneratorYield: settle the current request
    /// and either continue with the next queued one or stay suspended.
    fn async_generator_yielded(&self, generator: ObjectId, value: Value) -> JsResult<Option<Resume>> {
        self.async_generator_complete_step(generator, Ok(value), false)?;
        self.with_async_generator(generator, |g| match g.queue.front() {
            Some(next) => Some(next.completion.clone()),
            None => {
                g.state = AsyncGeneratorState::SuspendedYield;
                None
            }
        })
    }

    /// AsyncGeneratorCompleteStep(generator, completion, done)
    pub(crate) fn async_generator_complete_step(
        &self,
        generator: ObjectId,
        result: Result<Value, Value>,
        done: bool,
    ) -> JsResult<()> {
        let Some(request) = self.with_async_generator(generator, |g| g.queue.pop_front())? else {
            return Ok(());
        };
        match result {
            Err(reason) => self.call(&request.capability.reject, &Value::Undefined, &[reason])?,
            Ok(value) => {
                let result = self.create_iter_result_object(value, done)?;
                self.call(&request.capability.resolve, &Value::Undefined, &[Value::Object(result)])?
            }
        };
        Ok(())
    }

    /// AsyncGeneratorDrainQueue(generator)
    pub(crate) fn async_generator_drain_queue(&self, generator: ObjectId) -> JsResult<()> {
        loop {
            let front = self.with_async_generator(generator, |g| g.queue.front().map(|r| r.completion.clone()))?;
            match front {
                None => return Ok(()),
                Some(Resume::Return(_)) => {
                    self.set_async_generator_state(generator, AsyncGeneratorState::AwaitingReturn)?;
                    return self.async_generator_await_return(generator);
                }
                Some(Resume::Throw(reason)) => {
                    self.async_generator_complete_step(generator, Err(reason), true)?;
                }
                Some(Resume::Next(_)) => {
                    self.async_generator_complete_step(generator, Ok(Value::Undefined), true)?;
                }
            }
        }
    }

    /// AsyncGeneratorAwaitReturn(generator)
    pub(crate) fn async_generator_await_return(&self, generator: ObjectId) -> JsResult<()> {
        let value = self.with_async_generator(generator, |g| match g.queue.front() {
            Some(AsyncGeneratorRequest {
                completion: Resume::Return(value),
                ..
            }) => Some(value.cheap_clone()),
            _ => None,
        })?;
        let Some(value) = value else {
            return Err(JsError::internal("AsyncGeneratorAwaitReturn without a return request"));
        };
        let promise_ctor = self.intrinsic(|i| i.promise_constructor)?;
        let promise = match self.promise_resolve(promise_ctor, &value) {
            Ok(promise) => promise,
            Err(error) => {
                let reason = self.catchable_value(error)?;
                self.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
                self.async_generator_complete_step(generator, Err(reason), true)?;
                return self.async_generator_drain_queue(generator);
            }
        };
        let captures = Captures::AsyncGeneratorReturn(generator);
        let on_fulfilled = self.create_closure(await_return_fulfilled, 1, captures.clone())?;
        let on_rejected = self.create_closure(await_return_rejected, 1, captures)?;
        self.perform_promise_then(
            promise,
            &Value::Object(on_fulfilled),
            &Value::Object(on_rejected),
            None,
        )?;
        Ok(())
    }
}

fn await_coroutine(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Rc<Coroutine>> {
    match interp.builtin_captures(call.function)? {
        Captures::Await(co) => Ok(co),
        _ => Err(JsError::internal("await continuation without a coroutine")),
    }
}

fn await_fulfilled(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let co = await_coroutine(interp, call)?;
    interp.run_async(&co, Resume::Next(call.arg(0)))?;
    Ok(Value::Undefined)
}

fn await_rejected(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let co = await_coroutine(interp, call)?;
    interp.run_async(&co, Resume::Throw(call.arg(0)))?;
    Ok(Value::Undefined)
}

fn return_generator(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<ObjectId> {
    match interp.builtin_captures(call.function)? {
        Captures::AsyncGeneratorReturn(generator) => Ok(generator),
        _ => Err(JsError::internal("await-return reaction without a generator")),
    }
}

fn await_return_fulfilled(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let generator = return_generator(interp, call)?;
    interp.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
    interp.async_generator_complete_step(generator, Ok(call.arg(0)), true)?;
    interp.async_generator_drain_queue(generator)?;
    Ok(Value::Undefined)
}

fn await_return_rejected(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let generator = return_generator(interp, call)?;
    interp.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
    interp.async_generator_complete_step(generator, Err(call.arg(0)), true)?;
    interp.async_generator_drain_queue(generator)?;
    Ok(Value::Undefined)
}
