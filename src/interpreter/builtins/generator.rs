//! Generator, AsyncGenerator and their function constructors
//!
//! The resumption machinery lives in `coroutine`; these are the
//! prototype methods that feed it.

use crate::error::{ErrorKind, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::coroutine::{AsyncGeneratorState, Resume};
use crate::interpreter::object::Property;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::Value;

fn generator_next(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.generator_resume(call.this, Resume::Next(call.arg(0)))
}

fn generator_return(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.generator_resume(call.this, Resume::Return(call.arg(0)))
}

fn generator_throw(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.generator_resume(call.this, Resume::Throw(call.arg(0)))
}

/// Shared entry of the three AsyncGenerator.prototype methods. Never throws
/// for a bad receiver: the returned promise is rejected instead.
fn async_generator_request(interp: &Interpreter, this: &Value, completion: Resume) -> JsResult<Value> {
    let promise_ctor = interp.intrinsic(|i| i.promise_constructor)?;
    let capability = interp.new_promise_capability(&Value::Object(promise_ctor))?;
    let promise = Value::Object(capability.promise);

    let Some(generator) = interp.as_async_generator(this) else {
        let error = interp.create_error(
            ErrorKind::TypeError,
            "AsyncGenerator method called on incompatible receiver",
        )?;
        interp.call(&capability.reject, &Value::Undefined, &[Value::Object(error)])?;
        return Ok(promise);
    };

    let mut state = interp.async_generator_state(generator)?;
    if let (AsyncGeneratorState::SuspendedStart, Resume::Throw(_)) = (state, &completion) {
        interp.set_async_generator_state(generator, AsyncGeneratorState::Completed)?;
        state = AsyncGeneratorState::Completed;
    }

    if state == AsyncGeneratorState::Completed {
        match &completion {
            Resume::Next(_) => {
                let result = interp.create_iter_result_object(Value::Undefined, true)?;
                interp.call(&capability.resolve, &Value::Undefined, &[Value::Object(result)])?;
                return Ok(promise);
            }
            Resume::Throw(reason) => {
                interp.call(&capability.reject, &Value::Undefined, &[reason.clone()])?;
                return Ok(promise);
            }
            Resume::Return(_) => {}
        }
    }

    let is_return = matches!(completion, Resume::Return(_));
    interp.async_generator_enqueue(generator, completion.clone(), capability)?;
    match state {
        AsyncGeneratorState::SuspendedStart | AsyncGeneratorState::Completed if is_return => {
            interp.set_async_generator_state(generator, AsyncGeneratorState::AwaitingReturn)?;
            interp.async_generator_await_return(generator)?;
        }
        AsyncGeneratorState::SuspendedStart | AsyncGeneratorState::SuspendedYield => {
            interp.async_generator_resume(generator, completion)?;
        }
        // Executing or awaiting a return: the request waits in the queue.
        _ => {}
    }
    Ok(promise)
}

fn async_generator_next(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    async_generator_request(interp, call.this, Resume::Next(call.arg(0)))
}

fn async_generator_return(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    async_generator_request(interp, call.this, Resume::Return(call.arg(0)))
}

fn async_generator_throw(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    async_generator_request(interp, call.this, Resume::Throw(call.arg(0)))
}

/// Link a function constructor, its prototype (the `%XFunction.prototype%`)
/// and the instance prototype behind it.
fn link_function_kind(
    interp: &Interpreter,
    ctor: ObjectId,
    name: &str,
    function_prototype: ObjectId,
    instance_prototype: Option<ObjectId>,
) -> JsResult<()> {
    interp.name_builtin(ctor, 1, interp.intern(name))?;
    interp.insert_property(ctor, interp.key("prototype"), Property::frozen(Value::Object(function_prototype)))?;
    interp.insert_property(
        function_prototype,
        interp.key("constructor"),
        Property::data(Value::Object(ctor), false, false, true),
    )?;
    interp.register_to_string_tag(function_prototype, name)?;
    if let Some(instance_prototype) = instance_prototype {
        interp.insert_property(
            function_prototype,
            interp.key("prototype"),
            Property::data(Value::Object(instance_prototype), false, false, true),
        )?;
        interp.insert_property(
            instance_prototype,
            interp.key("constructor"),
            Property::data(Value::Object(function_prototype), false, false, true),
        )?;
    }
    Ok(())
}

pub fn init_generators(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let i = &realm.intrinsics;

    link_function_kind(
        interp,
        i.generator_function,
        "GeneratorFunction",
        i.generator_function_prototype,
        Some(i.generator_prototype),
    )?;
    link_function_kind(interp, i.async_function, "AsyncFunction", i.async_function_prototype, None)?;
    link_function_kind(
        interp,
        i.async_generator_function,
        "AsyncGeneratorFunction",
        i.async_generator_function_prototype,
        Some(i.async_generator_prototype),
    )?;

    interp.register_method(i.generator_prototype, "next", generator_next, 1)?;
    interp.register_method(i.generator_prototype, "return", generator_return, 1)?;
    interp.register_method(i.generator_prototype, "throw", generator_throw, 1)?;
    interp.register_to_string_tag(i.generator_prototype, "Generator")?;

    interp.register_method(i.async_generator_prototype, "next", async_generator_next, 1)?;
    interp.register_method(i.async_generator_prototype, "return", async_generator_return, 1)?;
    interp.register_method(i.async_generator_prototype, "throw", async_generator_throw, 1)?;
    interp.register_to_string_tag(i.async_generator_prototype, "AsyncGenerator")?;

    Ok(())
}
