//! Integration tests for the interpreter, organized by feature
//!
//! These tests exercise the interpreter through the public `Runtime` API.
//! Each helper creates a fresh runtime, so tests never share realms.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod array;
mod async_await;
mod async_iter;
mod basics;
mod budget;
mod class;
mod control_flow;
mod destructuring;
mod error;
mod function;
mod generator;
mod global;
mod json;
mod math;
mod modules;
mod number;
mod object;
mod promise;
mod proxy;
mod realm;
mod reflect;
mod runtime;
mod strict;
mod string;
mod symbol;
mod typed_array;

use ecmavm::{JsError, Runtime, RuntimeConfig, Value};

/// A runtime with a short timeout so runaway tests fail quickly.
pub fn create_test_runtime() -> Runtime {
    Runtime::with_config(RuntimeConfig::default().with_timeout_ms(5000)).expect("runtime creation failed")
}

/// Evaluate `source` as a script and return its completion value.
pub fn eval(source: &str) -> Value {
    eval_result(source).expect("eval failed")
}

/// Evaluate and return the `Result`, for error tests.
pub fn eval_result(source: &str) -> Result<Value, JsError> {
    create_test_runtime().eval(source)
}

/// Evaluate and render the completion value through `JSON.stringify`
/// semantics, for comparing arrays and objects.
pub fn eval_json(source: &str) -> serde_json::Value {
    let runtime = create_test_runtime();
    let value = runtime.eval(source).expect("eval failed");
    runtime
        .value_to_json(&value)
        .expect("serialization failed")
        .unwrap_or(serde_json::Value::Null)
}

/// Helper to check if evaluation throws an error containing a specific message
pub fn throws_error(source: &str, error_contains: &str) -> bool {
    match eval_result(source) {
        Err(e) => e.to_string().contains(error_contains),
        Ok(_) => false,
    }
}

/// Shorthand for string results.
pub fn s(text: &str) -> Value {
    Value::from(text)
}
