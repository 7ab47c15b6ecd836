//! Execution budget tests: timeouts and step limits are fatal and uncatchable

use super::create_test_runtime;
use ecmavm::{DiagnosticKind, JsError, Runtime, RuntimeConfig, Value};

#[test]
fn test_step_limit_stops_infinite_loop() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(10_000))).unwrap();
    let err = runtime.eval("while (true) {}").unwrap_err();
    assert!(matches!(err, JsError::StepLimit { limit: 10_000 }), "{:?}", err);
    assert!(err.is_fatal());
    assert!(!err.is_catchable());
    assert_eq!(err.diagnostic().kind, DiagnosticKind::Terminated);
}

#[test]
fn test_step_limit_is_not_catchable() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(10_000))).unwrap();
    let err = runtime
        .eval("var caught = false; try { for (;;) {} } catch (e) { caught = true; } finally { caught = 'finally'; }")
        .unwrap_err();
    assert!(matches!(err, JsError::StepLimit { .. }));
    assert_eq!(runtime.eval("caught").unwrap(), Value::Boolean(false));
}

#[test]
fn test_step_limit_resets_per_evaluation() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(5_000))).unwrap();
    for _ in 0..5 {
        runtime.eval("let s = 0; for (let i = 0; i < 100; i++) s += i; s").unwrap();
    }
}

#[test]
fn test_set_step_limit() {
    let runtime = create_test_runtime();
    runtime.set_step_limit(Some(1_000));
    assert!(matches!(runtime.eval("for (;;) {}"), Err(JsError::StepLimit { .. })));
    runtime.set_step_limit(None);
    assert_eq!(
        runtime.eval("let n = 0; for (let i = 0; i < 10000; i++) n++; n").unwrap(),
        Value::Number(10000.0)
    );
}

#[test]
fn test_timeout() {
    let runtime = create_test_runtime();
    runtime.set_timeout_ms(50);
    assert_eq!(runtime.timeout_ms(), 50);
    let err = runtime.eval("while (true) {}").unwrap_err();
    assert!(matches!(err, JsError::Timeout { timeout_ms: 50, .. }), "{:?}", err);
    assert!(err.to_string().contains("timeout"));
}

#[test]
fn test_budget_covers_recursion_and_jobs() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(20_000))).unwrap();
    let err = runtime
        .eval("function loop() { return Promise.resolve().then(loop); } loop();")
        .unwrap_err();
    assert!(matches!(err, JsError::StepLimit { .. }), "{:?}", err);
}

#[test]
fn test_budget_inside_generators_and_async() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(10_000))).unwrap();
    let err = runtime.eval("function* g() { while (true) yield; } for (const _ of g()) {}").unwrap_err();
    assert!(matches!(err, JsError::StepLimit { .. }), "{:?}", err);
    let err = runtime.eval("(async () => { for (;;) await null; })()").unwrap_err();
    assert!(matches!(err, JsError::StepLimit { .. }), "{:?}", err);
}

#[test]
fn test_runtime_usable_after_budget_error() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(10_000))).unwrap();
    assert!(runtime.eval("while (true) {}").is_err());
    assert_eq!(runtime.eval("1 + 1").unwrap(), Value::Number(2.0));
}

#[test]
fn test_deep_recursion_is_a_range_error() {
    let runtime = create_test_runtime();
    let result = runtime.eval("function r() { return r(); } try { r(); } catch (e) { e instanceof RangeError }");
    assert_eq!(result.unwrap(), Value::Boolean(true));
}

#[test]
fn test_deep_recursion_on_default_thread_stack() {
    let result = super::eval(
        "function f(n) { return n ? 1 + f(n - 1) : 0; } \
         try { f(10000); } catch (e) { e instanceof RangeError ? e.message : 'other'; }",
    );
    assert_eq!(result, super::s("Maximum call stack size exceeded"));
}

#[test]
fn test_moderate_recursion_completes() {
    assert_eq!(
        super::eval("function f(n) { return n == 0 ? 0 : 1 + f(n - 1); } f(100)"),
        Value::Number(100.0)
    );
    assert_eq!(
        super::eval("class A { constructor(n) { this.d = n ? new A(n - 1).d + 1 : 0; } } new A(50).d"),
        Value::Number(50.0)
    );
}

#[test]
fn test_timeout_in_iterator_return_is_not_swallowed() {
    let runtime = create_test_runtime();
    runtime.set_timeout_ms(100);
    let err = runtime
        .eval(
            "var it = { [Symbol.iterator]() { return this; }, \
                        next() { return { value: 1, done: false }; }, \
                        return() { while (true) {} } }; \
             var result = 'none'; \
             try { for (var v of it) { throw 'boom'; } } catch (e) { result = 'caught:' + e; } \
             result",
        )
        .unwrap_err();
    assert!(matches!(err, JsError::Timeout { timeout_ms: 100, .. }), "{:?}", err);
    runtime.set_timeout_ms(5000);
    assert_eq!(runtime.eval("result").unwrap(), super::s("none"));
}

#[test]
fn test_step_limit_in_destructuring_close_is_not_swallowed() {
    let runtime = Runtime::with_config(RuntimeConfig::default().with_step_limit(Some(10_000))).unwrap();
    let err = runtime
        .eval(
            "var it = { [Symbol.iterator]() { return this; }, \
                        next() { return { value: undefined, done: false }; }, \
                        return() { for (;;) {} } }; \
             try { var [a = (() => { throw 'boom'; })()] = it; } catch (e) { 'caught'; }",
        )
        .unwrap_err();
    assert!(matches!(err, JsError::StepLimit { .. }), "{:?}", err);
}
