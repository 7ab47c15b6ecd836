//! Host API tests: evaluation entry points, value conversion, diagnostics and teardown

use super::create_test_runtime;
use ecmavm::{DiagnosticKind, JsError, Runtime, Value};
use serde_json::json;

#[test]
fn test_new_runtime_evaluates() {
    let runtime = Runtime::new().unwrap();
    assert_eq!(runtime.eval("1 + 2 * 3").unwrap(), Value::Number(7.0));
    assert_eq!(runtime.timeout_ms(), 3000);
}

#[test]
fn test_global_state_persists_between_evaluations() {
    let runtime = create_test_runtime();
    runtime.eval("var counter = 1; let lexical = 'kept'; function bump() { return ++counter; }").unwrap();
    assert_eq!(runtime.eval("bump()").unwrap(), Value::Number(2.0));
    assert_eq!(runtime.eval("lexical").unwrap(), Value::from("kept"));
    assert!(runtime.eval("let lexical = 'again';").is_err());
}

#[test]
fn test_completion_value_of_script() {
    let runtime = create_test_runtime();
    assert_eq!(runtime.eval("").unwrap(), Value::Undefined);
    assert_eq!(runtime.eval("var x = 1;").unwrap(), Value::Undefined);
    assert_eq!(runtime.eval("'a'; if (true) { 'b'; }").unwrap(), Value::from("b"));
}

#[test]
fn test_get_and_call() {
    let runtime = create_test_runtime();
    let obj = runtime
        .eval("({ name: 'obj', get computed() { return this.name + '!'; }, greet(who) { return 'hi ' + who + ' from ' + this.name; } })")
        .unwrap();
    assert_eq!(runtime.get(&obj, "computed").unwrap(), Value::from("obj!"));
    let greet = runtime.get(&obj, "greet").unwrap();
    assert_eq!(
        runtime.call(&greet, &obj, &[Value::from("host")]).unwrap(),
        Value::from("hi host from obj")
    );
    assert!(runtime.call(&Value::Number(1.0), &Value::Undefined, &[]).is_err());
    assert!(runtime.get(&Value::Undefined, "x").is_err());
}

#[test]
fn test_call_drains_jobs() {
    let runtime = create_test_runtime();
    let f = runtime
        .eval("var done = false; () => { Promise.resolve().then(() => { done = true; }); }")
        .unwrap();
    runtime.call(&f, &Value::Undefined, &[]).unwrap();
    assert_eq!(runtime.eval("done").unwrap(), Value::Boolean(true));
}

#[test]
fn test_global_object() {
    let runtime = create_test_runtime();
    runtime.eval("var exposed = 42;").unwrap();
    let global = Value::Object(runtime.global_object().unwrap());
    assert_eq!(runtime.get(&global, "exposed").unwrap(), Value::Number(42.0));
    assert_eq!(runtime.eval("globalThis").unwrap(), global);
}

#[test]
fn test_value_from_json() {
    let runtime = create_test_runtime();
    let value = runtime
        .value_from_json(&json!({ "name": "config", "items": [1, 2.5, null, true], "nested": { "k": "v" } }))
        .unwrap();
    let check = runtime
        .eval("(v) => [v.name, v.items.length, v.items[1], v.items[2], v.nested.k, Array.isArray(v.items)].join()")
        .unwrap();
    assert_eq!(
        runtime.call(&check, &Value::Undefined, &[value]).unwrap(),
        Value::from("config,4,2.5,,v,true")
    );
}

#[test]
fn test_value_to_json() {
    let runtime = create_test_runtime();
    let value = runtime
        .eval("({ b: [1, 'two', null, undefined, () => {}], a: { toJSON() { return 'custom'; } }, skip: undefined, n: NaN })")
        .unwrap();
    assert_eq!(
        runtime.value_to_json(&value).unwrap(),
        Some(json!({ "b": [1, "two", null, null, null], "a": "custom", "n": null }))
    );
    assert_eq!(runtime.value_to_json(&Value::Undefined).unwrap(), None);
    let cyclic = runtime.eval("const c = {}; c.self = c; c").unwrap();
    assert!(runtime.value_to_json(&cyclic).is_err());
}

#[test]
fn test_display() {
    let runtime = create_test_runtime();
    let value = runtime.eval("({ a: 1, b: [1, 'x'], f() {} })").unwrap();
    assert_eq!(runtime.display(&value), r#"{ a: 1, b: [1, "x"], f: [Function: f] }"#);
    assert_eq!(runtime.display(&Value::from("plain")), "plain");
    let error = runtime.eval("new TypeError('bad input')").unwrap();
    assert_eq!(runtime.display(&error), "TypeError: bad input");
    let accessor = runtime.eval("({ get x() { throw new Error('never called'); } })").unwrap();
    assert_eq!(runtime.display(&accessor), "{ x: [Getter/Setter] }");
}

#[test]
fn test_uncaught_exception_details() {
    let runtime = create_test_runtime();
    let err = runtime
        .eval_named("app.js", "function fail() {\n  throw new TypeError('boom');\n}\nfail();")
        .unwrap_err();
    let exception = err.exception().expect("an exception");
    assert_eq!(exception.summary, "TypeError: boom");
    let location = exception.location.as_ref().expect("a location");
    assert_eq!(location.file.as_deref(), Some("app.js"));
    assert_eq!(location.line, 2);
    assert_eq!(
        exception.stack.first().and_then(|f| f.function_name.as_deref()),
        Some("fail")
    );
    assert!(err.to_string().starts_with("Uncaught TypeError: boom"));

    let diagnostic = err.diagnostic();
    assert_eq!(diagnostic.kind, DiagnosticKind::Uncaught);
    let json = serde_json::to_value(&diagnostic).unwrap();
    assert_eq!(json["kind"], json!("uncaught"));
    assert_eq!(json["location"]["file"], json!("app.js"));
}

#[test]
fn test_thrown_primitive() {
    let runtime = create_test_runtime();
    let err = runtime.eval("throw 42").unwrap_err();
    assert_eq!(err.thrown_value(), Some(&Value::Number(42.0)));
    assert!(err.is_catchable());
}

#[test]
fn test_runtime_errors_become_error_objects() {
    let runtime = create_test_runtime();
    let err = runtime.eval("null.x").unwrap_err();
    let value = err.thrown_value().cloned().expect("a thrown value");
    let check = runtime.eval("(e) => e instanceof TypeError").unwrap();
    assert_eq!(runtime.call(&check, &Value::Undefined, &[value]).unwrap(), Value::Boolean(true));
}

#[test]
fn test_syntax_errors() {
    let runtime = create_test_runtime();
    let err = runtime.eval("let x = ;").unwrap_err();
    assert!(matches!(err, JsError::SyntaxError { .. }), "{:?}", err);
    assert_eq!(err.diagnostic().kind, DiagnosticKind::Syntax);
    assert!(!err.is_fatal());
    assert!(runtime.eval("let a = 1; let a = 2;").is_err());
    assert!(runtime.eval("'use strict'; with ({}) {}").is_err());
}

#[test]
fn test_dispose_invalidates_values() {
    let runtime = create_test_runtime();
    let obj = runtime.eval("({ x: 1 })").unwrap();
    runtime.dispose();
    let err = runtime.get(&obj, "x").unwrap_err();
    assert!(matches!(err, JsError::Internal(_)), "{:?}", err);
    assert!(err.is_fatal());
    assert!(runtime.eval("1").is_err());
}

#[test]
fn test_independent_runtimes() {
    let first = create_test_runtime();
    let second = create_test_runtime();
    first.eval("var only = 'first';").unwrap();
    assert!(second.eval("only").is_err());
}
