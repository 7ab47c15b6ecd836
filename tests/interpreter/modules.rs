//! Module tests: loading, linking, indirect bindings, namespaces and cycles

use super::create_test_runtime;
use ecmavm::{Runtime, Value};

fn export(runtime: &Runtime, namespace: &Value, name: &str) -> Value {
    runtime.get(namespace, name).unwrap()
}

#[test]
fn test_named_exports() {
    let runtime = create_test_runtime();
    runtime.add_module("math", "export const PI = 3; export function double(x) { return x * 2; }");
    runtime.add_module("main", "import { PI, double } from 'math'; export const result = double(PI);");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "result"), Value::Number(6.0));
}

#[test]
fn test_default_and_renamed_exports() {
    let runtime = create_test_runtime();
    runtime.add_module(
        "lib",
        "const hidden = 'h'; export { hidden as visible }; export default function greet() { return 'hi'; }",
    );
    runtime.add_module(
        "main",
        "import greet, { visible as v } from 'lib'; export const out = greet() + v; export default 42;",
    );
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "out"), Value::from("hih"));
    assert_eq!(export(&runtime, &ns, "default"), Value::Number(42.0));
}

#[test]
fn test_anonymous_default_function_is_named_default() {
    let runtime = create_test_runtime();
    runtime.add_module("lib", "export default function () {}");
    runtime.add_module("main", "import f from 'lib'; export const name = f.name;");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "name"), Value::from("default"));
}

#[test]
fn test_imports_are_live_bindings() {
    let runtime = create_test_runtime();
    runtime.add_module("counter", "export let count = 0; export function inc() { count++; }");
    runtime.add_module(
        "main",
        "import { count, inc } from 'counter'; const before = count; inc(); inc(); export const seen = [before, count];",
    );
    let ns = runtime.eval_module("main").unwrap();
    let seen = export(&runtime, &ns, "seen");
    assert_eq!(
        runtime.value_to_json(&seen).unwrap(),
        Some(serde_json::json!([0, 2]))
    );
}

#[test]
fn test_imports_are_immutable() {
    let runtime = create_test_runtime();
    runtime.add_module("lib", "export let value = 1;");
    runtime.add_module("main", "import { value } from 'lib'; value = 2;");
    let err = runtime.eval_module("main").unwrap_err();
    assert!(err.to_string().contains("TypeError"), "{}", err);
}

#[test]
fn test_reexports() {
    let runtime = create_test_runtime();
    runtime.add_module("a", "export const x = 'x'; export const y = 'y';");
    runtime.add_module("b", "export { x as renamed } from 'a'; export * from 'a'; export * as all from 'a';");
    runtime.add_module("main", "import { renamed, y, all } from 'b'; export const out = renamed + y + all.x;");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "out"), Value::from("xyx"));
}

#[test]
fn test_namespace_object() {
    let runtime = create_test_runtime();
    runtime.add_module("lib", "export const b = 2; export const a = 1; export default 0;");
    runtime.add_module(
        "main",
        r#"
        import * as ns from 'lib';
        export const keys = Object.keys(ns).join();
        export const tag = Object.prototype.toString.call(ns);
        export const extensible = Object.isExtensible(ns);
        export const proto = Object.getPrototypeOf(ns);
        export const writeFails = Reflect.set(ns, 'a', 5);
        export const missing = ns.nope;
        "#,
    );
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "keys"), Value::from("a,b,default"));
    assert_eq!(export(&runtime, &ns, "tag"), Value::from("[object Module]"));
    assert_eq!(export(&runtime, &ns, "extensible"), Value::Boolean(false));
    assert_eq!(export(&runtime, &ns, "proto"), Value::Null);
    assert_eq!(export(&runtime, &ns, "writeFails"), Value::Boolean(false));
    assert_eq!(export(&runtime, &ns, "missing"), Value::Undefined);
}

#[test]
fn test_star_export_ambiguity_is_hidden() {
    let runtime = create_test_runtime();
    runtime.add_module("a", "export const dup = 'a'; export const onlyA = 1;");
    runtime.add_module("b", "export const dup = 'b';");
    runtime.add_module("both", "export * from 'a'; export * from 'b';");
    runtime.add_module("main", "import * as ns from 'both'; export const names = Object.keys(ns).join();");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "names"), Value::from("onlyA"));

    runtime.add_module("explicit", "import { dup } from 'both';");
    let err = runtime.eval_module("explicit").unwrap_err();
    assert!(err.to_string().contains("SyntaxError"), "{}", err);
}

#[test]
fn test_star_export_skips_default() {
    let runtime = create_test_runtime();
    runtime.add_module("a", "export default 1; export const named = 2;");
    runtime.add_module("b", "export * from 'a';");
    runtime.add_module("main", "import * as ns from 'b'; export const names = Object.keys(ns).join();");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "names"), Value::from("named"));
}

#[test]
fn test_missing_export_fails_linking() {
    let runtime = create_test_runtime();
    runtime.add_module("lib", "export const present = 1;");
    runtime.add_module("main", "import { absent } from 'lib';");
    let err = runtime.eval_module("main").unwrap_err();
    assert!(err.to_string().contains("does not provide an export named 'absent'"), "{}", err);
}

#[test]
fn test_missing_module() {
    let runtime = create_test_runtime();
    runtime.add_module("main", "import 'nowhere';");
    let err = runtime.eval_module("main").unwrap_err();
    assert!(err.to_string().contains("Cannot find module 'nowhere'"), "{}", err);
}

#[test]
fn test_evaluation_order_is_depth_first() {
    let runtime = create_test_runtime();
    runtime.eval("var order = [];").unwrap();
    runtime.add_module("leaf", "order.push('leaf');");
    runtime.add_module("left", "import 'leaf'; order.push('left');");
    runtime.add_module("right", "import 'leaf'; order.push('right');");
    runtime.add_module("root", "import 'left'; import 'right'; order.push('root');");
    runtime.eval_module("root").unwrap();
    assert_eq!(runtime.eval("order.join()").unwrap(), Value::from("leaf,left,right,root"));
}

#[test]
fn test_modules_evaluate_once() {
    let runtime = create_test_runtime();
    runtime.eval("var runs = 0;").unwrap();
    runtime.add_module("once", "runs++; export const v = 1;");
    runtime.add_module("a", "import { v } from 'once';");
    runtime.add_module("b", "import { v } from 'once';");
    runtime.eval_module("a").unwrap();
    runtime.eval_module("b").unwrap();
    let first = runtime.eval_module("once").unwrap();
    let second = runtime.eval_module("once").unwrap();
    assert_eq!(first, second);
    assert_eq!(runtime.eval("runs").unwrap(), Value::Number(1.0));
}

#[test]
fn test_cyclic_modules() {
    let runtime = create_test_runtime();
    runtime.add_module(
        "even",
        "import { isOdd } from 'odd'; export function isEven(n) { return n === 0 || isOdd(n - 1); }",
    );
    runtime.add_module(
        "odd",
        "import { isEven } from 'even'; export function isOdd(n) { return n !== 0 && isEven(n - 1); }",
    );
    runtime.add_module("main", "import { isEven } from 'even'; export const r = isEven(10);");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "r"), Value::Boolean(true));
}

#[test]
fn test_cycle_tdz() {
    let runtime = create_test_runtime();
    runtime.add_module("a", "import { b } from 'b'; export const a = 'a';");
    runtime.add_module("b", "import { a } from 'a'; export const b = a;");
    let err = runtime.eval_module("a").unwrap_err();
    assert!(err.to_string().contains("ReferenceError"), "{}", err);
}

#[test]
fn test_module_code_is_strict() {
    let runtime = create_test_runtime();
    runtime.add_module("main", "undeclared = 1;");
    let err = runtime.eval_module("main").unwrap_err();
    assert!(err.to_string().contains("ReferenceError"), "{}", err);
    runtime.add_module("this", "export const t = this;");
    let ns = runtime.eval_module("this").unwrap();
    assert_eq!(export(&runtime, &ns, "t"), Value::Undefined);
}

#[test]
fn test_evaluation_error_is_replayed() {
    let runtime = create_test_runtime();
    runtime.add_module("broken", "throw new Error('module failed');");
    let first = runtime.eval_module("broken").unwrap_err();
    let second = runtime.eval_module("broken").unwrap_err();
    assert!(first.to_string().contains("module failed"));
    assert!(second.to_string().contains("module failed"));
}

#[test]
fn test_top_level_await_in_module_is_syntax_error() {
    let runtime = create_test_runtime();
    runtime.add_module("main", "await 1;");
    let err = runtime.eval_module("main").unwrap_err();
    assert!(err.to_string().contains("Top-level await is not supported"), "{}", err);
}

#[test]
fn test_module_promise_jobs_drain() {
    let runtime = create_test_runtime();
    runtime.add_module("main", "export let later = 'pending'; Promise.resolve().then(() => { later = 'done'; });");
    let ns = runtime.eval_module("main").unwrap();
    assert_eq!(export(&runtime, &ns, "later"), Value::from("done"));
}
