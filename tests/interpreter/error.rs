//! Error object tests: constructors, NativeErrors, cause, AggregateError

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_error_constructor() {
    assert_eq!(eval("new Error('msg').message"), s("msg"));
    assert_eq!(eval("Error('no new').message"), s("no new"));
    assert_eq!(eval("new Error().message"), s(""));
    assert_eq!(eval("new Error().hasOwnProperty('message')"), Value::Boolean(false));
    assert_eq!(eval("String(new Error('x'))"), s("Error: x"));
    assert_eq!(eval("Object.keys(new Error('x')).length"), Value::Number(0.0));
}

#[test]
fn test_native_error_hierarchy() {
    for name in ["TypeError", "RangeError", "ReferenceError", "SyntaxError", "EvalError", "URIError"] {
        let source = format!(
            "const e = new {0}('m'); e instanceof {0} && e instanceof Error && e.name === '{0}' && Object.getPrototypeOf({0}) === Error",
            name
        );
        assert_eq!(eval(&source), Value::Boolean(true), "{}", name);
    }
}

#[test]
fn test_error_cause() {
    assert_eq!(eval("new Error('outer', { cause: 'inner' }).cause"), s("inner"));
    assert_eq!(eval("'cause' in new Error('x', {})"), Value::Boolean(false));
    assert_eq!(eval("new TypeError('x', { cause: 0 }).cause"), Value::Number(0.0));
}

#[test]
fn test_aggregate_error() {
    assert_eq!(
        eval_json("const e = new AggregateError([1, 2], 'many'); [e.message, e.errors, e.name]"),
        json!(["many", [1, 2], "AggregateError"])
    );
    assert_eq!(eval("new AggregateError([]) instanceof Error"), Value::Boolean(true));
}

#[test]
fn test_error_to_string() {
    assert_eq!(eval("Error.prototype.toString.call({ name: 'Custom', message: 'm' })"), s("Custom: m"));
    assert_eq!(eval("Error.prototype.toString.call({ message: 'only' })"), s("Error: only"));
    assert_eq!(eval("Error.prototype.toString.call({ name: '' , message: 'm' })"), s("m"));
    assert!(throws_error("Error.prototype.toString.call(1)", "TypeError"));
}

#[test]
fn test_runtime_errors_are_catchable_instances() {
    assert_eq!(eval("try { null.x; } catch (e) { e instanceof TypeError }"), Value::Boolean(true));
    assert_eq!(eval("try { missing; } catch (e) { e.constructor === ReferenceError }"), Value::Boolean(true));
    assert_eq!(eval("try { new Array(-1); } catch (e) { e.name }"), s("RangeError"));
    assert_eq!(eval("try { decodeURIComponent('%'); } catch (e) { e.name }"), s("URIError"));
    assert_eq!(eval("try { undefinedFunction(); } catch (e) { e.message }"), s("undefinedFunction is not defined"));
}

#[test]
fn test_stack_property() {
    assert_eq!(eval("typeof new Error('x').stack"), s("string"));
    assert_eq!(eval("new Error('x').stack.startsWith('Error: x')"), Value::Boolean(true));
}

#[test]
fn test_uncaught_error_message() {
    assert!(throws_error("throw new RangeError('out of range')", "RangeError: out of range"));
    assert!(throws_error("throw { name: 'Custom', message: 'plain object' }", "Custom: plain object"));
}
