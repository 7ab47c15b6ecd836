//! JSON tests: JSON.parse with revivers and JSON.stringify with replacers and indentation

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_parse_values() {
    assert_eq!(eval("JSON.parse('42')"), Value::Number(42.0));
    assert_eq!(eval("JSON.parse('\"text\"')"), s("text"));
    assert_eq!(eval("JSON.parse('null')"), Value::Null);
    assert_eq!(eval_json(r#"JSON.parse('{"a":[1,2,{"b":true}]}')"#), json!({ "a": [1, 2, { "b": true }] }));
    assert_eq!(eval_json(r#"Object.keys(JSON.parse('{"z":1,"a":2,"1":3}'))"#), json!(["1", "z", "a"]));
}

#[test]
fn test_parse_errors() {
    assert!(throws_error("JSON.parse('{a:1}')", "SyntaxError"));
    assert!(throws_error("JSON.parse('[1,]')", "SyntaxError"));
    assert!(throws_error("JSON.parse('')", "SyntaxError"));
}

#[test]
fn test_parse_reviver() {
    assert_eq!(
        eval_json(r#"JSON.parse('{"a":1,"b":{"c":2}}', (k, v) => typeof v === 'number' ? v * 10 : v)"#),
        json!({ "a": 10, "b": { "c": 20 } })
    );
    assert_eq!(
        eval_json(r#"JSON.parse('{"keep":1,"drop":2}', (k, v) => k === 'drop' ? undefined : v)"#),
        json!({ "keep": 1 })
    );
}

#[test]
fn test_stringify_basics() {
    assert_eq!(eval("JSON.stringify({ a: 1, b: 'two', c: [true, null] })"), s(r#"{"a":1,"b":"two","c":[true,null]}"#));
    assert_eq!(eval("JSON.stringify('quote\"and\\nnewline')"), s(r#""quote\"and\nnewline""#));
    assert_eq!(eval("JSON.stringify(undefined)"), Value::Undefined);
    assert_eq!(eval("JSON.stringify({ f() {}, u: undefined, s: Symbol() })"), s("{}"));
    assert_eq!(eval("JSON.stringify([undefined, () => {}])"), s("[null,null]"));
    assert_eq!(eval("JSON.stringify([NaN, Infinity, -0])"), s("[null,null,0]"));
    assert_eq!(eval("JSON.stringify(new Number(3))"), s("3"));
}

#[test]
fn test_stringify_to_json_and_replacer() {
    assert_eq!(eval("JSON.stringify({ toJSON(key) { return 'key:' + key; } })"), s(r#""key:""#));
    assert_eq!(
        eval("JSON.stringify({ a: 1, b: 2, c: 3 }, ['c', 'a'])"),
        s(r#"{"c":3,"a":1}"#)
    );
    assert_eq!(
        eval("JSON.stringify({ a: 1, b: 'x' }, (k, v) => typeof v === 'number' ? v + 1 : v)"),
        s(r#"{"a":2,"b":"x"}"#)
    );
}

#[test]
fn test_stringify_indentation() {
    assert_eq!(eval("JSON.stringify({ a: [1] }, null, 2)"), s("{\n  \"a\": [\n    1\n  ]\n}"));
    assert_eq!(eval("JSON.stringify([1], null, '--')"), s("[\n--1\n]"));
    assert_eq!(eval("JSON.stringify({}, null, 2)"), s("{}"));
}

#[test]
fn test_stringify_cycles() {
    assert!(throws_error("const o = {}; o.o = o; JSON.stringify(o)", "TypeError"));
}

#[test]
fn test_json_object() {
    assert_eq!(eval("Object.prototype.toString.call(JSON)"), s("[object JSON]"));
    assert!(throws_error("new JSON()", "TypeError"));
}
