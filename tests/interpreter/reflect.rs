//! Reflect tests

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_reflect_get_set_with_receiver() {
    assert_eq!(
        eval("const o = { get v() { return this.x; } }; Reflect.get(o, 'v', { x: 'receiver' })"),
        s("receiver")
    );
    assert_eq!(
        eval("const target = {}; const receiver = {}; Reflect.set(target, 'x', 1, receiver); [target.x, receiver.x].join()"),
        s(",1")
    );
    assert_eq!(eval("Reflect.set(Object.freeze({ a: 1 }), 'a', 2)"), Value::Boolean(false));
}

#[test]
fn test_reflect_has_and_delete() {
    assert_eq!(eval("Reflect.has({ a: 1 }, 'a')"), Value::Boolean(true));
    assert_eq!(eval("Reflect.has(Object.create({ a: 1 }), 'a')"), Value::Boolean(true));
    assert_eq!(eval("const o = { a: 1 }; Reflect.deleteProperty(o, 'a')"), Value::Boolean(true));
    assert_eq!(eval("Reflect.deleteProperty(Object.freeze({ a: 1 }), 'a')"), Value::Boolean(false));
}

#[test]
fn test_reflect_define_property() {
    assert_eq!(eval("Reflect.defineProperty({}, 'x', { value: 1 })"), Value::Boolean(true));
    assert_eq!(
        eval("Reflect.defineProperty(Object.preventExtensions({}), 'x', { value: 1 })"),
        Value::Boolean(false)
    );
    assert_eq!(
        eval_json("const o = {}; Reflect.defineProperty(o, 'x', { get() { return 1; } }); Object.getOwnPropertyDescriptor(o, 'x').enumerable"),
        json!(false)
    );
    assert_eq!(eval("Reflect.getOwnPropertyDescriptor({}, 'missing')"), Value::Undefined);
}

#[test]
fn test_reflect_own_keys() {
    assert_eq!(
        eval_json("Reflect.ownKeys({ b: 1, 1: 1, a: 1 })"),
        json!(["1", "b", "a"])
    );
    assert_eq!(eval_json("Reflect.ownKeys([1, 2])"), json!(["0", "1", "length"]));
}

#[test]
fn test_reflect_prototype_and_extensibility() {
    assert_eq!(eval("Reflect.getPrototypeOf([]) === Array.prototype"), Value::Boolean(true));
    assert_eq!(eval("Reflect.setPrototypeOf({}, null)"), Value::Boolean(true));
    assert_eq!(eval("Reflect.setPrototypeOf(Object.preventExtensions({}), {})"), Value::Boolean(false));
    assert_eq!(eval("const a = {}; Reflect.setPrototypeOf(a, Object.create(a))"), Value::Boolean(false));
    assert_eq!(eval("Reflect.isExtensible({})"), Value::Boolean(true));
    assert_eq!(eval("const o = {}; Reflect.preventExtensions(o); Reflect.isExtensible(o)"), Value::Boolean(false));
}

#[test]
fn test_reflect_apply_and_construct() {
    assert_eq!(eval("Reflect.apply(Math.max, null, [1, 5, 3])"), Value::Number(5.0));
    assert_eq!(
        eval("function Thing(v) { this.v = v; } Reflect.construct(Thing, ['built']).v"),
        s("built")
    );
    assert_eq!(
        eval(
            r#"
            class A { constructor() { this.target = new.target; } }
            class B {}
            const o = Reflect.construct(A, [], B);
            o.target === B && Object.getPrototypeOf(o) === B.prototype
        "#
        ),
        Value::Boolean(true)
    );
    assert!(throws_error("Reflect.construct(() => {}, [])", "TypeError"));
    assert!(throws_error("Reflect.apply(Math.max, null, 1)", "TypeError"));
}

#[test]
fn test_reflect_requires_objects() {
    assert!(throws_error("Reflect.get(1, 'x')", "TypeError"));
    assert!(throws_error("Reflect.ownKeys('str')", "TypeError"));
    assert_eq!(eval("Object.prototype.toString.call(Reflect)"), s("[object Reflect]"));
}
