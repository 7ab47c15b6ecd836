//! Object tests: property descriptors, key ordering, Object statics and Object.prototype

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_object_literal() {
    assert_eq!(eval("const o = { a: 1, 'b-c': 2 }; o.a + o['b-c']"), Value::Number(3.0));
    assert_eq!(eval("const k = 'dyn'; const o = { [k + 1]: 5 }; o.dyn1"), Value::Number(5.0));
    assert_eq!(eval("const x = 3; const o = { x }; o.x"), Value::Number(3.0));
    assert_eq!(eval_json("const o = { ...{ a: 1, b: 2 }, b: 3 }; o"), json!({ "a": 1, "b": 3 }));
    assert_eq!(eval("const o = { __proto__: Array.prototype }; Array.isArray(o)"), Value::Boolean(false));
    assert_eq!(eval("const o = { __proto__: Array.prototype }; o instanceof Array"), Value::Boolean(true));
    assert_eq!(eval("const o = { __proto__: null }; Object.getPrototypeOf(o)"), Value::Null);
}

#[test]
fn test_own_property_keys_order() {
    assert_eq!(
        eval_json(
            r#"
            const sym = Symbol('s');
            const o = { b: 1, 2: 2, a: 3, [sym]: 4, 0: 5 };
            Reflect.ownKeys(o).map(k => typeof k === 'symbol' ? k.toString() : k)
        "#
        ),
        json!(["0", "2", "b", "a", "Symbol(s)"])
    );
    assert_eq!(eval_json("Object.keys({ z: 1, 10: 1, 1: 1, y: 1 })"), json!(["1", "10", "z", "y"]));
}

#[test]
fn test_getters_and_setters() {
    assert_eq!(
        eval(
            r#"
            const o = {
                _v: 1,
                get v() { return this._v * 10; },
                set v(x) { this._v = x; },
            };
            o.v = 4;
            o.v
        "#
        ),
        Value::Number(40.0)
    );
}

#[test]
fn test_inherited_accessor_uses_receiver() {
    assert_eq!(
        eval(
            r#"
            const proto = { get who() { return this.name; } };
            const child = Object.create(proto);
            child.name = 'child';
            child.who
        "#
        ),
        s("child")
    );
}

#[test]
fn test_define_property_defaults() {
    assert_eq!(
        eval_json(
            r#"
            const o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            Object.getOwnPropertyDescriptor(o, 'x')
        "#
        ),
        json!({ "value": 1, "writable": false, "enumerable": false, "configurable": false })
    );
}

#[test]
fn test_define_property_validation() {
    assert!(throws_error(
        "const o = {}; Object.defineProperty(o, 'x', { value: 1 }); Object.defineProperty(o, 'x', { value: 2 });",
        "TypeError"
    ));
    assert!(throws_error(
        "Object.defineProperty({}, 'x', { value: 1, get() {} })",
        "TypeError"
    ));
    assert!(throws_error("Object.defineProperty({}, 'x', { get: 1 })", "TypeError"));
    assert_eq!(
        eval(
            r#"
            const o = {};
            Object.defineProperty(o, 'x', { value: 1, writable: true });
            Object.defineProperty(o, 'x', { value: 2 });
            o.x
        "#
        ),
        Value::Number(2.0)
    );
    assert_eq!(
        eval(
            r#"
            const o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            Object.defineProperty(o, 'x', { value: 1 });
            o.x
        "#
        ),
        Value::Number(1.0)
    );
}

#[test]
fn test_data_to_accessor_conversion() {
    assert_eq!(
        eval(
            r#"
            const o = { x: 1 };
            Object.defineProperty(o, 'x', { get() { return 2; } });
            const d = Object.getOwnPropertyDescriptor(o, 'x');
            [o.x, d.enumerable, d.configurable, 'value' in d].join()
        "#
        ),
        s("2,true,true,false")
    );
}

#[test]
fn test_non_writable_assignment() {
    assert_eq!(
        eval("const o = {}; Object.defineProperty(o, 'x', { value: 1 }); o.x = 2; o.x"),
        Value::Number(1.0)
    );
    assert!(throws_error(
        "'use strict'; const o = {}; Object.defineProperty(o, 'x', { value: 1 }); o.x = 2;",
        "TypeError"
    ));
    assert!(throws_error(
        "'use strict'; const proto = Object.freeze({ x: 1 }); const o = Object.create(proto); o.x = 2;",
        "TypeError"
    ));
}

#[test]
fn test_define_properties_and_descriptors() {
    assert_eq!(
        eval_json(
            r#"
            const o = Object.defineProperties({}, { a: { value: 1, enumerable: true }, b: { value: 2 } });
            Object.keys(Object.getOwnPropertyDescriptors(o))
        "#
        ),
        json!(["a", "b"])
    );
}

#[test]
fn test_keys_values_entries() {
    assert_eq!(eval_json("Object.keys({ a: 1, b: 2 })"), json!(["a", "b"]));
    assert_eq!(eval_json("Object.values({ a: 1, b: 2 })"), json!([1, 2]));
    assert_eq!(eval_json("Object.entries({ a: 1 })"), json!([["a", 1]]));
    assert_eq!(eval_json("Object.fromEntries([['a', 1], ['b', 2]])"), json!({ "a": 1, "b": 2 }));
    assert_eq!(eval_json("Object.getOwnPropertyNames([1])"), json!(["0", "length"]));
    assert_eq!(eval("Object.getOwnPropertySymbols({ [Symbol.iterator]: 1 }).length"), Value::Number(1.0));
}

#[test]
fn test_assign() {
    assert_eq!(eval_json("Object.assign({ a: 1 }, { b: 2 }, null, { a: 3 })"), json!({ "a": 3, "b": 2 }));
    assert!(throws_error("Object.assign(null, {})", "TypeError"));
}

#[test]
fn test_freeze_seal_prevent_extensions() {
    assert_eq!(eval("const o = Object.freeze({ a: 1 }); o.a = 2; o.a"), Value::Number(1.0));
    assert_eq!(eval("Object.isFrozen(Object.freeze({ a: 1 }))"), Value::Boolean(true));
    assert_eq!(eval("Object.isFrozen({})"), Value::Boolean(false));
    assert_eq!(eval("Object.isFrozen(Object.preventExtensions({}))"), Value::Boolean(true));
    assert_eq!(eval("const o = Object.seal({ a: 1 }); o.a = 2; delete o.a; o.a"), Value::Number(2.0));
    assert_eq!(eval("Object.isSealed(Object.seal({ a: 1 }))"), Value::Boolean(true));
    assert_eq!(eval("const o = Object.preventExtensions({}); o.x = 1; o.x"), Value::Undefined);
    assert_eq!(eval("Object.isExtensible(Object.preventExtensions({}))"), Value::Boolean(false));
    assert_eq!(eval("Object.isFrozen(1)"), Value::Boolean(true));
}

#[test]
fn test_prototype_operations() {
    assert_eq!(eval("Object.getPrototypeOf([]) === Array.prototype"), Value::Boolean(true));
    assert_eq!(eval("const p = {}; const o = Object.setPrototypeOf({}, p); Object.getPrototypeOf(o) === p"), Value::Boolean(true));
    assert!(throws_error("const a = {}; const b = Object.create(a); Object.setPrototypeOf(a, b)", "TypeError"));
    assert!(throws_error("Object.setPrototypeOf(Object.preventExtensions({}), {})", "TypeError"));
    assert_eq!(eval("Object.create(null).toString"), Value::Undefined);
    assert!(throws_error("Object.create(1)", "TypeError"));
}

#[test]
fn test_object_prototype_is_immutable() {
    assert!(throws_error("Object.setPrototypeOf(Object.prototype, {})", "TypeError"));
    assert_eq!(eval("Reflect.setPrototypeOf(Object.prototype, {})"), Value::Boolean(false));
    assert_eq!(eval("Reflect.setPrototypeOf(Object.prototype, null)"), Value::Boolean(true));
    assert_eq!(eval("Object.getPrototypeOf(Object.prototype)"), Value::Null);
}

#[test]
fn test_dunder_proto_accessor() {
    assert_eq!(eval("const o = {}; o.__proto__ === Object.prototype"), Value::Boolean(true));
    assert_eq!(eval("const o = {}; o.__proto__ = Array.prototype; o instanceof Array"), Value::Boolean(true));
}

#[test]
fn test_object_prototype_methods() {
    assert_eq!(eval("({ a: 1 }).hasOwnProperty('a')"), Value::Boolean(true));
    assert_eq!(eval("Object.create({ a: 1 }).hasOwnProperty('a')"), Value::Boolean(false));
    assert_eq!(eval("Object.hasOwn({ a: 1 }, 'a')"), Value::Boolean(true));
    assert_eq!(eval("Array.prototype.isPrototypeOf([])"), Value::Boolean(true));
    assert_eq!(eval("[1].propertyIsEnumerable('length')"), Value::Boolean(false));
    assert_eq!(eval("[1].propertyIsEnumerable(0)"), Value::Boolean(true));
    assert_eq!(eval("const o = {}; o.valueOf() === o"), Value::Boolean(true));
    assert_eq!(eval("({}).toLocaleString()"), s("[object Object]"));
}

#[test]
fn test_object_prototype_to_string_tags() {
    assert_eq!(eval("Object.prototype.toString.call(null)"), s("[object Null]"));
    assert_eq!(eval("Object.prototype.toString.call(undefined)"), s("[object Undefined]"));
    assert_eq!(eval("Object.prototype.toString.call([])"), s("[object Array]"));
    assert_eq!(eval("Object.prototype.toString.call(() => {})"), s("[object Function]"));
    assert_eq!(eval("Object.prototype.toString.call(new Error())"), s("[object Error]"));
    assert_eq!(eval("Object.prototype.toString.call(true)"), s("[object Boolean]"));
    assert_eq!(eval("Object.prototype.toString.call({ [Symbol.toStringTag]: 'Custom' })"), s("[object Custom]"));
    assert_eq!(eval("Object.prototype.toString.call(JSON)"), s("[object JSON]"));
}

#[test]
fn test_object_is() {
    assert_eq!(eval("Object.is(NaN, NaN)"), Value::Boolean(true));
    assert_eq!(eval("Object.is(0, -0)"), Value::Boolean(false));
    assert_eq!(eval("Object.is('a', 'a')"), Value::Boolean(true));
}

#[test]
fn test_to_primitive_ordering() {
    assert_eq!(
        eval(
            r#"
            const log = [];
            const o = {
                valueOf() { log.push('valueOf'); return {}; },
                toString() { log.push('toString'); return 'str'; },
            };
            const r = o + '';
            log.join() + ':' + r
        "#
        ),
        s("valueOf,toString:str")
    );
    assert_eq!(
        eval(
            r#"
            const o = { [Symbol.toPrimitive](hint) { return hint; } };
            `${o}|${o + ''}|${+{ [Symbol.toPrimitive]: () => 1 }}`
        "#
        ),
        s("string|default|1")
    );
    assert!(throws_error("({ valueOf: () => ({}), toString: () => ({}) }) + 1", "TypeError"));
    assert!(throws_error("({ [Symbol.toPrimitive]: () => ({}) }) + 1", "TypeError"));
}

#[test]
fn test_delete() {
    assert_eq!(eval("const o = { a: 1 }; delete o.a; 'a' in o"), Value::Boolean(false));
    assert_eq!(eval("delete Object.prototype"), Value::Boolean(false));
    assert!(throws_error("'use strict'; delete Object.prototype", "TypeError"));
}

#[test]
fn test_primitive_property_access() {
    assert_eq!(eval("(5).constructor === Number"), Value::Boolean(true));
    assert_eq!(eval("const n = 5; n.x = 1; n.x"), Value::Undefined);
    assert!(throws_error("'use strict'; const n = 5; n.x = 1;", "TypeError"));
}
