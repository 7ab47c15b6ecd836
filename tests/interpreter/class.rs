//! Class tests: ClassDefinitionEvaluation, methods, accessors, fields, inheritance, super

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_basic_class() {
    assert_eq!(
        eval(
            r#"
            class Point {
                constructor(x, y) { this.x = x; this.y = y; }
                sum() { return this.x + this.y; }
            }
            new Point(1, 2).sum()
        "#
        ),
        Value::Number(3.0)
    );
    assert_eq!(eval("class A {} typeof A"), s("function"));
    assert_eq!(eval("class A {} A.name"), s("A"));
    assert_eq!(eval("const B = class {}; B.name"), s("B"));
}

#[test]
fn test_class_requires_new() {
    assert!(throws_error("class A {} A()", "TypeError"));
}

#[test]
fn test_class_binding_tdz() {
    assert!(throws_error("new A(); class A {}", "ReferenceError"));
    assert!(throws_error("class A extends A {}", "ReferenceError"));
}

#[test]
fn test_methods_are_non_enumerable() {
    assert_eq!(eval_json("class A { m() {} } Object.keys(A.prototype)"), json!([]));
    assert_eq!(
        eval("class A { m() {} } Object.getOwnPropertyDescriptor(A.prototype, 'm').writable"),
        Value::Boolean(true)
    );
    assert_eq!(
        eval("class A {} Object.getOwnPropertyDescriptor(A, 'prototype').writable"),
        Value::Boolean(false)
    );
}

#[test]
fn test_class_body_is_strict() {
    assert!(throws_error("class A { m() { undeclared = 1; } } new A().m()", "ReferenceError"));
}

#[test]
fn test_accessors_and_static_members() {
    assert_eq!(
        eval(
            r#"
            class Temp {
                constructor(c) { this.c = c; }
                get f() { return this.c * 9 / 5 + 32; }
                set f(v) { this.c = (v - 32) * 5 / 9; }
                static zero() { return new Temp(0); }
            }
            const t = Temp.zero();
            t.f = 212;
            t.c
        "#
        ),
        Value::Number(100.0)
    );
}

#[test]
fn test_computed_and_symbol_methods() {
    assert_eq!(
        eval(
            r#"
            const name = 'dyn';
            class A {
                [name + 'amic']() { return 1; }
                *[Symbol.iterator]() { yield 2; yield 3; }
            }
            const a = new A();
            a.dynamic() + [...a].reduce((x, y) => x + y)
        "#
        ),
        Value::Number(6.0)
    );
}

#[test]
fn test_public_fields() {
    assert_eq!(
        eval_json(
            r#"
            let counter = 0;
            class A {
                a = ++counter;
                b = this.a * 10;
                ['c'] = 'computed';
                static s = 'static';
            }
            const x = new A();
            [x.a, x.b, x.c, A.s, new A().a]
        "#
        ),
        json!([1, 10, "computed", "static", 2])
    );
}

#[test]
fn test_static_blocks() {
    assert_eq!(
        eval(
            r#"
            class Config {
                static values = [];
                static {
                    this.values.push('init');
                    this.ready = true;
                }
            }
            Config.values[0] + Config.ready
        "#
        ),
        s("inittrue")
    );
}

#[test]
fn test_inheritance_and_super() {
    assert_eq!(
        eval(
            r#"
            class Animal {
                constructor(name) { this.name = name; }
                speak() { return this.name + ' makes a sound'; }
                static kind() { return 'animal'; }
            }
            class Dog extends Animal {
                speak() { return super.speak() + ' (woof)'; }
                static kind() { return 'dog < ' + super.kind(); }
            }
            new Dog('Rex').speak() + ' / ' + Dog.kind()
        "#
        ),
        s("Rex makes a sound (woof) / dog < animal")
    );
}

#[test]
fn test_derived_constructor_this_binding() {
    assert!(throws_error(
        "class A {} class B extends A { constructor() { this.x = 1; super(); } } new B()",
        "ReferenceError"
    ));
    assert!(throws_error(
        "class A {} class B extends A { constructor() { super(); super(); } } new B()",
        "ReferenceError"
    ));
    assert!(throws_error(
        "class A {} class B extends A { constructor() {} } new B()",
        "ReferenceError"
    ));
    assert_eq!(
        eval("class A {} class B extends A { constructor() { return { custom: true }; } } new B().custom"),
        Value::Boolean(true)
    );
    assert!(throws_error(
        "class A {} class B extends A { constructor() { super(); return 1; } } new B()",
        "TypeError"
    ));
}

#[test]
fn test_fields_initialized_after_super() {
    assert_eq!(
        eval(
            r#"
            class A { constructor() { this.seen = this.x; } }
            class B extends A { x = 5; }
            const b = new B();
            [b.seen, b.x].join()
        "#
        ),
        s(",5")
    );
}

#[test]
fn test_extends_builtins() {
    assert_eq!(
        eval(
            r#"
            class MyError extends Error {
                constructor(msg) { super(msg); this.name = 'MyError'; }
            }
            const e = new MyError('bad');
            [e instanceof Error, e.message, String(e)].join('|')
        "#
        ),
        s("true|bad|MyError: bad")
    );
    assert_eq!(
        eval("class List extends Array {} const l = new List(); l.push(1, 2); l.length"),
        Value::Number(2.0)
    );
}

#[test]
fn test_extends_null_and_invalid_heritage() {
    assert_eq!(
        eval("class N extends null {} Object.getPrototypeOf(N.prototype)"),
        Value::Null
    );
    assert!(throws_error("class A extends 5 {}", "TypeError"));
}

#[test]
fn test_new_target_in_base_constructor() {
    assert_eq!(
        eval(
            r#"
            class Base { constructor() { this.made = new.target.name; } }
            class Sub extends Base {}
            new Sub().made
        "#
        ),
        s("Sub")
    );
}

#[test]
fn test_super_property_in_object_methods() {
    assert_eq!(
        eval(
            r#"
            const base = { greet() { return 'hi'; } };
            const obj = { __proto__: base, greet() { return super.greet() + '!'; } };
            obj.greet()
        "#
        ),
        s("hi!")
    );
}
