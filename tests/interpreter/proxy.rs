//! Proxy tests: trap forwarding, invariant checks and revocation

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_transparent_proxy_forwards() {
    assert_eq!(eval("const p = new Proxy({ a: 1 }, {}); p.a"), Value::Number(1.0));
    assert_eq!(eval("const t = {}; const p = new Proxy(t, {}); p.x = 2; t.x"), Value::Number(2.0));
    assert_eq!(eval("const p = new Proxy(function () { return 'called'; }, {}); p()"), s("called"));
    assert_eq!(eval("typeof new Proxy(() => {}, {})"), s("function"));
    assert_eq!(eval("typeof new Proxy({}, {})"), s("object"));
}

#[test]
fn test_get_and_set_traps() {
    assert_eq!(
        eval("const p = new Proxy({}, { get: (t, k, r) => 'prop:' + String(k) }); p.anything"),
        s("prop:anything")
    );
    assert_eq!(
        eval_json(
            r#"
            const log = [];
            const p = new Proxy({}, { set(t, k, v, r) { log.push([k, v, r === p]); t[k] = v * 2; return true; } });
            p.x = 5;
            [log, p.x]
        "#
        ),
        json!([[["x", 5, true]], 10])
    );
}

#[test]
fn test_set_trap_returning_false() {
    assert_eq!(eval("const p = new Proxy({}, { set: () => false }); p.x = 1; p.x"), Value::Undefined);
    assert!(throws_error("'use strict'; const p = new Proxy({}, { set: () => false }); p.x = 1;", "TypeError"));
}

#[test]
fn test_has_delete_define_traps() {
    assert_eq!(eval("const p = new Proxy({}, { has: (t, k) => k === 'magic' }); 'magic' in p"), Value::Boolean(true));
    assert_eq!(
        eval("let seen; const p = new Proxy({ a: 1 }, { deleteProperty(t, k) { seen = k; return delete t[k]; } }); delete p.a; seen"),
        s("a")
    );
    assert_eq!(
        eval(
            r#"
            let desc;
            const p = new Proxy({}, { defineProperty(t, k, d) { desc = d; return Reflect.defineProperty(t, k, d); } });
            Object.defineProperty(p, 'x', { value: 1, enumerable: true });
            [desc.value, desc.enumerable, 'writable' in desc].join()
        "#
        ),
        s("1,true,false")
    );
}

#[test]
fn test_own_keys_and_descriptor_traps() {
    assert_eq!(
        eval_json(
            r#"
            const p = new Proxy({}, {
                ownKeys: () => ['b', 'a'],
                getOwnPropertyDescriptor: (t, k) => ({ value: k, enumerable: true, configurable: true }),
            });
            Object.keys(p)
        "#
        ),
        json!(["b", "a"])
    );
    assert!(throws_error("Reflect.ownKeys(new Proxy({}, { ownKeys: () => [1] }))", "TypeError"));
    assert!(throws_error("Reflect.ownKeys(new Proxy({}, { ownKeys: () => ['a', 'a'] }))", "TypeError"));
}

#[test]
fn test_prototype_and_extensibility_traps() {
    assert_eq!(
        eval("const p = new Proxy({}, { getPrototypeOf: () => Array.prototype }); p instanceof Array"),
        Value::Boolean(true)
    );
    assert_eq!(
        eval("let called = false; const p = new Proxy({}, { preventExtensions(t) { called = true; return Reflect.preventExtensions(t); } }); Object.preventExtensions(p); called && !Object.isExtensible(p)"),
        Value::Boolean(true)
    );
}

#[test]
fn test_apply_and_construct_traps() {
    assert_eq!(
        eval("const p = new Proxy(function (a) { return a; }, { apply: (t, self, args) => args.length }); p(1, 2, 3)"),
        Value::Number(3.0)
    );
    assert_eq!(
        eval("const P = new Proxy(function () {}, { construct: (t, args, nt) => ({ built: args[0] }) }); new P('yes').built"),
        s("yes")
    );
    assert!(throws_error("const P = new Proxy(function () {}, { construct: () => 1 }); new P()", "TypeError"));
    assert!(throws_error("const p = new Proxy({}, { apply: () => 1 }); p()", "TypeError"));
}

#[test]
fn test_invariants_are_enforced() {
    assert!(throws_error(
        r#"
        const t = {};
        Object.defineProperty(t, 'fixed', { value: 1, writable: false, configurable: false });
        const p = new Proxy(t, { get: () => 2 });
        p.fixed
        "#,
        "TypeError"
    ));
    assert!(throws_error(
        "const t = Object.preventExtensions({ a: 1 }); const p = new Proxy(t, { has: () => false }); 'a' in p",
        "TypeError"
    ));
    assert!(throws_error(
        "const p = new Proxy(Object.preventExtensions({}), { getPrototypeOf: () => Array.prototype }); Object.getPrototypeOf(p)",
        "TypeError"
    ));
    assert!(throws_error(
        "const p = new Proxy({}, { getOwnPropertyDescriptor: () => 5 }); Object.getOwnPropertyDescriptor(p, 'x')",
        "TypeError"
    ));
}

#[test]
fn test_revocable() {
    assert_eq!(
        eval("const { proxy, revoke } = Proxy.revocable({ a: 1 }, {}); const before = proxy.a; revoke(); before"),
        Value::Number(1.0)
    );
    assert!(throws_error(
        "const { proxy, revoke } = Proxy.revocable({ a: 1 }, {}); revoke(); proxy.a",
        "revoked"
    ));
    assert!(throws_error(
        "const { proxy, revoke } = Proxy.revocable({}, {}); revoke(); revoke(); Object.keys(proxy)",
        "TypeError"
    ));
    assert!(throws_error(
        "const { proxy, revoke } = Proxy.revocable([], {}); revoke(); Array.isArray(proxy)",
        "TypeError"
    ));
    assert_eq!(
        eval("const { proxy, revoke } = Proxy.revocable(function () {}, {}); revoke(); typeof proxy"),
        s("function")
    );
}

#[test]
fn test_proxy_constructor_checks() {
    assert!(throws_error("Proxy({}, {})", "TypeError"));
    assert!(throws_error("new Proxy(1, {})", "TypeError"));
    assert!(throws_error("new Proxy({}, null)", "TypeError"));
    assert_eq!(eval("Proxy.prototype"), Value::Undefined);
}

#[test]
fn test_trap_must_be_callable() {
    assert!(throws_error("const p = new Proxy({}, { get: 5 }); p.x", "TypeError"));
    assert_eq!(eval("const p = new Proxy({ x: 1 }, { get: undefined }); p.x"), Value::Number(1.0));
}

#[test]
fn test_proxy_as_prototype() {
    assert_eq!(
        eval(
            r#"
            const proto = new Proxy({}, { get: (t, k, receiver) => k === 'who' ? receiver.name : undefined });
            const child = Object.create(proto);
            child.name = 'child';
            child.who
        "#
        ),
        s("child")
    );
}
