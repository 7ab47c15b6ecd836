//! Symbol tests: registry, descriptions, well-known symbols and symbol-keyed properties

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_symbol_creation() {
    assert_eq!(eval("typeof Symbol()"), s("symbol"));
    assert_eq!(eval("Symbol('a') === Symbol('a')"), Value::Boolean(false));
    assert_eq!(eval("Symbol('desc').description"), s("desc"));
    assert_eq!(eval("Symbol().description"), Value::Undefined);
    assert_eq!(eval("Symbol('x').toString()"), s("Symbol(x)"));
    assert!(throws_error("new Symbol()", "TypeError"));
}

#[test]
fn test_registry() {
    assert_eq!(eval("Symbol.for('app') === Symbol.for('app')"), Value::Boolean(true));
    assert_eq!(eval("Symbol.keyFor(Symbol.for('app'))"), s("app"));
    assert_eq!(eval("Symbol.keyFor(Symbol('local'))"), Value::Undefined);
    assert_eq!(eval("Symbol.keyFor(Symbol.iterator)"), Value::Undefined);
    assert!(throws_error("Symbol.keyFor('app')", "TypeError"));
}

#[test]
fn test_symbol_keyed_properties() {
    assert_eq!(eval("const k = Symbol('k'); const o = { [k]: 1 }; o[k]"), Value::Number(1.0));
    assert_eq!(eval_json("const o = { [Symbol('hidden')]: 1, shown: 2 }; Object.keys(o)"), json!(["shown"]));
    assert_eq!(eval("const o = { [Symbol('hidden')]: 1 }; JSON.stringify(o)"), s("{}"));
    assert_eq!(
        eval("const k = Symbol(); const o = { [k]: 1 }; Object.getOwnPropertySymbols(o)[0] === k"),
        Value::Boolean(true)
    );
}

#[test]
fn test_symbol_conversions() {
    assert!(throws_error("Symbol() + ''", "TypeError"));
    assert!(throws_error("`${Symbol()}`", "TypeError"));
    assert_eq!(eval("String(Symbol('ok'))"), s("Symbol(ok)"));
    assert_eq!(eval("!!Symbol()"), Value::Boolean(true));
    assert_eq!(eval("typeof Object(Symbol())"), s("object"));
    assert_eq!(eval("const sym = Symbol(); Object(sym).valueOf() === sym"), Value::Boolean(true));
    assert_eq!(eval("Symbol.prototype[Symbol.toPrimitive].name"), s("[Symbol.toPrimitive]"));
}

#[test]
fn test_well_known_symbols() {
    assert_eq!(eval("typeof Symbol.iterator"), s("symbol"));
    assert_eq!(eval("Symbol.asyncIterator.description"), s("Symbol.asyncIterator"));
    assert_eq!(
        eval("Object.getOwnPropertyDescriptor(Symbol, 'iterator').writable"),
        Value::Boolean(false)
    );
}

#[test]
fn test_custom_iterator_protocol() {
    assert_eq!(
        eval_json(
            r#"
            const countdown = {
                from: 3,
                [Symbol.iterator]() {
                    let n = this.from;
                    return { next: () => (n > 0 ? { value: n--, done: false } : { value: undefined, done: true }) };
                },
            };
            [...countdown]
        "#
        ),
        json!([3, 2, 1])
    );
    assert!(throws_error("[...{ [Symbol.iterator]: () => 1 }]", "TypeError"));
    assert!(throws_error("[...{}]", "TypeError"));
}

#[test]
fn test_to_string_tag_symbol() {
    assert_eq!(
        eval("class Tagged { get [Symbol.toStringTag]() { return 'Tagged'; } } String(new Tagged())"),
        s("[object Tagged]")
    );
    assert_eq!(eval("Symbol.prototype[Symbol.toStringTag]"), s("Symbol"));
}
