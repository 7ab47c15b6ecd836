//! Array tests: the exotic length invariant, Array statics and Array.prototype

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_array_literal_and_index() {
    assert_eq!(eval("const arr = [1, 2, 3]; arr[1]"), Value::Number(2.0));
    assert_eq!(eval("[1, , 3].length"), Value::Number(3.0));
    assert_eq!(eval("1 in [1, , 3]"), Value::Boolean(false));
    assert_eq!(eval_json("[...[1, 2], ...'ab']"), json!([1, 2, "a", "b"]));
}

#[test]
fn test_length_tracks_highest_index() {
    assert_eq!(eval("const a = []; a[9] = 1; a.length"), Value::Number(10.0));
    assert_eq!(eval("const a = [1, 2]; a['5'] = 0; a.length"), Value::Number(6.0));
    assert_eq!(eval("const a = [1, 2]; a['05'] = 0; a.length"), Value::Number(2.0));
    assert_eq!(eval("const a = []; a[4294967295] = 1; a.length"), Value::Number(0.0));
}

#[test]
fn test_shrinking_length_deletes_elements() {
    assert_eq!(eval_json("const a = [1, 2, 3, 4]; a.length = 2; a"), json!([1, 2]));
    assert_eq!(eval("const a = [1, 2, 3]; a.length = 0; 0 in a"), Value::Boolean(false));
}

#[test]
fn test_shrink_stops_at_non_configurable_element() {
    assert_eq!(
        eval(
            r#"
            const a = [1, 2, 3, 4];
            Object.defineProperty(a, 1, { value: 2, configurable: false });
            a.length = 0;
            a.length
        "#
        ),
        Value::Number(2.0)
    );
    assert!(throws_error(
        r#"
        'use strict';
        const a = [1, 2, 3];
        Object.defineProperty(a, 1, { value: 2, configurable: false });
        a.length = 0;
        "#,
        "TypeError"
    ));
}

#[test]
fn test_invalid_length_is_range_error() {
    assert!(throws_error("[].length = -1", "RangeError"));
    assert!(throws_error("[].length = 1.5", "RangeError"));
    assert!(throws_error("new Array(-1)", "RangeError"));
}

#[test]
fn test_non_writable_length() {
    assert_eq!(
        eval("const a = [1]; Object.defineProperty(a, 'length', { writable: false }); a[5] = 1; a.length"),
        Value::Number(1.0)
    );
    assert!(throws_error(
        "'use strict'; const a = [1]; Object.freeze(a); a.push(2)",
        "TypeError"
    ));
}

#[test]
fn test_array_constructor() {
    assert_eq!(eval("new Array(3).length"), Value::Number(3.0));
    assert_eq!(eval_json("Array(1, 2)"), json!([1, 2]));
    assert_eq!(eval_json("Array.of(7)"), json!([7]));
    assert_eq!(eval("Array.isArray([])"), Value::Boolean(true));
    assert_eq!(eval("Array.isArray(new Proxy([], {}))"), Value::Boolean(true));
    assert_eq!(eval("Array.isArray({ length: 0 })"), Value::Boolean(false));
}

#[test]
fn test_array_from() {
    assert_eq!(eval_json("Array.from('abc')"), json!(["a", "b", "c"]));
    assert_eq!(eval_json("Array.from({ length: 3 }, (_, i) => i * 2)"), json!([0, 2, 4]));
    assert_eq!(
        eval_json("function* g() { yield 1; yield 2; } Array.from(g())"),
        json!([1, 2])
    );
}

#[test]
fn test_push_pop_shift_unshift() {
    assert_eq!(eval("const a = [1, 2]; a.push(3, 4)"), Value::Number(4.0));
    assert_eq!(eval("const a = [1, 2]; a.pop()"), Value::Number(2.0));
    assert_eq!(eval("[].pop()"), Value::Undefined);
    assert_eq!(eval_json("const a = [1, 2, 3]; a.shift(); a"), json!([2, 3]));
    assert_eq!(eval_json("const a = [3]; a.unshift(1, 2); a"), json!([1, 2, 3]));
}

#[test]
fn test_splice_and_slice() {
    assert_eq!(
        eval_json("const a = [1, 2, 3, 4, 5]; const r = a.splice(1, 2, 'x'); [r, a]"),
        json!([[2, 3], [1, "x", 4, 5]])
    );
    assert_eq!(eval_json("[1, 2, 3, 4].slice(1, -1)"), json!([2, 3]));
    assert_eq!(eval_json("[1, 2, 3].slice(-2)"), json!([2, 3]));
}

#[test]
fn test_iteration_methods() {
    assert_eq!(eval_json("[1, 2, 3].map(x => x * 2)"), json!([2, 4, 6]));
    assert_eq!(eval_json("[1, 2, 3, 4].filter(x => x % 2)"), json!([1, 3]));
    assert_eq!(eval("[1, 2, 3].reduce((a, b) => a + b, 10)"), Value::Number(16.0));
    assert_eq!(eval_json("['a', 'b'].reduceRight((acc, x) => acc.concat(x), [])"), json!(["b", "a"]));
    assert_eq!(eval("[1, 2, 3].some(x => x > 2)"), Value::Boolean(true));
    assert_eq!(eval("[1, 2, 3].every(x => x > 2)"), Value::Boolean(false));
    assert_eq!(eval("let sum = 0; [1, 2, 3].forEach(x => { sum += x; }); sum"), Value::Number(6.0));
    assert!(throws_error("[].reduce((a, b) => a)", "TypeError"));
}

#[test]
fn test_search_methods() {
    assert_eq!(eval("[1, 2, 3].find(x => x > 1)"), Value::Number(2.0));
    assert_eq!(eval("[1, 2, 3].findIndex(x => x > 5)"), Value::Number(-1.0));
    assert_eq!(eval("[1, 2, 3, 2].findLast(x => x === 2)"), Value::Number(2.0));
    assert_eq!(eval("[1, 2, 3, 2].findLastIndex(x => x === 2)"), Value::Number(3.0));
    assert_eq!(eval("[1, 2, 3, 2].indexOf(2)"), Value::Number(1.0));
    assert_eq!(eval("[1, 2, 3, 2].lastIndexOf(2)"), Value::Number(3.0));
    assert_eq!(eval("[NaN].includes(NaN)"), Value::Boolean(true));
    assert_eq!(eval("[NaN].indexOf(NaN)"), Value::Number(-1.0));
    assert_eq!(eval("[1, 2, 3].at(-1)"), Value::Number(3.0));
}

#[test]
fn test_join_and_to_string() {
    assert_eq!(eval("[1, null, undefined, 'a'].join('-')"), s("1---a"));
    assert_eq!(eval("[1, [2, 3]].toString()"), s("1,2,3"));
    assert_eq!(eval("const a = [1]; a.push(a); a.join()"), s("1,"));
    assert_eq!(eval("String([])"), s(""));
}

#[test]
fn test_sort() {
    assert_eq!(eval_json("[10, 9, 1, 2].sort()"), json!([1, 10, 2, 9]));
    assert_eq!(eval_json("[10, 9, 1, 2].sort((a, b) => a - b)"), json!([1, 2, 9, 10]));
    assert_eq!(eval_json("[3, undefined, 1].sort()"), json!([1, 3, null]));
    assert_eq!(
        eval_json("[{ k: 1, v: 'a' }, { k: 0, v: 'b' }, { k: 1, v: 'c' }].sort((x, y) => x.k - y.k).map(e => e.v)"),
        json!(["b", "a", "c"])
    );
}

#[test]
fn test_reverse_concat_flat() {
    assert_eq!(eval_json("[1, 2, 3].reverse()"), json!([3, 2, 1]));
    assert_eq!(eval_json("[1].concat([2, 3], 4)"), json!([1, 2, 3, 4]));
    assert_eq!(
        eval_json("const spreadable = { length: 1, 0: 'x', [Symbol.isConcatSpreadable]: true }; [].concat(spreadable)"),
        json!(["x"])
    );
    assert_eq!(eval_json("[1, [2, [3, [4]]]].flat(2)"), json!([1, 2, 3, [4]]));
    assert_eq!(eval_json("[1, 2].flatMap(x => [x, x * 10])"), json!([1, 10, 2, 20]));
}

#[test]
fn test_fill_and_copy_within() {
    assert_eq!(eval_json("new Array(3).fill(0)"), json!([0, 0, 0]));
    assert_eq!(eval_json("[1, 2, 3, 4, 5].copyWithin(0, 3)"), json!([4, 5, 3, 4, 5]));
}

#[test]
fn test_change_array_by_copy() {
    assert_eq!(eval_json("const a = [3, 1, 2]; [a.toSorted(), a]"), json!([[1, 2, 3], [3, 1, 2]]));
    assert_eq!(eval_json("[1, 2, 3].toReversed()"), json!([3, 2, 1]));
    assert_eq!(eval_json("[1, 2, 3].toSpliced(1, 1)"), json!([1, 3]));
    assert_eq!(eval_json("[1, 2, 3].with(1, 9)"), json!([1, 9, 3]));
    assert!(throws_error("[1].with(5, 0)", "RangeError"));
}

#[test]
fn test_array_iterators() {
    assert_eq!(eval_json("[...['a', 'b'].keys()]"), json!([0, 1]));
    assert_eq!(eval_json("[...['a', 'b'].entries()]"), json!([[0, "a"], [1, "b"]]));
    assert_eq!(eval("[][Symbol.iterator] === [].values"), Value::Boolean(true));
    assert_eq!(
        eval("Object.prototype.toString.call([][Symbol.iterator]())"),
        s("[object Array Iterator]")
    );
}

#[test]
fn test_unscopables() {
    assert_eq!(eval("Array.prototype[Symbol.unscopables].flat"), Value::Boolean(true));
    assert_eq!(eval("Object.getPrototypeOf(Array.prototype[Symbol.unscopables])"), Value::Null);
}

#[test]
fn test_species() {
    assert_eq!(
        eval(
            r#"
            class MyArray extends Array {}
            const mapped = MyArray.from([1, 2]).map(x => x);
            mapped instanceof MyArray
        "#
        ),
        Value::Boolean(true)
    );
    assert_eq!(eval("Array[Symbol.species] === Array"), Value::Boolean(true));
}

#[test]
fn test_generic_array_methods_on_array_likes() {
    assert_eq!(
        eval_json("Array.prototype.map.call({ length: 2, 0: 'a', 1: 'b' }, x => x.toUpperCase())"),
        json!(["A", "B"])
    );
    assert_eq!(
        eval("const o = { length: 0 }; Array.prototype.push.call(o, 'x'); o.length"),
        Value::Number(1.0)
    );
}
