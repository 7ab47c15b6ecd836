//! String tests: String exotic objects, String statics and String.prototype

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_string_literals_and_escapes() {
    assert_eq!(eval(r#""a\tb".length"#), Value::Number(3.0));
    assert_eq!(eval(r#""A\x42\u{43}""#), s("ABC"));
    assert_eq!(eval("'multi\\\nline'"), s("multiline"));
}

#[test]
fn test_length_counts_utf16_units() {
    assert_eq!(eval("'héllo'.length"), Value::Number(5.0));
    assert_eq!(eval("'😀'.length"), Value::Number(2.0));
    assert_eq!(eval("'😀'.codePointAt(0)"), Value::Number(128512.0));
    assert_eq!(eval("'😀'.charCodeAt(0)"), Value::Number(55357.0));
}

#[test]
fn test_string_exotic_object() {
    assert_eq!(eval("const o = new String('ab'); o[1]"), s("b"));
    assert_eq!(eval("typeof new String('x')"), s("object"));
    assert_eq!(eval_json("Object.keys(new String('ab'))"), json!(["0", "1"]));
    assert_eq!(
        eval("const o = new String('ab'); o[0] = 'z'; o[0]"),
        s("a")
    );
    assert_eq!(
        eval("Object.getOwnPropertyDescriptor(new String('ab'), 'length').writable"),
        Value::Boolean(false)
    );
    assert!(throws_error("'use strict'; const o = new String('ab'); o[0] = 'z';", "TypeError"));
}

#[test]
fn test_from_char_code_and_code_point() {
    assert_eq!(eval("String.fromCharCode(72, 105)"), s("Hi"));
    assert_eq!(eval("String.fromCodePoint(128512) === '😀'"), Value::Boolean(true));
    assert!(throws_error("String.fromCodePoint(-1)", "RangeError"));
    assert_eq!(eval("String.raw`a\\n${1}`"), s("a\\n1"));
}

#[test]
fn test_char_access() {
    assert_eq!(eval("'abc'.charAt(1)"), s("b"));
    assert_eq!(eval("'abc'.charAt(5)"), s(""));
    assert_eq!(eval("'abc'.at(-1)"), s("c"));
    assert_eq!(eval("'abc'.at(5)"), Value::Undefined);
    assert_eq!(eval("'abc'[1]"), s("b"));
}

#[test]
fn test_search() {
    assert_eq!(eval("'hello world'.indexOf('o')"), Value::Number(4.0));
    assert_eq!(eval("'hello world'.lastIndexOf('o')"), Value::Number(7.0));
    assert_eq!(eval("'hello'.includes('ell')"), Value::Boolean(true));
    assert_eq!(eval("'hello'.startsWith('he')"), Value::Boolean(true));
    assert_eq!(eval("'hello'.endsWith('lo', 5)"), Value::Boolean(true));
    assert_eq!(eval("'hello'.startsWith('l', 2)"), Value::Boolean(true));
}

#[test]
fn test_slicing() {
    assert_eq!(eval("'hello'.slice(1, -1)"), s("ell"));
    assert_eq!(eval("'hello'.substring(3, 1)"), s("el"));
    assert_eq!(eval("'hello'.substr(-3, 2)"), s("ll"));
}

#[test]
fn test_case_and_trim() {
    assert_eq!(eval("'Hello'.toUpperCase()"), s("HELLO"));
    assert_eq!(eval("'Hello'.toLowerCase()"), s("hello"));
    assert_eq!(eval("'  x  '.trim()"), s("x"));
    assert_eq!(eval("'  x  '.trimStart()"), s("x  "));
    assert_eq!(eval("'  x  '.trimEnd()"), s("  x"));
    assert_eq!(eval("String.prototype.trimLeft === String.prototype.trimStart"), Value::Boolean(true));
}

#[test]
fn test_padding_and_repeat() {
    assert_eq!(eval("'5'.padStart(3, '0')"), s("005"));
    assert_eq!(eval("'ab'.padEnd(5, 'xy')"), s("abxyx"));
    assert_eq!(eval("'ab'.repeat(3)"), s("ababab"));
    assert!(throws_error("'a'.repeat(-1)", "RangeError"));
}

#[test]
fn test_split() {
    assert_eq!(eval_json("'a,b,c'.split(',')"), json!(["a", "b", "c"]));
    assert_eq!(eval_json("'abc'.split('')"), json!(["a", "b", "c"]));
    assert_eq!(eval_json("'a,b,c'.split(',', 2)"), json!(["a", "b"]));
    assert_eq!(eval_json("'abc'.split()"), json!(["abc"]));
}

#[test]
fn test_replace() {
    assert_eq!(eval("'aaa'.replace('a', 'b')"), s("baa"));
    assert_eq!(eval("'aaa'.replaceAll('a', 'b')"), s("bbb"));
    assert_eq!(eval("'abc'.replace('b', (m, i) => m.toUpperCase() + i)"), s("aB1c"));
    assert_eq!(eval("'abc'.replace('b', '[$&]')"), s("a[b]c"));
}

#[test]
fn test_concat_and_compare() {
    assert_eq!(eval("'a'.concat(1, null)"), s("a1null"));
    assert_eq!(eval("'a'.localeCompare('b')"), Value::Number(-1.0));
    assert_eq!(eval("'b' > 'a'"), Value::Boolean(true));
    assert_eq!(eval("'B' < 'a'"), Value::Boolean(true));
}

#[test]
fn test_well_formed() {
    assert_eq!(eval("'ab'.toWellFormed()"), s("ab"));
}

#[test]
fn test_string_iterator() {
    assert_eq!(eval_json("[...'a😀b'].length"), json!(3));
    assert_eq!(
        eval("Object.prototype.toString.call(''[Symbol.iterator]())"),
        s("[object String Iterator]")
    );
}

#[test]
fn test_to_string_conversions() {
    assert_eq!(eval("String(123)"), s("123"));
    assert_eq!(eval("String(Symbol('x'))"), s("Symbol(x)"));
    assert!(throws_error("'' + Symbol('x')", "TypeError"));
    assert_eq!(eval("`${{ toString() { return 'obj'; } }}`"), s("obj"));
    assert_eq!(eval("String({ [Symbol.toPrimitive]() { return 'prim'; } })"), s("prim"));
}

#[test]
fn test_methods_require_object_coercible_this() {
    assert!(throws_error("String.prototype.trim.call(null)", "TypeError"));
    assert!(throws_error("String.prototype.toString.call({})", "TypeError"));
}

#[test]
fn test_normalize_forms() {
    // U+00E9 versus "e" followed by U+0301
    assert_eq!(eval("'\\u00e9'.normalize('NFD').length"), Value::Number(2.0));
    assert_eq!(eval("'e\\u0301'.normalize().length"), Value::Number(1.0));
    assert_eq!(eval("'e\\u0301'.normalize('NFC') === '\\u00e9'"), Value::Boolean(true));
    assert_eq!(eval("'\\ufb01'.normalize('NFKC')"), s("fi"));
    assert_eq!(eval("'\\ufb01'.normalize('NFC').length"), Value::Number(1.0));
    assert_eq!(eval("'abc'.normalize('NFKD')"), s("abc"));
    assert!(throws_error("'a'.normalize('nfc')", "RangeError"));
}
