//! ArrayBuffer, typed array and DataView tests

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_array_buffer_basics() {
    assert_eq!(eval("new ArrayBuffer(8).byteLength"), Value::Number(8.0));
    assert_eq!(eval("new ArrayBuffer(0).byteLength"), Value::Number(0.0));
    assert!(throws_error("ArrayBuffer(8)", "TypeError"));
    assert!(throws_error("new ArrayBuffer(-1)", "RangeError"));
    assert_eq!(eval("ArrayBuffer.isView(new Uint8Array(1))"), Value::Boolean(true));
    assert_eq!(eval("ArrayBuffer.isView(new DataView(new ArrayBuffer(1)))"), Value::Boolean(true));
    assert_eq!(eval("ArrayBuffer.isView(new ArrayBuffer(1))"), Value::Boolean(false));
    assert_eq!(eval("Object.prototype.toString.call(new ArrayBuffer(1))"), s("[object ArrayBuffer]"));
}

#[test]
fn test_array_buffer_slice() {
    assert_eq!(
        eval_json("const b = new Uint8Array([1, 2, 3, 4]).buffer; Array.from(new Uint8Array(b.slice(1, -1)))"),
        json!([2, 3])
    );
    assert_eq!(eval("new ArrayBuffer(4).slice(3, 1).byteLength"), Value::Number(0.0));
}

#[test]
fn test_transfer_detaches() {
    assert_eq!(
        eval_json(
            r#"
            const a = new Uint8Array([1, 2, 3]);
            const moved = a.buffer.transfer(4);
            [a.buffer.detached, a.buffer.byteLength, a.length, moved.byteLength, Array.from(new Uint8Array(moved))]
        "#
        ),
        json!([true, 0, 0, 4, [1, 2, 3, 0]])
    );
    assert!(throws_error(
        "const b = new ArrayBuffer(4); b.transfer(); b.slice(0)",
        "detached"
    ));
    assert!(throws_error(
        "const b = new ArrayBuffer(4); b.transfer(); new Uint8Array(b)",
        "TypeError"
    ));
}

#[test]
fn test_detached_typed_array_reads_undefined() {
    assert_eq!(
        eval("const a = new Uint8Array([9]); a.buffer.transfer(); a[0]"),
        Value::Undefined
    );
    assert!(throws_error("const a = new Uint8Array(1); a.buffer.transfer(); a.fill(0)", "TypeError"));
}

#[test]
fn test_typed_array_construction() {
    assert_eq!(eval("new Int16Array(4).length"), Value::Number(4.0));
    assert_eq!(eval("new Float64Array(2).byteLength"), Value::Number(16.0));
    assert_eq!(eval_json("Array.from(new Int8Array([1, 2, 3]))"), json!([1, 2, 3]));
    assert_eq!(eval_json("Array.from(new Uint16Array(new Uint8Array([1, 255])))"), json!([1, 255]));
    assert_eq!(eval_json("Array.from(new Uint8Array({ length: 2, 0: 5, 1: 6 }))"), json!([5, 6]));
    assert!(throws_error("Uint8Array(2)", "TypeError"));
    assert!(throws_error("new (Object.getPrototypeOf(Int8Array))()", "TypeError"));
}

#[test]
fn test_views_over_buffers() {
    assert_eq!(
        eval_json(
            r#"
            const buffer = new ArrayBuffer(8);
            const whole = new Uint8Array(buffer);
            const tail = new Uint16Array(buffer, 4, 1);
            tail[0] = 0x0102;
            [tail.byteOffset, tail.length, whole[4] + whole[5]]
        "#
        ),
        json!([4, 1, 3])
    );
    assert!(throws_error("new Uint16Array(new ArrayBuffer(4), 1)", "RangeError"));
    assert!(throws_error("new Uint16Array(new ArrayBuffer(3))", "RangeError"));
    assert!(throws_error("new Uint8Array(new ArrayBuffer(4), 2, 4)", "RangeError"));
}

#[test]
fn test_element_conversions() {
    assert_eq!(eval_json("Array.from(new Uint8Array([256, -1, 1.7]))"), json!([0, 255, 1]));
    assert_eq!(eval_json("Array.from(new Int8Array([128, 255]))"), json!([-128, -1]));
    assert_eq!(eval_json("Array.from(new Uint8ClampedArray([300, -5, 1.5, 2.5]))"), json!([255, 0, 2, 2]));
    assert_eq!(eval_json("Array.from(new Int32Array([2 ** 31]))"), json!([-2147483648]));
    assert_eq!(eval("new Float32Array([0.1])[0] === Math.fround(0.1)"), Value::Boolean(true));
    assert_eq!(eval("Number.isNaN(new Float64Array([NaN])[0])"), Value::Boolean(true));
}

#[test]
fn test_integer_indexed_properties() {
    assert_eq!(eval("const a = new Uint8Array(2); a[5] = 1; a[5]"), Value::Undefined);
    assert_eq!(eval("const a = new Uint8Array(2); a['-0'] = 1; a['-0']"), Value::Undefined);
    assert_eq!(eval("const a = new Uint8Array(2); a[1.5] = 1; 1.5 in a"), Value::Boolean(false));
    assert_eq!(eval("const a = new Uint8Array(2); a.foo = 1; a.foo"), Value::Number(1.0));
    assert_eq!(eval("'1' in new Uint8Array(2)"), Value::Boolean(true));
    assert_eq!(eval_json("Object.keys(new Uint8Array(3))"), json!(["0", "1", "2"]));
    assert_eq!(eval("delete new Uint8Array(2)[0]"), Value::Boolean(false));
    assert_eq!(
        eval("Object.getOwnPropertyDescriptor(new Uint8Array([4]), 0).configurable"),
        Value::Boolean(true)
    );
    assert!(throws_error(
        "Object.defineProperty(new Uint8Array(1), 0, { value: 1, enumerable: false })",
        "TypeError"
    ));
}

#[test]
fn test_static_from_and_of() {
    assert_eq!(eval_json("Array.from(Uint8Array.of(1, 2))"), json!([1, 2]));
    assert_eq!(eval_json("Array.from(Int16Array.from([1, 2], x => x * -1))"), json!([-1, -2]));
    assert_eq!(eval("Uint8Array.BYTES_PER_ELEMENT + Float64Array.prototype.BYTES_PER_ELEMENT"), Value::Number(9.0));
}

#[test]
fn test_prototype_methods() {
    assert_eq!(eval("new Uint8Array([1, 2, 3]).join('-')"), s("1-2-3"));
    assert_eq!(eval("new Uint8Array([1, 2, 3]).toString()"), s("1,2,3"));
    assert_eq!(eval_json("Array.from(new Int8Array([1, 2, 3]).map(x => x * 50))"), json!([50, 100, -106]));
    assert_eq!(eval_json("Array.from(new Uint8Array([1, 2, 3, 4]).filter(x => x % 2))"), json!([1, 3]));
    assert_eq!(eval("new Uint8Array([1, 2, 3]).reduce((a, b) => a + b)"), Value::Number(6.0));
    assert_eq!(eval("new Uint8Array([5, 6]).indexOf(6)"), Value::Number(1.0));
    assert_eq!(eval("new Float32Array([NaN]).includes(NaN)"), Value::Boolean(true));
    assert_eq!(eval("new Uint8Array([1, 2]).at(-1)"), Value::Number(2.0));
    assert_eq!(eval_json("Array.from(new Uint8Array(4).fill(7, 1, 3))"), json!([0, 7, 7, 0]));
    assert_eq!(eval_json("Array.from(new Uint8Array([1, 2, 3]).reverse())"), json!([3, 2, 1]));
    assert_eq!(eval_json("[...new Uint8Array([1, 2]).entries()]"), json!([[0, 1], [1, 2]]));
}

#[test]
fn test_sort_is_numeric() {
    assert_eq!(eval_json("Array.from(new Int16Array([10, -1, 2, 1]).sort())"), json!([-1, 1, 2, 10]));
    assert_eq!(
        eval_json("Array.from(new Float64Array([3, NaN, -0, 0, -Infinity]).sort()).map(String)"),
        json!(["-Infinity", "0", "0", "3", "NaN"])
    );
    assert_eq!(eval_json("Array.from(new Uint8Array([1, 2, 3]).toSorted((a, b) => b - a))"), json!([3, 2, 1]));
}

#[test]
fn test_subarray_shares_buffer() {
    assert_eq!(
        eval_json(
            r#"
            const a = new Uint8Array([1, 2, 3, 4]);
            const sub = a.subarray(1, 3);
            sub[0] = 9;
            [Array.from(a), sub.byteOffset, sub.buffer === a.buffer]
        "#
        ),
        json!([[1, 9, 3, 4], 1, true])
    );
}

#[test]
fn test_slice_copies() {
    assert_eq!(
        eval_json("const a = new Uint8Array([1, 2, 3]); const c = a.slice(1); c[0] = 0; [Array.from(a), Array.from(c)]"),
        json!([[1, 2, 3], [0, 3]])
    );
}

#[test]
fn test_set() {
    assert_eq!(
        eval_json("const a = new Uint8Array(4); a.set([1, 2], 1); a.set(new Uint8Array([9]), 3); Array.from(a)"),
        json!([0, 1, 2, 9])
    );
    assert!(throws_error("new Uint8Array(2).set([1, 2, 3])", "RangeError"));
    assert_eq!(
        eval_json("const a = new Uint8Array([1, 2, 3, 4]); a.set(a.subarray(0, 2), 1); Array.from(a)"),
        json!([1, 1, 2, 4])
    );
}

#[test]
fn test_copy_within_and_with() {
    assert_eq!(eval_json("Array.from(new Uint8Array([1, 2, 3, 4, 5]).copyWithin(0, 3))"), json!([4, 5, 3, 4, 5]));
    assert_eq!(eval_json("Array.from(new Uint8Array([1, 2]).with(0, 300))"), json!([44, 2]));
    assert!(throws_error("new Uint8Array(1).with(3, 0)", "RangeError"));
}

#[test]
fn test_typed_array_accessors_and_tag() {
    assert_eq!(eval("Object.prototype.toString.call(new Int32Array(1))"), s("[object Int32Array]"));
    assert_eq!(
        eval("Object.getOwnPropertyDescriptor(Object.getPrototypeOf(Int8Array).prototype, Symbol.toStringTag).get.call([])"),
        Value::Undefined
    );
    assert!(throws_error(
        "Object.getOwnPropertyDescriptor(Object.getPrototypeOf(Int8Array).prototype, 'length').get.call([])",
        "TypeError"
    ));
    assert_eq!(eval("Object.getPrototypeOf(Uint8Array) === Object.getPrototypeOf(Float32Array)"), Value::Boolean(true));
}

#[test]
fn test_data_view_get_set() {
    assert_eq!(
        eval_json(
            r#"
            const view = new DataView(new ArrayBuffer(8));
            view.setUint16(0, 0x1234);
            view.setUint16(2, 0x1234, true);
            view.setFloat32(4, 1.5);
            [view.getUint8(0), view.getUint8(1), view.getUint8(2), view.getUint8(3), view.getFloat32(4), view.getInt16(0, true)]
        "#
        ),
        json!([0x12, 0x34, 0x34, 0x12, 1.5, 0x3412])
    );
    assert_eq!(
        eval("const v = new DataView(new ArrayBuffer(4)); v.setInt32(0, -2); v.getUint32(0)"),
        Value::Number(4294967294.0)
    );
    assert_eq!(
        eval("const v = new DataView(new ArrayBuffer(8)); v.setFloat64(0, Math.PI, true); v.getFloat64(0, true)"),
        Value::Number(std::f64::consts::PI)
    );
}

#[test]
fn test_data_view_bounds() {
    assert!(throws_error("new DataView(new ArrayBuffer(4)).getInt32(1)", "RangeError"));
    assert!(throws_error("new DataView(new ArrayBuffer(4)).getInt8(-1)", "RangeError"));
    assert!(throws_error("new DataView(new ArrayBuffer(4), 5)", "RangeError"));
    assert!(throws_error("new DataView(new ArrayBuffer(4), 2, 3)", "RangeError"));
    assert!(throws_error("new DataView({})", "TypeError"));
    assert!(throws_error("DataView(new ArrayBuffer(1))", "TypeError"));
    assert_eq!(
        eval_json("const v = new DataView(new ArrayBuffer(8), 2, 4); [v.byteOffset, v.byteLength]"),
        json!([2, 4])
    );
}

#[test]
fn test_data_view_detached() {
    assert!(throws_error(
        "const b = new ArrayBuffer(4); const v = new DataView(b); b.transfer(); v.getInt8(0)",
        "detached"
    ));
    assert!(throws_error(
        "const b = new ArrayBuffer(4); const v = new DataView(b); b.transfer(); v.byteLength",
        "TypeError"
    ));
}

#[test]
fn test_data_view_methods() {
    assert_eq!(eval("typeof DataView.prototype.getUint8Clamped"), s("undefined"));
    assert_eq!(eval("DataView.prototype.setFloat64.length"), Value::Number(2.0));
    assert_eq!(eval("DataView.prototype.getInt16.name"), s("getInt16"));
    assert_eq!(eval("Object.prototype.toString.call(new DataView(new ArrayBuffer(1)))"), s("[object DataView]"));
}
