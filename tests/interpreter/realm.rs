//! Realm tests: separate intrinsics, cross-realm values and global object variants

use super::create_test_runtime;
use ecmavm::{GlobalObjectVariant, RealmOptions, Runtime, RuntimeConfig, Value};

/// A runtime whose initial realm sees a second realm's global as `other`.
fn with_other_realm(options: RealmOptions) -> Runtime {
    let runtime = create_test_runtime();
    let realm = runtime.create_realm(options).unwrap();
    let other = runtime.global_object_of(realm).unwrap();
    let install = runtime.eval("(g) => { globalThis.other = g; }").unwrap();
    runtime
        .call(&install, &Value::Undefined, &[Value::Object(other)])
        .unwrap();
    runtime
}

#[test]
fn test_realms_have_distinct_intrinsics() {
    let runtime = with_other_realm(RealmOptions::default());
    assert_eq!(runtime.eval("other.Array === Array").unwrap(), Value::Boolean(false));
    assert_eq!(runtime.eval("other.Object.prototype === Object.prototype").unwrap(), Value::Boolean(false));
    assert_eq!(runtime.eval("other.Symbol.iterator === Symbol.iterator").unwrap(), Value::Boolean(true));
    assert_eq!(runtime.eval("other.Symbol.for('k') === Symbol.for('k')").unwrap(), Value::Boolean(true));
}

#[test]
fn test_cross_realm_objects() {
    let runtime = with_other_realm(RealmOptions::default());
    assert_eq!(runtime.eval("new other.Array() instanceof Array").unwrap(), Value::Boolean(false));
    assert_eq!(runtime.eval("Array.isArray(new other.Array())").unwrap(), Value::Boolean(true));
    assert_eq!(
        runtime.eval("Object.getPrototypeOf(other.Array.of(1)) === other.Array.prototype").unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_globals_are_separate() {
    let runtime = create_test_runtime();
    let realm = runtime.create_realm(RealmOptions::default()).unwrap();
    runtime.eval("var shared = 'initial realm';").unwrap();
    runtime.eval_in_realm(realm, "var shared = 'second realm';").unwrap();
    assert_eq!(runtime.eval("shared").unwrap(), Value::from("initial realm"));
    assert_eq!(runtime.eval_in_realm(realm, "shared").unwrap(), Value::from("second realm"));
}

#[test]
fn test_host_call_uses_the_function_realm() {
    let runtime = create_test_runtime();
    let realm = runtime.create_realm(RealmOptions::default()).unwrap();
    let make = runtime.eval_in_realm(realm, "() => []").unwrap();
    let array = runtime.call(&make, &Value::Undefined, &[]).unwrap();
    let array_ctor = runtime.get(&array, "constructor").unwrap();
    let other_global = Value::Object(runtime.global_object_of(realm).unwrap());
    let other_array = runtime.get(&other_global, "Array").unwrap();
    let own_global = Value::Object(runtime.global_object().unwrap());
    let own_array = runtime.get(&own_global, "Array").unwrap();
    assert_eq!(array_ctor, other_array);
    assert_ne!(array_ctor, own_array);
}

#[test]
fn test_bare_global_object() {
    let runtime = create_test_runtime();
    let realm = runtime
        .create_realm(RealmOptions::default().with_globals(GlobalObjectVariant::Bare))
        .unwrap();
    assert_eq!(runtime.eval_in_realm(realm, "typeof Array").unwrap(), Value::from("undefined"));
    assert_eq!(runtime.eval_in_realm(realm, "typeof parseInt").unwrap(), Value::from("undefined"));
    let err = runtime.eval_in_realm(realm, "Reflect.ownKeys(globalThis)").unwrap_err();
    assert!(err.to_string().contains("ReferenceError"), "{}", err);
    assert_eq!(
        runtime
            .eval_in_realm(realm, "({}).constructor.getOwnPropertyNames(globalThis).sort().join()")
            .unwrap(),
        Value::from("Infinity,NaN,globalThis,undefined")
    );
    assert_eq!(runtime.eval_in_realm(realm, "[].constructor.name").unwrap(), Value::from("Array"));
    assert_eq!(runtime.eval_in_realm(realm, "(1).constructor.parseInt('42')").unwrap(), Value::Number(42.0));
    assert_eq!(runtime.eval_in_realm(realm, "globalThis.globalThis === globalThis").unwrap(), Value::Boolean(true));
    assert_eq!(runtime.eval_in_realm(realm, "NaN !== NaN && Infinity > 0").unwrap(), Value::Boolean(true));
}

#[test]
fn test_immutable_global_prototype() {
    let runtime = Runtime::with_config(
        RuntimeConfig::default().with_realm(RealmOptions::default().with_immutable_global_prototype(true)),
    )
    .unwrap();
    assert!(runtime.eval("Object.setPrototypeOf(globalThis, {})").is_err());
    assert_eq!(
        runtime
            .eval("Object.setPrototypeOf(globalThis, Object.getPrototypeOf(globalThis)) === globalThis")
            .unwrap(),
        Value::Boolean(true)
    );

    let mutable = create_test_runtime();
    assert_eq!(
        mutable.eval("const p = {}; Object.setPrototypeOf(globalThis, p); Object.getPrototypeOf(globalThis) === p").unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_global_property_attributes() {
    let runtime = create_test_runtime();
    assert_eq!(
        runtime.eval("Object.getOwnPropertyDescriptor(globalThis, 'undefined').writable").unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(
        runtime.eval("Object.getOwnPropertyDescriptor(globalThis, 'Array').enumerable").unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(runtime.eval("undefined = 1; undefined").unwrap(), Value::Undefined);
}
