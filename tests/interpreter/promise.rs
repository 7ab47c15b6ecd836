//! Promise tests: capabilities, reaction jobs, combinators and unhandled rejections

use super::create_test_runtime;
use ecmavm::Value;
use serde_json::json;

/// Run `setup`, drain the job queue, then evaluate `result` as JSON.
fn settled(setup: &str, result: &str) -> serde_json::Value {
    let runtime = create_test_runtime();
    runtime.eval(setup).unwrap();
    let value = runtime.eval(result).unwrap();
    runtime.value_to_json(&value).unwrap().unwrap_or(serde_json::Value::Null)
}

#[test]
fn test_then_runs_as_job() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            Promise.resolve(1).then(v => log.push('then ' + v));
            log.push('sync');
        "#,
            "log"
        ),
        json!(["sync", "then 1"])
    );
}

#[test]
fn test_jobs_run_in_fifo_order() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            const p = Promise.resolve();
            p.then(() => { log.push(1); Promise.resolve().then(() => log.push(3)); });
            p.then(() => log.push(2));
        "#,
            "log"
        ),
        json!([1, 2, 3])
    );
}

#[test]
fn test_executor_and_resolve_functions() {
    assert_eq!(
        settled(
            r#"
            var out;
            new Promise((resolve, reject) => { resolve('first'); reject('ignored'); resolve('again'); })
                .then(v => { out = v; });
        "#,
            "out"
        ),
        json!("first")
    );
    assert_eq!(
        settled(
            r#"
            var out;
            new Promise(() => { throw new Error('in executor'); }).catch(e => { out = e.message; });
        "#,
            "out"
        ),
        json!("in executor")
    );
}

#[test]
fn test_resolving_with_thenable() {
    assert_eq!(
        settled(
            r#"
            var out;
            const thenable = { then(resolve) { resolve('from thenable'); } };
            Promise.resolve(thenable).then(v => { out = v; });
        "#,
            "out"
        ),
        json!("from thenable")
    );
    assert_eq!(
        settled(
            r#"
            var out;
            const p = new Promise(r => r());
            const self = p.then(() => self);
            self.catch(e => { out = e instanceof TypeError; });
        "#,
            "out"
        ),
        json!(true)
    );
}

#[test]
fn test_chaining_and_catch() {
    assert_eq!(
        settled(
            r#"
            var out;
            Promise.resolve(1)
                .then(v => v + 1)
                .then(v => { throw v * 10; })
                .then(() => 'skipped', e => e + 1)
                .then(v => { out = v; });
        "#,
            "out"
        ),
        json!(21)
    );
}

#[test]
fn test_finally() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            Promise.resolve('value')
                .finally(() => { log.push('finally'); return 'ignored'; })
                .then(v => log.push(v));
            Promise.reject('reason')
                .finally(() => log.push('finally 2'))
                .catch(e => log.push(e));
        "#,
            "log"
        ),
        json!(["finally", "finally 2", "value", "reason"])
    );
}

#[test]
fn test_all_and_all_settled() {
    assert_eq!(
        settled(
            "var out; Promise.all([1, Promise.resolve(2), { then(r) { r(3); } }]).then(v => { out = v; });",
            "out"
        ),
        json!([1, 2, 3])
    );
    assert_eq!(
        settled(
            "var out; Promise.all([Promise.reject('bad'), 1]).catch(e => { out = e; });",
            "out"
        ),
        json!("bad")
    );
    assert_eq!(
        settled(
            "var out; Promise.allSettled([Promise.resolve(1), Promise.reject(2)]).then(v => { out = v; });",
            "out"
        ),
        json!([
            { "status": "fulfilled", "value": 1 },
            { "status": "rejected", "reason": 2 }
        ])
    );
    assert_eq!(settled("var out; Promise.all([]).then(v => { out = v; });", "out"), json!([]));
}

#[test]
fn test_race_and_any() {
    assert_eq!(
        settled(
            "var out; Promise.race([new Promise(() => {}), Promise.resolve('fast')]).then(v => { out = v; });",
            "out"
        ),
        json!("fast")
    );
    assert_eq!(
        settled(
            r#"
            var out;
            Promise.any([Promise.reject(1), Promise.reject(2)]).catch(e => {
                out = [e instanceof AggregateError, e.errors];
            });
        "#,
            "out"
        ),
        json!([true, [1, 2]])
    );
}

#[test]
fn test_promise_constructor_checks() {
    let runtime = create_test_runtime();
    assert!(runtime.eval("Promise(() => {})").is_err());
    assert!(runtime.eval("new Promise(1)").is_err());
    assert_eq!(
        runtime.eval("Object.prototype.toString.call(Promise.resolve())").unwrap(),
        Value::from("[object Promise]")
    );
    assert_eq!(
        runtime.eval("const p = Promise.resolve(); Promise.resolve(p) === p").unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_promise_subclass_species() {
    assert_eq!(
        settled(
            r#"
            class Tracked extends Promise {}
            var out = Tracked.resolve(1).then(x => x) instanceof Tracked;
        "#,
            "out"
        ),
        json!(true)
    );
}

#[test]
fn test_unhandled_rejections_are_reported() {
    let runtime = create_test_runtime();
    runtime.eval("Promise.reject('lost'); Promise.reject('handled').catch(() => {});").unwrap();
    let unhandled = runtime.unhandled_rejections();
    assert_eq!(unhandled, vec![Value::from("lost")]);
    assert!(runtime.unhandled_rejections().is_empty());
}

#[test]
fn test_late_handler_clears_rejection() {
    let runtime = create_test_runtime();
    runtime
        .eval("const p = Promise.reject('late'); Promise.resolve().then(() => p.catch(() => {}));")
        .unwrap();
    assert!(runtime.unhandled_rejections().is_empty());
}
