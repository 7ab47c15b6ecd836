//! A tree-walking ECMAScript runtime for embedding
//!
//! Objects, environment records and realms follow the language's abstract
//! operations closely; generators and async functions run as native Rust
//! futures driven by the interpreter.
//!
//! # Example
//!
//! ```
//! use ecmavm::Runtime;
//!
//! let runtime = Runtime::new()?;
//! let result = runtime.eval("1 + 2 * 3")?;
//! assert_eq!(result.as_number(), Some(7.0));
//! # Ok::<(), ecmavm::JsError>(())
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod string_dict;
pub mod value;

mod heap;
mod hoist;

pub use config::{GlobalObjectVariant, RealmOptions, RuntimeConfig};
pub use error::{Diagnostic, DiagnosticKind, ErrorKind, JsError, JsResult};
pub use heap::Handle;
pub use interpreter::{Interpreter, ObjectId, RealmId};
pub use value::{CheapClone, JsString, JsSymbol, PropertyKey, Value};

use std::rc::Rc;

/// The host-facing runtime: one interpreter, its initial realm, the job
/// queue and the module registry.
///
/// Every evaluation entry point drains the job queue before returning, so
/// promise callbacks scheduled by the evaluated code have run by the time
/// the result is handed back.
pub struct Runtime {
    interpreter: Rc<Interpreter>,
}

impl Runtime {
    /// A runtime with the default configuration.
    pub fn new() -> JsResult<Self> {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> JsResult<Self> {
        let interpreter = Interpreter::new(&config)?;
        tracing::debug!(
            target: "ecmavm::runtime",
            timeout_ms = config.timeout_ms,
            step_limit = ?config.step_limit,
            "runtime created"
        );
        Ok(Self { interpreter })
    }

    /// The underlying interpreter, for operations the runtime does not wrap.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Evaluate `source` as a script in the initial realm.
    pub fn eval(&self, source: &str) -> JsResult<Value> {
        self.eval_in_realm(RealmId::new(0), source)
    }

    /// Evaluate `source` as a script named `name` (used in stack traces).
    pub fn eval_named(&self, name: &str, source: &str) -> JsResult<Value> {
        let result = self.interpreter.evaluate_script(source, Some(name), RealmId::new(0));
        self.finish(result)
    }

    /// Evaluate `source` as a script in `realm`.
    pub fn eval_in_realm(&self, realm: RealmId, source: &str) -> JsResult<Value> {
        let result = self.interpreter.evaluate_script(source, None, realm);
        self.finish(result)
    }

    /// Register the source text of a module under `specifier`. Imports are
    /// resolved against the registered sources only.
    pub fn add_module(&self, specifier: &str, source: &str) {
        self.interpreter.register_module_source(specifier, source);
    }

    /// Load, link and evaluate the module registered as `specifier`.
    /// Returns its namespace object.
    pub fn eval_module(&self, specifier: &str) -> JsResult<Value> {
        self.interpreter.start_budget();
        let result = self.interpreter.import_module(specifier).map(Value::Object);
        self.finish(result)
    }

    /// Drain the job queue.
    pub fn run_jobs(&self) -> JsResult<()> {
        self.interpreter.run_jobs()
    }

    /// Create an additional realm with its own intrinsics and global object.
    pub fn create_realm(&self, options: RealmOptions) -> JsResult<RealmId> {
        self.interpreter.create_realm(options)
    }

    /// The global object of the initial realm.
    pub fn global_object(&self) -> JsResult<ObjectId> {
        self.interpreter.global_object_of(RealmId::new(0))
    }

    /// The global object of `realm`.
    pub fn global_object_of(&self, realm: RealmId) -> JsResult<ObjectId> {
        self.interpreter.global_object_of(realm)
    }

    /// `value[key]`, running getters and proxy traps.
    pub fn get(&self, value: &Value, key: &str) -> JsResult<Value> {
        self.interpreter.get_v(value, &self.interpreter.key(key))
    }

    /// Call `f` with `this` and `args`, then drain the job queue.
    pub fn call(&self, f: &Value, this: &Value, args: &[Value]) -> JsResult<Value> {
        self.interpreter.start_budget();
        let result = self.interpreter.call(f, this, args);
        self.finish(result)
    }

    /// Build a language value from JSON data in the initial realm.
    pub fn value_from_json(&self, json: &serde_json::Value) -> JsResult<Value> {
        self.interpreter.value_from_json(json)
    }

    /// Serialize a value the way `JSON.stringify` does. `None` when the
    /// value has no JSON representation (e.g. `undefined` or a function).
    pub fn value_to_json(&self, value: &Value) -> JsResult<Option<serde_json::Value>> {
        self.interpreter.value_to_json(value)
    }

    /// Render a value for a host without running script code.
    pub fn display(&self, value: &Value) -> String {
        self.interpreter.display(value)
    }

    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        self.interpreter.set_timeout_ms(timeout_ms);
    }

    pub fn timeout_ms(&self) -> u64 {
        self.interpreter.timeout_ms()
    }

    pub fn set_step_limit(&self, limit: Option<u64>) {
        self.interpreter.set_step_limit(limit);
    }

    /// Rejection reasons of promises that were still unhandled when the job
    /// queue last drained. Each reason is reported once.
    pub fn unhandled_rejections(&self) -> Vec<Value> {
        self.interpreter.take_unhandled_rejections()
    }

    /// Drop every object, environment and realm. Values obtained earlier
    /// become stale and using them fails with [`JsError::Internal`].
    pub fn dispose(&self) {
        self.interpreter.dispose();
    }

    /// Drain jobs after a host-initiated evaluation. Fatal errors skip the
    /// drain.
    fn finish<T>(&self, result: JsResult<T>) -> JsResult<T> {
        if let Err(error) = &result {
            if !error.is_catchable() {
                self.interpreter.jobs.borrow_mut().clear();
                return result;
            }
        }
        self.interpreter.run_jobs()?;
        result
    }
}
