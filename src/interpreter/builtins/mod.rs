//! Built-in functions and the intrinsics they populate
//!
//! Every built-in is a plain `fn` taking the interpreter and a [`NativeCall`].
//! Functions that close over per-instance state (promise resolving functions,
//! await continuations, `Proxy.revocable`'s revoke) carry it in
//! [`Captures`] on their function object.

pub mod array;
pub mod array_buffer;
pub mod boolean;
pub mod data_view;
pub mod error;
pub mod function;
pub mod generator;
pub mod global;
pub mod iterator;
pub mod json;
pub mod math;
pub mod number;
pub mod object;
pub mod promise;
pub mod proxy;
pub mod reflect;
pub mod string;
pub mod symbol;
pub mod typed_array;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{JsError, JsResult};
use crate::interpreter::coroutine::Coroutine;
use crate::interpreter::iteration::IteratorRecord;
use crate::interpreter::object::typed_array::ElementType;
use crate::interpreter::object::{ObjectKind, Property};
use crate::interpreter::realm::RealmId;
use crate::interpreter::{ExecutionContext, Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, JsSymbol, PropertyKey, Value};

use promise::{CapabilitySlots, PromiseElement};

/// Signature of every built-in function.
pub type NativeFn = fn(&Interpreter, &NativeCall<'_>) -> JsResult<Value>;

/// The arguments of one built-in invocation.
pub struct NativeCall<'a> {
    pub this: &'a Value,
    pub args: &'a [Value],
    /// `Some` when invoked through [[Construct]].
    pub new_target: Option<ObjectId>,
    /// The function object being invoked.
    pub function: ObjectId,
}

impl NativeCall<'_> {
    /// The argument at `index`, `undefined` when absent.
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }
}

/// Internal slots of a built-in function object.
pub struct BuiltinFunction {
    pub behavior: NativeFn,
    pub constructor: bool,
    pub realm: RealmId,
    pub captures: Captures,
}

/// State a built-in closes over.
#[derive(Clone, Default)]
pub enum Captures {
    #[default]
    None,
    /// Promise resolve and reject functions.
    Resolving {
        promise: ObjectId,
        already_resolved: Rc<Cell<bool>>,
    },
    /// GetCapabilitiesExecutor
    CapabilityExecutor(Rc<RefCell<CapabilitySlots>>),
    /// Continuation of an `await`.
    Await(Rc<Coroutine>),
    /// The revoke function of `Proxy.revocable`.
    ProxyRevoke(Rc<Cell<Option<ObjectId>>>),
    /// `Promise.all`, `allSettled` and `any` element functions.
    PromiseElement(Rc<PromiseElement>),
    /// `Promise.prototype.finally` reactions.
    Finally { on_finally: Value, constructor: ObjectId },
    /// Returns or throws the captured value.
    Thunk(Value),
    /// Async-from-sync iterator: wraps the settled value in a result object.
    AsyncFromSyncUnwrap { done: bool },
    /// Async-from-sync iterator: closes the sync iterator on rejection.
    AsyncFromSyncClose(IteratorRecord),
    /// AsyncGeneratorAwaitReturn reactions.
    AsyncGeneratorReturn(ObjectId),
    /// Element type of a typed array constructor.
    ElementType(ElementType),
}

/// `return this`, shared by every `get [Symbol.species]`.
fn species_getter(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(call.this.cheap_clone())
}

impl Interpreter {
    // ============ CREATION ============

    /// Allocate a built-in function object without `length` or `name`.
    pub(crate) fn alloc_builtin(
        &self,
        behavior: NativeFn,
        constructor: bool,
        prototype: Option<ObjectId>,
        realm: RealmId,
        captures: Captures,
    ) -> ObjectId {
        self.object_create(
            prototype,
            ObjectKind::Builtin(Box::new(BuiltinFunction {
                behavior,
                constructor,
                realm,
                captures,
            })),
        )
    }

    /// CreateBuiltinFunction(behaviour, length, name) in the current realm.
    pub(crate) fn create_builtin_function(
        &self,
        behavior: NativeFn,
        length: usize,
        name: JsString,
        captures: Captures,
    ) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.function_prototype)?;
        let f = self.alloc_builtin(behavior, false, Some(proto), self.current_realm_id(), captures);
        self.name_builtin(f, length, name)?;
        Ok(f)
    }

    /// A built-in with no captured state, for reaction closures.
    pub(crate) fn create_closure(
        &self,
        behavior: NativeFn,
        length: usize,
        captures: Captures,
    ) -> JsResult<ObjectId> {
        self.create_builtin_function(behavior, length, JsString::default(), captures)
    }

    /// Define `length` then `name` on a built-in.
    pub(crate) fn name_builtin(&self, f: ObjectId, length: usize, name: JsString) -> JsResult<()> {
        self.insert_property(
            f,
            self.key("length"),
            Property::data(Value::Number(length as f64), false, false, true),
        )?;
        self.insert_property(
            f,
            self.key("name"),
            Property::data(Value::String(name), false, false, true),
        )
    }

    /// Define a method on a built-in object.
    pub(crate) fn register_method(
        &self,
        obj: ObjectId,
        name: &str,
        behavior: NativeFn,
        length: usize,
    ) -> JsResult<ObjectId> {
        let name = self.intern(name);
        let f = self.create_builtin_function(behavior, length, name.cheap_clone(), Captures::None)?;
        self.insert_property(obj, PropertyKey::from(name), Property::hidden(Value::Object(f)))?;
        Ok(f)
    }

    /// Define a symbol-keyed method, e.g. `[Symbol.iterator]`.
    pub(crate) fn register_symbol_method(
        &self,
        obj: ObjectId,
        symbol: JsSymbol,
        behavior: NativeFn,
        length: usize,
    ) -> JsResult<ObjectId> {
        let key = PropertyKey::Symbol(symbol);
        let f = self.create_builtin_function(behavior, length, key.to_function_name(), Captures::None)?;
        self.insert_property(obj, key, Property::hidden(Value::Object(f)))?;
        Ok(f)
    }

    /// Define an accessor with a built-in getter and optional setter.
    pub(crate) fn register_accessor(
        &self,
        obj: ObjectId,
        key: PropertyKey,
        getter: NativeFn,
        setter: Option<NativeFn>,
    ) -> JsResult<()> {
        let name = key.to_function_name();
        let get = self.create_builtin_function(
            getter,
            0,
            JsString::from(format!("get {}", name)),
            Captures::None,
        )?;
        let set = match setter {
            Some(setter) => Some(self.create_builtin_function(
                setter,
                1,
                JsString::from(format!("set {}", name)),
                Captures::None,
            )?),
            None => None,
        };
        self.insert_property(obj, key, Property::accessor(Some(get), set, false, true))
    }

    /// Define a non-writable, non-enumerable, non-configurable value.
    pub(crate) fn register_constant(&self, obj: ObjectId, name: &str, value: Value) -> JsResult<()> {
        self.insert_property(obj, self.key(name), Property::frozen(value))
    }

    /// Define a writable, non-enumerable, configurable value.
    pub(crate) fn register_value(&self, obj: ObjectId, name: &str, value: Value) -> JsResult<()> {
        self.insert_property(obj, self.key(name), Property::hidden(value))
    }

    /// Name a constructor and link it with its prototype object.
    pub(crate) fn register_constructor(
        &self,
        ctor: ObjectId,
        name: &str,
        length: usize,
        prototype: Option<ObjectId>,
    ) -> JsResult<()> {
        self.name_builtin(ctor, length, self.intern(name))?;
        if let Some(proto) = prototype {
            self.insert_property(ctor, self.key("prototype"), Property::frozen(Value::Object(proto)))?;
            self.insert_property(proto, self.key("constructor"), Property::hidden(Value::Object(ctor)))?;
        }
        Ok(())
    }

    /// `[Symbol.toStringTag]` on a prototype or namespace object.
    pub(crate) fn register_to_string_tag(&self, obj: ObjectId, tag: &str) -> JsResult<()> {
        self.insert_property(
            obj,
            PropertyKey::Symbol(self.well_known().to_string_tag.cheap_clone()),
            Property::data(Value::String(self.intern(tag)), false, false, true),
        )
    }

    // ============ INVOCATION ============

    /// The captured state of a built-in function.
    pub(crate) fn builtin_captures(&self, f: ObjectId) -> JsResult<Captures> {
        self.object(f, |d| match &d.kind {
            ObjectKind::Builtin(b) => Ok(b.captures.clone()),
            _ => Err(JsError::internal("not a built-in function")),
        })?
    }

    fn builtin_parts(&self, f: ObjectId) -> JsResult<(NativeFn, RealmId)> {
        self.object(f, |d| match &d.kind {
            ObjectKind::Builtin(b) => Ok((b.behavior, b.realm)),
            _ => Err(JsError::internal("not a built-in function")),
        })?
    }

    fn run_builtin(
        &self,
        f: ObjectId,
        this: &Value,
        args: &[Value],
        new_target: Option<ObjectId>,
    ) -> JsResult<Value> {
        let (behavior, realm) = self.builtin_parts(f)?;
        let global_env = self.realm(realm)?.global_env;
        let context = ExecutionContext {
            lexical_environment: global_env,
            variable_environment: global_env,
            function: Some(f),
            realm,
            script_or_module: None,
            strict: true,
            coroutine: None,
            caller_position: Default::default(),
        };
        self.with_context(context, || {
            self.tick()?;
            let call = NativeCall {
                this,
                args,
                new_target,
                function: f,
            };
            behavior(self, &call).or_else(|error| Err(self.materialize(error)?))
        })
    }

    /// [[Call]] of a built-in function object
    pub(crate) fn call_builtin(&self, f: ObjectId, this: &Value, args: &[Value]) -> JsResult<Value> {
        self.run_builtin(f, this, args, None)
    }

    /// [[Construct]] of a built-in function object
    pub(crate) fn construct_builtin(
        &self,
        f: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> JsResult<ObjectId> {
        match self.run_builtin(f, &Value::Undefined, args, Some(new_target))? {
            Value::Object(obj) => Ok(obj),
            _ => Err(JsError::internal("built-in constructor returned a primitive")),
        }
    }

    // ============ INSTALLATION ============

    /// Populate the intrinsics of the current realm. Runs once per realm,
    /// after `create_intrinsics` allocated the objects they reference.
    pub(crate) fn install_builtins(&self) -> JsResult<()> {
        object::init_object(self)?;
        function::init_function(self)?;
        symbol::init_symbol(self)?;
        error::init_errors(self)?;
        iterator::init_iterators(self)?;
        array::init_array(self)?;
        string::init_string(self)?;
        number::init_number(self)?;
        boolean::init_boolean(self)?;
        promise::init_promise(self)?;
        proxy::init_proxy(self)?;
        reflect::init_reflect(self)?;
        generator::init_generators(self)?;
        array_buffer::init_array_buffer(self)?;
        typed_array::init_typed_arrays(self)?;
        data_view::init_data_view(self)?;
        json::init_json(self)?;
        math::init_math(self)?;

        let species = self.create_builtin_function(
            species_getter,
            0,
            self.intern("get [Symbol.species]"),
            Captures::None,
        )?;
        let key = PropertyKey::Symbol(self.well_known().species.cheap_clone());
        let realm = self.current_realm()?;
        let i = &realm.intrinsics;
        for ctor in [
            i.array_constructor,
            i.promise_constructor,
            i.array_buffer_constructor,
            i.typed_array_constructor,
        ] {
            self.insert_property(ctor, key.cheap_clone(), Property::accessor(Some(species), None, false, true))?;
        }
        Ok(())
    }
}
