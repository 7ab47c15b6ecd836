//! Realms and the intrinsics bootstrap
//!
//! A realm owns its intrinsic objects, a global object and the global
//! environment. Intrinsics are created in two passes: `create_intrinsics`
//! allocates every prototype and constructor so they can reference each other
//! by identity, then `install_builtins` fills in their properties with the
//! new realm running.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::TemplateLiteral;
use crate::config::{GlobalObjectVariant, RealmOptions};
use crate::error::{ErrorKind, JsResult};
use crate::interpreter::builtins::{self, Captures, NativeFn};
use crate::interpreter::object::typed_array::{ElementType, PerElementType};
use crate::interpreter::object::{ObjectKind, Property};
use crate::interpreter::{EnvId, ExecutionContext, Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, Value};

/// Index of a realm in the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RealmId(usize);

impl RealmId {
    pub(crate) fn new(index: usize) -> Self {
        RealmId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// The %Name% objects of one realm.
#[derive(Debug, Clone, Copy)]
pub struct Intrinsics {
    pub object_prototype: ObjectId,
    pub object_constructor: ObjectId,
    pub function_prototype: ObjectId,
    pub function_constructor: ObjectId,
    pub throw_type_error: ObjectId,

    pub array_prototype: ObjectId,
    pub array_constructor: ObjectId,
    pub array_prototype_values: ObjectId,
    pub array_iterator_prototype: ObjectId,
    pub string_prototype: ObjectId,
    pub string_constructor: ObjectId,
    pub string_iterator_prototype: ObjectId,
    pub number_prototype: ObjectId,
    pub number_constructor: ObjectId,
    pub boolean_prototype: ObjectId,
    pub boolean_constructor: ObjectId,
    pub symbol_prototype: ObjectId,
    pub symbol_constructor: ObjectId,

    pub error_prototype: ObjectId,
    pub error_constructor: ObjectId,
    pub type_error_prototype: ObjectId,
    pub type_error_constructor: ObjectId,
    pub range_error_prototype: ObjectId,
    pub range_error_constructor: ObjectId,
    pub reference_error_prototype: ObjectId,
    pub reference_error_constructor: ObjectId,
    pub syntax_error_prototype: ObjectId,
    pub syntax_error_constructor: ObjectId,
    pub eval_error_prototype: ObjectId,
    pub eval_error_constructor: ObjectId,
    pub uri_error_prototype: ObjectId,
    pub uri_error_constructor: ObjectId,
    pub aggregate_error_prototype: ObjectId,
    pub aggregate_error_constructor: ObjectId,

    pub promise_prototype: ObjectId,
    pub promise_constructor: ObjectId,
    pub proxy_constructor: ObjectId,
    pub reflect: ObjectId,

    pub iterator_prototype: ObjectId,
    pub async_iterator_prototype: ObjectId,
    pub async_from_sync_iterator_prototype: ObjectId,
    pub generator_function: ObjectId,
    pub generator_function_prototype: ObjectId,
    pub generator_prototype: ObjectId,
    pub async_function: ObjectId,
    pub async_function_prototype: ObjectId,
    pub async_generator_function: ObjectId,
    pub async_generator_function_prototype: ObjectId,
    pub async_generator_prototype: ObjectId,

    pub array_buffer_prototype: ObjectId,
    pub array_buffer_constructor: ObjectId,
    pub typed_array_prototype: ObjectId,
    pub typed_array_constructor: ObjectId,
    pub typed_array_prototypes: PerElementType<ObjectId>,
    pub typed_array_constructors: PerElementType<ObjectId>,
    pub data_view_prototype: ObjectId,
    pub data_view_constructor: ObjectId,

    pub json: ObjectId,
    pub math: ObjectId,
}

impl Intrinsics {
    /// %NativeError.prototype% for `kind`.
    pub fn error_prototype_for(&self, kind: ErrorKind) -> ObjectId {
        match kind {
            ErrorKind::Error => self.error_prototype,
            ErrorKind::TypeError => self.type_error_prototype,
            ErrorKind::RangeError => self.range_error_prototype,
            ErrorKind::ReferenceError => self.reference_error_prototype,
            ErrorKind::SyntaxError => self.syntax_error_prototype,
            ErrorKind::EvalError => self.eval_error_prototype,
            ErrorKind::URIError => self.uri_error_prototype,
        }
    }
}

/// A realm record
pub struct Realm {
    pub id: RealmId,
    pub intrinsics: Intrinsics,
    pub global_object: ObjectId,
    pub global_env: EnvId,
    pub options: RealmOptions,
    /// [[TemplateMap]]: one frozen strings array per template site. The
    /// site is kept alive so its address is never reused.
    pub(crate) template_map: RefCell<FxHashMap<usize, (Rc<TemplateLiteral>, ObjectId)>>,
}

impl Interpreter {
    /// InitializeHostDefinedRealm: create intrinsics, global object and
    /// global environment, then install the default global bindings.
    pub fn create_realm(&self, options: RealmOptions) -> JsResult<RealmId> {
        let id = self.next_realm_id();
        let intrinsics = self.create_intrinsics(id)?;
        let global_kind = if options.immutable_global_prototype {
            ObjectKind::ImmutablePrototype
        } else {
            ObjectKind::Ordinary
        };
        let global_object = self.object_create(Some(intrinsics.object_prototype), global_kind);
        let global_env = self.new_global_environment(global_object, global_object);
        self.add_realm(Rc::new(Realm {
            id,
            intrinsics,
            global_object,
            global_env,
            options,
            template_map: RefCell::new(FxHashMap::default()),
        }));

        let bootstrap = ExecutionContext {
            lexical_environment: global_env,
            variable_environment: global_env,
            function: None,
            realm: id,
            script_or_module: None,
            strict: true,
            coroutine: None,
            caller_position: Default::default(),
        };
        self.with_context(bootstrap, || {
            self.install_builtins()?;
            self.set_default_global_bindings()
        })?;
        tracing::debug!(
            target: "ecmavm::realm",
            realm = id.index(),
            objects = self.object_count(),
            globals = ?options.globals,
            "realm initialized"
        );
        Ok(id)
    }

    /// CreateIntrinsics: allocate every intrinsic object with its prototype
    /// and internal slots. Properties are installed afterwards.
    fn create_intrinsics(&self, realm: RealmId) -> JsResult<Intrinsics> {
        let object_prototype = self.object_create(None, ObjectKind::ImmutablePrototype);
        let ordinary = |proto: ObjectId| self.object_create(Some(proto), ObjectKind::Ordinary);
        let function_prototype = self.alloc_builtin(
            builtins::function::function_prototype_call,
            false,
            Some(object_prototype),
            realm,
            Captures::None,
        );
        let constructor = |behavior: NativeFn, proto: ObjectId| {
            self.alloc_builtin(behavior, true, Some(proto), realm, Captures::None)
        };
        let ctor = |behavior: NativeFn| constructor(behavior, function_prototype);

        let iterator_prototype = ordinary(object_prototype);
        let async_iterator_prototype = ordinary(object_prototype);
        let error_prototype = ordinary(object_prototype);
        let error_constructor = ctor(builtins::error::error_constructor);
        let native_error = |behavior: NativeFn| {
            (ordinary(error_prototype), constructor(behavior, error_constructor))
        };
        let (type_error_prototype, type_error_constructor) =
            native_error(builtins::error::type_error_constructor);
        let (range_error_prototype, range_error_constructor) =
            native_error(builtins::error::range_error_constructor);
        let (reference_error_prototype, reference_error_constructor) =
            native_error(builtins::error::reference_error_constructor);
        let (syntax_error_prototype, syntax_error_constructor) =
            native_error(builtins::error::syntax_error_constructor);
        let (eval_error_prototype, eval_error_constructor) =
            native_error(builtins::error::eval_error_constructor);
        let (uri_error_prototype, uri_error_constructor) =
            native_error(builtins::error::uri_error_constructor);
        let (aggregate_error_prototype, aggregate_error_constructor) =
            native_error(builtins::error::aggregate_error_constructor);

        let function_constructor = ctor(builtins::function::function_constructor);
        let generator_function_prototype = ordinary(function_prototype);
        let async_function_prototype = ordinary(function_prototype);
        let async_generator_function_prototype = ordinary(function_prototype);

        let array_buffer_prototype = ordinary(object_prototype);
        let typed_array_prototype = ordinary(object_prototype);
        let typed_array_constructor = ctor(builtins::typed_array::typed_array_constructor);
        let typed_array_prototypes =
            PerElementType::try_from_fn(|_| JsResult::Ok(ordinary(typed_array_prototype)))?;
        let typed_array_constructors = PerElementType::try_from_fn(|ty: ElementType| {
            JsResult::Ok(self.alloc_builtin(
                builtins::typed_array::typed_array_element_constructor,
                true,
                Some(typed_array_constructor),
                realm,
                Captures::ElementType(ty),
            ))
        })?;

        let throw_type_error = self.alloc_builtin(
            builtins::function::throw_type_error,
            false,
            Some(function_prototype),
            realm,
            Captures::None,
        );

        Ok(Intrinsics {
            object_prototype,
            object_constructor: ctor(builtins::object::object_constructor),
            function_prototype,
            function_constructor,
            throw_type_error,

            array_prototype: self.object_create(Some(object_prototype), ObjectKind::Array),
            array_constructor: ctor(builtins::array::array_constructor),
            array_prototype_values: self.alloc_builtin(
                builtins::array::array_values,
                false,
                Some(function_prototype),
                realm,
                Captures::None,
            ),
            array_iterator_prototype: ordinary(iterator_prototype),
            string_prototype: self.object_create(
                Some(object_prototype),
                ObjectKind::String(JsString::default()),
            ),
            string_constructor: ctor(builtins::string::string_constructor),
            string_iterator_prototype: ordinary(iterator_prototype),
            number_prototype: self.object_create(Some(object_prototype), ObjectKind::Number(0.0)),
            number_constructor: ctor(builtins::number::number_constructor),
            boolean_prototype: self.object_create(Some(object_prototype), ObjectKind::Boolean(false)),
            boolean_constructor: ctor(builtins::boolean::boolean_constructor),
            symbol_prototype: ordinary(object_prototype),
            symbol_constructor: ctor(builtins::symbol::symbol_constructor),

            error_prototype,
            error_constructor,
            type_error_prototype,
            type_error_constructor,
            range_error_prototype,
            range_error_constructor,
            reference_error_prototype,
            reference_error_constructor,
            syntax_error_prototype,
            syntax_error_constructor,
            eval_error_prototype,
            eval_error_constructor,
            uri_error_prototype,
            uri_error_constructor,
            aggregate_error_prototype,
            aggregate_error_constructor,

            promise_prototype: ordinary(object_prototype),
            promise_constructor: ctor(builtins::promise::promise_constructor),
            proxy_constructor: ctor(builtins::proxy::proxy_constructor),
            reflect: ordinary(object_prototype),

            iterator_prototype,
            async_iterator_prototype,
            async_from_sync_iterator_prototype: ordinary(async_iterator_prototype),
            generator_function: constructor(builtins::function::function_constructor, function_constructor),
            generator_function_prototype,
            generator_prototype: ordinary(iterator_prototype),
            async_function: constructor(builtins::function::function_constructor, function_constructor),
            async_function_prototype,
            async_generator_function: constructor(
                builtins::function::function_constructor,
                function_constructor,
            ),
            async_generator_function_prototype,
            async_generator_prototype: ordinary(async_iterator_prototype),

            array_buffer_prototype,
            array_buffer_constructor: ctor(builtins::array_buffer::array_buffer_constructor),
            typed_array_prototype,
            typed_array_constructor,
            typed_array_prototypes,
            typed_array_constructors,
            data_view_prototype: ordinary(object_prototype),
            data_view_constructor: ctor(builtins::data_view::data_view_constructor),

            json: ordinary(object_prototype),
            math: ordinary(object_prototype),
        })
    }

    /// SetDefaultGlobalBindings for the current realm.
    fn set_default_global_bindings(&self) -> JsResult<()> {
        let realm = self.current_realm()?;
        let global = realm.global_object;
        self.register_value(global, "globalThis", Value::Object(global))?;
        self.register_constant(global, "undefined", Value::Undefined)?;
        self.register_constant(global, "NaN", Value::Number(f64::NAN))?;
        self.register_constant(global, "Infinity", Value::Number(f64::INFINITY))?;
        if realm.options.globals == GlobalObjectVariant::Bare {
            return Ok(());
        }

        let i = &realm.intrinsics;
        let named = [
            ("Object", i.object_constructor),
            ("Function", i.function_constructor),
            ("Array", i.array_constructor),
            ("String", i.string_constructor),
            ("Number", i.number_constructor),
            ("Boolean", i.boolean_constructor),
            ("Symbol", i.symbol_constructor),
            ("Error", i.error_constructor),
            ("TypeError", i.type_error_constructor),
            ("RangeError", i.range_error_constructor),
            ("ReferenceError", i.reference_error_constructor),
            ("SyntaxError", i.syntax_error_constructor),
            ("EvalError", i.eval_error_constructor),
            ("URIError", i.uri_error_constructor),
            ("AggregateError", i.aggregate_error_constructor),
            ("Promise", i.promise_constructor),
            ("Proxy", i.proxy_constructor),
            ("Reflect", i.reflect),
            ("ArrayBuffer", i.array_buffer_constructor),
            ("DataView", i.data_view_constructor),
            ("JSON", i.json),
            ("Math", i.math),
        ];
        for (name, value) in named {
            self.register_value(global, name, Value::Object(value))?;
        }
        for ty in ElementType::ALL {
            self.insert_property(
                global,
                self.key(ty.constructor_name()),
                Property::hidden(Value::Object(i.typed_array_constructors.get(ty))),
            )?;
        }
        builtins::global::init_global_functions(self, global)
    }

    /// The global object of a realm.
    pub fn global_object_of(&self, realm: RealmId) -> JsResult<ObjectId> {
        Ok(self.realm(realm)?.global_object)
    }

    /// GetTemplateObject's cache lookup for the current realm.
    pub(crate) fn cached_template(&self, site: &Rc<TemplateLiteral>) -> JsResult<Option<ObjectId>> {
        let realm = self.current_realm()?;
        let key = Rc::as_ptr(site) as usize;
        let cached = realm.template_map.borrow().get(&key).map(|(_, obj)| *obj);
        Ok(cached)
    }

    pub(crate) fn cache_template(&self, site: &Rc<TemplateLiteral>, obj: ObjectId) -> JsResult<()> {
        let realm = self.current_realm()?;
        let key = Rc::as_ptr(site) as usize;
        realm
            .template_map
            .borrow_mut()
            .insert(key, (site.cheap_clone(), obj));
        Ok(())
    }
}
