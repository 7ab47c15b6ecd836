//! ECMAScript function objects
//!
//! Creation (OrdinaryFunctionCreate and the per-kind instantiation
//! routines), [[Call]]/[[Construct]] dispatch over every callable kind, and
//! the declaration-instantiation algorithms run on entry to a function,
//! script or block.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::{self, BlockScope, FunctionBody, FunctionForm, FunctionKind, Program};
use crate::error::{JsError, JsResult};
use crate::interpreter::coroutine::{
    AsyncGeneratorData, AsyncGeneratorState, CoroutineKind, GeneratorData, GeneratorState,
};
use crate::interpreter::object::{ObjectKind, PropertyDescriptor};
use crate::interpreter::realm::RealmId;
use crate::interpreter::{EnvId, ExecutionContext, Interpreter, ObjectId, ScriptOrModule};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// [[ThisMode]]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisMode {
    Lexical,
    Strict,
    Global,
}

/// [[ConstructorKind]]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorKind {
    Base,
    Derived,
}

/// A public instance field recorded on a class constructor.
#[derive(Debug, Clone)]
pub struct ClassFieldDefinition {
    pub name: PropertyKey,
    pub initializer: Option<ObjectId>,
}

/// Internal slots of an ECMAScript function object.
pub struct ScriptFunction {
    pub code: Rc<ast::Function>,
    pub environment: EnvId,
    pub realm: RealmId,
    pub script_or_module: Option<ScriptOrModule>,
    pub this_mode: ThisMode,
    pub home_object: Option<ObjectId>,
    /// `Some` when the function has a [[Construct]] method.
    pub constructor_kind: Option<ConstructorKind>,
    pub fields: Vec<ClassFieldDefinition>,
    pub is_class_constructor: bool,
    /// Field name an initializer names anonymous functions after.
    pub field_name: Option<PropertyKey>,
}

/// A coroutine body: function declaration instantiation and evaluation of
/// the function body, suspended at every `yield` and `await`.
pub(crate) type BodyFuture = Pin<Box<dyn Future<Output = JsResult<Value>>>>;

struct CallParts {
    code: Rc<ast::Function>,
    is_class_constructor: bool,
    constructor_kind: Option<ConstructorKind>,
}

enum Callee {
    Script,
    Builtin,
    Bound,
    Proxy,
    NotCallable,
}

impl Interpreter {
    // ============ CREATION ============

    /// OrdinaryFunctionCreate(functionPrototype, sourceText, ParameterList,
    /// Body, thisMode, env)
    pub(crate) fn ordinary_function_create(
        &self,
        prototype: ObjectId,
        code: &Rc<ast::Function>,
        environment: EnvId,
        home_object: Option<ObjectId>,
    ) -> JsResult<ObjectId> {
        let this_mode = if code.form.is_arrow() {
            ThisMode::Lexical
        } else if code.strict {
            ThisMode::Strict
        } else {
            ThisMode::Global
        };
        let f = self.object_create(
            Some(prototype),
            ObjectKind::Function(Box::new(ScriptFunction {
                code: code.cheap_clone(),
                environment,
                realm: self.current_realm_id(),
                script_or_module: self.active_script_or_module(),
                this_mode,
                home_object,
                constructor_kind: None,
                fields: Vec::new(),
                is_class_constructor: false,
                field_name: None,
            })),
        );
        self.set_function_length(f, code.expected_argument_count())?;
        Ok(f)
    }

    /// SetFunctionLength(F, length)
    pub(crate) fn set_function_length(&self, f: ObjectId, length: usize) -> JsResult<()> {
        self.define_property_or_throw(
            f,
            &self.key("length"),
            PropertyDescriptor::data(Value::Number(length as f64), false, false, true),
        )
    }

    /// SetFunctionName(F, name, prefix)
    pub(crate) fn set_function_name(
        &self,
        f: ObjectId,
        name: &PropertyKey,
        prefix: Option<&str>,
    ) -> JsResult<()> {
        let name = name.to_function_name();
        let name = match prefix {
            Some(prefix) => JsString::from(format!("{} {}", prefix, name)),
            None => name,
        };
        self.define_property_or_throw(
            f,
            &self.key("name"),
            PropertyDescriptor::data(Value::String(name), false, false, true),
        )
    }

    /// MakeConstructor(F, writablePrototype, prototype)
    pub(crate) fn make_constructor(
        &self,
        f: ObjectId,
        writable_prototype: bool,
        prototype: Option<ObjectId>,
    ) -> JsResult<()> {
        self.object_mut(f, |d| {
            if let ObjectKind::Function(func) = &mut d.kind {
                func.constructor_kind = Some(ConstructorKind::Base);
            }
        })?;
        let prototype = match prototype {
            Some(proto) => proto,
            None => {
                let proto = self.ordinary_object()?;
                self.define_property_or_throw(
                    proto,
                    &self.key("constructor"),
                    PropertyDescriptor::data(Value::Object(f), writable_prototype, false, true),
                )?;
                proto
            }
        };
        self.define_property_or_throw(
            f,
            &self.key("prototype"),
            PropertyDescriptor::data(Value::Object(prototype), writable_prototype, false, false),
        )
    }

    /// MakeClassConstructor(F) plus [[ConstructorKind]].
    pub(crate) fn make_class_constructor(&self, f: ObjectId, derived: bool) -> JsResult<()> {
        self.object_mut(f, |d| {
            if let ObjectKind::Function(func) = &mut d.kind {
                func.is_class_constructor = true;
                func.constructor_kind = Some(if derived {
                    ConstructorKind::Derived
                } else {
                    ConstructorKind::Base
                });
            }
        })
    }

    /// Instantiate a function, generator, async or async generator
    /// definition: the matching %…Function.prototype% as prototype, a
    /// `prototype` property where the kind has one, and a name.
    pub(crate) fn instantiate_function(
        &self,
        code: &Rc<ast::Function>,
        env: EnvId,
        name: Option<&PropertyKey>,
        home_object: Option<ObjectId>,
    ) -> JsResult<ObjectId> {
        let intrinsics = self.current_realm()?.intrinsics;
        let proto = match code.kind {
            FunctionKind::Normal => intrinsics.function_prototype,
            FunctionKind::Generator => intrinsics.generator_function_prototype,
            FunctionKind::Async => intrinsics.async_function_prototype,
            FunctionKind::AsyncGenerator => intrinsics.async_generator_function_prototype,
        };
        let f = self.ordinary_function_create(proto, code, env, home_object)?;
        if let Some(name) = name {
            let prefix = match code.form {
                FunctionForm::Getter => Some("get"),
                FunctionForm::Setter => Some("set"),
                _ => None,
            };
            self.set_function_name(f, name, prefix)?;
        }
        match code.kind {
            FunctionKind::Normal
                if matches!(code.form, FunctionForm::Declaration | FunctionForm::Expression) =>
            {
                self.make_constructor(f, true, None)?;
            }
            FunctionKind::Generator | FunctionKind::AsyncGenerator => {
                let instance_proto = if code.kind == FunctionKind::Generator {
                    intrinsics.generator_prototype
                } else {
                    intrinsics.async_generator_prototype
                };
                let prototype = self.object_create(Some(instance_proto), ObjectKind::Ordinary);
                self.define_property_or_throw(
                    f,
                    &self.key("prototype"),
                    PropertyDescriptor::data(Value::Object(prototype), true, false, false),
                )?;
            }
            _ => {}
        }
        Ok(f)
    }

    /// InstantiateFunctionObject for a hoisted declaration.
    pub(crate) fn instantiate_function_object(
        &self,
        code: &Rc<ast::Function>,
        env: EnvId,
    ) -> JsResult<ObjectId> {
        let name = code
            .id
            .as_ref()
            .map_or_else(|| self.key("default"), |id| PropertyKey::from(id.name.cheap_clone()));
        self.instantiate_function(code, env, Some(&name), None)
    }

    /// [[HomeObject]] of an ECMAScript function object.
    pub(crate) fn function_home_object(&self, f: ObjectId) -> JsResult<Option<ObjectId>> {
        self.object(f, |d| match &d.kind {
            ObjectKind::Function(func) => func.home_object,
            _ => None,
        })
    }

    /// The declaration name of a function's binding, or `*default*`.
    pub(crate) fn declared_function_name(code: &ast::Function) -> JsString {
        code.id
            .as_ref()
            .map(|id| id.name.cheap_clone())
            .unwrap_or_else(|| JsString::from(ast::DEFAULT_EXPORT_BINDING))
    }

    fn call_parts(&self, f: ObjectId) -> JsResult<CallParts> {
        self.object(f, |d| match &d.kind {
            ObjectKind::Function(func) => Ok(CallParts {
                code: func.code.cheap_clone(),
                is_class_constructor: func.is_class_constructor,
                constructor_kind: func.constructor_kind,
            }),
            _ => Err(JsError::internal("not an ECMAScript function object")),
        })?
    }

    // ============ CALL AND CONSTRUCT ============

    /// Call(F, V, argumentsList)
    pub fn call(&self, f: &Value, this: &Value, args: &[Value]) -> JsResult<Value> {
        Self::grow_stack(|| self.call_inner(f, this, args))
    }

    fn call_inner(&self, f: &Value, this: &Value, args: &[Value]) -> JsResult<Value> {
        let callee = match f {
            Value::Object(obj) => self.object(*obj, |d| match &d.kind {
                ObjectKind::Function(_) => Callee::Script,
                ObjectKind::Builtin(_) => Callee::Builtin,
                ObjectKind::BoundFunction(_) => Callee::Bound,
                ObjectKind::Proxy(p) if p.callable => Callee::Proxy,
                _ => Callee::NotCallable,
            })?,
            _ => Callee::NotCallable,
        };
        match (callee, f) {
            (Callee::Script, Value::Object(obj)) => self.call_script_function(*obj, this, args),
            (Callee::Builtin, Value::Object(obj)) => self.call_builtin(*obj, this, args),
            (Callee::Bound, Value::Object(obj)) => self.call_bound_function(*obj, args),
            (Callee::Proxy, Value::Object(obj)) => self.call_proxy(*obj, this, args),
            _ => Err(JsError::type_error(format!("{} is not a function", self.display(f)))),
        }
    }

    /// Construct(F, argumentsList, newTarget)
    pub fn construct(
        &self,
        f: ObjectId,
        args: &[Value],
        new_target: Option<ObjectId>,
    ) -> JsResult<ObjectId> {
        Self::grow_stack(|| self.construct_inner(f, args, new_target))
    }

    fn construct_inner(
        &self,
        f: ObjectId,
        args: &[Value],
        new_target: Option<ObjectId>,
    ) -> JsResult<ObjectId> {
        let new_target = new_target.unwrap_or(f);
        let callee = self.object(f, |d| match &d.kind {
            ObjectKind::Function(func) if func.constructor_kind.is_some() => Callee::Script,
            ObjectKind::Builtin(b) if b.constructor => Callee::Builtin,
            ObjectKind::BoundFunction(b) if b.constructor => Callee::Bound,
            ObjectKind::Proxy(p) if p.constructor => Callee::Proxy,
            _ => Callee::NotCallable,
        })?;
        match callee {
            Callee::Script => self.construct_script_function(f, args, new_target),
            Callee::Builtin => self.construct_builtin(f, args, new_target),
            Callee::Bound => self.construct_bound_function(f, args, new_target),
            Callee::Proxy => self.construct_proxy(f, args, new_target),
            Callee::NotCallable => Err(JsError::type_error(format!(
                "{} is not a constructor",
                self.display(&Value::Object(f))
            ))),
        }
    }

    /// PrepareForOrdinaryCall(F, newTarget): push the callee context and
    /// return its function environment.
    fn prepare_for_ordinary_call(&self, f: ObjectId, new_target: Option<ObjectId>) -> JsResult<EnvId> {
        let (outer, lexical_this, realm, script_or_module, strict) = self.object(f, |d| match &d.kind {
            ObjectKind::Function(func) => Ok((
                func.environment,
                func.this_mode == ThisMode::Lexical,
                func.realm,
                func.script_or_module.clone(),
                func.code.strict,
            )),
            _ => Err(JsError::internal("not an ECMAScript function object")),
        })??;
        let env = self.new_function_environment(f, lexical_this, new_target, Some(outer));
        self.push_context(ExecutionContext {
            lexical_environment: env,
            variable_environment: env,
            function: Some(f),
            realm,
            script_or_module,
            strict,
            coroutine: None,
            caller_position: Default::default(),
        })?;
        Ok(env)
    }

    /// OrdinaryCallBindThis(F, calleeContext, thisArgument)
    fn ordinary_call_bind_this(&self, f: ObjectId, env: EnvId, this: &Value) -> JsResult<()> {
        let (this_mode, realm) = self.object(f, |d| match &d.kind {
            ObjectKind::Function(func) => Some((func.this_mode, func.realm)),
            _ => None,
        })?
        .ok_or_else(|| JsError::internal("not an ECMAScript function object"))?;
        let this_value = match this_mode {
            ThisMode::Lexical => return Ok(()),
            ThisMode::Strict => this.cheap_clone(),
            ThisMode::Global if this.is_nullish() => {
                Value::Object(self.realm(realm)?.global_object)
            }
            ThisMode::Global => Value::Object(self.to_object(this)?),
        };
        self.bind_this_value(env, this_value)
    }

    /// [[Call]] of an ECMAScript function object
    fn call_script_function(&self, f: ObjectId, this: &Value, args: &[Value]) -> JsResult<Value> {
        let parts = self.call_parts(f)?;
        if parts.is_class_constructor {
            let name = self.function_display_name(f).unwrap_or_default();
            return Err(JsError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                name
            )));
        }
        let env = self.prepare_for_ordinary_call(f, None)?;
        let result = self
            .ordinary_call_bind_this(f, env, this)
            .and_then(|()| self.ordinary_call_evaluate_body(f, &parts.code, args));
        self.pop_context()?;
        result
    }

    /// [[Construct]] of an ECMAScript function object
    fn construct_script_function(
        &self,
        f: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> JsResult<ObjectId> {
        let parts = self.call_parts(f)?;
        let base = parts.constructor_kind != Some(ConstructorKind::Derived);
        let this_argument = if base {
            Some(self.ordinary_create_from_constructor(
                Some(new_target),
                |i| i.object_prototype,
                ObjectKind::Ordinary,
            )?)
        } else {
            None
        };
        let env = self.prepare_for_ordinary_call(f, Some(new_target))?;
        let result = self.construct_in_context(f, &parts.code, env, this_argument, args, new_target);
        self.pop_context()?;
        result
    }

    fn construct_in_context(
        &self,
        f: ObjectId,
        code: &Rc<ast::Function>,
        env: EnvId,
        this_argument: Option<ObjectId>,
        args: &[Value],
        new_target: ObjectId,
    ) -> JsResult<ObjectId> {
        if let Some(this_argument) = this_argument {
            self.ordinary_call_bind_this(f, env, &Value::Object(this_argument))?;
            self.initialize_instance_elements(this_argument, f)?;
        }
        let result = match code.form {
            FunctionForm::ClassConstructor {
                derived: true,
                synthesized: true,
            } => {
                self.default_derived_construct(f, env, args, new_target)?;
                Value::Undefined
            }
            _ => self.ordinary_call_evaluate_body(f, code, args)?,
        };
        match (result, this_argument) {
            (Value::Object(obj), _) => return Ok(obj),
            (_, Some(this_argument)) => return Ok(this_argument),
            (Value::Undefined, None) => {}
            (_, None) => {
                return Err(JsError::type_error(
                    "Derived constructors may only return object or undefined",
                ))
            }
        }
        match self.get_this_binding(env)? {
            Value::Object(obj) => Ok(obj),
            _ => Err(JsError::internal("derived constructor bound a primitive this")),
        }
    }

    /// The implicit `constructor(...args) { super(...args); }` of a derived
    /// class, which forwards the arguments without iterating them.
    fn default_derived_construct(
        &self,
        f: ObjectId,
        env: EnvId,
        args: &[Value],
        new_target: ObjectId,
    ) -> JsResult<()> {
        let parent = self.get_prototype_of(f)?;
        let parent = match parent {
            Some(parent) if self.is_constructor(&Value::Object(parent)) => parent,
            _ => return Err(JsError::type_error("Super constructor is not a constructor")),
        };
        let result = self.construct(parent, args, Some(new_target))?;
        self.bind_this_value(env, Value::Object(result))?;
        self.initialize_instance_elements(result, f)
    }

    /// InitializeInstanceElements(O, constructor)
    pub(crate) fn initialize_instance_elements(&self, obj: ObjectId, ctor: ObjectId) -> JsResult<()> {
        let fields = self.object(ctor, |d| match &d.kind {
            ObjectKind::Function(func) => func.fields.clone(),
            _ => Vec::new(),
        })?;
        for field in fields {
            let value = match field.initializer {
                Some(init) => self.call(&Value::Object(init), &Value::Object(obj), &[])?,
                None => Value::Undefined,
            };
            self.create_data_property_or_throw(obj, field.name, value)?;
        }
        Ok(())
    }

    /// OrdinaryCallEvaluateBody(F, argumentsList): run the body for the
    /// four function kinds. Generators and async functions return their
    /// generator object or promise.
    fn ordinary_call_evaluate_body(
        &self,
        f: ObjectId,
        code: &Rc<ast::Function>,
        args: &[Value],
    ) -> JsResult<Value> {
        match code.kind {
            FunctionKind::Normal => self.run_sync(async {
                self.function_declaration_instantiation(f, code, args).await?;
                self.evaluate_body(f, code).await
            }),
            FunctionKind::Generator => {
                self.run_sync(self.function_declaration_instantiation(f, code, args))?;
                let proto = self.get_prototype_from_constructor(f, |i| i.generator_prototype)?;
                let generator = self.object_create(
                    Some(proto),
                    ObjectKind::Generator(Box::new(GeneratorData {
                        state: GeneratorState::SuspendedStart,
                        coroutine: None,
                    })),
                );
                let body = self.coroutine_body(f, code, None)?;
                let coroutine = self.create_coroutine(body, CoroutineKind::Generator)?;
                self.object_mut(generator, |d| {
                    if let ObjectKind::Generator(g) = &mut d.kind {
                        g.coroutine = Some(coroutine);
                    }
                })?;
                Ok(Value::Object(generator))
            }
            FunctionKind::Async => {
                let promise_ctor = self.intrinsic(|i| i.promise_constructor)?;
                let capability = self.new_promise_capability(&Value::Object(promise_ctor))?;
                let body = self.coroutine_body(f, code, Some(args.to_vec()))?;
                let coroutine =
                    self.create_coroutine(body, CoroutineKind::AsyncFunction(capability.clone()))?;
                self.async_function_start(&coroutine)?;
                Ok(Value::Object(capability.promise))
            }
            FunctionKind::AsyncGenerator => {
                self.run_sync(self.function_declaration_instantiation(f, code, args))?;
                let proto = self.get_prototype_from_constructor(f, |i| i.async_generator_prototype)?;
                let generator = self.object_create(
                    Some(proto),
                    ObjectKind::AsyncGenerator(Box::new(AsyncGeneratorData {
                        state: AsyncGeneratorState::SuspendedStart,
                        queue: Default::default(),
                        coroutine: None,
                    })),
                );
                let body = self.coroutine_body(f, code, None)?;
                let coroutine = self.create_coroutine(body, CoroutineKind::AsyncGenerator(generator))?;
                self.object_mut(generator, |d| {
                    if let ObjectKind::AsyncGenerator(g) = &mut d.kind {
                        g.coroutine = Some(coroutine);
                    }
                })?;
                Ok(Value::Object(generator))
            }
        }
    }

    /// The owned future a generator or async function runs. With `args`,
    /// declaration instantiation runs inside the coroutine so its errors
    /// reject the async function's promise.
    fn coroutine_body(
        &self,
        f: ObjectId,
        code: &Rc<ast::Function>,
        args: Option<Vec<Value>>,
    ) -> JsResult<BodyFuture> {
        let interp = self.rc()?;
        let code = code.cheap_clone();
        Ok(Box::pin(async move {
            if let Some(args) = args {
                interp.function_declaration_instantiation(f, &code, &args).await?;
            }
            match interp.evaluate_body(f, &code).await {
                Err(JsError::GeneratorReturn(value)) => Ok(value),
                other => other,
            }
        }))
    }

    /// Evaluate a function body: the returned value, or `undefined`.
    async fn evaluate_body(&self, f: ObjectId, code: &ast::Function) -> JsResult<Value> {
        match &code.body {
            FunctionBody::Block(statements) => {
                let completion = self.evaluate_statement_list(statements).await?;
                match completion {
                    crate::interpreter::Completion::Return(value) => Ok(value),
                    _ => Ok(Value::Undefined),
                }
            }
            FunctionBody::Expression(expression) => {
                let field_name = self.object(f, |d| match &d.kind {
                    ObjectKind::Function(func) => func.field_name.clone(),
                    _ => None,
                })?;
                match field_name {
                    Some(name) if expression.is_anonymous_function_definition() => {
                        self.named_evaluation(expression, &name).await
                    }
                    _ => self.evaluate_expression(expression).await,
                }
            }
        }
    }

    // ============ DECLARATION INSTANTIATION ============

    /// FunctionDeclarationInstantiation(func, argumentsList)
    pub(crate) async fn function_declaration_instantiation(
        &self,
        func: ObjectId,
        code: &ast::Function,
        args: &[Value],
    ) -> JsResult<()> {
        let scope = &code.scope;
        let strict = code.strict;
        let callee_env = self.lexical_environment()?;

        let env = if strict || !scope.has_parameter_expressions {
            callee_env
        } else {
            let env = self.new_declarative_environment(Some(callee_env));
            self.set_lexical_environment(env)?;
            env
        };

        for name in &scope.parameter_names {
            if !self.has_binding(env, name)? {
                self.create_mutable_binding(env, name, false)?;
                if scope.has_duplicates {
                    self.initialize_binding(env, name, Value::Undefined)?;
                }
            }
        }

        let mut parameter_bindings: Vec<JsString> = scope.parameter_names.clone();
        if scope.arguments_needed {
            let arguments = if strict || !scope.simple_parameter_list {
                self.create_unmapped_arguments_object(args)?
            } else {
                self.create_mapped_arguments_object(func, &scope.parameter_names, args, env)?
            };
            let name = self.intern("arguments");
            if strict {
                self.create_immutable_binding(env, &name, false)?;
            } else {
                self.create_mutable_binding(env, &name, false)?;
            }
            self.initialize_binding(env, &name, Value::Object(arguments))?;
            parameter_bindings.push(name);
        }

        let binding_env = if scope.has_duplicates { None } else { Some(env) };
        self.bind_parameters(&code.params, args, binding_env).await?;

        let function_names: FxHashSet<JsString> = scope
            .body
            .functions
            .iter()
            .map(|f| Self::declared_function_name(f))
            .collect();
        let mut instantiated: FxHashSet<JsString> = parameter_bindings.iter().cloned().collect();

        let var_env = if !scope.has_parameter_expressions {
            for name in &scope.body.var_names {
                if instantiated.insert(name.cheap_clone()) {
                    self.create_mutable_binding(env, name, false)?;
                    self.initialize_binding(env, name, Value::Undefined)?;
                }
            }
            env
        } else {
            let var_env = self.new_declarative_environment(Some(env));
            self.set_variable_environment(var_env)?;
            for name in &scope.body.var_names {
                if instantiated.insert(name.cheap_clone()) {
                    self.create_mutable_binding(var_env, name, false)?;
                    let initial = if !parameter_bindings.contains(name) || function_names.contains(name) {
                        Value::Undefined
                    } else {
                        self.get_binding_value(env, name, false)?
                    };
                    self.initialize_binding(var_env, name, initial)?;
                }
            }
            var_env
        };

        let lex_env = if strict {
            var_env
        } else {
            self.new_declarative_environment(Some(var_env))
        };
        self.set_lexical_environment(lex_env)?;

        for binding in &scope.body.lexical {
            if binding.constant {
                self.create_immutable_binding(lex_env, &binding.name, true)?;
            } else {
                self.create_mutable_binding(lex_env, &binding.name, false)?;
            }
        }

        for function in &scope.body.functions {
            let fo = self.instantiate_function_object(function, lex_env)?;
            let name = Self::declared_function_name(function);
            self.set_mutable_binding(var_env, &name, Value::Object(fo), false)?;
        }
        Ok(())
    }

    /// GlobalDeclarationInstantiation(script, env)
    pub(crate) fn global_declaration_instantiation(&self, script: &Program, env: EnvId) -> JsResult<()> {
        let scope = &script.scope;
        for binding in &scope.lexical {
            let name = &binding.name;
            if self.has_var_declaration(env, name)? || self.has_lexical_declaration(env, name)? {
                return Err(JsError::runtime_syntax_error(format!(
                    "Identifier '{}' has already been declared",
                    name
                )));
            }
            if self.has_restricted_global_property(env, name)? {
                return Err(JsError::runtime_syntax_error(format!(
                    "Cannot redefine restricted global '{}'",
                    name
                )));
            }
        }
        for name in &scope.var_names {
            if self.has_lexical_declaration(env, name)? {
                return Err(JsError::runtime_syntax_error(format!(
                    "Identifier '{}' has already been declared",
                    name
                )));
            }
        }

        let mut declared_function_names: Vec<JsString> = Vec::new();
        for function in scope.functions.iter().rev() {
            let name = Self::declared_function_name(function);
            if !declared_function_names.contains(&name) {
                if !self.can_declare_global_function(env, &name)? {
                    return Err(JsError::type_error(format!(
                        "Cannot declare global function '{}'",
                        name
                    )));
                }
                declared_function_names.push(name);
            }
        }
        let mut declared_var_names: Vec<JsString> = Vec::new();
        for name in &scope.var_names {
            if declared_function_names.contains(name) || declared_var_names.contains(name) {
                continue;
            }
            if !self.can_declare_global_var(env, name)? {
                return Err(JsError::type_error(format!("Cannot declare global variable '{}'", name)));
            }
            declared_var_names.push(name.cheap_clone());
        }

        for binding in &scope.lexical {
            if binding.constant {
                self.create_immutable_binding(env, &binding.name, true)?;
            } else {
                self.create_mutable_binding(env, &binding.name, false)?;
            }
        }
        for function in &scope.functions {
            let name = Self::declared_function_name(function);
            let fo = self.instantiate_function_object(function, env)?;
            self.create_global_function_binding(env, &name, Value::Object(fo), false)?;
        }
        for name in &declared_var_names {
            self.create_global_var_binding(env, name, false)?;
        }
        Ok(())
    }

    /// BlockDeclarationInstantiation(code, env)
    pub(crate) fn block_declaration_instantiation(&self, scope: &BlockScope, env: EnvId) -> JsResult<()> {
        for binding in &scope.bindings {
            if self.has_binding(env, &binding.name)? {
                continue;
            }
            if binding.constant {
                self.create_immutable_binding(env, &binding.name, true)?;
            } else {
                self.create_mutable_binding(env, &binding.name, false)?;
            }
        }
        for function in &scope.functions {
            let name = Self::declared_function_name(function);
            let fo = self.instantiate_function_object(function, env)?;
            self.initialize_binding(env, &name, Value::Object(fo))?;
        }
        Ok(())
    }

    // ============ INTROSPECTION ============

    /// GetNewTarget()
    pub(crate) fn get_new_target(&self) -> JsResult<Value> {
        let env = self.get_this_environment()?;
        Ok(match self.function_environment_parts(env)? {
            Some((_, Some(new_target))) => Value::Object(new_target),
            _ => Value::Undefined,
        })
    }

    /// The source text of a function for `Function.prototype.toString`.
    pub(crate) fn function_source_text(&self, f: ObjectId) -> JsResult<Option<JsString>> {
        self.object(f, |d| match &d.kind {
            ObjectKind::Function(func) => Some(func.code.source_text.cheap_clone()),
            _ => None,
        })
    }

    /// Attach instance fields to a class constructor.
    pub(crate) fn set_class_fields(&self, ctor: ObjectId, fields: Vec<ClassFieldDefinition>) -> JsResult<()> {
        self.object_mut(ctor, |d| {
            if let ObjectKind::Function(func) = &mut d.kind {
                func.fields = fields;
            }
        })
    }

    /// Record the field a field initializer belongs to.
    pub(crate) fn set_field_name(&self, initializer: ObjectId, name: PropertyKey) -> JsResult<()> {
        self.object_mut(initializer, |d| {
            if let ObjectKind::Function(func) = &mut d.kind {
                func.field_name = Some(name);
            }
        })
    }

    /// Define a method property the way class and object literal
    /// definitions do: non-enumerable for classes.
    pub(crate) fn define_method_property(
        &self,
        home: ObjectId,
        key: PropertyKey,
        closure: ObjectId,
        enumerable: bool,
    ) -> JsResult<()> {
        self.define_property_or_throw(
            home,
            &key,
            PropertyDescriptor::data(Value::Object(closure), true, enumerable, true),
        )
    }
}
