//! Environment records
//!
//! Five record kinds share one arena node type. Declarative, function and
//! module records keep their bindings in a `DeclarativeRecord`; object
//! records forward to a binding object; the global record composes an
//! object record over the global object with a declarative record for
//! lexical globals. Every operation counts one step against the budget.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{JsError, JsResult};
use crate::interpreter::module::ModuleId;
use crate::interpreter::object::PropertyDescriptor;
use crate::interpreter::{EnvId, Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// A node of the environment chain.
pub struct EnvironmentNode {
    pub outer: Option<EnvId>,
    pub record: EnvironmentRecord,
}

pub enum EnvironmentRecord {
    Declarative(DeclarativeRecord),
    Object(ObjectRecord),
    Function(FunctionRecord),
    Global(GlobalRecord),
    Module(ModuleRecord),
}

/// One binding of a declarative record. `value` is `None` until the
/// binding is initialized.
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Option<Value>,
    pub mutable: bool,
    pub strict: bool,
    pub deletable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetFailure {
    Missing,
    Uninitialized,
    Immutable,
}

#[derive(Debug, Default)]
pub struct DeclarativeRecord {
    bindings: FxHashMap<JsString, Binding>,
}

impl DeclarativeRecord {
    pub fn has(&self, name: &JsString) -> bool {
        self.bindings.contains_key(name)
    }

    fn create(&mut self, name: JsString, mutable: bool, strict: bool, deletable: bool) {
        self.bindings.insert(
            name,
            Binding {
                value: None,
                mutable,
                strict,
                deletable,
            },
        );
    }

    fn initialize(&mut self, name: &JsString, value: Value) -> bool {
        match self.bindings.get_mut(name) {
            Some(binding) => {
                binding.value = Some(value);
                true
            }
            None => false,
        }
    }

    /// The binding's value; `Err(true)` when it exists but is uninitialized.
    fn get(&self, name: &JsString) -> Result<Value, bool> {
        match self.bindings.get(name) {
            Some(Binding { value: Some(v), .. }) => Ok(v.cheap_clone()),
            Some(_) => Err(true),
            None => Err(false),
        }
    }

    /// SetMutableBinding without the missing-binding fallback. Returns the
    /// effective strictness alongside a failure.
    fn set(&mut self, name: &JsString, value: Value, strict: bool) -> Result<(), (SetFailure, bool)> {
        let Some(binding) = self.bindings.get_mut(name) else {
            return Err((SetFailure::Missing, strict));
        };
        let strict = strict || binding.strict;
        if binding.value.is_none() {
            return Err((SetFailure::Uninitialized, strict));
        }
        if !binding.mutable {
            return Err((SetFailure::Immutable, strict));
        }
        binding.value = Some(value);
        Ok(())
    }

    fn delete(&mut self, name: &JsString) -> bool {
        match self.bindings.get(name) {
            Some(binding) if !binding.deletable => false,
            _ => {
                self.bindings.remove(name);
                true
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &JsString> {
        self.bindings.keys()
    }
}

pub struct ObjectRecord {
    pub binding_object: ObjectId,
    pub with_environment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisBindingStatus {
    Lexical,
    Initialized,
    Uninitialized,
}

pub struct FunctionRecord {
    pub declarative: DeclarativeRecord,
    pub this_value: Value,
    pub this_status: ThisBindingStatus,
    pub function_object: ObjectId,
    pub new_target: Option<ObjectId>,
}

pub struct GlobalRecord {
    pub object_record: ObjectRecord,
    pub global_this: ObjectId,
    pub declarative: DeclarativeRecord,
    pub var_names: FxHashSet<JsString>,
}

pub struct ModuleRecord {
    pub declarative: DeclarativeRecord,
    /// Import bindings: local name to (module, binding name in that module).
    pub indirect: FxHashMap<JsString, (ModuleId, JsString)>,
}

impl EnvironmentRecord {
    fn declarative(&self) -> Option<&DeclarativeRecord> {
        match self {
            EnvironmentRecord::Declarative(d) => Some(d),
            EnvironmentRecord::Function(f) => Some(&f.declarative),
            EnvironmentRecord::Module(m) => Some(&m.declarative),
            EnvironmentRecord::Object(_) | EnvironmentRecord::Global(_) => None,
        }
    }

    fn declarative_mut(&mut self) -> Option<&mut DeclarativeRecord> {
        match self {
            EnvironmentRecord::Declarative(d) => Some(d),
            EnvironmentRecord::Function(f) => Some(&mut f.declarative),
            EnvironmentRecord::Module(m) => Some(&mut m.declarative),
            EnvironmentRecord::Global(g) => Some(&mut g.declarative),
            EnvironmentRecord::Object(_) => None,
        }
    }
}

/// How a name is looked up in one record.
enum Shape {
    /// Declarative bindings (for the global record: its lexical half).
    Declarative,
    Indirect(ModuleId, JsString),
    Object { object: ObjectId, with_environment: bool },
}

fn stale() -> JsError {
    JsError::internal("stale environment handle")
}

impl Interpreter {
    // ============ ARENA ACCESS ============

    fn env<R>(&self, id: EnvId, f: impl FnOnce(&EnvironmentNode) -> R) -> JsResult<R> {
        self.environments.borrow().get(id).map(f).ok_or_else(stale)
    }

    fn env_mut<R>(&self, id: EnvId, f: impl FnOnce(&mut EnvironmentNode) -> R) -> JsResult<R> {
        self.environments.borrow_mut().get_mut(id).map(f).ok_or_else(stale)
    }

    fn alloc_env(&self, outer: Option<EnvId>, record: EnvironmentRecord) -> EnvId {
        self.environments
            .borrow_mut()
            .insert(EnvironmentNode { outer, record })
    }

    pub(crate) fn outer_environment(&self, env: EnvId) -> JsResult<Option<EnvId>> {
        self.env(env, |node| node.outer)
    }

    fn shape(&self, env: EnvId, name: &JsString) -> JsResult<Shape> {
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Object(o) => Shape::Object {
                object: o.binding_object,
                with_environment: o.with_environment,
            },
            EnvironmentRecord::Global(g) if !g.declarative.has(name) => Shape::Object {
                object: g.object_record.binding_object,
                with_environment: false,
            },
            EnvironmentRecord::Module(m) => match m.indirect.get(name) {
                Some((module, binding)) => Shape::Indirect(*module, binding.cheap_clone()),
                None => Shape::Declarative,
            },
            _ => Shape::Declarative,
        })
    }

    // ============ CONSTRUCTION ============

    /// NewDeclarativeEnvironment(E)
    pub(crate) fn new_declarative_environment(&self, outer: Option<EnvId>) -> EnvId {
        self.alloc_env(outer, EnvironmentRecord::Declarative(DeclarativeRecord::default()))
    }

    /// NewObjectEnvironment(O, W, E)
    pub(crate) fn new_object_environment(
        &self,
        binding_object: ObjectId,
        with_environment: bool,
        outer: Option<EnvId>,
    ) -> EnvId {
        self.alloc_env(
            outer,
            EnvironmentRecord::Object(ObjectRecord {
                binding_object,
                with_environment,
            }),
        )
    }

    /// NewFunctionEnvironment(F, newTarget) given F's [[ThisMode]] and
    /// [[Environment]].
    pub(crate) fn new_function_environment(
        &self,
        function_object: ObjectId,
        lexical_this: bool,
        new_target: Option<ObjectId>,
        outer: Option<EnvId>,
    ) -> EnvId {
        let this_status = if lexical_this {
            ThisBindingStatus::Lexical
        } else {
            ThisBindingStatus::Uninitialized
        };
        self.alloc_env(
            outer,
            EnvironmentRecord::Function(FunctionRecord {
                declarative: DeclarativeRecord::default(),
                this_value: Value::Undefined,
                this_status,
                function_object,
                new_target,
            }),
        )
    }

    /// NewGlobalEnvironment(G, thisValue)
    pub(crate) fn new_global_environment(&self, global: ObjectId, global_this: ObjectId) -> EnvId {
        self.alloc_env(
            None,
            EnvironmentRecord::Global(GlobalRecord {
                object_record: ObjectRecord {
                    binding_object: global,
                    with_environment: false,
                },
                global_this,
                declarative: DeclarativeRecord::default(),
                var_names: FxHashSet::default(),
            }),
        )
    }

    /// NewModuleEnvironment(E)
    pub(crate) fn new_module_environment(&self, outer: EnvId) -> EnvId {
        self.alloc_env(
            Some(outer),
            EnvironmentRecord::Module(ModuleRecord {
                declarative: DeclarativeRecord::default(),
                indirect: FxHashMap::default(),
            }),
        )
    }

    // ============ COMMON RECORD METHODS ============

    /// HasBinding(N)
    pub(crate) fn has_binding(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        self.tick()?;
        match self.shape(env, name)? {
            Shape::Indirect(..) => Ok(true),
            Shape::Declarative => self.env(env, |node| match &node.record {
                EnvironmentRecord::Global(g) => g.declarative.has(name),
                other => other.declarative().is_some_and(|d| d.has(name)),
            }),
            Shape::Object {
                object,
                with_environment,
            } => {
                let key = PropertyKey::from(name.cheap_clone());
                if !self.has_property(object, &key)? {
                    return Ok(false);
                }
                if !with_environment {
                    return Ok(true);
                }
                let unscopables_key = PropertyKey::Symbol(self.well_known().unscopables.cheap_clone());
                if let Value::Object(unscopables) = self.get(object, &unscopables_key)? {
                    if self.get(unscopables, &key)?.to_boolean() {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn global_lexical_clash(&self, env: EnvId, name: &JsString) -> JsResult<()> {
        let clash = self.env(env, |node| match &node.record {
            EnvironmentRecord::Global(g) => g.declarative.has(name),
            _ => false,
        })?;
        if clash {
            return Err(JsError::type_error(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        Ok(())
    }

    /// CreateMutableBinding(N, D)
    pub(crate) fn create_mutable_binding(
        &self,
        env: EnvId,
        name: &JsString,
        deletable: bool,
    ) -> JsResult<()> {
        self.tick()?;
        let object = self.env(env, |node| match &node.record {
            EnvironmentRecord::Object(o) => Some(o.binding_object),
            _ => None,
        })?;
        if let Some(object) = object {
            return self.define_property_or_throw(
                object,
                &PropertyKey::from(name.cheap_clone()),
                PropertyDescriptor::data(Value::Undefined, true, true, deletable),
            );
        }
        self.global_lexical_clash(env, name)?;
        self.env_mut(env, |node| {
            if let Some(d) = node.record.declarative_mut() {
                d.create(name.cheap_clone(), true, false, deletable);
            }
        })
    }

    /// CreateImmutableBinding(N, S)
    pub(crate) fn create_immutable_binding(
        &self,
        env: EnvId,
        name: &JsString,
        strict: bool,
    ) -> JsResult<()> {
        self.tick()?;
        self.global_lexical_clash(env, name)?;
        self.env_mut(env, |node| match node.record.declarative_mut() {
            Some(d) => {
                d.create(name.cheap_clone(), false, strict, false);
                Ok(())
            }
            None => Err(JsError::internal("immutable binding in an object environment")),
        })?
    }

    /// InitializeBinding(N, V)
    pub(crate) fn initialize_binding(&self, env: EnvId, name: &JsString, value: Value) -> JsResult<()> {
        self.tick()?;
        match self.shape(env, name)? {
            Shape::Object { .. } => self.set_mutable_binding(env, name, value, false),
            Shape::Indirect(..) => Err(JsError::internal("import bindings are initialized at link time")),
            Shape::Declarative => {
                let done = self.env_mut(env, |node| {
                    node.record
                        .declarative_mut()
                        .is_some_and(|d| d.initialize(name, value))
                })?;
                if !done {
                    return Err(JsError::internal(format!("no binding '{}' to initialize", name)));
                }
                Ok(())
            }
        }
    }

    /// SetMutableBinding(N, V, S)
    pub(crate) fn set_mutable_binding(
        &self,
        env: EnvId,
        name: &JsString,
        value: Value,
        strict: bool,
    ) -> JsResult<()> {
        self.tick()?;
        match self.shape(env, name)? {
            Shape::Object { object, .. } => {
                let key = PropertyKey::from(name.cheap_clone());
                if !self.has_property(object, &key)? && strict {
                    return Err(JsError::not_defined(name));
                }
                self.set(object, &key, value, strict)
            }
            Shape::Indirect(..) => Err(JsError::type_error("Assignment to constant variable.")),
            Shape::Declarative => {
                let result = self.env_mut(env, |node| match node.record.declarative_mut() {
                    Some(d) => d.set(name, value.cheap_clone(), strict),
                    None => Err((SetFailure::Missing, strict)),
                })?;
                match result {
                    Ok(()) => Ok(()),
                    Err((SetFailure::Missing, true)) => Err(JsError::not_defined(name)),
                    Err((SetFailure::Missing, false)) => {
                        self.create_mutable_binding(env, name, true)?;
                        self.initialize_binding(env, name, value)
                    }
                    Err((SetFailure::Uninitialized, _)) => Err(JsError::reference_error(format!(
                        "Cannot access '{}' before initialization",
                        name
                    ))),
                    Err((SetFailure::Immutable, true)) => {
                        Err(JsError::type_error("Assignment to constant variable."))
                    }
                    Err((SetFailure::Immutable, false)) => Ok(()),
                }
            }
        }
    }

    /// GetBindingValue(N, S)
    pub(crate) fn get_binding_value(&self, env: EnvId, name: &JsString, strict: bool) -> JsResult<Value> {
        self.tick()?;
        match self.shape(env, name)? {
            Shape::Object { object, .. } => {
                let key = PropertyKey::from(name.cheap_clone());
                if !self.has_property(object, &key)? {
                    if strict {
                        return Err(JsError::not_defined(name));
                    }
                    return Ok(Value::Undefined);
                }
                self.get(object, &key)
            }
            Shape::Indirect(module, binding) => {
                let Some(target) = self.module_environment(module)? else {
                    return Err(JsError::reference_error(format!(
                        "Cannot access '{}' before initialization",
                        name
                    )));
                };
                self.get_binding_value(target, &binding, true)
            }
            Shape::Declarative => {
                let result = self.env(env, |node| {
                    let record = match &node.record {
                        EnvironmentRecord::Global(g) => Some(&g.declarative),
                        other => other.declarative(),
                    };
                    record.map_or(Err(false), |d| d.get(name))
                })?;
                match result {
                    Ok(value) => Ok(value),
                    Err(true) => Err(JsError::reference_error(format!(
                        "Cannot access '{}' before initialization",
                        name
                    ))),
                    Err(false) => Err(JsError::not_defined(name)),
                }
            }
        }
    }

    /// DeleteBinding(N)
    pub(crate) fn delete_binding(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        self.tick()?;
        let is_module = self.env(env, |node| matches!(node.record, EnvironmentRecord::Module(_)))?;
        if is_module {
            return Err(JsError::internal("DeleteBinding on a module environment"));
        }
        let (is_global, shape) = (
            self.env(env, |node| matches!(node.record, EnvironmentRecord::Global(_)))?,
            self.shape(env, name)?,
        );
        match shape {
            Shape::Object { object, .. } => {
                let key = PropertyKey::from(name.cheap_clone());
                if is_global && !self.has_own_property(object, &key)? {
                    return Ok(true);
                }
                let status = self.delete(object, &key)?;
                if status && is_global {
                    self.env_mut(env, |node| {
                        if let EnvironmentRecord::Global(g) = &mut node.record {
                            g.var_names.remove(name);
                        }
                    })?;
                }
                Ok(status)
            }
            Shape::Indirect(..) => Ok(false),
            Shape::Declarative => self.env_mut(env, |node| {
                node.record.declarative_mut().is_none_or(|d| d.delete(name))
            }),
        }
    }

    /// HasThisBinding()
    pub(crate) fn has_this_binding(&self, env: EnvId) -> JsResult<bool> {
        self.tick()?;
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Function(f) => f.this_status != ThisBindingStatus::Lexical,
            EnvironmentRecord::Global(_) | EnvironmentRecord::Module(_) => true,
            EnvironmentRecord::Declarative(_) | EnvironmentRecord::Object(_) => false,
        })
    }

    /// HasSuperBinding()
    pub(crate) fn has_super_binding(&self, env: EnvId) -> JsResult<bool> {
        self.tick()?;
        let function = self.env(env, |node| match &node.record {
            EnvironmentRecord::Function(f) if f.this_status != ThisBindingStatus::Lexical => {
                Some(f.function_object)
            }
            _ => None,
        })?;
        match function {
            Some(f) => Ok(self.function_home_object(f)?.is_some()),
            None => Ok(false),
        }
    }

    /// WithBaseObject()
    pub(crate) fn with_base_object(&self, env: EnvId) -> JsResult<Option<ObjectId>> {
        self.tick()?;
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Object(o) if o.with_environment => Some(o.binding_object),
            _ => None,
        })
    }

    // ============ FUNCTION RECORDS ============

    /// BindThisValue(V)
    pub(crate) fn bind_this_value(&self, env: EnvId, value: Value) -> JsResult<()> {
        self.tick()?;
        self.env_mut(env, |node| match &mut node.record {
            EnvironmentRecord::Function(f) => match f.this_status {
                ThisBindingStatus::Initialized => Err(JsError::reference_error(
                    "Super constructor may only be called once",
                )),
                ThisBindingStatus::Lexical => {
                    Err(JsError::internal("BindThisValue on a lexical-this environment"))
                }
                ThisBindingStatus::Uninitialized => {
                    f.this_value = value;
                    f.this_status = ThisBindingStatus::Initialized;
                    Ok(())
                }
            },
            _ => Err(JsError::internal("BindThisValue on a non-function environment")),
        })?
    }

    /// GetThisBinding()
    pub(crate) fn get_this_binding(&self, env: EnvId) -> JsResult<Value> {
        self.tick()?;
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Function(f) => match f.this_status {
                ThisBindingStatus::Uninitialized => Err(JsError::reference_error(
                    "Must call super constructor in derived class before accessing 'this' or returning from derived constructor",
                )),
                _ => Ok(f.this_value.cheap_clone()),
            },
            EnvironmentRecord::Global(g) => Ok(Value::Object(g.global_this)),
            _ => Ok(Value::Undefined),
        })?
    }

    /// The function object and [[NewTarget]] of a function record.
    pub(crate) fn function_environment_parts(
        &self,
        env: EnvId,
    ) -> JsResult<Option<(ObjectId, Option<ObjectId>)>> {
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Function(f) => Some((f.function_object, f.new_target)),
            _ => None,
        })
    }

    /// GetSuperBase()
    pub(crate) fn get_super_base(&self, env: EnvId) -> JsResult<Value> {
        let Some((function, _)) = self.function_environment_parts(env)? else {
            return Ok(Value::Undefined);
        };
        match self.function_home_object(function)? {
            Some(home) => Ok(Value::from(self.get_prototype_of(home)?)),
            None => Ok(Value::Undefined),
        }
    }

    /// GetThisEnvironment()
    pub(crate) fn get_this_environment(&self) -> JsResult<EnvId> {
        let mut env = self.lexical_environment()?;
        loop {
            if self.has_this_binding(env)? {
                return Ok(env);
            }
            match self.outer_environment(env)? {
                Some(outer) => env = outer,
                None => return Err(JsError::internal("no this environment")),
            }
        }
    }

    /// ResolveThisBinding()
    pub(crate) fn resolve_this_binding(&self) -> JsResult<Value> {
        let env = self.get_this_environment()?;
        self.get_this_binding(env)
    }

    /// GetIdentifierReference(env, name): the record holding `name`, or
    /// `None` when it is unresolvable.
    pub(crate) fn get_identifier_environment(
        &self,
        env: Option<EnvId>,
        name: &JsString,
    ) -> JsResult<Option<EnvId>> {
        let mut current = env;
        while let Some(env) = current {
            if self.has_binding(env, name)? {
                return Ok(Some(env));
            }
            current = self.outer_environment(env)?;
        }
        Ok(None)
    }

    // ============ GLOBAL RECORDS ============

    fn global_parts(&self, env: EnvId) -> JsResult<ObjectId> {
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Global(g) => Ok(g.object_record.binding_object),
            _ => Err(JsError::internal("expected a global environment")),
        })?
    }

    /// HasVarDeclaration(N)
    pub(crate) fn has_var_declaration(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Global(g) => g.var_names.contains(name),
            _ => false,
        })
    }

    /// HasLexicalDeclaration(N)
    pub(crate) fn has_lexical_declaration(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Global(g) => g.declarative.has(name),
            _ => false,
        })
    }

    /// HasRestrictedGlobalProperty(N)
    pub(crate) fn has_restricted_global_property(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        let global = self.global_parts(env)?;
        match self.get_own_property(global, &PropertyKey::from(name.cheap_clone()))? {
            Some(desc) => Ok(desc.configurable != Some(true)),
            None => Ok(false),
        }
    }

    /// CanDeclareGlobalVar(N)
    pub(crate) fn can_declare_global_var(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        let global = self.global_parts(env)?;
        if self.has_own_property(global, &PropertyKey::from(name.cheap_clone()))? {
            return Ok(true);
        }
        self.is_extensible(global)
    }

    /// CanDeclareGlobalFunction(N)
    pub(crate) fn can_declare_global_function(&self, env: EnvId, name: &JsString) -> JsResult<bool> {
        let global = self.global_parts(env)?;
        let Some(existing) = self.get_own_property(global, &PropertyKey::from(name.cheap_clone()))? else {
            return self.is_extensible(global);
        };
        if existing.configurable == Some(true) {
            return Ok(true);
        }
        Ok(existing.is_data_descriptor()
            && existing.writable == Some(true)
            && existing.enumerable == Some(true))
    }

    fn record_var_name(&self, env: EnvId, name: &JsString) -> JsResult<()> {
        self.env_mut(env, |node| {
            if let EnvironmentRecord::Global(g) = &mut node.record {
                g.var_names.insert(name.cheap_clone());
            }
        })
    }

    /// CreateGlobalVarBinding(N, D)
    pub(crate) fn create_global_var_binding(
        &self,
        env: EnvId,
        name: &JsString,
        deletable: bool,
    ) -> JsResult<()> {
        self.tick()?;
        let global = self.global_parts(env)?;
        let key = PropertyKey::from(name.cheap_clone());
        if !self.has_own_property(global, &key)? && self.is_extensible(global)? {
            self.define_property_or_throw(
                global,
                &key,
                PropertyDescriptor::data(Value::Undefined, true, true, deletable),
            )?;
        }
        self.record_var_name(env, name)
    }

    /// CreateGlobalFunctionBinding(N, V, D)
    pub(crate) fn create_global_function_binding(
        &self,
        env: EnvId,
        name: &JsString,
        value: Value,
        deletable: bool,
    ) -> JsResult<()> {
        self.tick()?;
        let global = self.global_parts(env)?;
        let key = PropertyKey::from(name.cheap_clone());
        let desc = match self.get_own_property(global, &key)? {
            None => PropertyDescriptor::data(value.cheap_clone(), true, true, deletable),
            Some(existing) if existing.configurable == Some(true) => {
                PropertyDescriptor::data(value.cheap_clone(), true, true, deletable)
            }
            Some(_) => PropertyDescriptor::value_only(value.cheap_clone()),
        };
        self.define_property_or_throw(global, &key, desc)?;
        self.set(global, &key, value, false)?;
        self.record_var_name(env, name)
    }

    /// The lexical names of a global record, for redeclaration checks.
    pub(crate) fn global_lexical_names(&self, env: EnvId) -> JsResult<Vec<JsString>> {
        self.env(env, |node| match &node.record {
            EnvironmentRecord::Global(g) => g.declarative.names().cloned().collect(),
            _ => Vec::new(),
        })
    }

    // ============ MODULE RECORDS ============

    /// CreateImportBinding(N, M, N2)
    pub(crate) fn create_import_binding(
        &self,
        env: EnvId,
        name: JsString,
        module: ModuleId,
        binding: JsString,
    ) -> JsResult<()> {
        self.tick()?;
        self.env_mut(env, |node| match &mut node.record {
            EnvironmentRecord::Module(m) => {
                m.indirect.insert(name, (module, binding));
                Ok(())
            }
            _ => Err(JsError::internal("import binding outside a module environment")),
        })?
    }
}
