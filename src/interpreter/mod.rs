//! Tree-walking evaluator for ECMAScript
//!
//! The `Interpreter` owns the object and environment arenas, the realms, the
//! execution-context stack, the job queue and the module registry. Every
//! method takes `&self`: native functions, getters and coroutine drivers all
//! re-enter the interpreter, so mutable state lives behind `Cell`/`RefCell`
//! and no borrow is ever held across a call into script code.
//!
//! Evaluation is written as `async` Rust. An ordinary call polls the body
//! future once with a no-op waker and requires it to finish; generators and
//! async functions keep their body future and poll it again each time they
//! are resumed (see `coroutine`).

pub mod builtins;
mod completion;
mod conversions;
mod coroutine;
mod display;
pub mod environment;
mod eval;
mod function;
mod iteration;
mod jobs;
pub mod module;
pub mod object;
mod operators;
pub mod realm;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::{Pin, pin};
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::RuntimeConfig;
use crate::error::{ErrorKind, JsError, JsResult, SourceLocation, StackFrame};
use crate::heap::{Arena, Handle};
use crate::lexer::Span;
use crate::string_dict::StringDict;
use crate::value::{CheapClone, JsString, JsSymbol, PropertyKey, Value};

pub use completion::Completion;
pub(crate) use coroutine::Channel;
pub use environment::EnvironmentNode;
pub(crate) use jobs::{Job, RejectionTracker};
pub use module::ModuleId;
pub(crate) use module::ModuleRegistry;
pub use object::{ObjectData, ObjectKind};
pub use realm::{Intrinsics, Realm, RealmId};

/// Handle of an object in the interpreter's object arena.
pub type ObjectId = Handle<ObjectData>;

/// Handle of an environment record in the environment arena.
pub type EnvId = Handle<EnvironmentNode>;

/// Deepest execution-context stack before a RangeError is raised.
const MAX_CONTEXT_DEPTH: usize = 160;

/// Native stack that must remain before evaluation continues on the current
/// segment.
const STACK_RED_ZONE: usize = 256 * 1024;

/// Size of each native stack segment allocated when the red zone is reached.
const STACK_SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Frames kept in an exception's stack snapshot.
const MAX_STACK_FRAMES: usize = 32;

/// The code an execution context runs.
#[derive(Debug, Clone)]
pub enum ScriptOrModule {
    Script(Option<Rc<str>>),
    Module(ModuleId),
}

/// An entry of the execution-context stack.
#[derive(Clone)]
pub struct ExecutionContext {
    pub lexical_environment: EnvId,
    pub variable_environment: EnvId,
    /// The function object being evaluated, `None` for scripts and modules.
    pub function: Option<ObjectId>,
    pub realm: RealmId,
    pub script_or_module: Option<ScriptOrModule>,
    /// The running code is strict mode code.
    pub strict: bool,
    /// Resumption channel when this context runs a generator or async body.
    pub(crate) coroutine: Option<Rc<Channel>>,
    /// Source position of the caller when the context was pushed.
    pub(crate) caller_position: Span,
}

/// The well-known symbols, shared by every realm.
#[derive(Clone)]
pub struct WellKnownSymbols {
    pub async_iterator: JsSymbol,
    pub has_instance: JsSymbol,
    pub is_concat_spreadable: JsSymbol,
    pub iterator: JsSymbol,
    pub match_: JsSymbol,
    pub match_all: JsSymbol,
    pub replace: JsSymbol,
    pub search: JsSymbol,
    pub species: JsSymbol,
    pub split: JsSymbol,
    pub to_primitive: JsSymbol,
    pub to_string_tag: JsSymbol,
    pub unscopables: JsSymbol,
}

impl WellKnownSymbols {
    fn new(symbols: &SymbolTable) -> Self {
        let make = |name: &str| symbols.create(Some(JsString::from(format!("Symbol.{}", name))));
        Self {
            async_iterator: make("asyncIterator"),
            has_instance: make("hasInstance"),
            is_concat_spreadable: make("isConcatSpreadable"),
            iterator: make("iterator"),
            match_: make("match"),
            match_all: make("matchAll"),
            replace: make("replace"),
            search: make("search"),
            species: make("species"),
            split: make("split"),
            to_primitive: make("toPrimitive"),
            to_string_tag: make("toStringTag"),
            unscopables: make("unscopables"),
        }
    }

    /// Name/value pairs for the `Symbol` constructor's static properties.
    pub fn entries(&self) -> [(&'static str, &JsSymbol); 13] {
        [
            ("asyncIterator", &self.async_iterator),
            ("hasInstance", &self.has_instance),
            ("isConcatSpreadable", &self.is_concat_spreadable),
            ("iterator", &self.iterator),
            ("match", &self.match_),
            ("matchAll", &self.match_all),
            ("replace", &self.replace),
            ("search", &self.search),
            ("species", &self.species),
            ("split", &self.split),
            ("toPrimitive", &self.to_primitive),
            ("toStringTag", &self.to_string_tag),
            ("unscopables", &self.unscopables),
        ]
    }
}

/// Symbol allocation and the global symbol registry (`Symbol.for`).
struct SymbolTable {
    next_id: Cell<u64>,
    registry: RefCell<FxHashMap<JsString, JsSymbol>>,
}

impl SymbolTable {
    fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            registry: RefCell::new(FxHashMap::default()),
        }
    }

    fn create(&self, description: Option<JsString>) -> JsSymbol {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        JsSymbol::new(id, description)
    }
}

/// Cooperative execution budget: a wall-clock timeout and a step limit.
struct Budget {
    timeout_ms: Cell<u64>,
    step_limit: Cell<Option<u64>>,
    check_time_every: Cell<u32>,
    steps: Cell<u64>,
    started: Cell<Option<Instant>>,
}

/// The interpreter state
pub struct Interpreter {
    self_ref: Weak<Interpreter>,
    objects: RefCell<Arena<ObjectData>>,
    environments: RefCell<Arena<EnvironmentNode>>,
    realms: RefCell<Vec<Rc<Realm>>>,
    contexts: RefCell<Vec<ExecutionContext>>,
    /// Source position of the node being evaluated.
    position: Cell<Span>,
    strings: RefCell<StringDict>,
    symbols: SymbolTable,
    well_known: WellKnownSymbols,
    pub(crate) jobs: RefCell<VecDeque<Job>>,
    budget: Budget,
    pub(crate) modules: RefCell<ModuleRegistry>,
    pub(crate) rejections: RejectionTracker,
}

impl Interpreter {
    /// Create an interpreter with one realm configured by `config.realm`.
    pub fn new(config: &RuntimeConfig) -> JsResult<Rc<Self>> {
        let interp = Rc::new_cyclic(|self_ref| {
            let symbols = SymbolTable::new();
            let well_known = WellKnownSymbols::new(&symbols);
            Interpreter {
                self_ref: self_ref.clone(),
                objects: RefCell::new(Arena::new()),
                environments: RefCell::new(Arena::new()),
                realms: RefCell::new(Vec::new()),
                contexts: RefCell::new(Vec::new()),
                position: Cell::new(Span::default()),
                strings: RefCell::new(StringDict::with_common_strings()),
                symbols,
                well_known,
                jobs: RefCell::new(VecDeque::new()),
                budget: Budget {
                    timeout_ms: Cell::new(config.timeout_ms),
                    step_limit: Cell::new(config.step_limit),
                    check_time_every: Cell::new(config.check_time_every.max(1)),
                    steps: Cell::new(0),
                    started: Cell::new(None),
                },
                modules: RefCell::new(ModuleRegistry::default()),
                rejections: RejectionTracker::default(),
            }
        });
        interp.create_realm(config.realm)?;
        Ok(interp)
    }

    /// A strong reference to this interpreter, for futures that must own it.
    pub(crate) fn rc(&self) -> JsResult<Rc<Interpreter>> {
        self.self_ref
            .upgrade()
            .ok_or_else(|| JsError::internal("interpreter is being dropped"))
    }

    // ============ STRINGS AND SYMBOLS ============

    /// Intern a string
    pub fn intern(&self, s: &str) -> JsString {
        self.strings.borrow_mut().get_or_insert(s)
    }

    /// Interned property key (canonical index keys stay numeric).
    pub fn key(&self, s: &str) -> PropertyKey {
        PropertyKey::from(self.intern(s))
    }

    pub(crate) fn string_dict(&self) -> &RefCell<StringDict> {
        &self.strings
    }

    pub fn well_known(&self) -> &WellKnownSymbols {
        &self.well_known
    }

    pub(crate) fn new_symbol(&self, description: Option<JsString>) -> JsSymbol {
        self.symbols.create(description)
    }

    /// `Symbol.for(key)`
    pub(crate) fn symbol_for(&self, key: JsString) -> JsSymbol {
        if let Some(existing) = self.symbols.registry.borrow().get(&key) {
            return existing.cheap_clone();
        }
        let symbol = self.symbols.create(Some(key.cheap_clone()));
        self.symbols
            .registry
            .borrow_mut()
            .insert(key, symbol.cheap_clone());
        symbol
    }

    /// `Symbol.keyFor(sym)`
    pub(crate) fn symbol_key_for(&self, symbol: &JsSymbol) -> Option<JsString> {
        let registry = self.symbols.registry.borrow();
        let description = symbol.description()?;
        match registry.get(description) {
            Some(registered) if registered == symbol => Some(description.cheap_clone()),
            _ => None,
        }
    }

    // ============ EXECUTION CONTEXTS ============

    /// Push a context, failing with a RangeError when the stack is too deep.
    pub(crate) fn push_context(&self, mut context: ExecutionContext) -> JsResult<()> {
        let mut contexts = self.contexts.borrow_mut();
        if contexts.len() >= MAX_CONTEXT_DEPTH {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        context.caller_position = self.position.get();
        contexts.push(context);
        Ok(())
    }

    pub(crate) fn pop_context(&self) -> JsResult<ExecutionContext> {
        let context = self
            .contexts
            .borrow_mut()
            .pop()
            .ok_or_else(|| JsError::internal("execution context stack underflow"))?;
        self.position.set(context.caller_position);
        Ok(context)
    }

    /// Run `f` with `context` pushed, popping it on every exit path.
    pub(crate) fn with_context<T>(
        &self,
        context: ExecutionContext,
        f: impl FnOnce() -> JsResult<T>,
    ) -> JsResult<T> {
        self.push_context(context)?;
        let result = f();
        self.pop_context()?;
        result
    }

    fn running<T>(&self, f: impl FnOnce(&ExecutionContext) -> T) -> JsResult<T> {
        self.contexts
            .borrow()
            .last()
            .map(f)
            .ok_or_else(|| JsError::internal("no running execution context"))
    }

    fn running_mut<T>(&self, f: impl FnOnce(&mut ExecutionContext) -> T) -> JsResult<T> {
        self.contexts
            .borrow_mut()
            .last_mut()
            .map(f)
            .ok_or_else(|| JsError::internal("no running execution context"))
    }

    pub(crate) fn lexical_environment(&self) -> JsResult<EnvId> {
        self.running(|ctx| ctx.lexical_environment)
    }

    pub(crate) fn set_lexical_environment(&self, env: EnvId) -> JsResult<()> {
        self.running_mut(|ctx| ctx.lexical_environment = env)
    }

    pub(crate) fn variable_environment(&self) -> JsResult<EnvId> {
        self.running(|ctx| ctx.variable_environment)
    }

    pub(crate) fn set_variable_environment(&self, env: EnvId) -> JsResult<()> {
        self.running_mut(|ctx| ctx.variable_environment = env)
    }

    /// The function of the running execution context.
    pub(crate) fn active_function(&self) -> JsResult<Option<ObjectId>> {
        self.running(|ctx| ctx.function)
    }

    /// The running code is strict mode code.
    pub(crate) fn is_strict(&self) -> bool {
        self.running(|ctx| ctx.strict).unwrap_or(true)
    }

    pub(crate) fn active_script_or_module(&self) -> Option<ScriptOrModule> {
        self.contexts
            .borrow()
            .iter()
            .rev()
            .find_map(|ctx| ctx.script_or_module.clone())
    }

    pub(crate) fn coroutine_channel(&self) -> JsResult<Rc<Channel>> {
        self.running(|ctx| ctx.coroutine.clone())?
            .ok_or_else(|| JsError::internal("suspension outside of a generator or async function"))
    }

    pub(crate) fn context_depth(&self) -> usize {
        self.contexts.borrow().len()
    }

    // ============ REALMS ============

    pub(crate) fn realm(&self, id: RealmId) -> JsResult<Rc<Realm>> {
        self.realms
            .borrow()
            .get(id.index())
            .cloned()
            .ok_or_else(|| JsError::internal(format!("unknown realm {}", id.index())))
    }

    pub(crate) fn add_realm(&self, realm: Rc<Realm>) {
        self.realms.borrow_mut().push(realm);
    }

    pub(crate) fn next_realm_id(&self) -> RealmId {
        RealmId::new(self.realms.borrow().len())
    }

    /// The realm of the running execution context, or the initial realm when
    /// nothing is running.
    pub fn current_realm_id(&self) -> RealmId {
        self.contexts
            .borrow()
            .last()
            .map(|ctx| ctx.realm)
            .unwrap_or_else(|| RealmId::new(0))
    }

    pub(crate) fn current_realm(&self) -> JsResult<Rc<Realm>> {
        self.realm(self.current_realm_id())
    }

    /// Look up an intrinsic of the current realm.
    pub(crate) fn intrinsic(&self, pick: impl FnOnce(&Intrinsics) -> ObjectId) -> JsResult<ObjectId> {
        Ok(pick(&self.current_realm()?.intrinsics))
    }

    // ============ BUDGET ============

    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        self.budget.timeout_ms.set(timeout_ms);
    }

    pub fn timeout_ms(&self) -> u64 {
        self.budget.timeout_ms.get()
    }

    pub fn set_step_limit(&self, limit: Option<u64>) {
        self.budget.step_limit.set(limit);
    }

    /// Reset the budget at the start of a host-initiated evaluation.
    pub(crate) fn start_budget(&self) {
        if self.contexts.borrow().is_empty() {
            self.budget.steps.set(0);
            self.budget.started.set(Some(Instant::now()));
        }
    }

    /// One evaluation step at `span`.
    pub(crate) fn tick_at(&self, span: Span) -> JsResult<()> {
        self.position.set(span);
        self.tick()
    }

    /// One evaluation step: counts against the step limit and reads the
    /// clock every `check_time_every` steps.
    pub(crate) fn tick(&self) -> JsResult<()> {
        let steps = self.budget.steps.get().wrapping_add(1);
        self.budget.steps.set(steps);
        if let Some(limit) = self.budget.step_limit.get() {
            if steps > limit {
                tracing::warn!(target: "ecmavm::budget", limit, "step limit exceeded");
                return Err(JsError::StepLimit { limit });
            }
        }
        let every = u64::from(self.budget.check_time_every.get().max(1));
        if steps % every == 0 {
            self.check_timeout()?;
        }
        Ok(())
    }

    fn check_timeout(&self) -> JsResult<()> {
        let timeout_ms = self.budget.timeout_ms.get();
        if timeout_ms == 0 {
            return Ok(());
        }
        if let Some(start) = self.budget.started.get() {
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if elapsed_ms > timeout_ms {
                tracing::warn!(target: "ecmavm::budget", timeout_ms, elapsed_ms, "execution timed out");
                return Err(JsError::Timeout {
                    timeout_ms,
                    elapsed_ms,
                });
            }
        }
        Ok(())
    }

    // ============ DRIVING FUTURES ============

    /// Run `f` on a fresh native stack segment when the current one is
    /// nearly exhausted. Deep script recursion then reaches the context
    /// depth limit instead of overflowing the host thread.
    pub(crate) fn grow_stack<R>(f: impl FnOnce() -> R) -> R {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, f)
    }

    /// Poll `future` through `grow_stack` on every resumption.
    pub(crate) fn stack_guarded<F: Future + Unpin>(mut future: F) -> impl Future<Output = F::Output> {
        std::future::poll_fn(move |cx| Self::grow_stack(|| Pin::new(&mut future).poll(cx)))
    }

    /// Poll an evaluation future to completion. Only coroutine bodies may
    /// suspend; a pending future here is an interpreter bug.
    pub(crate) fn run_sync<T>(&self, future: impl Future<Output = JsResult<T>>) -> JsResult<T> {
        let mut future = pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(result) => result,
            Poll::Pending => Err(JsError::internal(
                "evaluation suspended outside of a generator or async function",
            )),
        }
    }

    // ============ ERRORS ============

    /// Materialize a runtime-raised error as an error object of the current
    /// realm and attach location and stack the first time an abrupt
    /// completion passes an evaluator boundary.
    pub(crate) fn enrich(&self, error: JsError, span: Span) -> JsError {
        let error = match self.materialize(error) {
            Ok(error) => error,
            Err(error) => return error,
        };
        match error {
            JsError::Thrown(mut exception) if exception.location.is_none() => {
                exception.location = Some(self.source_location(span));
                exception.stack = self.stack_snapshot();
                if exception.summary.is_empty() {
                    exception.summary = self.error_summary(&exception.value);
                }
                JsError::Thrown(exception)
            }
            other => other,
        }
    }

    /// Turn `JsError::Native` into `JsError::Thrown` holding a new error
    /// object; other errors pass through.
    pub(crate) fn materialize(&self, error: JsError) -> JsResult<JsError> {
        match error {
            JsError::Native { kind, message } => {
                let object = self.create_error(kind, &message)?;
                Ok(JsError::thrown(Value::Object(object)))
            }
            other => Ok(other),
        }
    }

    /// The value a `catch` clause or promise rejection observes. Errors that
    /// script code may not observe come back as `Err`.
    pub(crate) fn catchable_value(&self, error: JsError) -> JsResult<Value> {
        match self.materialize(error)? {
            JsError::Thrown(exception) => Ok(exception.value),
            other => Err(other),
        }
    }

    /// Build a `JsError::Native` of `kind`.
    pub(crate) fn throw<T>(&self, kind: ErrorKind, message: impl Into<String>) -> JsResult<T> {
        Err(JsError::native(kind, message))
    }

    fn source_location(&self, span: Span) -> SourceLocation {
        let file = match self.active_script_or_module() {
            Some(ScriptOrModule::Script(name)) => name.map(|n| n.to_string()),
            Some(ScriptOrModule::Module(id)) => self.modules.borrow().specifier(id),
            None => None,
        };
        SourceLocation {
            file,
            line: span.line,
            column: span.column,
        }
    }

    fn stack_snapshot(&self) -> Vec<StackFrame> {
        let frames: Vec<(Option<ObjectId>, Span, Option<ScriptOrModule>)> = {
            let contexts = self.contexts.borrow();
            let mut position = self.position.get();
            let mut frames = Vec::new();
            for ctx in contexts.iter().rev().take(MAX_STACK_FRAMES) {
                frames.push((ctx.function, position, ctx.script_or_module.clone()));
                position = ctx.caller_position;
            }
            frames
        };
        frames
            .into_iter()
            .map(|(function, position, source)| StackFrame {
                function_name: function.and_then(|f| self.function_display_name(f)),
                location: source.map(|source| {
                    let file = match source {
                        ScriptOrModule::Script(name) => name.map(|n| n.to_string()),
                        ScriptOrModule::Module(id) => self.modules.borrow().specifier(id),
                    };
                    SourceLocation {
                        file,
                        line: position.line,
                        column: position.column,
                    }
                }),
            })
            .collect()
    }

    // ============ TEARDOWN ============

    /// Drop every object, environment, realm, job and module. Handles that
    /// outlive this call are rejected with `JsError::Internal`.
    pub fn dispose(&self) {
        let objects = self.objects.borrow_mut().drain();
        let environments = self.environments.borrow_mut().drain();
        let realms = std::mem::take(&mut *self.realms.borrow_mut());
        self.contexts.borrow_mut().clear();
        self.jobs.borrow_mut().clear();
        self.modules.borrow_mut().clear();
        self.rejections.clear();
        tracing::debug!(
            target: "ecmavm::realm",
            objects = objects.len(),
            environments = environments.len(),
            realms = realms.len(),
            "disposed interpreter heap"
        );
        drop(objects);
        drop(environments);
        drop(realms);
    }
}
