//! Statement and expression evaluation
//!
//! The evaluator walks the AST directly. Each entry point returns a boxed
//! future so the recursion has a known size and a generator or async body
//! can suspend at any depth; ordinary calls drive the same futures to
//! completion with `run_sync`. Statement and expression futures are polled
//! through `stack_guarded`, which moves to a new native stack segment when
//! the current one runs low.

mod binding;
mod class;
mod object_literal;

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::{
    Argument, ArrayElement, ArrayExpression, AssignmentExpression, AssignmentOp, AssignmentTarget,
    BlockScope, CallExpression, CatchClause, Class, DoWhileStatement, ExportKind, Expression,
    ForInOfLeft, ForInStatement, ForInit, ForOfStatement, ForStatement, Function, LiteralValue,
    LogicalOp, MemberProperty, ObjectPropertyKey, Pattern, Statement, SwitchCase,
    SwitchStatement, TemplateLiteral, TryStatement, UnaryExpression, UnaryOp, UpdateExpression,
    UpdateOp, VariableDeclaration, VariableKind, WhileStatement, DEFAULT_EXPORT_BINDING,
};
use crate::error::{JsError, JsResult};
use crate::hoist::bound_names;
use crate::interpreter::iteration::{IteratorHint, IteratorRecord};
use crate::interpreter::object::{IntegrityLevel, PropertyDescriptor};
use crate::interpreter::{
    Completion, EnvId, ExecutionContext, Interpreter, ObjectId, RealmId, ScriptOrModule,
};
use crate::lexer::Span;
use crate::parser;
use crate::value::{number_to_js_string, CheapClone, JsString, PropertyKey, Value};

/// A boxed evaluation future borrowing the interpreter and the AST.
pub(crate) type EvalFuture<'a, T> = Pin<Box<dyn Future<Output = JsResult<T>> + 'a>>;

/// The Reference Record: what an assignment target or callee resolved to.
#[derive(Debug, Clone)]
pub(crate) enum Reference {
    /// An identifier; `env` is `None` when the name is unresolvable.
    Binding {
        env: Option<EnvId>,
        name: JsString,
        strict: bool,
    },
    /// A property access; `this` is set for `super.x`.
    Property {
        base: Value,
        key: PropertyKey,
        this: Option<Value>,
        strict: bool,
    },
    /// Any other expression, already evaluated.
    Value(Value),
}

/// Which protocol a `for-in`/`for-of` loop pulls its values from.
enum ForIteration {
    Enumerate(ForInIterator),
    Iterate(IteratorRecord),
    AsyncIterate(IteratorRecord),
}

/// The key walk behind `for-in`: own string keys first, then each
/// prototype's, skipping shadowed, deleted and non-enumerable keys.
struct ForInIterator {
    object: Option<ObjectId>,
    visited: FxHashSet<PropertyKey>,
    pending: Vec<PropertyKey>,
    fetched: bool,
}

impl ForInIterator {
    fn new(object: ObjectId) -> Self {
        Self {
            object: Some(object),
            visited: FxHashSet::default(),
            pending: Vec::new(),
            fetched: false,
        }
    }

    fn next(&mut self, interp: &Interpreter) -> JsResult<Option<Value>> {
        loop {
            let Some(object) = self.object else {
                return Ok(None);
            };
            if !self.fetched {
                let mut keys = interp.own_property_keys(object)?;
                keys.retain(PropertyKey::is_string);
                keys.reverse();
                self.pending = keys;
                self.fetched = true;
            }
            while let Some(key) = self.pending.pop() {
                if self.visited.contains(&key) {
                    continue;
                }
                let Some(desc) = interp.get_own_property(object, &key)? else {
                    continue;
                };
                let value = key.to_value();
                self.visited.insert(key);
                if desc.enumerable == Some(true) {
                    return Ok(Some(value));
                }
            }
            self.object = interp.get_prototype_of(object)?;
            self.fetched = false;
        }
    }
}

/// `break` without a label ends the innermost loop or switch normally.
fn exit_breakable(completion: Completion) -> Completion {
    match completion {
        Completion::Break(None, value) => Completion::Normal(value),
        other => other,
    }
}

/// Source-like text of a callee for "is not a function" messages.
fn callee_text(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(id) => id.name.to_string(),
        Expression::This(_) => "this".to_string(),
        Expression::Member(m) => match &m.property {
            MemberProperty::Identifier(id) => format!("{}.{}", callee_text(&m.object), id.name),
            MemberProperty::Expression(_) => format!("{}[...]", callee_text(&m.object)),
        },
        Expression::SuperMember(s) => match &s.property {
            MemberProperty::Identifier(id) => format!("super.{}", id.name),
            MemberProperty::Expression(_) => "super[...]".to_string(),
        },
        Expression::Call(c) => format!("{}(...)", callee_text(&c.callee)),
        Expression::Parenthesized(inner, _) => callee_text(inner),
        Expression::OptionalChain(chain) => callee_text(&chain.base),
        _ => "expression".to_string(),
    }
}

impl Interpreter {
    // ============ ENTRY POINTS ============

    /// ScriptEvaluation: parse `source` as a script and run it in `realm`.
    /// Returns the value of the last value-producing statement.
    pub fn evaluate_script(&self, source: &str, name: Option<&str>, realm: RealmId) -> JsResult<Value> {
        let program = {
            let mut dict = self.string_dict().borrow_mut();
            parser::parse_script(source, &mut dict)?
        };
        let record = self.realm(realm)?;
        tracing::debug!(
            target: "ecmavm::eval",
            script = name.unwrap_or("<anonymous>"),
            statements = program.body.len(),
            strict = program.strict,
            "evaluating script"
        );
        self.start_budget();
        let context = ExecutionContext {
            lexical_environment: record.global_env,
            variable_environment: record.global_env,
            function: None,
            realm,
            script_or_module: Some(ScriptOrModule::Script(name.map(Rc::from))),
            strict: program.strict,
            coroutine: None,
            caller_position: Span::default(),
        };
        self.with_context(context, || {
            let result = self
                .global_declaration_instantiation(&program, record.global_env)
                .and_then(|()| self.run_sync(self.evaluate_statement_list(&program.body)));
            match result {
                Ok(completion) => Ok(completion.value().cloned().unwrap_or(Value::Undefined)),
                Err(error) => Err(self.enrich(error, self.position.get())),
            }
        })
    }

    // ============ STATEMENTS ============

    /// Evaluation of a StatementList with UpdateEmpty between statements.
    pub(crate) fn evaluate_statement_list<'a>(
        &'a self,
        statements: &'a [Statement],
    ) -> EvalFuture<'a, Completion> {
        Box::pin(async move {
            let mut last: Option<Value> = None;
            for statement in statements {
                match self.evaluate_statement(statement, &[]).await?.update_empty(last.take()) {
                    Completion::Normal(value) => last = value,
                    abrupt => return Ok(abrupt),
                }
            }
            Ok(Completion::Normal(last))
        })
    }

    /// Evaluate one statement. `labels` is the label set of an enclosing
    /// labelled statement, consumed by loops.
    pub(crate) fn evaluate_statement<'a>(
        &'a self,
        statement: &'a Statement,
        labels: &'a [JsString],
    ) -> EvalFuture<'a, Completion> {
        Box::pin(Self::stack_guarded(Box::pin(async move {
            let span = statement.span();
            self.tick_at(span)?;
            self.statement(statement, labels)
                .await
                .map_err(|error| self.enrich(error, span))
        })))
    }

    async fn statement(&self, statement: &Statement, labels: &[JsString]) -> JsResult<Completion> {
        match statement {
            Statement::VariableDeclaration(decl) => {
                self.variable_declaration(decl).await?;
                Ok(Completion::empty())
            }
            Statement::FunctionDeclaration(_)
            | Statement::Empty(_)
            | Statement::Debugger(_)
            | Statement::TypeDeclaration(_)
            | Statement::Import(_) => Ok(Completion::empty()),
            Statement::ClassDeclaration(class) => {
                self.class_declaration(class).await?;
                Ok(Completion::empty())
            }
            Statement::Expression(s) => {
                let value = self.evaluate_expression(&s.expression).await?;
                Ok(Completion::Normal(Some(value)))
            }
            Statement::Block(block) => self.block(&block.body, &block.scope).await,
            Statement::If(s) => {
                let test = self.evaluate_expression(&s.test).await?;
                let completion = if test.to_boolean() {
                    self.evaluate_statement(&s.consequent, &[]).await?
                } else if let Some(alternate) = &s.alternate {
                    self.evaluate_statement(alternate, &[]).await?
                } else {
                    Completion::empty()
                };
                Ok(completion.update_empty(Some(Value::Undefined)))
            }
            Statement::Switch(s) => self.switch_statement(s).await,
            Statement::For(s) => self.for_statement(s, labels).await,
            Statement::ForIn(s) => self.for_in_statement(s, labels).await,
            Statement::ForOf(s) => self.for_of_statement(s, labels).await,
            Statement::While(s) => self.while_statement(s, labels).await,
            Statement::DoWhile(s) => self.do_while_statement(s, labels).await,
            Statement::Try(s) => self.try_statement(s).await,
            Statement::With(s) => {
                let value = self.evaluate_expression(&s.object).await?;
                let object = self.to_object(&value)?;
                let old = self.lexical_environment()?;
                let env = self.new_object_environment(object, true, Some(old));
                self.set_lexical_environment(env)?;
                let result = self.evaluate_statement(&s.body, &[]).await;
                self.set_lexical_environment(old)?;
                Ok(result?.update_empty(Some(Value::Undefined)))
            }
            Statement::Return(s) => {
                let value = match &s.argument {
                    Some(argument) => {
                        let value = self.evaluate_expression(argument).await?;
                        if self.in_async_generator() {
                            self.await_value(value).await?
                        } else {
                            value
                        }
                    }
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break(s) => Ok(Completion::Break(s.label.clone(), None)),
            Statement::Continue(s) => Ok(Completion::Continue(s.label.clone(), None)),
            Statement::Throw(s) => {
                let value = self.evaluate_expression(&s.argument).await?;
                Err(JsError::thrown(value))
            }
            Statement::Labeled(s) => {
                let mut label_set = labels.to_vec();
                label_set.push(s.label.cheap_clone());
                match self.evaluate_statement(&s.body, &label_set).await? {
                    Completion::Break(Some(target), value) if target == s.label => {
                        Ok(Completion::Normal(Some(value.unwrap_or(Value::Undefined))))
                    }
                    other => Ok(other),
                }
            }
            Statement::Export(export) => {
                match &export.kind {
                    ExportKind::Declaration(inner) => return self.evaluate_statement(inner, &[]).await,
                    ExportKind::DefaultDeclaration(inner) => {
                        if let Statement::ClassDeclaration(class) = inner.as_ref() {
                            self.class_declaration(class).await?;
                        }
                    }
                    ExportKind::DefaultExpression(expression) => {
                        let value = self
                            .initializer_value(expression, &self.key("default"))
                            .await?;
                        let env = self.lexical_environment()?;
                        self.initialize_binding(env, &self.intern(DEFAULT_EXPORT_BINDING), value)?;
                    }
                    ExportKind::Named { .. } | ExportKind::All { .. } => {}
                }
                Ok(Completion::empty())
            }
        }
    }

    /// Block evaluation: a fresh declarative environment when the block
    /// declares anything.
    async fn block(&self, body: &[Statement], scope: &BlockScope) -> JsResult<Completion> {
        if scope.is_empty() {
            return self.evaluate_statement_list(body).await;
        }
        let old = self.lexical_environment()?;
        let env = self.new_declarative_environment(Some(old));
        self.block_declaration_instantiation(scope, env)?;
        self.set_lexical_environment(env)?;
        let result = self.evaluate_statement_list(body).await;
        self.set_lexical_environment(old)?;
        result
    }

    async fn variable_declaration(&self, decl: &VariableDeclaration) -> JsResult<()> {
        for declarator in &decl.declarations {
            match (&declarator.id, &declarator.init) {
                (Pattern::Identifier(_), None) if decl.kind == VariableKind::Var => {}
                (Pattern::Identifier(id), None) => {
                    let env = self.lexical_environment()?;
                    self.initialize_binding(env, &id.name, Value::Undefined)?;
                }
                (Pattern::Identifier(id), Some(init)) => {
                    let name = PropertyKey::from(id.name.cheap_clone());
                    if decl.kind == VariableKind::Var {
                        let reference = self.resolve_binding(&id.name)?;
                        let value = self.initializer_value(init, &name).await?;
                        self.put_value(&reference, value)?;
                    } else {
                        let value = self.initializer_value(init, &name).await?;
                        let env = self.lexical_environment()?;
                        self.initialize_binding(env, &id.name, value)?;
                    }
                }
                (pattern, Some(init)) => {
                    let value = self.evaluate_expression(init).await?;
                    let env = match decl.kind {
                        VariableKind::Var => None,
                        VariableKind::Let | VariableKind::Const => Some(self.lexical_environment()?),
                    };
                    self.binding_initialization(pattern, value, env).await?;
                }
                (_, None) => {
                    return Err(JsError::runtime_syntax_error(
                        "Missing initializer in destructuring declaration",
                    ));
                }
            }
        }
        Ok(())
    }

    async fn class_declaration(&self, class: &Class) -> JsResult<()> {
        let (binding, name) = match &class.id {
            Some(id) => (id.name.cheap_clone(), PropertyKey::from(id.name.cheap_clone())),
            None => (self.intern(DEFAULT_EXPORT_BINDING), self.key("default")),
        };
        let inner_binding = class.id.as_ref().map(|id| id.name.cheap_clone());
        let f = self.class_definition_evaluation(class, inner_binding, name).await?;
        let env = self.lexical_environment()?;
        self.initialize_binding(env, &binding, Value::Object(f))
    }

    // ============ LOOPS ============

    async fn while_statement(&self, s: &WhileStatement, labels: &[JsString]) -> JsResult<Completion> {
        let mut value = Value::Undefined;
        loop {
            if !self.evaluate_expression(&s.test).await?.to_boolean() {
                return Ok(Completion::Normal(Some(value)));
            }
            let result = self.evaluate_statement(&s.body, &[]).await?;
            if !result.loop_continues(labels) {
                return Ok(exit_breakable(result.update_empty(Some(value))));
            }
            if let Some(v) = result.value() {
                value = v.cheap_clone();
            }
        }
    }

    async fn do_while_statement(&self, s: &DoWhileStatement, labels: &[JsString]) -> JsResult<Completion> {
        let mut value = Value::Undefined;
        loop {
            let result = self.evaluate_statement(&s.body, &[]).await?;
            if !result.loop_continues(labels) {
                return Ok(exit_breakable(result.update_empty(Some(value))));
            }
            if let Some(v) = result.value() {
                value = v.cheap_clone();
            }
            if !self.evaluate_expression(&s.test).await?.to_boolean() {
                return Ok(Completion::Normal(Some(value)));
            }
        }
    }

    async fn for_statement(&self, s: &ForStatement, labels: &[JsString]) -> JsResult<Completion> {
        match &s.init {
            Some(ForInit::Variable(decl)) if decl.kind != VariableKind::Var => {
                let old = self.lexical_environment()?;
                let loop_env = self.new_declarative_environment(Some(old));
                let mut names = Vec::new();
                for declarator in &decl.declarations {
                    bound_names(&declarator.id, &mut names);
                }
                let constant = decl.kind == VariableKind::Const;
                for name in &names {
                    if constant {
                        self.create_immutable_binding(loop_env, name, true)?;
                    } else {
                        self.create_mutable_binding(loop_env, name, false)?;
                    }
                }
                self.set_lexical_environment(loop_env)?;
                let per_iteration = if constant { Vec::new() } else { names };
                let result = match self.variable_declaration(decl).await {
                    Ok(()) => self.for_body_evaluation(s, &per_iteration, labels).await,
                    Err(error) => Err(error),
                };
                self.set_lexical_environment(old)?;
                result
            }
            Some(ForInit::Variable(decl)) => {
                self.variable_declaration(decl).await?;
                self.for_body_evaluation(s, &[], labels).await
            }
            Some(ForInit::Expression(init)) => {
                self.evaluate_expression(init).await?;
                self.for_body_evaluation(s, &[], labels).await
            }
            None => self.for_body_evaluation(s, &[], labels).await,
        }
    }

    /// ForBodyEvaluation(test, increment, stmt, perIterationBindings, labelSet)
    async fn for_body_evaluation(
        &self,
        s: &ForStatement,
        per_iteration: &[JsString],
        labels: &[JsString],
    ) -> JsResult<Completion> {
        let mut value = Value::Undefined;
        self.create_per_iteration_environment(per_iteration)?;
        loop {
            if let Some(test) = &s.test {
                if !self.evaluate_expression(test).await?.to_boolean() {
                    return Ok(Completion::Normal(Some(value)));
                }
            }
            let result = self.evaluate_statement(&s.body, &[]).await?;
            if !result.loop_continues(labels) {
                return Ok(exit_breakable(result.update_empty(Some(value))));
            }
            if let Some(v) = result.value() {
                value = v.cheap_clone();
            }
            self.create_per_iteration_environment(per_iteration)?;
            if let Some(update) = &s.update {
                self.evaluate_expression(update).await?;
            }
        }
    }

    /// CreatePerIterationEnvironment(perIterationBindings)
    fn create_per_iteration_environment(&self, names: &[JsString]) -> JsResult<()> {
        if names.is_empty() {
            return Ok(());
        }
        let last = self.lexical_environment()?;
        let outer = self.outer_environment(last)?;
        let env = self.new_declarative_environment(outer);
        for name in names {
            self.create_mutable_binding(env, name, false)?;
            let value = self.get_binding_value(last, name, true)?;
            self.initialize_binding(env, name, value)?;
        }
        self.set_lexical_environment(env)
    }

    /// ForIn/OfHeadEvaluation: the iterated expression sees the loop's
    /// lexical names in their temporal dead zone.
    async fn for_in_of_head(&self, left: &ForInOfLeft, right: &Expression) -> JsResult<Value> {
        let mut names = Vec::new();
        if let ForInOfLeft::Variable(VariableKind::Let | VariableKind::Const, pattern) = left {
            bound_names(pattern, &mut names);
        }
        if names.is_empty() {
            return self.evaluate_expression(right).await;
        }
        let old = self.lexical_environment()?;
        let tdz = self.new_declarative_environment(Some(old));
        for name in &names {
            self.create_mutable_binding(tdz, name, false)?;
        }
        self.set_lexical_environment(tdz)?;
        let result = self.evaluate_expression(right).await;
        self.set_lexical_environment(old)?;
        result
    }

    async fn for_in_statement(&self, s: &ForInStatement, labels: &[JsString]) -> JsResult<Completion> {
        let value = self.for_in_of_head(&s.left, &s.right).await?;
        if value.is_nullish() {
            return Ok(Completion::Normal(Some(Value::Undefined)));
        }
        let object = self.to_object(&value)?;
        let iteration = ForIteration::Enumerate(ForInIterator::new(object));
        self.for_in_of_body_evaluation(&s.left, &s.body, iteration, labels)
            .await
    }

    async fn for_of_statement(&self, s: &ForOfStatement, labels: &[JsString]) -> JsResult<Completion> {
        let value = self.for_in_of_head(&s.left, &s.right).await?;
        let iteration = if s.await_ {
            ForIteration::AsyncIterate(self.get_iterator(&value, IteratorHint::Async)?)
        } else {
            ForIteration::Iterate(self.get_iterator(&value, IteratorHint::Sync)?)
        };
        self.for_in_of_body_evaluation(&s.left, &s.body, iteration, labels)
            .await
    }

    /// ForIn/OfBodyEvaluation(lhs, stmt, iteratorRecord, iterationKind,
    /// lhsKind, labelSet, iteratorKind)
    async fn for_in_of_body_evaluation(
        &self,
        left: &ForInOfLeft,
        body: &Statement,
        mut iteration: ForIteration,
        labels: &[JsString],
    ) -> JsResult<Completion> {
        let old = self.lexical_environment()?;
        let mut value = Value::Undefined;
        loop {
            let next = match &mut iteration {
                ForIteration::Enumerate(keys) => keys.next(self)?,
                ForIteration::Iterate(record) => self.iterator_step_value(record)?,
                ForIteration::AsyncIterate(record) => {
                    let result =
                        self.call(&record.next_method, &Value::Object(record.iterator), &[])?;
                    let Value::Object(result) = self.await_value(result).await? else {
                        return Err(JsError::type_error("Iterator result is not an object"));
                    };
                    if self.iterator_complete(result)? {
                        None
                    } else {
                        Some(self.iterator_value(result)?)
                    }
                }
            };
            let Some(next) = next else {
                return Ok(Completion::Normal(Some(value)));
            };
            let result = match self.for_binding(left, next).await {
                Ok(()) => self.evaluate_statement(body, &[]).await,
                Err(error) => Err(error),
            };
            self.set_lexical_environment(old)?;
            let completion = match result {
                Ok(completion) if completion.loop_continues(labels) => {
                    if let Some(v) = completion.value() {
                        value = v.cheap_clone();
                    }
                    continue;
                }
                Ok(completion) => Ok(exit_breakable(completion.update_empty(Some(value)))),
                Err(error) => Err(error),
            };
            return match &iteration {
                ForIteration::Enumerate(_) => completion,
                ForIteration::Iterate(record) => self.iterator_close(record, completion),
                ForIteration::AsyncIterate(record) => {
                    self.async_iterator_close(record, completion).await
                }
            };
        }
    }

    /// Bind the loop head to one value: assignment for `var` and plain
    /// targets, a fresh environment for `let`/`const`.
    async fn for_binding(&self, left: &ForInOfLeft, value: Value) -> JsResult<()> {
        match left {
            ForInOfLeft::Pattern(pattern) | ForInOfLeft::Variable(VariableKind::Var, pattern) => {
                self.binding_initialization(pattern, value, None).await
            }
            ForInOfLeft::Variable(kind, pattern) => {
                let old = self.lexical_environment()?;
                let env = self.new_declarative_environment(Some(old));
                let mut names = Vec::new();
                bound_names(pattern, &mut names);
                for name in &names {
                    if *kind == VariableKind::Const {
                        self.create_immutable_binding(env, name, true)?;
                    } else {
                        self.create_mutable_binding(env, name, false)?;
                    }
                }
                self.set_lexical_environment(env)?;
                self.binding_initialization(pattern, value, Some(env)).await
            }
        }
    }

    // ============ SWITCH AND TRY ============

    async fn switch_statement(&self, s: &SwitchStatement) -> JsResult<Completion> {
        let input = self.evaluate_expression(&s.discriminant).await?;
        if s.scope.is_empty() {
            return Ok(exit_breakable(self.case_block(&s.cases, &input).await?));
        }
        let old = self.lexical_environment()?;
        let env = self.new_declarative_environment(Some(old));
        self.block_declaration_instantiation(&s.scope, env)?;
        self.set_lexical_environment(env)?;
        let result = self.case_block(&s.cases, &input).await;
        self.set_lexical_environment(old)?;
        Ok(exit_breakable(result?))
    }

    /// CaseBlockEvaluation: the first `case` strictly equal to the input in
    /// source order, else `default`, then fall through.
    async fn case_block(&self, cases: &[SwitchCase], input: &Value) -> JsResult<Completion> {
        let mut start = None;
        for (index, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let candidate = self.evaluate_expression(test).await?;
                if input.strict_equals(&candidate) {
                    start = Some(index);
                    break;
                }
            }
        }
        let start = start.or_else(|| cases.iter().position(|case| case.test.is_none()));
        let mut value = Value::Undefined;
        if let Some(start) = start {
            for case in cases.iter().skip(start) {
                let result = self.evaluate_statement_list(&case.consequent).await?;
                if let Some(v) = result.value() {
                    value = v.cheap_clone();
                }
                if result.is_abrupt() {
                    return Ok(result.update_empty(Some(value)));
                }
            }
        }
        Ok(Completion::Normal(Some(value)))
    }

    async fn try_statement(&self, s: &TryStatement) -> JsResult<Completion> {
        let result = match (self.block(&s.block.body, &s.block.scope).await, &s.handler) {
            (Err(error), Some(handler)) if error.is_catchable() => match self.catchable_value(error) {
                Ok(thrown) => self.catch_clause(handler, thrown).await,
                Err(error) => Err(error),
            },
            (result, _) => result,
        };
        let result = match &s.finalizer {
            Some(finalizer) if !matches!(&result, Err(error) if error.is_fatal()) => {
                let after = self.block(&finalizer.body, &finalizer.scope).await?;
                if after.is_abrupt() {
                    Ok(after)
                } else {
                    result
                }
            }
            _ => result,
        };
        result.map(|completion| completion.update_empty(Some(Value::Undefined)))
    }

    async fn catch_clause(&self, handler: &CatchClause, thrown: Value) -> JsResult<Completion> {
        let Some(param) = &handler.param else {
            return self.block(&handler.body.body, &handler.body.scope).await;
        };
        let old = self.lexical_environment()?;
        let env = self.new_declarative_environment(Some(old));
        let mut names = Vec::new();
        bound_names(param, &mut names);
        for name in &names {
            self.create_mutable_binding(env, name, false)?;
        }
        self.set_lexical_environment(env)?;
        let result = match self.binding_initialization(param, thrown, Some(env)).await {
            Ok(()) => self.block(&handler.body.body, &handler.body.scope).await,
            Err(error) => Err(error),
        };
        self.set_lexical_environment(old)?;
        result
    }

    // ============ REFERENCES ============

    /// ResolveBinding(name) against the running lexical environment.
    pub(crate) fn resolve_binding(&self, name: &JsString) -> JsResult<Reference> {
        let env = self.lexical_environment()?;
        Ok(Reference::Binding {
            env: self.get_identifier_environment(Some(env), name)?,
            name: name.cheap_clone(),
            strict: self.is_strict(),
        })
    }

    /// GetValue(V)
    pub(crate) fn get_value(&self, reference: &Reference) -> JsResult<Value> {
        match reference {
            Reference::Value(value) => Ok(value.cheap_clone()),
            Reference::Binding { env: None, name, .. } => Err(JsError::not_defined(name)),
            Reference::Binding {
                env: Some(env),
                name,
                strict,
            } => self.get_binding_value(*env, name, *strict),
            Reference::Property {
                base,
                key,
                this: Some(this),
                ..
            } => {
                let object = self.to_object(base)?;
                self.get_with_receiver(object, key, this)
            }
            Reference::Property { base, key, .. } => self.get_v(base, key),
        }
    }

    /// PutValue(V, W)
    pub(crate) fn put_value(&self, reference: &Reference, value: Value) -> JsResult<()> {
        match reference {
            Reference::Value(_) => Err(JsError::reference_error("Invalid assignment target")),
            Reference::Binding {
                env: None,
                name,
                strict: true,
            } => Err(JsError::not_defined(name)),
            Reference::Binding { env: None, name, .. } => {
                let global = self.current_realm()?.global_object;
                self.set(global, &PropertyKey::from(name.cheap_clone()), value, false)
            }
            Reference::Binding {
                env: Some(env),
                name,
                strict,
            } => self.set_mutable_binding(*env, name, value, *strict),
            Reference::Property {
                base,
                key,
                this,
                strict,
            } => {
                if base.is_nullish() {
                    return Err(JsError::type_error(format!(
                        "Cannot set properties of {} (setting '{}')",
                        self.display(base),
                        key
                    )));
                }
                let object = self.to_object(base)?;
                let receiver = this.as_ref().unwrap_or(base);
                let ok = self.set_with_receiver(object, key, value, receiver)?;
                if !ok && *strict {
                    return Err(JsError::type_error(format!(
                        "Cannot assign to read only property '{}' of object",
                        key
                    )));
                }
                Ok(())
            }
        }
    }

    /// The `this` value a call through `reference` receives.
    fn reference_this(&self, reference: &Reference) -> JsResult<Value> {
        match reference {
            Reference::Property {
                this: Some(this), ..
            } => Ok(this.cheap_clone()),
            Reference::Property { base, .. } => Ok(base.cheap_clone()),
            Reference::Binding { env: Some(env), .. } => Ok(self
                .with_base_object(*env)?
                .map_or(Value::Undefined, Value::Object)),
            _ => Ok(Value::Undefined),
        }
    }

    /// Evaluate an expression to a Reference Record. Expressions that do
    /// not denote a reference come back as `Reference::Value`.
    pub(crate) fn evaluate_reference<'a>(&'a self, expression: &'a Expression) -> EvalFuture<'a, Reference> {
        Box::pin(async move {
            match expression {
                Expression::Identifier(id) => self.resolve_binding(&id.name),
                Expression::Member(member) => {
                    let base = self.evaluate_expression(&member.object).await?;
                    if member.optional && base.is_nullish() {
                        return Err(JsError::OptionalChainShortCircuit);
                    }
                    let key = self.member_key(&member.property).await?;
                    Ok(Reference::Property {
                        base,
                        key,
                        this: None,
                        strict: self.is_strict(),
                    })
                }
                Expression::SuperMember(member) => {
                    let env = self.get_this_environment()?;
                    let this = self.get_this_binding(env)?;
                    let key = self.member_key(&member.property).await?;
                    let base = self.get_super_base(env)?;
                    Ok(Reference::Property {
                        base,
                        key,
                        this: Some(this),
                        strict: true,
                    })
                }
                Expression::Parenthesized(inner, _) => self.evaluate_reference(inner).await,
                Expression::OptionalChain(chain) => match self.evaluate_reference(&chain.base).await {
                    Err(JsError::OptionalChainShortCircuit) => Ok(Reference::Value(Value::Undefined)),
                    other => other,
                },
                other => Ok(Reference::Value(self.evaluate_expression(other).await?)),
            }
        })
    }

    async fn member_key(&self, property: &MemberProperty) -> JsResult<PropertyKey> {
        match property {
            MemberProperty::Identifier(id) => Ok(PropertyKey::from(id.name.cheap_clone())),
            MemberProperty::Expression(expression) => {
                let value = self.evaluate_expression(expression).await?;
                self.to_property_key(&value)
            }
        }
    }

    /// Evaluation of a property name in an object literal, class body or
    /// object pattern.
    pub(crate) async fn evaluate_property_key(&self, key: &ObjectPropertyKey) -> JsResult<PropertyKey> {
        match key {
            ObjectPropertyKey::Identifier(id) => Ok(PropertyKey::from(id.name.cheap_clone())),
            ObjectPropertyKey::String(s) => Ok(PropertyKey::from(s.cheap_clone())),
            ObjectPropertyKey::Number(n) => Ok(PropertyKey::from(number_to_js_string(*n))),
            ObjectPropertyKey::Computed(expression) => {
                let value = self.evaluate_expression(expression).await?;
                self.to_property_key(&value)
            }
        }
    }

    // ============ EXPRESSIONS ============

    /// Evaluate an expression to a value.
    pub(crate) fn evaluate_expression<'a>(&'a self, expression: &'a Expression) -> EvalFuture<'a, Value> {
        Box::pin(Self::stack_guarded(Box::pin(self.expression(expression))))
    }

    /// NamedEvaluation: anonymous function and class definitions take
    /// `name`; anything else evaluates normally.
    pub(crate) fn named_evaluation<'a>(
        &'a self,
        expression: &'a Expression,
        name: &'a PropertyKey,
    ) -> EvalFuture<'a, Value> {
        Box::pin(async move {
            match expression {
                Expression::Parenthesized(inner, _) => self.named_evaluation(inner, name).await,
                Expression::Function(code) if code.id.is_none() => {
                    self.function_expression(code, Some(name))
                }
                Expression::ArrowFunction(code) => {
                    let env = self.lexical_environment()?;
                    let f = self.instantiate_function(code, env, Some(name), None)?;
                    Ok(Value::Object(f))
                }
                Expression::Class(class) if class.id.is_none() => {
                    let f = self
                        .class_definition_evaluation(class, None, name.cheap_clone())
                        .await?;
                    Ok(Value::Object(f))
                }
                other => self.evaluate_expression(other).await,
            }
        })
    }

    /// An initializer bound to `name`: anonymous functions are named after
    /// the binding.
    async fn initializer_value(&self, expression: &Expression, name: &PropertyKey) -> JsResult<Value> {
        if expression.is_anonymous_function_definition() {
            self.named_evaluation(expression, name).await
        } else {
            self.evaluate_expression(expression).await
        }
    }

    async fn expression(&self, expression: &Expression) -> JsResult<Value> {
        match expression {
            Expression::Literal(literal) => Ok(match &literal.value {
                LiteralValue::Null => Value::Null,
                LiteralValue::Boolean(b) => Value::Boolean(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::String(s) => Value::String(s.cheap_clone()),
            }),
            Expression::Array(array) => self.array_literal(array).await,
            Expression::Object(object) => Ok(Value::Object(self.object_literal(object).await?)),
            Expression::Function(code) => self.function_expression(code, None),
            Expression::ArrowFunction(code) => {
                let env = self.lexical_environment()?;
                let f = self.instantiate_function(code, env, Some(&self.key("")), None)?;
                Ok(Value::Object(f))
            }
            Expression::Class(class) => {
                let binding = class.id.as_ref().map(|id| id.name.cheap_clone());
                let name = binding
                    .as_ref()
                    .map_or_else(|| self.key(""), |name| PropertyKey::from(name.cheap_clone()));
                let f = self.class_definition_evaluation(class, binding, name).await?;
                Ok(Value::Object(f))
            }
            Expression::Template(template) => self.template_literal(template).await,
            Expression::TaggedTemplate(tagged) => {
                let (func, this) = self.callee_and_this(&tagged.tag).await?;
                let site = self.get_template_object(&tagged.quasi)?;
                let mut args = vec![Value::Object(site)];
                for expression in &tagged.quasi.expressions {
                    args.push(self.evaluate_expression(expression).await?);
                }
                if !self.is_callable(&func) {
                    return Err(JsError::type_error(format!(
                        "{} is not a function",
                        callee_text(&tagged.tag)
                    )));
                }
                self.tick_at(tagged.span)?;
                self.call(&func, &this, &args)
            }
            Expression::Identifier(_)
            | Expression::Member(_)
            | Expression::SuperMember(_)
            | Expression::OptionalChain(_) => {
                let reference = self.evaluate_reference(expression).await?;
                self.get_value(&reference)
            }
            Expression::This(_) => self.resolve_this_binding(),
            Expression::NewTarget(_) => self.get_new_target(),
            Expression::Unary(unary) => self.unary_expression(unary).await,
            Expression::Binary(binary) => {
                let left = self.evaluate_expression(&binary.left).await?;
                let right = self.evaluate_expression(&binary.right).await?;
                self.apply_binary(binary.operator, &left, &right)
            }
            Expression::Logical(logical) => {
                let left = self.evaluate_expression(&logical.left).await?;
                let short_circuit = match logical.operator {
                    LogicalOp::And => !left.to_boolean(),
                    LogicalOp::Or => left.to_boolean(),
                    LogicalOp::NullishCoalescing => !left.is_nullish(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate_expression(&logical.right).await
                }
            }
            Expression::Conditional(conditional) => {
                if self.evaluate_expression(&conditional.test).await?.to_boolean() {
                    self.evaluate_expression(&conditional.consequent).await
                } else {
                    self.evaluate_expression(&conditional.alternate).await
                }
            }
            Expression::Assignment(assignment) => self.assignment_expression(assignment).await,
            Expression::Update(update) => self.update_expression(update).await,
            Expression::Sequence(sequence) => {
                let mut value = Value::Undefined;
                for expression in &sequence.expressions {
                    value = self.evaluate_expression(expression).await?;
                }
                Ok(value)
            }
            Expression::Call(call) => self.call_expression(call).await,
            Expression::SuperCall(call) => {
                let env = self.get_this_environment()?;
                let (active, new_target) = self
                    .function_environment_parts(env)?
                    .ok_or_else(|| JsError::runtime_syntax_error("'super' keyword unexpected here"))?;
                let Some(new_target) = new_target else {
                    return Err(JsError::runtime_syntax_error("'super' keyword unexpected here"));
                };
                let parent = self.get_prototype_of(active)?;
                let args = self.argument_list(&call.arguments).await?;
                let parent = match parent {
                    Some(parent) if self.is_constructor(&Value::Object(parent)) => parent,
                    _ => return Err(JsError::type_error("Super constructor is not a constructor")),
                };
                self.tick_at(call.span)?;
                let result = self.construct(parent, &args, Some(new_target))?;
                self.bind_this_value(env, Value::Object(result))?;
                self.initialize_instance_elements(result, active)?;
                Ok(Value::Object(result))
            }
            Expression::New(new) => {
                let ctor = self.evaluate_expression(&new.callee).await?;
                let args = self.argument_list(&new.arguments).await?;
                let ctor = match &ctor {
                    Value::Object(obj) if self.is_constructor(&ctor) => *obj,
                    _ => {
                        return Err(JsError::type_error(format!(
                            "{} is not a constructor",
                            callee_text(&new.callee)
                        )))
                    }
                };
                self.tick_at(new.span)?;
                Ok(Value::Object(self.construct(ctor, &args, None)?))
            }
            Expression::Yield(y) => {
                let value = match &y.argument {
                    Some(argument) => self.evaluate_expression(argument).await?,
                    None => Value::Undefined,
                };
                if y.delegate {
                    self.generator_yield_delegate(value).await
                } else {
                    self.generator_yield(value).await
                }
            }
            Expression::Await(a) => {
                let value = self.evaluate_expression(&a.argument).await?;
                self.await_value(value).await
            }
            Expression::Parenthesized(inner, _) => self.evaluate_expression(inner).await,
        }
    }

    async fn array_literal(&self, array: &ArrayExpression) -> JsResult<Value> {
        let result = self.array_create(0, None)?;
        let mut index: usize = 0;
        for element in &array.elements {
            match element {
                None => index += 1,
                Some(ArrayElement::Expression(expression)) => {
                    let value = self.evaluate_expression(expression).await?;
                    self.create_data_property_or_throw(result, PropertyKey::from(index), value)?;
                    index += 1;
                }
                Some(ArrayElement::Spread(spread)) => {
                    let iterable = self.evaluate_expression(&spread.argument).await?;
                    let mut record = self.get_iterator(&iterable, IteratorHint::Sync)?;
                    while let Some(value) = self.iterator_step_value(&mut record)? {
                        self.create_data_property_or_throw(result, PropertyKey::from(index), value)?;
                        index += 1;
                    }
                }
            }
        }
        self.set(result, &self.key("length"), Value::Number(index as f64), true)?;
        Ok(Value::Object(result))
    }

    /// Function expression evaluation. A named expression binds its own
    /// name in an intermediate environment.
    fn function_expression(&self, code: &Rc<Function>, name: Option<&PropertyKey>) -> JsResult<Value> {
        let env = self.lexical_environment()?;
        match &code.id {
            Some(id) => {
                let func_env = self.new_declarative_environment(Some(env));
                self.create_immutable_binding(func_env, &id.name, false)?;
                let key = PropertyKey::from(id.name.cheap_clone());
                let f = self.instantiate_function(code, func_env, Some(&key), None)?;
                self.initialize_binding(func_env, &id.name, Value::Object(f))?;
                Ok(Value::Object(f))
            }
            None => {
                let anonymous = self.key("");
                let f = self.instantiate_function(code, env, Some(name.unwrap_or(&anonymous)), None)?;
                Ok(Value::Object(f))
            }
        }
    }

    async fn template_literal(&self, template: &TemplateLiteral) -> JsResult<Value> {
        let mut out = String::new();
        let mut expressions = template.expressions.iter();
        for quasi in &template.quasis {
            if let Some(cooked) = &quasi.cooked {
                out.push_str(cooked.as_str());
            }
            if let Some(expression) = expressions.next() {
                let value = self.evaluate_expression(expression).await?;
                out.push_str(self.to_string(&value)?.as_str());
            }
        }
        Ok(Value::String(JsString::from(out)))
    }

    /// GetTemplateObject(templateLiteral): one frozen strings array with a
    /// frozen `raw` array per site and realm.
    fn get_template_object(&self, site: &Rc<TemplateLiteral>) -> JsResult<ObjectId> {
        if let Some(template) = self.cached_template(site)? {
            return Ok(template);
        }
        let cooked = site
            .quasis
            .iter()
            .map(|quasi| quasi.cooked.clone().map_or(Value::Undefined, Value::String))
            .collect();
        let raw = site
            .quasis
            .iter()
            .map(|quasi| Value::String(quasi.raw.cheap_clone()))
            .collect();
        let template = self.create_array_from_list(cooked)?;
        let raw = self.create_array_from_list(raw)?;
        self.set_integrity_level(raw, IntegrityLevel::Frozen)?;
        self.define_property_or_throw(
            template,
            &self.key("raw"),
            PropertyDescriptor::data(Value::Object(raw), false, false, false),
        )?;
        self.set_integrity_level(template, IntegrityLevel::Frozen)?;
        self.cache_template(site, template)?;
        Ok(template)
    }

    async fn unary_expression(&self, unary: &UnaryExpression) -> JsResult<Value> {
        match unary.operator {
            UnaryOp::Delete => self.delete_expression(&unary.argument).await,
            UnaryOp::Typeof => {
                let value = match unary.argument.unparenthesized() {
                    Expression::Identifier(id) => match self.resolve_binding(&id.name)? {
                        Reference::Binding { env: None, .. } => Value::Undefined,
                        reference => self.get_value(&reference)?,
                    },
                    _ => self.evaluate_expression(&unary.argument).await?,
                };
                Ok(Value::String(self.intern(self.type_of(&value))))
            }
            UnaryOp::Void => {
                self.evaluate_expression(&unary.argument).await?;
                Ok(Value::Undefined)
            }
            UnaryOp::Not => Ok(Value::Boolean(
                !self.evaluate_expression(&unary.argument).await?.to_boolean(),
            )),
            UnaryOp::Minus => {
                let value = self.evaluate_expression(&unary.argument).await?;
                Ok(Value::Number(-self.to_number(&value)?))
            }
            UnaryOp::Plus => {
                let value = self.evaluate_expression(&unary.argument).await?;
                Ok(Value::Number(self.to_number(&value)?))
            }
            UnaryOp::BitNot => {
                let value = self.evaluate_expression(&unary.argument).await?;
                Ok(Value::Number(f64::from(!self.to_int32(&value)?)))
            }
        }
    }

    async fn delete_expression(&self, argument: &Expression) -> JsResult<Value> {
        let reference = match self.evaluate_reference(argument).await {
            Ok(reference) => reference,
            Err(JsError::OptionalChainShortCircuit) => return Ok(Value::Boolean(true)),
            Err(error) => return Err(error),
        };
        let deleted = match reference {
            Reference::Value(_) | Reference::Binding { env: None, .. } => true,
            Reference::Binding {
                env: Some(env),
                name,
                ..
            } => self.delete_binding(env, &name)?,
            Reference::Property { this: Some(_), .. } => {
                return Err(JsError::reference_error("Unsupported reference to 'super'"));
            }
            Reference::Property {
                base, key, strict, ..
            } => {
                let object = self.to_object(&base)?;
                let deleted = self.delete(object, &key)?;
                if !deleted && strict {
                    return Err(JsError::type_error(format!(
                        "Cannot delete property '{}' of {}",
                        key,
                        self.display(&base)
                    )));
                }
                deleted
            }
        };
        Ok(Value::Boolean(deleted))
    }

    async fn assignment_expression(&self, assignment: &AssignmentExpression) -> JsResult<Value> {
        let target = match &assignment.left {
            AssignmentTarget::Pattern(pattern) => {
                let value = self.evaluate_expression(&assignment.right).await?;
                self.binding_initialization(pattern, value.cheap_clone(), None)
                    .await?;
                return Ok(value);
            }
            AssignmentTarget::Simple(target) => target,
        };
        let reference = self.evaluate_reference(target).await?;
        let name = match target.unparenthesized() {
            Expression::Identifier(id) => Some(PropertyKey::from(id.name.cheap_clone())),
            _ => None,
        };
        let value = match assignment.operator {
            AssignmentOp::Assign => match &name {
                Some(name) => self.initializer_value(&assignment.right, name).await?,
                None => self.evaluate_expression(&assignment.right).await?,
            },
            op @ (AssignmentOp::AndAssign | AssignmentOp::OrAssign | AssignmentOp::NullishAssign) => {
                let current = self.get_value(&reference)?;
                let keep = match op {
                    AssignmentOp::AndAssign => !current.to_boolean(),
                    AssignmentOp::OrAssign => current.to_boolean(),
                    _ => !current.is_nullish(),
                };
                if keep {
                    return Ok(current);
                }
                match &name {
                    Some(name) => self.initializer_value(&assignment.right, name).await?,
                    None => self.evaluate_expression(&assignment.right).await?,
                }
            }
            op => {
                let current = self.get_value(&reference)?;
                let right = self.evaluate_expression(&assignment.right).await?;
                let binary = op
                    .binary_op()
                    .ok_or_else(|| JsError::internal("compound assignment without an operator"))?;
                self.apply_binary(binary, &current, &right)?
            }
        };
        self.put_value(&reference, value.cheap_clone())?;
        Ok(value)
    }

    async fn update_expression(&self, update: &UpdateExpression) -> JsResult<Value> {
        let reference = self.evaluate_reference(&update.argument).await?;
        let old = self.to_number(&self.get_value(&reference)?)?;
        let new = match update.operator {
            UpdateOp::Increment => old + 1.0,
            UpdateOp::Decrement => old - 1.0,
        };
        self.put_value(&reference, Value::Number(new))?;
        Ok(Value::Number(if update.prefix { new } else { old }))
    }

    /// The function value of a callee and the `this` it is called with.
    async fn callee_and_this(&self, callee: &Expression) -> JsResult<(Value, Value)> {
        let reference = self.evaluate_reference(callee).await?;
        let func = self.get_value(&reference)?;
        let this = self.reference_this(&reference)?;
        Ok((func, this))
    }

    async fn call_expression(&self, call: &CallExpression) -> JsResult<Value> {
        let (func, this) = self.callee_and_this(&call.callee).await?;
        if call.optional && func.is_nullish() {
            return Err(JsError::OptionalChainShortCircuit);
        }
        let args = self.argument_list(&call.arguments).await?;
        if !self.is_callable(&func) {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                callee_text(&call.callee)
            )));
        }
        self.tick_at(call.span)?;
        self.call(&func, &this, &args)
    }

    /// ArgumentListEvaluation with spread arguments flattened.
    async fn argument_list(&self, arguments: &[Argument]) -> JsResult<Vec<Value>> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match argument {
                Argument::Expression(expression) => {
                    values.push(self.evaluate_expression(expression).await?);
                }
                Argument::Spread(spread) => {
                    let iterable = self.evaluate_expression(&spread.argument).await?;
                    values.extend(self.iterate_to_list(&iterable)?);
                }
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::string_dict::StringDict;

    fn first_expression(source: &str) -> Expression {
        let mut dict = StringDict::new();
        let program = parser::parse_script(source, &mut dict).unwrap();
        match program.body.into_iter().next() {
            Some(Statement::Expression(s)) => s.expression,
            other => panic!("expected an expression statement, got {:?}", other),
        }
    }

    #[test]
    fn callee_text_names_member_chains() {
        assert_eq!(callee_text(&first_expression("a.b.c")), "a.b.c");
        assert_eq!(callee_text(&first_expression("a[0]")), "a[...]");
        assert_eq!(callee_text(&first_expression("(f)")), "f");
        assert_eq!(callee_text(&first_expression("f()")), "f(...)");
        assert_eq!(callee_text(&first_expression("1 + 2")), "expression");
    }

    #[test]
    fn breaks_without_label_end_the_loop() {
        let done = exit_breakable(Completion::Break(None, Some(Value::Number(1.0))));
        assert!(matches!(done, Completion::Normal(Some(Value::Number(n))) if n == 1.0));
        let labelled = exit_breakable(Completion::Break(Some(JsString::from("outer")), None));
        assert!(matches!(labelled, Completion::Break(Some(_), None)));
    }
}
