//! Binding initialization and destructuring
//!
//! One walk serves declarations, parameters and destructuring assignment:
//! with an environment the bound names are initialized in it, without one
//! each target is resolved and assigned with PutValue.

use crate::ast::{ArrayPattern, ObjectPattern, ObjectPatternProperty, Pattern};
use crate::error::JsResult;
use crate::interpreter::iteration::{IteratorHint, IteratorRecord};
use crate::interpreter::{EnvId, Interpreter};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

use super::{EvalFuture, Reference};

impl Interpreter {
    /// IteratorBindingInitialization of a formal parameter list over the
    /// argument values.
    pub(crate) fn bind_parameters<'a>(
        &'a self,
        params: &'a [Pattern],
        args: &'a [Value],
        env: Option<EnvId>,
    ) -> EvalFuture<'a, ()> {
        Box::pin(async move {
            for (index, param) in params.iter().enumerate() {
                match param {
                    Pattern::Rest(rest) => {
                        let remaining = args.get(index..).unwrap_or_default().to_vec();
                        let array = self.create_array_from_list(remaining)?;
                        self.binding_initialization(&rest.argument, Value::Object(array), env)
                            .await?;
                    }
                    other => {
                        let value = args.get(index).cloned().unwrap_or(Value::Undefined);
                        self.binding_element(other, value, env, None).await?;
                    }
                }
            }
            Ok(())
        })
    }

    /// BindingInitialization(pattern, value, environment)
    pub(crate) fn binding_initialization<'a>(
        &'a self,
        pattern: &'a Pattern,
        value: Value,
        env: Option<EnvId>,
    ) -> EvalFuture<'a, ()> {
        Box::pin(async move {
            match pattern {
                Pattern::Identifier(id) => self.initialize_bound_name(&id.name, value, env),
                Pattern::Object(object) => {
                    self.require_object_coercible(&value)?;
                    self.object_binding(object, &value, env).await
                }
                Pattern::Array(array) => {
                    let mut record = self.get_iterator(&value, IteratorHint::Sync)?;
                    let result = self.array_binding(array, &mut record, env).await;
                    if record.done {
                        result
                    } else {
                        self.iterator_close(&record, result)
                    }
                }
                Pattern::Assignment(_) => self.binding_element(pattern, value, env, None).await,
                Pattern::Rest(rest) => self.binding_initialization(&rest.argument, value, env).await,
                Pattern::Expression(target) => {
                    let reference = self.evaluate_reference(target).await?;
                    self.put_value(&reference, value)
                }
            }
        })
    }

    /// InitializeBoundName(name, value, environment)
    fn initialize_bound_name(&self, name: &JsString, value: Value, env: Option<EnvId>) -> JsResult<()> {
        match env {
            Some(env) => self.initialize_binding(env, name, value),
            None => {
                let reference = self.resolve_binding(name)?;
                self.put_value(&reference, value)
            }
        }
    }

    /// In destructuring assignment a member-expression target is evaluated
    /// before the value it receives is read.
    async fn element_target(&self, pattern: &Pattern, env: Option<EnvId>) -> JsResult<Option<Reference>> {
        if env.is_some() {
            return Ok(None);
        }
        let target = match pattern {
            Pattern::Expression(target) => target,
            Pattern::Assignment(assignment) => match assignment.left.as_ref() {
                Pattern::Expression(target) => target,
                _ => return Ok(None),
            },
            _ => return Ok(None),
        };
        Ok(Some(self.evaluate_reference(target).await?))
    }

    /// A single element: apply a default when the value is `undefined`,
    /// then bind it. `target` is the already evaluated assignment target.
    async fn binding_element(
        &self,
        pattern: &Pattern,
        value: Value,
        env: Option<EnvId>,
        target: Option<Reference>,
    ) -> JsResult<()> {
        let (pattern, value) = match pattern {
            Pattern::Assignment(assignment) => {
                let value = if value.is_undefined() {
                    match assignment.left.as_ref() {
                        Pattern::Identifier(id) if assignment.right.is_anonymous_function_definition() => {
                            let name = PropertyKey::from(id.name.cheap_clone());
                            self.named_evaluation(&assignment.right, &name).await?
                        }
                        _ => self.evaluate_expression(&assignment.right).await?,
                    }
                } else {
                    value
                };
                (assignment.left.as_ref(), value)
            }
            other => (other, value),
        };
        match target {
            Some(reference) => self.put_value(&reference, value),
            None => self.binding_initialization(pattern, value, env).await,
        }
    }

    async fn object_binding(&self, pattern: &ObjectPattern, value: &Value, env: Option<EnvId>) -> JsResult<()> {
        let mut excluded: Vec<PropertyKey> = Vec::new();
        for property in &pattern.properties {
            match property {
                ObjectPatternProperty::KeyValue { key, value: element, .. } => {
                    let key = self.evaluate_property_key(key).await?;
                    let target = self.element_target(element, env).await?;
                    let property_value = self.get_v(value, &key)?;
                    self.binding_element(element, property_value, env, target).await?;
                    excluded.push(key);
                }
                ObjectPatternProperty::Rest(rest) => {
                    let target = self.element_target(&rest.argument, env).await?;
                    let rest_object = self.ordinary_object()?;
                    self.copy_data_properties(rest_object, value, &excluded)?;
                    self.binding_element(&rest.argument, Value::Object(rest_object), env, target)
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn array_binding(
        &self,
        pattern: &ArrayPattern,
        record: &mut IteratorRecord,
        env: Option<EnvId>,
    ) -> JsResult<()> {
        for element in &pattern.elements {
            match element {
                None => {
                    if !record.done {
                        self.iterator_step(record)?;
                    }
                }
                Some(Pattern::Rest(rest)) => {
                    let target = self.element_target(&rest.argument, env).await?;
                    let mut values = Vec::new();
                    while !record.done {
                        if let Some(value) = self.iterator_step_value(record)? {
                            values.push(value);
                        }
                    }
                    let array = self.create_array_from_list(values)?;
                    self.binding_element(&rest.argument, Value::Object(array), env, target)
                        .await?;
                }
                Some(element) => {
                    let target = self.element_target(element, env).await?;
                    let value = if record.done {
                        Value::Undefined
                    } else {
                        self.iterator_step_value(record)?.unwrap_or(Value::Undefined)
                    };
                    self.binding_element(element, value, env, target).await?;
                }
            }
        }
        Ok(())
    }
}
