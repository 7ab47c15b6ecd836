//! Object initializer evaluation

use crate::ast::{Expression, ObjectExpression, ObjectProperty, Property, PropertyKind};
use crate::error::JsResult;
use crate::interpreter::object::PropertyDescriptor;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::Value;

impl Interpreter {
    /// Evaluation of an ObjectLiteral: properties are defined in source
    /// order, spreads copy own enumerable properties.
    pub(crate) async fn object_literal(&self, literal: &ObjectExpression) -> JsResult<ObjectId> {
        let object = self.ordinary_object()?;
        for property in &literal.properties {
            match property {
                ObjectProperty::Spread(spread) => {
                    let source = self.evaluate_expression(&spread.argument).await?;
                    self.copy_data_properties(object, &source, &[])?;
                }
                ObjectProperty::Property(property) => {
                    self.property_definition(object, property).await?;
                }
            }
        }
        Ok(object)
    }

    /// PropertyDefinitionEvaluation
    async fn property_definition(&self, object: ObjectId, property: &Property) -> JsResult<()> {
        let plain = property.kind == PropertyKind::Init && !property.method;
        if plain && !property.shorthand && property.key.is_proto() {
            // `__proto__: value` sets the prototype instead of a property
            let value = self.evaluate_expression(&property.value).await?;
            if let Value::Object(_) | Value::Null = value {
                self.set_prototype_of(object, value.as_object())?;
            }
            return Ok(());
        }
        let key = self.evaluate_property_key(&property.key).await?;
        match (&property.value, property.kind) {
            (Expression::Function(code), PropertyKind::Init) if property.method => {
                let env = self.lexical_environment()?;
                let closure = self.instantiate_function(code, env, Some(&key), Some(object))?;
                self.define_method_property(object, key, closure, true)
            }
            (Expression::Function(code), kind @ (PropertyKind::Get | PropertyKind::Set)) => {
                let env = self.lexical_environment()?;
                let closure = Value::Object(self.instantiate_function(code, env, Some(&key), Some(object))?);
                let (get, set) = if kind == PropertyKind::Get {
                    (Some(closure), None)
                } else {
                    (None, Some(closure))
                };
                self.define_property_or_throw(
                    object,
                    &key,
                    PropertyDescriptor {
                        get,
                        set,
                        enumerable: Some(true),
                        configurable: Some(true),
                        ..PropertyDescriptor::default()
                    },
                )
            }
            (value, _) => {
                let value = if value.is_anonymous_function_definition() {
                    self.named_evaluation(value, &key).await?
                } else {
                    self.evaluate_expression(value).await?
                };
                self.create_data_property_or_throw(object, key, value)
            }
        }
    }
}
