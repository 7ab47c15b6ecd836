//! Class definition evaluation

use crate::ast::{Class, ClassMember, MethodKind};
use crate::error::{JsError, JsResult};
use crate::interpreter::function::ClassFieldDefinition;
use crate::interpreter::object::{ObjectKind, PropertyDescriptor};
use crate::interpreter::{EnvId, Interpreter, ObjectId};
use crate::value::{CheapClone, JsString, PropertyKey, Value};

/// A static field or `static { }` block, run once the class binding is
/// initialized.
enum StaticElement {
    Field(ClassFieldDefinition),
    Block(ObjectId),
}

/// What the class body produced before its static elements run.
struct ClassParts {
    constructor: ObjectId,
    instance_fields: Vec<ClassFieldDefinition>,
    static_elements: Vec<StaticElement>,
}

impl Interpreter {
    /// ClassDefinitionEvaluation(classBinding, className). `binding` is the
    /// inner immutable name binding, `name` the constructor's `name`.
    pub(crate) async fn class_definition_evaluation(
        &self,
        class: &Class,
        binding: Option<JsString>,
        name: PropertyKey,
    ) -> JsResult<ObjectId> {
        let env = self.lexical_environment()?;
        let class_env = self.new_declarative_environment(Some(env));
        if let Some(binding) = &binding {
            self.create_immutable_binding(class_env, binding, true)?;
        }
        let intrinsics = self.current_realm()?.intrinsics;
        let (proto_parent, constructor_parent) = match &class.super_class {
            None => (Some(intrinsics.object_prototype), intrinsics.function_prototype),
            Some(expression) => {
                self.set_lexical_environment(class_env)?;
                let superclass = self.evaluate_expression(expression).await;
                self.set_lexical_environment(env)?;
                let superclass = superclass?;
                match &superclass {
                    Value::Null => (None, intrinsics.function_prototype),
                    Value::Object(parent) if self.is_constructor(&superclass) => {
                        match self.get(*parent, &self.key("prototype"))? {
                            Value::Object(proto) => (Some(proto), *parent),
                            Value::Null => (None, *parent),
                            _ => {
                                return Err(JsError::type_error(
                                    "Class extends value does not have valid prototype property",
                                ))
                            }
                        }
                    }
                    other => {
                        return Err(JsError::type_error(format!(
                            "Class extends value {} is not a constructor or null",
                            self.display(other)
                        )))
                    }
                }
            }
        };
        let proto = self.object_create(proto_parent, ObjectKind::Ordinary);

        self.set_lexical_environment(class_env)?;
        let parts = self
            .class_elements(class, class_env, proto, constructor_parent, &name)
            .await;
        self.set_lexical_environment(env)?;
        let parts = parts?;

        let f = parts.constructor;
        if let Some(binding) = &binding {
            self.initialize_binding(class_env, binding, Value::Object(f))?;
        }
        self.set_class_fields(f, parts.instance_fields)?;
        for element in parts.static_elements {
            match element {
                StaticElement::Field(field) => {
                    let value = match field.initializer {
                        Some(init) => self.call(&Value::Object(init), &Value::Object(f), &[])?,
                        None => Value::Undefined,
                    };
                    self.create_data_property_or_throw(f, field.name, value)?;
                }
                StaticElement::Block(block) => {
                    self.call(&Value::Object(block), &Value::Object(f), &[])?;
                }
            }
        }
        tracing::trace!(target: "ecmavm::eval", class = %name, "class defined");
        Ok(f)
    }

    /// The constructor plus every element of the class body, in order.
    async fn class_elements(
        &self,
        class: &Class,
        class_env: EnvId,
        proto: ObjectId,
        constructor_parent: ObjectId,
        name: &PropertyKey,
    ) -> JsResult<ClassParts> {
        let f = self.ordinary_function_create(constructor_parent, &class.constructor, class_env, Some(proto))?;
        self.set_function_name(f, name, None)?;
        self.make_constructor(f, false, Some(proto))?;
        self.make_class_constructor(f, class.super_class.is_some())?;
        self.define_property_or_throw(
            proto,
            &self.key("constructor"),
            PropertyDescriptor::data(Value::Object(f), true, false, true),
        )?;

        let mut instance_fields = Vec::new();
        let mut static_elements = Vec::new();
        for member in &class.members {
            match member {
                ClassMember::Method(method) => {
                    let home = if method.static_ { f } else { proto };
                    let key = self.evaluate_property_key(&method.key).await?;
                    let closure = self.instantiate_function(&method.value, class_env, Some(&key), Some(home))?;
                    match method.kind {
                        MethodKind::Method => self.define_method_property(home, key, closure, false)?,
                        MethodKind::Get => self.define_property_or_throw(
                            home,
                            &key,
                            PropertyDescriptor {
                                get: Some(Value::Object(closure)),
                                enumerable: Some(false),
                                configurable: Some(true),
                                ..PropertyDescriptor::default()
                            },
                        )?,
                        MethodKind::Set => self.define_property_or_throw(
                            home,
                            &key,
                            PropertyDescriptor {
                                set: Some(Value::Object(closure)),
                                enumerable: Some(false),
                                configurable: Some(true),
                                ..PropertyDescriptor::default()
                            },
                        )?,
                    }
                }
                ClassMember::Field(field) => {
                    let home = if field.static_ { f } else { proto };
                    let key = self.evaluate_property_key(&field.key).await?;
                    let initializer = match &field.initializer {
                        Some(code) => {
                            let init = self.instantiate_function(code, class_env, None, Some(home))?;
                            self.set_field_name(init, key.cheap_clone())?;
                            Some(init)
                        }
                        None => None,
                    };
                    let definition = ClassFieldDefinition {
                        name: key,
                        initializer,
                    };
                    if field.static_ {
                        static_elements.push(StaticElement::Field(definition));
                    } else {
                        instance_fields.push(definition);
                    }
                }
                ClassMember::StaticBlock(code) => {
                    let block = self.instantiate_function(code, class_env, None, Some(f))?;
                    static_elements.push(StaticElement::Block(block));
                }
            }
        }
        Ok(ClassParts {
            constructor: f,
            instance_fields,
            static_elements,
        })
    }
}
