//! Error, the NativeError constructors and AggregateError

use crate::error::{ErrorKind, JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::{ObjectKind, Property};
use crate::interpreter::realm::Intrinsics;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{JsString, Value};

impl Interpreter {
    /// A new error object of `kind` in the current realm. Used when the
    /// runtime itself raises an error.
    pub(crate) fn create_error(&self, kind: ErrorKind, message: &str) -> JsResult<ObjectId> {
        let proto = self.current_realm()?.intrinsics.error_prototype_for(kind);
        let obj = self.object_create(Some(proto), ObjectKind::Error);
        self.insert_property(obj, self.key("message"), Property::hidden(Value::from(message)))?;
        self.install_stack(obj, kind.name(), message)?;
        Ok(obj)
    }

    /// An AggregateError whose `errors` property is `errors`.
    pub(crate) fn create_aggregate_error(&self, errors: ObjectId, message: &str) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.aggregate_error_prototype)?;
        let obj = self.object_create(Some(proto), ObjectKind::Error);
        self.insert_property(obj, self.key("message"), Property::hidden(Value::from(message)))?;
        self.insert_property(obj, self.key("errors"), Property::hidden(Value::Object(errors)))?;
        self.install_stack(obj, "AggregateError", message)?;
        Ok(obj)
    }

    /// `stack`: the summary line followed by one line per active frame.
    fn install_stack(&self, obj: ObjectId, name: &str, message: &str) -> JsResult<()> {
        let mut stack = if message.is_empty() {
            name.to_string()
        } else {
            format!("{}: {}", name, message)
        };
        for frame in self.stack_snapshot() {
            stack.push('\n');
            stack.push_str(&frame.to_string());
        }
        self.insert_property(obj, self.key("stack"), Property::hidden(Value::from(stack)))
    }

    /// InstallErrorCause(O, options)
    fn install_error_cause(&self, obj: ObjectId, options: &Value) -> JsResult<()> {
        let Value::Object(options) = options else {
            return Ok(());
        };
        let key = self.key("cause");
        if self.has_property(*options, &key)? {
            let cause = self.get(*options, &key)?;
            self.insert_property(obj, key, Property::hidden(cause))?;
        }
        Ok(())
    }
}

/// The shared steps of the Error and NativeError constructors.
fn construct_error(
    interp: &Interpreter,
    call: &NativeCall<'_>,
    name: &str,
    fallback: fn(&Intrinsics) -> ObjectId,
) -> JsResult<Value> {
    let new_target = call.new_target.unwrap_or(call.function);
    let obj = interp.ordinary_create_from_constructor(Some(new_target), fallback, ObjectKind::Error)?;
    let message = match call.arg(0) {
        Value::Undefined => JsString::default(),
        message => {
            let message = interp.to_string(&message)?;
            interp.insert_property(obj, interp.key("message"), Property::hidden(Value::String(message.clone())))?;
            message
        }
    };
    interp.install_error_cause(obj, &call.arg(1))?;
    interp.install_stack(obj, name, message.as_str())?;
    Ok(Value::Object(obj))
}

pub fn error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "Error", |i| i.error_prototype)
}

pub fn type_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "TypeError", |i| i.type_error_prototype)
}

pub fn range_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "RangeError", |i| i.range_error_prototype)
}

pub fn reference_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "ReferenceError", |i| i.reference_error_prototype)
}

pub fn syntax_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "SyntaxError", |i| i.syntax_error_prototype)
}

pub fn eval_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "EvalError", |i| i.eval_error_prototype)
}

pub fn uri_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    construct_error(interp, call, "URIError", |i| i.uri_error_prototype)
}

/// AggregateError(errors, message, options)
pub fn aggregate_error_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let new_target = call.new_target.unwrap_or(call.function);
    let obj = interp.ordinary_create_from_constructor(
        Some(new_target),
        |i| i.aggregate_error_prototype,
        ObjectKind::Error,
    )?;
    let message = match call.arg(1) {
        Value::Undefined => JsString::default(),
        message => {
            let message = interp.to_string(&message)?;
            interp.insert_property(obj, interp.key("message"), Property::hidden(Value::String(message.clone())))?;
            message
        }
    };
    interp.install_error_cause(obj, &call.arg(2))?;
    let errors = interp.iterate_to_list(&call.arg(0))?;
    let errors = interp.create_array_from_list(errors)?;
    interp.insert_property(obj, interp.key("errors"), Property::hidden(Value::Object(errors)))?;
    interp.install_stack(obj, "AggregateError", message.as_str())?;
    Ok(Value::Object(obj))
}

/// Error.prototype.toString
fn error_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Value::Object(obj) = call.this else {
        return Err(JsError::type_error("Error.prototype.toString called on non-object"));
    };
    let name = match interp.get(*obj, &interp.key("name"))? {
        Value::Undefined => JsString::from("Error"),
        name => interp.to_string(&name)?,
    };
    let message = match interp.get(*obj, &interp.key("message"))? {
        Value::Undefined => JsString::default(),
        message => interp.to_string(&message)?,
    };
    let text = match (name.as_str().is_empty(), message.as_str().is_empty()) {
        (true, _) => message,
        (_, true) => name,
        _ => JsString::from(format!("{}: {}", name, message)),
    };
    Ok(Value::String(text))
}

pub fn init_errors(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let i = &realm.intrinsics;
    let errors = [
        ("Error", i.error_constructor, i.error_prototype, 1),
        ("TypeError", i.type_error_constructor, i.type_error_prototype, 1),
        ("RangeError", i.range_error_constructor, i.range_error_prototype, 1),
        ("ReferenceError", i.reference_error_constructor, i.reference_error_prototype, 1),
        ("SyntaxError", i.syntax_error_constructor, i.syntax_error_prototype, 1),
        ("EvalError", i.eval_error_constructor, i.eval_error_prototype, 1),
        ("URIError", i.uri_error_constructor, i.uri_error_prototype, 1),
        ("AggregateError", i.aggregate_error_constructor, i.aggregate_error_prototype, 2),
    ];
    for (name, ctor, proto, length) in errors {
        interp.register_constructor(ctor, name, length, Some(proto))?;
        interp.register_value(proto, "name", Value::from(name))?;
        interp.register_value(proto, "message", Value::from(""))?;
    }
    interp.register_method(i.error_prototype, "toString", error_to_string, 0)?;
    Ok(())
}
