//! Non-invoking rendering of values for hosts and diagnostics
//!
//! Nothing here runs script code: getters, proxies and `toString` methods
//! are never called, only stored data properties are read.

use crate::interpreter::object::{ObjectKind, Slot};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{number_to_string, PropertyKey, Value};

/// Nesting depth past which objects render as `[Object]`.
const MAX_DISPLAY_DEPTH: usize = 2;

/// Elements or properties shown before an ellipsis.
const MAX_DISPLAY_ITEMS: usize = 20;

impl Interpreter {
    /// A data property found on `obj` or its prototype chain, without
    /// calling getters or proxy traps.
    pub(crate) fn peek_data(&self, obj: ObjectId, key: &PropertyKey) -> Option<Value> {
        let mut current = Some(obj);
        while let Some(id) = current {
            let (found, next) = self
                .object(id, |d| {
                    if matches!(d.kind, ObjectKind::Proxy(_)) {
                        return (None, None);
                    }
                    match d.properties.get(key).map(|p| &p.slot) {
                        Some(Slot::Data { value, .. }) => (Some(Some(value.clone())), None),
                        Some(Slot::Accessor { .. }) => (Some(None), None),
                        None => (None, d.prototype),
                    }
                })
                .ok()?;
            if let Some(found) = found {
                return found;
            }
            current = next;
        }
        None
    }

    fn peek_string(&self, obj: ObjectId, name: &str) -> Option<String> {
        match self.peek_data(obj, &self.key(name))? {
            Value::String(s) => Some(s.to_string()),
            _ => None,
        }
    }

    /// The `name` of a function object, when it is a non-empty string.
    pub(crate) fn function_display_name(&self, f: ObjectId) -> Option<String> {
        self.peek_string(f, "name").filter(|name| !name.is_empty())
    }

    /// "TypeError: message" for error-like objects, the rendering of the
    /// value otherwise.
    pub(crate) fn error_summary(&self, value: &Value) -> String {
        let Value::Object(obj) = value else {
            return self.display(value);
        };
        let name = self.peek_string(*obj, "name");
        let message = self.peek_string(*obj, "message");
        match (name, message) {
            (Some(name), Some(message)) if !message.is_empty() => {
                if name.is_empty() {
                    message
                } else {
                    format!("{}: {}", name, message)
                }
            }
            (Some(name), _) => name,
            (None, Some(message)) => message,
            (None, None) => self.display(value),
        }
    }

    /// Render a value for a host.
    pub fn display(&self, value: &Value) -> String {
        self.display_at(value, 0)
    }

    fn display_at(&self, value: &Value, depth: usize) -> String {
        match value {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) if depth == 0 => s.to_string(),
            Value::String(s) => format!("{:?}", s.as_str()),
            Value::Symbol(s) => s.descriptive_string().to_string(),
            Value::Object(obj) => self.display_object(*obj, depth),
        }
    }

    fn display_object(&self, obj: ObjectId, depth: usize) -> String {
        enum Shape {
            Function,
            Array,
            Error,
            Primitive(Value),
            Proxy,
            Promise,
            Other,
        }
        let shape = self.object(obj, |d| match &d.kind {
            ObjectKind::Function(_) | ObjectKind::Builtin(_) | ObjectKind::BoundFunction(_) => {
                Shape::Function
            }
            ObjectKind::Array => Shape::Array,
            ObjectKind::Error => Shape::Error,
            ObjectKind::Boolean(b) => Shape::Primitive(Value::Boolean(*b)),
            ObjectKind::Number(n) => Shape::Primitive(Value::Number(*n)),
            ObjectKind::String(s) => Shape::Primitive(Value::String(s.clone())),
            ObjectKind::Symbol(s) => Shape::Primitive(Value::Symbol(s.clone())),
            ObjectKind::Proxy(_) => Shape::Proxy,
            ObjectKind::Promise(_) => Shape::Promise,
            _ => Shape::Other,
        });
        let Ok(shape) = shape else {
            return "[object]".to_string();
        };
        match shape {
            Shape::Function => match self.function_display_name(obj) {
                Some(name) => format!("[Function: {}]", name),
                None => "[Function (anonymous)]".to_string(),
            },
            Shape::Error => self.error_summary(&Value::Object(obj)),
            Shape::Primitive(p) => format!("[{}]", self.display_at(&p, 1)),
            Shape::Proxy => "[Proxy]".to_string(),
            Shape::Promise => "Promise {}".to_string(),
            Shape::Array if depth >= MAX_DISPLAY_DEPTH => "[Array]".to_string(),
            Shape::Other if depth >= MAX_DISPLAY_DEPTH => "[Object]".to_string(),
            Shape::Array => self.display_array(obj, depth),
            Shape::Other => self.display_plain(obj, depth),
        }
    }

    fn display_array(&self, obj: ObjectId, depth: usize) -> String {
        let length = match self.peek_data(obj, &self.key("length")) {
            Some(Value::Number(n)) => n as usize,
            _ => 0,
        };
        let mut items: Vec<String> = (0..length.min(MAX_DISPLAY_ITEMS))
            .map(|index| {
                let key = PropertyKey::from(index);
                let own = self
                    .object(obj, |d| d.properties.get(&key).and_then(|p| p.value().cloned()))
                    .ok()
                    .flatten();
                match own {
                    Some(value) => self.display_at(&value, depth + 1),
                    None => "<empty>".to_string(),
                }
            })
            .collect();
        if length > MAX_DISPLAY_ITEMS {
            items.push(format!("... {} more", length - MAX_DISPLAY_ITEMS));
        }
        format!("[{}]", items.join(", "))
    }

    fn display_plain(&self, obj: ObjectId, depth: usize) -> String {
        let entries: Vec<(PropertyKey, Option<Value>)> = self
            .object(obj, |d| {
                super::object::ordinary::ordered_keys(&d.properties)
                    .into_iter()
                    .filter_map(|key| {
                        let property = d.properties.get(&key)?;
                        property
                            .enumerable
                            .then(|| (key.clone(), property.value().cloned()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if entries.is_empty() {
            return "{}".to_string();
        }
        let mut parts: Vec<String> = entries
            .iter()
            .take(MAX_DISPLAY_ITEMS)
            .map(|(key, value)| {
                let rendered = match value {
                    Some(value) => self.display_at(value, depth + 1),
                    None => "[Getter/Setter]".to_string(),
                };
                match key {
                    PropertyKey::Symbol(s) => format!("[{}]: {}", s.descriptive_string(), rendered),
                    other => format!("{}: {}", other, rendered),
                }
            })
            .collect();
        if entries.len() > MAX_DISPLAY_ITEMS {
            parts.push(format!("... {} more", entries.len() - MAX_DISPLAY_ITEMS));
        }
        format!("{{ {} }}", parts.join(", "))
    }
}
