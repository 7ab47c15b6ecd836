//! The JSON object
//!
//! `JSON.parse` reads the text with serde_json and then builds language
//! values from the parsed tree. `JSON.stringify` walks the value with the
//! full SerializeJSONProperty algorithm (getters, `toJSON`, replacers) and
//! only borrows serde_json's string quoting.

use crate::error::{ErrorKind, JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::{ObjectKind, PropertyNameKind};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{number_to_string, CheapClone, JsString, PropertyKey, Value};

/// Maximum number of characters `space` contributes to the indent.
const MAX_GAP: usize = 10;

impl Interpreter {
    /// Build a language value from a parsed JSON document.
    pub fn value_from_json(&self, json: &serde_json::Value) -> JsResult<Value> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(JsString::from(s.as_str())),
            serde_json::Value::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.value_from_json(item))
                    .collect::<JsResult<Vec<_>>>()?;
                Value::Object(self.create_array_from_list(values)?)
            }
            serde_json::Value::Object(map) => {
                let obj = self.ordinary_object()?;
                for (key, value) in map {
                    let value = self.value_from_json(value)?;
                    self.create_data_property_or_throw(obj, PropertyKey::from(key.as_str()), value)?;
                }
                Value::Object(obj)
            }
        })
    }

    /// The JSON document `JSON.stringify(value)` describes, `None` when it
    /// produces `undefined`.
    pub fn value_to_json(&self, value: &Value) -> JsResult<Option<serde_json::Value>> {
        let Some(text) = self.json_stringify(value, &Value::Undefined, &Value::Undefined)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| JsError::internal(format!("stringified value is not valid JSON: {}", e)))
    }

    /// JSON.stringify(value, replacer, space)
    pub(crate) fn json_stringify(&self, value: &Value, replacer: &Value, space: &Value) -> JsResult<Option<String>> {
        let mut state = Serializer {
            replacer_function: None,
            property_list: None,
            stack: Vec::new(),
            indent: String::new(),
            gap: String::new(),
        };
        if let Value::Object(replacer_obj) = replacer {
            if self.is_callable(replacer) {
                state.replacer_function = Some(replacer.cheap_clone());
            } else if self.is_array(replacer)? {
                state.property_list = Some(self.property_list(*replacer_obj)?);
            }
        }
        state.gap = self.json_gap(space)?;

        let wrapper = self.ordinary_object()?;
        self.create_data_property_or_throw(wrapper, self.key(""), value.cheap_clone())?;
        self.serialize_property(&mut state, &self.key(""), wrapper)
    }

    /// The replacer array as a de-duplicated list of keys.
    fn property_list(&self, replacer: ObjectId) -> JsResult<Vec<PropertyKey>> {
        let len = self.length_of_array_like(replacer)?;
        let mut list: Vec<PropertyKey> = Vec::new();
        for index in 0..len {
            let v = self.get(replacer, &PropertyKey::from(index as usize))?;
            let item = match &v {
                Value::String(s) => Some(s.cheap_clone()),
                Value::Number(_) => Some(self.to_string(&v)?),
                Value::Object(obj)
                    if self.kind_is(*obj, |k| matches!(k, ObjectKind::String(_) | ObjectKind::Number(_))) =>
                {
                    Some(self.to_string(&v)?)
                }
                _ => None,
            };
            if let Some(item) = item {
                let key = PropertyKey::from(item);
                if !list.contains(&key) {
                    list.push(key);
                }
            }
        }
        Ok(list)
    }

    fn json_gap(&self, space: &Value) -> JsResult<String> {
        let space = match space {
            Value::Object(obj) => match self.object(*obj, |d| match &d.kind {
                ObjectKind::Number(_) => Some(true),
                ObjectKind::String(_) => Some(false),
                _ => None,
            })? {
                Some(true) => Value::Number(self.to_number(space)?),
                Some(false) => Value::String(self.to_string(space)?),
                None => space.cheap_clone(),
            },
            other => other.cheap_clone(),
        };
        Ok(match space {
            Value::Number(n) => {
                let count = n.clamp(0.0, MAX_GAP as f64) as usize;
                " ".repeat(count)
            }
            Value::String(s) => s.as_str().chars().take(MAX_GAP).collect(),
            _ => String::new(),
        })
    }

    /// SerializeJSONProperty(state, key, holder)
    fn serialize_property(&self, state: &mut Serializer, key: &PropertyKey, holder: ObjectId) -> JsResult<Option<String>> {
        self.tick()?;
        let mut value = self.get(holder, key)?;
        if value.is_object() {
            let to_json = self.get_v(&value, &self.key("toJSON"))?;
            if self.is_callable(&to_json) {
                value = self.call(&to_json, &value, &[key.to_value()])?;
            }
        }
        if let Some(replacer) = &state.replacer_function {
            value = self.call(replacer, &Value::Object(holder), &[key.to_value(), value])?;
        }
        if let Value::Object(obj) = &value {
            let unwrapped = self.object(*obj, |d| match &d.kind {
                ObjectKind::Number(_) => Some(0),
                ObjectKind::String(_) => Some(1),
                ObjectKind::Boolean(b) => Some(if *b { 2 } else { 3 }),
                _ => None,
            })?;
            value = match unwrapped {
                Some(0) => Value::Number(self.to_number(&value)?),
                Some(1) => Value::String(self.to_string(&value)?),
                Some(2) => Value::Boolean(true),
                Some(_) => Value::Boolean(false),
                None => value,
            };
        }
        match &value {
            Value::Null => Ok(Some("null".to_string())),
            Value::Boolean(b) => Ok(Some(b.to_string())),
            Value::String(s) => Ok(Some(quote_json_string(s.as_str()))),
            Value::Number(n) if n.is_finite() => Ok(Some(number_to_string(*n))),
            Value::Number(_) => Ok(Some("null".to_string())),
            Value::Object(obj) if !self.is_callable(&value) => {
                if self.is_array(&value)? {
                    self.serialize_array(state, *obj).map(Some)
                } else {
                    self.serialize_object(state, *obj).map(Some)
                }
            }
            _ => Ok(None),
        }
    }

    fn enter(&self, state: &mut Serializer, obj: ObjectId) -> JsResult<String> {
        if state.stack.contains(&obj) {
            return Err(JsError::type_error("Converting circular structure to JSON"));
        }
        state.stack.push(obj);
        let stepback = state.indent.clone();
        state.indent.push_str(&state.gap);
        Ok(stepback)
    }

    fn leave(&self, state: &mut Serializer, stepback: String, parts: Vec<String>, open: char, close: char) -> String {
        state.stack.pop();
        let text = if parts.is_empty() {
            format!("{}{}", open, close)
        } else if state.gap.is_empty() {
            format!("{}{}{}", open, parts.join(","), close)
        } else {
            let separator = format!(",\n{}", state.indent);
            format!("{}\n{}{}\n{}{}", open, state.indent, parts.join(&separator), stepback, close)
        };
        state.indent = stepback;
        text
    }

    /// SerializeJSONObject(state, value)
    fn serialize_object(&self, state: &mut Serializer, obj: ObjectId) -> JsResult<String> {
        let stepback = self.enter(state, obj)?;
        let keys = match &state.property_list {
            Some(list) => list.clone(),
            None => self
                .enumerable_own_properties(obj, PropertyNameKind::Key)?
                .iter()
                .map(|key| self.to_property_key(key))
                .collect::<JsResult<Vec<_>>>()?,
        };
        let mut parts = Vec::new();
        for key in keys {
            if let Some(value) = self.serialize_property(state, &key, obj)? {
                let name = quote_json_string(&key.to_string());
                let colon = if state.gap.is_empty() { ":" } else { ": " };
                parts.push(format!("{}{}{}", name, colon, value));
            }
        }
        Ok(self.leave(state, stepback, parts, '{', '}'))
    }

    /// SerializeJSONArray(state, value)
    fn serialize_array(&self, state: &mut Serializer, obj: ObjectId) -> JsResult<String> {
        let stepback = self.enter(state, obj)?;
        let len = self.length_of_array_like(obj)?;
        let mut parts = Vec::new();
        for index in 0..len {
            let key = PropertyKey::from(index as usize);
            let value = self.serialize_property(state, &key, obj)?;
            parts.push(value.unwrap_or_else(|| "null".to_string()));
        }
        Ok(self.leave(state, stepback, parts, '[', ']'))
    }

    /// InternalizeJSONProperty(holder, name, reviver)
    fn internalize_property(&self, holder: ObjectId, name: &PropertyKey, reviver: &Value) -> JsResult<Value> {
        self.tick()?;
        let value = self.get(holder, name)?;
        if let Value::Object(obj) = &value {
            let keys: Vec<PropertyKey> = if self.is_array(&value)? {
                let len = self.length_of_array_like(*obj)?;
                (0..len).map(|i| PropertyKey::from(i as usize)).collect()
            } else {
                self.enumerable_own_properties(*obj, PropertyNameKind::Key)?
                    .iter()
                    .map(|key| self.to_property_key(key))
                    .collect::<JsResult<Vec<_>>>()?
            };
            for key in keys {
                let element = self.internalize_property(*obj, &key, reviver)?;
                if element.is_undefined() {
                    self.delete(*obj, &key)?;
                } else {
                    self.create_data_property(*obj, key, element)?;
                }
            }
        }
        self.call(reviver, &Value::Object(holder), &[name.to_value(), value])
    }
}

/// State threaded through one `JSON.stringify` call.
struct Serializer {
    replacer_function: Option<Value>,
    property_list: Option<Vec<PropertyKey>>,
    stack: Vec<ObjectId>,
    indent: String,
    gap: String,
}

/// QuoteJSONString
fn quote_json_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn json_parse(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let text = interp.to_string(&call.arg(0))?;
    let parsed: serde_json::Value = serde_json::from_str(text.as_str()).map_err(|e| {
        JsError::native(ErrorKind::SyntaxError, format!("Unexpected token in JSON: {}", e))
    })?;
    let value = interp.value_from_json(&parsed)?;
    let reviver = call.arg(1);
    if !interp.is_callable(&reviver) {
        return Ok(value);
    }
    let root = interp.ordinary_object()?;
    interp.create_data_property_or_throw(root, interp.key(""), value)?;
    interp.internalize_property(root, &interp.key(""), &reviver)
}

fn json_stringify(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(interp
        .json_stringify(&call.arg(0), &call.arg(1), &call.arg(2))?
        .map(Value::from)
        .unwrap_or(Value::Undefined))
}

pub fn init_json(interp: &Interpreter) -> JsResult<()> {
    let json = interp.intrinsic(|i| i.json)?;
    interp.register_method(json, "parse", json_parse, 2)?;
    interp.register_method(json, "stringify", json_stringify, 3)?;
    interp.register_to_string_tag(json, "JSON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_escapes_controls() {
        assert_eq!(quote_json_string("a\"b\n"), "\"a\\\"b\\n\"");
        assert_eq!(quote_json_string("\u{1}"), "\"\\u0001\"");
    }
}
