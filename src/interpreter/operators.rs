//! Binary operators, `typeof` and `instanceof`

use std::cmp::Ordering;

use crate::ast::BinaryOp;
use crate::error::{JsError, JsResult};
use crate::interpreter::conversions::{f64_to_int32, f64_to_uint32, Hint};
use crate::interpreter::object::ObjectKind;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, PropertyKey, Value};

/// Number::exponentiate
pub fn number_exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    if exponent.is_infinite() && base.abs() == 1.0 {
        return f64::NAN;
    }
    base.powf(exponent)
}

/// Numeric part of ApplyStringOrNumericBinaryOperator.
fn number_operation(op: BinaryOp, l: f64, r: f64) -> JsResult<f64> {
    Ok(match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
        BinaryOp::Exp => number_exponentiate(l, r),
        BinaryOp::BitAnd => f64::from(f64_to_int32(l) & f64_to_int32(r)),
        BinaryOp::BitOr => f64::from(f64_to_int32(l) | f64_to_int32(r)),
        BinaryOp::BitXor => f64::from(f64_to_int32(l) ^ f64_to_int32(r)),
        BinaryOp::LShift => f64::from(f64_to_int32(l).wrapping_shl(f64_to_uint32(r) & 0x1f)),
        BinaryOp::RShift => f64::from(f64_to_int32(l).wrapping_shr(f64_to_uint32(r) & 0x1f)),
        BinaryOp::URShift => f64::from(f64_to_uint32(l).wrapping_shr(f64_to_uint32(r) & 0x1f)),
        _ => return Err(JsError::internal("not a numeric operator")),
    })
}

/// Compare strings by UTF-16 code units.
pub(crate) fn compare_code_units(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

impl Interpreter {
    /// Evaluate `left op right` on already-evaluated operands.
    pub(crate) fn apply_binary(&self, op: BinaryOp, left: &Value, right: &Value) -> JsResult<Value> {
        match op {
            BinaryOp::Add => self.add_values(left, right),
            BinaryOp::Eq => Ok(Value::Boolean(self.is_loosely_equal(left, right)?)),
            BinaryOp::NotEq => Ok(Value::Boolean(!self.is_loosely_equal(left, right)?)),
            BinaryOp::StrictEq => Ok(Value::Boolean(left.strict_equals(right))),
            BinaryOp::StrictNotEq => Ok(Value::Boolean(!left.strict_equals(right))),
            BinaryOp::Lt => Ok(Value::Boolean(self.is_less_than(left, right, true)? == Some(true))),
            BinaryOp::Gt => Ok(Value::Boolean(self.is_less_than(right, left, false)? == Some(true))),
            BinaryOp::LtEq => {
                let r = self.is_less_than(right, left, false)?;
                Ok(Value::Boolean(r == Some(false)))
            }
            BinaryOp::GtEq => {
                let r = self.is_less_than(left, right, true)?;
                Ok(Value::Boolean(r == Some(false)))
            }
            BinaryOp::In => {
                let Value::Object(obj) = right else {
                    return Err(JsError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        self.display(left),
                        self.display(right)
                    )));
                };
                let key = self.to_property_key(left)?;
                Ok(Value::Boolean(self.has_property(*obj, &key)?))
            }
            BinaryOp::Instanceof => Ok(Value::Boolean(self.instance_of(left, right)?)),
            _ => {
                let l = self.to_number(left)?;
                let r = self.to_number(right)?;
                Ok(Value::Number(number_operation(op, l, r)?))
            }
        }
    }

    /// The `+` operator: string concatenation when either primitive is a
    /// string, numeric addition otherwise.
    fn add_values(&self, left: &Value, right: &Value) -> JsResult<Value> {
        if let (Value::Number(l), Value::Number(r)) = (left, right) {
            return Ok(Value::Number(l + r));
        }
        let lprim = self.to_primitive(left, Hint::Default)?;
        let rprim = self.to_primitive(right, Hint::Default)?;
        if lprim.is_string() || rprim.is_string() {
            let ls = self.to_string(&lprim)?;
            let rs = self.to_string(&rprim)?;
            return Ok(Value::String(ls.concat(&rs)));
        }
        Ok(Value::Number(self.to_number(&lprim)? + self.to_number(&rprim)?))
    }

    /// IsLessThan(x, y, LeftFirst); `None` stands for undefined.
    pub(crate) fn is_less_than(&self, x: &Value, y: &Value, left_first: bool) -> JsResult<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, Hint::Number)?;
            let py = self.to_primitive(y, Hint::Number)?;
            (px, py)
        } else {
            let py = self.to_primitive(y, Hint::Number)?;
            let px = self.to_primitive(x, Hint::Number)?;
            (px, py)
        };
        if let (Value::String(a), Value::String(b)) = (&px, &py) {
            return Ok(Some(compare_code_units(a.as_str(), b.as_str()) == Ordering::Less));
        }
        let nx = self.to_number(&px)?;
        let ny = self.to_number(&py)?;
        if nx.is_nan() || ny.is_nan() {
            return Ok(None);
        }
        Ok(Some(nx < ny))
    }

    /// InstanceofOperator(V, target)
    pub(crate) fn instance_of(&self, value: &Value, target: &Value) -> JsResult<bool> {
        if !target.is_object() {
            return Err(JsError::type_error(format!(
                "Right-hand side of 'instanceof' is not an object: {}",
                self.display(target)
            )));
        }
        let key = PropertyKey::Symbol(self.well_known().has_instance.cheap_clone());
        if let Some(handler) = self.get_method(target, &key)? {
            let result = self.call(&handler, target, &[value.cheap_clone()])?;
            return Ok(result.to_boolean());
        }
        if !self.is_callable(target) {
            return Err(JsError::type_error("Right-hand side of 'instanceof' is not callable"));
        }
        self.ordinary_has_instance(target, value)
    }

    /// OrdinaryHasInstance(C, O)
    pub(crate) fn ordinary_has_instance(&self, ctor: &Value, value: &Value) -> JsResult<bool> {
        if !self.is_callable(ctor) {
            return Ok(false);
        }
        let Value::Object(c) = ctor else {
            return Ok(false);
        };
        let bound_target = self.object(*c, |d| match &d.kind {
            ObjectKind::BoundFunction(b) => Some(b.target),
            _ => None,
        })?;
        if let Some(target) = bound_target {
            return self.instance_of(value, &Value::Object(target));
        }
        let Value::Object(mut obj) = value.cheap_clone() else {
            return Ok(false);
        };
        let proto = self.get(*c, &self.key("prototype"))?;
        let Value::Object(proto) = proto else {
            return Err(JsError::type_error("Function has non-object prototype in instanceof check"));
        };
        loop {
            match self.get_prototype_of(obj)? {
                None => return Ok(false),
                Some(p) if p == proto => return Ok(true),
                Some(p) => obj = p,
            }
        }
    }

    /// The `typeof` operator.
    pub(crate) fn type_of(&self, value: &Value) -> &'static str {
        match value {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(_) if self.is_callable(value) => "function",
            Value::Object(_) => "object",
        }
    }
}
