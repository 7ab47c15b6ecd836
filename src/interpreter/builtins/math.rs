//! The Math object

use crate::error::JsResult;
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::Property;
use crate::interpreter::operators::number_exponentiate;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// ToNumber of the first argument, NaN when absent.
fn number_arg(interp: &Interpreter, call: &NativeCall<'_>, index: usize) -> JsResult<f64> {
    interp.to_number(&call.arg(index))
}

fn unary(interp: &Interpreter, call: &NativeCall<'_>, f: fn(f64) -> f64) -> JsResult<Value> {
    Ok(Value::Number(f(number_arg(interp, call, 0)?)))
}

fn math_abs(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::abs)
}

fn math_floor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::floor)
}

fn math_ceil(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::ceil)
}

fn math_trunc(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::trunc)
}

/// Math.round: halves round towards +∞, and -0 and (-0.5, 0) give -0.
fn round(n: f64) -> f64 {
    if !n.is_finite() || n == 0.0 {
        return n;
    }
    if n < 0.0 && n >= -0.5 {
        return -0.0;
    }
    (n + 0.5).floor()
}

fn math_round(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, round)
}

fn sign(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        n
    } else {
        n.signum()
    }
}

fn math_sign(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, sign)
}

fn math_sqrt(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::sqrt)
}

fn math_cbrt(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::cbrt)
}

fn math_log(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::ln)
}

fn math_log10(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::log10)
}

fn math_log2(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::log2)
}

fn math_log1p(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::ln_1p)
}

fn math_exp(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::exp)
}

fn math_expm1(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::exp_m1)
}

fn math_sin(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::sin)
}

fn math_cos(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::cos)
}

fn math_tan(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::tan)
}

fn math_asin(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::asin)
}

fn math_acos(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::acos)
}

fn math_atan(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::atan)
}

fn math_sinh(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::sinh)
}

fn math_cosh(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::cosh)
}

fn math_tanh(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::tanh)
}

fn math_asinh(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::asinh)
}

fn math_acosh(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::acosh)
}

fn math_atanh(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, f64::atanh)
}

fn math_fround(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    unary(interp, call, |n| f64::from(n as f32))
}

fn math_clz32(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let n = interp.to_uint32(&call.arg(0))?;
    Ok(Value::Number(f64::from(n.leading_zeros())))
}

fn math_imul(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let a = interp.to_int32(&call.arg(0))?;
    let b = interp.to_int32(&call.arg(1))?;
    Ok(Value::Number(f64::from(a.wrapping_mul(b))))
}

fn math_atan2(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let y = number_arg(interp, call, 0)?;
    let x = number_arg(interp, call, 1)?;
    Ok(Value::Number(y.atan2(x)))
}

fn math_pow(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let base = number_arg(interp, call, 0)?;
    let exponent = number_arg(interp, call, 1)?;
    Ok(Value::Number(number_exponentiate(base, exponent)))
}

/// Every argument is converted before the result is computed.
fn numbers(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Vec<f64>> {
    call.args.iter().map(|v| interp.to_number(v)).collect()
}

fn math_max(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let mut result = f64::NEG_INFINITY;
    for n in numbers(interp, call)? {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n > result || (n == 0.0 && result == 0.0 && result.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

fn math_min(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let mut result = f64::INFINITY;
    for n in numbers(interp, call)? {
        if n.is_nan() {
            return Ok(Value::Number(f64::NAN));
        }
        if n < result || (n == 0.0 && result == 0.0 && n.is_sign_negative()) {
            result = n;
        }
    }
    Ok(Value::Number(result))
}

fn math_hypot(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let values = numbers(interp, call)?;
    if values.iter().any(|n| n.is_infinite()) {
        return Ok(Value::Number(f64::INFINITY));
    }
    if values.iter().any(|n| n.is_nan()) {
        return Ok(Value::Number(f64::NAN));
    }
    let largest = values.iter().fold(0.0_f64, |acc, n| acc.max(n.abs()));
    if largest == 0.0 {
        return Ok(Value::Number(0.0));
    }
    let sum: f64 = values.iter().map(|n| (n / largest).powi(2)).sum();
    Ok(Value::Number(largest * sum.sqrt()))
}

pub fn init_math(interp: &Interpreter) -> JsResult<()> {
    let math = interp.intrinsic(|i| i.math)?;
    let constants = [
        ("E", std::f64::consts::E),
        ("LN10", std::f64::consts::LN_10),
        ("LN2", std::f64::consts::LN_2),
        ("LOG10E", std::f64::consts::LOG10_E),
        ("LOG2E", std::f64::consts::LOG2_E),
        ("PI", std::f64::consts::PI),
        ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
        ("SQRT2", std::f64::consts::SQRT_2),
    ];
    for (name, value) in constants {
        interp.insert_property(math, interp.key(name), Property::frozen(Value::Number(value)))?;
    }

    let unary_methods: [(&str, super::NativeFn); 27] = [
        ("abs", math_abs),
        ("acos", math_acos),
        ("acosh", math_acosh),
        ("asin", math_asin),
        ("asinh", math_asinh),
        ("atan", math_atan),
        ("atanh", math_atanh),
        ("cbrt", math_cbrt),
        ("ceil", math_ceil),
        ("clz32", math_clz32),
        ("cos", math_cos),
        ("cosh", math_cosh),
        ("exp", math_exp),
        ("expm1", math_expm1),
        ("floor", math_floor),
        ("fround", math_fround),
        ("log", math_log),
        ("log1p", math_log1p),
        ("log10", math_log10),
        ("log2", math_log2),
        ("round", math_round),
        ("sign", math_sign),
        ("sin", math_sin),
        ("sinh", math_sinh),
        ("sqrt", math_sqrt),
        ("tan", math_tan),
        ("tanh", math_tanh),
    ];
    for (name, behavior) in unary_methods {
        interp.register_method(math, name, behavior, 1)?;
    }
    interp.register_method(math, "trunc", math_trunc, 1)?;
    interp.register_method(math, "atan2", math_atan2, 2)?;
    interp.register_method(math, "imul", math_imul, 2)?;
    interp.register_method(math, "pow", math_pow, 2)?;
    interp.register_method(math, "max", math_max, 2)?;
    interp.register_method(math, "min", math_min, 2)?;
    interp.register_method(math, "hypot", math_hypot, 2)?;
    interp.register_to_string_tag(math, "Math")?;
    Ok(())
}
