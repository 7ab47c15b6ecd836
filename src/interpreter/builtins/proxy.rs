//! The Proxy constructor and `Proxy.revocable`
//!
//! Trap dispatch lives with the exotic object in `object::proxy`; this file
//! only creates and revokes proxies.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::{Captures, NativeCall};
use crate::interpreter::Interpreter;
use crate::value::Value;

/// new Proxy(target, handler)
pub fn proxy_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    if call.new_target.is_none() {
        return Err(JsError::type_error("Constructor Proxy requires 'new'"));
    }
    Ok(Value::Object(interp.proxy_create(&call.arg(0), &call.arg(1))?))
}

/// Proxy.revocable(target, handler)
fn proxy_revocable(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let proxy = interp.proxy_create(&call.arg(0), &call.arg(1))?;
    let slot = Rc::new(Cell::new(Some(proxy)));
    let revoke = interp.create_closure(revoke_function, 0, Captures::ProxyRevoke(slot))?;
    let result = interp.ordinary_object()?;
    interp.create_data_property_or_throw(result, interp.key("proxy"), Value::Object(proxy))?;
    interp.create_data_property_or_throw(result, interp.key("revoke"), Value::Object(revoke))?;
    Ok(Value::Object(result))
}

/// The revoke function: idempotent, cleared after the first call.
fn revoke_function(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let Captures::ProxyRevoke(slot) = interp.builtin_captures(call.function)? else {
        return Err(JsError::internal("revoke function without captures"));
    };
    if let Some(proxy) = slot.take() {
        tracing::trace!(target: "ecmavm::proxy", "proxy revoked");
        interp.proxy_revoke(proxy)?;
    }
    Ok(Value::Undefined)
}

pub fn init_proxy(interp: &Interpreter) -> JsResult<()> {
    let ctor = interp.intrinsic(|i| i.proxy_constructor)?;
    interp.register_constructor(ctor, "Proxy", 2, None)?;
    interp.register_method(ctor, "revocable", proxy_revocable, 2)?;
    Ok(())
}
