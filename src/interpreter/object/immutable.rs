//! Immutable prototype exotic objects
//!
//! `Object.prototype` (and the global object when configured) refuse any
//! [[SetPrototypeOf]] that would change their prototype.

use crate::error::JsResult;
use crate::interpreter::{Interpreter, ObjectId};

use super::InternalMethods;

pub struct ImmutablePrototypeMethods;

impl InternalMethods for ImmutablePrototypeMethods {
    fn set_prototype_of(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<bool> {
        set_immutable_prototype(interp, obj, proto)
    }
}

/// SetImmutablePrototype(O, V)
pub fn set_immutable_prototype(
    interp: &Interpreter,
    obj: ObjectId,
    proto: Option<ObjectId>,
) -> JsResult<bool> {
    let current = interp.get_prototype_of(obj)?;
    Ok(current == proto)
}
