//! Bound function exotic objects

use crate::error::{JsError, JsResult};
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{CheapClone, Value};

use super::ObjectKind;

pub struct BoundFunctionData {
    pub target: ObjectId,
    pub bound_this: Value,
    pub bound_args: Vec<Value>,
    /// The target was a constructor when the function was bound.
    pub constructor: bool,
}

impl Interpreter {
    /// BoundFunctionCreate(targetFunction, boundThis, boundArgs)
    pub fn bound_function_create(
        &self,
        target: ObjectId,
        bound_this: Value,
        bound_args: Vec<Value>,
    ) -> JsResult<ObjectId> {
        let proto = self.get_prototype_of(target)?;
        let constructor = self.is_constructor(&Value::Object(target));
        Ok(self.object_create(
            proto,
            ObjectKind::BoundFunction(Box::new(BoundFunctionData {
                target,
                bound_this,
                bound_args,
                constructor,
            })),
        ))
    }

    fn bound_parts(&self, f: ObjectId) -> JsResult<(ObjectId, Value, Vec<Value>)> {
        self.object(f, |d| match &d.kind {
            ObjectKind::BoundFunction(b) => Some((
                b.target,
                b.bound_this.cheap_clone(),
                b.bound_args.clone(),
            )),
            _ => None,
        })?
        .ok_or_else(|| JsError::internal("not a bound function"))
    }

    /// [[Call]] of a bound function
    pub(crate) fn call_bound_function(&self, f: ObjectId, args: &[Value]) -> JsResult<Value> {
        let (target, bound_this, mut full_args) = self.bound_parts(f)?;
        full_args.extend_from_slice(args);
        self.call(&Value::Object(target), &bound_this, &full_args)
    }

    /// [[Construct]] of a bound function
    pub(crate) fn construct_bound_function(
        &self,
        f: ObjectId,
        args: &[Value],
        new_target: ObjectId,
    ) -> JsResult<ObjectId> {
        let (target, _, mut full_args) = self.bound_parts(f)?;
        full_args.extend_from_slice(args);
        let new_target = if new_target == f { target } else { new_target };
        self.construct(target, &full_args, Some(new_target))
    }
}
