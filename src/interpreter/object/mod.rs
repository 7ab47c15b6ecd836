//! Object model
//!
//! Objects live in the interpreter's arena and are addressed by `ObjectId`.
//! Each object has a prototype, an extensible flag, an insertion-ordered
//! property table and an `ObjectKind` holding its internal slots. The kind
//! also selects the internal-method table: ordinary objects use the defaults
//! of `InternalMethods`, exotic objects override what differs.

pub mod arguments;
pub mod array;
pub mod bound;
pub mod immutable;
pub mod namespace;
mod operations;
pub mod ordinary;
pub mod property;
pub mod proxy;
pub mod string;
pub mod typed_array;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::array_buffer::ArrayBufferData;
use crate::interpreter::builtins::data_view::DataViewData;
use crate::interpreter::builtins::iterator::{ArrayIteratorData, StringIteratorData};
use crate::interpreter::builtins::promise::PromiseData;
use crate::interpreter::builtins::BuiltinFunction;
use crate::interpreter::coroutine::{AsyncGeneratorData, GeneratorData};
use crate::interpreter::function::ScriptFunction;
use crate::interpreter::iteration::IteratorRecord;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{JsString, JsSymbol, PropertyKey, Value};

pub use arguments::MappedArguments;
pub use bound::BoundFunctionData;
pub use namespace::NamespaceData;
pub use operations::{IntegrityLevel, PropertyNameKind};
pub use property::{Property, PropertyDescriptor, Slot};
pub use proxy::ProxyData;
pub use typed_array::TypedArrayData;

/// Property table in insertion order.
pub type PropertyMap = IndexMap<PropertyKey, Property, FxBuildHasher>;

/// An object in the arena.
pub struct ObjectData {
    pub prototype: Option<ObjectId>,
    pub extensible: bool,
    pub properties: PropertyMap,
    pub kind: ObjectKind,
}

impl ObjectData {
    pub fn new(prototype: Option<ObjectId>, kind: ObjectKind) -> Self {
        Self {
            prototype,
            extensible: true,
            properties: PropertyMap::default(),
            kind,
        }
    }
}

/// Internal slots, tagged by the kind of object.
pub enum ObjectKind {
    Ordinary,
    Array,
    /// An ECMAScript function object.
    Function(Box<ScriptFunction>),
    /// A built-in function implemented in Rust.
    Builtin(Box<BuiltinFunction>),
    BoundFunction(Box<BoundFunctionData>),
    Proxy(ProxyData),
    /// `Object.prototype` and, optionally, the global object.
    ImmutablePrototype,
    /// Arguments object; `Some` when mapped to the formal parameters.
    Arguments(Option<Box<MappedArguments>>),
    Error,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    Promise(Box<PromiseData>),
    Generator(Box<GeneratorData>),
    AsyncGenerator(Box<AsyncGeneratorData>),
    ArrayIterator(ArrayIteratorData),
    StringIterator(StringIteratorData),
    AsyncFromSyncIterator(IteratorRecord),
    ArrayBuffer(ArrayBufferData),
    TypedArray(TypedArrayData),
    DataView(DataViewData),
    Namespace(Box<NamespaceData>),
}

impl ObjectKind {
    pub fn is_callable(&self) -> bool {
        match self {
            ObjectKind::Function(_) | ObjectKind::Builtin(_) | ObjectKind::BoundFunction(_) => true,
            ObjectKind::Proxy(proxy) => proxy.callable,
            _ => false,
        }
    }

    pub fn is_constructor(&self) -> bool {
        match self {
            ObjectKind::Function(f) => f.constructor_kind.is_some(),
            ObjectKind::Builtin(b) => b.constructor,
            ObjectKind::BoundFunction(b) => b.constructor,
            ObjectKind::Proxy(proxy) => proxy.constructor,
            _ => false,
        }
    }

    fn methods(&self) -> &'static dyn InternalMethods {
        match self {
            ObjectKind::Array => &array::ArrayMethods,
            ObjectKind::Proxy(_) => &proxy::ProxyMethods,
            ObjectKind::ImmutablePrototype => &immutable::ImmutablePrototypeMethods,
            ObjectKind::String(_) => &string::StringMethods,
            ObjectKind::Arguments(Some(_)) => &arguments::MappedArgumentsMethods,
            ObjectKind::TypedArray(_) => &typed_array::IntegerIndexedMethods,
            ObjectKind::Namespace(_) => &namespace::NamespaceMethods,
            _ => &ordinary::OrdinaryMethods,
        }
    }
}

/// The essential internal methods. The provided bodies are the ordinary
/// object algorithms; exotic objects override a subset.
pub trait InternalMethods {
    fn get_prototype_of(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Option<ObjectId>> {
        ordinary::get_prototype_of(interp, obj)
    }

    fn set_prototype_of(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        proto: Option<ObjectId>,
    ) -> JsResult<bool> {
        ordinary::set_prototype_of(interp, obj, proto)
    }

    fn is_extensible(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<bool> {
        ordinary::is_extensible(interp, obj)
    }

    fn prevent_extensions(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<bool> {
        ordinary::prevent_extensions(interp, obj)
    }

    fn get_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        ordinary::get_own_property(interp, obj, key)
    }

    fn define_own_property(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        ordinary::define_own_property(interp, obj, key, desc)
    }

    fn has_property(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        ordinary::has_property(interp, obj, key)
    }

    fn get(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        receiver: &Value,
    ) -> JsResult<Value> {
        ordinary::get(interp, obj, key, receiver)
    }

    fn set(
        &self,
        interp: &Interpreter,
        obj: ObjectId,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> JsResult<bool> {
        ordinary::set(interp, obj, key, value, receiver)
    }

    fn delete(&self, interp: &Interpreter, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        ordinary::delete(interp, obj, key)
    }

    fn own_property_keys(&self, interp: &Interpreter, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        ordinary::own_property_keys(interp, obj)
    }
}

fn stale() -> JsError {
    JsError::internal("stale object handle")
}

impl Interpreter {
    // ============ ARENA ACCESS ============

    pub(crate) fn alloc(&self, data: ObjectData) -> ObjectId {
        self.objects.borrow_mut().insert(data)
    }

    /// Read an object's data. `f` must not call back into the interpreter.
    pub(crate) fn object<R>(&self, id: ObjectId, f: impl FnOnce(&ObjectData) -> R) -> JsResult<R> {
        let objects = self.objects.borrow();
        objects.get(id).map(f).ok_or_else(stale)
    }

    /// Mutate an object's data. `f` must not call back into the interpreter.
    pub(crate) fn object_mut<R>(
        &self,
        id: ObjectId,
        f: impl FnOnce(&mut ObjectData) -> R,
    ) -> JsResult<R> {
        let mut objects = self.objects.borrow_mut();
        objects.get_mut(id).map(f).ok_or_else(stale)
    }

    pub fn object_count(&self) -> usize {
        self.objects.borrow().len()
    }

    /// Allocate an object with the given prototype and slots.
    pub(crate) fn object_create(&self, prototype: Option<ObjectId>, kind: ObjectKind) -> ObjectId {
        self.alloc(ObjectData::new(prototype, kind))
    }

    /// OrdinaryObjectCreate(%Object.prototype%)
    pub(crate) fn ordinary_object(&self) -> JsResult<ObjectId> {
        let proto = self.intrinsic(|i| i.object_prototype)?;
        Ok(self.object_create(Some(proto), ObjectKind::Ordinary))
    }

    /// Store a property without running any internal method. For objects
    /// under construction only.
    pub(crate) fn insert_property(
        &self,
        obj: ObjectId,
        key: PropertyKey,
        property: Property,
    ) -> JsResult<()> {
        self.object_mut(obj, |data| {
            data.properties.insert(key, property);
        })
    }

    fn methods(&self, obj: ObjectId) -> JsResult<&'static dyn InternalMethods> {
        self.object(obj, |data| data.kind.methods())
    }

    // ============ INTERNAL METHOD DISPATCH ============

    /// O.[[GetPrototypeOf]]()
    pub fn get_prototype_of(&self, obj: ObjectId) -> JsResult<Option<ObjectId>> {
        self.methods(obj)?.get_prototype_of(self, obj)
    }

    /// O.[[SetPrototypeOf]](V)
    pub fn set_prototype_of(&self, obj: ObjectId, proto: Option<ObjectId>) -> JsResult<bool> {
        self.methods(obj)?.set_prototype_of(self, obj, proto)
    }

    /// O.[[IsExtensible]]()
    pub fn is_extensible(&self, obj: ObjectId) -> JsResult<bool> {
        self.methods(obj)?.is_extensible(self, obj)
    }

    /// O.[[PreventExtensions]]()
    pub fn prevent_extensions(&self, obj: ObjectId) -> JsResult<bool> {
        self.methods(obj)?.prevent_extensions(self, obj)
    }

    /// O.[[GetOwnProperty]](P)
    pub fn get_own_property(
        &self,
        obj: ObjectId,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        self.methods(obj)?.get_own_property(self, obj, key)
    }

    /// O.[[DefineOwnProperty]](P, Desc)
    pub fn define_own_property(
        &self,
        obj: ObjectId,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> JsResult<bool> {
        self.methods(obj)?.define_own_property(self, obj, key, desc)
    }

    /// O.[[HasProperty]](P)
    pub fn has_property(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        self.methods(obj)?.has_property(self, obj, key)
    }

    /// O.[[Get]](P, Receiver)
    pub fn get_with_receiver(
        &self,
        obj: ObjectId,
        key: &PropertyKey,
        receiver: &Value,
    ) -> JsResult<Value> {
        self.methods(obj)?.get(self, obj, key, receiver)
    }

    /// O.[[Set]](P, V, Receiver)
    pub fn set_with_receiver(
        &self,
        obj: ObjectId,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> JsResult<bool> {
        self.methods(obj)?.set(self, obj, key, value, receiver)
    }

    /// O.[[Delete]](P)
    pub fn delete(&self, obj: ObjectId, key: &PropertyKey) -> JsResult<bool> {
        self.methods(obj)?.delete(self, obj, key)
    }

    /// O.[[OwnPropertyKeys]]()
    pub fn own_property_keys(&self, obj: ObjectId) -> JsResult<Vec<PropertyKey>> {
        self.methods(obj)?.own_property_keys(self, obj)
    }

    // ============ TYPE TESTS ============

    /// IsCallable
    pub fn is_callable(&self, value: &Value) -> bool {
        match value {
            Value::Object(obj) => self.object(*obj, |d| d.kind.is_callable()).unwrap_or(false),
            _ => false,
        }
    }

    /// IsConstructor
    pub fn is_constructor(&self, value: &Value) -> bool {
        match value {
            Value::Object(obj) => self.object(*obj, |d| d.kind.is_constructor()).unwrap_or(false),
            _ => false,
        }
    }

    /// IsArray: looks through proxies, throwing on a revoked one.
    pub fn is_array(&self, value: &Value) -> JsResult<bool> {
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        enum Shape {
            Array,
            Proxy(Option<ObjectId>),
            Other,
        }
        let shape = self.object(*obj, |d| match &d.kind {
            ObjectKind::Array => Shape::Array,
            ObjectKind::Proxy(proxy) => Shape::Proxy(proxy.target),
            _ => Shape::Other,
        })?;
        match shape {
            Shape::Array => Ok(true),
            Shape::Proxy(Some(target)) => self.is_array(&Value::Object(target)),
            Shape::Proxy(None) => Err(JsError::type_error(
                "Cannot perform 'IsArray' on a proxy that has been revoked",
            )),
            Shape::Other => Ok(false),
        }
    }

    /// Whether `obj`'s slots satisfy `test`.
    pub(crate) fn kind_is(&self, obj: ObjectId, test: impl FnOnce(&ObjectKind) -> bool) -> bool {
        self.object(obj, |d| test(&d.kind)).unwrap_or(false)
    }
}
