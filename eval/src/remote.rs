//! Boundary to the debugged process. Everything behind [`RemoteProcess`] is owned by the
//! debug session; evaluators only hold ids handed out by it.

use crate::error::RemoteError;
use crate::jtype::{JavaType, PrimitiveType};
use crate::keys::{FieldId, ObjectId, TypeId};
use crate::value::Value;
use smallvec::SmallVec;

pub type Interfaces = SmallVec<[TypeId; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Array,
}

/// A field as declared by one specific type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub id: FieldId,
    pub name: String,
    pub declaring_type: TypeId,
    pub signature: JavaType,
    pub is_static: bool,
}

/// Declared type of a field, resolved against the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Primitive(PrimitiveType),
    Reference(TypeId),
}

pub trait RemoteProcess: Send + Sync {
    fn type_kind(&self, ty: TypeId) -> Result<TypeKind, RemoteError>;

    /// Fully-qualified name in internal form (`com/example/Foo`, `[I`).
    fn type_name(&self, ty: TypeId) -> Result<String, RemoteError>;

    fn class_by_name(&self, name: &str) -> Result<Option<TypeId>, RemoteError>;

    /// Direct, non-hierarchical lookup of a field declared by `ty`.
    fn field_by_name(&self, ty: TypeId, name: &str) -> Result<Option<FieldRef>, RemoteError>;

    /// Directly implemented (classes) or extended (interfaces) interfaces, in declaration order.
    fn interfaces(&self, ty: TypeId) -> Result<Interfaces, RemoteError>;

    fn superclass(&self, ty: TypeId) -> Result<Option<TypeId>, RemoteError>;

    fn runtime_type(&self, obj: ObjectId) -> Result<TypeId, RemoteError>;

    fn read_field(&self, obj: ObjectId, field: &FieldRef) -> Result<Value, RemoteError>;

    /// Either stores `value` or fails without touching the target.
    fn write_field(&self, obj: ObjectId, field: &FieldRef, value: Value) -> Result<(), RemoteError>;

    fn read_static_field(&self, ty: TypeId, field: &FieldRef) -> Result<Value, RemoteError>;

    fn write_static_field(
        &self,
        ty: TypeId,
        field: &FieldRef,
        value: Value,
    ) -> Result<(), RemoteError>;

    fn array_length(&self, array: ObjectId) -> Result<i32, RemoteError>;

    fn field_type(&self, field: &FieldRef) -> Result<FieldType, RemoteError>;

    /// Whether a value of type `from` may be stored where `to` is expected.
    fn is_assignable(&self, from: TypeId, to: TypeId) -> Result<bool, RemoteError>;

    fn mirror_of_int(&self, value: i32) -> Value {
        Value::Integer(value)
    }
}
