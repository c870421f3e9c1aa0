//! In-memory stand-in for a suspended target process: a type table plus a heap, reachable
//! only through [`RemoteProcess`] once set up.

use crate::error::RemoteError;
use crate::jtype::JavaType;
use crate::keys::{FieldId, ObjectId, Symbol, TypeId};
use crate::remote::{FieldRef, FieldType, Interfaces, RemoteProcess, TypeKind};
use crate::snapshot::heap::Heap;
use crate::snapshot::types::{FieldInfo, SnapshotType};
use crate::value::Value;
use crate::{debug_error_log, debug_log};
use lasso::ThreadedRodeo;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod fixture;
mod heap;
mod types;

pub use types::ClassState;

pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";

pub struct SnapshotProcess {
    interner: ThreadedRodeo,
    types: Vec<SnapshotType>,
    type_name_index: HashMap<Symbol, TypeId>,
    fields: Vec<FieldInfo>,
    heap: Heap,
    connected: AtomicBool,
    java_lang_object_id: TypeId,
}

impl Default for SnapshotProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotProcess {
    pub fn new() -> Self {
        let interner = ThreadedRodeo::default();
        let object_sym = interner.get_or_intern(JAVA_LANG_OBJECT);
        let mut process = Self {
            interner,
            types: Vec::with_capacity(64),
            type_name_index: HashMap::new(),
            fields: Vec::new(),
            heap: Heap::default(),
            connected: AtomicBool::new(true),
            java_lang_object_id: TypeId::from_usize(1),
        };
        process.java_lang_object_id = process.push_type(SnapshotType::new(
            object_sym,
            TypeKind::Class,
            None,
            Interfaces::new(),
            None,
        ));
        process
    }

    pub fn java_lang_object_id(&self) -> TypeId {
        self.java_lang_object_id
    }

    fn push_type(&mut self, ty: SnapshotType) -> TypeId {
        let name = ty.name;
        self.types.push(ty);
        let id = TypeId::from_usize(self.types.len());
        self.type_name_index.insert(name, id);
        id
    }

    fn get_type(&self, id: TypeId) -> Result<&SnapshotType, RemoteError> {
        self.types
            .get(id.to_index())
            .ok_or(RemoteError::InvalidType(id))
    }

    fn get_type_mut(&mut self, id: TypeId) -> Result<&mut SnapshotType, RemoteError> {
        self.types
            .get_mut(id.to_index())
            .ok_or(RemoteError::InvalidType(id))
    }

    fn lookup_type(&self, name: &str) -> Option<TypeId> {
        let sym = self.interner.get(name)?;
        self.type_name_index.get(&sym).copied()
    }

    fn lookup_loaded(&self, name: &str) -> Result<TypeId, RemoteError> {
        self.lookup_type(name)
            .ok_or_else(|| RemoteError::ClassNotLoaded(name.to_string()))
    }

    fn name_of(&self, id: TypeId) -> Result<&str, RemoteError> {
        Ok(self.interner.resolve(&self.get_type(id)?.name))
    }

    fn new_type_name(&self, name: &str) -> Result<Symbol, RemoteError> {
        if self.lookup_type(name).is_some() {
            return Err(RemoteError::Linkage(format!("type {} is already defined", name)));
        }
        Ok(self.interner.get_or_intern(name))
    }

    fn lookup_interfaces(&self, names: &[&str]) -> Result<Interfaces, RemoteError> {
        names
            .iter()
            .map(|name| {
                let id = self.lookup_loaded(name)?;
                match self.get_type(id)?.kind {
                    TypeKind::Interface => Ok(id),
                    _ => Err(RemoteError::Linkage(format!("{} is not an interface", name))),
                }
            })
            .collect()
    }

    /// Defines a class; without `super_name` it extends `java/lang/Object`.
    pub fn define_class(
        &mut self,
        name: &str,
        super_name: Option<&str>,
        interfaces: &[&str],
    ) -> Result<TypeId, RemoteError> {
        let super_id = self.lookup_loaded(super_name.unwrap_or(JAVA_LANG_OBJECT))?;
        if self.get_type(super_id)?.kind != TypeKind::Class {
            return Err(RemoteError::Linkage(format!(
                "superclass of {} must be a class",
                name
            )));
        }
        let interfaces = self.lookup_interfaces(interfaces)?;
        let sym = self.new_type_name(name)?;
        debug_log!("Defining class {name} extends {super_id}");
        Ok(self.push_type(SnapshotType::new(
            sym,
            TypeKind::Class,
            Some(super_id),
            interfaces,
            None,
        )))
    }

    pub fn define_interface(
        &mut self,
        name: &str,
        super_interfaces: &[&str],
    ) -> Result<TypeId, RemoteError> {
        let interfaces = self.lookup_interfaces(super_interfaces)?;
        let sym = self.new_type_name(name)?;
        debug_log!("Defining interface {name}");
        Ok(self.push_type(SnapshotType::new(
            sym,
            TypeKind::Interface,
            None,
            interfaces,
            None,
        )))
    }

    /// Defines (or returns the already defined) array type for a descriptor such as `[I`.
    pub fn define_array(&mut self, descriptor: &str) -> Result<TypeId, RemoteError> {
        if let Some(id) = self.lookup_type(descriptor) {
            return Ok(id);
        }
        let element_type = match JavaType::try_from(descriptor)? {
            JavaType::Array(element) => *element,
            _ => return Err(RemoteError::InvalidDescriptor(descriptor.to_string())),
        };
        let sym = self.interner.get_or_intern(descriptor);
        Ok(self.push_type(SnapshotType::new(
            sym,
            TypeKind::Array,
            Some(self.java_lang_object_id),
            Interfaces::new(),
            Some(element_type),
        )))
    }

    pub fn add_field(
        &mut self,
        type_id: TypeId,
        name: &str,
        descriptor: &str,
        is_static: bool,
    ) -> Result<FieldId, RemoteError> {
        let signature = JavaType::try_from(descriptor)?;
        let sym = self.interner.get_or_intern(name);
        let type_name = self.name_of(type_id)?.to_string();
        let ty = self.get_type(type_id)?;
        let invalid = match ty.kind {
            TypeKind::Array => Some("array types declare no fields"),
            TypeKind::Interface if !is_static => Some("interface fields must be static"),
            _ if ty.declared_field(&sym).is_some() => Some("field is already declared"),
            _ if !is_static && ty.has_instances() => Some("instance layout is already fixed"),
            _ => None,
        };
        if let Some(reason) = invalid {
            return Err(RemoteError::Linkage(format!("{}.{}: {}", type_name, name, reason)));
        }

        let static_default = is_static.then(|| Value::from(&signature));
        self.fields.push(FieldInfo {
            name: sym,
            declaring_type: type_id,
            signature,
            is_static,
        });
        let field_id = FieldId::from_usize(self.fields.len());
        self.get_type_mut(type_id)?
            .declare_field(sym, field_id, static_default);
        Ok(field_id)
    }

    pub fn set_class_state(&self, type_id: TypeId, state: ClassState) -> Result<(), RemoteError> {
        self.get_type(type_id)?.set_state(state);
        Ok(())
    }

    /// Allocates an instance with every instance field of the superclass chain at its zero value.
    /// No instantiability check is made: the snapshot holds whatever the target reports.
    pub fn new_instance(&mut self, type_id: TypeId) -> Result<ObjectId, RemoteError> {
        if self.get_type(type_id)?.kind == TypeKind::Array {
            return Err(RemoteError::Linkage(format!(
                "{} is an array type",
                self.name_of(type_id)?
            )));
        }
        let layout = self.instance_layout(type_id)?;
        let slots = layout
            .into_iter()
            .map(|id| (id, Value::from(&self.fields[id.to_index()].signature)))
            .collect::<Vec<_>>();
        Ok(self.heap.alloc_instance(type_id, slots))
    }

    fn instance_layout(&self, type_id: TypeId) -> Result<Vec<FieldId>, RemoteError> {
        let mut layout = Vec::new();
        let mut cur = Some(type_id);
        while let Some(id) = cur {
            let ty = self.get_type(id)?;
            let own = ty.get_or_init_layout(|| {
                self.fields
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| !f.is_static && f.declaring_type == id)
                    .map(|(idx, _)| FieldId::from_usize(idx + 1))
                    .collect()
            });
            layout.extend(own.iter().copied());
            cur = ty.super_id;
        }
        Ok(layout)
    }

    pub fn new_array(&mut self, type_id: TypeId, length: usize) -> Result<ObjectId, RemoteError> {
        let ty = self.get_type(type_id)?;
        let element_type = ty.element_type.as_ref().ok_or_else(|| {
            RemoteError::Linkage(format!("{} is not an array type", self.interner.resolve(&ty.name)))
        })?;
        let elements = vec![Value::from(element_type); length];
        Ok(self.heap.alloc_array(type_id, elements))
    }

    pub fn read_array_element(&self, array: ObjectId, index: usize) -> Result<Option<Value>, RemoteError> {
        self.ensure_connected()?;
        self.heap.read_array_element(array, index)
    }

    pub fn write_array_element(
        &self,
        array: ObjectId,
        index: usize,
        value: Value,
    ) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        let type_id = self.heap.get(array)?.type_id;
        let element_type = self
            .get_type(type_id)?
            .element_type
            .as_ref()
            .ok_or(RemoteError::NotAnArray(array))?;
        self.check_assignable(element_type, value, &format!("[{}]", index))?;
        if !self.heap.write_array_element(array, index, value)? {
            return Err(RemoteError::FieldNotApplicable {
                field: format!("[{}]", index),
                owner: array.to_string(),
            });
        }
        Ok(())
    }

    /// The instance field `name` visible from the object's runtime class.
    pub fn instance_field(&self, obj: ObjectId, name: &str) -> Result<Option<FieldRef>, RemoteError> {
        let mut cur = Some(self.runtime_type(obj)?);
        while let Some(type_id) = cur {
            if let Some(field) = self.field_by_name(type_id, name)?.filter(|f| !f.is_static) {
                return Ok(Some(field));
            }
            cur = self.get_type(type_id)?.super_id;
        }
        Ok(None)
    }

    pub fn set_instance_field(&self, obj: ObjectId, name: &str, value: Value) -> Result<(), RemoteError> {
        let field = self
            .instance_field(obj, name)?
            .ok_or_else(|| RemoteError::FieldNotApplicable {
                field: name.to_string(),
                owner: obj.to_string(),
            })?;
        self.write_field(obj, &field, value)
    }

    /// Writes a static field declared directly by `type_id`.
    pub fn set_static_field(&self, type_id: TypeId, name: &str, value: Value) -> Result<(), RemoteError> {
        let field = self
            .field_by_name(type_id, name)?
            .filter(|f| f.is_static)
            .ok_or_else(|| RemoteError::FieldNotApplicable {
                field: name.to_string(),
                owner: type_id.to_string(),
            })?;
        self.write_static_field(type_id, &field, value)
    }

    /// Tears the session down; every later call fails with [`RemoteError::Disconnected`].
    pub fn disconnect(&self) {
        debug_log!("Snapshot process disconnected");
        self.connected.store(false, Ordering::Release);
    }

    fn ensure_connected(&self) -> Result<(), RemoteError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(RemoteError::Disconnected)
        }
    }

    fn field_ref(&self, id: FieldId) -> FieldRef {
        let info = &self.fields[id.to_index()];
        FieldRef {
            id,
            name: self.interner.resolve(&info.name).to_string(),
            declaring_type: info.declaring_type,
            signature: info.signature.clone(),
            is_static: info.is_static,
        }
    }

    fn is_subtype(&self, from: TypeId, to: TypeId) -> bool {
        if from == to || to == self.java_lang_object_id {
            return true;
        }
        let Ok(this) = self.get_type(from) else {
            return false;
        };

        if let (Some(this_element), Some(target_element)) = (
            this.element_type.as_ref(),
            self.get_type(to).ok().and_then(|t| t.element_type.as_ref()),
        ) {
            return match (this_element, target_element) {
                (JavaType::Primitive(a), JavaType::Primitive(b)) => a == b,
                (JavaType::Primitive(_), _) | (_, JavaType::Primitive(_)) => false,
                (a, b) => match (self.lookup_type(&a.type_name()), self.lookup_type(&b.type_name())) {
                    (Some(a), Some(b)) => self.is_subtype(a, b),
                    _ => false,
                },
            };
        }

        if let Some(super_id) = this.super_id {
            if self.is_subtype(super_id, to) {
                return true;
            }
        }
        this.interfaces
            .iter()
            .any(|interface_id| self.is_subtype(*interface_id, to))
    }

    fn describe(&self, value: Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Object(obj) => self
                .heap
                .get(obj)
                .and_then(|o| self.name_of(o.type_id))
                .map(|name| match JavaType::try_from(name) {
                    Ok(array @ JavaType::Array(_)) => array.to_string(),
                    _ => name.replace('/', "."),
                })
                .unwrap_or_else(|_| obj.to_string()),
            primitive => primitive
                .primitive_type()
                .map(|p| p.java_name().to_string())
                .unwrap_or_default(),
        }
    }

    fn check_assignable(&self, target: &JavaType, value: Value, what: &str) -> Result<(), RemoteError> {
        let compatible = match (target, value) {
            (JavaType::Primitive(expected), value) => value.primitive_type() == Some(*expected),
            (_, Value::Null) => true,
            (target, Value::Object(obj)) => {
                let to = self.lookup_loaded(&target.type_name())?;
                let from = self.heap.get(obj)?.type_id;
                self.is_subtype(from, to)
            }
            _ => false,
        };
        if compatible {
            Ok(())
        } else {
            debug_error_log!("Rejected write of {value} into {what}");
            Err(RemoteError::IncompatibleValue {
                field: what.to_string(),
                expected: target.to_string(),
                actual: self.describe(value),
            })
        }
    }

    fn applicable_to(&self, type_id: TypeId, field: &FieldRef) -> Result<(), RemoteError> {
        if self.is_subtype(type_id, field.declaring_type) {
            Ok(())
        } else {
            Err(RemoteError::FieldNotApplicable {
                field: field.name.clone(),
                owner: self.name_of(type_id)?.to_string(),
            })
        }
    }

    fn static_storage(&self, type_id: TypeId, field: &FieldRef) -> Result<&SnapshotType, RemoteError> {
        if !field.is_static {
            return Err(RemoteError::FieldNotApplicable {
                field: field.name.clone(),
                owner: format!("static storage of {}", self.name_of(type_id)?),
            });
        }
        self.applicable_to(type_id, field)?;
        let declaring = self.get_type(field.declaring_type)?;
        if !declaring.is_prepared() {
            return Err(RemoteError::ClassNotPrepared(
                self.name_of(field.declaring_type)?.to_string(),
            ));
        }
        Ok(declaring)
    }
}

impl RemoteProcess for SnapshotProcess {
    fn type_kind(&self, ty: TypeId) -> Result<TypeKind, RemoteError> {
        self.ensure_connected()?;
        Ok(self.get_type(ty)?.kind)
    }

    fn type_name(&self, ty: TypeId) -> Result<String, RemoteError> {
        self.ensure_connected()?;
        Ok(self.name_of(ty)?.to_string())
    }

    fn class_by_name(&self, name: &str) -> Result<Option<TypeId>, RemoteError> {
        self.ensure_connected()?;
        Ok(self.lookup_type(name))
    }

    fn field_by_name(&self, ty: TypeId, name: &str) -> Result<Option<FieldRef>, RemoteError> {
        self.ensure_connected()?;
        let ty = self.get_type(ty)?;
        Ok(self
            .interner
            .get(name)
            .and_then(|sym| ty.declared_field(&sym))
            .map(|id| self.field_ref(id)))
    }

    fn interfaces(&self, ty: TypeId) -> Result<Interfaces, RemoteError> {
        self.ensure_connected()?;
        Ok(self.get_type(ty)?.interfaces.clone())
    }

    fn superclass(&self, ty: TypeId) -> Result<Option<TypeId>, RemoteError> {
        self.ensure_connected()?;
        Ok(self.get_type(ty)?.super_id)
    }

    fn runtime_type(&self, obj: ObjectId) -> Result<TypeId, RemoteError> {
        self.ensure_connected()?;
        Ok(self.heap.get(obj)?.type_id)
    }

    fn read_field(&self, obj: ObjectId, field: &FieldRef) -> Result<Value, RemoteError> {
        let type_id = self.runtime_type(obj)?;
        if field.is_static {
            return self.read_static_field(type_id, field);
        }
        self.heap
            .read_field(obj, field.id)?
            .ok_or_else(|| RemoteError::FieldNotApplicable {
                field: field.name.clone(),
                owner: obj.to_string(),
            })
    }

    fn write_field(&self, obj: ObjectId, field: &FieldRef, value: Value) -> Result<(), RemoteError> {
        let type_id = self.runtime_type(obj)?;
        if field.is_static {
            return self.write_static_field(type_id, field, value);
        }
        self.applicable_to(type_id, field)?;
        self.check_assignable(&field.signature, value, &field.name)?;
        debug_log!("Writing {value} into {obj}.{}", field.name);
        if !self.heap.write_field(obj, field.id, value)? {
            return Err(RemoteError::FieldNotApplicable {
                field: field.name.clone(),
                owner: obj.to_string(),
            });
        }
        Ok(())
    }

    fn read_static_field(&self, ty: TypeId, field: &FieldRef) -> Result<Value, RemoteError> {
        self.ensure_connected()?;
        let declaring = self.static_storage(ty, field)?;
        declaring
            .get_static_value(field.id)
            .ok_or_else(|| RemoteError::Linkage(format!("{} has no static storage", field.name)))
    }

    fn write_static_field(
        &self,
        ty: TypeId,
        field: &FieldRef,
        value: Value,
    ) -> Result<(), RemoteError> {
        self.ensure_connected()?;
        let declaring = self.static_storage(ty, field)?;
        self.check_assignable(&field.signature, value, &field.name)?;
        debug_log!("Writing {value} into static {}", field.name);
        declaring.set_static_value(field.id, value)
    }

    fn array_length(&self, array: ObjectId) -> Result<i32, RemoteError> {
        self.ensure_connected()?;
        self.heap.get_array_length(array)
    }

    fn field_type(&self, field: &FieldRef) -> Result<FieldType, RemoteError> {
        self.ensure_connected()?;
        match &field.signature {
            JavaType::Primitive(prim) => Ok(FieldType::Primitive(*prim)),
            reference => Ok(FieldType::Reference(
                self.lookup_loaded(&reference.type_name())?,
            )),
        }
    }

    fn is_assignable(&self, from: TypeId, to: TypeId) -> Result<bool, RemoteError> {
        self.ensure_connected()?;
        self.get_type(from)?;
        self.get_type(to)?;
        Ok(self.is_subtype(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn point_process() -> (SnapshotProcess, TypeId, ObjectId) {
        let mut process = SnapshotProcess::new();
        let point = process.define_class("com/example/Point", None, &[]).unwrap();
        process.add_field(point, "x", "I", false).unwrap();
        process.add_field(point, "label", "Ljava/lang/Object;", false).unwrap();
        process.add_field(point, "ORIGIN", "Lcom/example/Point;", true).unwrap();
        let obj = process.new_instance(point).unwrap();
        (process, point, obj)
    }

    #[test]
    fn instances_start_with_zero_values() {
        let (process, point, obj) = point_process();
        let x = process.field_by_name(point, "x").unwrap().unwrap();
        let label = process.field_by_name(point, "label").unwrap().unwrap();
        assert_eq!(process.read_field(obj, &x).unwrap(), Value::Integer(0));
        assert_eq!(process.read_field(obj, &label).unwrap(), Value::Null);
    }

    #[test]
    fn instance_layout_includes_superclass_fields() {
        let (mut process, _, _) = point_process();
        let sub = process
            .define_class("com/example/Point3", Some("com/example/Point"), &[])
            .unwrap();
        process.add_field(sub, "z", "I", false).unwrap();
        let obj = process.new_instance(sub).unwrap();
        process.set_instance_field(obj, "x", Value::Integer(4)).unwrap();
        process.set_instance_field(obj, "z", Value::Integer(5)).unwrap();
        let x = process
            .field_by_name(process.lookup_type("com/example/Point").unwrap(), "x")
            .unwrap()
            .unwrap();
        assert_eq!(process.read_field(obj, &x).unwrap(), Value::Integer(4));
    }

    #[test]
    fn instance_fields_cannot_be_added_after_allocation() {
        let (mut process, point, _) = point_process();
        let err = process.add_field(point, "y", "I", false).unwrap_err();
        assert!(matches!(err, RemoteError::Linkage(_)));
        process.add_field(point, "COUNT", "I", true).unwrap();
    }

    #[rstest]
    #[case(Value::Boolean(true))]
    #[case(Value::Long(1))]
    #[case(Value::Null)]
    fn rejects_incompatible_primitive_writes(#[case] value: Value) {
        let (process, point, obj) = point_process();
        let x = process.field_by_name(point, "x").unwrap().unwrap();
        let err = process.write_field(obj, &x, value).unwrap_err();
        assert!(matches!(err, RemoteError::IncompatibleValue { .. }));
        assert_eq!(process.read_field(obj, &x).unwrap(), Value::Integer(0));
    }

    #[test]
    fn reference_writes_check_subtyping() {
        let (mut process, point, obj) = point_process();
        let other = process.define_class("com/example/Other", None, &[]).unwrap();
        let other_obj = process.new_instance(other).unwrap();
        let origin = process.field_by_name(point, "ORIGIN").unwrap().unwrap();
        let label = process.field_by_name(point, "label").unwrap().unwrap();

        process.write_static_field(point, &origin, Value::Object(obj)).unwrap();
        process.write_field(obj, &label, Value::Object(other_obj)).unwrap();
        let err = process
            .write_static_field(point, &origin, Value::Object(other_obj))
            .unwrap_err();
        insta::assert_snapshot!(err, @"value of type com.example.Other is not assignable to field ORIGIN of type com.example.Point");
    }

    #[test]
    fn unprepared_class_has_no_static_storage() {
        let (process, point, _) = point_process();
        let origin = process.field_by_name(point, "ORIGIN").unwrap().unwrap();
        process.set_class_state(point, ClassState::Loaded).unwrap();
        assert_eq!(
            process.read_static_field(point, &origin),
            Err(RemoteError::ClassNotPrepared("com/example/Point".to_string()))
        );
    }

    #[test]
    fn arrays_are_subtypes_of_object_and_covariant() {
        let mut process = SnapshotProcess::new();
        let base = process.define_class("com/example/Base", None, &[]).unwrap();
        let derived = process
            .define_class("com/example/Derived", Some("com/example/Base"), &[])
            .unwrap();
        let ints = process.define_array("[I").unwrap();
        let longs = process.define_array("[J").unwrap();
        let bases = process.define_array("[Lcom/example/Base;").unwrap();
        let deriveds = process.define_array("[Lcom/example/Derived;").unwrap();

        assert!(process.is_assignable(derived, base).unwrap());
        assert!(!process.is_assignable(base, derived).unwrap());
        assert!(process.is_assignable(ints, process.java_lang_object_id()).unwrap());
        assert!(!process.is_assignable(ints, longs).unwrap());
        assert!(process.is_assignable(deriveds, bases).unwrap());
        assert!(!process.is_assignable(bases, deriveds).unwrap());
        assert_eq!(process.define_array("[I").unwrap(), ints);
    }

    #[test]
    fn array_length_and_elements() {
        let mut process = SnapshotProcess::new();
        let ints = process.define_array("[I").unwrap();
        let arr = process.new_array(ints, 3).unwrap();
        process.write_array_element(arr, 1, Value::Integer(7)).unwrap();
        assert_eq!(process.array_length(arr).unwrap(), 3);
        assert_eq!(process.read_array_element(arr, 1).unwrap(), Some(Value::Integer(7)));
        assert!(process.write_array_element(arr, 3, Value::Integer(1)).is_err());
        assert!(process.write_array_element(arr, 0, Value::Long(1)).is_err());
    }

    #[test]
    fn disconnect_fails_every_call() {
        let (process, point, obj) = point_process();
        let x = process.field_by_name(point, "x").unwrap().unwrap();
        process.disconnect();
        assert_eq!(process.read_field(obj, &x), Err(RemoteError::Disconnected));
        assert_eq!(process.class_by_name("com/example/Point"), Err(RemoteError::Disconnected));
    }
}
