use crate::error::RemoteError;
use crate::jtype::JavaType;
use crate::keys::{FieldId, Symbol, TypeId};
use crate::remote::{Interfaces, TypeKind};
use crate::value::Value;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClassState {
    Loaded = 0,
    Prepared = 1,
}

pub struct FieldInfo {
    pub name: Symbol,
    pub declaring_type: TypeId,
    pub signature: JavaType,
    pub is_static: bool,
}

pub struct SnapshotType {
    pub name: Symbol,
    pub kind: TypeKind,
    pub super_id: Option<TypeId>,
    pub interfaces: Interfaces,
    /// Present for array types only.
    pub element_type: Option<JavaType>,
    state: AtomicU8,
    declared_fields: HashMap<Symbol, FieldId>,
    static_values: DashMap<FieldId, Value>,
    // instance fields of the whole superclass chain, fixed once the first instance exists
    instance_layout: OnceCell<Vec<FieldId>>,
}

impl SnapshotType {
    pub fn new(
        name: Symbol,
        kind: TypeKind,
        super_id: Option<TypeId>,
        interfaces: Interfaces,
        element_type: Option<JavaType>,
    ) -> Self {
        Self {
            name,
            kind,
            super_id,
            interfaces,
            element_type,
            state: AtomicU8::new(ClassState::Prepared as u8),
            declared_fields: HashMap::new(),
            static_values: DashMap::new(),
            instance_layout: OnceCell::new(),
        }
    }

    pub fn state(&self) -> ClassState {
        match self.state.load(Ordering::Acquire) {
            0 => ClassState::Loaded,
            _ => ClassState::Prepared,
        }
    }

    pub fn set_state(&self, state: ClassState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn is_prepared(&self) -> bool {
        self.state() == ClassState::Prepared
    }

    pub fn declared_field(&self, name: &Symbol) -> Option<FieldId> {
        self.declared_fields.get(name).copied()
    }

    pub fn has_instances(&self) -> bool {
        self.instance_layout.get().is_some()
    }

    pub(super) fn declare_field(&mut self, name: Symbol, id: FieldId, static_default: Option<Value>) {
        self.declared_fields.insert(name, id);
        if let Some(value) = static_default {
            self.static_values.insert(id, value);
        }
    }

    pub fn get_static_value(&self, field: FieldId) -> Option<Value> {
        self.static_values.get(&field).map(|v| *v)
    }

    pub fn set_static_value(&self, field: FieldId, value: Value) -> Result<(), RemoteError> {
        let mut slot = self
            .static_values
            .get_mut(&field)
            .ok_or(RemoteError::Linkage(format!("{} has no static storage", field)))?;
        *slot = value;
        Ok(())
    }

    pub fn get_or_init_layout(&self, init: impl FnOnce() -> Vec<FieldId>) -> &Vec<FieldId> {
        self.instance_layout.get_or_init(init)
    }
}
