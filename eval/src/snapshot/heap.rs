use crate::error::RemoteError;
use crate::keys::{FieldId, ObjectId, TypeId};
use crate::value::Value;
use dashmap::DashMap;
use std::sync::RwLock;

pub struct HeapObject {
    pub type_id: TypeId,
    fields: DashMap<FieldId, Value>,
    elements: Option<RwLock<Vec<Value>>>,
}

impl HeapObject {
    pub fn is_array(&self) -> bool {
        self.elements.is_some()
    }
}

/// Objects of the suspended process. Allocation needs `&mut`, field access does not.
#[derive(Default)]
pub struct Heap {
    objects: Vec<HeapObject>,
}

impl Heap {
    pub fn alloc_instance(
        &mut self,
        type_id: TypeId,
        layout: impl IntoIterator<Item = (FieldId, Value)>,
    ) -> ObjectId {
        self.objects.push(HeapObject {
            type_id,
            fields: layout.into_iter().collect(),
            elements: None,
        });
        ObjectId::from_usize(self.objects.len())
    }

    pub fn alloc_array(&mut self, type_id: TypeId, elements: Vec<Value>) -> ObjectId {
        self.objects.push(HeapObject {
            type_id,
            fields: DashMap::new(),
            elements: Some(RwLock::new(elements)),
        });
        ObjectId::from_usize(self.objects.len())
    }

    pub fn get(&self, id: ObjectId) -> Result<&HeapObject, RemoteError> {
        self.objects
            .get(id.to_index())
            .ok_or(RemoteError::InvalidObject(id))
    }

    pub fn read_field(&self, id: ObjectId, field: FieldId) -> Result<Option<Value>, RemoteError> {
        Ok(self.get(id)?.fields.get(&field).map(|v| *v))
    }

    /// Returns `false` when the object has no slot for the field.
    pub fn write_field(&self, id: ObjectId, field: FieldId, value: Value) -> Result<bool, RemoteError> {
        match self.get(id)?.fields.get_mut(&field) {
            Some(mut slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn get_array_length(&self, id: ObjectId) -> Result<i32, RemoteError> {
        let elements = self.elements(id)?;
        let guard = elements.read().map_err(|_| RemoteError::InvalidObject(id))?;
        Ok(guard.len() as i32)
    }

    pub fn read_array_element(&self, id: ObjectId, index: usize) -> Result<Option<Value>, RemoteError> {
        let elements = self.elements(id)?;
        let guard = elements.read().map_err(|_| RemoteError::InvalidObject(id))?;
        Ok(guard.get(index).copied())
    }

    pub fn write_array_element(
        &self,
        id: ObjectId,
        index: usize,
        value: Value,
    ) -> Result<bool, RemoteError> {
        let elements = self.elements(id)?;
        let mut guard = elements.write().map_err(|_| RemoteError::InvalidObject(id))?;
        match guard.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn elements(&self, id: ObjectId) -> Result<&RwLock<Vec<Value>>, RemoteError> {
        self.get(id)?
            .elements
            .as_ref()
            .ok_or(RemoteError::NotAnArray(id))
    }
}
