use crate::debug_log;
use crate::error::RemoteError;
use crate::keys::TypeId;
use crate::remote::{FieldRef, RemoteProcess};
use std::collections::HashSet;

/// Locates the field a source-level `qualifier.name` refers to.
///
/// Search order for a type: its own declarations, then each direct interface depth-first in
/// declaration order, then its superclass. The static flag is not looked at here.
///
/// An owner hint (the type whose code is being debugged) only arbitrates between inherited
/// declarations: when the start type does not declare the field and the hint names a supertype
/// that does, the hinted declaration is returned.
pub struct HierarchyResolver<'a> {
    process: &'a dyn RemoteProcess,
    owner_hint: Option<&'a str>,
}

impl<'a> HierarchyResolver<'a> {
    pub fn new(process: &'a dyn RemoteProcess) -> Self {
        Self {
            process,
            owner_hint: None,
        }
    }

    pub fn with_owner_hint(mut self, owner_hint: Option<&'a str>) -> Self {
        self.owner_hint = owner_hint;
        self
    }

    #[hotpath::measure]
    pub fn resolve(&self, start: TypeId, field_name: &str) -> Result<Option<FieldRef>, RemoteError> {
        if let Some(field) = self.process.field_by_name(start, field_name)? {
            return Ok(Some(field));
        }
        if let Some(field) = self.resolve_in_owner(start, field_name)? {
            debug_log!("Field \"{field_name}\" resolved in owner type {}", field.declaring_type);
            return Ok(Some(field));
        }
        let mut visited = HashSet::from([start]);
        let found = self.search_supertypes(start, field_name, &mut visited)?;
        debug_log!(
            "Field \"{field_name}\" from {start}: {:?} ({} types searched)",
            found.as_ref().map(|f| f.declaring_type),
            visited.len()
        );
        Ok(found)
    }

    fn resolve_in_owner(
        &self,
        start: TypeId,
        field_name: &str,
    ) -> Result<Option<FieldRef>, RemoteError> {
        let Some(hint) = self.owner_hint else {
            return Ok(None);
        };
        let Some(owner) = self.process.class_by_name(&hint.replace('.', "/"))? else {
            return Ok(None);
        };
        if owner == start || !self.process.is_assignable(start, owner)? {
            return Ok(None);
        }
        self.process.field_by_name(owner, field_name)
    }

    fn resolve_rec(
        &self,
        ty: TypeId,
        field_name: &str,
        visited: &mut HashSet<TypeId>,
    ) -> Result<Option<FieldRef>, RemoteError> {
        if !visited.insert(ty) {
            return Ok(None);
        }
        if let Some(field) = self.process.field_by_name(ty, field_name)? {
            return Ok(Some(field));
        }
        self.search_supertypes(ty, field_name, visited)
    }

    fn search_supertypes(
        &self,
        ty: TypeId,
        field_name: &str,
        visited: &mut HashSet<TypeId>,
    ) -> Result<Option<FieldRef>, RemoteError> {
        for interface_id in self.process.interfaces(ty)? {
            if let Some(field) = self.resolve_rec(interface_id, field_name, visited)? {
                return Ok(Some(field));
            }
        }
        match self.process.superclass(ty)? {
            Some(super_id) => self.resolve_rec(super_id, field_name, visited),
            None => Ok(None),
        }
    }
}
