use crate::debug_log;
use crate::error::EvaluationError;
use crate::eval::context::EvaluationContext;
use crate::eval::{Binding, DeclaringEntity};
use crate::keys::ObjectId;
use crate::remote::{FieldRef, FieldType};
use crate::value::Value;

/// Write access to whatever an evaluation resolved to.
pub trait Modifier {
    /// Whether a watch tree should offer to drill into the target.
    fn can_inspect(&self) -> bool;

    fn can_set_value(&self) -> bool;

    fn set_value(&self, ctx: &EvaluationContext<'_>, value: Value) -> Result<(), EvaluationError>;

    fn expected_type(&self, ctx: &EvaluationContext<'_>) -> Result<FieldType, EvaluationError>;

    fn inspect_item(&self) -> Option<FieldDescriptor>;
}

/// Watch-tree node for an instance field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub object: ObjectId,
    pub field: FieldRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldModifier {
    binding: Binding,
}

impl FieldModifier {
    pub fn new(binding: Binding) -> Self {
        Self { binding }
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

impl Modifier for FieldModifier {
    fn can_inspect(&self) -> bool {
        matches!(self.binding.declaring, DeclaringEntity::Object(_))
    }

    fn can_set_value(&self) -> bool {
        true
    }

    fn set_value(&self, ctx: &EvaluationContext<'_>, value: Value) -> Result<(), EvaluationError> {
        let field = &self.binding.field;
        debug_log!("Setting {} to {value} via {:?}", field.name, self.binding.declaring);
        match self.binding.declaring {
            DeclaringEntity::Type(ty) => ctx.process().write_static_field(ty, field, value)?,
            DeclaringEntity::Object(obj) => ctx.process().write_field(obj, field, value)?,
        }
        Ok(())
    }

    fn expected_type(&self, ctx: &EvaluationContext<'_>) -> Result<FieldType, EvaluationError> {
        Ok(ctx.process().field_type(&self.binding.field)?)
    }

    fn inspect_item(&self) -> Option<FieldDescriptor> {
        match self.binding.declaring {
            DeclaringEntity::Object(object) => Some(FieldDescriptor {
                object,
                field: self.binding.field.clone(),
            }),
            DeclaringEntity::Type(_) => None,
        }
    }
}
