use crate::error::EvaluationError;
use crate::eval::context::EvaluationContext;
use crate::eval::modifier::{FieldModifier, Modifier};
use crate::keys::{ObjectId, TypeId};
use crate::remote::FieldRef;
use crate::value::Value;
use std::fmt::Debug;

pub mod context;
pub mod field;
pub mod frame;
pub mod literal;
pub mod modifier;
pub mod type_ref;

/// One node of an expression tree evaluated against a suspended process.
pub trait Evaluator: Debug + Send + Sync {
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError>;
}

/// What a node evaluated to. Class-name expressions (`Foo` in `Foo.bar`) yield a type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluated {
    Value(Value),
    Type(TypeId),
}

/// Left-hand side of a field access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualifier {
    TypeReference(TypeId),
    ObjectHandle(ObjectId),
    Null,
}

impl Qualifier {
    pub fn classify(evaluated: &Evaluated, field_name: &str) -> Result<Self, EvaluationError> {
        match evaluated {
            Evaluated::Type(ty) => Ok(Qualifier::TypeReference(*ty)),
            Evaluated::Value(Value::Object(obj)) => Ok(Qualifier::ObjectHandle(*obj)),
            Evaluated::Value(Value::Null) => Ok(Qualifier::Null),
            Evaluated::Value(primitive) => Err(EvaluationError::TypeMismatch {
                field: field_name.to_string(),
                found: primitive
                    .primitive_type()
                    .map(|p| p.java_name().to_string())
                    .unwrap_or_default(),
            }),
        }
    }
}

/// Where writes through a [`Binding`] land: a class's static storage or one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaringEntity {
    Type(TypeId),
    Object(ObjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub declaring: DeclaringEntity,
    pub field: FieldRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub evaluated: Evaluated,
    pub binding: Option<Binding>,
}

impl EvaluationResult {
    pub fn value(value: Value) -> Self {
        Self {
            evaluated: Evaluated::Value(value),
            binding: None,
        }
    }

    pub fn type_ref(ty: TypeId) -> Self {
        Self {
            evaluated: Evaluated::Type(ty),
            binding: None,
        }
    }

    pub fn bound(value: Value, binding: Binding) -> Self {
        Self {
            evaluated: Evaluated::Value(value),
            binding: Some(binding),
        }
    }

    pub fn as_value(&self) -> Option<Value> {
        match self.evaluated {
            Evaluated::Value(value) => Some(value),
            Evaluated::Type(_) => None,
        }
    }

    pub fn modifier(&self) -> Option<FieldModifier> {
        self.binding.clone().map(FieldModifier::new)
    }

    /// Writes through this result's binding; results without one are not modifiable.
    pub fn set_value(&self, ctx: &EvaluationContext<'_>, value: Value) -> Result<(), EvaluationError> {
        match self.modifier() {
            Some(modifier) => modifier.set_value(ctx, value),
            None => Err(EvaluationError::NotModifiable(match self.evaluated {
                Evaluated::Value(value) => format!("computed value {}", value),
                Evaluated::Type(ty) => format!("type reference {}", ty),
            })),
        }
    }
}
