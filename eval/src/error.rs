use crate::keys::{ObjectId, TypeId};
use std::fmt::Display;

/// Failures reported by the remote process model.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// The debug session was torn down; every call after that fails.
    Disconnected,
    InvalidObject(ObjectId),
    InvalidType(TypeId),
    NotAnArray(ObjectId),
    /// Static storage of the class is not available yet.
    ClassNotPrepared(String),
    /// A type the operation depends on was never loaded by the target.
    ClassNotLoaded(String),
    /// The field does not belong to the type or object it was used with.
    FieldNotApplicable { field: String, owner: String },
    IncompatibleValue {
        field: String,
        expected: String,
        actual: String,
    },
    InvalidDescriptor(String),
    Linkage(String),
}

impl Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Disconnected => write!(f, "target process disconnected"),
            RemoteError::InvalidObject(id) => write!(f, "invalid object reference {}", id),
            RemoteError::InvalidType(id) => write!(f, "invalid type reference {}", id),
            RemoteError::NotAnArray(id) => write!(f, "{} is not an array", id),
            RemoteError::ClassNotPrepared(name) => write!(f, "class {} is not prepared", name),
            RemoteError::ClassNotLoaded(name) => write!(f, "class {} is not loaded", name),
            RemoteError::FieldNotApplicable { field, owner } => {
                write!(f, "field {} does not belong to {}", field, owner)
            }
            RemoteError::IncompatibleValue {
                field,
                expected,
                actual,
            } => write!(
                f,
                "value of type {} is not assignable to field {} of type {}",
                actual, field, expected
            ),
            RemoteError::InvalidDescriptor(desc) => write!(f, "invalid field descriptor {:?}", desc),
            RemoteError::Linkage(msg) => write!(f, "linkage error: {}", msg),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Evaluation-time failures surfaced to the caller of an evaluator tree.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    NullDereference { field: String },
    TypeMismatch { field: String, found: String },
    NoSuchStaticField(String),
    NoSuchField(String),
    TypeIncompatible {
        field: String,
        expected: String,
        actual: String,
    },
    RemoteAccessFailure(RemoteError),
    /// A write was requested on a result that carries no binding.
    NotModifiable(String),
    UnknownVariable(String),
    UnknownType(String),
    InvalidExpression(String),
}

impl EvaluationError {
    /// Environmental failures may go away on their own; the expression itself may be fine.
    pub fn is_environmental(&self) -> bool {
        matches!(self, EvaluationError::RemoteAccessFailure(_))
    }
}

impl From<RemoteError> for EvaluationError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::IncompatibleValue {
                field,
                expected,
                actual,
            } => EvaluationError::TypeIncompatible {
                field,
                expected,
                actual,
            },
            other => EvaluationError::RemoteAccessFailure(other),
        }
    }
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationError::NullDereference { field } => {
                write!(f, "java.lang.NullPointerException while evaluating field : {}", field)
            }
            EvaluationError::TypeMismatch { field, found } => write!(
                f,
                "Class or array type expected while evaluating field : {}, found {}",
                field, found
            ),
            EvaluationError::NoSuchStaticField(name) => write!(f, "No such static field: {}", name),
            EvaluationError::NoSuchField(name) => write!(f, "No such field: {}", name),
            EvaluationError::TypeIncompatible {
                field,
                expected,
                actual,
            } => write!(
                f,
                "Cannot assign value of type {} to field {} of type {}",
                actual, field, expected
            ),
            EvaluationError::RemoteAccessFailure(cause) => {
                write!(f, "Remote access failed: {}", cause)
            }
            EvaluationError::NotModifiable(what) => write!(f, "Cannot modify {}", what),
            EvaluationError::UnknownVariable(name) => write!(f, "Cannot find local variable: {}", name),
            EvaluationError::UnknownType(name) => write!(f, "Cannot find class: {}", name),
            EvaluationError::InvalidExpression(expr) => write!(f, "Invalid expression: {:?}", expr),
        }
    }
}

impl std::error::Error for EvaluationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvaluationError::RemoteAccessFailure(cause) => Some(cause),
            _ => None,
        }
    }
}
