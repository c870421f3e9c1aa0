pub use crate::config::EvalConfig;
pub use crate::error::{EvaluationError, RemoteError};
pub use crate::eval::context::{EvaluationContext, StackFrame};
pub use crate::eval::field::FieldEvaluator;
pub use crate::eval::modifier::{FieldDescriptor, FieldModifier, Modifier};
pub use crate::eval::{
    Binding, DeclaringEntity, Evaluated, EvaluationResult, Evaluator, Qualifier,
};
pub use crate::keys::{FieldId, ObjectId, Symbol, TypeId};
pub use crate::path::ExpressionBuilder;
pub use crate::remote::{FieldRef, FieldType, RemoteProcess, TypeKind};
pub use crate::resolve::HierarchyResolver;
pub use crate::snapshot::SnapshotProcess;
pub use crate::value::Value;

pub mod config;
pub mod error;
pub mod eval;
pub mod jtype;
pub mod keys;
pub mod path;
pub mod remote;
pub mod resolve;
pub mod snapshot;
pub mod value;

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "log-runtime-traces") {
            tracing_log::log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! debug_error_log {
    ($($arg:tt)*) => {
        if cfg!(feature = "log-runtime-traces") {
            tracing_log::log::error!($($arg)*);
        }
    };
}
