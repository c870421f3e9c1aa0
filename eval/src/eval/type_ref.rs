use crate::error::EvaluationError;
use crate::eval::context::EvaluationContext;
use crate::eval::{EvaluationResult, Evaluator};

/// A class name used as a qualifier, e.g. `java.lang.Integer` in `java.lang.Integer.MAX_VALUE`.
#[derive(Debug)]
pub struct TypeEvaluator {
    type_name: String,
}

impl TypeEvaluator {
    /// Accepts both `com.example.Foo` and `com/example/Foo`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into().replace('.', "/"),
        }
    }
}

impl Evaluator for TypeEvaluator {
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError> {
        ctx.process()
            .class_by_name(&self.type_name)?
            .map(EvaluationResult::type_ref)
            .ok_or_else(|| EvaluationError::UnknownType(self.type_name.replace('/', ".")))
    }
}
