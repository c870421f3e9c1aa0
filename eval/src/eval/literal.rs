use crate::error::EvaluationError;
use crate::eval::context::EvaluationContext;
use crate::eval::{EvaluationResult, Evaluator};
use crate::value::Value;

/// A constant, `null` included. Never modifiable.
#[derive(Debug)]
pub struct LiteralEvaluator {
    value: Value,
}

impl LiteralEvaluator {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self::new(Value::Null)
    }
}

impl Evaluator for LiteralEvaluator {
    fn evaluate(&self, _ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError> {
        Ok(EvaluationResult::value(self.value))
    }
}
