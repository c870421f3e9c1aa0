use crate::error::EvaluationError;
use crate::eval::context::EvaluationContext;
use crate::eval::{EvaluationResult, Evaluator};
use crate::value::Value;

pub const THIS_KEYWORD: &str = "this";

/// `this` of the current frame.
#[derive(Debug)]
pub struct ThisEvaluator;

impl Evaluator for ThisEvaluator {
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError> {
        ctx.frame()
            .this_object
            .map(|obj| EvaluationResult::value(Value::Object(obj)))
            .ok_or_else(|| EvaluationError::UnknownVariable(THIS_KEYWORD.to_string()))
    }
}

/// A local variable or parameter of the current frame.
#[derive(Debug)]
pub struct LocalVariableEvaluator {
    name: String,
}

impl LocalVariableEvaluator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Evaluator for LocalVariableEvaluator {
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, EvaluationError> {
        ctx.frame()
            .locals
            .get(&self.name)
            .map(|value| EvaluationResult::value(*value))
            .ok_or_else(|| EvaluationError::UnknownVariable(self.name.clone()))
    }
}
