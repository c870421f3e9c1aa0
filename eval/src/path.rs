//! Builds evaluator chains for dotted member paths such as `this.owner.name`,
//! `com.example.Config.INSTANCE.size` or `items.length`. Not a general expression parser.

use crate::error::EvaluationError;
use crate::eval::Evaluator;
use crate::eval::context::EvaluationContext;
use crate::eval::field::FieldEvaluator;
use crate::eval::frame::{LocalVariableEvaluator, THIS_KEYWORD, ThisEvaluator};
use crate::eval::literal::LiteralEvaluator;
use crate::eval::type_ref::TypeEvaluator;

pub struct ExpressionBuilder;

impl ExpressionBuilder {
    /// The first segment is `this`, `null`, a local, the longest prefix naming a loaded class,
    /// or else an implicit `this.` (or the declaring class in static frames).
    pub fn build(expr: &str, ctx: &EvaluationContext<'_>) -> Result<Box<dyn Evaluator>, EvaluationError> {
        let segments = expr.trim().split('.').map(str::trim).collect::<Vec<_>>();
        if !segments.iter().all(|s| is_identifier(s)) {
            return Err(EvaluationError::InvalidExpression(expr.to_string()));
        }

        let frame = ctx.frame();
        let (mut current, consumed): (Box<dyn Evaluator>, usize) = match segments[0] {
            THIS_KEYWORD => (Box::new(ThisEvaluator), 1),
            "null" => (Box::new(LiteralEvaluator::null()), 1),
            name if frame.locals.contains_key(name) => {
                (Box::new(LocalVariableEvaluator::new(name)), 1)
            }
            name => match Self::longest_type_prefix(&segments, ctx)? {
                Some(len) => (Box::new(TypeEvaluator::new(segments[..len].join("/"))), len),
                None if frame.this_object.is_some() => (Box::new(ThisEvaluator), 0),
                None => match &frame.declaring_type {
                    Some(declaring) => (Box::new(TypeEvaluator::new(declaring.as_str())), 0),
                    None => return Err(EvaluationError::UnknownVariable(name.to_string())),
                },
            },
        };

        for segment in &segments[consumed..] {
            current = Box::new(FieldEvaluator::new(
                current,
                frame.declaring_type.clone(),
                *segment,
            ));
        }
        Ok(current)
    }

    fn longest_type_prefix(
        segments: &[&str],
        ctx: &EvaluationContext<'_>,
    ) -> Result<Option<usize>, EvaluationError> {
        for len in (1..=segments.len()).rev() {
            if ctx.process().class_by_name(&segments[..len].join("/"))?.is_some() {
                return Ok(Some(len));
            }
        }
        Ok(None)
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}
