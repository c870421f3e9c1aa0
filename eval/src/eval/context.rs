use crate::config::EvalConfig;
use crate::keys::ObjectId;
use crate::remote::RemoteProcess;
use crate::value::Value;
use std::collections::HashMap;

/// The suspended frame an expression is evaluated in.
#[derive(Debug, Clone, Default)]
pub struct StackFrame {
    /// `None` in static methods.
    pub this_object: Option<ObjectId>,
    /// Fully-qualified name of the type whose code is executing.
    pub declaring_type: Option<String>,
    pub locals: HashMap<String, Value>,
}

/// Everything an evaluator may touch, passed down the tree explicitly.
pub struct EvaluationContext<'a> {
    process: &'a dyn RemoteProcess,
    frame: &'a StackFrame,
    config: EvalConfig,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(process: &'a dyn RemoteProcess, frame: &'a StackFrame) -> Self {
        Self {
            process,
            frame,
            config: EvalConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    pub fn process(&self) -> &'a dyn RemoteProcess {
        self.process
    }

    pub fn frame(&self) -> &'a StackFrame {
        self.frame
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }
}
