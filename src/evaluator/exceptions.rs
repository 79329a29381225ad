// src/evaluator/exceptions.rs — Exception → behavior classification

use std::fmt;
use std::sync::Arc;

use crate::core::types::{BehaviorType, Exception, ExceptionKind};
use crate::infra::config::ClassificationConfig;

/// Facts about the statement that raised.
#[derive(Debug, Clone, Copy)]
pub struct RaiseContext<'a> {
    pub position: usize,
    /// `Class::name` of the raising operation.
    pub operation: &'a str,
    /// A `null` value was passed explicitly to the raising statement.
    pub null_input: bool,
}

pub type CustomPredicate = Arc<dyn Fn(&Exception, &RaiseContext<'_>) -> bool + Send + Sync>;

/// Matches exceptions. Combine with `And`, `Or` and `Not`.
#[derive(Clone)]
pub enum ExceptionPredicate {
    Kind(ExceptionKind),
    TypeName(String),
    MessageContains(String),
    /// Raised by the named operation (`Class::name`).
    Operation(String),
    NullInput,
    And(Vec<ExceptionPredicate>),
    Or(Vec<ExceptionPredicate>),
    Not(Box<ExceptionPredicate>),
    Custom(CustomPredicate),
}

impl ExceptionPredicate {
    pub fn custom(f: impl Fn(&Exception, &RaiseContext<'_>) -> bool + Send + Sync + 'static) -> Self {
        ExceptionPredicate::Custom(Arc::new(f))
    }

    pub fn and(self, other: ExceptionPredicate) -> Self {
        ExceptionPredicate::And(vec![self, other])
    }

    pub fn or(self, other: ExceptionPredicate) -> Self {
        ExceptionPredicate::Or(vec![self, other])
    }

    pub fn negate(self) -> Self {
        ExceptionPredicate::Not(Box::new(self))
    }

    pub fn matches(&self, e: &Exception, ctx: &RaiseContext<'_>) -> bool {
        match self {
            ExceptionPredicate::Kind(k) => e.kind == *k,
            ExceptionPredicate::TypeName(name) => e.type_name == *name,
            ExceptionPredicate::MessageContains(s) => e.message.contains(s.as_str()),
            ExceptionPredicate::Operation(name) => ctx.operation == name,
            ExceptionPredicate::NullInput => ctx.null_input,
            ExceptionPredicate::And(ps) => ps.iter().all(|p| p.matches(e, ctx)),
            ExceptionPredicate::Or(ps) => ps.iter().any(|p| p.matches(e, ctx)),
            ExceptionPredicate::Not(p) => !p.matches(e, ctx),
            ExceptionPredicate::Custom(f) => f(e, ctx),
        }
    }
}

impl fmt::Debug for ExceptionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExceptionPredicate::Kind(k) => write!(f, "Kind({:?})", k),
            ExceptionPredicate::TypeName(n) => write!(f, "TypeName({:?})", n),
            ExceptionPredicate::MessageContains(s) => write!(f, "MessageContains({:?})", s),
            ExceptionPredicate::Operation(n) => write!(f, "Operation({:?})", n),
            ExceptionPredicate::NullInput => write!(f, "NullInput"),
            ExceptionPredicate::And(ps) => f.debug_tuple("And").field(ps).finish(),
            ExceptionPredicate::Or(ps) => f.debug_tuple("Or").field(ps).finish(),
            ExceptionPredicate::Not(p) => f.debug_tuple("Not").field(p).finish(),
            ExceptionPredicate::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// User rules first (first match wins), then the configured defaults.
#[derive(Debug, Clone, Default)]
pub struct ExceptionClassifier {
    rules: Vec<(ExceptionPredicate, BehaviorType)>,
    defaults: ClassificationConfig,
}

impl ExceptionClassifier {
    pub fn from_config(config: &ClassificationConfig) -> Self {
        Self {
            rules: Vec::new(),
            defaults: config.clone(),
        }
    }

    pub fn with_rule(mut self, predicate: ExceptionPredicate, behavior: BehaviorType) -> Self {
        self.rules.push((predicate, behavior));
        self
    }

    pub fn classify(&self, e: &Exception, ctx: &RaiseContext<'_>) -> BehaviorType {
        if let Some((_, behavior)) = self.rules.iter().find(|(p, _)| p.matches(e, ctx)) {
            return *behavior;
        }
        let d = &self.defaults;
        match e.kind {
            ExceptionKind::Error | ExceptionKind::StackOverflow => BehaviorType::Error,
            ExceptionKind::OutOfMemory => d.out_of_memory,
            ExceptionKind::Timeout => d.timeout,
            ExceptionKind::Checked => d.checked,
            ExceptionKind::NullPointer if ctx.null_input => d.npe_on_null_input,
            ExceptionKind::NullPointer => d.npe_on_non_null_input,
            ExceptionKind::Unchecked | ExceptionKind::Panic => d.unchecked,
        }
    }
}
