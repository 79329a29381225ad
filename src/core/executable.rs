// src/core/executable.rs — A sequence together with the results of running it

use std::time::{Duration, Instant};

use super::sandbox::Sandbox;
use super::sequence::{Sequence, Statement};
use super::types::{BehaviorType, Check, Exception, Value, Verdict};

/// What happened at one statement.
#[derive(Debug, Clone)]
pub enum Outcome {
    Normal(Value),
    Raised(Exception),
    NotExecuted,
}

impl Outcome {
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Normal(v) => Some(v),
            _ => None,
        }
    }

    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Outcome::Raised(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Outcome::Normal(_))
    }
}

/// Observer called around every statement. Must not change outcomes.
pub trait ExecutionHooks {
    fn before(&mut self, _position: usize, _statement: &Statement) {}
    fn after(&mut self, _position: usize, _outcome: &Outcome) {}
}

/// Hooks that do nothing.
pub struct NoHooks;

impl ExecutionHooks for NoHooks {}

#[derive(Debug, Clone)]
pub struct ExecutableSequence {
    pub id: String,
    pub sequence: Sequence,
    pub outcomes: Vec<Outcome>,
    pub checks: Vec<Check>,
    pub verdict: Option<Verdict>,
    /// Classification of the terminal exception, if one was raised.
    pub exception_behavior: Option<BehaviorType>,
    pub duration: Duration,
}

impl ExecutableSequence {
    pub fn new(sequence: Sequence) -> Self {
        let n = sequence.len();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sequence,
            outcomes: vec![Outcome::NotExecuted; n],
            checks: Vec::new(),
            verdict: None,
            exception_behavior: None,
            duration: Duration::ZERO,
        }
    }

    /// Run every statement in order. Stops at the first raised exception;
    /// later statements stay `NotExecuted`. Re-running discards prior results.
    pub fn execute(&mut self, hooks: &mut dyn ExecutionHooks, sandbox: &mut Sandbox) {
        let started = Instant::now();
        self.outcomes = vec![Outcome::NotExecuted; self.sequence.len()];
        self.checks.clear();
        self.verdict = None;
        self.exception_behavior = None;

        for (i, stmt) in self.sequence.statements().iter().enumerate() {
            hooks.before(i, stmt);

            let inputs: Option<Vec<Value>> = stmt
                .inputs
                .iter()
                .map(|&p| self.outcomes.get(p).and_then(Outcome::value).cloned())
                .collect();
            let Some(inputs) = inputs else {
                tracing::error!(position = i, "Input of statement was not produced; stopping");
                break;
            };

            let outcome = if stmt.operation.is_literal() {
                match stmt.operation.invoke(&inputs) {
                    Ok(v) => Outcome::Normal(v),
                    Err(e) => Outcome::Raised(e),
                }
            } else {
                match sandbox.run(&stmt.operation, inputs) {
                    Ok(v) => Outcome::Normal(v),
                    Err(e) => Outcome::Raised(e),
                }
            };
            let raised = !outcome.is_normal();
            hooks.after(i, &outcome);
            self.outcomes[i] = outcome;
            if raised {
                break;
            }
        }
        self.duration = started.elapsed();
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn is_executed(&self) -> bool {
        self.outcomes.iter().any(|o| !matches!(o, Outcome::NotExecuted)) || self.is_empty()
    }

    /// Every statement ran and none raised.
    pub fn is_normal_execution(&self) -> bool {
        self.outcomes.iter().all(Outcome::is_normal)
    }

    /// The position and exception of the statement that stopped execution.
    pub fn terminal_exception(&self) -> Option<(usize, &Exception)> {
        self.outcomes
            .iter()
            .enumerate()
            .find_map(|(i, o)| o.exception().map(|e| (i, e)))
    }

    pub fn value(&self, position: usize) -> Option<&Value> {
        self.outcomes.get(position).and_then(Outcome::value)
    }

    /// The values the statement at `position` was called with.
    pub fn input_values(&self, position: usize) -> Vec<&Value> {
        self.sequence
            .statement(position)
            .map(|s| s.inputs.iter().filter_map(|&p| self.value(p)).collect())
            .unwrap_or_default()
    }

    /// Was `null` passed explicitly to the statement at `position`?
    pub fn had_null_input(&self, position: usize) -> bool {
        self.input_values(position).iter().any(|v| v.is_null())
    }

    /// Value of the last statement, if it ran normally and is not void.
    pub fn last_value(&self) -> Option<&Value> {
        self.outcomes
            .last()
            .and_then(Outcome::value)
            .filter(|v| !v.is_unit())
    }

    pub fn has_failing_check(&self) -> bool {
        self.checks.iter().any(Check::is_fail)
    }

    pub fn is_error(&self) -> bool {
        self.verdict == Some(Verdict::Error)
    }

    pub fn is_regression(&self) -> bool {
        self.verdict == Some(Verdict::Regression)
    }
}
