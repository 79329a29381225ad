// src/core/generator.rs — Feedback-directed generation loop

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::budget::{Budget, StopReason};
use super::executable::{ExecutableSequence, ExecutionHooks, NoHooks};
use super::operation::Operation;
use super::pool::ComponentPool;
use super::sandbox::{Sandbox, SandboxStats};
use super::sequence::Sequence;
use super::types::{ExceptionKind, LiteralKey, Type, Value, Verdict};
use crate::evaluator::Evaluator;
use crate::infra::config::{Config, GenerationConfig};

/// Progress events fired at loop boundaries. Observational only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GenerationEvent {
    ExplorationStart {
        operations: usize,
        pool_size: usize,
        seed: u64,
    },
    StepStart {
        step: u64,
    },
    CandidateBuilt {
        step: u64,
        operation: String,
        length: usize,
    },
    StepEnd {
        step: u64,
        outcome: StepOutcome,
    },
    Complete {
        stop_reason: StopReason,
        regression: usize,
        errors: usize,
        steps: u64,
    },
}

/// What one iteration of the loop did with its candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Some input slot could not be filled.
    SelectionFailed,
    ConstructionError,
    Oversized,
    Duplicate,
    ClassificationError,
    Regression { surfaced: bool, pooled: bool },
    Error { surfaced: bool },
    Invalid,
}

impl StepOutcome {
    fn is_productive(&self) -> bool {
        matches!(
            self,
            StepOutcome::Regression { pooled: true, .. } | StepOutcome::Error { surfaced: true }
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationStats {
    pub steps: u64,
    /// Candidate sequences built.
    pub generated: u64,
    pub duplicates: u64,
    pub selection_failures: u64,
    pub oversized: u64,
    pub construction_errors: u64,
    pub classification_errors: u64,
    /// Verdict counts.
    pub regression: u64,
    pub error: u64,
    pub invalid: u64,
    pub timeouts: u64,
    /// Tests handed back to the caller.
    pub regression_surfaced: usize,
    pub error_surfaced: usize,
    pub literals_harvested: u64,
    /// Full rescans of the operations against the pool.
    pub satisfiability_scans: u64,
    pub consecutive_unproductive: u64,
    pub pool_size: usize,
    pub sandbox: SandboxStats,
}

impl GenerationStats {
    pub fn surfaced(&self) -> usize {
        self.regression_surfaced + self.error_surfaced
    }
}

/// Everything an exploration produced. Budget exhaustion still yields a
/// complete (partial) result.
#[derive(Debug)]
pub struct GenerationResult {
    pub regression: Vec<ExecutableSequence>,
    pub errors: Vec<ExecutableSequence>,
    pub stats: GenerationStats,
    pub stop_reason: StopReason,
    pub duration: Duration,
}

/// Decides whether a normally-executed regression sequence is worth
/// pooling for reuse.
pub trait NoveltySignal {
    fn is_novel(&mut self, es: &ExecutableSequence) -> bool;
}

/// Pool sequences whose last value is a non-null object. Primitive and
/// string results are harvested as literals instead.
pub struct ObjectNovelty;

impl NoveltySignal for ObjectNovelty {
    fn is_novel(&mut self, es: &ExecutableSequence) -> bool {
        matches!(es.last_value(), Some(Value::Object(_)))
    }
}

/// Pool every sequence with a non-null, non-void last value.
pub struct AnyValue;

impl NoveltySignal for AnyValue {
    fn is_novel(&mut self, es: &ExecutableSequence) -> bool {
        es.last_value().map(|v| !v.is_null()).unwrap_or(false)
    }
}

type ProgressFn = Box<dyn Fn(GenerationEvent) + Send>;
type OutputPredicate = Box<dyn Fn(&ExecutableSequence) -> bool + Send>;
type Stopper = Box<dyn FnMut(&GenerationStats) -> bool + Send>;

/// The generate, execute, classify, feed back loop.
pub struct Generator {
    operations: Vec<Arc<Operation>>,
    pool: ComponentPool,
    evaluator: Evaluator,
    budget: Budget,
    settings: GenerationConfig,
    rng: StdRng,
    seen: HashSet<Sequence>,
    seen_literals: HashSet<LiteralKey>,
    stats: GenerationStats,
    /// Some operation was satisfiable at the last scan. The pool only grows,
    /// so this stays true until the pool is replaced or operations are dropped.
    known_satisfiable: bool,
    hooks: Box<dyn ExecutionHooks + Send>,
    novelty: Box<dyn NoveltySignal + Send>,
    on_progress: Option<ProgressFn>,
    output_predicate: Option<OutputPredicate>,
    stopper: Option<Stopper>,
}

impl Generator {
    /// A generator over `operations`, configured from `config`. The pool
    /// starts with the default literal seeds.
    pub fn new(operations: Vec<Arc<Operation>>, config: &Config) -> Self {
        let settings = config.generation.clone();
        Self {
            operations,
            pool: ComponentPool::with_default_seeds(settings.selection),
            evaluator: Evaluator::from_config(config),
            budget: Budget::from_config(&config.generation, &config.sandbox),
            rng: StdRng::seed_from_u64(settings.seed),
            settings,
            seen: HashSet::new(),
            seen_literals: HashSet::new(),
            stats: GenerationStats::default(),
            known_satisfiable: false,
            hooks: Box::new(NoHooks),
            novelty: Box::new(ObjectNovelty),
            on_progress: None,
            output_predicate: None,
            stopper: None,
        }
    }

    /// Replace the pool, including its seeds.
    pub fn with_pool(mut self, pool: ComponentPool) -> Self {
        self.pool = pool;
        self.known_satisfiable = false;
        self
    }

    /// Add seed sequences to the current pool.
    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = Sequence>) -> Self {
        self.pool.seed(seeds);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_hooks(mut self, hooks: impl ExecutionHooks + Send + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn with_novelty(mut self, novelty: impl NoveltySignal + Send + 'static) -> Self {
        self.novelty = Box::new(novelty);
        self
    }

    /// Set a callback for loop-boundary progress events.
    pub fn with_progress(mut self, cb: impl Fn(GenerationEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    /// Only sequences accepted by `predicate` are surfaced as tests.
    /// Pooling is unaffected.
    pub fn with_output_predicate(
        mut self,
        predicate: impl Fn(&ExecutableSequence) -> bool + Send + 'static,
    ) -> Self {
        self.output_predicate = Some(Box::new(predicate));
        self
    }

    /// Stop as soon as `stopper` returns true. Checked before every step.
    pub fn with_stopper(mut self, stopper: impl FnMut(&GenerationStats) -> bool + Send + 'static) -> Self {
        self.stopper = Some(Box::new(stopper));
        self
    }

    pub fn pool(&self) -> &ComponentPool {
        &self.pool
    }

    pub fn into_pool(self) -> ComponentPool {
        self.pool
    }

    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    fn emit(&self, event: GenerationEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    fn null_allowed(&self) -> bool {
        !self.settings.forbid_null || self.settings.null_ratio > 0.0
    }

    fn any_satisfiable(&mut self) -> bool {
        if self.known_satisfiable {
            return true;
        }
        self.stats.satisfiability_scans += 1;
        let allow_null = self.null_allowed();
        self.known_satisfiable = self
            .operations
            .iter()
            .any(|op| self.pool.can_satisfy(op, allow_null));
        self.known_satisfiable
    }

    /// Run the loop until a stop condition holds.
    pub fn explore(&mut self) -> GenerationResult {
        let start = Instant::now();
        let mut sandbox = Sandbox::new(self.budget.statement_timeout);
        let mut regression = Vec::new();
        let mut errors = Vec::new();

        self.emit(GenerationEvent::ExplorationStart {
            operations: self.operations.len(),
            pool_size: self.pool.len(),
            seed: self.settings.seed,
        });
        tracing::info!(
            operations = self.operations.len(),
            pool = self.pool.len(),
            seed = self.settings.seed,
            "Exploration started",
        );

        self.stats.pool_size = self.pool.len();
        let stop_reason = loop {
            if let Some(reason) = self.budget.check(&self.stats, start.elapsed()) {
                break reason;
            }
            if let Some(ref mut stopper) = self.stopper {
                if stopper(&self.stats) {
                    break StopReason::Stopper;
                }
            }
            if !self.any_satisfiable() {
                break StopReason::NoSatisfiableOperation;
            }

            self.stats.steps += 1;
            let step = self.stats.steps;
            self.emit(GenerationEvent::StepStart { step });

            let outcome = self.step(step, &mut sandbox, &mut regression, &mut errors);
            self.stats.pool_size = self.pool.len();
            if outcome.is_productive() {
                self.stats.consecutive_unproductive = 0;
            } else {
                self.stats.consecutive_unproductive += 1;
            }
            tracing::debug!(step, outcome = ?outcome, "Step finished");
            self.emit(GenerationEvent::StepEnd { step, outcome });
        };

        self.stats.sandbox = sandbox.stats().clone();

        self.emit(GenerationEvent::Complete {
            stop_reason,
            regression: regression.len(),
            errors: errors.len(),
            steps: self.stats.steps,
        });
        tracing::info!(
            reason = %stop_reason,
            steps = self.stats.steps,
            regression = regression.len(),
            errors = errors.len(),
            pool = self.stats.pool_size,
            "Exploration finished",
        );

        GenerationResult {
            regression,
            errors,
            stats: self.stats.clone(),
            stop_reason,
            duration: start.elapsed(),
        }
    }

    fn select_inputs(&mut self, op: &Operation) -> Option<Vec<Sequence>> {
        let null_ratio = self.settings.null_ratio.clamp(0.0, 1.0);
        let mut inputs = Vec::with_capacity(op.arity());
        for (slot, ty) in op.input_types().iter().enumerate() {
            let receiver = slot == 0 && op.has_receiver();
            let nullable = !receiver && ty.is_reference();

            if nullable && null_ratio > 0.0 && self.rng.gen_bool(null_ratio) {
                inputs.push(null_sequence(ty)?);
                continue;
            }
            match self.pool.sample(ty, receiver, &mut self.rng) {
                Some(seq) => inputs.push(seq),
                None if nullable && !self.settings.forbid_null => inputs.push(null_sequence(ty)?),
                None => return None,
            }
        }
        Some(inputs)
    }

    fn step(
        &mut self,
        step: u64,
        sandbox: &mut Sandbox,
        regression: &mut Vec<ExecutableSequence>,
        errors: &mut Vec<ExecutableSequence>,
    ) -> StepOutcome {
        let index = self.rng.gen_range(0..self.operations.len());
        let op = self.operations[index].clone();

        let Some(inputs) = self.select_inputs(&op) else {
            self.stats.selection_failures += 1;
            return StepOutcome::SelectionFailed;
        };

        if self.settings.drop_nullary_after_use && op.arity() == 0 {
            self.operations.remove(index);
            self.known_satisfiable = false;
        }

        let seq = match Sequence::extend_with(op.clone(), &inputs) {
            Ok(seq) => seq,
            Err(e) => {
                tracing::error!(operation = %op, "Built a malformed sequence: {}", e);
                self.stats.construction_errors += 1;
                return StepOutcome::ConstructionError;
            }
        };
        debug_assert!(seq.check_rep().is_ok(), "candidate violates sequence invariants");
        self.stats.generated += 1;
        self.emit(GenerationEvent::CandidateBuilt {
            step,
            operation: op.qualified_name(),
            length: seq.len(),
        });

        if seq.len() > self.settings.max_sequence_size {
            self.stats.oversized += 1;
            return StepOutcome::Oversized;
        }
        if !self.seen.insert(seq.clone()) {
            self.stats.duplicates += 1;
            return StepOutcome::Duplicate;
        }

        let mut es = ExecutableSequence::new(seq);
        es.execute(self.hooks.as_mut(), sandbox);
        if let Some((_, e)) = es.terminal_exception() {
            if e.kind == ExceptionKind::Timeout {
                self.stats.timeouts += 1;
            }
        }

        let verdict = match self.evaluator.evaluate(&mut es) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(sequence = %es.id, "Discarding sequence: {}", e);
                self.stats.classification_errors += 1;
                return StepOutcome::ClassificationError;
            }
        };

        match verdict {
            Verdict::Regression => {
                self.stats.regression += 1;
                let normal = es.is_normal_execution();
                if normal && self.settings.harvest_literals {
                    self.harvest_literals(&es);
                }
                let pooled = normal && self.novelty.is_novel(&es) && self.pool.add(es.sequence.clone());
                let surfaced = (normal || self.settings.include_expected_exceptions) && self.accepts(&es);
                if surfaced {
                    self.stats.regression_surfaced += 1;
                    regression.push(es);
                }
                StepOutcome::Regression { surfaced, pooled }
            }
            Verdict::Error => {
                self.stats.error += 1;
                let surfaced = self.accepts(&es);
                if surfaced {
                    tracing::debug!(sequence = %es.id, "Error-revealing sequence found");
                    self.stats.error_surfaced += 1;
                    errors.push(es);
                }
                StepOutcome::Error { surfaced }
            }
            Verdict::Invalid => {
                self.stats.invalid += 1;
                StepOutcome::Invalid
            }
        }
    }

    fn accepts(&self, es: &ExecutableSequence) -> bool {
        self.output_predicate.as_ref().map(|p| p(es)).unwrap_or(true)
    }

    /// Feed primitive and string values seen at runtime back as literal seeds.
    /// Overlong strings and strings that look like default object displays
    /// are left out.
    fn harvest_literals(&mut self, es: &ExecutableSequence) {
        for (i, stmt) in es.sequence.statements().iter().enumerate() {
            if stmt.operation.is_literal() {
                continue;
            }
            let Some(value) = es.value(i) else { continue };
            let Some(ty) = literal_type(value) else { continue };
            if let Value::Str(text) = value {
                if text.chars().count() > self.settings.max_string_length || looks_like_object_display(text) {
                    continue;
                }
            }
            let Some(key) = value.literal_key() else { continue };
            if !self.seen_literals.insert(key) {
                continue;
            }
            if let Ok(seq) = Sequence::of(Arc::new(Operation::literal(ty, value.clone()))) {
                if self.pool.add(seq) {
                    self.stats.literals_harvested += 1;
                }
            }
        }
    }
}

fn null_sequence(ty: &Type) -> Option<Sequence> {
    Sequence::of(Arc::new(Operation::null_of(ty.clone()))).ok()
}

/// `Name@1f3a`: the shape of an identity-based display, which differs
/// from run to run.
fn looks_like_object_display(text: &str) -> bool {
    let Some((name, addr)) = text.rsplit_once('@') else {
        return false;
    };
    !name.is_empty()
        && !addr.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '$'))
        && addr.chars().all(|c| c.is_ascii_hexdigit())
}

fn literal_type(value: &Value) -> Option<Type> {
    match value {
        Value::Bool(_) => Some(Type::bool()),
        Value::Int(_) => Some(Type::int()),
        Value::Float(_) => Some(Type::float()),
        Value::Char(_) => Some(Type::char()),
        Value::Str(_) => Some(Type::Str),
        _ => None,
    }
}
