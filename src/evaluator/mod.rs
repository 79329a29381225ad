// src/evaluator/mod.rs — Verdicts for executed sequences

pub mod contracts;
pub mod exceptions;
pub mod regression;

use std::panic::{self, AssertUnwindSafe};

use crate::core::executable::ExecutableSequence;
use crate::core::sandbox::panic_message;
use crate::core::types::{BehaviorType, Check, CheckResult, Verdict};
use crate::infra::config::Config;
use crate::infra::errors::{Result, SeqforgeError};
use contracts::ContractChecker;
use exceptions::{ExceptionClassifier, RaiseContext};

pub const NO_EXCEPTION: &str = "no-exception";

/// Combines exception classification, contract checks and oracle capture
/// into one verdict per executed sequence.
#[derive(Clone, Default)]
pub struct Evaluator {
    classifier: ExceptionClassifier,
    contracts: ContractChecker,
}

struct Judgement {
    behavior: Option<BehaviorType>,
    checks: Vec<Check>,
    verdict: Verdict,
}

impl Evaluator {
    pub fn new(classifier: ExceptionClassifier, contracts: ContractChecker) -> Self {
        Self {
            classifier,
            contracts,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ExceptionClassifier::from_config(&config.classification),
            ContractChecker::from_config(&config.contracts),
        )
    }

    pub fn classifier(&self) -> &ExceptionClassifier {
        &self.classifier
    }

    /// Classify `es`, replacing any earlier checks and verdict. A panic
    /// while judging is reported as `SeqforgeError::Classification` and
    /// leaves `es` without a verdict.
    pub fn evaluate(&self, es: &mut ExecutableSequence) -> Result<Verdict> {
        let judged = panic::catch_unwind(AssertUnwindSafe(|| self.judge(es)));
        match judged {
            Ok(j) => {
                es.exception_behavior = j.behavior;
                es.checks = j.checks;
                es.verdict = Some(j.verdict);
                Ok(j.verdict)
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                tracing::warn!(sequence = %es.id, "Classification panicked: {}", msg);
                es.checks.clear();
                es.verdict = None;
                es.exception_behavior = None;
                Err(SeqforgeError::Classification(msg))
            }
        }
    }

    fn judge(&self, es: &ExecutableSequence) -> Judgement {
        let mut checks = Vec::new();
        let behavior = es.terminal_exception().map(|(pos, e)| {
            let operation = es
                .sequence
                .statement(pos)
                .map(|s| s.operation.qualified_name())
                .unwrap_or_default();
            let ctx = RaiseContext {
                position: pos,
                operation: &operation,
                null_input: es.had_null_input(pos),
            };
            self.classifier.classify(e, &ctx)
        });

        match behavior {
            None => {
                checks.extend(self.contracts.check(es));
                checks.extend(regression::capture(es, None));
            }
            Some(BehaviorType::Error) => {
                if let Some((pos, e)) = es.terminal_exception() {
                    checks.push(Check::new(NO_EXCEPTION, vec![pos], CheckResult::Fail, e.to_string()));
                }
            }
            Some(BehaviorType::Expected) => {
                checks.extend(regression::capture(es, behavior));
            }
            Some(BehaviorType::Invalid) => {}
        }

        let verdict = if checks.iter().any(Check::is_fail) || behavior == Some(BehaviorType::Error) {
            Verdict::Error
        } else if behavior == Some(BehaviorType::Invalid) {
            Verdict::Invalid
        } else {
            Verdict::Regression
        };

        Judgement {
            behavior,
            checks,
            verdict,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executable::NoHooks;
    use crate::core::operation::Operation;
    use crate::core::sandbox::Sandbox;
    use crate::core::sequence::Sequence;
    use crate::core::types::{Exception, ObjectRef, Type, Value};
    use contracts::Contract;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Obj;

    impl crate::core::types::TargetObject for Obj {
        fn type_name(&self) -> &str {
            "Obj"
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn thing() -> Type {
        Type::class("Thing")
    }

    fn run_method(f: impl Fn(&[Value]) -> std::result::Result<Value, Exception> + Send + Sync + 'static) -> ExecutableSequence {
        let ctor = Arc::new(Operation::constructor(&thing(), vec![], |_| Ok(Value::object(Obj))));
        let m = Arc::new(Operation::method(&thing(), "m", vec![], Type::int(), f));
        let seq = Sequence::of(ctor).and_then(|s| s.extend(m, vec![0])).unwrap();
        let mut es = ExecutableSequence::new(seq);
        es.execute(&mut NoHooks, &mut Sandbox::inline());
        es
    }

    #[test]
    fn test_normal_is_regression() {
        let mut es = run_method(|_| Ok(Value::Int(3)));
        let v = Evaluator::default().evaluate(&mut es).unwrap();
        assert_eq!(v, Verdict::Regression);
        assert!(es.exception_behavior.is_none());
        assert_eq!(es.checks.len(), 1);
    }

    #[test]
    fn test_unchecked_is_error() {
        let mut es = run_method(|_| Err(Exception::unchecked("IllegalStateException", "bad")));
        let v = Evaluator::default().evaluate(&mut es).unwrap();
        assert_eq!(v, Verdict::Error);
        assert_eq!(es.exception_behavior, Some(BehaviorType::Error));
        assert_eq!(es.checks[0].contract, NO_EXCEPTION);
        assert!(es.has_failing_check());
    }

    #[test]
    fn test_expected_exception_is_regression() {
        let mut es = run_method(|_| Err(Exception::checked("IOException", "")));
        let v = Evaluator::default().evaluate(&mut es).unwrap();
        assert_eq!(v, Verdict::Regression);
        assert_eq!(es.exception_behavior, Some(BehaviorType::Expected));
        assert_eq!(es.checks.last().unwrap().contract, regression::EXPECTED_EXCEPTION);
    }

    #[test]
    fn test_timeout_is_invalid() {
        let mut es = run_method(|_| Err(Exception::timeout(std::time::Duration::from_millis(100))));
        let v = Evaluator::default().evaluate(&mut es).unwrap();
        assert_eq!(v, Verdict::Invalid);
        assert!(es.checks.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let mut es = run_method(|_| Ok(Value::Int(3)));
        let eval = Evaluator::default();
        let first = eval.evaluate(&mut es).unwrap();
        let checks = es.checks.clone();
        let second = eval.evaluate(&mut es).unwrap();
        assert_eq!(first, second);
        assert_eq!(checks, es.checks);
    }

    struct Exploding;

    impl Contract for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }
        fn arity(&self) -> usize {
            1
        }
        fn evaluate(&self, _objects: &[&ObjectRef]) -> std::result::Result<bool, Exception> {
            panic!("contract bug")
        }
    }

    #[test]
    fn test_panic_becomes_classification_error() {
        let ty = Type::class("Obj");
        let ctor = Arc::new(Operation::constructor(&ty, vec![], |_| Ok(Value::object(Obj))));
        let mut es = ExecutableSequence::new(Sequence::of(ctor).unwrap());
        es.execute(&mut NoHooks, &mut Sandbox::inline());

        let eval = Evaluator::new(
            ExceptionClassifier::default(),
            ContractChecker::new(vec![Arc::new(Exploding)], 10),
        );
        let err = eval.evaluate(&mut es).unwrap_err();
        assert!(matches!(err, SeqforgeError::Classification(ref m) if m == "contract bug"));
        assert!(es.verdict.is_none());
    }
}
