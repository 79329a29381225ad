// src/evaluator/regression.rs — Capture observed behavior as regression oracles

use crate::core::executable::ExecutableSequence;
use crate::core::types::{BehaviorType, Check, CheckResult, Value};

pub const VALUE_EQUALS: &str = "value-equals";
pub const IS_NULL: &str = "is-null";
pub const IS_NOT_NULL: &str = "is-not-null";
pub const EXPECTED_EXCEPTION: &str = "expected-exception";

/// Record what each statement produced so a later run can be compared
/// against it. Literal statements and void results are skipped, and so are
/// objects returned by constructors (their non-nullness is implied).
pub fn capture(es: &ExecutableSequence, behavior: Option<BehaviorType>) -> Vec<Check> {
    let mut checks = Vec::new();
    for (i, stmt) in es.sequence.statements().iter().enumerate() {
        if stmt.operation.is_literal() {
            continue;
        }
        let Some(value) = es.value(i) else { continue };
        let check = match value {
            Value::Unit => continue,
            Value::Null => Check::new(IS_NULL, vec![i], CheckResult::Pass, ""),
            Value::Object(o) => {
                if stmt.operation.is_constructor() {
                    continue;
                }
                Check::new(IS_NOT_NULL, vec![i], CheckResult::Pass, o.type_name())
            }
            other => match other.literal_code() {
                Some(code) => Check::new(VALUE_EQUALS, vec![i], CheckResult::Pass, code),
                None => continue,
            },
        };
        checks.push(check);
    }

    if behavior == Some(BehaviorType::Expected) {
        if let Some((pos, e)) = es.terminal_exception() {
            checks.push(Check::new(
                EXPECTED_EXCEPTION,
                vec![pos],
                CheckResult::Pass,
                e.type_name.clone(),
            ));
        }
    }
    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::executable::NoHooks;
    use crate::core::operation::Operation;
    use crate::core::sandbox::Sandbox;
    use crate::core::sequence::Sequence;
    use crate::core::types::{Exception, TargetObject, Type};
    use std::any::Any;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Cell;

    impl TargetObject for Cell {
        fn type_name(&self) -> &str {
            "Cell"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn cell() -> Type {
        Type::class("Cell")
    }

    fn run(seq: Sequence) -> ExecutableSequence {
        let mut es = ExecutableSequence::new(seq);
        es.execute(&mut NoHooks, &mut Sandbox::inline());
        es
    }

    #[test]
    fn test_captures_values_nulls_and_objects() {
        let ctor = Arc::new(Operation::constructor(&cell(), vec![], |_| Ok(Value::object(Cell))));
        let size = Arc::new(Operation::method(&cell(), "size", vec![], Type::int(), |_| Ok(Value::Int(0))));
        let peek = Arc::new(Operation::method(&cell(), "peek", vec![], Type::Object, |_| Ok(Value::Null)));
        let me = Arc::new(Operation::method(&cell(), "me", vec![], cell(), |v| Ok(v[0].clone())));
        let clear = Arc::new(Operation::method(&cell(), "clear", vec![], Type::Void, |_| Ok(Value::Unit)));

        let seq = Sequence::of(ctor)
            .and_then(|s| s.extend(size, vec![0]))
            .and_then(|s| s.extend(peek, vec![0]))
            .and_then(|s| s.extend(me, vec![0]))
            .and_then(|s| s.extend(clear, vec![0]))
            .unwrap();
        let checks = capture(&run(seq), None);
        let summary: Vec<(&str, usize, &str)> = checks
            .iter()
            .map(|c| (c.contract.as_str(), c.position, c.detail.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(VALUE_EQUALS, 1, "0"), (IS_NULL, 2, ""), (IS_NOT_NULL, 3, "Cell")]
        );
        assert!(checks.iter().all(Check::is_pass));
    }

    #[test]
    fn test_expected_exception_check() {
        let ctor = Arc::new(Operation::constructor(&cell(), vec![], |_| Ok(Value::object(Cell))));
        let load = Arc::new(Operation::method(&cell(), "load", vec![], Type::Void, |_| {
            Err(Exception::checked("IOException", "missing"))
        }));
        let seq = Sequence::of(ctor).and_then(|s| s.extend(load, vec![0])).unwrap();
        let es = run(seq);

        let checks = capture(&es, Some(BehaviorType::Expected));
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].contract, EXPECTED_EXCEPTION);
        assert_eq!(checks[0].detail, "IOException");

        assert!(capture(&es, Some(BehaviorType::Error)).is_empty());
    }
}
