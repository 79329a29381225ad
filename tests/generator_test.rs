// tests/generator_test.rs — Integration test: end-to-end exploration scenarios

use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use seqforge::core::budget::{Budget, StopReason};
use seqforge::core::generator::{GenerationEvent, GenerationResult, Generator};
use seqforge::core::operation::Operation;
use seqforge::core::pool::ComponentPool;
use seqforge::core::sequence::Sequence;
use seqforge::core::types::{Exception, TargetObject, Type, Value, Verdict};
use seqforge::infra::config::Config;
use seqforge::targets;

#[derive(Debug)]
struct Thing;

impl TargetObject for Thing {
    fn type_name(&self) -> &str {
        "Thing"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Never equal to anything, itself included.
#[derive(Debug)]
struct Stranger;

impl TargetObject for Stranger {
    fn type_name(&self) -> &str {
        "Stranger"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, _other: &Value) -> Result<bool, Exception> {
        Ok(false)
    }
}

fn quick_config(seed: u64, input_limit: u64) -> Config {
    let mut config = Config::default();
    config.generation.seed = seed;
    config.generation.time_limit_secs = 60;
    config.generation.input_limit = Some(input_limit);
    config.sandbox.statement_timeout_ms = None;
    config
}

fn all_pooled(pool: &ComponentPool) -> Vec<Sequence> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for ty in pool.types() {
        for seq in pool.sequences_for(ty) {
            if seen.insert(seq.clone()) {
                out.push(seq.clone());
            }
        }
    }
    out
}

fn mentions(seq: &Sequence, qualified: &str) -> bool {
    seq.statements()
        .iter()
        .any(|s| s.operation.qualified_name() == qualified)
}

fn assert_well_formed(result: &GenerationResult) {
    for es in result.regression.iter().chain(&result.errors) {
        assert!(es.sequence.check_rep().is_ok(), "{:?}", es.sequence);
    }
}

// ─── Scenario A: constructor then void method ───────────────────

#[test]
fn test_constructor_then_void_method_is_regression() {
    let thing = Type::class("Thing");
    let ops = vec![
        Arc::new(Operation::constructor(&thing, vec![], |_| Ok(Value::object(Thing)))),
        Arc::new(Operation::method(&thing, "touch", vec![], Type::Void, |_| Ok(Value::Unit))),
    ];
    let mut generator = Generator::new(ops, &quick_config(7, 200));
    let result = generator.explore();

    assert_well_formed(&result);
    let code: Vec<Vec<String>> = result.regression.iter().map(|es| es.sequence.to_code()).collect();
    assert!(
        code.contains(&vec!["let v0 = Thing::new();".to_string(), "v0.touch();".to_string()]),
        "{:?}",
        code
    );
    assert!(result.errors.is_empty());
    assert!(result
        .regression
        .iter()
        .all(|es| es.verdict == Some(Verdict::Regression)));
}

// ─── Scenario B: NPE caused by a null argument ──────────────────

fn strlen() -> Arc<Operation> {
    Arc::new(Operation::static_method(&Type::class("Text"), "len", vec![Type::Str], Type::int(), |v| {
        match v.first() {
            Some(Value::Str(s)) => Ok(Value::Int(s.len() as i64)),
            _ => Err(Exception::null_pointer("s is null")),
        }
    }))
}

#[test]
fn test_npe_on_null_argument_is_expected_and_dropped() {
    let mut config = quick_config(3, 30);
    config.generation.null_ratio = 1.0;
    let mut generator = Generator::new(vec![strlen()], &config);
    let before = generator.pool().len();
    let result = generator.explore();

    assert!(result.stats.regression > 0);
    assert!(result.regression.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(generator.pool().len(), before);
    assert!(all_pooled(generator.pool()).iter().all(|s| !mentions(s, "Text::len")));
}

#[test]
fn test_npe_on_non_null_argument_is_error() {
    let op = Arc::new(Operation::static_method(&Type::class("Text"), "first", vec![Type::Str], Type::char(), |v| {
        v.first()
            .and_then(Value::as_str)
            .and_then(|s| s.chars().next())
            .map(Value::Char)
            .ok_or_else(|| Exception::null_pointer("no first char"))
    }));
    let mut config = quick_config(5, 50);
    config.generation.null_ratio = 0.0;
    let result = Generator::new(vec![op], &config).explore();

    // The empty string seed makes `first` raise with a non-null input.
    assert!(!result.errors.is_empty());
    assert!(result.errors.iter().all(|es| es.verdict == Some(Verdict::Error)));
    assert_well_formed(&result);
}

// ─── Scenario C: equals is not reflexive ────────────────────────

#[test]
fn test_non_reflexive_equals_is_reported_as_error() {
    let stranger = Type::class("Stranger");
    let ops = vec![Arc::new(Operation::constructor(&stranger, vec![], |_| {
        Ok(Value::object(Stranger))
    }))];
    let result = Generator::new(ops, &quick_config(1, 20)).explore();

    assert_eq!(result.errors.len(), 1);
    let es = &result.errors[0];
    assert_eq!(es.verdict, Some(Verdict::Error));
    assert!(es
        .checks
        .iter()
        .any(|c| c.contract == "equals-reflexive" && c.is_fail()));
    // Error sequences are never extended, so nothing else can be built.
    assert_eq!(result.stop_reason, StopReason::NoSatisfiableOperation);
}

#[test]
fn test_faulty_target_surfaces_broken_equals() {
    let ops = targets::find("faulty").unwrap().operations();
    let mut config = quick_config(11, 400);
    config.sandbox.statement_timeout_ms = Some(100);
    let result = Generator::new(ops, &config).explore();

    assert_well_formed(&result);
    assert!(result.errors.iter().any(|es| es
        .checks
        .iter()
        .any(|c| c.contract == "equals-reflexive" && c.is_fail())));
}

// ─── Scenario D: a statement that never returns ─────────────────

fn hang() -> Arc<Operation> {
    Arc::new(Operation::static_method(&Type::class("Loop"), "spin", vec![Type::int()], Type::int(), |_| {
        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(2) {
            std::thread::sleep(Duration::from_millis(5));
        }
        Ok(Value::Int(0))
    }))
}

fn inc() -> Arc<Operation> {
    Arc::new(Operation::static_method(&Type::class("Math"), "inc", vec![Type::int()], Type::int(), |v| {
        Ok(Value::Int(v[0].as_int().unwrap_or(0).wrapping_add(1)))
    }))
}

#[test]
fn test_hanging_statement_is_discarded_and_loop_continues() {
    let mut config = quick_config(9, 40);
    config.sandbox.statement_timeout_ms = Some(100);
    let mut generator = Generator::new(vec![hang(), inc()], &config);
    let result = generator.explore();

    assert_eq!(result.stop_reason, StopReason::InputLimit);
    assert!(result.stats.timeouts >= 1);
    assert!(result.stats.invalid >= result.stats.timeouts);
    assert!(result.regression.iter().all(|es| !mentions(&es.sequence, "Loop::spin")));
    assert!(result.errors.is_empty());
    assert!(all_pooled(generator.pool()).iter().all(|s| !mentions(s, "Loop::spin")));
    // The well-behaved operation kept producing tests.
    assert!(result.regression.iter().any(|es| mentions(&es.sequence, "Math::inc")));
}

// ─── Determinism and pool growth ────────────────────────────────

fn traced_run(seed: u64) -> (Vec<GenerationEvent>, Vec<Vec<String>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let ops = targets::find("collections").unwrap().operations();
    let result = Generator::new(ops, &quick_config(seed, 150))
        .with_progress(move |e| sink.lock().unwrap().push(e))
        .explore();
    let code = result.regression.iter().map(|es| es.sequence.to_code()).collect();
    let events = events.lock().unwrap().clone();
    (events, code)
}

#[test]
fn test_same_seed_same_run() {
    let (events_a, code_a) = traced_run(42);
    let (events_b, code_b) = traced_run(42);
    assert_eq!(events_a, events_b);
    assert_eq!(code_a, code_b);
    assert!(matches!(events_a.first(), Some(GenerationEvent::ExplorationStart { seed: 42, .. })));
    assert!(matches!(events_a.last(), Some(GenerationEvent::Complete { .. })));
}

#[test]
fn test_different_seeds_diverge() {
    let (events_a, _) = traced_run(1);
    let (events_b, _) = traced_run(2);
    assert_ne!(events_a, events_b);
}

#[test]
fn test_pool_only_grows_across_runs() {
    let ops = targets::find("collections").unwrap().operations();
    let mut first = Generator::new(ops.clone(), &quick_config(4, 100));
    first.explore();
    let pool = first.into_pool();
    let earlier = all_pooled(&pool);
    assert!(earlier.iter().all(|s| s.check_rep().is_ok()));

    let mut second = Generator::new(ops, &quick_config(5, 100)).with_pool(pool);
    second.explore();
    let pool = second.into_pool();
    assert!(pool.len() >= earlier.len());
    for seq in &earlier {
        assert!(pool.contains(seq), "lost {:?}", seq);
    }
}

#[test]
fn test_pool_only_grows_within_a_run() {
    let ops = targets::find("collections").unwrap().operations();
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = sizes.clone();
    let mut generator = Generator::new(ops, &quick_config(6, 10_000))
        .with_budget(Budget::unlimited().with_input_limit(10_000))
        .with_stopper(move |stats| {
            sink.lock().unwrap().push(stats.pool_size);
            stats.steps >= 200
        });
    let result = generator.explore();

    assert_eq!(result.stop_reason, StopReason::Stopper);
    let sizes = sizes.lock().unwrap();
    assert_eq!(sizes.len(), 201);
    for pair in sizes.windows(2) {
        assert!(pair[0] <= pair[1], "pool shrank: {:?}", pair);
    }
    assert_eq!(sizes.last(), Some(&generator.pool().len()));
}

#[test]
fn test_output_limit_and_stopper() {
    let ops = targets::find("collections").unwrap().operations();
    let mut config = quick_config(8, 10_000);
    config.generation.output_limit = Some(5);
    let result = Generator::new(ops.clone(), &config).explore();
    assert_eq!(result.stop_reason, StopReason::OutputLimit);
    assert!(result.stats.surfaced() >= 5);

    let result = Generator::new(ops, &quick_config(8, 10_000))
        .with_budget(Budget::unlimited().with_input_limit(10_000))
        .with_stopper(|stats| stats.steps >= 25)
        .explore();
    assert_eq!(result.stop_reason, StopReason::Stopper);
    assert_eq!(result.stats.steps, 25);
}
