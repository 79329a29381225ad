// src/evaluator/contracts.rs — Object contracts checked on every executed sequence

use std::sync::Arc;

use crate::core::executable::ExecutableSequence;
use crate::core::sandbox::{catch_target, panic_message};
use crate::core::types::{Check, CheckResult, Exception, ExceptionKind, ObjectRef, Value};

pub const BUILTIN_CONTRACTS: &[&str] = &[
    "equals-reflexive",
    "equals-symmetric",
    "equals-hashcode",
    "equals-null",
    "tostring-no-crash",
    "hashcode-no-crash",
];

/// A property every object of the code under test should satisfy.
///
/// `evaluate` returns `Ok(true)` when the property holds and `Ok(false)`
/// when it is violated. An `Err` means the check itself could not be
/// carried out; it is reported as not applicable.
pub trait Contract: Send + Sync {
    fn name(&self) -> &str;

    /// 1 for unary contracts, 2 for binary ones.
    fn arity(&self) -> usize;

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception>;
}

/// Call into target code, converting a panic into an exception.
fn call_target<T>(f: impl FnOnce() -> Result<T, Exception>) -> Result<T, Exception> {
    match catch_target(f) {
        Ok(r) => r,
        Err(payload) => Err(Exception::panic(panic_message(payload.as_ref()))),
    }
}

/// For "must not crash" contracts: a raise is a violation unless it is a
/// resource failure.
fn returns_normally<T>(result: Result<T, Exception>) -> Result<bool, Exception> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind, ExceptionKind::Timeout | ExceptionKind::OutOfMemory) => Err(e),
        Err(_) => Ok(false),
    }
}

pub struct EqualsReflexive;

impl Contract for EqualsReflexive {
    fn name(&self) -> &str {
        "equals-reflexive"
    }

    fn arity(&self) -> usize {
        1
    }

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception> {
        let o = objects[0];
        call_target(|| o.equals(&Value::Object(o.clone())))
    }
}

pub struct EqualsSymmetric;

impl Contract for EqualsSymmetric {
    fn name(&self) -> &str {
        "equals-symmetric"
    }

    fn arity(&self) -> usize {
        2
    }

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception> {
        let (a, b) = (objects[0], objects[1]);
        let ab = call_target(|| a.equals(&Value::Object(b.clone())))?;
        let ba = call_target(|| b.equals(&Value::Object(a.clone())))?;
        Ok(ab == ba)
    }
}

pub struct EqualsHashCode;

impl Contract for EqualsHashCode {
    fn name(&self) -> &str {
        "equals-hashcode"
    }

    fn arity(&self) -> usize {
        2
    }

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception> {
        let (a, b) = (objects[0], objects[1]);
        if !call_target(|| a.equals(&Value::Object(b.clone())))? {
            return Ok(true);
        }
        Ok(call_target(|| a.hash_code())? == call_target(|| b.hash_code())?)
    }
}

pub struct EqualsNull;

impl Contract for EqualsNull {
    fn name(&self) -> &str {
        "equals-null"
    }

    fn arity(&self) -> usize {
        1
    }

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception> {
        let o = objects[0];
        call_target(|| o.equals(&Value::Null)).map(|eq| !eq)
    }
}

pub struct ToStringNoCrash;

impl Contract for ToStringNoCrash {
    fn name(&self) -> &str {
        "tostring-no-crash"
    }

    fn arity(&self) -> usize {
        1
    }

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception> {
        let o = objects[0];
        returns_normally(call_target(|| o.to_display()))
    }
}

pub struct HashCodeNoCrash;

impl Contract for HashCodeNoCrash {
    fn name(&self) -> &str {
        "hashcode-no-crash"
    }

    fn arity(&self) -> usize {
        1
    }

    fn evaluate(&self, objects: &[&ObjectRef]) -> Result<bool, Exception> {
        let o = objects[0];
        returns_normally(call_target(|| o.hash_code()))
    }
}

pub fn builtin(name: &str) -> Option<Arc<dyn Contract>> {
    let c: Arc<dyn Contract> = match name {
        "equals-reflexive" => Arc::new(EqualsReflexive),
        "equals-symmetric" => Arc::new(EqualsSymmetric),
        "equals-hashcode" => Arc::new(EqualsHashCode),
        "equals-null" => Arc::new(EqualsNull),
        "tostring-no-crash" => Arc::new(ToStringNoCrash),
        "hashcode-no-crash" => Arc::new(HashCodeNoCrash),
        _ => return None,
    };
    Some(c)
}

pub fn default_contracts() -> Vec<Arc<dyn Contract>> {
    BUILTIN_CONTRACTS.iter().filter_map(|n| builtin(n)).collect()
}

/// Runs contracts over the object values of an executed sequence.
#[derive(Clone)]
pub struct ContractChecker {
    contracts: Vec<Arc<dyn Contract>>,
    max_binary_pairs: usize,
}

impl Default for ContractChecker {
    fn default() -> Self {
        Self::new(default_contracts(), 100)
    }
}

impl ContractChecker {
    pub fn new(contracts: Vec<Arc<dyn Contract>>, max_binary_pairs: usize) -> Self {
        Self {
            contracts,
            max_binary_pairs,
        }
    }

    pub fn from_config(config: &crate::infra::config::ContractsConfig) -> Self {
        let contracts = config.enabled.iter().filter_map(|n| builtin(n)).collect();
        Self::new(contracts, config.max_binary_pairs)
    }

    pub fn with_contract(mut self, contract: Arc<dyn Contract>) -> Self {
        self.contracts.push(contract);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.contracts.iter().map(|c| c.name()).collect()
    }

    /// Check every contract. Returns the checks that did not pass.
    ///
    /// A contract stops at its first failure. Targets on which it could not
    /// be evaluated are skipped, and the first of them is reported only when
    /// no other target fails it.
    pub fn check(&self, es: &ExecutableSequence) -> Vec<Check> {
        let mut checks = Vec::new();
        let unary_targets = last_statement_objects(es);
        let all_objects = distinct_objects(es);

        for contract in &self.contracts {
            let mut scan = Scan::default();
            match contract.arity() {
                1 => {
                    for (pos, obj) in &unary_targets {
                        if scan.record(run_one(contract.as_ref(), &[*pos], &[obj])) {
                            break;
                        }
                    }
                }
                2 => {
                    let mut pairs = 0;
                    'pairs: for (i, (pa, a)) in all_objects.iter().enumerate() {
                        for (j, (pb, b)) in all_objects.iter().enumerate() {
                            if i == j {
                                continue;
                            }
                            if pairs >= self.max_binary_pairs {
                                break 'pairs;
                            }
                            pairs += 1;
                            if scan.record(run_one(contract.as_ref(), &[*pa, *pb], &[a, b])) {
                                break 'pairs;
                            }
                        }
                    }
                }
                n => tracing::debug!(contract = contract.name(), arity = n, "Unsupported contract arity"),
            }
            checks.extend(scan.finish());
        }
        checks
    }
}

/// Outcome of one contract over its targets.
#[derive(Default)]
struct Scan {
    failed: Option<Check>,
    not_applicable: Option<Check>,
}

impl Scan {
    /// Returns true once the contract has failed.
    fn record(&mut self, check: Option<Check>) -> bool {
        match check {
            Some(c) if c.is_fail() => {
                self.failed = Some(c);
                true
            }
            Some(c) => {
                if self.not_applicable.is_none() {
                    self.not_applicable = Some(c);
                }
                false
            }
            None => false,
        }
    }

    fn finish(self) -> Option<Check> {
        self.failed.or(self.not_applicable)
    }
}

/// `None` when the contract holds.
fn run_one(contract: &dyn Contract, positions: &[usize], objects: &[&ObjectRef]) -> Option<Check> {
    match contract.evaluate(objects) {
        Ok(true) => None,
        Ok(false) => Some(Check::new(
            contract.name(),
            positions.to_vec(),
            CheckResult::Fail,
            format!("{} violated", contract.name()),
        )),
        Err(e) => {
            tracing::debug!(contract = contract.name(), exception = %e, "Contract not applicable");
            Some(Check::new(
                contract.name(),
                positions.to_vec(),
                CheckResult::NotApplicable,
                e.to_string(),
            ))
        }
    }
}

/// Object values produced or consumed by the last statement, deduplicated by identity.
fn last_statement_objects(es: &ExecutableSequence) -> Vec<(usize, ObjectRef)> {
    let Some(last) = es.sequence.len().checked_sub(1) else {
        return Vec::new();
    };
    let Some(stmt) = es.sequence.statement(last) else {
        return Vec::new();
    };
    let mut out: Vec<(usize, ObjectRef)> = Vec::new();
    let positions = std::iter::once(last).chain(stmt.inputs.iter().copied());
    for p in positions {
        if let Some(Value::Object(o)) = es.value(p) {
            if !out.iter().any(|(_, seen)| Arc::ptr_eq(seen, o)) {
                out.push((p, o.clone()));
            }
        }
    }
    out
}

/// Every distinct object value in the sequence, first occurrence first.
fn distinct_objects(es: &ExecutableSequence) -> Vec<(usize, ObjectRef)> {
    let mut out: Vec<(usize, ObjectRef)> = Vec::new();
    for p in 0..es.len() {
        if let Some(Value::Object(o)) = es.value(p) {
            if !out.iter().any(|(_, seen)| Arc::ptr_eq(seen, o)) {
                out.push((p, o.clone()));
            }
        }
    }
    out
}
