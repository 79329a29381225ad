// src/output/mod.rs — Rendering generated tests as code and reports

pub mod writer;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::budget::StopReason;
use crate::core::executable::ExecutableSequence;
use crate::core::generator::{GenerationResult, GenerationStats};
use crate::core::sequence::Sequence;
use crate::core::types::{BehaviorType, Check, CheckResult, Exception, Verdict};
use crate::evaluator::regression::{EXPECTED_EXCEPTION, IS_NOT_NULL, IS_NULL, VALUE_EQUALS};
use crate::evaluator::NO_EXCEPTION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Test functions, one file per kind.
    #[default]
    Code,
    Json,
    Yaml,
}

/// One surfaced test in report form.
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub verdict: Option<Verdict>,
    pub behavior: Option<BehaviorType>,
    pub code: Vec<String>,
    /// For error tests: the statements that can influence the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_code: Option<Vec<String>>,
    pub checks: Vec<Check>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<Exception>,
    pub duration_micros: u64,
}

impl TestCase {
    pub fn from_executable(es: &ExecutableSequence, name: String) -> Self {
        let focused_code = if es.is_error() {
            focus_on_failure(es).map(|seq| seq.to_code())
        } else {
            None
        };
        Self {
            id: es.id.clone(),
            name,
            verdict: es.verdict,
            behavior: es.exception_behavior,
            code: es.sequence.to_code(),
            focused_code,
            checks: es.checks.clone(),
            exception: es.terminal_exception().map(|(_, e)| e.clone()),
            duration_micros: es.duration.as_micros() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub version: String,
    pub generated_at: String,
    pub seed: u64,
    pub stop_reason: StopReason,
    pub duration_ms: u64,
    pub stats: GenerationStats,
    pub regression: Vec<TestCase>,
    pub errors: Vec<TestCase>,
}

impl TestReport {
    pub fn from_result(result: &GenerationResult, seed: u64) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            seed,
            stop_reason: result.stop_reason,
            duration_ms: result.duration.as_millis() as u64,
            stats: result.stats.clone(),
            regression: cases(&result.regression, "regression_test"),
            errors: cases(&result.errors, "error_test"),
        }
    }
}

fn cases(tests: &[ExecutableSequence], prefix: &str) -> Vec<TestCase> {
    tests
        .iter()
        .enumerate()
        .map(|(i, es)| TestCase::from_executable(es, format!("{}_{}", prefix, i + 1)))
        .collect()
}

/// The smallest producer-closed sequence containing every statement that
/// can influence a failing check.
pub fn focus_on_failure(es: &ExecutableSequence) -> Option<Sequence> {
    let mut keep = BTreeSet::new();
    for check in es.checks.iter().filter(|c| c.is_fail()) {
        for &p in &check.positions {
            keep.extend(es.sequence.influencing_slice(p).ok()?);
        }
    }
    if keep.is_empty() {
        return None;
    }
    es.sequence.retain(&keep).ok().map(|(seq, _)| seq)
}

/// Render one test as a test function. Oracles follow the statement they
/// observe; failing checks are left as comments.
pub fn render_test(es: &ExecutableSequence, name: &str) -> String {
    let mut out = String::new();
    out.push_str("#[test]\n");
    out.push_str(&format!("fn {}() {{\n", name));

    for (i, line) in es.sequence.to_code().into_iter().enumerate() {
        for check in es.checks.iter().filter(|c| c.position == i) {
            if check.contract == EXPECTED_EXCEPTION {
                out.push_str(&format!("    // raises {}\n", check.detail));
            }
        }
        out.push_str(&format!("    {}\n", line));

        let var = Sequence::var_name(i);
        for check in es.checks.iter().filter(|c| c.position == i) {
            match (check.contract.as_str(), check.result) {
                (VALUE_EQUALS, CheckResult::Pass) if check.detail == "f64::NAN" => {
                    out.push_str(&format!("    assert!({}.is_nan());\n", var));
                }
                (VALUE_EQUALS, CheckResult::Pass) => {
                    out.push_str(&format!("    assert_eq!({}, {});\n", var, check.detail));
                }
                (IS_NULL, CheckResult::Pass) => {
                    out.push_str(&format!("    assert!({}.is_null());\n", var));
                }
                (IS_NOT_NULL, CheckResult::Pass) => {
                    out.push_str(&format!("    assert!(!{}.is_null());\n", var));
                }
                (NO_EXCEPTION, CheckResult::Fail) => {
                    out.push_str(&format!("    // FAILS: unexpected {}\n", check.detail));
                }
                (_, CheckResult::Fail) => {
                    let vars: Vec<String> = check.positions.iter().map(|&p| Sequence::var_name(p)).collect();
                    out.push_str(&format!("    // FAILS: {} on {}\n", check.contract, vars.join(", ")));
                }
                _ => {}
            }
        }
    }
    out.push_str("}\n");
    out
}

/// Render a whole file of tests.
pub fn render_suite(tests: &[ExecutableSequence], prefix: &str) -> String {
    let mut out = format!(
        "// Generated by seqforge {} on {}\n",
        env!("CARGO_PKG_VERSION"),
        chrono::Utc::now().format("%Y-%m-%d")
    );
    for (i, es) in tests.iter().enumerate() {
        out.push('\n');
        out.push_str(&render_test(es, &format!("{}_{}", prefix, i + 1)));
    }
    out
}
