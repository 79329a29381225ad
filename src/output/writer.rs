// src/output/writer.rs — Write generated tests to disk
//
// Code output produces regression_tests.rs and error_tests.rs; JSON/YAML
// output produces one report.{json,yaml} with both kinds.

use std::path::{Path, PathBuf};

use super::{render_suite, OutputFormat, TestReport};
use crate::core::generator::GenerationResult;
use crate::infra::errors::Result;

pub const REGRESSION_FILE: &str = "regression_tests.rs";
pub const ERROR_FILE: &str = "error_tests.rs";

/// Serialize a report in the given structured format.
pub fn report_string(report: &TestReport, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Yaml => serde_yml::to_string(report)?,
        OutputFormat::Code => {
            // Code output has no single-document form; fall back to JSON.
            serde_json::to_string_pretty(report)?
        }
    })
}

/// Write `result` under `dir`, creating it if needed. Returns the files written.
pub fn write_tests(
    result: &GenerationResult,
    dir: &Path,
    format: OutputFormat,
    seed: u64,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    match format {
        OutputFormat::Code => {
            let regression = dir.join(REGRESSION_FILE);
            std::fs::write(&regression, render_suite(&result.regression, "regression_test"))?;
            written.push(regression);

            let errors = dir.join(ERROR_FILE);
            std::fs::write(&errors, render_suite(&result.errors, "error_test"))?;
            written.push(errors);
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = TestReport::from_result(result, seed);
            let ext = if format == OutputFormat::Json { "json" } else { "yaml" };
            let path = dir.join(format!("report.{}", ext));
            std::fs::write(&path, report_string(&report, format)?)?;
            written.push(path);
        }
    }

    tracing::info!(
        dir = %dir.display(),
        files = written.len(),
        regression = result.regression.len(),
        errors = result.errors.len(),
        "Wrote generated tests",
    );
    Ok(written)
}
