// src/cli/run.rs — Default command: explore a target and write tests

use std::path::PathBuf;

use super::progress::terminal_progress;
use super::RunArgs;
use crate::core::generator::{GenerationResult, Generator};
use crate::infra::config::Config;
use crate::output::writer;
use crate::targets;

/// Explore the target named in `args` and write the surfaced tests.
pub fn run_generation(args: &RunArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let target = targets::find(&args.target)?;
    let operations = target.operations();
    tracing::debug!(target = target.name, operations = operations.len(), "Target loaded");

    let mut generator = Generator::new(operations, &config);
    if !args.quiet {
        generator = generator.with_progress(terminal_progress());
    }
    let result = generator.explore();

    let dir = config.output.resolved_dir();
    let files = writer::write_tests(&result, &dir, config.output.format, config.generation.seed)?;

    println!("{}", summary(&result, &files));
    Ok(())
}

/// One-paragraph summary for stdout.
pub fn summary(result: &GenerationResult, files: &[PathBuf]) -> String {
    let stats = &result.stats;
    let mut out = format!(
        "Stopped: {} after {:.1}s\n\
         Sequences: {} built, {} duplicate, {} invalid\n\
         Tests: {} regression, {} error-revealing\n\
         Pool: {} sequence(s)",
        result.stop_reason,
        result.duration.as_secs_f64(),
        stats.generated,
        stats.duplicates,
        stats.invalid,
        result.regression.len(),
        result.errors.len(),
        stats.pool_size,
    );
    if stats.timeouts > 0 {
        out.push_str(&format!("\nTimeouts: {}", stats.timeouts));
    }
    for file in files {
        out.push_str(&format!("\nWrote {}", file.display()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn quick_args(dir: &std::path::Path) -> RunArgs {
        RunArgs {
            target: "collections".into(),
            seed: Some(1),
            input_limit: Some(60),
            timeout_ms: Some(0),
            output_dir: Some(dir.to_path_buf()),
            format: Some(OutputFormat::Json),
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        run_generation(&quick_args(dir.path()), Config::default()).unwrap();
        assert!(dir.path().join("report.json").exists());
    }

    #[test]
    fn test_unknown_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = quick_args(dir.path());
        args.target = "missing".into();
        let err = run_generation(&args, Config::default()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_summary_mentions_files() {
        let result = GenerationResult {
            regression: vec![],
            errors: vec![],
            stats: Default::default(),
            stop_reason: crate::core::budget::StopReason::TimeLimit,
            duration: std::time::Duration::from_millis(1500),
        };
        let text = summary(&result, &[PathBuf::from("out/report.json")]);
        assert!(text.starts_with("Stopped: time limit reached after 1.5s"));
        assert!(text.ends_with("Wrote out/report.json"));
        assert!(!text.contains("Timeouts"));
    }
}
