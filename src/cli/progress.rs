// src/cli/progress.rs — Terminal progress renderer for generation runs

use crate::core::generator::{GenerationEvent, StepOutcome};

/// Print a heartbeat line every this many steps.
const HEARTBEAT_STEPS: u64 = 500;

/// Format one event as a terminal line, or `None` for events not worth a line.
pub fn format_event(event: &GenerationEvent) -> Option<String> {
    match event {
        GenerationEvent::ExplorationStart {
            operations,
            pool_size,
            seed,
        } => Some(format!(
            "[start] {} operation(s), {} seed sequence(s), seed={}",
            operations, pool_size, seed,
        )),
        GenerationEvent::StepStart { step } if *step > 0 && step % HEARTBEAT_STEPS == 0 => {
            Some(format!("[step {}] ...", step))
        }
        GenerationEvent::StepEnd {
            step,
            outcome: StepOutcome::Error { surfaced: true },
        } => Some(format!("[step {}] error-revealing test found", step)),
        GenerationEvent::StepEnd {
            step,
            outcome: StepOutcome::ClassificationError,
        } => Some(format!("[step {}] classification failed; candidate dropped", step)),
        GenerationEvent::Complete {
            stop_reason,
            regression,
            errors,
            steps,
        } => Some(format!(
            "[done] {}: steps={} regression={} errors={}",
            stop_reason, steps, regression, errors,
        )),
        _ => None,
    }
}

/// Build a progress callback that writes to stderr.
///
/// Returns a closure suitable for `Generator::with_progress()`.
pub fn terminal_progress() -> impl Fn(GenerationEvent) + Send + 'static {
    move |event| {
        if let Some(line) = format_event(&event) {
            eprintln!("{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::budget::StopReason;

    #[test]
    fn test_start_format() {
        let line = format_event(&GenerationEvent::ExplorationStart {
            operations: 4,
            pool_size: 9,
            seed: 42,
        });
        assert_eq!(
            line.as_deref(),
            Some("[start] 4 operation(s), 9 seed sequence(s), seed=42")
        );
    }

    #[test]
    fn test_heartbeat_only_on_multiples() {
        assert!(format_event(&GenerationEvent::StepStart { step: 1 }).is_none());
        assert!(format_event(&GenerationEvent::StepStart { step: 0 }).is_none());
        assert_eq!(
            format_event(&GenerationEvent::StepStart { step: 1000 }).as_deref(),
            Some("[step 1000] ...")
        );
    }

    #[test]
    fn test_quiet_outcomes_are_skipped() {
        for outcome in [
            StepOutcome::Duplicate,
            StepOutcome::Invalid,
            StepOutcome::Regression {
                surfaced: true,
                pooled: true,
            },
            StepOutcome::Error { surfaced: false },
        ] {
            assert!(format_event(&GenerationEvent::StepEnd { step: 3, outcome }).is_none());
        }
    }

    #[test]
    fn test_error_found_format() {
        let line = format_event(&GenerationEvent::StepEnd {
            step: 12,
            outcome: StepOutcome::Error { surfaced: true },
        });
        assert_eq!(line.as_deref(), Some("[step 12] error-revealing test found"));
    }

    #[test]
    fn test_complete_format() {
        let line = format_event(&GenerationEvent::Complete {
            stop_reason: StopReason::InputLimit,
            regression: 10,
            errors: 2,
            steps: 300,
        })
        .unwrap();
        assert_eq!(line, "[done] input limit reached: steps=300 regression=10 errors=2");
    }
}
