// src/core/sandbox.rs — Guarded invocation of target code
//
// Without a timeout, calls run inline under `catch_unwind`. With a timeout,
// calls are handed to a persistent worker thread and awaited with
// `recv_timeout`. A worker that misses its deadline is abandoned, not
// killed: it keeps running until the target code returns, if it ever does.
// A fresh worker is spawned for the next call.
//
// Panics raised by target code are expected, so the default hook's report
// is replaced by a debug event while such code runs. Panics elsewhere still
// reach the previously installed hook.
//
// Stack overflow in Rust code aborts the process and cannot be contained
// here; targets report it as an `Exception` instead.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::operation::Operation;
use super::types::{Exception, ExceptionKind, Value};

type CallResult = Result<Value, Exception>;

struct Job {
    operation: Arc<Operation>,
    inputs: Vec<Value>,
    reply: mpsc::Sender<CallResult>,
}

struct Worker {
    jobs: mpsc::Sender<Job>,
}

impl Worker {
    fn spawn(id: u64) -> std::io::Result<Self> {
        let (jobs, rx) = mpsc::channel::<Job>();
        thread::Builder::new()
            .name(format!("seqforge-sandbox-{}", id))
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    let result = invoke_guarded(&job.operation, &job.inputs);
                    let _ = job.reply.send(result);
                }
            })?;
        Ok(Self { jobs })
    }
}

thread_local! {
    static TARGET_DEPTH: Cell<u32> = const { Cell::new(0) };
}

static QUIET_HOOK: Once = Once::new();

fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if in_target_code() {
                let current = thread::current();
                tracing::debug!(
                    thread = current.name().unwrap_or("unnamed"),
                    location = %info.location().map(|l| l.to_string()).unwrap_or_default(),
                    "Target code panicked",
                );
                return;
            }
            previous(info);
        }));
    });
}

/// True while the current thread is inside `catch_target`.
pub(crate) fn in_target_code() -> bool {
    TARGET_DEPTH.with(|d| d.get() > 0)
}

/// Run target code under `catch_unwind` with panic reports silenced.
pub(crate) fn catch_target<T>(f: impl FnOnce() -> T) -> thread::Result<T> {
    install_quiet_hook();
    TARGET_DEPTH.with(|d| d.set(d.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    TARGET_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    result
}

/// Run one call, turning a panic into `Exception::panic`.
pub fn invoke_guarded(operation: &Operation, inputs: &[Value]) -> CallResult {
    match catch_target(|| operation.invoke(inputs)) {
        Ok(result) => result,
        Err(payload) => Err(Exception::panic(panic_message(payload.as_ref()))),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Per-run execution statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SandboxStats {
    pub normal: u64,
    pub exceptional: u64,
    pub timeouts: u64,
    pub panics: u64,
    pub abandoned_workers: u64,
    pub normal_micros: u64,
    pub exceptional_micros: u64,
}

impl SandboxStats {
    pub fn mean_normal_micros(&self) -> f64 {
        if self.normal == 0 {
            0.0
        } else {
            self.normal_micros as f64 / self.normal as f64
        }
    }

    pub fn mean_exceptional_micros(&self) -> f64 {
        if self.exceptional == 0 {
            0.0
        } else {
            self.exceptional_micros as f64 / self.exceptional as f64
        }
    }
}

pub struct Sandbox {
    timeout: Option<Duration>,
    worker: Option<Worker>,
    spawned: u64,
    stats: SandboxStats,
}

impl Sandbox {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            worker: None,
            spawned: 0,
            stats: SandboxStats::default(),
        }
    }

    /// Run every call on the current thread.
    pub fn inline() -> Self {
        Self::new(None)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn stats(&self) -> &SandboxStats {
        &self.stats
    }

    /// Invoke `operation`. Exceptions, panics and timeouts all come back as `Err`.
    pub fn run(&mut self, operation: &Arc<Operation>, inputs: Vec<Value>) -> CallResult {
        let started = Instant::now();
        let result = match self.timeout {
            None => invoke_guarded(operation, &inputs),
            Some(limit) => self.run_on_worker(operation, inputs, limit),
        };
        let micros = started.elapsed().as_micros() as u64;

        match &result {
            Ok(_) => {
                self.stats.normal += 1;
                self.stats.normal_micros += micros;
            }
            Err(e) => {
                self.stats.exceptional += 1;
                self.stats.exceptional_micros += micros;
                match e.kind {
                    ExceptionKind::Timeout => self.stats.timeouts += 1,
                    ExceptionKind::Panic => self.stats.panics += 1,
                    _ => {}
                }
            }
        }
        result
    }

    fn worker(&mut self) -> Option<&Worker> {
        if self.worker.is_none() {
            self.spawned += 1;
            match Worker::spawn(self.spawned) {
                Ok(w) => self.worker = Some(w),
                Err(e) => {
                    tracing::error!("Could not spawn sandbox worker: {}", e);
                    return None;
                }
            }
        }
        self.worker.as_ref()
    }

    fn run_on_worker(&mut self, operation: &Arc<Operation>, inputs: Vec<Value>, limit: Duration) -> CallResult {
        let Some(worker) = self.worker() else {
            // No thread available: fall back to an unbounded inline call.
            return invoke_guarded(operation, &inputs);
        };

        let (reply, rx) = mpsc::channel();
        let job = Job {
            operation: operation.clone(),
            inputs,
            reply,
        };
        if let Err(mpsc::SendError(job)) = worker.jobs.send(job) {
            self.worker = None;
            return invoke_guarded(&job.operation, &job.inputs);
        }

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    operation = %operation.qualified_name(),
                    timeout_ms = limit.as_millis() as u64,
                    "Statement timed out; abandoning sandbox worker",
                );
                self.worker = None;
                self.stats.abandoned_workers += 1;
                Err(Exception::timeout(limit))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.worker = None;
                Err(Exception::panic("sandbox worker exited"))
            }
        }
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::inline()
    }
}
