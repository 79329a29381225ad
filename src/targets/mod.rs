// src/targets/mod.rs — Built-in operation sets for the CLI, benches and tests

pub mod collections;
pub mod faulty;

use std::sync::Arc;

use crate::core::operation::Operation;
use crate::core::types::{Exception, Value};
use crate::infra::errors::{Result, SeqforgeError};

/// A named set of operations to explore.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub name: &'static str,
    pub description: &'static str,
    build: fn() -> Vec<Arc<Operation>>,
}

impl Target {
    pub fn operations(&self) -> Vec<Arc<Operation>> {
        (self.build)()
    }
}

pub fn builtin_targets() -> Vec<Target> {
    vec![
        Target {
            name: "collections",
            description: "An integer stack and a mutable point; well behaved",
            build: collections::operations,
        },
        Target {
            name: "faulty",
            description: "Classes with planted bugs: broken equals, null handling, a hang",
            build: faulty::operations,
        },
        Target {
            name: "all",
            description: "Every built-in operation",
            build: all_operations,
        },
    ]
}

fn all_operations() -> Vec<Arc<Operation>> {
    let mut ops = collections::operations();
    ops.extend(faulty::operations());
    ops
}

pub fn find(name: &str) -> Result<Target> {
    builtin_targets()
        .into_iter()
        .find(|t| t.name == name)
        .ok_or_else(|| SeqforgeError::UnknownTarget { name: name.into() })
}

// ─── Helpers for invokers ───────────────────────────────────────

/// The receiver in slot 0, downcast to `T`.
pub(crate) fn this<T: 'static>(inputs: &[Value]) -> std::result::Result<&T, Exception> {
    arg_object(inputs, 0)
}

pub(crate) fn arg_object<T: 'static>(inputs: &[Value], slot: usize) -> std::result::Result<&T, Exception> {
    match inputs.get(slot) {
        Some(Value::Null) | None => Err(Exception::null_pointer(format!("argument {} is null", slot))),
        Some(v) => v.downcast::<T>().ok_or_else(|| {
            Exception::unchecked(
                "ClassCastException",
                format!("argument {} has the wrong type", slot),
            )
        }),
    }
}

pub(crate) fn arg_int(inputs: &[Value], slot: usize) -> std::result::Result<i64, Exception> {
    inputs
        .get(slot)
        .and_then(Value::as_int)
        .ok_or_else(|| Exception::unchecked("IllegalArgumentException", format!("argument {} is not an int", slot)))
}

pub(crate) fn arg_str(inputs: &[Value], slot: usize) -> std::result::Result<&str, Exception> {
    match inputs.get(slot) {
        Some(Value::Null) | None => Err(Exception::null_pointer(format!("argument {} is null", slot))),
        Some(v) => v.as_str().ok_or_else(|| {
            Exception::unchecked("IllegalArgumentException", format!("argument {} is not a string", slot))
        }),
    }
}
