// src/targets/collections.rs — Well-behaved demo classes: Stack and Point

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{arg_int, this};
use crate::core::operation::Operation;
use crate::core::types::{Exception, TargetObject, Type, Value};

pub fn stack_type() -> Type {
    Type::class("Stack")
}

pub fn point_type() -> Type {
    Type::class("Point")
}

/// A bounded stack of integers with value equality.
#[derive(Debug, Default)]
pub struct IntStack {
    items: Mutex<Vec<i64>>,
    capacity: Option<usize>,
}

impl IntStack {
    fn items(&self) -> MutexGuard<'_, Vec<i64>> {
        self.items.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn snapshot(&self) -> Vec<i64> {
        self.items().clone()
    }

    fn push(&self, x: i64) -> Result<(), Exception> {
        let mut items = self.items();
        if let Some(cap) = self.capacity {
            if items.len() >= cap {
                return Err(Exception::checked("StackFullException", format!("capacity {}", cap)));
            }
        }
        items.push(x);
        Ok(())
    }

    fn pop(&self) -> Result<i64, Exception> {
        self.items()
            .pop()
            .ok_or_else(|| Exception::checked("EmptyStackException", ""))
    }

    fn peek(&self) -> Result<i64, Exception> {
        self.items()
            .last()
            .copied()
            .ok_or_else(|| Exception::checked("EmptyStackException", ""))
    }
}

impl TargetObject for IntStack {
    fn type_name(&self) -> &str {
        "Stack"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Result<bool, Exception> {
        Ok(match other.downcast::<IntStack>() {
            Some(o) => self.snapshot() == o.snapshot(),
            None => false,
        })
    }

    fn hash_code(&self) -> Result<i64, Exception> {
        Ok(self
            .snapshot()
            .iter()
            .fold(17i64, |h, x| h.wrapping_mul(31).wrapping_add(*x)))
    }

    fn to_display(&self) -> Result<String, Exception> {
        Ok(format!("Stack{:?}", self.snapshot()))
    }
}

/// A mutable 2-D point with public fields.
#[derive(Debug, Default)]
pub struct Point {
    coords: Mutex<(i64, i64)>,
}

impl Point {
    fn coords(&self) -> MutexGuard<'_, (i64, i64)> {
        self.coords.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl TargetObject for Point {
    fn type_name(&self) -> &str {
        "Point"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Result<bool, Exception> {
        let mine = *self.coords();
        Ok(match other.downcast::<Point>() {
            Some(o) => mine == *o.coords(),
            None => false,
        })
    }

    fn hash_code(&self) -> Result<i64, Exception> {
        let (x, y) = *self.coords();
        Ok(x.wrapping_mul(31).wrapping_add(y))
    }

    fn to_display(&self) -> Result<String, Exception> {
        let (x, y) = *self.coords();
        Ok(format!("({}, {})", x, y))
    }
}

pub fn operations() -> Vec<Arc<Operation>> {
    let stack = stack_type();
    let point = point_type();
    vec![
        Arc::new(Operation::constructor(&stack, vec![], |_| Ok(Value::object(IntStack::default())))),
        Arc::new(Operation::constructor(&stack, vec![Type::int()], |v| {
            let cap = arg_int(v, 0)?;
            if cap < 0 {
                return Err(Exception::checked("IllegalCapacityException", cap.to_string()));
            }
            Ok(Value::object(IntStack {
                items: Mutex::new(Vec::new()),
                capacity: Some(cap as usize),
            }))
        })),
        Arc::new(Operation::method(&stack, "push", vec![Type::int()], Type::Void, |v| {
            this::<IntStack>(v)?.push(arg_int(v, 1)?)?;
            Ok(Value::Unit)
        })),
        Arc::new(Operation::method(&stack, "pop", vec![], Type::int(), |v| {
            Ok(Value::Int(this::<IntStack>(v)?.pop()?))
        })),
        Arc::new(Operation::method(&stack, "peek", vec![], Type::int(), |v| {
            Ok(Value::Int(this::<IntStack>(v)?.peek()?))
        })),
        Arc::new(Operation::method(&stack, "size", vec![], Type::int(), |v| {
            Ok(Value::Int(this::<IntStack>(v)?.snapshot().len() as i64))
        })),
        Arc::new(Operation::method(&stack, "is_empty", vec![], Type::bool(), |v| {
            Ok(Value::Bool(this::<IntStack>(v)?.snapshot().is_empty()))
        })),
        Arc::new(Operation::method(&stack, "copy", vec![], stack.clone(), |v| {
            let src = this::<IntStack>(v)?;
            Ok(Value::object(IntStack {
                items: Mutex::new(src.snapshot()),
                capacity: src.capacity,
            }))
        })),
        Arc::new(Operation::constructor(&point, vec![Type::int(), Type::int()], |v| {
            Ok(Value::object(Point {
                coords: Mutex::new((arg_int(v, 0)?, arg_int(v, 1)?)),
            }))
        })),
        Arc::new(Operation::field_get(&point, "x", Type::int(), |v| {
            Ok(Value::Int(this::<Point>(v)?.coords().0))
        })),
        Arc::new(Operation::field_set(&point, "x", Type::int(), |v| {
            this::<Point>(v)?.coords().0 = arg_int(v, 1)?;
            Ok(Value::Unit)
        })),
        Arc::new(Operation::method(&point, "translate", vec![Type::int(), Type::int()], point.clone(), |v| {
            let (x, y) = *this::<Point>(v)?.coords();
            let (dx, dy) = (arg_int(v, 1)?, arg_int(v, 2)?);
            Ok(Value::object(Point {
                coords: Mutex::new((x.wrapping_add(dx), y.wrapping_add(dy))),
            }))
        })),
    ]
}
