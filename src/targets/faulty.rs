// src/targets/faulty.rs — Demo classes with planted bugs
//
// Account: equals is not reflexive for negative balances.
// Registry: get(i) indexes without a bounds check and panics.
// Spinner: spin(n) never returns for negative n.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{arg_int, arg_str, this};
use crate::core::operation::Operation;
use crate::core::types::{Exception, TargetObject, Type, Value};

/// How long a hanging `spin` keeps its thread busy before giving up.
const SPIN_CEILING: Duration = Duration::from_secs(30);

pub fn account_type() -> Type {
    Type::class("Account")
}

pub fn registry_type() -> Type {
    Type::class("Registry")
}

pub fn spinner_type() -> Type {
    Type::class("Spinner")
}

#[derive(Debug)]
pub struct Account {
    balance: Mutex<i64>,
}

impl Account {
    fn balance(&self) -> MutexGuard<'_, i64> {
        self.balance.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl TargetObject for Account {
    fn type_name(&self) -> &str {
        "Account"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn equals(&self, other: &Value) -> Result<bool, Exception> {
        let mine = *self.balance();
        Ok(match other.downcast::<Account>() {
            // Overdrawn accounts never compare equal, not even to themselves.
            Some(o) => mine >= 0 && mine == *o.balance(),
            None => false,
        })
    }

    fn hash_code(&self) -> Result<i64, Exception> {
        Ok(*self.balance())
    }

    fn to_display(&self) -> Result<String, Exception> {
        Ok(format!("Account({})", *self.balance()))
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    names: Mutex<Vec<String>>,
}

impl Registry {
    fn names(&self) -> MutexGuard<'_, Vec<String>> {
        self.names.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl TargetObject for Registry {
    fn type_name(&self) -> &str {
        "Registry"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct Spinner;

impl TargetObject for Spinner {
    fn type_name(&self) -> &str {
        "Spinner"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn spin(n: i64) -> i64 {
    if n >= 0 {
        return n;
    }
    let start = Instant::now();
    while start.elapsed() < SPIN_CEILING {
        std::thread::sleep(Duration::from_millis(10));
    }
    n
}

pub fn operations() -> Vec<Arc<Operation>> {
    let account = account_type();
    let registry = registry_type();
    let spinner = spinner_type();
    vec![
        Arc::new(Operation::constructor(&account, vec![Type::int()], |v| {
            Ok(Value::object(Account {
                balance: Mutex::new(arg_int(v, 0)?),
            }))
        })),
        Arc::new(Operation::method(&account, "deposit", vec![Type::int()], Type::Void, |v| {
            let amount = arg_int(v, 1)?;
            if amount <= 0 {
                return Err(Exception::checked("InvalidAmountException", amount.to_string()));
            }
            let mut balance = this::<Account>(v)?.balance();
            *balance = balance.wrapping_add(amount);
            Ok(Value::Unit)
        })),
        Arc::new(Operation::method(&account, "balance", vec![], Type::int(), |v| {
            Ok(Value::Int(*this::<Account>(v)?.balance()))
        })),
        Arc::new(Operation::constructor(&registry, vec![], |_| Ok(Value::object(Registry::default())))),
        Arc::new(Operation::method(&registry, "register", vec![Type::Str], Type::int(), |v| {
            let name = arg_str(v, 1)?.to_string();
            let mut names = this::<Registry>(v)?.names();
            names.push(name);
            Ok(Value::Int(names.len() as i64))
        })),
        Arc::new(Operation::method(&registry, "first", vec![], Type::Str, |v| {
            Ok(this::<Registry>(v)?
                .names()
                .first()
                .map(|s| Value::str(s.as_str()))
                .unwrap_or(Value::Null))
        })),
        Arc::new(Operation::method(&registry, "get", vec![Type::int()], Type::Str, |v| {
            let i = arg_int(v, 1)?;
            let names = this::<Registry>(v)?.names();
            // Unchecked index; panics past the end.
            let name = names[i as usize].clone();
            Ok(Value::str(name))
        })),
        Arc::new(Operation::constructor(&spinner, vec![], |_| Ok(Value::object(Spinner)))),
        Arc::new(Operation::method(&spinner, "spin", vec![Type::int()], Type::int(), |v| {
            this::<Spinner>(v)?;
            Ok(Value::Int(spin(arg_int(v, 1)?)))
        })),
    ]
}
