// src/core/types.rs — Core domain types: static types, runtime values, exceptions, verdicts

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

// ─── Static types ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Bool,
    Int,
    Float,
    Char,
}

/// A nominal class or interface, identified by name and its direct supertypes.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassType {
    pub name: String,
    pub supertypes: Vec<Type>,
}

impl ClassType {
    /// True if `ancestor` is this class or appears anywhere in its supertype closure.
    pub fn inherits(&self, ancestor: &ClassType) -> bool {
        if self == ancestor {
            return true;
        }
        self.supertypes.iter().any(|s| match s {
            Type::Class(c) => c.inherits(ancestor),
            Type::Parameterized { base, .. } => base.inherits(ancestor),
            _ => false,
        })
    }
}

/// Descriptor of a static type. Opaque to the generator apart from
/// equality, ordering and the assignability relation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    Void,
    Primitive(PrimitiveType),
    Str,
    /// Root of every reference type.
    Object,
    Class(Arc<ClassType>),
    Array(Box<Type>),
    Parameterized {
        base: Arc<ClassType>,
        args: Vec<Type>,
    },
}

impl Type {
    pub fn bool() -> Self {
        Type::Primitive(PrimitiveType::Bool)
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveType::Int)
    }

    pub fn float() -> Self {
        Type::Primitive(PrimitiveType::Float)
    }

    pub fn char() -> Self {
        Type::Primitive(PrimitiveType::Char)
    }

    /// A class with no declared supertypes (other than `Object`).
    pub fn class(name: impl Into<String>) -> Self {
        Self::subclass(name, Vec::new())
    }

    pub fn subclass(name: impl Into<String>, supertypes: Vec<Type>) -> Self {
        Type::Class(Arc::new(ClassType {
            name: name.into(),
            supertypes,
        }))
    }

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    /// Instantiate a generic class type. Returns `None` if `base` is not a class.
    pub fn parameterized(base: &Type, args: Vec<Type>) -> Option<Self> {
        match base {
            Type::Class(c) => Some(Type::Parameterized {
                base: c.clone(),
                args,
            }),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    /// Reference types may hold `null`.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Type::Str
                | Type::Object
                | Type::Class(_)
                | Type::Array(_)
                | Type::Parameterized { .. }
        )
    }

    /// Primitives and strings are values, never receivers of a method call.
    pub fn is_receiver_type(&self) -> bool {
        self.is_reference() && !matches!(self, Type::Str)
    }

    /// Every proper supertype of this type, nearest first, without duplicates.
    pub fn supertypes(&self) -> Vec<Type> {
        let mut out: Vec<Type> = Vec::new();
        match self {
            Type::Class(c) => collect_class_supertypes(c, &mut out),
            Type::Parameterized { base, .. } => {
                out.push(Type::Class(base.clone()));
                collect_class_supertypes(base, &mut out);
            }
            _ => {}
        }
        if self.is_reference() && *self != Type::Object && !out.contains(&Type::Object) {
            out.push(Type::Object);
        }
        out
    }

    /// Can a value of static type `other` be used where `self` is expected?
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match self {
            Type::Void | Type::Primitive(_) | Type::Str => false,
            Type::Object => other.is_reference(),
            Type::Class(c) => match other {
                Type::Class(o) => o.inherits(c),
                Type::Parameterized { base, .. } => base.inherits(c),
                _ => false,
            },
            Type::Array(element) => match other {
                Type::Array(other_element) => {
                    element.is_reference() && element.is_assignable_from(other_element)
                }
                _ => false,
            },
            Type::Parameterized { base, args } => match other {
                Type::Parameterized {
                    base: other_base,
                    args: other_args,
                } => args == other_args && other_base.inherits(base),
                _ => false,
            },
        }
    }
}

fn collect_class_supertypes(class: &ClassType, out: &mut Vec<Type>) {
    for s in &class.supertypes {
        if !out.contains(s) {
            out.push(s.clone());
        }
        match s {
            Type::Class(c) => collect_class_supertypes(c, out),
            Type::Parameterized { base, .. } => {
                let raw = Type::Class(base.clone());
                if !out.contains(&raw) {
                    out.push(raw);
                }
                collect_class_supertypes(base, out);
            }
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Primitive(PrimitiveType::Bool) => write!(f, "bool"),
            Type::Primitive(PrimitiveType::Int) => write!(f, "int"),
            Type::Primitive(PrimitiveType::Float) => write!(f, "float"),
            Type::Primitive(PrimitiveType::Char) => write!(f, "char"),
            Type::Str => write!(f, "String"),
            Type::Object => write!(f, "Object"),
            Type::Class(c) => write!(f, "{}", c.name),
            Type::Array(e) => write!(f, "{}[]", e),
            Type::Parameterized { base, args } => {
                write!(f, "{}<", base.name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ">")
            }
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ─── Runtime values ─────────────────────────────────────────────

/// An object produced by the code under test.
///
/// The contract subsystem only ever talks to target objects through these
/// methods, and every one of them may raise. The defaults give identity
/// semantics.
pub trait TargetObject: Send + Sync + fmt::Debug {
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn equals(&self, other: &Value) -> Result<bool, Exception> {
        Ok(match other {
            Value::Object(o) => std::ptr::addr_eq(self as *const Self, Arc::as_ptr(o)),
            _ => false,
        })
    }

    fn hash_code(&self) -> Result<i64, Exception> {
        Ok((self as *const Self).cast::<()>() as usize as i64)
    }

    fn to_display(&self) -> Result<String, Exception> {
        Ok(format!(
            "{}@{:x}",
            self.type_name(),
            (self as *const Self).cast::<()>() as usize
        ))
    }
}

pub type ObjectRef = Arc<dyn TargetObject>;

#[derive(Debug, Clone)]
pub enum Value {
    /// Result of a void operation.
    Unit,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Object(ObjectRef),
}

/// Hashable identity of a literal value; NaN is canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LiteralKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Char(char),
    Str(String),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn object<T: TargetObject + 'static>(obj: T) -> Self {
        Value::Object(Arc::new(obj))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Downcast an object value to its concrete type.
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.as_object().and_then(|o| o.as_any().downcast_ref::<T>())
    }

    pub fn literal_key(&self) -> Option<LiteralKey> {
        match self {
            Value::Null => Some(LiteralKey::Null),
            Value::Bool(b) => Some(LiteralKey::Bool(*b)),
            Value::Int(i) => Some(LiteralKey::Int(*i)),
            Value::Float(x) if x.is_nan() => Some(LiteralKey::Float(f64::NAN.to_bits())),
            Value::Float(x) => Some(LiteralKey::Float(x.to_bits())),
            Value::Char(c) => Some(LiteralKey::Char(*c)),
            Value::Str(s) => Some(LiteralKey::Str(s.clone())),
            Value::Unit | Value::Object(_) => None,
        }
    }

    /// Source form of a literal value; `None` for objects and unit.
    pub fn literal_code(&self) -> Option<String> {
        match self {
            Value::Null => Some("null".into()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(x) if x.is_nan() => Some("f64::NAN".into()),
            Value::Float(x) if x.is_infinite() && *x > 0.0 => Some("f64::INFINITY".into()),
            Value::Float(x) if x.is_infinite() => Some("f64::NEG_INFINITY".into()),
            Value::Float(x) => Some(format!("{:?}", x)),
            Value::Char(c) => Some(format!("{:?}", c)),
            Value::Str(s) => Some(format!("{:?}", s)),
            Value::Unit | Value::Object(_) => None,
        }
    }

    /// Same object (by identity) or equal literal.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Unit, Value::Unit) => true,
            _ => match (self.literal_key(), other.literal_key()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

// ─── Exceptions ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionKind {
    /// Declared, recoverable failure.
    Checked,
    /// Undeclared runtime failure.
    Unchecked,
    NullPointer,
    /// Fatal error raised by the code under test.
    Error,
    StackOverflow,
    OutOfMemory,
    /// The statement exceeded its time box.
    Timeout,
    /// A Rust panic escaped the code under test.
    Panic,
}

/// Something the code under test raised. This is data, never a fault of the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    pub kind: ExceptionKind,
    pub type_name: String,
    pub message: String,
}

impl Exception {
    pub fn new(kind: ExceptionKind, type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn checked(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Checked, type_name, message)
    }

    pub fn unchecked(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Unchecked, type_name, message)
    }

    pub fn null_pointer(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::NullPointer, "NullPointerException", message)
    }

    pub fn error(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Error, type_name, message)
    }

    pub fn stack_overflow() -> Self {
        Self::new(ExceptionKind::StackOverflow, "StackOverflowError", "")
    }

    pub fn out_of_memory() -> Self {
        Self::new(ExceptionKind::OutOfMemory, "OutOfMemoryError", "")
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            ExceptionKind::Timeout,
            "TimeoutSignal",
            format!("statement exceeded {}ms", limit.as_millis()),
        )
    }

    pub fn panic(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::Panic, "Panic", message)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.type_name)
        } else {
            write!(f, "{}: {}", self.type_name, self.message)
        }
    }
}

// ─── Classification results ─────────────────────────────────────

/// How a raised exception relates to declared/assumed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorType {
    Expected,
    Invalid,
    Error,
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorType::Expected => write!(f, "EXPECTED"),
            BehaviorType::Invalid => write!(f, "INVALID"),
            BehaviorType::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Regression,
    Error,
    Invalid,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Regression => write!(f, "REGRESSION"),
            Verdict::Error => write!(f, "ERROR"),
            Verdict::Invalid => write!(f, "INVALID"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Pass,
    Fail,
    NotApplicable,
}

/// The outcome of one contract or oracle at one statement position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Check {
    pub contract: String,
    pub position: usize,
    /// Positions of every value the check looked at; `position` is the first.
    pub positions: Vec<usize>,
    pub result: CheckResult,
    pub detail: String,
}

impl Check {
    pub fn new(
        contract: impl Into<String>,
        positions: Vec<usize>,
        result: CheckResult,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            contract: contract.into(),
            position: positions.first().copied().unwrap_or(0),
            positions,
            result,
            detail: detail.into(),
        }
    }

    pub fn is_fail(&self) -> bool {
        self.result == CheckResult::Fail
    }

    pub fn is_pass(&self) -> bool {
        self.result == CheckResult::Pass
    }
}
