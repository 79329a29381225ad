// src/core/operation.rs — Callable operations over target types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::types::{Exception, LiteralKey, Type, Value};

/// The one capability the generator needs from an operation: call it with
/// concrete input values.
pub type Invoker = Arc<dyn Fn(&[Value]) -> Result<Value, Exception> + Send + Sync>;

/// Name, declaring type, ordered input types and output type.
/// For receiver-taking operations the receiver is input slot 0.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    pub name: String,
    pub declaring: Type,
    pub inputs: Vec<Type>,
    pub output: Type,
}

#[derive(Clone)]
pub enum Operation {
    Constructor {
        sig: Signature,
        invoker: Invoker,
    },
    Method {
        sig: Signature,
        receiver: bool,
        invoker: Invoker,
    },
    FieldGet {
        sig: Signature,
        receiver: bool,
        invoker: Invoker,
    },
    FieldSet {
        sig: Signature,
        receiver: bool,
        invoker: Invoker,
    },
    Literal {
        ty: Type,
        value: Value,
    },
}

fn invoker(f: impl Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static) -> Invoker {
    Arc::new(f)
}

fn with_receiver(class: &Type, params: Vec<Type>) -> Vec<Type> {
    let mut inputs = Vec::with_capacity(params.len() + 1);
    inputs.push(class.clone());
    inputs.extend(params);
    inputs
}

impl Operation {
    /// A constructor of `class`; its output is an instance of `class`.
    pub fn constructor(
        class: &Type,
        params: Vec<Type>,
        f: impl Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    ) -> Self {
        Operation::Constructor {
            sig: Signature {
                name: class.to_string(),
                declaring: class.clone(),
                inputs: params,
                output: class.clone(),
            },
            invoker: invoker(f),
        }
    }

    /// An instance method. The invoker receives the receiver at `inputs[0]`.
    pub fn method(
        class: &Type,
        name: impl Into<String>,
        params: Vec<Type>,
        output: Type,
        f: impl Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    ) -> Self {
        Operation::Method {
            sig: Signature {
                name: name.into(),
                declaring: class.clone(),
                inputs: with_receiver(class, params),
                output,
            },
            receiver: true,
            invoker: invoker(f),
        }
    }

    pub fn static_method(
        class: &Type,
        name: impl Into<String>,
        params: Vec<Type>,
        output: Type,
        f: impl Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    ) -> Self {
        Operation::Method {
            sig: Signature {
                name: name.into(),
                declaring: class.clone(),
                inputs: params,
                output,
            },
            receiver: false,
            invoker: invoker(f),
        }
    }

    /// Read an instance field of type `ty`.
    pub fn field_get(
        class: &Type,
        name: impl Into<String>,
        ty: Type,
        f: impl Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    ) -> Self {
        Operation::FieldGet {
            sig: Signature {
                name: name.into(),
                declaring: class.clone(),
                inputs: vec![class.clone()],
                output: ty,
            },
            receiver: true,
            invoker: invoker(f),
        }
    }

    /// Write an instance field of type `ty`. Inputs are `[receiver, value]`.
    pub fn field_set(
        class: &Type,
        name: impl Into<String>,
        ty: Type,
        f: impl Fn(&[Value]) -> Result<Value, Exception> + Send + Sync + 'static,
    ) -> Self {
        Operation::FieldSet {
            sig: Signature {
                name: name.into(),
                declaring: class.clone(),
                inputs: vec![class.clone(), ty],
                output: Type::Void,
            },
            receiver: true,
            invoker: invoker(f),
        }
    }

    pub fn literal(ty: Type, value: Value) -> Self {
        Operation::Literal { ty, value }
    }

    /// A typed `null` literal.
    pub fn null_of(ty: Type) -> Self {
        Operation::Literal {
            ty,
            value: Value::Null,
        }
    }

    fn signature(&self) -> Option<&Signature> {
        match self {
            Operation::Constructor { sig, .. }
            | Operation::Method { sig, .. }
            | Operation::FieldGet { sig, .. }
            | Operation::FieldSet { sig, .. } => Some(sig),
            Operation::Literal { .. } => None,
        }
    }

    pub fn input_types(&self) -> &[Type] {
        match self.signature() {
            Some(sig) => &sig.inputs,
            None => &[],
        }
    }

    pub fn output_type(&self) -> &Type {
        match self {
            Operation::Literal { ty, .. } => ty,
            _ => match self.signature() {
                Some(sig) => &sig.output,
                None => &Type::Void,
            },
        }
    }

    pub fn arity(&self) -> usize {
        self.input_types().len()
    }

    pub fn name(&self) -> &str {
        match self.signature() {
            Some(sig) => &sig.name,
            None => "literal",
        }
    }

    /// `Class::name` for calls, the type name for constructors and literals.
    pub fn qualified_name(&self) -> String {
        match self {
            Operation::Constructor { sig, .. } => sig.name.clone(),
            Operation::Literal { ty, .. } => ty.to_string(),
            _ => match self.signature() {
                Some(sig) => format!("{}::{}", sig.declaring, sig.name),
                None => String::new(),
            },
        }
    }

    /// True if input slot 0 is the receiver.
    pub fn has_receiver(&self) -> bool {
        match self {
            Operation::Method { receiver, .. }
            | Operation::FieldGet { receiver, .. }
            | Operation::FieldSet { receiver, .. } => *receiver,
            _ => false,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self, Operation::Constructor { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Operation::Literal { .. })
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self, Operation::Literal { value: Value::Null, .. })
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match self {
            Operation::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Call the operation. Literals return their value without running anything.
    pub fn invoke(&self, inputs: &[Value]) -> Result<Value, Exception> {
        match self {
            Operation::Literal { value, .. } => Ok(value.clone()),
            Operation::Constructor { invoker, .. }
            | Operation::Method { invoker, .. }
            | Operation::FieldGet { invoker, .. }
            | Operation::FieldSet { invoker, .. } => invoker(inputs),
        }
    }

    /// Code form of a call given the variable names bound to its inputs.
    pub fn render(&self, inputs: &[String]) -> String {
        match self {
            Operation::Literal { value, ty } => match value.literal_code() {
                Some(code) if value.is_null() => format!("{} as {}", code, ty),
                Some(code) => code,
                None => format!("<{}>", ty),
            },
            Operation::Constructor { sig, .. } => {
                format!("{}::new({})", sig.name, inputs.join(", "))
            }
            Operation::Method { sig, receiver, .. } => {
                if *receiver && !inputs.is_empty() {
                    format!("{}.{}({})", inputs[0], sig.name, inputs[1..].join(", "))
                } else {
                    format!("{}::{}({})", sig.declaring, sig.name, inputs.join(", "))
                }
            }
            Operation::FieldGet { sig, receiver, .. } => match inputs.first() {
                Some(r) if *receiver => format!("{}.{}", r, sig.name),
                _ => format!("{}::{}", sig.declaring, sig.name),
            },
            Operation::FieldSet { sig, receiver, .. } => {
                if *receiver && inputs.len() >= 2 {
                    format!("{}.{} = {}", inputs[0], sig.name, inputs[1])
                } else {
                    format!(
                        "{}::{} = {}",
                        sig.declaring,
                        sig.name,
                        inputs.first().map(String::as_str).unwrap_or("?")
                    )
                }
            }
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Operation::Constructor { .. } => 0,
            Operation::Method { .. } => 1,
            Operation::FieldGet { .. } => 2,
            Operation::FieldSet { .. } => 3,
            Operation::Literal { .. } => 4,
        }
    }

    fn literal_key(&self) -> Option<LiteralKey> {
        self.literal_value().and_then(Value::literal_key)
    }
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        if self.tag() != other.tag() || self.has_receiver() != other.has_receiver() {
            return false;
        }
        match (self, other) {
            (Operation::Literal { ty: a, .. }, Operation::Literal { ty: b, .. }) => {
                a == b && self.literal_key() == other.literal_key()
            }
            _ => self.signature() == other.signature(),
        }
    }
}

impl Eq for Operation {}

impl Hash for Operation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag().hash(state);
        self.has_receiver().hash(state);
        match self {
            Operation::Literal { ty, .. } => {
                ty.hash(state);
                self.literal_key().hash(state);
            }
            _ => self.signature().hash(state),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Literal { ty, value } => write!(
                f,
                "{} : {}",
                value.literal_code().unwrap_or_else(|| "?".into()),
                ty
            ),
            _ => {
                write!(f, "{}(", self.qualified_name())?;
                for (i, t) in self.input_types().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", t)?;
                }
                write!(f, ") -> {}", self.output_type())
            }
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn counter() -> Type {
        Type::class("Counter")
    }

    fn strs(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_method_prepends_receiver() {
        let op = Operation::method(&counter(), "add", vec![Type::int()], Type::Void, |_| {
            Ok(Value::Unit)
        });
        assert_eq!(op.arity(), 2);
        assert_eq!(op.input_types()[0], counter());
        assert!(op.has_receiver());
        assert_eq!(op.qualified_name(), "Counter::add");
    }

    #[test]
    fn test_equality_ignores_closure() {
        let a = Operation::static_method(&counter(), "zero", vec![], Type::int(), |_| {
            Ok(Value::Int(0))
        });
        let b = Operation::static_method(&counter(), "zero", vec![], Type::int(), |_| {
            Ok(Value::Int(1))
        });
        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_literals_compare_by_value() {
        let a = Operation::literal(Type::int(), Value::Int(3));
        let b = Operation::literal(Type::int(), Value::Int(3));
        let c = Operation::literal(Type::int(), Value::Int(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(Operation::null_of(Type::Str), Operation::null_of(counter()));
    }

    #[test]
    fn test_invoke_literal_and_method() {
        let lit = Operation::literal(Type::Str, Value::str("hi"));
        assert_eq!(lit.invoke(&[]).unwrap().as_str(), Some("hi"));

        let neg = Operation::static_method(&counter(), "neg", vec![Type::int()], Type::int(), |v| {
            Ok(Value::Int(-v[0].as_int().unwrap_or(0)))
        });
        assert_eq!(neg.invoke(&[Value::Int(5)]).unwrap().as_int(), Some(-5));
    }

    #[test]
    fn test_render_forms() {
        let ctor = Operation::constructor(&counter(), vec![Type::int()], |_| Ok(Value::Unit));
        assert_eq!(ctor.render(&strs(&["v0"])), "Counter::new(v0)");

        let m = Operation::method(&counter(), "add", vec![Type::int()], Type::Void, |_| {
            Ok(Value::Unit)
        });
        assert_eq!(m.render(&strs(&["v1", "v0"])), "v1.add(v0)");

        let set = Operation::field_set(&counter(), "count", Type::int(), |_| Ok(Value::Unit));
        assert_eq!(set.render(&strs(&["v1", "v0"])), "v1.count = v0");

        let get = Operation::field_get(&counter(), "count", Type::int(), |_| Ok(Value::Unit));
        assert_eq!(get.render(&strs(&["v1"])), "v1.count");

        assert_eq!(Operation::null_of(counter()).render(&[]), "null as Counter");
        assert_eq!(
            Operation::literal(Type::char(), Value::Char('a')).render(&[]),
            "'a'"
        );
    }

    #[test]
    fn test_display_signature() {
        let m = Operation::method(&counter(), "get", vec![], Type::int(), |_| Ok(Value::Int(0)));
        assert_eq!(m.to_string(), "Counter::get(Counter) -> int");
    }
}
