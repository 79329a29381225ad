// src/core/sequence.rs — Immutable call sequences

use std::fmt;
use std::sync::Arc;

use super::operation::Operation;
use super::types::Type;
use crate::infra::errors::{Result, SeqforgeError};

/// One operation applied to the outputs of earlier statements.
/// Inputs are absolute positions in the owning sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub operation: Arc<Operation>,
    pub inputs: Vec<usize>,
}

impl Statement {
    pub fn new(operation: Arc<Operation>, inputs: Vec<usize>) -> Self {
        Self { operation, inputs }
    }

    pub fn output_type(&self) -> &Type {
        self.operation.output_type()
    }
}

/// An ordered list of statements where every input refers strictly
/// backward. Never mutated after construction; equality and hashing are
/// structural.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    statements: Arc<[Statement]>,
}

impl Sequence {
    pub fn empty() -> Self {
        Self {
            statements: Arc::from(Vec::new()),
        }
    }

    /// Wrap statements without validation. Callers guarantee the invariants.
    pub(crate) fn from_vec_unchecked(statements: Vec<Statement>) -> Self {
        Self {
            statements: Arc::from(statements),
        }
    }

    /// Build from raw statements, validating every invariant.
    pub fn from_statements(statements: Vec<Statement>) -> Result<Self> {
        let seq = Self::from_vec_unchecked(statements);
        seq.check_rep()?;
        Ok(seq)
    }

    /// A one-statement sequence holding a nullary operation (typically a literal).
    pub fn of(operation: Arc<Operation>) -> Result<Self> {
        Self::empty().extend(operation, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn statement(&self, position: usize) -> Option<&Statement> {
        self.statements.get(position)
    }

    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }

    pub fn output_type(&self, position: usize) -> Option<&Type> {
        self.statements.get(position).map(Statement::output_type)
    }

    /// The type of the last statement's value, if it produces one.
    pub fn active_type(&self) -> Option<&Type> {
        self.last()
            .map(Statement::output_type)
            .filter(|t| !t.is_void())
    }

    pub fn ends_in_null_literal(&self) -> bool {
        self.last()
            .map(|s| s.operation.is_null_literal())
            .unwrap_or(false)
    }

    /// Validate one statement as if it were appended at `position`.
    fn validate_statement(&self, position: usize, operation: &Operation, inputs: &[usize]) -> Result<()> {
        if inputs.len() != operation.arity() {
            return Err(SeqforgeError::ArityMismatch {
                operation: operation.qualified_name(),
                expected: operation.arity(),
                actual: inputs.len(),
            });
        }
        for (slot, (&input, expected)) in inputs.iter().zip(operation.input_types()).enumerate() {
            if input >= position {
                return Err(SeqforgeError::ForwardReference { position, input });
            }
            let actual = self
                .output_type(input)
                .ok_or(SeqforgeError::PositionOutOfRange {
                    position: input,
                    len: self.len(),
                })?;
            if actual.is_void() {
                return Err(SeqforgeError::VoidReference { position, input });
            }
            if !expected.is_assignable_from(actual) {
                return Err(SeqforgeError::TypeMismatch {
                    operation: operation.qualified_name(),
                    slot,
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate every structural invariant.
    pub fn check_rep(&self) -> Result<()> {
        for (position, stmt) in self.statements.iter().enumerate() {
            self.validate_statement(position, &stmt.operation, &stmt.inputs)?;
        }
        Ok(())
    }

    /// Append one statement whose inputs are positions in `self`.
    pub fn extend(&self, operation: Arc<Operation>, inputs: Vec<usize>) -> Result<Sequence> {
        self.validate_statement(self.len(), &operation, &inputs)?;
        let mut statements = self.statements.to_vec();
        statements.push(Statement::new(operation, inputs));
        Ok(Self::from_vec_unchecked(statements))
    }

    /// Concatenate sequences, rebasing each one's positions by the length
    /// of everything before it.
    pub fn concatenate(sequences: &[Sequence]) -> Sequence {
        let total = sequences.iter().map(Sequence::len).sum();
        let mut statements = Vec::with_capacity(total);
        for seq in sequences {
            let offset = statements.len();
            statements.extend(seq.statements.iter().map(|s| Statement {
                operation: s.operation.clone(),
                inputs: s.inputs.iter().map(|i| i + offset).collect(),
            }));
        }
        Self::from_vec_unchecked(statements)
    }

    /// Concatenate `inputs` and append `operation`, wiring slot `k` to the
    /// last statement of `inputs[k]`.
    pub fn extend_with(operation: Arc<Operation>, inputs: &[Sequence]) -> Result<Sequence> {
        if inputs.len() != operation.arity() {
            return Err(SeqforgeError::ArityMismatch {
                operation: operation.qualified_name(),
                expected: operation.arity(),
                actual: inputs.len(),
            });
        }
        let mut positions = Vec::with_capacity(inputs.len());
        let mut offset = 0;
        for seq in inputs {
            if seq.is_empty() {
                return Err(SeqforgeError::EmptySequence);
            }
            offset += seq.len();
            positions.push(offset - 1);
        }
        Self::concatenate(inputs).extend(operation, positions)
    }

    /// A structurally identical, independently owned sequence.
    pub fn copy(&self) -> Sequence {
        Self::from_vec_unchecked(self.statements.to_vec())
    }

    pub fn var_name(position: usize) -> String {
        format!("v{}", position)
    }

    /// One line of code per statement.
    pub fn to_code(&self) -> Vec<String> {
        self.statements
            .iter()
            .enumerate()
            .map(|(i, stmt)| {
                let args: Vec<String> = stmt.inputs.iter().map(|&p| Self::var_name(p)).collect();
                let call = stmt.operation.render(&args);
                if stmt.output_type().is_void() {
                    format!("{};", call)
                } else {
                    format!("let {} = {};", Self::var_name(i), call)
                }
            })
            .collect()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.to_code()).finish()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_code() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Value;

    fn stack() -> Type {
        Type::class("Stack")
    }

    fn new_stack() -> Arc<Operation> {
        Arc::new(Operation::constructor(&stack(), vec![], |_| Ok(Value::Unit)))
    }

    fn push() -> Arc<Operation> {
        Arc::new(Operation::method(&stack(), "push", vec![Type::int()], Type::Void, |_| {
            Ok(Value::Unit)
        }))
    }

    fn int(i: i64) -> Sequence {
        Sequence::of(Arc::new(Operation::literal(Type::int(), Value::Int(i)))).unwrap()
    }

    #[test]
    fn test_extend_with_wires_tails() {
        let s = Sequence::extend_with(new_stack(), &[]).unwrap();
        let seq = Sequence::extend_with(push(), &[s, int(7)]).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.last().unwrap().inputs, vec![0, 1]);
        assert!(seq.check_rep().is_ok());
        assert!(seq.active_type().is_none());
    }

    #[test]
    fn test_arity_mismatch() {
        let s = Sequence::extend_with(new_stack(), &[]).unwrap();
        let err = Sequence::extend_with(push(), &[s]).unwrap_err();
        assert!(matches!(err, SeqforgeError::ArityMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = Sequence::extend_with(push(), &[int(1), int(2)]).unwrap_err();
        assert!(matches!(err, SeqforgeError::TypeMismatch { slot: 0, .. }));
    }

    #[test]
    fn test_void_reference_rejected() {
        let s = Sequence::extend_with(new_stack(), &[]).unwrap();
        let pushed = Sequence::extend_with(push(), &[s, int(1)]).unwrap();
        let err = pushed.extend(push(), vec![2, 1]).unwrap_err();
        assert!(matches!(err, SeqforgeError::VoidReference { position: 3, input: 2 }));
    }

    #[test]
    fn test_forward_reference_rejected() {
        let bad = Sequence::from_vec_unchecked(vec![
            Statement::new(push(), vec![1, 1]),
            Statement::new(new_stack(), vec![]),
        ]);
        assert!(matches!(
            bad.check_rep(),
            Err(SeqforgeError::ForwardReference { position: 0, input: 1 })
        ));
    }

    #[test]
    fn test_concatenate_rebases() {
        let a = Sequence::extend_with(push(), &[Sequence::of(new_stack()).unwrap(), int(1)]).unwrap();
        let b = a.clone();
        let joined = Sequence::concatenate(&[a, b]);
        assert_eq!(joined.len(), 6);
        assert_eq!(joined.statement(5).unwrap().inputs, vec![3, 4]);
        assert!(joined.check_rep().is_ok());
    }

    #[test]
    fn test_copy_is_equal() {
        let s = Sequence::extend_with(push(), &[Sequence::of(new_stack()).unwrap(), int(3)]).unwrap();
        let c = s.copy();
        assert_eq!(s, c);
    }

    #[test]
    fn test_to_code() {
        let s = Sequence::extend_with(push(), &[Sequence::of(new_stack()).unwrap(), int(3)]).unwrap();
        assert_eq!(
            s.to_code(),
            vec!["let v0 = Stack::new();", "let v1 = 3;", "v0.push(v1);"]
        );
    }
}
