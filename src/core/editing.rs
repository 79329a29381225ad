// src/core/editing.rs — Structural edits and slicing over sequences

use std::collections::BTreeSet;

use super::sequence::{Sequence, Statement};
use crate::infra::errors::{Result, SeqforgeError};

impl Sequence {
    /// Splice `other` into a copy of this sequence before `index`.
    ///
    /// Returns the new sequence and, for each statement of `other`, its
    /// position in the result. Host statements at or after `index` move
    /// down by `other.len()`.
    pub fn insert_at(&self, index: usize, other: &Sequence) -> Result<(Sequence, Vec<usize>)> {
        if index > self.len() {
            return Err(SeqforgeError::PositionOutOfRange {
                position: index,
                len: self.len(),
            });
        }
        let shift = other.len();
        let host_pos = |p: usize| if p >= index { p + shift } else { p };

        let mut statements = Vec::with_capacity(self.len() + shift);
        statements.extend(self.statements()[..index].iter().cloned());
        statements.extend(other.statements().iter().map(|s| Statement {
            operation: s.operation.clone(),
            inputs: s.inputs.iter().map(|i| i + index).collect(),
        }));
        statements.extend(self.statements()[index..].iter().map(|s| Statement {
            operation: s.operation.clone(),
            inputs: s.inputs.iter().map(|&i| host_pos(i)).collect(),
        }));

        let substitution = (0..shift).map(|j| index + j).collect();
        Ok((Sequence::from_vec_unchecked(statements), substitution))
    }

    /// Every position that can influence or be influenced by the value at
    /// `position`: its producers (transitively), its users (transitively),
    /// and `position` itself.
    pub fn influencing_slice(&self, position: usize) -> Result<BTreeSet<usize>> {
        if position >= self.len() {
            return Err(SeqforgeError::PositionOutOfRange {
                position,
                len: self.len(),
            });
        }
        let mut slice = self.producer_closure(std::iter::once(position));

        let mut forward = BTreeSet::from([position]);
        for (i, stmt) in self.statements().iter().enumerate().skip(position + 1) {
            if stmt.inputs.iter().any(|p| forward.contains(p)) {
                forward.insert(i);
            }
        }
        slice.extend(forward);
        Ok(slice)
    }

    fn producer_closure(&self, roots: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = roots.into_iter().collect();
        while let Some(p) = stack.pop() {
            if !seen.insert(p) {
                continue;
            }
            if let Some(stmt) = self.statement(p) {
                stack.extend(stmt.inputs.iter().copied());
            }
        }
        seen
    }

    /// Project onto `positions` plus every producer they need.
    ///
    /// Returns the projected sequence and a map from old positions to new
    /// ones (`None` for dropped statements).
    pub fn retain(&self, positions: &BTreeSet<usize>) -> Result<(Sequence, Vec<Option<usize>>)> {
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.len()) {
            return Err(SeqforgeError::PositionOutOfRange {
                position: bad,
                len: self.len(),
            });
        }
        let keep = self.producer_closure(positions.iter().copied());

        let mut mapping = vec![None; self.len()];
        let mut statements = Vec::with_capacity(keep.len());
        for &old in &keep {
            let stmt = &self.statements()[old];
            let inputs = stmt
                .inputs
                .iter()
                .map(|&i| mapping[i].ok_or(SeqforgeError::ForwardReference { position: old, input: i }))
                .collect::<Result<Vec<_>>>()?;
            mapping[old] = Some(statements.len());
            statements.push(Statement::new(stmt.operation.clone(), inputs));
        }
        Ok((Sequence::from_vec_unchecked(statements), mapping))
    }
}
