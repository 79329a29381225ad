// src/core/pool.rs — Type-indexed store of reusable sequences

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::operation::Operation;
use super::sequence::Sequence;
use super::types::{Type, Value};

/// How `sample` picks among compatible sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Weight `1 / len²`: short sequences are picked far more often.
    #[default]
    SizeBiased,
    Uniform,
}

/// Sequences known to execute normally, filed by the type of their last
/// value and every supertype of it. Only grows.
#[derive(Debug, Default)]
pub struct ComponentPool {
    by_type: BTreeMap<Type, Vec<Sequence>>,
    all: HashSet<Sequence>,
    policy: SelectionPolicy,
}

impl ComponentPool {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Pool pre-loaded with `default_seeds()`.
    pub fn with_default_seeds(policy: SelectionPolicy) -> Self {
        let mut pool = Self::new(policy);
        pool.seed(default_seeds());
        pool
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Number of distinct sequences held.
    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn contains(&self, seq: &Sequence) -> bool {
        self.all.contains(seq)
    }

    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.by_type.keys()
    }

    pub fn sequences_for(&self, ty: &Type) -> &[Sequence] {
        self.by_type.get(ty).map(Vec::as_slice).unwrap_or(&[])
    }

    /// File `seq` under its active type and that type's supertypes.
    /// Returns false for duplicates and for sequences with no usable value.
    pub fn add(&mut self, seq: Sequence) -> bool {
        let Some(ty) = seq.active_type().cloned() else {
            return false;
        };
        if self.all.contains(&seq) {
            return false;
        }
        for key in std::iter::once(ty.clone()).chain(ty.supertypes()) {
            self.by_type.entry(key).or_default().push(seq.clone());
        }
        self.all.insert(seq);
        true
    }

    /// Add every sequence; returns how many were new.
    pub fn seed(&mut self, sequences: impl IntoIterator<Item = Sequence>) -> usize {
        sequences.into_iter().filter(|s| self.add(s.clone())).count()
    }

    fn candidates(&self, ty: &Type, receiver_only: bool) -> Vec<&Sequence> {
        if receiver_only && !ty.is_receiver_type() {
            return Vec::new();
        }
        let usable = |s: &&Sequence| !(receiver_only && s.ends_in_null_literal());

        let exact: Vec<&Sequence> = self.sequences_for(ty).iter().filter(usable).collect();
        if !exact.is_empty() {
            return exact;
        }
        // No direct entry (e.g. a covariant array type): scan assignable keys.
        let mut seen = HashSet::new();
        self.by_type
            .iter()
            .filter(|(key, _)| ty.is_assignable_from(key))
            .flat_map(|(_, seqs)| seqs.iter())
            .filter(usable)
            .filter(|s| seen.insert(*s))
            .collect()
    }

    pub fn has_candidates(&self, ty: &Type, receiver_only: bool) -> bool {
        !self.candidates(ty, receiver_only).is_empty()
    }

    /// Pick one sequence whose value can be used as `ty`. `receiver_only`
    /// excludes null literals and non-receiver types.
    pub fn sample<R: Rng + ?Sized>(&self, ty: &Type, receiver_only: bool, rng: &mut R) -> Option<Sequence> {
        let candidates = self.candidates(ty, receiver_only);
        if candidates.is_empty() {
            return None;
        }
        let index = match self.policy {
            SelectionPolicy::Uniform => rng.gen_range(0..candidates.len()),
            SelectionPolicy::SizeBiased => {
                let weights = candidates.iter().map(|s| {
                    let len = s.len().max(1) as f64;
                    1.0 / (len * len)
                });
                match WeightedIndex::new(weights) {
                    Ok(dist) => dist.sample(rng),
                    Err(_) => rng.gen_range(0..candidates.len()),
                }
            }
        };
        Some(candidates[index].clone())
    }

    /// Could every input slot of `op` be filled right now? Reference slots
    /// other than the receiver may fall back to `null` when `allow_null`.
    pub fn can_satisfy(&self, op: &Operation, allow_null: bool) -> bool {
        op.input_types().iter().enumerate().all(|(slot, ty)| {
            let receiver = slot == 0 && op.has_receiver();
            self.has_candidates(ty, receiver) || (!receiver && allow_null && ty.is_reference())
        })
    }
}

/// Literal sequences every run starts from.
pub fn default_seeds() -> Vec<Sequence> {
    let literals = [
        (Type::int(), Value::Int(0)),
        (Type::int(), Value::Int(1)),
        (Type::int(), Value::Int(-1)),
        (Type::Str, Value::str("")),
        (Type::Str, Value::str("hi")),
        (Type::bool(), Value::Bool(true)),
        (Type::bool(), Value::Bool(false)),
        (Type::char(), Value::Char('a')),
        (Type::float(), Value::Float(0.0)),
    ];
    literals
        .into_iter()
        .filter_map(|(ty, value)| Sequence::of(Arc::new(Operation::literal(ty, value))).ok())
        .collect()
}

/// A pool shared between callers; `add` and `sample` are serialized.
#[derive(Debug, Clone, Default)]
pub struct SharedPool {
    inner: Arc<Mutex<ComponentPool>>,
}

impl SharedPool {
    pub fn new(pool: ComponentPool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ComponentPool> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self, seq: Sequence) -> bool {
        self.lock().add(seq)
    }

    pub fn sample<R: Rng + ?Sized>(&self, ty: &Type, receiver_only: bool, rng: &mut R) -> Option<Sequence> {
        self.lock().sample(ty, receiver_only, rng)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `f` with exclusive access to the pool.
    pub fn with<T>(&self, f: impl FnOnce(&mut ComponentPool) -> T) -> T {
        f(&mut self.lock())
    }
}
