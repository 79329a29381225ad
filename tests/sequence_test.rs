// tests/sequence_test.rs — Integration test: sequence model and slicing

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use seqforge::core::operation::Operation;
use seqforge::core::sequence::Sequence;
use seqforge::core::types::{Type, Value};
use seqforge::infra::errors::SeqforgeError;

fn lit(i: i64) -> Arc<Operation> {
    Arc::new(Operation::literal(Type::int(), Value::Int(i)))
}

fn add() -> Arc<Operation> {
    Arc::new(Operation::static_method(
        &Type::class("Math"),
        "add",
        vec![Type::int(), Type::int()],
        Type::int(),
        |v| Ok(Value::Int(v[0].as_int().unwrap_or(0) + v[1].as_int().unwrap_or(0))),
    ))
}

/// Build a sequence from a recipe: `None` appends a literal, `Some((a, b))`
/// appends `add` over two earlier positions (taken modulo the length).
fn build(recipe: &[Option<(usize, usize)>]) -> Sequence {
    let mut seq = Sequence::empty();
    for (i, step) in recipe.iter().enumerate() {
        seq = match step {
            Some((a, b)) if i > 0 => seq.extend(add(), vec![a % i, b % i]).unwrap(),
            _ => seq.extend(lit(i as i64), vec![]).unwrap(),
        };
    }
    seq
}

fn recipe() -> impl Strategy<Value = Vec<Option<(usize, usize)>>> {
    prop::collection::vec(prop::option::of((0usize..64, 0usize..64)), 1..24)
}

#[test]
fn test_slice_keeps_only_dependencies() {
    // 1: a = 0; 2: b = 1; 3: c = 2; 4: d = b + b; 5: e = a + c
    let seq = build(&[None, None, None, Some((1, 1)), Some((0, 2))]);
    assert_eq!(seq.len(), 5);
    let slice = seq.influencing_slice(4).unwrap();
    assert_eq!(slice, BTreeSet::from([0, 2, 4]));

    let (focused, mapping) = seq.retain(&slice).unwrap();
    assert_eq!(
        focused.to_code(),
        vec!["let v0 = 0;", "let v1 = 2;", "let v2 = Math::add(v0, v1);"]
    );
    assert_eq!(mapping, vec![Some(0), None, Some(1), None, Some(2)]);
}

#[test]
fn test_slice_includes_users() {
    let seq = build(&[None, None, Some((0, 1)), Some((2, 2)), None]);
    let slice = seq.influencing_slice(2).unwrap();
    assert_eq!(slice, BTreeSet::from([0, 1, 2, 3]));
}

#[test]
fn test_out_of_range_position() {
    let seq = build(&[None, None]);
    assert!(matches!(
        seq.influencing_slice(2),
        Err(SeqforgeError::PositionOutOfRange { position: 2, len: 2 })
    ));
}

#[test]
fn test_forward_reference_rejected() {
    let seq = build(&[None]);
    let err = seq.extend(add(), vec![0, 1]).unwrap_err();
    assert!(matches!(err, SeqforgeError::ForwardReference { position: 1, input: 1 }));
}

proptest! {
    #[test]
    fn built_sequences_are_well_formed(r in recipe()) {
        let seq = build(&r);
        prop_assert_eq!(seq.len(), r.len());
        prop_assert!(seq.check_rep().is_ok());
    }

    #[test]
    fn slice_contains_position_and_its_producers(r in recipe(), pick in 0usize..64) {
        let seq = build(&r);
        let pos = pick % seq.len();
        let slice = seq.influencing_slice(pos).unwrap();
        prop_assert!(slice.contains(&pos));
        for &p in &slice {
            if p <= pos {
                continue;
            }
            // Every later member uses some earlier member.
            let inputs = &seq.statement(p).unwrap().inputs;
            prop_assert!(inputs.iter().any(|i| slice.contains(i)));
        }
        for &i in &seq.statement(pos).unwrap().inputs {
            prop_assert!(slice.contains(&i));
        }
    }

    #[test]
    fn retain_is_well_formed_and_order_preserving(r in recipe(), pick in 0usize..64) {
        let seq = build(&r);
        let pos = pick % seq.len();
        let slice = seq.influencing_slice(pos).unwrap();
        let (kept, mapping) = seq.retain(&slice).unwrap();
        prop_assert!(kept.check_rep().is_ok());
        prop_assert!(kept.len() >= slice.len());
        let mapped: Vec<usize> = mapping.iter().flatten().copied().collect();
        prop_assert_eq!(mapped, (0..kept.len()).collect::<Vec<_>>());
    }

    #[test]
    fn insert_at_preserves_invariants(a in recipe(), b in recipe(), at in 0usize..64) {
        let host = build(&a);
        let guest = build(&b);
        let index = at % (host.len() + 1);
        let (merged, positions) = host.insert_at(index, &guest).unwrap();
        prop_assert_eq!(merged.len(), host.len() + guest.len());
        prop_assert!(merged.check_rep().is_ok());
        prop_assert_eq!(positions, (index..index + guest.len()).collect::<Vec<_>>());
    }

    #[test]
    fn concatenate_adds_lengths(a in recipe(), b in recipe()) {
        let x = build(&a);
        let y = build(&b);
        let joined = Sequence::concatenate(&[x.clone(), y.clone()]);
        prop_assert_eq!(joined.len(), x.len() + y.len());
        prop_assert!(joined.check_rep().is_ok());
        prop_assert_eq!(&joined.to_code()[..x.len()], &x.to_code()[..]);
    }
}
