//! List reconciler: pairs state and plan list elements by identity.
//!
//! Elements are matched in three passes over the plan, each one only
//! considering state elements no earlier pass has claimed, first match in
//! state order wins:
//!
//! 1. plan elements carrying the identifier field match the state element
//!    with an equal identifier, or are new;
//! 2. plan elements with no identifier but at least one natural key match
//!    the first state element whose shared natural keys are all equal, or
//!    are new;
//! 3. plan elements with no identity at all take the first unclaimed state
//!    element, or are new.
//!
//! Pairs come back in plan order. State elements nobody claimed are
//! reported in `unmatched_state` and are not part of the pairing.

use crate::diff::model::ListPair;
use crate::policy::ListIdentity;
use crate::tree::{Scalar, Tree};

/// Output of [`reconcile`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<'a> {
    pub pairs: Vec<ListPair<'a>>,
    /// Indices into the state list of elements no plan element matched
    pub unmatched_state: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Matched(usize),
    New,
}

/// A key value the element actually carries (absent and null do not count).
fn key<'a>(element: &'a Tree, field: &str) -> Option<&'a Tree> {
    match element.get(field) {
        Tree::Scalar(Scalar::Absent | Scalar::Null) => None,
        value => Some(value),
    }
}

fn natural_keys_agree(state: &Tree, plan_keys: &[(&str, &Tree)]) -> bool {
    let mut compared = 0;
    for (field, plan_value) in plan_keys {
        if let Some(state_value) = key(state, field) {
            if state_value != *plan_value {
                return false;
            }
            compared += 1;
        }
    }
    compared > 0
}

fn claim(taken: &mut [bool], found: Option<usize>) -> Slot {
    match found {
        Some(si) => {
            taken[si] = true;
            Slot::Matched(si)
        }
        None => Slot::New,
    }
}

/// Pair `plan` elements with `state` elements.
pub fn reconcile<'a>(
    state: &'a [Tree],
    plan: &'a [Tree],
    identity: &ListIdentity,
) -> Reconciliation<'a> {
    let mut taken = vec![false; state.len()];
    let mut slots: Vec<Option<Slot>> = vec![None; plan.len()];

    // Pass 1: explicit identifier
    for (pi, p) in plan.iter().enumerate() {
        let Some(id) = key(p, &identity.id_field) else {
            continue;
        };
        let found = (0..state.len())
            .find(|&si| !taken[si] && key(&state[si], &identity.id_field) == Some(id));
        slots[pi] = Some(claim(&mut taken, found));
    }

    // Pass 2: natural keys
    for (pi, p) in plan.iter().enumerate() {
        if slots[pi].is_some() {
            continue;
        }
        let plan_keys: Vec<(&str, &Tree)> = identity
            .natural_keys
            .iter()
            .filter_map(|field| key(p, field).map(|value| (field.as_str(), value)))
            .collect();
        if plan_keys.is_empty() {
            continue;
        }
        let found = (0..state.len())
            .find(|&si| !taken[si] && natural_keys_agree(&state[si], &plan_keys));
        slots[pi] = Some(claim(&mut taken, found));
    }

    // Pass 3: no identity at all
    for slot in slots.iter_mut().filter(|slot| slot.is_none()) {
        let found = (0..state.len()).find(|&si| !taken[si]);
        *slot = Some(claim(&mut taken, found));
    }

    let pairs = plan
        .iter()
        .zip(slots)
        .map(|(p, slot)| match slot {
            Some(Slot::Matched(si)) => ListPair::Matched {
                state: &state[si],
                plan: p,
            },
            _ => ListPair::New { plan: p },
        })
        .collect();

    let unmatched_state = taken
        .iter()
        .enumerate()
        .filter(|(_, t)| !**t)
        .map(|(si, _)| si)
        .collect();

    Reconciliation {
        pairs,
        unmatched_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(fields: &[(&str, &str)]) -> Tree {
        Tree::Object(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), Scalar::String(v.to_string()).into()))
                .collect(),
        )
    }

    fn matched_state<'a>(pair: &ListPair<'a>) -> Option<&'a Tree> {
        match pair {
            ListPair::Matched { state, .. } => Some(*state),
            ListPair::New { .. } => None,
        }
    }

    #[test]
    fn test_match_by_id_regardless_of_position() {
        let state = vec![spec(&[("id", "a")]), spec(&[("id", "b")])];
        let plan = vec![spec(&[("id", "b")]), spec(&[("id", "a")])];
        let rec = reconcile(&state, &plan, &ListIdentity::default());
        assert_eq!(matched_state(&rec.pairs[0]), Some(&state[1]));
        assert_eq!(matched_state(&rec.pairs[1]), Some(&state[0]));
        assert!(rec.unmatched_state.is_empty());
    }

    #[test]
    fn test_unknown_id_is_new() {
        let state = vec![spec(&[("id", "a")])];
        let plan = vec![spec(&[("id", "zzz")])];
        let rec = reconcile(&state, &plan, &ListIdentity::default());
        assert!(matches!(rec.pairs[0], ListPair::New { .. }));
        assert_eq!(rec.unmatched_state, vec![0]);
    }

    #[test]
    fn test_keyless_plan_takes_first_unclaimed_state() {
        let state = vec![spec(&[("id", "a"), ("zoneName", "old")])];
        let plan = vec![spec(&[("zoneName", "new")]), spec(&[("zoneName", "second")])];
        let rec = reconcile(&state, &plan, &ListIdentity::default());
        assert_eq!(matched_state(&rec.pairs[0]), Some(&state[0]));
        assert!(matches!(rec.pairs[1], ListPair::New { .. }));
    }

    #[test]
    fn test_id_match_is_not_stolen_by_keyless_element() {
        let state = vec![spec(&[("id", "a")]), spec(&[("id", "b")])];
        let plan = vec![spec(&[("name", "x")]), spec(&[("id", "a")])];
        let rec = reconcile(&state, &plan, &ListIdentity::default());
        assert_eq!(matched_state(&rec.pairs[0]), Some(&state[1]));
        assert_eq!(matched_state(&rec.pairs[1]), Some(&state[0]));
    }

    #[test]
    fn test_natural_key_fallback() {
        let identity = ListIdentity::default().with_natural_keys(["zoneName"]);
        let state = vec![
            spec(&[("id", "a"), ("zoneName", "east")]),
            spec(&[("id", "b"), ("zoneName", "west")]),
        ];
        let plan = vec![spec(&[("zoneName", "west")]), spec(&[("zoneName", "north")])];
        let rec = reconcile(&state, &plan, &identity);
        assert_eq!(matched_state(&rec.pairs[0]), Some(&state[1]));
        assert!(matches!(rec.pairs[1], ListPair::New { .. }));
        assert_eq!(rec.unmatched_state, vec![0]);
    }

    #[test]
    fn test_natural_keys_compared_only_when_both_sides_carry_them() {
        let identity = ListIdentity::default().with_natural_keys(["zoneId", "zoneName"]);
        let state = vec![spec(&[("zoneId", "z1"), ("zoneName", "east")])];
        let plan = vec![spec(&[("zoneName", "east")])];
        let rec = reconcile(&state, &plan, &identity);
        assert_eq!(matched_state(&rec.pairs[0]), Some(&state[0]));
    }

    #[test]
    fn test_unmatched_state_reported() {
        let state = vec![spec(&[("id", "a")]), spec(&[("id", "b")])];
        let plan = vec![spec(&[("id", "a")])];
        let rec = reconcile(&state, &plan, &ListIdentity::default());
        assert_eq!(rec.pairs.len(), 1);
        assert_eq!(rec.unmatched_state, vec![1]);
    }
}
