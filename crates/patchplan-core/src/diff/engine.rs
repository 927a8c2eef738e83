//! Differ: recursive comparison of canonical trees.
//!
//! Two comparison modes are used:
//!
//! - plain objects (the resource itself and nested records outside lists)
//!   are diffed flat: the patch holds only fields that changed;
//! - list elements are merged: when anything in a list changes, every
//!   element is sent whole, state overlaid with plan.
//!
//! Comparison always runs against the policy-adjusted state, see
//! [`PathPolicy::effective_state`].

use crate::diff::model::{DiffOutcome, ListPair};
use crate::diff::reconcile::reconcile;
use crate::path::FieldPath;
use crate::policy::{FieldPolicy, PathPolicy};
use crate::tree::{Scalar, Tree};
use std::collections::{BTreeMap, BTreeSet};

static NO_FIELDS: BTreeMap<String, Tree> = BTreeMap::new();

/// Stateless differ bound to one compiled policy.
#[derive(Debug, Clone, Copy)]
pub struct Differ<'p> {
    policy: &'p PathPolicy,
}

/// Fields of an object; an absent node reads as an object with no fields.
fn fields_of(node: &Tree) -> Option<&BTreeMap<String, Tree>> {
    match node {
        Tree::Object(fields) => Some(fields),
        Tree::Scalar(Scalar::Absent) => Some(&NO_FIELDS),
        _ => None,
    }
}

fn field_names<'t>(
    state: &'t BTreeMap<String, Tree>,
    plan: &'t BTreeMap<String, Tree>,
) -> BTreeSet<&'t String> {
    state.keys().chain(plan.keys()).collect()
}

fn field<'t>(fields: &'t BTreeMap<String, Tree>, name: &str) -> &'t Tree {
    fields.get(name).unwrap_or(&Tree::ABSENT)
}

impl<'p> Differ<'p> {
    pub fn new(policy: &'p PathPolicy) -> Self {
        Self { policy }
    }

    /// Diff a raw state tree against a plan tree.
    ///
    /// The state is pruned by the policy first. An absent plan means "no
    /// changes", and so does a patch with no contribution at any depth
    /// (e.g. a forced object with no fields): empty objects are never sent.
    pub fn diff(&self, state: &Tree, plan: &Tree) -> DiffOutcome {
        let effective = self.policy.effective_state(state);
        let outcome = self.diff_node(&effective, plan, &FieldPath::root());
        if outcome.changed && outcome.patch.is_empty() {
            tracing::debug!(op = "diff", "patch has no contribution");
            return DiffOutcome::unchanged();
        }
        outcome
    }

    fn policy_at(&self, path: &FieldPath) -> FieldPolicy {
        if path.is_root() {
            FieldPolicy::COMPARE
        } else {
            self.policy.classify(path)
        }
    }

    /// Flat diff of one node against the effective state.
    fn diff_node(&self, state: &Tree, plan: &Tree, path: &FieldPath) -> DiffOutcome {
        let policy = self.policy_at(path);

        if plan.is_absent() {
            if policy.force_include && !state.is_absent() {
                tracing::debug!(op = "diff", path = %path, "forced from state");
                return DiffOutcome::changed(state.clone());
            }
            return DiffOutcome::unchanged();
        }

        match (state, plan) {
            (_, Tree::Object(plan_fields)) => match fields_of(state) {
                Some(state_fields) => self.diff_object(state_fields, plan_fields, path, policy),
                None => self.replaced(plan, path),
            },
            (Tree::List(state_items), Tree::List(plan_items)) => {
                self.diff_list(state_items, plan_items, path, policy)
            }
            (Tree::Scalar(_), Tree::Scalar(_)) => {
                if state != plan || policy.force_include {
                    tracing::debug!(op = "diff", path = %path, "value changed");
                    DiffOutcome::changed(plan.clone())
                } else {
                    DiffOutcome::unchanged()
                }
            }
            _ => self.replaced(plan, path),
        }
    }

    /// Shape differs between state and plan: send the plan as is.
    fn replaced(&self, plan: &Tree, path: &FieldPath) -> DiffOutcome {
        tracing::debug!(op = "diff", path = %path, "node replaced");
        DiffOutcome::changed(plan.clone())
    }

    fn diff_object(
        &self,
        state: &BTreeMap<String, Tree>,
        plan: &BTreeMap<String, Tree>,
        path: &FieldPath,
        policy: FieldPolicy,
    ) -> DiffOutcome {
        let mut patch = BTreeMap::new();
        for name in field_names(state, plan) {
            let outcome = self.diff_node(field(state, name), field(plan, name), &path.child(name));
            if outcome.changed {
                patch.insert(name.clone(), outcome.patch);
            }
        }
        if patch.is_empty() && !policy.force_include {
            return DiffOutcome::unchanged();
        }
        DiffOutcome::changed(Tree::Object(patch))
    }

    /// All-or-nothing list diff: either unchanged, or the full reconstructed list.
    fn diff_list(
        &self,
        state: &[Tree],
        plan: &[Tree],
        path: &FieldPath,
        policy: FieldPolicy,
    ) -> DiffOutcome {
        if !state.iter().chain(plan).all(Tree::is_object) {
            // Lists of scalars have no element identity; compare them whole.
            if state != plan || policy.force_include {
                tracing::debug!(op = "diff", path = %path, "list replaced");
                return DiffOutcome::changed(Tree::List(plan.to_vec()));
            }
            return DiffOutcome::unchanged();
        }

        let reconciliation = reconcile(state, plan, self.policy.identity_for(path));
        if !reconciliation.unmatched_state.is_empty() {
            tracing::debug!(
                op = "diff",
                path = %path,
                dropped = reconciliation.unmatched_state.len(),
                "state elements without a plan counterpart are not sent"
            );
        }

        let mut changed = state.len() != plan.len() || policy.force_include;
        let mut items = Vec::with_capacity(plan.len());
        for pair in reconciliation.pairs {
            match pair {
                ListPair::New { plan } => {
                    changed = true;
                    items.push(plan.clone());
                }
                ListPair::Matched { state, plan } => {
                    let merged = self.merge_node(state, plan, path);
                    changed |= merged.changed;
                    items.push(merged.patch);
                }
            }
        }

        if !changed {
            return DiffOutcome::unchanged();
        }
        tracing::debug!(op = "diff", path = %path, items = items.len(), "list rebuilt");
        DiffOutcome::changed(Tree::List(items))
    }

    /// Deep merge of a matched list element: every state field, overlaid by
    /// every plan field. The outcome's patch is the merged node (never
    /// absent unless both sides are); `changed` says whether the plan
    /// differs from the state anywhere beneath.
    fn merge_node(&self, state: &Tree, plan: &Tree, path: &FieldPath) -> DiffOutcome {
        let forced = self.policy_at(path).force_include;

        if plan.is_absent() {
            return DiffOutcome {
                patch: state.clone(),
                changed: forced && !state.is_absent(),
            };
        }

        match (state, plan) {
            (_, Tree::Object(plan_fields)) => match fields_of(state) {
                Some(state_fields) => {
                    let mut merged = BTreeMap::new();
                    let mut changed = forced;
                    for name in field_names(state_fields, plan_fields) {
                        let outcome = self.merge_node(
                            field(state_fields, name),
                            field(plan_fields, name),
                            &path.child(name),
                        );
                        changed |= outcome.changed;
                        if !outcome.patch.is_absent() {
                            merged.insert(name.clone(), outcome.patch);
                        }
                    }
                    DiffOutcome {
                        patch: Tree::Object(merged),
                        changed,
                    }
                }
                None => self.replaced(plan, path),
            },
            (Tree::List(state_items), Tree::List(plan_items)) => {
                let policy = self.policy_at(path);
                let outcome = self.diff_list(state_items, plan_items, path, policy);
                if outcome.changed {
                    outcome
                } else {
                    DiffOutcome {
                        patch: state.clone(),
                        changed: false,
                    }
                }
            }
            (Tree::Scalar(_), Tree::Scalar(_)) => DiffOutcome {
                patch: plan.clone(),
                changed: state != plan || forced,
            },
            _ => self.replaced(plan, path),
        }
    }
}
