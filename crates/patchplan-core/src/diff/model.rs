//! Differ output types.

use crate::tree::Tree;

/// One entry of a reconciled list, in plan order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListPair<'a> {
    /// A plan element paired with the state element it converges
    Matched { state: &'a Tree, plan: &'a Tree },
    /// A plan element with no state counterpart
    New { plan: &'a Tree },
}

/// Result of diffing one node.
///
/// `patch` is only meaningful when `changed` is true; an unchanged outcome
/// carries an absent patch.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffOutcome {
    pub patch: Tree,
    pub changed: bool,
}

impl DiffOutcome {
    pub fn unchanged() -> Self {
        Self {
            patch: Tree::ABSENT,
            changed: false,
        }
    }

    pub fn changed(patch: Tree) -> Self {
        Self {
            patch,
            changed: true,
        }
    }

    /// The patch if anything changed.
    pub fn into_patch(self) -> Option<Tree> {
        self.changed.then_some(self.patch)
    }
}
