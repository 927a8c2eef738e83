//! Patch computation engine.
//!
//! Compares the canonical tree of the last observed remote state with the
//! canonical tree of the desired plan and produces the tree of what must be
//! sent to converge.
//!
//! ## Entry point
//!
//! ```
//! use patchplan_core::diff::Differ;
//! use patchplan_core::policy::PathPolicy;
//! use patchplan_core::canonical::canonicalize;
//! use serde_json::json;
//!
//! let policy = PathPolicy::new(&[]).unwrap();
//! let state = canonicalize(&json!({"name": "a", "paused": false})).unwrap();
//! let plan = canonicalize(&json!({"name": "b"})).unwrap();
//! let outcome = Differ::new(&policy).diff(&state, &plan);
//! assert!(outcome.changed);
//! assert_eq!(outcome.patch.into_json(), json!({"name": "b"}));
//! ```
//!
//! ## Guarantees
//!
//! - **Flat objects**: plain nested objects carry only changed fields.
//! - **Whole lists**: a list is either absent from the patch or sent in
//!   full, every element reconstructed.
//! - **Idempotence**: without force rules, diffing a tree against itself
//!   never reports a change.

pub mod engine;
pub mod model;
pub mod reconcile;

pub use engine::Differ;
pub use model::{DiffOutcome, ListPair};
pub use reconcile::{reconcile, Reconciliation};
