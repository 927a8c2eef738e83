//! PatchPlan Core - declarative patch computation
//!
//! Given the last observed remote state of a resource and the desired plan,
//! this crate computes the minimal update request that converges the remote
//! resource to the plan. It provides:
//! - A canonical tree model with tri-state scalars (absent / null / value)
//! - Canonicalization of any `Serialize` value into that tree
//! - Path-suffix / path-prefix policies (ignore, include, force)
//! - Identity-based list reconciliation with whole-list emission
//! - Rehydration of the patch tree back into the request type
//!
//! ```
//! use patchplan_core::{patch_payload, PatchOptions};
//! use serde_json::json;
//!
//! let state = json!({"name": "c1", "paused": false});
//! let plan = json!({"name": "c1", "paused": true});
//! let patch = patch_payload(&state, &plan, &[PatchOptions::default()]).unwrap();
//! assert_eq!(patch, Some(json!({"paused": true})));
//! ```

pub mod canonical;
pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod patch;
pub mod path;
pub mod policy;
pub mod rehydrate;
pub mod tree;

// Used by the logging macros
pub use patchplan_core_types;

// Re-export commonly used types
pub use canonical::canonicalize;
pub use diff::{DiffOutcome, Differ};
pub use errors::{ExError, ExErrorKind, PatchError, Result};
pub use patch::{patch_payload, patch_payload_converted, patch_payload_no_changes, patch_trees};
pub use path::{FieldPath, PathPattern};
pub use policy::{FieldPolicy, ListIdentity, PatchOptions, PathPolicy};
pub use rehydrate::{is_zero_values, rehydrate, Rehydrated};
pub use tree::{Scalar, Tree};
