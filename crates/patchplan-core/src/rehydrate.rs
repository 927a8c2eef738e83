//! Rehydrator: [`Tree`] -> typed value.
//!
//! The tree is rendered to JSON (absent fields dropped) and handed to the
//! type's derived `Deserialize` impl, so every field the patch leaves out
//! stays at its unset representation. Resource types are expected to model
//! optional fields as `Option<_>`.

use crate::canonical::canonicalize;
use crate::errors::{PatchError, Result};
use crate::tree::Tree;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A typed patch plus the "nothing to send" signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Rehydrated<T> {
    pub value: T,
    /// True iff the patch tree had no contribution at any depth
    pub is_empty: bool,
}

/// Build a `T` holding exactly the fields present in `patch`.
///
/// # Errors
///
/// Returns `PatchError::Rehydrate` when the tree does not fit `T` (for
/// example a required, non-optional field is missing from the patch).
pub fn rehydrate<T>(patch: Tree) -> Result<Rehydrated<T>>
where
    T: DeserializeOwned,
{
    let is_empty = patch.is_empty();
    let value = serde_json::from_value(patch.into_json()).map_err(|e| PatchError::Rehydrate {
        message: e.to_string(),
    })?;
    Ok(Rehydrated { value, is_empty })
}

/// True iff `value` sets nothing at all.
///
/// # Errors
///
/// Propagates canonicalization errors.
pub fn is_zero_values<T>(value: &T) -> Result<bool>
where
    T: Serialize + ?Sized,
{
    Ok(canonicalize(value)?.is_empty())
}
