//! Public patch API.
//!
//! Two calling conventions are offered:
//!
//! - [`patch_payload`] returns `Ok(None)` when there is nothing to send;
//! - [`patch_payload_no_changes`] returns a "no changes" flag and writes the
//!   patch into a caller-supplied value.
//!
//! Either way, an error means no patch: callers must not issue an update.

use crate::canonical::canonicalize;
use crate::diff::{DiffOutcome, Differ};
use crate::errors::{PatchError, Result};
use crate::policy::{PatchOptions, PathPolicy};
use crate::rehydrate::rehydrate;
use crate::tree::Tree;
use crate::{log_op_end, log_op_error, log_op_start};
use patchplan_core_types::schema::{
    OP_PATCH_PAYLOAD, OP_PATCH_PAYLOAD_CONVERTED, OP_PATCH_PAYLOAD_NO_CHANGES, OP_PATCH_TREES,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::time::Instant;

/// Run `f` between start and end/error events for `op`.
fn instrumented<T>(
    op: &'static str,
    f: impl FnOnce() -> Result<T>,
    changed: impl Fn(&T) -> bool,
) -> Result<T> {
    let started = Instant::now();
    log_op_start!(op);
    let result = f();
    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(value) => {
            log_op_end!(op, duration_ms = duration_ms, changed = changed(value));
        }
        Err(err) => {
            log_op_error!(op, err.clone(), duration_ms = duration_ms);
        }
    }
    result
}

fn compute(state: &Tree, plan: &Tree, options: &[PatchOptions]) -> Result<DiffOutcome> {
    let policy = PathPolicy::new(options)?;
    Ok(Differ::new(&policy).diff(state, plan))
}

fn compute_typed<S, P>(state: &S, plan: &P, options: &[PatchOptions]) -> Result<Option<P>>
where
    S: Serialize + ?Sized,
    P: Serialize + DeserializeOwned,
{
    let policy = PathPolicy::new(options)?;
    let state_tree = canonicalize(state)?;
    let plan_tree = canonicalize(plan)?;
    let Some(patch) = Differ::new(&policy).diff(&state_tree, &plan_tree).into_patch() else {
        return Ok(None);
    };
    let rehydrated = rehydrate::<P>(patch)?;
    if rehydrated.is_empty {
        return Ok(None);
    }
    Ok(Some(rehydrated.value))
}

/// Diff two canonical trees directly.
///
/// # Errors
///
/// Returns `PatchError::InvalidRule` for malformed options.
pub fn patch_trees(state: &Tree, plan: &Tree, options: &[PatchOptions]) -> Result<DiffOutcome> {
    instrumented(
        OP_PATCH_TREES,
        || compute(state, plan, options),
        |outcome| outcome.changed,
    )
}

/// Compute the request that converges `state` to `plan`.
///
/// `state` and `plan` may be different types (a stored model and the
/// request model); the patch has the plan's type. `Ok(None)` means no
/// changes, including when `plan` itself serializes to nothing (e.g. a
/// `None` plan).
///
/// # Errors
///
/// - `PatchError::InvalidRule`: malformed options
/// - `PatchError::UnsupportedKind`: a value cannot be canonicalized
/// - `PatchError::Rehydrate`: the patch does not fit `P`
pub fn patch_payload<S, P>(state: &S, plan: &P, options: &[PatchOptions]) -> Result<Option<P>>
where
    S: Serialize + ?Sized,
    P: Serialize + DeserializeOwned,
{
    instrumented(
        OP_PATCH_PAYLOAD,
        || compute_typed(state, plan, options),
        Option::is_some,
    )
}

/// Like [`patch_payload`], but reports "no changes" as a flag.
///
/// Returns `Ok(true)` and leaves `out` untouched when there is nothing to
/// send; otherwise writes the patch into `out` and returns `Ok(false)`.
///
/// # Errors
///
/// Same as [`patch_payload`]. On error `out` is untouched.
pub fn patch_payload_no_changes<S, P>(
    state: &S,
    plan: &P,
    out: &mut P,
    options: &[PatchOptions],
) -> Result<bool>
where
    S: Serialize + ?Sized,
    P: Serialize + DeserializeOwned,
{
    let patch = instrumented(
        OP_PATCH_PAYLOAD_NO_CHANGES,
        || compute_typed(state, plan, options),
        Option::is_some,
    )?;
    match patch {
        Some(patch) => {
            *out = patch;
            Ok(false)
        }
        None => Ok(true),
    }
}

/// Convert both models with `convert`, then compute the patch.
///
/// For callers whose state and plan live in a framework model that must be
/// turned into request types first.
///
/// # Errors
///
/// Returns `PatchError::Conversion` when `convert` fails for either model,
/// otherwise the same errors as [`patch_payload`].
pub fn patch_payload_converted<M, P, E, F>(
    state: &M,
    plan: &M,
    convert: F,
    options: &[PatchOptions],
) -> Result<Option<P>>
where
    P: Serialize + DeserializeOwned,
    F: Fn(&M) -> std::result::Result<P, E>,
    E: Display,
{
    let to_request = |model: &M| {
        convert(model).map_err(|e| PatchError::Conversion {
            message: e.to_string(),
        })
    };
    instrumented(
        OP_PATCH_PAYLOAD_CONVERTED,
        || {
            let state_req = to_request(state)?;
            let plan_req = to_request(plan)?;
            compute_typed(&state_req, &plan_req, options)
        },
        Option::is_some,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Args {
        #[serde(skip_serializing_if = "Option::is_none")]
        javascript_enabled: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        no_table_scan: Option<bool>,
    }

    #[test]
    fn test_mode_b_none_when_unchanged() {
        let state = Args {
            javascript_enabled: Some(true),
            no_table_scan: None,
        };
        assert_eq!(patch_payload(&state, &state.clone(), &[]).unwrap(), None);
    }

    #[test]
    fn test_mode_a_leaves_out_untouched() {
        let state = Args {
            javascript_enabled: Some(true),
            no_table_scan: None,
        };
        let mut out = Args::default();
        let no_changes = patch_payload_no_changes(&state, &Args::default(), &mut out, &[]).unwrap();
        assert!(no_changes);
        assert_eq!(out, Args::default());
    }

    #[test]
    fn test_invalid_rule_aborts() {
        let opts = [PatchOptions::default().ignore_in_state_suffix([""])];
        let err = patch_payload(&Args::default(), &Args::default(), &opts).unwrap_err();
        assert!(matches!(err, PatchError::InvalidRule { .. }));
    }

    #[test]
    fn test_patch_trees_on_json() {
        let state = canonicalize(&json!({"a": 1})).unwrap();
        let plan = canonicalize(&json!({"a": 2})).unwrap();
        let outcome = patch_trees(&state, &plan, &[]).unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.patch.into_json(), json!({"a": 2}));
    }

    #[test]
    fn test_converted_propagates_conversion_error() {
        let err = patch_payload_converted(
            &"state",
            &"plan",
            |model: &&str| -> std::result::Result<Args, String> {
                Err(format!("cannot convert {}", model))
            },
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, PatchError::Conversion { ref message } if message.contains("state")));
    }
}
