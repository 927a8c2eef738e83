//! Path policy: ignore / include / force rules addressed by structural path.
//!
//! Rules come from caller options ([`PatchOptions`]) and are compiled once per
//! invocation into a [`PathPolicy`]. A rule that matches a node governs the
//! node's whole subtree until a deeper rule overrides it. When several rules
//! match the same node, Force beats Include-override, which beats Ignore.
//!
//! Ignoring a node means the differ sees the state's value there as absent.
//! The pruned state is produced by [`PathPolicy::effective_state`].

use crate::errors::{PatchError, Result};
use crate::path::{FieldPath, PathPattern};
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller-supplied rule set.
///
/// Every list holds dotted field-name patterns. Options deserialize from
/// configuration (TOML/JSON) with all fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchOptions {
    /// Treat the state's value as absent for nodes whose path ends with one of these
    pub ignore_in_state_suffix: Vec<String>,
    /// Treat the state's value as absent for any node named by one of these, and everything under it
    pub ignore_in_state_prefix: Vec<String>,
    /// Re-admit the state's value for nodes an ignore rule would suppress
    pub include_in_state_suffix: Vec<String>,
    /// Always include these fields in the patch, even when unchanged
    pub force_update_attr: Vec<String>,
    /// Identity fields used to match list elements, keyed by list path suffix
    pub list_identity: BTreeMap<String, ListIdentity>,
}

impl PatchOptions {
    pub fn ignore_in_state_suffix<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_in_state_suffix
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn ignore_in_state_prefix<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_in_state_prefix
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn include_in_state_suffix<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_in_state_suffix
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn force_update_attr<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_update_attr
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn list_identity(mut self, list: impl Into<String>, identity: ListIdentity) -> Self {
        self.list_identity.insert(list.into(), identity);
        self
    }
}

/// How elements of one list are matched between state and plan.
///
/// `id_field` is the explicit identifier; `natural_keys` are fallbacks
/// consulted, in order, when the plan element carries no identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListIdentity {
    pub id_field: String,
    pub natural_keys: Vec<String>,
}

impl Default for ListIdentity {
    fn default() -> Self {
        Self {
            id_field: "id".to_string(),
            natural_keys: Vec::new(),
        }
    }
}

impl ListIdentity {
    pub fn with_natural_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.natural_keys.extend(keys.into_iter().map(Into::into));
        self
    }
}

/// Decision for one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPolicy {
    /// False when the state's value must be treated as absent
    pub compare_against_state: bool,
    /// True when the node goes into the patch even if unchanged
    pub force_include: bool,
}

impl FieldPolicy {
    pub const COMPARE: FieldPolicy = FieldPolicy {
        compare_against_state: true,
        force_include: false,
    };
    pub const IGNORE: FieldPolicy = FieldPolicy {
        compare_against_state: false,
        force_include: false,
    };
    /// An include-override restores plain comparison under an ignored ancestor.
    pub const INCLUDE: FieldPolicy = FieldPolicy::COMPARE;
    pub const FORCE: FieldPolicy = FieldPolicy {
        compare_against_state: true,
        force_include: true,
    };
}

/// Compiled rule set for one invocation.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    ignore: Vec<PathPattern>,
    include: Vec<PathPattern>,
    force: Vec<PathPattern>,
    identities: Vec<(PathPattern, ListIdentity)>,
    default_identity: ListIdentity,
}

fn parse_all(rule: &str, raw: &[String], out: &mut Vec<PathPattern>) -> Result<()> {
    for pattern in raw {
        out.push(PathPattern::parse(rule, pattern)?);
    }
    Ok(())
}

fn validate_key(list: &str, key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(PatchError::InvalidRule {
            rule: "list_identity".to_string(),
            pattern: list.to_string(),
            reason: "identity field name is empty".to_string(),
        });
    }
    Ok(())
}

impl PathPolicy {
    /// Compile one or more option sets. Rule lists are concatenated; for list
    /// identities, later entries take precedence over earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidRule` for an empty or malformed pattern, or
    /// a list identity with an empty field name.
    pub fn new(options: &[PatchOptions]) -> Result<Self> {
        let mut policy = PathPolicy::default();
        for opts in options {
            parse_all(
                "ignore_in_state_suffix",
                &opts.ignore_in_state_suffix,
                &mut policy.ignore,
            )?;
            parse_all(
                "ignore_in_state_prefix",
                &opts.ignore_in_state_prefix,
                &mut policy.ignore,
            )?;
            parse_all(
                "include_in_state_suffix",
                &opts.include_in_state_suffix,
                &mut policy.include,
            )?;
            parse_all("force_update_attr", &opts.force_update_attr, &mut policy.force)?;
            for (list, identity) in &opts.list_identity {
                let pattern = PathPattern::parse("list_identity", list)?;
                validate_key(list, &identity.id_field)?;
                for key in &identity.natural_keys {
                    validate_key(list, key)?;
                }
                policy.identities.push((pattern, identity.clone()));
            }
        }
        Ok(policy)
    }

    /// Rule matching at exactly this node, ignoring ancestors.
    fn local(&self, segments: &[String]) -> Option<FieldPolicy> {
        let hits = |patterns: &[PathPattern]| {
            patterns
                .iter()
                .any(|p| segments.ends_with(p.segments()))
        };
        if hits(&self.force) {
            Some(FieldPolicy::FORCE)
        } else if hits(&self.include) {
            Some(FieldPolicy::INCLUDE)
        } else if hits(&self.ignore) {
            Some(FieldPolicy::IGNORE)
        } else {
            None
        }
    }

    /// Decide how the node at `path` takes part in the diff.
    ///
    /// The deepest rule on the path from the root to the node wins.
    pub fn classify(&self, path: &FieldPath) -> FieldPolicy {
        let segments = path.segments();
        (1..=segments.len())
            .rev()
            .find_map(|depth| self.local(&segments[..depth]))
            .unwrap_or(FieldPolicy::COMPARE)
    }

    /// Identity used to match the elements of the list at `path`.
    pub fn identity_for(&self, path: &FieldPath) -> &ListIdentity {
        self.identities
            .iter()
            .rev()
            .find(|(pattern, _)| path.ends_with(pattern))
            .map(|(_, identity)| identity)
            .unwrap_or(&self.default_identity)
    }

    /// The state as the differ should see it: ignored nodes removed, except
    /// what include-override rules re-admit.
    pub fn effective_state(&self, state: &Tree) -> Tree {
        self.prune(state, &FieldPath::root())
    }

    fn prune(&self, node: &Tree, path: &FieldPath) -> Tree {
        let ignored = !path.is_root() && !self.classify(path).compare_against_state;
        match node {
            Tree::Scalar(_) if ignored => Tree::ABSENT,
            Tree::Scalar(_) => node.clone(),
            Tree::Object(fields) => {
                let kept: BTreeMap<String, Tree> = fields
                    .iter()
                    .map(|(name, child)| (name.clone(), self.prune(child, &path.child(name))))
                    .filter(|(_, child)| !child.is_absent())
                    .collect();
                if ignored && kept.is_empty() {
                    Tree::ABSENT
                } else {
                    Tree::Object(kept)
                }
            }
            Tree::List(items) => {
                let kept: Vec<Tree> = items.iter().map(|item| self.prune(item, path)).collect();
                if !ignored {
                    return Tree::List(kept);
                }
                if kept.iter().all(Tree::is_absent) {
                    return Tree::ABSENT;
                }
                // Keep element positions when only some elements survive.
                Tree::List(
                    kept.into_iter()
                        .map(|item| if item.is_absent() { Tree::empty_object() } else { item })
                        .collect(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Scalar;

    fn path(dotted: &str) -> FieldPath {
        dotted.split('.').collect()
    }

    fn obj(fields: Vec<(&str, Tree)>) -> Tree {
        Tree::Object(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn int(i: i64) -> Tree {
        Scalar::Int(i).into()
    }

    #[test]
    fn test_default_compares_everything() {
        let policy = PathPolicy::new(&[]).unwrap();
        assert_eq!(policy.classify(&path("a.b.c")), FieldPolicy::COMPARE);
    }

    #[test]
    fn test_ignore_suffix_matches_at_any_depth() {
        let policy =
            PathPolicy::new(&[PatchOptions::default().ignore_in_state_suffix(["diskSizeGB"])])
                .unwrap();
        assert_eq!(
            policy.classify(&path("replicationSpecs.regionConfigs.electableSpecs.diskSizeGB")),
            FieldPolicy::IGNORE
        );
        assert_eq!(policy.classify(&path("diskSizeGB")), FieldPolicy::IGNORE);
        assert_eq!(
            policy.classify(&path("replicationSpecs.regionConfigs.electableSpecs.nodeCount")),
            FieldPolicy::COMPARE
        );
    }

    #[test]
    fn test_ignore_prefix_covers_subtree() {
        let policy =
            PathPolicy::new(&[PatchOptions::default().ignore_in_state_prefix(["regionConfigs"])])
                .unwrap();
        assert_eq!(
            policy.classify(&path("replicationSpecs.regionConfigs")),
            FieldPolicy::IGNORE
        );
        assert_eq!(
            policy.classify(&path("replicationSpecs.regionConfigs.electableSpecs.nodeCount")),
            FieldPolicy::IGNORE
        );
        assert_eq!(
            policy.classify(&path("replicationSpecs.zoneName")),
            FieldPolicy::COMPARE
        );
    }

    #[test]
    fn test_include_overrides_ignore() {
        let policy = PathPolicy::new(&[PatchOptions::default()
            .ignore_in_state_prefix(["regionConfigs"])
            .include_in_state_suffix(["diskIOPS"])])
        .unwrap();
        assert_eq!(
            policy.classify(&path("replicationSpecs.regionConfigs.electableSpecs.diskIOPS")),
            FieldPolicy::INCLUDE
        );
    }

    #[test]
    fn test_force_beats_include_and_ignore_on_same_node() {
        let policy = PathPolicy::new(&[PatchOptions::default()
            .ignore_in_state_suffix(["paused"])
            .include_in_state_suffix(["paused"])
            .force_update_attr(["paused"])])
        .unwrap();
        assert_eq!(policy.classify(&path("paused")), FieldPolicy::FORCE);
    }

    #[test]
    fn test_force_applies_to_subtree() {
        let policy =
            PathPolicy::new(&[PatchOptions::default().force_update_attr(["replicationSpecs"])])
                .unwrap();
        assert!(policy.classify(&path("replicationSpecs.zoneName")).force_include);
    }

    #[test]
    fn test_empty_pattern_fails_fast() {
        let err =
            PathPolicy::new(&[PatchOptions::default().force_update_attr([""])]).unwrap_err();
        assert!(matches!(err, PatchError::InvalidRule { ref rule, .. } if rule == "force_update_attr"));

        let bad_identity = PatchOptions::default().list_identity(
            "replicationSpecs",
            ListIdentity {
                id_field: " ".to_string(),
                natural_keys: vec![],
            },
        );
        assert!(PathPolicy::new(&[bad_identity]).is_err());
    }

    #[test]
    fn test_identity_lookup_later_entries_win() {
        let first = PatchOptions::default().list_identity(
            "replicationSpecs",
            ListIdentity::default().with_natural_keys(["zoneId"]),
        );
        let second = PatchOptions::default().list_identity(
            "replicationSpecs",
            ListIdentity::default().with_natural_keys(["zoneName"]),
        );
        let policy = PathPolicy::new(&[first, second]).unwrap();
        assert_eq!(
            policy.identity_for(&path("replicationSpecs")).natural_keys,
            vec!["zoneName".to_string()]
        );
        assert_eq!(
            policy.identity_for(&path("labels")),
            &ListIdentity::default()
        );
    }

    #[test]
    fn test_effective_state_drops_ignored_scalars() {
        let policy =
            PathPolicy::new(&[PatchOptions::default().ignore_in_state_suffix(["diskSizeGB"])])
                .unwrap();
        let state = obj(vec![("specs", obj(vec![("diskSizeGB", int(50)), ("nodeCount", int(3))]))]);
        assert_eq!(
            policy.effective_state(&state),
            obj(vec![("specs", obj(vec![("nodeCount", int(3))]))])
        );
    }

    #[test]
    fn test_effective_state_keeps_included_leaves_inside_ignored_list() {
        let policy = PathPolicy::new(&[PatchOptions::default()
            .ignore_in_state_prefix(["regionConfigs"])
            .include_in_state_suffix(["diskIOPS"])])
        .unwrap();
        let state = obj(vec![(
            "regionConfigs",
            Tree::List(vec![
                obj(vec![("priority", int(7)), ("diskIOPS", int(3500))]),
                obj(vec![("priority", int(6))]),
            ]),
        )]);
        assert_eq!(
            policy.effective_state(&state),
            obj(vec![(
                "regionConfigs",
                Tree::List(vec![obj(vec![("diskIOPS", int(3500))]), Tree::empty_object()]),
            )])
        );
    }

    #[test]
    fn test_effective_state_collapses_fully_ignored_list() {
        let policy =
            PathPolicy::new(&[PatchOptions::default().ignore_in_state_prefix(["regionConfigs"])])
                .unwrap();
        let state = obj(vec![(
            "regionConfigs",
            Tree::List(vec![obj(vec![("priority", int(7))])]),
        )]);
        assert_eq!(policy.effective_state(&state), Tree::empty_object());
    }

    #[test]
    fn test_options_deserialize_from_toml() {
        let raw = r#"
            ignore_in_state_suffix = ["diskSizeGB"]
            force_update_attr = ["replicationSpecs"]

            [list_identity.replicationSpecs]
            natural_keys = ["zoneName"]
        "#;
        let opts: PatchOptions = toml::from_str(raw).unwrap();
        assert_eq!(opts.ignore_in_state_suffix, vec!["diskSizeGB".to_string()]);
        assert_eq!(opts.list_identity["replicationSpecs"].id_field, "id");
        assert_eq!(
            opts.list_identity["replicationSpecs"].natural_keys,
            vec!["zoneName".to_string()]
        );
    }
}
