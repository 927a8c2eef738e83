//! Canonical tree: the generic shape every resource description is diffed in.
//!
//! A [`Tree`] is an object, a list, or a scalar. Scalars carry an explicit
//! tri-state so that "the caller never set this" ([`Scalar::Absent`]) stays
//! distinct from "the caller set this to null" ([`Scalar::Null`]) and from
//! any concrete value, including zero values.

use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A primitive leaf value.
///
/// Numbers compare by value across `Int`, `UInt` and `Float`: the same
/// quantity may arrive signed from a typed model, unsigned from parsed JSON,
/// or as `50.0` where the other side holds `50`.
#[derive(Debug, Clone)]
pub enum Scalar {
    /// Field not set
    Absent,
    /// Field explicitly set to null / unit
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// Always finite; the canonicalizer rejects NaN and infinities
    Float(f64),
    String(String),
}

fn int_eq_uint(i: i64, u: u64) -> bool {
    u64::try_from(i).is_ok_and(|i| i == u)
}

fn int_eq_float(i: i64, f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 && f as i64 == i
}

fn uint_eq_float(u: u64, f: f64) -> bool {
    f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 && f as u64 == u
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        use Scalar::*;
        match (self, other) {
            (Absent, Absent) | (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(i), UInt(u)) | (UInt(u), Int(i)) => int_eq_uint(*i, *u),
            (Int(i), Float(f)) | (Float(f), Int(i)) => int_eq_float(*i, *f),
            (UInt(u), Float(f)) | (Float(f), UInt(u)) => uint_eq_float(*u, *f),
            _ => false,
        }
    }
}

/// A node of a canonical tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Object(BTreeMap<String, Tree>),
    List(Vec<Tree>),
    Scalar(Scalar),
}

impl Default for Tree {
    fn default() -> Self {
        Tree::ABSENT
    }
}

impl From<Scalar> for Tree {
    fn from(scalar: Scalar) -> Self {
        Tree::Scalar(scalar)
    }
}

impl Tree {
    pub const ABSENT: Tree = Tree::Scalar(Scalar::Absent);

    /// An object node with no fields.
    pub fn empty_object() -> Self {
        Tree::Object(BTreeMap::new())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Tree::Scalar(Scalar::Absent))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Tree::Object(_))
    }

    /// True iff the tree carries no contribution at any depth.
    ///
    /// An object is empty when every field is empty. A list is never empty:
    /// sending `[]` is a different request from sending nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Tree::Scalar(scalar) => matches!(scalar, Scalar::Absent),
            Tree::Object(fields) => fields.values().all(Tree::is_empty),
            Tree::List(_) => false,
        }
    }

    /// Field lookup on an object; any other node, or a missing field, is absent.
    pub fn get(&self, field: &str) -> &Tree {
        match self {
            Tree::Object(fields) => fields.get(field).unwrap_or(&Tree::ABSENT),
            _ => &Tree::ABSENT,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Tree>> {
        match self {
            Tree::Object(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tree]> {
        match self {
            Tree::List(items) => Some(items),
            _ => None,
        }
    }

    /// Render as JSON for rehydration or display.
    ///
    /// Absent object fields are dropped; absent list items (which only occur
    /// for lists of optionals) render as `null`.
    pub fn into_json(self) -> Value {
        match self {
            Tree::Object(fields) => {
                let mut map = Map::new();
                for (name, node) in fields {
                    if !node.is_absent() {
                        map.insert(name, node.into_json());
                    }
                }
                Value::Object(map)
            }
            Tree::List(items) => Value::Array(items.into_iter().map(Tree::into_json).collect()),
            Tree::Scalar(scalar) => match scalar {
                Scalar::Absent | Scalar::Null => Value::Null,
                Scalar::Bool(b) => Value::Bool(b),
                Scalar::Int(i) => Value::Number(Number::from(i)),
                Scalar::UInt(u) => Value::Number(Number::from(u)),
                Scalar::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
                Scalar::String(s) => Value::String(s),
            },
        }
    }
}
