//! Canonicalizer: typed value -> [`Tree`].
//!
//! Implemented as a `serde::Serializer`, so a resource description's derived
//! `Serialize` impl is its conversion into the canonical tree. Presence is
//! preserved: `None` becomes [`Scalar::Absent`] rather than a zero value, and
//! absent struct fields are left out of the object entirely.
//!
//! Constructs with no faithful tree rendering are rejected with
//! [`PatchError::UnsupportedKind`] instead of being skipped, because a
//! silently dropped field would produce an incomplete update.

use crate::errors::{PatchError, Result};
use crate::path::FieldPath;
use crate::tree::{Scalar, Tree};
use serde::ser::{self, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

impl ser::Error for PatchError {
    fn custom<T: Display>(msg: T) -> Self {
        PatchError::Serialization {
            message: msg.to_string(),
        }
    }
}

/// Convert any serializable value into its canonical tree.
///
/// # Errors
///
/// Returns `PatchError::UnsupportedKind` (with the offending path) for byte
/// buffers, tuple enum variants, map keys that are not string-like,
/// 128-bit integers outside the 64-bit range, and non-finite floats.
/// Errors raised by the value's own `Serialize` impl surface as
/// `PatchError::Serialization`.
pub fn canonicalize<T>(value: &T) -> Result<Tree>
where
    T: Serialize + ?Sized,
{
    value.serialize(TreeSerializer {
        path: FieldPath::root(),
    })
}

fn unsupported(path: &FieldPath, kind: &str) -> PatchError {
    PatchError::UnsupportedKind {
        path: path.to_string(),
        kind: kind.to_string(),
    }
}

fn insert_present(fields: &mut BTreeMap<String, Tree>, name: String, node: Tree) {
    if !node.is_absent() {
        fields.insert(name, node);
    }
}

struct TreeSerializer {
    path: FieldPath,
}

impl ser::Serializer for TreeSerializer {
    type Ok = Tree;
    type Error = PatchError;
    type SerializeSeq = SeqSerializer;
    type SerializeTuple = SeqSerializer;
    type SerializeTupleStruct = SeqSerializer;
    type SerializeTupleVariant = ser::Impossible<Tree, PatchError>;
    type SerializeMap = MapSerializer;
    type SerializeStruct = StructSerializer;
    type SerializeStructVariant = VariantStructSerializer;

    fn serialize_bool(self, v: bool) -> Result<Tree> {
        Ok(Scalar::Bool(v).into())
    }

    fn serialize_i8(self, v: i8) -> Result<Tree> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Tree> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Tree> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Tree> {
        Ok(Scalar::Int(v).into())
    }

    fn serialize_i128(self, v: i128) -> Result<Tree> {
        i64::try_from(v)
            .map(|i| Scalar::Int(i).into())
            .map_err(|_| unsupported(&self.path, "i128 outside the i64 range"))
    }

    fn serialize_u8(self, v: u8) -> Result<Tree> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Tree> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Tree> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Tree> {
        Ok(Scalar::UInt(v).into())
    }

    fn serialize_u128(self, v: u128) -> Result<Tree> {
        u64::try_from(v)
            .map(|u| Scalar::UInt(u).into())
            .map_err(|_| unsupported(&self.path, "u128 outside the u64 range"))
    }

    fn serialize_f32(self, v: f32) -> Result<Tree> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<Tree> {
        if !v.is_finite() {
            return Err(unsupported(&self.path, "non-finite float"));
        }
        Ok(Scalar::Float(v).into())
    }

    fn serialize_char(self, v: char) -> Result<Tree> {
        Ok(Scalar::String(v.to_string()).into())
    }

    fn serialize_str(self, v: &str) -> Result<Tree> {
        Ok(Scalar::String(v.to_string()).into())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Tree> {
        Err(unsupported(&self.path, "byte buffer"))
    }

    fn serialize_none(self) -> Result<Tree> {
        Ok(Tree::ABSENT)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Tree>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Tree> {
        Ok(Scalar::Null.into())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Tree> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Tree> {
        Ok(Scalar::String(variant.to_string()).into())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Tree>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Tree>
    where
        T: Serialize + ?Sized,
    {
        let inner = value.serialize(TreeSerializer {
            path: self.path.child(variant),
        })?;
        let mut fields = BTreeMap::new();
        insert_present(&mut fields, variant.to_string(), inner);
        Ok(Tree::Object(fields))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqSerializer> {
        Ok(SeqSerializer {
            path: self.path,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqSerializer> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported(
            &self.path,
            &format!("tuple enum variant `{}`", variant),
        ))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapSerializer> {
        Ok(MapSerializer {
            path: self.path,
            fields: BTreeMap::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructSerializer> {
        Ok(StructSerializer {
            path: self.path,
            fields: BTreeMap::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantStructSerializer> {
        Ok(VariantStructSerializer {
            variant,
            inner: StructSerializer {
                path: self.path.child(variant),
                fields: BTreeMap::new(),
            },
        })
    }
}

struct SeqSerializer {
    path: FieldPath,
    items: Vec<Tree>,
}

impl SeqSerializer {
    fn push<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        // Elements share the list's path: indices are not path segments.
        let item = value.serialize(TreeSerializer {
            path: self.path.clone(),
        })?;
        self.items.push(item);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqSerializer {
    type Ok = Tree;
    type Error = PatchError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Tree> {
        Ok(Tree::List(self.items))
    }
}

impl ser::SerializeTuple for SeqSerializer {
    type Ok = Tree;
    type Error = PatchError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Tree> {
        Ok(Tree::List(self.items))
    }
}

impl ser::SerializeTupleStruct for SeqSerializer {
    type Ok = Tree;
    type Error = PatchError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.push(value)
    }

    fn end(self) -> Result<Tree> {
        Ok(Tree::List(self.items))
    }
}

struct MapSerializer {
    path: FieldPath,
    fields: BTreeMap<String, Tree>,
    next_key: Option<String>,
}

impl ser::SerializeMap for MapSerializer {
    type Ok = Tree;
    type Error = PatchError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.next_key = Some(key.serialize(KeySerializer { path: &self.path })?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = self.next_key.take().ok_or_else(|| PatchError::Serialization {
            message: format!("map value without a key at '{}'", self.path),
        })?;
        let node = value.serialize(TreeSerializer {
            path: self.path.child(&key),
        })?;
        insert_present(&mut self.fields, key, node);
        Ok(())
    }

    fn end(self) -> Result<Tree> {
        Ok(Tree::Object(self.fields))
    }
}

struct StructSerializer {
    path: FieldPath,
    fields: BTreeMap<String, Tree>,
}

impl ser::SerializeStruct for StructSerializer {
    type Ok = Tree;
    type Error = PatchError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let node = value.serialize(TreeSerializer {
            path: self.path.child(key),
        })?;
        insert_present(&mut self.fields, key.to_string(), node);
        Ok(())
    }

    fn end(self) -> Result<Tree> {
        Ok(Tree::Object(self.fields))
    }
}

struct VariantStructSerializer {
    variant: &'static str,
    inner: StructSerializer,
}

impl ser::SerializeStructVariant for VariantStructSerializer {
    type Ok = Tree;
    type Error = PatchError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Tree> {
        let mut fields = BTreeMap::new();
        fields.insert(self.variant.to_string(), Tree::Object(self.inner.fields));
        Ok(Tree::Object(fields))
    }
}

/// Accepts only keys that have a natural string form.
struct KeySerializer<'a> {
    path: &'a FieldPath,
}

impl KeySerializer<'_> {
    fn reject(&self, kind: &str) -> PatchError {
        unsupported(self.path, &format!("map key of kind {}", kind))
    }
}

impl ser::Serializer for KeySerializer<'_> {
    type Ok = String;
    type Error = PatchError;
    type SerializeSeq = ser::Impossible<String, PatchError>;
    type SerializeTuple = ser::Impossible<String, PatchError>;
    type SerializeTupleStruct = ser::Impossible<String, PatchError>;
    type SerializeTupleVariant = ser::Impossible<String, PatchError>;
    type SerializeMap = ser::Impossible<String, PatchError>;
    type SerializeStruct = ser::Impossible<String, PatchError>;
    type SerializeStructVariant = ser::Impossible<String, PatchError>;

    fn serialize_bool(self, _v: bool) -> Result<String> {
        Err(self.reject("bool"))
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(self.reject("float"))
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(self.reject("float"))
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(self.reject("bytes"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(self.reject("none"))
    }

    fn serialize_some<T>(self, _value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        Err(self.reject("option"))
    }

    fn serialize_unit(self) -> Result<String> {
        Err(self.reject("unit"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(self.reject("unit struct"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String>
    where
        T: Serialize + ?Sized,
    {
        Err(self.reject("newtype variant"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.reject("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.reject("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.reject("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.reject("tuple variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.reject("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(self.reject("struct"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.reject("struct variant"))
    }
}
