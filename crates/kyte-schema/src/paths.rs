//! Address pass: walks a live source value through `Serialize` and records
//! where each struct field lives and which dotted path it serializes under.

use serde::Serialize;
use serde::ser::{self, Impossible};

use crate::error::SchemaError;
use crate::field::FieldKey;

/// What the address pass saw of a source value.
#[derive(Debug, Default)]
pub(crate) struct Trace {
    /// `(field identity, dotted path)` for every serialized field.
    pub(crate) paths: Vec<(FieldKey, String)>,
    /// Paths of fields the serializer skipped (`skip_serializing_if`).
    pub(crate) omitted: Vec<String>,
}

impl Trace {
    fn field<T: ?Sized + Serialize>(
        &mut self,
        prefix: &str,
        key: &str,
        value: &T,
    ) -> Result<(), SchemaError> {
        if is_wire_key(key) {
            return Ok(());
        }

        let path = format!("{prefix}{key}");
        self.paths.push((FieldKey::of(value), path.clone()));

        value.serialize(PathSerializer {
            trace: self,
            prefix: path + ".",
            root: false,
        })
    }
}

/// Trace `source`. The root must serialize as a struct or as a map with
/// string keys (`#[serde(flatten)]` structs do the latter).
pub(crate) fn trace<S: Serialize + ?Sized>(source: &S) -> Result<Trace, SchemaError> {
    let mut trace = Trace::default();
    source.serialize(PathSerializer {
        trace: &mut trace,
        prefix: String::new(),
        root: true,
    })?;
    Ok(trace)
}

/// Keys with a leading `$` are extended-JSON wrappers (`$oid`, `$date`),
/// not document paths.
fn is_wire_key(key: &str) -> bool {
    key.starts_with('$')
}

struct PathSerializer<'t> {
    trace: &'t mut Trace,
    prefix: String,
    root: bool,
}

impl PathSerializer<'_> {
    fn leaf(self) -> Result<(), SchemaError> {
        if self.root {
            Err(SchemaError::NotStruct)
        } else {
            Ok(())
        }
    }
}

macro_rules! leaf {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<(), SchemaError> {
                self.leaf()
            }
        )*
    };
}

impl<'t> ser::Serializer for PathSerializer<'t> {
    type Ok = ();
    type Error = SchemaError;
    type SerializeSeq = SeqTracer<'t>;
    type SerializeTuple = Ignored;
    type SerializeTupleStruct = Ignored;
    type SerializeTupleVariant = Ignored;
    type SerializeMap = MapTracer<'t>;
    type SerializeStruct = StructTracer<'t>;
    type SerializeStructVariant = Ignored;

    leaf! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_str: &str,
        serialize_bytes: &[u8],
        serialize_unit_struct: &'static str,
    }

    fn serialize_none(self) -> Result<(), SchemaError> {
        self.leaf()
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), SchemaError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), SchemaError> {
        self.leaf()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), SchemaError> {
        self.leaf()
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), SchemaError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<(), SchemaError> {
        self.leaf()
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SeqTracer<'t>, SchemaError> {
        if self.root {
            return Err(SchemaError::NotStruct);
        }
        Ok(SeqTracer {
            trace: self.trace,
            prefix: self.prefix,
            seen: false,
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Ignored, SchemaError> {
        self.leaf().map(|_| Ignored)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Ignored, SchemaError> {
        self.leaf().map(|_| Ignored)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Ignored, SchemaError> {
        self.leaf().map(|_| Ignored)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapTracer<'t>, SchemaError> {
        Ok(MapTracer {
            trace: self.trace,
            prefix: self.prefix,
            key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<StructTracer<'t>, SchemaError> {
        Ok(StructTracer {
            trace: self.trace,
            prefix: self.prefix,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Ignored, SchemaError> {
        self.leaf().map(|_| Ignored)
    }
}

pub(crate) struct StructTracer<'t> {
    trace: &'t mut Trace,
    prefix: String,
}

impl ser::SerializeStruct for StructTracer<'_> {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), SchemaError> {
        self.trace.field(&self.prefix, key, value)
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), SchemaError> {
        if !is_wire_key(key) {
            self.trace.omitted.push(format!("{}{}", self.prefix, key));
        }
        Ok(())
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Map entries with string keys are traced like struct fields; entries with
/// any other key are ignored.
pub(crate) struct MapTracer<'t> {
    trace: &'t mut Trace,
    prefix: String,
    key: Option<String>,
}

impl ser::SerializeMap for MapTracer<'_> {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), SchemaError> {
        self.key = key.serialize(KeyCapture).ok();
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SchemaError> {
        match self.key.take() {
            Some(key) => self.trace.field(&self.prefix, &key, value),
            None => Ok(()),
        }
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Only the first element of a sequence is traced; its fields are recorded
/// under the sequence's own path.
pub(crate) struct SeqTracer<'t> {
    trace: &'t mut Trace,
    prefix: String,
    seen: bool,
}

impl ser::SerializeSeq for SeqTracer<'_> {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), SchemaError> {
        if self.seen {
            return Ok(());
        }
        self.seen = true;
        value.serialize(PathSerializer {
            trace: &mut *self.trace,
            prefix: self.prefix.clone(),
            root: false,
        })
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Compound values whose contents are not document paths.
pub(crate) struct Ignored;

impl ser::SerializeTuple for Ignored {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<(), SchemaError> {
        Ok(())
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Ignored {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<(), SchemaError> {
        Ok(())
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Ignored {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, _value: &T) -> Result<(), SchemaError> {
        Ok(())
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Ignored {
    type Ok = ();
    type Error = SchemaError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _key: &'static str,
        _value: &T,
    ) -> Result<(), SchemaError> {
        Ok(())
    }

    fn end(self) -> Result<(), SchemaError> {
        Ok(())
    }
}

/// Serializes a map key to a string, failing for every other shape.
struct KeyCapture;

fn non_string_key() -> SchemaError {
    SchemaError::Unsupported("map key is not a string".into())
}

macro_rules! reject_key {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<String, SchemaError> {
                Err(non_string_key())
            }
        )*
    };
}

impl ser::Serializer for KeyCapture {
    type Ok = String;
    type Error = SchemaError;
    type SerializeSeq = Impossible<String, SchemaError>;
    type SerializeTuple = Impossible<String, SchemaError>;
    type SerializeTupleStruct = Impossible<String, SchemaError>;
    type SerializeTupleVariant = Impossible<String, SchemaError>;
    type SerializeMap = Impossible<String, SchemaError>;
    type SerializeStruct = Impossible<String, SchemaError>;
    type SerializeStructVariant = Impossible<String, SchemaError>;

    fn serialize_str(self, v: &str) -> Result<String, SchemaError> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String, SchemaError> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<String, SchemaError> {
        Ok(variant.to_string())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, SchemaError> {
        value.serialize(self)
    }

    reject_key! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_bytes: &[u8],
        serialize_unit_struct: &'static str,
    }

    fn serialize_none(self) -> Result<String, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<String, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_unit(self) -> Result<String, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, SchemaError> {
        Err(non_string_key())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, SchemaError> {
        Err(non_string_key())
    }
}
