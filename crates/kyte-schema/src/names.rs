//! Name pass: drives a type's `Deserialize` impl with synthetic input to
//! discover every field path it declares, including the element fields of
//! empty sequences and absent options that the address pass cannot see.

use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};

use crate::error::SchemaError;

/// Options and sequences are not followed past this many struct levels, so
/// recursive types terminate.
const MAX_DEPTH: usize = 16;

/// Hex form of the all-zero `ObjectId`.
const ZERO_OBJECT_ID: &str = "000000000000000000000000";

/// Collect the dotted paths declared by `S`.
///
/// Best effort: a leaf type that cannot be synthesized (for example a custom
/// `Deserialize` that rejects string input, or a `#[serde(flatten)]` struct,
/// which reads its fields from a map) ends the walk, and the names collected
/// up to that point are returned.
pub(crate) fn trace<S: DeserializeOwned>() -> Vec<String> {
    let mut names = Vec::new();
    let tracer = NameTracer {
        names: &mut names,
        prefix: String::new(),
        depth: 0,
        record: true,
    };
    if let Err(e) = S::deserialize(tracer) {
        tracing::trace!(error = %e, "name trace stopped early");
    }
    names
}

struct NameTracer<'t> {
    names: &'t mut Vec<String>,
    prefix: String,
    depth: usize,
    record: bool,
}

impl<'t> NameTracer<'t> {
    fn exhausted(&self) -> bool {
        self.depth >= MAX_DEPTH
    }

    fn muted(self) -> NameTracer<'t> {
        NameTracer {
            record: false,
            ..self
        }
    }
}

macro_rules! zero {
    ($($method:ident => $visit:ident($value:expr)),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
                visitor.$visit($value)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for NameTracer<'_> {
    type Error = SchemaError;

    zero! {
        deserialize_bool => visit_bool(false),
        deserialize_i8 => visit_i8(0),
        deserialize_i16 => visit_i16(0),
        deserialize_i32 => visit_i32(0),
        deserialize_i64 => visit_i64(0),
        deserialize_u8 => visit_u8(0),
        deserialize_u16 => visit_u16(0),
        deserialize_u32 => visit_u32(0),
        deserialize_u64 => visit_u64(0),
        deserialize_f32 => visit_f32(0.0),
        deserialize_f64 => visit_f64(0.0),
        deserialize_char => visit_char('\0'),
        deserialize_str => visit_str(""),
        deserialize_string => visit_str(""),
        deserialize_bytes => visit_bytes(&[]),
        deserialize_byte_buf => visit_bytes(&[]),
        deserialize_identifier => visit_str(""),
    }

    /// Self-describing leaves (`ObjectId` among them) accept a hex string.
    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
        visitor.visit_str(ZERO_OBJECT_ID)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
        visitor.visit_unit()
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        visitor.visit_unit()
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
        if self.exhausted() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
        let remaining = if self.exhausted() { 0 } else { 1 };
        visitor.visit_seq(SeqAccess {
            tracer: self,
            remaining,
        })
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        visitor.visit_seq(SeqAccess {
            tracer: self.muted(),
            remaining: len,
        })
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SchemaError> {
        visitor.visit_map(de::value::MapDeserializer::new(
            std::iter::empty::<((), ())>(),
        ))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        visitor.visit_map(StructAccess {
            tracer: self,
            fields,
            next: 0,
        })
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        let variant = variants
            .first()
            .copied()
            .ok_or_else(|| SchemaError::Unsupported("enum without variants".into()))?;
        visitor.visit_enum(EnumAccess {
            tracer: self.muted(),
            variant,
        })
    }
}

struct StructAccess<'t> {
    tracer: NameTracer<'t>,
    fields: &'static [&'static str],
    next: usize,
}

impl<'de> de::MapAccess<'de> for StructAccess<'_> {
    type Error = SchemaError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, SchemaError> {
        match self.fields.get(self.next) {
            Some(&key) => {
                let key: de::value::StrDeserializer<'_, SchemaError> = key.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, SchemaError> {
        let key = self.fields[self.next];
        self.next += 1;

        let path = format!("{}{}", self.tracer.prefix, key);
        let record = self.tracer.record && !key.starts_with('$');
        if record {
            self.tracer.names.push(path.clone());
        }

        seed.deserialize(NameTracer {
            names: &mut *self.tracer.names,
            prefix: path + ".",
            depth: self.tracer.depth + 1,
            record,
        })
    }
}

struct SeqAccess<'t> {
    tracer: NameTracer<'t>,
    remaining: usize,
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'_> {
    type Error = SchemaError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, SchemaError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let tracer = &mut self.tracer;
        // Only the first element records names; tuple slots after it are muted.
        let element = NameTracer {
            names: &mut *tracer.names,
            prefix: tracer.prefix.clone(),
            depth: tracer.depth,
            record: tracer.record,
        };
        tracer.record = false;
        seed.deserialize(element).map(Some)
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.remaining)
    }
}

struct EnumAccess<'t> {
    tracer: NameTracer<'t>,
    variant: &'static str,
}

impl<'de, 't> de::EnumAccess<'de> for EnumAccess<'t> {
    type Error = SchemaError;
    type Variant = NameTracer<'t>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, NameTracer<'t>), SchemaError> {
        let key: de::value::StrDeserializer<'_, SchemaError> = self.variant.into_deserializer();
        let value = seed.deserialize(key)?;
        Ok((value, self.tracer))
    }
}

impl<'de> de::VariantAccess<'de> for NameTracer<'_> {
    type Error = SchemaError;

    fn unit_variant(self) -> Result<(), SchemaError> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(
        self,
        seed: T,
    ) -> Result<T::Value, SchemaError> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, SchemaError> {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, SchemaError> {
        de::Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}
