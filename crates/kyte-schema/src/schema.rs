use std::collections::{HashMap, HashSet};
use std::ops::Range;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SchemaError;
use crate::field::{FieldKey, FieldRef};
use crate::{names, paths};

/// The resolved field table of a source value.
///
/// Paths come from the source's serde attributes: `#[serde(rename)]` sets a
/// segment name, `#[serde(skip)]` hides a field, and nested structs (direct,
/// boxed, optional or inside a sequence) contribute `parent.child` paths.
/// Fields of a `#[serde(flatten)]` struct sit at their parent's level.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    paths: HashMap<FieldKey, String>,
    names: Vec<String>,
    known: HashSet<String>,
    omitted: Vec<String>,
    /// Addresses occupied by the source value itself.
    span: Range<usize>,
}

impl Schema {
    /// Resolve the schema of `source`.
    ///
    /// Field references taken from `source` (see [`crate::field`]) resolve
    /// against the returned schema as long as `source` has not moved.
    pub fn of<S>(source: &S) -> Result<Self, SchemaError>
    where
        S: Serialize + DeserializeOwned,
    {
        let traced = paths::trace(source)?;
        let declared = names::trace::<S>();

        let base = (source as *const S).cast::<()>() as usize;
        let mut schema = Schema {
            span: base..base + std::mem::size_of::<S>(),
            ..Default::default()
        };
        for (key, path) in traced.paths {
            schema.push_name(&path);
            schema.paths.entry(key).or_insert(path);
        }
        for path in traced.omitted.iter().chain(&declared) {
            schema.push_name(path);
        }
        schema.omitted = traced.omitted;

        tracing::trace!(
            source = std::any::type_name::<S>(),
            fields = schema.names.len(),
            omitted = schema.omitted.len(),
            "resolved schema"
        );
        Ok(schema)
    }

    fn push_name(&mut self, path: &str) {
        if self.known.insert(path.to_string()) {
            self.names.push(path.to_string());
        }
    }

    /// Dotted path of a field reference, if it points into this source.
    pub fn path_of(&self, field: &FieldRef<'_>) -> Option<&str> {
        self.paths.get(&field.key()).map(String::as_str)
    }

    /// Whether `field` points into the source at a field its serializer left
    /// out, typically an empty `skip_serializing_if` field. Such fields have
    /// no recorded address; bind a source with them populated.
    pub fn is_omitted(&self, field: &FieldRef<'_>) -> bool {
        !self.omitted.is_empty()
            && self.path_of(field).is_none()
            && self.span.contains(&field.key().addr())
    }

    /// Paths of the fields the serializer left out.
    pub fn omitted(&self) -> &[String] {
        &self.omitted
    }

    pub fn contains(&self, name: &str) -> bool {
        self.known.contains(name)
    }

    /// Every declared path, parents before children.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
