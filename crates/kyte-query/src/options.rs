use std::marker::PhantomData;
use std::sync::Arc;

use kyte_schema::{Field, Schema, SchemaError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::global::GlobalFilters;

/// Plain builder settings, loadable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Reject field names that are not declared by the bound source.
    pub validate_field: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            validate_field: true,
        }
    }
}

/// Construction options for [`crate::Filter`] and [`crate::Aggregate`].
///
/// The bound source stays borrowed for `'s`, which keeps field references
/// taken from it valid for as long as the builder lives.
#[derive(Debug, Clone, Default)]
pub struct Options<'s> {
    settings: Settings,
    source: Option<Result<Arc<Schema>, SchemaError>>,
    globals: Option<GlobalFilters>,
    _source: PhantomData<&'s ()>,
}

impl<'s> Options<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a source value whose serde field names drive validation and
    /// field reference resolution.
    pub fn source<S>(mut self, source: &'s S) -> Self
    where
        S: Serialize + DeserializeOwned,
    {
        self.source = Some(Schema::of(source).map(Arc::new));
        self
    }

    pub fn validate_field(mut self, validate_field: bool) -> Self {
        self.settings.validate_field = validate_field;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Merge the current contents of `globals` into every filter built with
    /// these options.
    pub fn globals(mut self, globals: &GlobalFilters) -> Self {
        self.globals = Some(globals.clone());
        self
    }

    pub(crate) fn into_parts(self) -> (Binding, Option<GlobalFilters>, Option<Error>) {
        let (schema, error) = match self.source {
            Some(Ok(schema)) => (Some(schema), None),
            Some(Err(e)) => (None, Some(Error::from(e))),
            None => (None, None),
        };
        let binding = Binding {
            schema,
            validate_field: self.settings.validate_field,
        };
        (binding, self.globals, error)
    }
}

/// A builder's view of its bound source.
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    schema: Option<Arc<Schema>>,
    validate_field: bool,
}

impl Default for Binding {
    fn default() -> Self {
        Self {
            schema: None,
            validate_field: Settings::default().validate_field,
        }
    }
}

impl Binding {
    pub(crate) fn has_source(&self) -> bool {
        self.schema.is_some()
    }

    /// Turn a field into its wire-level path.
    pub(crate) fn resolve(&self, field: &Field<'_>) -> Result<String> {
        match field {
            Field::Name(name) => {
                if name.is_empty() {
                    return Err(Error::EmptyField);
                }
                if let Some(schema) = self.schema.as_deref() {
                    if self.validate_field && !schema.contains(name) {
                        return Err(Error::NotValidFieldForQuery(name.to_string()));
                    }
                }
                Ok(name.to_string())
            }
            Field::Ref(field_ref) => {
                let schema = self.schema.as_deref().ok_or(Error::FieldMustBeString)?;
                match schema.path_of(field_ref) {
                    Some(path) => Ok(path.to_owned()),
                    None if schema.is_omitted(field_ref) => {
                        Err(Error::FieldOmitted(field_ref.type_name().to_string()))
                    }
                    None => Err(Error::NotValidFieldForQuery(field.to_string())),
                }
            }
        }
    }
}
