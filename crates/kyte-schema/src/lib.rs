mod error;
mod field;
mod names;
mod paths;
mod schema;

pub use error::SchemaError;
pub use field::{Field, FieldRef, field};
pub use schema::Schema;
