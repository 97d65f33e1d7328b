//! Fluent builders for filter documents and aggregation pipelines.
//!
//! ```ignore
//! use kyte_query::{Filter, Options, field};
//!
//! let user = User::default();
//! let query = Filter::with_options(Options::new().source(&user))
//!     .equal(field(&user.name), "John")
//!     .or(Filter::new().less_than("age", 18).greater_than("age", 65))
//!     .build()?;
//! ```

mod accumulator;
mod aggregate;
mod document;
mod error;
mod filter;
mod global;
mod operator;
mod options;
mod sort;

pub use accumulator::Accumulator;
pub use aggregate::Aggregate;
pub use error::{Error, Result};
pub use filter::Filter;
pub use global::GlobalFilters;
pub use kyte_schema::{Field, FieldRef, Schema, SchemaError, field};
pub use operator::{AccumulatorOp, Operator, Stage, UNDERSCORE_ID, UNDERSCORE_ID_WITH_DOLLAR};
pub use options::{Options, Settings};
pub use sort::{Sort, SortDirection};
