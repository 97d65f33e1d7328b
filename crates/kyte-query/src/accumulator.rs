use bson::{Bson, Document, doc};

use crate::operator::AccumulatorOp;

/// Output fields of a `$group` stage.
///
/// ```ignore
/// let acc = Accumulator::new()
///     .sum("total", "$amount")
///     .push("items", doc! { "name": "$name", "qty": "$qty" });
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    fields: Document,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn accumulate(mut self, field: &str, op: AccumulatorOp, expression: impl Into<Bson>) -> Self {
        let mut value = Document::new();
        value.insert(op.as_str(), expression.into());
        self.fields.insert(field, value);
        self
    }

    pub fn push(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::Push, expression)
    }

    /// `{field: {"$count": {}}}`
    pub fn count(self, field: &str) -> Self {
        self.accumulate(field, AccumulatorOp::Count, Document::new())
    }

    pub fn sum(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::Sum, expression)
    }

    pub fn avg(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::Avg, expression)
    }

    pub fn first(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::First, expression)
    }

    pub fn last(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::Last, expression)
    }

    pub fn max(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::Max, expression)
    }

    pub fn min(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::Min, expression)
    }

    pub fn add_to_set(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::AddToSet, expression)
    }

    pub fn std_dev_pop(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::StdDevPop, expression)
    }

    pub fn std_dev_samp(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::StdDevSamp, expression)
    }

    pub fn merge_objects(self, field: &str, expression: impl Into<Bson>) -> Self {
        self.accumulate(field, AccumulatorOp::MergeObjects, expression)
    }

    /// `{field: {"$percentile": {"input": input, "p": [..], "method": "approximate"}}}`
    pub fn percentile(self, field: &str, input: impl Into<Bson>, p: &[f64]) -> Self {
        let input: Bson = input.into();
        let body = doc! {
            "input": input,
            "p": p.to_vec(),
            "method": "approximate",
        };
        self.accumulate(field, AccumulatorOp::Percentile, body)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn build(&self) -> Document {
        self.fields.clone()
    }
}
