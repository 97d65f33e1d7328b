use std::fmt;

use serde::{Deserialize, Serialize};

/// Alias for the primary key field.
pub const UNDERSCORE_ID: &str = "_id";
/// Primary key as a field path expression.
pub const UNDERSCORE_ID_WITH_DOLLAR: &str = "$_id";

/// Query operators the filter builder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    And,
    Or,
    Nor,
    Regex,
    Options,
    Exists,
    Type,
    Mod,
    Where,
    All,
    Size,
    JsonSchema,
    ElemMatch,
}

impl Operator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::And => "$and",
            Operator::Or => "$or",
            Operator::Nor => "$nor",
            Operator::Regex => "$regex",
            Operator::Options => "$options",
            Operator::Exists => "$exists",
            Operator::Type => "$type",
            Operator::Mod => "$mod",
            Operator::Where => "$where",
            Operator::All => "$all",
            Operator::Size => "$size",
            Operator::JsonSchema => "$jsonSchema",
            Operator::ElemMatch => "$elemMatch",
        }
    }
}

/// Aggregation pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Match,
    Group,
    Project,
    Sort,
    Limit,
    Skip,
    Unwind,
    Lookup,
    Facet,
}

impl Stage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::Match => "$match",
            Stage::Group => "$group",
            Stage::Project => "$project",
            Stage::Sort => "$sort",
            Stage::Limit => "$limit",
            Stage::Skip => "$skip",
            Stage::Unwind => "$unwind",
            Stage::Lookup => "$lookup",
            Stage::Facet => "$facet",
        }
    }
}

/// `$group` accumulator operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorOp {
    Push,
    Count,
    First,
    Last,
    Max,
    Min,
    Avg,
    Sum,
    AddToSet,
    Percentile,
    StdDevPop,
    StdDevSamp,
    MergeObjects,
}

impl AccumulatorOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            AccumulatorOp::Push => "$push",
            AccumulatorOp::Count => "$count",
            AccumulatorOp::First => "$first",
            AccumulatorOp::Last => "$last",
            AccumulatorOp::Max => "$max",
            AccumulatorOp::Min => "$min",
            AccumulatorOp::Avg => "$avg",
            AccumulatorOp::Sum => "$sum",
            AccumulatorOp::AddToSet => "$addToSet",
            AccumulatorOp::Percentile => "$percentile",
            AccumulatorOp::StdDevPop => "$stdDevPop",
            AccumulatorOp::StdDevSamp => "$stdDevSamp",
            AccumulatorOp::MergeObjects => "$mergeObjects",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )*
    };
}

display_as_str!(Operator, Stage, AccumulatorOp);
