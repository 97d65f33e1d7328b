use bson::spec::ElementType;
use bson::{Bson, Document};
use kyte_schema::Field;
use regex::Regex;

use crate::document::{entry, merge_entry, to_relaxed_json};
use crate::error::{Error, Result};
use crate::operator::Operator;
use crate::options::{Binding, Options};

/// Regex flags the server understands in `$options`.
const REGEX_OPTIONS: &[char] = &['i', 'm', 's', 'x', 'u'];

/// One recorded builder call, in call order.
#[derive(Debug, Clone)]
enum Step<'s> {
    /// `{path: {"$op": value}}`, resolved and validated at build time.
    Compare {
        operator: Operator,
        field: Field<'s>,
        value: Bson,
    },
    Regex {
        field: Field<'s>,
        pattern: String,
        options: Option<String>,
    },
    ElemMatch {
        field: Field<'s>,
        filter: Box<Filter<'s>>,
    },
    /// Top-level fragment needing no field: `$where`, `$jsonSchema`, logical
    /// groups, raw documents and global filters.
    Fragment(Document),
}

/// A filter document builder.
///
/// Calls are recorded and only turned into a document by [`Filter::build`].
/// Field arguments are either literal dotted paths or references into the
/// bound source (see [`kyte_schema::field`]).
///
/// ```ignore
/// let user = User::default();
/// let query = Filter::with_options(Options::new().source(&user))
///     .equal(field(&user.name), "John")
///     .greater_than("age", 18)
///     .build()?;
/// // {"name": {"$eq": "John"}, "age": {"$gt": 18}}
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filter<'s> {
    binding: Binding,
    steps: Vec<Step<'s>>,
    error: Option<Error>,
}

impl<'s> Filter<'s> {
    /// A filter with no bound source and no global filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter bound to the source and global filters in `options`. The
    /// global filters are captured as they are right now.
    pub fn with_options(options: Options<'s>) -> Self {
        let (binding, globals, error) = options.into_parts();
        let mut filter = Filter {
            binding,
            steps: Vec::new(),
            error: None,
        };
        if let Some(error) = error {
            filter.fail(error);
        }
        if let Some(globals) = globals {
            for document in globals.snapshot().iter() {
                filter.steps.push(Step::Fragment(document.clone()));
            }
        }
        filter
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            tracing::debug!(%error, "filter rejected");
            self.error = Some(error);
        }
    }

    fn push(mut self, step: Step<'s>) -> Self {
        if self.error.is_none() {
            self.steps.push(step);
        }
        self
    }

    fn compare(self, operator: Operator, field: impl Into<Field<'s>>, value: Bson) -> Self {
        self.push(Step::Compare {
            operator,
            field: field.into(),
            value,
        })
    }

    /// `{field: {"$eq": value}}`
    pub fn equal(self, field: impl Into<Field<'s>>, value: impl Into<Bson>) -> Self {
        self.compare(Operator::Eq, field, value.into())
    }

    /// `{field: {"$ne": value}}`
    pub fn not_equal(self, field: impl Into<Field<'s>>, value: impl Into<Bson>) -> Self {
        self.compare(Operator::Ne, field, value.into())
    }

    /// `{field: {"$gt": value}}`
    pub fn greater_than(self, field: impl Into<Field<'s>>, value: impl Into<Bson>) -> Self {
        self.compare(Operator::Gt, field, value.into())
    }

    /// `{field: {"$gte": value}}`
    pub fn greater_than_or_equal(
        self,
        field: impl Into<Field<'s>>,
        value: impl Into<Bson>,
    ) -> Self {
        self.compare(Operator::Gte, field, value.into())
    }

    /// `{field: {"$lt": value}}`
    pub fn less_than(self, field: impl Into<Field<'s>>, value: impl Into<Bson>) -> Self {
        self.compare(Operator::Lt, field, value.into())
    }

    /// `{field: {"$lte": value}}`
    pub fn less_than_or_equal(self, field: impl Into<Field<'s>>, value: impl Into<Bson>) -> Self {
        self.compare(Operator::Lte, field, value.into())
    }

    /// `{field: {"$in": [..]}}`. A single value becomes a one-element array.
    pub fn in_(self, field: impl Into<Field<'s>>, values: impl Into<Bson>) -> Self {
        self.compare(Operator::In, field, as_array(values.into()))
    }

    /// `{field: {"$nin": [..]}}`. A single value becomes a one-element array.
    pub fn not_in(self, field: impl Into<Field<'s>>, values: impl Into<Bson>) -> Self {
        self.compare(Operator::Nin, field, as_array(values.into()))
    }

    /// `{field: {"$exists": exists}}`
    pub fn exists(self, field: impl Into<Field<'s>>, exists: bool) -> Self {
        self.compare(Operator::Exists, field, Bson::Boolean(exists))
    }

    /// `{field: {"$type": [codes..]}}`. At least one type is required.
    pub fn type_(mut self, field: impl Into<Field<'s>>, types: &[ElementType]) -> Self {
        if types.is_empty() {
            self.fail(Error::InvalidBsonType);
            return self;
        }
        // Type bytes are signed on the wire: MinKey is 0xFF, code -1.
        let codes = types
            .iter()
            .map(|t| Bson::Int32(*t as u8 as i8 as i32))
            .collect();
        self.compare(Operator::Type, field, Bson::Array(codes))
    }

    /// `{field: {"$mod": [divisor, remainder]}}`
    pub fn mod_(self, field: impl Into<Field<'s>>, divisor: i64, remainder: i64) -> Self {
        let value = Bson::Array(vec![Bson::Int64(divisor), Bson::Int64(remainder)]);
        self.compare(Operator::Mod, field, value)
    }

    /// `{field: {"$all": [..]}}`. The value must be an array.
    pub fn all(mut self, field: impl Into<Field<'s>>, values: impl Into<Bson>) -> Self {
        let values = values.into();
        if !matches!(values, Bson::Array(_)) {
            self.fail(Error::ValueMustBeArray);
            return self;
        }
        self.compare(Operator::All, field, values)
    }

    /// `{field: {"$size": size}}`
    pub fn size(self, field: impl Into<Field<'s>>, size: i64) -> Self {
        self.compare(Operator::Size, field, Bson::Int64(size))
    }

    /// `{field: {"$regex": pattern}}`
    pub fn regex(self, field: impl Into<Field<'s>>, regex: &Regex) -> Self {
        self.push(Step::Regex {
            field: field.into(),
            pattern: regex.as_str().to_string(),
            options: None,
        })
    }

    /// `{field: {"$regex": pattern, "$options": options}}`
    pub fn regex_with_options(
        mut self,
        field: impl Into<Field<'s>>,
        regex: &Regex,
        options: &str,
    ) -> Self {
        if let Some(c) = options.chars().find(|c| !REGEX_OPTIONS.contains(c)) {
            self.fail(Error::InvalidRegexOption(c));
            return self;
        }
        self.push(Step::Regex {
            field: field.into(),
            pattern: regex.as_str().to_string(),
            options: Some(options.to_string()),
        })
    }

    /// `{field: {"$elemMatch": sub}}`. `sub` is written against the array
    /// element, so it does not inherit this filter's source.
    pub fn elem_match(self, field: impl Into<Field<'s>>, sub: Filter<'s>) -> Self {
        self.push(Step::ElemMatch {
            field: field.into(),
            filter: Box::new(sub),
        })
    }

    /// `{"$where": js}`
    pub fn where_(self, js: impl Into<String>) -> Self {
        let js: String = js.into();
        self.push(Step::Fragment(entry(Operator::Where.as_str(), js)))
    }

    /// `{"$jsonSchema": schema}`
    pub fn json_schema(self, schema: Document) -> Self {
        self.push(Step::Fragment(entry(Operator::JsonSchema.as_str(), schema)))
    }

    /// `{"$and": [..]}` with one clause per condition recorded on `sub`.
    pub fn and(self, sub: Filter<'s>) -> Self {
        self.logical(Operator::And, sub)
    }

    /// `{"$or": [..]}` with one clause per condition recorded on `sub`.
    pub fn or(self, sub: Filter<'s>) -> Self {
        self.logical(Operator::Or, sub)
    }

    /// `{"$nor": [..]}` with one clause per condition recorded on `sub`.
    pub fn nor(self, sub: Filter<'s>) -> Self {
        self.logical(Operator::Nor, sub)
    }

    fn logical(mut self, operator: Operator, mut sub: Filter<'s>) -> Self {
        if self.error.is_some() {
            return self;
        }
        sub.inherit(&self.binding);

        match sub.clauses() {
            Ok(clauses) if clauses.is_empty() => {
                self.fail(Error::EmptyLogicalOperand(operator.as_str()));
                self
            }
            Ok(clauses) => {
                let clauses = clauses
                    .into_iter()
                    .map(|(key, value)| Bson::Document(entry(key, value)))
                    .collect::<Vec<_>>();
                self.push(Step::Fragment(entry(operator.as_str(), clauses)))
            }
            Err(error) => {
                self.fail(error);
                self
            }
        }
    }

    /// Append `document` unchanged. No validation is applied.
    pub fn raw(self, document: Document) -> Self {
        self.push(Step::Fragment(document))
    }

    /// Adopt a parent's source and validation setting.
    pub(crate) fn inherit(&mut self, parent: &Binding) {
        if parent.has_source() {
            self.binding = parent.clone();
        }
    }

    /// Resolve every recorded call into `(key, condition)` clauses, in call
    /// order and without merging repeated keys.
    fn clauses(&self) -> Result<Vec<(String, Bson)>> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        let mut clauses = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            match step {
                Step::Compare {
                    operator,
                    field,
                    value,
                } => {
                    let path = self.binding.resolve(field)?;
                    let condition = entry(operator.as_str(), value.clone());
                    clauses.push((path, Bson::Document(condition)));
                }
                Step::Regex {
                    field,
                    pattern,
                    options,
                } => {
                    let path = self.binding.resolve(field)?;
                    let mut condition = entry(Operator::Regex.as_str(), pattern.as_str());
                    if let Some(options) = options {
                        condition.insert(Operator::Options.as_str(), options.as_str());
                    }
                    clauses.push((path, Bson::Document(condition)));
                }
                Step::ElemMatch { field, filter } => {
                    let path = self.binding.resolve(field)?;
                    let sub = filter.build()?;
                    if sub.is_empty() {
                        return Err(Error::EmptyLogicalOperand(Operator::ElemMatch.as_str()));
                    }
                    let condition = entry(Operator::ElemMatch.as_str(), sub);
                    clauses.push((path, Bson::Document(condition)));
                }
                Step::Fragment(fragment) => clauses.extend(fragment.clone()),
            }
        }
        Ok(clauses)
    }

    /// Resolve every recorded call into a filter document, or return the
    /// first error. Conditions on the same field share one sub-document.
    pub fn build(&self) -> Result<Document> {
        let mut query = Document::new();
        for (key, value) in self.clauses()? {
            merge_entry(&mut query, key, value);
        }
        tracing::debug!(steps = self.steps.len(), keys = query.len(), "built filter");
        Ok(query)
    }

    /// The built filter as relaxed extended JSON.
    pub fn to_json(&self) -> Result<String> {
        to_relaxed_json(Bson::Document(self.build()?))
    }
}

fn as_array(value: Bson) -> Bson {
    match value {
        Bson::Array(_) => value,
        other => Bson::Array(vec![other]),
    }
}
