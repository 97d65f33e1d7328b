use std::marker::PhantomData;

use bson::{Bson, Document};
use kyte_schema::Field;

use crate::accumulator::Accumulator;
use crate::document::{entry, to_relaxed_json};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::operator::{Stage, UNDERSCORE_ID};
use crate::options::{Binding, Options};
use crate::sort::{Sort, SortDirection};

/// An aggregation pipeline builder.
///
/// Stages are appended in call order. Field arguments resolve against the
/// bound source like they do in [`Filter`]; sub-filters passed to
/// [`Aggregate::match_filter`] inherit the source. Global filters in the
/// options apply to filters only.
///
/// ```ignore
/// let pipeline = Aggregate::new()
///     .match_filter(Filter::new().exists("age", true).greater_than("age", 10))
///     .group("$city", Accumulator::new().count("people"))
///     .sort("people", SortDirection::Desc)
///     .limit(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Aggregate<'s> {
    binding: Binding,
    pipeline: Vec<Document>,
    error: Option<Error>,
    _source: PhantomData<&'s ()>,
}

impl<'s> Aggregate<'s> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options<'s>) -> Self {
        let (binding, _, error) = options.into_parts();
        let mut aggregate = Aggregate {
            binding,
            ..Default::default()
        };
        if let Some(error) = error {
            aggregate.fail(error);
        }
        aggregate
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            tracing::debug!(%error, "pipeline rejected");
            self.error = Some(error);
        }
    }

    fn stage(mut self, stage: Stage, value: impl Into<Bson>) -> Self {
        if self.error.is_none() {
            self.pipeline.push(entry(stage.as_str(), value));
        }
        self
    }

    /// The body of the last stage, if it is a `stage` stage.
    fn last_stage_mut(&mut self, stage: Stage) -> Option<&mut Document> {
        let last = self.pipeline.last_mut()?;
        if last.len() != 1 {
            return None;
        }
        last.get_document_mut(stage.as_str()).ok()
    }

    fn resolve(&mut self, field: &Field<'_>) -> Option<String> {
        if self.error.is_some() {
            return None;
        }
        match self.binding.resolve(field) {
            Ok(path) => Some(path),
            Err(error) => {
                self.fail(error);
                None
            }
        }
    }

    /// `{"$match": filter}`
    pub fn match_filter(mut self, mut filter: Filter<'s>) -> Self {
        if self.error.is_some() {
            return self;
        }
        filter.inherit(&self.binding);
        match filter.build() {
            Ok(query) => self.stage(Stage::Match, query),
            Err(error) => {
                self.fail(error);
                self
            }
        }
    }

    /// `{"$group": {"_id": id, ..accumulator}}`. An empty accumulator adds no
    /// stage; an accumulator output named `_id` is rejected.
    pub fn group(mut self, id: impl Into<Bson>, accumulator: Accumulator) -> Self {
        if accumulator.is_empty() {
            return self;
        }
        let outputs = accumulator.build();
        if outputs.contains_key(UNDERSCORE_ID) {
            self.fail(Error::ReservedGroupField);
            return self;
        }
        let mut body = entry(UNDERSCORE_ID, id);
        for (key, value) in outputs {
            body.insert(key, value);
        }
        self.stage(Stage::Group, body)
    }

    /// `{"$project": projection}`
    pub fn project(self, projection: Document) -> Self {
        self.stage(Stage::Project, projection)
    }

    /// `{"$sort": {field: 1 | -1}}`. Consecutive sorts share one stage.
    pub fn sort(mut self, field: impl Into<Field<'s>>, direction: SortDirection) -> Self {
        let Some(path) = self.resolve(&field.into()) else {
            return self;
        };
        match self.last_stage_mut(Stage::Sort) {
            Some(keys) => {
                keys.insert(path, direction);
                self
            }
            None => self.stage(Stage::Sort, entry(path, direction)),
        }
    }

    /// Sort by a list of field names, e.g. loaded from configuration.
    pub fn sort_by(self, sorts: impl IntoIterator<Item = Sort>) -> Self {
        sorts
            .into_iter()
            .fold(self, |aggregate, sort| aggregate.sort(sort.field, sort.direction))
    }

    /// `{"$limit": n}`
    pub fn limit(self, n: i64) -> Self {
        self.stage(Stage::Limit, n)
    }

    /// `{"$skip": n}`
    pub fn skip(self, n: i64) -> Self {
        self.stage(Stage::Skip, n)
    }

    /// `{"$unwind": "$field"}`
    pub fn unwind(mut self, field: impl Into<Field<'s>>) -> Self {
        let Some(path) = self.resolve(&field.into()) else {
            return self;
        };
        self.stage(Stage::Unwind, format!("${path}"))
    }

    /// `{"$lookup": {"from", "localField", "foreignField", "as"}}`. Only the
    /// local field belongs to the bound source.
    pub fn lookup(
        mut self,
        from: &str,
        local_field: impl Into<Field<'s>>,
        foreign_field: &str,
        as_field: &str,
    ) -> Self {
        let Some(local) = self.resolve(&local_field.into()) else {
            return self;
        };
        let mut body = Document::new();
        body.insert("from", from);
        body.insert("localField", local);
        body.insert("foreignField", foreign_field);
        body.insert("as", as_field);
        self.stage(Stage::Lookup, body)
    }

    /// `{"$facet": {name: [..pipeline]}}`. Consecutive facets share one stage.
    /// `sub` resolves its fields against its own options.
    pub fn facet(mut self, name: &str, sub: Aggregate<'s>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let pipeline = match sub.build() {
            Ok(pipeline) => pipeline,
            Err(error) => {
                self.fail(error);
                return self;
            }
        };
        let stages: Vec<Bson> = pipeline.into_iter().map(Bson::Document).collect();
        match self.last_stage_mut(Stage::Facet) {
            Some(facets) => {
                facets.insert(name, stages);
                self
            }
            None => self.stage(Stage::Facet, entry(name, stages)),
        }
    }

    /// Append a stage unchanged. No validation is applied.
    pub fn raw(mut self, stage: Document) -> Self {
        if self.error.is_none() {
            self.pipeline.push(stage);
        }
        self
    }

    pub fn build(&self) -> Result<Vec<Document>> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        tracing::debug!(stages = self.pipeline.len(), "built pipeline");
        Ok(self.pipeline.clone())
    }

    /// The built pipeline as a relaxed extended JSON array.
    pub fn to_json(&self) -> Result<String> {
        let stages = self.build()?.into_iter().map(Bson::Document).collect();
        to_relaxed_json(Bson::Array(stages))
    }
}
