use bson::{Bson, Document};

use crate::error::Result;
use crate::operator::Operator;

/// Insert `key: value` into `target` without losing an existing entry.
///
/// Two operator documents with disjoint operators merge key by key
/// (`{"age": {"$gt": 1}}` plus `{"age": {"$lt": 9}}` gives
/// `{"age": {"$gt": 1, "$lt": 9}}`) and repeated `$and`/`$nor` arrays
/// concatenate. Any other collision moves both conditions into `$and`
/// clauses so that both still apply.
pub(crate) fn merge_entry(target: &mut Document, key: String, value: Bson) {
    let value = match target.get_mut(&key) {
        None => {
            target.insert(key, value);
            return;
        }
        Some(existing) => match combine(&key, existing, value) {
            Ok(()) => return,
            Err(value) => value,
        },
    };
    if let Some(previous) = target.remove(&key) {
        conjoin(target, key, previous, value);
    }
}

/// Fold `value` into `existing` when both fit in one entry, else hand it back.
fn combine(key: &str, existing: &mut Bson, value: Bson) -> Result<(), Bson> {
    match (existing, value) {
        (Bson::Document(current), Bson::Document(incoming))
            if is_operator_document(current)
                && is_operator_document(&incoming)
                && incoming.keys().all(|k| !current.contains_key(k)) =>
        {
            for (k, v) in incoming {
                current.insert(k, v);
            }
            Ok(())
        }
        (Bson::Array(current), Bson::Array(incoming)) if concatenates(key) => {
            current.extend(incoming);
            Ok(())
        }
        (_, value) => Err(value),
    }
}

/// `$and` and `$nor` groups combine by concatenation; `$or` groups do not.
fn concatenates(key: &str) -> bool {
    key == Operator::And.as_str() || key == Operator::Nor.as_str()
}

/// `{"$gt": 1}` is an operator document, `{"city": "Berlin"}` is an
/// embedded-document equality.
fn is_operator_document(document: &Document) -> bool {
    !document.is_empty() && document.keys().all(|k| k.starts_with('$'))
}

/// Append `{key: previous}` and `{key: value}` to the `$and` clauses.
fn conjoin(target: &mut Document, key: String, previous: Bson, value: Bson) {
    let clauses = [entry(key.clone(), previous), entry(key, value)].map(Bson::Document);
    match target.get_mut(Operator::And.as_str()) {
        Some(Bson::Array(and)) => and.extend(clauses),
        _ => merge_entry(target, Operator::And.as_str().into(), Bson::Array(clauses.into())),
    }
}

/// A single-entry document.
pub(crate) fn entry(key: impl Into<String>, value: impl Into<Bson>) -> Document {
    let mut document = Document::new();
    document.insert(key.into(), value.into());
    document
}

/// Render as relaxed extended JSON.
pub(crate) fn to_relaxed_json(value: Bson) -> Result<String> {
    Ok(serde_json::to_string(&value.into_relaxed_extjson())?)
}
