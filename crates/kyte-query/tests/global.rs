mod common;
use common::*;

use bson::doc;
use kyte_query::{Error, Filter, GlobalFilters, Options, field};

#[test]
fn globals_lead_the_built_document() {
    init_tracing();
    let globals = GlobalFilters::new();
    globals
        .add(&Filter::new().equal("tenant_id", "123"))
        .unwrap();

    let query = Filter::with_options(Options::new().globals(&globals))
        .equal("name", "John")
        .build()
        .unwrap();
    assert_eq!(
        query,
        doc! {
            "tenant_id": { "$eq": "123" },
            "name": { "$eq": "John" },
        }
    );
}

#[test]
fn globals_combine_with_source_validation() {
    let user = User::default();
    let globals = GlobalFilters::new();
    globals.add_document(doc! { "deleted_at": { "$exists": false } });

    let query = Filter::with_options(Options::new().source(&user).globals(&globals))
        .equal(field(&user.tenant), "123")
        .build()
        .unwrap();
    assert_eq!(
        query,
        doc! {
            "deleted_at": { "$exists": false },
            "tenant_id": { "$eq": "123" },
        }
    );
}

#[test]
fn globals_are_captured_at_construction() {
    let globals = GlobalFilters::new();
    globals.add_document(doc! { "a": 1 });

    let filter = Filter::with_options(Options::new().globals(&globals));
    globals.add_document(doc! { "b": 2 });

    assert_eq!(filter.build().unwrap(), doc! { "a": 1 });
    let later = Filter::with_options(Options::new().globals(&globals));
    assert_eq!(later.build().unwrap(), doc! { "a": 1, "b": 2 });
}

#[test]
fn filters_without_globals_are_unaffected() {
    let globals = GlobalFilters::new();
    globals.add_document(doc! { "tenant_id": "123" });

    let query = Filter::new().equal("name", "John").build().unwrap();
    assert_eq!(query, doc! { "name": { "$eq": "John" } });
}

#[test]
fn failing_global_filter_is_rejected() {
    init_tracing();
    let globals = GlobalFilters::new();
    let err = globals.add(&Filter::new().type_("name", &[])).unwrap_err();
    assert_eq!(err, Error::InvalidBsonType);
    assert!(globals.is_empty());
}

#[test]
fn same_field_global_merges_with_local_condition() {
    let globals = GlobalFilters::new();
    globals.add(&Filter::new().greater_than("age", 18)).unwrap();

    let query = Filter::with_options(Options::new().globals(&globals))
        .less_than("age", 65)
        .build()
        .unwrap();
    assert_eq!(query, doc! { "age": { "$gt": 18, "$lt": 65 } });
}

#[test]
fn local_condition_cannot_override_global() {
    let globals = GlobalFilters::new();
    globals.add(&Filter::new().equal("tenant_id", "A")).unwrap();

    let query = Filter::with_options(Options::new().globals(&globals))
        .equal("tenant_id", "B")
        .build()
        .unwrap();
    assert_eq!(
        query,
        doc! {
            "$and": [
                { "tenant_id": { "$eq": "A" } },
                { "tenant_id": { "$eq": "B" } },
            ]
        }
    );
}

#[test]
fn local_and_group_joins_global_conflict() {
    let globals = GlobalFilters::new();
    globals.add_document(doc! { "tenant_id": "A" });

    let query = Filter::with_options(Options::new().globals(&globals))
        .and(Filter::new().exists("name", true))
        .raw(doc! { "tenant_id": "B" })
        .build()
        .unwrap();
    assert_eq!(
        query,
        doc! {
            "$and": [
                { "name": { "$exists": true } },
                { "tenant_id": "A" },
                { "tenant_id": "B" },
            ]
        }
    );
}

#[test]
fn cleared_registry_adds_nothing() {
    let globals = GlobalFilters::new();
    globals.add_document(doc! { "tenant_id": "123" });
    globals.clear();

    let query = Filter::with_options(Options::new().globals(&globals))
        .exists("name", true)
        .build()
        .unwrap();
    assert_eq!(query, doc! { "name": { "$exists": true } });
}
