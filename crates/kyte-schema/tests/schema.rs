use bson::oid::ObjectId;
use kyte_schema::{Schema, SchemaError, field};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Todo {
    id: String,
    name: String,
    message: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ArrayStruct {
    user_id: String,
    username: String,
    #[serde(rename = "type")]
    kind: String,
    todos: Vec<Todo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OptionalArrayStruct {
    user_id: String,
    username: String,
    #[serde(rename = "type")]
    kind: String,
    todos: Option<Vec<Todo>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BoxedArrayStruct {
    user_id: String,
    username: String,
    #[serde(rename = "type")]
    kind: String,
    todos: Vec<Box<Todo>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct NestedStruct {
    user_id: String,
    username: String,
    #[serde(rename = "type")]
    kind: String,
    todo: Todo,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OptionalNestedStruct {
    user_id: String,
    username: String,
    #[serde(rename = "type")]
    kind: String,
    todo: Option<Todo>,
}

fn sorted(schema: &Schema) -> Vec<&str> {
    let mut names: Vec<&str> = schema.names().iter().map(String::as_str).collect();
    names.sort_unstable();
    names
}

const TODO_CONTAINER_PATHS: [&str; 7] = [
    "todos",
    "todos.id",
    "todos.message",
    "todos.name",
    "type",
    "user_id",
    "username",
];

const NESTED_USER: [&str; 7] = [
    "todo",
    "todo.id",
    "todo.message",
    "todo.name",
    "type",
    "user_id",
    "username",
];

// ── Sequences of structs ────────────────────────────────────────

#[test]
fn empty_vec_of_structs_declares_element_fields() {
    let source = ArrayStruct::default();
    let schema = Schema::of(&source).unwrap();
    assert_eq!(sorted(&schema), TODO_CONTAINER_PATHS);
    assert_eq!(schema.path_of(&field(&source.user_id)), Some("user_id"));
    assert_eq!(schema.path_of(&field(&source.kind)), Some("type"));
    assert_eq!(schema.path_of(&field(&source.todos)), Some("todos"));
}

#[test]
fn populated_vec_resolves_first_element_fields() {
    let source = ArrayStruct {
        user_id: "u1".into(),
        todos: vec![
            Todo {
                id: "t1".into(),
                ..Default::default()
            },
            Todo {
                id: "t2".into(),
                ..Default::default()
            },
        ],
        ..Default::default()
    };
    let schema = Schema::of(&source).unwrap();
    assert_eq!(sorted(&schema), TODO_CONTAINER_PATHS);
    assert_eq!(schema.path_of(&field(&source.todos[0].name)), Some("todos.name"));
    assert_eq!(schema.path_of(&field(&source.todos[1].name)), None);
}

#[test]
fn optional_vec_of_structs() {
    let empty = OptionalArrayStruct::default();
    assert_eq!(sorted(&Schema::of(&empty).unwrap()), TODO_CONTAINER_PATHS);

    let filled = OptionalArrayStruct {
        todos: Some(vec![Todo::default()]),
        ..Default::default()
    };
    let schema = Schema::of(&filled).unwrap();
    assert_eq!(sorted(&schema), TODO_CONTAINER_PATHS);
    let first = &filled.todos.as_ref().unwrap()[0];
    assert_eq!(schema.path_of(&field(&first.message)), Some("todos.message"));
}

#[test]
fn vec_of_boxed_structs() {
    let source = BoxedArrayStruct {
        todos: vec![Box::new(Todo::default())],
        ..Default::default()
    };
    let schema = Schema::of(&source).unwrap();
    assert_eq!(sorted(&schema), TODO_CONTAINER_PATHS);
    assert_eq!(schema.path_of(&field(&source.todos[0].id)), Some("todos.id"));
    assert_eq!(
        sorted(&Schema::of(&BoxedArrayStruct::default()).unwrap()),
        TODO_CONTAINER_PATHS
    );
}

// ── Nested structs ──────────────────────────────────────────────

#[test]
fn nested_struct_paths() {
    let source = NestedStruct::default();
    let schema = Schema::of(&source).unwrap();
    assert_eq!(sorted(&schema), NESTED_USER);
    assert_eq!(schema.path_of(&field(&source.todo)), Some("todo"));
    assert_eq!(schema.path_of(&field(&source.todo.id)), Some("todo.id"));
    assert_eq!(schema.path_of(&field(&source.todo.message)), Some("todo.message"));
}

#[test]
fn optional_nested_struct() {
    let absent = OptionalNestedStruct::default();
    let schema = Schema::of(&absent).unwrap();
    assert_eq!(sorted(&schema), NESTED_USER);
    assert_eq!(schema.path_of(&field(&absent.todo)), Some("todo"));

    let present = OptionalNestedStruct {
        todo: Some(Todo::default()),
        ..Default::default()
    };
    let schema = Schema::of(&present).unwrap();
    let todo = present.todo.as_ref().unwrap();
    assert_eq!(schema.path_of(&field(&todo.name)), Some("todo.name"));
}

// ── Attributes and edge cases ───────────────────────────────────

#[test]
fn skipped_fields_are_not_declared() {
    #[derive(Default, Serialize, Deserialize)]
    struct Secretive {
        visible: String,
        #[serde(skip)]
        hidden: String,
    }

    let source = Secretive::default();
    let schema = Schema::of(&source).unwrap();
    assert_eq!(schema.names(), ["visible"]);
    assert!(!schema.contains("hidden"));
    assert_eq!(schema.path_of(&field(&source.hidden)), None);
}

#[test]
fn object_id_is_a_leaf() {
    #[derive(Serialize, Deserialize)]
    struct Document {
        #[serde(rename = "_id")]
        id: ObjectId,
        name: String,
    }

    let source = Document {
        id: ObjectId::new(),
        name: "kyte".into(),
    };
    let schema = Schema::of(&source).unwrap();
    assert!(schema.contains("_id"));
    assert!(schema.contains("name"));
    assert!(schema.names().iter().all(|n| !n.contains('$')));
    assert_eq!(schema.path_of(&field(&source.id)), Some("_id"));
}

#[test]
fn field_from_another_value_does_not_resolve() {
    let source = NestedStruct::default();
    let other = NestedStruct::default();
    let schema = Schema::of(&source).unwrap();
    assert_eq!(schema.path_of(&field(&other.username)), None);
}

#[test]
fn non_struct_source_is_rejected() {
    assert_eq!(Schema::of(&42_i32).unwrap_err(), SchemaError::NotStruct);
    assert_eq!(
        Schema::of(&vec!["a".to_string()]).unwrap_err(),
        SchemaError::NotStruct
    );
    assert_eq!(
        Schema::of(&"text".to_string()).unwrap_err(),
        SchemaError::NotStruct
    );
}

// ── MongoDB model attributes ────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct Model {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    name: String,
}

#[test]
fn object_id_leaf_keeps_later_element_names() {
    #[derive(Serialize, Deserialize)]
    struct Board {
        #[serde(rename = "_id")]
        id: ObjectId,
        todos: Vec<Todo>,
    }

    let source = Board {
        id: ObjectId::new(),
        todos: Vec::new(),
    };
    let schema = Schema::of(&source).unwrap();
    assert!(schema.contains("_id"));
    assert!(schema.contains("todos.name"));
    assert!(schema.contains("todos.message"));
}

#[test]
fn field_skipped_when_empty_is_declared_but_omitted() {
    let empty = Model::default();
    let schema = Schema::of(&empty).unwrap();
    assert!(schema.contains("_id"));
    assert_eq!(schema.omitted(), ["_id"]);
    assert_eq!(schema.path_of(&field(&empty.id)), None);
    assert!(schema.is_omitted(&field(&empty.id)));
    assert!(!schema.is_omitted(&field(&empty.name)));

    let other = Model::default();
    assert!(!schema.is_omitted(&field(&other.id)));
}

#[test]
fn populated_skippable_field_resolves() {
    let populated = Model {
        id: Some(ObjectId::new()),
        ..Default::default()
    };
    let schema = Schema::of(&populated).unwrap();
    assert!(schema.omitted().is_empty());
    assert_eq!(schema.path_of(&field(&populated.id)), Some("_id"));
}

#[test]
fn flattened_fields_sit_at_parent_level() {
    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Meta {
        created_by: String,
        #[serde(rename = "rev")]
        revision: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Flat {
        name: String,
        #[serde(flatten)]
        meta: Meta,
    }

    let source = Flat::default();
    let schema = Schema::of(&source).unwrap();
    assert!(schema.contains("name"));
    assert!(schema.contains("created_by"));
    assert!(schema.contains("rev"));
    assert!(!schema.contains("meta"));
    assert_eq!(schema.path_of(&field(&source.name)), Some("name"));
    assert_eq!(schema.path_of(&field(&source.meta.revision)), Some("rev"));
}
