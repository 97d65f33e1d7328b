#![allow(dead_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub done: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Address {
    pub city: String,
    #[serde(rename = "zip_code")]
    pub zip: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub surname: String,
    pub age: i32,
    #[serde(rename = "tenant_id")]
    pub tenant: String,
    pub roles: Vec<String>,
    pub address: Address,
    pub todos: Vec<Todo>,
    #[serde(skip)]
    pub session: String,
}

/// Route builder logs to the test output. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
