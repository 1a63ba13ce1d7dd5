#![allow(dead_code)]

use nc_news::config::Config;
use nc_news::db::{self, data, seed};
use rocket::http::Status;
use rocket::local::blocking::{Client, LocalResponse};
use rocket::{Build, Rocket};
use serde_json::Value;
use tempfile::TempDir;

/// A client over a freshly seeded database that lives as long as the value.
pub struct TestApp {
    pub client: Client,
    _dir: TempDir,
}

/// An unlaunched server over a freshly seeded database file. The database is
/// removed when the returned directory is dropped.
pub fn seeded_rocket(pool_size: u32) -> (Rocket<Build>, TempDir) {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = dir.path().join("nc_news_test.db");
    let config = Config::new(path.to_string_lossy(), pool_size);
    let pool = db::init_pool(&config).expect("database pool");
    {
        let mut conn = pool.get().expect("database connection");
        let fixtures = data::test_data().expect("fixture data");
        seed::seed(&mut conn, &fixtures).expect("seeded database");
    }
    (nc_news::rocket(pool), dir)
}

pub fn app() -> TestApp {
    let (rocket, dir) = seeded_rocket(4);
    let client = Client::tracked(rocket).expect("valid rocket instance");
    TestApp { client, _dir: dir }
}

fn read(response: LocalResponse<'_>) -> (Status, Value) {
    let status = response.status();
    let body = response.into_json::<Value>().unwrap_or(Value::Null);
    (status, body)
}

impl TestApp {
    pub fn get(&self, uri: &str) -> (Status, Value) {
        read(self.client.get(uri.to_string()).dispatch())
    }

    pub fn post(&self, uri: &str, body: Value) -> (Status, Value) {
        read(self.client.post(uri.to_string()).json(&body).dispatch())
    }

    pub fn patch(&self, uri: &str, body: Value) -> (Status, Value) {
        read(self.client.patch(uri.to_string()).json(&body).dispatch())
    }

    pub fn patch_empty(&self, uri: &str) -> (Status, Value) {
        read(self.client.patch(uri.to_string()).dispatch())
    }

    pub fn delete(&self, uri: &str) -> (Status, Value) {
        read(self.client.delete(uri.to_string()).dispatch())
    }
}

pub fn msg(body: &Value) -> &str {
    body["msg"].as_str().unwrap_or_default()
}
