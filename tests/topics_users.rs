mod common;

use common::{app, msg};
use rocket::http::Status;
use serde_json::{json, Value};

#[test]
fn api_serves_endpoint_documentation() {
    let app = app();
    let (status, body) = app.get("/api");
    assert_eq!(status, Status::Ok);
    let expected: Value = serde_json::from_str(include_str!("../endpoints.json")).unwrap();
    assert_eq!(body["endpoints"], expected);
}

#[test]
fn unknown_paths_are_404() {
    let app = app();
    for uri in ["/api/tapicsss", "/api/articlaass", "/api/userssss"] {
        let (status, body) = app.get(uri);
        assert_eq!(status, Status::NotFound, "{}", uri);
        assert_eq!(msg(&body), "path not found...");
    }
}

#[test]
fn lists_topics() {
    let app = app();
    let (status, body) = app.get("/api/topics");
    assert_eq!(status, Status::Ok);
    let topics = body["topics"].as_array().unwrap();
    assert_eq!(topics.len(), 3);
    for topic in topics {
        assert!(topic["slug"].is_string());
        assert!(topic["description"].is_string());
    }
}

#[test]
fn creates_a_topic() {
    let app = app();
    let (status, body) = app.post(
        "/api/topics",
        json!({ "slug": "Studio Ghibli", "description": "All things Ghibli related!" }),
    );
    assert_eq!(status, Status::Created);
    assert_eq!(body["topic"]["slug"], "Studio Ghibli");
    assert_eq!(body["topic"]["description"], "All things Ghibli related!");
    assert_eq!(body["topic"]["img_url"], Value::Null);

    let (_, body) = app.get("/api/topics");
    let topics = body["topics"].as_array().unwrap();
    assert!(topics.iter().any(|t| t["slug"] == "Studio Ghibli"));
}

#[test]
fn topic_requires_slug_and_description() {
    let app = app();
    let (status, body) = app.post("/api/topics", json!({ "slug": "Studio Ghibli" }));
    assert_eq!(status, Status::BadRequest);
    assert_eq!(msg(&body), "Bad Request: Missing required fields...");

    let (status, body) = app.post("/api/topics", json!({ "slug": 42, "description": "numbers" }));
    assert_eq!(status, Status::BadRequest);
    assert_eq!(msg(&body), "Invalid data type");
}

#[test]
fn duplicate_topic_is_a_conflict() {
    let app = app();
    let input = json!({
        "slug": "Dead by Daylight Tips",
        "description": "Wanna GIT GUD and become a DbD Pro? You're in the right place"
    });
    let (status, _) = app.post("/api/topics", input.clone());
    assert_eq!(status, Status::Created);
    let (status, body) = app.post("/api/topics", input);
    assert_eq!(status, Status::Conflict);
    assert_eq!(
        msg(&body),
        "Conflict: Value already exists/cannot insert duplicate value"
    );
}

#[test]
fn lists_users() {
    let app = app();
    let (status, body) = app.get("/api/users");
    assert_eq!(status, Status::Ok);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 4);
    for user in users {
        assert!(user["username"].is_string());
        assert!(user["name"].is_string());
        assert!(user["avatar_url"].is_string());
    }
}

#[test]
fn gets_a_user_by_username() {
    let app = app();
    let (status, body) = app.get("/api/users/rogersop");
    assert_eq!(status, Status::Ok);
    assert_eq!(
        body["user"],
        json!({
            "username": "rogersop",
            "name": "paul",
            "avatar_url": "https://avatars2.githubusercontent.com/u/24394918?s=400&v=4"
        })
    );

    let (status, body) = app.get("/api/users/nonexistentusername");
    assert_eq!(status, Status::NotFound);
    assert_eq!(msg(&body), "username not found...");
}
