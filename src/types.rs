use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde_json::{json, Map, Value};
use tracing::error;

use crate::utils::try_respond;

pub const MISSING_FIELDS: &str = "Bad Request: Missing required fields...";
pub const INVALID_TYPE: &str = "Invalid data type";
pub const DUPLICATE_VALUE: &str = "Conflict: Value already exists/cannot insert duplicate value";
pub const FOREIGN_KEY_VIOLATION: &str = "Not found: Foreign key violation...";
pub const INTERNAL: &str = "internal server error";

/// Checks that hold across entities, run against the store before a write.
pub trait Validate
where
    Self: Sized,
{
    type Error;
    fn validate(self, connection: &mut SqliteConnection) -> Result<Self, Self::Error>;
}

#[derive(Debug)]
pub enum ApiError {
    Diesel(DieselError),
    BadRequest(&'static str),
    NotFound(&'static str),
    Internal,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        ApiError::Diesel(err)
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn status(&self) -> (Status, &'static str) {
        match self {
            ApiError::BadRequest(msg) => (Status::BadRequest, *msg),
            ApiError::NotFound(msg) => (Status::NotFound, *msg),
            ApiError::Diesel(error) => match error {
                DieselError::DatabaseError(kind, _) => match kind {
                    DatabaseErrorKind::UniqueViolation => (Status::Conflict, DUPLICATE_VALUE),
                    DatabaseErrorKind::ForeignKeyViolation => {
                        (Status::BadRequest, FOREIGN_KEY_VIOLATION)
                    }
                    DatabaseErrorKind::NotNullViolation => (Status::BadRequest, MISSING_FIELDS),
                    _ => (Status::InternalServerError, INTERNAL),
                },
                _ => (Status::InternalServerError, INTERNAL),
            },
            ApiError::Internal => (Status::InternalServerError, INTERNAL),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let (status, msg) = self.status();
        if status == Status::InternalServerError {
            error!("{} {} failed: {:?}", req.method(), req.uri(), self);
        }
        try_respond(req, json!({ "msg": msg }), status)
    }
}

/// Path segments arrive as text so that a malformed id is a 400, not a
/// fall-through to the 404 catcher.
pub fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>().map_err(|_| ApiError::BadRequest(INVALID_TYPE))
}

/// A JSON object request body. Anything that is not an object reads as empty.
#[derive(Debug, Default)]
pub struct RequestBody(Map<String, Value>);

impl RequestBody {
    pub fn from_json(body: Option<Json<Value>>) -> RequestBody {
        match body.map(Json::into_inner) {
            Some(Value::Object(map)) => RequestBody(map),
            _ => RequestBody::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// Fails with the missing-fields error unless every key is present and
    /// non-blank.
    pub fn require(&self, keys: &[&str]) -> Result<(), ApiError> {
        if keys.iter().all(|key| self.contains(key)) {
            Ok(())
        } else {
            Err(ApiError::BadRequest(MISSING_FIELDS))
        }
    }

    pub fn string(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ApiError::BadRequest(INVALID_TYPE)),
        }
    }

    pub fn required_string(&self, key: &str) -> Result<String, ApiError> {
        self.string(key)?.ok_or(ApiError::BadRequest(MISSING_FIELDS))
    }

    pub fn integer(&self, key: &str) -> Result<Option<i32>, ApiError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Some)
                .ok_or(ApiError::BadRequest(INVALID_TYPE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> RequestBody {
        RequestBody::from_json(Some(Json(value)))
    }

    #[test]
    fn parse_id_rejects_text() {
        assert_eq!(parse_id("12").ok(), Some(12));
        assert_eq!(parse_id("-1").ok(), Some(-1));
        match parse_id("notAnID") {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, INVALID_TYPE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn non_object_body_is_empty() {
        assert!(RequestBody::from_json(None).is_empty());
        assert!(body(json!([1, 2, 3])).is_empty());
        assert!(body(json!("inc_votes")).is_empty());
    }

    #[test]
    fn require_treats_null_and_blank_as_missing() {
        let b = body(json!({ "username": "lurker", "body": "  ", "extra": null }));
        assert!(b.require(&["username"]).is_ok());
        assert!(b.require(&["username", "body"]).is_err());
        assert!(b.require(&["extra"]).is_err());
    }

    #[test]
    fn string_rejects_numbers() {
        let b = body(json!({ "title": 12345, "topic": "mitch" }));
        assert_eq!(b.string("topic").ok().flatten().as_deref(), Some("mitch"));
        assert_eq!(b.string("missing").ok(), Some(None));
        match b.string("title") {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, INVALID_TYPE),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn integer_accepts_only_whole_numbers_in_range() {
        let b = body(json!({ "a": -20, "b": "10", "c": 1.5, "d": 9_999_999_999i64 }));
        assert_eq!(b.integer("a").ok(), Some(Some(-20)));
        assert!(b.integer("b").is_err());
        assert!(b.integer("c").is_err());
        assert!(b.integer("d").is_err());
        assert_eq!(b.integer("e").ok(), Some(None));
    }

    #[test]
    fn database_errors_map_to_statuses() {
        let unique = ApiError::Diesel(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("UNIQUE constraint failed: topics.slug")),
        ));
        assert_eq!(unique.status(), (Status::Conflict, DUPLICATE_VALUE));

        let fk = ApiError::Diesel(DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new(String::from("FOREIGN KEY constraint failed")),
        ));
        assert_eq!(fk.status(), (Status::BadRequest, FOREIGN_KEY_VIOLATION));

        let not_null = ApiError::Diesel(DieselError::DatabaseError(
            DatabaseErrorKind::NotNullViolation,
            Box::new(String::from("NOT NULL constraint failed: topics.description")),
        ));
        assert_eq!(not_null.status(), (Status::BadRequest, MISSING_FIELDS));

        // lookups go through `.optional()`; a bare NotFound is a handler bug
        let stray = ApiError::Diesel(DieselError::NotFound);
        assert_eq!(stray.status(), (Status::InternalServerError, INTERNAL));
        assert_eq!(ApiError::Internal.status().0, Status::InternalServerError);
    }
}
