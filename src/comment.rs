use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use diesel::{delete as diesel_delete, insert_into, update as diesel_update};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{Json, Value};
use serde::Serialize;
use tracing::info;

use crate::article::query::Pagination;
use crate::article::{Article, ARTICLE_NOT_FOUND};
use crate::db::schema::comments;
use crate::db::DbConnection;
use crate::types::{parse_id, ApiError, ApiResult, RequestBody, Validate};
use crate::users::models::User;
use crate::utils::serialize_date;

const USERNAME_NOT_FOUND: &str = "username not found";

#[derive(Debug, Queryable, Identifiable, Serialize, PartialEq)]
#[diesel(table_name = comments, primary_key(comment_id))]
pub struct Comment {
    pub comment_id: i32,
    pub article_id: i32,
    pub body: String,
    pub votes: i64,
    pub author: String,
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    article_id: i32,
    author: String,
    body: String,
}

impl NewComment {
    fn from_body(article_id: i32, body: &RequestBody) -> Result<NewComment, ApiError> {
        body.require(&["username", "body"])?;
        Ok(NewComment {
            article_id,
            author: body.required_string("username")?,
            body: body.required_string("body")?,
        })
    }
}

impl Validate for NewComment {
    type Error = ApiError;
    fn validate(self, connection: &mut SqliteConnection) -> Result<Self, ApiError> {
        if !Article::exists(self.article_id, connection)? {
            return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
        }
        if !User::exists(&self.author, connection)? {
            return Err(ApiError::BadRequest(USERNAME_NOT_FOUND));
        }
        Ok(self)
    }
}

#[derive(Debug, Serialize)]
pub struct CommentContainer<T> {
    comment: T,
}

#[derive(Debug, Serialize)]
pub struct CommentsContainer<T> {
    comments: T,
}

/// A freshly added comment. The poster's name is echoed as `username`, the key
/// it was submitted under, next to the stored `author`.
#[derive(Debug, Serialize)]
pub struct PostedComment {
    #[serde(flatten)]
    comment: Comment,
    username: String,
}

impl From<Comment> for PostedComment {
    fn from(comment: Comment) -> PostedComment {
        PostedComment {
            username: comment.author.clone(),
            comment,
        }
    }
}

#[get("/<article_id>/comments?<limit>&<page>")]
pub async fn list(
    connection: DbConnection,
    article_id: &str,
    limit: Option<&str>,
    page: Option<&str>,
) -> ApiResult<CommentsContainer<Vec<Comment>>> {
    let article_id = parse_id(article_id)?;
    let pagination = Pagination::parse(limit, page)?;
    connection
        .run(move |conn| {
            if !Article::exists(article_id, conn)? {
                return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
            }

            let comments = comments::table
                .filter(comments::article_id.eq(article_id))
                .order((comments::created_at.desc(), comments::comment_id.desc()))
                .limit(pagination.limit)
                .offset(pagination.offset())
                .load::<Comment>(conn)?;
            Ok(Json(CommentsContainer { comments }))
        })
        .await
}

#[post("/<article_id>/comments", data = "<body>")]
pub async fn add(
    connection: DbConnection,
    article_id: &str,
    body: Option<Json<Value>>,
) -> Result<status::Custom<Json<CommentContainer<PostedComment>>>, ApiError> {
    let article_id = parse_id(article_id)?;
    let new_comment = NewComment::from_body(article_id, &RequestBody::from_json(body))?;
    connection
        .run(move |conn| {
            let new_comment = new_comment.validate(conn)?;
            let comment = insert_into(comments::table)
                .values(&new_comment)
                .get_result::<Comment>(conn)
                .map_err(|e| match e {
                    // the user went away between the check and the insert
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        ApiError::BadRequest(USERNAME_NOT_FOUND)
                    }
                    other => other.into(),
                })?;
            info!("added comment {} to article {}", comment.comment_id, article_id);
            Ok(status::Custom(
                Status::Created,
                Json(CommentContainer {
                    comment: PostedComment::from(comment),
                }),
            ))
        })
        .await
}

#[patch("/<comment_id>", data = "<body>")]
pub async fn vote(
    connection: DbConnection,
    comment_id: &str,
    body: Option<Json<Value>>,
) -> ApiResult<CommentContainer<Comment>> {
    let comment_id = parse_id(comment_id)?;
    let inc_votes = match RequestBody::from_json(body).integer("inc_votes")? {
        Some(inc_votes) => inc_votes,
        None => return Err(ApiError::BadRequest("bad request: missing 'inc_votes'")),
    };
    connection
        .run(move |conn| {
            let comment = diesel_update(comments::table.find(comment_id))
                .set(comments::votes.eq(comments::votes + i64::from(inc_votes)))
                .get_result::<Comment>(conn)
                .optional()?;
            match comment {
                Some(comment) => Ok(Json(CommentContainer { comment })),
                None => Err(ApiError::NotFound("comment does not exist")),
            }
        })
        .await
}

#[delete("/<comment_id>")]
pub async fn delete(connection: DbConnection, comment_id: &str) -> Result<Status, ApiError> {
    let comment_id = parse_id(comment_id)?;
    connection
        .run(move |conn| {
            let deleted = diesel_delete(comments::table.find(comment_id)).execute(conn)?;
            if deleted == 0 {
                return Err(ApiError::NotFound("comment id does not exist"));
            }
            info!("deleted comment {}", comment_id);
            Ok(Status::NoContent)
        })
        .await
}
