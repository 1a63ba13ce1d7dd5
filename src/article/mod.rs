use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer, Nullable, Text, Timestamp};
use diesel::sqlite::SqliteConnection;
use diesel::{delete as diesel_delete, insert_into, sql_query, update as diesel_update};
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{Json, Value};
use serde::Serialize;
use tracing::{debug, info};

use crate::db::schema::articles;
use crate::db::DbConnection;
use crate::topic::Topic;
use crate::types::{parse_id, ApiError, ApiResult, RequestBody, Validate};
use crate::users::models::User;
use crate::utils::serialize_date;

pub mod query;

use self::query::{ArticleQuery, ListParams};

pub const ARTICLE_NOT_FOUND: &str = "article not found";
pub const DEFAULT_IMG_URL: &str =
    "https://images.pexels.com/photos/97050/pexels-photo-97050.jpeg?w=700&h=700";

static SELECT_ARTICLE: &str = "SELECT articles.article_id AS article_id,
       articles.title AS title,
       articles.topic AS topic,
       articles.author AS author,
       articles.body AS body,
       articles.created_at AS created_at,
       articles.votes AS votes,
       articles.article_img_url AS article_img_url,
       COUNT(comments.comment_id) AS comment_count
  FROM articles
  LEFT JOIN comments ON comments.article_id = articles.article_id
 WHERE articles.article_id = ?
 GROUP BY articles.article_id";

/// A full article with the number of comments it has.
#[derive(Debug, QueryableByName, Serialize)]
pub struct Article {
    #[diesel(sql_type = Integer)]
    pub article_id: i32,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Text)]
    pub body: String,
    #[diesel(sql_type = Timestamp)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = BigInt)]
    pub votes: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub article_img_url: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub comment_count: i64,
}

/// An article as it appears in a listing: no body.
#[derive(Debug, QueryableByName, Serialize)]
pub struct ArticleSummary {
    #[diesel(sql_type = Integer)]
    pub article_id: i32,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Text)]
    pub topic: String,
    #[diesel(sql_type = Text)]
    pub author: String,
    #[diesel(sql_type = Timestamp)]
    #[serde(serialize_with = "serialize_date")]
    pub created_at: NaiveDateTime,
    #[diesel(sql_type = BigInt)]
    pub votes: i64,
    #[diesel(sql_type = Nullable<Text>)]
    pub article_img_url: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub comment_count: i64,
}

#[derive(Debug, QueryableByName)]
struct Total {
    #[diesel(sql_type = BigInt)]
    total_count: i64,
}

impl Article {
    pub fn load(id: i32, connection: &mut SqliteConnection) -> Result<Option<Article>, ApiError> {
        sql_query(SELECT_ARTICLE)
            .bind::<Integer, _>(id)
            .get_result::<Article>(connection)
            .optional()
            .map_err(|e| e.into())
    }

    pub fn exists(id: i32, connection: &mut SqliteConnection) -> Result<bool, ApiError> {
        use crate::db::schema::articles::dsl::*;
        diesel::select(diesel::dsl::exists(articles.filter(article_id.eq(id))))
            .get_result::<bool>(connection)
            .map_err(|e| e.into())
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = articles)]
pub struct NewArticle {
    pub title: String,
    pub topic: String,
    pub author: String,
    pub body: String,
    pub article_img_url: String,
}

impl NewArticle {
    fn from_body(body: &RequestBody) -> Result<NewArticle, ApiError> {
        body.require(&["author", "title", "body", "topic"])?;
        let article_img_url = body
            .string("article_img_url")?
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_IMG_URL.to_string());
        Ok(NewArticle {
            title: body.required_string("title")?,
            topic: body.required_string("topic")?,
            author: body.required_string("author")?,
            body: body.required_string("body")?,
            article_img_url,
        })
    }
}

impl Validate for NewArticle {
    type Error = ApiError;
    fn validate(self, connection: &mut SqliteConnection) -> Result<Self, ApiError> {
        if !User::exists(&self.author, connection)? {
            return Err(ApiError::NotFound("Not found: Author does not exist"));
        }
        if !Topic::exists(&self.topic, connection)? {
            return Err(ApiError::NotFound("Not found: Topic does not exist"));
        }
        Ok(self)
    }
}

/// Reads `inc_votes` from a body that must contain nothing else.
fn article_vote(body: &RequestBody) -> Result<i32, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("bad request..."));
    }
    if body.keys().any(|key| key != "inc_votes") {
        return Err(ApiError::BadRequest("unexpected field in request body"));
    }
    match body.integer("inc_votes") {
        Ok(Some(inc_votes)) => Ok(inc_votes),
        _ => Err(ApiError::BadRequest("inc_votes must be a number")),
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    article: Article,
}

#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    articles: Vec<ArticleSummary>,
    total_count: i64,
}

#[get("/?<params..>")]
pub async fn list(connection: DbConnection, params: ListParams) -> ApiResult<ArticlesResponse> {
    let query = ArticleQuery::parse(params)?;
    connection
        .run(move |conn| {
            if let Some(author) = &query.author {
                if !User::exists(author, conn)? {
                    return Err(ApiError::NotFound("author not found"));
                }
            }
            if let Some(topic) = &query.topic {
                if !Topic::exists(topic, conn)? {
                    return Err(ApiError::NotFound("topic not found"));
                }
            }
            debug!("listing articles: {:?}", query);

            let articles = query.page().load::<ArticleSummary>(conn)?;
            let total = query.total().get_result::<Total>(conn)?;
            Ok(Json(ArticlesResponse {
                articles,
                total_count: total.total_count,
            }))
        })
        .await
}

#[post("/", data = "<body>")]
pub async fn create(
    connection: DbConnection,
    body: Option<Json<Value>>,
) -> Result<status::Custom<Json<ArticleResponse>>, ApiError> {
    let new_article = NewArticle::from_body(&RequestBody::from_json(body))?;
    connection
        .run(move |conn| {
            let new_article = new_article.validate(conn)?;
            let id = insert_into(articles::table)
                .values(&new_article)
                .returning(articles::article_id)
                .get_result::<i32>(conn)?;
            info!("created article {} by {}", id, new_article.author);

            let article = Article::load(id, conn)?.ok_or(ApiError::Internal)?;
            Ok(status::Custom(Status::Created, Json(ArticleResponse { article })))
        })
        .await
}

#[get("/<article_id>")]
pub async fn get(connection: DbConnection, article_id: &str) -> ApiResult<ArticleResponse> {
    let article_id = parse_id(article_id)?;
    connection
        .run(move |conn| match Article::load(article_id, conn)? {
            Some(article) => Ok(Json(ArticleResponse { article })),
            None => Err(ApiError::NotFound(ARTICLE_NOT_FOUND)),
        })
        .await
}

#[patch("/<article_id>", data = "<body>")]
pub async fn vote(
    connection: DbConnection,
    article_id: &str,
    body: Option<Json<Value>>,
) -> ApiResult<ArticleResponse> {
    let article_id = parse_id(article_id)?;
    let inc_votes = article_vote(&RequestBody::from_json(body))?;
    connection
        .run(move |conn| {
            let updated = diesel_update(articles::table.find(article_id))
                .set(articles::votes.eq(articles::votes + i64::from(inc_votes)))
                .execute(conn)?;
            if updated == 0 {
                return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
            }

            let article =
                Article::load(article_id, conn)?.ok_or(ApiError::NotFound(ARTICLE_NOT_FOUND))?;
            Ok(Json(ArticleResponse { article }))
        })
        .await
}

#[delete("/<article_id>")]
pub async fn delete(connection: DbConnection, article_id: &str) -> Result<Status, ApiError> {
    let article_id = parse_id(article_id)?;
    connection
        .run(move |conn| {
            let deleted = diesel_delete(articles::table.find(article_id)).execute(conn)?;
            if deleted == 0 {
                return Err(ApiError::NotFound(ARTICLE_NOT_FOUND));
            }
            info!("deleted article {}", article_id);
            Ok(Status::NoContent)
        })
        .await
}
