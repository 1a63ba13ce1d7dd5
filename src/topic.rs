use diesel::insert_into;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::{Json, Value};
use serde::Serialize;
use tracing::info;

use crate::db::schema::topics;
use crate::db::DbConnection;
use crate::types::{ApiError, ApiResult, RequestBody};

#[derive(Debug, Queryable, Identifiable, Serialize, PartialEq)]
#[diesel(table_name = topics, primary_key(slug))]
pub struct Topic {
    pub slug: String,
    pub description: String,
    pub img_url: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = topics)]
pub struct NewTopic {
    pub slug: String,
    pub description: String,
    pub img_url: Option<String>,
}

impl NewTopic {
    fn from_body(body: &RequestBody) -> Result<NewTopic, ApiError> {
        body.require(&["slug", "description"])?;
        Ok(NewTopic {
            slug: body.required_string("slug")?,
            description: body.required_string("description")?,
            img_url: body.string("img_url")?,
        })
    }
}

impl Topic {
    pub fn exists(slug_: &str, connection: &mut SqliteConnection) -> Result<bool, ApiError> {
        use crate::db::schema::topics::dsl::*;
        diesel::select(diesel::dsl::exists(topics.filter(slug.eq(slug_))))
            .get_result::<bool>(connection)
            .map_err(|e| e.into())
    }
}

#[derive(Debug, Serialize)]
pub struct TopicResponse {
    topic: Topic,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    topics: Vec<Topic>,
}

#[get("/")]
pub async fn list(connection: DbConnection) -> ApiResult<TopicsResponse> {
    connection
        .run(|conn| {
            let topics = topics::table
                .order(topics::slug.asc())
                .load::<Topic>(conn)?;
            Ok(Json(TopicsResponse { topics }))
        })
        .await
}

#[post("/", data = "<body>")]
pub async fn create(
    connection: DbConnection,
    body: Option<Json<Value>>,
) -> Result<status::Custom<Json<TopicResponse>>, ApiError> {
    let new_topic = NewTopic::from_body(&RequestBody::from_json(body))?;
    connection
        .run(move |conn| {
            let topic = insert_into(topics::table)
                .values(&new_topic)
                .get_result::<Topic>(conn)?;
            info!("created topic {}", topic.slug);
            Ok(status::Custom(Status::Created, Json(TopicResponse { topic })))
        })
        .await
}
