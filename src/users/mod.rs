use rocket::serde::json::Json;
use serde::Serialize;

use crate::db::DbConnection;
use crate::types::{ApiError, ApiResult};

pub mod models;

use self::models::User;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    users: Vec<User>,
}

#[get("/")]
pub async fn list(connection: DbConnection) -> ApiResult<UsersResponse> {
    connection
        .run(|conn| {
            let users = User::load_all(conn)?;
            Ok(Json(UsersResponse { users }))
        })
        .await
}

#[get("/<username>")]
pub async fn get(connection: DbConnection, username: &str) -> ApiResult<UserResponse> {
    let username = username.to_string();
    connection
        .run(move |conn| match User::load_by_name(&username, conn)? {
            Some(user) => Ok(Json(UserResponse { user })),
            None => Err(ApiError::NotFound("username not found...")),
        })
        .await
}
