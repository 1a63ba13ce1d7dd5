use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::db::schema::users;
use crate::types::ApiError;

#[derive(Debug, Queryable, Identifiable, Serialize, PartialEq)]
#[diesel(table_name = users, primary_key(username))]
pub struct User {
    pub username: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl User {
    pub fn load_all(connection: &mut SqliteConnection) -> Result<Vec<User>, ApiError> {
        use crate::db::schema::users::dsl::*;
        users
            .order(username.asc())
            .load::<User>(connection)
            .map_err(|e| e.into())
    }

    /// `None` when no user has that name.
    pub fn load_by_name(
        name_: &str,
        connection: &mut SqliteConnection,
    ) -> Result<Option<User>, ApiError> {
        use crate::db::schema::users::dsl::*;
        users
            .filter(username.eq(name_))
            .get_result::<User>(connection)
            .optional()
            .map_err(|e| e.into())
    }

    pub fn exists(name_: &str, connection: &mut SqliteConnection) -> Result<bool, ApiError> {
        use crate::db::schema::users::dsl::*;
        diesel::select(diesel::dsl::exists(users.filter(username.eq(name_))))
            .get_result::<bool>(connection)
            .map_err(|e| e.into())
    }
}
