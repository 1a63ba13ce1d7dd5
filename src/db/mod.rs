use diesel::connection::SimpleConnection;
use diesel::r2d2::ConnectionManager;
use diesel::result::Error as DieselError;
use diesel::sqlite::SqliteConnection;
use error_chain::error_chain;
use r2d2::CustomizeConnection;
use rocket::http::Status;
use rocket::outcome::{try_outcome, Outcome};
use rocket::request::{self, FromRequest};
use rocket::tokio::task::spawn_blocking;
use rocket::{Request, State};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::types::ApiError;

pub mod data;
pub mod schema;
pub mod seed;

// An alias to the type for a pool of Diesel SQLite connections.
pub type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub struct DbConnection(pub r2d2::PooledConnection<ConnectionManager<SqliteConnection>>);

error_chain! {
    foreign_links {
        R2D2(r2d2::Error);
        Diesel(DieselError);
        Json(serde_json::Error);
    }
}

/// Checks a connection out of the managed pool on a blocking thread. If no
/// pool is currently managed, fails with an `InternalServerError` status. If no
/// connection becomes available, fails with a `ServiceUnavailable` status.
#[rocket::async_trait]
impl<'r> FromRequest<'r> for DbConnection {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<DbConnection, ()> {
        let pool = try_outcome!(request.guard::<&State<Pool>>().await).inner().clone();
        match spawn_blocking(move || pool.get()).await {
            Ok(Ok(conn)) => Outcome::Success(DbConnection(conn)),
            Ok(Err(e)) => {
                warn!("no database connection available: {}", e);
                Outcome::Error((Status::ServiceUnavailable, ()))
            }
            Err(e) => {
                error!("connection checkout panicked: {}", e);
                Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}

impl DbConnection {
    /// Runs `f` against the connection on tokio's blocking pool so that Diesel
    /// never stalls an async worker.
    pub async fn run<F, T>(self, f: F) -> std::result::Result<T, ApiError>
    where
        F: FnOnce(&mut SqliteConnection) -> std::result::Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.0;
        spawn_blocking(move || f(&mut conn)).await.map_err(|e| {
            error!("database task failed: {}", e);
            ApiError::Internal
        })?
    }
}

/// Applied to every connection as it is checked out of the pool. SQLite leaves
/// foreign key enforcement off unless asked, and the cascades depend on it.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> ::std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn init_pool(config: &Config) -> Result<Pool> {
    let manager = ConnectionManager::<SqliteConnection>::new(config.database_url.as_str());
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)?;
    info!(
        "database pool ready: {} (max {} connections)",
        config.database_url, config.pool_size
    );
    Ok(pool)
}
