#[macro_use]
extern crate rocket;

pub mod api;
pub mod article;
pub mod comment;
pub mod config;
pub mod db;
pub mod topic;
pub mod tracing_setup;
pub mod types;
pub mod users;
pub mod utils;

use rocket::fairing::AdHoc;
use rocket::request::Request;
use rocket::serde::json::{json, Json, Value};
use rocket::{Build, Rocket};
use tracing::info;

use crate::db::Pool;

#[catch(400)]
fn bad_request(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": "bad request..." }))
}

#[catch(404)]
fn not_found(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": "path not found..." }))
}

#[catch(422)]
fn unprocessable(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": types::INVALID_TYPE }))
}

#[catch(503)]
fn unavailable(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": "service unavailable" }))
}

#[catch(default)]
fn internal(_req: &Request) -> Json<Value> {
    Json(json!({ "msg": types::INTERNAL }))
}

/// Routes and catchers, without any managed state.
pub fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/api", routes![api::index])
        .mount("/api/topics", routes![topic::list, topic::create])
        .mount(
            "/api/articles",
            routes![
                article::list,
                article::create,
                article::get,
                article::vote,
                article::delete,
                comment::list,
                comment::add,
            ],
        )
        .mount("/api/comments", routes![comment::vote, comment::delete])
        .mount("/api/users", routes![users::list, users::get])
        .register(
            "/",
            catchers![bad_request, not_found, unprocessable, unavailable, internal],
        )
}

pub fn rocket(pool: Pool) -> Rocket<Build> {
    mount(rocket::build())
        .manage(pool)
        .attach(AdHoc::on_response("Request log", |req, res| {
            Box::pin(async move {
                info!("{} {} -> {}", req.method(), req.uri(), res.status());
            })
        }))
}
