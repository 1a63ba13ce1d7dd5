use rocket::serde::json::{Json, Value};
use serde::Serialize;

use crate::types::{ApiError, ApiResult};

static ENDPOINTS: &str = include_str!("../endpoints.json");

#[derive(Debug, Serialize)]
pub struct EndpointsResponse {
    endpoints: Value,
}

pub fn endpoints() -> Result<Value, ApiError> {
    serde_json::from_str(ENDPOINTS).map_err(|_| ApiError::Internal)
}

#[get("/")]
pub fn index() -> ApiResult<EndpointsResponse> {
    Ok(Json(EndpointsResponse {
        endpoints: endpoints()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let endpoints = endpoints().unwrap();
        let documented = endpoints.as_object().unwrap();
        let rocket = crate::mount(rocket::build());
        for route in rocket.routes() {
            let path = route
                .uri
                .path()
                .to_string()
                .replace("<article_id>", ":article_id")
                .replace("<comment_id>", ":comment_id")
                .replace("<username>", ":username");
            let path = path.trim_end_matches('/');
            let key = format!("{} {}", route.method, path);
            assert!(documented.contains_key(&key), "undocumented route: {}", key);
        }
    }
}
