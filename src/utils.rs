use chrono::{NaiveDateTime, SecondsFormat, TimeZone, Utc};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use serde::Serializer;
use serde_json::Value;

pub fn try_respond(req: &Request, json: Value, status: Status) -> response::Result<'static> {
    status::Custom(status, Json(json)).respond_to(req)
}

/// Stored timestamps are UTC without an offset; they go out as RFC 3339 with
/// millisecond precision.
pub fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = Utc
        .from_utc_datetime(date)
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Stamped {
        #[serde(serialize_with = "serialize_date")]
        created_at: NaiveDateTime,
    }

    #[test]
    fn dates_serialize_as_utc_millis() {
        let created_at = DateTime::from_timestamp_millis(1594329060000)
            .map(|d| d.naive_utc())
            .unwrap();
        let json = serde_json::to_value(Stamped { created_at }).unwrap();
        assert_eq!(json["created_at"], "2020-07-09T21:11:00.000Z");
    }
}
