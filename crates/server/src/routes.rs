//! The demo application served by the `arena-http-server` binary.
//!
//! - `/hello`: `text/plain` greeting, written in pieces through the open body
//! - `/index`: JSON with the current time, plus a `Cookie` response header
//! - anything else: `404` with a JSON error body

use std::fmt;

use arena_http::handler::{make_handler, Handler, HandlerError};
use arena_http::protocol::{Request, Response};
use chrono::{DateTime, Local, TimeZone};
use http::StatusCode;
use serde_json::json;
use tracing::debug;

const JSON_UTF_8: &str = "application/json; charset=UTF-8";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn demo() -> impl Handler {
    make_handler(route)
}

fn route(request: &Request<'_>, response: &mut Response<'_>) -> Result<(), HandlerError> {
    debug!(method = request.method_str(), path = %request.text(request.path()), "dispatching request");

    if request.path_matches("/hello") {
        hello(response)
    } else if request.path_matches("/index") {
        index(response)
    } else {
        not_found(response)
    }
}

fn hello(response: &mut Response<'_>) -> Result<(), HandlerError> {
    response.set_content_type(mime::TEXT_PLAIN.as_ref())?;
    response.body_begin()?;
    response.body_append("Hello")?;
    response.body_append(" World!")?;
    response.body_end();
    Ok(())
}

fn index(response: &mut Response<'_>) -> Result<(), HandlerError> {
    response.set_content_type(JSON_UTF_8)?;
    response.add_header("Cookie", "Kiven")?;

    let body = json!({ "time": format_time(&Local::now()) });
    response.set_body(serde_json::to_vec(&body)?)?;
    Ok(())
}

fn not_found(response: &mut Response<'_>) -> Result<(), HandlerError> {
    response.set_status(StatusCode::NOT_FOUND);
    response.set_content_type(JSON_UTF_8)?;

    let body = json!({ "code": StatusCode::NOT_FOUND.as_u16(), "message": "Not Found" });
    response.set_body(serde_json::to_vec(&body)?)?;
    Ok(())
}

/// `YYYY-MM-DD HH:MM:SS`, without the offset.
fn format_time<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    time.format(TIME_FORMAT).to_string()
}
