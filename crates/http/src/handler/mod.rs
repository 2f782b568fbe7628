//! The application boundary.
//!
//! A [`Handler`] is called synchronously, once per completed request, with read access to
//! the request and write access to the response. No I/O happens while it runs; the
//! response is serialized and written after it returns.
//!
//! Plain functions and closures become handlers through [`make_handler`]:
//!
//! ```
//! use arena_http::handler::make_handler;
//! use arena_http::protocol::{Request, Response, SendError};
//!
//! fn hello(request: &Request<'_>, response: &mut Response<'_>) -> Result<(), SendError> {
//!     if request.path_matches("/hello") {
//!         response.set_content_type("text/plain")?;
//!         response.set_body("Hello World!")?;
//!     }
//!     Ok(())
//! }
//!
//! let handler = make_handler(hello);
//! ```

use std::error::Error;

use crate::protocol::{Request, Response};

/// Error type handlers report; a failing handler produces an empty `500` response.
pub type HandlerError = Box<dyn Error + Send + Sync>;

pub trait Handler {
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> Result<(), HandlerError>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, Err> Handler for HandlerFn<F>
where
    F: Fn(&Request<'_>, &mut Response<'_>) -> Result<(), Err>,
    Err: Into<HandlerError>,
{
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> Result<(), HandlerError> {
        (self.f)(request, response).map_err(Into::into)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> Result<(), HandlerError> {
        (**self).call(request, response)
    }
}

impl<H: Handler + ?Sized> Handler for std::rc::Rc<H> {
    fn call(&self, request: &Request<'_>, response: &mut Response<'_>) -> Result<(), HandlerError> {
        (**self).call(request, response)
    }
}

pub fn make_handler<F, Err>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request<'_>, &mut Response<'_>) -> Result<(), Err>,
    Err: Into<HandlerError>,
{
    HandlerFn { f }
}
