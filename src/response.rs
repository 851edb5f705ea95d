//! Outgoing HTTP response type.
//!
//! Handlers receive a `&mut Response` that starts as an empty `200 OK` and
//! fill it in. The `text`, `html` and `json` setters write the body and the
//! matching `content-type` in one call.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

/// Common content-type values.
pub enum ContentType {
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
        }
    }
}

/// An outgoing HTTP response.
///
/// ```rust
/// use perch::{Response, StatusCode};
///
/// let mut res = Response::new();
/// res.set_status(StatusCode::CREATED);
/// res.text("created");
/// assert_eq!(res.body(), b"created");
/// ```
#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn set_status(&mut self, status: StatusCode) { self.status = status; }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Replace the body without touching headers.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// The body as text, if it is valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// `text/plain; charset=utf-8` body.
    pub fn text(&mut self, body: impl Into<String>) {
        self.bytes(ContentType::Text, body.into().into_bytes());
    }

    /// `text/html; charset=utf-8` body.
    pub fn html(&mut self, body: impl Into<String>) {
        self.bytes(ContentType::Html, body.into().into_bytes());
    }

    /// `application/json` body serialised from `value`.
    ///
    /// On a serialisation error the response is left unchanged.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.bytes(ContentType::Json, body);
        Ok(())
    }

    /// Body with an explicit content type.
    pub fn bytes(&mut self, content_type: ContentType, body: Vec<u8>) {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type.as_str()),
        );
        self.body = body;
    }

    /// The default response for a path no route matches.
    pub(crate) fn not_found(&mut self) {
        self.status = StatusCode::NOT_FOUND;
        self.text("Not found.");
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut out = http::Response::new(Full::new(Bytes::from(self.body)));
        *out.status_mut() = self.status;
        *out.headers_mut() = self.headers;
        out
    }
}
