//! Request logging middleware.

use std::time::Instant;

use tracing::info;

use super::Middleware;
use crate::handler::HandlerError;
use crate::request::Request;
use crate::response::Response;

/// Logs one `info` line per completed request: method, path, status and
/// latency in microseconds.
///
/// Register it first so its latency covers the other middleware too.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

#[derive(Clone, Copy)]
struct Started(Instant);

impl Middleware for Trace {
    fn before(&self, req: &mut Request) -> Result<(), HandlerError> {
        req.extensions_mut().insert(Started(Instant::now()));
        Ok(())
    }

    fn after(&self, req: &mut Request, res: &mut Response) -> Result<(), HandlerError> {
        let latency_us = req
            .extensions()
            .get::<Started>()
            .map(|Started(at)| u64::try_from(at.elapsed().as_micros()).unwrap_or(u64::MAX));
        info!(
            method = %req.method(),
            path = req.path(),
            status = res.status().as_u16(),
            latency_us,
            "request"
        );
        Ok(())
    }
}
