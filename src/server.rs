//! HTTP/1.1 server and graceful shutdown.
//!
//! Each connection gets its own task, so a slow or idle client never holds up
//! the others. Dispatch itself stays sequential: the router sits behind a
//! mutex and one request is fully handled before the next one starts. A slow
//! handler therefore still stalls every other request.
//!
//! Connections that send no complete request head within
//! [`Server::header_read_timeout`] are closed.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting, waits for in-flight
//! connections to finish, and returns from [`Server::serve`].
//!
//! # Failed requests
//!
//! [`Router::handle`] reports some failures as errors instead of responses.
//! The server turns them into:
//!
//! | Failure                                        | Response                        |
//! |------------------------------------------------|---------------------------------|
//! | path is not valid percent-encoded UTF-8        | `400 Bad Request`               |
//! | [`Error::MethodNotAllowed`], unknown verb      | `405` with an `Allow` header    |
//! | anything else, including a handler panic       | `500 Internal Server Error`     |

use std::any::Any;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::method::{AllowedMethods, Method};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const DEFAULT_HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// The router, shared by every connection task. Locking it serializes
/// dispatch.
type Shared = Arc<Mutex<Router>>;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    header_read_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// ```rust
    /// use perch::Server;
    /// let server = Server::bind("127.0.0.1:3000").unwrap();
    /// assert!(Server::bind("not an address").is_err());
    /// ```
    pub fn bind(addr: &str) -> Result<Self, Error> {
        let addr = addr.parse().map_err(|source| Error::Addr {
            addr: addr.to_owned(),
            source,
        })?;
        Ok(Self { addr, header_read_timeout: DEFAULT_HEADER_READ_TIMEOUT })
    }

    /// How long a connection may take to send its request head before it is
    /// closed. Defaults to 30 seconds.
    pub fn header_read_timeout(mut self, timeout: Duration) -> Self {
        self.header_read_timeout = timeout;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a graceful shutdown (SIGTERM or Ctrl-C).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but stops when `signal` resolves.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(
            addr = %self.addr,
            routes = router.route_count(),
            middleware = router.middleware_count(),
            "perch listening"
        );
        run(listener, router, self.header_read_timeout, signal).await
    }
}

async fn run(
    listener: TcpListener,
    router: Router,
    header_read_timeout: Duration,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Error> {
    let router: Shared = Arc::new(Mutex::new(router));
    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // Check shutdown first so a signal stops accepting even if more
            // connections are queued.
            biased;

            () = &mut shutdown => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let router = Arc::clone(&router);
                tasks.spawn(async move {
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { serve_request(&router, req).await }
                    });

                    if let Err(e) = http1::Builder::new()
                        .keep_alive(false)
                        .timer(TokioTimer::new())
                        .header_read_timeout(header_read_timeout)
                        .serve_connection(TokioIo::new(stream), svc)
                        .await
                    {
                        debug!(%peer, "connection error: {e}");
                    }
                });
            }

            Some(done) = tasks.join_next(), if !tasks.is_empty() => reap(done),
        }
    }

    while let Some(done) = tasks.join_next().await {
        reap(done);
    }

    info!("perch stopped");
    Ok(())
}

fn reap(done: Result<(), tokio::task::JoinError>) {
    if let Err(e) = done {
        error!("connection task failed: {e}");
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Converts one hyper request, runs it through the router, and converts the
/// result back. Every failure becomes a response, so hyper never sees an error.
async fn serve_request(
    router: &Shared,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let Ok(path) = percent_decode_str(parts.uri.path()).decode_utf8() else {
        debug!(path = parts.uri.path(), "path is not valid UTF-8");
        return Ok(bad_request().into_http());
    };

    let method = match Method::try_from(&parts.method) {
        Ok(m) => m,
        Err(e) => {
            debug!(path = parts.uri.path(), "{e}");
            let mut res = Response::new();
            method_not_allowed(&mut res, &AllowedMethods::new([]));
            return Ok(res.into_http());
        }
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(path = parts.uri.path(), "failed to read request body: {e}");
            return Ok(bad_request().into_http());
        }
    };

    let mut request = Request::new(method, path)
        .with_headers(parts.headers)
        .with_body(body);
    if let Some(query) = parts.uri.query() {
        request = request.with_query(query);
    }

    let router = router.lock().await;
    let response = match panic::catch_unwind(AssertUnwindSafe(|| router.handle(request))) {
        Ok(handled) => handled.unwrap_or_else(|e| failure_response(&e)),
        Err(payload) => {
            error!(panic = panic_message(&*payload), "handler panicked");
            internal_error()
        }
    };
    drop(router);
    Ok(response.into_http())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn failure_response(err: &Error) -> Response {
    match err {
        Error::MethodNotAllowed { allowed, .. } => {
            debug!("{err}");
            let mut res = Response::new();
            method_not_allowed(&mut res, allowed);
            res
        }
        _ => {
            error!(error = %err, "request failed");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    let mut res = Response::new();
    res.set_status(StatusCode::INTERNAL_SERVER_ERROR);
    res.text("Internal Server Error");
    res
}

fn bad_request() -> Response {
    let mut res = Response::new();
    res.set_status(StatusCode::BAD_REQUEST);
    res.text("Bad Request");
    res
}

fn method_not_allowed(res: &mut Response, allowed: &AllowedMethods) {
    res.set_status(StatusCode::METHOD_NOT_ALLOWED);
    if let Ok(value) = HeaderValue::from_str(&allowed.header_value()) {
        res.headers_mut().insert(header::ALLOW, value);
    }
    res.text("Method Not Allowed");
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available. A handler that cannot be installed
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
