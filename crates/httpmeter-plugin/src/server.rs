//! Unix-socket HTTP endpoint for the plugin protocol.
//!
//! The consumer discovers plugins by socket path and speaks plain
//! HTTP/1.1 over the stream, one logical query per request, keep-alive
//! framing so it may reuse the connection. Each accepted connection is
//! served on its own task; the only shared state is the rate store, and
//! it is never held across socket I/O.

use std::convert::Infallible;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use http_body_util::Full;
use httpmeter_common::error::{HttpmeterError, Result};
use httpmeter_probe::store::RateStore;
use hyper::body::{Bytes, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::UnixListener;

use crate::handshake::PluginSpec;
use crate::report::{self, Report};

/// Plugin query server.
///
/// Holds the shared rate store and the host identity baked into report
/// node keys. Cheap to share across connection tasks.
#[derive(Debug)]
pub struct PluginServer {
    store: Arc<RateStore>,
    hostname: String,
}

impl PluginServer {
    /// Creates a server reading from `store`, reporting as `hostname`.
    #[must_use]
    pub fn new(store: Arc<RateStore>, hostname: impl Into<String>) -> Self {
        Self {
            store,
            hostname: hostname.into(),
        }
    }

    /// Binds the plugin socket, removing any stale socket file first.
    ///
    /// A previous run that died without cleanup leaves its socket file
    /// behind; binding over it would otherwise fail with `EADDRINUSE`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stale file cannot be removed or the bind
    /// itself fails (for example, permission denied on the directory).
    pub fn bind(path: &Path) -> Result<UnixListener> {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed stale plugin socket"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(HttpmeterError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
        UnixListener::bind(path).map_err(|source| HttpmeterError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Accepts and serves connections until the accept loop fails.
    ///
    /// Each connection runs on its own task: a handler that errors out
    /// (client gone mid-write, garbled request bytes) only ends that
    /// connection.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting on the listener fails.
    pub async fn serve(self, listener: UnixListener) -> Result<()> {
        let socket_path = listener
            .local_addr()
            .ok()
            .and_then(|addr| addr.as_pathname().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("<unnamed>"));
        let server = Arc::new(self);

        loop {
            let (stream, _addr) = listener.accept().await.map_err(|source| HttpmeterError::Io {
                path: socket_path.clone(),
                source,
            })?;
            let server = Arc::clone(&server);
            let _handle = tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |request| {
                    let server = Arc::clone(&server);
                    async move { Ok::<_, Infallible>(server.handle(&request)) }
                });
                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!(error = %err, "plugin connection ended with error");
                }
            });
        }
    }

    /// Dispatches one request by path.
    fn handle(&self, request: &Request<Incoming>) -> Response<Full<Bytes>> {
        let path = request.uri().path().to_ascii_lowercase();
        tracing::trace!(method = %request.method(), %path, "plugin request");

        let result = match (request.method(), path.as_str()) {
            (&Method::GET, "/") => handshake_response(),
            (&Method::GET, "/report") => self.report_response(),
            _ => Ok(empty_response(StatusCode::NOT_FOUND)),
        };

        result.unwrap_or_else(|err| {
            tracing::error!(error = %err, %path, "request handler failed");
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
    }

    /// Builds the report from the current rate snapshot.
    ///
    /// The timestamp is taken before entering the store read so no
    /// clock call happens under the lock; all samples in one report
    /// share it.
    fn report_response(&self) -> Result<Response<Full<Bytes>>> {
        let date = report::current_timestamp();
        let document = self
            .store
            .read(|rates| Report::from_rates(rates, &self.hostname, &date));
        let body = serde_json::to_vec(&document)?;
        Ok(json_response(body))
    }
}

fn handshake_response() -> Result<Response<Full<Bytes>>> {
    let body = serde_json::to_vec(&PluginSpec::default())?;
    Ok(json_response(body))
}

fn json_response(body: Vec<u8>) -> Response<Full<Bytes>> {
    let length = body.len();
    let mut response = Response::new(Full::new(Bytes::from(body)));
    let _ = response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let _ = response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    let _ = response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(0_usize));
    response
}
