//! HTTP/1.1 server that runs every request through a [`Pipeline`].
//!
//! Each request gets:
//!
//! 1. Its body buffered, bounded by `max_body_bytes` and `request_timeout_ms`
//! 2. A fresh [`FilterContext`]
//! 3. The pipeline, wrapped around the configured handler
//! 4. Request metrics once the response is ready
//!
//! The context is dropped after the response is built, so nothing computed
//! for one request is visible to the next one on the same connection.
//! Response headers are written in title case (`Access-Control-Allow-Origin`).

use crate::error::ServerError;
use crate::ServerResult;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use portcullis_config::ServerConfig;
use portcullis_filters::{
    BoxFuture, FilterContext, HandlerResult, Pipeline, Request, Response, ResponseExt,
};
use portcullis_telemetry::metrics::{record_request, InFlightGuard};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// The application handler invoked after the request filters pass.
pub type Handler =
    Arc<dyn Fn(&mut FilterContext, Request) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Builder for [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    config: ServerConfig,
    pipeline: Option<Pipeline>,
    handler: Option<Handler>,
}

impl ServerBuilder {
    /// Sets the server configuration.
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the bind address, overriding the configured one.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.http_addr = addr.into();
        self
    }

    /// Sets the filter pipeline. Defaults to an empty pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the request handler.
    #[must_use]
    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut FilterContext, Request) -> BoxFuture<'static, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        let handler: Handler = Arc::new(handler);
        self.handler = Some(handler);
        self
    }

    /// Builds the server.
    ///
    /// # Errors
    ///
    /// Fails if the address does not parse or no handler was set.
    pub fn build(self) -> ServerResult<Server> {
        let addr: SocketAddr = self
            .config
            .http_addr
            .parse()
            .map_err(|e| ServerError::invalid_address(&self.config.http_addr, e))?;
        let handler = self.handler.ok_or(ServerError::MissingHandler)?;

        Ok(Server {
            addr,
            shutdown_timeout: Duration::from_secs(self.config.shutdown_timeout_secs),
            shared: Arc::new(Shared {
                pipeline: self.pipeline.unwrap_or_else(|| Pipeline::builder().build()),
                handler,
                request_timeout: Duration::from_millis(self.config.request_timeout_ms),
                max_body_bytes: self.config.max_body_bytes,
            }),
        })
    }
}

struct Shared {
    pipeline: Pipeline,
    handler: Handler,
    request_timeout: Duration,
    max_body_bytes: usize,
}

/// HTTP server driving a filter pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use portcullis_server::Server;
///
/// let server = Server::builder()
///     .config(config.server.clone())
///     .pipeline(pipeline)
///     .handler(|_ctx, _req| Box::pin(async { Ok(Response::empty(StatusCode::OK)) }))
///     .build()?;
///
/// server.run().await?;
/// ```
pub struct Server {
    addr: SocketAddr,
    shutdown_timeout: Duration,
    shared: Arc<Shared>,
}

impl Server {
    /// Returns a new builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the pipeline requests run through.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.shared.pipeline
    }

    /// Runs until Ctrl+C or `SIGTERM`.
    pub async fn run(self) -> ServerResult<()> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals())
            .await
    }

    /// Binds the configured address and runs until `shutdown` triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> ServerResult<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.to_string(),
                source,
            })?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Serves connections from an already bound listener until `shutdown`
    /// triggers, then waits up to the shutdown timeout for them to finish.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) {
        let local = listener.local_addr().unwrap_or(self.addr);
        info!(addr = %local, filters = self.shared.pipeline.filter_count(), "Server listening");

        let tracker = ConnectionTracker::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let shared = Arc::clone(&self.shared);
                        let shutdown = shutdown.clone();
                        let token = tracker.acquire();
                        tokio::spawn(async move {
                            serve_connection(shared, stream, peer, shutdown).await;
                            drop(token);
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                },
                () = shutdown.recv() => break,
            }
        }

        drop(listener);
        info!(
            active = tracker.active_connections(),
            "Stopped accepting connections"
        );

        tokio::select! {
            () = tracker.wait_until_drained() => info!("All connections closed"),
            () = tokio::time::sleep(self.shutdown_timeout) => warn!(
                remaining = tracker.active_connections(),
                "Shutdown timeout reached, dropping connections"
            ),
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("addr", &self.addr)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("pipeline", &self.shared.pipeline)
            .finish_non_exhaustive()
    }
}

async fn serve_connection(
    shared: Arc<Shared>,
    stream: TcpStream,
    peer: SocketAddr,
    shutdown: ShutdownSignal,
) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |request| {
        let shared = Arc::clone(&shared);
        async move { Ok::<_, Infallible>(shared.handle(request).await) }
    });

    let connection = http1::Builder::new()
        .title_case_headers(true)
        .serve_connection(io, service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.recv() => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };

    if let Err(e) = result {
        debug!(peer = %peer, error = %e, "Connection closed with error");
    }
}

impl Shared {
    async fn handle(&self, request: http::Request<Incoming>) -> Response {
        let _in_flight = InFlightGuard::new();
        let mut ctx = FilterContext::new();

        let (parts, body) = request.into_parts();
        let limited = Limited::new(body, self.max_body_bytes);
        let response = match tokio::time::timeout(self.request_timeout, limited.collect()).await {
            Ok(Ok(collected)) => {
                let request = Request::from_parts(parts, Full::new(collected.to_bytes()));
                self.pipeline
                    .process(&mut ctx, request, |ctx, request| (self.handler)(ctx, request))
                    .await
            }
            Ok(Err(e)) if e.downcast_ref::<LengthLimitError>().is_some() => {
                debug!(limit = self.max_body_bytes, "Request body too large");
                Response::error(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
            }
            Ok(Err(e)) => {
                debug!(error = %e, "Failed to read request body");
                Response::error(StatusCode::BAD_REQUEST, "failed to read request body")
            }
            Err(_) => {
                debug!(timeout = ?self.request_timeout, "Request body timed out");
                Response::error(StatusCode::REQUEST_TIMEOUT, "request body timed out")
            }
        };

        record_request(response.status().as_u16(), ctx.elapsed());
        if response.status().is_server_error() {
            error!(
                request_id = %ctx.request_id(),
                status = response.status().as_u16(),
                "Request failed"
            );
        }
        response
    }
}
