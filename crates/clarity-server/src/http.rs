use crate::error::{ServerError, ServerResult};
use crate::shutdown::ShutdownCoordinator;
use bytes::Bytes;
use clarity_http::{Handler, Request, Response};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

/// HTTP/1 server dispatching every request to one [`Handler`]
pub struct HttpServer {
	handler: Arc<dyn Handler>,
}

impl HttpServer {
	/// Create a new server with the given handler
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use clarity_server::HttpServer;
	/// use clarity_http::{Handler, Request, Response};
	///
	/// struct Hello;
	///
	/// #[async_trait::async_trait]
	/// impl Handler for Hello {
	///     async fn handle(&self, _req: Request) -> clarity_http::Result<Response> {
	///         Ok(Response::ok().with_body("Hello"))
	///     }
	/// }
	///
	/// let server = HttpServer::new(Arc::new(Hello));
	/// ```
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	/// Bind `addr` and serve until `coordinator` triggers
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use std::time::Duration;
	/// use clarity_server::{HttpServer, ShutdownCoordinator, shutdown_signal};
	/// # use clarity_http::{Handler, Request, Response};
	/// # struct Hello;
	/// # #[async_trait::async_trait]
	/// # impl Handler for Hello {
	/// #     async fn handle(&self, _req: Request) -> clarity_http::Result<Response> {
	/// #         Ok(Response::ok())
	/// #     }
	/// # }
	///
	/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
	/// let trigger = coordinator.clone();
	/// tokio::spawn(async move {
	///     shutdown_signal().await;
	///     trigger.shutdown();
	/// });
	///
	/// HttpServer::new(Arc::new(Hello))
	///     .listen_with_shutdown("127.0.0.1:8000".parse()?, coordinator)
	///     .await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn listen_with_shutdown(
		self,
		addr: SocketAddr,
		coordinator: ShutdownCoordinator,
	) -> ServerResult<()> {
		let listener = TcpListener::bind(addr)
			.await
			.map_err(|source| ServerError::Bind { addr, source })?;
		self.serve(listener, coordinator).await
	}

	/// Serve connections from an already bound listener
	///
	/// Once the shutdown is triggered the listener is closed, open
	/// connections finish their in-flight request and the call returns. A
	/// connection still open after the coordinator's timeout is dropped.
	pub async fn serve(self, listener: TcpListener, coordinator: ShutdownCoordinator) -> ServerResult<()> {
		let local_addr = listener.local_addr()?;
		tracing::info!(%local_addr, "server listening");

		let graceful = GracefulShutdown::new();
		let mut shutdown = coordinator.subscribe();

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, remote_addr) = match accepted {
						Ok(pair) => pair,
						Err(err) => {
							tracing::warn!(error = %err, "failed to accept connection");
							continue;
						}
					};
					let service = RequestService {
						handler: Arc::clone(&self.handler),
						remote_addr,
					};
					let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
					let connection = graceful.watch(connection);
					tokio::spawn(async move {
						if let Err(err) = connection.await {
							tracing::debug!(%remote_addr, error = %err, "connection ended with error");
						}
					});
				}
				_ = shutdown.triggered() => break,
			}
		}

		drop(listener);
		tracing::info!("shutdown requested, draining connections");
		tokio::select! {
			_ = graceful.shutdown() => tracing::info!("all connections closed"),
			_ = tokio::time::sleep(coordinator.timeout()) => {
				tracing::warn!(timeout_secs = coordinator.timeout().as_secs(), "shutdown timeout elapsed, dropping open connections");
			}
		}
		coordinator.notify_shutdown_complete();
		Ok(())
	}
}

/// Per-connection hyper service
struct RequestService {
	handler: Arc<dyn Handler>,
	remote_addr: SocketAddr,
}

impl Service<hyper::Request<Incoming>> for RequestService {
	type Response = hyper::Response<Full<Bytes>>;
	type Error = Box<dyn std::error::Error + Send + Sync>;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

	fn call(&self, req: hyper::Request<Incoming>) -> Self::Future {
		let handler = Arc::clone(&self.handler);
		let remote_addr = self.remote_addr;

		Box::pin(async move {
			let started = Instant::now();
			let (parts, body) = req.into_parts();
			let body = body.collect().await?.to_bytes();

			let mut request = Request::new(parts.method, parts.uri, parts.version, parts.headers, body);
			request.remote_addr = Some(remote_addr);
			let method = request.method.clone();
			let path = request.path().to_string();

			let response = handler.handle(request).await.unwrap_or_else(Response::from);
			log_request(&method, &path, &response, started.elapsed());

			into_hyper(response)
		})
	}
}

fn log_request(method: &hyper::Method, path: &str, response: &Response, elapsed: Duration) {
	let status = response.status.as_u16();
	let latency_ms = elapsed.as_secs_f64() * 1000.0;
	if response.status.is_server_error() {
		tracing::error!(%method, path, status, latency_ms, "request failed");
	} else {
		tracing::info!(%method, path, status, latency_ms, "request");
	}
}

fn into_hyper(response: Response) -> Result<hyper::Response<Full<Bytes>>, Box<dyn std::error::Error + Send + Sync>> {
	let mut builder = hyper::Response::builder().status(response.status);
	for (name, value) in response.headers.iter() {
		builder = builder.header(name, value);
	}
	Ok(builder.body(Full::new(response.body))?)
}

/// Serve `handler` on `addr` until Ctrl-C or SIGTERM
pub async fn serve_until_signal(
	addr: SocketAddr,
	handler: Arc<dyn Handler>,
	shutdown_timeout: Duration,
) -> ServerResult<()> {
	let coordinator = ShutdownCoordinator::new(shutdown_timeout);
	let trigger = coordinator.clone();
	tokio::spawn(async move {
		crate::shutdown::shutdown_signal().await;
		trigger.shutdown();
	});
	HttpServer::new(handler).listen_with_shutdown(addr, coordinator).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use hyper::StatusCode;
	use rstest::rstest;

	#[rstest]
	fn test_into_hyper_keeps_status_headers_and_body() {
		// Arrange
		let response = Response::temporary_redirect("/admin/").with_body("moved");

		// Act
		let converted = into_hyper(response).unwrap();

		// Assert
		assert_eq!(converted.status(), StatusCode::FOUND);
		assert_eq!(converted.headers()["location"], "/admin/");
	}
}
