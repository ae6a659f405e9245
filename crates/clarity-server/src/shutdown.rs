//! Shutdown signalling shared between the server loop and its owner

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Coordinates a graceful stop
///
/// Clones share the same state: any clone may trigger the shutdown and any
/// clone may wait for the server loop to report that it has finished.
///
/// # Examples
///
/// ```
/// use clarity_server::ShutdownCoordinator;
/// use std::time::Duration;
///
/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
/// assert!(!coordinator.is_shutting_down());
///
/// coordinator.clone().shutdown();
/// assert!(coordinator.is_shutting_down());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
	timeout: Duration,
	trigger: Arc<watch::Sender<bool>>,
	complete: Arc<watch::Sender<bool>>,
}

/// Resolves once the shutdown was triggered
pub struct ShutdownListener {
	receiver: watch::Receiver<bool>,
}

impl ShutdownListener {
	pub async fn triggered(&mut self) {
		// An error means every sender is gone, which also ends the wait.
		let _ = self.receiver.wait_for(|triggered| *triggered).await;
	}
}

impl ShutdownCoordinator {
	/// `timeout` bounds how long open connections may take to finish
	pub fn new(timeout: Duration) -> Self {
		Self {
			timeout,
			trigger: Arc::new(watch::Sender::new(false)),
			complete: Arc::new(watch::Sender::new(false)),
		}
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn subscribe(&self) -> ShutdownListener {
		ShutdownListener {
			receiver: self.trigger.subscribe(),
		}
	}

	/// Ask the server to stop accepting connections
	pub fn shutdown(&self) {
		self.trigger.send_replace(true);
	}

	pub fn is_shutting_down(&self) -> bool {
		*self.trigger.borrow()
	}

	pub(crate) fn notify_shutdown_complete(&self) {
		self.complete.send_replace(true);
	}

	/// Wait until the server loop has drained and returned
	pub async fn wait_for_shutdown(&self) {
		let mut receiver = self.complete.subscribe();
		let _ = receiver.wait_for(|done| *done).await;
	}
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %err, "failed to listen for Ctrl-C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			}
			Err(err) => {
				tracing::error!(error = %err, "failed to listen for SIGTERM");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("received Ctrl-C"),
		_ = terminate => tracing::info!("received SIGTERM"),
	}
}
