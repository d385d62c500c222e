//! Shutdown signal handling, adapted from the teacher's own
//! `Shutdown`/`ShutdownTrigger` pair: wait on SIGTERM/SIGINT (a second
//! Ctrl+C forces an immediate exit) and resolve a future the server's
//! graceful-shutdown hook can await.

#[cfg(unix)]
pub async fn wait_for_shutdown() {
	use std::process;

	use tokio::signal::unix::{SignalKind, signal};
	use tracing::info;

	async fn watch(kind: SignalKind, name: &'static str) {
		signal(kind)
			.expect("failed to register signal handler")
			.recv()
			.await;
		info!(signal = name, "received signal, starting shutdown");
	}

	tokio::select! {
		_ = watch(SignalKind::interrupt(), "SIGINT") => {
			tokio::spawn(async move {
				watch(SignalKind::interrupt(), "SIGINT").await;
				info!("second SIGINT, exiting immediately");
				process::exit(0);
			});
		}
		_ = watch(SignalKind::terminate(), "SIGTERM") => {}
	}
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown() {
	use tracing::info;

	tokio::signal::windows::ctrl_c()
		.expect("failed to register signal handler")
		.recv()
		.await;
	info!("received ctrl-c, starting shutdown");
}
