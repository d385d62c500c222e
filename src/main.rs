use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use prometheus_client::registry::Registry;
use tokio::task::JoinSet;
use tracing::info;
use tracing_subscriber::EnvFilter;

use snowflake_broker::config::Args;
use snowflake_broker::metrics::{App as MetricsApp, Metrics};
use snowflake_broker::{admin, broker_router, signal};

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
		.with_writer(std::io::stderr)
		.with_ansi(false)
		.init();

	let args = Args::parse();

	let mut registry = Registry::default();
	let metrics = Metrics::new(&mut registry);

	let broker_router = broker_router(args.proxy_timeout(), args.client_timeout(), metrics);

	let admin_router = MetricsApp::new(Arc::new(registry))
		.router()
		.merge(admin::App::new().router());

	let mut run_set = JoinSet::new();

	let broker_listener = tokio::net::TcpListener::bind(&args.listen).await?;
	info!(addr = %args.listen, "broker listening");
	run_set.spawn(async move {
		axum::serve(broker_listener, broker_router)
			.with_graceful_shutdown(signal::wait_for_shutdown())
			.await
	});

	let admin_listener = tokio::net::TcpListener::bind(&args.admin_listen).await?;
	info!(addr = %args.admin_listen, "admin listening");
	run_set.spawn(async move {
		axum::serve(admin_listener, admin_router)
			.with_graceful_shutdown(signal::wait_for_shutdown())
			.await
	});

	while let Some(result) = run_set.join_next().await {
		result??;
	}
	Ok(())
}
