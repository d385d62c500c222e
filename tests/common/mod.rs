use std::sync::Arc;
use std::time::Duration;

use prometheus_client::registry::Registry;
use snowflake_broker::broker_router;
use snowflake_broker::metrics::Metrics;

/// A broker bound to an ephemeral port, for the duration of one test.
/// Mirrors the teacher's own `AgentGateway::new` test harness: bind to
/// `127.0.0.1:0`, spawn the server, hand the caller a base URL.
pub struct TestBroker {
	pub base_url: String,
	_task: tokio::task::JoinHandle<()>,
}

impl TestBroker {
	pub async fn start(proxy_timeout: Duration, client_timeout: Duration) -> Self {
		let mut registry = Registry::default();
		let metrics = Metrics::new(&mut registry);
		let router = broker_router(proxy_timeout, client_timeout, metrics);

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
			.await
			.expect("bind ephemeral port");
		let addr = listener.local_addr().expect("local addr");

		let task = tokio::spawn(async move {
			axum::serve(listener, router).await.expect("server exited");
		});

		Self {
			base_url: format!("http://{addr}"),
			_task: task,
		}
	}

	pub fn client(&self) -> reqwest::Client {
		reqwest::Client::new()
	}
}
