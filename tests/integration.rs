use std::time::Duration;

mod common;
use common::TestBroker;

const PROXY_TIMEOUT: Duration = Duration::from_millis(300);
const CLIENT_TIMEOUT: Duration = Duration::from_millis(300);

#[tokio::test]
async fn no_proxy_client_first_is_rejected() {
	let broker = TestBroker::start(PROXY_TIMEOUT, CLIENT_TIMEOUT).await;
	let resp = broker
		.client()
		.post(format!("{}/client", broker.base_url))
		.body("offer")
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), 503);
	assert_eq!(resp.bytes().await.unwrap().len(), 0);
}

#[tokio::test]
async fn proxy_then_client_happy_path() {
	let broker = TestBroker::start(Duration::from_secs(5), Duration::from_secs(5)).await;
	let client = broker.client();
	let base = broker.base_url.clone();

	let poll = tokio::spawn({
		let client = client.clone();
		let base = base.clone();
		async move {
			client
				.post(format!("{base}/proxy"))
				.header("X-Session-ID", "p1")
				.send()
				.await
				.unwrap()
		}
	});

	// Give the poll a moment to register before the client arrives.
	tokio::time::sleep(Duration::from_millis(50)).await;

	let client_resp = client
		.post(format!("{base}/client"))
		.body("offer")
		.send()
		.await
		.unwrap();
	assert_eq!(client_resp.status(), 200);

	let poll_resp = poll.await.unwrap();
	assert_eq!(poll_resp.status(), 200);
	assert_eq!(poll_resp.text().await.unwrap(), "offer");

	let answer_resp = client
		.post(format!("{base}/answer"))
		.header("X-Session-ID", "p1")
		.body("answer")
		.send()
		.await
		.unwrap();
	assert_eq!(answer_resp.status(), 200);
	assert_eq!(answer_resp.bytes().await.unwrap().len(), 0);

	assert_eq!(client_resp.text().await.unwrap(), "answer");
}

#[tokio::test]
async fn client_times_out_then_late_answer_is_gone() {
	let broker = TestBroker::start(Duration::from_secs(5), PROXY_TIMEOUT).await;
	let client = broker.client();
	let base = broker.base_url.clone();

	let poll = tokio::spawn({
		let client = client.clone();
		let base = base.clone();
		async move {
			client
				.post(format!("{base}/proxy"))
				.header("X-Session-ID", "p1")
				.send()
				.await
				.unwrap()
		}
	});
	tokio::time::sleep(Duration::from_millis(50)).await;

	let client_resp = client
		.post(format!("{base}/client"))
		.body("offer")
		.send()
		.await
		.unwrap();
	assert_eq!(client_resp.status(), 504);

	let poll_resp = poll.await.unwrap();
	assert_eq!(poll_resp.status(), 200);
	assert_eq!(poll_resp.text().await.unwrap(), "offer");

	let late_answer = client
		.post(format!("{base}/answer"))
		.header("X-Session-ID", "p1")
		.body("late")
		.send()
		.await
		.unwrap();
	assert_eq!(late_answer.status(), 410);
}

#[tokio::test]
async fn answer_for_unknown_session_is_gone() {
	let broker = TestBroker::start(PROXY_TIMEOUT, CLIENT_TIMEOUT).await;
	let resp = broker
		.client()
		.post(format!("{}/answer", broker.base_url))
		.header("X-Session-ID", "ghost")
		.body("x")
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), 410);
}

#[tokio::test]
async fn empty_answer_is_rejected_but_proxy_stays_eligible() {
	let broker = TestBroker::start(Duration::from_secs(5), Duration::from_secs(5)).await;
	let client = broker.client();
	let base = broker.base_url.clone();

	let poll = tokio::spawn({
		let client = client.clone();
		let base = base.clone();
		async move {
			client
				.post(format!("{base}/proxy"))
				.header("X-Session-ID", "p1")
				.send()
				.await
				.unwrap()
		}
	});
	tokio::time::sleep(Duration::from_millis(50)).await;

	let empty_answer = client
		.post(format!("{base}/answer"))
		.header("X-Session-ID", "p1")
		.send()
		.await
		.unwrap();
	assert_eq!(empty_answer.status(), 400);

	// The proxy poll is still outstanding: a client can still match it.
	let client_resp = client
		.post(format!("{base}/client"))
		.body("offer")
		.send()
		.await
		.unwrap();
	assert_eq!(client_resp.status(), 200);

	let poll_resp = poll.await.unwrap();
	assert_eq!(poll_resp.status(), 200);
	assert_eq!(poll_resp.text().await.unwrap(), "offer");
}

#[tokio::test]
async fn only_one_of_two_proxies_is_matched() {
	let broker = TestBroker::start(Duration::from_secs(5), Duration::from_secs(5)).await;
	let client = broker.client();
	let base = broker.base_url.clone();

	for id in ["p1", "p2"] {
		let client = client.clone();
		let base = base.clone();
		let id = id.to_string();
		tokio::spawn(async move {
			let _ = client
				.post(format!("{base}/proxy"))
				.header("X-Session-ID", id)
				.send()
				.await;
		});
	}
	tokio::time::sleep(Duration::from_millis(50)).await;

	let client_resp = client
		.post(format!("{base}/client"))
		.body("offer")
		.send()
		.await
		.unwrap();
	assert_eq!(client_resp.status(), 200);
}
