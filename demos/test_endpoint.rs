//! Demonstrates listing a collection's endpoints through a renewing session and firing each
//! one at the mock server with the endpoint tester.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use mock_console_core::{
	auth::CredentialPair,
	config::ConsoleConfig,
	management::ManagementApi,
	session::Session,
	store::{CredentialStore, MemoryStore},
	tester::{MockTester, TestRequestSpec},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/endpoints/").header("authorization", "Bearer stale-access");
			then.status(401).body("{\"detail\":\"Given token not valid for any token type\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh/");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"fresh-access\"}");
		})
		.await;
	let _endpoints = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/endpoints/").header("authorization", "Bearer fresh-access");
			then.status(200).header("content-type", "application/json").body(
				"[{\"id\":1,\"path\":\"orders\",\"http_method\":\"GET\"},{\"id\":2,\"path\":\"orders\",\"http_method\":\"POST\"}]",
			);
		})
		.await;
	let _orders = server
		.mock_async(|when, then| {
			when.path("/shop/orders");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"qty\":2}]");
		})
		.await;
	let config = Arc::new(ConsoleConfig::builder(Url::parse(&server.base_url())?).build()?);
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let session = Session::new(config.clone(), store);

	session.sign_in(CredentialPair::new("stale-access", "demo-refresh")).await?;

	let api = ManagementApi::new(session.clone());
	let endpoints = api.list_endpoints("shop").await?;

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	println!(
		"Listed {} endpoint(s) after {} renewal(s).",
		endpoints.len(),
		session.renewal_metrics.attempts()
	);

	let tester = MockTester::new(config);

	for endpoint in &endpoints {
		let result = tester.test_endpoint(TestRequestSpec::for_endpoint("shop", endpoint)).await;

		println!(
			"{} {} -> {} {} in {}ms: {}",
			endpoint.http_method,
			endpoint.full_path("shop"),
			result.status,
			result.status_text,
			result.time_ms,
			result.data
		);
	}

	Ok(())
}
