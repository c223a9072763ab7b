//! Ad-hoc request engine for exercising mock endpoints.
//!
//! [`MockTester::test_endpoint`] sends one request to `{base}/{collection}/{path}` and folds
//! every outcome into a [`TestResult`]. Any status the mock server returns, 4xx and 5xx
//! included, is a successful test; only a failure to obtain a response produces the
//! `status == 0`, `"Network Error"` sentinel.
//!
//! A tester built with [`MockTester::with_credentials`] attaches the session's current bearer
//! credential to every test call unless the request already names an `Authorization` header.
//! It never renews: a `401` from a mock route belongs to the system under test, not to the
//! console.

mod input;

pub use input::*;

// std
use std::time::Instant;
// self
use crate::{
	_prelude::*,
	config::ConsoleConfig,
	http::{AUTHORIZATION, ApiRequest, ApiResponse, Transport, Verb},
	model::Endpoint,
	obs::{self, ApiSurface, CallKind, CallOutcome, CallSpan},
	session::CredentialView,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Status text carried by the transport-failure sentinel.
pub const NETWORK_ERROR: &str = "Network Error";

/// Everything needed to fire one test request.
#[derive(Clone, Debug, PartialEq)]
pub struct TestRequestSpec {
	/// Slug of the collection owning the endpoint.
	pub collection_slug: String,
	/// Endpoint path below the collection, used verbatim.
	pub path: String,
	/// HTTP verb.
	pub method: Verb,
	/// Optional JSON body.
	pub body: Option<JsonValue>,
	/// Extra request headers.
	pub headers: BTreeMap<String, String>,
}
impl TestRequestSpec {
	/// Creates a request without body or headers.
	pub fn new(collection_slug: impl Into<String>, path: impl Into<String>, method: Verb) -> Self {
		Self {
			collection_slug: collection_slug.into(),
			path: path.into(),
			method,
			body: None,
			headers: BTreeMap::new(),
		}
	}

	/// Creates a request targeting a configured endpoint.
	pub fn for_endpoint(collection_slug: impl Into<String>, endpoint: &Endpoint) -> Self {
		Self::new(collection_slug, endpoint.path.clone(), endpoint.http_method)
	}

	/// Attaches a JSON body.
	pub fn body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Adds a request header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}
}

/// Normalized outcome of a test request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
	/// HTTP status, or `0` when no response was obtained.
	pub status: u16,
	/// Reason phrase, or [`NETWORK_ERROR`] for the sentinel.
	pub status_text: String,
	/// Response headers with lower-cased names.
	pub headers: BTreeMap<String, String>,
	/// Response body as JSON; `{"error": message}` for the sentinel.
	pub data: JsonValue,
	/// Wall-clock duration in whole milliseconds.
	pub time_ms: u64,
}
impl TestResult {
	/// Builds the transport-failure sentinel.
	pub fn network_error(message: impl Display, time_ms: u64) -> Self {
		Self {
			status: 0,
			status_text: NETWORK_ERROR.into(),
			headers: BTreeMap::new(),
			data: serde_json::json!({ "error": message.to_string() }),
			time_ms,
		}
	}

	/// Renders an editor input failure the way the console shows it: nothing was sent.
	pub fn input_error(error: &TestInputError) -> Self {
		Self {
			status: 0,
			status_text: "Error".into(),
			headers: BTreeMap::new(),
			data: serde_json::json!({ "error": error.to_string() }),
			time_ms: 0,
		}
	}

	fn from_response(response: ApiResponse, time_ms: u64) -> Self {
		let data = response.data();

		Self {
			status: response.status,
			status_text: response.status_text,
			headers: response.headers,
			data,
			time_ms,
		}
	}

	/// Returns `true` for the transport-failure sentinel.
	pub fn is_network_error(&self) -> bool {
		self.status == 0
	}

	/// Buckets the status the way the console colours it.
	pub fn status_class(&self) -> StatusClass {
		match self.status {
			0 => StatusClass::NetworkError,
			100..=199 => StatusClass::Informational,
			200..=299 => StatusClass::Success,
			300..=399 => StatusClass::Redirect,
			400..=499 => StatusClass::ClientError,
			_ => StatusClass::ServerError,
		}
	}
}

/// Coarse status buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusClass {
	/// No response was obtained.
	NetworkError,
	/// 1xx
	Informational,
	/// 2xx
	Success,
	/// 3xx
	Redirect,
	/// 4xx
	ClientError,
	/// 5xx and anything above.
	ServerError,
}

/// Fires ad-hoc requests at mock routes.
pub struct MockTester<T>
where
	T: ?Sized + Transport,
{
	/// Console configuration used to resolve mock URLs.
	pub config: Arc<ConsoleConfig>,
	/// Transport used for every test call.
	pub transport: Arc<T>,
	credentials: Option<CredentialView>,
}
impl<T> MockTester<T>
where
	T: ?Sized + Transport,
{
	/// Creates a tester over the caller-provided transport.
	pub fn with_transport(config: impl Into<Arc<ConsoleConfig>>, transport: impl Into<Arc<T>>) -> Self {
		Self { config: config.into(), transport: transport.into(), credentials: None }
	}

	/// Attaches the bearer credential of the viewed session to test calls.
	pub fn with_credentials(mut self, credentials: CredentialView) -> Self {
		self.credentials = Some(credentials);

		self
	}

	/// Sends the described request and reports the outcome; never fails.
	pub async fn test_endpoint(&self, spec: TestRequestSpec) -> TestResult {
		const KIND: CallKind = CallKind::MockTest;

		let span = CallSpan::new(KIND, "test_endpoint");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.run(spec)).await;

		if result.is_network_error() {
			obs::record_call_outcome(KIND, CallOutcome::Failure);
		} else {
			obs::record_call_outcome(KIND, CallOutcome::Success);
		}

		result
	}

	async fn run(&self, spec: TestRequestSpec) -> TestResult {
		let started = Instant::now();
		let url = match self.config.url_for(ApiSurface::Mock, &spec.collection_slug, &spec.path) {
			Ok(url) => url,
			Err(e) => return TestResult::network_error(e, elapsed_ms(started)),
		};
		let mut request = ApiRequest::new(spec.method, url)
			.headers(spec.headers)
			.maybe_json(spec.body)
			.timeout(self.config.test_timeout);

		// A user-supplied header wins over the session credential.
		let session_token = self
			.credentials
			.as_ref()
			.and_then(CredentialView::access_token)
			.filter(|_| request.header_value(AUTHORIZATION).is_none());

		if let Some(token) = session_token {
			request.set_header(AUTHORIZATION, token.bearer());
		}

		obs::debug_event!(method = %request.method, url = %request.url, "Sending mock test request.");

		match self.transport.execute(request).await {
			Ok(response) => TestResult::from_response(response, elapsed_ms(started)),
			Err(e) => TestResult::network_error(e, elapsed_ms(started)),
		}
	}
}
#[cfg(feature = "reqwest")]
impl MockTester<ReqwestTransport> {
	/// Creates a tester backed by a default reqwest transport.
	pub fn new(config: impl Into<Arc<ConsoleConfig>>) -> Self {
		Self::with_transport(config, ReqwestTransport::default())
	}
}
impl<T> Clone for MockTester<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			credentials: self.credentials.clone(),
		}
	}
}
impl<T> Debug for MockTester<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MockTester")
			.field("base_url", &self.config.base_url.as_str())
			.field("credentials", &self.credentials)
			.finish()
	}
}

fn elapsed_ms(started: Instant) -> u64 {
	u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::CredentialPair,
		error::TransportError,
		http::TransportFuture,
		session::Session,
		store::{CredentialStore, MemoryStore},
	};

	struct RefusingTransport;
	impl Transport for RefusingTransport {
		fn execute(&self, _request: ApiRequest) -> TransportFuture<'_> {
			Box::pin(async {
				Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"connection refused",
				)))
			})
		}
	}

	struct EchoTransport;
	impl Transport for EchoTransport {
		fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				let echoed = serde_json::json!({
					"method": request.method.as_str(),
					"url": request.url.as_str(),
					"body": request.body,
					"headers": request.headers,
				});

				Ok(ApiResponse {
					status: 418,
					status_text: "I'm a teapot".into(),
					headers: BTreeMap::from([("x-echo".into(), "1".into())]),
					body: serde_json::to_vec(&echoed).expect("Echo payload should serialize."),
				})
			})
		}
	}

	fn config() -> ConsoleConfig {
		ConsoleConfig::local().expect("Local config should build.")
	}

	#[tokio::test]
	async fn transport_failure_becomes_sentinel() {
		let tester: MockTester<RefusingTransport> =
			MockTester::with_transport(config(), RefusingTransport);
		let result = tester.test_endpoint(TestRequestSpec::new("c", "missing", Verb::Get)).await;

		assert!(result.is_network_error());
		assert_eq!(result.status_text, NETWORK_ERROR);
		assert!(result.headers.is_empty());
		assert_eq!(result.status_class(), StatusClass::NetworkError);

		let message = result.data["error"].as_str().expect("Sentinel must carry an error message.");

		assert!(message.contains("connection refused"));
	}

	#[tokio::test]
	async fn request_is_built_from_spec_verbatim() {
		let tester: MockTester<EchoTransport> = MockTester::with_transport(config(), EchoTransport);
		let spec = TestRequestSpec::new("shop", "orders/7", Verb::Patch)
			.body(serde_json::json!({ "qty": 2 }))
			.header("X-Tenant", "acme");
		let result = tester.test_endpoint(spec).await;

		assert_eq!(result.status, 418);
		assert_eq!(result.status_text, "I'm a teapot");
		assert_eq!(result.status_class(), StatusClass::ClientError);
		assert_eq!(result.headers.get("x-echo").map(String::as_str), Some("1"));
		assert_eq!(result.data["method"], "PATCH");
		assert_eq!(result.data["url"], "http://localhost:8008/shop/orders/7");
		assert_eq!(result.data["body"], serde_json::json!({ "qty": 2 }));
		assert_eq!(result.data["headers"]["X-Tenant"], "acme");
	}

	#[tokio::test]
	async fn session_bearer_is_attached_unless_overridden() {
		let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
		let session: Session<EchoTransport> = Session::with_transport(config(), store, EchoTransport);
		let tester: MockTester<EchoTransport> = MockTester::with_transport(config(), EchoTransport)
			.with_credentials(session.credential_view());
		let unauthenticated = tester.test_endpoint(TestRequestSpec::new("shop", "me", Verb::Get)).await;

		assert!(unauthenticated.data["headers"].get(AUTHORIZATION).is_none());

		session.sign_in(CredentialPair::new("A1", "R1")).await.expect("Sign-in should succeed.");

		let attached = tester.test_endpoint(TestRequestSpec::new("shop", "me", Verb::Get)).await;

		assert_eq!(attached.data["headers"][AUTHORIZATION], "Bearer A1");

		let overridden = tester
			.test_endpoint(
				TestRequestSpec::new("shop", "me", Verb::Get).header("Authorization", "Basic dXNlcg=="),
			)
			.await;

		assert_eq!(overridden.data["headers"]["Authorization"], "Basic dXNlcg==");
		assert!(overridden.data["headers"].get(AUTHORIZATION).is_none());

		session.sign_out().await.expect("Sign-out should succeed.");

		let signed_out = tester.test_endpoint(TestRequestSpec::new("shop", "me", Verb::Get)).await;

		assert!(signed_out.data["headers"].get(AUTHORIZATION).is_none());
	}

	#[test]
	fn status_classes_cover_ranges() {
		let mut result = TestResult::network_error("boom", 0);

		for (status, class) in [
			(101, StatusClass::Informational),
			(204, StatusClass::Success),
			(302, StatusClass::Redirect),
			(404, StatusClass::ClientError),
			(503, StatusClass::ServerError),
		] {
			result.status = status;

			assert_eq!(result.status_class(), class);
		}
	}

	#[test]
	fn result_serializes_with_console_field_names() {
		let payload = serde_json::to_value(TestResult::network_error("boom", 3))
			.expect("Test result should serialize.");

		assert_eq!(payload["statusText"], NETWORK_ERROR);
		assert_eq!(payload["timeMs"], 3);
		assert_eq!(payload["data"]["error"], "boom");
	}
}
