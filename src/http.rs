//! Transport primitives shared by the session and the mock tester.
//!
//! The module exposes [`Transport`] alongside the crate-owned [`ApiRequest`] and
//! [`ApiResponse`] types so embedders can plug in a custom HTTP stack without touching the
//! renewal or normalization logic. A transport reports *any* received response as `Ok`,
//! whatever its status; only failures to obtain a response become [`TransportError`]s. The
//! session and the tester decide what a status means.

// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use std::ops::Deref;
#[cfg(feature = "reqwest")] use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// Header carrying the console's bearer credential.
pub const AUTHORIZATION: &str = "authorization";

/// Boxed future returned by [`Transport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute one [`ApiRequest`].
///
/// Implementations must be `Send + Sync + 'static` so a single transport can back a session
/// shared across tasks, and the returned future must be `Send`.
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Performs the request and resolves once the full response body has been read.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verbs a mock endpoint can be configured with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
	#[default]
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `OPTIONS`
	Options,
}
impl Verb {
	/// Every supported verb, in the order the console lists them.
	pub const ALL: [Verb; 6] =
		[Verb::Get, Verb::Post, Verb::Put, Verb::Patch, Verb::Delete, Verb::Options];

	/// Canonical upper-case token.
	pub const fn as_str(self) -> &'static str {
		match self {
			Verb::Get => "GET",
			Verb::Post => "POST",
			Verb::Put => "PUT",
			Verb::Patch => "PATCH",
			Verb::Delete => "DELETE",
			Verb::Options => "OPTIONS",
		}
	}

	/// Whether the console attaches a request body for this verb.
	pub const fn carries_body(self) -> bool {
		matches!(self, Verb::Post | Verb::Put | Verb::Patch)
	}
}
impl Display for Verb {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Verb {
	type Err = UnsupportedVerb;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Verb::ALL
			.into_iter()
			.find(|verb| verb.as_str().eq_ignore_ascii_case(s))
			.ok_or_else(|| UnsupportedVerb(s.to_owned()))
	}
}
#[cfg(feature = "reqwest")]
impl From<Verb> for reqwest::Method {
	fn from(verb: Verb) -> Self {
		match verb {
			Verb::Get => reqwest::Method::GET,
			Verb::Post => reqwest::Method::POST,
			Verb::Put => reqwest::Method::PUT,
			Verb::Patch => reqwest::Method::PATCH,
			Verb::Delete => reqwest::Method::DELETE,
			Verb::Options => reqwest::Method::OPTIONS,
		}
	}
}

/// Error returned when a verb label is not one of [`Verb::ALL`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unsupported HTTP method `{0}`.")]
pub struct UnsupportedVerb(pub String);

/// Outbound call descriptor understood by every [`Transport`].
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Verb,
	/// Fully resolved target URL.
	pub url: Url,
	/// Header name to value; names are matched case-insensitively by transports.
	pub headers: BTreeMap<String, String>,
	/// JSON body sent with `content-type: application/json` when present.
	pub body: Option<JsonValue>,
	/// Per-request timeout; `None` leaves the transport default in place.
	pub timeout: Option<Duration>,
	replayed: bool,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Verb, url: Url) -> Self {
		Self { method, url, headers: BTreeMap::new(), body: None, timeout: None, replayed: false }
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.set_header(name, value);

		self
	}

	/// Merges a header map, replacing existing names.
	pub fn headers<I, K, V>(mut self, headers: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		for (name, value) in headers {
			self.set_header(name, value);
		}

		self
	}

	/// Attaches a JSON body.
	pub fn json(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Attaches an optional JSON body.
	pub fn maybe_json(mut self, body: Option<JsonValue>) -> Self {
		self.body = body;

		self
	}

	/// Bounds the call by `timeout`.
	pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
		self.timeout = timeout;

		self
	}

	/// Returns the header value for `name`, ignoring ASCII case.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Returns `true` once the session has replayed this call after a renewal.
	pub fn is_replay(&self) -> bool {
		self.replayed
	}

	pub(crate) fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
		let name = name.into();

		self.headers.retain(|key, _| !key.eq_ignore_ascii_case(&name));
		self.headers.insert(name, value.into());
	}

	pub(crate) fn mark_replayed(&mut self) {
		self.replayed = true;
	}
}

/// Response received from a [`Transport`], independent of its status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Canonical reason phrase for the status (empty when unknown).
	pub status_text: String,
	/// Lower-cased header names; repeated headers are joined with `", "`.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Decodes the body as JSON into `T`, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
	}

	/// Normalizes the body into a JSON value: JSON bodies parse as-is, anything else
	/// (including an empty body) becomes a JSON string.
	pub fn data(&self) -> JsonValue {
		serde_json::from_slice(&self.body).unwrap_or_else(|_| JsonValue::String(self.text()))
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	async fn send(client: ReqwestClient, request: ApiRequest) -> Result<ApiResponse, TransportError> {
		let mut builder = client.request(request.method.into(), request.url);

		for (name, value) in &request.headers {
			builder = builder.header(name, value);
		}
		if let Some(body) = &request.body {
			let bytes = serde_json::to_vec(body)
				.map_err(|e| TransportError::Request { message: e.to_string() })?;

			if !request.headers.keys().any(|key| key.eq_ignore_ascii_case(CONTENT_TYPE.as_str())) {
				builder = builder.header(CONTENT_TYPE, "application/json");
			}

			builder = builder.body(bytes);
		}
		if let Some(timeout) = request.timeout.and_then(|t| std::time::Duration::try_from(t).ok()) {
			builder = builder.timeout(timeout);
		}

		let response = builder.send().await?;
		let status = response.status();
		let headers = flatten_headers(response.headers());
		let body = response.bytes().await?.to_vec();

		Ok(ApiResponse {
			status: status.as_u16(),
			status_text: status.canonical_reason().unwrap_or_default().to_owned(),
			headers,
			body,
		})
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(Self::send(self.0.clone(), request))
	}
}

#[cfg(feature = "reqwest")]
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
	let mut flat = <BTreeMap<String, String>>::new();

	for (name, value) in headers {
		let value = String::from_utf8_lossy(value.as_bytes());

		flat.entry(name.as_str().to_owned())
			.and_modify(|existing| {
				existing.push_str(", ");
				existing.push_str(&value);
			})
			.or_insert_with(|| value.into_owned());
	}

	flat
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn request() -> ApiRequest {
		ApiRequest::new(
			Verb::Get,
			Url::parse("http://localhost:8008/api/collections/").expect("Failed to parse URL."),
		)
	}

	#[test]
	fn verbs_parse_case_insensitively() {
		assert_eq!("get".parse::<Verb>(), Ok(Verb::Get));
		assert_eq!("Patch".parse::<Verb>(), Ok(Verb::Patch));
		assert_eq!("OPTIONS".parse::<Verb>(), Ok(Verb::Options));
		assert_eq!("TRACE".parse::<Verb>(), Err(UnsupportedVerb("TRACE".into())));
	}

	#[test]
	fn only_write_verbs_carry_bodies() {
		let carrying: Vec<_> = Verb::ALL.into_iter().filter(|verb| verb.carries_body()).collect();

		assert_eq!(carrying, [Verb::Post, Verb::Put, Verb::Patch]);
	}

	#[test]
	fn verb_serializes_upper_case() {
		let payload = serde_json::to_string(&Verb::Delete).expect("Verb should serialize.");

		assert_eq!(payload, "\"DELETE\"");
	}

	#[test]
	fn set_header_replaces_case_insensitively() {
		let request = request()
			.header("Authorization", "Bearer old")
			.header(AUTHORIZATION, "Bearer new");

		assert_eq!(request.headers.len(), 1);
		assert_eq!(request.header_value("AUTHORIZATION"), Some("Bearer new"));
		assert!(!request.is_replay());
	}

	#[test]
	fn response_data_falls_back_to_text() {
		let mut response = ApiResponse {
			status: 200,
			status_text: "OK".into(),
			headers: BTreeMap::new(),
			body: br#"{"ok":true}"#.to_vec(),
		};

		assert_eq!(response.data(), serde_json::json!({ "ok": true }));

		response.body = b"plain text".to_vec();

		assert_eq!(response.data(), JsonValue::String("plain text".into()));

		response.body.clear();

		assert_eq!(response.data(), JsonValue::String(String::new()));
	}

	#[test]
	fn response_json_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Access {
			#[allow(dead_code)]
			access: String,
		}

		let response = ApiResponse {
			status: 200,
			status_text: "OK".into(),
			headers: BTreeMap::new(),
			body: br#"{"access":42}"#.to_vec(),
		};
		let err = response.json::<Access>().expect_err("Numeric access tokens must be rejected.");

		assert_eq!(err.path().to_string(), "access");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn flatten_headers_joins_repeated_values() {
		let mut headers = HeaderMap::new();

		headers.append("x-trace", "a".parse().expect("Header value should parse."));
		headers.append("x-trace", "b".parse().expect("Header value should parse."));
		headers.insert(CONTENT_TYPE, "application/json".parse().expect("Header value should parse."));

		let flat = flatten_headers(&headers);

		assert_eq!(flat.get("x-trace").map(String::as_str), Some("a, b"));
		assert_eq!(flat.get("content-type").map(String::as_str), Some("application/json"));
	}
}
