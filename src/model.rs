//! Mock-configuration records exchanged with the management API.
//!
//! The core only reads an endpoint's `path` and `http_method`; every other field is carried
//! for the collaborator layer. Fields the backend adds later land in `extra` so records round
//! trip through update calls unchanged.

pub use crate::http::Verb;

// self
use crate::_prelude::*;

/// Server-assigned record identifier.
pub type RecordId = u64;

/// A named group of mock endpoints served below `/{slug}/`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collection {
	/// Identifier, absent before creation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<RecordId>,
	/// URL-safe prefix of every endpoint in the collection.
	pub slug: String,
	/// Display name.
	pub name: String,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
	/// Inactive collections are not served.
	#[serde(default = "default_true")]
	pub is_active: bool,
	/// Unrecognized fields, preserved verbatim.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, JsonValue>,
}

/// A configured mock route (verb + path) with its default response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
	/// Identifier, absent before creation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<RecordId>,
	/// Owning collection identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub collection: Option<RecordId>,
	/// Display name.
	#[serde(default)]
	pub display_name: String,
	/// Path below the collection (e.g. `users` serves `/{slug}/users`).
	pub path: String,
	/// Verb the route answers to.
	#[serde(default)]
	pub http_method: Verb,
	/// Status of the default response.
	#[serde(default = "default_status")]
	pub response_status: u16,
	/// Body of the default response.
	#[serde(default)]
	pub response_body: String,
	/// Unrecognized fields, preserved verbatim.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, JsonValue>,
}
impl Endpoint {
	/// Creates an unsaved endpoint for `verb path`.
	pub fn new(path: impl Into<String>, http_method: Verb) -> Self {
		Self {
			id: None,
			collection: None,
			display_name: String::new(),
			path: path.into(),
			http_method,
			response_status: default_status(),
			response_body: String::new(),
			extra: Default::default(),
		}
	}

	/// Route as served by the mock server: `/{slug}/{path}` with surrounding slashes trimmed.
	pub fn full_path(&self, collection_slug: &str) -> String {
		let path = self.path.trim_matches('/');

		if path.is_empty() {
			format!("/{collection_slug}/")
		} else {
			format!("/{collection_slug}/{path}")
		}
	}
}

/// An alternative named response attachable to an endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EndpointResponse {
	/// Identifier, absent before creation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<RecordId>,
	/// Owning endpoint identifier.
	pub endpoint: RecordId,
	/// Scenario name (e.g. `Success`, `Error`).
	pub name: String,
	/// Response status.
	#[serde(default = "default_status")]
	pub response_status: u16,
	/// Response body text.
	#[serde(default)]
	pub response_body: String,
	/// At most one response per endpoint is the default.
	#[serde(default)]
	pub is_default: bool,
	/// Unrecognized fields, preserved verbatim.
	#[serde(flatten)]
	pub extra: serde_json::Map<String, JsonValue>,
}

fn default_true() -> bool {
	true
}

fn default_status() -> u16 {
	200
}
