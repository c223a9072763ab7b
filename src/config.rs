//! Console configuration: where the management API lives and where mock routes are served.
//!
//! [`ConsoleConfig`] is built through [`ConsoleConfigBuilder`], which validates the base URL
//! and the management paths once so request builders can concatenate segments without
//! re-checking them on every call.

/// Builder API for assembling console configs.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError, obs::ApiSurface};

/// Immutable console configuration shared by the session and the tester.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
	/// Origin serving both the management API and the mock routes.
	pub base_url: Url,
	/// Path prefix of the management REST surface.
	pub api_prefix: String,
	/// Path of the credential renewal endpoint.
	pub refresh_path: String,
	/// Optional upper bound for a mock test call; unset means the transport default.
	pub test_timeout: Option<Duration>,
}
impl ConsoleConfig {
	/// Base URL used by a console running next to a local mock server.
	pub const LOCAL_BASE: &'static str = "http://localhost:8008";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ConsoleConfigBuilder {
		ConsoleConfigBuilder::new(base_url)
	}

	/// Returns the default configuration for [`Self::LOCAL_BASE`].
	pub fn local() -> Result<Self, ConfigError> {
		let base = Url::parse(Self::LOCAL_BASE).map_err(|source| ConfigError::InvalidUrl {
			url: Self::LOCAL_BASE.into(),
			source,
		})?;

		Ok(Self::builder(base).build()?)
	}

	/// Base URL without a trailing slash, ready for concatenation.
	pub fn base(&self) -> &str {
		self.base_url.as_str().trim_end_matches('/')
	}

	/// Builds the URL of a mock route as `{base}/{collection_slug}/{path}`.
	///
	/// Segments are concatenated verbatim; callers own their slashes.
	pub fn mock_url(&self, collection_slug: &str, path: &str) -> Result<Url, ConfigError> {
		parse_url(format!("{}/{collection_slug}/{path}", self.base()))
	}

	/// Builds the URL of a management resource below [`Self::api_prefix`].
	pub fn management_url(&self, resource_path: &str) -> Result<Url, ConfigError> {
		parse_url(format!("{}{}{resource_path}", self.base(), self.api_prefix))
	}

	/// Builds the URL of the credential renewal endpoint.
	pub fn refresh_url(&self) -> Result<Url, ConfigError> {
		parse_url(format!("{}{}", self.base(), self.refresh_path))
	}

	/// Resolves a URL for the given surface; mock surfaces expect `(slug, path)`.
	pub fn url_for(&self, surface: ApiSurface, first: &str, rest: &str) -> Result<Url, ConfigError> {
		match surface {
			ApiSurface::Management => self.management_url(&format!("{first}{rest}")),
			ApiSurface::Mock => self.mock_url(first, rest),
		}
	}
}

fn parse_url(raw: String) -> Result<Url, ConfigError> {
	Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config(base: &str) -> ConsoleConfig {
		ConsoleConfig::builder(Url::parse(base).expect("Failed to parse base URL fixture."))
			.build()
			.expect("Console config fixture should build.")
	}

	#[test]
	fn mock_url_concatenates_segments_verbatim() {
		let config = config("http://localhost:8008");

		assert_eq!(
			config.mock_url("shop", "orders/42").expect("Mock URL should build.").as_str(),
			"http://localhost:8008/shop/orders/42"
		);
		assert_eq!(
			config.mock_url("shop", "orders/").expect("Mock URL should build.").as_str(),
			"http://localhost:8008/shop/orders/"
		);
	}

	#[test]
	fn management_urls_use_prefix_and_refresh_path() {
		let config = config("http://api.example.com/");

		assert_eq!(
			config.management_url("collections/").expect("Management URL should build.").as_str(),
			"http://api.example.com/api/collections/"
		);
		assert_eq!(
			config.refresh_url().expect("Refresh URL should build.").as_str(),
			"http://api.example.com/api/auth/refresh/"
		);
	}

	#[test]
	fn url_for_routes_by_surface() {
		let config = config("http://localhost:8008");
		let mock = config.url_for(ApiSurface::Mock, "c", "missing").expect("Mock URL should build.");
		let management = config
			.url_for(ApiSurface::Management, "endpoints/", "?collection=c")
			.expect("Management URL should build.");

		assert_eq!(mock.as_str(), "http://localhost:8008/c/missing");
		assert_eq!(management.as_str(), "http://localhost:8008/api/endpoints/?collection=c");
	}

	#[test]
	fn local_config_points_at_default_port() {
		let config = ConsoleConfig::local().expect("Local config should build.");

		assert_eq!(config.base(), ConsoleConfig::LOCAL_BASE);
		assert!(config.test_timeout.is_none());
	}
}
