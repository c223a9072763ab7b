// self
use crate::{_prelude::*, config::ConsoleConfig};

/// Errors raised while constructing or validating console configs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConsoleConfigError {
	/// Only plain HTTP(S) origins can host the console backend.
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Base URL that failed validation.
		url: String,
	},
	/// The base URL cannot carry path segments (e.g., `mailto:`).
	#[error("The base URL cannot be used as a path base: {url}.")]
	CannotBeABase {
		/// Base URL that failed validation.
		url: String,
	},
	/// Management paths are appended to the origin and must be absolute.
	#[error("The {field} must start with `/`: {value}.")]
	RelativePath {
		/// Which field failed validation.
		field: &'static str,
		/// Offending value.
		value: String,
	},
	/// Timeouts must be strictly positive when set.
	#[error("The test timeout must be positive.")]
	NonPositiveTimeout,
}

/// Builder for [`ConsoleConfig`] values.
#[derive(Debug)]
pub struct ConsoleConfigBuilder {
	/// Origin serving the management API and mock routes.
	pub base_url: Url,
	/// Management REST prefix.
	pub api_prefix: String,
	/// Credential renewal path.
	pub refresh_path: String,
	/// Optional mock test timeout.
	pub test_timeout: Option<Duration>,
}
impl ConsoleConfigBuilder {
	const DEFAULT_API_PREFIX: &'static str = "/api/";
	const DEFAULT_REFRESH_PATH: &'static str = "/api/auth/refresh/";

	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			api_prefix: Self::DEFAULT_API_PREFIX.into(),
			refresh_path: Self::DEFAULT_REFRESH_PATH.into(),
			test_timeout: None,
		}
	}

	/// Overrides the management REST prefix.
	pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.api_prefix = prefix.into();

		self
	}

	/// Overrides the credential renewal path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Bounds every mock test call by `timeout`.
	pub fn test_timeout(mut self, timeout: Duration) -> Self {
		self.test_timeout = Some(timeout);

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ConsoleConfig, ConsoleConfigError> {
		let config = ConsoleConfig {
			base_url: self.base_url,
			api_prefix: self.api_prefix,
			refresh_path: self.refresh_path,
			test_timeout: self.test_timeout,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ConsoleConfig {
	fn validate(&self) -> Result<(), ConsoleConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ConsoleConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(ConsoleConfigError::CannotBeABase { url: self.base_url.to_string() });
		}

		validate_path("api prefix", &self.api_prefix)?;
		validate_path("refresh path", &self.refresh_path)?;

		if self.test_timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ConsoleConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ConsoleConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(ConsoleConfigError::RelativePath { field, value: value.into() })
	}
}
