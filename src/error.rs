//! Console-level error types shared across the session, management client, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential renewal failed; the session has been torn down.
	#[error(transparent)]
	RenewalFailed(#[from] RenewalError),

	/// No credential pair is available for the management API.
	#[error("Session is not authenticated.")]
	NotAuthenticated,
	/// Management API answered with a non-success status.
	#[error("Management API returned HTTP {status}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Raw response body for inline display.
		body: String,
	},
	/// Management API answered with JSON that does not match the expected shape.
	#[error("Management API returned malformed JSON.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns `true` when the error ended the session and the user must sign in again.
	pub fn is_session_fatal(&self) -> bool {
		matches!(self, Self::RenewalFailed(_) | Self::NotAuthenticated)
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A request URL could not be assembled.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[from] serde_json::Error),
	/// Console configuration failed validation.
	#[error(transparent)]
	Console(#[from] crate::config::ConsoleConfigError),
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error: {source}")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request could not be handed to the HTTP client.
	#[error("Request could not be built: {message}")]
	Request {
		/// Human-readable description.
		message: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			Self::Request { message: e.to_string() }
		} else {
			Self::network(e)
		}
	}
}

/// Reasons a credential renewal failed.
///
/// The type is `Clone` so one failure can be handed to every caller that was waiting on the
/// same renewal.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RenewalError {
	/// No refresh token is stored for the session.
	#[error("Credential renewal failed: no refresh token is stored.")]
	MissingRefreshToken,
	/// The renewal endpoint rejected the refresh token.
	#[error("Credential renewal failed: refresh endpoint returned HTTP {status}.")]
	Rejected {
		/// HTTP status code returned by the renewal endpoint.
		status: u16,
	},
	/// The renewal endpoint answered 2xx without a usable `access` field.
	#[error("Credential renewal failed: {message}.")]
	MalformedResponse {
		/// Parser diagnostics.
		message: String,
	},
	/// The renewal call never produced a response.
	#[error("Credential renewal failed: {message}.")]
	Transport {
		/// Transport diagnostics.
		message: String,
	},
	/// The renewed credential could not be persisted.
	#[error("Credential renewal failed: {message}.")]
	Storage {
		/// Storage diagnostics.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn renewal_failures_are_session_fatal() {
		let err: Error = RenewalError::Rejected { status: 401 }.into();

		assert!(err.is_session_fatal());
		assert!(err.to_string().contains("HTTP 401"));
		assert!(Error::NotAuthenticated.is_session_fatal());
		assert!(!Error::Api { status: 500, body: String::new() }.is_session_fatal());
	}

	#[test]
	fn config_errors_wrap_validation_and_url_failures() {
		let err: Error = ConfigError::from(crate::config::ConsoleConfigError::NonPositiveTimeout).into();

		assert!(matches!(err, Error::Config(ConfigError::Console(_))));
		assert!(!err.is_session_fatal());

		let source = url::Url::parse("not a url").expect_err("Relative text must not parse.");
		let err = ConfigError::InvalidUrl { url: "not a url".into(), source };

		assert!(err.to_string().contains("not a url"));
		assert!(std::error::Error::source(&err).is_some());
	}
}
