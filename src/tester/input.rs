//! Turns the console's raw body and header editors into a [`TestRequestSpec`].

// self
use crate::{_prelude::*, tester::TestRequestSpec};

/// Editor contents that cannot be turned into a request.
#[derive(Debug, ThisError)]
pub enum TestInputError {
	/// The body editor does not hold valid JSON.
	#[error("Request body is not valid JSON: {0}")]
	Body(#[source] serde_json::Error),
	/// The header editor does not hold a JSON object of strings.
	#[error("Custom headers must be a JSON object of strings: {0}")]
	Headers(#[source] serde_json::Error),
}

impl TestRequestSpec {
	/// Parses the body editor; blank text means no body, and verbs that carry no body
	/// (`GET`, `DELETE`, `OPTIONS`) ignore the editor entirely.
	pub fn with_body_text(mut self, text: &str) -> Result<Self, TestInputError> {
		if !self.method.carries_body() || text.trim().is_empty() {
			self.body = None;

			return Ok(self);
		}

		self.body = Some(serde_json::from_str(text).map_err(TestInputError::Body)?);

		Ok(self)
	}

	/// Parses the header editor as a JSON object and merges it into the request; blank text
	/// adds nothing.
	pub fn with_headers_text(mut self, text: &str) -> Result<Self, TestInputError> {
		if text.trim().is_empty() {
			return Ok(self);
		}

		let headers: BTreeMap<String, String> =
			serde_json::from_str(text).map_err(TestInputError::Headers)?;

		self.headers.extend(headers);

		Ok(self)
	}
}
