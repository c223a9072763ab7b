//! The access/refresh credential pair held by a console session.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access and refresh credentials issued by the management API's login flow.
///
/// The pair is replaced as a whole: renewal swaps in a new access token while carrying the
/// refresh token over, and teardown drops both at once.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Bearer credential attached to every management call.
	pub access_token: TokenSecret,
	/// Credential exchanged for a new access token when the current one expires.
	pub refresh_token: TokenSecret,
	/// Instant the access token was last issued or renewed.
	pub updated_at: OffsetDateTime,
}
impl CredentialPair {
	/// Creates a pair stamped with the current instant.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access),
			refresh_token: TokenSecret::new(refresh),
			updated_at: OffsetDateTime::now_utc(),
		}
	}

	/// Returns a copy with the access token replaced, keeping the refresh token.
	pub fn renewed(&self, access: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access),
			refresh_token: self.refresh_token.clone(),
			updated_at: OffsetDateTime::now_utc(),
		}
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("updated_at", &self.updated_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn renewed_keeps_refresh_token() {
		let pair = CredentialPair::new("A1", "R1");
		let renewed = pair.renewed("A2");

		assert_eq!(renewed.access_token.expose(), "A2");
		assert_eq!(renewed.refresh_token.expose(), "R1");
		assert!(renewed.updated_at >= pair.updated_at);
	}

	#[test]
	fn debug_output_redacts_both_tokens() {
		let rendered = format!("{:?}", CredentialPair::new("access-secret", "refresh-secret"));

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
	}
}
