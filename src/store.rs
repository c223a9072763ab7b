//! Storage contracts and built-in stores for the session's credential pair.
//!
//! The credential pair is the only console state that must survive a reload. Stores replace
//! it as a whole and clear it as a whole, so a reader never observes an access token from one
//! pair next to the refresh token of another.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::CredentialPair};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by credential stores.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Loads the persisted pair, if any.
	fn load(&self) -> StoreFuture<'_, Option<CredentialPair>>;

	/// Persists or replaces the pair.
	fn save(&self, pair: CredentialPair) -> StoreFuture<'_, ()>;

	/// Removes both credentials.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_console_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let console_error: Error = store_error.clone().into();

		assert!(matches!(console_error, Error::Storage(_)));
		assert!(console_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&console_error)
			.expect("Console error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
