//! Session-aware request engine for a mock API console: single-flight credential renewal,
//! replay-once dispatch for the management API, and normalized ad-hoc endpoint testing.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod management;
pub mod model;
pub mod obs;
pub mod session;
pub mod store;
pub mod tester;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests and demos; available whenever
	//! the `reqwest` transport is, so a plain `cargo test` runs every suite. The helpers panic on
	//! fixture errors and are not part of the public API.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::CredentialPair,
		config::ConsoleConfig,
		http::ReqwestTransport,
		session::{RecordingListener, Session},
		store::{CredentialStore, MemoryStore},
		tester::MockTester,
	};

	/// Session type alias used by reqwest-backed integration tests.
	pub type ReqwestTestSession = Session<ReqwestTransport>;

	/// Builds a console config pointing at `base` (usually an `httpmock` server URL).
	pub fn test_config(base: &str) -> ConsoleConfig {
		let base = Url::parse(base).expect("Failed to parse test base URL.");

		ConsoleConfig::builder(base).build().expect("Failed to build test console config.")
	}

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a signed-in [`Session`] backed by an in-memory store and a recording listener.
	pub async fn build_reqwest_test_session(
		base: &str,
		access: &str,
		refresh: &str,
	) -> (ReqwestTestSession, Arc<MemoryStore>, Arc<RecordingListener>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let listener = Arc::new(RecordingListener::default());
		let session =
			Session::with_transport(test_config(base), store, test_reqwest_transport())
				.with_listener(listener.clone());

		session
			.sign_in(CredentialPair::new(access, refresh))
			.await
			.expect("Failed to seed test credentials.");

		(session, store_backend, listener)
	}

	/// Builds a [`MockTester`] against `base` using the insecure test transport.
	pub fn build_reqwest_test_tester(base: &str) -> MockTester<ReqwestTransport> {
		MockTester::with_transport(test_config(base), test_reqwest_transport())
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
