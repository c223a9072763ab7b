//! Credential-managed dispatch for the management API.
//!
//! [`Session`] owns the access/refresh pair and wraps every management call in
//! [`Session::dispatch`]: it attaches the bearer credential, and on a `401` it renews the
//! access token once (single-flight across concurrent callers) and replays the original call
//! exactly once. A failed renewal clears both credentials, notifies the
//! [`SessionListener`], and becomes the result of every caller that was waiting on it.
//!
//! Mock routes only borrow the credential: [`crate::tester::MockTester`] can read the current
//! access token through a [`CredentialView`] and attach it, but it never renews, so a `401` from
//! a user-defined route is just a status.

mod listener;
mod metrics;
mod renewal;

pub use listener::*;
pub use metrics::RenewalMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	config::ConsoleConfig,
	error::RenewalError,
	http::{AUTHORIZATION, ApiRequest, ApiResponse, Transport},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Session specialized for the crate's default reqwest transport.
pub type ReqwestSession = Session<ReqwestTransport>;

/// In-memory view of the credential pair.
///
/// `generation` moves on every sign-in, renewal, teardown, and sign-out. A caller that saw a
/// `401` compares the generation it dispatched under with the current one to tell whether a
/// renewal already finished while it was waiting.
#[derive(Debug, Default)]
struct SessionState {
	pair: Option<CredentialPair>,
	generation: u64,
	last_failure: Option<RenewalError>,
}
impl SessionState {
	fn replace(&mut self, pair: Option<CredentialPair>, failure: Option<RenewalError>) {
		self.pair = pair;
		self.generation += 1;
		self.last_failure = failure;
	}
}

/// Explicitly injected console session.
///
/// Cloning is cheap and every clone shares the same credentials, renewal guard, and metrics.
pub struct Session<T>
where
	T: ?Sized + Transport,
{
	/// Console configuration used to resolve management and renewal URLs.
	pub config: Arc<ConsoleConfig>,
	/// Transport used for every management, renewal, and replay call.
	pub transport: Arc<T>,
	/// Durable home of the credential pair.
	pub store: Arc<dyn CredentialStore>,
	/// Hook notified on sign-out and renewal failure.
	pub listener: Arc<dyn SessionListener>,
	/// Shared counters for renewal outcomes.
	pub renewal_metrics: Arc<RenewalMetrics>,
	state: Arc<RwLock<SessionState>>,
	renewal_guard: Arc<AsyncMutex<()>>,
}
impl<T> Session<T>
where
	T: ?Sized + Transport,
{
	/// Creates a signed-out session over the caller-provided transport.
	pub fn with_transport(
		config: impl Into<Arc<ConsoleConfig>>,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			config: config.into(),
			transport: transport.into(),
			store,
			listener: Arc::new(NoopListener),
			renewal_metrics: Default::default(),
			state: Default::default(),
			renewal_guard: Default::default(),
		}
	}

	/// Sets the listener notified on session resets.
	pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
		self.listener = listener;

		self
	}

	/// Loads a previously persisted pair; returns `true` when one was found.
	pub async fn restore(&self) -> Result<bool> {
		let _guard = self.renewal_guard.lock().await;
		let pair = self.store.load().await?;
		let found = pair.is_some();

		self.state.write().replace(pair, None);

		Ok(found)
	}

	/// Installs a freshly issued pair (the login flow lives outside this crate).
	pub async fn sign_in(&self, pair: CredentialPair) -> Result<()> {
		let _guard = self.renewal_guard.lock().await;

		self.store.save(pair.clone()).await?;
		self.state.write().replace(Some(pair), None);

		Ok(())
	}

	/// Clears both credentials and notifies the listener.
	pub async fn sign_out(&self) -> Result<()> {
		let _guard = self.renewal_guard.lock().await;

		self.state.write().replace(None, None);
		self.store.clear().await?;
		self.listener.session_reset(&ResetReason::SignedOut);

		Ok(())
	}

	/// Returns `true` while a credential pair is held.
	pub fn is_authenticated(&self) -> bool {
		self.state.read().pair.is_some()
	}

	/// Returns the access token attached to the next management call.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.credential_view().access_token()
	}

	/// Returns a read-only handle on the current access token.
	///
	/// The handle follows sign-ins, renewals, and teardowns of this session.
	pub fn credential_view(&self) -> CredentialView {
		CredentialView { state: self.state.clone() }
	}

	/// Sends a management call with the current bearer credential, renewing and replaying it
	/// once if the API answers `401`.
	///
	/// Non-`401` responses, and a `401` on the replay, are returned unchanged whatever their
	/// status. Fails with [`Error::NotAuthenticated`] when no credentials are held and with
	/// [`Error::RenewalFailed`] when renewal tears the session down.
	pub async fn dispatch(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Dispatch;

		let span = CallSpan::new(KIND, "dispatch");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.dispatch_once(request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn dispatch_once(&self, mut request: ApiRequest) -> Result<ApiResponse> {
		let (access, generation) = self.credential_snapshot().ok_or(Error::NotAuthenticated)?;

		request.set_header(AUTHORIZATION, access.bearer());

		let response = self.transport.execute(request.clone()).await?;

		if !response.is_unauthorized() || request.is_replay() {
			return Ok(response);
		}

		obs::debug_event!(url = %request.url, "Management call rejected; renewing credentials.");

		request.mark_replayed();

		let renewed = self.renew(generation).await?;

		request.set_header(AUTHORIZATION, renewed.bearer());

		self.replay(request).await
	}

	async fn replay(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Replay;

		let span = CallSpan::new(KIND, "replay");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.transport.execute(request)).await.map_err(Error::from);

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	fn credential_snapshot(&self) -> Option<(TokenSecret, u64)> {
		let state = self.state.read();

		state.pair.as_ref().map(|pair| (pair.access_token.clone(), state.generation))
	}
}
/// Read-only view of a session's access token for callers that attach the bearer credential
/// without taking part in renewal.
#[derive(Clone)]
pub struct CredentialView {
	state: Arc<RwLock<SessionState>>,
}
impl CredentialView {
	/// Access token the session currently holds, if any.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.state.read().pair.as_ref().map(|pair| pair.access_token.clone())
	}
}
impl Debug for CredentialView {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialView")
			.field("authenticated", &self.state.read().pair.is_some())
			.finish()
	}
}

#[cfg(feature = "reqwest")]
impl Session<ReqwestTransport> {
	/// Creates a signed-out session backed by a default reqwest transport.
	pub fn new(config: impl Into<Arc<ConsoleConfig>>, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}
}
impl<T> Clone for Session<T>
where
	T: ?Sized + Transport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			store: self.store.clone(),
			listener: self.listener.clone(),
			renewal_metrics: self.renewal_metrics.clone(),
			state: self.state.clone(),
			renewal_guard: self.renewal_guard.clone(),
		}
	}
}
impl<T> Debug for Session<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.read();

		f.debug_struct("Session")
			.field("base_url", &self.config.base_url.as_str())
			.field("authenticated", &state.pair.is_some())
			.field("generation", &state.generation)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		error::TransportError,
		http::{TransportFuture, Verb},
		store::{MemoryStore, StoreError, StoreFuture},
	};

	/// Answers every call from a fixed status table keyed by bearer token.
	struct TokenTableTransport {
		calls: Mutex<Vec<ApiRequest>>,
	}
	impl TokenTableTransport {
		fn new() -> Self {
			Self { calls: Mutex::new(Vec::new()) }
		}
	}
	impl Transport for TokenTableTransport {
		fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
			self.calls.lock().push(request.clone());

			Box::pin(async move {
				let status = match request.header_value(AUTHORIZATION) {
					Some("Bearer valid") => 200,
					Some(_) => 401,
					None => return Err(TransportError::Request { message: "no auth".into() }),
				};

				Ok(ApiResponse {
					status,
					status_text: String::new(),
					headers: BTreeMap::new(),
					body: Vec::new(),
				})
			})
		}
	}

	/// Memory store whose first `clear` fails.
	#[derive(Default)]
	struct FlakyClearStore {
		inner: MemoryStore,
		clears: AtomicUsize,
	}
	impl CredentialStore for FlakyClearStore {
		fn load(&self) -> StoreFuture<'_, Option<CredentialPair>> {
			self.inner.load()
		}

		fn save(&self, pair: CredentialPair) -> StoreFuture<'_, ()> {
			self.inner.save(pair)
		}

		fn clear(&self) -> StoreFuture<'_, ()> {
			if self.clears.fetch_add(1, Ordering::SeqCst) == 0 {
				return Box::pin(async {
					Err(StoreError::Backend { message: "disk busy".into() })
				});
			}

			self.inner.clear()
		}
	}

	fn session() -> Session<TokenTableTransport> {
		let config = ConsoleConfig::local().expect("Local config should build.");
		let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());

		Session::with_transport(config, store, TokenTableTransport::new())
	}

	fn request() -> ApiRequest {
		ApiRequest::new(
			Verb::Get,
			Url::parse("http://localhost:8008/api/collections/").expect("Failed to parse URL."),
		)
	}

	#[tokio::test]
	async fn dispatch_without_credentials_fails_fast() {
		let session = session();
		let err = session
			.dispatch(request())
			.await
			.expect_err("Dispatch must fail without a credential pair.");

		assert!(matches!(err, Error::NotAuthenticated));
		assert!(session.transport.calls.lock().is_empty());
	}

	#[tokio::test]
	async fn dispatch_attaches_bearer_credential() {
		let session = session();

		session.sign_in(CredentialPair::new("valid", "R1")).await.expect("Sign-in should succeed.");

		let response = session.dispatch(request()).await.expect("Dispatch should succeed.");

		assert_eq!(response.status, 200);

		let calls = session.transport.calls.lock();

		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].header_value("Authorization"), Some("Bearer valid"));
		assert!(!calls[0].is_replay());
	}

	#[tokio::test]
	async fn sign_out_clears_credentials_and_notifies_listener() {
		let listener = Arc::new(RecordingListener::default());
		let session = session().with_listener(listener.clone());

		session.sign_in(CredentialPair::new("valid", "R1")).await.expect("Sign-in should succeed.");
		assert!(session.is_authenticated());

		session.sign_out().await.expect("Sign-out should succeed.");

		assert!(!session.is_authenticated());
		assert!(session.access_token().is_none());
		assert_eq!(listener.resets(), [ResetReason::SignedOut]);
	}

	#[tokio::test]
	async fn restore_reads_persisted_pair() {
		let config = ConsoleConfig::local().expect("Local config should build.");
		let store: Arc<dyn CredentialStore> =
			Arc::new(MemoryStore::with_pair(CredentialPair::new("valid", "R1")));
		let session: Session<TokenTableTransport> =
			Session::with_transport(config, store, TokenTableTransport::new());

		assert!(!session.is_authenticated());
		assert!(session.restore().await.expect("Restore should succeed."));
		assert_eq!(session.access_token().map(|t| t.expose().to_owned()), Some("valid".into()));
	}

	#[tokio::test]
	async fn teardown_retries_failed_store_clear() {
		let config = ConsoleConfig::local().expect("Local config should build.");
		let backend = Arc::new(FlakyClearStore::default());
		let store: Arc<dyn CredentialStore> = backend.clone();
		let listener = Arc::new(RecordingListener::default());
		let session: Session<TokenTableTransport> =
			Session::with_transport(config, store, TokenTableTransport::new())
				.with_listener(listener.clone());

		session.sign_in(CredentialPair::new("stale", "R1")).await.expect("Sign-in should succeed.");

		// The refresh call carries no bearer, so the table transport fails it.
		let err = session.dispatch(request()).await.expect_err("Renewal must fail.");

		assert!(matches!(err, Error::RenewalFailed(RenewalError::Transport { .. })));
		assert_eq!(backend.clears.load(Ordering::SeqCst), 2);
		assert!(backend.inner.snapshot().is_none());
		assert!(!session.is_authenticated());
		assert_eq!(listener.resets().len(), 1);
	}
}
