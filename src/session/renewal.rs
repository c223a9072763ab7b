//! Single-flight credential renewal and session teardown.
//!
//! Every caller that sees a `401` enters [`Session::renew`] with the credential generation it
//! dispatched under. The renewal guard admits one caller at a time: the first one sends
//! `POST {refresh_path}` with `{"refresh": ...}` and bumps the generation; the ones queued
//! behind it notice the bump and adopt the stored outcome (the new access token, or the
//! recorded failure) without contacting the endpoint again.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	error::RenewalError,
	http::{ApiRequest, Transport, Verb},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{ResetReason, Session},
};

#[derive(Deserialize)]
struct RenewalBody {
	access: TokenSecret,
}

impl<T> Session<T>
where
	T: ?Sized + Transport,
{
	/// Returns an access token newer than the one issued at `observed_generation`, renewing it
	/// if no other caller already did.
	pub(crate) async fn renew(&self, observed_generation: u64) -> Result<TokenSecret> {
		let _singleflight = self.renewal_guard.lock().await;

		if let Some(settled) = self.settled_since(observed_generation) {
			self.renewal_metrics.record_reuse();

			return settled;
		}

		const KIND: CallKind = CallKind::Renewal;

		let span = CallSpan::new(KIND, "renew");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.renewal_metrics.record_attempt();

		match span.instrument(self.exchange_refresh_token()).await {
			Ok(pair) => {
				let access = pair.access_token.clone();

				self.state.write().replace(Some(pair), None);
				self.renewal_metrics.record_success();
				obs::record_call_outcome(KIND, CallOutcome::Success);
				obs::debug_event!("Access token renewed.");

				Ok(access)
			},
			Err(err) => {
				self.teardown(err.clone()).await;
				self.renewal_metrics.record_failure();
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				Err(err.into())
			},
		}
	}

	/// Outcome of a renewal (or sign-in/sign-out) that completed after `observed_generation`.
	fn settled_since(&self, observed_generation: u64) -> Option<Result<TokenSecret>> {
		let state = self.state.read();

		if state.generation == observed_generation {
			return None;
		}

		Some(match (&state.pair, &state.last_failure) {
			(Some(pair), _) => Ok(pair.access_token.clone()),
			(None, Some(failure)) => Err(failure.clone().into()),
			(None, None) => Err(Error::NotAuthenticated),
		})
	}

	/// Trades the stored refresh token for a new access token and persists the new pair.
	async fn exchange_refresh_token(&self) -> Result<CredentialPair, RenewalError> {
		let current = self.state.read().pair.clone().ok_or(RenewalError::MissingRefreshToken)?;
		let url = self
			.config
			.refresh_url()
			.map_err(|e| RenewalError::Transport { message: e.to_string() })?;
		let request = ApiRequest::new(Verb::Post, url)
			.json(serde_json::json!({ "refresh": current.refresh_token.expose() }));
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| RenewalError::Transport { message: e.to_string() })?;

		if !response.is_success() {
			return Err(RenewalError::Rejected { status: response.status });
		}

		let body = response
			.json::<RenewalBody>()
			.map_err(|e| RenewalError::MalformedResponse { message: e.to_string() })?;

		if body.access.expose().is_empty() {
			return Err(RenewalError::MalformedResponse {
				message: "refresh endpoint returned an empty access token".into(),
			});
		}

		let renewed = current.renewed(body.access.expose());

		self.store
			.save(renewed.clone())
			.await
			.map_err(|e| RenewalError::Storage { message: e.to_string() })?;

		Ok(renewed)
	}

	/// Drops both credentials, remembers why, and tells the listener.
	///
	/// The persisted pair is cleared with one retry. If both attempts fail the stale pair stays
	/// in the store and a later [`Session::restore`] will bring it back; the in-memory session is
	/// torn down regardless.
	async fn teardown(&self, reason: RenewalError) {
		obs::warn_event!(error = %reason, "Credential renewal failed; resetting session.");

		self.state.write().replace(None, Some(reason.clone()));

		if self.store.clear().await.is_err() {
			obs::debug_event!("Clearing persisted credentials failed; retrying once.");

			if let Err(_e) = self.store.clear().await {
				obs::warn_event!(
					error = %_e,
					"Persisted credentials could not be cleared during teardown."
				);
			}
		}

		self.listener.session_reset(&ResetReason::RenewalFailed(reason));
	}
}
