//! Hooks notified when the session drops back to the unauthenticated state.

// self
use crate::{_prelude::*, error::RenewalError};

/// Why a session was reset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResetReason {
	/// The user signed out.
	SignedOut,
	/// Credential renewal failed and both tokens were discarded.
	RenewalFailed(RenewalError),
}

/// Receives session resets so the embedding UI can return to its sign-in screen.
///
/// Implementations run inline on the task that observed the reset and must not block.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// Called once per reset, after the credentials have been cleared.
	fn session_reset(&self, reason: &ResetReason);
}

/// Listener that ignores resets.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;
impl SessionListener for NoopListener {
	fn session_reset(&self, _reason: &ResetReason) {}
}

/// Listener that remembers every reset, handy for headless consoles and tests.
#[derive(Debug, Default)]
pub struct RecordingListener(Mutex<Vec<ResetReason>>);
impl RecordingListener {
	/// Returns every recorded reset in order.
	pub fn resets(&self) -> Vec<ResetReason> {
		self.0.lock().clone()
	}
}
impl SessionListener for RecordingListener {
	fn session_reset(&self, reason: &ResetReason) {
		self.0.lock().push(reason.clone());
	}
}
