//! Optional observability helpers for session dispatch and mock tests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `mock_console.call` with the `kind` and
//!   `stage` (call site) fields, plus events for renewal outcomes and session teardown.
//! - Enable `metrics` to increment the `mock_console_call_total` counter for every
//!   attempt/success/failure, labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a debug-level event (when tracing is enabled).
macro_rules! debug_event {
	($($arg:tt)*) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::debug!($($arg)*);
		}
	};
}
/// Emits a warn-level event (when tracing is enabled).
macro_rules! warn_event {
	($($arg:tt)*) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::warn!($($arg)*);
		}
	};
}
pub(crate) use {debug_event, warn_event};

/// Which HTTP surface a request targets.
///
/// Management calls carry the console's own bearer credential and recover from expiry through
/// the session; mock calls exercise user-defined routes and report every status verbatim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiSurface {
	/// The console's management REST API.
	Management,
	/// A user-defined mock route under `/{collection}/{path}`.
	Mock,
}
impl ApiSurface {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ApiSurface::Management => "management",
			ApiSurface::Mock => "mock",
		}
	}
}
impl Display for ApiSurface {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Call kinds observed by the console core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// First attempt of a management call.
	Dispatch,
	/// Credential renewal call.
	Renewal,
	/// Replay of a management call after renewal.
	Replay,
	/// Ad-hoc request against a mock route.
	MockTest,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::Dispatch => "dispatch",
			CallKind::Renewal => "renewal",
			CallKind::Replay => "replay",
			CallKind::MockTest => "mock_test",
		}
	}

	/// Surface the call kind belongs to.
	pub const fn surface(self) -> ApiSurface {
		match self {
			CallKind::MockTest => ApiSurface::Mock,
			_ => ApiSurface::Management,
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a console helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
