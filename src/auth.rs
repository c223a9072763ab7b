//! Session credential models: the access/refresh pair and its redacted secrets.

pub mod credential;
pub mod secret;

pub use credential::*;
pub use secret::*;
