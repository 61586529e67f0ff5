//! Pluggable transport delegates.
//!
//! A [`TransportDelegate`] intercepts every raw send/receive a `Socket`
//! performs. Encrypted transports implement this trait outside the crate;
//! [`PlaintextTransport`] is the pass-through variant.

mod plaintext;
pub use self::plaintext::PlaintextTransport;

use std::os::fd::BorrowedFd;

/// Errors reported across the delegate boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
	/// The operation could not complete yet; wait for readiness and retry.
	#[error("retry operation")]
	RetryNeeded,

	/// Failure with error code and reason.
	#[error("{reason} (code {code})")]
	Failure { code: i32, reason: String },
}

impl TransportError {
	pub fn failure(code: i32, reason: impl Into<String>) -> Self {
		TransportError::Failure { code, reason: reason.into() }
	}

	/// The error code itself, `-1` for [`TransportError::RetryNeeded`].
	pub fn code(&self) -> i32 {
		match self {
			TransportError::RetryNeeded => -1,
			TransportError::Failure { code, .. } => *code,
		}
	}
}

/// Contract a transport (typically TLS) must satisfy to sit under a `Socket`.
///
/// The socket calls `initialize` before connecting or listening, then
/// `on_connect` / `on_accept` once the descriptor is established. From then on
/// every `send`/`receive` goes through the delegate instead of the bare
/// descriptor. `deinitialize` is called exactly once when the socket closes.
pub trait TransportDelegate: Send {
	/// Prepares the delegate for the client (`false`) or server (`true`) role.
	fn initialize(&mut self, as_server: bool) -> Result<(), TransportError>;

	fn deinitialize(&mut self);

	/// Called on a freshly accepted connection.
	fn on_accept(&mut self, fd: BorrowedFd<'_>) -> Result<(), TransportError>;

	/// Called once an outgoing connection is established.
	fn on_connect(&mut self, fd: BorrowedFd<'_>) -> Result<(), TransportError>;

	/// Low level writer. Returns the number of bytes written.
	fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

	/// Low level reader. Returns the number of bytes read, `0` once the peer
	/// has closed.
	fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

	/// Creates the delegate that serves one accepted connection of a listener.
	fn new_session(&self) -> Result<Box<dyn TransportDelegate>, TransportError>;

	/// Adds a protocol name (e.g. `h2`) to the ALPN offer.
	fn add_supported_alpn_protocol(&mut self, _proto: &str) {}

	/// The ALPN protocol agreed during the handshake, if any.
	fn negotiated_alpn_protocol(&self) -> Option<&str> {
		None
	}
}
