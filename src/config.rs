//! Socket configuration.

/// Scratch size used when no configuration says otherwise.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 4096;
/// Smallest scratch buffer a socket will allocate.
pub const MINIMUM_READ_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = 4096;
/// Buffer floor once a transport delegate is attached (TLS records are up to 16K + overhead).
pub const TRANSPORT_BUFFER_SIZE: usize = 32768;
pub const DEFAULT_TRANSPORT_RETRY_LIMIT: usize = 64;
pub const DEFAULT_BACKLOG: i32 = 128;

/// Per-socket configuration, passed to the constructor.
///
/// # Example
/// ```
/// use cachelane::SocketConfig;
///
/// let config = SocketConfig::new()
///     .read_buffer_size(16 * 1024)
///     .write_buffer_size(8 * 1024)
///     .transport_retry_limit(8);
/// assert_eq!(config.read_buffer_size, 16 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketConfig {
	/// Capacity of the scratch buffer used by one raw receive.
	pub read_buffer_size: usize,
	/// Most bytes handed to a single send attempt.
	pub write_buffer_size: usize,
	/// How many times a delegate `RetryNeeded` is retried before giving up.
	pub transport_retry_limit: usize,
	/// TCP_NODELAY on connected sockets.
	pub nodelay: bool,
	pub backlog: i32,
}

impl Default for SocketConfig {
	fn default() -> Self {
		Self {
			read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
			write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
			transport_retry_limit: DEFAULT_TRANSPORT_RETRY_LIMIT,
			nodelay: true,  // Low latency by default
			backlog: DEFAULT_BACKLOG,
		}
	}
}

impl SocketConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn read_buffer_size(mut self, size: usize) -> Self {
		self.read_buffer_size = size;
		self
	}

	pub fn write_buffer_size(mut self, size: usize) -> Self {
		self.write_buffer_size = size;
		self
	}

	pub fn transport_retry_limit(mut self, limit: usize) -> Self {
		self.transport_retry_limit = limit;
		self
	}

	pub fn nodelay(mut self, enable: bool) -> Self {
		self.nodelay = enable;
		self
	}

	pub fn backlog(mut self, backlog: i32) -> Self {
		self.backlog = backlog;
		self
	}

	/// Applies the size floors. Called by the socket constructors.
	pub(crate) fn normalized(mut self) -> Self {
		self.read_buffer_size = self.read_buffer_size.max(MINIMUM_READ_BUFFER_SIZE);
		self.write_buffer_size = self.write_buffer_size.max(1);
		self
	}

	/// Sizes used when a transport delegate sits under the socket.
	pub(crate) fn widened_for_transport(mut self) -> Self {
		self.read_buffer_size = self.read_buffer_size.max(TRANSPORT_BUFFER_SIZE);
		self.write_buffer_size = self.write_buffer_size.max(TRANSPORT_BUFFER_SIZE);
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn small_read_buffers_are_clamped() {
		let config = SocketConfig::new().read_buffer_size(10).write_buffer_size(0).normalized();
		assert_eq!(config.read_buffer_size, MINIMUM_READ_BUFFER_SIZE);
		assert_eq!(config.write_buffer_size, 1);
	}

	#[test]
	fn transport_widens_but_never_shrinks() {
		let config = SocketConfig::new().read_buffer_size(1 << 20).widened_for_transport();
		assert_eq!(config.read_buffer_size, 1 << 20);
		assert_eq!(config.write_buffer_size, TRANSPORT_BUFFER_SIZE);
	}
}
