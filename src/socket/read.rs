use std::os::fd::RawFd;
use log::{debug, trace, warn};
use crate::error::{IoError, errno, errno_to_str};
use crate::multiplexer::wait_readable;
use crate::transport::TransportError;
use super::Socket;

/// Outcome of one raw receive into the scratch buffer.
enum Received {
	Bytes(usize),
	WouldBlock,
	Closed,
}

impl Socket {
	/// Buffered read into `buf`.
	///
	/// Cached bytes are served first without touching the network. When the
	/// cache is empty one refill pass runs ([`Socket::read_into_cache`]) and
	/// the result is handed back truncated to `buf.len()`, the rest stays
	/// cached.
	///
	/// With `truncate == false` a cache larger than `buf` fails with
	/// [`IoError::BufferTooSmall`] before any network I/O.
	///
	/// `Ok(0)` means the peer closed (see [`Socket::remote_closed`]) or, on a
	/// non-blocking socket, that nothing is available yet. Unlike
	/// [`Socket::read_into_cache`], bytes received earlier in a refill that
	/// then sees the close are still delivered; the `0` comes on the next call.
	pub fn read(&mut self, buf: &mut [u8], truncate: bool) -> Result<usize, IoError> {
		if buf.is_empty() {
			return Err(IoError::InvalidBuffer);
		}

		if !self.cache.is_empty() {
			let n = self.cache.fill(buf, truncate)?;
			if n > 0 {
				return Ok(n);
			}
		}

		if !self.connected {
			return Err(IoError::NotConnected);
		}
		self.read_into_cache()?;

		// a fetch just happened: deliver what fits, never fail for size
		self.cache.fill(buf, true)
	}

	/// Pulls everything currently available from the wire into the cache.
	///
	/// Keeps receiving while each receive fills the whole scratch buffer.
	/// Returns the new cache length, or `0` when the peer closed (the cache
	/// itself is left as it was).
	pub fn read_into_cache(&mut self) -> Result<usize, IoError> {
		if !self.connected {
			return Err(IoError::NotConnected);
		}
		let fd = self.descriptor();

		loop {
			// partial progress must not block the caller
			let nonblocking = !self.cache.is_empty();
			match self.receive_once(fd, nonblocking)? {
				Received::WouldBlock => {
					trace!("fd={} drained, {} bytes cached", fd, self.cache.len());
					return Ok(self.cache.len());
				}
				Received::Closed => {
					debug!("fd={} closed by peer", fd);
					self.remote_closed = true;
					return Ok(0);
				}
				Received::Bytes(n) => {
					self.cache.append(self.scratch.filled(n));
					trace!("fd={} received {} bytes, {} cached", fd, n, self.cache.len());
					if n < self.scratch.capacity() {
						return Ok(self.cache.len());
					}
				}
			}
		}
	}

	fn receive_once(&mut self, fd: RawFd, nonblocking: bool) -> Result<Received, IoError> {
		let target = self.scratch.prepare();

		if let Some(transport) = self.transport.as_mut() {
			let mut retries = 0;
			loop {
				match transport.receive(target) {
					Ok(0) => return Ok(Received::Closed),
					Ok(n) => return Ok(Received::Bytes(n.min(target.len()))),
					Err(TransportError::RetryNeeded) if nonblocking => return Ok(Received::WouldBlock),
					Err(TransportError::RetryNeeded) => {
						if retries == self.config.transport_retry_limit {
							warn!("fd={} transport still needs a retry after {} attempts", fd, retries);
							return Err(TransportError::RetryNeeded.into());
						}
						retries += 1;
						wait_readable(fd, None)?;
					}
					Err(err) => return Err(err.into()),
				}
			}
		}

		let flags = if nonblocking { libc::MSG_DONTWAIT } else { 0 };
		loop {
			let n = unsafe {
				libc::recv(fd, target.as_mut_ptr() as *mut libc::c_void, target.len(), flags)
			};
			if n > 0 {
				return Ok(Received::Bytes(n as usize));
			}
			if n == 0 {
				return Ok(Received::Closed);
			}

			let err = errno();
			if err == libc::EINTR {
				continue;
			}
			if err == libc::EAGAIN || err == libc::EWOULDBLOCK {
				return Ok(Received::WouldBlock);
			}
			if err == libc::ECONNRESET {
				return Err(IoError::ConnectionReset { reason: errno_to_str(err) });
			}
			return Err(IoError::ReceiveFailed { reason: errno_to_str(err) });
		}
	}

	/// Appends everything available to `out`: the cache if it holds anything,
	/// otherwise the result of one refill. Returns the count appended.
	pub fn read_to_vec(&mut self, out: &mut Vec<u8>) -> Result<usize, IoError> {
		if !self.cache.is_empty() {
			return Ok(self.cache.drain_into(out));
		}
		if !self.connected {
			return Err(IoError::NotConnected);
		}
		self.read_into_cache()?;
		Ok(self.cache.drain_into(out))
	}

	/// Reads everything available as UTF-8 text.
	///
	/// `None` when nothing was read, or when a non-blocking socket has only
	/// part of one character so far. A multi-byte character cut off at the
	/// end is put back into the cache for the next call.
	pub fn read_string(&mut self) -> Result<Option<String>, IoError> {
		loop {
			let mut bytes = Vec::new();
			if self.read_to_vec(&mut bytes)? == 0 {
				return Ok(None);
			}

			let err = match String::from_utf8(bytes) {
				Ok(text) => return Ok(Some(text)),
				Err(err) => err,
			};
			let utf8 = err.utf8_error();
			if utf8.error_len().is_some() {
				return Err(IoError::InvalidUtf8);
			}
			let valid = utf8.valid_up_to();
			let mut bytes = err.into_bytes();

			if valid > 0 {
				self.cache.unread(&bytes[valid..]);
				bytes.truncate(valid);
				return String::from_utf8(bytes).map(Some).map_err(|_| IoError::InvalidUtf8);
			}

			// only a fragment so far: refill with an empty cache so a
			// blocking socket waits for the rest of the character
			let fetched = self.read_into_cache()?;
			self.cache.unread(&bytes);
			if fetched == 0 {
				if self.remote_closed {
					return Err(IoError::InvalidUtf8);
				}
				return Ok(None);
			}
		}
	}

	/// Like [`Socket::read`] with truncation, but waits at most `timeout_ms`
	/// for data when the cache is empty; nothing arriving in time is
	/// [`IoError::NoResponse`].
	pub fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, IoError> {
		if buf.is_empty() {
			return Err(IoError::InvalidBuffer);
		}
		if self.cache.is_empty() {
			if !self.connected {
				return Err(IoError::NotConnected);
			}
			if !wait_readable(self.descriptor(), Some(timeout_ms))? {
				return Err(IoError::NoResponse);
			}
		}
		self.read(buf, true)
	}
}

impl std::io::Read for Socket {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}
		match Socket::read(self, buf, true)? {
			// 0 is end-of-file for std readers, only report it once the peer closed
			0 if !self.remote_closed => Err(std::io::ErrorKind::WouldBlock.into()),
			n => Ok(n),
		}
	}
}
