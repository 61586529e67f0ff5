use log::trace;
use crate::error::{IoError, errno, errno_to_str};
use crate::transport::TransportError;
use super::{SEND_FLAGS, Socket, is_nonblocking};

/// Classifies a failed `send()`.
fn send_error(err: i32) -> IoError {
	match err {
		libc::EPIPE | libc::ECONNRESET | libc::ENOTCONN => IoError::ConnectionClosed,
		libc::ETIMEDOUT => IoError::Timeouted,
		e if e == libc::EAGAIN || e == libc::EWOULDBLOCK => IoError::Timeouted,
		libc::ECONNREFUSED | libc::EDESTADDRREQ | libc::EHOSTUNREACH | libc::ENETUNREACH => {
			IoError::NoListener
		}
		_ => IoError::SendFailed { reason: errno_to_str(err) },
	}
}

impl Socket {
	/// Sends up to `write_buffer_size` bytes of `data` in one attempt.
	///
	/// Returns the number of bytes the kernel (or transport) accepted, which
	/// may be less than `data.len()`.
	pub fn write(&mut self, data: &[u8]) -> Result<usize, IoError> {
		if data.is_empty() {
			return Err(IoError::NoData);
		}
		if !self.connected {
			return Err(IoError::NotConnected);
		}
		let fd = self.descriptor();
		let chunk = &data[..data.len().min(self.config.write_buffer_size)];

		if let Some(transport) = self.transport.as_mut() {
			return match transport.send(chunk) {
				Ok(n) => {
					trace!("fd={} sent {} bytes via transport", fd, n);
					Ok(n)
				}
				Err(TransportError::RetryNeeded) => Err(IoError::Timeouted),
				Err(err) => Err(err.into()),
			};
		}

		loop {
			let n = unsafe {
				libc::send(fd, chunk.as_ptr() as *const libc::c_void, chunk.len(), SEND_FLAGS)
			};
			if n >= 0 {
				trace!("fd={} sent {} bytes", fd, n);
				return Ok(n as usize);
			}
			let err = errno();
			if err != libc::EINTR {
				return Err(send_error(err));
			}
		}
	}

	fn is_nonblocking_descriptor(&self) -> bool {
		self.fd.as_ref().is_some_and(|fd| is_nonblocking(fd).unwrap_or(false))
	}

	/// Sends the UTF-8 bytes of `text`; see [`Socket::write`].
	pub fn write_str(&mut self, text: &str) -> Result<usize, IoError> {
		self.write(text.as_bytes())
	}
}

impl std::io::Write for Socket {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		if buf.is_empty() {
			return Ok(0);
		}
		match Socket::write(self, buf) {
			Ok(n) => Ok(n),
			// a full send buffer on a non-blocking socket is not a timeout
			Err(IoError::Timeouted) if self.is_nonblocking_descriptor() => {
				Err(std::io::ErrorKind::WouldBlock.into())
			}
			Err(err) => Err(err.into()),
		}
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}
