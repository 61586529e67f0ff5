use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use log::trace;
use crate::error::{errno, errno_to_str};
use crate::socket::SEND_FLAGS;
use super::{TransportDelegate, TransportError};

/// Pass-through delegate: plain `send()`/`recv()` on the descriptor.
///
/// Receives never block (`MSG_DONTWAIT`); the socket waits for readability
/// and retries, as it would for a TLS record that is not complete yet.
/// `EAGAIN` is reported as [`TransportError::RetryNeeded`], every other errno
/// as a [`TransportError::Failure`] carrying the errno and its description.
#[derive(Debug, Default)]
pub struct PlaintextTransport {
	fd: Option<RawFd>,
	server: bool,
}

impl PlaintextTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// True once `initialize(true)` has been called.
	pub fn is_server(&self) -> bool {
		self.server
	}

	fn fd(&self) -> Result<RawFd, TransportError> {
		self.fd.ok_or_else(|| TransportError::failure(libc::ENOTCONN, errno_to_str(libc::ENOTCONN)))
	}
}

fn classify(err: i32) -> TransportError {
	if err == libc::EAGAIN || err == libc::EWOULDBLOCK {
		TransportError::RetryNeeded
	} else {
		TransportError::failure(err, errno_to_str(err))
	}
}

impl TransportDelegate for PlaintextTransport {
	fn initialize(&mut self, as_server: bool) -> Result<(), TransportError> {
		self.server = as_server;
		Ok(())
	}

	fn deinitialize(&mut self) {
		self.fd = None;
	}

	fn on_accept(&mut self, fd: BorrowedFd<'_>) -> Result<(), TransportError> {
		self.fd = Some(fd.as_raw_fd());
		Ok(())
	}

	fn on_connect(&mut self, fd: BorrowedFd<'_>) -> Result<(), TransportError> {
		self.fd = Some(fd.as_raw_fd());
		Ok(())
	}

	fn send(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
		let fd = self.fd()?;
		let n = unsafe {
			libc::send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), SEND_FLAGS)
		};
		if n < 0 {
			return Err(classify(errno()));
		}
		trace!("plaintext fd={} sent {} bytes", fd, n);
		Ok(n as usize)
	}

	fn receive(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
		let fd = self.fd()?;
		let n = unsafe {
			libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), libc::MSG_DONTWAIT)
		};
		if n < 0 {
			return Err(classify(errno()));
		}
		trace!("plaintext fd={} received {} bytes", fd, n);
		Ok(n as usize)
	}

	fn new_session(&self) -> Result<Box<dyn TransportDelegate>, TransportError> {
		Ok(Box::new(PlaintextTransport::new()))
	}
}

#[cfg(test)]
mod tests {
	use std::os::fd::{AsFd, FromRawFd, OwnedFd};
	use super::*;

	fn pair() -> (OwnedFd, OwnedFd) {
		let mut fds = [0 as libc::c_int; 2];
		assert_eq!(unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_STREAM, 0, fds.as_mut_ptr()) }, 0);
		unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
	}

	#[test]
	fn unattached_transport_is_not_connected() {
		let mut transport = PlaintextTransport::new();
		let err = transport.send(b"x").unwrap_err();
		assert_eq!(err.code(), libc::ENOTCONN);
	}

	#[test]
	fn empty_descriptor_needs_a_retry() {
		let (ours, peer) = pair();
		let mut transport = PlaintextTransport::new();
		transport.initialize(true).unwrap();
		transport.on_accept(ours.as_fd()).unwrap();
		assert!(transport.is_server());

		let mut buf = [0u8; 8];
		assert_eq!(transport.receive(&mut buf), Err(TransportError::RetryNeeded));

		let mut echo = PlaintextTransport::new();
		echo.on_connect(peer.as_fd()).unwrap();
		assert_eq!(echo.send(b"hi").unwrap(), 2);
		assert_eq!(transport.receive(&mut buf).unwrap(), 2);
		assert_eq!(&buf[..2], b"hi");

		transport.deinitialize();
		assert!(transport.receive(&mut buf).is_err());
	}
}
