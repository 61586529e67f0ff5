//! The buffered socket.
//!
//! A [`Socket`] owns one descriptor, a fixed-size scratch buffer for raw
//! receives and a [`ReadCache`] of bytes received but not yet delivered.
//! An optional [`TransportDelegate`] intercepts raw send/receive.

mod cache;
mod options;
mod read;
mod scratch;
mod write;

pub use self::cache::ReadCache;
pub use self::options::{set_reuse_addr, set_tcp_nodelay, set_linger, set_nonblocking, is_nonblocking};
pub(crate) use self::options::SEND_FLAGS;

use std::os::fd::{AsFd, AsRawFd, FromRawFd, OwnedFd, RawFd};
use log::debug;
use crate::addr::{Address, FromSockAddr, Resolver, ToSockAddr};
use crate::config::SocketConfig;
use crate::error::{Error, IoError, SocketError, errno};
use crate::multiplexer::{self, Readiness};
use crate::transport::{TransportDelegate, TransportError};
use self::options::{set_cloexec, suppress_sigpipe};
use self::scratch::ScratchBuffer;

/// Descriptor value reported while no connection exists.
pub const INVALID_DESCRIPTOR: RawFd = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
	Read,   // SHUT_RD
	Write,  // SHUT_WR
	ReadWrite,   // SHUT_RDWR
}

/// A stream socket with a read cache in front of the wire.
///
/// Single-owner and not synchronized: callers that share a `Socket` across
/// threads must serialize access themselves.
pub struct Socket {
	fd: Option<OwnedFd>,
	address: Address,
	config: SocketConfig,
	connected: bool,
	listening: bool,
	remote_closed: bool,
	closed: bool,
	/// `initialize` has run on the transport without a matching `deinitialize`.
	transport_ready: bool,
	scratch: ScratchBuffer,
	cache: ReadCache,
	transport: Option<Box<dyn TransportDelegate>>,
}

impl Socket {
	/// Creates a disconnected socket for `address`.
	///
	/// No descriptor exists until [`Socket::connect`] or [`Socket::listen`].
	pub fn new(address: Address, config: SocketConfig) -> Self {
		Self::assemble(address, config, None)
	}

	/// Creates a disconnected socket whose I/O goes through `transport`.
	///
	/// Buffer sizes are widened for the transport before the scratch buffer
	/// is allocated.
	pub fn with_transport(
		address: Address,
		config: SocketConfig,
		transport: Box<dyn TransportDelegate>,
	) -> Self {
		Self::assemble(address, config, Some(transport))
	}

	fn assemble(
		address: Address,
		config: SocketConfig,
		transport: Option<Box<dyn TransportDelegate>>,
	) -> Self {
		let mut config = config.normalized();
		if transport.is_some() {
			config = config.widened_for_transport();
		}
		Self {
			fd: None,
			address,
			config,
			connected: false,
			listening: false,
			remote_closed: false,
			closed: false,
			transport_ready: false,
			scratch: ScratchBuffer::new(config.read_buffer_size),
			cache: ReadCache::new(),
			transport,
		}
	}

	/// Wraps an already connected descriptor.
	pub(crate) fn from_connected_fd(
		fd: OwnedFd,
		address: Address,
		config: SocketConfig,
		transport: Option<Box<dyn TransportDelegate>>,
	) -> Self {
		let mut socket = Self::assemble(address, config, transport);
		socket.transport_ready = socket.transport.is_some();
		socket.fd = Some(fd);
		socket.connected = true;
		socket
	}

	/// Resolves `host` and connects to it.
	pub fn connect_host<R: Resolver>(
		host: &str,
		port: u16,
		resolver: &R,
		config: SocketConfig,
		transport: Option<Box<dyn TransportDelegate>>,
	) -> Result<Self, Error> {
		let address = resolver.resolve(host, port).ok_or_else(|| SocketError::Unresolved {
			host: host.to_string(),
			port,
		})?;
		let mut socket = Self::assemble(address, config, transport);
		socket.connect()?;
		Ok(socket)
	}

	/// Connects to the socket's address (blocking).
	///
	/// With a transport attached: `initialize(false)` before the connect,
	/// `on_connect` after it.
	pub fn connect(&mut self) -> Result<(), Error> {
		self.ensure_unopened()?;
		let fd = open_descriptor(self.address.family())?;

		self.initialize_transport(false)?;
		if let Err(err) = self.connect_descriptor(&fd) {
			self.deinitialize_transport();
			return Err(err);
		}

		debug!("fd={} connected to {}", fd.as_raw_fd(), self.address);
		self.fd = Some(fd);
		self.connected = true;
		self.remote_closed = false;
		Ok(())
	}

	fn connect_descriptor(&mut self, fd: &OwnedFd) -> Result<(), Error> {
		let result = self.address.with_raw(|ptr, len| unsafe {
			libc::connect(fd.as_raw_fd(), ptr, len)
		});
		match result {
			Some(-1) => {
				return Err(SocketError::Connect {
					errno: errno(),
					addr: self.address.to_string(),
				}.into());
			}
			Some(_) => {}
			None => return Err(SocketError::InvalidAddress { reason: "unrepresentable address" }.into()),
		}

		if self.config.nodelay {
			set_tcp_nodelay(fd, true)?;
		}
		if let Some(transport) = self.transport.as_mut() {
			transport.on_connect(fd.as_fd())?;
		}
		Ok(())
	}

	/// Binds to the socket's address and starts listening.
	///
	/// Port 0 picks an ephemeral port; see [`Socket::local_address`].
	pub fn listen(&mut self) -> Result<(), Error> {
		self.ensure_unopened()?;
		let fd = open_descriptor(self.address.family())?;
		set_reuse_addr(&fd, true)?;

		self.initialize_transport(true)?;
		if let Err(err) = self.bind_and_listen(&fd) {
			self.deinitialize_transport();
			return Err(err);
		}

		debug!("fd={} listening on {}", fd.as_raw_fd(), self.address);
		self.fd = Some(fd);
		self.listening = true;
		Ok(())
	}

	fn bind_and_listen(&self, fd: &OwnedFd) -> Result<(), Error> {
		let result = self.address.with_raw(|ptr, len| unsafe {
			libc::bind(fd.as_raw_fd(), ptr, len)
		});
		match result {
			Some(-1) => {
				return Err(SocketError::Bind {
					errno: errno(),
					addr: self.address.to_string(),
				}.into());
			}
			Some(_) => {}
			None => return Err(SocketError::InvalidAddress { reason: "unrepresentable address" }.into()),
		}

		let backlog = self.config.backlog;
		if unsafe { libc::listen(fd.as_raw_fd(), backlog) } == -1 {
			return Err(SocketError::Listen { errno: errno(), backlog }.into());
		}
		Ok(())
	}

	fn initialize_transport(&mut self, as_server: bool) -> Result<(), TransportError> {
		if let Some(transport) = self.transport.as_mut() {
			transport.initialize(as_server)?;
			self.transport_ready = true;
		}
		Ok(())
	}

	fn deinitialize_transport(&mut self) {
		if self.transport_ready && let Some(transport) = self.transport.as_mut() {
			transport.deinitialize();
		}
		self.transport_ready = false;
	}

	/// Accepts one pending connection (blocking unless the listener is
	/// non-blocking).
	///
	/// The accepted socket gets the peer address, this socket's config and,
	/// when a transport is attached here, its own transport session.
	pub fn accept(&self) -> Result<Socket, Error> {
		let listener = match (&self.fd, self.listening) {
			(Some(fd), true) => fd.as_raw_fd(),
			_ => return Err(IoError::NotActive { fd: self.descriptor() }.into()),
		};

		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
		let raw = loop {
			let fd = unsafe {
				libc::accept(listener, &mut storage as *mut _ as *mut libc::sockaddr, &mut len)
			};
			if fd != -1 {
				break fd;
			}
			let err = errno();
			if err != libc::EINTR {
				return Err(SocketError::Accept { errno: err }.into());
			}
		};
		let fd = unsafe { OwnedFd::from_raw_fd(raw) };
		set_cloexec(&fd)?;
		suppress_sigpipe(&fd)?;

		let peer = unsafe {
			Address::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len)
		}
		.ok_or(SocketError::InvalidAddress { reason: "invalid client address" })?;

		if self.config.nodelay {
			set_tcp_nodelay(&fd, true)?;
		}

		let transport = match &self.transport {
			Some(parent) => {
				let mut session = parent.new_session()?;
				session.initialize(true)?;
				session.on_accept(fd.as_fd())?;
				Some(session)
			}
			None => None,
		};

		debug!("fd={} accepted {} as fd={}", listener, peer, fd.as_raw_fd());
		Ok(Socket::from_connected_fd(fd, peer, self.config, transport))
	}

	/// Shuts down one or both directions.
	///
	/// A full shutdown keeps the descriptor but leaves the socket inactive.
	pub fn shutdown(&mut self, how: Shutdown) -> Result<(), Error> {
		let fd = self.owned_fd()?.as_raw_fd();
		let (raw, full) = match how {
			Shutdown::Read => (libc::SHUT_RD, false),
			Shutdown::Write => (libc::SHUT_WR, false),
			Shutdown::ReadWrite => (libc::SHUT_RDWR, true),
		};

		if unsafe { libc::shutdown(fd, raw) } == -1 {
			return Err(SocketError::SetOption { errno: errno(), option: "shutdown" }.into());
		}
		if full {
			self.connected = false;
			self.listening = false;
		}
		Ok(())
	}

	/// Tears the socket down: transport `deinitialize`, then descriptor close.
	///
	/// Idempotent; also run by `Drop`.
	pub fn close(&mut self) {
		self.deinitialize_transport();
		self.transport = None;
		if let Some(fd) = self.fd.take() {
			debug!("fd={} closed ({})", fd.as_raw_fd(), self.address);
		}
		self.connected = false;
		self.listening = false;
		self.closed = true;
	}

	/// Switches the descriptor between blocking and non-blocking mode.
	pub fn set_blocking(&self, blocking: bool) -> Result<(), Error> {
		set_nonblocking(self.owned_fd()?, !blocking)?;
		Ok(())
	}

	/// SO_LINGER on the descriptor; `Some(0)` makes close send RST.
	pub fn set_linger(&self, linger: Option<u32>) -> Result<(), Error> {
		set_linger(self.owned_fd()?, linger)?;
		Ok(())
	}

	/// Single-socket readiness probe, waiting at most `timeout_ms`.
	pub fn readiness(&self, timeout_ms: u32) -> Result<Readiness, IoError> {
		multiplexer::probe(self.descriptor(), Some(timeout_ms))
	}

	/// The address this socket was created for (the peer, for accepted sockets).
	pub fn address(&self) -> &Address {
		&self.address
	}

	/// The locally bound address, as reported by `getsockname()`.
	pub fn local_address(&self) -> Result<Address, Error> {
		let fd = self.owned_fd()?.as_raw_fd();
		let mut storage: libc::sockaddr_storage = unsafe { std::mem::zeroed() };
		let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

		let result = unsafe {
			libc::getsockname(fd, &mut storage as *mut _ as *mut libc::sockaddr, &mut len)
		};
		if result == -1 {
			return Err(SocketError::GetOption { errno: errno(), option: "SO_SOCKNAME" }.into());
		}

		unsafe { Address::from_sockaddr(&storage as *const _ as *const libc::sockaddr, len) }
			.ok_or_else(|| SocketError::InvalidAddress { reason: "invalid address" }.into())
	}

	/// The raw descriptor, or [`INVALID_DESCRIPTOR`] when there is none.
	#[inline]
	pub fn descriptor(&self) -> RawFd {
		self.fd.as_ref().map_or(INVALID_DESCRIPTOR, |fd| fd.as_raw_fd())
	}

	pub fn is_connected(&self) -> bool {
		self.connected
	}

	pub fn is_listening(&self) -> bool {
		self.listening
	}

	/// Connected or listening on a live descriptor.
	pub fn is_active(&self) -> bool {
		self.fd.is_some() && (self.connected || self.listening)
	}

	/// True once a zero-length read has been observed.
	pub fn remote_closed(&self) -> bool {
		self.remote_closed
	}

	/// Bytes received but not yet delivered.
	pub fn cached_len(&self) -> usize {
		self.cache.len()
	}

	pub fn read_buffer_size(&self) -> usize {
		self.config.read_buffer_size
	}

	pub fn write_buffer_size(&self) -> usize {
		self.config.write_buffer_size
	}

	pub fn config(&self) -> &SocketConfig {
		&self.config
	}

	pub fn has_transport(&self) -> bool {
		self.transport.is_some()
	}

	/// Offers `proto` during the transport handshake. No-op without a transport.
	pub fn add_alpn_protocol(&mut self, proto: &str) {
		if let Some(transport) = self.transport.as_mut() {
			transport.add_supported_alpn_protocol(proto);
		}
	}

	pub fn negotiated_alpn_protocol(&self) -> Option<&str> {
		self.transport.as_ref().and_then(|t| t.negotiated_alpn_protocol())
	}

	fn owned_fd(&self) -> Result<&OwnedFd, IoError> {
		self.fd.as_ref().ok_or(IoError::BadDescriptor { fd: INVALID_DESCRIPTOR })
	}

	fn ensure_unopened(&self) -> Result<(), SocketError> {
		if self.closed {
			return Err(SocketError::Closed);
		}
		if self.fd.is_some() {
			return Err(SocketError::AlreadyOpen);
		}
		Ok(())
	}
}

/// Creates a close-on-exec stream descriptor for `family`.
fn open_descriptor(family: libc::c_int) -> Result<OwnedFd, SocketError> {
	let fd = unsafe { libc::socket(family, libc::SOCK_STREAM, 0) };
	if fd == -1 {
		return Err(SocketError::Create { errno: errno() });
	}
	let fd = unsafe { OwnedFd::from_raw_fd(fd) };
	set_cloexec(&fd)?;
	suppress_sigpipe(&fd)?;
	Ok(fd)
}

impl Drop for Socket {
	fn drop(&mut self) {
		self.close();
	}
}

impl std::fmt::Debug for Socket {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Socket")
			.field("fd", &self.descriptor())
			.field("address", &self.address)
			.field("connected", &self.connected)
			.field("listening", &self.listening)
			.field("remote_closed", &self.remote_closed)
			.field("cached", &self.cache.len())
			.field("transport", &self.transport.is_some())
			.finish()
	}
}

#[cfg(test)]
pub(crate) mod test_support {
	use std::os::fd::{FromRawFd, OwnedFd};
	use crate::addr::{Address, SocketAddrV4};
	use crate::config::SocketConfig;
	use crate::transport::{TransportDelegate, TransportError};
	use super::Socket;

	/// A connected unix-stream pair: the `Socket` side and its raw peer.
	pub(crate) fn socket_pair(
		config: SocketConfig,
		transport: Option<Box<dyn TransportDelegate>>,
	) -> (Socket, OwnedFd) {
		let mut fds = [0 as libc::c_int; 2];
		let rc = unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_STREAM, 0, fds.as_mut_ptr()) };
		assert_eq!(rc, 0, "socketpair failed");
		let (ours, peer) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
		let address = Address::V4(SocketAddrV4::localhost(0));
		(Socket::from_connected_fd(ours, address, config, transport), peer)
	}

	pub(crate) fn write_peer(peer: &OwnedFd, bytes: &[u8]) {
		use std::os::fd::AsRawFd;
		let n = unsafe {
			libc::write(peer.as_raw_fd(), bytes.as_ptr() as *const libc::c_void, bytes.len())
		};
		assert_eq!(n, bytes.len() as isize);
	}
}
