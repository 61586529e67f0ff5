use crate::addr::ToSockAddr;

/// An IPv6 endpoint. `scope_id` picks the interface for link-local (`fe80::/10`)
/// hosts and is 0 everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddrV6 {
	ip: [u8; 16],
	port: u16,
	scope_id: u32,
}

impl SocketAddrV6 {
	pub fn new(ip: [u8; 16], port: u16) -> Self {
		Self::with_scope(ip, port, 0)
	}

	/// `::1` on the given port.
	pub fn localhost(port: u16) -> Self {
		let mut ip = [0u8; 16];
		ip[15] = 1;
		Self::new(ip, port)
	}

	pub fn with_scope(ip: [u8; 16], port: u16, scope_id: u32) -> Self {
		Self { ip, port, scope_id }
	}

	pub fn ip(&self) -> [u8; 16] {
		self.ip
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn scope_id(&self) -> u32 {
		self.scope_id
	}

	pub(crate) fn to_raw(&self) -> libc::sockaddr_in6 {
		let mut raw: libc::sockaddr_in6 = unsafe { std::mem::zeroed() };
		raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
		raw.sin6_port = self.port.to_be();
		raw.sin6_addr = libc::in6_addr { s6_addr: self.ip };
		raw.sin6_scope_id = self.scope_id;
		raw
	}

	pub(crate) fn from_raw(raw: &libc::sockaddr_in6) -> Self {
		Self::with_scope(raw.sin6_addr.s6_addr, u16::from_be(raw.sin6_port), raw.sin6_scope_id)
	}
}

impl std::fmt::Display for SocketAddrV6 {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", std::net::SocketAddrV6::from(*self))
	}
}

impl From<std::net::SocketAddrV6> for SocketAddrV6 {
	fn from(addr: std::net::SocketAddrV6) -> Self {
		Self::with_scope(addr.ip().octets(), addr.port(), addr.scope_id())
	}
}

impl From<SocketAddrV6> for std::net::SocketAddrV6 {
	fn from(addr: SocketAddrV6) -> Self {
		std::net::SocketAddrV6::new(addr.ip.into(), addr.port, 0, addr.scope_id)
	}
}

impl ToSockAddr for SocketAddrV6 {
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();
		let len = std::mem::size_of_val(&raw) as libc::socklen_t;
		Some(f(&raw as *const libc::sockaddr_in6 as *const libc::sockaddr, len))
	}
}
