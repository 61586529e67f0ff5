use crate::addr::ToSockAddr;

/// An IPv4 endpoint: four octets and a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketAddrV4 {
	ip: [u8; 4],
	port: u16,
}

impl SocketAddrV4 {
	pub fn new(ip: [u8; 4], port: u16) -> Self {
		Self { ip, port }
	}

	/// Loopback (127.0.0.1) on the given port.
	pub fn localhost(port: u16) -> Self {
		Self::new([127, 0, 0, 1], port)
	}

	pub(crate) fn from_raw(raw: &libc::sockaddr_in) -> Self {
		Self::new(raw.sin_addr.s_addr.to_ne_bytes(), u16::from_be(raw.sin_port))
	}

	pub fn ip(&self) -> [u8; 4] {
		self.ip
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub(crate) fn to_raw(&self) -> libc::sockaddr_in {
		// zeroed first: BSD layouts carry an extra sin_len byte
		let mut raw: libc::sockaddr_in = unsafe { std::mem::zeroed() };
		raw.sin_family = libc::AF_INET as libc::sa_family_t;
		raw.sin_port = self.port.to_be();
		raw.sin_addr = libc::in_addr {
			s_addr: u32::from_ne_bytes(self.ip),
		};
		raw
	}
}

impl std::fmt::Display for SocketAddrV4 {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let [a, b, c, d] = self.ip;
		write!(f, "{}.{}.{}.{}:{}", a, b, c, d, self.port)
	}
}

impl From<std::net::SocketAddrV4> for SocketAddrV4 {
	fn from(addr: std::net::SocketAddrV4) -> Self {
		Self::new(addr.ip().octets(), addr.port())
	}
}

impl From<SocketAddrV4> for std::net::SocketAddrV4 {
	fn from(addr: SocketAddrV4) -> Self {
		std::net::SocketAddrV4::new(addr.ip.into(), addr.port)
	}
}

impl ToSockAddr for SocketAddrV4 {
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		let raw = self.to_raw();
		let len = std::mem::size_of_val(&raw) as libc::socklen_t;
		Some(f(&raw as *const libc::sockaddr_in as *const libc::sockaddr, len))
	}
}

/*
 s_addr holds the four octets in network order, so the in-memory bytes
 are exactly `ip`: from_ne_bytes/to_ne_bytes keep them untouched on
 either endianness. The port is the only field that needs to_be().
 */
