//! Transport endpoint addresses.
//!
//! An [`Address`] is either an IPv4 or an IPv6 endpoint. It is produced by a
//! [`Resolver`] (or converted from `std::net::SocketAddr`) and consumed by
//! `Socket::connect` / `Socket::listen`.

mod ipv4;
mod ipv6;
mod resolve;
pub use self::ipv4::SocketAddrV4;
pub use self::ipv6::SocketAddrV6;
pub use self::resolve::{Resolver, SystemResolver};

/// An immutable transport endpoint: family + host + port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Address {
	V4(SocketAddrV4),
	V6(SocketAddrV6),
}

impl Address {
	/// Returns the libc address family constant.
	#[inline]
	pub fn family(&self) -> libc::c_int {
		match self {
			Address::V4(_) => libc::AF_INET,
			Address::V6(_) => libc::AF_INET6,
		}
	}

	/// Returns the port.
	pub fn port(&self) -> u16 {
		match self {
			Address::V4(addr) => addr.port(),
			Address::V6(addr) => addr.port(),
		}
	}

	pub fn is_ipv4(&self) -> bool {
		matches!(self, Address::V4(_))
	}

	pub fn is_ipv6(&self) -> bool {
		matches!(self, Address::V6(_))
	}
}

impl std::fmt::Display for Address {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Address::V4(addr) => std::fmt::Display::fmt(addr, f),
			Address::V6(addr) => std::fmt::Display::fmt(addr, f),
		}
	}
}

impl From<SocketAddrV4> for Address {
	fn from(addr: SocketAddrV4) -> Self {
		Address::V4(addr)
	}
}

impl From<SocketAddrV6> for Address {
	fn from(addr: SocketAddrV6) -> Self {
		Address::V6(addr)
	}
}

impl From<std::net::SocketAddr> for Address {
	fn from(addr: std::net::SocketAddr) -> Self {
		match addr {
			std::net::SocketAddr::V4(v4) => Address::V4(v4.into()),
			std::net::SocketAddr::V6(v6) => Address::V6(v6.into()),
		}
	}
}

impl From<Address> for std::net::SocketAddr {
	fn from(addr: Address) -> Self {
		match addr {
			Address::V4(v4) => std::net::SocketAddr::V4(v4.into()),
			Address::V6(v6) => std::net::SocketAddr::V6(v6.into()),
		}
	}
}

/// Trait for address types that can be converted to raw sockaddr for syscalls.
pub trait ToSockAddr {
	/// Calls the provided closure with a pointer to the raw sockaddr and its size.
	/// Returns None if the address cannot be represented.
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R;
}
/*
 The closure keeps the stack-allocated sockaddr_in / sockaddr_in6 alive for
 exactly as long as the syscall needs the pointer. The two structs differ in
 size, so a pointer to a local can't be returned instead.
 */

impl ToSockAddr for Address {
	fn with_raw<F, R>(&self, f: F) -> Option<R>
	where
		F: FnOnce(*const libc::sockaddr, libc::socklen_t) -> R,
	{
		match self {
			Address::V4(addr) => addr.with_raw(f),
			Address::V6(addr) => addr.with_raw(f),
		}
	}
}

/// Trait for address types that can be created from raw sockaddr.
pub trait FromSockAddr: Sized {
	/// Creates address from raw sockaddr storage.
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self>;
}

impl FromSockAddr for SocketAddrV4 {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_in) };
		Some(Self::from_raw(raw))
	}
}

impl FromSockAddr for SocketAddrV6 {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if len < std::mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t {
			return None;
		}
		let raw = unsafe { &*(addr as *const libc::sockaddr_in6) };
		Some(Self::from_raw(raw))
	}
}

impl FromSockAddr for Address {
	unsafe fn from_sockaddr(addr: *const libc::sockaddr, len: libc::socklen_t) -> Option<Self> {
		if addr.is_null() || len < std::mem::size_of::<libc::sa_family_t>() as libc::socklen_t {
			return None;
		}
		let family = unsafe { (*addr).sa_family } as libc::c_int;
		match family {
			libc::AF_INET => unsafe { SocketAddrV4::from_sockaddr(addr, len) }.map(Address::V4),
			libc::AF_INET6 => unsafe { SocketAddrV6::from_sockaddr(addr, len) }.map(Address::V6),
			_ => None,
		}
	}
}
