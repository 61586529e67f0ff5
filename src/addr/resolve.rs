use std::ffi::{CStr, CString};
use log::debug;
use super::{Address, FromSockAddr};

/// Turns a host name and port into a transport address.
///
/// Returns `None` when the host cannot be resolved.
pub trait Resolver {
	fn resolve(&self, host: &str, port: u16) -> Option<Address>;
}

impl<F> Resolver for F
where
	F: Fn(&str, u16) -> Option<Address>,
{
	fn resolve(&self, host: &str, port: u16) -> Option<Address> {
		self(host, port)
	}
}

/// Resolver backed by the platform's `getaddrinfo()`.
///
/// Picks the first stream-capable IPv4 or IPv6 result, in the order the
/// platform returns them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
	fn resolve(&self, host: &str, port: u16) -> Option<Address> {
		let node = CString::new(host).ok()?;
		let service = CString::new(port.to_string()).ok()?;

		let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
		hints.ai_family = libc::AF_UNSPEC;
		hints.ai_socktype = libc::SOCK_STREAM;

		let mut list: *mut libc::addrinfo = std::ptr::null_mut();
		let rc = unsafe { libc::getaddrinfo(node.as_ptr(), service.as_ptr(), &hints, &mut list) };
		if rc != 0 {
			let reason = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) };
			debug!("getaddrinfo({}, {}) failed: {}", host, port, reason.to_string_lossy());
			return None;
		}

		let mut found = None;
		let mut cursor = list;
		while !cursor.is_null() {
			let info = unsafe { &*cursor };
			if let Some(addr) = unsafe { Address::from_sockaddr(info.ai_addr, info.ai_addrlen) } {
				found = Some(addr);
				break;
			}
			cursor = info.ai_next;
		}
		unsafe { libc::freeaddrinfo(list) };

		found
	}
}
