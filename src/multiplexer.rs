//! `select()`-based readiness over sets of sockets.
//!
//! Only kernel readiness is reported: bytes already sitting in a socket's
//! read cache do not make it "ready" here.

use std::mem::MaybeUninit;
use std::os::fd::RawFd;
use log::{trace, warn};
use crate::error::{IoError, errno, errno_to_str};
use crate::socket::Socket;

/// Result of a single-socket readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
	pub readable: bool,
	pub writable: bool,
}

struct FdSet(libc::fd_set);

impl FdSet {
	fn new() -> Self {
		let mut raw = MaybeUninit::<libc::fd_set>::uninit();
		unsafe {
			libc::FD_ZERO(raw.as_mut_ptr());
			FdSet(raw.assume_init())
		}
	}

	fn insert(&mut self, fd: RawFd) {
		unsafe { libc::FD_SET(fd, &mut self.0) }
	}

	fn contains(&self, fd: RawFd) -> bool {
		unsafe { libc::FD_ISSET(fd, &self.0) }
	}

	fn as_mut_ptr(&mut self) -> *mut libc::fd_set {
		&mut self.0
	}
}

fn to_timeval(timeout_ms: u32) -> libc::timeval {
	libc::timeval {
		tv_sec: (timeout_ms / 1000) as libc::time_t,
		tv_usec: ((timeout_ms % 1000) * 1000) as libc::suseconds_t,
	}
}

fn check_descriptor(fd: RawFd) -> Result<(), IoError> {
	if fd < 0 || fd >= libc::FD_SETSIZE as RawFd {
		return Err(IoError::BadDescriptor { fd });
	}
	Ok(())
}

/// Runs `select()`; `None` waits without limit. Returns the ready count.
fn select(
	max_fd: RawFd,
	read: Option<&mut FdSet>,
	write: Option<&mut FdSet>,
	timeout_ms: Option<u32>,
) -> Result<usize, IoError> {
	let read = read.map_or(std::ptr::null_mut(), FdSet::as_mut_ptr);
	let write = write.map_or(std::ptr::null_mut(), FdSet::as_mut_ptr);
	let mut timeval = timeout_ms.map(to_timeval);
	let timeout = timeval
		.as_mut()
		.map_or(std::ptr::null_mut(), |tv| tv as *mut libc::timeval);

	let n = unsafe { libc::select(max_fd + 1, read, write, std::ptr::null_mut(), timeout) };
	if n < 0 {
		let err = errno();
		warn!("select() failed: {}", errno_to_str(err));
		return Err(IoError::SelectFailed { reason: errno_to_str(err) });
	}
	Ok(n as usize)
}

/// Read/write readiness of one descriptor.
pub(crate) fn probe(fd: RawFd, timeout_ms: Option<u32>) -> Result<Readiness, IoError> {
	check_descriptor(fd)?;
	let mut read = FdSet::new();
	let mut write = FdSet::new();
	read.insert(fd);
	write.insert(fd);

	select(fd, Some(&mut read), Some(&mut write), timeout_ms)?;
	Ok(Readiness {
		readable: read.contains(fd),
		writable: write.contains(fd),
	})
}

/// Waits until `fd` is readable; false on timeout.
pub(crate) fn wait_readable(fd: RawFd, timeout_ms: Option<u32>) -> Result<bool, IoError> {
	check_descriptor(fd)?;
	let mut read = FdSet::new();
	read.insert(fd);
	Ok(select(fd, Some(&mut read), None, timeout_ms)? > 0 && read.contains(fd))
}

/// Waits for any of `sockets` to become readable.
///
/// Every socket must have a descriptor ([`IoError::BadDescriptor`]) and be
/// connected or listening ([`IoError::NotActive`]). A listening socket is
/// readable when a connection is pending.
///
/// Returns `Ok(None)` when `timeout_ms` expires first (or when `sockets` is
/// empty), otherwise the ready sockets in input order. With `wait_forever`
/// the timeout is ignored.
pub fn wait<'a, I>(sockets: I, timeout_ms: u32, wait_forever: bool) -> Result<Option<Vec<&'a Socket>>, IoError>
where
	I: IntoIterator<Item = &'a Socket>,
{
	let sockets: Vec<&'a Socket> = sockets.into_iter().collect();
	if sockets.is_empty() {
		return Ok(None);
	}

	let mut set = FdSet::new();
	let mut max_fd = 0;
	for socket in &sockets {
		let fd = socket.descriptor();
		check_descriptor(fd)?;
		if !socket.is_active() {
			return Err(IoError::NotActive { fd });
		}
		set.insert(fd);
		max_fd = max_fd.max(fd);
	}

	let timeout = if wait_forever { None } else { Some(timeout_ms) };
	let count = select(max_fd, Some(&mut set), None, timeout)?;
	if count == 0 {
		trace!("wait: timed out after {}ms", timeout_ms);
		return Ok(None);
	}

	let ready: Vec<&'a Socket> = sockets
		.into_iter()
		.filter(|socket| set.contains(socket.descriptor()))
		.collect();
	trace!("wait: {} of {} ready", ready.len(), count);
	Ok(Some(ready))
}

/// Splits `sockets` into (readable, writable) without waiting.
///
/// A socket may appear in both lists.
pub fn check_status<'a, I>(sockets: I) -> Result<(Vec<&'a Socket>, Vec<&'a Socket>), IoError>
where
	I: IntoIterator<Item = &'a Socket>,
{
	let mut readable = Vec::new();
	let mut writable = Vec::new();
	for socket in sockets {
		let status = socket.readiness(0)?;
		if status.readable {
			readable.push(socket);
		}
		if status.writable {
			writable.push(socket);
		}
	}
	Ok((readable, writable))
}
