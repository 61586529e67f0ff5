use std::os::fd::AsRawFd;
use crate::error::{SocketError, errno};

/// Flags for every raw `send()`: a write to a closed peer must surface as
/// EPIPE, never as a process-killing SIGPIPE.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
pub(crate) const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
pub(crate) const SEND_FLAGS: libc::c_int = 0;

fn set_int_option<S: AsRawFd>(
	socket: &S,
	level: libc::c_int,
	name: libc::c_int,
	val: libc::c_int,
	option: &'static str,
) -> Result<(), SocketError> {
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			level,
			name,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::c_int>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option })
	} else {
		Ok(())
	}
}

/// SO_REUSEADDR: lets a listener rebind a port still in TIME_WAIT.
pub fn set_reuse_addr<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_int_option(socket, libc::SOL_SOCKET, libc::SO_REUSEADDR, enable as libc::c_int, "SO_REUSEADDR")
}

/// TCP_NODELAY: small request/response writes go out without Nagle delay.
pub fn set_tcp_nodelay<S: AsRawFd>(socket: &S, enable: bool) -> Result<(), SocketError> {
	set_int_option(socket, libc::IPPROTO_TCP, libc::TCP_NODELAY, enable as libc::c_int, "TCP_NODELAY")
}

/// SO_LINGER.
///
/// `None` restores the default close. `Some(0)` makes close send RST and drop
/// unsent data. `Some(n)` makes close wait up to `n` seconds for a flush.
pub fn set_linger<S: AsRawFd>(socket: &S, linger: Option<u32>) -> Result<(), SocketError> {
	let val = match linger {
		None => libc::linger { l_onoff: 0, l_linger: 0 },
		Some(seconds) => libc::linger {
			l_onoff: 1,
			l_linger: seconds as libc::c_int,
		},
	};
	let result = unsafe {
		libc::setsockopt(
			socket.as_raw_fd(),
			libc::SOL_SOCKET,
			libc::SO_LINGER,
			&val as *const _ as *const libc::c_void,
			std::mem::size_of::<libc::linger>() as libc::socklen_t,
		)
	};
	if result == -1 {
		Err(SocketError::SetOption { errno: errno(), option: "SO_LINGER" })
	} else {
		Ok(())
	}
}

/// Sets or clears O_NONBLOCK.
pub fn set_nonblocking<S: AsRawFd>(socket: &S, nonblocking: bool) -> Result<(), SocketError> {
	let fd = socket.as_raw_fd();
	let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" });
	}
	let new_flags = if nonblocking {
		flags | libc::O_NONBLOCK
	} else {
		flags & !libc::O_NONBLOCK
	};
	if unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) } == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "O_NONBLOCK" });
	}
	Ok(())
}

/// Returns true when O_NONBLOCK is set.
pub fn is_nonblocking<S: AsRawFd>(socket: &S) -> Result<bool, SocketError> {
	let flags = unsafe { libc::fcntl(socket.as_raw_fd(), libc::F_GETFL) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFL" });
	}
	Ok(flags & libc::O_NONBLOCK != 0)
}

/// Marks the descriptor close-on-exec.
pub(crate) fn set_cloexec<S: AsRawFd>(socket: &S) -> Result<(), SocketError> {
	let fd = socket.as_raw_fd();
	let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
	if flags == -1 {
		return Err(SocketError::GetOption { errno: errno(), option: "F_GETFD" });
	}
	if unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
		return Err(SocketError::SetOption { errno: errno(), option: "FD_CLOEXEC" });
	}
	Ok(())
}

/// Platforms without MSG_NOSIGNAL suppress SIGPIPE per socket instead.
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub(crate) fn suppress_sigpipe<S: AsRawFd>(socket: &S) -> Result<(), SocketError> {
	set_int_option(socket, libc::SOL_SOCKET, libc::SO_NOSIGPIPE, 1, "SO_NOSIGPIPE")
}

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
pub(crate) fn suppress_sigpipe<S: AsRawFd>(_socket: &S) -> Result<(), SocketError> {
	Ok(())
}
