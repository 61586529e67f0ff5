use crate::transport::TransportError;

/// Socket creation/configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("socket() failed: {}", errno_to_str(*.errno))]
    Create { errno: i32 },

    #[error("bind({addr}) failed: {}", errno_to_str(*.errno))]
    Bind { errno: i32, addr: String },

    #[error("listen(backlog={backlog}) failed: {}", errno_to_str(*.errno))]
    Listen { errno: i32, backlog: i32 },

    #[error("connect({addr}) failed: {}", errno_to_str(*.errno))]
    Connect { errno: i32, addr: String },

    #[error("accept() failed: {}", errno_to_str(*.errno))]
    Accept { errno: i32 },

    #[error("setsockopt({option}) failed: {}", errno_to_str(*.errno))]
    SetOption { errno: i32, option: &'static str },

    #[error("getsockopt({option}) failed: {}", errno_to_str(*.errno))]
    GetOption { errno: i32, option: &'static str },

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    #[error("could not resolve {host}:{port}")]
    Unresolved { host: String, port: u16 },

    #[error("socket already has a descriptor")]
    AlreadyOpen,

    #[error("socket has been closed")]
    Closed,
}

/// Buffered read/write and multiplexer errors.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("destination buffer must hold at least one byte")]
    InvalidBuffer,

    #[error("buffer too small: {needed} bytes cached, room for {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("socket is not connected")]
    NotConnected,

    #[error("connection reset: {reason}")]
    ConnectionReset { reason: String },

    #[error("recv() failed: {reason}")]
    ReceiveFailed { reason: String },

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("operation timed out")]
    Timeouted,

    #[error("no listener on the remote end")]
    NoListener,

    #[error("no data to write")]
    NoData,

    #[error("no response received")]
    NoResponse,

    #[error("send() failed: {reason}")]
    SendFailed { reason: String },

    #[error("bad descriptor {fd}")]
    BadDescriptor { fd: i32 },

    #[error("descriptor {fd} is neither connected nor listening")]
    NotActive { fd: i32 },

    #[error("select() failed: {reason}")]
    SelectFailed { reason: String },

    #[error("received data is not valid UTF-8")]
    InvalidUtf8,

    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// Any failure raised by a socket operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Io(IoError::Transport(err))
    }
}

/// Returns current errno value.
#[cfg(any(target_os = "linux", target_os = "android"))]
#[inline]
pub fn errno() -> i32 {
    unsafe { *libc::__errno_location() }
}

/// Returns current errno value.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
#[inline]
pub fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Converts errno to human-readable string.
pub(crate) fn errno_to_str(errno: i32) -> String {
    match errno {
        libc::EACCES => "permission denied".into(),
        libc::EADDRINUSE => "address already in use".into(),
        libc::EADDRNOTAVAIL => "address not available".into(),
        libc::EAFNOSUPPORT => "address family not supported".into(),
        libc::EAGAIN => "resource temporarily unavailable".into(),
        libc::EBADF => "bad file descriptor".into(),
        libc::ECONNREFUSED => "connection refused".into(),
        libc::ECONNRESET => "connection reset by peer".into(),
        libc::EINPROGRESS => "operation in progress".into(),
        libc::EINTR => "interrupted by signal".into(),
        libc::EINVAL => "invalid argument".into(),
        libc::EMFILE => "too many open files".into(),
        libc::ENETUNREACH => "network unreachable".into(),
        libc::ENOBUFS => "no buffer space available".into(),
        libc::ENOTCONN => "not connected".into(),
        libc::ENOTSOCK => "not a socket".into(),
        libc::EPIPE => "broken pipe".into(),
        libc::ETIMEDOUT => "connection timed out".into(),
        _ => format!("errno {}", errno),
    }
}

/// Maps errno to std::io::ErrorKind.
fn errno_to_kind(errno: i32) -> std::io::ErrorKind {
    match errno {
        libc::EACCES | libc::EPERM => std::io::ErrorKind::PermissionDenied,
        libc::EADDRINUSE => std::io::ErrorKind::AddrInUse,
        libc::EADDRNOTAVAIL => std::io::ErrorKind::AddrNotAvailable,
        libc::ECONNREFUSED => std::io::ErrorKind::ConnectionRefused,
        libc::ECONNRESET => std::io::ErrorKind::ConnectionReset,
        libc::EINTR => std::io::ErrorKind::Interrupted,
        libc::EINVAL => std::io::ErrorKind::InvalidInput,
        libc::ENOTCONN => std::io::ErrorKind::NotConnected,
        libc::EPIPE => std::io::ErrorKind::BrokenPipe,
        libc::ETIMEDOUT => std::io::ErrorKind::TimedOut,
        e if e == libc::EAGAIN || e == libc::EWOULDBLOCK => std::io::ErrorKind::WouldBlock,
        _ => std::io::ErrorKind::Other,
    }
}

impl From<SocketError> for std::io::Error {
    fn from(err: SocketError) -> Self {
        let errno = match &err {
            SocketError::Create { errno } => *errno,
            SocketError::Bind { errno, .. } => *errno,
            SocketError::Listen { errno, .. } => *errno,
            SocketError::Connect { errno, .. } => *errno,
            SocketError::Accept { errno } => *errno,
            SocketError::SetOption { errno, .. } => *errno,
            SocketError::GetOption { errno, .. } => *errno,
            SocketError::InvalidAddress { .. } => libc::EINVAL,
            SocketError::Unresolved { .. } => libc::EADDRNOTAVAIL,
            SocketError::AlreadyOpen => libc::EISCONN,
            SocketError::Closed => libc::EBADF,
        };
        std::io::Error::new(errno_to_kind(errno), err)
    }
}

impl From<IoError> for std::io::Error {
    fn from(err: IoError) -> Self {
        use std::io::ErrorKind;
        let kind = match &err {
            IoError::InvalidBuffer | IoError::BufferTooSmall { .. } => ErrorKind::InvalidInput,
            IoError::NotConnected | IoError::NotActive { .. } => ErrorKind::NotConnected,
            IoError::ConnectionReset { .. } => ErrorKind::ConnectionReset,
            IoError::ConnectionClosed => ErrorKind::BrokenPipe,
            IoError::Timeouted | IoError::NoResponse => ErrorKind::TimedOut,
            IoError::NoListener => ErrorKind::ConnectionRefused,
            IoError::NoData => ErrorKind::WriteZero,
            IoError::InvalidUtf8 => ErrorKind::InvalidData,
            IoError::BadDescriptor { .. } => ErrorKind::InvalidInput,
            IoError::Transport(TransportError::RetryNeeded) => ErrorKind::WouldBlock,
            IoError::ReceiveFailed { .. }
            | IoError::SendFailed { .. }
            | IoError::SelectFailed { .. }
            | IoError::Transport(_) => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Socket(e) => e.into(),
            Error::Io(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_are_never_empty() {
        assert_eq!(errno_to_str(libc::ECONNRESET), "connection reset by peer");
        assert_eq!(errno_to_str(9999), "errno 9999");
    }

    #[test]
    fn io_errors_keep_their_kind() {
        let err: std::io::Error = IoError::ConnectionReset { reason: "x".into() }.into();
        assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);

        let err: std::io::Error = IoError::Transport(TransportError::RetryNeeded).into();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);

        let err: std::io::Error = Error::Socket(SocketError::Accept { errno: libc::EINVAL }).into();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
