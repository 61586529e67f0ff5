pub mod socket;
pub mod multiplexer;
pub mod transport;
mod addr;
mod config;
mod error;

pub use self::error::{Error, IoError, SocketError, errno};
pub use self::addr::{Address, SocketAddrV4, SocketAddrV6, ToSockAddr, FromSockAddr,
					 Resolver, SystemResolver};
pub use self::config::{SocketConfig, DEFAULT_READ_BUFFER_SIZE, MINIMUM_READ_BUFFER_SIZE,
					   DEFAULT_WRITE_BUFFER_SIZE, TRANSPORT_BUFFER_SIZE,
					   DEFAULT_TRANSPORT_RETRY_LIMIT, DEFAULT_BACKLOG};
pub use self::socket::{Socket, Shutdown, ReadCache, INVALID_DESCRIPTOR,
					   set_reuse_addr, set_tcp_nodelay, set_linger, set_nonblocking, is_nonblocking};
pub use self::multiplexer::{Readiness, wait, check_status};
pub use self::transport::{TransportDelegate, TransportError, PlaintextTransport};
