use std::io::{Read, Write};
use cachelane::{
	Address, Error, IoError, PlaintextTransport, Shutdown, Socket, SocketAddrV4, SocketConfig,
	SocketError, SystemResolver, TRANSPORT_BUFFER_SIZE,
};

fn listener(config: SocketConfig) -> (Socket, Address) {
	let mut server = Socket::new(Address::V4(SocketAddrV4::localhost(0)), config);
	server.listen().expect("listen");
	let local = server.local_address().expect("local address");
	assert_ne!(local.port(), 0);
	(server, local)
}

/// (listener, client, accepted server side)
fn connected(config: SocketConfig) -> (Socket, Socket, Socket) {
	let (server, local) = listener(config);
	let mut client = Socket::new(local, config);
	client.connect().expect("connect");
	let accepted = server.accept().expect("accept");
	(server, client, accepted)
}

#[test]
fn listen_binds_an_ephemeral_port() {
	let (server, local) = listener(SocketConfig::new());
	assert!(server.is_listening());
	assert!(server.is_active());
	assert!(!server.is_connected());
	assert!(local.is_ipv4());
}

#[test]
fn accepted_socket_is_connected_to_the_client() {
	let (_server, client, accepted) = connected(SocketConfig::new());
	assert!(client.is_connected());
	assert!(accepted.is_connected());
	assert_eq!(accepted.address().port(), client.local_address().unwrap().port());
}

#[test]
fn listener_rejects_reads_and_a_second_listen() {
	let (mut server, _local) = listener(SocketConfig::new());
	let mut buf = [0u8; 8];
	assert!(matches!(server.read(&mut buf, true), Err(IoError::NotConnected)));
	assert!(matches!(server.listen(), Err(Error::Socket(SocketError::AlreadyOpen))));
}

#[test]
fn accept_on_a_plain_socket_is_not_active() {
	let socket = Socket::new(Address::V4(SocketAddrV4::localhost(0)), SocketConfig::new());
	assert!(matches!(socket.accept(), Err(Error::Io(IoError::NotActive { fd: -1 }))));
}

#[test]
fn write_then_read_round_trip() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	assert_eq!(client.write(b"get key\r\n").unwrap(), 9);

	let mut buf = [0u8; 64];
	let n = accepted.read(&mut buf, false).unwrap();
	assert_eq!(&buf[..n], b"get key\r\n");
	assert_eq!(accepted.cached_len(), 0);
}

#[test]
fn small_buffer_reads_drain_the_cache_in_order() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	client.write_str("0123456789").unwrap();

	let mut head = [0u8; 4];
	assert_eq!(accepted.read(&mut head, true).unwrap(), 4);
	assert_eq!(&head, b"0123");
	assert_eq!(accepted.cached_len(), 6);

	let mut small = [0u8; 2];
	assert!(matches!(
		accepted.read(&mut small, false),
		Err(IoError::BufferTooSmall { needed: 6, capacity: 2 })
	));

	let mut rest = [0u8; 6];
	assert_eq!(accepted.read(&mut rest, false).unwrap(), 6);
	assert_eq!(&rest, b"456789");
}

#[test]
fn read_string_collects_text() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	client.write_str("STORED\r\n").unwrap();
	assert_eq!(accepted.read_string().unwrap().as_deref(), Some("STORED\r\n"));
}

#[test]
fn orderly_close_reads_zero() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	accepted.close();

	let mut buf = [0u8; 16];
	assert_eq!(client.read(&mut buf, true).unwrap(), 0);
	assert!(client.remote_closed());
	assert_eq!(client.read(&mut buf, true).unwrap(), 0);
}

#[test]
fn half_close_still_delivers_pending_bytes() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	accepted.write(b"last words").unwrap();
	accepted.shutdown(Shutdown::Write).unwrap();

	let mut out = Vec::new();
	assert_eq!(client.read_to_vec(&mut out).unwrap(), 10);
	assert_eq!(out, b"last words");
	assert_eq!(client.read_to_vec(&mut out).unwrap(), 0);
	assert!(client.remote_closed());
}

#[test]
fn reset_is_reported_with_a_reason() {
	let (_server, mut client, accepted) = connected(SocketConfig::new());
	accepted.set_linger(Some(0)).unwrap();
	drop(accepted);

	let mut buf = [0u8; 16];
	match client.read(&mut buf, true) {
		Err(IoError::ConnectionReset { reason }) => assert!(!reason.is_empty()),
		other => panic!("expected a reset, got {:?}", other),
	}
}

#[test]
fn write_preconditions() {
	let (_server, mut client, _accepted) = connected(SocketConfig::new());
	assert!(matches!(client.write(&[]), Err(IoError::NoData)));

	let mut idle = Socket::new(Address::V4(SocketAddrV4::localhost(9)), SocketConfig::new());
	assert!(matches!(idle.write(b"x"), Err(IoError::NotConnected)));
}

#[test]
fn read_timeout_expires_then_succeeds() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	let mut buf = [0u8; 8];
	assert!(matches!(accepted.read_timeout(&mut buf, 10), Err(IoError::NoResponse)));

	client.write(b"late").unwrap();
	assert_eq!(accepted.read_timeout(&mut buf, 1000).unwrap(), 4);
	assert_eq!(&buf[..4], b"late");
}

#[test]
fn connect_host_resolves_first() {
	let (server, local) = listener(SocketConfig::new());
	let client = Socket::connect_host("127.0.0.1", local.port(), &SystemResolver, SocketConfig::new(), None)
		.unwrap();
	assert!(client.is_connected());
	assert_eq!(client.address(), &local);
	server.accept().unwrap();
}

#[test]
fn connect_host_reports_unresolved_names() {
	let nowhere = |_: &str, _: u16| -> Option<Address> { None };
	match Socket::connect_host("cache.invalid", 11211, &nowhere, SocketConfig::new(), None) {
		Err(Error::Socket(SocketError::Unresolved { host, port })) => {
			assert_eq!(host, "cache.invalid");
			assert_eq!(port, 11211);
		}
		other => panic!("unexpected {:?}", other),
	}
}

#[test]
fn connect_to_a_closed_port_fails() {
	let (mut server, local) = listener(SocketConfig::new());
	server.close();

	let mut client = Socket::new(local, SocketConfig::new());
	match client.connect() {
		Err(Error::Socket(SocketError::Connect { errno, .. })) => assert_eq!(errno, libc::ECONNREFUSED),
		other => panic!("unexpected {:?}", other),
	}
	assert!(!client.is_connected());
}

#[test]
fn buffer_sizes_are_normalized() {
	let config = SocketConfig::new().read_buffer_size(10).write_buffer_size(0);
	let socket = Socket::new(Address::V4(SocketAddrV4::localhost(9)), config);
	assert_eq!(socket.read_buffer_size(), 1024);
	assert_eq!(socket.write_buffer_size(), 1);
}

#[test]
fn plaintext_transport_round_trip() {
	let config = SocketConfig::new();
	let mut server = Socket::with_transport(
		Address::V4(SocketAddrV4::localhost(0)),
		config,
		Box::new(PlaintextTransport::new()),
	);
	server.listen().unwrap();
	let local = server.local_address().unwrap();
	assert_eq!(server.read_buffer_size(), TRANSPORT_BUFFER_SIZE);

	let mut client = Socket::with_transport(local, config, Box::new(PlaintextTransport::new()));
	client.connect().unwrap();
	let mut accepted = server.accept().unwrap();
	assert!(accepted.has_transport());
	assert_eq!(accepted.read_buffer_size(), TRANSPORT_BUFFER_SIZE);
	assert_eq!(accepted.write_buffer_size(), TRANSPORT_BUFFER_SIZE);
	assert_eq!(accepted.negotiated_alpn_protocol(), None);

	client.write(b"version\r\n").unwrap();
	let mut buf = [0u8; 32];
	let n = accepted.read(&mut buf, false).unwrap();
	assert_eq!(&buf[..n], b"version\r\n");

	accepted.write(b"VERSION 1.6\r\n").unwrap();
	assert_eq!(client.read_string().unwrap().as_deref(), Some("VERSION 1.6\r\n"));

	drop(accepted);
	assert_eq!(client.read(&mut buf, true).unwrap(), 0);
	assert!(client.remote_closed());
}

#[test]
fn std_io_traits_work_over_the_socket() {
	let (_server, mut client, mut accepted) = connected(SocketConfig::new());
	client.write_all(b"hello world").unwrap();
	client.flush().unwrap();

	let mut buf = [0u8; 11];
	accepted.read_exact(&mut buf).unwrap();
	assert_eq!(&buf, b"hello world");
}
