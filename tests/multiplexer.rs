use cachelane::{
	Address, IoError, Shutdown, Socket, SocketAddrV4, SocketConfig, check_status, wait,
};

fn pair(server: &Socket, local: Address) -> (Socket, Socket) {
	let mut client = Socket::new(local, SocketConfig::new());
	client.connect().unwrap();
	let accepted = server.accept().unwrap();
	(client, accepted)
}

fn listener() -> (Socket, Address) {
	let mut server = Socket::new(Address::V4(SocketAddrV4::localhost(0)), SocketConfig::new());
	server.listen().unwrap();
	let local = server.local_address().unwrap();
	(server, local)
}

#[test]
fn nothing_ready_times_out() {
	let (server, local) = listener();
	let (_c1, a1) = pair(&server, local);
	let (_c2, a2) = pair(&server, local);
	assert!(wait([&a1, &a2], 0, false).unwrap().is_none());
	assert!(wait([&a1, &a2], 20, false).unwrap().is_none());
}

#[test]
fn ready_sockets_come_back_in_input_order() {
	let (server, local) = listener();
	let (mut c1, a1) = pair(&server, local);
	let (_c2, a2) = pair(&server, local);
	let (mut c3, a3) = pair(&server, local);

	c3.write(b"three").unwrap();
	c1.write(b"one").unwrap();

	let ready = wait([&a1, &a2, &a3], 1000, false).unwrap().unwrap();
	let fds: Vec<i32> = ready.iter().map(|s| s.descriptor()).collect();
	assert_eq!(fds, vec![a1.descriptor(), a3.descriptor()]);
}

#[test]
fn wait_forever_returns_once_data_arrives() {
	let (server, local) = listener();
	let (mut client, accepted) = pair(&server, local);
	client.write(b"x").unwrap();

	let ready = wait([&accepted], 0, true).unwrap().unwrap();
	assert_eq!(ready.len(), 1);
}

#[test]
fn pending_connection_makes_a_listener_ready() {
	let (server, local) = listener();
	assert!(wait([&server], 0, false).unwrap().is_none());

	let mut client = Socket::new(local, SocketConfig::new());
	client.connect().unwrap();
	assert!(wait([&server], 1000, false).unwrap().is_some());
	server.accept().unwrap();
}

#[test]
fn cached_bytes_do_not_count_as_ready() {
	let (server, local) = listener();
	let (mut client, mut accepted) = pair(&server, local);
	client.write(b"abcdef").unwrap();

	let mut head = [0u8; 2];
	accepted.read(&mut head, true).unwrap();
	assert_eq!(accepted.cached_len(), 4);
	assert!(wait([&accepted], 0, false).unwrap().is_none());
}

#[test]
fn unopened_socket_is_a_bad_descriptor() {
	let (server, local) = listener();
	let (_client, accepted) = pair(&server, local);
	let idle = Socket::new(local, SocketConfig::new());

	assert!(matches!(wait([&accepted, &idle], 0, false), Err(IoError::BadDescriptor { fd: -1 })));
}

#[test]
fn shut_down_socket_is_not_active() {
	let (server, local) = listener();
	let (_client, mut accepted) = pair(&server, local);
	accepted.shutdown(Shutdown::ReadWrite).unwrap();

	let fd = accepted.descriptor();
	match wait([&accepted], 0, false) {
		Err(IoError::NotActive { fd: reported }) => assert_eq!(reported, fd),
		other => panic!("unexpected {:?}", other),
	}
}

#[test]
fn check_status_splits_readable_and_writable() {
	let (server, local) = listener();
	let (mut c1, a1) = pair(&server, local);
	let (_c2, a2) = pair(&server, local);
	c1.write(b"ping").unwrap();

	// give loopback a moment to deliver
	assert!(a1.readiness(1000).unwrap().readable);

	let (readable, writable) = check_status([&a1, &a2]).unwrap();
	assert_eq!(readable.len(), 1);
	assert_eq!(readable[0].descriptor(), a1.descriptor());
	assert_eq!(writable.len(), 2);
}
