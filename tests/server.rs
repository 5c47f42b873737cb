//! End-to-end tests driving a real server bound to an ephemeral port, with a
//! channel-backed sink standing in for stdout.

use std::io::Write;
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use inlet::{Server, ServerConfig, ServerHandle, TextSink, READ_BUFFER_SIZE};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

struct ChannelSink(mpsc::Sender<String>);

impl TextSink for ChannelSink {
    fn emit(&mut self, text: &str) {
        let _ = self.0.send(text.to_owned());
    }
}

fn start_server() -> (ServerHandle, Receiver<String>) {
    let (tx, rx) = mpsc::channel::<String>();
    let config = ServerConfig::builder()
        .addr("127.0.0.1:0".parse().unwrap())
        .build();
    let server = Server::bind(config, ChannelSink(tx)).unwrap();
    let handle = server.start().unwrap();
    (handle, rx)
}

#[test]
fn test_hello_is_emitted_exactly_once() {
    let (handle, rx) = start_server();

    let mut client = TcpStream::connect(handle.local_addr()).unwrap();
    client.write_all(b"hello").unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "hello");
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(150)),
        Err(RecvTimeoutError::Timeout)
    );

    handle.shutdown();
}

#[test]
fn test_write_immediately_after_connect_is_not_lost() {
    let (handle, rx) = start_server();

    // Keep an idle connection registered so the read loop is actively
    // polling a non-empty set when the next registration lands.
    let _idle = TcpStream::connect(handle.local_addr()).unwrap();

    let mut client = TcpStream::connect(handle.local_addr()).unwrap();
    client.write_all(b"right away").unwrap();

    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "right away");

    handle.shutdown();
}

#[test]
fn test_oversized_payload_arrives_as_multiple_chunks() {
    let (handle, rx) = start_server();

    let payload = "x".repeat(3 * READ_BUFFER_SIZE);
    let mut client = TcpStream::connect(handle.local_addr()).unwrap();
    client.write_all(payload.as_bytes()).unwrap();

    let mut chunks = Vec::new();
    let mut received = 0;
    while received < payload.len() {
        let chunk = rx.recv_timeout(RECV_TIMEOUT).unwrap();
        assert!(chunk.len() <= READ_BUFFER_SIZE);
        received += chunk.len();
        chunks.push(chunk);
    }

    assert!(chunks.len() >= 2);
    assert_eq!(chunks.concat(), payload);

    handle.shutdown();
}

#[test]
fn test_silent_disconnect_produces_no_emission() {
    let (handle, rx) = start_server();

    {
        let _client = TcpStream::connect(handle.local_addr()).unwrap();
        // connects, sends nothing, drops
    }
    thread::sleep(Duration::from_millis(100));
    assert!(rx.try_recv().is_err());

    // The server keeps accepting afterwards.
    let mut late = TcpStream::connect(handle.local_addr()).unwrap();
    late.write_all(b"after").unwrap();
    assert_eq!(rx.recv_timeout(RECV_TIMEOUT).unwrap(), "after");

    handle.shutdown();
}

#[test]
fn test_two_simultaneous_clients_both_observed() {
    let (handle, rx) = start_server();
    let addr = handle.local_addr();

    let first = thread::spawn(move || {
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"0123456789").unwrap();
        client
    });
    let second = thread::spawn(move || {
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"abcdefghij").unwrap();
        client
    });
    let _c1 = first.join().unwrap();
    let _c2 = second.join().unwrap();

    let mut seen = vec![
        rx.recv_timeout(RECV_TIMEOUT).unwrap(),
        rx.recv_timeout(RECV_TIMEOUT).unwrap(),
    ];
    seen.sort();
    assert_eq!(seen, vec!["0123456789".to_owned(), "abcdefghij".to_owned()]);

    handle.shutdown();
}

#[test]
fn test_many_clients_all_accepted_and_observed() {
    let (handle, rx) = start_server();
    let addr = handle.local_addr();
    let client_count = 8;

    let mut clients = Vec::new();
    for i in 0..client_count {
        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(format!("msg-{i}").as_bytes()).unwrap();
        clients.push(client);
    }

    let mut seen: Vec<String> = (0..client_count)
        .map(|_| rx.recv_timeout(RECV_TIMEOUT).unwrap())
        .collect();
    seen.sort();

    let mut expected: Vec<String> = (0..client_count).map(|i| format!("msg-{i}")).collect();
    expected.sort();
    assert_eq!(seen, expected);

    assert_eq!(handle.connection_count(), client_count);

    handle.shutdown();
}
