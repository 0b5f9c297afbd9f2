use std::net::SocketAddr;
use std::time::Duration;

use indoc::indoc;
use micro_conn::handler::DemoHandler;
use micro_conn::server::{Protocol, Server};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const HELLO_RESPONSE: &str = "HTTP/1.1 200 OK\r\nServer: micro-conn\r\nContent-Length: 13\r\n\r\nhello world.\n";

async fn start(protocol: Protocol, concurrent: bool) -> (SocketAddr, CancellationToken, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let server = Server::builder().protocol(protocol).concurrent(concurrent).handler(DemoHandler::new()).build().unwrap();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(server.serve(listener, shutdown.clone()));

    (address, shutdown, task)
}

async fn round_trip(address: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await.unwrap().unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn http_pipelined_requests() {
    let (address, shutdown, task) = start(Protocol::Http, true).await;

    let requests = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        POST /echo HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 4

        pingGET / HTTP/1.1

        "##}
    .replace('\n', "\r\n");

    let response = round_trip(address, requests.as_bytes()).await;
    assert_eq!(
        response,
        format!("{HELLO_RESPONSE}HTTP/1.1 200 OK\r\nServer: micro-conn\r\nContent-Length: 4\r\n\r\nping{HELLO_RESPONSE}")
    );

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn http_error_response_closes_connection() {
    let (address, shutdown, task) = start(Protocol::Http, true).await;

    let response = round_trip(address, b"POST /echo HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 501 Not Implemented\r\n"), "{response}");
    assert!(response.contains("Connection: close\r\n"));
    assert!(response.ends_with("unsupported body framing: neither content-length nor chunked\n"));

    // the server keeps accepting after a rejected connection
    assert_eq!(round_trip(address, b"GET / HTTP/1.1\r\n\r\n").await, HELLO_RESPONSE);

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn line_protocol_sequential() {
    let (address, shutdown, task) = start(Protocol::Line, false).await;

    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(b"hello\n").await.unwrap();
    let mut reply = [0u8; 12];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"Echo: hello\n");

    stream.write_all(b"quit\n").await.unwrap();
    let mut rest = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut rest)).await.unwrap().unwrap();
    assert_eq!(&rest[..], b"Goodbye!");

    // the next connection is served once the first one is done
    assert_eq!(round_trip(address, b"a\nb\n").await, "Echo: a\nEcho: b\n");

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn shutdown_tears_down_open_connections() {
    let (address, shutdown, task) = start(Protocol::Http, true).await;

    let mut stream = TcpStream::connect(address).await.unwrap();
    stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let mut response = vec![0u8; HELLO_RESPONSE.len()];
    stream.read_exact(&mut response).await.unwrap();
    assert_eq!(String::from_utf8(response).unwrap(), HELLO_RESPONSE);

    // the connection now waits for the next request head
    shutdown.cancel();
    task.await.unwrap();

    let mut buf = [0u8; 16];
    let read = timeout(Duration::from_secs(5), stream.read(&mut buf)).await.unwrap();
    assert!(matches!(read, Ok(0) | Err(_)));
}
