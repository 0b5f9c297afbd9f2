//! Request handlers.
//!
//! A [`Handler`] turns a request head and its body into a response. Handlers
//! are shared by every connection of a server, hence `Send + Sync`.

use std::error::Error;
use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::protocol::body::BodyReader;
use crate::protocol::{HttpRequest, HttpResponse};

/// The error a handler may fail with; the pipeline answers it with a 500.
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait Handler: Send + Sync {
    /// Handles one request.
    ///
    /// `body` only lives for this call. Bytes left unread are skipped by the
    /// pipeline before the response is written.
    async fn call(&self, request: HttpRequest, body: &mut BodyReader<'_>) -> Result<HttpResponse, HandlerError>;
}

/// A handler built from an async function over the request and its collected body.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, Fut, Err> Handler for HandlerFn<F>
where
    F: Fn(HttpRequest, Bytes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, Err>> + Send + 'static,
    Err: Into<HandlerError> + 'static,
{
    async fn call(&self, request: HttpRequest, body: &mut BodyReader<'_>) -> Result<HttpResponse, HandlerError> {
        let body = body.collect().await?;
        (self.f)(request, body).await.map_err(Into::into)
    }
}

/// Wraps `f` into a [`Handler`]; the request body is collected before `f` runs.
pub fn make_handler<F, Fut, Err>(f: F) -> HandlerFn<F>
where
    F: Fn(HttpRequest, Bytes) -> Fut,
    Fut: Future<Output = Result<HttpResponse, Err>>,
    Err: Into<HandlerError>,
{
    HandlerFn { f }
}

const SERVER_HEADER: &[u8] = b"Server: micro-conn";
const HELLO: &[u8] = b"hello world.\n";

/// The handler served by the binary.
///
/// `/echo` answers with the request body, every other target with `hello world.`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoHandler;

impl DemoHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for DemoHandler {
    async fn call(&self, request: HttpRequest, body: &mut BodyReader<'_>) -> Result<HttpResponse, HandlerError> {
        let response = if &request.target()[..] == b"/echo" {
            let body = body.collect().await?;
            info!(size = body.len(), "echo request body");
            HttpResponse::ok(body)
        } else {
            HttpResponse::ok(Bytes::from_static(HELLO))
        };

        Ok(response.with_header(Bytes::from_static(SERVER_HEADER)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::parse_request;

    fn request(head: &'static str) -> HttpRequest {
        parse_request(&Bytes::from_static(head.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn demo_echoes_body() {
        let mut body = BodyReader::from_memory("ping");
        let mut response = DemoHandler::new().call(request("POST /echo HTTP/1.1\r\n\r\n"), &mut body).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.head().headers(), &[Bytes::from_static(SERVER_HEADER)]);
        assert_eq!(&response.body_mut().collect().await.unwrap()[..], b"ping");
    }

    #[tokio::test]
    async fn demo_says_hello() {
        let mut body = BodyReader::from_memory("ignored");
        let mut response = DemoHandler::new().call(request("GET /index.html HTTP/1.1\r\n\r\n"), &mut body).await.unwrap();

        assert_eq!(response.body_mut().declared_length(), Some(13));
        assert_eq!(&response.body_mut().collect().await.unwrap()[..], HELLO);
        // the demo handler leaves the request body alone
        assert_eq!(&body.read().await.unwrap()[..], b"ignored");
    }

    #[tokio::test]
    async fn handler_fn_gets_collected_body() {
        let handler = make_handler(|request: HttpRequest, body: Bytes| async move {
            let reply = format!("{} {}", request.method(), body.len());
            Ok::<_, HandlerError>(HttpResponse::ok(reply))
        });

        let mut body = BodyReader::from_memory("abc");
        let mut response = handler.call(request("PUT /x HTTP/1.1\r\n\r\n"), &mut body).await.unwrap();
        assert_eq!(&response.body_mut().collect().await.unwrap()[..], b"PUT 3");
    }
}
