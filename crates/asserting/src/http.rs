//! HTTP helpers for web API test cases
//!
//! [`WebTestCase`] starts an ephemeral server on `127.0.0.1:0` around a
//! [`Handler`], issues requests against it, and keeps the latest response for
//! later assertions.

use crate::assert::{TestCase, STATUS_OK};
use crate::failure::{Failure, Outcome};
use asserting_config::Config;
use std::collections::HashMap;
use std::io::Read;
use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Default client timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP helper errors
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to start test server: {0}")]
    Bind(String),

    #[error("failed to create client: {0}")]
    Client(reqwest::Error),

    #[error("{method} {url}: {kind} error: {source}")]
    Request {
        method: &'static str,
        url: String,
        kind: &'static str,
        source: reqwest::Error,
    },
}

impl HttpError {
    fn request(method: &'static str, url: &str, source: reqwest::Error) -> Self {
        let kind = if source.is_timeout() {
            "timeout"
        } else if source.is_connect() {
            "connection"
        } else if source.is_body() || source.is_decode() {
            "body"
        } else {
            "network"
        };
        HttpError::Request {
            method,
            url: url.to_string(),
            kind,
            source,
        }
    }
}

// ============================================================================
// Server side
// ============================================================================

/// A request as seen by a test handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRequest {
    /// HTTP method (e.g., "GET")
    pub method: String,
    /// Path and query string
    pub url: String,
    /// Request headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Vec<u8>,
}

impl TestRequest {
    /// Get a header value, ignoring name case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Path without the query string
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    /// Body decoded as UTF-8, lossily
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A response produced by a test handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl TestResponse {
    /// Empty response with the given status
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Empty 200 response
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Empty 201 response
    pub fn created() -> Self {
        Self::new(201)
    }

    /// Empty 404 response
    pub fn not_found() -> Self {
        Self::new(404)
    }

    /// Set body (returns new response)
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a JSON body and content type (returns new response)
    pub fn with_json(self, body: impl Into<Vec<u8>>) -> Self {
        self.with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Add header (returns new response)
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Get status code
    pub fn status(&self) -> u16 {
        self.status
    }
}

/// Serves requests made against a [`WebTestCase`]
pub trait Handler: Send + Sync + 'static {
    /// Produce the response for one request
    fn handle(&self, request: &TestRequest) -> TestResponse;
}

impl<F> Handler for F
where
    F: Fn(&TestRequest) -> TestResponse + Send + Sync + 'static,
{
    fn handle(&self, request: &TestRequest) -> TestResponse {
        self(request)
    }
}

/// Ephemeral HTTP server bound to a free local port
///
/// The server thread stops when this value is dropped.
pub struct TestServer {
    server: Arc<tiny_http::Server>,
    addr: SocketAddr,
    worker: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Bind `127.0.0.1:0` and serve `handler` on a background thread
    pub fn start<H: Handler>(handler: H) -> Result<Self, HttpError> {
        let server =
            tiny_http::Server::http("127.0.0.1:0").map_err(|e| HttpError::Bind(e.to_string()))?;
        let addr = server
            .server_addr()
            .to_ip()
            .ok_or_else(|| HttpError::Bind("server is not listening on an IP address".to_string()))?;

        let server = Arc::new(server);
        let incoming = Arc::clone(&server);
        let worker = thread::spawn(move || {
            for mut request in incoming.incoming_requests() {
                let captured = capture_request(&mut request);
                let response = handler.handle(&captured);
                tracing::trace!(
                    method = %captured.method,
                    url = %captured.url,
                    status = response.status,
                    "test server handled request"
                );
                if let Err(e) = request.respond(into_tiny_response(response)) {
                    tracing::warn!(error = %e, "test server failed to send response");
                }
            }
        });

        tracing::debug!(%addr, "test server started");
        Ok(Self {
            server,
            addr,
            worker: Some(worker),
        })
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        tracing::debug!(addr = %self.addr, "test server stopped");
    }
}

fn capture_request(request: &mut tiny_http::Request) -> TestRequest {
    let headers = request
        .headers()
        .iter()
        .map(|h| (h.field.to_string(), h.value.to_string()))
        .collect();

    let mut body = Vec::new();
    if let Err(e) = request.as_reader().read_to_end(&mut body) {
        tracing::warn!(error = %e, "test server failed to read request body");
    }

    TestRequest {
        method: request.method().to_string(),
        url: request.url().to_string(),
        headers,
        body,
    }
}

fn into_tiny_response(response: TestResponse) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut out = tiny_http::Response::from_data(response.body).with_status_code(response.status);
    for (key, value) in &response.headers {
        match tiny_http::Header::from_bytes(key.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => tracing::warn!(header = %key, "dropping invalid response header"),
        }
    }
    out
}

// ============================================================================
// Client side
// ============================================================================

/// Response captured from the latest request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedResponse {
    /// Status code
    pub status: u16,
    /// Response headers (lowercase names)
    pub headers: HashMap<String, String>,
    /// Raw response body
    pub body: Vec<u8>,
}

/// A test case for web APIs: assertions plus an ephemeral server and client
///
/// Dereferences to [`TestCase`], so every basic predicate is available.
pub struct WebTestCase {
    case: TestCase,
    server: Option<TestServer>,
    client: reqwest::blocking::Client,
    response: Option<CapturedResponse>,
}

impl WebTestCase {
    /// Start a test server around `handler`
    pub fn new<H: Handler>(handler: H) -> Result<Self, HttpError> {
        Self::build(TestCase::new(), Some(TestServer::start(handler)?), DEFAULT_TIMEOUT_SECS)
    }

    /// Start a test server around `handler`, using asserting.toml settings
    pub fn from_config<H: Handler>(handler: H, config: &Config) -> Result<Self, HttpError> {
        Self::build(
            TestCase::from_config(config),
            Some(TestServer::start(handler)?),
            config.http_timeout_secs(),
        )
    }

    /// A web test case with no server; every request fails
    pub fn without_server() -> Result<Self, HttpError> {
        Self::build(TestCase::new(), None, DEFAULT_TIMEOUT_SECS)
    }

    fn build(case: TestCase, server: Option<TestServer>, timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .no_proxy()
            .build()
            .map_err(HttpError::Client)?;

        Ok(Self {
            case,
            server,
            client,
            response: None,
        })
    }

    /// Base URL of the test server, if one is running
    pub fn server_url(&self) -> Option<String> {
        self.server.as_ref().map(TestServer::url)
    }

    /// The latest captured response
    pub fn response(&self) -> Option<&CapturedResponse> {
        self.response.as_ref()
    }

    /// Body of the latest response; empty when there is none
    pub fn response_body(&self) -> &[u8] {
        self.response.as_ref().map(|r| r.body.as_slice()).unwrap_or(&[])
    }

    /// Status of the latest response
    pub fn response_status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }

    /// Header of the latest response, ignoring name case
    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response
            .as_ref()
            .and_then(|r| r.headers.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Issue a GET request and keep the response
    #[track_caller]
    pub fn get(&mut self, path: &str) -> Outcome {
        self.send("GET", path, None)
    }

    /// Issue a POST request and keep the response
    #[track_caller]
    pub fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Outcome {
        self.send("POST", path, Some((content_type, body)))
    }

    /// Issue a PUT request and keep the response
    #[track_caller]
    pub fn put(&mut self, path: &str, content_type: &str, body: &[u8]) -> Outcome {
        self.send("PUT", path, Some((content_type, body)))
    }

    #[track_caller]
    fn send(&mut self, method: &'static str, path: &str, body: Option<(&str, &[u8])>) -> Outcome {
        let base = match &self.server {
            Some(server) => server.url(),
            None => return Err(self.case.fail("Uninitialized test server")),
        };
        let url = format!("{}{}", base, path);
        self.response = None;

        match self.execute(method, &url, body) {
            Ok(response) => {
                self.response = Some(response);
                Ok(())
            }
            Err(e) => Err(self.case.fail(format!("Request error: {}", e))),
        }
    }

    fn execute(
        &self,
        method: &'static str,
        url: &str,
        body: Option<(&str, &[u8])>,
    ) -> Result<CapturedResponse, HttpError> {
        let mut builder = match method {
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            _ => self.client.get(url),
        };
        if let Some((content_type, bytes)) = body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, content_type)
                .body(bytes.to_vec());
        }

        let response = builder
            .send()
            .map_err(|e| HttpError::request(method, url, e))?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.as_str().to_string(), value_str.to_string());
            }
        }
        let body = response
            .bytes()
            .map_err(|e| HttpError::request(method, url, e))?
            .to_vec();

        tracing::debug!(method, url, status, "captured response");
        Ok(CapturedResponse {
            status,
            headers,
            body,
        })
    }

    // ========================================================================
    // Response assertions
    // ========================================================================

    /// Tests that the latest response has the HTTP OK code
    #[track_caller]
    pub fn assert_response_ok(&self) -> Outcome {
        self.assert_response_status(STATUS_OK)
    }

    /// Tests the latest response's status code
    #[track_caller]
    pub fn assert_response_status(&self, code: u16) -> Outcome {
        match &self.response {
            None => Err(self.case.fail("Response is nil")),
            Some(response) if response.status != code => Err(self
                .case
                .fail(format!("Expected {}, got {}", code, response.status))),
            Some(_) => Ok(()),
        }
    }

    /// Failure for a missing response, attributed to the caller
    #[track_caller]
    pub(crate) fn missing_response(&self) -> Failure {
        self.case.fail("Response is nil")
    }
}

impl Deref for WebTestCase {
    type Target = TestCase;

    fn deref(&self) -> &TestCase {
        &self.case
    }
}
