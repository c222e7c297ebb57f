//! HTTP Collector Transport for SoilCast
//!
//! ## Overview
//!
//! Request/response delivery: one POST per reading to a fixed endpoint, the
//! body being the encoded reading with its device identity. There is no
//! session to open or keep alive, so the supervisor treats `LinkUp` as ready.
//!
//! ## Delivery Semantics
//!
//! - **Any status is a delivery**: the collector answered, so the reading
//!   reached it. The status code is returned and the core logs non-2xx
//!   codes as warnings.
//! - **Transport errors are failures**: refused connections, timeouts and
//!   DNS errors become [`HttpError::Request`]; the reading is dropped.
//! - **No retries and no pooling**: each reading opens a fresh connection
//!   and is sent at most once.
//!
//! ## Example Usage
//!
//! ```no_run
//! use soilcast_connectors::http::{HttpConfig, HttpTransport};
//! use soilcast_core::Transport;
//!
//! let config = HttpConfig::new("http://192.168.0.102:3000/moisture")
//!     .timeout_secs(5)
//!     .header("X-Site", "greenhouse-2");
//!
//! let mut http = HttpTransport::new(config)?;
//! let status = http.deliver(
//!     "http://192.168.0.102:3000/moisture",
//!     br#"{"device_id":"esp32_1","moisture_value":812}"#,
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use soilcast_core::config::NodeConfig;
use soilcast_core::constants::network::HTTP_CONTENT_TYPE;
use soilcast_core::{Transport, TransportMode};
use thiserror::Error;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// HTTP configuration
#[derive(Clone)]
pub struct HttpConfig {
    /// Collector endpoint
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Declared body type
    pub content_type: String,
    /// Custom headers
    pub headers: Vec<(String, String)>,
    /// User agent string
    pub user_agent: String,
}

/// Authentication methods
#[derive(Clone)]
pub enum AuthMethod {
    /// No authentication
    None,
    /// Bearer token
    Bearer(String),
    /// API key in header
    ApiKey { header: String, value: String },
}

impl HttpConfig {
    /// Create new configuration for an endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(10),
            auth: AuthMethod::None,
            content_type: HTTP_CONTENT_TYPE.to_owned(),
            headers: Vec::new(),
            user_agent: format!("SoilCast/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Endpoint and content type from the node configuration
    pub fn from_node(node: &NodeConfig) -> Self {
        let mut config = Self::new(node.http_endpoint);
        config.content_type = node.content_type.to_owned();
        config
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    /// Set API key authentication
    pub fn api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = AuthMethod::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Request/response transport using the lightweight ureq client
pub struct HttpTransport {
    config: HttpConfig,
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Create new HTTP transport
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(HttpError::Config("Endpoint must start with http:// or https://".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .max_idle_connections(0)
            .build();

        Ok(Self { config, agent })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Build request with authentication and headers
    fn build_request(&self, target: &str) -> ureq::Request {
        let mut request = self.agent.post(target);

        match &self.config.auth {
            AuthMethod::None => {}
            AuthMethod::Bearer(token) => {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
            AuthMethod::ApiKey { header, value } => {
                request = request.set(header, value);
            }
        }

        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }

        request.set("Content-Type", &self.config.content_type)
    }
}

impl Transport for HttpTransport {
    type Error = HttpError;

    fn mode(&self) -> TransportMode {
        TransportMode::RequestResponse
    }

    fn deliver(&mut self, target: &str, payload: &[u8]) -> Result<u16, Self::Error> {
        match self.build_request(target).send_bytes(payload) {
            Ok(response) => Ok(response.status()),
            // The collector answered; the status is reported, not retried
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(e)) => Err(HttpError::Request(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one request with `status`, handing back what was received
    fn collector(status: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/moisture", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();

            let mut stream = stream;
            write!(stream, "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status)
                .unwrap();
            head + &String::from_utf8(body).unwrap()
        });

        (url, handle)
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::new("https://collector.example.com/moisture")
            .bearer_token("test-token")
            .timeout_secs(60)
            .header("X-Custom", "value");

        assert_eq!(config.endpoint, "https://collector.example.com/moisture");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.content_type, "application/json");
        assert!(config.headers.iter().any(|(name, _)| name == "X-Custom"));

        match config.auth {
            AuthMethod::Bearer(token) => assert_eq!(token, "test-token"),
            _ => panic!("Wrong auth method"),
        }
    }

    #[test]
    fn test_url_validation() {
        let result = HttpTransport::new(HttpConfig::new("not-a-url"));
        assert!(result.is_err());

        let result = HttpTransport::new(HttpConfig::new("https://valid.url/moisture"));
        assert!(result.is_ok());
    }

    #[test]
    fn posts_json_body_and_reports_status() {
        let (url, server) = collector("201 Created");
        let mut http = HttpTransport::new(HttpConfig::new(url.clone())).unwrap();

        let body = br#"{"device_id":"esp32_1","moisture_value":812}"#;
        assert_eq!(http.deliver(&url, body).unwrap(), 201);

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /moisture HTTP/1.1\r\n"));
        assert!(request.to_ascii_lowercase().contains("content-type: application/json\r\n"));
        assert!(request.ends_with(r#"{"device_id":"esp32_1","moisture_value":812}"#));
    }

    #[test]
    fn error_status_is_still_a_delivery() {
        let (url, server) = collector("500 Internal Server Error");
        let mut http = HttpTransport::new(HttpConfig::new(url.clone())).unwrap();

        assert_eq!(http.deliver(&url, b"{}").unwrap(), 500);
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_failure() {
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let url = format!("http://{}/moisture", addr);
        let mut http = HttpTransport::new(HttpConfig::new(url.clone()).timeout_secs(1)).unwrap();

        assert!(matches!(http.deliver(&url, b"{}"), Err(HttpError::Request(_))));
    }
}
