//! Connections to a server, and the pool that hands them out.
//!
//! # Design
//! The terminus never owns a connection. For every call it asks the
//! `ConnectionProvider` for one bound to `(server, port)`, executes a single
//! `HttpRequest` on it, and drops its handle. Reuse, pooling and timeouts
//! are the provider's business.
//!
//! `UreqProvider` is the stock provider. Its agent reports every status as
//! data and leaves `Content-Encoding` alone, because status classification
//! and decompression belong to the terminus.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{Result, TerminusError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// A live, reusable channel to one server.
pub trait Connection: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Hands out connections for a server and port.
pub trait ConnectionProvider: Send + Sync {
    fn connection(&self, server: &str, port: u16) -> Result<Arc<dyn Connection>>;
}

/// Connection provider backed by a shared, pooling `ureq::Agent`.
pub struct UreqProvider {
    agent: ureq::Agent,
    scheme: String,
    body_limit: u64,
    connections: Mutex<HashMap<(String, u16), Arc<UreqConnection>>>,
}

impl UreqProvider {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Provider whose requests give up after `timeout` end to end.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            agent,
            scheme: "http".to_string(),
            body_limit: u64::MAX,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// URL scheme used to reach servers; `http` unless changed.
    ///
    /// `https` only connects when `ureq` is built with one of its TLS
    /// features (`rustls` or `native-tls`). This crate turns `ureq`'s
    /// default features off, so enable one in the final binary first.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Largest response body read, in bytes; unlimited unless changed.
    /// Longer bodies fail with `TerminusError::Transport`.
    pub fn with_body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }
}

impl Default for UreqProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProvider for UreqProvider {
    fn connection(&self, server: &str, port: u16) -> Result<Arc<dyn Connection>> {
        let mut connections = self.connections.lock();
        let connection = connections
            .entry((server.to_string(), port))
            .or_insert_with(|| {
                Arc::new(UreqConnection {
                    agent: self.agent.clone(),
                    base_url: format!("{}://{server}:{port}", self.scheme),
                    body_limit: self.body_limit,
                })
            })
            .clone();
        Ok(connection)
    }
}

/// A `ureq` connection to one server. Cloning the agent shares its pool.
pub struct UreqConnection {
    agent: ureq::Agent,
    base_url: String,
    body_limit: u64,
}

impl UreqConnection {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Connection for UreqConnection {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        trace!(method = %request.method, url = %url, "sending request");

        let result = match request.method {
            HttpMethod::Get => with_headers(self.agent.get(&url), &request.headers).call(),
            HttpMethod::Head => with_headers(self.agent.head(&url), &request.headers).call(),
            HttpMethod::Delete => with_headers(self.agent.delete(&url), &request.headers).call(),
            HttpMethod::Put => {
                let builder = with_headers(self.agent.put(&url), &request.headers);
                match request.body.as_deref() {
                    Some(body) => builder.send(body),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| TerminusError::Transport(format!("{} {url}: {e}", request.method)))?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = if request.method == HttpMethod::Head {
            Vec::new()
        } else {
            response
                .body_mut()
                .with_config()
                .limit(self.body_limit)
                .read_to_vec()
                .map_err(|e| TerminusError::Transport(format!("reading body of {url}: {e}")))?
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_are_reused_per_server_and_port() {
        let provider = UreqProvider::new();
        let a = provider.connection("puppet", 8140).unwrap();
        let b = provider.connection("puppet", 8140).unwrap();
        let c = provider.connection("puppet", 8141).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn scheme_is_part_of_the_base_url() {
        let provider = UreqProvider::new().with_scheme("https");
        provider.connection("ca.example.com", 8141).unwrap();
        let connections = provider.connections.lock();
        let connection = &connections[&("ca.example.com".to_string(), 8141)];
        assert_eq!(connection.base_url(), "https://ca.example.com:8141");
    }

    #[test]
    fn body_limit_is_handed_to_every_connection() {
        let provider = UreqProvider::new();
        provider.connection("puppet", 8140).unwrap();
        assert_eq!(provider.connections.lock()[&("puppet".to_string(), 8140)].body_limit, u64::MAX);

        let limited = UreqProvider::new().with_body_limit(1024);
        limited.connection("puppet", 8140).unwrap();
        assert_eq!(limited.connections.lock()[&("puppet".to_string(), 8140)].body_limit, 1024);
    }
}
