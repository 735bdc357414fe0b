//! The per-call request envelope.
//!
//! # Design
//! A `Request` is assembled with `with_*` builders and read through
//! accessors only, so once it reaches the terminus it cannot change.

use std::collections::BTreeMap;

/// One indirection call: which resource, what to write, and where.
///
/// `I` is the model type; reads leave `instance` empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Request<I> {
    key: String,
    instance: Option<I>,
    options: BTreeMap<String, String>,
    environment: Option<String>,
    server: Option<String>,
    port: Option<u16>,
}

/// The parts of a request a `UriBuilder` needs.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub key: &'a str,
    pub environment: Option<&'a str>,
    pub options: &'a BTreeMap<String, String>,
}

impl<I> Request<I> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            instance: None,
            options: BTreeMap::new(),
            environment: None,
            server: None,
            port: None,
        }
    }

    pub fn with_instance(mut self, instance: I) -> Self {
        self.instance = Some(instance);
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Target a specific server instead of the configured one.
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Target a specific port instead of the configured one.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn instance(&self) -> Option<&I> {
        self.instance.as_ref()
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn server(&self) -> Option<&str> {
        self.server.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn target(&self) -> Target<'_> {
        Target {
            key: &self.key,
            environment: self.environment.as_deref(),
            options: &self.options,
        }
    }
}
