//! The REST terminus: the indirection contract spoken over HTTP.
//!
//! # Design
//! Every operation runs the same pipeline: check the request, build
//! headers, resolve server and port, borrow a connection, execute one
//! request, classify the status. Only the last step differs per verb:
//!
//! | verb    | method | 2xx                       | 404     |
//! |---------|--------|---------------------------|---------|
//! | find    | GET    | decoded instance, renamed | `None`  |
//! | head    | HEAD   | `true`                    | `false` |
//! | search  | GET    | decoded instances         | `[]`    |
//! | destroy | DELETE | decoded instance          | `None`  |
//! | save    | PUT    | `()`, body ignored        | `()`    |
//!
//! Any other status becomes `TerminusError::Protocol`. The terminus keeps no
//! per-call state and takes no locks; server and port settings are read
//! again on every call.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::compression::{Compressor, FlateCompressor};
use crate::connection::ConnectionProvider;
use crate::error::{Result, TerminusError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::indirection::Indirection;
use crate::model::{Model, Payload};
use crate::request::Request;
use crate::settings::{Settings, TerminusConfig};
use crate::uri::{UriBuilder, Verb};

const ACCEPT: &str = "Accept";
const ACCEPT_ENCODING: &str = "Accept-Encoding";
const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_ENCODING: &str = "Content-Encoding";

/// A success body, decompressed, with its bare mime type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedContent {
    pub mime_type: String,
    pub body: Vec<u8>,
}

/// HTTP implementation of [`Indirection`] for model type `M`.
pub struct RestTerminus<M> {
    config: TerminusConfig,
    settings: Arc<dyn Settings>,
    connections: Arc<dyn ConnectionProvider>,
    uri: Arc<dyn UriBuilder>,
    compressor: Arc<dyn Compressor>,
    model: PhantomData<fn() -> M>,
}

impl<M: Model> RestTerminus<M> {
    pub fn new(
        config: TerminusConfig,
        settings: Arc<dyn Settings>,
        connections: Arc<dyn ConnectionProvider>,
        uri: Arc<dyn UriBuilder>,
    ) -> Self {
        Self {
            config,
            settings,
            connections,
            uri,
            compressor: Arc::new(FlateCompressor::new()),
            model: PhantomData,
        }
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn config(&self) -> &TerminusConfig {
        &self.config
    }

    /// Current value of the configured server setting.
    pub fn server(&self) -> Result<String> {
        self.config.resolve_server(self.settings.as_ref())
    }

    /// Current value of the configured port setting.
    pub fn port(&self) -> Result<u16> {
        self.config.resolve_port(self.settings.as_ref())
    }

    /// Executes `verb` for `request`. `Ok(None)` means the server said 404.
    fn send(&self, verb: Verb, request: &Request<M>) -> Result<Option<HttpResponse>> {
        if !verb.accepts_options() && !request.options().is_empty() {
            return Err(TerminusError::InvalidArgument(format!(
                "{} does not accept options",
                verb.method()
            )));
        }

        let mut headers = self.headers();
        let body = match verb {
            Verb::Save => {
                let instance = request.instance().ok_or_else(|| {
                    TerminusError::InvalidArgument("save requires an instance".to_string())
                })?;
                headers.push((CONTENT_TYPE.to_string(), instance.mime()));
                Some(instance.render().map_err(|e| TerminusError::Encode(Box::new(e)))?)
            }
            _ => None,
        };

        let server = match request.server() {
            Some(server) => server.to_string(),
            None => self.server()?,
        };
        let port = match request.port() {
            Some(port) => port,
            None => self.port()?,
        };

        let http_request = HttpRequest {
            method: verb.method(),
            path: self.uri.path(verb, &request.target()),
            headers,
            body,
        };
        debug!(
            method = %http_request.method,
            path = %http_request.path,
            server = %server,
            port,
            "issuing indirection request"
        );

        let method = http_request.method;
        let path = http_request.path.clone();
        let connection = self.connections.connection(&server, port)?;
        let response = connection.execute(http_request)?;
        self.classify(method, &path, response)
    }

    fn headers(&self) -> Vec<(String, String)> {
        vec![
            (ACCEPT.to_string(), M::supported_formats().join(", ")),
            (ACCEPT_ENCODING.to_string(), self.compressor.accept_encoding().to_string()),
        ]
    }

    fn classify(&self, method: HttpMethod, path: &str, response: HttpResponse) -> Result<Option<HttpResponse>> {
        if response.is_success() {
            return Ok(Some(response));
        }
        if response.status == 404 {
            debug!(method = %method, path = %path, "resource not found");
            return Ok(None);
        }
        let err = self.protocol_error(response);
        warn!(method = %method, path = %path, error = %err, "server rejected indirection request");
        Err(err)
    }

    fn protocol_error(&self, response: HttpResponse) -> TerminusError {
        // HEAD replies and bare error statuses can name an encoding with no body.
        if response.body.is_empty() {
            return TerminusError::Protocol {
                code: response.status,
                detail: response.reason,
            };
        }
        let encoding = response.header(CONTENT_ENCODING).map(str::to_string);
        let code = response.status;
        match self.compressor.decompress(encoding.as_deref(), response.body) {
            Ok(body) if !body.is_empty() => TerminusError::Protocol {
                code,
                detail: String::from_utf8_lossy(&body).into_owned(),
            },
            Ok(_) => TerminusError::Protocol {
                code,
                detail: response.reason,
            },
            Err(e) => TerminusError::Decompress(e),
        }
    }

    /// Content type and decompressed body of a success response.
    pub fn decoded_content(&self, response: HttpResponse) -> Result<DecodedContent> {
        let content_type = response.header(CONTENT_TYPE).ok_or_else(|| {
            TerminusError::Parse("No content type in http response; cannot parse".to_string())
        })?;
        let mime_type = bare_mime(content_type).to_string();
        let encoding = response.header(CONTENT_ENCODING).map(str::to_string);
        let body = self.compressor.decompress(encoding.as_deref(), response.body)?;
        Ok(DecodedContent { mime_type, body })
    }

    fn decode_one(&self, response: HttpResponse) -> Result<M> {
        let content = self.decoded_content(response)?;
        M::decode_one(&content.mime_type, &content.body).map_err(|e| TerminusError::Decode(Box::new(e)))
    }
}

/// `text/plain; charset=utf-8` becomes `text/plain`.
fn bare_mime(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or_default().trim()
}

impl<M: Model> Indirection<M> for RestTerminus<M> {
    fn find(&self, request: &Request<M>) -> Result<Option<M>> {
        let Some(response) = self.send(Verb::Find, request)? else {
            return Ok(None);
        };
        let mut instance = self.decode_one(response)?;
        if let Some(named) = instance.named_mut() {
            named.set_name(request.key());
        }
        Ok(Some(instance))
    }

    fn head(&self, request: &Request<M>) -> Result<bool> {
        Ok(self.send(Verb::Head, request)?.is_some())
    }

    fn search(&self, request: &Request<M>) -> Result<Vec<M>> {
        let Some(response) = self.send(Verb::Search, request)? else {
            return Ok(Vec::new());
        };
        let content = self.decoded_content(response)?;
        let instances = M::decode_many(&content.mime_type, &content.body)
            .map_err(|e| TerminusError::Decode(Box::new(e)))?;
        Ok(instances.unwrap_or_default())
    }

    fn destroy(&self, request: &Request<M>) -> Result<Option<M>> {
        match self.send(Verb::Destroy, request)? {
            Some(response) => self.decode_one(response).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, request: &Request<M>) -> Result<()> {
        self.send(Verb::Save, request)?;
        Ok(())
    }
}
