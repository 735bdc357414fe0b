//! Path construction for each indirection verb.
//!
//! # Design
//! The terminus asks a `UriBuilder` for the path of every call instead of
//! formatting it itself, so a deployment with a different URL layout only
//! swaps the builder. `RestPath` is the standard layout:
//! `/<env>/<resource>/<key>` for single-resource verbs and
//! `/<env>/<resource>s/<key>` for `search`.

use crate::http::HttpMethod;
use crate::request::Target;

/// An indirection operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Find,
    Head,
    Search,
    Destroy,
    Save,
}

impl Verb {
    pub fn method(&self) -> HttpMethod {
        match self {
            Verb::Find | Verb::Search => HttpMethod::Get,
            Verb::Head => HttpMethod::Head,
            Verb::Destroy => HttpMethod::Delete,
            Verb::Save => HttpMethod::Put,
        }
    }

    /// Whether the path names the collection rather than one resource.
    pub fn is_plural(&self) -> bool {
        matches!(self, Verb::Search)
    }

    /// Whether query options can travel with this verb.
    pub fn accepts_options(&self) -> bool {
        !matches!(self, Verb::Destroy | Verb::Save)
    }
}

/// Builds the request path for a verb and target.
pub trait UriBuilder: Send + Sync {
    fn path(&self, verb: Verb, target: &Target<'_>) -> String;
}

/// The standard `/<env>/<resource>[s]/<key>` layout.
#[derive(Debug, Clone)]
pub struct RestPath {
    resource: String,
    default_environment: String,
}

impl RestPath {
    pub const DEFAULT_ENVIRONMENT: &'static str = "production";

    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            default_environment: Self::DEFAULT_ENVIRONMENT.to_string(),
        }
    }

    /// Environment used when the request does not name one.
    pub fn with_default_environment(mut self, environment: impl Into<String>) -> Self {
        self.default_environment = environment.into();
        self
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl UriBuilder for RestPath {
    fn path(&self, verb: Verb, target: &Target<'_>) -> String {
        let environment = target.environment.unwrap_or(&self.default_environment);
        let plural = if verb.is_plural() { "s" } else { "" };
        let mut path = format!(
            "/{}/{}{plural}/{}",
            urlencoding::encode(environment),
            self.resource,
            urlencoding::encode(target.key)
        );
        if verb.accepts_options() && !target.options.is_empty() {
            path.push('?');
            path.push_str(&query_string(target));
        }
        path
    }
}

fn query_string(target: &Target<'_>) -> String {
    target
        .options
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
