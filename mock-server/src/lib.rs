//! In-memory stand-in for a configuration master's REST endpoints.
//!
//! Serves `/{env}/{resource}/{key}` for GET, HEAD, PUT and DELETE, and
//! `/{env}/{resource}s/{pattern}` for searches. Documents are JSON and are
//! stored per environment, resource and key. Responses are gzipped when the
//! client's `Accept-Encoding` allows it.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use flate2::{write::GzEncoder, Compression};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Resources served by [`app`].
pub const DEFAULT_RESOURCES: &[&str] = &["node", "fact", "catalog", "report", "file_metadata"];

const JSON: &str = "application/json; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

type DocumentKey = (String, String, String);

#[derive(Clone)]
pub struct AppState {
    resources: Arc<HashSet<String>>,
    documents: Arc<RwLock<BTreeMap<DocumentKey, Value>>>,
}

enum Route {
    Single(String),
    Search(String),
}

impl AppState {
    fn route(&self, resource: &str) -> Option<Route> {
        if self.resources.contains(resource) {
            return Some(Route::Single(resource.to_string()));
        }
        resource
            .strip_suffix('s')
            .filter(|singular| self.resources.contains(*singular))
            .map(|singular| Route::Search(singular.to_string()))
    }
}

pub fn app() -> Router {
    app_with_resources(DEFAULT_RESOURCES)
}

pub fn app_with_resources(resources: &[&str]) -> Router {
    let state = AppState {
        resources: Arc::new(resources.iter().map(|r| r.to_string()).collect()),
        documents: Arc::new(RwLock::new(BTreeMap::new())),
    };
    Router::new()
        .route(
            "/{env}/{resource}/{key}",
            get(find_or_search).put(save).delete(destroy),
        )
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn find_or_search(
    State(state): State<AppState>,
    Path((env, resource, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let documents = state.documents.read().await;
    match state.route(&resource) {
        Some(Route::Single(resource)) => {
            debug!(%env, %resource, %key, "find");
            match documents.get(&(env, resource, key)) {
                Some(doc) => reply(&headers, StatusCode::OK, JSON, doc.to_string()),
                None => reply(&headers, StatusCode::NOT_FOUND, TEXT, "Not Found: no such document"),
            }
        }
        Some(Route::Search(resource)) => {
            debug!(%env, %resource, pattern = %key, "search");
            let matches: Vec<&Value> = documents
                .iter()
                .filter(|((e, r, k), _)| *e == env && *r == resource && (key == "*" || k.starts_with(&key)))
                .map(|(_, doc)| doc)
                .collect();
            reply(&headers, StatusCode::OK, JSON, Value::from_iter(matches.into_iter().cloned()).to_string())
        }
        None => unknown_resource(&headers, &resource),
    }
}

async fn save(
    State(state): State<AppState>,
    Path((env, resource, key)): Path<(String, String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(Route::Single(resource)) = state.route(&resource) else {
        return unknown_resource(&headers, &resource);
    };
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("application/json") {
        return reply(
            &headers,
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            TEXT,
            format!("Unsupported content type {content_type:?}"),
        );
    }
    let doc: Value = match serde_json::from_slice(&body) {
        Ok(doc) => doc,
        Err(e) => return reply(&headers, StatusCode::BAD_REQUEST, TEXT, format!("Invalid document: {e}")),
    };
    debug!(%env, %resource, %key, "save");
    state.documents.write().await.insert((env, resource, key), doc);
    reply(&headers, StatusCode::OK, TEXT, "")
}

async fn destroy(
    State(state): State<AppState>,
    Path((env, resource, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let Some(Route::Single(resource)) = state.route(&resource) else {
        return unknown_resource(&headers, &resource);
    };
    debug!(%env, %resource, %key, "destroy");
    match state.documents.write().await.remove(&(env, resource, key)) {
        Some(doc) => reply(&headers, StatusCode::OK, JSON, doc.to_string()),
        None => reply(&headers, StatusCode::NOT_FOUND, TEXT, ""),
    }
}

fn unknown_resource(headers: &HeaderMap, resource: &str) -> Response {
    reply(
        headers,
        StatusCode::BAD_REQUEST,
        TEXT,
        format!("Could not find indirection '{resource}'"),
    )
}

/// Builds a response, gzipping non-empty bodies when the client accepts it.
fn reply(request_headers: &HeaderMap, status: StatusCode, content_type: &'static str, body: impl Into<Vec<u8>>) -> Response {
    let body = body.into();
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    if !body.is_empty() && accepts_gzip(request_headers) {
        if let Ok(compressed) = gzip(&body) {
            headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            return (status, headers, compressed).into_response();
        }
    }
    (status, headers, body).into_response()
}

fn accepts_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').any(|coding| coding.trim().starts_with("gzip")))
        .unwrap_or(false)
}

fn gzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState {
            resources: Arc::new(["node".to_string()].into_iter().collect()),
            documents: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    #[test]
    fn routes_singular_and_plural_resources() {
        let state = state();
        assert!(matches!(state.route("node"), Some(Route::Single(r)) if r == "node"));
        assert!(matches!(state.route("nodes"), Some(Route::Search(r)) if r == "node"));
        assert!(state.route("catalog").is_none());
        assert!(state.route("s").is_none());
    }

    #[test]
    fn gzip_is_only_used_when_accepted() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_gzip(&headers));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        assert!(!accepts_gzip(&headers));
        headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static("deflate;q=1.0, gzip;q=1.0, identity"),
        );
        assert!(accepts_gzip(&headers));
    }

    #[test]
    fn empty_bodies_are_never_compressed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        let response = reply(&headers, StatusCode::OK, TEXT, "");
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());

        let response = reply(&headers, StatusCode::OK, TEXT, "hello");
        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    }
}
