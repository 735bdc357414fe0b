//! Verify response classification against JSON vectors in `test-vectors/`.
//!
//! Each vector names an operation, a simulated response and the expected
//! outcome. A canned connection provider replays the response, so the
//! vectors exercise the terminus exactly as a real server would.

use std::io::Write;
use std::sync::Arc;

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use serde_json::Value;
use terminus_core::{
    Connection, ConnectionProvider, HttpRequest, HttpResponse, Indirection, MapSettings, Model, Named, Payload,
    Request, RestPath, RestTerminus, TerminusConfig,
};

#[derive(Debug, thiserror::Error)]
#[error("cannot decode")]
struct LineError;

/// One instance per line of body text.
#[derive(Debug, Clone, PartialEq)]
struct Line {
    key: String,
    mime: String,
    data: String,
}

impl Payload for Line {
    type Error = LineError;

    fn render(&self) -> Result<Vec<u8>, LineError> {
        Ok(self.data.clone().into_bytes())
    }

    fn mime(&self) -> String {
        "text/plain".to_string()
    }
}

impl Named for Line {
    fn set_name(&mut self, name: &str) {
        self.key = name.to_string();
    }
}

impl Model for Line {
    fn supported_formats() -> Vec<String> {
        vec!["text/plain".to_string()]
    }

    fn decode_one(mime: &str, body: &[u8]) -> Result<Self, LineError> {
        Ok(Self {
            key: String::new(),
            mime: mime.to_string(),
            data: String::from_utf8(body.to_vec()).map_err(|_| LineError)?,
        })
    }

    fn decode_many(mime: &str, body: &[u8]) -> Result<Option<Vec<Self>>, LineError> {
        if body.is_empty() {
            return Ok(None);
        }
        let text = String::from_utf8(body.to_vec()).map_err(|_| LineError)?;
        text.lines().map(|l| Self::decode_one(mime, l.as_bytes())).collect::<Result<Vec<_>, _>>().map(Some)
    }

    fn named_mut(&mut self) -> Option<&mut dyn Named> {
        Some(self)
    }
}

/// Replays one canned response for every request.
struct Canned(HttpResponse);

impl ConnectionProvider for Canned {
    fn connection(&self, _server: &str, _port: u16) -> terminus_core::Result<Arc<dyn Connection>> {
        Ok(Arc::new(Canned(self.0.clone())))
    }
}

impl Connection for Canned {
    fn execute(&self, _request: HttpRequest) -> terminus_core::Result<HttpResponse> {
        Ok(self.0.clone())
    }
}

fn compress(scheme: Option<&str>, data: &[u8]) -> Vec<u8> {
    match scheme {
        Some("gzip") => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        Some("deflate") => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data).unwrap();
            encoder.finish().unwrap()
        }
        None => data.to_vec(),
        Some(other) => panic!("unknown compression: {other}"),
    }
}

fn simulated_response(sim: &Value) -> HttpResponse {
    let headers = sim["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let pair = h.as_array().unwrap();
            (pair[0].as_str().unwrap().to_string(), pair[1].as_str().unwrap().to_string())
        })
        .collect();
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        reason: sim["reason"].as_str().unwrap().to_string(),
        headers,
        body: compress(sim["compress"].as_str(), sim["body"].as_str().unwrap().as_bytes()),
    }
}

fn terminus(response: HttpResponse) -> RestTerminus<Line> {
    RestTerminus::new(
        TerminusConfig::default(),
        Arc::new(MapSettings::from_pairs([("server", "puppet"), ("masterport", "8140")])),
        Arc::new(Canned(response)),
        Arc::new(RestPath::new("line")),
    )
}

/// Run one case and render its outcome in the vector's vocabulary.
fn outcome(operation: &str, key: &str, t: &RestTerminus<Line>) -> Value {
    let request = Request::new(key);
    let result = match operation {
        "find" => t.find(&request).map(|found| match found {
            Some(line) => serde_json::json!({
                "kind": "instance", "key": line.key, "data": line.data, "mime": line.mime
            }),
            None => serde_json::json!({ "kind": "absent" }),
        }),
        "destroy" => t.destroy(&request).map(|found| match found {
            Some(line) => serde_json::json!({
                "kind": "instance", "key": line.key, "data": line.data, "mime": line.mime
            }),
            None => serde_json::json!({ "kind": "absent" }),
        }),
        "head" => t.head(&request).map(|present| {
            let kind = if present { "true" } else { "false" };
            serde_json::json!({ "kind": kind })
        }),
        "search" => t.search(&request).map(|lines| {
            let data: Vec<String> = lines.into_iter().map(|l| l.data).collect();
            serde_json::json!({ "kind": "instances", "data": data })
        }),
        "save" => {
            let request = request.with_instance(Line {
                key: key.to_string(),
                mime: "text/plain".to_string(),
                data: "payload".to_string(),
            });
            t.save(&request).map(|()| serde_json::json!({ "kind": "unit" }))
        }
        other => panic!("unknown operation: {other}"),
    };
    result.unwrap_or_else(|e| serde_json::json!({ "kind": "error", "message": e.to_string() }))
}

#[test]
fn classification_test_vectors() {
    let raw = include_str!("../../test-vectors/classification.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let operation = case["operation"].as_str().unwrap();
        let key = case["key"].as_str().unwrap();

        let t = terminus(simulated_response(&case["response"]));
        assert_eq!(outcome(operation, key, &t), case["expected"], "{name}");
    }
}
