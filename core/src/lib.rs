//! REST terminus for the indirection contract.
//!
//! # Overview
//! Application code finds, probes, searches, destroys and saves named
//! resources through [`Indirection`] without caring where they live.
//! [`RestTerminus`] is the implementation that talks to a remote server
//! over HTTP: it negotiates format and compression, maps each verb to a
//! method and path, classifies the response status and hands the body to
//! the resource's [`Model`] for decoding.
//!
//! # Design
//! - The terminus is stateless per call and safe to share between threads.
//! - Its collaborators are injected: a [`ConnectionProvider`] for transport,
//!   a [`UriBuilder`] for paths, a [`Compressor`] for content encoding, and
//!   a [`Settings`] source for the server and port.
//! - A 404 is a typed absent result, never an error; every other failure is
//!   a [`TerminusError`] and is not retried.

pub mod compression;
pub mod connection;
pub mod error;
pub mod http;
pub mod indirection;
pub mod model;
pub mod request;
pub mod settings;
pub mod terminus;
pub mod uri;

pub use compression::{Compressor, FlateCompressor};
pub use connection::{Connection, ConnectionProvider, UreqConnection, UreqProvider};
pub use error::{BoxError, Result, TerminusError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use indirection::Indirection;
pub use model::{Model, Named, Payload};
pub use request::{Request, Target};
pub use settings::{MapSettings, Settings, TerminusConfig};
pub use terminus::{DecodedContent, RestTerminus};
pub use uri::{RestPath, UriBuilder, Verb};
