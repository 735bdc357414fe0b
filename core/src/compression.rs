//! Content-encoding negotiation and response decompression.
//!
//! # Design
//! A `Compressor` does two things: it names the encodings the client will
//! accept, and it undoes whichever one the server picked. The terminus calls
//! it on success bodies before decoding and on error bodies before they go
//! into the error message.

use std::io::{self, Read};

use flate2::read::{GzDecoder, ZlibDecoder};

/// Declares and reverses response content encodings.
pub trait Compressor: Send + Sync {
    /// Value of the `Accept-Encoding` request header.
    fn accept_encoding(&self) -> &str;

    /// Decode `body` according to the response's `Content-Encoding`.
    /// `None`, `identity`, unrecognized encodings and empty bodies pass
    /// through unchanged.
    fn decompress(&self, encoding: Option<&str>, body: Vec<u8>) -> io::Result<Vec<u8>>;
}

/// gzip and deflate (zlib-wrapped) support via `flate2`.
#[derive(Debug, Clone)]
pub struct FlateCompressor {
    accept: &'static str,
}

impl FlateCompressor {
    const ACCEPT_ALL: &'static str = "gzip;q=1.0, deflate;q=1.0, identity";
    const ACCEPT_IDENTITY: &'static str = "identity";

    pub fn new() -> Self {
        Self { accept: Self::ACCEPT_ALL }
    }

    /// Ask servers not to compress. Bodies that arrive compressed anyway are
    /// still decoded.
    pub fn disabled() -> Self {
        Self {
            accept: Self::ACCEPT_IDENTITY,
        }
    }
}

impl Default for FlateCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for FlateCompressor {
    fn accept_encoding(&self) -> &str {
        self.accept
    }

    fn decompress(&self, encoding: Option<&str>, body: Vec<u8>) -> io::Result<Vec<u8>> {
        if body.is_empty() {
            return Ok(body);
        }
        let encoding = encoding.map(|e| e.trim().to_ascii_lowercase());
        match encoding.as_deref() {
            Some("gzip") | Some("x-gzip") => read_all(GzDecoder::new(body.as_slice())),
            Some("deflate") => read_all(ZlibDecoder::new(body.as_slice())),
            _ => Ok(body),
        }
    }
}

fn read_all(mut reader: impl Read) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}
