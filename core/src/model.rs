//! Capabilities a resource type offers the terminus.
//!
//! # Design
//! `Payload` is what an instance can do for an outbound write; `Model` adds
//! the class-level side (which formats the type understands and how to
//! decode one or many instances). The terminus never looks inside a body
//! itself, it only routes bytes and a bare mime type to these functions.
//!
//! Whether a decoded instance may have its name replaced by the request key
//! is declared by the type through `Model::named_mut`, which defaults to
//! `None`.

/// Outbound encoding of a single instance.
pub trait Payload {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Serialized form sent as the body of a `save`.
    fn render(&self) -> Result<Vec<u8>, Self::Error>;

    /// Mime type of `render`'s output, sent as `Content-Type`.
    fn mime(&self) -> String;
}

/// An instance whose identity can be reassigned after decoding.
pub trait Named {
    fn set_name(&mut self, name: &str);
}

/// A resource type the terminus can fetch, search, destroy, and save.
pub trait Model: Payload + Sized {
    /// Formats in preference order, joined into the `Accept` header.
    fn supported_formats() -> Vec<String>;

    fn decode_one(mime: &str, body: &[u8]) -> Result<Self, Self::Error>;

    /// `Ok(None)` means the body held nothing; callers treat it as empty.
    fn decode_many(mime: &str, body: &[u8]) -> Result<Option<Vec<Self>>, Self::Error>;

    /// Name-reassignment capability, if the type has one.
    fn named_mut(&mut self) -> Option<&mut dyn Named> {
        None
    }
}
