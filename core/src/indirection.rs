//! The abstract CRUD contract every terminus implements.

use crate::error::Result;
use crate::model::Model;
use crate::request::Request;

/// Find, probe, search, destroy and save instances of `M`, wherever they
/// live.
///
/// A missing resource is never an error: `find` and `destroy` return
/// `None`, `head` returns `false` and `search` returns an empty `Vec`.
pub trait Indirection<M: Model> {
    fn find(&self, request: &Request<M>) -> Result<Option<M>>;

    fn head(&self, request: &Request<M>) -> Result<bool>;

    fn search(&self, request: &Request<M>) -> Result<Vec<M>>;

    fn destroy(&self, request: &Request<M>) -> Result<Option<M>>;

    fn save(&self, request: &Request<M>) -> Result<()>;

    /// Hook for termini that check keys locally. Accepts everything by
    /// default.
    fn validate_key(&self, _request: &Request<M>) -> Result<()> {
        Ok(())
    }
}
