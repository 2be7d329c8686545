//! The seam between this crate's framework-neutral [`Context`
//! ](../context/struct.Context.html)/[`App`](../app/struct.App.html) and a
//! concrete host web framework.
//!
//! One implementation of [`Adapter`](trait.Adapter.html) per host framework
//! is expected -- `panelforge-actix` is the reference implementation, built
//! the way the teacher's `AxServer`/`AxRequest`/`AxResponse` trio handled
//! `actix-web` specifically, generalised to any host via this trait.
//!
use crate::context::{RequestData, ResponseData};
use crate::Error;
use std::path::Path;

/// Bridges one host framework's request/response types to this crate's
/// [`RequestData`](../context/struct.RequestData.html)/[`ResponseData`
/// ](../context/struct.ResponseData.html).
///
pub trait Adapter {
    /// The host framework's inbound request type.
    ///
    type Request;

    /// The host framework's outbound response type (often a type
    /// implementing that framework's "Responder"-style trait).
    ///
    type Response;

    /// Decode `request` into framework-neutral `RequestData`. `route_params`
    /// are the wildcard captures [`Trie::find_path()`
    /// ](../trie/struct.Trie.html#method.find_path) returned for the route
    /// the adapter is dispatching to, already paired with their parameter
    /// names by the caller.
    ///
    fn request_data(
        &self,
        request: &Self::Request,
        route_params: std::collections::HashMap<String, String>,
    ) -> Result<RequestData, Error>;

    /// Build the host framework's response value from the `ResponseData` a
    /// handler chain produced.
    ///
    fn build_response(&self, data: ResponseData) -> Self::Response;

    /// Persist uploaded files that arrived with `request` to `files`,
    /// position for position. Adapters with no multipart support may leave
    /// this at its default no-op.
    ///
    fn handle_upload(
        &self,
        _request: &Self::Request,
        _files: &[Option<&Path>],
    ) -> Result<(), Error> {
        Ok(())
    }
}
