//! Clients for the external collaborators.
//!
//! The registry talks to the stream-query engine and the knowledge base
//! only through these traits, so tests drive the installation saga with
//! in-memory fakes and the HTTP adapters stay at the edge.

/// HTTP adapters.
pub mod http;

pub use http::{HttpKnowledgeBaseClient, HttpStreamEngineClient};

use crate::error::TransportError;

/// Engine response to a stream registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamAck {
    /// Stream newly registered.
    Registered,
    /// Stream was already registered engine-side. Success, not an error.
    AlreadyExists,
}

/// The stream-query engine's registration surface.
///
/// All calls are synchronous and blocking; retries and timeouts are the
/// implementation's concern, not the registry's.
pub trait StreamEngineClient: Send + Sync {
    /// Registers a stream. An engine reporting the stream already exists
    /// must map to [`StreamAck::AlreadyExists`], not an error.
    fn register_stream(&self, stream_uri: &str) -> Result<StreamAck, TransportError>;

    /// Registers a named query, returning the engine-assigned query URI.
    fn register_query(&self, name: &str, query_text: &str) -> Result<String, TransportError>;

    /// Attaches an observer callback to a registered query.
    fn attach_observer(&self, query_uri: &str, callback_url: &str) -> Result<(), TransportError>;
}

/// The knowledge base's query surface.
pub trait KnowledgeBaseClient: Send + Sync {
    /// URL of the dataset generated queries join via FROM.
    fn data_url(&self) -> &str;

    /// ASK-style subclass check against the class hierarchy.
    fn is_subclass_of(
        &self,
        resource_uri: &str,
        super_class_uri: &str,
    ) -> Result<bool, TransportError>;
}
