//! Blocking HTTP adapters for the engine and knowledge-base REST APIs.

use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;
use crate::vocab;

use super::{KnowledgeBaseClient, StreamAck, StreamEngineClient};

const USER_AGENT: &str = concat!("vigil/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> Result<reqwest::blocking::Client, TransportError> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| TransportError::ConnectionFailed {
            message: e.to_string(),
        })
}

fn connection_failed(e: &reqwest::Error) -> TransportError {
    TransportError::ConnectionFailed {
        message: e.to_string(),
    }
}

/// Maps a stream-registration response to an ack.
///
/// The engine reports an existing stream either with 409 or with a 4xx
/// body mentioning it; both are successful registrations.
fn stream_ack(status: u16, body: &str) -> Result<StreamAck, TransportError> {
    if (200..300).contains(&status) {
        return Ok(StreamAck::Registered);
    }
    if status == 409 || body.contains("already exists") {
        return Ok(StreamAck::AlreadyExists);
    }
    Err(TransportError::ServerError {
        status,
        message: body.to_string(),
    })
}

/// HTTP client for the stream-query engine.
#[derive(Debug)]
pub struct HttpStreamEngineClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpStreamEngineClient {
    /// Creates a client for the engine at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            base_url: base_url.into(),
            http: build_client()?,
        })
    }
}

impl StreamEngineClient for HttpStreamEngineClient {
    fn register_stream(&self, stream_uri: &str) -> Result<StreamAck, TransportError> {
        let url = format!("{}/streams", self.base_url);
        debug!(stream = stream_uri, "registering stream with engine");
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "streamIri": stream_uri }))
            .send()
            .map_err(|e| connection_failed(&e))?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        stream_ack(status, &body)
    }

    fn register_query(&self, name: &str, query_text: &str) -> Result<String, TransportError> {
        let url = format!("{}/queries/{name}", self.base_url);
        let response = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(query_text.to_string())
            .send()
            .map_err(|e| connection_failed(&e))?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(TransportError::ServerError {
                status,
                message: body,
            });
        }
        let query_uri = body.trim();
        if query_uri.is_empty() {
            return Err(TransportError::UnexpectedResponse {
                message: format!("engine returned no query URI for query {name}"),
            });
        }
        Ok(query_uri.to_string())
    }

    fn attach_observer(&self, query_uri: &str, callback_url: &str) -> Result<(), TransportError> {
        let url = format!("{query_uri}/observers");
        let response = self
            .http
            .post(&url)
            .body(callback_url.to_string())
            .send()
            .map_err(|e| connection_failed(&e))?;
        let status = response.status().as_u16();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(TransportError::ServerError {
                status,
                message: response.text().unwrap_or_default(),
            })
        }
    }
}

/// Builds the ASK text for a subclass check.
fn ask_subclass_query(data_url: &str, resource_uri: &str, super_class_uri: &str) -> String {
    format!(
        "ASK FROM <{data_url}{}> WHERE {{ <{resource_uri}> <{}> <{super_class_uri}> . }}",
        vocab::DEFAULT_GRAPH_SUFFIX,
        vocab::RDFS_SUBCLASS_OF,
    )
}

/// HTTP client for the knowledge base's SPARQL endpoint.
#[derive(Debug)]
pub struct HttpKnowledgeBaseClient {
    query_url: String,
    data_url: String,
    http: reqwest::blocking::Client,
}

impl HttpKnowledgeBaseClient {
    /// Creates a client for the knowledge base at `base_url`.
    ///
    /// The dataset is expected at `{base_url}/data` and the SPARQL
    /// endpoint at `{base_url}/query`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let base_url = base_url.into();
        Ok(Self {
            query_url: format!("{base_url}/query"),
            data_url: format!("{base_url}/data"),
            http: build_client()?,
        })
    }
}

impl KnowledgeBaseClient for HttpKnowledgeBaseClient {
    fn data_url(&self) -> &str {
        &self.data_url
    }

    fn is_subclass_of(
        &self,
        resource_uri: &str,
        super_class_uri: &str,
    ) -> Result<bool, TransportError> {
        let query = ask_subclass_query(&self.data_url, resource_uri, super_class_uri);
        let response = self
            .http
            .post(&self.query_url)
            .header(reqwest::header::ACCEPT, "application/sparql-results+json")
            .form(&[("query", query.as_str())])
            .send()
            .map_err(|e| connection_failed(&e))?;
        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(TransportError::ServerError {
                status,
                message: response.text().unwrap_or_default(),
            });
        }
        let body: serde_json::Value =
            response
                .json()
                .map_err(|e| TransportError::UnexpectedResponse {
                    message: e.to_string(),
                })?;
        body.get("boolean")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| TransportError::UnexpectedResponse {
                message: "ASK response has no boolean field".to_string(),
            })
    }
}
