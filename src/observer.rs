//! Observers attached to registered queries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A callback registered on a query's output.
///
/// The query URI is a lookup key back to the query the observer watches,
/// not a lifecycle owner; it is not part of the wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observer {
    /// Observer identifier.
    pub id: Uuid,
    /// URL the engine pushes results to.
    pub callback_url: String,
    /// URI of the observed query.
    #[serde(skip)]
    pub query_uri: String,
}

impl Observer {
    /// Creates an observer with a fresh id.
    #[must_use]
    pub fn new(callback_url: impl Into<String>, query_uri: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            callback_url: callback_url.into(),
            query_uri: query_uri.into(),
        }
    }

    /// The observer's own URI under its query.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("{}/observers/{}", self.query_uri, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_nests_under_the_query() {
        let observer = Observer::new("http://sda:8176/ingest", "http://engine/queries/42");
        assert_eq!(
            observer.uri(),
            format!("http://engine/queries/42/observers/{}", observer.id)
        );
    }

    #[test]
    fn query_uri_is_not_serialized() {
        let observer = Observer::new("http://sda:8176/ingest", "http://engine/queries/42");
        let json = serde_json::to_string(&observer).unwrap();
        assert!(json.contains("callbackUrl"));
        assert!(!json.contains("queries/42"));
    }
}
