//! Monitoring-ontology vocabulary.
//!
//! Namespace URIs, prefixes and term names used by every generated query.
//! Generated query text only ever references the ontology through this
//! module, so the vocabulary can move without touching the compiler.

/// Prefix bound to the monitoring ontology in generated queries.
pub const PREFIX: &str = "mo";

/// Monitoring ontology namespace URI.
pub const URI: &str = "http://vigil.dev/ontologies/monitoring#";

/// Prefix bound to the engine's aggregate/timestamp function namespace.
pub const FUNCTIONS_PREFIX: &str = "f";

/// Function namespace URI.
pub const FUNCTIONS_URI: &str = "http://vigil.dev/functions#";

/// XML Schema namespace URI.
pub const XSD_URI: &str = "http://www.w3.org/2001/XMLSchema#";

/// RDF namespace URI.
pub const RDF_URI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// RDF Schema namespace URI.
pub const RDFS_URI: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Full URI of `rdfs:subClassOf`, used by knowledge-base ASK checks.
pub const RDFS_SUBCLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

/// Root URI under which metric streams are published.
pub const STREAMS_ROOT: &str = "http://vigil.dev/streams/";

/// Query-string suffix selecting the knowledge base's default graph.
pub const DEFAULT_GRAPH_SUFFIX: &str = "?graph=default";

/// `rdf:type` as a prefixed name.
pub const RDF_TYPE: &str = "rdf:type";

/// Links a metric datum to its metric.
pub const METRIC: &str = "mo:metric";

/// Links a metric datum to the resource it is about.
pub const ABOUT_RESOURCE: &str = "mo:aboutResource";

/// Links a metric datum to its observed value.
pub const VALUE: &str = "mo:value";

/// Links a resource to its literal identifier.
pub const ID: &str = "mo:id";

/// Links an output datum to its timestamp.
pub const TIMESTAMP: &str = "mo:timestamp";

/// Links a VM to its cloud provider.
pub const CLOUD_PROVIDER: &str = "mo:cloudProvider";

/// Renders a metric name as a prefixed ontology term.
#[must_use]
pub fn metric_term(metric_name: &str) -> String {
    format!("{PREFIX}:{metric_name}")
}

/// Source stream URI for a metric.
#[must_use]
pub fn stream_uri(metric_name: &str) -> String {
    format!("{STREAMS_ROOT}{metric_name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_term_is_prefixed() {
        assert_eq!(metric_term("ResponseTime"), "mo:ResponseTime");
    }

    #[test]
    fn stream_uri_appends_metric_to_root() {
        assert_eq!(stream_uri("CpuUtilization"), "http://vigil.dev/streams/CpuUtilization");
    }
}
