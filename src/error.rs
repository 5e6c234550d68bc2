//! Error types for vigil.
//!
//! All errors are strongly typed using thiserror. The taxonomy separates
//! what a REST boundary should report as a client error (the rule itself is
//! bad or asks for something unimplemented) from what is a server error
//! (configuration or the installation saga failed).

use thiserror::Error;

use crate::rule::TargetClass;

/// Configuration errors detected at startup.
///
/// These are fatal: a service holding a registry with a broken endpoint
/// configuration must not start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port in '{setting}': {value}")]
    InvalidPort {
        setting: String,
        value: String,
    },

    #[error("Invalid endpoint address in '{setting}': {value}")]
    InvalidAddress {
        setting: String,
        value: String,
    },

    #[error("Malformed URL: {url}")]
    MalformedUrl {
        url: String,
    },
}

/// Errors building query text from a rule.
///
/// These reject the single offending rule with no registry state change.
#[derive(Debug, Error)]
pub enum QueryBuildError {
    #[error("Unknown aggregate function: {name}")]
    UnknownAggregateFunction {
        name: String,
    },

    #[error("Aggregate function {function} has no parameter named '{parameter}'")]
    UnknownAggregationParameter {
        function: String,
        parameter: String,
    },

    #[error("Aggregate function {function} is missing required parameter '{parameter}'")]
    MissingAggregationParameter {
        function: String,
        parameter: String,
    },

    #[error("Malformed query: {reason}")]
    MalformedQuery {
        reason: String,
    },
}

/// A rule asked for something the compiler does not implement.
///
/// Never a silent no-op: the rule is rejected with the exact feature named
/// so a REST boundary can report a structured client error.
#[derive(Debug, Error)]
pub enum UnsupportedFeatureError {
    #[error("Action '{name}' has not been implemented yet")]
    Action {
        name: String,
    },

    #[error("Rules with target class {class} are not supported yet")]
    TargetClass {
        class: TargetClass,
    },

    #[error("Grouping class {grouping_class} for target class {target_class} is not supported yet")]
    GroupingClass {
        target_class: TargetClass,
        grouping_class: TargetClass,
    },

    #[error("Rules must have exactly one monitored target, got {count}")]
    TargetCardinality {
        count: usize,
    },
}

/// Transport errors talking to the stream engine or knowledge base.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
    },

    #[error("Server error (status {status}): {message}")]
    ServerError {
        status: u16,
        message: String,
    },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse {
        message: String,
    },
}

/// A step of the installation saga failed against the external engine.
///
/// Earlier saga steps stay registered engine-side; there is no compensating
/// cleanup (accepted limitation, logged at warn by the registry).
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Could not register stream {stream_uri}: {source}")]
    Stream {
        stream_uri: String,
        source: TransportError,
    },

    #[error("Could not register query {name}: {source}")]
    Query {
        name: String,
        source: TransportError,
    },

    #[error("Could not attach observer to query {query_uri}: {source}")]
    Observer {
        query_uri: String,
        source: TransportError,
    },
}

/// Top-level error type for vigil.
#[derive(Debug, Error)]
pub enum VigilError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Query build error: {0}")]
    QueryBuild(#[from] QueryBuildError),

    #[error("Unsupported feature: {0}")]
    Unsupported(#[from] UnsupportedFeatureError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl VigilError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if the failure is the rule's fault.
    ///
    /// A REST boundary maps these to 4xx responses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::QueryBuild(_) | Self::Unsupported(_))
    }

    /// Returns true if the failure is the service's or the engine's fault.
    ///
    /// A REST boundary maps these to 5xx responses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Registration(_) | Self::Internal { .. })
    }
}

/// Result type alias for vigil operations.
pub type VigilResult<T> = Result<T, VigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_action_message_names_the_action() {
        let err = UnsupportedFeatureError::Action {
            name: "EnableMonitoringRule".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("EnableMonitoringRule"));
        assert!(msg.contains("not been implemented"));
    }

    #[test]
    fn grouping_class_message_names_both_classes() {
        let err = UnsupportedFeatureError::GroupingClass {
            target_class: TargetClass::Vm,
            grouping_class: TargetClass::CloudProvider,
        };
        let msg = format!("{err}");
        assert!(msg.contains("CloudProvider"));
        assert!(msg.contains("VM"));
    }

    #[test]
    fn registration_error_carries_the_transport_cause() {
        let err = RegistrationError::Stream {
            stream_uri: "http://streams/ResponseTime".to_string(),
            source: TransportError::ConnectionFailed {
                message: "refused".to_string(),
            },
        };
        let msg = format!("{err}");
        assert!(msg.contains("http://streams/ResponseTime"));
        assert!(msg.contains("refused"));
    }

    #[test]
    fn client_and_server_classification() {
        let build: VigilError = QueryBuildError::UnknownAggregateFunction {
            name: "MEDIAN".to_string(),
        }
        .into();
        assert!(build.is_client_error());
        assert!(!build.is_server_error());

        let unsupported: VigilError =
            UnsupportedFeatureError::TargetCardinality { count: 0 }.into();
        assert!(unsupported.is_client_error());

        let registration: VigilError = RegistrationError::Query {
            name: "q1".to_string(),
            source: TransportError::ServerError {
                status: 500,
                message: "boom".to_string(),
            },
        }
        .into();
        assert!(registration.is_server_error());
        assert!(!registration.is_client_error());

        let config: VigilError = ConfigError::MalformedUrl {
            url: "not a url".to_string(),
        }
        .into();
        assert!(config.is_server_error());
    }
}
