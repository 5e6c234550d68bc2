//! # vigil: monitoring-rule compiler and continuous-query registry
//!
//! vigil turns declarative monitoring rules into continuous queries for an
//! external RDF stream-query engine and tracks what has been installed.
//!
//! ## Core concepts
//!
//! - **MonitoringRule**: what to watch. A metric over a time window, an
//!   optional condition and aggregation, one monitored target
//! - **CompiledQuerySet**: what a rule becomes. A main aggregating query
//!   plus, on the secondary-aggregation path, a tunnel query forwarding
//!   raw readings to the aggregator
//! - **QueryRegistry**: the single owner of installation state; drives the
//!   register-stream / register-query / attach-observer saga
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil::{Config, HttpStreamEngineClient, MonitoringRule, QueryRegistry, TargetClass};
//!
//! let config = Config::from_env()?;
//! let engine = Arc::new(HttpStreamEngineClient::new(config.engine_url())?);
//! let registry = QueryRegistry::from_config(&config, engine);
//!
//! let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
//!     .condition("METRIC > 200")
//!     .target("vm1", TargetClass::Vm)
//!     .output_metric("HighResponseTime")
//!     .build();
//! let installation = registry.install_rule(&rule, None)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod compiler;
pub mod config;
pub mod error;
pub mod observer;
pub mod query;
pub mod registry;
pub mod rule;
pub mod vocab;

// Re-export primary types at crate root for convenience
pub use client::{
    HttpKnowledgeBaseClient, HttpStreamEngineClient, KnowledgeBaseClient, StreamAck,
    StreamEngineClient,
};
pub use compiler::{CompiledQuery, CompiledQuerySet, RuleCompiler};
pub use config::Config;
pub use error::{
    ConfigError, QueryBuildError, RegistrationError, TransportError, UnsupportedFeatureError,
    VigilError, VigilResult,
};
pub use observer::Observer;
pub use query::{ContinuousQuery, GraphPattern, QueryVariable, SelectBody};
pub use registry::{Installation, QueryRegistry};
pub use rule::{Action, MetricAggregation, MonitoredTarget, MonitoringRule, Parameter, TargetClass};
