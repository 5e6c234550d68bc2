//! Query registry and the installation saga.
//!
//! One registry instance owns all mutable installation state for the
//! lifetime of the service: which streams are registered, which query text
//! is registered under which URI, and which queries each rule owns. A
//! single mutex guards the whole of it, so the registered-check and the
//! update it implies are atomic across concurrent installs.
//!
//! Installation is a short-lived saga of up to four sequential blocking
//! engine calls. A failure at step *k* leaves steps 1..k-1 registered
//! engine-side with no compensating cleanup; the gap is logged at warn,
//! not silently handled.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::{StreamAck, StreamEngineClient};
use crate::compiler::{CompiledQuery, CompiledQuerySet, RuleCompiler};
use crate::config::Config;
use crate::error::{RegistrationError, VigilError, VigilResult};
use crate::observer::Observer;
use crate::rule::MonitoringRule;

/// Result of installing one rule.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
    /// The installed rule.
    pub rule_id: String,
    /// URIs of the registered queries, tunnel first when present.
    pub query_uris: Vec<String>,
    /// Observer attached to the tunnel query, if one was compiled.
    pub observer: Option<Observer>,
    /// When the installation completed.
    pub installed_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct RegistryState {
    registered_streams: HashSet<String>,
    registered_queries: HashMap<String, String>,
    registered_names: HashSet<String>,
    rule_queries: HashMap<String, Vec<String>>,
}

/// Tracks installed queries and drives registration against the engine.
pub struct QueryRegistry {
    engine: Arc<dyn StreamEngineClient>,
    compiler: RuleCompiler,
    sda_ingest_url: String,
    state: Mutex<RegistryState>,
}

impl QueryRegistry {
    /// Creates a registry talking to `engine`.
    #[must_use]
    pub fn new(
        engine: Arc<dyn StreamEngineClient>,
        compiler: RuleCompiler,
        sda_ingest_url: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            compiler,
            sda_ingest_url: sda_ingest_url.into(),
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Creates a registry wired from endpoint configuration.
    #[must_use]
    pub fn from_config(config: &Config, engine: Arc<dyn StreamEngineClient>) -> Self {
        Self::new(engine, RuleCompiler::new(config.kb_data_url()), config.sda_url())
    }

    /// Compiles and installs one rule.
    ///
    /// `secondary_metric` is the metric the secondary aggregator publishes;
    /// `Some` switches on the tunnel path. Compilation failures reject the
    /// rule before any state or engine mutation.
    pub fn install_rule(
        &self,
        rule: &MonitoringRule,
        secondary_metric: Option<&str>,
    ) -> VigilResult<Installation> {
        let mut state = self.lock_state()?;
        let compiled = self
            .compiler
            .compile(rule, secondary_metric, &state.registered_names)?;

        let mut query_uris = Vec::new();
        let mut observer = None;
        let mut completed_steps = 0usize;
        let outcome = self.run_saga(
            &mut state,
            &compiled,
            &mut query_uris,
            &mut observer,
            &mut completed_steps,
        );

        match outcome {
            Ok(()) => {
                state
                    .rule_queries
                    .entry(rule.id.clone())
                    .or_default()
                    .extend(query_uris.iter().cloned());
                info!(rule_id = %rule.id, queries = query_uris.len(), "rule installed");
                Ok(Installation {
                    rule_id: rule.id.clone(),
                    query_uris,
                    observer,
                    installed_at: Utc::now(),
                })
            }
            Err(e) => {
                if completed_steps > 0 {
                    warn!(
                        rule_id = %rule.id,
                        completed_steps,
                        error = %e,
                        "installation failed mid-saga; earlier registrations stay engine-side"
                    );
                }
                Err(e)
            }
        }
    }

    fn run_saga(
        &self,
        state: &mut RegistryState,
        compiled: &CompiledQuerySet,
        query_uris: &mut Vec<String>,
        observer: &mut Option<Observer>,
        completed_steps: &mut usize,
    ) -> VigilResult<()> {
        if let Some(tunnel) = &compiled.tunnel {
            self.register_stream(state, &tunnel.source_stream_uri)?;
            *completed_steps += 1;
            let tunnel_uri = self.register_query(state, tunnel)?;
            *completed_steps += 1;
            *observer = Some(self.attach_observer(&tunnel_uri)?);
            *completed_steps += 1;
            query_uris.push(tunnel_uri);
        }
        self.register_stream(state, &compiled.main.source_stream_uri)?;
        *completed_steps += 1;
        query_uris.push(self.register_query(state, &compiled.main)?);
        Ok(())
    }

    /// Registers a stream at most once network-side.
    fn register_stream(&self, state: &mut RegistryState, stream_uri: &str) -> VigilResult<()> {
        if state.registered_streams.contains(stream_uri) {
            debug!(stream = stream_uri, "stream already registered, skipping");
            return Ok(());
        }
        info!(stream = stream_uri, "registering stream");
        match self.engine.register_stream(stream_uri) {
            Ok(StreamAck::Registered) => info!(stream = stream_uri, "stream registered"),
            Ok(StreamAck::AlreadyExists) => {
                info!(stream = stream_uri, "stream already exists engine-side");
            }
            Err(source) => {
                return Err(RegistrationError::Stream {
                    stream_uri: stream_uri.to_string(),
                    source,
                }
                .into());
            }
        }
        state.registered_streams.insert(stream_uri.to_string());
        Ok(())
    }

    fn register_query(
        &self,
        state: &mut RegistryState,
        query: &CompiledQuery,
    ) -> VigilResult<String> {
        let query_uri = self
            .engine
            .register_query(&query.name, &query.text)
            .map_err(|source| RegistrationError::Query {
                name: query.name.clone(),
                source,
            })?;
        info!(query_name = %query.name, query_uri = %query_uri, "query registered");
        state
            .registered_queries
            .insert(query_uri.clone(), query.text.clone());
        state.registered_names.insert(query.name.clone());
        Ok(query_uri)
    }

    fn attach_observer(&self, query_uri: &str) -> VigilResult<Observer> {
        let observer = Observer::new(self.sda_ingest_url.clone(), query_uri);
        self.engine
            .attach_observer(query_uri, &observer.callback_url)
            .map_err(|source| RegistrationError::Observer {
                query_uri: query_uri.to_string(),
                source,
            })?;
        info!(observer = %observer.uri(), "observer attached");
        Ok(observer)
    }

    /// The registered text of a query, if the URI is known.
    #[must_use]
    pub fn query_text(&self, query_uri: &str) -> Option<String> {
        let state = self.state.lock().ok()?;
        state.registered_queries.get(query_uri).cloned()
    }

    /// URIs of the queries a rule owns, in registration order.
    #[must_use]
    pub fn queries_for_rule(&self, rule_id: &str) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.rule_queries.get(rule_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Currently registered stream URIs.
    #[must_use]
    pub fn registered_streams(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.registered_streams.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of registered queries.
    #[must_use]
    pub fn registered_query_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.registered_queries.len())
            .unwrap_or_default()
    }

    fn lock_state(&self) -> VigilResult<std::sync::MutexGuard<'_, RegistryState>> {
        self.state
            .lock()
            .map_err(|_| VigilError::internal("registry state lock poisoned"))
    }
}
