//! Rule compilation.
//!
//! [`RuleCompiler`] turns one [`MonitoringRule`] into one or two continuous
//! queries: the main aggregating query and, when a secondary aggregator
//! pre-processes the metric, the tunnel query that forwards raw per-target
//! readings to it. The compiler is pure apart from random name
//! regeneration; it never touches registry state or the network.

/// Action dispatch table.
pub mod actions;
/// Condition-template translation.
pub mod condition;
/// Class-dependent graph patterns.
pub mod pattern;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{QueryBuildError, UnsupportedFeatureError, VigilResult};
use crate::query::{
    escape_name, inner_variable, random_name, signature, ContinuousQuery, GraphPattern,
    QueryVariable, SelectBody,
};
use crate::rule::MonitoringRule;
use crate::vocab;

/// A query ready for registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuery {
    /// Name the query registers under, unique among registered queries.
    pub name: String,
    /// Full query text.
    pub text: String,
    /// Stream the query reads from.
    pub source_stream_uri: String,
    /// Rule that owns the query.
    pub rule_id: String,
}

/// Everything one rule compiles to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuerySet {
    /// The main (aggregating) query.
    pub main: CompiledQuery,
    /// The tunnel query feeding the secondary aggregator, if one is needed.
    pub tunnel: Option<CompiledQuery>,
}

/// Compiles monitoring rules into continuous queries.
#[derive(Debug, Clone)]
pub struct RuleCompiler {
    kb_data_url: String,
}

impl RuleCompiler {
    /// Creates a compiler joining the knowledge base at `kb_data_url`.
    #[must_use]
    pub fn new(kb_data_url: impl Into<String>) -> Self {
        Self {
            kb_data_url: kb_data_url.into(),
        }
    }

    /// Compiles `rule`.
    ///
    /// `secondary_metric` is the metric name the secondary aggregator
    /// publishes; `Some` means secondary aggregation is required and a
    /// tunnel query is compiled too. `taken_names` are query names already
    /// registered; generated names avoid them by random regeneration.
    pub fn compile(
        &self,
        rule: &MonitoringRule,
        secondary_metric: Option<&str>,
        taken_names: &HashSet<String>,
    ) -> VigilResult<CompiledQuerySet> {
        let sda_required = secondary_metric.is_some();
        let effective_metric = secondary_metric.unwrap_or(&rule.metric_name);

        let effect = actions::apply(rule, sda_required)?;
        let name = unique_name(&rule.id, "", taken_names, &[]);
        let source_stream_uri = vocab::stream_uri(effective_metric);
        let graph = pattern::build(rule)?;

        let inner_vars: Vec<QueryVariable> =
            effect.required_vars.iter().map(inner_variable).collect();
        let value = output_value(rule, sda_required);
        let having = condition::translate(rule.condition.as_deref(), &value);

        let mut inner = SelectBody::new();
        add_selections(&mut inner, &inner_vars, rule)?;
        inner.where_graph(graph.clone());

        let mut outer = SelectBody::new();
        add_selections(&mut outer, &effect.required_vars, rule)?;
        outer
            .where_body(inner)
            .group_by(grouping_variable(rule)?)
            .having(having);

        let mut query = ContinuousQuery::new(&name);
        query
            .construct(effect.construct)
            .from_stream(&source_stream_uri, rule.time_window, rule.time_step)
            .from(self.static_source())
            .body(outer);
        let text = query.render()?;
        info!(rule_id = %rule.id, query_name = %name, "compiled main query");
        debug!(query = %text, "main query text");

        let main = CompiledQuery {
            name,
            text,
            source_stream_uri,
            rule_id: rule.id.clone(),
        };
        let tunnel = if sda_required {
            Some(self.compile_tunnel(rule, taken_names, &main.name, &graph)?)
        } else {
            None
        };

        Ok(CompiledQuerySet { main, tunnel })
    }

    /// Builds the tunnel query: raw per-target readings, same window, no
    /// grouping, straight off the rule's own metric stream.
    fn compile_tunnel(
        &self,
        rule: &MonitoringRule,
        taken_names: &HashSet<String>,
        main_name: &str,
        graph: &GraphPattern,
    ) -> VigilResult<CompiledQuery> {
        let name = unique_name(&rule.id, "Tunnel", taken_names, &[main_name]);
        let source_stream_uri = vocab::stream_uri(&rule.metric_name);

        let mut body = SelectBody::new();
        body.select(QueryVariable::Target)
            .select(QueryVariable::Input)
            .select_computed(
                QueryVariable::Timestamp,
                timestamp_function(),
                timestamp_arguments(),
            )
            .where_graph(graph.clone());

        let mut query = ContinuousQuery::new(&name);
        query
            .select(vec![
                QueryVariable::Target,
                QueryVariable::Input,
                QueryVariable::Timestamp,
            ])
            .from_stream(&source_stream_uri, rule.time_window, rule.time_step)
            .from(self.static_source())
            .body(body);
        let text = query.render()?;
        info!(rule_id = %rule.id, query_name = %name, "compiled tunnel query");
        debug!(query = %text, "tunnel query text");

        Ok(CompiledQuery {
            name,
            text,
            source_stream_uri,
            rule_id: rule.id.clone(),
        })
    }

    fn static_source(&self) -> String {
        format!("{}{}", self.kb_data_url, vocab::DEFAULT_GRAPH_SUFFIX)
    }
}

/// The variable the rule's output is keyed by: the grouping variable for
/// grouped rules, the target otherwise.
pub(crate) fn output_target(
    rule: &MonitoringRule,
) -> Result<QueryVariable, UnsupportedFeatureError> {
    match grouping_variable(rule)? {
        Some(var) => Ok(var),
        None => Ok(QueryVariable::Target),
    }
}

/// The variable carrying the rule's output value. Raw input when the rule
/// is ungrouped or a secondary aggregator already did the aggregation.
pub(crate) fn output_value(rule: &MonitoringRule, sda_required: bool) -> QueryVariable {
    if sda_required || !rule.is_grouped() {
        QueryVariable::Input
    } else {
        QueryVariable::Output
    }
}

/// The GROUP BY variable, if the rule aggregates.
fn grouping_variable(
    rule: &MonitoringRule,
) -> Result<Option<QueryVariable>, UnsupportedFeatureError> {
    let Some(grouping_class) = rule.grouping_class() else {
        return Ok(None);
    };
    let target = rule.single_target()?;
    Ok(Some(QueryVariable::grouping(grouping_class, target.class)))
}

fn timestamp_function() -> String {
    format!("{}:timestamp", vocab::FUNCTIONS_PREFIX)
}

fn timestamp_arguments() -> Vec<String> {
    vec![
        QueryVariable::Datum.to_string(),
        vocab::ABOUT_RESOURCE.to_string(),
        QueryVariable::Target.to_string(),
    ]
}

/// Adds one projection entry per variable, applying the derivation rules:
/// the output timestamp is the max per-event timestamp, the per-event
/// timestamp comes from the engine's timestamp function on the datum, and
/// the output value is the aggregate call when the rule is grouped.
fn add_selections(
    body: &mut SelectBody,
    vars: &[QueryVariable],
    rule: &MonitoringRule,
) -> Result<(), QueryBuildError> {
    for var in vars {
        match var {
            QueryVariable::Timestamp => {
                body.select_computed(
                    QueryVariable::Timestamp,
                    "MAX",
                    vec![QueryVariable::InputTimestamp.to_string()],
                );
            }
            QueryVariable::InputTimestamp => {
                body.select_computed(
                    QueryVariable::InputTimestamp,
                    timestamp_function(),
                    timestamp_arguments(),
                );
            }
            QueryVariable::Output => match rule.metric_aggregation.as_ref() {
                Some(aggregation) => {
                    let sig = signature(&aggregation.aggregate_function)?;
                    let arguments =
                        sig.arguments(&QueryVariable::Input, &aggregation.parameters)?;
                    body.select_computed(QueryVariable::Output, sig.name, arguments);
                }
                None => {
                    body.select(QueryVariable::Output);
                }
            },
            other => {
                body.select(other.clone());
            }
        }
    }
    Ok(())
}

/// Escapes the rule id into a query name, regenerating randomly until it
/// collides with nothing in `taken` or `also_taken`.
fn unique_name(
    rule_id: &str,
    suffix: &str,
    taken: &HashSet<String>,
    also_taken: &[&str],
) -> String {
    let mut name = format!("{}{suffix}", escape_name(rule_id));
    while taken.contains(&name) || also_taken.contains(&name.as_str()) {
        name = format!("{}{suffix}", random_name());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::TargetClass;

    fn compiler() -> RuleCompiler {
        RuleCompiler::new("http://localhost:3030/data")
    }

    fn ungrouped_rule() -> MonitoringRule {
        MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .condition("METRIC > 200")
            .target("vm1", TargetClass::Vm)
            .output_metric("HighResponseTime")
            .build()
    }

    fn grouped_rule() -> MonitoringRule {
        MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .condition("METRIC > 200")
            .aggregation("AVG", TargetClass::CloudProvider)
            .target("vm1", TargetClass::Vm)
            .output_metric("AvgResponseTime")
            .build()
    }

    #[test]
    fn ungrouped_rule_compiles_to_one_query() {
        let set = compiler()
            .compile(&ungrouped_rule(), None, &HashSet::new())
            .unwrap();
        assert!(set.tunnel.is_none());
        assert_eq!(set.main.name, "R1");
        assert_eq!(set.main.rule_id, "R1");
        assert_eq!(
            set.main.source_stream_uri,
            "http://vigil.dev/streams/ResponseTime"
        );

        let text = &set.main.text;
        assert!(text.starts_with("REGISTER QUERY R1 AS\n"));
        assert!(text.contains("[RANGE 60s STEP 10s]"));
        assert!(text.contains("FROM <http://localhost:3030/data?graph=default>"));
        // Ungrouped: condition applies to the raw input, no GROUP BY.
        assert!(text.contains("HAVING (?input > 200)"));
        assert!(!text.contains("GROUP BY"));
        // Outer projection: target, input, derived timestamp.
        assert!(text.contains("SELECT ?target ?input (MAX(?input_timestamp) AS ?timestamp)"));
        // Inner projection: derived per-event timestamp.
        assert!(text.contains(
            "SELECT ?target ?input (f:timestamp(?datum, mo:aboutResource, ?target) AS ?input_timestamp)"
        ));
    }

    #[test]
    fn grouped_rule_aggregates_and_groups() {
        let set = compiler()
            .compile(&grouped_rule(), None, &HashSet::new())
            .unwrap();
        assert!(set.tunnel.is_none());

        let text = &set.main.text;
        assert!(text.contains("(AVG(?input) AS ?output)"));
        assert!(text.contains("SELECT ?CloudProvider"));
        assert!(text.contains("GROUP BY ?CloudProvider"));
        assert!(text.contains("HAVING (?output > 200)"));
        assert!(text.contains("mo:cloudProvider ?CloudProvider"));
    }

    #[test]
    fn grouping_by_target_class_collapses_to_target() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .aggregation("AVG", TargetClass::Vm)
            .target("vm1", TargetClass::Vm)
            .output_metric("AvgResponseTime")
            .build();
        let set = compiler().compile(&rule, None, &HashSet::new()).unwrap();
        let text = &set.main.text;
        assert!(text.contains("GROUP BY ?target"));
        assert!(!text.contains("?Vm"));
    }

    #[test]
    fn secondary_aggregation_adds_a_tunnel_query() {
        let set = compiler()
            .compile(&grouped_rule(), Some("AvgResponseTimeSda"), &HashSet::new())
            .unwrap();

        // Main query reads the aggregator's output stream and treats the
        // already-aggregated value as raw input.
        assert_eq!(
            set.main.source_stream_uri,
            "http://vigil.dev/streams/AvgResponseTimeSda"
        );
        assert!(set.main.text.contains("HAVING (?input > 200)"));

        let tunnel = set.tunnel.as_ref().unwrap();
        assert_eq!(tunnel.name, "R1Tunnel");
        assert_eq!(
            tunnel.source_stream_uri,
            "http://vigil.dev/streams/ResponseTime"
        );
        assert!(tunnel.text.contains("SELECT ?target ?input ?timestamp"));
        assert!(tunnel
            .text
            .contains("(f:timestamp(?datum, mo:aboutResource, ?target) AS ?timestamp)"));
        assert!(!tunnel.text.contains("GROUP BY"));
        assert!(!tunnel.text.contains("HAVING"));
    }

    #[test]
    fn taken_names_are_avoided_by_regeneration() {
        let mut taken = HashSet::new();
        taken.insert("R1".to_string());
        let set = compiler()
            .compile(&ungrouped_rule(), None, &taken)
            .unwrap();
        assert_ne!(set.main.name, "R1");
        assert!(set.main.name.starts_with('q'));
    }

    #[test]
    fn percentile_parameters_fill_signature_slots() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .aggregation("PERCENTILE", TargetClass::CloudProvider)
            .aggregation_parameter("percentile", "95")
            .target("vm1", TargetClass::Vm)
            .output_metric("P95ResponseTime")
            .build();
        let set = compiler().compile(&rule, None, &HashSet::new()).unwrap();
        assert!(set.main.text.contains("(PERCENTILE(?input, 95) AS ?output)"));
    }

    #[test]
    fn aggregation_parameter_mismatch_is_rejected() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .aggregation("PERCENTILE", TargetClass::CloudProvider)
            .target("vm1", TargetClass::Vm)
            .output_metric("P95ResponseTime")
            .build();
        let err = compiler().compile(&rule, None, &HashSet::new()).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn conditionless_rule_has_no_having_clause() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .target("vm1", TargetClass::Vm)
            .output_metric("RawResponseTime")
            .build();
        let set = compiler().compile(&rule, None, &HashSet::new()).unwrap();
        assert!(!set.main.text.contains("HAVING"));
    }
}
