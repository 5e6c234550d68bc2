//! Monitoring-rule descriptors.
//!
//! A [`MonitoringRule`] is the declarative input to the compiler: which
//! metric to watch, over what window, under what condition, optionally
//! aggregated over a grouping class. Rules arrive as JSON from the REST
//! façade and are immutable once handed to the compiler.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UnsupportedFeatureError;

/// Resource classes a rule can target or group by.
///
/// Closed enumeration: adding a class means adding a variant here plus a
/// row in the graph-pattern table, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetClass {
    /// A virtual machine.
    #[serde(rename = "VM")]
    Vm,
    /// A cloud provider.
    CloudProvider,
}

impl TargetClass {
    /// The class name as it appears in rule JSON and variable names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vm => "VM",
            Self::CloudProvider => "CloudProvider",
        }
    }

    /// The class as a prefixed ontology term.
    #[must_use]
    pub const fn term(self) -> &'static str {
        match self {
            Self::Vm => "mo:VM",
            Self::CloudProvider => "mo:CloudProvider",
        }
    }
}

impl fmt::Display for TargetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resource a rule monitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredTarget {
    /// Resource identifier, matched as a literal in the graph pattern.
    pub id: String,
    /// Class of the resource.
    pub class: TargetClass,
}

/// A named parameter of an aggregation or an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter value, uninterpreted at this layer.
    pub value: String,
}

/// Aggregation over a grouping class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAggregation {
    /// Aggregate function name, e.g. `AVG` or `PERCENTILE`.
    pub aggregate_function: String,
    /// Class the output is partitioned by.
    pub grouping_category_name: TargetClass,
    /// Extra function parameters, matched by name against the function's
    /// declared signature.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// An action the rule requests on its output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Action name; dispatched through the compiler's action table.
    pub name: String,
    /// Action parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl Action {
    /// Looks up a parameter value by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// A declarative monitoring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringRule {
    /// Unique rule identifier.
    pub id: String,
    /// Metric the rule monitors.
    pub metric_name: String,
    /// Evaluation window, in seconds.
    pub time_window: u32,
    /// Evaluation slide interval, in seconds.
    pub time_step: u32,
    /// Condition template containing the reserved `METRIC` placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Aggregation, if the rule's output is grouped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_aggregation: Option<MetricAggregation>,
    /// Monitored resources. The compiler requires exactly one.
    #[serde(default)]
    pub monitored_targets: Vec<MonitoredTarget>,
    /// Actions on the rule's output.
    #[serde(default)]
    pub actions: Vec<Action>,
}

impl MonitoringRule {
    /// Starts building a rule. Window and step are in seconds.
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        metric_name: impl Into<String>,
        time_window: u32,
        time_step: u32,
    ) -> MonitoringRuleBuilder {
        MonitoringRuleBuilder {
            rule: Self {
                id: id.into(),
                metric_name: metric_name.into(),
                time_window,
                time_step,
                condition: None,
                metric_aggregation: None,
                monitored_targets: Vec::new(),
                actions: Vec::new(),
            },
        }
    }

    /// Whether the rule's output is grouped by an aggregation.
    #[must_use]
    pub const fn is_grouped(&self) -> bool {
        self.metric_aggregation.is_some()
    }

    /// The grouping class, if the rule aggregates.
    #[must_use]
    pub fn grouping_class(&self) -> Option<TargetClass> {
        self.metric_aggregation
            .as_ref()
            .map(|a| a.grouping_category_name)
    }

    /// The rule's single monitored target.
    ///
    /// Zero or multiple targets are not implemented.
    pub fn single_target(&self) -> Result<&MonitoredTarget, UnsupportedFeatureError> {
        match self.monitored_targets.as_slice() {
            [target] => Ok(target),
            targets => Err(UnsupportedFeatureError::TargetCardinality {
                count: targets.len(),
            }),
        }
    }
}

/// Builder for [`MonitoringRule`].
///
/// # Example
/// ```
/// use vigil::rule::{MonitoringRule, TargetClass};
///
/// let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
///     .condition("METRIC > 200")
///     .target("vm1", TargetClass::Vm)
///     .output_metric("HighResponseTime")
///     .build();
/// assert!(!rule.is_grouped());
/// ```
#[derive(Debug, Clone)]
pub struct MonitoringRuleBuilder {
    rule: MonitoringRule,
}

impl MonitoringRuleBuilder {
    /// Sets the condition template.
    #[must_use]
    pub fn condition(mut self, template: impl Into<String>) -> Self {
        self.rule.condition = Some(template.into());
        self
    }

    /// Groups the output by `grouping_class` under `function`.
    #[must_use]
    pub fn aggregation(mut self, function: impl Into<String>, grouping_class: TargetClass) -> Self {
        self.rule.metric_aggregation = Some(MetricAggregation {
            aggregate_function: function.into(),
            grouping_category_name: grouping_class,
            parameters: Vec::new(),
        });
        self
    }

    /// Adds a named parameter to the aggregation. Must follow
    /// [`aggregation`](Self::aggregation); ignored otherwise.
    #[must_use]
    pub fn aggregation_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(aggregation) = self.rule.metric_aggregation.as_mut() {
            aggregation.parameters.push(Parameter {
                name: name.into(),
                value: value.into(),
            });
        }
        self
    }

    /// Adds a monitored target.
    #[must_use]
    pub fn target(mut self, id: impl Into<String>, class: TargetClass) -> Self {
        self.rule.monitored_targets.push(MonitoredTarget {
            id: id.into(),
            class,
        });
        self
    }

    /// Adds an arbitrary action.
    #[must_use]
    pub fn action(mut self, name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        self.rule.actions.push(Action {
            name: name.into(),
            parameters,
        });
        self
    }

    /// Adds the standard `OutputMetric` action emitting `metric_name`.
    #[must_use]
    pub fn output_metric(self, metric_name: impl Into<String>) -> Self {
        self.action(
            "OutputMetric",
            vec![Parameter {
                name: "name".to_string(),
                value: metric_name.into(),
            }],
        )
    }

    /// Finishes the rule.
    #[must_use]
    pub fn build(self) -> MonitoringRule {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_rule() -> MonitoringRule {
        MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .condition("METRIC > 200")
            .target("vm1", TargetClass::Vm)
            .output_metric("HighResponseTime")
            .build()
    }

    #[test]
    fn single_target_accepts_exactly_one() {
        let rule = base_rule();
        assert_eq!(rule.single_target().unwrap().id, "vm1");
    }

    #[test]
    fn single_target_rejects_zero_and_many() {
        let none = MonitoringRule::builder("R1", "ResponseTime", 60, 10).build();
        assert!(matches!(
            none.single_target(),
            Err(UnsupportedFeatureError::TargetCardinality { count: 0 })
        ));

        let two = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .target("vm1", TargetClass::Vm)
            .target("vm2", TargetClass::Vm)
            .build();
        assert!(matches!(
            two.single_target(),
            Err(UnsupportedFeatureError::TargetCardinality { count: 2 })
        ));
    }

    #[test]
    fn grouping_class_follows_aggregation() {
        let rule = base_rule();
        assert_eq!(rule.grouping_class(), None);

        let grouped = MonitoringRule::builder("R2", "ResponseTime", 60, 10)
            .aggregation("AVG", TargetClass::CloudProvider)
            .target("vm1", TargetClass::Vm)
            .build();
        assert!(grouped.is_grouped());
        assert_eq!(grouped.grouping_class(), Some(TargetClass::CloudProvider));
    }

    #[test]
    fn rule_json_round_trips_in_camel_case() {
        let rule = base_rule();
        let json = serde_json::to_string(&rule).unwrap();
        assert!(json.contains("\"metricName\""));
        assert!(json.contains("\"timeWindow\""));
        assert!(json.contains("\"monitoredTargets\""));
        assert!(json.contains("\"VM\""));

        let back: MonitoringRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rule);
    }
}
