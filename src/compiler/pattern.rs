//! Class-dependent graph-pattern construction.
//!
//! The base pattern links the metric datum to its metric, target and value,
//! and the target to its literal identifier. Everything class-specific is a
//! row in [`PATTERN_TABLE`]: supporting a new (target class, grouping
//! class) combination means adding a row, not editing control flow.

use crate::error::UnsupportedFeatureError;
use crate::query::{GraphPattern, QueryVariable};
use crate::rule::{MonitoringRule, TargetClass};
use crate::vocab;

type PatternExtension = fn(&mut GraphPattern, &MonitoringRule);

/// One supported (target class, grouping class) combination.
struct PatternRow {
    target_class: TargetClass,
    grouping_class: Option<TargetClass>,
    extend: PatternExtension,
}

/// The single extensibility point for target classes.
const PATTERN_TABLE: &[PatternRow] = &[
    PatternRow {
        target_class: TargetClass::Vm,
        grouping_class: None,
        extend: extend_vm,
    },
    PatternRow {
        target_class: TargetClass::Vm,
        grouping_class: Some(TargetClass::Vm),
        extend: extend_vm,
    },
    PatternRow {
        target_class: TargetClass::Vm,
        grouping_class: Some(TargetClass::CloudProvider),
        extend: extend_vm_by_cloud_provider,
    },
];

fn extend_vm(graph: &mut GraphPattern, _rule: &MonitoringRule) {
    graph.add(QueryVariable::Target.to_string(), vocab::RDF_TYPE, TargetClass::Vm.term());
}

fn extend_vm_by_cloud_provider(graph: &mut GraphPattern, rule: &MonitoringRule) {
    extend_vm(graph, rule);
    graph.add(
        QueryVariable::Target.to_string(),
        vocab::CLOUD_PROVIDER,
        QueryVariable::grouping(TargetClass::CloudProvider, TargetClass::Vm).to_string(),
    );
}

/// Builds the triple pattern for a rule's single monitored target.
pub fn build(rule: &MonitoringRule) -> Result<GraphPattern, UnsupportedFeatureError> {
    let target = rule.single_target()?;
    let grouping_class = rule.grouping_class();

    let row = PATTERN_TABLE
        .iter()
        .find(|row| row.target_class == target.class && row.grouping_class == grouping_class)
        .ok_or_else(|| {
            // Distinguish "class unknown" from "class known, grouping not".
            let class_known = PATTERN_TABLE.iter().any(|row| row.target_class == target.class);
            match grouping_class {
                Some(grouping) if class_known => UnsupportedFeatureError::GroupingClass {
                    target_class: target.class,
                    grouping_class: grouping,
                },
                _ => UnsupportedFeatureError::TargetClass {
                    class: target.class,
                },
            }
        })?;

    let mut graph = GraphPattern::new();
    let datum = QueryVariable::Datum.to_string();
    let target_var = QueryVariable::Target.to_string();
    graph
        .add(datum.clone(), vocab::METRIC, vocab::metric_term(&rule.metric_name))
        .add(datum.clone(), vocab::ABOUT_RESOURCE, target_var.clone())
        .add(datum, vocab::VALUE, QueryVariable::Input.to_string())
        .add(target_var, vocab::ID, format!("\"{}\"", target.id));
    (row.extend)(&mut graph, rule);

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::MonitoringRule;

    fn vm_rule() -> MonitoringRule {
        MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .target("vm1", TargetClass::Vm)
            .build()
    }

    #[test]
    fn base_pattern_links_datum_and_target() {
        let graph = build(&vm_rule()).unwrap();
        let text = graph.render("");
        assert!(text.contains("?datum mo:metric mo:ResponseTime"));
        assert!(text.contains("mo:aboutResource ?target"));
        assert!(text.contains("mo:value ?input"));
        assert!(text.contains("?target mo:id \"vm1\""));
        assert!(text.contains("rdf:type mo:VM"));
        assert!(!text.contains("mo:cloudProvider"));
    }

    #[test]
    fn grouping_by_same_class_adds_no_extra_triple() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .aggregation("AVG", TargetClass::Vm)
            .target("vm1", TargetClass::Vm)
            .build();
        let grouped = build(&rule).unwrap();
        let ungrouped = build(&vm_rule()).unwrap();
        assert_eq!(grouped, ungrouped);
    }

    #[test]
    fn grouping_by_cloud_provider_links_the_provider_variable() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .aggregation("AVG", TargetClass::CloudProvider)
            .target("vm1", TargetClass::Vm)
            .build();
        let text = build(&rule).unwrap().render("");
        assert!(text.contains("mo:cloudProvider ?CloudProvider"));
    }

    #[test]
    fn unsupported_combination_is_rejected() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10)
            .target("provider1", TargetClass::CloudProvider)
            .build();
        assert!(matches!(
            build(&rule),
            Err(UnsupportedFeatureError::TargetClass {
                class: TargetClass::CloudProvider
            })
        ));
    }

    #[test]
    fn zero_targets_fail_on_cardinality() {
        let rule = MonitoringRule::builder("R1", "ResponseTime", 60, 10).build();
        assert!(matches!(
            build(&rule),
            Err(UnsupportedFeatureError::TargetCardinality { count: 0 })
        ));
    }
}
