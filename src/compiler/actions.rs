//! Action dispatch.
//!
//! Actions are dispatched through [`ACTION_TABLE`]; a new action is a new
//! row, not a new branch. Only `OutputMetric` is implemented; it shapes
//! the outer projection and the CONSTRUCT template. Every other declared
//! action name is an explicit unsupported-feature rejection, never a
//! silent skip.

use crate::error::{QueryBuildError, UnsupportedFeatureError, VigilError};
use crate::query::{GraphPattern, QueryVariable};
use crate::rule::{Action, MonitoringRule};
use crate::vocab;

use super::{output_target, output_value};

/// What an action contributes to the compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEffect {
    /// Outer projection the action requires, in order.
    pub required_vars: Vec<QueryVariable>,
    /// CONSTRUCT template emitting the action's output.
    pub construct: GraphPattern,
}

type ActionHandler = fn(&MonitoringRule, &Action, bool) -> Result<ActionEffect, VigilError>;

/// The single extensibility point for actions.
const ACTION_TABLE: &[(&str, ActionHandler)] = &[("OutputMetric", output_metric)];

/// Applies the rule's actions, producing the combined effect.
pub fn apply(rule: &MonitoringRule, sda_required: bool) -> Result<ActionEffect, VigilError> {
    let mut effect = None;
    for action in &rule.actions {
        let handler = ACTION_TABLE
            .iter()
            .find(|(name, _)| *name == action.name)
            .map(|(_, handler)| handler)
            .ok_or_else(|| UnsupportedFeatureError::Action {
                name: action.name.clone(),
            })?;
        effect = Some(handler(rule, action, sda_required)?);
    }
    effect.ok_or_else(|| {
        QueryBuildError::MalformedQuery {
            reason: format!("rule {} declares no actions", rule.id),
        }
        .into()
    })
}

/// Emits the rule's output as a new metric datum.
fn output_metric(
    rule: &MonitoringRule,
    action: &Action,
    sda_required: bool,
) -> Result<ActionEffect, VigilError> {
    let metric_name = action
        .parameter("name")
        .ok_or_else(|| QueryBuildError::MalformedQuery {
            reason: format!("OutputMetric action of rule {} has no 'name' parameter", rule.id),
        })?;

    let target = output_target(rule)?;
    let value = output_value(rule, sda_required);

    let mut construct = GraphPattern::new();
    construct
        .add("[]", vocab::METRIC, vocab::metric_term(metric_name))
        .add("[]", vocab::ABOUT_RESOURCE, target.to_string())
        .add("[]", vocab::VALUE, value.to_string())
        .add("[]", vocab::TIMESTAMP, QueryVariable::Timestamp.to_string());

    Ok(ActionEffect {
        required_vars: vec![target, value, QueryVariable::Timestamp],
        construct,
    })
}
