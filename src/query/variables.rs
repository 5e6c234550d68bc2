//! Query variables and outer-to-inner scope resolution.

use std::fmt;

use crate::rule::TargetClass;

/// Variables a generated query can project or match on.
///
/// Closed enumeration. `Grouping` is a named variable derived from the
/// rule's grouping class; it collapses to [`Target`](Self::Target) when the
/// grouping class equals the target class, so grouped-by-self rules never
/// project a redundant variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryVariable {
    /// The monitored resource.
    Target,
    /// The raw per-event metric value.
    Input,
    /// The aggregated output value.
    Output,
    /// The output timestamp.
    Timestamp,
    /// The per-event timestamp, derived from the datum.
    InputTimestamp,
    /// The metric datum node.
    Datum,
    /// The grouping dimension, named after its class.
    Grouping(String),
}

impl QueryVariable {
    /// The grouping variable for `grouping_class` on a rule targeting
    /// `target_class`.
    ///
    /// Equal classes collapse to [`Target`](Self::Target).
    #[must_use]
    pub fn grouping(grouping_class: TargetClass, target_class: TargetClass) -> Self {
        if grouping_class == target_class {
            Self::Target
        } else {
            Self::Grouping(grouping_class.name().to_string())
        }
    }
}

impl fmt::Display for QueryVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => f.write_str("?target"),
            Self::Input => f.write_str("?input"),
            Self::Output => f.write_str("?output"),
            Self::Timestamp => f.write_str("?timestamp"),
            Self::InputTimestamp => f.write_str("?input_timestamp"),
            Self::Datum => f.write_str("?datum"),
            Self::Grouping(name) => write!(f, "?{name}"),
        }
    }
}

/// Maps an outer (aggregated) query variable to the inner (per-event) query
/// variable it is derived from.
///
/// Only two mappings are non-identity: the aggregated output is computed
/// from the raw input, and the output timestamp from the per-event
/// timestamp. The match is exhaustive on purpose; a new variant must decide
/// its inner form here.
#[must_use]
pub fn inner_variable(outer: &QueryVariable) -> QueryVariable {
    match outer {
        QueryVariable::Output => QueryVariable::Input,
        QueryVariable::Timestamp => QueryVariable::InputTimestamp,
        QueryVariable::Target => QueryVariable::Target,
        QueryVariable::Input => QueryVariable::Input,
        QueryVariable::InputTimestamp => QueryVariable::InputTimestamp,
        QueryVariable::Datum => QueryVariable::Datum,
        QueryVariable::Grouping(name) => QueryVariable::Grouping(name.clone()),
    }
}
