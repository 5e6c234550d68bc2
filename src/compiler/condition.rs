//! Condition-template translation.

use crate::query::QueryVariable;

/// Reserved placeholder a rule condition uses for the output value.
pub const METRIC_PLACEHOLDER: &str = "METRIC";

/// Substitutes the placeholder in a condition template with the resolved
/// output-value variable.
///
/// An absent template is an explicit no-condition, not an error. No
/// validation beyond substitution happens here; template well-formedness
/// is the rule author's contract.
#[must_use]
pub fn translate(template: Option<&str>, output_value: &QueryVariable) -> Option<String> {
    template.map(|t| t.replace(METRIC_PLACEHOLDER, &output_value.to_string()))
}
