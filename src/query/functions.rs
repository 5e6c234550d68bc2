//! Aggregate-function signatures.
//!
//! Each function the engine supports declares its ordered parameter slots.
//! The compiler fills the input-variable slot itself; every other slot is
//! filled from the rule's aggregation parameters, matched by name. Slot
//! position is fixed by the signature, not by the order the rule lists
//! parameters in.

use crate::error::QueryBuildError;
use crate::query::variables::QueryVariable;
use crate::rule::Parameter;

/// Name of the slot the compiler fills with the input variable.
pub const INPUT_VARIABLE: &str = "inputVariable";

/// Signature of an aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSignature {
    /// Function name as written in rules and query text.
    pub name: &'static str,
    /// Ordered parameter slot names.
    pub parameters: &'static [&'static str],
}

const SIGNATURES: &[AggregateSignature] = &[
    AggregateSignature {
        name: "AVG",
        parameters: &[INPUT_VARIABLE],
    },
    AggregateSignature {
        name: "SUM",
        parameters: &[INPUT_VARIABLE],
    },
    AggregateSignature {
        name: "MIN",
        parameters: &[INPUT_VARIABLE],
    },
    AggregateSignature {
        name: "MAX",
        parameters: &[INPUT_VARIABLE],
    },
    AggregateSignature {
        name: "COUNT",
        parameters: &[INPUT_VARIABLE],
    },
    AggregateSignature {
        name: "PERCENTILE",
        parameters: &[INPUT_VARIABLE, "percentile"],
    },
];

/// Looks up a function signature by name.
pub fn signature(name: &str) -> Result<&'static AggregateSignature, QueryBuildError> {
    SIGNATURES
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| QueryBuildError::UnknownAggregateFunction {
            name: name.to_string(),
        })
}

impl AggregateSignature {
    /// Resolves the argument list for a call.
    ///
    /// `input` fills the input-variable slot; `parameters` fill the rest by
    /// name. Unknown names and unfilled slots are build errors.
    pub fn arguments(
        &self,
        input: &QueryVariable,
        parameters: &[Parameter],
    ) -> Result<Vec<String>, QueryBuildError> {
        let mut slots: Vec<Option<String>> = vec![None; self.parameters.len()];

        let input_idx = self
            .parameters
            .iter()
            .position(|p| *p == INPUT_VARIABLE)
            .ok_or_else(|| QueryBuildError::MissingAggregationParameter {
                function: self.name.to_string(),
                parameter: INPUT_VARIABLE.to_string(),
            })?;
        slots[input_idx] = Some(input.to_string());

        for parameter in parameters {
            let idx = self
                .parameters
                .iter()
                .position(|p| *p == parameter.name)
                .ok_or_else(|| QueryBuildError::UnknownAggregationParameter {
                    function: self.name.to_string(),
                    parameter: parameter.name.clone(),
                })?;
            slots[idx] = Some(parameter.value.clone());
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| QueryBuildError::MissingAggregationParameter {
                    function: self.name.to_string(),
                    parameter: self.parameters[idx].to_string(),
                })
            })
            .collect()
    }
}
