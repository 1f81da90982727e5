//! Pipeline validation.
//!
//! [`validate`] is the only way to obtain a [`Pipeline`]. It binds every
//! stage against the catalog schema, then checks the stage order:
//!
//! 1. no stage kind appears twice,
//! 2. Crop, if selected, is the first stage,
//! 3. every [`OrderingConstraint`](crate::catalog::OrderingConstraint)
//!    holds (Contours requires an earlier Threshold).
//!
//! All other permutations of the reorderable stages are legal.

use tracing::debug;

use crate::catalog::{self, ORDERING_CONSTRAINTS};
use crate::stage::{StageInstance, StageKind};
use crate::types::{Pipeline, PipelineConfig, PipelineError};

/// Validate a configuration and bind its parameters.
///
/// Pure: the same configuration always produces the same result.
///
/// # Errors
///
/// Returns the first problem found: a parameter error from
/// [`catalog::instantiate`] (checked stage by stage, in pipeline order),
/// then [`PipelineError::DuplicateStage`] or
/// [`PipelineError::OrderingViolation`] from [`check_order`].
pub fn validate(config: &PipelineConfig) -> Result<Pipeline, PipelineError> {
    let stages = config
        .stages
        .iter()
        .map(catalog::instantiate)
        .collect::<Result<Vec<_>, _>>()?;

    let kinds: Vec<StageKind> = stages.iter().map(StageInstance::kind).collect();
    check_order(&kinds)?;

    debug!(stages = ?kinds, "pipeline validated");
    Ok(Pipeline::new(stages))
}

/// Check a sequence of stage kinds against the ordering rules.
///
/// # Errors
///
/// Returns [`PipelineError::DuplicateStage`] for a repeated kind, and
/// [`PipelineError::OrderingViolation`] when Crop is not first or a
/// catalog constraint fails.
pub fn check_order(kinds: &[StageKind]) -> Result<(), PipelineError> {
    for (index, kind) in kinds.iter().enumerate() {
        if kinds[..index].contains(kind) {
            return Err(PipelineError::DuplicateStage(*kind));
        }
    }

    if let Some(index) = kinds.iter().position(|kind| kind.is_fixed_first())
        && index != 0
    {
        return Err(PipelineError::OrderingViolation {
            stage: kinds[index],
            other: kinds[0],
            reason: format!(
                "{} must be the first stage; it always operates on the untouched source frame",
                kinds[index]
            ),
        });
    }

    for constraint in ORDERING_CONSTRAINTS {
        constraint.check(kinds)?;
    }

    Ok(())
}
