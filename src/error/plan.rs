//! Plan execution errors

use super::BerthError;

/// Attach the failing step to an error
pub fn step_failed(index: usize, label: impl Into<String>, source: BerthError) -> BerthError {
    BerthError::StepFailed {
        index,
        label: label.into(),
        source: Box::new(source),
    }
}
