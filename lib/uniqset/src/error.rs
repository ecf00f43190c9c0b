use std::io;

use thiserror::Error;

/// Failure of a single reducer invocation. Either variant aborts the invocation
/// without emitting anything; retrying is the caller's decision.
#[derive(Debug, Error)]
pub enum ReduceError {
    #[error("reading grouped values failed")]
    Input(#[source] io::Error),
    #[error("emitting output record failed")]
    Emit(#[source] io::Error),
}

impl ReduceError {
    pub fn is_input(&self) -> bool {
        matches!(self, ReduceError::Input(_))
    }

    pub fn is_emit(&self) -> bool {
        matches!(self, ReduceError::Emit(_))
    }
}
