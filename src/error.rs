use std::fmt;

use thiserror::Error;

/// Failure type of a publisher that can never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Never {}

impl fmt::Display for Never {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl std::error::Error for Never {}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubjectError {
    /// The subject already delivered its completion; the call had no effect.
    #[error("Subject already completed")]
    Completed,
}
