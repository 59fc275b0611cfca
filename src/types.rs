//! Common type definitions.
//!
//! - [`Role`]: whether a worker's task generates values or consumes them from a supply

/// What a worker's task does with its input, fixed when the task is created.
///
/// The role is the task's arity: a source takes no value and can never be
/// given a supply, a sink takes one value and needs a supply before it can work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Produces values without pulling (arity 0).
    Source,

    /// Receives one upstream value per call (arity 1).
    Sink,
}

impl Role {
    /// Number of values the task accepts.
    #[inline]
    pub fn arity(self) -> usize {
        match self {
            Self::Source => 0,
            Self::Sink => 1,
        }
    }

    /// Returns true if the task needs a value from a supply.
    #[inline]
    pub fn accepts_value(self) -> bool {
        self.arity() > 0
    }
}
