use crate::Objective;

/// Surface error kinds for the whole workspace (spec §7).
///
/// `Infeasible` and `Timeout` are deliberately *not* variants here: spec §7
/// classifies both as data, not errors. An axle-weight- or
/// stackability-infeasible [`Solution`](crate::Solution) is a value that the
/// sequential-value-correction repair step consumes; a timeout is the
/// ordinary way a worker stops and is observed through
/// [`Timer::needs_to_end`](crate::Timer::needs_to_end).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing required column, illegal flag combination, non-positive
    /// length/weight, `copies_min > copies`, etc.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A `Solution` was asked for an operation that does not apply to its
    /// current state (e.g. `add_item` outside of the last added bin, an
    /// orientation not in the item's allowed mask, a stack/item geometry
    /// mismatch).
    #[error("illegal state transition: {0}")]
    IllegalStateTransition(String),

    /// The requested objective has no total order defined for this variant.
    #[error("objective {objective:?} is not supported by this variant")]
    UnsupportedObjective { objective: Objective },

    /// Column generation was requested but no LP backend is compiled in.
    #[error("no LP solver backend is available")]
    UnavailableSolver,
}

pub type Result<T> = std::result::Result<T, Error>;
