//! Shared scaffolding for the cutting-and-packing solver core: id types, the
//! declared-objective total order, the bounded solution pool, error kinds,
//! and the cooperative-cancellation timer. Every variant crate
//! (`packing-onedimensional`, `packing-boxstacks`, ...) and the
//! variant-agnostic `packing-search`/`packing-heuristics`/
//! `packing-orchestrator` crates build on these.

pub mod error;
pub mod ids;
pub mod objective;
pub mod pool;
pub mod timer;

pub use error::{Error, Result};
pub use ids::{BinPos, BinTypeId, Discrepancy, DefectId, GroupId, ItemPos, ItemTypeId, StackId};
pub use objective::{better, compare, Objective, SolutionAggregates};
pub use pool::SolutionPool;
pub use timer::Timer;
