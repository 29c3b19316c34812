//! Ties the variant-agnostic tree-search engine (`packing-search`) and
//! meta-heuristics (`packing-heuristics`) together into one entry point,
//! `optimize`, that picks and races algorithms per spec §4.9, and one
//! shared progress sink, `AlgorithmFormatter`, per spec §4.10.

pub mod algorithm_formatter;
pub mod optimize;

pub use algorithm_formatter::AlgorithmFormatter;
pub use optimize::{optimize, OptimizeParams, SharedResourcePolicy};
