//! Variant-agnostic tree-search engine: the `BranchingScheme` interface
//! (spec §4.3) and iterative beam search v2 (spec §4.4). Every variant crate
//! implements `BranchingScheme` for its own node/solution types; this crate
//! never knows about rectangles, stacks, or polygons.

pub mod beam_search;
pub mod branching_scheme;
pub mod node_id;

pub use beam_search::{beam_search, BeamSearchParams};
pub use branching_scheme::{BranchingScheme, GuideKind};
pub use node_id::NodeIdGenerator;
