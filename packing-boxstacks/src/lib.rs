//! Box-stacks cutting-and-packing variant (spec §4.3): 3D items form
//! vertical stacks inside bins, constrained by weight, stackability and
//! (simplified) axle limits. Grounded on
//! `packingsolver/include/packingsolver/boxstacks/instance.hpp` and
//! `packingsolver/boxstacks/solution.cpp`.

pub mod branching_scheme;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use branching_scheme::{BoxStacksBranchingScheme, Node};
pub use heuristics::BoxStacksProblem;
pub use instance::{BinType, Box3, Instance, InstanceBuilder, ItemType, Parameters, INFINITE_COPIES};
pub use solution::{Solution, SolutionBin, SolutionItem, SolutionStack};

use std::sync::Arc;

use packing_core::{SolutionPool, Timer};
use packing_search::{beam_search, BeamSearchParams, BranchingScheme as _, GuideKind};

/// Runs iterative beam search on the given instance, returning the best
/// solutions found within `timer`'s budget (spec §4.4).
pub fn solve(
    instance: Arc<Instance>,
    guide_kind: GuideKind,
    params: &BeamSearchParams,
    timer: &Timer,
) -> SolutionPool<Solution> {
    tracing::debug!(
        item_types = instance.number_of_item_types(),
        bin_types = instance.number_of_bin_types(),
        "starting beam search"
    );
    let scheme = BoxStacksBranchingScheme::new(instance, guide_kind);
    beam_search(&scheme, params, timer, |_solution| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::Objective;

    fn vbpp_cube_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::VariableSizedBinPacking);
        b.add_item_type(ItemType {
            shape: Box3 { x: 1, y: 1, z: 1 },
            profit: 1,
            copies: 10,
            group_id: 0,
            rotations: 1,
            weight: 0.0,
            stackability_id: 0,
            nesting_height: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_above: f64::INFINITY,
        })
        .unwrap();
        b.add_bin_type(BinType {
            shape: Box3 { x: 10, y: 10, z: 10 },
            cost: 1,
            copies: 10,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
            maximum_stack_density: f64::INFINITY,
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    /// Concrete scenario 2 of spec §8 via the full solver: item
    /// `{1x1x1,copies=10}`, bin `{10x10x10,copies=10}`, VBPP — packs all 10
    /// items in a single bin, cost 1.
    #[test]
    fn scenario_box_stacks_bin_copies_via_solve() {
        let instance = vbpp_cube_instance();
        let params = BeamSearchParams::escalating(4, 32, 2.0).with_pool_capacity(1);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        assert_eq!(best.cost(), 1);
        assert_eq!(best.number_of_bins(), 1);
    }
}
