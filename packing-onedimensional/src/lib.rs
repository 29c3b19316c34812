//! One-dimensional cutting-and-packing variant (spec §4.3): items and bins
//! have only a length. Grounded on
//! `packingsolver/include/packingsolver/onedimensional/instance.hpp` and
//! `packingsolver/onedimensional/branching_scheme.hpp`.

pub mod branching_scheme;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use branching_scheme::{Node, OneDimensionalBranchingScheme};
pub use heuristics::OneDimensionalProblem;
pub use instance::{BinType, Instance, InstanceBuilder, ItemType, Parameters, INFINITE_COPIES};
pub use solution::{Solution, SolutionBin, SolutionItem};

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
    let scheme = OneDimensionalBranchingScheme::new(instance, guide_kind);
    beam_search(&scheme, params, timer, |_solution| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::Objective;

    fn knapsack_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::Knapsack);
        b.add_item_type(ItemType {
            length: 3,
            profit: 3,
            copies: 4,
            weight: 0.0,
            nesting_length: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_after: f64::INFINITY,
            eligibility_id: None,
        })
        .unwrap();
        b.add_item_type(ItemType {
            length: 4,
            profit: 5,
            copies: 3,
            weight: 0.0,
            nesting_length: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_after: f64::INFINITY,
            eligibility_id: None,
        })
        .unwrap();
        b.add_bin_type(BinType {
            length: 10,
            cost: 1,
            copies: 1,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
            eligibility_ids: Vec::new(),
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    /// Concrete scenario 3 of spec §8: single-bin knapsack, bin length 10,
    /// items {length=3, profit=3, copies=4} and {length=4, profit=5,
    /// copies=3}. The optimum packs one 4 and two 3s for profit 11.
    #[test]
    fn scenario_single_bin_knapsack_reaches_optimal_profit() {
        let instance = knapsack_instance();
        let params = BeamSearchParams::escalating(8, 64, 2.0);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        assert_eq!(best.profit(), 11);
    }

    fn vbpp_bin_copies_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::VariableSizedBinPacking);
        b.add_item_type(ItemType {
            length: 1,
            profit: 1,
            copies: 10,
            weight: 0.0,
            nesting_length: 0,
            maximum_stackability: u32::MAX,
            maximum_weight_after: f64::INFINITY,
            eligibility_id: None,
        })
        .unwrap();
        b.add_bin_type(BinType {
            length: 10,
            cost: 1,
            copies: 10,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
            eligibility_ids: Vec::new(),
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    /// Concrete scenario 1 of spec §8 via the full solver: one item type
    /// `{length=1, copies=10}`, one bin type `{length=10, copies=10}`,
    /// VBPP — the full solver packs all 10 items in a single bin, cost 1.
    #[test]
    fn scenario_one_dimensional_bin_copies_via_solve() {
        let instance = vbpp_bin_copies_instance();
        let params = BeamSearchParams::escalating(4, 32, 2.0).with_pool_capacity(1);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        assert_eq!(best.cost(), 1);
        assert_eq!(best.number_of_bins(), 1);
    }
}
