//! Rectangle cutting-and-packing variant (spec §4.3): axis-aligned
//! rectangles, optional defects and 90° rotation. Grounded on
//! `packingsolver/include/packingsolver/rectangle/instance.hpp`.

pub mod branching_scheme;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use branching_scheme::{Node, RectangleBranchingScheme};
pub use heuristics::RectangleProblem;
pub use instance::{rect_intersection, BinType, Defect, Instance, InstanceBuilder, ItemType, Parameters, Rectangle, INFINITE_COPIES};
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
    let scheme = RectangleBranchingScheme::new(instance, guide_kind);
    beam_search(&scheme, params, timer, |_solution| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::Objective;

    fn knapsack_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::Knapsack);
        b.add_item_type(ItemType {
            rect: Rectangle { x: 4, y: 3 },
            profit: 12,
            copies: 4,
            group_id: 0,
            oriented: false,
            weight: 0.0,
        })
        .unwrap();
        b.add_bin_type(BinType {
            rect: Rectangle { x: 10, y: 6 },
            cost: 1,
            copies: 1,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn packs_items_into_shelves_without_exceeding_bin() {
        let instance = knapsack_instance();
        let params = BeamSearchParams::escalating(8, 64, 2.0);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        assert!(best.profit() > 0);
        assert!(best.x_max() <= 10);
        assert!(best.y_max() <= 6);
    }
}
