//! Rectangle guillotine-cutting variant (spec §4.3): axis-aligned
//! rectangles restricted to guillotine cuts (a straight cut must traverse
//! the whole board). Grounded on
//! `packingsolver/include/packingsolver/rectangleguillotine/instance.hpp`.

pub mod branching_scheme;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use branching_scheme::{Node, RectangleGuillotineBranchingScheme};
pub use heuristics::RectangleGuillotineProblem;
pub use instance::{BinType, CutOrientation, Instance, InstanceBuilder, ItemType, Parameters, Rectangle, INFINITE_COPIES};
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
    let scheme = RectangleGuillotineBranchingScheme::new(instance, guide_kind);
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
    fn packs_items_into_strips_without_exceeding_bin() {
        let instance = knapsack_instance();
        let params = BeamSearchParams::escalating(8, 64, 2.0);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        assert!(best.profit() > 0);
        assert!(best.x_max() <= 10);
        assert!(best.y_max() <= 6);
    }

    /// Third stage: two items narrower than the strip share one shelf,
    /// separated by a cut parallel to the first-stage cuts.
    #[test]
    fn third_stage_packs_two_items_side_by_side_in_one_shelf() {
        let mut b = InstanceBuilder::new(Objective::BinPacking).set_parameters(Parameters {
            first_stage_orientation: CutOrientation::Vertical,
            minimum_waste_length: 0,
            cut_thickness: 0,
        });
        b.add_item_type(ItemType {
            rect: Rectangle { x: 2, y: 5 },
            profit: 1,
            copies: 2,
            group_id: 0,
            oriented: false,
            weight: 0.0,
        })
        .unwrap();
        b.add_bin_type(BinType {
            rect: Rectangle { x: 4, y: 5 },
            cost: 1,
            copies: 1,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
        })
        .unwrap();
        let instance = Arc::new(b.build().unwrap());
        let params = BeamSearchParams::escalating(4, 32, 2.0);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        // both 2x5 items fit side by side within the bin's single 4-wide,
        // 5-tall strip — a single shelf, split by a third-stage cut.
        assert_eq!(best.item_copies(packing_core::ItemTypeId::from(0usize)), 2);
        assert_eq!(best.number_of_bins(), 1);
    }

    #[test]
    fn respects_cut_thickness_between_strips() {
        let mut b = InstanceBuilder::new(Objective::BinPacking)
            .set_parameters(Parameters {
                first_stage_orientation: CutOrientation::Vertical,
                minimum_waste_length: 0,
                cut_thickness: 1,
            });
        b.add_item_type(ItemType {
            rect: Rectangle { x: 5, y: 5 },
            profit: 1,
            copies: 2,
            group_id: 0,
            oriented: false,
            weight: 0.0,
        })
        .unwrap();
        b.add_bin_type(BinType {
            rect: Rectangle { x: 10, y: 5 },
            cost: 1,
            copies: 1,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
        })
        .unwrap();
        let instance = Arc::new(b.build().unwrap());
        let params = BeamSearchParams::escalating(4, 32, 2.0);
        let timer = Timer::unlimited();
        let pool = solve(instance, GuideKind::FillRatio, &params, &timer);
        let best = pool.best().expect("beam search should find a solution");
        // a single 10-wide bin cannot fit two 5-wide items plus a 1-thick
        // saw cut between them, so only one item type 0 fits per strip run
        assert!(best.item_copies(packing_core::ItemTypeId::from(0usize)) <= 1);
    }
}
