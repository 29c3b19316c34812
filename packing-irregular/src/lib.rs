//! Irregular-shape cutting-and-packing variant (spec §4.3): arbitrary
//! polygons and circular arcs, with placement legality decided at
//! axis-aligned bounding-box resolution (spec §1 Non-goals exclude
//! per-variant geometric intersection primitives; see `instance` module
//! docs). Grounded on
//! `packingsolver/include/packingsolver/irregular/instance.hpp`.

pub mod branching_scheme;
pub mod heuristics;
pub mod instance;
pub mod solution;

pub use branching_scheme::{IrregularBranchingScheme, Node};
pub use heuristics::IrregularProblem;
pub use instance::{
    BinType, BoundingBox, Edge, Instance, InstanceBuilder, ItemType, Parameters, Point, Polygon, Rotation,
    INFINITE_COPIES,
};
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
    let scheme = IrregularBranchingScheme::new(instance, guide_kind);
    beam_search(&scheme, params, timer, |_solution| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::Objective;

    fn knapsack_instance() -> Arc<Instance> {
        let mut b = InstanceBuilder::new(Objective::Knapsack);
        b.add_item_type(ItemType {
            shape: Polygon::from_points(vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 4.0, y: 0.0 },
                Point { x: 4.0, y: 3.0 },
                Point { x: 0.0, y: 3.0 },
            ]),
            profit: 12,
            copies: 4,
            group_id: 0,
            allowed_rotations: vec![Rotation::Deg0, Rotation::Deg90],
            weight: 0.0,
        })
        .unwrap();
        b.add_bin_type(BinType {
            shape: Polygon::from_points(vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 10.0, y: 0.0 },
                Point { x: 10.0, y: 6.0 },
                Point { x: 0.0, y: 6.0 },
            ]),
            cost: 1,
            copies: 1,
            copies_min: 0,
            maximum_weight: f64::INFINITY,
        })
        .unwrap();
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn packs_polygons_into_shelves_without_exceeding_bin() {
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
