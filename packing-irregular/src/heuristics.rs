//! [`PackingProblem`] adapter wiring the irregular-shape variant into the
//! variant-agnostic meta-heuristics of `packing-heuristics` (spec §4.9). See
//! `packing_onedimensional::heuristics` for the shared design.

use std::sync::Arc;

use packing_core::{BinTypeId, ItemTypeId, Objective, Timer};
use packing_heuristics::PackingProblem;
use packing_search::{BeamSearchParams, GuideKind};

use crate::instance::{BinType, Instance, InstanceBuilder, ItemType, Point, Polygon};
use crate::solution::Solution;

const PROFIT_SCALE: f64 = 1_000.0;

fn subproblem_params() -> BeamSearchParams {
    BeamSearchParams::escalating(4, 32, 2.0)
}

pub struct IrregularProblem {
    instance: Arc<Instance>,
}

impl IrregularProblem {
    pub fn new(instance: Arc<Instance>) -> Self {
        IrregularProblem { instance }
    }
}

impl PackingProblem for IrregularProblem {
    type Solution = Solution;

    fn number_of_item_types(&self) -> usize {
        self.instance.number_of_item_types()
    }

    fn number_of_bin_types(&self) -> usize {
        self.instance.number_of_bin_types()
    }

    fn item_profit(&self, item_type_id: usize) -> i64 {
        self.instance.item_type(ItemTypeId::from(item_type_id)).profit
    }

    fn item_space(&self, item_type_id: usize) -> i64 {
        self.instance.item_type(ItemTypeId::from(item_type_id)).space()
    }

    fn item_demand(&self, item_type_id: usize) -> u32 {
        self.instance.item_type(ItemTypeId::from(item_type_id)).copies
    }

    fn bin_cost(&self, bin_type_id: usize) -> i64 {
        self.instance.bin_type(BinTypeId::from(bin_type_id)).cost
    }

    fn bin_space(&self, bin_type_id: usize) -> i64 {
        self.instance.bin_type(BinTypeId::from(bin_type_id)).area()
    }

    fn bin_copies(&self, bin_type_id: usize) -> u32 {
        self.instance.bin_type(BinTypeId::from(bin_type_id)).copies
    }

    fn bin_copies_min(&self, bin_type_id: usize) -> u32 {
        self.instance.bin_type(BinTypeId::from(bin_type_id)).copies_min
    }

    fn empty_solution(&self) -> Solution {
        Solution::new(self.instance.clone())
    }

    fn solve_single_bin_knapsack(
        &self,
        bin_type_id: usize,
        profits: &[f64],
        demand_cap: &[u32],
        timer: &Timer,
    ) -> Solution {
        let bin_type = self.instance.bin_type(BinTypeId::from(bin_type_id)).clone();
        let bin_box = bin_type.bounding_box();

        let mut builder = InstanceBuilder::new(Objective::Knapsack);
        for (id, item_type) in self.instance.item_types() {
            let mut item = item_type.clone();
            item.profit = (profits[id.index()] * PROFIT_SCALE).round() as i64;
            let cap = demand_cap[id.index()].min(item_type.copies);
            if cap == 0 {
                // Keep the item type present (ids line up 1:1 with the
                // parent instance below) but too large for this one bin,
                // regardless of which rotation the branching scheme tries.
                let over_w = (bin_box.width + 1) as f64;
                let over_h = (bin_box.height + 1) as f64;
                item.shape = Polygon::from_points(vec![
                    Point { x: 0.0, y: 0.0 },
                    Point { x: over_w, y: 0.0 },
                    Point { x: over_w, y: over_h },
                    Point { x: 0.0, y: over_h },
                ]);
                item.copies = 1;
            } else {
                item.copies = cap;
            }
            builder
                .add_item_type(item)
                .expect("item type copied from a valid instance stays valid");
        }
        builder
            .add_bin_type(BinType {
                copies: 1,
                copies_min: 0,
                ..bin_type
            })
            .expect("bin type copied from a valid instance stays valid");
        let restricted = Arc::new(
            builder
                .build()
                .expect("a single bin type and the full item list always build"),
        );

        let pool = crate::solve(restricted, GuideKind::FillRatio, &subproblem_params(), timer);
        pool.best().cloned().unwrap_or_else(|| self.empty_solution())
    }

    fn solve_bin_packing(&self, bin_counts: &[u32], timer: &Timer) -> Option<Solution> {
        let mut builder = InstanceBuilder::new(Objective::BinPacking);
        for (_, item_type) in self.instance.item_types() {
            builder
                .add_item_type(item_type.clone())
                .expect("item type copied from a valid instance stays valid");
        }

        let mut any_bin = false;
        for (id, bin_type) in self.instance.bin_types() {
            let copies = bin_counts[id.index()];
            if copies == 0 {
                continue;
            }
            any_bin = true;
            builder
                .add_bin_type(BinType {
                    copies,
                    copies_min: 0,
                    ..bin_type.clone()
                })
                .expect("bin type copied from a valid instance stays valid");
        }
        if !any_bin {
            return None;
        }

        let restricted = Arc::new(
            builder
                .build()
                .expect("the pinned bin multiset and the full item list always build"),
        );
        let pool = crate::solve(restricted, GuideKind::FillRatio, &subproblem_params(), timer);
        pool.best().filter(|solution| solution.full()).cloned()
    }

    fn solution_item_counts(&self, solution: &Solution) -> Vec<u32> {
        (0..self.instance.number_of_item_types())
            .map(|i| solution.item_copies(ItemTypeId::from(i)))
            .collect()
    }

    fn append_pattern(&self, solution: &mut Solution, pattern: &Solution, bin_type_id: usize, copies: u32) {
        let bin_map = [BinTypeId::from(bin_type_id)];
        let item_map: Vec<ItemTypeId> = (0..self.instance.number_of_item_types()).map(ItemTypeId::from).collect();
        solution
            .append(pattern, 0, copies, &bin_map, &item_map)
            .expect("a single-bin pattern from solve_single_bin_knapsack has exactly one bin at position 0");
    }

    fn solve_tree_search(&self, timer: &Timer) -> Option<Solution> {
        let pool = crate::solve(self.instance.clone(), GuideKind::FillRatio, &subproblem_params(), timer);
        pool.best().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packing_core::{SolutionAggregates, Timer};

    use crate::instance::Rotation;

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
    fn solve_single_bin_knapsack_respects_demand_cap() {
        let problem = IrregularProblem::new(knapsack_instance());
        let timer = Timer::unlimited();
        let profits = vec![12.0];
        let demand_cap = vec![0];
        let pattern = problem.solve_single_bin_knapsack(0, &profits, &demand_cap, &timer);
        assert_eq!(pattern.profit(), 0);
    }

    #[test]
    fn solve_tree_search_packs_the_single_bin() {
        let problem = IrregularProblem::new(knapsack_instance());
        let timer = Timer::unlimited();
        let solution = problem.solve_tree_search(&timer).expect("single bin knapsack solves directly");
        assert!(solution.profit() > 0);
    }
}
