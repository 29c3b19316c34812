//! [`PackingProblem`] adapter wiring the rectangle variant into the
//! variant-agnostic meta-heuristics of `packing-heuristics` (spec §4.9). See
//! `packing_onedimensional::heuristics` for the shared design.

use std::sync::Arc;

use packing_core::{BinTypeId, ItemTypeId, Objective, Timer};
use packing_heuristics::PackingProblem;
use packing_search::{BeamSearchParams, GuideKind};

use crate::instance::{BinType, Defect, Instance, InstanceBuilder, ItemType};
use crate::solution::Solution;

const PROFIT_SCALE: f64 = 1_000.0;

fn subproblem_params() -> BeamSearchParams {
    BeamSearchParams::escalating(4, 32, 2.0)
}

pub struct RectangleProblem {
    instance: Arc<Instance>,
}

impl RectangleProblem {
    pub fn new(instance: Arc<Instance>) -> Self {
        RectangleProblem { instance }
    }
}

impl PackingProblem for RectangleProblem {
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
        let bin_id = BinTypeId::from(bin_type_id);
        let bin_type = self.instance.bin_type(bin_id).clone();

        let mut builder = InstanceBuilder::new(Objective::Knapsack);
        for (id, item_type) in self.instance.item_types() {
            let mut item = item_type.clone();
            item.profit = (profits[id.index()] * PROFIT_SCALE).round() as i64;
            let cap = demand_cap[id.index()].min(item_type.copies);
            if cap == 0 {
                // Keep the item type present (ids line up 1:1 with the
                // parent instance below) but too large for this one bin.
                item.rect.x = bin_type.rect.x.saturating_add(1);
                item.rect.y = bin_type.rect.y.saturating_add(1);
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
        for (_, defect) in self.instance.defects_in_bin(bin_id) {
            builder
                .add_defect(Defect {
                    bin_type_id: BinTypeId::from(0usize),
                    ..defect.clone()
                })
                .expect("defect copied from a valid instance stays valid");
        }
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

        let mut bin_map = vec![None; self.instance.number_of_bin_types()];
        for (id, bin_type) in self.instance.bin_types() {
            let copies = bin_counts[id.index()];
            if copies == 0 {
                continue;
            }
            let new_id = builder
                .add_bin_type(BinType {
                    copies,
                    copies_min: 0,
                    ..bin_type.clone()
                })
                .expect("bin type copied from a valid instance stays valid");
            bin_map[id.index()] = Some(new_id);
        }
        if bin_map.iter().all(Option::is_none) {
            return None;
        }

        for (id, _) in self.instance.bin_types() {
            let Some(new_id) = bin_map[id.index()] else { continue };
            for (_, defect) in self.instance.defects_in_bin(id) {
                builder
                    .add_defect(Defect {
                        bin_type_id: new_id,
                        ..defect.clone()
                    })
                    .expect("defect copied from a valid instance stays valid");
            }
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

    use crate::instance::Rectangle;

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
    fn solve_single_bin_knapsack_respects_demand_cap() {
        let problem = RectangleProblem::new(knapsack_instance());
        let timer = Timer::unlimited();
        let profits = vec![12.0];
        let demand_cap = vec![0];
        let pattern = problem.solve_single_bin_knapsack(0, &profits, &demand_cap, &timer);
        assert_eq!(pattern.profit(), 0);
    }

    #[test]
    fn solve_tree_search_packs_the_single_bin() {
        let problem = RectangleProblem::new(knapsack_instance());
        let timer = Timer::unlimited();
        let solution = problem.solve_tree_search(&timer).expect("single bin knapsack solves directly");
        assert!(solution.profit() > 0);
    }
}
