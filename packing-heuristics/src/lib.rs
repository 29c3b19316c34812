//! Meta-heuristics that reduce a multi-bin-type packing problem to a
//! sequence of single-bin or restricted-multiset subproblems, each
//! delegated to the tree-search engine in `packing-search` (spec §2, §4.5
//! through §4.8). Variant-agnostic: a variant crate implements
//! [`PackingProblem`] once to make all four heuristics available to
//! `packing-orchestrator`.

pub mod column_generation;
pub mod dichotomic_search;
pub mod problem;
pub mod svc;
pub mod vbpp_to_bpp;

pub use column_generation::{column_generation, ColumnGenerationParams};
pub use dichotomic_search::{dichotomic_search, DichotomicSearchParams};
pub use problem::PackingProblem;
pub use svc::{sequential_value_correction, SvcParams};
pub use vbpp_to_bpp::vbpp_to_bpp_warm_start;

#[cfg(test)]
pub(crate) mod test_support {
    use std::cell::Cell;

    use packing_core::{Objective, SolutionAggregates, Timer};

    use crate::problem::PackingProblem;

    pub struct ToyItem {
        pub space: i64,
        pub profit: i64,
        pub demand: u32,
    }

    pub struct ToyBin {
        pub space: i64,
        pub cost: i64,
        pub copies: u32,
        pub copies_min: u32,
    }

    /// Minimal in-crate stand-in for a variant's `Instance`/`Solution`,
    /// playing the same role here that stub `SolutionAggregates`
    /// implementors play in `packing-core`'s own unit tests: just enough
    /// behavior to exercise the heuristics without depending on a full
    /// geometry-aware variant crate.
    pub struct ToyProblem {
        objective: Objective,
        items: Vec<ToyItem>,
        bins: Vec<ToyBin>,
        solve_bin_packing_calls: Cell<u32>,
    }

    impl ToyProblem {
        pub fn new(objective: Objective, items: Vec<ToyItem>, bins: Vec<ToyBin>) -> Self {
            ToyProblem {
                objective,
                items,
                bins,
                solve_bin_packing_calls: Cell::new(0),
            }
        }

        pub fn solve_bin_packing_calls(&self) -> u32 {
            self.solve_bin_packing_calls.get()
        }
    }

    #[derive(Clone, Debug, Default)]
    pub struct ToyPattern {
        pub bin_type_id: usize,
        pub copies: u32,
        pub item_counts: Vec<u32>,
    }

    #[derive(Clone, Debug)]
    pub struct ToySolution {
        objective: Objective,
        patterns: Vec<ToyPattern>,
        profit: i64,
        cost: i64,
        number_of_bins: u32,
    }

    impl SolutionAggregates for ToySolution {
        fn objective(&self) -> Objective {
            self.objective
        }
        fn profit(&self) -> i64 {
            self.profit
        }
        fn cost(&self) -> i64 {
            self.cost
        }
        fn waste(&self) -> i64 {
            0
        }
        fn is_full(&self) -> bool {
            true
        }
        fn number_of_bins(&self) -> u32 {
            self.number_of_bins
        }
        fn x_max(&self) -> i64 {
            0
        }
        fn y_max(&self) -> i64 {
            0
        }
    }

    impl PackingProblem for ToyProblem {
        type Solution = ToySolution;

        fn number_of_item_types(&self) -> usize {
            self.items.len()
        }
        fn number_of_bin_types(&self) -> usize {
            self.bins.len()
        }
        fn item_profit(&self, item_type_id: usize) -> i64 {
            self.items[item_type_id].profit
        }
        fn item_space(&self, item_type_id: usize) -> i64 {
            self.items[item_type_id].space
        }
        fn item_demand(&self, item_type_id: usize) -> u32 {
            self.items[item_type_id].demand
        }
        fn bin_cost(&self, bin_type_id: usize) -> i64 {
            self.bins[bin_type_id].cost
        }
        fn bin_space(&self, bin_type_id: usize) -> i64 {
            self.bins[bin_type_id].space
        }
        fn bin_copies(&self, bin_type_id: usize) -> u32 {
            self.bins[bin_type_id].copies
        }
        fn bin_copies_min(&self, bin_type_id: usize) -> u32 {
            self.bins[bin_type_id].copies_min
        }

        fn empty_solution(&self) -> ToySolution {
            ToySolution {
                objective: self.objective,
                patterns: Vec::new(),
                profit: 0,
                cost: 0,
                number_of_bins: 0,
            }
        }

        fn solve_single_bin_knapsack(
            &self,
            bin_type_id: usize,
            profits: &[f64],
            demand_cap: &[u32],
            _timer: &Timer,
        ) -> ToySolution {
            let bin = &self.bins[bin_type_id];
            let mut order: Vec<usize> = (0..self.items.len()).collect();
            order.sort_by(|&a, &b| {
                let ratio_a = profits[a] / self.items[a].space.max(1) as f64;
                let ratio_b = profits[b] / self.items[b].space.max(1) as f64;
                ratio_b.partial_cmp(&ratio_a).unwrap()
            });

            let mut remaining_space = bin.space;
            let mut counts = vec![0u32; self.items.len()];
            let mut profit = 0i64;
            for &i in &order {
                let item = &self.items[i];
                let max_by_demand = demand_cap[i];
                let max_by_space = if item.space > 0 {
                    (remaining_space / item.space) as u32
                } else {
                    max_by_demand
                };
                let take = max_by_demand.min(max_by_space);
                if take == 0 {
                    continue;
                }
                counts[i] = take;
                remaining_space -= item.space * take as i64;
                profit += item.profit * take as i64;
            }

            if counts.iter().all(|&c| c == 0) {
                return self.empty_solution();
            }

            ToySolution {
                objective: self.objective,
                patterns: vec![ToyPattern { bin_type_id, copies: 1, item_counts: counts }],
                profit,
                cost: bin.cost,
                number_of_bins: 1,
            }
        }

        fn solve_bin_packing(&self, bin_counts: &[u32], _timer: &Timer) -> Option<ToySolution> {
            self.solve_bin_packing_calls.set(self.solve_bin_packing_calls.get() + 1);

            let mut remaining_demand: Vec<u32> = (0..self.items.len()).map(|i| self.items[i].demand).collect();
            let mut patterns = Vec::new();
            let mut cost = 0i64;
            let mut number_of_bins = 0u32;

            for (bin_type_id, &copies) in bin_counts.iter().enumerate() {
                for _ in 0..copies {
                    if !remaining_demand.iter().any(|&d| d > 0) {
                        break;
                    }
                    let bin = &self.bins[bin_type_id];
                    let mut remaining_space = bin.space;
                    let mut counts = vec![0u32; self.items.len()];
                    let mut order: Vec<usize> = (0..self.items.len()).collect();
                    order.sort_by(|&a, &b| self.items[b].space.cmp(&self.items[a].space));
                    for &i in &order {
                        let item = &self.items[i];
                        if item.space == 0 {
                            continue;
                        }
                        let max_by_space = (remaining_space / item.space) as u32;
                        let take = remaining_demand[i].min(max_by_space);
                        if take > 0 {
                            counts[i] = take;
                            remaining_space -= item.space * take as i64;
                            remaining_demand[i] -= take;
                        }
                    }
                    if counts.iter().any(|&c| c > 0) {
                        patterns.push(ToyPattern { bin_type_id, copies: 1, item_counts: counts });
                        cost += bin.cost;
                        number_of_bins += 1;
                    }
                }
            }

            if remaining_demand.iter().any(|&d| d > 0) {
                return None;
            }

            let profit = patterns
                .iter()
                .flat_map(|p| p.item_counts.iter().enumerate())
                .map(|(i, &c)| self.items[i].profit * c as i64)
                .sum();

            Some(ToySolution {
                objective: self.objective,
                patterns,
                profit,
                cost,
                number_of_bins,
            })
        }

        fn solution_item_counts(&self, solution: &ToySolution) -> Vec<u32> {
            let mut counts = vec![0u32; self.items.len()];
            for pattern in &solution.patterns {
                for (i, &c) in pattern.item_counts.iter().enumerate() {
                    counts[i] += c * pattern.copies;
                }
            }
            counts
        }

        fn append_pattern(&self, solution: &mut ToySolution, pattern: &ToySolution, bin_type_id: usize, copies: u32) {
            let counts = self.solution_item_counts(pattern);
            solution.patterns.push(ToyPattern { bin_type_id, copies, item_counts: counts.clone() });
            solution.profit += pattern.profit * copies as i64;
            solution.cost += self.bins[bin_type_id].cost * copies as i64;
            solution.number_of_bins += copies;
        }
    }
}
