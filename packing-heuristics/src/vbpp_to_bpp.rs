use packing_core::Timer;

use crate::problem::PackingProblem;

/// Reduces a variable-sized bin-packing problem to a single bin-packing
/// subproblem with every bin type pinned at its maximum copies (spec §4.8),
/// giving column generation a feasible warm start to refine. Grounded on
/// `packingsolver/algorithms/column_generation.hpp`'s reliance on an initial
/// feasible basis before pricing begins.
pub fn vbpp_to_bpp_warm_start<P: PackingProblem>(problem: &P, timer: &Timer) -> Option<P::Solution> {
    let bin_counts: Vec<u32> = (0..problem.number_of_bin_types())
        .map(|i| problem.bin_copies(i))
        .collect();
    problem.solve_bin_packing(&bin_counts, timer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ToyBin, ToyItem, ToyProblem};
    use packing_core::Objective;

    #[test]
    fn warm_start_packs_with_every_bin_type_at_full_copies() {
        let problem = ToyProblem::new(
            Objective::VariableSizedBinPacking,
            vec![ToyItem { space: 5, profit: 0, demand: 4 }],
            vec![ToyBin { space: 10, cost: 2, copies: 5, copies_min: 0 }],
        );
        let timer = Timer::unlimited();
        let solution = vbpp_to_bpp_warm_start(&problem, &timer);
        assert!(solution.is_some());
    }

    #[test]
    fn warm_start_fails_when_capacity_is_insufficient() {
        let problem = ToyProblem::new(
            Objective::VariableSizedBinPacking,
            vec![ToyItem { space: 5, profit: 0, demand: 100 }],
            vec![ToyBin { space: 10, cost: 2, copies: 1, copies_min: 0 }],
        );
        let timer = Timer::unlimited();
        let solution = vbpp_to_bpp_warm_start(&problem, &timer);
        assert!(solution.is_none());
    }
}
